use std::collections::HashMap;

use crate::domain::product::ProductId;

use super::facts::Fact;

/// Summed measure per product, in the order products were first seen.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregatedMeasure {
    entries: Vec<(ProductId, f64)>,
    index: HashMap<ProductId, usize>,
}

impl AggregatedMeasure {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, product_id: &ProductId) -> Option<f64> {
        self.index.get(product_id).map(|position| self.entries[*position].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProductId, f64)> {
        self.entries.iter().map(|(product_id, measure)| (product_id, *measure))
    }

    pub fn max_measure(&self) -> Option<f64> {
        self.entries.iter().map(|(_, measure)| *measure).reduce(f64::max)
    }

    fn add(&mut self, product_id: ProductId, measure: f64) {
        match self.index.get(&product_id) {
            Some(position) => self.entries[*position].1 += measure,
            None => {
                self.index.insert(product_id.clone(), self.entries.len());
                self.entries.push((product_id, measure));
            }
        }
    }
}

/// Groups facts by product and sums their measures.
pub fn aggregate<I>(facts: I) -> AggregatedMeasure
where
    I: IntoIterator<Item = Fact>,
{
    let mut aggregated = AggregatedMeasure::default();
    for fact in facts {
        let (product_id, measure) = fact.into_parts();
        aggregated.add(product_id, measure);
    }
    aggregated
}

#[cfg(test)]
mod tests {
    use crate::domain::product::ProductId;
    use crate::ranking::Fact;

    use super::aggregate;

    fn sale(product: &str, quantity: f64) -> Fact {
        Fact::new(ProductId::new(product), quantity).expect("valid fact")
    }

    #[test]
    fn sums_measures_per_product() {
        let aggregated =
            aggregate(vec![sale("p1", 2.0), sale("p2", 5.0), sale("p1", 3.0), sale("p1", 0.5)]);

        assert_eq!(aggregated.len(), 2);
        assert_eq!(aggregated.get(&ProductId::new("p1")), Some(5.5));
        assert_eq!(aggregated.get(&ProductId::new("p2")), Some(5.0));
        assert_eq!(aggregated.get(&ProductId::new("p3")), None);
    }

    #[test]
    fn empty_input_yields_empty_mapping() {
        let aggregated = aggregate(Vec::new());
        assert!(aggregated.is_empty());
        assert_eq!(aggregated.max_measure(), None);
    }

    #[test]
    fn keeps_first_seen_order() {
        let aggregated = aggregate(vec![sale("b", 1.0), sale("a", 1.0), sale("b", 1.0)]);
        let order: Vec<_> = aggregated.iter().map(|(product, _)| product.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn sums_do_not_depend_on_fact_order() {
        let facts = vec![sale("p1", 4.0), sale("p2", 1.0), sale("p1", 6.0), sale("p3", 2.0)];
        let mut reversed = facts.clone();
        reversed.reverse();

        let forward = aggregate(facts);
        let backward = aggregate(reversed);

        for (product, measure) in forward.iter() {
            assert_eq!(backward.get(product), Some(measure));
        }
        assert_eq!(forward.len(), backward.len());
    }

    #[test]
    fn counts_unit_facts() {
        let views = (0..7).map(|_| Fact::unit(ProductId::new("p9")));
        assert_eq!(aggregate(views).get(&ProductId::new("p9")), Some(7.0));
    }
}
