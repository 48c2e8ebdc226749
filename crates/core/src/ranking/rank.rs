use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::errors::DomainError;

use super::aggregate::AggregatedMeasure;
use super::{sort_descending, truncate, Signal};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub product_id: ProductId,
    pub rank: f64,
}

/// Products ordered by rank, highest first. Ties keep extraction order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedList {
    signal: Signal,
    entries: Vec<RankedEntry>,
}

impl RankedList {
    pub fn empty(signal: Signal) -> Self {
        Self { signal, entries: Vec::new() }
    }

    pub(crate) fn from_sorted(signal: Signal, entries: Vec<RankedEntry>) -> Self {
        Self { signal, entries }
    }

    pub fn signal(&self) -> Signal {
        self.signal
    }

    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RankedEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self) -> Option<&RankedEntry> {
        self.entries.first()
    }

    pub fn get(&self, product_id: &ProductId) -> Option<f64> {
        self.entries.iter().find(|entry| entry.product_id == *product_id).map(|entry| entry.rank)
    }

    pub fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.product_id == *product_id)
    }

    pub fn product_ids(&self) -> Vec<&ProductId> {
        self.entries.iter().map(|entry| &entry.product_id).collect()
    }

    /// First `n` entries, or all of them for `EVERYTHING`.
    pub fn take(mut self, n: usize) -> Self {
        truncate(&mut self.entries, n);
        self
    }

    pub fn into_entries(self) -> Vec<RankedEntry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a RankedList {
    type Item = &'a RankedEntry;
    type IntoIter = std::slice::Iter<'a, RankedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Normalizes every measure by the largest one and sorts descending.
///
/// Fails with `EmptyInput` when there is nothing to rank or every measure is
/// zero, and with `InvalidMeasure` when a summed measure overflowed.
pub fn rank(
    signal: Signal,
    aggregated: &AggregatedMeasure,
    n: usize,
) -> Result<RankedList, DomainError> {
    if let Some((product_id, measure)) = aggregated.iter().find(|(_, measure)| !measure.is_finite())
    {
        return Err(DomainError::InvalidMeasure { product_id: product_id.clone(), measure });
    }

    let max_value = match aggregated.max_measure() {
        Some(max_value) if max_value > 0.0 => max_value,
        _ => return Err(DomainError::EmptyInput { signal }),
    };

    let mut entries: Vec<RankedEntry> = aggregated
        .iter()
        .map(|(product_id, measure)| RankedEntry {
            product_id: product_id.clone(),
            rank: measure / max_value,
        })
        .collect();

    sort_descending(&mut entries, |entry| entry.rank);
    truncate(&mut entries, n);

    Ok(RankedList { signal, entries })
}

#[cfg(test)]
mod tests {
    use crate::domain::product::ProductId;
    use crate::errors::DomainError;
    use crate::ranking::{aggregate, Fact, Signal, EVERYTHING};

    use super::rank;

    fn measures(values: &[(&str, f64)]) -> crate::ranking::AggregatedMeasure {
        aggregate(
            values
                .iter()
                .map(|(product, measure)| Fact::new(ProductId::new(*product), *measure).expect("fact")),
        )
    }

    fn ids(list: &super::RankedList) -> Vec<&str> {
        list.iter().map(|entry| entry.product_id.as_str()).collect()
    }

    #[test]
    fn ranks_summed_quantities_descending() {
        let ranked = rank(
            Signal::Sales,
            &measures(&[("p1", 10.0), ("p2", 20.0), ("p3", 30.0)]),
            EVERYTHING,
        )
        .expect("rank");

        assert_eq!(ids(&ranked), vec!["p3", "p2", "p1"]);
        let ranks: Vec<f64> = ranked.iter().map(|entry| entry.rank).collect();
        assert!((ranks[0] - 1.0).abs() < 1e-9);
        assert!((ranks[1] - 0.667).abs() < 1e-3);
        assert!((ranks[2] - 0.333).abs() < 1e-3);
    }

    #[test]
    fn ranks_view_counts_descending() {
        let ranked = rank(
            Signal::Views,
            &measures(&[("p1", 10.0), ("p2", 20.0), ("p3", 15.0)]),
            EVERYTHING,
        )
        .expect("rank");

        assert_eq!(ids(&ranked), vec!["p2", "p3", "p1"]);
        assert_eq!(ranked.top().map(|entry| entry.rank), Some(1.0));
        assert_eq!(ranked.signal(), Signal::Views);
    }

    #[test]
    fn ranks_stay_within_unit_interval() {
        let ranked = rank(
            Signal::Sales,
            &measures(&[("a", 0.0), ("b", 3.5), ("c", 7.0), ("d", 1.0)]),
            EVERYTHING,
        )
        .expect("rank");

        assert!(ranked.iter().all(|entry| (0.0..=1.0).contains(&entry.rank)));
        assert_eq!(ranked.get(&ProductId::new("c")), Some(1.0));
        assert_eq!(ranked.get(&ProductId::new("a")), Some(0.0));
    }

    #[test]
    fn larger_measure_ranks_strictly_higher() {
        let ranked =
            rank(Signal::Sales, &measures(&[("a", 2.0), ("b", 9.0), ("c", 4.0)]), EVERYTHING)
                .expect("rank");

        let a = ranked.get(&ProductId::new("a")).expect("a");
        let b = ranked.get(&ProductId::new("b")).expect("b");
        let c = ranked.get(&ProductId::new("c")).expect("c");
        assert!(b > c && c > a);
    }

    #[test]
    fn ties_keep_extraction_order() {
        let ranked = rank(
            Signal::Views,
            &measures(&[("z", 5.0), ("m", 5.0), ("top", 8.0), ("a", 5.0)]),
            EVERYTHING,
        )
        .expect("rank");

        assert_eq!(ids(&ranked), vec!["top", "z", "m", "a"]);
    }

    #[test]
    fn truncation_matches_prefix_of_full_ranking() {
        let aggregated =
            measures(&[("a", 1.0), ("b", 4.0), ("c", 2.0), ("d", 8.0), ("e", 4.0), ("f", 3.0)]);
        let full = rank(Signal::Sales, &aggregated, EVERYTHING).expect("full");

        for n in 1..=8 {
            let truncated = rank(Signal::Sales, &aggregated, n).expect("truncated");
            let expected: Vec<_> = full.iter().take(n).cloned().collect();
            assert_eq!(truncated.entries(), expected.as_slice(), "n = {n}");
            assert_eq!(full.clone().take(n), truncated);
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        let error = rank(Signal::Sales, &measures(&[]), EVERYTHING).expect_err("empty");
        assert_eq!(error, DomainError::EmptyInput { signal: Signal::Sales });
    }

    #[test]
    fn all_zero_measures_are_rejected() {
        let error =
            rank(Signal::Views, &measures(&[("a", 0.0), ("b", 0.0)]), EVERYTHING).expect_err("zero");
        assert_eq!(error, DomainError::EmptyInput { signal: Signal::Views });
    }

    #[test]
    fn overflowing_sum_is_rejected_instead_of_ranked() {
        let aggregated = measures(&[("big", f64::MAX), ("small", 1.0), ("big", f64::MAX)]);

        let error = rank(Signal::Sales, &aggregated, EVERYTHING).expect_err("overflow");
        assert_eq!(
            error,
            DomainError::InvalidMeasure { product_id: ProductId::new("big"), measure: f64::INFINITY }
        );
    }

    #[test]
    fn lookup_by_product() {
        let ranked =
            rank(Signal::Sales, &measures(&[("a", 1.0), ("b", 2.0)]), EVERYTHING).expect("rank");
        assert_eq!(ranked.position(&ProductId::new("a")), Some(1));
        assert_eq!(ranked.position(&ProductId::new("x")), None);
        assert_eq!(ranked.len(), 2);
    }
}
