use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::errors::DomainError;

use super::rank::{RankedEntry, RankedList};
use super::{sort_descending, truncate, Signal};

/// Euclidean length of the two ranks taken as orthogonal signal strengths.
pub fn distance(x: f64, y: f64) -> f64 {
    (x * x + y * y).sqrt()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombinedEntry {
    pub product_id: ProductId,
    /// `None` when the product never sold in scope.
    pub sold_rank: Option<f64>,
    /// `None` when the product was never viewed in scope.
    pub view_rank: Option<f64>,
    pub rank: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombinedRank {
    entries: Vec<CombinedEntry>,
}

impl CombinedRank {
    pub fn entries(&self) -> &[CombinedEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CombinedEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top(&self) -> Option<&CombinedEntry> {
        self.entries.first()
    }

    pub fn get(&self, product_id: &ProductId) -> Option<&CombinedEntry> {
        self.entries.iter().find(|entry| entry.product_id == *product_id)
    }

    pub fn product_ids(&self) -> Vec<&ProductId> {
        self.entries.iter().map(|entry| &entry.product_id).collect()
    }

    pub fn take(mut self, n: usize) -> Self {
        truncate(&mut self.entries, n);
        self
    }

    /// Drops the per-signal ranks, keeping only the blended one.
    pub fn into_ranked_list(self) -> RankedList {
        let entries = self
            .entries
            .into_iter()
            .map(|entry| RankedEntry { product_id: entry.product_id, rank: entry.rank })
            .collect();
        RankedList::from_sorted(Signal::Combined, entries)
    }
}

impl<'a> IntoIterator for &'a CombinedRank {
    type Item = &'a CombinedEntry;
    type IntoIter = std::slice::Iter<'a, CombinedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Outer-joins the two rankings on product id and blends them.
///
/// A product missing from one side scores 0 on that side; the original rank
/// stays `None` in the output. Rows keep sold order first, then products only
/// seen in views, so ties resolve in that order.
pub fn combine(sold: &RankedList, viewed: &RankedList) -> Result<CombinedRank, DomainError> {
    let mut rows: Vec<CombinedEntry> = Vec::with_capacity(sold.len() + viewed.len());
    let mut index: HashMap<&ProductId, usize> = HashMap::new();

    for entry in sold {
        index.insert(&entry.product_id, rows.len());
        rows.push(CombinedEntry {
            product_id: entry.product_id.clone(),
            sold_rank: Some(entry.rank),
            view_rank: None,
            rank: 0.0,
        });
    }

    for entry in viewed {
        match index.get(&entry.product_id) {
            Some(position) => rows[*position].view_rank = Some(entry.rank),
            None => {
                index.insert(&entry.product_id, rows.len());
                rows.push(CombinedEntry {
                    product_id: entry.product_id.clone(),
                    sold_rank: None,
                    view_rank: Some(entry.rank),
                    rank: 0.0,
                });
            }
        }
    }

    for row in &mut rows {
        row.rank = distance(row.sold_rank.unwrap_or(0.0), row.view_rank.unwrap_or(0.0));
    }

    let max_value = match rows.iter().map(|row| row.rank).reduce(f64::max) {
        Some(max_value) if max_value > 0.0 => max_value,
        _ => return Err(DomainError::EmptyInput { signal: Signal::Combined }),
    };

    for row in &mut rows {
        row.rank /= max_value;
    }
    sort_descending(&mut rows, |row| row.rank);

    Ok(CombinedRank { entries: rows })
}
