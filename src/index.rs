use std::collections::{BTreeSet, HashMap};
use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::RankerError;

/// Bijection between items and dense matrix indices.
///
/// Items are ordered by their `Ord` implementation, so two indexers built from
/// the same set agree on every index no matter how the set was assembled.
#[derive(Debug, Clone)]
pub struct ItemIndexer<T: Clone + Debug + Display + Ord + Hash> {
    item_indices: HashMap<T, usize>,
    index_to_item: Vec<T>,
}

impl<T: Clone + Debug + Display + Ord + Hash> ItemIndexer<T> {
    pub fn new<I: IntoIterator<Item = T>>(items: I) -> Self {
        let index_to_item: Vec<T> = items.into_iter().collect::<BTreeSet<_>>().into_iter().collect();

        let item_indices = index_to_item
            .iter()
            .enumerate()
            .map(|(idx, item)| (item.clone(), idx))
            .collect();

        ItemIndexer {
            item_indices,
            index_to_item,
        }
    }

    pub fn index_of(&self, item: &T) -> Result<usize, RankerError<T>> {
        self.item_indices
            .get(item)
            .copied()
            .ok_or_else(|| RankerError::ItemNotFound(item.clone()))
    }

    pub fn item_at(&self, index: usize) -> Option<&T> {
        self.index_to_item.get(index)
    }

    pub fn len(&self) -> usize {
        self.index_to_item.len()
    }

    /// Items in index order.
    pub fn items(&self) -> &[T] {
        &self.index_to_item
    }
}
