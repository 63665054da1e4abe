//! Ranks items from pairwise preference votes and suggests which pair to ask
//! about next.
//!
//! Votes accumulate in a dense preference matrix; [`PowerRanker::run`] turns
//! that matrix into weights by damped power iteration, and
//! [`PowerRanker::get_variances`] feeds an [`AdaptiveSampler`] that favours the
//! pairs whose outcome is least certain.

use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use thiserror::Error;

pub mod index;
pub mod matrix;
pub mod power;
pub mod sampler;
pub mod variance;

pub use index::ItemIndexer;
pub use matrix::PreferenceMatrix;
pub use power::{PowerIterationOutcome, RunOptions};
pub use sampler::{AdaptiveSampler, SampleSuggestion, SamplerEntry};
pub use variance::VarianceEntry;

use matrix::IndexedPreference;

#[derive(Error, Debug)]
pub enum RankerError<T: Display + Debug> {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Unknown item in caller input; an argument error like `InvalidArgument`,
    /// kept separate so the offending item is returned.
    #[error("Item not found: {0}")]
    ItemNotFound(T),
    /// A row sums to zero, carries negative preference mass, or yields a
    /// non-positive Beta shape.
    #[error("Degenerate matrix: row {0} is not a valid preference distribution")]
    DegenerateMatrix(usize),
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl<T: Display + Debug> RankerError<T> {
    /// True for errors caused by caller input rather than internal state.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, RankerError::InvalidArgument(_) | RankerError::ItemNotFound(_))
    }
}

/// One vote. `value >= 0.5` favours `target` over `source` with strength
/// `value`; below that, `source` is favoured with strength `1 - value`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Preference<T> {
    pub source: T,
    pub target: T,
    pub value: f64,
}

impl<T> Preference<T> {
    pub fn new(source: T, target: T, value: f64) -> Self {
        Preference {
            source,
            target,
            value,
        }
    }

    /// A full-strength vote for `winner` over `loser`.
    pub fn beats(winner: T, loser: T) -> Self {
        Preference::new(loser, winner, 1.0)
    }
}

impl<T: Display> fmt::Display for Preference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.source, self.target, self.value)
    }
}

/// Item weights in canonical item order. Weights are non-negative and sum
/// to one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ranking<T> {
    weights: Vec<(T, f64)>,
}

impl<T: Ord> Ranking<T> {
    pub fn get(&self, item: &T) -> Option<f64> {
        self.weights
            .binary_search_by(|(candidate, _)| candidate.cmp(item))
            .ok()
            .map(|idx| self.weights[idx].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> {
        self.weights.iter().map(|(item, weight)| (item, *weight))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().map(|(_, w)| w).sum()
    }

    /// Items from heaviest to lightest; ties keep canonical order.
    pub fn ordering(&self) -> Vec<&T> {
        let mut by_weight: Vec<_> = self.weights.iter().collect();
        by_weight.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        by_weight.into_iter().map(|(item, _)| item).collect()
    }
}

/// Owns the item index and preference matrix for one ranking session.
#[derive(Debug, Clone)]
pub struct PowerRanker<T: Clone + Debug + Display + Ord + Hash> {
    indexer: ItemIndexer<T>,
    matrix: PreferenceMatrix,
}

impl<T: Clone + Debug + Display + Ord + Hash> PowerRanker<T> {
    pub fn new<I: IntoIterator<Item = T>>(items: I) -> Result<Self, RankerError<T>> {
        Self::new_with_options(items, None, &[])
    }

    /// Seeds every pair with a neutral tie that `num_participants` votes on
    /// the pair will fully retract.
    pub fn with_participants<I: IntoIterator<Item = T>>(
        items: I,
        num_participants: usize,
    ) -> Result<Self, RankerError<T>> {
        Self::new_with_options(items, Some(num_participants), &[])
    }

    pub fn new_with_options<I: IntoIterator<Item = T>>(
        items: I,
        num_participants: Option<usize>,
        preferences: &[Preference<T>],
    ) -> Result<Self, RankerError<T>> {
        let indexer = ItemIndexer::new(items);
        if indexer.len() < 2 {
            return Err(RankerError::InvalidArgument(format!(
                "cannot rank fewer than two items, got {}",
                indexer.len()
            )));
        }

        let matrix = PreferenceMatrix::new(indexer.len(), num_participants);
        let mut ranker = PowerRanker { indexer, matrix };

        if !preferences.is_empty() {
            ranker.add_preferences(preferences)?;
        }

        Ok(ranker)
    }

    /// Records a batch of votes. The batch is checked as a whole first; on
    /// error nothing is recorded.
    pub fn add_preferences(&mut self, preferences: &[Preference<T>]) -> Result<(), RankerError<T>> {
        let indexed = preferences
            .iter()
            .map(|pref| self.resolve(pref))
            .collect::<Result<Vec<_>, _>>()?;

        self.matrix.add_preferences(&indexed);
        Ok(())
    }

    fn resolve(&self, pref: &Preference<T>) -> Result<IndexedPreference, RankerError<T>> {
        if !(0.0..=1.0).contains(&pref.value) {
            return Err(RankerError::InvalidArgument(format!(
                "preference value must be in [0, 1], got {} for {}",
                pref.value, pref
            )));
        }
        if pref.source == pref.target {
            return Err(RankerError::InvalidArgument(format!(
                "cannot compare {} with itself",
                pref.source
            )));
        }

        Ok(IndexedPreference {
            source: self.indexer.index_of(&pref.source)?,
            target: self.indexer.index_of(&pref.target)?,
            value: pref.value,
        })
    }

    pub fn run(&self, options: &RunOptions) -> Result<Ranking<T>, RankerError<T>> {
        self.run_detailed(options).map(|(ranking, _)| ranking)
    }

    /// Like [`run`](Self::run), also reporting iteration count and convergence.
    pub fn run_detailed(
        &self,
        options: &RunOptions,
    ) -> Result<(Ranking<T>, PowerIterationOutcome), RankerError<T>> {
        let outcome = power::power_method::<T>(self.matrix.data(), options)?;
        let ranking = self.apply_labels(&outcome.weights)?;
        Ok((ranking, outcome))
    }

    fn apply_labels(&self, eigenvector: &[f64]) -> Result<Ranking<T>, RankerError<T>> {
        if eigenvector.len() != self.indexer.len() {
            return Err(RankerError::DimensionMismatch {
                expected: self.indexer.len(),
                actual: eigenvector.len(),
            });
        }

        let weights = self
            .indexer
            .items()
            .iter()
            .cloned()
            .zip(eigenvector.iter().copied())
            .collect();

        Ok(Ranking { weights })
    }

    pub fn get_variances(&self) -> Result<Vec<VarianceEntry<T>>, RankerError<T>> {
        variance::estimate_variances(self.matrix.data(), &self.indexer)
    }

    /// Preference mass currently flowing from `source` toward `target`.
    pub fn preference_strength(&self, source: &T, target: &T) -> Result<f64, RankerError<T>> {
        let s = self.indexer.index_of(source)?;
        let t = self.indexer.index_of(target)?;
        self.matrix
            .get(s, t)
            .ok_or(RankerError::DimensionMismatch {
                expected: self.indexer.len(),
                actual: self.matrix.size(),
            })
    }

    pub fn index_of(&self, item: &T) -> Result<usize, RankerError<T>> {
        self.indexer.index_of(item)
    }

    pub fn items(&self) -> &[T] {
        self.indexer.items()
    }

    pub fn item_count(&self) -> usize {
        self.indexer.len()
    }

    pub fn num_participants(&self) -> Option<usize> {
        self.matrix.num_participants()
    }

    pub fn vote_count(&self) -> usize {
        self.matrix.vote_count()
    }
}

#[cfg(feature = "serde")]
impl<T: Clone + Debug + Display + Ord + Hash + serde::Serialize> Ranking<T> {
    pub fn to_json(&self) -> Result<String, RankerError<T>> {
        serde_json::to_string(self)
            .map_err(|e| RankerError::SerializationError(format!("Failed to serialize: {}", e)))
    }
}

/// Parses a JSON array of `{"source", "target", "value"}` records.
#[cfg(feature = "serde")]
pub fn parse_preferences<T>(json: &str) -> Result<Vec<Preference<T>>, RankerError<T>>
where
    T: Debug + Display + serde::de::DeserializeOwned,
{
    serde_json::from_str(json)
        .map_err(|e| RankerError::SerializationError(format!("Failed to deserialize: {}", e)))
}
