use std::fmt::{Debug, Display};

use rand::Rng;

use crate::variance::VarianceEntry;
use crate::RankerError;

/// A pair of items worth comparing next.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SampleSuggestion<T> {
    pub item_a: T,
    pub item_b: T,
}

impl<T: Display> Display for SampleSuggestion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} vs {}", self.item_a, self.item_b)
    }
}

/// A pair together with the running variance total up to and including it.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerEntry<T> {
    pub item_a: T,
    pub item_b: T,
    pub cum_sum_variance: f64,
}

/// Draws pairs with probability proportional to their variance.
#[derive(Debug, Clone)]
pub struct AdaptiveSampler<T> {
    entries: Vec<SamplerEntry<T>>,
    sum_variance: f64,
}

impl<T: Clone + Debug + Display> AdaptiveSampler<T> {
    pub fn new(variances: Vec<VarianceEntry<T>>) -> Result<Self, RankerError<T>> {
        if variances.is_empty() {
            return Err(RankerError::InvalidArgument(
                "cannot sample from an empty variance list".to_string(),
            ));
        }

        let mut sum_variance = 0.0;
        let mut entries = Vec::with_capacity(variances.len());

        for VarianceEntry {
            item_a,
            item_b,
            variance,
        } in variances
        {
            if !(variance.is_finite() && variance >= 0.0) {
                return Err(RankerError::InvalidArgument(format!(
                    "variance for {} vs {} must be finite and non-negative, got {}",
                    item_a, item_b, variance
                )));
            }

            sum_variance += variance;
            entries.push(SamplerEntry {
                item_a,
                item_b,
                cum_sum_variance: sum_variance,
            });
        }

        Ok(AdaptiveSampler {
            entries,
            sum_variance,
        })
    }

    /// Returns the first entry whose cumulative variance reaches a uniform
    /// threshold in `[0, sum_variance)`.
    pub fn sample_entry<R: Rng + ?Sized>(&self, rng: &mut R) -> &SamplerEntry<T> {
        let threshold = rng.gen::<f64>() * self.sum_variance;
        self.entry_at_threshold(threshold)
    }

    /// A threshold at or past `sum_variance` resolves to the last entry.
    fn entry_at_threshold(&self, threshold: f64) -> &SamplerEntry<T> {
        // cum_sum_variance increases monotonically
        let idx = self
            .entries
            .partition_point(|entry| entry.cum_sum_variance < threshold)
            .min(self.entries.len() - 1);

        &self.entries[idx]
    }

    pub fn sample_pair<R: Rng + ?Sized>(&self, rng: &mut R) -> SampleSuggestion<T> {
        let entry = self.sample_entry(rng);
        SampleSuggestion {
            item_a: entry.item_a.clone(),
            item_b: entry.item_b.clone(),
        }
    }

    pub fn entries(&self) -> &[SamplerEntry<T>] {
        &self.entries
    }

    pub fn sum_variance(&self) -> f64 {
        self.sum_variance
    }
}
