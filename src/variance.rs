use std::fmt::{Debug, Display};
use std::hash::Hash;

use nalgebra::DMatrix;
use statrs::distribution::Beta;
use statrs::statistics::Distribution;

use crate::index::ItemIndexer;
use crate::RankerError;

/// Uncertainty of the outcome between two items.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VarianceEntry<T> {
    pub item_a: T,
    pub item_b: T,
    pub variance: f64,
}

/// Variance of the Beta posterior for the pair `(i, j)`, starting from a
/// uniform Beta(1, 1) prior.
///
/// Cells may dip below zero once a pair has more votes than participants;
/// the shapes stay valid down to a cell of `-1`, past which the pair is
/// reported as degenerate.
pub fn pair_variance<T: Display + Debug>(
    matrix: &DMatrix<f64>,
    i: usize,
    j: usize,
) -> Result<f64, RankerError<T>> {
    let alpha = matrix[(i, j)] + 1.0;
    let beta = matrix[(j, i)] + 1.0;

    if !(alpha > 0.0) {
        return Err(RankerError::DegenerateMatrix(i));
    }
    if !(beta > 0.0) {
        return Err(RankerError::DegenerateMatrix(j));
    }

    Beta::new(alpha, beta)
        .ok()
        .and_then(|dist| dist.variance())
        .ok_or(RankerError::DegenerateMatrix(i))
}

/// One entry per unordered pair `i < j`, ordered by `(i, j)`.
pub fn estimate_variances<T: Clone + Debug + Display + Ord + Hash>(
    matrix: &DMatrix<f64>,
    indexer: &ItemIndexer<T>,
) -> Result<Vec<VarianceEntry<T>>, RankerError<T>> {
    let n = indexer.len();
    let mismatch = || RankerError::DimensionMismatch {
        expected: n,
        actual: matrix.nrows(),
    };
    if matrix.nrows() != n || matrix.ncols() != n {
        return Err(mismatch());
    }

    let mut variances = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        let item_a = indexer.item_at(i).ok_or_else(mismatch)?;
        for j in (i + 1)..n {
            let item_b = indexer.item_at(j).ok_or_else(mismatch)?;
            variances.push(VarianceEntry {
                item_a: item_a.clone(),
                item_b: item_b.clone(),
                variance: pair_variance::<T>(matrix, i, j)?,
            });
        }
    }

    Ok(variances)
}
