use nalgebra::DMatrix;
use tracing::debug;

/// Weight of the implicit tie placed on every off-diagonal cell when the
/// matrix is seeded with a participant count.
pub const NEUTRAL_PREFERENCE: f64 = 0.5;

/// A vote whose items have already been resolved to matrix indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct IndexedPreference {
    pub source: usize,
    pub target: usize,
    pub value: f64,
}

/// Dense pairwise-preference matrix.
///
/// Cell `[i][j]` holds the preference mass flowing from item `i` toward item
/// `j`. The diagonal is derived: `[i][i]` is the sum of column `i` without
/// the diagonal itself, and is rewritten after every batch.
#[derive(Debug, Clone)]
pub struct PreferenceMatrix {
    data: DMatrix<f64>,
    num_participants: Option<usize>,
    implicit_pref: f64,
    vote_count: usize,
}

impl PreferenceMatrix {
    /// Zero matrix, plus the neutral prior when `num_participants` is non-zero.
    pub fn new(n: usize, num_participants: Option<usize>) -> Self {
        let num_participants = num_participants.filter(|&p| p > 0);

        let (data, implicit_pref) = match num_participants {
            Some(p) => {
                let implicit_pref = 1.0 / (2.0 * p as f64);
                let prior = (DMatrix::from_element(n, n, 1.0) - DMatrix::identity(n, n))
                    * implicit_pref
                    * p as f64;
                (prior, implicit_pref)
            }
            None => (DMatrix::zeros(n, n), 0.0),
        };

        let mut matrix = PreferenceMatrix {
            data,
            num_participants,
            implicit_pref,
            vote_count: 0,
        };
        matrix.recompute_diagonal();

        debug!(
            items = n,
            num_participants = ?num_participants,
            "preference matrix initialized"
        );

        matrix
    }

    /// Records a batch of votes. Indices must be in range and distinct; the
    /// caller validates the batch before handing it over.
    pub(crate) fn add_preferences(&mut self, preferences: &[IndexedPreference]) {
        for pref in preferences {
            let (s, t) = (pref.source, pref.target);

            self.data[(s, t)] -= self.implicit_pref;
            self.data[(t, s)] -= self.implicit_pref;

            // Only the dominant direction is recorded
            if pref.value >= NEUTRAL_PREFERENCE {
                self.data[(s, t)] += pref.value;
            } else {
                self.data[(t, s)] += 1.0 - pref.value;
            }
        }

        self.vote_count += preferences.len();
        self.recompute_diagonal();

        debug!(
            batch = preferences.len(),
            total_votes = self.vote_count,
            "preferences recorded"
        );
    }

    fn recompute_diagonal(&mut self) {
        let n = self.data.ncols();
        for col in 0..n {
            let off_diagonal: f64 = (0..n)
                .filter(|&row| row != col)
                .map(|row| self.data[(row, col)])
                .sum();
            self.data[(col, col)] = off_diagonal;
        }
    }

    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.nrows()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data.get((row, col)).copied()
    }

    pub fn num_participants(&self) -> Option<usize> {
        self.num_participants
    }

    pub fn vote_count(&self) -> usize {
        self.vote_count
    }
}
