//! Compressed sparse row adjacency lists.
use std::ops::Range;

use crate::traits::types::FmmError;

/// Interaction partners of a set of owners in compressed sparse row form.
///
/// The partners of owner `i` are `lists[starts[i]..starts[i + 1]]`. Partners are indices into some other
/// collection, e.g. global box indices, source points or target points, the adjacency itself is agnostic
/// to what they index.
#[derive(Debug, Clone, Default)]
pub struct CsrList {
    /// Offsets into `lists`, one more than the number of owners.
    starts: Vec<usize>,

    /// Flat storage of all partners.
    lists: Vec<usize>,
}

impl CsrList {
    /// Construct from raw offsets and partners.
    ///
    /// # Arguments
    /// * `starts` - Non-decreasing offsets beginning at zero and ending at `lists.len()`.
    /// * `lists` - Partner indices.
    pub fn new(starts: Vec<usize>, lists: Vec<usize>) -> Result<Self, FmmError> {
        let Some(&first) = starts.first() else {
            return Err(FmmError::ShapeMismatch(
                "CSR starts must contain at least one offset".to_string(),
            ));
        };

        if first != 0 {
            return Err(FmmError::ShapeMismatch(format!(
                "CSR starts must begin at 0, found {first}"
            )));
        }

        if let Some(i) = starts.windows(2).position(|w| w[0] > w[1]) {
            return Err(FmmError::ShapeMismatch(format!(
                "CSR starts decrease between rows {} and {}",
                i,
                i + 1
            )));
        }

        let last = starts[starts.len() - 1];
        if last != lists.len() {
            return Err(FmmError::ShapeMismatch(format!(
                "CSR starts end at {last}, but {} partners were provided",
                lists.len()
            )));
        }

        Ok(Self { starts, lists })
    }

    /// Construct from a list of partner lists, one per owner.
    pub fn from_rows<R: AsRef<[usize]>>(rows: &[R]) -> Self {
        let mut starts = Vec::with_capacity(rows.len() + 1);
        let mut lists = Vec::new();
        starts.push(0);
        for row in rows {
            lists.extend_from_slice(row.as_ref());
            starts.push(lists.len());
        }
        Self { starts, lists }
    }

    /// An adjacency with `n_rows` owners and no partners.
    pub fn empty(n_rows: usize) -> Self {
        Self {
            starts: vec![0; n_rows + 1],
            lists: Vec::new(),
        }
    }

    /// Number of owners.
    pub fn n_rows(&self) -> usize {
        self.starts.len() - 1
    }

    /// Total number of partners over all owners.
    pub fn n_partners(&self) -> usize {
        self.lists.len()
    }

    /// Range of `lists` holding the partners of an owner.
    pub fn range(&self, row: usize) -> Range<usize> {
        self.starts[row]..self.starts[row + 1]
    }

    /// Partners of an owner.
    pub fn row(&self, row: usize) -> &[usize] {
        &self.lists[self.range(row)]
    }

    /// Offsets.
    pub fn starts(&self) -> &[usize] {
        &self.starts
    }

    /// Flat partners.
    pub fn lists(&self) -> &[usize] {
        &self.lists
    }

    /// Check that there is exactly one row per owner and that every partner lies in `0..bound`.
    ///
    /// # Arguments
    /// * `n_rows` - Expected number of owners.
    /// * `bound` - Exclusive upper bound on partner indices.
    /// * `name` - Name of the adjacency, used in error messages.
    pub fn check(&self, n_rows: usize, bound: usize, name: &str) -> Result<(), FmmError> {
        if self.n_rows() != n_rows {
            return Err(FmmError::ShapeMismatch(format!(
                "{name} has {} rows, expected {n_rows}",
                self.n_rows()
            )));
        }

        if let Some(&partner) = self.lists.iter().find(|&&p| p >= bound) {
            return Err(FmmError::ShapeMismatch(format!(
                "{name} lists partner {partner}, out of range for {bound} entries"
            )));
        }

        Ok(())
    }

    /// Shuffle the partners within each row, leaving the owner to partner relation unchanged.
    pub fn shuffle_rows<R: rand::Rng>(&mut self, rng: &mut R) {
        use rand::seq::SliceRandom;
        for row in 0..self.n_rows() {
            let range = self.range(row);
            self.lists[range].shuffle(rng);
        }
    }
}
