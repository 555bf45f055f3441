//! Target orders and the routing of rows through them.
//!
//! A [`Permutation`] stores, for every batch item, its position in the target sequence. Rows
//! are *arranged* into sequence order before the loss and gradients computed on the sequence
//! are *restored* to item order before they reach the producer of each item.
//!
//! ```
//! use image_orderer::Permutation;
//! use ndarray::array;
//!
//! # fn main() -> image_orderer::Result<()> {
//! // Item 0 goes last, item 1 first and item 2 in the middle.
//! let order = Permutation::new(vec![2, 0, 1])?;
//! let items = array![[0.], [1.], [2.]];
//!
//! let sequence = order.arrange(&items)?;
//! assert_eq!(sequence, array![[1.], [2.], [0.]]);
//! assert_eq!(order.restore(&sequence)?, items);
//! # Ok(())
//! # }
//! ```
use std::cmp::Ordering;

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A bijection over `0..n`, mapping every item to its position in the target sequence.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct Permutation {
    positions: Vec<usize>,
}

impl Permutation {
    /// Creates a permutation where item `i` is placed at `positions[i]`.
    ///
    /// Fails with [`Error::InvalidPermutation`] if a position is out of range or repeated.
    pub fn new(positions: Vec<usize>) -> Result<Self> {
        let len = positions.len();
        let mut seen = vec![false; len];

        for (item, &position) in positions.iter().enumerate() {
            if position >= len {
                return Err(Error::InvalidPermutation(format!(
                    "position {} of item {} is out of range for {} items",
                    position, item, len
                )));
            }
            if seen[position] {
                return Err(Error::InvalidPermutation(format!(
                    "position {} is assigned more than once",
                    position
                )));
            }
            seen[position] = true;
        }

        Ok(Self { positions })
    }

    /// Leaves `len` items in place.
    pub fn identity(len: usize) -> Self {
        Self {
            positions: (0..len).collect(),
        }
    }

    /// Derives the order that sorts `items` according to `compare`. Ties keep their relative
    /// order.
    ///
    /// ```
    /// use image_orderer::Permutation;
    ///
    /// let lightness: [f64; 3] = [0.7, 0.1, 0.4];
    /// let order = Permutation::from_ranking(&lightness, |a, b| a.total_cmp(b));
    ///
    /// assert_eq!(order.positions(), &[2, 0, 1]);
    /// ```
    pub fn from_ranking<T, F>(items: &[T], mut compare: F) -> Self
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut ranking: Vec<usize> = (0..items.len()).collect();
        ranking.sort_by(|&a, &b| compare(&items[a], &items[b]));

        let mut positions = vec![0; items.len()];
        for (position, item) in ranking.into_iter().enumerate() {
            positions[item] = position;
        }

        Self { positions }
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns `true` if the permutation has no items.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns the sequence position of every item.
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Returns the permutation undoing `self`: the item found at every sequence position.
    pub fn inverse(&self) -> Self {
        let mut positions = vec![0; self.len()];
        for (item, &position) in self.positions.iter().enumerate() {
            positions[position] = item;
        }

        Self { positions }
    }

    /// Moves every item to its sequence position.
    ///
    /// Fails with [`Error::InvalidPermutation`] if `items` has a different length.
    pub fn apply<T: Clone>(&self, items: &[T]) -> Result<Vec<T>> {
        self.check_len(items.len())?;

        Ok(self
            .inverse()
            .positions
            .iter()
            .map(|&item| items[item].clone())
            .collect())
    }

    /// Gathers the rows of `rows`, one per item, into sequence order.
    pub fn arrange(&self, rows: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_len(rows.nrows())?;

        Ok(rows.select(Axis(0), &self.inverse().positions))
    }

    /// Scatters the rows of `rows`, in sequence order, back to item order.
    pub fn restore(&self, rows: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_len(rows.nrows())?;

        Ok(rows.select(Axis(0), &self.positions))
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len != self.len() {
            return Err(Error::InvalidPermutation(format!(
                "order over {} items applied to {} items",
                self.len(),
                len
            )));
        }

        Ok(())
    }
}

impl TryFrom<Vec<usize>> for Permutation {
    type Error = Error;

    fn try_from(positions: Vec<usize>) -> Result<Self> {
        Self::new(positions)
    }
}

impl From<Permutation> for Vec<usize> {
    fn from(permutation: Permutation) -> Self {
        permutation.positions
    }
}
