//! Euclidean rhythm generation using the bucket (Bresenham) algorithm.
//!
//! For each step the pulse count is added to an accumulator; whenever the
//! accumulator reaches the step count it wraps and the step becomes an onset.
//! This spreads `pulses` onsets as evenly as possible over `steps` slots, the
//! same distribution Bjorklund's algorithm yields up to rotation.

use std::fmt;
use std::ops::BitXor;

use arrayvec::ArrayVec;

/// Maximum number of steps a pattern can hold.
pub const MAX_STEPS: usize = 32;

/// A cyclic bit pattern of up to [`MAX_STEPS`] cells, stored inline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pattern {
    cells: ArrayVec<bool, MAX_STEPS>,
}

impl Pattern {
    /// Build a pattern from booleans. Cells beyond [`MAX_STEPS`] are dropped.
    pub fn from_cells(cells: impl IntoIterator<Item = bool>) -> Self {
        Self {
            cells: cells.into_iter().take(MAX_STEPS).collect(),
        }
    }

    /// Bucket-algorithm output, before any rotation.
    ///
    /// `steps` is clamped into `1..=32` and `pulses` into `0..=steps`.
    pub fn generate_unrotated(steps: usize, pulses: usize) -> Self {
        let steps = steps.clamp(1, MAX_STEPS);
        let pulses = pulses.min(steps);

        let mut cells = ArrayVec::new();
        let mut bucket = 0;
        for _ in 0..steps {
            bucket += pulses;
            if bucket >= steps {
                bucket -= steps;
                cells.push(true);
            } else {
                cells.push(false);
            }
        }
        Self { cells }
    }

    /// Euclidean pattern rotated right by one, so the last onset lands on step 0.
    ///
    /// ```
    /// use euclid_core::Pattern;
    ///
    /// assert_eq!(Pattern::generate(8, 3).to_string(), "10010010");
    /// ```
    pub fn generate(steps: usize, pulses: usize) -> Self {
        Self::generate_unrotated(steps, pulses).rotate_right()
    }

    /// Rotate right by one within the pattern length: the last cell moves to the front.
    pub fn rotate_right(mut self) -> Self {
        let n = 1.min(self.cells.len());
        self.cells.rotate_right(n);
        self
    }

    /// Cellwise XOR. The result is as long as the longer input; missing cells read as rests.
    pub fn xor(&self, other: &Pattern) -> Pattern {
        let len = self.len().max(other.len());
        Pattern::from_cells((0..len).map(|i| self.cell(i) ^ other.cell(i)))
    }

    /// Cell at `index` without wrapping; indices past the end are rests.
    pub fn cell(&self, index: usize) -> bool {
        self.cells.get(index).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of onsets.
    pub fn pulse_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.cells.iter().copied()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.cells
    }
}

impl BitXor for &Pattern {
    type Output = Pattern;

    fn bitxor(self, rhs: Self) -> Pattern {
        self.xor(rhs)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in self.iter() {
            f.write_str(if cell { "1" } else { "0" })?;
        }
        Ok(())
    }
}
