use crate::error::{GridError, Result};

use super::{ShieldCounts, ShieldMesh};

impl ShieldCounts {
    /// Converts an index around the lower rim to grid coordinates `(n1, n2)`.
    ///
    /// Index 0 is the top of the left edge. The walk descends the left edge,
    /// crosses the bottom row, and climbs the right edge, ending at
    /// [`Self::elements_count_around_full`].
    ///
    /// # Errors
    ///
    /// Returns [`GridError::RimIndexOutOfRange`] if `ix` exceeds
    /// `elements_count_around_full`.
    pub fn convert_rim_index(&self, ix: usize) -> Result<(usize, usize)> {
        let around_full = self.elements_count_around_full();
        if ix > around_full {
            return Err(GridError::RimIndexOutOfRange {
                index: ix,
                max: around_full,
            }
            .into());
        }
        if ix <= self.elements_count_up_regular {
            return Ok((0, self.elements_count_up - ix));
        }
        let rx = around_full - ix;
        if rx <= self.elements_count_up_regular {
            return Ok((self.elements_count_across, self.elements_count_up - rx));
        }
        Ok((self.elements_count_rim + ix - self.elements_count_up_regular, 0))
    }
}

impl ShieldMesh {
    /// See [`ShieldCounts::convert_rim_index`].
    ///
    /// # Errors
    ///
    /// Returns an error if `ix` is out of range.
    pub fn convert_rim_index(&self, ix: usize) -> Result<(usize, usize)> {
        self.counts.convert_rim_index(ix)
    }
}
