//! Shield-shaped hexahedral mesh with one element through the thickness.
//!
//! The mesh has a regular, flat-edged upper region and a rounded lower
//! region formed at two triple points, where three square element columns
//! merge. Generation runs in three phases owned by [`ShieldMesh`]:
//!
//! 1. the caller fills the regular region with [`ShieldMesh::set_point`],
//! 2. [`ShieldMesh::solve_triple_points`] fills the two merge points,
//! 3. [`ShieldMesh::generate_nodes`] then [`ShieldMesh::generate_elements`]
//!    emit everything to a [`MeshSink`](crate::mesh::MeshSink).
//!
//! Grid indexes are `(n3, n2, n1)`: through-thickness `n3` in `{0, 1}`, `n2`
//! up in `[0, elements_count_up]`, `n1` across in `[0, elements_count_across]`.

mod emit;
mod grid;
mod rim;
mod topology;
mod triple;

pub use grid::GridPoint;
pub use topology::{ElementKind, NodeSlot};

use tracing::debug;

use crate::error::{GridError, Result};
use crate::geometry::TrackSurface;
use crate::math::Point2;

use grid::PointGrid;

/// Element counts describing a shield, with derived counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShieldCounts {
    elements_count_up: usize,
    elements_count_across: usize,
    elements_count_rim: usize,
    elements_count_up_regular: usize,
    elements_count_across_bottom: usize,
}

impl ShieldCounts {
    /// Validates and creates a set of counts.
    ///
    /// Requires `up >= rim + 2` and `across >= 2 * rim + 4`, so the regular
    /// region is non-negative and each triple point's inward neighbour is an
    /// ordinary point rather than the other triple point.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidCounts`] if the counts are inconsistent.
    pub fn new(up: usize, across: usize, rim: usize) -> Result<Self> {
        let up_regular = up.checked_sub(2 + rim).ok_or_else(|| {
            GridError::InvalidCounts(format!("elements up {up} is less than rim {rim} + 2"))
        })?;
        let across_bottom = across.checked_sub(2 * rim).ok_or_else(|| {
            GridError::InvalidCounts(format!(
                "elements across {across} is less than twice rim {rim}"
            ))
        })?;
        if across_bottom < 4 {
            return Err(GridError::InvalidCounts(format!(
                "elements across {across} leaves {across_bottom} bottom elements, need at least 4"
            ))
            .into());
        }
        Ok(Self {
            elements_count_up: up,
            elements_count_across: across,
            elements_count_rim: rim,
            elements_count_up_regular: up_regular,
            elements_count_across_bottom: across_bottom,
        })
    }

    /// Number of elements up the shield.
    #[must_use]
    pub fn elements_count_up(&self) -> usize {
        self.elements_count_up
    }

    /// Number of elements across the shield.
    #[must_use]
    pub fn elements_count_across(&self) -> usize {
        self.elements_count_across
    }

    /// Number of elements around the rim band.
    #[must_use]
    pub fn elements_count_rim(&self) -> usize {
        self.elements_count_rim
    }

    /// `elements_count_up - 2 - elements_count_rim`
    #[must_use]
    pub fn elements_count_up_regular(&self) -> usize {
        self.elements_count_up_regular
    }

    /// `elements_count_across - 2 * elements_count_rim`
    #[must_use]
    pub fn elements_count_across_bottom(&self) -> usize {
        self.elements_count_across_bottom
    }

    /// `2 * elements_count_up_regular + elements_count_across_bottom`
    #[must_use]
    pub fn elements_count_around_full(&self) -> usize {
        2 * self.elements_count_up_regular + self.elements_count_across_bottom
    }
}

/// One of the two mirrored halves of the shield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Both sides, left first.
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// Sign applied to first-axis (`d1`) components on this side.
    #[must_use]
    pub fn sign(self) -> f64 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }

    /// Node column `offset` columns in from the rim on this side.
    #[must_use]
    pub fn column(self, counts: &ShieldCounts, offset: usize) -> usize {
        match self {
            Side::Left => counts.elements_count_rim + offset,
            Side::Right => counts.elements_count_across - counts.elements_count_rim - offset,
        }
    }
}

/// Shield mesh generator. Has one element through the thickness.
#[derive(Debug)]
pub struct ShieldMesh {
    counts: ShieldCounts,
    grid: PointGrid,
    track_surface: Option<TrackSurface>,
    proportions: Vec<Option<Point2>>,
    element_ids: Vec<Option<u32>>,
    unresolved_elements: Vec<(usize, usize)>,
    nodes_generated: bool,
    elements_generated: bool,
}

impl ShieldMesh {
    /// Creates an empty shield sized to `counts`.
    #[must_use]
    pub fn new(counts: ShieldCounts) -> Self {
        let grid = PointGrid::new(counts.elements_count_up + 1, counts.elements_count_across + 1);
        Self {
            counts,
            grid,
            track_surface: None,
            proportions: Vec::new(),
            element_ids: vec![None; counts.elements_count_up * counts.elements_count_across],
            unresolved_elements: Vec::new(),
            nodes_generated: false,
            elements_generated: false,
        }
    }

    /// Keeps solved triple points on `surface` and enables proportion storage.
    #[must_use]
    pub fn with_track_surface(mut self, surface: TrackSurface) -> Self {
        debug!(domain = ?surface.domain(), "shield mesh tracks surface");
        self.proportions = vec![None; self.grid.rows() * self.grid.columns()];
        self.track_surface = Some(surface);
        self
    }

    /// Returns the element counts.
    #[must_use]
    pub fn counts(&self) -> &ShieldCounts {
        &self.counts
    }

    /// Returns the track surface, if configured.
    #[must_use]
    pub fn track_surface(&self) -> Option<&TrackSurface> {
        self.track_surface.as_ref()
    }

    // --- Grid points ---

    /// Stores a point.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or nodes were already generated.
    pub fn set_point(&mut self, n3: usize, n2: usize, n1: usize, point: GridPoint) -> Result<()> {
        if self.nodes_generated {
            return Err(GridError::Frozen.into());
        }
        *self.grid.point_mut(n3, n2, n1)? = Some(point);
        Ok(())
    }

    /// Removes a point, returning it if it was set.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range or nodes were already generated.
    pub fn clear_point(&mut self, n3: usize, n2: usize, n1: usize) -> Result<Option<GridPoint>> {
        if self.nodes_generated {
            return Err(GridError::Frozen.into());
        }
        Ok(self.grid.point_mut(n3, n2, n1)?.take())
    }

    /// Returns the point at an index, or `None` if it is unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    pub fn point(&self, n3: usize, n2: usize, n1: usize) -> Result<Option<&GridPoint>> {
        self.grid.point(n3, n2, n1)
    }

    /// Returns the node identifier assigned to a point by [`Self::generate_nodes`].
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    pub fn node_id(&self, n3: usize, n2: usize, n1: usize) -> Result<Option<u32>> {
        self.grid.node_id(n3, n2, n1)
    }

    // --- Surface proportions ---

    fn proportion_index(&self, n2: usize, n1: usize) -> Result<usize> {
        if self.track_surface.is_none() {
            return Err(GridError::NoTrackSurface.into());
        }
        if n2 >= self.grid.rows() || n1 >= self.grid.columns() {
            return Err(GridError::IndexOutOfRange { n3: 0, n2, n1 }.into());
        }
        Ok(n2 * self.grid.columns() + n1)
    }

    /// Stores the track surface proportion of the points at `(n2, n1)`.
    ///
    /// # Errors
    ///
    /// Returns an error if no track surface is configured or the index is out of range.
    pub fn set_proportion(&mut self, n2: usize, n1: usize, proportion: Point2) -> Result<()> {
        let index = self.proportion_index(n2, n1)?;
        self.proportions[index] = Some(proportion);
        Ok(())
    }

    /// Returns the track surface proportion stored at `(n2, n1)`.
    ///
    /// # Errors
    ///
    /// Returns an error if no track surface is configured or the index is out of range.
    pub fn proportion(&self, n2: usize, n1: usize) -> Result<Option<Point2>> {
        let index = self.proportion_index(n2, n1)?;
        Ok(self.proportions[index])
    }

    // --- Elements ---

    fn element_index(&self, e2: usize, e1: usize) -> Result<usize> {
        if e2 >= self.counts.elements_count_up || e1 >= self.counts.elements_count_across {
            return Err(GridError::ElementIndexOutOfRange { e2, e1 }.into());
        }
        Ok(e2 * self.counts.elements_count_across + e1)
    }

    /// Returns the identifier of the element generated at `(e2, e1)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of range.
    pub fn element_id(&self, e2: usize, e1: usize) -> Result<Option<u32>> {
        Ok(self.element_ids[self.element_index(e2, e1)?])
    }

    /// Element cells inside the footprint that were skipped because a
    /// corner point was unset.
    #[must_use]
    pub fn unresolved_elements(&self) -> &[(usize, usize)] {
        &self.unresolved_elements
    }

    // --- Footprint ---

    /// Returns whether any element uses the points at `(n2, n1)`.
    ///
    /// The footprint is every row from `rim + 2` up, plus the columns between
    /// and including the two triple points below that.
    #[must_use]
    pub fn is_in_footprint(&self, n2: usize, n1: usize) -> bool {
        let c = &self.counts;
        if n2 > c.elements_count_up || n1 > c.elements_count_across {
            return false;
        }
        n2 >= c.elements_count_rim + 2
            || (Side::Left.column(c, 1)..=Side::Right.column(c, 1)).contains(&n1)
    }

    /// Checks that every point in the footprint is set.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::UnsetPoint`] for the first unset footprint point.
    pub fn check_footprint(&self) -> Result<()> {
        for n2 in 0..self.grid.rows() {
            for n3 in 0..2 {
                for n1 in 0..self.grid.columns() {
                    if self.is_in_footprint(n2, n1) && self.grid.point(n3, n2, n1)?.is_none() {
                        return Err(GridError::UnsetPoint { n3, n2, n1 }.into());
                    }
                }
            }
        }
        Ok(())
    }
}
