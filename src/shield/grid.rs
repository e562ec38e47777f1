use crate::error::{GridError, Result};
use crate::math::{Point3, Vector3};

/// Coordinates and derivatives of one grid point.
///
/// Both in-plane derivatives are always present; `d3` may be left for the
/// sink to omit.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    /// Coordinates of the point.
    pub position: Point3,
    /// Derivative across the shield.
    pub d1: Vector3,
    /// Derivative up the shield.
    pub d2: Vector3,
    /// Through-thickness derivative, if known.
    pub d3: Option<Vector3>,
}

impl GridPoint {
    /// Creates a point without a through-thickness derivative.
    #[must_use]
    pub fn new(position: Point3, d1: Vector3, d2: Vector3) -> Self {
        Self {
            position,
            d1,
            d2,
            d3: None,
        }
    }

    /// Sets the through-thickness derivative.
    #[must_use]
    pub fn with_d3(mut self, d3: Vector3) -> Self {
        self.d3 = Some(d3);
        self
    }
}

/// Dense `2 x rows x columns` store of optional points and their node identifiers.
#[derive(Debug)]
pub(crate) struct PointGrid {
    rows: usize,
    columns: usize,
    points: Vec<Option<GridPoint>>,
    node_ids: Vec<Option<u32>>,
}

impl PointGrid {
    pub(crate) fn new(rows: usize, columns: usize) -> Self {
        let len = 2 * rows * columns;
        Self {
            rows,
            columns,
            points: vec![None; len],
            node_ids: vec![None; len],
        }
    }

    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    pub(crate) fn columns(&self) -> usize {
        self.columns
    }

    fn index(&self, n3: usize, n2: usize, n1: usize) -> Result<usize> {
        if n3 >= 2 || n2 >= self.rows || n1 >= self.columns {
            return Err(GridError::IndexOutOfRange { n3, n2, n1 }.into());
        }
        Ok((n3 * self.rows + n2) * self.columns + n1)
    }

    pub(crate) fn point(&self, n3: usize, n2: usize, n1: usize) -> Result<Option<&GridPoint>> {
        Ok(self.points[self.index(n3, n2, n1)?].as_ref())
    }

    pub(crate) fn point_mut(
        &mut self,
        n3: usize,
        n2: usize,
        n1: usize,
    ) -> Result<&mut Option<GridPoint>> {
        let index = self.index(n3, n2, n1)?;
        Ok(&mut self.points[index])
    }

    /// Returns the point, treating an unset point as a precondition violation.
    pub(crate) fn require(&self, n3: usize, n2: usize, n1: usize) -> Result<&GridPoint> {
        self.point(n3, n2, n1)?
            .ok_or_else(|| GridError::UnsetPoint { n3, n2, n1 }.into())
    }

    pub(crate) fn node_id(&self, n3: usize, n2: usize, n1: usize) -> Result<Option<u32>> {
        Ok(self.node_ids[self.index(n3, n2, n1)?])
    }

    pub(crate) fn clear_node_ids(&mut self) {
        self.node_ids.fill(None);
    }

    pub(crate) fn set_node_id(
        &mut self,
        n3: usize,
        n2: usize,
        n1: usize,
        identifier: u32,
    ) -> Result<()> {
        let index = self.index(n3, n2, n1)?;
        self.node_ids[index] = Some(identifier);
        Ok(())
    }
}
