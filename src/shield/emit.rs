use tracing::{debug, warn};

use crate::error::{GridError, OperationError, Result};
use crate::mesh::{HexElement, MeshSink, NodeParameters, HEX_NODE_COUNT};

use super::{ElementKind, NodeSlot, ShieldMesh};

/// Returns `start + count`, the identifier following a block of `count`.
fn identifier_after(start: u32, count: usize, entity: &str) -> Result<u32> {
    u32::try_from(count)
        .ok()
        .and_then(|count| start.checked_add(count))
        .ok_or_else(|| {
            OperationError::InvalidInput(format!(
                "{count} {entity} identifiers starting at {start} overflow u32"
            ))
            .into()
        })
}

/// An element that has all its corner nodes.
struct PlannedElement {
    e2: usize,
    e1: usize,
    kind: ElementKind,
    node_ids: [u32; HEX_NODE_COUNT],
}

impl ShieldMesh {
    /// Creates a node for every set point and records its identifier.
    ///
    /// Points are visited row by row (`n2`), then layer (`n3`), then across
    /// (`n1`), so identifiers increase in that order. Once nodes exist the
    /// grid is frozen.
    ///
    /// Returns the next free node identifier, which must itself fit in `u32`.
    /// The identifier range is checked before the sink sees any node. If the
    /// sink rejects a node, the identifiers recorded on the grid are cleared
    /// so a later call starts afresh; nodes the sink already accepted stay in
    /// the sink.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::AlreadyGenerated`] on a second call,
    /// [`OperationError::InvalidInput`] if the identifiers overflow, or the
    /// sink's error if it rejects a node.
    pub fn generate_nodes<S: MeshSink + ?Sized>(
        &mut self,
        sink: &mut S,
        start: u32,
    ) -> Result<u32> {
        if self.nodes_generated {
            return Err(GridError::AlreadyGenerated("nodes").into());
        }
        let mut slots = Vec::new();
        for n2 in 0..self.grid.rows() {
            for n3 in 0..2 {
                for n1 in 0..self.grid.columns() {
                    if self.grid.point(n3, n2, n1)?.is_some() {
                        slots.push(NodeSlot::new(n3, n2, n1));
                    }
                }
            }
        }
        let next = identifier_after(start, slots.len(), "node")?;

        let mut identifier = start;
        for slot in &slots {
            if let Err(err) = self.emit_node(sink, *slot, identifier) {
                self.grid.clear_node_ids();
                return Err(err);
            }
            identifier += 1;
        }
        self.nodes_generated = true;
        debug!(created = slots.len(), first = start, next, "generated shield nodes");
        Ok(next)
    }

    fn emit_node<S: MeshSink + ?Sized>(
        &mut self,
        sink: &mut S,
        slot: NodeSlot,
        identifier: u32,
    ) -> Result<()> {
        let point = self.grid.require(slot.n3, slot.n2, slot.n1)?;
        let parameters = NodeParameters {
            value: point.position,
            d1: Some(point.d1),
            d2: Some(point.d2),
            d3: point.d3,
        };
        sink.create_node(identifier, parameters)?;
        self.grid.set_node_id(slot.n3, slot.n2, slot.n1, identifier)
    }

    /// Creates the hexahedral elements, adding each to every group in
    /// `mesh_groups`.
    ///
    /// Cells outside the footprint are skipped silently. A cell inside the
    /// footprint with an unset corner is skipped, logged and recorded in
    /// [`Self::unresolved_elements`].
    ///
    /// Returns the next free element identifier, which must itself fit in
    /// `u32`. If the sink rejects an element, recorded element identifiers
    /// and unresolved cells are cleared.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::NodesNotGenerated`] if called before
    /// [`Self::generate_nodes`], [`GridError::AlreadyGenerated`] on a second
    /// call, [`OperationError::InvalidInput`] if the identifiers overflow, or
    /// the sink's error if it rejects an element.
    pub fn generate_elements<S: MeshSink + ?Sized>(
        &mut self,
        sink: &mut S,
        start: u32,
        mesh_groups: &[&str],
    ) -> Result<u32> {
        if !self.nodes_generated {
            return Err(GridError::NodesNotGenerated.into());
        }
        if self.elements_generated {
            return Err(GridError::AlreadyGenerated("elements").into());
        }
        let mut planned = Vec::new();
        let mut unresolved = Vec::new();
        for e2 in 0..self.counts.elements_count_up() {
            for e1 in 0..self.counts.elements_count_across() {
                let kind = self.classify_element(e2, e1)?;
                let Some(slots) = self.corner_slots(kind, e2, e1) else {
                    continue;
                };
                let mut node_ids = [0u32; HEX_NODE_COUNT];
                let mut missing = None;
                for (node_id, slot) in node_ids.iter_mut().zip(&slots) {
                    match self.grid.node_id(slot.n3, slot.n2, slot.n1)? {
                        Some(id) => *node_id = id,
                        None => {
                            missing = Some(*slot);
                            break;
                        }
                    }
                }
                match missing {
                    Some(slot) => {
                        warn!(
                            e2,
                            e1,
                            ?kind,
                            n3 = slot.n3,
                            n2 = slot.n2,
                            n1 = slot.n1,
                            "skipping element with unset node"
                        );
                        unresolved.push((e2, e1));
                    }
                    None => planned.push(PlannedElement { e2, e1, kind, node_ids }),
                }
            }
        }
        let next = identifier_after(start, planned.len(), "element")?;

        let mut identifier = start;
        for element in &planned {
            if let Err(err) = Self::emit_element(sink, element, identifier, mesh_groups) {
                self.element_ids.fill(None);
                return Err(err);
            }
            let index = self.element_index(element.e2, element.e1)?;
            self.element_ids[index] = Some(identifier);
            identifier += 1;
        }
        self.unresolved_elements = unresolved;
        self.elements_generated = true;
        debug!(
            created = planned.len(),
            unresolved = self.unresolved_elements.len(),
            next,
            "generated shield elements"
        );
        Ok(next)
    }

    fn emit_element<S: MeshSink + ?Sized>(
        sink: &mut S,
        element: &PlannedElement,
        identifier: u32,
        mesh_groups: &[&str],
    ) -> Result<()> {
        let (remaps, scale_factors) = element.kind.basis();
        sink.create_element(HexElement {
            identifier,
            node_ids: element.node_ids,
            remaps,
            scale_factors,
        })?;
        for group in mesh_groups {
            sink.add_to_group(group, identifier)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::super::fixtures::planar_shield;
    use super::*;
    use crate::error::{MeshError, ShieldError};
    use crate::math::{Point3, Vector3};
    use crate::mesh::{MeshStore, ValueLabel};
    use crate::shield::{GridPoint, Side};

    fn empty_node() -> NodeParameters {
        NodeParameters {
            value: Point3::origin(),
            d1: None,
            d2: None,
            d3: None,
        }
    }

    fn solved_shield() -> ShieldMesh {
        let mut shield = planar_shield(5, 7, 1);
        shield.solve_triple_points(0).unwrap();
        shield.solve_triple_points(1).unwrap();
        shield
    }

    #[test]
    fn nodes_follow_row_layer_column_order() {
        let mut shield = solved_shield();
        let mut store = MeshStore::new();
        assert_eq!(shield.generate_nodes(&mut store, 101).unwrap(), 173);
        assert_eq!(store.node_count(), 72);
        // Row 0 holds columns 2..=5 in each layer.
        assert_eq!(shield.node_id(0, 0, 2).unwrap(), Some(101));
        assert_eq!(shield.node_id(0, 0, 5).unwrap(), Some(104));
        assert_eq!(shield.node_id(1, 0, 2).unwrap(), Some(105));
        assert_eq!(shield.node_id(0, 3, 0).unwrap(), Some(125));
        assert_eq!(shield.node_id(0, 0, 0).unwrap(), None);

        let node = store.node(shield.node_id(1, 4, 4).unwrap().unwrap()).unwrap();
        assert_eq!(node.value, Point3::new(4.0, 4.0, 1.0));
        assert_eq!(node.d3, Some(Vector3::z()));
    }

    #[test]
    fn node_without_d3_omits_it() {
        let mut shield = solved_shield();
        let point = GridPoint::new(Point3::new(7.0, 5.0, 0.0), Vector3::x(), Vector3::y());
        shield.set_point(0, 5, 7, point).unwrap();
        let mut store = MeshStore::new();
        shield.generate_nodes(&mut store, 1).unwrap();
        let node = store.node(shield.node_id(0, 5, 7).unwrap().unwrap()).unwrap();
        assert_eq!(node.d3, None);
        assert!(node.get(ValueLabel::D2).is_some());
    }

    #[test]
    fn all_footprint_elements_are_created() {
        let mut shield = solved_shield();
        let mut store = MeshStore::new();
        shield.generate_nodes(&mut store, 1).unwrap();
        assert_eq!(shield.generate_elements(&mut store, 1, &["shield", "body"]).unwrap(), 28);
        assert_eq!(store.element_count(), 27);
        assert!(shield.unresolved_elements().is_empty());
        assert_eq!(store.group("shield").unwrap().len(), 27);
        assert_eq!(store.group("body").unwrap().len(), 27);

        assert_eq!(shield.element_id(0, 0).unwrap(), None);
        assert_eq!(shield.element_id(0, 2).unwrap(), Some(1));
        for element in store.elements() {
            let distinct: HashSet<_> = element.node_ids.iter().collect();
            assert_eq!(distinct.len(), HEX_NODE_COUNT, "element {}", element.identifier);
        }
    }

    #[test]
    fn merge_elements_reference_triple_points() {
        let mut shield = solved_shield();
        let mut store = MeshStore::new();
        shield.generate_nodes(&mut store, 1).unwrap();
        shield.generate_elements(&mut store, 1, &[]).unwrap();

        let left_triple = shield.node_id(0, 2, 2).unwrap().unwrap();
        let merge = store.element(shield.element_id(2, 1).unwrap().unwrap()).unwrap();
        assert_eq!(merge.node_ids[1], left_triple);
        assert_eq!(merge.node_ids[0], shield.node_id(0, 1, 2).unwrap().unwrap());
        assert_eq!(merge.scale_factors, vec![-1.0]);

        let rim = store.element(shield.element_id(2, 0).unwrap().unwrap()).unwrap();
        assert_eq!(rim.node_ids[0], shield.node_id(0, 0, 2).unwrap().unwrap());
        assert!(rim.has_default_basis());

        let band = store.element(shield.element_id(1, 2).unwrap().unwrap()).unwrap();
        assert_eq!(band.node_ids[2], left_triple);
        assert_eq!(band.scale_factors, vec![-1.0]);
        assert!(!band.has_default_basis());

        let regular = store.element(shield.element_id(3, 3).unwrap().unwrap()).unwrap();
        assert!(regular.has_default_basis());
        assert!(regular.scale_factors.is_empty());
        assert_eq!(shield.classify_element(0, 3).unwrap(), ElementKind::RimCorner(Side::Left));
    }

    #[test]
    fn unset_corner_skips_element() {
        let mut shield = solved_shield();
        shield.clear_point(0, 5, 0).unwrap();
        let mut store = MeshStore::new();
        assert_eq!(shield.generate_nodes(&mut store, 1).unwrap(), 72);
        assert_eq!(shield.generate_elements(&mut store, 1, &[]).unwrap(), 27);
        assert_eq!(shield.unresolved_elements(), &[(4, 0)]);
        assert_eq!(shield.element_id(4, 0).unwrap(), None);
        assert_eq!(shield.element_id(4, 1).unwrap(), Some(21));
    }

    #[test]
    fn generation_phases_are_ordered() {
        let mut shield = solved_shield();
        let mut store = MeshStore::new();
        assert!(matches!(
            shield.generate_elements(&mut store, 1, &[]).unwrap_err(),
            ShieldError::Grid(GridError::NodesNotGenerated)
        ));
        shield.generate_nodes(&mut store, 1).unwrap();
        assert!(matches!(
            shield.generate_nodes(&mut store, 500).unwrap_err(),
            ShieldError::Grid(GridError::AlreadyGenerated("nodes"))
        ));
        assert!(matches!(
            shield.clear_point(0, 3, 3).unwrap_err(),
            ShieldError::Grid(GridError::Frozen)
        ));
        assert!(shield.solve_triple_points(0).is_err());
        shield.generate_elements(&mut store, 1, &[]).unwrap();
        assert!(matches!(
            shield.generate_elements(&mut store, 100, &[]).unwrap_err(),
            ShieldError::Grid(GridError::AlreadyGenerated("elements"))
        ));
    }

    #[test]
    fn sink_errors_propagate() {
        let mut shield = solved_shield();
        let mut store = MeshStore::new();
        store.create_node(3, empty_node()).unwrap();
        assert!(matches!(
            shield.generate_nodes(&mut store, 1).unwrap_err(),
            ShieldError::Mesh(MeshError::DuplicateNode(3))
        ));
    }

    #[test]
    fn failed_node_generation_can_be_retried() {
        let mut shield = solved_shield();
        let mut store = MeshStore::new();
        store.create_node(3, empty_node()).unwrap();
        assert!(shield.generate_nodes(&mut store, 1).is_err());
        // Nodes 1 and 2 reached the sink, but the grid forgets them.
        assert_eq!(store.node_count(), 3);
        assert_eq!(shield.node_id(0, 0, 2).unwrap(), None);
        assert!(shield.clear_point(0, 5, 7).unwrap().is_some());

        assert_eq!(shield.generate_nodes(&mut store, 1001).unwrap(), 1072);
        assert_eq!(shield.node_id(0, 0, 2).unwrap(), Some(1001));
        assert_eq!(store.node_count(), 74);
        assert_eq!(shield.generate_elements(&mut store, 1, &[]).unwrap(), 27);
    }

    #[test]
    fn next_identifier_may_be_the_largest_u32() {
        let mut shield = solved_shield();
        let mut store = MeshStore::new();
        assert_eq!(shield.generate_nodes(&mut store, u32::MAX - 72).unwrap(), u32::MAX);
        assert_eq!(shield.node_id(1, 5, 7).unwrap(), Some(u32::MAX - 1));
        assert_eq!(
            shield.generate_elements(&mut store, u32::MAX - 27, &[]).unwrap(),
            u32::MAX
        );
    }

    #[test]
    fn identifier_overflow_is_rejected_before_emission() {
        let mut shield = solved_shield();
        let mut store = MeshStore::new();
        assert!(matches!(
            shield.generate_nodes(&mut store, u32::MAX - 71).unwrap_err(),
            ShieldError::Operation(OperationError::InvalidInput(_))
        ));
        assert_eq!(store.node_count(), 0);
        assert_eq!(shield.node_id(0, 0, 2).unwrap(), None);

        shield.generate_nodes(&mut store, 1).unwrap();
        assert!(shield.generate_elements(&mut store, u32::MAX - 26, &[]).is_err());
        assert_eq!(store.element_count(), 0);
        assert_eq!(shield.generate_elements(&mut store, 1, &[]).unwrap(), 28);
    }

    #[test]
    fn failed_element_generation_clears_element_ids() {
        let mut shield = solved_shield();
        let mut store = MeshStore::new();
        shield.generate_nodes(&mut store, 1).unwrap();
        let blocker = HexElement {
            identifier: 5,
            node_ids: [1, 2, 3, 4, 5, 6, 7, 8],
            remaps: Vec::new(),
            scale_factors: Vec::new(),
        };
        store.create_element(blocker).unwrap();
        assert!(matches!(
            shield.generate_elements(&mut store, 1, &["shield"]).unwrap_err(),
            ShieldError::Mesh(MeshError::DuplicateElement(5))
        ));
        assert_eq!(shield.element_id(0, 2).unwrap(), None);
        assert_eq!(shield.generate_elements(&mut store, 100, &["shield"]).unwrap(), 127);
        assert_eq!(shield.element_id(0, 2).unwrap(), Some(100));
    }
}
