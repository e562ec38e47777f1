use std::collections::{BTreeMap, BTreeSet};

use crate::error::{MeshError, Result};

use super::{HexElement, MeshSink, NodeParameters, HEX_NODE_COUNT};

/// In-memory mesh that owns all emitted nodes, elements and groups.
///
/// Entities are keyed by the identifiers the generator assigns, so iteration
/// follows identifier order.
#[derive(Debug, Default)]
pub struct MeshStore {
    nodes: BTreeMap<u32, NodeParameters>,
    elements: BTreeMap<u32, HexElement>,
    groups: BTreeMap<String, BTreeSet<u32>>,
}

impl MeshStore {
    /// Creates a new, empty mesh store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Node queries ---

    /// Returns the parameters of a node, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NodeNotFound`] if no node has this identifier.
    pub fn node(&self, identifier: u32) -> std::result::Result<&NodeParameters, MeshError> {
        self.nodes
            .get(&identifier)
            .ok_or(MeshError::NodeNotFound(identifier))
    }

    /// Iterates over nodes in identifier order.
    pub fn nodes(&self) -> impl Iterator<Item = (u32, &NodeParameters)> {
        self.nodes.iter().map(|(id, n)| (*id, n))
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // --- Element queries ---

    /// Returns an element, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::ElementNotFound`] if no element has this identifier.
    pub fn element(&self, identifier: u32) -> std::result::Result<&HexElement, MeshError> {
        self.elements
            .get(&identifier)
            .ok_or(MeshError::ElementNotFound(identifier))
    }

    /// Iterates over elements in identifier order.
    pub fn elements(&self) -> impl Iterator<Item = &HexElement> {
        self.elements.values()
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    // --- Group queries ---

    /// Returns the elements of a named group, if it exists.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&BTreeSet<u32>> {
        self.groups.get(name)
    }

    fn check_remaps(element: &HexElement) -> std::result::Result<(), MeshError> {
        for remap in &element.remaps {
            if let Some(corner) = remap.local_nodes.iter().find(|&&n| n >= HEX_NODE_COUNT) {
                return Err(MeshError::InvalidRemap(format!(
                    "element {} remaps local node {corner}",
                    element.identifier
                )));
            }
            let scale_count = element.scale_factors.len();
            if let Some(index) = remap
                .terms
                .iter()
                .flat_map(|t| t.scale_factor_indexes.iter())
                .find(|&&i| i >= scale_count)
            {
                return Err(MeshError::InvalidRemap(format!(
                    "element {} uses scale factor {index} of {scale_count}",
                    element.identifier
                )));
            }
        }
        Ok(())
    }
}

impl MeshSink for MeshStore {
    fn create_node(&mut self, identifier: u32, parameters: NodeParameters) -> Result<()> {
        if self.nodes.contains_key(&identifier) {
            return Err(MeshError::DuplicateNode(identifier).into());
        }
        self.nodes.insert(identifier, parameters);
        Ok(())
    }

    fn create_element(&mut self, element: HexElement) -> Result<()> {
        if self.elements.contains_key(&element.identifier) {
            return Err(MeshError::DuplicateElement(element.identifier).into());
        }
        if let Some(&node) = element.node_ids.iter().find(|&&id| !self.nodes.contains_key(&id)) {
            return Err(MeshError::UnknownNode {
                element: element.identifier,
                node,
            }
            .into());
        }
        Self::check_remaps(&element)?;
        self.elements.insert(element.identifier, element);
        Ok(())
    }

    fn add_to_group(&mut self, group: &str, element: u32) -> Result<()> {
        if !self.elements.contains_key(&element) {
            return Err(MeshError::ElementNotFound(element).into());
        }
        self.groups.entry(group.to_owned()).or_default().insert(element);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::mesh::{BasisRemap, RemapTerm, ValueLabel};

    fn node() -> NodeParameters {
        NodeParameters {
            value: Point3::origin(),
            d1: None,
            d2: None,
            d3: None,
        }
    }

    fn store_with_nodes() -> MeshStore {
        let mut store = MeshStore::new();
        for id in 1..=8 {
            store.create_node(id, node()).unwrap();
        }
        store
    }

    fn hex(identifier: u32) -> HexElement {
        HexElement {
            identifier,
            node_ids: [1, 2, 3, 4, 5, 6, 7, 8],
            remaps: vec![],
            scale_factors: vec![],
        }
    }

    #[test]
    fn duplicate_node_rejected() {
        let mut store = store_with_nodes();
        assert!(store.create_node(3, node()).is_err());
        assert_eq!(store.node_count(), 8);
    }

    #[test]
    fn element_with_unknown_node_rejected() {
        let mut store = store_with_nodes();
        let mut e = hex(1);
        e.node_ids[7] = 99;
        assert!(store.create_element(e).is_err());
        assert_eq!(store.element_count(), 0);
    }

    #[test]
    fn duplicate_element_rejected() {
        let mut store = store_with_nodes();
        store.create_element(hex(1)).unwrap();
        assert!(store.create_element(hex(1)).is_err());
    }

    #[test]
    fn remap_scale_factor_must_exist() {
        let mut store = store_with_nodes();
        let mut e = hex(1);
        e.remaps.push(BasisRemap {
            local_nodes: vec![0],
            label: ValueLabel::D1,
            terms: vec![RemapTerm::scaled(ValueLabel::D2, 0)],
        });
        assert!(store.create_element(e.clone()).is_err());
        e.scale_factors.push(-1.0);
        store.create_element(e).unwrap();
    }

    #[test]
    fn groups_collect_elements() {
        let mut store = store_with_nodes();
        store.create_element(hex(1)).unwrap();
        store.add_to_group("shield", 1).unwrap();
        assert!(store.add_to_group("shield", 2).is_err());
        assert!(store.group("shield").unwrap().contains(&1));
        assert!(store.group("other").is_none());
    }
}
