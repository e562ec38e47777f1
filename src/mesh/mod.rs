//! Sink interface that receives generated nodes and hexahedral elements.
//!
//! Elements use tricubic Hermite interpolation without cross derivatives.
//! Each corner carries a value and three derivatives; a [`BasisRemap`] says
//! that, at some corners, a local derivative is backed by a different
//! combination of the node's stored derivatives.

mod store;

pub use store::MeshStore;

use crate::error::Result;
use crate::math::{Point3, Vector3};

/// Number of corner nodes of a hexahedral element.
pub const HEX_NODE_COUNT: usize = 8;

/// Node parameter labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueLabel {
    Value,
    D1,
    D2,
    D3,
}

/// Parameters stored at a node. Unset derivatives are omitted, not zero-filled.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeParameters {
    pub value: Point3,
    pub d1: Option<Vector3>,
    pub d2: Option<Vector3>,
    pub d3: Option<Vector3>,
}

impl NodeParameters {
    /// Returns the parameter for `label`, if stored.
    #[must_use]
    pub fn get(&self, label: ValueLabel) -> Option<Vector3> {
        match label {
            ValueLabel::Value => Some(self.value.coords),
            ValueLabel::D1 => self.d1,
            ValueLabel::D2 => self.d2,
            ValueLabel::D3 => self.d3,
        }
    }
}

/// One term of a remapped basis expression: a stored node parameter
/// multiplied by the product of the listed element scale factors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapTerm {
    pub label: ValueLabel,
    /// Indexes into [`HexElement::scale_factors`]; empty means unscaled.
    pub scale_factor_indexes: Vec<usize>,
}

impl RemapTerm {
    /// An unscaled term.
    #[must_use]
    pub fn plain(label: ValueLabel) -> Self {
        Self {
            label,
            scale_factor_indexes: Vec::new(),
        }
    }

    /// A term scaled by a single scale factor.
    #[must_use]
    pub fn scaled(label: ValueLabel, scale_factor_index: usize) -> Self {
        Self {
            label,
            scale_factor_indexes: vec![scale_factor_index],
        }
    }

    /// Returns true if the term carries any scale factor.
    #[must_use]
    pub fn is_scaled(&self) -> bool {
        !self.scale_factor_indexes.is_empty()
    }
}

/// Reinterprets `label` at the listed corners as a sum of terms.
///
/// Remaps of an element apply in order, and each rewrites only unscaled
/// terms that were present before any remap of that element ran: a term
/// introduced by one remap is never rewritten by a later one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasisRemap {
    /// Zero-based local corner indexes.
    pub local_nodes: Vec<usize>,
    pub label: ValueLabel,
    pub terms: Vec<RemapTerm>,
}

/// A hexahedral element ready for the sink.
///
/// Corners are ordered with the first index varying fastest:
/// `(0,0,0) (1,0,0) (0,1,0) (1,1,0) (0,0,1) (1,0,1) (0,1,1) (1,1,1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct HexElement {
    /// Element identifier.
    pub identifier: u32,
    /// Node identifiers at the local corners.
    pub node_ids: [u32; HEX_NODE_COUNT],
    /// Basis remaps, applied in order.
    pub remaps: Vec<BasisRemap>,
    /// Element scale factors referenced by remap terms.
    pub scale_factors: Vec<f64>,
}

impl HexElement {
    /// Returns true if no remap is installed.
    #[must_use]
    pub fn has_default_basis(&self) -> bool {
        self.remaps.is_empty()
    }

    /// Resolves the expression backing `label` at `local_node` after all remaps.
    #[must_use]
    pub fn resolve(&self, local_node: usize, label: ValueLabel) -> Vec<RemapTerm> {
        let mut terms: Vec<(RemapTerm, bool)> = vec![(RemapTerm::plain(label), true)];
        for remap in self.remaps.iter().filter(|r| r.local_nodes.contains(&local_node)) {
            terms = terms
                .into_iter()
                .flat_map(|(term, original)| {
                    if original && !term.is_scaled() && term.label == remap.label {
                        remap.terms.iter().map(|t| (t.clone(), false)).collect()
                    } else {
                        vec![(term, original)]
                    }
                })
                .collect();
        }
        terms.into_iter().map(|(term, _)| term).collect()
    }

    /// Evaluates the derivative backing `label` at `local_node` from stored
    /// node parameters.
    ///
    /// Returns `None` if a referenced parameter is unset or a scale factor
    /// index is out of range.
    #[must_use]
    pub fn evaluate(
        &self,
        local_node: usize,
        label: ValueLabel,
        node: &NodeParameters,
    ) -> Option<Vector3> {
        self.resolve(local_node, label)
            .iter()
            .try_fold(Vector3::zeros(), |acc, term| {
                let scale = term
                    .scale_factor_indexes
                    .iter()
                    .try_fold(1.0, |s, &i| self.scale_factors.get(i).map(|f| s * f))?;
                Some(acc + node.get(term.label)? * scale)
            })
    }
}

/// Receives the nodes and elements of a generated mesh.
pub trait MeshSink {
    /// Creates a node with the given parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is already in use.
    fn create_node(&mut self, identifier: u32, parameters: NodeParameters) -> Result<()>;

    /// Creates a hexahedral element.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is in use, a node is unknown, or a
    /// remap is malformed.
    fn create_element(&mut self, element: HexElement) -> Result<()>;

    /// Adds an existing element to a named group.
    ///
    /// # Errors
    ///
    /// Returns an error if the element does not exist.
    fn add_to_group(&mut self, group: &str, element: u32) -> Result<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn element(remaps: Vec<BasisRemap>) -> HexElement {
        HexElement {
            identifier: 1,
            node_ids: [1, 2, 3, 4, 5, 6, 7, 8],
            remaps,
            scale_factors: vec![-1.0],
        }
    }

    #[test]
    fn default_basis_resolves_to_itself() {
        let e = element(vec![]);
        assert!(e.has_default_basis());
        assert_eq!(e.resolve(3, ValueLabel::D2), vec![RemapTerm::plain(ValueLabel::D2)]);
    }

    #[test]
    fn swap_with_sign_is_not_rewritten_twice() {
        let e = element(vec![
            BasisRemap {
                local_nodes: vec![0, 4],
                label: ValueLabel::D1,
                terms: vec![RemapTerm::scaled(ValueLabel::D2, 0)],
            },
            BasisRemap {
                local_nodes: vec![0, 4],
                label: ValueLabel::D2,
                terms: vec![RemapTerm::plain(ValueLabel::D1)],
            },
        ]);
        assert_eq!(e.resolve(0, ValueLabel::D1), vec![RemapTerm::scaled(ValueLabel::D2, 0)]);
        assert_eq!(e.resolve(0, ValueLabel::D2), vec![RemapTerm::plain(ValueLabel::D1)]);
        assert_eq!(e.resolve(1, ValueLabel::D1), vec![RemapTerm::plain(ValueLabel::D1)]);
    }

    #[test]
    fn produced_plain_terms_survive_later_remaps() {
        let e = element(vec![
            BasisRemap {
                local_nodes: vec![2],
                label: ValueLabel::D2,
                terms: vec![RemapTerm::plain(ValueLabel::D1), RemapTerm::plain(ValueLabel::D2)],
            },
            BasisRemap {
                local_nodes: vec![2],
                label: ValueLabel::D1,
                terms: vec![RemapTerm::plain(ValueLabel::D2)],
            },
        ]);
        assert_eq!(
            e.resolve(2, ValueLabel::D2),
            vec![RemapTerm::plain(ValueLabel::D1), RemapTerm::plain(ValueLabel::D2)]
        );
        assert_eq!(e.resolve(2, ValueLabel::D1), vec![RemapTerm::plain(ValueLabel::D2)]);
    }

    #[test]
    fn evaluate_applies_scale_factors() {
        let e = element(vec![BasisRemap {
            local_nodes: vec![5],
            label: ValueLabel::D1,
            terms: vec![RemapTerm::plain(ValueLabel::D1), RemapTerm::scaled(ValueLabel::D2, 0)],
        }]);
        let node = NodeParameters {
            value: Point3::origin(),
            d1: Some(Vector3::new(1.0, 0.0, 0.0)),
            d2: Some(Vector3::new(0.0, 2.0, 0.0)),
            d3: None,
        };
        assert_eq!(e.evaluate(5, ValueLabel::D1, &node), Some(Vector3::new(1.0, -2.0, 0.0)));
        assert_eq!(e.evaluate(5, ValueLabel::D3, &node), None);
    }
}
