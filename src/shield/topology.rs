//! Element classification, corner selection and basis remaps.
//!
//! Element `(e2, e1)` spans grid cells `[e2, e2 + 1] x [e1, e1 + 1]` unless
//! its kind redirects some corners. Around the triple points the stored `d1`
//! and `d2` rotate relative to the element axes, which the remap table
//! below compensates for with a single `-1` scale factor.

use crate::error::{GridError, Result};
use crate::mesh::ValueLabel::{D1, D2};
use crate::mesh::{BasisRemap, RemapTerm, ValueLabel, HEX_NODE_COUNT};

use super::{ShieldCounts, ShieldMesh, Side};

/// Placement of an element cell relative to the triple points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Outside the footprint; no element.
    Excluded,
    /// Plain cell with the default basis.
    Regular,
    /// Below the rim row, between the triple point columns. Corners are
    /// re-ordered so the element axes follow the rim.
    RimCorner(Side),
    /// The rim row. `d1` and `d2` swap with a sign flip on the side of the
    /// midline given by `half`; `centre` elements remap only the corners on
    /// their outer edge. `beside_left`/`beside_right` mark the elements
    /// touching a triple point from above.
    RimBand {
        half: Side,
        centre: bool,
        beside_left: bool,
        beside_right: bool,
    },
    /// Merge row outside a triple point: the rim collapses into a column.
    MergeRim(Side),
    /// Merge row element with a triple point corner.
    MergeTriple(Side),
}

/// A grid point referenced by an element corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeSlot {
    /// Through-thickness layer, 0 or 1.
    pub n3: usize,
    /// Row index up the shield.
    pub n2: usize,
    /// Column index across the shield.
    pub n1: usize,
}

impl NodeSlot {
    /// Creates a slot from grid indexes.
    #[must_use]
    pub fn new(n3: usize, n2: usize, n1: usize) -> Self {
        Self { n3, n2, n1 }
    }
}

const LEFT_CORNER_ORDER: [usize; HEX_NODE_COUNT] = [1, 3, 0, 2, 5, 7, 4, 6];
const RIGHT_CORNER_ORDER: [usize; HEX_NODE_COUNT] = [2, 0, 3, 1, 6, 4, 7, 5];

/// One declarative remap: at `local_nodes`, `label` becomes the sum of
/// `terms`, each optionally negated by scale factor 0.
struct RemapRule {
    local_nodes: &'static [usize],
    label: ValueLabel,
    terms: &'static [(ValueLabel, bool)],
}

impl RemapRule {
    fn to_remap(&self) -> BasisRemap {
        BasisRemap {
            local_nodes: self.local_nodes.to_vec(),
            label: self.label,
            terms: self
                .terms
                .iter()
                .map(|&(label, negate)| {
                    if negate {
                        RemapTerm::scaled(label, NEGATE_FACTOR)
                    } else {
                        RemapTerm::plain(label)
                    }
                })
                .collect(),
        }
    }
}

/// Index of the `-1` scale factor.
const NEGATE_FACTOR: usize = 0;
const NEG: bool = true;
const POS: bool = false;

const RIM_LEFT: &[RemapRule] = &[
    RemapRule {
        local_nodes: &[0, 1, 4, 5],
        label: D1,
        terms: &[(D2, NEG)],
    },
    RemapRule {
        local_nodes: &[0, 1, 4, 5],
        label: D2,
        terms: &[(D1, POS)],
    },
];
const RIM_LEFT_CENTRE: &[RemapRule] = &[
    RemapRule {
        local_nodes: &[0, 4],
        label: D1,
        terms: &[(D2, NEG)],
    },
    RemapRule {
        local_nodes: &[0, 4],
        label: D2,
        terms: &[(D1, POS)],
    },
];
const RIM_RIGHT: &[RemapRule] = &[
    RemapRule {
        local_nodes: &[0, 1, 4, 5],
        label: D2,
        terms: &[(D1, NEG)],
    },
    RemapRule {
        local_nodes: &[0, 1, 4, 5],
        label: D1,
        terms: &[(D2, POS)],
    },
];
const RIM_RIGHT_CENTRE: &[RemapRule] = &[
    RemapRule {
        local_nodes: &[1, 5],
        label: D2,
        terms: &[(D1, NEG)],
    },
    RemapRule {
        local_nodes: &[1, 5],
        label: D1,
        terms: &[(D2, POS)],
    },
];
const BESIDE_LEFT_TRIPLE: &[RemapRule] = &[
    RemapRule {
        local_nodes: &[2, 6],
        label: D2,
        terms: &[(D1, POS), (D2, POS)],
    },
];
const BESIDE_RIGHT_TRIPLE: &[RemapRule] = &[
    RemapRule {
        local_nodes: &[3, 7],
        label: D2,
        terms: &[(D1, NEG), (D2, POS)],
    },
];
const MERGE_LEFT_TRIPLE: &[RemapRule] = &[
    RemapRule {
        local_nodes: &[1, 5],
        label: D1,
        terms: &[(D1, POS), (D2, POS)],
    },
];
const MERGE_RIGHT_TRIPLE: &[RemapRule] = &[
    RemapRule {
        local_nodes: &[0, 4],
        label: D1,
        terms: &[(D1, POS), (D2, NEG)],
    },
];

impl ElementKind {
    /// Classifies element cell `(e2, e1)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell is outside the element index range.
    pub fn classify(counts: &ShieldCounts, e2: usize, e1: usize) -> Result<Self> {
        let up = counts.elements_count_up();
        let across = counts.elements_count_across();
        if e2 >= up || e1 >= across {
            return Err(GridError::ElementIndexOutOfRange { e2, e1 }.into());
        }
        let rim = counts.elements_count_rim();
        let (e1a, e1b) = (rim, rim + 1);
        let e1z = across - 1 - rim;
        let e1y = e1z - 1;
        let (e2a, e2b) = (rim, rim + 1);
        let half_across = (across + 1) / 2;
        let half = if e1 < half_across { Side::Left } else { Side::Right };

        let kind = if e2 < e2b {
            if e1 < e1b || e1 > e1y {
                ElementKind::Excluded
            } else if e2 < e2a {
                ElementKind::RimCorner(half)
            } else {
                ElementKind::RimBand {
                    half,
                    centre: e1 + 1 == half_across || e1 == half_across,
                    beside_left: e1 == e1b,
                    beside_right: e1 == e1y,
                }
            }
        } else if e2 == e2b {
            match e1 {
                _ if e1 < e1a => ElementKind::MergeRim(Side::Left),
                _ if e1 == e1a => ElementKind::MergeTriple(Side::Left),
                _ if e1 == e1z => ElementKind::MergeTriple(Side::Right),
                _ if e1 > e1z => ElementKind::MergeRim(Side::Right),
                _ => ElementKind::Regular,
            }
        } else {
            ElementKind::Regular
        };
        Ok(kind)
    }

    /// Returns the grid points backing each local corner, or `None` for
    /// excluded cells.
    #[must_use]
    pub fn corner_slots(
        self,
        counts: &ShieldCounts,
        e2: usize,
        e1: usize,
    ) -> Option<[NodeSlot; HEX_NODE_COUNT]> {
        let mut slots = [
            NodeSlot::new(0, e2, e1),
            NodeSlot::new(0, e2, e1 + 1),
            NodeSlot::new(0, e2 + 1, e1),
            NodeSlot::new(0, e2 + 1, e1 + 1),
            NodeSlot::new(1, e2, e1),
            NodeSlot::new(1, e2, e1 + 1),
            NodeSlot::new(1, e2 + 1, e1),
            NodeSlot::new(1, e2 + 1, e1 + 1),
        ];
        let rim = counts.elements_count_rim();
        let n1b = Side::Left.column(counts, 1);
        let n1z = Side::Right.column(counts, 1);
        match self {
            ElementKind::Excluded => return None,
            ElementKind::Regular | ElementKind::RimBand { .. } => {}
            ElementKind::RimCorner(side) => {
                let order = match side {
                    Side::Left => LEFT_CORNER_ORDER,
                    Side::Right => RIGHT_CORNER_ORDER,
                };
                slots = order.map(|i| slots[i]);
            }
            ElementKind::MergeRim(Side::Left) => {
                let e2r = e1;
                for n3 in 0..2 {
                    slots[4 * n3] = NodeSlot::new(n3, e2r, n1b);
                    slots[4 * n3 + 1] = NodeSlot::new(n3, e2r + 1, n1b);
                }
            }
            ElementKind::MergeRim(Side::Right) => {
                let e2r = counts.elements_count_across() - e1;
                for n3 in 0..2 {
                    slots[4 * n3] = NodeSlot::new(n3, e2r, n1z);
                    slots[4 * n3 + 1] = NodeSlot::new(n3, e2r - 1, n1z);
                }
            }
            ElementKind::MergeTriple(Side::Left) => {
                for n3 in 0..2 {
                    slots[4 * n3] = NodeSlot::new(n3, rim, n1b);
                }
            }
            ElementKind::MergeTriple(Side::Right) => {
                for n3 in 0..2 {
                    slots[4 * n3 + 1] = NodeSlot::new(n3, rim, n1z);
                }
            }
        }
        Some(slots)
    }

    fn remap_rules(self) -> Vec<&'static RemapRule> {
        match self {
            ElementKind::RimBand {
                half,
                centre,
                beside_left,
                beside_right,
            } => {
                let swap = match (half, centre) {
                    (Side::Left, false) => RIM_LEFT,
                    (Side::Left, true) => RIM_LEFT_CENTRE,
                    (Side::Right, false) => RIM_RIGHT,
                    (Side::Right, true) => RIM_RIGHT_CENTRE,
                };
                let mut rules: Vec<_> = swap.iter().collect();
                if beside_left {
                    rules.extend(BESIDE_LEFT_TRIPLE);
                }
                if beside_right {
                    rules.extend(BESIDE_RIGHT_TRIPLE);
                }
                rules
            }
            ElementKind::MergeTriple(Side::Left) => MERGE_LEFT_TRIPLE.iter().collect(),
            ElementKind::MergeTriple(Side::Right) => MERGE_RIGHT_TRIPLE.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Returns the basis remaps and scale factors for this kind of element.
    #[must_use]
    pub fn basis(self) -> (Vec<BasisRemap>, Vec<f64>) {
        match self {
            ElementKind::RimBand { .. } | ElementKind::MergeTriple(_) => (
                self.remap_rules().into_iter().map(RemapRule::to_remap).collect(),
                vec![-1.0],
            ),
            _ => (Vec::new(), Vec::new()),
        }
    }
}

impl ShieldMesh {
    /// Classifies element cell `(e2, e1)` of this shield.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell is outside the element index range.
    pub fn classify_element(&self, e2: usize, e1: usize) -> Result<ElementKind> {
        ElementKind::classify(&self.counts, e2, e1)
    }

    /// Returns the grid points backing each corner of element `(e2, e1)`
    /// classified as `kind`.
    #[must_use]
    pub fn corner_slots(
        &self,
        kind: ElementKind,
        e2: usize,
        e1: usize,
    ) -> Option<[NodeSlot; HEX_NODE_COUNT]> {
        kind.corner_slots(&self.counts, e2, e1)
    }
}
