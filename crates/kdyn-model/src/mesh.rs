//! Mesh data structures for the keyword-deck reader.
//!
//! Records live in arena `Vec`s with stable indices; id-keyed maps
//! resolve external ids to arena slots. Elements hold arena indices
//! rather than copied coordinates, so filling in a placeholder node is
//! visible to every element that already references it.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use kdyn_deck::Provenance;
use serde::Serialize;

use crate::diag::{Diagnostic, DiagnosticKind};

/// Stable index of a node slot in the model arena.
pub type NodeRef = usize;
/// Stable index of an element slot in the model arena.
pub type ElemRef = usize;
/// Stable index of a part slot in the model arena.
pub type PartRef = usize;

/// Element kind, taken from the first qualifier of an `*ELEMENT_*`
/// header. Other sub-variants are intentionally unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ElementKind {
    Beam,
    Discrete,
    Shell,
    Solid,
}

/// Lookup order for queries that take a bare element id.
pub const ELEMENT_KINDS: [ElementKind; 4] = [
    ElementKind::Beam,
    ElementKind::Discrete,
    ElementKind::Shell,
    ElementKind::Solid,
];

impl ElementKind {
    /// Maximum node-slot count for this kind; trailing slots on the data
    /// line beyond this are ignored.
    pub fn max_nodes(self) -> usize {
        match self {
            ElementKind::Beam => 3,
            ElementKind::Discrete => 2,
            ElementKind::Shell => 8,
            ElementKind::Solid => 8,
        }
    }

    /// Resolve a header qualifier token, case-insensitively.
    pub fn from_qualifier(qualifier: &str) -> Option<Self> {
        match qualifier.to_ascii_uppercase().as_str() {
            "BEAM" => Some(ElementKind::Beam),
            "DISCRETE" => Some(ElementKind::Discrete),
            "SHELL" => Some(ElementKind::Shell),
            "SOLID" => Some(ElementKind::Solid),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Beam => "BEAM",
            ElementKind::Discrete => "DISCRETE",
            ElementKind::Shell => "SHELL",
            ElementKind::Solid => "SOLID",
        }
    }
}

impl Display for ElementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A mesh node. `coord == None` marks a placeholder created by an
/// element forward reference before any `*NODE` line defined the id.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub coord: Option<[f64; 3]>,
    /// Set when the node is explicitly defined by a `*NODE` line.
    pub origin: Option<Provenance>,
    /// True once the coordinate was changed through the public API;
    /// drives the best-effort rewrite pass.
    pub modified: bool,
}

impl Node {
    fn placeholder(id: i64) -> Self {
        Self {
            id,
            coord: None,
            origin: None,
            modified: false,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.coord.is_some()
    }
}

/// An element: connectivity as node arena indices, duplicates preserved.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: i64,
    pub pid: i64,
    pub kind: ElementKind,
    pub nodes: Vec<NodeRef>,
    pub origin: Provenance,
}

/// A part: free-text header label, the eight metadata fields of the
/// `*PART` card, and the set of elements attached under its pid.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub id: i64,
    pub header: String,
    pub secid: i64,
    pub mid: i64,
    pub eosid: i64,
    pub hgid: i64,
    pub grav: i64,
    pub adpopt: i64,
    pub tmid: i64,
    /// Homogeneous kind of the part's elements; `None` until the first
    /// element is attached.
    pub kind: Option<ElementKind>,
    pub elements: Vec<ElemRef>,
    /// First line of the defining `*PART` block, once parsed.
    pub origin: Option<Provenance>,
}

impl Part {
    fn placeholder(id: i64) -> Self {
        Self {
            id,
            header: String::new(),
            secid: 0,
            mid: 0,
            eosid: 0,
            hgid: 0,
            grav: 0,
            adpopt: 0,
            tmid: 0,
            kind: None,
            elements: Vec::new(),
            origin: None,
        }
    }
}

/// The mutable aggregate built by one ingestion pass and treated as a
/// stable value afterwards.
#[derive(Debug, Clone, Default)]
pub struct DynaModel {
    pub(crate) nodes: Vec<Node>,
    pub(crate) node_index: HashMap<i64, NodeRef>,
    pub(crate) elements: Vec<Element>,
    pub(crate) element_index: HashMap<(i64, ElementKind), ElemRef>,
    pub(crate) parts: Vec<Part>,
    pub(crate) part_index: HashMap<i64, PartRef>,
    pub(crate) files: Vec<PathBuf>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl DynaModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source file and return its provenance index.
    pub fn register_file(&mut self, path: impl Into<PathBuf>) -> usize {
        self.files.push(path.into());
        self.files.len() - 1
    }

    pub fn file_path(&self, file: usize) -> Option<&Path> {
        self.files.get(file).map(PathBuf::as_path)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    // ----- node access -----

    /// Arena slot for `id`, creating an undefined placeholder if the id
    /// has never been seen. Used by the element handler for forward
    /// references.
    pub(crate) fn intern_node(&mut self, id: i64) -> NodeRef {
        if let Some(&slot) = self.node_index.get(&id) {
            return slot;
        }
        let slot = self.nodes.len();
        self.nodes.push(Node::placeholder(id));
        self.node_index.insert(id, slot);
        slot
    }

    pub fn node_ref(&self, id: i64) -> Option<NodeRef> {
        self.node_index.get(&id).copied()
    }

    /// Node by external id; `None` when the id is absent from the
    /// mapping entirely (distinct from present-but-undefined).
    pub fn node(&self, id: i64) -> Option<&Node> {
        self.node_ref(id).map(|slot| &self.nodes[slot])
    }

    pub fn node_at(&self, slot: NodeRef) -> &Node {
        &self.nodes[slot]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Resolve a list of node ids to coordinates. Misses and undefined
    /// placeholders are reported, not silently skipped.
    pub fn node_coords(&self, ids: &[i64]) -> (Vec<[f64; 3]>, Vec<Diagnostic>) {
        let mut coords = Vec::with_capacity(ids.len());
        let mut diags = Vec::new();
        for &id in ids {
            match self.node(id) {
                Some(node) => match node.coord {
                    Some(coord) => coords.push(coord),
                    None => diags.push(Diagnostic::unlocated(
                        DiagnosticKind::Lookup,
                        format!("node {id} referenced but never defined"),
                    )),
                },
                None => diags.push(Diagnostic::unlocated(
                    DiagnosticKind::Lookup,
                    format!("node {id} not in model"),
                )),
            }
        }
        (coords, diags)
    }

    /// Change a node's coordinate through the public API, flagging the
    /// record for the rewrite pass. Returns false on a lookup miss.
    pub fn set_node_coord(&mut self, id: i64, coord: [f64; 3]) -> bool {
        let Some(&slot) = self.node_index.get(&id) else {
            self.diagnostics.push(Diagnostic::unlocated(
                DiagnosticKind::Lookup,
                format!("node {id} not in model"),
            ));
            return false;
        };
        let node = &mut self.nodes[slot];
        node.coord = Some(coord);
        node.modified = true;
        true
    }

    // ----- element access -----

    /// Element by `(id, kind)` composite key.
    pub fn element(&self, id: i64, kind: ElementKind) -> Option<&Element> {
        self.element_index
            .get(&(id, kind))
            .map(|&slot| &self.elements[slot])
    }

    /// Element by bare id, scanning kinds in a fixed order. The same id
    /// may exist under several kinds; this returns the first match.
    pub fn element_any_kind(&self, id: i64) -> Option<&Element> {
        ELEMENT_KINDS.iter().find_map(|&kind| self.element(id, kind))
    }

    pub fn element_at(&self, slot: ElemRef) -> &Element {
        &self.elements[slot]
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }

    /// Coordinates of an element's nodes in connectivity order
    /// (duplicate slots repeat the coordinate). Undefined slots are
    /// skipped and reported.
    pub fn element_coords(
        &self,
        id: i64,
        kind: Option<ElementKind>,
    ) -> Option<(Vec<[f64; 3]>, Vec<Diagnostic>)> {
        let element = match kind {
            Some(kind) => self.element(id, kind),
            None => self.element_any_kind(id),
        }?;
        let mut coords = Vec::with_capacity(element.nodes.len());
        let mut diags = Vec::new();
        for &slot in &element.nodes {
            let node = &self.nodes[slot];
            match node.coord {
                Some(coord) => coords.push(coord),
                None => diags.push(Diagnostic::unlocated(
                    DiagnosticKind::Lookup,
                    format!(
                        "element {} ({}) references undefined node {}",
                        element.id, element.kind, node.id
                    ),
                )),
            }
        }
        Some((coords, diags))
    }

    // ----- part access -----

    pub(crate) fn intern_part(&mut self, id: i64) -> PartRef {
        if let Some(&slot) = self.part_index.get(&id) {
            return slot;
        }
        let slot = self.parts.len();
        self.parts.push(Part::placeholder(id));
        self.part_index.insert(id, slot);
        slot
    }

    pub fn part(&self, id: i64) -> Option<&Part> {
        self.part_index.get(&id).map(|&slot| &self.parts[slot])
    }

    pub fn part_at(&self, slot: PartRef) -> &Part {
        &self.parts[slot]
    }

    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter()
    }

    // ----- diagnostics & summary -----

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn stats(&self) -> ModelStats {
        let mut element_kinds = BTreeMap::new();
        for element in &self.elements {
            *element_kinds.entry(element.kind).or_insert(0usize) += 1;
        }
        ModelStats {
            total_nodes: self.nodes.len(),
            undefined_nodes: self.nodes.iter().filter(|n| !n.is_defined()).count(),
            total_elements: self.elements.len(),
            total_parts: self.parts.len(),
            element_kinds,
            diagnostics: self.diagnostics.len(),
        }
    }
}

/// Aggregate counts reported after ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub total_nodes: usize,
    pub undefined_nodes: usize,
    pub total_elements: usize,
    pub total_parts: usize,
    pub element_kinds: BTreeMap<ElementKind, usize>,
    pub diagnostics: usize,
}

impl ModelStats {
    /// Human-readable multi-line summary.
    pub fn format(&self) -> String {
        let mut lines = vec![
            format!("total_nodes: {}", self.total_nodes),
            format!("undefined_nodes: {}", self.undefined_nodes),
            format!("total_elements: {}", self.total_elements),
            format!("total_parts: {}", self.total_parts),
        ];
        for (kind, count) in &self.element_kinds {
            lines.push(format!("  {kind}: {count}"));
        }
        lines.push(format!("diagnostics: {}", self.diagnostics));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_kind_slot_limits() {
        assert_eq!(ElementKind::Beam.max_nodes(), 3);
        assert_eq!(ElementKind::Discrete.max_nodes(), 2);
        assert_eq!(ElementKind::Shell.max_nodes(), 8);
        assert_eq!(ElementKind::Solid.max_nodes(), 8);
    }

    #[test]
    fn element_kind_qualifier_parsing() {
        assert_eq!(
            ElementKind::from_qualifier("SHELL"),
            Some(ElementKind::Shell)
        );
        assert_eq!(
            ElementKind::from_qualifier("solid"),
            Some(ElementKind::Solid)
        );
        assert_eq!(ElementKind::from_qualifier("SEATBELT"), None);
    }

    #[test]
    fn intern_node_creates_one_placeholder_per_id() {
        let mut model = DynaModel::new();
        let a = model.intern_node(7);
        let b = model.intern_node(7);
        assert_eq!(a, b);
        assert_eq!(model.nodes.len(), 1);
        let node = model.node(7).expect("placeholder present");
        assert!(!node.is_defined());
        assert!(node.origin.is_none());
    }

    #[test]
    fn set_node_coord_marks_modified_and_reports_misses() {
        let mut model = DynaModel::new();
        model.intern_node(3);
        assert!(model.set_node_coord(3, [1.0, 2.0, 3.0]));
        let node = model.node(3).unwrap();
        assert!(node.modified);
        assert_eq!(node.coord, Some([1.0, 2.0, 3.0]));

        assert!(!model.set_node_coord(99, [0.0; 3]));
        assert_eq!(model.diagnostics().len(), 1);
        assert_eq!(model.diagnostics()[0].kind, DiagnosticKind::Lookup);
    }

    #[test]
    fn node_coords_reports_misses_and_undefined_ids() {
        let mut model = DynaModel::new();
        model.intern_node(1);
        model.set_node_coord(1, [0.5, 0.0, 0.0]);
        model.intern_node(2); // stays undefined

        let (coords, diags) = model.node_coords(&[1, 2, 42]);
        assert_eq!(coords, vec![[0.5, 0.0, 0.0]]);
        assert_eq!(diags.len(), 2);
        assert!(diags.iter().all(|d| d.kind == DiagnosticKind::Lookup));
    }
}
