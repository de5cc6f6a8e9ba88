//! Renderable geometry derived from the parsed graph.
//!
//! A part (or the whole model) flattens to a deduplicated vertex list
//! plus index faces, one face per element in element-then-node order.
//! Deduplication keys on the exact coordinate value — two node ids
//! sharing a bit-identical coordinate collapse to one vertex — so
//! equality is exact, never tolerance based.

use std::collections::HashMap;

use serde::Serialize;

use crate::diag::{Diagnostic, DiagnosticKind};
use crate::mesh::{DynaModel, ElemRef};

/// Deduplicated vertices and per-element index faces.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    pub vertices: Vec<[f64; 3]>,
    /// One entry per element; each value indexes into `vertices`.
    pub faces: Vec<Vec<u32>>,
}

/// Counts reported alongside a whole-model flatten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeometryReport {
    pub vertices: usize,
    pub faces: usize,
    /// Nodes in the model that no part's element references.
    pub unreferenced_nodes: usize,
    /// Elements in the model not attached to any part.
    pub unreferenced_elements: usize,
    /// Node slots skipped because the node was never defined.
    pub undefined_slots: usize,
}

/// Value-keyed vertex interner. `f64::to_bits` keys keep equality exact.
#[derive(Default)]
struct VertexDedup {
    index: HashMap<[u64; 3], u32>,
}

impl VertexDedup {
    fn intern(&mut self, vertices: &mut Vec<[f64; 3]>, coord: [f64; 3]) -> u32 {
        let key = [coord[0].to_bits(), coord[1].to_bits(), coord[2].to_bits()];
        *self.index.entry(key).or_insert_with(|| {
            vertices.push(coord);
            (vertices.len() - 1) as u32
        })
    }
}

impl DynaModel {
    /// Flatten one part into geometry. `None` when the part id is absent
    /// from the model entirely.
    ///
    /// Every element yields a face even if some of its nodes were never
    /// defined; undefined slots are skipped and reported.
    pub fn part_geometry(&self, pid: i64) -> Option<(Geometry, Vec<Diagnostic>)> {
        let part = self.part(pid)?;
        let mut geometry = Geometry::default();
        let mut dedup = VertexDedup::default();
        let mut diags = Vec::new();
        for &elem in &part.elements {
            self.flatten_element(elem, &mut geometry, &mut dedup, &mut diags);
        }
        Some((geometry, diags))
    }

    /// Flatten every part's elements into one global geometry, with a
    /// report of records unreferenced by any part.
    pub fn model_geometry(&self) -> (Geometry, GeometryReport, Vec<Diagnostic>) {
        let mut geometry = Geometry::default();
        let mut dedup = VertexDedup::default();
        let mut diags = Vec::new();
        let mut node_used = vec![false; self.nodes.len()];
        let mut elem_used = vec![false; self.elements.len()];

        for part in &self.parts {
            for &elem in &part.elements {
                elem_used[elem] = true;
                for &slot in &self.elements[elem].nodes {
                    node_used[slot] = true;
                }
                self.flatten_element(elem, &mut geometry, &mut dedup, &mut diags);
            }
        }

        let undefined_slots = diags
            .iter()
            .filter(|d| d.kind == DiagnosticKind::Lookup)
            .count();
        let report = GeometryReport {
            vertices: geometry.vertices.len(),
            faces: geometry.faces.len(),
            unreferenced_nodes: node_used.iter().filter(|used| !**used).count(),
            unreferenced_elements: elem_used.iter().filter(|used| !**used).count(),
            undefined_slots,
        };
        (geometry, report, diags)
    }

    fn flatten_element(
        &self,
        elem: ElemRef,
        geometry: &mut Geometry,
        dedup: &mut VertexDedup,
        diags: &mut Vec<Diagnostic>,
    ) {
        let element = &self.elements[elem];
        let mut face = Vec::with_capacity(element.nodes.len());
        for &slot in &element.nodes {
            let node = &self.nodes[slot];
            match node.coord {
                Some(coord) => face.push(dedup.intern(&mut geometry.vertices, coord)),
                None => diags.push(Diagnostic::unlocated(
                    DiagnosticKind::Lookup,
                    format!(
                        "element {} ({}) references undefined node {}",
                        element.id, element.kind, node.id
                    ),
                )),
            }
        }
        geometry.faces.push(face);
    }
}
