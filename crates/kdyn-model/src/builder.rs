//! Keyword dispatcher and per-section handlers.
//!
//! One [`Ingest`] pass streams a file's lines through the classifier in
//! physical order, holding the current section keyword and a buffer for
//! `*PART` data. NODE and ELEMENT records are self-contained per line;
//! a PART record spans two adjacent lines (label line + numeric fields)
//! and is handled as a unit when its section closes or the file ends.

use kdyn_deck::{CardLine, Keyword, Provenance};

use crate::diag::{Diagnostic, DiagnosticKind};
use crate::mesh::{DynaModel, Element, ElementKind};

/// One buffered data line awaiting section-end handling.
#[derive(Debug, Clone)]
struct BufferedLine {
    tokens: Vec<String>,
    origin: Provenance,
}

/// Ingestion state machine for a single file.
pub struct Ingest<'m> {
    model: &'m mut DynaModel,
    file: usize,
    section: Keyword,
    qualifiers: Vec<String>,
    part_buf: Vec<BufferedLine>,
}

impl<'m> Ingest<'m> {
    /// `file` is the provenance index from [`DynaModel::register_file`].
    pub fn new(model: &'m mut DynaModel, file: usize) -> Self {
        Self {
            model,
            file,
            // Inert default; data before the first header is dropped.
            section: Keyword::Unknown,
            qualifiers: Vec::new(),
            part_buf: Vec::new(),
        }
    }

    /// Stream the whole file text through the classifier.
    pub fn run(mut self, text: &str) {
        for (i, raw) in text.lines().enumerate() {
            let origin = Provenance::new(self.file, i + 1);
            match CardLine::classify(raw, self.section, origin) {
                CardLine::Skip => {}
                CardLine::Header {
                    keyword,
                    qualifiers,
                } => {
                    self.flush_part();
                    self.section = keyword;
                    self.qualifiers = qualifiers;
                }
                CardLine::Data {
                    keyword,
                    tokens,
                    origin,
                } => self.data_line(keyword, tokens, origin),
            }
        }
        // A file ending inside a *PART section still defines the part.
        self.flush_part();
    }

    fn data_line(&mut self, keyword: Keyword, tokens: Vec<String>, origin: Provenance) {
        match keyword {
            Keyword::Node => self.node_line(&tokens, origin),
            Keyword::Element => self.element_line(&tokens, origin),
            Keyword::Part => self.part_buf.push(BufferedLine { tokens, origin }),
            Keyword::Keyword | Keyword::End => {}
            Keyword::Unknown => {}
        }
    }

    // ----- NODE -----

    fn node_line(&mut self, tokens: &[String], origin: Provenance) {
        if tokens.len() < 4 {
            self.model.report(Diagnostic::new(
                DiagnosticKind::Syntax,
                format!("NODE: expected at least 4 fields, got {}", tokens.len()),
                origin,
            ));
            return;
        }

        let parsed = tokens[0].parse::<i64>().ok().and_then(|id| {
            let x = tokens[1].parse::<f64>().ok()?;
            let y = tokens[2].parse::<f64>().ok()?;
            let z = tokens[3].parse::<f64>().ok()?;
            Some((id, [x, y, z]))
        });
        let Some((id, coord)) = parsed else {
            self.model.report(Diagnostic::new(
                DiagnosticKind::Type,
                format!("NODE: non-numeric field in {:?}", &tokens[..4]),
                origin,
            ));
            return;
        };

        let slot = self.model.intern_node(id);
        if self.model.nodes[slot].is_defined() {
            // First definition wins.
            self.model.report(Diagnostic::new(
                DiagnosticKind::Identity,
                format!("NODE: node {id} already defined"),
                origin,
            ));
            return;
        }
        // Either a fresh slot or a placeholder from an earlier element
        // reference; fill in place so existing references see the update.
        let node = &mut self.model.nodes[slot];
        node.coord = Some(coord);
        node.origin = Some(origin);
    }

    // ----- ELEMENT -----

    fn element_line(&mut self, tokens: &[String], origin: Provenance) {
        if tokens.len() < 3 {
            self.model.report(Diagnostic::new(
                DiagnosticKind::Syntax,
                format!("ELEMENT: expected at least 3 fields, got {}", tokens.len()),
                origin,
            ));
            return;
        }

        // Unsupported sub-variants are dropped without a report.
        let Some(kind) = self
            .qualifiers
            .first()
            .and_then(|q| ElementKind::from_qualifier(q))
        else {
            return;
        };

        let ids = parse_element_ids(tokens, kind.max_nodes());
        let Some((eid, pid, node_ids)) = ids else {
            self.model.report(Diagnostic::new(
                DiagnosticKind::Type,
                format!("ELEMENT_{kind}: non-numeric field in {tokens:?}"),
                origin,
            ));
            return;
        };

        if self.model.element(eid, kind).is_some() {
            self.model.report(Diagnostic::new(
                DiagnosticKind::Identity,
                format!("ELEMENT_{kind}: element {eid} already defined"),
                origin,
            ));
            return;
        }

        // Forward references create undefined placeholders, filled in
        // place by a later *NODE line.
        let nodes = node_ids
            .iter()
            .map(|&nid| self.model.intern_node(nid))
            .collect();

        let slot = self.model.elements.len();
        self.model.elements.push(Element {
            id: eid,
            pid,
            kind,
            nodes,
            origin,
        });
        self.model.element_index.insert((eid, kind), slot);

        self.attach_to_part(pid, kind, slot, eid, origin);
    }

    /// Add an element to its owning part, creating a placeholder part if
    /// the `*PART` block has not been seen yet. The part's element kind
    /// must stay homogeneous; on mismatch the attachment is dropped but
    /// the already-registered element is not rolled back.
    fn attach_to_part(
        &mut self,
        pid: i64,
        kind: ElementKind,
        elem: usize,
        eid: i64,
        origin: Provenance,
    ) {
        let part_slot = self.model.intern_part(pid);
        if self.model.parts[part_slot].elements.is_empty() {
            self.model.parts[part_slot].kind = Some(kind);
        } else if self.model.parts[part_slot].kind != Some(kind) {
            let established = self.model.parts[part_slot]
                .kind
                .map(ElementKind::name)
                .unwrap_or("UNSET");
            self.model.report(Diagnostic::new(
                DiagnosticKind::Consistency,
                format!("part {pid} holds {established} elements, element {eid} is {kind}"),
                origin,
            ));
            return;
        }
        self.model.parts[part_slot].elements.push(elem);
    }

    // ----- PART -----

    fn flush_part(&mut self) {
        if self.part_buf.is_empty() {
            return;
        }
        let lines = std::mem::take(&mut self.part_buf);
        let origin = lines[0].origin;

        if lines.len() < 2 {
            self.model.report(Diagnostic::new(
                DiagnosticKind::Syntax,
                "PART: section needs a label line and a fields line",
                origin,
            ));
            return;
        }

        // Classifier guarantees every data line has at least one token.
        let header = lines[0].tokens[0].clone();

        // Eight metadata fields; missing trailing fields default to 0,
        // lines beyond the first two are ignored.
        let mut fields = [0i64; 8];
        for (i, token) in lines[1].tokens.iter().take(8).enumerate() {
            match token.parse::<i64>() {
                Ok(value) => fields[i] = value,
                Err(_) => {
                    self.model.report(Diagnostic::new(
                        DiagnosticKind::Type,
                        format!("PART: non-numeric field {token:?}"),
                        lines[1].origin,
                    ));
                    return;
                }
            }
        }
        let [pid, secid, mid, eosid, hgid, grav, adpopt, tmid] = fields;

        // Overwrites header/metadata on an existing placeholder; the
        // element set stays untouched.
        let slot = self.model.intern_part(pid);
        let part = &mut self.model.parts[slot];
        part.header = header;
        part.secid = secid;
        part.mid = mid;
        part.eosid = eosid;
        part.hgid = hgid;
        part.grav = grav;
        part.adpopt = adpopt;
        part.tmid = tmid;
        part.origin = Some(origin);
    }
}

/// Decode eid, pid, and the node-reference fields of an element line.
/// Trailing fields beyond `max_nodes` are ignored; zero-valued slots are
/// padding, not node references.
fn parse_element_ids(tokens: &[String], max_nodes: usize) -> Option<(i64, i64, Vec<i64>)> {
    let eid = tokens[0].parse::<i64>().ok()?;
    let pid = tokens[1].parse::<i64>().ok()?;
    let mut node_ids = Vec::new();
    for token in tokens[2..].iter().take(max_nodes) {
        let nid = token.parse::<i64>().ok()?;
        if nid != 0 {
            node_ids.push(nid);
        }
    }
    Some((eid, pid, node_ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::DiagnosticKind;

    fn ingest(text: &str) -> DynaModel {
        let mut model = DynaModel::new();
        let file = model.register_file("test.k");
        Ingest::new(&mut model, file).run(text);
        model
    }

    #[test]
    fn parses_nodes_exactly_as_written() {
        let model = ingest(
            r#"*KEYWORD
*NODE
100000, 1.0, 2.0, 3.0
100001  4.5 -6.25 0.125
*END
"#,
        );
        assert_eq!(model.stats().total_nodes, 2);
        assert_eq!(model.node(100000).unwrap().coord, Some([1.0, 2.0, 3.0]));
        assert_eq!(model.node(100001).unwrap().coord, Some([4.5, -6.25, 0.125]));
        assert!(model.diagnostics().is_empty());
    }

    #[test]
    fn first_node_definition_wins() {
        let model = ingest(
            r#"*NODE
5, 1.0, 1.0, 1.0
5, 9.0, 9.0, 9.0
"#,
        );
        assert_eq!(model.node(5).unwrap().coord, Some([1.0, 1.0, 1.0]));
        assert_eq!(model.diagnostics().len(), 1);
        assert_eq!(model.diagnostics()[0].kind, DiagnosticKind::Identity);
    }

    #[test]
    fn malformed_node_lines_are_dropped_with_a_report() {
        let model = ingest(
            r#"*NODE
abc, 1, 2
1, 2.0, x, 0.0
"#,
        );
        assert_eq!(model.stats().total_nodes, 0);
        assert_eq!(model.node(1), None);
        let kinds: Vec<_> = model.diagnostics().iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::Syntax, DiagnosticKind::Type]);
    }

    #[test]
    fn forward_reference_fills_placeholder_in_place() {
        let model = ingest(
            r#"*ELEMENT_SHELL
1, 10, 7, 8, 9, 0, 0, 0, 0, 0
*NODE
7, 1.0, 0.0, 0.0
8, 0.0, 1.0, 0.0
"#,
        );
        // Element created before the NODE lines sees the filled coords.
        let element = model.element(1, ElementKind::Shell).expect("element 1");
        let filled = model.node_at(element.nodes[0]);
        assert_eq!(filled.id, 7);
        assert_eq!(filled.coord, Some([1.0, 0.0, 0.0]));
        assert!(!filled.modified, "parser fill is not a user modification");
        // Node 9 was never defined.
        assert!(!model.node(9).unwrap().is_defined());
        assert!(model.diagnostics().is_empty());
    }

    #[test]
    fn element_identity_is_id_and_kind() {
        let model = ingest(
            r#"*ELEMENT_SHELL
5, 1, 1, 2, 3, 4
*ELEMENT_SOLID
5, 2, 1, 2, 3, 4, 5, 6, 7, 8
*ELEMENT_SHELL
5, 1, 9, 9, 9, 9
"#,
        );
        // Same id under two kinds: both live. Same (id, kind): first wins.
        let shell = model.element(5, ElementKind::Shell).expect("shell 5");
        let solid = model.element(5, ElementKind::Solid).expect("solid 5");
        assert_eq!(shell.nodes.len(), 4);
        assert_eq!(solid.nodes.len(), 8);
        assert_eq!(model.node_at(shell.nodes[0]).id, 1);
        assert_eq!(model.diagnostics().len(), 1);
        assert_eq!(model.diagnostics()[0].kind, DiagnosticKind::Identity);
    }

    #[test]
    fn zero_slots_are_padding_and_duplicates_are_preserved() {
        let model = ingest(
            r#"*NODE
100000, 1.0, 2.0, 3.0
*ELEMENT_SHELL
5, 1, 100000, 100000, 100000, 0, 0, 0, 0, 0
"#,
        );
        let element = model.element(5, ElementKind::Shell).expect("shell 5");
        assert_eq!(element.nodes.len(), 3);
        let ids: Vec<_> = element
            .nodes
            .iter()
            .map(|&slot| model.node_at(slot).id)
            .collect();
        assert_eq!(ids, vec![100000, 100000, 100000]);
        assert_eq!(model.stats().total_nodes, 1);
    }

    #[test]
    fn node_slots_beyond_the_kind_maximum_are_ignored() {
        let model = ingest(
            r#"*ELEMENT_DISCRETE
1, 2, 11, 12, 13, 14
"#,
        );
        let element = model.element(1, ElementKind::Discrete).expect("discrete");
        assert_eq!(element.nodes.len(), 2);
        assert!(model.node(13).is_none());
    }

    #[test]
    fn unsupported_element_qualifier_is_silently_dropped() {
        let model = ingest(
            r#"*ELEMENT_SEATBELT
1, 2, 3, 4
*ELEMENT
1, 2, 3
"#,
        );
        assert_eq!(model.stats().total_elements, 0);
        assert!(model.diagnostics().is_empty());
    }

    #[test]
    fn part_kind_mismatch_keeps_earlier_attachments() {
        let model = ingest(
            r#"*ELEMENT_SHELL
1, 30, 1, 2, 3, 4
2, 30, 2, 3, 4, 5
*ELEMENT_SOLID
3, 30, 1, 2, 3, 4, 5, 6, 7, 8
"#,
        );
        let part = model.part(30).expect("part 30");
        assert_eq!(part.kind, Some(ElementKind::Shell));
        assert_eq!(part.elements.len(), 2);
        // The solid element itself is still registered.
        assert!(model.element(3, ElementKind::Solid).is_some());
        assert_eq!(model.diagnostics().len(), 1);
        assert_eq!(model.diagnostics()[0].kind, DiagnosticKind::Consistency);
    }

    #[test]
    fn part_block_fills_placeholder_without_touching_elements() {
        let model = ingest(
            r#"*ELEMENT_SHELL
1, 20003, 1, 2, 3, 4
*PART
bumper_outer
20003, 7, 12, 0, 1
*END
"#,
        );
        let part = model.part(20003).expect("part 20003");
        assert_eq!(part.header, "bumper_outer");
        assert_eq!(part.secid, 7);
        assert_eq!(part.mid, 12);
        assert_eq!(part.eosid, 0);
        assert_eq!(part.hgid, 1);
        // Missing trailing fields default to zero.
        assert_eq!((part.grav, part.adpopt, part.tmid), (0, 0, 0));
        assert_eq!(part.elements.len(), 1);
        assert_eq!(part.kind, Some(ElementKind::Shell));
        assert!(part.origin.is_some());
    }

    #[test]
    fn part_section_is_flushed_at_end_of_file() {
        let model = ingest(
            r#"*PART
trailing_block
44, 1, 2, 3, 4, 5, 6, 7
"#,
        );
        let part = model.part(44).expect("part 44");
        assert_eq!(part.header, "trailing_block");
        assert_eq!(part.tmid, 7);
    }

    #[test]
    fn short_or_bad_part_sections_are_reported_and_discarded() {
        let model = ingest(
            r#"*PART
only_a_label
*PART
label
x, 1, 2
*END
"#,
        );
        assert_eq!(model.stats().total_parts, 0);
        let kinds: Vec<_> = model.diagnostics().iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::Syntax, DiagnosticKind::Type]);
    }

    #[test]
    fn element_coords_follow_connectivity_order() {
        let model = ingest(
            r#"*NODE
1, 0.0, 0.0, 0.0
2, 1.0, 0.0, 0.0
3, 1.0, 1.0, 0.0
*ELEMENT_BEAM
7, 4, 2, 1, 3
"#,
        );
        let (coords, diags) = model
            .element_coords(7, Some(ElementKind::Beam))
            .expect("beam 7");
        assert!(diags.is_empty());
        assert_eq!(
            coords,
            vec![[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [1.0, 1.0, 0.0]]
        );
        // Bare-id lookup finds the same element.
        let (by_id, _) = model.element_coords(7, None).expect("beam 7 by id");
        assert_eq!(by_id, coords);
        assert!(model.element_coords(8, None).is_none());
    }

    #[test]
    fn unknown_sections_and_no_op_keywords_are_inert() {
        let model = ingest(
            r#"*KEYWORD
*SECTION_SHELL
1, 2, 3, 4
*NODE
1, 0.0, 0.0, 0.0
*END
"#,
        );
        assert_eq!(model.stats().total_nodes, 1);
        assert_eq!(model.stats().total_elements, 0);
        assert!(model.diagnostics().is_empty());
    }
}
