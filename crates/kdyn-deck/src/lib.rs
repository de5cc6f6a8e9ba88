//! Line-level lexer for LS-DYNA keyword ("k") decks.
//!
//! A k file is line oriented: `$`-prefixed comment lines, `*KEYWORD`
//! section headers that set parsing context, and free-width data lines
//! tokenized on commas and whitespace runs. This crate classifies one
//! raw line at a time; assembling lines into records is the model
//! builder's job.

use std::fmt::{Display, Formatter};

/// The closed keyword vocabulary this reader understands.
///
/// Any other `*NAME` header maps to [`Keyword::Unknown`], which disables
/// handling of the data lines that follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Unknown,
    Element,
    End,
    Keyword,
    Node,
    Part,
}

impl Keyword {
    /// Match a header token (already stripped of `*` and qualifiers)
    /// against the vocabulary, case-insensitively.
    pub fn parse(token: &str) -> Self {
        match token.to_ascii_uppercase().as_str() {
            "ELEMENT" => Keyword::Element,
            "END" => Keyword::End,
            "KEYWORD" => Keyword::Keyword,
            "NODE" => Keyword::Node,
            "PART" => Keyword::Part,
            _ => Keyword::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Keyword::Unknown => "UNKNOWN",
            Keyword::Element => "ELEMENT",
            Keyword::End => "END",
            Keyword::Keyword => "KEYWORD",
            Keyword::Node => "NODE",
            Keyword::Part => "PART",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a record came from: index into the model's file registry plus a
/// 1-based line number. Used for diagnostics and the rewrite pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Provenance {
    pub file: usize,
    pub line: usize,
}

impl Provenance {
    pub fn new(file: usize, line: usize) -> Self {
        Self { file, line }
    }
}

impl Display for Provenance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "file {} line {}", self.file, self.line)
    }
}

/// One classified input line.
#[derive(Debug, Clone, PartialEq)]
pub enum CardLine {
    /// Blank line, `$` comment, or nothing tokenizable. Dropped.
    Skip,
    /// `*KEYWORD` or `*KEYWORD_QUALIFIER...` header.
    Header {
        keyword: Keyword,
        qualifiers: Vec<String>,
    },
    /// Data line, tagged with the section keyword active when it was read.
    Data {
        keyword: Keyword,
        tokens: Vec<String>,
        origin: Provenance,
    },
}

impl CardLine {
    /// Classify one raw line given the keyword of the enclosing section.
    ///
    /// A truly empty line is malformed per the format but classified as
    /// [`CardLine::Skip`]; the reader is deliberately lenient there.
    pub fn classify(raw: &str, current: Keyword, origin: Provenance) -> Self {
        let tokens = split_fields(raw);
        let Some(first) = tokens.first() else {
            return CardLine::Skip;
        };

        if first.starts_with('$') {
            return CardLine::Skip;
        }

        if let Some(header) = first.strip_prefix('*') {
            let mut pieces = header.split('_');
            let keyword = Keyword::parse(pieces.next().unwrap_or(""));
            let qualifiers = pieces.map(|q| q.to_ascii_uppercase()).collect();
            return CardLine::Header {
                keyword,
                qualifiers,
            };
        }

        CardLine::Data {
            keyword: current,
            tokens,
            origin,
        }
    }
}

/// Split a data or header line on commas and runs of whitespace.
///
/// The format is free column width despite LS-DYNA's nominal fixed-width
/// heritage; consecutive separators collapse.
pub fn split_fields(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: usize) -> Provenance {
        Provenance::new(0, line)
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        assert_eq!(CardLine::classify("", Keyword::Node, at(1)), CardLine::Skip);
        assert_eq!(
            CardLine::classify("   \t ", Keyword::Node, at(2)),
            CardLine::Skip
        );
        assert_eq!(
            CardLine::classify("$ comment text", Keyword::Node, at(3)),
            CardLine::Skip
        );
        assert_eq!(
            CardLine::classify("$$---", Keyword::Node, at(4)),
            CardLine::Skip
        );
    }

    #[test]
    fn classifies_headers_with_qualifiers() {
        let line = CardLine::classify("*ELEMENT_SHELL", Keyword::Keyword, at(1));
        assert_eq!(
            line,
            CardLine::Header {
                keyword: Keyword::Element,
                qualifiers: vec!["SHELL".to_string()],
            }
        );

        let line = CardLine::classify("*element_shell_thickness", Keyword::Keyword, at(2));
        assert_eq!(
            line,
            CardLine::Header {
                keyword: Keyword::Element,
                qualifiers: vec!["SHELL".to_string(), "THICKNESS".to_string()],
            }
        );
    }

    #[test]
    fn unrecognized_header_maps_to_unknown() {
        let line = CardLine::classify("*SECTION_SHELL", Keyword::Node, at(1));
        match line {
            CardLine::Header { keyword, .. } => assert_eq!(keyword, Keyword::Unknown),
            other => panic!("expected header, got {other:?}"),
        }
    }

    #[test]
    fn data_lines_carry_the_active_section_keyword() {
        let line = CardLine::classify("100, 1.0, 2.0, 3.0", Keyword::Node, at(7));
        assert_eq!(
            line,
            CardLine::Data {
                keyword: Keyword::Node,
                tokens: vec!["100", "1.0", "2.0", "3.0"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                origin: at(7),
            }
        );
    }

    #[test]
    fn splits_on_commas_and_whitespace_runs() {
        assert_eq!(
            split_fields("  1,2  3,\t4 ,, 5 "),
            vec!["1", "2", "3", "4", "5"]
        );
        assert!(split_fields(",,  ,").is_empty());
    }

    #[test]
    fn keyword_vocabulary_is_case_insensitive_and_closed() {
        assert_eq!(Keyword::parse("node"), Keyword::Node);
        assert_eq!(Keyword::parse("Part"), Keyword::Part);
        assert_eq!(Keyword::parse("AIRBAG"), Keyword::Unknown);
        assert_eq!(Keyword::parse(""), Keyword::Unknown);
    }
}
