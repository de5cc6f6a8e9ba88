//! In-memory mesh model for LS-DYNA keyword decks.
//!
//! This crate provides:
//! - **Mesh model** — `Node`/`Element`/`Part` arenas behind id-keyed
//!   lookup maps, with placeholder nodes for forward references
//! - **Ingestion** — the keyword dispatcher and per-section handlers
//!   that turn classified lines into model mutations
//! - **Diagnostics** — the non-fatal error taxonomy accumulated while
//!   reading; a malformed line never aborts ingestion
//! - **Geometry export** — value-deduplicated vertex/face flattening of
//!   one part or the whole model

pub mod builder;
pub mod diag;
pub mod geometry;
pub mod mesh;

pub use builder::Ingest;
pub use diag::{Diagnostic, DiagnosticKind};
pub use geometry::{Geometry, GeometryReport};
pub use mesh::{DynaModel, Element, ElementKind, ModelStats, Node, Part};
