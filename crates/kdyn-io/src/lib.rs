//! File-level ingestion and write-back for k decks.
//!
//! This crate provides:
//! - **Reading** — build a [`kdyn_model::DynaModel`] from explicit file
//!   paths or a non-recursive directory scan for `.k` files
//! - **Rewrite** — best-effort in-place patching of records flagged
//!   modified, preserving every untouched line byte for byte
//!
//! Only filesystem problems surface as errors here; malformed file
//! content is reported through the model's diagnostics and never aborts
//! a run.

pub mod error;
pub mod reader;
pub mod rewrite;

pub use error::{KioError, Result};
pub use reader::{K_EXTENSION, read_dir, read_files, read_into};
pub use rewrite::{patch_file, write_back};
