//! Best-effort write-back of modified records.
//!
//! Replays each source file's lines, substituting only lines whose
//! owning node record is flagged modified, keyed by recorded
//! `(file, line)` provenance. Untouched lines — comments, headers,
//! unmodified data — pass through as-is; output line endings are
//! normalized to `\n`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use kdyn_model::DynaModel;

use crate::error::{KioError, Result};

/// Patch one source file, writing the result to `output` (which may be
/// the source path itself). Returns the number of lines replaced.
pub fn patch_file(model: &DynaModel, file: usize, output: impl AsRef<Path>) -> Result<usize> {
    let src = model.file_path(file).ok_or(KioError::UnknownFile(file))?;
    let text = fs::read_to_string(src).map_err(|source| KioError::Read {
        path: src.to_path_buf(),
        source,
    })?;

    // Replacement text keyed by 1-based line number.
    let mut patches = HashMap::<usize, String>::new();
    for node in model.nodes() {
        if !node.modified {
            continue;
        }
        // Placeholder-only nodes have no defining line to patch.
        let Some(origin) = node.origin else { continue };
        if origin.file != file {
            continue;
        }
        let Some(coord) = node.coord else { continue };
        patches.insert(origin.line, node_line(node.id, coord));
    }

    let mut out = String::with_capacity(text.len());
    let mut replaced = 0usize;
    for (i, raw) in text.lines().enumerate() {
        match patches.get(&(i + 1)) {
            Some(patched) => {
                out.push_str(patched);
                replaced += 1;
            }
            None => out.push_str(raw),
        }
        out.push('\n');
    }

    let output = output.as_ref();
    fs::write(output, out).map_err(|source| KioError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    Ok(replaced)
}

/// Patch every registered source file in place. Returns the total number
/// of lines replaced across all files.
pub fn write_back(model: &DynaModel) -> Result<usize> {
    let mut total = 0usize;
    for file in 0..model.files().len() {
        let Some(path) = model.file_path(file) else {
            continue;
        };
        total += patch_file(model, file, path.to_path_buf())?;
    }
    Ok(total)
}

fn node_line(id: i64, coord: [f64; 3]) -> String {
    format!("{}, {}, {}, {}", id, coord[0], coord[1], coord[2])
}
