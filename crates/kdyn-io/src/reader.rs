//! Ingestion entry points: explicit file lists and directory scans.

use std::fs;
use std::path::Path;

use kdyn_model::{DynaModel, Ingest};

use crate::error::{KioError, Result};

/// File extension recognized by the directory scan, compared
/// case-insensitively.
pub const K_EXTENSION: &str = "k";

/// Ingest one file into an existing model. Content problems accumulate
/// as diagnostics on the model; only an unreadable path is an error.
pub fn read_into(model: &mut DynaModel, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| KioError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file = model.register_file(path);
    Ingest::new(model, file).run(&text);
    Ok(())
}

/// Build a model from caller-supplied paths, ingested strictly in order.
pub fn read_files<P, I>(paths: I) -> Result<DynaModel>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = P>,
{
    let mut model = DynaModel::new();
    for path in paths {
        read_into(&mut model, path)?;
    }
    Ok(model)
}

/// Build a model from every `.k` file directly inside `dir`
/// (non-recursive). Files are sorted by path so multi-file provenance is
/// deterministic.
pub fn read_dir(dir: impl AsRef<Path>) -> Result<DynaModel> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(KioError::NotADirectory(dir.to_path_buf()));
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_k = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(K_EXTENSION));
        if is_k {
            paths.push(path);
        }
    }
    paths.sort();
    read_files(paths)
}
