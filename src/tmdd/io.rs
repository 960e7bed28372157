use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::model::TmddDocument;
use crate::error::{CorrectionError, CorrectionResult};

/// Marker that distinguishes corrected outputs from raw exports
const CORRECTED_MARKER: &str = "corrected";

/// Which network files in a data directory to pick up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Raw exports, i.e. files whose name does not contain "corrected"
    Uncorrected,
    /// Outputs of a previous correction run
    Corrected,
}

/// A network JSON file found in a data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkFile {
    /// File name without the `.json` extension
    pub stem: String,
    pub path: PathBuf,
}

/// List the `*.json` files in `dir` matching `selection`, sorted by name.
pub fn discover_networks(dir: &Path, selection: Selection) -> CorrectionResult<Vec<NetworkFile>> {
    let entries = fs::read_dir(dir).map_err(|e| CorrectionError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| CorrectionError::io(dir, e))?.path();
        if !path.is_file() || path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let is_corrected = stem.contains(CORRECTED_MARKER);
        let wanted = match selection {
            Selection::Uncorrected => !is_corrected,
            Selection::Corrected => is_corrected,
        };
        if wanted {
            files.push(NetworkFile {
                stem: stem.to_string(),
                path: path.clone(),
            });
        }
    }

    files.sort_by(|a, b| a.stem.cmp(&b.stem));
    Ok(files)
}

/// Output file name for a network corrected on an `h × v` grid
pub fn corrected_file_name(stem: &str, horizontal: usize, vertical: usize) -> String {
    format!("{stem}_{CORRECTED_MARKER}_{horizontal}x{vertical}.json")
}

/// Read and validate a TMDD document.
///
/// A document that is valid JSON but lacks a required coordinate field is
/// reported as `InvalidInput`.
pub fn read_document(path: &Path) -> CorrectionResult<TmddDocument> {
    let contents = fs::read_to_string(path).map_err(|e| CorrectionError::io(path, e))?;
    serde_json::from_str(&contents).map_err(|e| {
        if e.is_data() {
            CorrectionError::invalid(format!("{}: {e}", path.display()))
        } else {
            CorrectionError::Json {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Write `doc` as pretty-printed JSON.
///
/// The document is written to a temporary sibling first and renamed into
/// place, so a failed write never leaves a partial file at `path`.
pub fn write_document(doc: &TmddDocument, path: &Path) -> CorrectionResult<()> {
    let tmp_path = staging_path(path);

    let result = write_pretty(doc, &tmp_path).and_then(|()| {
        fs::rename(&tmp_path, path).map_err(|e| CorrectionError::io(path, e))
    });
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// `<path>.tmp`, the sibling a document is written to before being renamed into place
pub(crate) fn staging_path(path: &Path) -> PathBuf {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    path.with_file_name(tmp_name)
}

pub(crate) fn write_pretty(doc: &TmddDocument, path: &Path) -> CorrectionResult<()> {
    let file = File::create(path).map_err(|e| CorrectionError::io(path, e))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, doc).map_err(|e| CorrectionError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    writer.flush().map_err(|e| CorrectionError::io(path, e))?;

    Ok(())
}
