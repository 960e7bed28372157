//! Correction of every raw network in a data directory as one unit.
//!
//! A run either writes an output for every network or leaves the directory as
//! it found it: all inputs are read and corrected first, every output is staged
//! as `<name>.tmp`, and only then are the staged files renamed into place.

use std::fs;
use std::path::{Path, PathBuf};

use super::correct::{CorrectionSummary, correct_document};
use super::io::{
    Selection, corrected_file_name, discover_networks, read_document, staging_path, write_pretty,
};
use super::model::TmddDocument;
use crate::calibration::CorrectionGrid;
use crate::error::{CorrectionError, CorrectionResult};

/// One network written by [`correct_directory`]
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectedNetwork {
    pub stem: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub summary: CorrectionSummary,
}

/// Correct every uncorrected network in `dir` and write each as
/// `<stem>_corrected_<h>x<v>.json` next to its input.
///
/// # Errors
/// `InvalidInput` if `dir` holds no uncorrected network or any network is
/// malformed; `Io`/`Json` if an output cannot be written. On any error no
/// output of this run and no staging file is left in `dir`.
pub fn correct_directory(
    dir: &Path,
    grid: &CorrectionGrid,
    parallel: bool,
) -> CorrectionResult<Vec<CorrectedNetwork>> {
    let networks = discover_networks(dir, Selection::Uncorrected)?;
    if networks.is_empty() {
        return Err(CorrectionError::invalid(format!(
            "no uncorrected network JSON files found in {}",
            dir.display()
        )));
    }

    let mut documents = Vec::with_capacity(networks.len());
    for network in &networks {
        documents.push(read_document(&network.path)?);
    }

    let (horizontal, vertical) = grid.dimensions();
    let staged: Vec<(CorrectedNetwork, TmddDocument)> = networks
        .into_iter()
        .zip(documents)
        .map(|(network, mut doc)| {
            let summary = correct_document(&mut doc, grid, parallel);
            let output = dir.join(corrected_file_name(&network.stem, horizontal, vertical));
            let corrected = CorrectedNetwork {
                stem: network.stem,
                input: network.path,
                output,
                summary,
            };
            (corrected, doc)
        })
        .collect();

    stage_all(&staged)?;
    commit_all(&staged)?;

    Ok(staged.into_iter().map(|(corrected, _)| corrected).collect())
}

fn stage_all(staged: &[(CorrectedNetwork, TmddDocument)]) -> CorrectionResult<()> {
    for (i, (corrected, doc)) in staged.iter().enumerate() {
        if let Err(e) = write_pretty(doc, &staging_path(&corrected.output)) {
            // The failed file may be half-written, so it is removed along with the rest.
            remove_staged(&staged[..=i]);
            return Err(e);
        }
    }
    Ok(())
}

fn commit_all(staged: &[(CorrectedNetwork, TmddDocument)]) -> CorrectionResult<()> {
    for (i, (corrected, _)) in staged.iter().enumerate() {
        let tmp_path = staging_path(&corrected.output);
        if let Err(e) = fs::rename(&tmp_path, &corrected.output) {
            for (done, _) in &staged[..i] {
                let _ = fs::remove_file(&done.output);
            }
            remove_staged(&staged[i..]);
            return Err(CorrectionError::io(&corrected.output, e));
        }
    }
    Ok(())
}

fn remove_staged(staged: &[(CorrectedNetwork, TmddDocument)]) {
    for (corrected, _) in staged {
        let _ = fs::remove_file(staging_path(&corrected.output));
    }
}
