// Sequential list → encode → call → store loop.

use super::api::{display_name, VisionClient};
use super::models::AnalysisRecord;
use crate::error::{Error, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Anything that can turn one image into a record.
pub trait Analyzer {
    fn analyze(&self, image: &Path, prompt: &str) -> Result<AnalysisRecord>;
}

impl Analyzer for VisionClient {
    fn analyze(&self, image: &Path, prompt: &str) -> Result<AnalysisRecord> {
        VisionClient::analyze(self, image, prompt)
    }
}

/// Image files directly inside `dir`, sorted by path. `extensions` are
/// matched case-insensitively.
pub fn list_images(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::InputDirMissing(dir.to_path_buf()));
    }

    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|want| want.eq_ignore_ascii_case(e)))
            .unwrap_or(false);
        if matches {
            images.push(path);
        }
    }

    if images.is_empty() {
        return Err(Error::NoImages(dir.to_path_buf()));
    }
    images.sort();
    tracing::info!(count = images.len(), dir = %dir.display(), "found images");
    Ok(images)
}

/// Analyse every image in order. A failing image yields a failed record and
/// the loop moves on. `report` is called after each image with its 1-based
/// position.
pub fn run_batch<A, F>(analyzer: &A, images: &[PathBuf], prompt: &str, mut report: F) -> Vec<AnalysisRecord>
where
    A: Analyzer + ?Sized,
    F: FnMut(usize, &AnalysisRecord),
{
    let mut records = Vec::with_capacity(images.len());
    for (i, image) in images.iter().enumerate() {
        let record = match analyzer.analyze(image, prompt) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(image = %image.display(), error = %e, "analysis failed");
                AnalysisRecord::failed(&display_name(image), e.to_string())
            }
        };
        report(i + 1, &record);
        records.push(record);
    }
    records
}

/// Where [`save_results`] wrote things.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedResults {
    pub run_file: PathBuf,
    pub image_files: Vec<PathBuf>,
    /// Per-image files that could not be written, with the reason
    pub write_failures: Vec<(PathBuf, String)>,
}

/// `analysis_results_<timestamp>.json` for a run started now.
pub fn run_file_name(now: chrono::DateTime<chrono::Local>) -> String {
    format!("analysis_results_{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// Write the combined `run_file_name` array into `dir`, then one
/// `<image file name>.json` per record. Only a failure on the run file is an
/// error; per-image write failures are collected in the result.
pub fn save_results(records: &[AnalysisRecord], dir: &Path, run_file_name: &str) -> Result<SavedResults> {
    fs::create_dir_all(dir)?;

    let run_file = dir.join(run_file_name);
    fs::write(&run_file, serde_json::to_string_pretty(records)?)?;
    tracing::info!(file = %run_file.display(), "saved results");

    let mut image_files = Vec::with_capacity(records.len());
    let mut write_failures = Vec::new();
    for record in records {
        let path = dir.join(format!("{}.json", record.image));
        let written = serde_json::to_string_pretty(record)
            .map_err(Error::from)
            .and_then(|json| fs::write(&path, json).map_err(Error::from));
        match written {
            Ok(()) => image_files.push(path),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "could not write result file");
                write_failures.push((path, e.to_string()));
            }
        }
    }

    Ok(SavedResults {
        run_file,
        image_files,
        write_failures,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_tokens: u64,
}

impl Summary {
    pub fn from_records(records: &[AnalysisRecord]) -> Self {
        let succeeded = records.iter().filter(|r| r.success).count();
        Self {
            total: records.len(),
            succeeded,
            failed: records.len() - succeeded,
            total_tokens: records
                .iter()
                .filter(|r| r.success)
                .map(AnalysisRecord::total_tokens)
                .sum(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total images:  {}", self.total)?;
        writeln!(f, "Succeeded:     {}", self.succeeded)?;
        write!(f, "Failed:        {}", self.failed)?;
        if self.total_tokens > 0 {
            write!(f, "\nTotal tokens:  {}", self.total_tokens)?;
        }
        Ok(())
    }
}
