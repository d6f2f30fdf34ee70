// Batch loop and result files, driven by a scripted analyzer.

use fridgecam_cli::vision::{self, AnalysisRecord, Analyzer, Usage};
use fridgecam_cli::{Error, Result};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Succeeds for every image except those whose name contains "bad".
struct ScriptedAnalyzer {
    seen: RefCell<Vec<String>>,
}

impl ScriptedAnalyzer {
    fn new() -> Self {
        Self {
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl Analyzer for ScriptedAnalyzer {
    fn analyze(&self, image: &Path, prompt: &str) -> Result<AnalysisRecord> {
        let name = image.file_name().unwrap().to_string_lossy().into_owned();
        self.seen.borrow_mut().push(name.clone());
        if name.contains("bad") {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )));
        }
        Ok(AnalysisRecord::succeeded(
            &name,
            format!("{prompt}: 2 bottles"),
            "gpt-4o".into(),
            Some(Usage {
                prompt_tokens: 90,
                completion_tokens: 10,
                total_tokens: 100,
            }),
        ))
    }
}

fn frames_dir(names: &[&str]) -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let frames = dir.path().join("selectedFrame");
    fs::create_dir(&frames).unwrap();
    for name in names {
        fs::write(frames.join(name), b"\xff\xd8\xff").unwrap();
    }
    (dir, frames)
}

fn exts() -> Vec<String> {
    vec!["jpg".into(), "png".into()]
}

#[test]
fn lists_only_images_sorted() {
    let (_guard, frames) = frames_dir(&[
        "frame_002.jpg",
        "frame_001.JPG",
        "notes.txt",
        "frame_003.png",
    ]);
    fs::create_dir(frames.join("sub.jpg")).unwrap();

    let names: Vec<_> = vision::list_images(&frames, &exts())
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["frame_001.JPG", "frame_002.jpg", "frame_003.png"]);
}

#[test]
fn missing_and_empty_dirs_are_errors() {
    let (guard, frames) = frames_dir(&["readme.md"]);
    assert!(matches!(
        vision::list_images(&guard.path().join("absent"), &exts()),
        Err(Error::InputDirMissing(_))
    ));
    assert!(matches!(
        vision::list_images(&frames, &exts()),
        Err(Error::NoImages(_))
    ));
}

#[test]
fn failures_do_not_stop_the_batch() {
    let (_guard, frames) = frames_dir(&["a.jpg", "b_bad.jpg", "c.jpg"]);
    let images = vision::list_images(&frames, &exts()).unwrap();
    let analyzer = ScriptedAnalyzer::new();

    let mut reported = Vec::new();
    let records = vision::run_batch(&analyzer, &images, "count", |i, r| {
        reported.push((i, r.image.clone()))
    });

    assert_eq!(*analyzer.seen.borrow(), ["a.jpg", "b_bad.jpg", "c.jpg"]);
    assert_eq!(
        reported,
        [
            (1, "a.jpg".to_string()),
            (2, "b_bad.jpg".to_string()),
            (3, "c.jpg".to_string())
        ]
    );
    assert!(records[0].success);
    assert!(!records[1].success);
    assert!(records[1].error.as_deref().unwrap().contains("connection reset"));
    assert_eq!(records[2].response.as_deref(), Some("count: 2 bottles"));

    let summary = vision::Summary::from_records(&records);
    assert_eq!((summary.succeeded, summary.failed, summary.total_tokens), (2, 1, 200));
}

#[test]
fn one_result_file_per_image_plus_run_file() {
    let (guard, frames) = frames_dir(&["a.jpg", "b_bad.jpg"]);
    let images = vision::list_images(&frames, &exts()).unwrap();
    let records = vision::run_batch(&ScriptedAnalyzer::new(), &images, "count", |_, _| {});

    let out = guard.path().join("api_results");
    let saved = vision::save_results(&records, &out, "analysis_results_20260101_000000.json").unwrap();

    assert_eq!(
        saved.image_files,
        [out.join("a.jpg.json"), out.join("b_bad.jpg.json")]
    );
    let single: AnalysisRecord =
        serde_json::from_str(&fs::read_to_string(&saved.image_files[0]).unwrap()).unwrap();
    assert_eq!(single, records[0]);

    let all: Vec<AnalysisRecord> =
        serde_json::from_str(&fs::read_to_string(&saved.run_file).unwrap()).unwrap();
    assert_eq!(all, records);
    assert!(saved.write_failures.is_empty());
    assert_eq!(fs::read_dir(&out).unwrap().count(), 3);
}

#[test]
fn blocked_image_file_keeps_run_file_and_later_images() {
    let (guard, frames) = frames_dir(&["a.jpg", "b.jpg", "c.jpg"]);
    let images = vision::list_images(&frames, &exts()).unwrap();
    let records = vision::run_batch(&ScriptedAnalyzer::new(), &images, "count", |_, _| {});

    let out = guard.path().join("api_results");
    fs::create_dir_all(out.join("b.jpg.json")).unwrap();
    let saved = vision::save_results(&records, &out, "analysis_results_20260101_000000.json").unwrap();

    let all: Vec<AnalysisRecord> =
        serde_json::from_str(&fs::read_to_string(&saved.run_file).unwrap()).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(saved.image_files, [out.join("a.jpg.json"), out.join("c.jpg.json")]);
    assert!(out.join("c.jpg.json").is_file());
    assert_eq!(saved.write_failures.len(), 1);
    assert_eq!(saved.write_failures[0].0, out.join("b.jpg.json"));
}
