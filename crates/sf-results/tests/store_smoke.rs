use std::path::PathBuf;

use sf_core::SegmentId;
use sf_mission::{MissionResults, SegmentResult, SegmentStatus, SolveReport};
use sf_results::*;
use sf_state::{Array, Conditions};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{prefix}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn segment(index: u32, name: &str, converged: bool) -> SegmentResult {
    let mut conditions = Conditions::new();
    conditions
        .set(
            "frames.inertial.time",
            Array::from_column_slice(3, 1, &[0.0, 5.0, 10.0]),
        )
        .unwrap();
    conditions
        .set(
            "weights.total_mass",
            Array::from_column_slice(3, 1, &[1000.0, 999.9, 999.8]),
        )
        .unwrap();
    SegmentResult {
        id: SegmentId::from_index(index),
        name: name.to_string(),
        kind: "cruise".to_string(),
        status: if converged {
            SegmentStatus::PostProcessed
        } else {
            SegmentStatus::Failed
        },
        report: Some(SolveReport {
            converged,
            iterations: 4,
            residual_norm: if converged { 1e-12 } else { f64::NAN },
        }),
        conditions,
    }
}

fn results(name: &str) -> MissionResults {
    MissionResults {
        name: name.to_string(),
        segments: vec![segment(0, "cruise", true), segment(1, "climb", false)],
    }
}

#[test]
fn save_and_load_run() {
    let store = ResultStore::new(unique_temp_dir("sf_results_save")).unwrap();
    let results = results("hop");
    let run_id = compute_run_id(&results.name, "v1").unwrap();

    let manifest = store.save_mission(&run_id, &results, "v1").unwrap();
    assert!(store.has_run(&run_id));
    assert_eq!(manifest.content_digest.len(), 64);
    assert!(!manifest.all_converged());

    let loaded = store.load_manifest(&run_id).unwrap();
    assert_eq!(loaded, manifest);
    assert_eq!(loaded.segments[0].status, "post_processed");
    assert_eq!(loaded.segments[1].residual_norm, None);
    assert!(chrono::DateTime::parse_from_rfc3339(&loaded.timestamp).is_ok());

    let archive = store.load_segment(&run_id, "cruise").unwrap();
    let conditions = archive.to_conditions().unwrap();
    assert_eq!(conditions, results.segments[0].conditions);
}

#[test]
fn digest_depends_on_content() {
    let store = ResultStore::new(unique_temp_dir("sf_results_digest")).unwrap();
    let a = store.save_mission("a", &results("hop"), "v1").unwrap();

    let mut changed = results("hop");
    changed.segments[0]
        .conditions
        .set("weights.total_mass", Array::from_element(3, 1, 1.0))
        .unwrap();
    let b = store.save_mission("b", &changed, "v1").unwrap();
    assert_ne!(a.content_digest, b.content_digest);
}

#[test]
fn list_and_delete_runs() {
    let store = ResultStore::new(unique_temp_dir("sf_results_list")).unwrap();
    store.save_mission("run1", &results("hop"), "v1").unwrap();
    store.save_mission("run2", &results("hop"), "v1").unwrap();
    store.save_mission("run3", &results("ferry"), "v1").unwrap();

    assert_eq!(store.list_runs("hop").unwrap().len(), 2);
    assert_eq!(store.list_runs("ferry").unwrap().len(), 1);

    store.delete_run("run1").unwrap();
    assert!(!store.has_run("run1"));
    assert_eq!(store.list_runs("hop").unwrap().len(), 1);
}

#[test]
fn missing_runs_and_segments_are_reported() {
    let store = ResultStore::new(unique_temp_dir("sf_results_missing")).unwrap();
    assert!(matches!(
        store.load_manifest("nope"),
        Err(ResultsError::RunNotFound { .. })
    ));

    store.save_mission("run", &results("hop"), "v1").unwrap();
    assert!(matches!(
        store.load_segment("run", "descent"),
        Err(ResultsError::SegmentNotFound { .. })
    ));
}

#[test]
fn segment_names_cannot_escape_the_run_directory() {
    let root = unique_temp_dir("sf_results_escape");
    let store = ResultStore::new(root.clone()).unwrap();
    let mut results = results("hop");
    results.segments[0].name = "../../escape".to_string();

    let manifest = store.save_mission("run", &results, "v1").unwrap();
    let archive = &manifest.segments[0].archive;
    assert_eq!(archive, "00_______escape.json");
    assert!(root.join("run").join("segments").join(archive).exists());
    assert!(!root.join("escape.json").exists());

    let loaded = store.load_segment("run", "../../escape").unwrap();
    assert_eq!(
        loaded.to_conditions().unwrap(),
        results.segments[0].conditions
    );
}

#[test]
fn archive_names_with_separators_are_rejected() {
    let store = ResultStore::new(unique_temp_dir("sf_results_bad_name")).unwrap();
    let results = results("hop");
    let archive = ConditionArchive::from_conditions(&results.segments[0].conditions).unwrap();
    let mut manifest = store.save_mission("run", &results, "v1").unwrap();
    for file in ["../outside.json", "a/b.json", "..", ""] {
        assert!(matches!(
            store.save_run(&mut manifest, &[(file.to_string(), archive.clone())]),
            Err(ResultsError::InvalidArchiveName { .. })
        ));
    }
}
