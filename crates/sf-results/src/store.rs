//! Run storage API.
//!
//! Layout: `<root>/<run_id>/manifest.json` plus one condition archive per
//! segment under `<root>/<run_id>/segments/`.

use std::fs;
use std::path::PathBuf;

use sf_mission::MissionResults;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::archive::ConditionArchive;
use crate::types::{RunManifest, SegmentSummary};
use crate::{ResultsError, ResultsResult};

#[derive(Debug, Clone)]
pub struct ResultStore {
    root_dir: PathBuf,
}

impl ResultStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn root(&self) -> &PathBuf {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join("manifest.json").exists()
    }

    /// Archive every segment of `results` and write the manifest.
    pub fn save_mission(
        &self,
        run_id: &str,
        results: &MissionResults,
        solver_version: &str,
    ) -> ResultsResult<RunManifest> {
        let mut archives = Vec::with_capacity(results.segments.len());
        let mut summaries = Vec::with_capacity(results.segments.len());
        for (index, segment) in results.segments.iter().enumerate() {
            let file = archive_file_name(index, &segment.name);
            archives.push((
                file.clone(),
                ConditionArchive::from_conditions(&segment.conditions)?,
            ));
            summaries.push(SegmentSummary::from_result(segment, file));
        }

        let mut manifest = RunManifest {
            run_id: run_id.to_string(),
            mission: results.name.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            solver_version: solver_version.to_string(),
            content_digest: String::new(),
            segments: summaries,
        };
        self.save_run(&mut manifest, &archives)?;
        Ok(manifest)
    }

    /// Write archives and the manifest, filling in its content digest.
    pub fn save_run(
        &self,
        manifest: &mut RunManifest,
        archives: &[(String, ConditionArchive)],
    ) -> ResultsResult<()> {
        let run_dir = self.run_dir(&manifest.run_id);
        let segments_dir = run_dir.join("segments");
        fs::create_dir_all(&segments_dir)?;

        if let Some((file, _)) = archives.iter().find(|(file, _)| !is_plain_file_name(file)) {
            return Err(ResultsError::InvalidArchiveName { file: file.clone() });
        }

        let mut hasher = Sha256::new();
        for (file, archive) in archives {
            let json = archive.to_json()?;
            hasher.update(json.as_bytes());
            fs::write(segments_dir.join(file), json)?;
        }
        manifest.content_digest = format!("{:x}", hasher.finalize());

        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join("manifest.json"), manifest_json)?;

        info!(
            run_id = manifest.run_id.as_str(),
            segments = archives.len(),
            "saved run"
        );
        Ok(())
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<RunManifest> {
        let manifest_path = self.run_dir(run_id).join("manifest.json");

        if !manifest_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(manifest_path)?;
        let manifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    /// Load the archive of the segment called `segment`.
    pub fn load_segment(&self, run_id: &str, segment: &str) -> ResultsResult<ConditionArchive> {
        let manifest = self.load_manifest(run_id)?;
        let summary = manifest
            .segment(segment)
            .ok_or_else(|| ResultsError::SegmentNotFound {
                run_id: run_id.to_string(),
                segment: segment.to_string(),
            })?;
        let path = self.run_dir(run_id).join("segments").join(&summary.archive);
        let content = fs::read_to_string(path)?;
        ConditionArchive::from_json(&content)
    }

    /// Every stored run of the mission called `mission`.
    pub fn list_runs(&self, mission: &str) -> ResultsResult<Vec<RunManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id)
                    && manifest.mission == mission
                {
                    runs.push(manifest);
                }
            }
        }

        Ok(runs)
    }

    pub fn delete_run(&self, run_id: &str) -> ResultsResult<()> {
        let run_dir = self.run_dir(run_id);
        if run_dir.exists() {
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }
}

/// `NN_<name>.json`, with anything but ASCII letters, digits, '_' and '-'
/// in the segment name replaced by '_'.
fn archive_file_name(index: usize, segment: &str) -> String {
    let name: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{index:02}_{name}.json")
}

fn is_plain_file_name(file: &str) -> bool {
    !file.is_empty()
        && file != "."
        && file != ".."
        && !file.contains(['/', '\\'])
}
