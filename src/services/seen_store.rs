use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;

use crate::domain::job::JobPosting;

/// Persisted set of posting identities already reported, stored as a JSON
/// array of strings. The set only ever grows; the file is the single piece
/// of state that outlives a run.
pub struct SeenStore {
    path: PathBuf,
}

impl SeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SeenStore { path: path.into() }
    }

    /// A missing or corrupt file starts the run with an empty set; it is
    /// never fatal.
    pub fn load(&self) -> HashSet<String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => {
                log::info!("No seen file at {:?}. Starting fresh.", self.path);
                return HashSet::new();
            }
        };

        match serde_json::from_str::<Vec<String>>(&content) {
            Ok(identities) => {
                let seen: HashSet<String> = identities.into_iter().collect();
                log::info!(
                    "Loaded {} previously reported postings from {:?}",
                    seen.len(),
                    self.path
                );
                seen
            }
            Err(e) => {
                log::error!(
                    "Seen file {:?} is corrupt ({}). Starting fresh.",
                    self.path,
                    e
                );
                HashSet::new()
            }
        }
    }

    /// New postings in discovery order. Duplicate identities inside the same
    /// run collapse to their first occurrence.
    pub fn diff_new<'a>(
        &self,
        all_jobs: &'a [JobPosting],
        seen: &HashSet<String>,
    ) -> Vec<&'a JobPosting> {
        let mut within_run: HashSet<&str> = HashSet::new();
        let mut new_jobs = Vec::new();

        for job in all_jobs {
            if seen.contains(&job.identity) {
                continue;
            }
            if within_run.insert(job.identity.as_str()) {
                new_jobs.push(job);
            }
        }

        new_jobs
    }

    pub fn commit(&self, seen: &mut HashSet<String>, new_jobs: &[&JobPosting]) {
        for job in new_jobs {
            seen.insert(job.identity.clone());
        }
    }

    /// Write-then-rename so a crash mid-write never leaves a truncated file
    /// behind to cause duplicate re-alerts.
    pub fn save(&self, seen: &HashSet<String>) -> anyhow::Result<()> {
        let mut identities: Vec<&String> = seen.iter().collect();
        identities.sort();

        let json =
            serde_json::to_string_pretty(&identities).context("failed to serialize seen set")?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).with_context(|| format!("failed to write {:?}", tmp_path))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("failed to move {:?} into place", tmp_path))?;

        Ok(())
    }
}
