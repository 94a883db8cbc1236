//! The parsed CLI intent the core consumes: one immutable `Request` per run.

use std::path::PathBuf;

use crate::errors::{YoinkError, YoinkResult};

/// Where to resolve the files report from.
#[derive(Debug, Clone)]
pub enum Locator {
    ProductLocator(String),
    LocationFile(PathBuf),
}

/// Everything the Orchestrator needs to know about a single invocation.
#[derive(Debug, Clone)]
pub struct Request {
    pub locator: Locator,
    pub output_dir: PathBuf,
    pub dry_run: bool,
    pub force_overwrite: bool,
    pub sdm_only: bool,
    pub verbose: bool,
    pub profile_name: Option<String>,
}

impl Request {
    /// Validate the request shape the spec requires: exactly one locator
    /// source, and an output directory that either already exists and is
    /// writable or can be reached (its ancestry exists).
    pub fn validate(&self) -> YoinkResult<()> {
        if let Locator::LocationFile(path) = &self.locator {
            if !path.exists() {
                return Err(YoinkError::FileError(format!(
                    "location file does not exist: {}",
                    path.display()
                )));
            }
        }

        if self.output_dir.exists() {
            let metadata = std::fs::metadata(&self.output_dir).map_err(|e| {
                YoinkError::FileError(format!("{}: {e}", self.output_dir.display()))
            })?;

            if !metadata.is_dir() {
                return Err(YoinkError::FileError(format!(
                    "output directory is not a directory: {}",
                    self.output_dir.display()
                )));
            }

            if metadata.permissions().readonly() {
                return Err(YoinkError::FileError(format!(
                    "output directory is not writable: {}",
                    self.output_dir.display()
                )));
            }
        }

        Ok(())
    }
}
