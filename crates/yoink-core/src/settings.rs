//! Resolved settings and the profile-loading seam.
//!
//! Settings is a closed record: the three fields below are the only ones
//! the core ever needs, and construction fails loudly (`MissingSetting`) if
//! any of them can't be found. How a profile name turns into these values
//! is an external collaborator's job (see `ProfileLoader`); the real system
//! resolves it against NRAO's CAPO configuration service, which this crate
//! does not reach.

use std::collections::HashMap;

use crate::errors::{YoinkError, YoinkResult};

/// The three settings the core requires, already resolved from a profile.
#[derive(Debug, Clone)]
pub struct Settings {
    pub locator_service_url: String,
    pub execution_site: String,
    pub threads_per_host: usize,
}

const KEY_LOCATOR_SERVICE_URL: &str = "locator_service_url";
const KEY_EXECUTION_SITE: &str = "execution_site";
const KEY_THREADS_PER_HOST: &str = "threads_per_host";

impl Settings {
    /// Build a `Settings` from a flat string map, the shape a profile loader
    /// would hand back. Fails with `MissingSetting` naming the first absent
    /// or unparsable key.
    pub fn from_map(map: &HashMap<String, String>) -> YoinkResult<Self> {
        let locator_service_url = required(map, KEY_LOCATOR_SERVICE_URL)?;
        let execution_site = required(map, KEY_EXECUTION_SITE)?;
        let threads_per_host_raw = required(map, KEY_THREADS_PER_HOST)?;
        let threads_per_host: usize = threads_per_host_raw.parse().map_err(|_| {
            YoinkError::MissingSetting(format!(
                "{KEY_THREADS_PER_HOST} must be a positive integer, got '{threads_per_host_raw}'"
            ))
        })?;
        if threads_per_host == 0 {
            return Err(YoinkError::MissingSetting(format!(
                "{KEY_THREADS_PER_HOST} must be a positive integer, got 0"
            )));
        }

        Ok(Self {
            locator_service_url,
            execution_site,
            threads_per_host,
        })
    }
}

fn required(map: &HashMap<String, String>, key: &str) -> YoinkResult<String> {
    map.get(key)
        .cloned()
        .ok_or_else(|| YoinkError::MissingSetting(key.to_string()))
}

/// The external collaborator that turns a profile name into `Settings`.
///
/// The core only ever consumes a resolved `Settings` record; this trait is
/// the seam a caller plugs a real profile service into. `yoink-cli` supplies
/// one concrete, environment-variable-backed implementation.
pub trait ProfileLoader {
    fn load(&self, profile: Option<&str>) -> YoinkResult<Settings>;
}
