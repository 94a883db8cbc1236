//! Stand-in for NRAO's CAPO configuration service: a `ProfileLoader` that
//! reads the three settings a profile would otherwise resolve to straight
//! out of the process environment.

use std::collections::HashMap;

use yoink_core::errors::{YoinkError, YoinkResult};
use yoink_core::settings::{ProfileLoader, Settings};

const ENV_LOCATOR_SERVICE_URL: &str = "YOINK_LOCATOR_SERVICE_URL";
const ENV_EXECUTION_SITE: &str = "YOINK_EXECUTION_SITE";
const ENV_THREADS_PER_HOST: &str = "YOINK_THREADS_PER_HOST";

pub struct EnvProfileLoader;

impl ProfileLoader for EnvProfileLoader {
    fn load(&self, profile: Option<&str>) -> YoinkResult<Settings> {
        if profile.is_none() {
            return Err(YoinkError::NoProfile);
        }

        let mut map = HashMap::new();
        for (env_key, setting_key) in [
            (ENV_LOCATOR_SERVICE_URL, "locator_service_url"),
            (ENV_EXECUTION_SITE, "execution_site"),
            (ENV_THREADS_PER_HOST, "threads_per_host"),
        ] {
            let value = std::env::var(env_key)
                .map_err(|_| YoinkError::MissingSetting(setting_key.to_string()))?;
            map.insert(setting_key.to_string(), value);
        }

        Settings::from_map(&map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        std::env::remove_var(ENV_LOCATOR_SERVICE_URL);
        std::env::remove_var(ENV_EXECUTION_SITE);
        std::env::remove_var(ENV_THREADS_PER_HOST);
    }

    #[test]
    fn no_profile_name_is_no_profile() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        let err = EnvProfileLoader.load(None).unwrap_err();
        assert!(matches!(err, YoinkError::NoProfile));
    }

    #[test]
    fn missing_env_var_is_missing_setting() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var(ENV_LOCATOR_SERVICE_URL, "http://locator.example/");
        let err = EnvProfileLoader.load(Some("nmtest")).unwrap_err();
        assert!(matches!(err, YoinkError::MissingSetting(_)));
        clear_env();
    }

    #[test]
    fn complete_environment_resolves_settings() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        std::env::set_var(ENV_LOCATOR_SERVICE_URL, "http://locator.example/");
        std::env::set_var(ENV_EXECUTION_SITE, "DSOC");
        std::env::set_var(ENV_THREADS_PER_HOST, "4");

        let settings = EnvProfileLoader.load(Some("nmtest")).unwrap();
        assert_eq!(settings.execution_site, "DSOC");
        assert_eq!(settings.threads_per_host, 4);
        clear_env();
    }
}
