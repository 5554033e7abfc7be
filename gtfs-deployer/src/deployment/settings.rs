use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::deployment::deployment_error::DeploymentError;

/// deployer configuration, loaded from a TOML file. every field has a
/// default so a missing file or empty table is usable as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct DeployerSettings {
    /// how many days forward a plan should attempt to cover
    #[serde(default = "default_plan_window_days")]
    pub plan_window_days: i64,
    /// where to send assembled plans; when unset, plans are built but not
    /// dispatched
    #[serde(default)]
    pub deployer_url: Option<String>,
    #[serde(default = "default_dispatch_timeout_seconds")]
    pub dispatch_timeout_seconds: u64,
}

fn default_plan_window_days() -> i64 {
    14
}

fn default_dispatch_timeout_seconds() -> u64 {
    30
}

impl Default for DeployerSettings {
    fn default() -> DeployerSettings {
        DeployerSettings {
            plan_window_days: default_plan_window_days(),
            deployer_url: None,
            dispatch_timeout_seconds: default_dispatch_timeout_seconds(),
        }
    }
}

impl DeployerSettings {
    pub fn from_file(path: &Path) -> Result<DeployerSettings, DeploymentError> {
        config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .map_err(|e| DeploymentError::SettingsError(format!("{e}")))?
            .try_deserialize()
            .map_err(|e| DeploymentError::SettingsError(format!("{e}")))
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_seconds)
    }
}

#[cfg(test)]
mod test {
    use super::DeployerSettings;

    #[test]
    fn test_defaults() {
        let settings = DeployerSettings::default();
        assert_eq!(settings.plan_window_days, 14);
        assert!(settings.deployer_url.is_none());
    }
}
