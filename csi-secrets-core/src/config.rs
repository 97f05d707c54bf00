use csi_secrets_spec::FilePermission;
use std::time::Duration;
use tracing::{error, warn};

pub const AGENT_TIMEOUT_ENV: &str = "CSI_SECRETS_AGENT_HTTP_TIMEOUT";
pub const ADDON_VERSION_ENV: &str = "CSI_SECRETS_ADDON_VERSION";
pub const MOUNT_DEADLINE_ENV: &str = "CSI_SECRETS_MOUNT_DEADLINE";
pub const REGION_ENV: &str = "AWS_REGION";
pub const DEFAULT_PERMISSION_ENV: &str = "CSI_SECRETS_DEFAULT_FILE_PERMISSION";

/// Timeout used for the identity agent when none is configured.
pub const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Agent timeouts above this are accepted but logged.
pub const AGENT_TIMEOUT_WARN_THRESHOLD: Duration = Duration::from_secs(30);

/// Process-wide provider settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    agent_timeout: Option<Duration>,
    addon_version: Option<String>,
    mount_deadline: Option<Duration>,
    default_region: Option<String>,
    default_permission: FilePermission,
}

impl ProviderSettings {
    pub fn new() -> Self {
        Self {
            agent_timeout: None,
            addon_version: None,
            mount_deadline: None,
            default_region: None,
            default_permission: FilePermission::DEFAULT,
        }
    }

    /// Load settings from the environment.
    ///
    /// * `CSI_SECRETS_AGENT_HTTP_TIMEOUT` agent request timeout (`500ms`, `2s`).
    /// * `CSI_SECRETS_ADDON_VERSION` suffix for the user-agent marker.
    /// * `CSI_SECRETS_MOUNT_DEADLINE` deadline for a whole mount.
    /// * `AWS_REGION` region used when a request carries none.
    /// * `CSI_SECRETS_DEFAULT_FILE_PERMISSION` four digit octal mode.
    pub fn from_env() -> Self {
        let mut settings = ProviderSettings::new();

        if let Ok(value) = std::env::var(AGENT_TIMEOUT_ENV) {
            settings.agent_timeout = parse_agent_timeout(&value);
        }

        if let Ok(version) = std::env::var(ADDON_VERSION_ENV) {
            if !version.trim().is_empty() {
                settings.addon_version = Some(version.trim().to_string());
            }
        }

        if let Ok(value) = std::env::var(MOUNT_DEADLINE_ENV) {
            match humantime::parse_duration(value.trim()) {
                Ok(deadline) if !deadline.is_zero() => settings.mount_deadline = Some(deadline),
                Ok(_) => {}
                Err(err) => error!(value = %value, error = %err, "ignoring invalid mount deadline"),
            }
        }

        if let Ok(region) = std::env::var(REGION_ENV) {
            if !region.trim().is_empty() {
                settings.default_region = Some(region.trim().to_string());
            }
        }

        if let Ok(value) = std::env::var(DEFAULT_PERMISSION_ENV) {
            match FilePermission::parse(value.trim()) {
                Ok(permission) => settings.default_permission = permission,
                Err(err) => error!(error = %err, "ignoring invalid default file permission"),
            }
        }

        settings
    }

    pub fn agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = Some(timeout);
        self
    }

    pub fn addon_version(mut self, version: impl Into<String>) -> Self {
        self.addon_version = Some(version.into());
        self
    }

    pub fn mount_deadline(mut self, deadline: Duration) -> Self {
        self.mount_deadline = Some(deadline);
        self
    }

    pub fn default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = Some(region.into());
        self
    }

    pub fn default_permission(mut self, permission: FilePermission) -> Self {
        self.default_permission = permission;
        self
    }

    /// The configured agent timeout, or [`DEFAULT_AGENT_TIMEOUT`].
    pub fn effective_agent_timeout(&self) -> Duration {
        self.agent_timeout.unwrap_or(DEFAULT_AGENT_TIMEOUT)
    }

    pub fn configured_agent_timeout(&self) -> Option<Duration> {
        self.agent_timeout
    }

    pub fn addon(&self) -> Option<&str> {
        self.addon_version.as_deref()
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.mount_deadline
    }

    pub fn region(&self) -> Option<&str> {
        self.default_region.as_deref()
    }

    pub fn permission(&self) -> FilePermission {
        self.default_permission
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        ProviderSettings::new()
    }
}

/// Validate an agent timeout value. Invalid or non-positive values fall back
/// to the platform default.
pub fn parse_agent_timeout(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match humantime::parse_duration(value) {
        Ok(timeout) if timeout.is_zero() => {
            error!(value = %value, "agent timeout must be positive, using default");
            None
        }
        Ok(timeout) => {
            if timeout > AGENT_TIMEOUT_WARN_THRESHOLD {
                warn!(value = %value, "agent timeout is unusually large");
            }
            Some(timeout)
        }
        Err(err) => {
            error!(value = %value, error = %err, "invalid agent timeout, using default");
            None
        }
    }
}
