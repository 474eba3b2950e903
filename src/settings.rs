// Runtime settings, read from the environment (after `.env` is loaded).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Invalid value '{value}' for {var}: {reason}")]
pub struct SettingsError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    pub dashboard_token: Option<String>,
    pub log_retention: usize,
    pub lockdown_sweep: Duration,
    pub discord_token: Option<String>,
    pub verification_role_id: Option<u64>,
    pub pending_role_id: Option<u64>,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build settings from any key/value source. Unset and blank values fall
    /// back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let sweep_secs: u64 = parse_or(&get, "LOCKDOWN_SWEEP_SECS", 15)?;
        if sweep_secs == 0 {
            return Err(SettingsError {
                var: "LOCKDOWN_SWEEP_SECS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            bind: parse_or(&get, "DASHBOARD_BIND", SocketAddr::from(([0, 0, 0, 0], 5000)))?,
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            dashboard_token: get("DASHBOARD_TOKEN"),
            log_retention: parse_or(&get, "LOG_RETENTION", 100)?,
            lockdown_sweep: Duration::from_secs(sweep_secs),
            discord_token: get("DISCORD_TOKEN"),
            verification_role_id: parse_optional(&get, "VERIFICATION_ROLE_ID")?,
            pending_role_id: parse_optional(&get, "PENDING_ROLE_ID")?,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("guild_guard.db")
    }
}

fn parse_optional<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, SettingsError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(var)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| SettingsError {
                var,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

fn parse_or<T>(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, SettingsError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_optional(get, var)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, SettingsError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[]).unwrap();
        assert_eq!(settings.bind.to_string(), "0.0.0.0:5000");
        assert_eq!(settings.data_dir, PathBuf::from("data"));
        assert_eq!(settings.log_retention, 100);
        assert_eq!(settings.lockdown_sweep, Duration::from_secs(15));
        assert!(settings.discord_token.is_none());
        assert!(settings.dashboard_token.is_none());
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let settings = settings(&[("DISCORD_TOKEN", "  "), ("LOG_RETENTION", "")]).unwrap();
        assert!(settings.discord_token.is_none());
        assert_eq!(settings.log_retention, 100);
    }

    #[test]
    fn test_invalid_value_names_variable() {
        let err = settings(&[("VERIFICATION_ROLE_ID", "verified")]).unwrap_err();
        assert_eq!(err.var, "VERIFICATION_ROLE_ID");
        assert!(err.to_string().contains("VERIFICATION_ROLE_ID"));

        let err = settings(&[("LOCKDOWN_SWEEP_SECS", "0")]).unwrap_err();
        assert_eq!(err.var, "LOCKDOWN_SWEEP_SECS");
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("DASHBOARD_BIND", "127.0.0.1:8080"),
            ("PENDING_ROLE_ID", "123"),
            ("DATA_DIR", "/var/lib/guard"),
        ])
        .unwrap();
        assert_eq!(settings.bind.port(), 8080);
        assert_eq!(settings.pending_role_id, Some(123));
        assert_eq!(
            settings.database_path(),
            PathBuf::from("/var/lib/guard/guild_guard.db")
        );
    }
}
