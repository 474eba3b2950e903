// Per-guild moderation settings and the partial updates the dashboard sends.

use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::collections::BTreeSet;

/// Moderation settings for one guild (or the global template).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildConfig {
    #[serde(
        default,
        serialize_with = "crate::core::snowflake::serialize_optional",
        deserialize_with = "crate::core::snowflake::deserialize_optional"
    )]
    pub guild_id: Option<u64>,
    /// Joins within `raid_window` that count as a raid.
    pub raid_threshold: u32,
    /// Raid detection window in seconds.
    pub raid_window: u32,
    pub spam_threshold: u32,
    pub mass_ping_threshold: u32,
    pub use_math_captcha: bool,
    pub custom_dm_message: Option<String>,
    pub custom_welcome_message: Option<String>,
    pub bad_words: BTreeSet<String>,
    pub lockdown_default_minutes: u32,
}

impl GuildConfig {
    pub fn defaults_for(guild_id: Option<u64>) -> Self {
        Self {
            guild_id,
            ..Default::default()
        }
    }

    /// Check the invariants that can't be expressed in the field types.
    /// Used on data that didn't come through a validated patch (restored backups).
    pub fn invalid_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self
            .bad_words
            .iter()
            .any(|w| w.is_empty() || w.trim() != w.as_str())
        {
            fields.push("bad_words");
        }
        fields
    }
}

impl Default for GuildConfig {
    fn default() -> Self {
        Self {
            guild_id: None,
            raid_threshold: 5,
            raid_window: 60,
            spam_threshold: 5,
            mass_ping_threshold: 5,
            use_math_captcha: false,
            custom_dm_message: Some("Welcome!".to_string()),
            custom_welcome_message: Some("Welcome {user}!".to_string()),
            bad_words: BTreeSet::new(),
            lockdown_default_minutes: 10,
        }
    }
}

/// A partial config update. Absent (or `null`) fields are left untouched.
///
/// Numbers stay as raw JSON numbers until validation so that a negative or
/// fractional value is reported against its field name instead of failing
/// deserialization of the whole body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuildConfigPatch {
    pub raid_threshold: Option<Number>,
    pub raid_window: Option<Number>,
    pub spam_threshold: Option<Number>,
    pub mass_ping_threshold: Option<Number>,
    pub use_math_captcha: Option<bool>,
    pub custom_dm_message: Option<String>,
    pub custom_welcome_message: Option<String>,
    pub bad_words: Option<Vec<String>>,
    pub lockdown_default_minutes: Option<Number>,
}

/// One rejected field of a patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: &'static str,
    pub reason: String,
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

impl GuildConfigPatch {
    /// Apply this patch on top of `base`, or report every offending field.
    pub fn apply_to(&self, base: &GuildConfig) -> Result<GuildConfig, Vec<FieldIssue>> {
        let mut issues = Vec::new();
        let mut merged = base.clone();

        let numeric = [
            ("raid_threshold", &self.raid_threshold, &mut merged.raid_threshold),
            ("raid_window", &self.raid_window, &mut merged.raid_window),
            ("spam_threshold", &self.spam_threshold, &mut merged.spam_threshold),
            (
                "mass_ping_threshold",
                &self.mass_ping_threshold,
                &mut merged.mass_ping_threshold,
            ),
            (
                "lockdown_default_minutes",
                &self.lockdown_default_minutes,
                &mut merged.lockdown_default_minutes,
            ),
        ];
        for (field, value, target) in numeric {
            if let Some(number) = value {
                match non_negative_u32(number) {
                    Ok(v) => *target = v,
                    Err(reason) => issues.push(FieldIssue { field, reason }),
                }
            }
        }

        if let Some(flag) = self.use_math_captcha {
            merged.use_math_captcha = flag;
        }
        if let Some(message) = &self.custom_dm_message {
            merged.custom_dm_message = non_blank(message);
        }
        if let Some(message) = &self.custom_welcome_message {
            merged.custom_welcome_message = non_blank(message);
        }

        if let Some(words) = &self.bad_words {
            let trimmed: Vec<&str> = words.iter().map(|w| w.trim()).collect();
            if trimmed.iter().any(|w| w.is_empty()) {
                issues.push(FieldIssue {
                    field: "bad_words",
                    reason: "must not contain empty or whitespace-only entries".to_string(),
                });
            } else {
                merged.bad_words = trimmed.into_iter().map(str::to_string).collect();
            }
        }

        if issues.is_empty() {
            Ok(merged)
        } else {
            Err(issues)
        }
    }
}

fn non_negative_u32(number: &Number) -> Result<u32, String> {
    if let Some(v) = number.as_u64() {
        return u32::try_from(v).map_err(|_| format!("must be at most {}", u32::MAX));
    }
    if number.as_i64().is_some() {
        return Err("must not be negative".to_string());
    }
    Err("must be a whole number".to_string())
}

fn non_blank(message: &str) -> Option<String> {
    if message.trim().is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(value: serde_json::Value) -> GuildConfigPatch {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_partial_patch_keeps_other_fields() {
        let base = GuildConfig::default();
        let merged = patch(json!({"raid_threshold": 8, "bad_words": [" spam ", "scam"]}))
            .apply_to(&base)
            .unwrap();

        assert_eq!(merged.raid_threshold, 8);
        assert_eq!(
            merged.bad_words,
            ["scam", "spam"]
                .iter()
                .map(|s| s.to_string())
                .collect::<BTreeSet<_>>()
        );
        assert_eq!(merged.raid_window, 60);
        assert_eq!(merged.custom_dm_message.as_deref(), Some("Welcome!"));
    }

    #[test]
    fn test_every_bad_field_is_named() {
        let issues = patch(json!({
            "raid_threshold": -1,
            "raid_window": 2.5,
            "spam_threshold": 3,
            "bad_words": ["ok", "   "]
        }))
        .apply_to(&GuildConfig::default())
        .unwrap_err();

        let fields: Vec<_> = issues.iter().map(|i| i.field).collect();
        assert_eq!(fields, vec!["raid_threshold", "raid_window", "bad_words"]);
        assert_eq!(issues[0].reason, "must not be negative");
        assert_eq!(issues[1].reason, "must be a whole number");
    }

    #[test]
    fn test_null_fields_are_ignored() {
        let base = GuildConfig::default();
        let merged = patch(json!({"raid_threshold": null, "use_math_captcha": true}))
            .apply_to(&base)
            .unwrap();
        assert_eq!(merged.raid_threshold, base.raid_threshold);
        assert!(merged.use_math_captcha);
    }

    #[test]
    fn test_blank_message_clears_it() {
        let merged = patch(json!({"custom_dm_message": "  "}))
            .apply_to(&GuildConfig::default())
            .unwrap();
        assert_eq!(merged.custom_dm_message, None);
    }

    #[test]
    fn test_oversized_number_rejected() {
        let issues = patch(json!({"spam_threshold": 5_000_000_000u64}))
            .apply_to(&GuildConfig::default())
            .unwrap_err();
        assert_eq!(issues[0].field, "spam_threshold");
    }
}
