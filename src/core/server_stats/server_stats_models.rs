use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Whether the bot's gateway connection is up. Serialized the way the
/// dashboard displays it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BotStatus {
    Online,
    Offline,
}

/// Live numbers for the dashboard's stats cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuildStats {
    pub total_members: u64,
    pub verified_members: u64,
    pub pending_members: u64,
    pub total_servers: u64,
    pub uptime: String,
    pub bot_status: BotStatus,
    pub raid_mode_active: bool,
    pub lockdown_active: bool,
    pub lockdown_expires_at: Option<DateTime<Utc>>,
    pub lockdown_remaining_secs: Option<i64>,
}

/// `H:MM:SS`, with `N day(s), ` in front once the bot has run for a day.
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let clock = format!("{}:{:02}:{:02}", hours, minutes, seconds);
    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        n => format!("{} days, {}", n, clock),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::seconds(0)), "0:00:00");
        assert_eq!(format_uptime(Duration::seconds(3_725)), "1:02:05");
        assert_eq!(format_uptime(Duration::seconds(86_400 + 61)), "1 day, 0:01:01");
        assert_eq!(
            format_uptime(Duration::days(3) + Duration::hours(23)),
            "3 days, 23:00:00"
        );
        assert_eq!(format_uptime(Duration::seconds(-5)), "0:00:00");
    }

    #[test]
    fn test_bot_status_serializes_as_word() {
        assert_eq!(serde_json::to_value(BotStatus::Online).unwrap(), "Online");
        assert_eq!(serde_json::to_value(BotStatus::Offline).unwrap(), "Offline");
    }
}
