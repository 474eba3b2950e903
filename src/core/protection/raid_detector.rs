// Sliding-window counters that turn single gateway events into threats.
//
// Joins are measured against the guild's `raid_threshold` / `raid_window`;
// structural changes use fixed limits since no legitimate admin deletes
// three channels in a few seconds.

use super::protection_models::{
    Burst, GuardEvent, Threat, CREATION_LIMIT, DELETION_LIMIT, STRUCTURE_WINDOW_SECS,
};
use crate::core::guild_config::GuildConfig;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;

#[derive(Default)]
pub struct RaidDetector {
    history: DashMap<(u64, Burst), VecDeque<DateTime<Utc>>>,
}

impl RaidDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `event` at `now`. Returns the threat when this event makes its
    /// burst reach the limit; the burst then starts over.
    pub fn record(
        &self,
        guild_id: u64,
        event: GuardEvent,
        config: &GuildConfig,
        now: DateTime<Utc>,
    ) -> Option<Threat> {
        let burst = event.burst();
        let (limit, window) = limits(burst, config)?;

        let mut times = self.history.entry((guild_id, burst)).or_default();
        times.push_back(now);
        while times.front().is_some_and(|t| now - *t >= window) {
            times.pop_front();
        }
        if times.len() < limit {
            return None;
        }

        let count = times.len();
        times.clear();
        Some(Threat::from_burst(burst, count))
    }

    /// Drop counters with nothing recent in them.
    pub fn prune(&self, now: DateTime<Utc>) {
        let horizon = Duration::days(1);
        self.history
            .retain(|_, times| times.back().is_some_and(|t| now - *t < horizon));
    }
}

/// The limit and window for a burst. `None` when the guild turned it off.
fn limits(burst: Burst, config: &GuildConfig) -> Option<(usize, Duration)> {
    match burst {
        Burst::Joins => {
            if config.raid_threshold == 0 || config.raid_window == 0 {
                return None;
            }
            Some((
                config.raid_threshold as usize,
                Duration::seconds(config.raid_window as i64),
            ))
        }
        Burst::Creations => Some((CREATION_LIMIT, Duration::seconds(STRUCTURE_WINDOW_SECS))),
        Burst::Deletions => Some((DELETION_LIMIT, Duration::seconds(STRUCTURE_WINDOW_SECS))),
    }
}
