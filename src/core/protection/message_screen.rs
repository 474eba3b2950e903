// Per-message checks against a guild's blocked words, mention limit and
// message rate.

use super::protection_models::{MessageViolation, MESSAGE_WINDOW_SECS};
use crate::core::guild_config::GuildConfig;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::{BTreeSet, VecDeque};

#[derive(Default)]
pub struct MessageScreen {
    /// (guild, user) -> timestamps of their recent messages.
    recent: DashMap<(u64, u64), VecDeque<DateTime<Utc>>>,
}

impl MessageScreen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check one message. A limit of zero turns that check off.
    pub fn check(
        &self,
        guild_id: u64,
        user_id: u64,
        content: &str,
        mentions: u32,
        config: &GuildConfig,
        now: DateTime<Utc>,
    ) -> Option<MessageViolation> {
        if let Some(word) = blocked_word(content, &config.bad_words) {
            return Some(MessageViolation::BadWord(word));
        }
        if config.mass_ping_threshold > 0 && mentions >= config.mass_ping_threshold {
            return Some(MessageViolation::MassMention { mentions });
        }
        if config.spam_threshold == 0 {
            return None;
        }

        let window = Duration::seconds(MESSAGE_WINDOW_SECS);
        let mut times = self.recent.entry((guild_id, user_id)).or_default();
        times.push_back(now);
        while times.front().is_some_and(|t| now - *t >= window) {
            times.pop_front();
        }
        (times.len() >= config.spam_threshold as usize)
            .then(|| MessageViolation::Flooding { messages: times.len() })
    }

    /// Forget users who haven't written within the window.
    pub fn prune(&self, now: DateTime<Utc>) {
        let window = Duration::seconds(MESSAGE_WINDOW_SECS);
        self.recent
            .retain(|_, times| times.back().is_some_and(|t| now - *t < window));
    }
}

/// The first blocked word contained in `content`, ignoring case.
fn blocked_word(content: &str, words: &BTreeSet<String>) -> Option<String> {
    if words.is_empty() {
        return None;
    }
    let content = content.to_lowercase();
    words
        .iter()
        .find(|word| content.contains(&word.to_lowercase()))
        .cloned()
}
