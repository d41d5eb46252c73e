//! IRC-style message tags attached to a chat event.

use crate::errors::TagParseError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Emote id to the `"start-end"` character offsets it occupies.
///
/// Iteration order follows the order the ids appeared in the tag.
pub type EmoteTag = IndexMap<String, Vec<String>>;

/// Badge name to badge value.
pub type BadgeMap = BTreeMap<String, String>;

/// The `subscriber` tag, which upstream clients deliver either as a boolean
/// or as the raw `"0"`/`"1"` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubscriberTag {
    /// Already-decoded boolean.
    Flag(bool),
    /// Raw protocol string.
    Text(String),
}

impl SubscriberTag {
    /// Only boolean `true` and the literal `"1"` count as subscribed.
    #[must_use]
    pub fn is_subscriber(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Text(text) => text == "1",
        }
    }
}

/// Protocol metadata carried alongside a chat message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MessageTags {
    /// First-party emote positions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotes: Option<EmoteTag>,
    /// Subscriber flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscriber: Option<SubscriberTag>,
    /// Displayed badges.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badges: Option<BadgeMap>,
    /// Badge metadata; `subscriber` holds the month count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge_info: Option<BadgeMap>,
    /// Every other tag, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl MessageTags {
    /// Creates an empty tag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an emote id with its positions.
    #[must_use]
    pub fn with_emote<I, S>(mut self, id: impl Into<String>, positions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emotes
            .get_or_insert_with(EmoteTag::new)
            .insert(id.into(), positions.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the subscriber tag.
    #[must_use]
    pub fn with_subscriber(mut self, subscriber: SubscriberTag) -> Self {
        self.subscriber = Some(subscriber);
        self
    }

    /// Adds a badge.
    #[must_use]
    pub fn with_badge(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.badges
            .get_or_insert_with(BadgeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Adds a badge-info entry.
    #[must_use]
    pub fn with_badge_info(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.badge_info
            .get_or_insert_with(BadgeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Returns true if the sender is flagged as a subscriber.
    #[must_use]
    pub fn is_subscriber(&self) -> bool {
        self.subscriber
            .as_ref()
            .is_some_and(SubscriberTag::is_subscriber)
    }

    /// Month count from `badge-info.subscriber`.
    ///
    /// `Ok(None)` when absent; an error when present but not a positive integer.
    pub fn subscriber_months(&self) -> Result<Option<u32>, TagParseError> {
        let Some(raw) = self
            .badge_info
            .as_ref()
            .and_then(|info| info.get("subscriber"))
        else {
            return Ok(None);
        };

        match raw.trim().parse::<u32>() {
            Ok(months) if months > 0 => Ok(Some(months)),
            _ => Err(TagParseError::InvalidMonths(raw.clone())),
        }
    }

    /// Parses the tag section of a raw IRCv3 message.
    ///
    /// Accepts either the bare tag string or a full line starting with `@`;
    /// anything after the first space is ignored. A line that starts with a
    /// `:` prefix carries no tags and yields an empty set.
    pub fn parse_irc(raw: &str) -> Result<Self, TagParseError> {
        let raw = raw.trim_start();
        if raw.starts_with(':') {
            return Ok(Self::new());
        }
        let raw = raw.trim_start_matches('@');
        let raw = raw.split_once(' ').map_or(raw, |(tags, _)| tags);

        let mut tags = Self::new();
        for entry in raw.split(';').filter(|entry| !entry.is_empty()) {
            let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
            let value = unescape_tag_value(value);

            match key {
                "emotes" => tags.emotes = parse_emote_tag(&value)?,
                "badges" => tags.badges = parse_badge_tag(&value),
                "badge-info" => tags.badge_info = parse_badge_tag(&value),
                "subscriber" if !value.is_empty() => {
                    tags.subscriber = Some(SubscriberTag::Text(value));
                }
                "subscriber" => {}
                _ => {
                    tags.extra
                        .insert(key.to_string(), serde_json::Value::String(value));
                }
            }
        }
        Ok(tags)
    }
}

/// Parses a `start-end` emote position into inclusive character offsets.
pub fn parse_position(raw: &str) -> Result<(usize, usize), TagParseError> {
    let malformed = || TagParseError::MalformedPosition(raw.to_string());

    let (start, end) = raw.split_once('-').ok_or_else(malformed)?;
    let start: usize = start.trim().parse().map_err(|_| malformed())?;
    let end: usize = end.trim().parse().map_err(|_| malformed())?;

    if end < start {
        return Err(TagParseError::InvertedPosition(raw.to_string()));
    }
    Ok((start, end))
}

fn parse_emote_tag(value: &str) -> Result<Option<EmoteTag>, TagParseError> {
    if value.is_empty() {
        return Ok(None);
    }

    let mut emotes = EmoteTag::new();
    for group in value.split('/').filter(|group| !group.is_empty()) {
        let (id, positions) = group
            .split_once(':')
            .ok_or_else(|| TagParseError::MalformedTag {
                tag: "emotes".to_string(),
                reason: format!("missing ':' in '{group}'"),
            })?;
        emotes.insert(
            id.to_string(),
            positions
                .split(',')
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
        );
    }
    Ok(Some(emotes))
}

fn parse_badge_tag(value: &str) -> Option<BadgeMap> {
    if value.is_empty() {
        return None;
    }

    Some(
        value
            .split(',')
            .filter(|badge| !badge.is_empty())
            .map(|badge| {
                let (name, version) = badge.split_once('/').unwrap_or((badge, ""));
                (name.to_string(), version.to_string())
            })
            .collect(),
    )
}

fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_subscriber_flag_variants() {
        assert!(SubscriberTag::Flag(true).is_subscriber());
        assert!(SubscriberTag::Text("1".to_string()).is_subscriber());
        assert!(!SubscriberTag::Flag(false).is_subscriber());
        assert!(!SubscriberTag::Text("0".to_string()).is_subscriber());
        assert!(!SubscriberTag::Text("true".to_string()).is_subscriber());
        assert!(!MessageTags::new().is_subscriber());
    }

    #[test]
    fn test_deserialize_upstream_shape() {
        let tags: MessageTags = serde_json::from_value(serde_json::json!({
            "emotes": {"25": ["0-4", "12-16"], "1902": ["6-10"]},
            "subscriber": true,
            "badges": {"subscriber": "6", "premium": "1"},
            "badge-info": {"subscriber": "7"},
            "color": "#FF0000",
        }))
        .unwrap();

        let emotes = tags.emotes.as_ref().unwrap();
        let ids: Vec<_> = emotes.keys().cloned().collect();
        assert_eq!(ids, vec!["25", "1902"]);
        assert!(tags.is_subscriber());
        assert_eq!(tags.subscriber_months(), Ok(Some(7)));
        assert_eq!(tags.extra.get("color"), Some(&serde_json::json!("#FF0000")));
    }

    #[test]
    fn test_deserialize_null_emotes() {
        let tags: MessageTags =
            serde_json::from_value(serde_json::json!({"emotes": null, "subscriber": "1"})).unwrap();
        assert!(tags.emotes.is_none());
        assert!(tags.is_subscriber());
    }

    #[test]
    fn test_subscriber_months() {
        assert_eq!(MessageTags::new().subscriber_months(), Ok(None));
        assert_eq!(
            MessageTags::new()
                .with_badge_info("subscriber", "12")
                .subscriber_months(),
            Ok(Some(12))
        );
        assert!(MessageTags::new()
            .with_badge_info("subscriber", "abc")
            .subscriber_months()
            .is_err());
        assert!(MessageTags::new()
            .with_badge_info("subscriber", "0")
            .subscriber_months()
            .is_err());
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("6-10"), Ok((6, 10)));
        assert_eq!(parse_position("0-0"), Ok((0, 0)));
        assert_eq!(
            parse_position("x-3"),
            Err(TagParseError::MalformedPosition("x-3".to_string()))
        );
        assert_eq!(
            parse_position("5"),
            Err(TagParseError::MalformedPosition("5".to_string()))
        );
        assert_eq!(
            parse_position("9-2"),
            Err(TagParseError::InvertedPosition("9-2".to_string()))
        );
    }

    #[test]
    fn test_parse_irc_tags() {
        let tags = MessageTags::parse_irc(
            "@badge-info=subscriber/7;badges=subscriber/6,premium/1;color=#1E90FF;\
             display-name=Viewer;emotes=25:0-4,12-16/1902:6-10;subscriber=1 \
             :viewer!viewer@viewer.tmi.twitch.tv PRIVMSG #chan :Kappa Keepo Kappa",
        )
        .unwrap();

        let emotes = tags.emotes.as_ref().unwrap();
        assert_eq!(emotes["25"], vec!["0-4", "12-16"]);
        assert_eq!(emotes["1902"], vec!["6-10"]);
        assert_eq!(tags.badges.as_ref().unwrap()["premium"], "1");
        assert_eq!(tags.subscriber_months(), Ok(Some(7)));
        assert!(tags.is_subscriber());
        assert_eq!(tags.extra["display-name"], serde_json::json!("Viewer"));
    }

    #[test]
    fn test_parse_irc_empty_values() {
        let tags = MessageTags::parse_irc("badge-info=;badges=;emotes=;subscriber=0").unwrap();
        assert!(tags.emotes.is_none());
        assert!(tags.badges.is_none());
        assert!(tags.badge_info.is_none());
        assert!(!tags.is_subscriber());
    }

    #[test]
    fn test_parse_irc_line_without_tags() {
        let tags = MessageTags::parse_irc(":nick!nick@host PRIVMSG #c :hi").unwrap();
        assert_eq!(tags, MessageTags::new());
        assert!(tags.extra.is_empty());
    }

    #[test]
    fn test_parse_irc_escapes() {
        let tags = MessageTags::parse_irc(r"system-msg=hello\sworld\:\\done").unwrap();
        assert_eq!(tags.extra["system-msg"], serde_json::json!(r"hello world;\done"));
    }

    #[test]
    fn test_parse_irc_malformed_emotes() {
        let err = MessageTags::parse_irc("emotes=25").unwrap_err();
        assert!(matches!(err, TagParseError::MalformedTag { .. }));
    }
}
