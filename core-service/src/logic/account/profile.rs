//! Account Profile
//!
//! Typed view of the account-info payload. Keys may be absent (default to
//! zero / false / empty) and counts may arrive as numbers or strings.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FetchError;
use crate::logic::features::derived::Presence;

static PROFILE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:https?://)?(?:www\.|m\.)?instagram\.com/@?([A-Za-z0-9._]{1,30})/?(?:[?#].*)?$")
        .expect("profile URL pattern is valid")
});

static BARE_USERNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@?([A-Za-z0-9._]{1,30})$").expect("username pattern is valid"));

/// Extract the username from a profile link or a bare `@username`
pub fn username_from_profile_url(input: &str) -> Result<String, FetchError> {
    let input = input.trim();
    PROFILE_URL
        .captures(input)
        .or_else(|| BARE_USERNAME.captures(input))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| FetchError::InvalidProfileLink(input.to_string()))
}

/// Attributes the account-info API can supply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub username: String,
    pub full_name: String,
    pub description: String,
    pub followers: u64,
    pub following: u64,
    pub has_avatar: bool,
    pub has_website: bool,
    pub is_private: bool,
}

impl AccountProfile {
    /// Parse a payload leniently.
    ///
    /// Accepts the fields at the top level or under a `data` / `user`
    /// wrapper. Absent keys take defaults; present but unreadable counts
    /// are a malformed payload.
    pub fn from_payload(payload: &Value) -> Result<Self, FetchError> {
        let object = payload
            .as_object()
            .ok_or_else(|| FetchError::MalformedPayload("payload is not a JSON object".to_string()))?;
        let fields = unwrap_envelope(object);

        Ok(Self {
            username: text(fields, &["username", "user_name"]),
            full_name: text(fields, &["full_name", "fullname", "name"]),
            description: text(fields, &["description", "biography", "bio"]),
            followers: count(fields, &["followers", "follower_count", "followers_count"])?,
            following: count(fields, &["following", "following_count", "follows"])?,
            has_avatar: present(fields, &["avatar", "profile_pic_url", "profile_picture"]),
            has_website: present(fields, &["website", "external_url"]),
            is_private: present(fields, &["is_private", "private"]),
        })
    }
}

const KNOWN_KEYS: &[&str] = &["username", "followers", "following", "full_name", "description"];

fn unwrap_envelope(object: &Map<String, Value>) -> &Map<String, Value> {
    if KNOWN_KEYS.iter().any(|k| object.contains_key(*k)) {
        return object;
    }
    ["data", "user"]
        .iter()
        .filter_map(|k| object.get(*k).and_then(Value::as_object))
        .next()
        .unwrap_or(object)
}

fn first<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| fields.get(*k)).find(|v| !v.is_null())
}

fn text(fields: &Map<String, Value>, keys: &[&str]) -> String {
    match first(fields, keys) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn present(fields: &Map<String, Value>, keys: &[&str]) -> bool {
    first(fields, keys).map_or(false, |v| v.is_present())
}

fn count(fields: &Map<String, Value>, keys: &[&str]) -> Result<u64, FetchError> {
    let Some(value) = first(fields, keys) else {
        return Ok(0);
    };

    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
            if cleaned.is_empty() {
                Some(0)
            } else {
                cleaned.parse::<u64>().ok()
            }
        }
        Value::Bool(b) => Some(u64::from(*b)),
        _ => None,
    };

    parsed.ok_or_else(|| FetchError::MalformedPayload(format!("{} is not a count: {}", keys[0], value)))
}
