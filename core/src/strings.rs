//! Localized strings and small text helpers used by objectives and messages.

use crate::types::Millis;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Translations keyed by language, then by string id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StringTable {
    #[serde(flatten)]
    languages: HashMap<String, HashMap<String, String>>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, language: &str, id: &str, text: &str) {
        self.languages
            .entry(language.to_string())
            .or_default()
            .insert(id.to_string(), text.to_string());
    }

    pub fn get(&self, language: &str, id: &str) -> Option<&str> {
        self.languages
            .get(language)
            .and_then(|strings| strings.get(id))
            .map(String::as_str)
    }
}

/// English list join: "A", "A and B", "A, B and C".
pub fn list_join<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            format!("{} and {}", head.join(", "), last.as_ref())
        }
    }
}

/// Formats a duration as `m:ss`, rounding partial seconds up so a timer
/// never shows 0:00 while time remains.
pub fn format_time(ms: Millis) -> String {
    let secs = ms.div_ceil(1000);
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Uppercases the first character, for clauses that open a sentence.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
