// galaxy - CLI for the Galaxy console slot API
// Copyright (C) 2024 Mathias Uhl <mathiasuhl@gmx.de>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Slot selection criteria forwarded to the console as a query string.
//!
//! The console evaluates the globs; this module only validates the
//! enumerated keys and keeps the entries in a stable order.

use crate::error::CommandError;
use clap::ValueEnum;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterKey {
    Binary,
    Config,
    Host,
    Ip,
    Set,
    State,
}

impl FilterKey {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterKey::Binary => "binary",
            FilterKey::Config => "config",
            FilterKey::Host => "host",
            FilterKey::Ip => "ip",
            FilterKey::Set => "set",
            FilterKey::State => "state",
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which slots to select by assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SlotSet {
    #[value(alias = "a")]
    All,
    #[value(alias = "e")]
    Empty,
    #[value(alias = "t")]
    Taken,
}

impl SlotSet {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotSet::All => "all",
            SlotSet::Empty => "empty",
            SlotSet::Taken => "taken",
        }
    }
}

/// Which slots to select by lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SlotState {
    #[value(alias = "r")]
    Running,
    #[value(alias = "s")]
    Stopped,
}

impl SlotState {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotState::Running => "running",
            SlotState::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotFilter {
    entries: BTreeMap<FilterKey, String>,
}

impl SlotFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a criterion, replacing any earlier value for the same key.
    ///
    /// `set` and `state` tokens are checked against their closed sets (short
    /// forms included) and stored in their long form. Every other key takes
    /// a glob verbatim.
    pub fn insert(&mut self, key: FilterKey, value: &str) -> Result<(), CommandError> {
        let value = match key {
            FilterKey::Set => SlotSet::from_str(value, false)
                .map_err(|_| {
                    CommandError::invalid_usage(format!(
                        "Invalid set '{value}': expected one of empty, taken, all"
                    ))
                })?
                .as_str()
                .to_string(),
            FilterKey::State => SlotState::from_str(value, false)
                .map_err(|_| {
                    CommandError::invalid_usage(format!(
                        "Invalid state '{value}': expected one of running, stopped"
                    ))
                })?
                .as_str()
                .to_string(),
            _ => value.to_string(),
        };
        self.entries.insert(key, value);
        Ok(())
    }

    pub fn set(&mut self, set: SlotSet) {
        self.entries.insert(FilterKey::Set, set.as_str().to_string());
    }

    pub fn state(&mut self, state: SlotState) {
        self.entries
            .insert(FilterKey::State, state.as_str().to_string());
    }

    pub fn get(&self, key: FilterKey) -> Option<&str> {
        self.entries.get(&key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilterKey, &str)> {
        self.entries.iter().map(|(key, value)| (*key, value.as_str()))
    }

    /// Query pairs in key order; empty when the filter selects every slot.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use reqwest::Url;

    #[test]
    fn empty_filter_has_no_pairs() {
        let filter = SlotFilter::new();
        assert!(filter.is_empty());
        assert!(filter.query_pairs().is_empty());
    }

    #[test]
    fn short_tokens_are_normalized() {
        let mut filter = SlotFilter::new();
        filter.insert(FilterKey::Set, "t").unwrap();
        filter.insert(FilterKey::State, "r").unwrap();
        assert_eq!(filter.get(FilterKey::Set), Some("taken"));
        assert_eq!(filter.get(FilterKey::State), Some("running"));

        filter.insert(FilterKey::Set, "empty").unwrap();
        assert_eq!(filter.get(FilterKey::Set), Some("empty"));
    }

    #[test]
    fn rejects_unknown_enumerated_tokens() {
        let mut filter = SlotFilter::new();
        let err = filter.insert(FilterKey::Set, "some").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidUsage);
        assert!(err.message.contains("some"));

        let err = filter.insert(FilterKey::State, "paused").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidUsage);
        assert!(filter.is_empty());
    }

    #[test]
    fn globs_pass_through_untouched() {
        let mut filter = SlotFilter::new();
        filter.insert(FilterKey::Host, "web-*.prod").unwrap();
        filter.insert(FilterKey::Config, "@prod:web:?.0").unwrap();
        assert_eq!(filter.get(FilterKey::Host), Some("web-*.prod"));
        assert_eq!(filter.get(FilterKey::Config), Some("@prod:web:?.0"));
    }

    #[test]
    fn pairs_follow_key_order() {
        let mut filter = SlotFilter::new();
        filter.state(SlotState::Stopped);
        filter.insert(FilterKey::Ip, "10.0.*").unwrap();
        filter.insert(FilterKey::Binary, "com.acme:web:*").unwrap();

        let keys: Vec<_> = filter.query_pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["binary", "ip", "state"]);
    }

    #[test]
    fn encoded_query_decodes_to_the_same_entries() {
        let mut filter = SlotFilter::new();
        filter.insert(FilterKey::Binary, "com.acme:web&api:1.0").unwrap();
        filter.insert(FilterKey::Config, "@prod:web=x:1 2").unwrap();
        filter.insert(FilterKey::Host, "h?st*/%").unwrap();
        filter.set(SlotSet::All);

        let mut url = Url::parse("http://console.test/v1/slot/").unwrap();
        url.query_pairs_mut().extend_pairs(filter.query_pairs());

        let decoded: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let expected: Vec<(String, String)> = filter
            .query_pairs()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(decoded, expected);
    }
}
