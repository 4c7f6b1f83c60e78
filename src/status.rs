/*
 *  status.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Playback status snapshot and field level change detection
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use serde::{Deserialize, Serialize};

use crate::deutils::deserialize_optional_text;

/// Playback status as last pushed by the player. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    /// artist
    #[serde(rename = "artist", default, deserialize_with = "deserialize_optional_text")]
    pub primary: Option<String>,
    /// title
    #[serde(rename = "title", default, deserialize_with = "deserialize_optional_text")]
    pub secondary: Option<String>,
    /// play/pause/stop
    #[serde(rename = "status", default, deserialize_with = "deserialize_optional_text")]
    pub tertiary: Option<String>,
}

impl PlaybackStatus {
    pub fn new(primary: &str, secondary: &str, tertiary: &str) -> Self {
        Self {
            primary: Some(primary.to_string()),
            secondary: Some(secondary.to_string()),
            tertiary: Some(tertiary.to_string()),
        }
    }

    pub fn field(&self, field: StatusField) -> Option<&str> {
        match field {
            StatusField::Primary => self.primary.as_deref(),
            StatusField::Secondary => self.secondary.as_deref(),
            StatusField::Tertiary => self.tertiary.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusField {
    Primary,
    Secondary,
    Tertiary,
}

impl StatusField {
    pub const ALL: [StatusField; 3] = [StatusField::Primary, StatusField::Secondary, StatusField::Tertiary];
}

/// Set of fields that differ from the last rendered snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangedFields {
    primary: bool,
    secondary: bool,
    tertiary: bool,
}

impl ChangedFields {
    pub fn all() -> Self {
        Self { primary: true, secondary: true, tertiary: true }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn contains(&self, field: StatusField) -> bool {
        match field {
            StatusField::Primary => self.primary,
            StatusField::Secondary => self.secondary,
            StatusField::Tertiary => self.tertiary,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.primary || self.secondary || self.tertiary)
    }

    /// Changed fields in screen order
    pub fn iter(&self) -> impl Iterator<Item = StatusField> + '_ {
        StatusField::ALL.into_iter().filter(move |f| self.contains(*f))
    }

    fn mark(&mut self, field: StatusField) {
        match field {
            StatusField::Primary => self.primary = true,
            StatusField::Secondary => self.secondary = true,
            StatusField::Tertiary => self.tertiary = true,
        }
    }
}

/// Compare two snapshots. Without a previous render every field counts as changed.
pub fn diff(previous: Option<&PlaybackStatus>, next: &PlaybackStatus) -> ChangedFields {
    let Some(previous) = previous else {
        return ChangedFields::all();
    };
    let mut changed = ChangedFields::none();
    for field in StatusField::ALL {
        if previous.field(field) != next.field(field) {
            changed.mark(field);
        }
    }
    changed
}

/// Remembers what was last written to the status view
#[derive(Debug, Default)]
pub struct StatusDiffer {
    rendered: Option<PlaybackStatus>,
}

impl StatusDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes(&self, next: &PlaybackStatus) -> ChangedFields {
        diff(self.rendered.as_ref(), next)
    }

    /// Record a snapshot as being on screen
    pub fn commit(&mut self, rendered: PlaybackStatus) {
        self.rendered = Some(rendered);
    }

    /// The screen no longer shows the status view (menu drawn, clear, failed write)
    pub fn invalidate(&mut self) {
        self.rendered = None;
    }

    pub fn rendered(&self) -> Option<&PlaybackStatus> {
        self.rendered.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_secondary_changed() {
        let previous = PlaybackStatus::new("A", "B", "C");
        let next = PlaybackStatus::new("A", "X", "C");
        let changed = diff(Some(&previous), &next);
        assert_eq!(changed.iter().collect::<Vec<_>>(), vec![StatusField::Secondary]);
        assert!(!changed.contains(StatusField::Primary));
        assert!(!changed.contains(StatusField::Tertiary));
    }

    #[test]
    fn test_no_previous_means_all_changed() {
        let next = PlaybackStatus::new("A", "B", "C");
        assert_eq!(diff(None, &next), ChangedFields::all());
    }

    #[test]
    fn test_identical_snapshots() {
        let s = PlaybackStatus::new("A", "B", "C");
        assert!(diff(Some(&s), &s.clone()).is_empty());
    }

    #[test]
    fn test_absent_field_differs_from_present() {
        let previous = PlaybackStatus::new("A", "B", "C");
        let next = PlaybackStatus { tertiary: None, ..previous.clone() };
        let changed = diff(Some(&previous), &next);
        assert_eq!(changed.iter().collect::<Vec<_>>(), vec![StatusField::Tertiary]);
    }

    #[test]
    fn test_differ_commit_and_invalidate() {
        let mut differ = StatusDiffer::new();
        let s = PlaybackStatus::new("Miles Davis", "So What", "play");
        assert_eq!(differ.changes(&s), ChangedFields::all());

        differ.commit(s.clone());
        assert!(differ.changes(&s).is_empty());

        let paused = PlaybackStatus { tertiary: Some("pause".into()), ..s.clone() };
        assert_eq!(differ.changes(&paused).iter().collect::<Vec<_>>(), vec![StatusField::Tertiary]);

        differ.invalidate();
        assert_eq!(differ.changes(&s), ChangedFields::all());
    }

    #[test]
    fn test_status_from_push_json() {
        let json = r#"{"status":"play","title":"So What","artist":"Miles Davis","album":"Kind of Blue","seek":1200}"#;
        let s: PlaybackStatus = serde_json::from_str(json).unwrap();
        assert_eq!(s, PlaybackStatus::new("Miles Davis", "So What", "play"));

        let s: PlaybackStatus = serde_json::from_str(r#"{"status":"stop"}"#).unwrap();
        assert_eq!(s.primary, None);
        assert_eq!(s.tertiary.as_deref(), Some("stop"));
    }
}
