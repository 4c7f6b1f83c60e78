/*
 *  menu.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Library menu model and pager - items, selection and page arithmetic
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

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::{DISPLAY_COLUMNS, PAGE_SIZE};
use crate::deutils::{deserialize_optional_text, deserialize_optional_u32, deserialize_text};

/// Item kind tag as delivered by the library browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ItemKind {
    #[serde(rename = "music_service")]
    MusicService,
    #[serde(rename = "radio-category")]
    RadioCategory,
    #[serde(rename = "mywebradio-category")]
    MyWebRadioCategory,
    #[serde(rename = "radio-favourites")]
    RadioFavourites,
    #[serde(rename = "folder")]
    Folder,
    #[serde(rename = "song")]
    Song,
    #[serde(rename = "playlist")]
    Playlist,
    #[serde(rename = "webradio")]
    WebRadio,
    #[default]
    #[serde(other)]
    Generic,
}

impl ItemKind {
    /// Browsable collections; selecting one descends into it
    pub fn is_container(self) -> bool {
        matches!(
            self,
            ItemKind::MusicService
                | ItemKind::RadioCategory
                | ItemKind::MyWebRadioCategory
                | ItemKind::RadioFavourites
                | ItemKind::Folder
        )
    }

    /// Directly playable content
    pub fn is_leaf(self) -> bool {
        matches!(self, ItemKind::Song | ItemKind::Playlist | ItemKind::WebRadio)
    }

    /// Kinds that can be appended to (or replace) the play queue by URI.
    /// Web radio streams are started through replace-and-play only.
    pub fn is_queueable(self) -> bool {
        matches!(
            self,
            ItemKind::MusicService
                | ItemKind::RadioCategory
                | ItemKind::Folder
                | ItemKind::Song
                | ItemKind::Playlist
        )
    }
}

fn deserialize_kind<'de, D>(deserializer: D) -> Result<ItemKind, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ItemKind>::deserialize(deserializer)?.unwrap_or_default())
}

/// One selectable entry of a library listing. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(rename = "type", default, deserialize_with = "deserialize_kind")]
    pub kind: ItemKind,
    /// Plugin specific kind, takes precedence over `kind` when selecting
    #[serde(rename = "plugin_type", default, skip_serializing_if = "Option::is_none")]
    pub plugin_kind: Option<ItemKind>,
    #[serde(default, deserialize_with = "deserialize_optional_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub uri: String,
    #[serde(rename = "tracknumber", default, deserialize_with = "deserialize_optional_u32", skip_serializing_if = "Option::is_none")]
    pub track_number: Option<u32>,
}

impl MenuItem {
    pub fn new(kind: ItemKind, title: &str, uri: &str) -> Self {
        Self {
            kind,
            title: Some(title.to_string()),
            uri: uri.to_string(),
            ..Default::default()
        }
    }

    /// The kind used to decide what selecting this item does
    pub fn effective_kind(&self) -> ItemKind {
        self.plugin_kind.unwrap_or(self.kind)
    }

    fn title_text(&self) -> &str {
        self.title.as_deref()
            .or(self.name.as_deref())
            .unwrap_or(&self.uri)
    }

    fn name_text(&self) -> &str {
        self.name.as_deref()
            .or(self.title.as_deref())
            .unwrap_or(&self.uri)
    }
}

/// Position of an item on the paged menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub page: usize,
    pub line: usize,
}

/// Rendering style of one menu row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStyle {
    Normal,
    Inverted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuRow {
    pub text: String,
    pub style: RowStyle,
}

/// Pure page arithmetic and row formatting for a fixed page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuPager {
    page_size: usize,
    columns: usize,
}

impl Default for MenuPager {
    fn default() -> Self {
        Self::new(PAGE_SIZE, DISPLAY_COLUMNS)
    }
}

impl MenuPager {
    pub fn new(page_size: usize, columns: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            columns,
        }
    }

    pub fn page_size(&self) -> usize { self.page_size }
    pub fn columns(&self) -> usize { self.columns }

    pub fn page_count(&self, item_count: usize) -> usize {
        item_count.div_ceil(self.page_size)
    }

    pub fn position(&self, index: usize) -> Cursor {
        Cursor {
            page: index / self.page_size,
            line: index % self.page_size,
        }
    }

    pub fn index_of(&self, cursor: Cursor) -> usize {
        cursor.page * self.page_size + cursor.line
    }

    /// Row text for one item, before padding
    pub fn format(&self, item: &MenuItem) -> String {
        match item.kind {
            ItemKind::RadioCategory
            | ItemKind::MyWebRadioCategory
            | ItemKind::RadioFavourites
            | ItemKind::Folder
            | ItemKind::WebRadio
            | ItemKind::Playlist => format!("{}  ", item.title_text()),
            ItemKind::Song => match item.track_number {
                Some(n) => format!("{}) {}  ", n, item.title_text()),
                None => format!("{}  ", item.title_text()),
            },
            ItemKind::MusicService | ItemKind::Generic => item.name_text().to_string(),
        }
    }

    /// A full width line of spaces; display memory keeps old glyphs otherwise
    pub fn blank_line(&self) -> String {
        " ".repeat(self.columns)
    }

    fn pad(&self, mut text: String) -> String {
        let len = text.chars().count();
        if len < self.columns {
            text.extend(std::iter::repeat_n(' ', self.columns - len));
        }
        text
    }

    /// Every row of the active page, selected row inverted
    pub fn rows(&self, state: &MenuState) -> Vec<MenuRow> {
        let items = state.items();
        (0..self.page_size)
            .map(|line| {
                let index = self.index_of(Cursor { page: state.active_page, line });
                match items.get(index) {
                    Some(item) => MenuRow {
                        text: self.pad(self.format(item)),
                        style: if line == state.selected_line { RowStyle::Inverted } else { RowStyle::Normal },
                    },
                    None => MenuRow {
                        text: self.blank_line(),
                        style: RowStyle::Normal,
                    },
                }
            })
            .collect()
    }
}

/// Current listing and selection.
///
/// Invariant: when the list is non-empty `active_page * page_size + selected_line`
/// indexes into it. The list is shared so view snapshots stay cheap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuState {
    items: Arc<Vec<MenuItem>>,
    pager: MenuPager,
    pub active_page: usize,
    pub selected_line: usize,
}

impl MenuState {
    pub fn new(pager: MenuPager) -> Self {
        Self {
            items: Arc::new(Vec::new()),
            pager,
            active_page: 0,
            selected_line: 0,
        }
    }

    pub fn pager(&self) -> &MenuPager { &self.pager }
    pub fn items(&self) -> &[MenuItem] { &self.items }
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn page_count(&self) -> usize {
        self.pager.page_count(self.items.len())
    }

    /// Replace the listing wholesale and select the first entry
    pub fn replace(&mut self, items: Vec<MenuItem>) {
        self.items = Arc::new(items);
        self.active_page = 0;
        self.selected_line = 0;
    }

    /// Index of the selection, `None` when the list is empty or the
    /// cursor no longer points into it.
    pub fn selected_index(&self) -> Option<usize> {
        let index = self.pager.index_of(Cursor { page: self.active_page, line: self.selected_line });
        (index < self.items.len()).then_some(index)
    }

    pub fn selected_item(&self) -> Option<&MenuItem> {
        self.selected_index().and_then(|i| self.items.get(i))
    }

    pub fn select(&mut self, index: usize) {
        if self.items.is_empty() {
            return;
        }
        let cursor = self.pager.position(index.min(self.items.len() - 1));
        self.active_page = cursor.page;
        self.selected_line = cursor.line;
    }

    /// Move the selection one entry back, wrapping from the first to the last
    pub fn select_previous(&mut self) -> Option<usize> {
        let len = self.items.len();
        let current = self.current_or_clamped()?;
        let next = (current + len - 1) % len;
        self.select(next);
        Some(next)
    }

    /// Move the selection one entry forward, wrapping from the last to the first
    pub fn select_next(&mut self) -> Option<usize> {
        let len = self.items.len();
        let current = self.current_or_clamped()?;
        let next = (current + 1) % len;
        self.select(next);
        Some(next)
    }

    fn current_or_clamped(&self) -> Option<usize> {
        if self.items.is_empty() {
            return None;
        }
        let index = self.pager.index_of(Cursor { page: self.active_page, line: self.selected_line });
        Some(index.min(self.items.len() - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn items(n: usize) -> Vec<MenuItem> {
        (0..n)
            .map(|i| MenuItem::new(ItemKind::Folder, &format!("Folder {}", i), &format!("music-library/f{}", i)))
            .collect()
    }

    #[test]
    fn test_ten_items_page_four() {
        let mut state = MenuState::new(MenuPager::new(4, 17));
        state.replace(items(10));
        assert_eq!(state.page_count(), 3);

        state.select(9);
        assert_eq!((state.active_page, state.selected_line), (2, 1));

        assert_eq!(state.select_next(), Some(0));
        assert_eq!((state.active_page, state.selected_line), (0, 0));

        assert_eq!(state.select_previous(), Some(9));
        assert_eq!((state.active_page, state.selected_line), (2, 1));
    }

    #[test]
    fn test_single_item_self_loop() {
        let mut state = MenuState::new(MenuPager::default());
        state.replace(items(1));
        assert_eq!(state.select_next(), Some(0));
        assert_eq!(state.select_previous(), Some(0));
        assert_eq!(state.selected_index(), Some(0));
    }

    #[test]
    fn test_empty_list_never_dereferenced() {
        let mut state = MenuState::new(MenuPager::default());
        assert_eq!(state.page_count(), 0);
        assert_eq!(state.select_next(), None);
        assert_eq!(state.select_previous(), None);
        assert!(state.selected_item().is_none());
    }

    #[test]
    fn test_stale_cursor_is_guarded() {
        let mut state = MenuState::new(MenuPager::new(4, 17));
        state.replace(items(10));
        state.select(9);
        // a shorter list must not be indexed by the old cursor
        state.items = Arc::new(items(3));
        assert!(state.selected_item().is_none());
        // and navigation recovers onto the list
        assert_eq!(state.select_next(), Some(0));
    }

    #[test]
    fn test_replace_resets_selection() {
        let mut state = MenuState::new(MenuPager::default());
        state.replace(items(10));
        state.select(6);
        state.replace(items(2));
        assert_eq!((state.active_page, state.selected_line), (0, 0));
        assert_eq!(state.selected_index(), Some(0));
    }

    #[test]
    fn test_row_formats() {
        let pager = MenuPager::new(4, 17);

        let folder = MenuItem::new(ItemKind::Folder, "Jazz", "music-library/Jazz");
        assert_eq!(pager.format(&folder), "Jazz  ");

        let mut song = MenuItem::new(ItemKind::Song, "So What", "music-library/Jazz/01.flac");
        song.track_number = Some(1);
        assert_eq!(pager.format(&song), "1) So What  ");

        let playlist = MenuItem::new(ItemKind::Playlist, "Evening", "playlists/Evening");
        assert_eq!(pager.format(&playlist), "Evening  ");

        let source = MenuItem {
            kind: ItemKind::Generic,
            plugin_kind: Some(ItemKind::MusicService),
            name: Some("Web Radio".to_string()),
            uri: "radio".to_string(),
            ..Default::default()
        };
        assert_eq!(pager.format(&source), "Web Radio");
    }

    #[test]
    fn test_rows_pad_and_blank() {
        let pager = MenuPager::new(4, 17);
        let mut state = MenuState::new(pager);
        state.replace(items(6));
        state.select(5);

        let rows = pager.rows(&state);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].text.chars().count(), 17);
        assert_eq!(rows[0].style, RowStyle::Normal);
        assert!(rows[1].text.starts_with("Folder 5"));
        assert_eq!(rows[1].style, RowStyle::Inverted);
        assert_eq!(rows[2].text, " ".repeat(17));
        assert_eq!(rows[3].text, pager.blank_line());
    }

    #[test]
    fn test_effective_kind_prefers_plugin_kind() {
        let item = MenuItem {
            kind: ItemKind::Folder,
            plugin_kind: Some(ItemKind::WebRadio),
            ..Default::default()
        };
        assert_eq!(item.effective_kind(), ItemKind::WebRadio);
        assert_eq!(MenuItem::new(ItemKind::Song, "x", "y").effective_kind(), ItemKind::Song);
    }

    #[test]
    fn test_item_from_json() {
        let json = r#"{"service":"mpd","type":"song","title":"Blue in Green","artist":"Miles Davis",
                       "uri":"music-library/NAS/kob/03.flac","tracknumber":"3"}"#;
        let item: MenuItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, ItemKind::Song);
        assert_eq!(item.track_number, Some(3));

        let json = r#"{"name":"Spotify","uri":"spop","plugin_type":"music_service","type":null}"#;
        let item: MenuItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, ItemKind::Generic);
        assert_eq!(item.effective_kind(), ItemKind::MusicService);

        let json = r#"{"type":"streaming-category","title":"Tidal","uri":"tidal://"}"#;
        let item: MenuItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, ItemKind::Generic);
    }

    proptest! {
        #[test]
        fn prop_position_inverts(n in 1usize..500, p in 1usize..16) {
            let pager = MenuPager::new(p, 17);
            prop_assert_eq!(pager.page_count(n), (n + p - 1) / p);
            for i in 0..n {
                let cursor = pager.position(i);
                prop_assert_eq!(cursor.page, i / p);
                prop_assert_eq!(cursor.line, i % p);
                prop_assert!(cursor.line < p);
                prop_assert_eq!(pager.index_of(cursor), i);
            }
        }

        #[test]
        fn prop_up_down_round_trip(n in 1usize..64, p in 1usize..8, start in 0usize..64) {
            let mut state = MenuState::new(MenuPager::new(p, 17));
            state.replace(items(n));
            let start = start % n;
            state.select(start);

            state.select_previous();
            state.select_next();
            prop_assert_eq!(state.selected_index(), Some(start));

            state.select_next();
            state.select_previous();
            prop_assert_eq!(state.selected_index(), Some(start));
        }
    }
}
