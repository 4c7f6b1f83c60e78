/*
 *  protocol.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Player protocol - inbound pushes, outbound commands and the line
 *  oriented development bridge
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

use std::io::Write;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::menu::MenuItem;
use crate::navigation::{Event, ListingOrigin, Location};
use crate::status::PlaybackStatus;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown input '{0}'")]
    UnknownInput(String),
    #[error("malformed push: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("command channel closed")]
    Closed,
    #[error("transport I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("command encoding: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Outbound request to the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Browse { uri: String },
    BrowseSources,
    Enqueue { uri: String },
    EnqueueAndPlay { uri: String },
    ReplaceQueueAndPlay { uri: String },
    ClearQueue,
    /// Start playback once `delay` has passed
    Play { delay: Duration },
    GetState,
}

impl Command {
    pub fn event_name(&self) -> &'static str {
        match self {
            Command::Browse { .. } => "browseLibrary",
            Command::BrowseSources => "getBrowseSources",
            Command::Enqueue { .. } => "addToQueue",
            Command::EnqueueAndPlay { .. } => "addPlay",
            Command::ReplaceQueueAndPlay { .. } => "replaceAndPlay",
            Command::ClearQueue => "clearQueue",
            Command::Play { .. } => "play",
            Command::GetState => "getState",
        }
    }

    pub fn uri(&self) -> Option<&str> {
        match self {
            Command::Browse { uri }
            | Command::Enqueue { uri }
            | Command::EnqueueAndPlay { uri }
            | Command::ReplaceQueueAndPlay { uri } => Some(uri),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct UriData<'a> {
    uri: &'a str,
}

#[derive(Serialize)]
struct Envelope<'a> {
    event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<UriData<'a>>,
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Envelope {
            event: self.event_name(),
            data: self.uri().map(|uri| UriData { uri }),
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PreviousLevel {
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemList {
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LibraryNavigation {
    #[serde(default)]
    pub prev: Option<PreviousLevel>,
    #[serde(default)]
    pub lists: Vec<ItemList>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LibraryPush {
    #[serde(default)]
    pub navigation: Option<LibraryNavigation>,
}

/// Data pushed by the player
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum Push {
    #[serde(rename = "pushBrowseLibrary")]
    BrowseLibrary(LibraryPush),
    #[serde(rename = "pushBrowseSources")]
    BrowseSources(Vec<MenuItem>),
    #[serde(rename = "pushState")]
    State(PlaybackStatus),
}

impl Push {
    /// Event for the navigation loop, `None` for an empty sources list
    pub fn into_event(self) -> Option<Event> {
        match self {
            Push::BrowseLibrary(library) => {
                // the level above is kept even when there is nothing to list
                let navigation = library.navigation.unwrap_or_default();
                let previous = navigation.prev
                    .and_then(|prev| prev.uri)
                    .map(|uri| Location::parse(&uri))
                    .unwrap_or_default();
                let items = navigation.lists.into_iter().next().map(|list| list.items).unwrap_or_default();
                if items.is_empty() {
                    debug!("Library push without items, keeping previous level {}", previous);
                }
                Some(Event::ItemsPushed {
                    items,
                    origin: ListingOrigin::Container { previous },
                })
            }
            Push::BrowseSources(items) => {
                if items.is_empty() {
                    debug!("Sources push without items dropped");
                    return None;
                }
                Some(Event::ItemsPushed { items, origin: ListingOrigin::Sources })
            }
            Push::State(status) => Some(Event::StatusPushed(status)),
        }
    }
}

/// Button word or JSON push to event. Blank lines give `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Event>, ProtocolError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if line.starts_with('{') {
        let push: Push = serde_json::from_str(line)?;
        return Ok(push.into_event());
    }
    let event = match line.to_ascii_lowercase().as_str() {
        "up" => Event::Up,
        "down" => Event::Down,
        "select" | "ok" => Event::Select,
        "back" => Event::Back,
        "add" => Event::AddToQueue,
        "replace" => Event::ReplaceAndPlay,
        _ => return Err(ProtocolError::UnknownInput(line.to_string())),
    };
    Ok(Some(event))
}

/// Outbound side of the player transport
pub trait CommandSink: Send + Sync + 'static {
    fn send(&self, command: Command) -> Result<(), TransportError>;
}

/// Hands commands to an in-process receiver
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Command>,
}

impl ChannelSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl CommandSink for ChannelSink {
    fn send(&self, command: Command) -> Result<(), TransportError> {
        self.tx.send(command).map_err(|_| TransportError::Closed)
    }
}

/// Newline delimited JSON on stdout/stdin, for running without a player
pub struct LineBridge;

impl LineBridge {
    /// Feed input lines to the event loop until the reader is exhausted
    pub async fn pump<R>(reader: R, events: mpsc::Sender<Event>) -> Result<(), TransportError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            match parse_line(&line) {
                Ok(Some(event)) => {
                    events.send(event).await.map_err(|_| TransportError::Closed)?;
                }
                Ok(None) => {}
                Err(e) => debug!("Input dropped: {}", e),
            }
        }
        Ok(())
    }
}

impl CommandSink for LineBridge {
    fn send(&self, command: Command) -> Result<(), TransportError> {
        let line = serde_json::to_string(&command)?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", line)?;
        out.flush()?;
        Ok(())
    }
}
