/*
 *  navigation.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Navigation state machine - turns button, push and timer events into
 *  state transitions, render requests and outbound player commands
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

use std::fmt;
use std::time::Duration;

use log::debug;

use crate::constants::{QUEUE_PLAY_DELAY_MS, ROOT_LOCATION};
use crate::display::view::{RenderKind, ViewModel};
use crate::menu::{ItemKind, MenuItem, MenuPager, MenuState};
use crate::protocol::Command;
use crate::status::PlaybackStatus;

/// Addressable library position, the root being the music sources list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Location {
    #[default]
    Root,
    Uri(String),
}

impl Location {
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == ROOT_LOCATION {
            Location::Root
        } else {
            Location::Uri(s.to_string())
        }
    }

    /// The command that lists this location
    pub fn browse_command(&self) -> Command {
        match self {
            Location::Root => Command::BrowseSources,
            Location::Uri(uri) => Command::Browse { uri: uri.clone() },
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Root => write!(f, "{}", ROOT_LOCATION),
            Location::Uri(uri) => write!(f, "{}", uri),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationState {
    Starting,
    Status,
    Menu,
    Error,
    Info,
    Critical,
    Stopping,
}

/// Where a pushed listing came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingOrigin {
    /// Contents of a container, with the container's parent
    Container { previous: Location },
    /// The music sources list at the library root
    Sources,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Up,
    Down,
    Select,
    Back,
    AddToQueue,
    ReplaceAndPlay,
    ItemsPushed { items: Vec<MenuItem>, origin: ListingOrigin },
    StatusPushed(PlaybackStatus),
    TimeoutExpired,
}

/// Result of handling one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub from: NavigationState,
    pub to: NavigationState,
    pub render: Option<RenderKind>,
    pub commands: Vec<Command>,
    pub reset_timer: bool,
}

impl Outcome {
    fn unchanged(state: NavigationState) -> Self {
        Self {
            from: state,
            to: state,
            render: None,
            commands: Vec::new(),
            reset_timer: false,
        }
    }
}

/// Library positions the state machine starts from and may not ascend past
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationBounds {
    pub start: Location,
    pub highest: Location,
}

impl Default for NavigationBounds {
    fn default() -> Self {
        Self { start: Location::Root, highest: Location::Root }
    }
}

pub struct Navigator {
    state: NavigationState,
    menu: MenuState,
    status: PlaybackStatus,
    current: Location,
    previous: Option<Location>,
    bounds: NavigationBounds,
}

impl Navigator {
    pub fn new(bounds: NavigationBounds, pager: MenuPager) -> Self {
        Self {
            state: NavigationState::Starting,
            menu: MenuState::new(pager),
            status: PlaybackStatus::default(),
            current: bounds.start.clone(),
            previous: None,
            bounds,
        }
    }

    pub fn state(&self) -> NavigationState { self.state }
    pub fn menu(&self) -> &MenuState { &self.menu }
    pub fn status(&self) -> &PlaybackStatus { &self.status }
    pub fn current_location(&self) -> &Location { &self.current }
    pub fn previous_location(&self) -> Option<&Location> { self.previous.as_ref() }

    /// Snapshot handed to the renderer
    pub fn view(&self) -> ViewModel {
        ViewModel {
            menu: self.menu.clone(),
            status: self.status.clone(),
        }
    }

    /// Commands that load the start location and the current playback status
    pub fn activate(&mut self) -> Vec<Command> {
        self.current = self.bounds.start.clone();
        vec![self.current.browse_command(), Command::GetState]
    }

    /// Lifecycle transitions that do not come from events (stop, device fault)
    pub fn enter(&mut self, state: NavigationState) {
        self.transition(state);
    }

    pub fn handle(&mut self, event: Event) -> Outcome {
        let from = self.state;
        let mut outcome = match event {
            Event::Up => self.navigate(|menu| menu.select_previous()),
            Event::Down => self.navigate(|menu| menu.select_next()),
            Event::Select => self.select(),
            Event::Back => self.back(),
            Event::AddToQueue => self.add_to_queue(),
            Event::ReplaceAndPlay => self.replace_and_play(),
            Event::ItemsPushed { items, origin } => self.items_pushed(items, origin),
            Event::StatusPushed(status) => self.status_pushed(status),
            Event::TimeoutExpired => {
                self.transition(NavigationState::Status);
                Outcome {
                    render: Some(RenderKind::Status),
                    ..Outcome::unchanged(from)
                }
            }
        };
        outcome.from = from;
        outcome.to = self.state;
        outcome
    }

    fn transition(&mut self, to: NavigationState) {
        if self.state != to {
            debug!("Navigation state {:?} -> {:?}", self.state, to);
            self.state = to;
        }
    }

    /// Any navigation input outside the menu brings the menu up
    fn enter_menu(&mut self) -> Outcome {
        let from = self.state;
        self.transition(NavigationState::Menu);
        Outcome {
            render: Some(RenderKind::Menu),
            reset_timer: true,
            ..Outcome::unchanged(from)
        }
    }

    fn navigate(&mut self, step: impl FnOnce(&mut MenuState) -> Option<usize>) -> Outcome {
        if self.state != NavigationState::Menu {
            return self.enter_menu();
        }
        let moved = step(&mut self.menu);
        if let Some(index) = moved {
            debug!("Menu selection {} (page {}, line {})", index, self.menu.active_page, self.menu.selected_line);
        }
        Outcome {
            render: moved.map(|_| RenderKind::Menu),
            reset_timer: true,
            ..Outcome::unchanged(self.state)
        }
    }

    fn select(&mut self) -> Outcome {
        if self.state != NavigationState::Menu {
            return self.enter_menu();
        }
        let mut outcome = Outcome {
            reset_timer: true,
            ..Outcome::unchanged(self.state)
        };
        let Some(item) = self.menu.selected_item().cloned() else {
            debug!("Select ignored, nothing selected");
            return outcome;
        };

        let kind = item.effective_kind();
        if kind.is_container() {
            // descent keeps the menu up; the pushed listing renders it
            self.current = Location::parse(&item.uri);
            debug!("Descending into {}", self.current);
            outcome.commands.push(self.current.browse_command());
            return outcome;
        }

        let command = match kind {
            ItemKind::WebRadio => Command::ReplaceQueueAndPlay { uri: item.uri.clone() },
            ItemKind::Song | ItemKind::Playlist => Command::EnqueueAndPlay { uri: item.uri.clone() },
            _ => {
                debug!("Select ignored for {:?} item {}", kind, item.uri);
                return outcome;
            }
        };
        outcome.commands.push(command);
        self.transition(NavigationState::Status);
        outcome.render = Some(RenderKind::Status);
        outcome
    }

    fn back(&mut self) -> Outcome {
        if self.state != NavigationState::Menu {
            return self.enter_menu();
        }
        let mut outcome = Outcome {
            reset_timer: true,
            ..Outcome::unchanged(self.state)
        };
        if self.current == self.bounds.highest {
            debug!("Back ignored, {} is the highest level", self.current);
            return outcome;
        }
        // the next container listing names the level above again
        let Some(previous) = self.previous.take() else {
            return outcome;
        };
        self.current = previous;
        debug!("Ascending to {}", self.current);
        outcome.commands.push(self.current.browse_command());
        outcome
    }

    fn queue_target(&self) -> Option<&MenuItem> {
        self.menu.selected_item()
            .filter(|item| item.effective_kind().is_queueable())
    }

    fn add_to_queue(&mut self) -> Outcome {
        let mut outcome = Outcome {
            reset_timer: true,
            ..Outcome::unchanged(self.state)
        };
        if let Some(item) = self.queue_target() {
            outcome.commands = vec![
                Command::Enqueue { uri: item.uri.clone() },
                Command::Play { delay: Duration::ZERO },
            ];
        }
        outcome
    }

    fn replace_and_play(&mut self) -> Outcome {
        let mut outcome = Outcome {
            reset_timer: true,
            ..Outcome::unchanged(self.state)
        };
        if let Some(item) = self.queue_target() {
            outcome.commands = vec![
                Command::ClearQueue,
                Command::Enqueue { uri: item.uri.clone() },
                Command::Play { delay: Duration::from_millis(QUEUE_PLAY_DELAY_MS) },
            ];
        }
        outcome
    }

    fn items_pushed(&mut self, items: Vec<MenuItem>, origin: ListingOrigin) -> Outcome {
        match origin {
            ListingOrigin::Container { previous } => self.previous = Some(previous),
            ListingOrigin::Sources => {
                self.current = Location::Root;
                self.previous = None;
            }
        }
        if items.is_empty() {
            debug!("Empty listing for {}, menu left as is", self.current);
            return Outcome::unchanged(self.state);
        }

        self.menu.replace(items);
        debug!("Listing for {}: {} items, {} pages", self.current, self.menu.len(), self.menu.page_count());
        Outcome {
            render: (self.state == NavigationState::Menu).then_some(RenderKind::Menu),
            reset_timer: true,
            ..Outcome::unchanged(self.state)
        }
    }

    fn status_pushed(&mut self, status: PlaybackStatus) -> Outcome {
        self.status = status;
        if self.state == NavigationState::Menu {
            return Outcome::unchanged(self.state);
        }
        if self.state == NavigationState::Starting {
            self.transition(NavigationState::Status);
        }
        Outcome {
            render: Some(RenderKind::Status),
            ..Outcome::unchanged(self.state)
        }
    }
}
