/*
 *  runtime.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Controller - the single event loop tying navigation, timer, display
 *  session and the player command sink together
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

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::{mpsc, watch};

use crate::config::Config;
use crate::display::render::{Renderer, SplashLine};
use crate::display::session::{DisplaySession, MarqueeTicker, RenderTicket};
use crate::display::traits::LcdDevice;
use crate::display::error::DisplayError;
use crate::display::view::ViewModel;
use crate::menu::MenuPager;
use crate::navigation::{Event, NavigationBounds, NavigationState, Navigator};
use crate::protocol::{Command, CommandSink};
use crate::timer::MenuTimer;

/// Buffered events between producers and the loop
pub const EVENT_QUEUE_DEPTH: usize = 64;

#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub bounds: NavigationBounds,
    pub pager: MenuPager,
    pub menu_timeout: Duration,
    pub splash_timeout: Duration,
    pub marquee_step: Duration,
    pub splash: Vec<SplashLine>,
}

impl RuntimeSettings {
    pub fn from_config(config: &Config, splash: Vec<SplashLine>) -> Self {
        Self {
            bounds: config.bounds(),
            pager: MenuPager::default(),
            menu_timeout: config.menu_timeout(),
            splash_timeout: config.splash_timeout(),
            marquee_step: config.marquee_step(),
            splash,
        }
    }
}

pub struct Controller<D: LcdDevice, S: CommandSink> {
    navigator: Navigator,
    display: DisplaySession<D>,
    timer: MenuTimer,
    marquee: Option<MarqueeTicker>,
    sink: Arc<S>,
    view: watch::Sender<ViewModel>,
    settings: RuntimeSettings,
}

impl<D: LcdDevice, S: CommandSink> Controller<D, S> {
    /// `events` is where the menu timer delivers its expiry
    pub fn new(device: D, sink: S, settings: RuntimeSettings, events: mpsc::Sender<Event>) -> Self {
        let navigator = Navigator::new(settings.bounds.clone(), settings.pager);
        let (view, view_rx) = watch::channel(navigator.view());
        Self {
            display: DisplaySession::new(Renderer::new(device), view_rx),
            timer: MenuTimer::new(settings.menu_timeout, events),
            marquee: None,
            navigator,
            sink: Arc::new(sink),
            view,
            settings,
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn display(&self) -> &DisplaySession<D> {
        &self.display
    }

    pub fn state(&self) -> NavigationState {
        self.navigator.state()
    }

    /// Initialise the device, show the splash, then ask the player for data
    pub async fn start(&mut self) -> Result<(), DisplayError> {
        if let Err(e) = self.bring_up().await {
            error!("Display start failed: {}", e);
            self.navigator.enter(NavigationState::Critical);
            return Err(e);
        }
        self.marquee = Some(self.display.start_marquee(self.settings.marquee_step));
        let commands = self.navigator.activate();
        info!("Listening, starting at {}", self.navigator.current_location());
        self.dispatch(commands);
        Ok(())
    }

    async fn bring_up(&mut self) -> Result<(), DisplayError> {
        self.display.initialize().await?;
        self.display.splash(&self.settings.splash).await?;
        tokio::time::sleep(self.settings.splash_timeout).await;
        self.display.clear().await
    }

    /// Apply one event. Returns the render ticket when a render was requested.
    pub fn handle(&mut self, event: Event) -> Option<RenderTicket> {
        let outcome = self.navigator.handle(event);
        self.view.send_replace(self.navigator.view());

        if outcome.reset_timer {
            self.timer.reset();
        }
        self.dispatch(outcome.commands);
        outcome.render.map(|kind| self.display.request_render(kind))
    }

    fn dispatch(&self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::Play { delay } if !delay.is_zero() => {
                    let sink = Arc::clone(&self.sink);
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        send(sink.as_ref(), Command::Play { delay });
                    });
                }
                command => send(self.sink.as_ref(), command),
            }
        }
    }

    /// Process events in arrival order until `shutdown` resolves or every sender is gone
    pub async fn run<F>(mut self, mut events: mpsc::Receiver<Event>, shutdown: F) -> Result<(), DisplayError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => {
                        debug!("Event {}", event_name(&event));
                        self.handle(event);
                    }
                    None => break,
                },
            }
        }
        self.stop().await
    }

    /// Blank the panel once the pass in flight is done; later renders are dropped
    pub async fn stop(&mut self) -> Result<(), DisplayError> {
        self.navigator.enter(NavigationState::Stopping);
        self.timer.cancel();
        if let Some(marquee) = self.marquee.take() {
            marquee.stop();
        }
        self.display.shutdown().await
    }
}

fn send<S: CommandSink + ?Sized>(sink: &S, command: Command) {
    debug!("-> {}", command.event_name());
    if let Err(e) = sink.send(command) {
        warn!("Player command dropped: {}", e);
    }
}

fn event_name(event: &Event) -> &'static str {
    match event {
        Event::Up => "up",
        Event::Down => "down",
        Event::Select => "select",
        Event::Back => "back",
        Event::AddToQueue => "add",
        Event::ReplaceAndPlay => "replace",
        Event::ItemsPushed { .. } => "items",
        Event::StatusPushed(_) => "status",
        Event::TimeoutExpired => "timeout",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::{MockDevice, MockOp};
    use crate::display::view::RenderKind;
    use crate::menu::{ItemKind, MenuItem};
    use crate::navigation::ListingOrigin;
    use crate::protocol::ChannelSink;
    use crate::status::PlaybackStatus;
    use tokio::time::Instant;

    fn settings() -> RuntimeSettings {
        RuntimeSettings {
            bounds: NavigationBounds::default(),
            pager: MenuPager::default(),
            menu_timeout: Duration::from_secs(10),
            splash_timeout: Duration::from_secs(3),
            marquee_step: Duration::from_millis(350),
            splash: vec![SplashLine::new(0, "EADOG LCD", crate::display::Font::Large)],
        }
    }

    fn songs(n: usize) -> Event {
        Event::ItemsPushed {
            items: (0..n).map(|i| MenuItem::new(ItemKind::Song, &format!("S{}", i), &format!("s{}", i))).collect(),
            origin: ListingOrigin::Sources,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_sequence() {
        let device = MockDevice::new();
        let log = device.log();
        let (sink, mut commands) = ChannelSink::channel();
        let (tx, _rx) = mpsc::channel(8);
        let mut controller = Controller::new(device, sink, settings(), tx);

        let began = Instant::now();
        controller.start().await.unwrap();
        assert_eq!(began.elapsed(), Duration::from_secs(3));
        assert_eq!(commands.recv().await, Some(Command::BrowseSources));
        assert_eq!(commands.recv().await, Some(Command::GetState));

        let ops = log.ops();
        assert_eq!(&ops[..4], &[MockOp::HardwareReset, MockOp::Initialize, MockOp::BacklightOn, MockOp::Clear]);
        assert_eq!(ops.last(), Some(&MockOp::Clear));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replace_and_play_delays_play() {
        let (sink, mut commands) = ChannelSink::channel();
        let (tx, _rx) = mpsc::channel(8);
        let mut controller = Controller::new(MockDevice::new(), sink, settings(), tx);
        controller.handle(songs(2));

        let began = Instant::now();
        controller.handle(Event::ReplaceAndPlay);
        assert_eq!(commands.recv().await, Some(Command::ClearQueue));
        assert_eq!(commands.recv().await, Some(Command::Enqueue { uri: "s0".into() }));
        assert_eq!(commands.recv().await, Some(Command::Play { delay: Duration::from_millis(150) }));
        assert_eq!(began.elapsed(), Duration::from_millis(150));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_returns_to_status() {
        let (sink, _commands) = ChannelSink::channel();
        let (tx, mut rx) = mpsc::channel(8);
        let mut controller = Controller::new(MockDevice::new(), sink, settings(), tx);
        controller.handle(Event::StatusPushed(PlaybackStatus::new("A", "B", "play")));
        controller.handle(songs(3));
        controller.handle(Event::Down);
        assert_eq!(controller.state(), NavigationState::Menu);

        let event = rx.recv().await.unwrap();
        assert_eq!(event, Event::TimeoutExpired);
        let Some(RenderTicket::Started(handle)) = controller.handle(event) else {
            panic!("timeout must start a status render");
        };
        let outcomes = handle.await.unwrap();
        assert_eq!(outcomes.last().map(|o| o.kind), Some(RenderKind::Status));
        assert_eq!(controller.state(), NavigationState::Status);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let device = MockDevice::new();
        let log = device.log();
        let (sink, _commands) = ChannelSink::channel();
        let (tx, rx) = mpsc::channel(8);
        let controller = Controller::new(device, sink, settings(), tx.clone());

        tx.send(Event::Up).await.unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let run = tokio::spawn(controller.run(rx, async move { let _ = stop_rx.await; }));
        stop_tx.send(()).unwrap();
        run.await.unwrap().unwrap();
        assert_eq!(log.ops().last(), Some(&MockOp::Clear));
    }

    #[tokio::test]
    async fn test_stop_leaves_panel_blank() {
        let device = MockDevice::new();
        let log = device.log();
        let (sink, _commands) = ChannelSink::channel();
        let (tx, _rx) = mpsc::channel(8);
        let mut controller = Controller::new(device, sink, settings(), tx);

        let Some(RenderTicket::Started(handle)) = controller.handle(Event::Up) else {
            panic!("navigation input must start a menu render");
        };
        controller.stop().await.unwrap();
        handle.await.unwrap();

        assert_eq!(log.ops().last(), Some(&MockOp::Clear));
        assert_eq!(controller.state(), NavigationState::Stopping);
        assert!(matches!(controller.handle(Event::Down), Some(RenderTicket::Dropped)));
        assert_eq!(log.ops().last(), Some(&MockOp::Clear));
    }
}
