/*
 *  display/session.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display session - serialises render passes onto the one device and
 *  coalesces requests that arrive while a pass is in flight
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

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, error};
use tokio::sync::{Mutex as AsyncMutex, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::MissedTickBehavior;

use crate::display::error::DisplayError;
use crate::display::render::{Renderer, SplashLine};
use crate::display::traits::LcdDevice;
use crate::display::view::{RenderKind, ViewModel};

/// Busy flag plus a single pending slot, last writer wins
#[derive(Debug, Default)]
struct RenderSession {
    busy: bool,
    pending: Option<RenderKind>,
    /// Set on shutdown, nothing is drawn afterwards
    closed: bool,
}

impl RenderSession {
    /// `true` when the caller now owns the device and must run the pass
    fn request(&mut self, kind: RenderKind) -> bool {
        if !self.busy {
            self.busy = true;
            return true;
        }
        if let Some(dropped) = self.pending.replace(kind) {
            debug!("Pending {:?} render superseded by {:?}", dropped, kind);
        }
        false
    }

    /// Hand over to the pending pass, or go idle
    fn complete(&mut self) -> Option<RenderKind> {
        let next = self.pending.take();
        if next.is_none() {
            self.busy = false;
        }
        next
    }

    /// Checked with the renderer held, before every pass
    fn may_draw(&mut self) -> bool {
        if self.closed {
            self.busy = false;
            self.pending = None;
        }
        !self.closed
    }

    fn close(&mut self) {
        self.closed = true;
        self.pending = None;
    }
}

/// Result of one render pass
#[derive(Debug)]
pub struct PassOutcome {
    pub kind: RenderKind,
    pub result: Result<(), DisplayError>,
}

pub enum RenderTicket {
    /// A pass was started; the handle yields every pass run before going idle
    Started(JoinHandle<Vec<PassOutcome>>),
    /// Folded into the pending slot of the pass already in flight
    Coalesced,
    /// The session is shut down
    Dropped,
}

impl RenderTicket {
    pub fn is_coalesced(&self) -> bool {
        matches!(self, RenderTicket::Coalesced)
    }
}

/// Keeps the marquee stepping until stopped or dropped
pub struct MarqueeTicker(AbortHandle);

impl MarqueeTicker {
    pub fn stop(&self) {
        self.0.abort();
    }
}

impl Drop for MarqueeTicker {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// One marquee step, skipped while a render pass holds the device
async fn scroll_step<D: LcdDevice>(
    session: &Mutex<RenderSession>,
    renderer: &AsyncMutex<Renderer<D>>,
) -> Result<usize, DisplayError> {
    {
        let session = lock(session);
        if session.busy || session.closed {
            return Ok(0);
        }
    }
    match renderer.try_lock() {
        Ok(mut renderer) => renderer.scroll().await,
        Err(_) => Ok(0),
    }
}

/// Sole owner of the display device
pub struct DisplaySession<D: LcdDevice> {
    session: Arc<Mutex<RenderSession>>,
    renderer: Arc<AsyncMutex<Renderer<D>>>,
    view: watch::Receiver<ViewModel>,
}

fn lock(session: &Mutex<RenderSession>) -> MutexGuard<'_, RenderSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<D: LcdDevice> DisplaySession<D> {
    pub fn new(renderer: Renderer<D>, view: watch::Receiver<ViewModel>) -> Self {
        Self {
            session: Arc::new(Mutex::new(RenderSession::default())),
            renderer: Arc::new(AsyncMutex::new(renderer)),
            view,
        }
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.session).busy
    }

    pub fn pending(&self) -> Option<RenderKind> {
        lock(&self.session).pending
    }

    /// Never waits on the device. Each pass renders the newest view model.
    pub fn request_render(&self, kind: RenderKind) -> RenderTicket {
        if lock(&self.session).closed {
            debug!("{:?} render after shutdown dropped", kind);
            return RenderTicket::Dropped;
        }
        if !lock(&self.session).request(kind) {
            debug!("{:?} render coalesced", kind);
            return RenderTicket::Coalesced;
        }

        let session = Arc::clone(&self.session);
        let renderer = Arc::clone(&self.renderer);
        let view = self.view.clone();
        RenderTicket::Started(tokio::spawn(async move {
            let mut renderer = renderer.lock().await;
            let mut outcomes = Vec::new();
            let mut next = Some(kind);
            while let Some(kind) = next {
                if !lock(&session).may_draw() {
                    debug!("{:?} render skipped, display shut down", kind);
                    break;
                }
                let snapshot = view.borrow().clone();
                let result = renderer.render(kind, &snapshot).await;
                if let Err(e) = &result {
                    error!("{:?} render failed: {}", kind, e);
                }
                outcomes.push(PassOutcome { kind, result });
                next = lock(&session).complete();
            }
            outcomes
        }))
    }

    /// Bring the device up. Waits for any pass in flight.
    pub async fn initialize(&self) -> Result<(), DisplayError> {
        self.renderer.lock().await.initialize().await
    }

    pub async fn splash(&self, lines: &[SplashLine]) -> Result<(), DisplayError> {
        self.renderer.lock().await.splash(lines).await
    }

    pub async fn clear(&self) -> Result<(), DisplayError> {
        self.renderer.lock().await.clear().await
    }

    /// One marquee step now, unless a pass is in flight
    pub async fn scroll(&self) -> Result<usize, DisplayError> {
        scroll_step(&self.session, &self.renderer).await
    }

    /// Step the marquee every `period` until shutdown
    pub fn start_marquee(&self, period: Duration) -> MarqueeTicker {
        let session = Arc::clone(&self.session);
        let renderer = Arc::clone(&self.renderer);
        let task = tokio::spawn(async move {
            let mut ticks = tokio::time::interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticks.tick().await;
            loop {
                ticks.tick().await;
                if lock(&session).closed {
                    break;
                }
                if let Err(e) = scroll_step(&session, &renderer).await {
                    error!("Marquee step failed: {}", e);
                }
            }
        });
        MarqueeTicker(task.abort_handle())
    }

    /// Refuse further renders, let the pass in flight finish, then blank the panel
    pub async fn shutdown(&self) -> Result<(), DisplayError> {
        lock(&self.session).close();
        let mut renderer = self.renderer.lock().await;
        debug!("Display session closed");
        renderer.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MARQUEE_HOLD_TICKS;
    use crate::display::drivers::mock::{MockDevice, MockOp};
    use crate::display::traits::{Animation, Font, TextStyle};
    use crate::status::PlaybackStatus;

    #[test]
    fn test_session_slot() {
        let mut s = RenderSession::default();
        assert!(s.request(RenderKind::Menu));
        assert!(!s.request(RenderKind::Status));
        assert!(!s.request(RenderKind::Menu));
        assert_eq!(s.pending, Some(RenderKind::Menu));

        assert_eq!(s.complete(), Some(RenderKind::Menu));
        assert!(s.busy);
        assert_eq!(s.complete(), None);
        assert!(!s.busy);
        assert!(s.request(RenderKind::Status));
    }

    fn session(device: MockDevice) -> (DisplaySession<MockDevice>, watch::Sender<ViewModel>) {
        let (tx, rx) = watch::channel(ViewModel::default());
        (DisplaySession::new(Renderer::new(device), rx), tx)
    }

    #[tokio::test]
    async fn test_burst_runs_one_extra_pass_of_last_kind() {
        let (device, gate) = MockDevice::gated();
        let (display, _view) = session(device);

        let RenderTicket::Started(handle) = display.request_render(RenderKind::Menu) else {
            panic!("first request must start a pass");
        };
        for kind in [RenderKind::Status, RenderKind::Menu, RenderKind::Status, RenderKind::Menu, RenderKind::Status] {
            assert!(display.request_render(kind).is_coalesced());
        }
        assert!(display.is_busy());
        assert_eq!(display.pending(), Some(RenderKind::Status));

        gate.add_permits(64);
        let outcomes = handle.await.unwrap();
        let kinds: Vec<_> = outcomes.iter().map(|o| o.kind).collect();
        assert_eq!(kinds, vec![RenderKind::Menu, RenderKind::Status]);
        assert!(outcomes.iter().all(|o| o.result.is_ok()));
        assert!(!display.is_busy());
        assert_eq!(display.pending(), None);
    }

    #[tokio::test]
    async fn test_pass_renders_latest_view() {
        let (device, gate) = MockDevice::gated();
        let log = device.log();
        let (display, view) = session(device);

        let RenderTicket::Started(handle) = display.request_render(RenderKind::Status) else {
            panic!("expected a pass");
        };
        assert!(display.request_render(RenderKind::Status).is_coalesced());
        view.send_modify(|v| v.status = PlaybackStatus::new("A", "B", "C"));

        gate.add_permits(64);
        handle.await.unwrap();
        let texts: Vec<_> = log.ops().into_iter().filter_map(|op| match op {
            MockOp::WriteText { text, .. } => Some(text),
            _ => None,
        }).collect();
        assert!(texts.contains(&"B".to_string()));
    }

    #[tokio::test]
    async fn test_failure_releases_busy() {
        let device = MockDevice::new();
        let log = device.log();
        let (display, _view) = session(device);

        log.fail_writes(true);
        let RenderTicket::Started(handle) = display.request_render(RenderKind::Menu) else {
            panic!("expected a pass");
        };
        let outcomes = handle.await.unwrap();
        assert!(outcomes[0].result.is_err());
        assert!(!display.is_busy());

        log.fail_writes(false);
        let RenderTicket::Started(handle) = display.request_render(RenderKind::Menu) else {
            panic!("device must be free after a failed pass");
        };
        assert!(handle.await.unwrap()[0].result.is_ok());
    }

    #[tokio::test]
    async fn test_no_overlapping_writes() {
        let (device, gate) = MockDevice::gated();
        let log = device.log();
        let (display, _view) = session(device);

        let RenderTicket::Started(handle) = display.request_render(RenderKind::Menu) else {
            panic!("expected a pass");
        };
        display.request_render(RenderKind::Menu);
        gate.add_permits(64);
        handle.await.unwrap();

        // two passes, each a contiguous run of cursor/write pairs
        let ops = log.ops();
        let writes = ops.iter().filter(|op| matches!(op, MockOp::WriteText { .. })).count();
        assert_eq!(writes, 8);
        for pair in ops.iter().skip(1).collect::<Vec<_>>().chunks(2) {
            assert!(matches!(pair[0], MockOp::MoveCursor { .. }));
            assert!(matches!(pair[1], MockOp::WriteText { .. }));
        }
    }

    #[tokio::test]
    async fn test_shutdown_clears_after_pass_in_flight() {
        let (device, gate) = MockDevice::gated();
        let log = device.log();
        let (display, _view) = session(device);

        let RenderTicket::Started(handle) = display.request_render(RenderKind::Menu) else {
            panic!("expected a pass");
        };
        assert!(display.request_render(RenderKind::Status).is_coalesced());
        // let the pass take the device and park on the gate
        tokio::task::yield_now().await;

        let (cleared, _) = tokio::join!(display.shutdown(), async { gate.add_permits(64) });
        cleared.unwrap();
        let kinds: Vec<_> = handle.await.unwrap().iter().map(|o| o.kind).collect();
        assert_eq!(kinds, vec![RenderKind::Menu]);

        let ops = log.ops();
        assert_eq!(ops.last(), Some(&MockOp::Clear));
        assert_eq!(ops.iter().filter(|op| matches!(op, MockOp::WriteText { .. })).count(), 4);
        assert!(matches!(display.request_render(RenderKind::Menu), RenderTicket::Dropped));
        assert!(!display.is_busy());
    }

    #[tokio::test]
    async fn test_shutdown_before_pass_starts() {
        let device = MockDevice::new();
        let log = device.log();
        let (display, _view) = session(device);

        let RenderTicket::Started(handle) = display.request_render(RenderKind::Menu) else {
            panic!("expected a pass");
        };
        display.shutdown().await.unwrap();
        assert!(handle.await.unwrap().is_empty());
        assert_eq!(log.ops(), vec![MockOp::Clear]);
        assert!(!display.is_busy());
    }

    fn long_status() -> PlaybackStatus {
        PlaybackStatus::new("A very long artist name", "Title", "play")
    }

    fn texts(ops: &[MockOp]) -> Vec<String> {
        ops.iter().filter_map(|op| match op {
            MockOp::WriteText { text, .. } => Some(text.clone()),
            _ => None,
        }).collect()
    }

    #[tokio::test]
    async fn test_scroll_steps_long_status_line() {
        let device = MockDevice::new();
        let log = device.log();
        let (display, view) = session(device);
        view.send_modify(|v| v.status = long_status());

        let RenderTicket::Started(handle) = display.request_render(RenderKind::Status) else {
            panic!("expected a pass");
        };
        handle.await.unwrap();
        log.take();

        for _ in 0..MARQUEE_HOLD_TICKS {
            assert_eq!(display.scroll().await.unwrap(), 0);
        }
        assert_eq!(display.scroll().await.unwrap(), 1);
        assert_eq!(log.take(), vec![
            MockOp::MoveCursor { column: 0, page: 0 },
            MockOp::WriteText {
                text: " very long artist".into(),
                font: Font::Large,
                style: TextStyle::Normal,
                animation: Animation::Static,
            },
        ]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_marquee_ticker_advances_over_time() {
        let device = MockDevice::new();
        let log = device.log();
        let (display, view) = session(device);
        view.send_modify(|v| v.status = long_status());

        let RenderTicket::Started(handle) = display.request_render(RenderKind::Status) else {
            panic!("expected a pass");
        };
        handle.await.unwrap();
        log.take();

        let step = Duration::from_millis(100);
        let ticker = display.start_marquee(step);
        tokio::time::sleep(step * MARQUEE_HOLD_TICKS + step / 2).await;
        assert!(log.ops().is_empty());

        tokio::time::sleep(step * 2).await;
        assert_eq!(texts(&log.take()), vec![" very long artist".to_string(), "very long artist ".to_string()]);

        ticker.stop();
        tokio::time::sleep(step * 5).await;
        assert!(log.ops().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_marquee_stops_on_shutdown() {
        let device = MockDevice::new();
        let log = device.log();
        let (display, view) = session(device);
        view.send_modify(|v| v.status = long_status());
        if let RenderTicket::Started(handle) = display.request_render(RenderKind::Status) {
            handle.await.unwrap();
        }

        let _ticker = display.start_marquee(Duration::from_millis(100));
        display.shutdown().await.unwrap();
        log.take();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(log.ops().is_empty());
    }
}
