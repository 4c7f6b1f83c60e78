/*
 *  timer.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Menu timeout - returns the display to the status view after a period
 *  without navigation input
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

use log::{debug, trace};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{Instant, sleep_until};

use crate::navigation::Event;

#[derive(Debug, Default)]
struct TimerSlot {
    deadline: Option<Instant>,
    task: Option<AbortHandle>,
}

/// Inactivity timer with at most one live countdown.
///
/// `reset` pushes the deadline out instead of starting another countdown, so
/// a burst of button presses yields a single `TimeoutExpired` measured from
/// the last press.
pub struct MenuTimer {
    timeout: Duration,
    slot: Arc<Mutex<TimerSlot>>,
    events: mpsc::Sender<Event>,
}

fn lock(slot: &Mutex<TimerSlot>) -> MutexGuard<'_, TimerSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MenuTimer {
    pub fn new(timeout: Duration, events: mpsc::Sender<Event>) -> Self {
        Self {
            timeout,
            slot: Arc::new(Mutex::new(TimerSlot::default())),
            events,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_armed(&self) -> bool {
        lock(&self.slot).deadline.is_some()
    }

    pub fn reset(&self) {
        let deadline = Instant::now() + self.timeout;
        let mut slot = lock(&self.slot);
        let idle = slot.deadline.is_none();
        slot.deadline = Some(deadline);
        if !idle {
            trace!("Menu timeout pushed out by {:?}", self.timeout);
            return;
        }
        if let Some(stale) = slot.task.take() {
            stale.abort();
        }
        let task = tokio::spawn(countdown(Arc::clone(&self.slot), self.events.clone()));
        slot.task = Some(task.abort_handle());
        debug!("Menu timeout armed for {:?}", self.timeout);
    }

    pub fn cancel(&self) {
        let mut slot = lock(&self.slot);
        slot.deadline = None;
        if let Some(task) = slot.task.take() {
            task.abort();
        }
    }
}

impl Drop for MenuTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn countdown(slot: Arc<Mutex<TimerSlot>>, events: mpsc::Sender<Event>) {
    loop {
        let Some(due) = lock(&slot).deadline else {
            return;
        };
        sleep_until(due).await;

        {
            let mut guard = lock(&slot);
            match guard.deadline {
                Some(deadline) if deadline <= Instant::now() => {
                    guard.deadline = None;
                    guard.task = None;
                }
                Some(_) => continue,
                None => return,
            }
        }

        debug!("Menu timeout expired");
        if events.send(Event::TimeoutExpired).await.is_err() {
            debug!("Event loop gone, timeout dropped");
        }
        return;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::time::{sleep, timeout};

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_timeout() {
        let (tx, mut rx) = mpsc::channel(8);
        let timer = MenuTimer::new(Duration::from_secs(10), tx);
        let started = Instant::now();

        timer.reset();
        assert!(timer.is_armed());
        assert_eq!(rx.recv().await, Some(Event::TimeoutExpired));
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        assert!(!timer.is_armed());

        assert!(timeout(Duration::from_secs(60), rx.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_extends_single_timer() {
        let (tx, mut rx) = mpsc::channel(8);
        let timer = MenuTimer::new(Duration::from_secs(10), tx);
        let started = Instant::now();

        timer.reset();
        sleep(Duration::from_secs(9)).await;
        timer.reset();
        sleep(Duration::from_secs(9)).await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

        assert_eq!(rx.recv().await, Some(Event::TimeoutExpired));
        assert_eq!(started.elapsed(), Duration::from_secs(19));
        assert!(timeout(Duration::from_secs(60), rx.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_resets_fire_once() {
        let (tx, mut rx) = mpsc::channel(8);
        let timer = MenuTimer::new(Duration::from_millis(500), tx);
        for _ in 0..20 {
            timer.reset();
            sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(rx.recv().await, Some(Event::TimeoutExpired));
        assert!(timeout(Duration::from_secs(5), rx.recv()).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_rearm() {
        let (tx, mut rx) = mpsc::channel(8);
        let timer = MenuTimer::new(Duration::from_secs(1), tx);
        timer.reset();
        timer.cancel();
        assert!(timeout(Duration::from_secs(5), rx.recv()).await.is_err());

        timer.reset();
        assert_eq!(rx.recv().await, Some(Event::TimeoutExpired));
    }
}
