/*
 *  display/drivers/mock.rs
 *
 *  eadog-lcd - now playing and library menu for EA DOG displays
 *  (c) 2020-26 Stuart Hunter
 *
 *  Recording device for unit tests
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

use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;

use crate::display::error::DisplayError;
use crate::display::traits::{Animation, DeviceCapabilities, Font, LcdDevice, TextStyle};

/// One device primitive as issued by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOp {
    Initialize,
    Clear,
    MoveCursor { column: u8, page: u8 },
    WriteText { text: String, font: Font, style: TextStyle, animation: Animation },
    BacklightOn,
    HardwareReset,
}

#[derive(Debug, Default)]
struct MockState {
    ops: Vec<MockOp>,
    fail_writes: bool,
}

/// Shared view of what the device was asked to do
#[derive(Debug, Clone, Default)]
pub struct MockLog {
    state: Arc<Mutex<MockState>>,
}

impl MockLog {
    fn push(&self, op: MockOp) {
        self.state.lock().unwrap().ops.push(op);
    }

    pub fn ops(&self) -> Vec<MockOp> {
        self.state.lock().unwrap().ops.clone()
    }

    /// Drain the recorded operations
    pub fn take(&self) -> Vec<MockOp> {
        std::mem::take(&mut self.state.lock().unwrap().ops)
    }

    /// Make every `write_text` fail until switched off
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }
}

/// Mock LCD for testing.
///
/// Records each primitive; a gated device also parks every `write_text`
/// until the test releases a permit, to hold a render pass in flight.
pub struct MockDevice {
    capabilities: DeviceCapabilities,
    log: MockLog,
    gate: Option<Arc<Semaphore>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            capabilities: DeviceCapabilities::default(),
            log: MockLog::default(),
            gate: None,
        }
    }

    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let device = Self { gate: Some(Arc::clone(&gate)), ..Self::new() };
        (device, gate)
    }

    pub fn log(&self) -> MockLog {
        self.log.clone()
    }
}

impl LcdDevice for MockDevice {
    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    async fn initialize(&mut self) -> Result<(), DisplayError> {
        self.log.push(MockOp::Initialize);
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), DisplayError> {
        self.log.push(MockOp::Clear);
        Ok(())
    }

    async fn move_cursor(&mut self, column: u8, page: u8) -> Result<(), DisplayError> {
        if page >= self.capabilities.pages {
            return Err(DisplayError::InvalidPosition { column, page });
        }
        self.log.push(MockOp::MoveCursor { column, page });
        Ok(())
    }

    async fn write_text(
        &mut self,
        text: &str,
        font: Font,
        style: TextStyle,
        animation: Animation,
    ) -> Result<(), DisplayError> {
        if let Some(gate) = &self.gate {
            gate.acquire().await.map_err(|e| DisplayError::Other(e.to_string()))?.forget();
        }
        if self.log.state.lock().unwrap().fail_writes {
            return Err(DisplayError::Other("Simulated write failure".to_string()));
        }
        self.log.push(MockOp::WriteText { text: text.to_string(), font, style, animation });
        Ok(())
    }

    async fn backlight_on(&mut self) -> Result<(), DisplayError> {
        self.log.push(MockOp::BacklightOn);
        Ok(())
    }

    async fn hardware_reset(&mut self) -> Result<(), DisplayError> {
        self.log.push(MockOp::HardwareReset);
        Ok(())
    }
}
