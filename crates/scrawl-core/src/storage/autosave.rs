//! Debounced autosave.
//!
//! Every mutation pushes the deadline out by the debounce window, so a burst
//! of edits produces a single write once the user pauses. Writes are full
//! document overwrites and are handed to the host fire-and-forget.

use super::{CanvasStore, StorageResult};
use crate::clock::{Duration, Instant};
use crate::format::{DocumentJson, FormatResult};
use serde_json::Value;

/// Default quiet period before a save fires.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2000);

/// A document ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub canvas_id: String,
    /// Canonical document, overlay and tombstones already stripped.
    pub document: DocumentJson,
}

impl SaveRequest {
    /// The `data` payload for `PUT /canvases/{id}`.
    pub fn payload(&self) -> FormatResult<Value> {
        self.document.to_value()
    }
}

/// Tracks the pending save deadline.
#[derive(Debug, Clone)]
pub struct AutoSaver {
    debounce: Duration,
    deadline: Option<Instant>,
    issued: usize,
}

impl Default for AutoSaver {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl AutoSaver {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            deadline: None,
            issued: 0,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// (Re)start the debounce window at `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.debounce);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drop any pending save, e.g. when the canvas is switched.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// True once if the deadline has passed; clears it.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                self.issued += 1;
                true
            }
            _ => false,
        }
    }

    /// Saves handed out so far.
    pub fn issued(&self) -> usize {
        self.issued
    }
}

/// Write a save request. Failures are logged and returned; nothing retries
/// them, the next mutation schedules a fresh save with the latest state.
pub async fn send_save<S: CanvasStore + ?Sized>(store: &S, request: &SaveRequest) -> StorageResult<()> {
    let result = match request.payload() {
        Ok(data) => store.put(&request.canvas_id, data).await,
        Err(err) => Err(super::StorageError::Serialization(err.to_string())),
    };
    match &result {
        Ok(()) => log::debug!("saved canvas {}", request.canvas_id),
        Err(err) => log::warn!("saving canvas {} failed: {}", request.canvas_id, err),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::storage::{CanvasRecord, MemoryStore};
    use futures::executor::block_on;

    #[test]
    fn test_burst_coalesces_into_one_save() {
        let clock = ManualClock::new();
        let mut saver = AutoSaver::default();
        for t in [0, 500, 1000] {
            clock.set_ms(t);
            saver.schedule(clock.now());
        }
        let mut fired = Vec::new();
        for t in (0..=5000).step_by(100) {
            clock.set_ms(t);
            if saver.take_due(clock.now()) {
                fired.push(t);
            }
        }
        assert_eq!(fired, vec![3000]);
        assert_eq!(saver.issued(), 1);
    }

    #[test]
    fn test_cancel_drops_pending_save() {
        let clock = ManualClock::new();
        let mut saver = AutoSaver::new(Duration::from_millis(10));
        saver.schedule(clock.now());
        saver.cancel();
        clock.advance(Duration::from_secs(1));
        assert!(!saver.take_due(clock.now()));
    }

    #[test]
    fn test_send_save_writes_payload() {
        let store = MemoryStore::new();
        store.insert(CanvasRecord::new("c1", None, "Canvas")).unwrap();
        let request = SaveRequest {
            canvas_id: "c1".to_string(),
            document: DocumentJson::new(),
        };
        block_on(send_save(&store, &request)).unwrap();
        let saved = block_on(store.get("c1")).unwrap();
        assert!(saved.data["elements"].is_array());
    }

    #[test]
    fn test_send_save_reports_failure() {
        let store = MemoryStore::new();
        store.insert(CanvasRecord::new("c1", None, "Canvas")).unwrap();
        store.set_failing(true);
        let request = SaveRequest {
            canvas_id: "c1".to_string(),
            document: DocumentJson::new(),
        };
        assert!(block_on(send_save(&store, &request)).is_err());
    }
}
