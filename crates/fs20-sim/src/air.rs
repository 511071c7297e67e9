//! Shared radio medium between simulated adapters

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use fs20_protocol::receive::FRAME_LEN;

/// Frames transmitted but not yet picked up by a receiver
///
/// Cloning yields another view of the same medium.
#[derive(Debug, Clone, Default)]
pub struct Air {
    frames: Arc<Mutex<VecDeque<[u8; FRAME_LEN]>>>,
}

impl Air {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<[u8; FRAME_LEN]>> {
        // poisoning is ignored, the queue stays consistent
        self.frames.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Put a receiver frame on the air
    pub fn broadcast(&self, frame: [u8; FRAME_LEN]) {
        self.lock().push_back(frame);
    }

    /// Take the oldest frame
    pub fn take(&self) -> Option<[u8; FRAME_LEN]> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
