use crate::types::CaptureSlot;
use std::collections::VecDeque;

/// Ordered capture plan for one session. The front slot is captured next.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureQueue {
    slots: VecDeque<CaptureSlot>,
    total_slots: usize,
}

impl CaptureQueue {
    pub fn new(slots: Vec<CaptureSlot>) -> Self {
        let total_slots = slots.len();
        Self {
            slots: slots.into(),
            total_slots,
        }
    }

    pub fn front(&self) -> Option<&CaptureSlot> {
        self.slots.front()
    }

    /// Remove the front slot once its capture is committed
    pub fn dequeue(&mut self) -> Option<CaptureSlot> {
        self.slots.pop_front()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots the queue was planned with
    pub fn total_slots(&self) -> usize {
        self.total_slots
    }

    pub fn iter(&self) -> impl Iterator<Item = &CaptureSlot> {
        self.slots.iter()
    }

    pub fn contains(&self, slot: &CaptureSlot) -> bool {
        let key = slot.key();
        self.slots.iter().any(|s| s.key() == key)
    }

    pub fn to_vec(&self) -> Vec<CaptureSlot> {
        self.slots.iter().copied().collect()
    }
}
