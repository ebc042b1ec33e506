use crate::frame::Frame;

pub const HISTORY_LEN: usize = 6;

/// Fixed ring of the most recent frames. Index 0 is the newest.
#[derive(Debug, Default)]
pub struct FrameHistory {
    slots: [Option<Frame>; HISTORY_LEN],
    head: usize,
}

impl FrameHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `frame` as the newest entry, dropping the oldest.
    pub fn push(&mut self, frame: Frame) {
        self.head = (self.head + HISTORY_LEN - 1) % HISTORY_LEN;
        self.slots[self.head] = Some(frame);
    }

    pub fn get(&self, age: usize) -> Option<&Frame> {
        if age >= HISTORY_LEN {
            return None;
        }
        self.slots[(self.head + age) % HISTORY_LEN].as_ref()
    }

    pub fn latest(&self) -> Option<&Frame> {
        self.get(0)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}
