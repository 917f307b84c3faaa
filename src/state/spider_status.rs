/// Worker status definitions for termination detection
///
/// Each worker owns exactly one [`StatusCell`]. Only the owning worker writes
/// it; the coordinator reads every cell when checking for completion.
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Represents what a worker is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpiderStatus {
    /// Waiting on the work queue (initial state)
    Idle,

    /// Processing one claimed unit of work
    Working,
}

impl SpiderStatus {
    fn to_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Working => 1,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Working,
            _ => Self::Idle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Working => "working",
        }
    }
}

impl fmt::Display for SpiderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-writer, many-reader status slot
#[derive(Debug)]
pub struct StatusCell(AtomicU8);

impl StatusCell {
    /// Creates a cell in the Idle state
    pub fn new() -> Self {
        Self(AtomicU8::new(SpiderStatus::Idle.to_u8()))
    }

    pub fn get(&self) -> SpiderStatus {
        SpiderStatus::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, status: SpiderStatus) {
        self.0.store(status.to_u8(), Ordering::SeqCst);
    }

    pub fn is_idle(&self) -> bool {
        self.get() == SpiderStatus::Idle
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}
