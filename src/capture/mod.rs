//! Capture process supervision
//!
//! This module owns the external segmenter processes:
//! - `supervisor` starts/stops one capture session per enabled channel
//! - `liveness` persists and reads the per-channel pid records
//! - `proctab` is the process-table edge (existence, termination, runtime)

pub mod liveness;
pub mod proctab;
pub mod supervisor;

pub use liveness::PidRecord;
pub use supervisor::CaptureSupervisor;

/// Container produced by the segmenter; also the extension the catalog scans
/// for.
pub const SEGMENT_EXT: &str = "mp4";

/// One independently configured video source with its own storage directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    One,
    Two,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::One, Channel::Two];

    /// Directory label used in relative paths and catalog entries.
    pub fn label(self) -> &'static str {
        match self {
            Channel::One => "videos1",
            Channel::Two => "videos2",
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Channel::One => 1,
            Channel::Two => 2,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Channel::One => 0,
            Channel::Two => 1,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "videos1" => Some(Channel::One),
            "videos2" => Some(Channel::Two),
            _ => None,
        }
    }
}
