//! Request types sent from the engine to its actuators.

use serde::{Deserialize, Serialize};
use std::fmt;
use warden_core::AlarmIntensity;

/// Requested position of the door lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorPosition {
    Open,
    Closed,
}

impl fmt::Display for DoorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoorPosition::Open => write!(f, "open"),
            DoorPosition::Closed => write!(f, "closed"),
        }
    }
}

/// Command for the single visual indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorCommand {
    On,
    Off,
    Toggle,
}

/// A best-effort request to the audio/visual feedback sink.
///
/// # Examples
///
/// ```
/// use warden_core::AlarmIntensity;
/// use warden_hardware::FeedbackRequest;
///
/// let alarm = FeedbackRequest::tone(1000, AlarmIntensity::new(10));
/// assert_eq!(alarm.to_string(), "tone 1000 @ 10%");
/// assert_eq!(FeedbackRequest::chirp(200).to_string(), "chirp 200ms");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedbackRequest {
    /// Continuous tone at `pitch` until replaced or stopped.
    Tone {
        pitch: u16,
        intensity: AlarmIntensity,
    },

    /// Silence any continuous tone.
    Stop,

    /// Short self-terminating beep.
    Chirp { duration_ms: u16 },

    Indicator { command: IndicatorCommand },
}

impl FeedbackRequest {
    pub fn tone(pitch: u16, intensity: AlarmIntensity) -> Self {
        Self::Tone { pitch, intensity }
    }

    pub fn chirp(duration_ms: u16) -> Self {
        Self::Chirp { duration_ms }
    }

    pub fn indicator(command: IndicatorCommand) -> Self {
        Self::Indicator { command }
    }
}

impl fmt::Display for FeedbackRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackRequest::Tone { pitch, intensity } => write!(f, "tone {pitch} @ {intensity}"),
            FeedbackRequest::Stop => write!(f, "stop"),
            FeedbackRequest::Chirp { duration_ms } => write!(f, "chirp {duration_ms}ms"),
            FeedbackRequest::Indicator { command } => write!(f, "indicator {command:?}"),
        }
    }
}
