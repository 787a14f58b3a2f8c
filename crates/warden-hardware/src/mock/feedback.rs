//! Recording feedback sink.

use crate::{
    Result,
    traits::FeedbackSink,
    types::{FeedbackRequest, IndicatorCommand},
};
use std::sync::{Arc, Mutex, PoisonError};
use warden_core::AlarmIntensity;

#[derive(Debug, Default)]
struct FeedbackState {
    history: Vec<FeedbackRequest>,
    tone: Option<(u16, AlarmIntensity)>,
    indicator_on: bool,
}

/// Feedback sink that records requests and tracks the resulting output state.
///
/// # Examples
///
/// ```
/// use warden_core::AlarmIntensity;
/// use warden_hardware::mock::MockFeedback;
/// use warden_hardware::{FeedbackRequest, FeedbackSink, IndicatorCommand};
///
/// let (mut sink, handle) = MockFeedback::new();
/// sink.submit(FeedbackRequest::tone(2000, AlarmIntensity::new(50))).unwrap();
/// sink.submit(FeedbackRequest::indicator(IndicatorCommand::Toggle)).unwrap();
///
/// assert_eq!(handle.tone(), Some((2000, AlarmIntensity::new(50))));
/// assert!(handle.indicator_on());
/// ```
#[derive(Debug)]
pub struct MockFeedback {
    state: Arc<Mutex<FeedbackState>>,
}

impl MockFeedback {
    pub fn new() -> (Self, MockFeedbackHandle) {
        let state = Arc::new(Mutex::new(FeedbackState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockFeedbackHandle { state },
        )
    }
}

impl FeedbackSink for MockFeedback {
    fn submit(&mut self, request: FeedbackRequest) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match request {
            FeedbackRequest::Tone { pitch, intensity } => state.tone = Some((pitch, intensity)),
            FeedbackRequest::Stop => state.tone = None,
            FeedbackRequest::Chirp { .. } => {}
            FeedbackRequest::Indicator { command } => {
                state.indicator_on = match command {
                    IndicatorCommand::On => true,
                    IndicatorCommand::Off => false,
                    IndicatorCommand::Toggle => !state.indicator_on,
                };
            }
        }
        state.history.push(request);
        Ok(())
    }
}

/// Inspection handle for a [`MockFeedback`].
#[derive(Debug, Clone)]
pub struct MockFeedbackHandle {
    state: Arc<Mutex<FeedbackState>>,
}

impl MockFeedbackHandle {
    pub fn history(&self) -> Vec<FeedbackRequest> {
        self.lock().history.clone()
    }

    /// Continuous tone currently sounding, if any.
    pub fn tone(&self) -> Option<(u16, AlarmIntensity)> {
        self.lock().tone
    }

    pub fn indicator_on(&self) -> bool {
        self.lock().indicator_on
    }

    /// Durations of every chirp played so far.
    pub fn chirps(&self) -> Vec<u16> {
        self.lock()
            .history
            .iter()
            .filter_map(|request| match request {
                FeedbackRequest::Chirp { duration_ms } => Some(*duration_ms),
                _ => None,
            })
            .collect()
    }

    pub fn clear_history(&self) {
        self.lock().history.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FeedbackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_silences_tone() {
        let (mut sink, handle) = MockFeedback::new();
        sink.submit(FeedbackRequest::tone(1000, AlarmIntensity::new(10)))
            .unwrap();
        sink.submit(FeedbackRequest::Stop).unwrap();
        assert_eq!(handle.tone(), None);
        assert_eq!(handle.history().len(), 2);
    }

    #[test]
    fn test_chirps_are_collected() {
        let (mut sink, handle) = MockFeedback::new();
        sink.submit(FeedbackRequest::chirp(30)).unwrap();
        sink.submit(FeedbackRequest::indicator(IndicatorCommand::On))
            .unwrap();
        sink.submit(FeedbackRequest::chirp(200)).unwrap();
        assert_eq!(handle.chirps(), vec![30, 200]);
        assert!(handle.indicator_on());
    }
}
