//! Inter-thread communication types for jackstrip
//!
//! Defines the control messages passed from the UI thread to the JACK
//! process callback, plus the control ranges shared by both sides.

/// Volume limits in dB
pub const VOLUME_MIN_DB: f32 = -42.0;
pub const VOLUME_MAX_DB: f32 = 6.0;
pub const VOLUME_STEP_DB: f32 = 0.5;

/// Balance limits and keyboard step
pub const BALANCE_MIN: f32 = -1.0;
pub const BALANCE_MAX: f32 = 1.0;
pub const BALANCE_STEP: f32 = 0.05;

/// Control message sent from UI thread to audio thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlMsg {
    /// Set the linear gain of one route in the gain matrix
    SetGain {
        input: usize,
        output: usize,
        gain: f32,
    },

    /// Request to quit the audio engine
    Quit,
}
