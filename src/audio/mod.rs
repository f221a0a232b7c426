//! Audio engine module for jackstrip
//!
//! Handles JACK client registration, port creation and the real-time
//! gain-matrix mix.

mod engine;

pub use engine::AudioEngine;
