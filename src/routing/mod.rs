//! Routing backends
//!
//! A routing backend owns the per-connection gain of every
//! (input port, output port) pair. Channel strips only talk to it through
//! [`RoutingBackend`].

mod jack_backend;
mod matrix;

pub use jack_backend::JackRouting;
pub use matrix::GainMatrix;

/// Per-connection gain store the strips push their gains into
pub trait RoutingBackend {
    /// Linear gain of the route from `input` to `output` (0.0 if unset)
    fn get_volume(&self, input: &str, output: &str) -> f32;

    /// Set the linear gain of the route from `input` to `output`
    fn set_volume(&mut self, input: &str, output: &str, gain: f32);

    /// Snapshot of all explicitly set routes
    fn routes(&self) -> Vec<(String, String, f32)>;

    /// Push out updates the backend could not deliver yet
    fn flush(&mut self) {}
}
