//! JACK-backed routing
//!
//! Keeps a UI-side mirror of the gain matrix and forwards every change to
//! the real-time thread of the [`AudioEngine`]. Updates that do not fit in
//! the control queue are remembered and sent again on the next write or
//! UI tick.

use std::collections::{BTreeSet, HashMap};

use anyhow::Result;

use super::{GainMatrix, RoutingBackend};
use crate::audio::AudioEngine;
use crate::config::Config;
use crate::ipc::ControlMsg;

/// Mirror of the RT gain matrix plus the routes still owed to it
pub(crate) struct GainForwarder {
    /// Last gain set for every route
    mirror: GainMatrix,

    /// Input port name -> port index
    input_index: HashMap<String, usize>,

    /// Output port name -> port index
    output_index: HashMap<String, usize>,

    /// Names of routes whose last update did not reach the RT thread
    pending: BTreeSet<(String, String)>,
}

impl GainForwarder {
    pub(crate) fn new(inputs: &[String], outputs: &[String]) -> Self {
        let index = |names: &[String]| {
            names
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), i))
                .collect()
        };
        Self {
            mirror: GainMatrix::new(),
            input_index: index(inputs),
            output_index: index(outputs),
            pending: BTreeSet::new(),
        }
    }

    /// Port indices of a route, if both ports are registered
    pub(crate) fn resolve(&self, input: &str, output: &str) -> Option<(usize, usize)> {
        Some((
            *self.input_index.get(input)?,
            *self.output_index.get(output)?,
        ))
    }

    pub(crate) fn mirror(&self) -> &GainMatrix {
        &self.mirror
    }

    /// Number of routes waiting to be resent
    pub(crate) fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Record a gain and forward it through `send`
    pub(crate) fn set<F>(&mut self, input: &str, output: &str, gain: f32, send: &mut F)
    where
        F: FnMut(ControlMsg) -> Result<()>,
    {
        self.mirror.set_volume(input, output, gain);

        if self.resolve(input, output).is_none() {
            log::warn!("No JACK route '{}' -> '{}', gain kept locally", input, output);
            return;
        }

        self.pending.insert((input.to_string(), output.to_string()));
        self.flush(send);
    }

    /// Resend every pending route, stopping at the first full queue
    pub(crate) fn flush<F>(&mut self, send: &mut F)
    where
        F: FnMut(ControlMsg) -> Result<()>,
    {
        while let Some(route) = self.pending.first().cloned() {
            let (input, output) = &route;
            let Some((input_idx, output_idx)) = self.resolve(input, output) else {
                self.pending.remove(&route);
                continue;
            };
            let msg = ControlMsg::SetGain {
                input: input_idx,
                output: output_idx,
                gain: self.mirror.get_volume(input, output),
            };
            if let Err(e) = send(msg) {
                log::warn!(
                    "Deferred {} gain update(s), first '{}' -> '{}': {}",
                    self.pending.len(),
                    input,
                    output,
                    e
                );
                return;
            }
            self.pending.remove(&route);
        }
    }
}

/// Routing backend driving a live JACK gain matrix
pub struct JackRouting {
    /// Running JACK client
    engine: AudioEngine,

    forwarder: GainForwarder,
}

impl JackRouting {
    /// Start the JACK client and push the persisted gains to it
    pub fn new(config: &Config) -> Result<Self> {
        let engine = AudioEngine::new(config)?;

        let mut routing = Self {
            engine,
            forwarder: GainForwarder::new(&config.inputs, &config.outputs),
        };

        for route in &config.gains {
            routing.set_volume(&route.input, &route.output, route.gain);
        }

        Ok(routing)
    }

    /// Stop the audio engine
    pub fn quit(&mut self) {
        self.engine.quit();
    }
}

impl RoutingBackend for JackRouting {
    fn get_volume(&self, input: &str, output: &str) -> f32 {
        self.forwarder.mirror().get_volume(input, output)
    }

    fn set_volume(&mut self, input: &str, output: &str, gain: f32) {
        let engine = &mut self.engine;
        self.forwarder
            .set(input, output, gain, &mut |msg| engine.send_control(msg));
    }

    fn routes(&self) -> Vec<(String, String, f32)> {
        self.forwarder.mirror().routes()
    }

    fn flush(&mut self) {
        if self.forwarder.pending() > 0 {
            let engine = &mut self.engine;
            self.forwarder.flush(&mut |msg| engine.send_control(msg));
        }
    }
}
