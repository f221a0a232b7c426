//! JACK audio engine implementation
//!
//! Registers the configured ports and mixes every input into every output
//! through a gain matrix in the JACK process callback. Gains arrive from
//! the UI thread over a lock-free ring buffer.

use anyhow::{Context, Result};
use jack::{AudioIn, AudioOut, Client, ClientOptions, Control, Port, ProcessScope};
use rtrb::{Producer, RingBuffer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::ipc::ControlMsg;

/// Minimum size of the ring buffer for control messages
const CONTROL_RING_BUFFER_MIN: usize = 256;

/// Control queue size that holds a full rewrite of the gain matrix twice
pub(crate) fn control_queue_size(inputs: usize, outputs: usize) -> usize {
    (inputs * outputs * 2).max(CONTROL_RING_BUFFER_MIN)
}

/// Audio engine that manages the JACK client
pub struct AudioEngine {
    /// JACK async client handle
    _async_client: jack::AsyncClient<Notifications, ProcessHandler>,

    /// Producer for sending control messages to audio thread
    control_producer: Producer<ControlMsg>,

    /// Flag to signal the audio thread to quit
    quit_flag: Arc<AtomicBool>,
}

impl AudioEngine {
    /// Create and start the audio engine
    pub fn new(config: &Config) -> Result<Self> {
        let (control_producer, control_consumer) =
            RingBuffer::new(control_queue_size(config.inputs.len(), config.outputs.len()));
        let quit_flag = Arc::new(AtomicBool::new(false));

        let (client, _status) = Client::new(&config.client_name, ClientOptions::NO_START_SERVER)
            .context("Failed to create JACK client. Is JACK/PipeWire running?")?;

        log::info!(
            "Created JACK client '{}' with sample rate {} Hz, buffer size {}",
            client.name(),
            client.sample_rate(),
            client.buffer_size()
        );

        let input_ports = config
            .inputs
            .iter()
            .map(|name| {
                client
                    .register_port(name, AudioIn::default())
                    .with_context(|| format!("Failed to register input port '{}'", name))
            })
            .collect::<Result<Vec<Port<AudioIn>>>>()?;

        let output_ports = config
            .outputs
            .iter()
            .map(|name| {
                client
                    .register_port(name, AudioOut::default())
                    .with_context(|| format!("Failed to register output port '{}'", name))
            })
            .collect::<Result<Vec<Port<AudioOut>>>>()?;

        log::info!(
            "Registered {} input ports and {} output ports",
            input_ports.len(),
            output_ports.len()
        );

        let gains = vec![0.0; input_ports.len() * output_ports.len()];
        let process_handler = ProcessHandler {
            input_ports,
            output_ports,
            gains,
            control_consumer,
            quit_flag: quit_flag.clone(),
        };

        let async_client = client
            .activate_async(Notifications, process_handler)
            .context("Failed to activate JACK client")?;

        log::info!("JACK client activated");

        Ok(Self {
            _async_client: async_client,
            control_producer,
            quit_flag,
        })
    }

    /// Send a control message to the audio thread
    pub fn send_control(&mut self, msg: ControlMsg) -> Result<()> {
        self.control_producer
            .push(msg)
            .map_err(|_| anyhow::anyhow!("Control message queue full"))
    }

    /// Request the audio engine to quit
    pub fn quit(&mut self) {
        if !self.quit_flag.swap(true, Ordering::SeqCst) {
            let _ = self.send_control(ControlMsg::Quit);
        }
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.quit();
    }
}

/// JACK notification handler
struct Notifications;

impl jack::NotificationHandler for Notifications {
    unsafe fn shutdown(&mut self, _status: jack::ClientStatus, reason: &str) {
        log::error!("JACK client shutdown: {}", reason);
    }

    fn sample_rate(&mut self, _: &Client, srate: jack::Frames) -> Control {
        log::info!("Sample rate changed to {}", srate);
        Control::Continue
    }

    fn xrun(&mut self, _: &Client) -> Control {
        // Silently ignore xruns to avoid garbling the TUI
        Control::Continue
    }
}

/// JACK process handler - runs in the real-time audio thread
struct ProcessHandler {
    input_ports: Vec<Port<AudioIn>>,
    output_ports: Vec<Port<AudioOut>>,

    /// Row-major gain matrix: `gains[input * outputs + output]`
    gains: Vec<f32>,

    /// Consumer for receiving control messages from UI
    control_consumer: rtrb::Consumer<ControlMsg>,

    /// Quit flag reference
    quit_flag: Arc<AtomicBool>,
}

impl ProcessHandler {
    /// Apply pending control messages from the UI
    fn process_control_messages(&mut self) {
        let outputs = self.output_ports.len();
        while let Ok(msg) = self.control_consumer.pop() {
            match msg {
                ControlMsg::SetGain {
                    input,
                    output,
                    gain,
                } => {
                    if input < self.input_ports.len() && output < outputs {
                        self.gains[input * outputs + output] = gain;
                    }
                }
                ControlMsg::Quit => {
                    self.quit_flag.store(true, Ordering::SeqCst);
                }
            }
        }
    }
}

impl jack::ProcessHandler for ProcessHandler {
    fn process(&mut self, _: &Client, ps: &ProcessScope) -> Control {
        self.process_control_messages();

        if self.quit_flag.load(Ordering::Relaxed) {
            return Control::Quit;
        }

        let outputs = self.output_ports.len();
        for (out_idx, port) in self.output_ports.iter_mut().enumerate() {
            let out = port.as_mut_slice(ps);
            out.fill(0.0);

            for (in_idx, in_port) in self.input_ports.iter().enumerate() {
                let gain = self.gains[in_idx * outputs + out_idx];
                if gain == 0.0 {
                    continue;
                }
                let in_samples = in_port.as_slice(ps);
                for (out_s, in_s) in out.iter_mut().zip(in_samples.iter()) {
                    *out_s += in_s * gain;
                }
            }
        }

        Control::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_queue_size() {
        assert_eq!(control_queue_size(3, 2), CONTROL_RING_BUFFER_MIN);
        assert_eq!(control_queue_size(32, 16), 1024);
    }
}
