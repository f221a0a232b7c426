//! Channel strip gain model
//!
//! A strip owns one volume and one balance and keeps the gains of its
//! routes in the backend in sync with them.

use anyhow::Result;

use super::gain::StereoGain;
use super::kind::StripKind;
use crate::ipc::{BALANCE_MAX, BALANCE_MIN, VOLUME_MAX_DB, VOLUME_MIN_DB};
use crate::routing::RoutingBackend;

/// Index of a strip inside its mixer
pub type StripId = usize;

/// Strip attribute that changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Volume,
    Balance,
}

impl Attribute {
    pub fn name(self) -> &'static str {
        match self {
            Attribute::Volume => "volume",
            Attribute::Balance => "balance",
        }
    }
}

/// Notification fired after a volume or balance change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripChange {
    pub strip: StripId,
    pub attribute: Attribute,
    pub value: f32,
}

type Listener = Box<dyn FnMut(&StripChange)>;

/// A mono or stereo source mixed onto a stereo pair of outputs
pub struct ChannelStrip {
    id: StripId,
    name: String,
    kind: StripKind,
    inputs: Vec<String>,
    outputs: Vec<String>,

    /// Current volume in dB
    volume_db: f32,

    /// Current balance (-1..1)
    balance: f32,

    listeners: Vec<Listener>,
}

impl ChannelStrip {
    /// Create a strip after checking the port counts against `kind`
    pub fn create<B: RoutingBackend + ?Sized>(
        id: StripId,
        name: impl Into<String>,
        kind: StripKind,
        inputs: Vec<String>,
        outputs: Vec<String>,
        backend: &mut B,
    ) -> Result<Self> {
        let name = name.into();
        if inputs.len() != kind.input_count() || outputs.len() != kind.output_count() {
            anyhow::bail!(
                "Strip '{}' of kind {} needs {} inputs and {} outputs, got {} and {}",
                name,
                kind,
                kind.input_count(),
                kind.output_count(),
                inputs.len(),
                outputs.len()
            );
        }
        Ok(Self::new(id, name, kind, inputs, outputs, backend))
    }

    /// Create a strip, seeding volume and balance from the backend.
    ///
    /// `inputs` and `outputs` must match the port counts of `kind`.
    pub fn new<B: RoutingBackend + ?Sized>(
        id: StripId,
        name: String,
        kind: StripKind,
        inputs: Vec<String>,
        outputs: Vec<String>,
        backend: &mut B,
    ) -> Self {
        for &(i, o) in kind.crosstalk_routes() {
            backend.set_volume(&inputs[i], &outputs[o], 0.0);
        }

        let mut strip = Self {
            id,
            name,
            kind,
            inputs,
            outputs,
            volume_db: VOLUME_MIN_DB,
            balance: 0.0,
            listeners: Vec::new(),
        };

        let existing = strip.route_gains(backend);
        (strip.volume_db, strip.balance) = existing.to_volume_balance();

        log::debug!(
            "Strip '{}' ({}): gains {:.3}/{:.3} -> volume {:.1} dB, balance {:+.2}",
            strip.name,
            strip.kind,
            existing.left,
            existing.right,
            strip.volume_db,
            strip.balance
        );

        strip
    }

    pub fn id(&self) -> StripId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> StripKind {
        self.kind
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn volume_db(&self) -> f32 {
        self.volume_db
    }

    pub fn balance(&self) -> f32 {
        self.balance
    }

    /// Side gains derived from the current volume and balance
    pub fn gains(&self) -> StereoGain {
        StereoGain::from_volume_balance(self.volume_db, self.balance)
    }

    /// Side gains as currently held by the backend.
    ///
    /// Differs from [`gains`](Self::gains) until the first change when the
    /// seeded gains lay outside the volume range.
    pub fn route_gains<B: RoutingBackend + ?Sized>(&self, backend: &B) -> StereoGain {
        let [(li, lo), (ri, ro)] = self.kind.side_routes();
        StereoGain {
            left: backend.get_volume(&self.inputs[li], &self.outputs[lo]),
            right: backend.get_volume(&self.inputs[ri], &self.outputs[ro]),
        }
    }

    /// Register a closure called after every volume or balance change
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&StripChange) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Set the volume (clamped to the dB range) and push the new gains
    pub fn set_volume<B: RoutingBackend + ?Sized>(
        &mut self,
        volume_db: f32,
        backend: &mut B,
    ) -> StripChange {
        self.volume_db = volume_db.clamp(VOLUME_MIN_DB, VOLUME_MAX_DB);
        self.apply(backend);
        self.notify(Attribute::Volume, self.volume_db)
    }

    /// Set the balance (clamped to -1..1) and push the new gains
    pub fn set_balance<B: RoutingBackend + ?Sized>(
        &mut self,
        balance: f32,
        backend: &mut B,
    ) -> StripChange {
        self.balance = balance.clamp(BALANCE_MIN, BALANCE_MAX);
        self.apply(backend);
        self.notify(Attribute::Balance, self.balance)
    }

    /// Write the side gains to the strip's routes
    pub fn apply<B: RoutingBackend + ?Sized>(&self, backend: &mut B) {
        let gains = self.gains();
        let [(li, lo), (ri, ro)] = self.kind.side_routes();
        backend.set_volume(&self.inputs[li], &self.outputs[lo], gains.left);
        backend.set_volume(&self.inputs[ri], &self.outputs[ro], gains.right);
    }

    fn notify(&mut self, attribute: Attribute, value: f32) -> StripChange {
        let change = StripChange {
            strip: self.id,
            attribute,
            value,
        };
        for listener in &mut self.listeners {
            listener(&change);
        }
        change
    }
}
