//! Mixer: the set of channel strips laid over one routing backend
//!
//! Besides forwarding volume/balance changes to the strips, the mixer keeps
//! the strip selection and the master/slave volume links between strips.

use std::collections::BTreeSet;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::routing::RoutingBackend;
use crate::strip::{Attribute, ChannelStrip, StripChange, StripId, StripKind};

/// Collection of strips sharing one backend
pub struct Mixer<B> {
    backend: B,
    strips: Vec<ChannelStrip>,

    /// Master of each strip's volume, indexed by strip id
    masters: Vec<Option<StripId>>,

    /// Strips marked with "select"
    selected: BTreeSet<StripId>,
}

impl<B: RoutingBackend> Mixer<B> {
    /// Create an empty mixer
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            strips: Vec::new(),
            masters: Vec::new(),
            selected: BTreeSet::new(),
        }
    }

    /// Build the strips and links described by the configuration.
    ///
    /// Restored links keep every strip at the volume seeded from the
    /// backend; followers move only on the next change of their master.
    pub fn from_config(config: &Config, backend: B) -> Result<Self> {
        let mut mixer = Self::new(backend);

        for strip in &config.strips {
            let kind = strip.kind().with_context(|| {
                format!("Strip '{}' has an unsupported port layout", strip.name)
            })?;
            mixer.add_strip(&strip.name, kind, strip.inputs.clone(), strip.outputs.clone())?;
        }

        for strip in &config.strips {
            if let Some(ref master) = strip.follows {
                let slave = mixer.find(&strip.name).context("Strip vanished")?;
                let master = mixer
                    .find(master)
                    .with_context(|| format!("Unknown master strip '{}'", master))?;
                mixer.attach(master, slave, false)?;
            }
        }

        log::info!("Mixer ready with {} strips", mixer.strips.len());
        Ok(mixer)
    }

    /// Create a strip over the given ports and return its id
    pub fn add_strip(
        &mut self,
        name: &str,
        kind: StripKind,
        inputs: Vec<String>,
        outputs: Vec<String>,
    ) -> Result<StripId> {
        let id = self.strips.len();
        let strip = ChannelStrip::create(id, name, kind, inputs, outputs, &mut self.backend)?;
        log::debug!(
            "Added strip '{}': {:?} -> {:?}",
            strip.name(),
            strip.inputs(),
            strip.outputs()
        );
        self.strips.push(strip);
        self.masters.push(None);
        Ok(id)
    }

    pub fn strips(&self) -> &[ChannelStrip] {
        &self.strips
    }

    pub fn strip(&self, id: StripId) -> Option<&ChannelStrip> {
        self.strips.get(id)
    }

    /// Look up a strip id by name
    pub fn find(&self, name: &str) -> Option<StripId> {
        self.strips.iter().position(|s| s.name() == name)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Tear down the mixer, keeping the backend
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Register a change listener on one strip
    pub fn subscribe<F>(&mut self, id: StripId, listener: F)
    where
        F: FnMut(&StripChange) + 'static,
    {
        if let Some(strip) = self.strips.get_mut(id) {
            strip.subscribe(listener);
        }
    }

    /// Set a strip's volume and carry it to every strip linked to it.
    ///
    /// Returns the changes in the order they were applied.
    pub fn set_volume(&mut self, id: StripId, volume_db: f32) -> Vec<StripChange> {
        let mut changes = Vec::new();
        let Some(strip) = self.strips.get_mut(id) else {
            return changes;
        };
        changes.push(strip.set_volume(volume_db, &mut self.backend));

        let mut pending = vec![id];
        while let Some(master) = pending.pop() {
            let volume = self.strips[master].volume_db();
            for slave in self.slaves_of(master) {
                changes.push(self.strips[slave].set_volume(volume, &mut self.backend));
                pending.push(slave);
            }
        }
        changes
    }

    /// Set a strip's balance
    pub fn set_balance(&mut self, id: StripId, balance: f32) -> Option<StripChange> {
        let strip = self.strips.get_mut(id)?;
        Some(strip.set_balance(balance, &mut self.backend))
    }

    /// Nudge a strip's volume by `delta_db`
    pub fn adjust_volume(&mut self, id: StripId, delta_db: f32) -> Vec<StripChange> {
        match self.strips.get(id) {
            Some(strip) => {
                let target = strip.volume_db() + delta_db;
                self.set_volume(id, target)
            }
            None => Vec::new(),
        }
    }

    /// Nudge a strip's balance by `delta`
    pub fn adjust_balance(&mut self, id: StripId, delta: f32) -> Option<StripChange> {
        let target = self.strips.get(id)?.balance() + delta;
        self.set_balance(id, target)
    }

    /// Make `slave`'s volume follow `master`'s volume, syncing it at once
    pub fn link(&mut self, master: StripId, slave: StripId) -> Result<()> {
        self.attach(master, slave, true)
    }

    fn attach(&mut self, master: StripId, slave: StripId, sync: bool) -> Result<()> {
        if master >= self.strips.len() || slave >= self.strips.len() {
            anyhow::bail!("Cannot link unknown strips {} -> {}", master, slave);
        }
        if master == slave {
            anyhow::bail!("Strip '{}' cannot follow itself", self.strips[slave].name());
        }

        let mut cursor = Some(master);
        while let Some(current) = cursor {
            if current == slave {
                anyhow::bail!(
                    "Linking '{}' to '{}' would create a cycle",
                    self.strips[slave].name(),
                    self.strips[master].name()
                );
            }
            cursor = self.masters[current];
        }

        log::debug!(
            "Strip '{}' now follows '{}' on {}",
            self.strips[slave].name(),
            self.strips[master].name(),
            Attribute::Volume.name()
        );
        self.masters[slave] = Some(master);

        if sync {
            let volume = self.strips[master].volume_db();
            self.set_volume(slave, volume);
        }
        Ok(())
    }

    /// Detach a strip from its master, returning the former master
    pub fn unlink(&mut self, slave: StripId) -> Option<StripId> {
        let master = self.masters.get_mut(slave)?.take();
        if let Some(master) = master {
            log::debug!(
                "Strip '{}' no longer follows '{}'",
                self.strips[slave].name(),
                self.strips[master].name()
            );
        }
        master
    }

    pub fn master_of(&self, id: StripId) -> Option<StripId> {
        self.masters.get(id).copied().flatten()
    }

    /// Every strip name paired with the name of its master, if any
    pub fn links(&self) -> Vec<(String, Option<String>)> {
        self.strips
            .iter()
            .zip(&self.masters)
            .map(|(strip, master)| {
                let master = master.map(|m| self.strips[m].name().to_string());
                (strip.name().to_string(), master)
            })
            .collect()
    }

    /// Strips directly following `master`
    pub fn slaves_of(&self, master: StripId) -> Vec<StripId> {
        self.masters
            .iter()
            .enumerate()
            .filter(|(_, m)| **m == Some(master))
            .map(|(id, _)| id)
            .collect()
    }

    /// Toggle the selection mark of a strip, returning the new state
    pub fn toggle_selected(&mut self, id: StripId) -> bool {
        if id >= self.strips.len() {
            return false;
        }
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    pub fn is_selected(&self, id: StripId) -> bool {
        self.selected.contains(&id)
    }

    /// Selected strip ids in ascending order
    pub fn selected(&self) -> Vec<StripId> {
        self.selected.iter().copied().collect()
    }

    /// Clear the selection
    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::ipc::VOLUME_MIN_DB;
    use crate::routing::GainMatrix;
    use crate::strip::gain::db_to_amplitude;

    const YAML: &str = r#"
client_name: "Strips"
inputs: ["mic", "music_l", "music_r", "fx"]
outputs: ["main_l", "main_r"]
strips:
  - name: "Mic"
    inputs: ["mic"]
    outputs: ["main_l", "main_r"]
  - name: "Music"
    inputs: ["music_l", "music_r"]
    outputs: ["main_l", "main_r"]
    follows: "Mic"
  - name: "Fx"
    inputs: ["fx"]
    outputs: ["main_l", "main_r"]
    follows: "Music"
gains:
  - { input: "mic", output: "main_l", gain: 1.0 }
  - { input: "mic", output: "main_r", gain: 0.5 }
"#;

    fn mixer() -> Mixer<GainMatrix> {
        let config = Config::parse(YAML).unwrap();
        let backend = GainMatrix::with_routes(config.routes());
        Mixer::from_config(&config, backend).unwrap()
    }

    #[test]
    fn test_from_config_seeds_strips() {
        let m = mixer();
        assert_eq!(m.strips().len(), 3);
        let mic = m.strip(0).unwrap();
        assert!(mic.volume_db().abs() < 1e-4);
        assert!((mic.balance() + 0.5).abs() < 1e-4);
        assert_eq!(m.master_of(1), Some(0));
        assert_eq!(m.master_of(2), Some(1));
        assert_eq!(m.find("Fx"), Some(2));
    }

    #[test]
    fn test_restored_links_keep_seeded_volume() {
        let mut m = mixer();
        // Music and Fx have no stored gains and are not pulled up to Mic
        assert_eq!(m.strip(1).unwrap().volume_db(), VOLUME_MIN_DB);
        assert_eq!(m.strip(2).unwrap().volume_db(), VOLUME_MIN_DB);
        assert_eq!(m.backend().get_volume("fx", "main_l"), 0.0);

        // Linking at runtime syncs the slave right away
        m.unlink(2);
        m.link(0, 2).unwrap();
        assert!(m.strip(2).unwrap().volume_db().abs() < 1e-4);
    }

    /// Serialise the mixer state the way the app does on exit and rebuild
    fn reload(m: &Mixer<GainMatrix>) -> Mixer<GainMatrix> {
        let mut config = Config::parse(YAML).unwrap();
        config.update_gains(m.backend().routes());
        config.update_links(m.links());
        let yaml = serde_yaml::to_string(&config).unwrap();

        let config = Config::parse(&yaml).unwrap();
        let backend = GainMatrix::with_routes(config.routes());
        Mixer::from_config(&config, backend).unwrap()
    }

    #[test]
    fn test_unlinked_volume_survives_reload() {
        let mut m = mixer();
        m.unlink(2);
        m.set_volume(2, -20.0);
        assert_eq!(m.master_of(2), None);

        let m = reload(&m);
        assert!((m.strip(2).unwrap().volume_db() + 20.0).abs() < 1e-3);
        assert_eq!(m.master_of(2), None);
        assert_eq!(m.master_of(1), Some(0));
    }

    #[test]
    fn test_slave_volume_survives_reload() {
        let mut m = mixer();
        m.set_volume(0, -6.0);
        m.set_volume(2, -15.0);

        let m = reload(&m);
        assert!((m.strip(0).unwrap().volume_db() + 6.0).abs() < 1e-3);
        assert!((m.strip(1).unwrap().volume_db() + 6.0).abs() < 1e-3);
        assert!((m.strip(2).unwrap().volume_db() + 15.0).abs() < 1e-3);
        assert_eq!(m.master_of(2), Some(1));
    }

    #[test]
    fn test_links_snapshot() {
        let mut m = mixer();
        m.unlink(1);
        assert_eq!(
            m.links(),
            vec![
                ("Mic".to_string(), None),
                ("Music".to_string(), None),
                ("Fx".to_string(), Some("Music".to_string())),
            ]
        );
    }

    #[test]
    fn test_volume_propagates_through_chain() {
        let mut m = mixer();
        let changes = m.set_volume(0, -12.0);
        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].strip, 0);
        for strip in m.strips() {
            assert_eq!(strip.volume_db(), -12.0);
        }
        let expected = db_to_amplitude(-12.0);
        assert!((m.backend().get_volume("fx", "main_l") - expected).abs() < 1e-5);
    }

    #[test]
    fn test_slave_change_does_not_move_master() {
        let mut m = mixer();
        let changes = m.set_volume(1, -20.0);
        assert_eq!(changes.len(), 2);
        assert!(m.strip(0).unwrap().volume_db().abs() < 1e-4);
        assert_eq!(m.strip(2).unwrap().volume_db(), -20.0);
    }

    #[test]
    fn test_balance_not_linked() {
        let mut m = mixer();
        m.set_balance(0, 0.3);
        assert_eq!(m.strip(1).unwrap().balance(), 0.0);
    }

    #[test]
    fn test_link_rejects_cycles() {
        let mut m = mixer();
        assert!(m.link(2, 0).is_err());
        assert!(m.link(1, 1).is_err());
        assert!(m.link(0, 9).is_err());
    }

    #[test]
    fn test_unlink() {
        let mut m = mixer();
        assert_eq!(m.unlink(1), Some(0));
        assert_eq!(m.unlink(1), None);
        m.set_volume(0, -30.0);
        assert_eq!(m.strip(1).unwrap().volume_db(), VOLUME_MIN_DB);
        assert!(m.link(2, 0).is_ok());
    }

    #[test]
    fn test_selection() {
        let mut m = mixer();
        assert!(m.toggle_selected(2));
        assert!(m.toggle_selected(0));
        assert_eq!(m.selected(), vec![0, 2]);
        assert!(!m.toggle_selected(2));
        assert!(!m.toggle_selected(7));
        assert!(m.is_selected(0));
        m.clear_selection();
        assert!(m.selected().is_empty());
    }

    #[test]
    fn test_adjust_and_subscribe() {
        let mut m = mixer();
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        m.subscribe(2, move |_| counter.set(counter.get() + 1));

        m.adjust_volume(0, -1.5);
        assert_eq!(count.get(), 1);
        m.adjust_balance(2, -0.25);
        assert_eq!(count.get(), 2);
        assert_eq!(m.strip(2).unwrap().balance(), -0.25);
    }

    #[test]
    fn test_add_strip_rejects_bad_layout() {
        let mut m = Mixer::new(GainMatrix::new());
        let err = m.add_strip(
            "Bad",
            StripKind::MonoToStereo,
            vec!["a".into(), "b".into()],
            vec!["l".into(), "r".into()],
        );
        assert!(err.is_err());
        assert!(m.strips().is_empty());
    }
}
