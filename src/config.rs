//! Configuration module for jackstrip
//!
//! Handles loading and saving the YAML configuration that defines the JACK
//! client name, the ports to register, the channel strips laid over them
//! and the persisted route gains.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::strip::StripKind;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// The JACK client name (e.g., "Strips")
    pub client_name: String,

    /// Input port names, registered in this order
    pub inputs: Vec<String>,

    /// Output port names, registered in this order
    pub outputs: Vec<String>,

    /// Channel strips shown in the mixer
    pub strips: Vec<StripConfig>,

    /// Persisted route gains (written back on exit)
    #[serde(default)]
    pub gains: Vec<RouteGain>,

    /// Path to the config file (not serialized)
    #[serde(skip)]
    pub config_path: Option<String>,
}

/// Configuration for a single channel strip
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripConfig {
    /// Display name for the strip
    pub name: String,

    /// Input ports. One for a mono source, two for a stereo source
    pub inputs: Vec<String>,

    /// Output ports (always two: left, right)
    pub outputs: Vec<String>,

    /// Name of a strip whose volume this one follows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follows: Option<String>,
}

impl StripConfig {
    /// The strip kind implied by the port counts
    pub fn kind(&self) -> Option<StripKind> {
        StripKind::can_create(self.inputs.len(), self.outputs.len())
    }
}

/// Linear gain of one route
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RouteGain {
    pub input: String,
    pub output: String,
    pub gain: f32,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.config_path = Some(path.to_string_lossy().to_string());
        Ok(config)
    }

    /// Parse and validate configuration from YAML text
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save(&self) -> Result<()> {
        if let Some(ref path) = self.config_path {
            let contents = serde_yaml::to_string(self).context("Failed to serialize config")?;
            fs::write(path, contents)
                .with_context(|| format!("Failed to write config file: {}", path))?;
        }
        Ok(())
    }

    /// Replace the persisted gains with a backend snapshot
    pub fn update_gains(&mut self, routes: Vec<(String, String, f32)>) {
        self.gains = routes
            .into_iter()
            .map(|(input, output, gain)| RouteGain {
                input,
                output,
                gain,
            })
            .collect();
    }

    /// Rewrite the `follows` entries from a `(strip, master)` snapshot
    pub fn update_links(&mut self, links: Vec<(String, Option<String>)>) {
        for (name, master) in links {
            if let Some(strip) = self.strips.iter_mut().find(|s| s.name == name) {
                strip.follows = master;
            }
        }
    }

    /// Persisted gains as backend routes
    pub fn routes(&self) -> Vec<(String, String, f32)> {
        self.gains
            .iter()
            .map(|r| (r.input.clone(), r.output.clone(), r.gain))
            .collect()
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.client_name.is_empty() {
            anyhow::bail!("client_name cannot be empty");
        }

        if self.inputs.is_empty() {
            anyhow::bail!("At least one input port is required");
        }

        if self.outputs.is_empty() {
            anyhow::bail!("At least one output port is required");
        }

        if self.strips.is_empty() {
            anyhow::bail!("At least one strip is required");
        }

        let inputs: HashSet<&str> = self.inputs.iter().map(String::as_str).collect();
        let outputs: HashSet<&str> = self.outputs.iter().map(String::as_str).collect();

        if inputs.len() != self.inputs.len() {
            anyhow::bail!("Input port names must be unique");
        }
        if outputs.len() != self.outputs.len() {
            anyhow::bail!("Output port names must be unique");
        }

        let mut names = HashSet::new();
        for (i, strip) in self.strips.iter().enumerate() {
            if strip.name.is_empty() {
                anyhow::bail!("Strip {} has empty name", i);
            }
            if !names.insert(strip.name.as_str()) {
                anyhow::bail!("Duplicate strip name '{}'", strip.name);
            }
            if strip.kind().is_none() {
                anyhow::bail!(
                    "Strip '{}' has {} inputs and {} outputs, expected 1 or 2 inputs and 2 outputs",
                    strip.name,
                    strip.inputs.len(),
                    strip.outputs.len()
                );
            }
            for port in &strip.inputs {
                if !inputs.contains(port.as_str()) {
                    anyhow::bail!("Strip '{}' uses unknown input port '{}'", strip.name, port);
                }
            }
            for port in &strip.outputs {
                if !outputs.contains(port.as_str()) {
                    anyhow::bail!("Strip '{}' uses unknown output port '{}'", strip.name, port);
                }
            }
        }

        for strip in &self.strips {
            if let Some(ref master) = strip.follows {
                if master == &strip.name {
                    anyhow::bail!("Strip '{}' cannot follow itself", strip.name);
                }
                if !names.contains(master.as_str()) {
                    anyhow::bail!("Strip '{}' follows unknown strip '{}'", strip.name, master);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
client_name: "Strips"
inputs: ["mic", "music_l", "music_r"]
outputs: ["main_l", "main_r"]
strips:
  - name: "Mic"
    inputs: ["mic"]
    outputs: ["main_l", "main_r"]
  - name: "Music"
    inputs: ["music_l", "music_r"]
    outputs: ["main_l", "main_r"]
    follows: "Mic"
gains:
  - { input: "mic", output: "main_l", gain: 0.5 }
"#;

    #[test]
    fn test_parse_config() {
        let config = Config::parse(YAML).unwrap();
        assert_eq!(config.client_name, "Strips");
        assert_eq!(config.inputs.len(), 3);
        assert_eq!(config.strips.len(), 2);
        assert_eq!(config.strips[0].kind(), Some(StripKind::MonoToStereo));
        assert_eq!(config.strips[1].kind(), Some(StripKind::StereoToStereo));
        assert_eq!(config.strips[1].follows.as_deref(), Some("Mic"));
        assert_eq!(
            config.routes(),
            vec![("mic".to_string(), "main_l".to_string(), 0.5)]
        );
    }

    #[test]
    fn test_gains_default_empty() {
        let yaml = r#"
client_name: "Strips"
inputs: ["mic"]
outputs: ["l", "r"]
strips:
  - name: "Mic"
    inputs: ["mic"]
    outputs: ["l", "r"]
"#;
        let config = Config::parse(yaml).unwrap();
        assert!(config.gains.is_empty());
    }

    #[test]
    fn test_reject_wrong_port_count() {
        let yaml = r#"
client_name: "Strips"
inputs: ["a", "b", "c"]
outputs: ["l", "r"]
strips:
  - name: "Wide"
    inputs: ["a", "b", "c"]
    outputs: ["l", "r"]
"#;
        assert!(Config::parse(yaml).is_err());
    }

    #[test]
    fn test_reject_unknown_port() {
        let yaml = r#"
client_name: "Strips"
inputs: ["mic"]
outputs: ["l", "r"]
strips:
  - name: "Mic"
    inputs: ["guitar"]
    outputs: ["l", "r"]
"#;
        let err = Config::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("guitar"));
    }

    #[test]
    fn test_reject_bad_follow() {
        let yaml = r#"
client_name: "Strips"
inputs: ["mic"]
outputs: ["l", "r"]
strips:
  - name: "Mic"
    inputs: ["mic"]
    outputs: ["l", "r"]
    follows: "Mic"
"#;
        assert!(Config::parse(yaml).is_err());
    }

    #[test]
    fn test_example_config_is_valid() {
        let config = Config::parse(include_str!("../strips.example.yaml")).unwrap();
        assert_eq!(config.strips.len(), 3);
        assert_eq!(config.gains.len(), 4);
    }

    #[test]
    fn test_update_gains() {
        let mut config = Config::parse(YAML).unwrap();
        config.update_gains(vec![("music_l".into(), "main_l".into(), 0.25)]);
        assert_eq!(
            config.gains,
            vec![RouteGain {
                input: "music_l".into(),
                output: "main_l".into(),
                gain: 0.25,
            }]
        );
    }

    #[test]
    fn test_update_links() {
        let mut config = Config::parse(YAML).unwrap();
        config.update_links(vec![
            ("Mic".into(), Some("Music".into())),
            ("Music".into(), None),
            ("Ghost".into(), Some("Mic".into())),
        ]);
        assert_eq!(config.strips[0].follows.as_deref(), Some("Music"));
        assert_eq!(config.strips[1].follows, None);

        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(!yaml.contains("Ghost"));
        let reparsed = Config::parse(&yaml).unwrap();
        assert_eq!(reparsed.strips[0].follows.as_deref(), Some("Music"));
        assert_eq!(reparsed.strips[1].follows, None);
    }
}
