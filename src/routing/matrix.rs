//! In-memory gain matrix

use std::collections::BTreeMap;

use super::RoutingBackend;

/// Gain matrix keyed by (input, output) port name.
///
/// Used directly for `--dry-run` and tests, and as the UI-side mirror of
/// the JACK backend.
#[derive(Debug, Clone, Default)]
pub struct GainMatrix {
    gains: BTreeMap<(String, String), f32>,
}

impl GainMatrix {
    /// Create an empty matrix
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a matrix seeded with persisted routes
    pub fn with_routes<I>(routes: I) -> Self
    where
        I: IntoIterator<Item = (String, String, f32)>,
    {
        let gains = routes
            .into_iter()
            .map(|(input, output, gain)| ((input, output), gain))
            .collect();
        Self { gains }
    }

    /// Number of explicitly set routes
    pub fn len(&self) -> usize {
        self.gains.len()
    }
}

impl RoutingBackend for GainMatrix {
    fn get_volume(&self, input: &str, output: &str) -> f32 {
        self.gains
            .get(&(input.to_string(), output.to_string()))
            .copied()
            .unwrap_or(0.0)
    }

    fn set_volume(&mut self, input: &str, output: &str, gain: f32) {
        self.gains
            .insert((input.to_string(), output.to_string()), gain);
    }

    fn routes(&self) -> Vec<(String, String, f32)> {
        self.gains
            .iter()
            .map(|((input, output), gain)| (input.clone(), output.clone(), *gain))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_route_is_silent() {
        let m = GainMatrix::new();
        assert_eq!(m.get_volume("in", "out"), 0.0);
        assert_eq!(m.len(), 0);
    }

    #[test]
    fn test_set_and_snapshot() {
        let mut m = GainMatrix::with_routes(vec![("a".into(), "x".into(), 0.5)]);
        m.set_volume("b", "y", 0.25);
        m.set_volume("a", "x", 1.0);
        assert_eq!(m.get_volume("a", "x"), 1.0);
        assert_eq!(m.get_volume("x", "a"), 0.0);
        assert_eq!(
            m.routes(),
            vec![
                ("a".to_string(), "x".to_string(), 1.0),
                ("b".to_string(), "y".to_string(), 0.25),
            ]
        );
    }
}
