//! Strip variants and the factory lookup

use std::fmt;
use std::str::FromStr;

/// Channel-count mapping of a strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StripKind {
    /// One input fanned out to two outputs
    MonoToStereo,

    /// Two inputs, each routed to its own output
    StereoToStereo,
}

impl StripKind {
    /// Every kind the factory can build
    pub fn all() -> &'static [StripKind] {
        &[StripKind::MonoToStereo, StripKind::StereoToStereo]
    }

    /// The kind that handles `inputs` x `outputs` ports, if any
    pub fn can_create(inputs: usize, outputs: usize) -> Option<StripKind> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.input_count() == inputs && kind.output_count() == outputs)
    }

    pub fn input_count(self) -> usize {
        match self {
            StripKind::MonoToStereo => 1,
            StripKind::StereoToStereo => 2,
        }
    }

    pub fn output_count(self) -> usize {
        2
    }

    /// Name used in configuration and logs
    pub fn name(self) -> &'static str {
        match self {
            StripKind::MonoToStereo => "mono2stereo",
            StripKind::StereoToStereo => "stereo2stereo",
        }
    }

    /// Index pairs (input, output) of the left and right routes
    pub(crate) fn side_routes(self) -> [(usize, usize); 2] {
        match self {
            StripKind::MonoToStereo => [(0, 0), (0, 1)],
            StripKind::StereoToStereo => [(0, 0), (1, 1)],
        }
    }

    /// Index pairs of routes that must stay silent
    pub(crate) fn crosstalk_routes(self) -> &'static [(usize, usize)] {
        match self {
            StripKind::MonoToStereo => &[],
            StripKind::StereoToStereo => &[(0, 1), (1, 0)],
        }
    }
}

impl fmt::Display for StripKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StripKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown strip kind '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_create() {
        assert_eq!(StripKind::can_create(1, 2), Some(StripKind::MonoToStereo));
        assert_eq!(StripKind::can_create(2, 2), Some(StripKind::StereoToStereo));
        assert_eq!(StripKind::can_create(1, 1), None);
        assert_eq!(StripKind::can_create(2, 1), None);
        assert_eq!(StripKind::can_create(3, 2), None);
    }

    #[test]
    fn test_parse_names() {
        for kind in StripKind::all() {
            assert_eq!(kind.name().parse::<StripKind>().unwrap(), *kind);
        }
        assert!("surround".parse::<StripKind>().is_err());
    }
}
