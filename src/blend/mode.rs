use std::fmt;
use std::str::FromStr;

use crate::foundation::error::CutPasteError;

/// Compositing strategy of one output variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Paste with the binarized mask.
    None,
    /// Like `None`, then one whole-image linear motion blur.
    Motion,
    /// Paste with a Gaussian-smoothed mask.
    Gaussian,
    /// Paste with a box-smoothed mask.
    Box,
    /// In-process gradient-domain blend.
    Poisson,
    /// Gradient-domain blend delegated to an external solver process.
    PoissonFast,
    /// Random gamma applied to the foreground.
    GammaCorrection,
    /// Random mask-guided illumination change applied to the foreground.
    Illumination,
    /// Gamma + illumination on the foreground and a random mask smoothing.
    Mixed,
}

impl BlendMode {
    /// Every supported mode.
    pub const ALL: [BlendMode; 9] = [
        BlendMode::None,
        BlendMode::Motion,
        BlendMode::Gaussian,
        BlendMode::Box,
        BlendMode::Poisson,
        BlendMode::PoissonFast,
        BlendMode::GammaCorrection,
        BlendMode::Illumination,
        BlendMode::Mixed,
    ];

    /// Configuration name, also used in output file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Motion => "motion",
            Self::Gaussian => "gaussian",
            Self::Box => "box",
            Self::Poisson => "poisson",
            Self::PoissonFast => "poisson-fast",
            Self::GammaCorrection => "gamma_correction",
            Self::Illumination => "illumination",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlendMode {
    type Err = CutPasteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| CutPasteError::config(format!("could not find blending of type: {s}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/blend/mode.rs"]
mod tests;
