//! Square sample buffer sizes

use serde::{Deserialize, Serialize};
use sightline_core::Error;
use std::fmt;

/// Edge length of the square image each probe is rendered into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SampleResolution {
    R32,
    R64,
    R128,
    R256,
    #[default]
    R512,
    R1024,
    R2048,
}

impl SampleResolution {
    pub const ALL: [SampleResolution; 7] = [
        SampleResolution::R32,
        SampleResolution::R64,
        SampleResolution::R128,
        SampleResolution::R256,
        SampleResolution::R512,
        SampleResolution::R1024,
        SampleResolution::R2048,
    ];

    pub fn pixels(self) -> u32 {
        match self {
            SampleResolution::R32 => 32,
            SampleResolution::R64 => 64,
            SampleResolution::R128 => 128,
            SampleResolution::R256 => 256,
            SampleResolution::R512 => 512,
            SampleResolution::R1024 => 1024,
            SampleResolution::R2048 => 2048,
        }
    }
}

impl TryFrom<u32> for SampleResolution {
    type Error = Error;

    fn try_from(pixels: u32) -> Result<Self, Self::Error> {
        SampleResolution::ALL
            .into_iter()
            .find(|r| r.pixels() == pixels)
            .ok_or_else(|| {
                Error::InvalidData(format!(
                    "Unsupported sample resolution {}; expected a power of two from 32 to 2048",
                    pixels
                ))
            })
    }
}

impl From<SampleResolution> for u32 {
    fn from(resolution: SampleResolution) -> Self {
        resolution.pixels()
    }
}

impl fmt::Display for SampleResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.pixels(), self.pixels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_values() {
        assert_eq!(SampleResolution::default().pixels(), 512);
        assert_eq!(SampleResolution::try_from(128).unwrap(), SampleResolution::R128);
        assert!(SampleResolution::try_from(100).is_err());
        assert_eq!(SampleResolution::R64.to_string(), "64x64");
        assert!(SampleResolution::ALL.windows(2).all(|w| w[0] < w[1]));
    }
}
