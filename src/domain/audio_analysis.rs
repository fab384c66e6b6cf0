use std::fmt;
use std::str::FromStr;

/// Signal measurements taken from the raw audio track before filtering.
///
/// Produced once per source file and never mutated; the filter planner
/// derives the whole processing chain from these numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAnalysis {
    /// Mean loudness over the whole track, dBFS.
    pub mean_volume_db: f64,
    /// Peak loudness, dBFS.
    pub max_volume_db: f64,
    /// Estimated noise floor, dBFS.
    pub noise_floor_db: f64,
    /// Fraction of samples sitting at full scale, 0..1.
    pub clipping_ratio: f64,
    /// Fraction of the track detected as silence, 0..1.
    pub silence_ratio: f64,
    /// Energy in the sub-120 Hz band relative to the whole signal, 0..1.
    pub low_band_energy: f64,
    /// Energy in the 5-9 kHz sibilant band relative to the whole signal, 0..1.
    pub sibilant_band_energy: f64,
    pub issues: Vec<AudioIssue>,
}

impl AudioAnalysis {
    /// Peak-to-floor span, the planner's input for compression strength.
    pub fn dynamic_range_db(&self) -> f64 {
        self.max_volume_db - self.noise_floor_db
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioIssue {
    LowVolume,
    Clipping,
    NoisyBackground,
    LongSilences,
    Sibilance,
    Rumble,
}

impl AudioIssue {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioIssue::LowVolume => "low_volume",
            AudioIssue::Clipping => "clipping",
            AudioIssue::NoisyBackground => "noisy_background",
            AudioIssue::LongSilences => "long_silences",
            AudioIssue::Sibilance => "sibilance",
            AudioIssue::Rumble => "rumble",
        }
    }
}

impl FromStr for AudioIssue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low_volume" => Ok(AudioIssue::LowVolume),
            "clipping" => Ok(AudioIssue::Clipping),
            "noisy_background" => Ok(AudioIssue::NoisyBackground),
            "long_silences" => Ok(AudioIssue::LongSilences),
            "sibilance" => Ok(AudioIssue::Sibilance),
            "rumble" => Ok(AudioIssue::Rumble),
            _ => Err(format!("Invalid audio issue: {}", s)),
        }
    }
}

impl fmt::Display for AudioIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
