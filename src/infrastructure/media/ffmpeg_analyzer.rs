use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::application::ports::{AnalysisError, SignalAnalyzer};
use crate::domain::{AudioAnalysis, AudioIssue};

use super::command::run_command;

const SILENCE_NOISE_DB: &str = "-35dB";
const SILENCE_MIN_SECS: &str = "2.0";
const LOW_BAND_CUTOFF_HZ: u32 = 120;
const SIBILANT_LOW_HZ: u32 = 5_000;
const SIBILANT_HIGH_HZ: u32 = 9_000;

/// Measures the raw track with ffmpeg's volumedetect/astats/silencedetect
/// filters plus two band-limited loudness passes for rumble and sibilance.
/// All numbers come out of the tool's stderr; the parsers are pure
/// functions over that text.
pub struct FfmpegSignalAnalyzer {
    timeout: Duration,
}

impl FfmpegSignalAnalyzer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn measure(&self, audio_path: &Path, audio_filter: &str) -> Result<String, AnalysisError> {
        let path = audio_path.to_string_lossy();
        let output = run_command(
            "ffmpeg",
            &[
                "-hide_banner",
                "-nostats",
                "-i",
                &path,
                "-af",
                audio_filter,
                "-f",
                "null",
                "-",
            ],
            Some(self.timeout),
        )
        .await
        .map_err(|e| AnalysisError::ToolFailed(e.to_string()))?;

        Ok(output.stderr)
    }
}

#[async_trait]
impl SignalAnalyzer for FfmpegSignalAnalyzer {
    async fn analyze(&self, audio_path: &Path) -> Result<AudioAnalysis, AnalysisError> {
        let main_filter = format!(
            "volumedetect,astats=metadata=0:measure_perchannel=none,silencedetect=noise={}:d={}",
            SILENCE_NOISE_DB, SILENCE_MIN_SECS
        );
        let main_stderr = self.measure(audio_path, &main_filter).await?;
        let stats = parse_signal_stats(&main_stderr)?;

        let low_filter = format!("lowpass=f={},volumedetect", LOW_BAND_CUTOFF_HZ);
        let low_stderr = self.measure(audio_path, &low_filter).await?;
        let low_band_energy =
            band_energy_fraction(parse_mean_volume(&low_stderr), stats.mean_volume_db);

        let sibilant_filter = format!(
            "highpass=f={},lowpass=f={},volumedetect",
            SIBILANT_LOW_HZ, SIBILANT_HIGH_HZ
        );
        let sibilant_stderr = self.measure(audio_path, &sibilant_filter).await?;
        let sibilant_band_energy =
            band_energy_fraction(parse_mean_volume(&sibilant_stderr), stats.mean_volume_db);

        let mut analysis = AudioAnalysis {
            mean_volume_db: stats.mean_volume_db,
            max_volume_db: stats.max_volume_db,
            noise_floor_db: stats.noise_floor_db,
            clipping_ratio: stats.clipping_ratio,
            silence_ratio: stats.silence_ratio,
            low_band_energy,
            sibilant_band_energy,
            issues: Vec::new(),
        };
        analysis.issues = derive_issues(&analysis);

        Ok(analysis)
    }
}

/// Measurements taken from the main analysis pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalStats {
    pub mean_volume_db: f64,
    pub max_volume_db: f64,
    pub noise_floor_db: f64,
    pub clipping_ratio: f64,
    pub silence_ratio: f64,
}

pub fn parse_signal_stats(stderr: &str) -> Result<SignalStats, AnalysisError> {
    let mean_volume_db = capture_number(stderr, r"mean_volume: (-?[\d.]+) dB").ok_or_else(|| {
        AnalysisError::UnreadableOutput("no mean_volume in tool output".to_string())
    })?;
    let max_volume_db = capture_number(stderr, r"max_volume: (-?[\d.]+) dB").ok_or_else(|| {
        AnalysisError::UnreadableOutput("no max_volume in tool output".to_string())
    })?;

    // astats' RMS trough is the quietest windowed level seen, a serviceable
    // noise-floor estimate for continuous recordings.
    let noise_floor_db =
        capture_number(stderr, r"RMS trough dB: (-?[\d.]+)").unwrap_or(mean_volume_db - 20.0);

    let flat_factor = capture_number(stderr, r"Flat factor: (-?[\d.]+)").unwrap_or(0.0);
    let clipping_ratio = (flat_factor / 100.0).clamp(0.0, 1.0);

    let duration_secs = parse_duration_secs(stderr).unwrap_or(0.0);
    let silence_secs: f64 = capture_all_numbers(stderr, r"silence_duration: ([\d.]+)")
        .into_iter()
        .sum();
    let silence_ratio = if duration_secs > 0.0 {
        (silence_secs / duration_secs).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Ok(SignalStats {
        mean_volume_db,
        max_volume_db,
        noise_floor_db,
        clipping_ratio,
        silence_ratio,
    })
}

pub fn parse_mean_volume(stderr: &str) -> Option<f64> {
    capture_number(stderr, r"mean_volume: (-?[\d.]+) dB")
}

/// Power ratio between a band-limited loudness measurement and the
/// full-signal one, clamped to 0..1.
pub fn band_energy_fraction(band_db: Option<f64>, overall_db: f64) -> f64 {
    match band_db {
        Some(band) => 10f64.powf((band - overall_db) / 10.0).clamp(0.0, 1.0),
        None => 0.0,
    }
}

pub fn derive_issues(analysis: &AudioAnalysis) -> Vec<AudioIssue> {
    let mut issues = Vec::new();
    if analysis.mean_volume_db < -30.0 {
        issues.push(AudioIssue::LowVolume);
    }
    if analysis.clipping_ratio > 0.01 {
        issues.push(AudioIssue::Clipping);
    }
    if analysis.noise_floor_db > -40.0 {
        issues.push(AudioIssue::NoisyBackground);
    }
    if analysis.silence_ratio > 0.4 {
        issues.push(AudioIssue::LongSilences);
    }
    if analysis.sibilant_band_energy > 0.15 {
        issues.push(AudioIssue::Sibilance);
    }
    if analysis.low_band_energy > 0.25 {
        issues.push(AudioIssue::Rumble);
    }
    issues
}

fn capture_number(text: &str, pattern: &str) -> Option<f64> {
    let re = Regex::new(pattern).ok()?;
    re.captures_iter(text)
        .last()
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn capture_all_numbers(text: &str, pattern: &str) -> Vec<f64> {
    let Ok(re) = Regex::new(pattern) else {
        return Vec::new();
    };
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

fn parse_duration_secs(stderr: &str) -> Option<f64> {
    let re = Regex::new(r"Duration: (\d+):(\d+):([\d.]+)").ok()?;
    let caps = re.captures(stderr)?;
    let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(3)?.as_str().parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
