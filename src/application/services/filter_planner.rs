use crate::domain::{AudioAnalysis, FilterChain, FilterOp};

/// Loudness target for intelligible speech, dBFS.
const SPEECH_TARGET_DB: f64 = -16.0;
/// Gain boost never exceeds this, whatever the measured gap.
const MAX_GAIN_DB: f64 = 20.0;
/// Low-band energy above this fraction enables the high-pass.
const RUMBLE_THRESHOLD: f64 = 0.25;
/// Noise floors above this enable the adaptive denoiser.
const NOISE_FLOOR_THRESHOLD_DB: f64 = -40.0;
/// Sibilant-band energy above this enables the de-esser.
const SIBILANCE_THRESHOLD: f64 = 0.15;

const HIGHPASS_CUTOFF_HZ: u32 = 80;
const LOWPASS_CUTOFF_HZ: u32 = 8_000;
const TARGET_SAMPLE_RATE_HZ: u32 = 16_000;

/// Maps one immutable [`AudioAnalysis`] to the filter chain that will be
/// applied before transcription. Pure: identical input always yields an
/// identical chain, in a fixed rule order.
pub fn plan_filter_chain(analysis: &AudioAnalysis) -> FilterChain {
    let mut ops = Vec::new();

    if analysis.mean_volume_db < SPEECH_TARGET_DB {
        let gap = (SPEECH_TARGET_DB - analysis.mean_volume_db).min(MAX_GAIN_DB);
        ops.push(FilterOp::Gain { db: round_db(gap) });
    }

    if analysis.low_band_energy > RUMBLE_THRESHOLD {
        ops.push(FilterOp::Highpass {
            cutoff_hz: HIGHPASS_CUTOFF_HZ,
        });
    }

    ops.push(FilterOp::Lowpass {
        cutoff_hz: LOWPASS_CUTOFF_HZ,
    });

    if analysis.noise_floor_db > NOISE_FLOOR_THRESHOLD_DB {
        ops.push(FilterOp::Denoise {
            floor_db: round_db(analysis.noise_floor_db.clamp(-80.0, -20.0)),
        });
    }

    ops.push(speech_clarity_eq());

    if analysis.sibilant_band_energy > SIBILANCE_THRESHOLD {
        ops.push(FilterOp::Deesser { intensity: 0.6 });
    }

    let threshold_db = (analysis.noise_floor_db + 10.0).clamp(-35.0, -15.0);
    let ratio = if analysis.dynamic_range_db() > 30.0 {
        4.0
    } else {
        2.5
    };
    ops.push(FilterOp::Compressor {
        threshold_db: round_db(threshold_db),
        ratio,
    });

    ops.push(loudness_norm());
    ops.push(resample());

    FilterChain::new(ops)
}

/// Fallback chain used when signal analysis fails: no data-driven stages,
/// just band-limiting, the fixed clarity curve and output normalization.
pub fn conservative_chain() -> FilterChain {
    FilterChain::new(vec![
        FilterOp::Lowpass {
            cutoff_hz: LOWPASS_CUTOFF_HZ,
        },
        speech_clarity_eq(),
        loudness_norm(),
        resample(),
    ])
}

fn speech_clarity_eq() -> FilterOp {
    FilterOp::Equalizer {
        frequency_hz: 1_800,
        width_hz: 1_200,
        gain_db: 2.0,
    }
}

fn loudness_norm() -> FilterOp {
    FilterOp::LoudnessNorm {
        target_lufs: -16.0,
        true_peak_db: -1.5,
        range_lu: 11.0,
    }
}

fn resample() -> FilterOp {
    FilterOp::Resample {
        rate_hz: TARGET_SAMPLE_RATE_HZ,
        channels: 1,
    }
}

// Two-decimal parameters keep the rendered graph stable across platforms.
fn round_db(db: f64) -> f64 {
    (db * 100.0).round() / 100.0
}
