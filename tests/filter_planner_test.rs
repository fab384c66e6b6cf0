use plenum::application::services::{conservative_chain, plan_filter_chain};
use plenum::domain::{AudioAnalysis, FilterOp};

fn clean_analysis() -> AudioAnalysis {
    AudioAnalysis {
        mean_volume_db: -14.0,
        max_volume_db: -3.0,
        noise_floor_db: -60.0,
        clipping_ratio: 0.0,
        silence_ratio: 0.05,
        low_band_energy: 0.1,
        sibilant_band_energy: 0.05,
        issues: Vec::new(),
    }
}

fn degraded_analysis() -> AudioAnalysis {
    AudioAnalysis {
        mean_volume_db: -34.0,
        max_volume_db: -6.0,
        noise_floor_db: -32.0,
        clipping_ratio: 0.02,
        silence_ratio: 0.5,
        low_band_energy: 0.4,
        sibilant_band_energy: 0.3,
        issues: Vec::new(),
    }
}

#[test]
fn given_identical_analysis_when_planning_then_chains_are_identical() {
    let analysis = degraded_analysis();

    let first = plan_filter_chain(&analysis);
    let second = plan_filter_chain(&analysis);

    assert_eq!(first, second);
}

#[test]
fn given_clean_speech_when_planning_then_only_fixed_stages_are_enabled() {
    let chain = plan_filter_chain(&clean_analysis());

    let ops = chain.ops();
    assert!(matches!(ops[0], FilterOp::Lowpass { cutoff_hz: 8000 }));
    assert!(matches!(ops[1], FilterOp::Equalizer { .. }));
    assert!(matches!(ops[2], FilterOp::Compressor { .. }));
    assert!(matches!(ops[3], FilterOp::LoudnessNorm { .. }));
    assert!(matches!(
        ops[4],
        FilterOp::Resample {
            rate_hz: 16000,
            channels: 1
        }
    ));
    assert_eq!(ops.len(), 5);
}

#[test]
fn given_quiet_audio_when_planning_then_gain_is_prepended_and_sized_to_gap() {
    let mut analysis = clean_analysis();
    analysis.mean_volume_db = -28.0;

    let chain = plan_filter_chain(&analysis);

    match chain.ops().first() {
        Some(FilterOp::Gain { db }) => assert!((db - 12.0).abs() < 1e-9),
        other => panic!("Expected leading gain stage, got {:?}", other),
    }
}

#[test]
fn given_very_quiet_audio_when_planning_then_gain_is_capped() {
    let mut analysis = clean_analysis();
    analysis.mean_volume_db = -55.0;

    let chain = plan_filter_chain(&analysis);

    match chain.ops().first() {
        Some(FilterOp::Gain { db }) => assert!((db - 20.0).abs() < 1e-9),
        other => panic!("Expected leading gain stage, got {:?}", other),
    }
}

#[test]
fn given_degraded_audio_when_planning_then_all_adaptive_stages_appear_in_order() {
    let chain = plan_filter_chain(&degraded_analysis());

    let kinds: Vec<&str> = chain
        .ops()
        .iter()
        .map(|op| match op {
            FilterOp::Gain { .. } => "gain",
            FilterOp::Highpass { .. } => "highpass",
            FilterOp::Lowpass { .. } => "lowpass",
            FilterOp::Denoise { .. } => "denoise",
            FilterOp::Equalizer { .. } => "equalizer",
            FilterOp::Deesser { .. } => "deesser",
            FilterOp::Compressor { .. } => "compressor",
            FilterOp::LoudnessNorm { .. } => "loudnorm",
            FilterOp::Resample { .. } => "resample",
        })
        .collect();

    assert_eq!(
        kinds,
        vec![
            "gain",
            "highpass",
            "lowpass",
            "denoise",
            "equalizer",
            "deesser",
            "compressor",
            "loudnorm",
            "resample"
        ]
    );
}

#[test]
fn given_noisy_audio_when_planning_then_denoiser_tracks_measured_floor() {
    let mut analysis = clean_analysis();
    analysis.noise_floor_db = -35.0;

    let chain = plan_filter_chain(&analysis);

    let denoise = chain
        .ops()
        .iter()
        .find(|op| matches!(op, FilterOp::Denoise { .. }));
    match denoise {
        Some(FilterOp::Denoise { floor_db }) => assert!((floor_db + 35.0).abs() < 1e-9),
        other => panic!("Expected denoise stage, got {:?}", other),
    }
}

#[test]
fn given_wide_dynamic_range_when_planning_then_compression_ratio_is_stronger() {
    let wide = plan_filter_chain(&clean_analysis());
    let mut narrow_analysis = clean_analysis();
    narrow_analysis.noise_floor_db = -20.0;
    narrow_analysis.max_volume_db = -5.0;
    let narrow = plan_filter_chain(&narrow_analysis);

    let ratio_of = |chain: &plenum::domain::FilterChain| {
        chain.ops().iter().find_map(|op| match op {
            FilterOp::Compressor { ratio, .. } => Some(*ratio),
            _ => None,
        })
    };

    assert_eq!(ratio_of(&wide), Some(4.0));
    assert_eq!(ratio_of(&narrow), Some(2.5));
}

#[test]
fn given_no_analysis_when_falling_back_then_conservative_chain_has_no_adaptive_stages() {
    let chain = conservative_chain();

    assert!(chain.ops().iter().all(|op| matches!(
        op,
        FilterOp::Lowpass { .. }
            | FilterOp::Equalizer { .. }
            | FilterOp::LoudnessNorm { .. }
            | FilterOp::Resample { .. }
    )));
    assert_eq!(chain.len(), 4);
}
