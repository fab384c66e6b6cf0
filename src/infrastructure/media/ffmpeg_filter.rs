use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{AudioFilter, FilterError};
use crate::domain::{FilterChain, FilterOp};

use super::command::{CommandError, run_command};

/// Applies a planned filter chain with one ffmpeg pass, writing the
/// normalized AAC track handed to transcription.
pub struct FfmpegAudioFilter {
    timeout: Duration,
}

impl FfmpegAudioFilter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl AudioFilter for FfmpegAudioFilter {
    async fn apply(
        &self,
        input: &Path,
        chain: &FilterChain,
        output: &Path,
    ) -> Result<(), FilterError> {
        let graph = render_filter_graph(chain);
        let input_path = input.to_string_lossy();
        let output_path = output.to_string_lossy();

        tracing::debug!(graph = %graph, "Applying filter chain");

        run_command(
            "ffmpeg",
            &[
                "-hide_banner",
                "-nostats",
                "-y",
                "-i",
                &input_path,
                "-af",
                &graph,
                "-c:a",
                "aac",
                "-b:a",
                "48k",
                &output_path,
            ],
            Some(self.timeout),
        )
        .await
        .map_err(|e| match e {
            CommandError::NotFound(tool) => FilterError::ToolMissing(tool),
            CommandError::TimedOut { timeout_secs, .. } => FilterError::Timeout(timeout_secs),
            CommandError::Failed { stderr_tail, .. } => FilterError::Failed(stderr_tail),
            CommandError::Io(e) => FilterError::Failed(e.to_string()),
        })?;

        Ok(())
    }
}

/// Renders a typed chain into one ffmpeg `-af` graph. Pure and total over
/// the operation variants; parameter formatting is fixed-precision so the
/// same chain always renders to the same string.
pub fn render_filter_graph(chain: &FilterChain) -> String {
    chain
        .ops()
        .iter()
        .map(render_op)
        .collect::<Vec<_>>()
        .join(",")
}

fn render_op(op: &FilterOp) -> String {
    match op {
        FilterOp::Gain { db } => format!("volume={:.2}dB", db),
        FilterOp::Highpass { cutoff_hz } => format!("highpass=f={}", cutoff_hz),
        FilterOp::Lowpass { cutoff_hz } => format!("lowpass=f={}", cutoff_hz),
        FilterOp::Denoise { floor_db } => format!("afftdn=nf={:.2}", floor_db),
        FilterOp::Equalizer {
            frequency_hz,
            width_hz,
            gain_db,
        } => format!(
            "equalizer=f={}:t=h:width={}:g={:.2}",
            frequency_hz, width_hz, gain_db
        ),
        FilterOp::Deesser { intensity } => format!("deesser=i={:.2}", intensity),
        FilterOp::Compressor {
            threshold_db,
            ratio,
        } => format!(
            "acompressor=threshold={:.2}dB:ratio={:.1}:attack=20:release=250",
            threshold_db, ratio
        ),
        FilterOp::LoudnessNorm {
            target_lufs,
            true_peak_db,
            range_lu,
        } => format!(
            "loudnorm=I={:.1}:TP={:.1}:LRA={:.1}",
            target_lufs, true_peak_db, range_lu
        ),
        FilterOp::Resample { rate_hz, channels } => {
            let layout = if *channels == 1 { "mono" } else { "stereo" };
            format!("aresample={},aformat=channel_layouts={}", rate_hz, layout)
        }
    }
}
