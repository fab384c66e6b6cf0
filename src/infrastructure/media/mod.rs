mod command;
mod ffmpeg_analyzer;
mod ffmpeg_filter;
mod ffmpeg_splitter;
mod ytdlp_acquirer;

pub use command::{CommandError, CommandOutput, run_command, stderr_tail};
pub use ffmpeg_analyzer::{
    FfmpegSignalAnalyzer, SignalStats, band_energy_fraction, derive_issues, parse_mean_volume,
    parse_signal_stats,
};
pub use ffmpeg_filter::{FfmpegAudioFilter, render_filter_graph};
pub use ffmpeg_splitter::FfmpegSegmentSplitter;
pub use ytdlp_acquirer::YtDlpAcquirer;
