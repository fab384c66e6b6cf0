use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::application::ports::LanguageModel;
use crate::domain::{
    EnhancedTranscript, Emotion, ParticipantRosterEntry, Sentiment, TranscriptSegment,
    TranscriptSummary,
};

/// At most this many segments are sent to the speaker-resolution pass.
const RESOLUTION_SAMPLE_SIZE: usize = 40;

const CORRECTION_SYSTEM_PROMPT: &str = "You clean up raw speech-to-text output of public \
meeting recordings. Fix obvious transcription errors, punctuation and casing without \
altering meaning, adding content, or removing bracketed gap markers. Reply with the \
corrected transcript only.";

#[derive(Debug, Clone)]
pub struct EnhanceOptions {
    pub include_sentiment: bool,
    pub identify_speakers: bool,
}

/// LLM-based enhancement: a correction pass, a per-utterance classification
/// pass and an optional speaker-resolution pass against the meeting roster.
///
/// Every sub-step is best-effort. A failed correction falls back to the raw
/// transcript, an unparsable classification collapses to one neutral
/// segment, a failed resolution leaves labels untouched; none of them can
/// fail the surrounding job.
pub struct TranscriptEnhancer {
    model: Arc<dyn LanguageModel>,
}

impl TranscriptEnhancer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn enhance(
        &self,
        raw_transcript: &str,
        duration_secs: f64,
        options: &EnhanceOptions,
        roster: &[ParticipantRosterEntry],
    ) -> EnhancedTranscript {
        let corrected = self.correct(raw_transcript).await;

        let mut segments = self.classify(&corrected, options).await;

        if options.identify_speakers && !roster.is_empty() {
            self.resolve_speakers(&mut segments, roster).await;
        }

        let summary = summarize(&segments, duration_secs);

        EnhancedTranscript {
            corrected_text: corrected,
            segments,
            summary,
        }
    }

    async fn correct(&self, raw: &str) -> String {
        match self.model.complete(CORRECTION_SYSTEM_PROMPT, raw).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                tracing::warn!("Correction pass returned empty text, keeping raw transcript");
                raw.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Correction pass failed, keeping raw transcript");
                raw.to_string()
            }
        }
    }

    async fn classify(&self, corrected: &str, options: &EnhanceOptions) -> Vec<TranscriptSegment> {
        let system = classification_system_prompt(options.include_sentiment);

        let response = match self.model.complete_json(&system, corrected).await {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Classification pass failed, using neutral segment");
                return vec![neutral_segment(corrected)];
            }
        };

        match parse_classification(&response) {
            Some(segments) if !segments.is_empty() => segments,
            _ => {
                tracing::warn!("Classification response unparsable, using neutral segment");
                vec![neutral_segment(corrected)]
            }
        }
    }

    async fn resolve_speakers(
        &self,
        segments: &mut [TranscriptSegment],
        roster: &[ParticipantRosterEntry],
    ) {
        let roster_json = serde_json::to_string(roster).unwrap_or_else(|_| "[]".to_string());
        let sample: Vec<serde_json::Value> = segments
            .iter()
            .take(RESOLUTION_SAMPLE_SIZE)
            .map(|s| {
                serde_json::json!({
                    "speaker": s.speaker,
                    "text": s.text.chars().take(160).collect::<String>(),
                })
            })
            .collect();

        let user = format!(
            "Known participants:\n{}\n\nTranscript sample:\n{}",
            roster_json,
            serde_json::to_string(&sample).unwrap_or_default()
        );

        let response = match self
            .model
            .complete_json(RESOLUTION_SYSTEM_PROMPT, &user)
            .await
        {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Speaker resolution failed, keeping generic labels");
                return;
            }
        };

        let mappings = match parse_resolution(&response) {
            Some(m) => m,
            None => {
                tracing::warn!("Speaker resolution response unparsable, keeping generic labels");
                return;
            }
        };

        let mut resolved = 0usize;
        for segment in segments.iter_mut() {
            if let Some(identity) = mappings.get(&segment.speaker) {
                segment.speaker = identity.name.clone();
                segment.resolved_role = identity.role.clone();
                resolved += 1;
            }
        }
        tracing::info!(resolved, mappings = mappings.len(), "Speaker labels resolved");
    }
}

const RESOLUTION_SYSTEM_PROMPT: &str = "You match generic speaker labels from a meeting \
transcript to the known participants listed by the caller. Respond with a JSON object \
{\"mappings\": {\"<label>\": {\"name\": \"...\", \"role\": \"...\"}}} containing only \
labels you are confident about.";

fn classification_system_prompt(include_sentiment: bool) -> String {
    let sentiment_fields = if include_sentiment {
        "\"sentiment\" (positive|negative|neutral|mixed), \"emotion\" \
         (calm|pleased|concerned|frustrated|angry|tense|excited), \"tension\" (0-10), \
         \"credibility\" (0-100), "
    } else {
        ""
    };
    format!(
        "Segment this meeting transcript into utterances. Respond with a JSON object \
         {{\"segments\": [...]}} where each element has \"timestamp\" (MM:SS, estimated), \
         \"speaker\" (e.g. \"Speaker 1\"), {}and \"text\". Preserve the original wording \
         and order.",
        sentiment_fields
    )
}

#[derive(Deserialize)]
struct ClassificationResponse {
    segments: Vec<RawSegment>,
}

#[derive(Deserialize)]
struct RawSegment {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    speaker: Option<String>,
    text: String,
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default)]
    emotion: Option<String>,
    #[serde(default)]
    tension: Option<f64>,
    #[serde(default)]
    credibility: Option<f64>,
}

fn parse_classification(json: &str) -> Option<Vec<TranscriptSegment>> {
    let parsed: ClassificationResponse = serde_json::from_str(json).ok()?;
    let segments = parsed
        .segments
        .into_iter()
        .filter(|raw| !raw.text.trim().is_empty())
        .map(|raw| TranscriptSegment {
            timestamp: raw.timestamp.unwrap_or_else(|| "00:00".to_string()),
            speaker: raw.speaker.unwrap_or_else(|| "Speaker 1".to_string()),
            resolved_role: None,
            text: raw.text,
            sentiment: raw
                .sentiment
                .and_then(|s| s.parse().ok())
                .unwrap_or(Sentiment::Neutral),
            emotion: raw
                .emotion
                .and_then(|e| e.parse().ok())
                .unwrap_or(Emotion::Calm),
            tension: TranscriptSegment::clamp_tension(raw.tension.unwrap_or(5.0)),
            credibility: TranscriptSegment::clamp_credibility(raw.credibility.unwrap_or(75.0)),
        })
        .collect();
    Some(segments)
}

#[derive(Deserialize)]
struct ResolutionResponse {
    mappings: HashMap<String, ResolvedIdentity>,
}

#[derive(Deserialize)]
struct ResolvedIdentity {
    name: String,
    #[serde(default)]
    role: Option<String>,
}

fn parse_resolution(json: &str) -> Option<HashMap<String, ResolvedIdentity>> {
    serde_json::from_str::<ResolutionResponse>(json)
        .ok()
        .map(|r| r.mappings)
}

fn neutral_segment(text: &str) -> TranscriptSegment {
    TranscriptSegment {
        timestamp: "00:00".to_string(),
        speaker: "Speaker 1".to_string(),
        resolved_role: None,
        text: text.to_string(),
        sentiment: Sentiment::Neutral,
        emotion: Emotion::Calm,
        tension: 5,
        credibility: 75,
    }
}

fn summarize(segments: &[TranscriptSegment], duration_secs: f64) -> TranscriptSummary {
    if segments.is_empty() {
        return TranscriptSummary {
            average_tension: 0.0,
            dominant_sentiment: Sentiment::Neutral,
            overall_credibility: 0,
            speaker_count: 0,
            duration_secs,
        };
    }

    let n = segments.len() as f64;
    let average_tension =
        (segments.iter().map(|s| s.tension as f64).sum::<f64>() / n * 10.0).round() / 10.0;
    let overall_credibility =
        (segments.iter().map(|s| s.credibility as f64).sum::<f64>() / n).round() as u8;

    let mut counts: HashMap<Sentiment, usize> = HashMap::new();
    for segment in segments {
        *counts.entry(segment.sentiment).or_default() += 1;
    }
    let dominant_sentiment = [
        Sentiment::Neutral,
        Sentiment::Positive,
        Sentiment::Negative,
        Sentiment::Mixed,
    ]
    .into_iter()
    .max_by_key(|s| counts.get(s).copied().unwrap_or(0))
    .unwrap_or(Sentiment::Neutral);

    let speaker_count = segments
        .iter()
        .map(|s| s.speaker.as_str())
        .collect::<std::collections::HashSet<_>>()
        .len();

    TranscriptSummary {
        average_tension,
        dominant_sentiment,
        overall_credibility,
        speaker_count,
        duration_secs,
    }
}
