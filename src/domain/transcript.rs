use std::fmt;
use std::str::FromStr;

/// One attributed utterance of the enhanced transcript, strictly
/// time-ordered and immutable once emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSegment {
    pub timestamp: String,
    pub speaker: String,
    pub resolved_role: Option<String>,
    pub text: String,
    pub sentiment: Sentiment,
    pub emotion: Emotion,
    /// Conversational tension, clamped to 0..=10.
    pub tension: u8,
    /// Assessed credibility, clamped to 0..=100.
    pub credibility: u8,
}

impl TranscriptSegment {
    pub fn clamp_tension(raw: f64) -> u8 {
        raw.clamp(0.0, 10.0).round() as u8
    }

    pub fn clamp_credibility(raw: f64) -> u8 {
        raw.clamp(0.0, 100.0).round() as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Mixed,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Mixed => "mixed",
        }
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            "mixed" => Ok(Sentiment::Mixed),
            _ => Err(format!("Invalid sentiment: {}", s)),
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emotion {
    Calm,
    Pleased,
    Concerned,
    Frustrated,
    Angry,
    Tense,
    Excited,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Calm => "calm",
            Emotion::Pleased => "pleased",
            Emotion::Concerned => "concerned",
            Emotion::Frustrated => "frustrated",
            Emotion::Angry => "angry",
            Emotion::Tense => "tense",
            Emotion::Excited => "excited",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Emotion::Calm => "😌",
            Emotion::Pleased => "😊",
            Emotion::Concerned => "😟",
            Emotion::Frustrated => "😤",
            Emotion::Angry => "😠",
            Emotion::Tense => "😬",
            Emotion::Excited => "🤩",
        }
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "calm" => Ok(Emotion::Calm),
            "pleased" => Ok(Emotion::Pleased),
            "concerned" => Ok(Emotion::Concerned),
            "frustrated" => Ok(Emotion::Frustrated),
            "angry" => Ok(Emotion::Angry),
            "tense" => Ok(Emotion::Tense),
            "excited" => Ok(Emotion::Excited),
            _ => Err(format!("Invalid emotion: {}", s)),
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregate figures computed over all segments of one transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSummary {
    pub average_tension: f64,
    pub dominant_sentiment: Sentiment,
    pub overall_credibility: u8,
    pub speaker_count: usize,
    pub duration_secs: f64,
}

/// Output of the enhancement pass.
#[derive(Debug, Clone)]
pub struct EnhancedTranscript {
    pub corrected_text: String,
    pub segments: Vec<TranscriptSegment>,
    pub summary: TranscriptSummary,
}
