use uuid::Uuid;

/// A known participant of the meeting being transcribed.
///
/// Reference data owned by the meeting record; the pipeline only reads it
/// when resolving generic speaker labels.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParticipantRosterEntry {
    pub id: Uuid,
    pub display_name: String,
    pub role: String,
    pub voice_descriptor: Option<String>,
}
