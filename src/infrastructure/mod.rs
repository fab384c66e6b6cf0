pub mod audio;
pub mod knowledge;
pub mod llm;
pub mod media;
pub mod observability;
pub mod persistence;
