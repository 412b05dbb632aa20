use serde::Serialize;

use super::api::ApiError;
use super::audio::{AudioClip, AudioHandle, AudioStore};

pub const MODEL: &str = "tts-1";
pub const CONVERSION_FAILED: &str = "Conversion request failed";

/// Body of the speech endpoint call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechRequest {
    pub input: String,
    pub model: String,
    pub voice: String,
    pub speed: f32,
}

impl SpeechRequest {
    pub fn new(input: impl Into<String>, voice: impl Into<String>, speed: f32) -> Self {
        Self {
            input: input.into(),
            model: MODEL.to_string(),
            voice: voice.into(),
            speed,
        }
    }
}

/// In-flight, error and result state of conversions.
///
/// A conversion is `begin` (checks preconditions and marks the submitter busy),
/// the caller's I/O, then `finish`. Only one conversion can be in flight.
#[derive(Debug, Default)]
pub struct Submitter {
    converting: bool,
    error: Option<String>,
    audio: Option<AudioHandle>,
}

impl Submitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_converting(&self) -> bool {
        self.converting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn audio(&self) -> Option<&AudioHandle> {
        self.audio.as_ref()
    }

    pub fn can_submit(&self, text: &str, voice: Option<&str>) -> bool {
        !self.converting && !text.is_empty() && voice.is_some_and(|v| !v.is_empty())
    }

    pub fn begin(&mut self, text: &str, voice: Option<&str>, speed: f32) -> Option<SpeechRequest> {
        if !self.can_submit(text, voice) {
            return None;
        }
        self.converting = true;
        self.error = None;
        Some(SpeechRequest::new(text, voice?, speed))
    }

    /// A success replaces (and so releases) the previous clip. A failure keeps it.
    pub fn finish(&mut self, result: Result<AudioClip, ApiError>, store: &AudioStore) {
        self.converting = false;
        match result {
            Ok(clip) => {
                let handle = store.insert(clip);
                tracing::info!("Conversion finished, audio {}", handle.id());
                self.audio = Some(handle);
            }
            Err(e) => {
                tracing::error!("Conversion failed: {}", e);
                self.error = Some(CONVERSION_FAILED.to_string());
            }
        }
    }
}
