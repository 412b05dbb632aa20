pub mod handlers;
pub mod page;
pub mod routes;
pub mod sessions;

use serde::{Deserialize, Serialize};

/// Fields posted by the studio form.
///
/// Browsers leave disabled selects out of the body, so every select is optional.
#[derive(Debug, Deserialize)]
pub struct StudioForm {
    #[serde(default)]
    pub text: String,
    pub language: Option<String>,
    pub gender: Option<String>,
    pub voice: Option<String>,
    pub speed: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AudioQuery {
    pub download: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions: usize,
    pub audio_clips: usize,
}
