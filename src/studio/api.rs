use async_trait::async_trait;
use reqwest::{header, Client};

use super::audio::AudioClip;
use super::catalog::{CatalogResponse, Voice};
use super::submitter::SpeechRequest;
use crate::proxy::RewriteTable;

pub const DEFAULT_AUDIO_TYPE: &str = "audio/mpeg";

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("no upstream route for {0}")]
    NoRoute(String),
}

/// The remote text-to-speech service.
#[async_trait]
pub trait TtsApi: Send + Sync {
    async fn list_voices(&self) -> Result<Vec<Voice>, ApiError>;

    async fn synthesize(&self, request: &SpeechRequest) -> Result<AudioClip, ApiError>;
}

/// `TtsApi` over HTTP, addressed through the same rewrite table the `/api` proxy uses.
pub struct HttpTtsApi {
    client: Client,
    voices_url: String,
    speech_url: String,
    authorization: Option<String>,
}

impl HttpTtsApi {
    pub fn new(client: Client, rewrites: &RewriteTable) -> Result<Self, ApiError> {
        let resolve = |path: &str| {
            rewrites
                .resolve(path)
                .ok_or_else(|| ApiError::NoRoute(path.to_string()))
        };

        Ok(Self {
            voices_url: resolve("/api/voices")?,
            speech_url: resolve("/api/convert")?,
            authorization: rewrites.authorization(),
            client,
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.authorization {
            Some(value) => builder.header(header::AUTHORIZATION, value),
            None => builder,
        }
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl TtsApi for HttpTtsApi {
    async fn list_voices(&self) -> Result<Vec<Voice>, ApiError> {
        let response = self
            .request(self.client.get(&self.voices_url))
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let body = response.bytes().await?;
        let catalog: CatalogResponse =
            serde_json::from_slice(&body).map_err(|e| ApiError::Malformed(e.to_string()))?;

        Ok(catalog.voices)
    }

    async fn synthesize(&self, request: &SpeechRequest) -> Result<AudioClip, ApiError> {
        let response = self
            .request(self.client.post(&self.speech_url))
            .json(request)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_AUDIO_TYPE)
            .to_string();
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ApiError::Malformed("empty audio body".into()));
        }

        Ok(AudioClip {
            bytes,
            content_type,
        })
    }
}
