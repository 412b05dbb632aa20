use serde::{Deserialize, Serialize};

use super::api::ApiError;

/// One synthesis voice as listed by the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawVoice", rename_all = "camelCase")]
pub struct Voice {
    pub identifier: String,
    pub display_name: String,
    pub language: String,
    pub gender: String,
}

// Catalog deployments disagree on field casing, so every known spelling is accepted.
#[derive(Deserialize)]
struct RawVoice {
    identifier: Option<String>,
    #[serde(rename = "ShortName")]
    short_name: Option<String>,
    name: Option<String>,
    id: Option<String>,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    #[serde(rename = "LocalName")]
    local_name: Option<String>,
    language: Option<String>,
    #[serde(rename = "Language")]
    language_title: Option<String>,
    gender: Option<String>,
    #[serde(rename = "Gender")]
    gender_title: Option<String>,
}

impl TryFrom<RawVoice> for Voice {
    type Error = String;

    fn try_from(raw: RawVoice) -> Result<Self, Self::Error> {
        let identifier = raw
            .identifier
            .or(raw.short_name)
            .or(raw.name)
            .or(raw.id)
            .filter(|id| !id.is_empty())
            .ok_or("voice entry has no identifier")?;
        let language = raw
            .language
            .or(raw.language_title)
            .ok_or_else(|| format!("voice '{}' has no language", identifier))?;
        let gender = raw
            .gender
            .or(raw.gender_title)
            .ok_or_else(|| format!("voice '{}' has no gender", identifier))?;
        let display_name = raw
            .display_name
            .or(raw.local_name)
            .unwrap_or_else(|| identifier.clone());

        Ok(Self {
            identifier,
            display_name,
            language,
            gender,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CatalogResponse {
    pub voices: Vec<Voice>,
}

/// The voice list for a session. Never mutated once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    voices: Vec<Voice>,
}

impl Catalog {
    pub const fn empty() -> Self {
        Self { voices: Vec::new() }
    }

    pub fn new(voices: Vec<Voice>) -> Self {
        Self { voices }
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Distinct languages in first-seen order.
    pub fn languages(&self) -> Vec<&str> {
        distinct(self.voices.iter().map(|v| v.language.as_str()))
    }

    pub fn genders_for(&self, language: &str) -> Vec<&str> {
        distinct(
            self.voices
                .iter()
                .filter(|v| v.language == language)
                .map(|v| v.gender.as_str()),
        )
    }

    pub fn voices_for(&self, language: &str, gender: &str) -> Vec<&Voice> {
        self.voices
            .iter()
            .filter(|v| v.language == language && v.gender == gender)
            .collect()
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

pub const CATALOG_LOAD_FAILED: &str = "Failed to load voices";

static EMPTY_CATALOG: Catalog = Catalog::empty();

/// Fetch-once holder for the session's catalog.
///
/// `begin` hands out permission for exactly one request; the caller performs
/// the I/O and reports back through `finish`. Failures are never retried
/// automatically, only through an explicit `reload`.
#[derive(Debug)]
pub struct CatalogLoader {
    status: LoadStatus,
    catalog: Catalog,
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogLoader {
    pub fn new() -> Self {
        Self {
            status: LoadStatus::Idle,
            catalog: Catalog::empty(),
        }
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn catalog(&self) -> &Catalog {
        match self.status {
            LoadStatus::Ready => &self.catalog,
            _ => &EMPTY_CATALOG,
        }
    }

    pub fn begin(&mut self) -> bool {
        if self.status != LoadStatus::Idle {
            return false;
        }
        self.status = LoadStatus::Loading;
        true
    }

    pub fn reload(&mut self) -> bool {
        match self.status {
            LoadStatus::Ready | LoadStatus::Failed(_) => {
                self.status = LoadStatus::Loading;
                true
            }
            _ => false,
        }
    }

    pub fn finish(&mut self, result: Result<Vec<Voice>, ApiError>) {
        match result {
            Ok(voices) => {
                self.catalog = Catalog::new(voices);
                tracing::info!("Loaded {} voices", self.catalog.voices().len());
                self.status = LoadStatus::Ready;
            }
            Err(e) => {
                tracing::error!("Voice catalog request failed: {}", e);
                self.catalog = Catalog::empty();
                self.status = LoadStatus::Failed(CATALOG_LOAD_FAILED.to_string());
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn voice(identifier: &str, language: &str, gender: &str) -> Voice {
    Voice {
        identifier: identifier.to_string(),
        display_name: identifier.to_string(),
        language: language.to_string(),
        gender: gender.to_string(),
    }
}

#[cfg(test)]
pub(crate) fn sample_catalog() -> Catalog {
    Catalog::new(vec![
        voice("a", "en", "f"),
        voice("b", "en", "m"),
        voice("c", "fr", "f"),
    ])
}
