use std::time::{Duration, Instant};

use super::api::ApiError;
use super::audio::{AudioClip, AudioStore};
use super::catalog::{Catalog, CatalogLoader, Voice};
use super::selection::Selection;
use super::submitter::{SpeechRequest, Submitter};

/// Everything one browser is working with: the catalog, its selection and its
/// conversions.
#[derive(Debug)]
pub struct Session {
    catalog: CatalogLoader,
    selection: Selection,
    submitter: Submitter,
    last_seen: Instant,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            catalog: CatalogLoader::new(),
            selection: Selection::new(),
            submitter: Submitter::new(),
            last_seen: Instant::now(),
        }
    }

    pub fn loader(&self) -> &CatalogLoader {
        &self.catalog
    }

    pub fn catalog(&self) -> &Catalog {
        self.catalog.catalog()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn submitter(&self) -> &Submitter {
        &self.submitter
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }

    /// Selection controls are locked while the catalog is loading.
    pub fn controls_enabled(&self) -> bool {
        !self.catalog.is_loading()
    }

    pub fn languages(&self) -> Vec<&str> {
        self.catalog().languages()
    }

    pub fn available_genders(&self) -> Vec<&str> {
        self.selection.available_genders(self.catalog.catalog())
    }

    pub fn available_voices(&self) -> Vec<&Voice> {
        self.selection.available_voices(self.catalog.catalog())
    }

    pub fn begin_catalog_load(&mut self) -> bool {
        self.catalog.begin()
    }

    pub fn begin_catalog_reload(&mut self) -> bool {
        self.catalog.reload()
    }

    pub fn finish_catalog_load(&mut self, result: Result<Vec<Voice>, ApiError>) {
        self.catalog.finish(result);
        if self.selection.reconcile(self.catalog.catalog()) {
            tracing::info!("Cleared selection no longer present in the voice catalog");
        }
    }

    // The choose_* methods only accept values the form currently offers.
    // An empty value is the placeholder option and clears the level.

    pub fn choose_language(&mut self, language: &str) -> bool {
        if !self.controls_enabled()
            || !(language.is_empty() || self.languages().contains(&language))
        {
            return false;
        }
        self.selection.set_language(language);
        true
    }

    pub fn choose_gender(&mut self, gender: &str) -> bool {
        if !self.controls_enabled()
            || !(gender.is_empty() || self.available_genders().contains(&gender))
        {
            return false;
        }
        self.selection.set_gender(gender)
    }

    pub fn choose_voice(&mut self, voice: &str) -> bool {
        if !self.controls_enabled()
            || !(voice.is_empty()
                || self
                    .available_voices()
                    .iter()
                    .any(|v| v.identifier == voice))
        {
            return false;
        }
        self.selection.set_voice(voice)
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.selection.set_text(text);
    }

    pub fn set_speed(&mut self, speed: f32) -> f32 {
        self.selection.set_speed(speed)
    }

    pub fn can_submit(&self) -> bool {
        self.controls_enabled() && self.selection.is_complete() && !self.submitter.is_converting()
    }

    /// Conversions are refused while the catalog is loading, since the chosen
    /// voice may be about to disappear.
    pub fn begin_conversion(&mut self) -> Option<SpeechRequest> {
        if !self.controls_enabled() {
            return None;
        }
        self.submitter.begin(
            self.selection.text(),
            self.selection.voice(),
            self.selection.speed(),
        )
    }

    pub fn finish_conversion(&mut self, result: Result<AudioClip, ApiError>, store: &AudioStore) {
        self.submitter.finish(result, store);
    }
}
