use super::catalog::{Catalog, Voice};

pub const MAX_TEXT_CHARS: usize = 4096;
pub const MIN_SPEED: f32 = 0.25;
pub const MAX_SPEED: f32 = 4.0;
pub const DEFAULT_SPEED: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NoLanguage,
    LanguageChosen,
    GenderChosen,
    VoiceChosen,
}

/// Cascading language -> gender -> voice choice plus the text and speed inputs.
///
/// Only the chosen values are stored. The option lists are derived from the
/// catalog on demand, so they can never drift from the selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    language: Option<String>,
    gender: Option<String>,
    voice: Option<String>,
    text: String,
    speed: f32,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            language: None,
            gender: None,
            voice: None,
            text: String::new(),
            speed: DEFAULT_SPEED,
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        match (&self.language, &self.gender, &self.voice) {
            (None, _, _) => Stage::NoLanguage,
            (Some(_), None, _) => Stage::LanguageChosen,
            (Some(_), Some(_), None) => Stage::GenderChosen,
            (Some(_), Some(_), Some(_)) => Stage::VoiceChosen,
        }
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn gender(&self) -> Option<&str> {
        self.gender.as_deref()
    }

    pub fn voice(&self) -> Option<&str> {
        self.voice.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Always accepted. An empty value clears the language.
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = non_empty(language.into());
        self.gender = None;
        self.voice = None;
    }

    /// Returns false, leaving the selection alone, if no language is chosen.
    pub fn set_gender(&mut self, gender: impl Into<String>) -> bool {
        if self.language.is_none() {
            return false;
        }
        self.gender = non_empty(gender.into());
        self.voice = None;
        true
    }

    /// Returns false, leaving the selection alone, if no gender is chosen.
    pub fn set_voice(&mut self, voice: impl Into<String>) -> bool {
        if self.gender.is_none() {
            return false;
        }
        self.voice = non_empty(voice.into());
        true
    }

    /// Input past `MAX_TEXT_CHARS` characters is cut off.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.text = match text.char_indices().nth(MAX_TEXT_CHARS) {
            Some((cut, _)) => text[..cut].to_string(),
            None => text,
        };
    }

    /// Clamps into `[MIN_SPEED, MAX_SPEED]`. Non-finite input is ignored.
    pub fn set_speed(&mut self, speed: f32) -> f32 {
        if speed.is_finite() {
            self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
        }
        self.speed
    }

    pub fn available_genders<'c>(&self, catalog: &'c Catalog) -> Vec<&'c str> {
        match &self.language {
            Some(language) => catalog.genders_for(language),
            None => Vec::new(),
        }
    }

    pub fn available_voices<'c>(&self, catalog: &'c Catalog) -> Vec<&'c Voice> {
        match (&self.language, &self.gender) {
            (Some(language), Some(gender)) => catalog.voices_for(language, gender),
            _ => Vec::new(),
        }
    }

    /// Drops choices the catalog no longer offers, cascading downwards.
    /// Returns true if anything was cleared.
    pub fn reconcile(&mut self, catalog: &Catalog) -> bool {
        let before = (self.language.clone(), self.gender.clone(), self.voice.clone());

        if let Some(language) = &self.language {
            if !catalog.languages().contains(&language.as_str()) {
                self.set_language("");
            }
        }
        if let Some(gender) = &self.gender {
            if !self.available_genders(catalog).contains(&gender.as_str()) {
                self.gender = None;
                self.voice = None;
            }
        }
        if let Some(voice) = &self.voice {
            if !self
                .available_voices(catalog)
                .iter()
                .any(|v| &v.identifier == voice)
            {
                self.voice = None;
            }
        }

        before != (self.language.clone(), self.gender.clone(), self.voice.clone())
    }

    /// Text present and a voice chosen.
    pub fn is_complete(&self) -> bool {
        !self.text.is_empty() && self.voice.is_some()
    }
}
