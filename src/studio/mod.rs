//! The voice picker and conversion workflow behind the studio page.

pub mod api;
pub mod audio;
pub mod catalog;
pub mod selection;
pub mod session;
pub mod submitter;

pub use api::{HttpTtsApi, TtsApi};
pub use audio::AudioStore;
pub use session::Session;
