use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Bytes,
    pub content_type: String,
}

impl AudioClip {
    /// File extension offered for downloads.
    pub fn extension(&self) -> &'static str {
        match self.content_type.split(';').next().unwrap_or("").trim() {
            "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
            "audio/ogg" | "audio/opus" => "opus",
            "audio/aac" => "aac",
            "audio/flac" => "flac",
            _ => "mp3",
        }
    }
}

/// Clips addressable by `/audio/{id}` for as long as their handle lives.
#[derive(Debug, Clone, Default)]
pub struct AudioStore {
    clips: Arc<RwLock<HashMap<Uuid, AudioClip>>>,
}

impl AudioStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, clip: AudioClip) -> AudioHandle {
        let id = Uuid::new_v4();
        self.clips.write().unwrap().insert(id, clip);
        AudioHandle {
            id,
            store: self.clone(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<AudioClip> {
        self.clips.read().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.clips.read().unwrap().len()
    }

    fn release(&self, id: &Uuid) {
        if self.clips.write().unwrap().remove(id).is_some() {
            tracing::debug!("Released audio {}", id);
        }
    }
}

/// Owner of one stored clip. Dropping the handle removes the clip.
#[derive(Debug)]
pub struct AudioHandle {
    id: Uuid,
    store: AudioStore,
}

impl AudioHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> String {
        format!("/audio/{}", self.id)
    }

    pub fn download_url(&self) -> String {
        format!("/audio/{}?download=1", self.id)
    }
}

impl Drop for AudioHandle {
    fn drop(&mut self) {
        self.store.release(&self.id);
    }
}

#[cfg(test)]
pub(crate) fn clip(data: &'static [u8]) -> AudioClip {
    AudioClip {
        bytes: Bytes::from_static(data),
        content_type: "audio/mpeg".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_keeps_clip_alive() {
        let store = AudioStore::new();
        let handle = store.insert(clip(b"abc"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&handle.id()).unwrap().bytes.as_ref(), b"abc");
        assert_eq!(handle.url(), format!("/audio/{}", handle.id()));
    }

    #[test]
    fn test_drop_releases_clip() {
        let store = AudioStore::new();
        let handle = store.insert(clip(b"abc"));
        let id = handle.id();
        drop(handle);
        assert!(store.get(&id).is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_replacing_handle_releases_previous() {
        let store = AudioStore::new();
        let mut current = Some(store.insert(clip(b"one")));
        let first = current.as_ref().unwrap().id();
        current = Some(store.insert(clip(b"two")));
        assert!(store.get(&first).is_none());
        let second = current.as_ref().unwrap().id();
        assert!(store.get(&second).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_extension() {
        let mut c = clip(b"x");
        assert_eq!(c.extension(), "mp3");
        c.content_type = "audio/wav; codecs=1".into();
        assert_eq!(c.extension(), "wav");
    }
}
