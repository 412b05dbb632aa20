use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use axum::http::{header, HeaderMap};
use uuid::Uuid;

use crate::studio::Session;

pub const SESSION_COOKIE: &str = "tts_session";

pub const DEFAULT_MAX_SESSIONS: usize = 1000;

pub type SharedSession = Arc<Mutex<Session>>;

/// Live sessions keyed by the id in the browser's cookie.
///
/// Holds at most `max_sessions`; creating one more evicts the longest idle.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<SharedSession> {
        self.sessions.read().unwrap().get(id).cloned()
    }

    /// Returns the session stored under `id` and whether it was just created.
    pub fn get_or_create(&self, id: Uuid) -> (SharedSession, bool) {
        if let Some(session) = self.get(&id) {
            return (session, false);
        }

        let mut sessions = self.sessions.write().unwrap();
        // Another request with the same cookie may have won the race.
        if let Some(session) = sessions.get(&id) {
            return (Arc::clone(session), false);
        }

        while sessions.len() >= self.max_sessions {
            let Some(oldest) = longest_idle(&sessions) else {
                break;
            };
            sessions.remove(&oldest);
            tracing::warn!("Session limit {} reached, evicted session {}", self.max_sessions, oldest);
        }

        let session = Arc::new(Mutex::new(Session::new()));
        sessions.insert(id, Arc::clone(&session));
        tracing::debug!("Created session {}", id);
        (session, true)
    }

    /// Ends a session. Its audio is released once the last reference goes.
    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().unwrap().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|_, session| {
            session
                .lock()
                .map(|s| s.idle_for() <= max_idle)
                .unwrap_or(false)
        });
        before - sessions.len()
    }
}

fn longest_idle(sessions: &HashMap<Uuid, SharedSession>) -> Option<Uuid> {
    sessions
        .iter()
        .max_by_key(|(_, session)| {
            session
                .lock()
                .map(|s| s.idle_for())
                .unwrap_or(Duration::MAX)
        })
        .map(|(id, _)| *id)
}

pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}

pub fn session_cookie(id: Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

pub fn expired_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_round_trip() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("theme=dark; {}={}", SESSION_COOKIE, id).parse().unwrap(),
        );
        assert_eq!(session_id(&headers), Some(id));
        assert!(session_cookie(id).starts_with(&format!("tts_session={}", id)));
    }

    #[test]
    fn test_bad_cookie_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "tts_session=nope".parse().unwrap());
        assert_eq!(session_id(&headers), None);
        assert_eq!(session_id(&HeaderMap::new()), None);
    }

    #[test]
    fn test_get_or_create_keys_by_cookie_id() {
        let store = SessionStore::default();
        let id = Uuid::new_v4();
        let (first, created) = store.get_or_create(id);
        assert!(created);
        let (again, created) = store.get_or_create(id);
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &again));
        assert!(store.get(&id).is_some());

        let (_, created) = store.get_or_create(Uuid::new_v4());
        assert!(created);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_limit_evicts_longest_idle() {
        let store = SessionStore::new(2);
        let oldest = Uuid::new_v4();
        let recent = Uuid::new_v4();
        store.get_or_create(oldest);
        std::thread::sleep(Duration::from_millis(10));
        store.get_or_create(recent);

        let newest = Uuid::new_v4();
        let (_, created) = store.get_or_create(newest);
        assert!(created);
        assert_eq!(store.len(), 2);
        assert!(store.get(&oldest).is_none());
        assert!(store.get(&recent).is_some());
        assert!(store.get(&newest).is_some());

        for _ in 0..50 {
            store.get_or_create(Uuid::new_v4());
        }
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_sweep_idle() {
        let store = SessionStore::default();
        let id = Uuid::new_v4();
        store.get_or_create(id);
        assert_eq!(store.sweep_idle(Duration::from_secs(60)), 0);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(store.sweep_idle(Duration::from_millis(5)), 1);
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::default();
        let id = Uuid::new_v4();
        store.get_or_create(id);
        assert!(store.remove(&id));
        assert!(!store.remove(&id));
    }
}
