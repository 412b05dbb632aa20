use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::page;
use super::routes::AppState;
use super::sessions::{expired_cookie, session_cookie, session_id, SharedSession};
use super::{AudioQuery, HealthResponse, StudioForm};
use crate::error::AppError;
use crate::studio::api::DEFAULT_AUDIO_TYPE;
use crate::studio::Session;

pub async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    // Without a cookie only hand one out. The session and its catalog request
    // wait until the browser sends it back on the refresh.
    let Some(id) = session_id(&headers) else {
        let mut response = Html(page::render(&Session::new())).into_response();
        if let Ok(cookie) = HeaderValue::from_str(&session_cookie(Uuid::new_v4())) {
            response.headers_mut().insert(header::SET_COOKIE, cookie);
        }
        return response;
    };

    let (session, created) = state.sessions.get_or_create(id);
    if created {
        // First render kicks off the one catalog request for this session.
        spawn_catalog_load(&state, &session, false);
    }

    let html = {
        let mut session = session.lock().unwrap();
        session.touch();
        page::render(&session)
    };
    Html(html).into_response()
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<StudioForm>,
) -> Result<Response, AppError> {
    let Some(session) = current_session(&state, &headers) else {
        return Ok(Redirect::to("/").into_response());
    };

    let speed = match form.speed.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            raw.parse::<f32>()
                .map_err(|_| AppError::BadRequest(format!("Invalid speed '{}'", raw)))?,
        ),
        None => None,
    };

    let request = {
        let mut session = session.lock().unwrap();
        session.touch();
        apply_selection(&mut session, &form);
        session.set_text(form.text);
        if let Some(speed) = speed {
            session.set_speed(speed);
        }
        match form.action.as_deref() {
            Some("convert") => session.begin_conversion(),
            _ => None,
        }
    };

    if let Some(request) = request {
        tracing::info!(
            "Converting {} characters with voice {} at speed {}",
            request.input.chars().count(),
            request.voice,
            request.speed
        );
        // Detached so a dropped request still clears the converting flag.
        let task_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            let result = task_state.api.synthesize(&request).await;
            session
                .lock()
                .unwrap()
                .finish_conversion(result, &task_state.audio);
        });
        if let Err(e) = task.await {
            tracing::error!("Conversion task failed: {}", e);
        }
    }

    Ok(Redirect::to("/").into_response())
}

pub async fn reload_catalog(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Redirect {
    if let Some(session) = current_session(&state, &headers) {
        spawn_catalog_load(&state, &session, true);
    }
    Redirect::to("/")
}

pub async fn end_session(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(id) = session_id(&headers) {
        if state.sessions.remove(&id) {
            tracing::info!("Ended session {}", id);
        }
    }

    let mut response = Redirect::to("/").into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&expired_cookie()).unwrap_or(HeaderValue::from_static("")),
    );
    response
}

pub async fn audio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<AudioQuery>,
) -> Result<Response, AppError> {
    let clip = state
        .audio
        .get(&id)
        .ok_or_else(|| AppError::AudioNotFound(id.to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&clip.content_type)
            .unwrap_or(HeaderValue::from_static(DEFAULT_AUDIO_TYPE)),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    if query.download.is_some() {
        let disposition = format!("attachment; filename=\"tts-output.{}\"", clip.extension());
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }

    Ok((headers, clip.bytes).into_response())
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions: state.sessions.len(),
        audio_clips: state.audio.len(),
    })
}

fn current_session(state: &AppState, headers: &HeaderMap) -> Option<SharedSession> {
    session_id(headers).and_then(|id| state.sessions.get(&id))
}

fn spawn_catalog_load(state: &Arc<AppState>, session: &SharedSession, reload: bool) {
    let started = {
        let mut session = session.lock().unwrap();
        if reload {
            session.begin_catalog_reload()
        } else {
            session.begin_catalog_load()
        }
    };
    if !started {
        return;
    }

    let api = Arc::clone(&state.api);
    let session = Arc::clone(session);
    tokio::spawn(async move {
        let result = api.list_voices().await;
        session.lock().unwrap().finish_catalog_load(result);
    });
}

/// Applies the selects as ordered events. Only the highest changed level
/// takes effect, since it resets every level below it.
fn apply_selection(session: &mut Session, form: &StudioForm) {
    if !session.controls_enabled() {
        return;
    }

    let language = form.language.as_deref().unwrap_or("");
    if language != session.selection().language().unwrap_or("") {
        session.choose_language(language);
        return;
    }

    let gender = form.gender.as_deref().unwrap_or("");
    if gender != session.selection().gender().unwrap_or("") {
        session.choose_gender(gender);
        return;
    }

    let voice = form.voice.as_deref().unwrap_or("");
    if voice != session.selection().voice().unwrap_or("") {
        session.choose_voice(voice);
    }
}
