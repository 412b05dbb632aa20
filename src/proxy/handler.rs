use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderName, Method, Uri},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::AppError;
use crate::web::routes::AppState;

const FORWARDED_REQUEST_HEADERS: [HeaderName; 4] = [
    header::CONTENT_TYPE,
    header::ACCEPT,
    header::ACCEPT_LANGUAGE,
    header::AUTHORIZATION,
];

const FORWARDED_RESPONSE_HEADERS: [HeaderName; 3] = [
    header::CONTENT_TYPE,
    header::CONTENT_DISPOSITION,
    header::CACHE_CONTROL,
];

/// Pass an `/api/*` call through to the remote service.
///
/// The status and body come back as the upstream sent them.
pub async fn forward(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let path = uri.path();
    let mut destination = state
        .rewrites
        .resolve(path)
        .ok_or_else(|| AppError::NoRoute(path.to_string()))?;
    if let Some(query) = uri.query() {
        destination.push('?');
        destination.push_str(query);
    }

    tracing::info!("Proxy {} {} -> {}", method, path, destination);

    let mut outgoing = HeaderMap::new();
    for name in FORWARDED_REQUEST_HEADERS {
        if let Some(value) = headers.get(&name) {
            outgoing.insert(name, value.clone());
        }
    }
    if let Some(authorization) = state.rewrites.authorization() {
        let value = authorization
            .parse()
            .map_err(|_| AppError::Config("API_KEY is not a valid header value".into()))?;
        outgoing.insert(header::AUTHORIZATION, value);
    }

    let upstream = state
        .http
        .request(method, destination)
        .headers(outgoing)
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    let mut response_headers = HeaderMap::new();
    for name in FORWARDED_RESPONSE_HEADERS {
        if let Some(value) = upstream.headers().get(&name) {
            response_headers.insert(name, value.clone());
        }
    }
    let body = upstream.bytes().await?;

    if !status.is_success() {
        tracing::warn!("Upstream answered {} for {}", status, path);
    }

    Ok((status, response_headers, body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::any,
        Router,
    };
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use tower::ServiceExt;

    use crate::proxy::RewriteTable;
    use crate::studio::testing::FakeApi;
    use crate::web::routes::create_router;

    #[derive(Debug, Clone)]
    struct Seen {
        method: String,
        path_and_query: String,
        authorization: Option<String>,
        body: String,
    }

    async fn spawn_echo_upstream() -> (String, Arc<Mutex<Vec<Seen>>>) {
        let seen: Arc<Mutex<Vec<Seen>>> = Arc::default();
        let log = Arc::clone(&seen);
        let app = Router::new().route(
            "/*rest",
            any(move |request: axum::extract::Request| {
                let log = Arc::clone(&log);
                async move {
                    let (parts, body) = request.into_parts();
                    let body = body.collect().await.unwrap().to_bytes();
                    log.lock().unwrap().push(Seen {
                        method: parts.method.to_string(),
                        path_and_query: parts
                            .uri
                            .path_and_query()
                            .map(|pq| pq.to_string())
                            .unwrap_or_default(),
                        authorization: parts
                            .headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string),
                        body: String::from_utf8_lossy(&body).to_string(),
                    });
                    if parts.uri.path() == "/v1/broken" {
                        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
                    }
                    ([(header::CONTENT_TYPE, "audio/mpeg")], "AUDIO").into_response()
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), seen)
    }

    fn app(base: &str, token: Option<&str>) -> Router {
        let state = AppState::new(
            RewriteTable::for_upstream(base, token.map(str::to_string)),
            reqwest::Client::new(),
            Arc::new(FakeApi::new(Vec::new())),
            "static".into(),
        );
        create_router(Arc::new(state))
    }

    #[tokio::test]
    async fn test_convert_alias_with_injected_bearer() {
        let (base, seen) = spawn_echo_upstream().await;
        let response = app(&base, Some("secret"))
            .oneshot(
                Request::post("/api/convert")
                    .header("content-type", "application/json")
                    .header("authorization", "Bearer from-browser")
                    .body(Body::from(r#"{"input":"hi"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "audio/mpeg");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), b"AUDIO");

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].method, "POST");
        assert_eq!(seen[0].path_and_query, "/v1/audio/speech");
        assert_eq!(seen[0].authorization.as_deref(), Some("Bearer secret"));
        assert_eq!(seen[0].body, r#"{"input":"hi"}"#);
    }

    #[tokio::test]
    async fn test_wildcard_keeps_query_and_caller_auth() {
        let (base, seen) = spawn_echo_upstream().await;
        let response = app(&base, None)
            .oneshot(
                Request::get("/api/voices?locale=en")
                    .header("authorization", "Bearer from-browser")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].path_and_query, "/v1/voices?locale=en");
        assert_eq!(seen[0].authorization.as_deref(), Some("Bearer from-browser"));
    }

    #[tokio::test]
    async fn test_upstream_status_passes_through() {
        let (base, _) = spawn_echo_upstream().await;
        let response = app(&base, None)
            .oneshot(Request::get("/api/broken").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), b"upstream exploded");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_bad_gateway() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let response = app(&format!("http://{}", addr), None)
            .oneshot(Request::get("/api/voices").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_parent_segments_are_not_routed() {
        let (base, seen) = spawn_echo_upstream().await;
        let response = app(&base, None)
            .oneshot(Request::get("/api/../admin").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_encoded_parent_segments_are_not_routed() {
        let (base, seen) = spawn_echo_upstream().await;
        for path in ["/api/%2e%2e/admin", "/api/%2E%2E/admin", "/api/.%2e/admin"] {
            let response = app(&base, Some("secret"))
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", path);
        }
        assert!(seen.lock().unwrap().is_empty());
    }
}
