use std::net::SocketAddr;

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, comments, feed, followers, health, posts, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/v1",
            Router::new()
                .merge(health::router())
                .merge(auth::router())
                .merge(users::router())
                .merge(followers::router())
                .merge(feed::router())
                .merge(posts::router())
                .merge(comments::router()),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = loggable_path(req.uri().path());
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

const ACTIVATION_PREFIX: &str = "/v1/users/activate/";

/// Request path safe for logs: activation tokens are masked, query strings dropped.
fn loggable_path(path: &str) -> String {
    match path.strip_prefix(ACTIVATION_PREFIX) {
        Some(_) => format!("{ACTIVATION_PREFIX}:token"),
        None => path.to_string(),
    }
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[test]
    fn activation_tokens_are_masked_in_logs() {
        assert_eq!(
            loggable_path("/v1/users/activate/0b6f7c1e-secret"),
            "/v1/users/activate/:token"
        );
        assert_eq!(loggable_path("/v1/posts/abc"), "/v1/posts/abc");
    }

    #[tokio::test]
    async fn health_reports_env() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, Method::GET, "/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ok");
        assert_eq!(body["data"]["env"], "test");
    }

    #[tokio::test]
    async fn feed_requires_bearer_token() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, Method::GET, "/v1/users/feed", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn register_activate_post_and_read_feed() {
        let app = build_app(AppState::fake());

        let (status, body) = call(
            &app,
            Method::POST,
            "/v1/authentication/user",
            None,
            Some(json!({"username": "alice", "email": "Alice@Example.com", "password": "hunter22"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["user"]["email"], "alice@example.com");
        assert!(body["data"]["user"].get("password_hash").is_none());
        let invite = body["data"]["token"].as_str().unwrap().to_string();

        let (status, _) = call(
            &app,
            Method::PUT,
            &format!("/v1/users/activate/{invite}"),
            None,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = call(
            &app,
            Method::POST,
            "/v1/authentication/token",
            None,
            Some(json!({"email": "alice@example.com", "password": "hunter22"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let jwt = body["data"]["token"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            Method::POST,
            "/v1/posts",
            Some(&jwt),
            Some(json!({"title": "hi", "content": "first post", "tags": ["intro"]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["version"], 0);
        let post_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &app,
            Method::PATCH,
            &format!("/v1/posts/{post_id}"),
            Some(&jwt),
            Some(json!({"content": "edited", "version": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["version"], 1);

        let (status, _) = call(
            &app,
            Method::PATCH,
            &format!("/v1/posts/{post_id}"),
            Some(&jwt),
            Some(json!({"content": "stale", "version": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(
            &app,
            Method::POST,
            &format!("/v1/posts/{post_id}/comments"),
            Some(&jwt),
            Some(json!({"content": "nice"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(
            &app,
            Method::GET,
            "/v1/users/feed?tags=intro&limit=5",
            Some(&jwt),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["content"], "edited");
        assert_eq!(rows[0]["username"], "alice");
        assert_eq!(rows[0]["comments_count"], 1);
    }

    /// Register, activate and log in; returns the bearer token.
    async fn sign_up(app: &Router, username: &str) -> String {
        let email = format!("{username}@example.com");
        let (_, body) = call(
            app,
            Method::POST,
            "/v1/authentication/user",
            None,
            Some(json!({"username": username, "email": email, "password": "hunter22"})),
        )
        .await;
        let invite = body["data"]["token"].as_str().unwrap().to_string();
        call(app, Method::PUT, &format!("/v1/users/activate/{invite}"), None, None).await;
        let (_, body) = call(
            app,
            Method::POST,
            "/v1/authentication/token",
            None,
            Some(json!({"email": email, "password": "hunter22"})),
        )
        .await;
        body["data"]["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn bad_feed_params_are_400() {
        let app = build_app(AppState::fake());
        let jwt = sign_up(&app, "bob").await;

        for query in ["limit=50", "limit=abc", "sort=up", "tags=a,b,c,d,e,f"] {
            let (status, body) =
                call(&app, Method::GET, &format!("/v1/users/feed?{query}"), Some(&jwt), None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{query}");
            assert!(body["error"].is_string());
        }
    }

    async fn call_raw(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: &'static str,
    ) -> (StatusCode, String) {
        let mut req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let res = app.clone().oneshot(req.body(Body::from(body)).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn malformed_bodies_get_the_error_envelope() {
        let app = build_app(AppState::fake());

        for body in [r#"{"username":"a"}"#, "not json", r#"{"username":1,"email":2,"password":3}"#] {
            let (status, text) = call_raw(&app, Method::POST, "/v1/authentication/user", None, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert!(text.starts_with(r#"{"error""#), "{text}");
            let value: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(value["error"], "invalid request body");
        }

        let jwt = sign_up(&app, "carol").await;
        let (status, text) = call_raw(&app, Method::POST, "/v1/posts", Some(&jwt), r#"{"title":"t"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(text.starts_with(r#"{"error""#), "{text}");
    }

    #[tokio::test]
    async fn malformed_path_and_query_get_the_error_envelope() {
        let app = build_app(AppState::fake());
        let jwt = sign_up(&app, "dave").await;

        let (status, body) = call(&app, Method::PUT, "/v1/users/activate/x%FF", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid path parameter");

        for (method, uri) in [
            (Method::GET, "/v1/users/not-a-uuid"),
            (Method::GET, "/v1/posts/42"),
            (Method::PUT, "/v1/users/zzz/follow"),
        ] {
            let (status, body) = call(&app, method, uri, Some(&jwt), None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"], "invalid path parameter");
        }

        let (status, body) = call(&app, Method::GET, "/v1/users/feed?limit=1&limit=2", Some(&jwt), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid query string");
    }

    #[tokio::test]
    async fn follow_and_permissions_over_http() {
        let app = build_app(AppState::fake());
        let alice = sign_up(&app, "alice").await;
        let bob = sign_up(&app, "bob").await;

        let (_, body) = call(
            &app,
            Method::POST,
            "/v1/posts",
            Some(&bob),
            Some(json!({"title": "bob's", "content": "hello"})),
        )
        .await;
        let post_id = body["data"]["id"].as_str().unwrap().to_string();
        let bob_id = body["data"]["user_id"].as_str().unwrap().to_string();

        let (status, _) = call(&app, Method::PUT, &format!("/v1/users/{bob_id}/follow"), Some(&alice), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::PUT, &format!("/v1/users/{bob_id}/follow"), Some(&alice), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = call(&app, Method::GET, "/v1/users/feed", Some(&alice), None).await;
        assert_eq!(body["data"][0]["title"], "bob's");

        let (status, _) = call(
            &app,
            Method::PATCH,
            &format!("/v1/posts/{post_id}"),
            Some(&alice),
            Some(json!({"title": "hijacked", "version": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&app, Method::DELETE, &format!("/v1/posts/{post_id}"), Some(&alice), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = call(&app, Method::DELETE, &format!("/v1/users/{bob_id}"), Some(&alice), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = call(&app, Method::GET, &format!("/v1/posts/{post_id}"), Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "bob's");
        assert!(body["data"]["comments"].as_array().unwrap().is_empty());

        let (status, _) = call(&app, Method::PUT, &format!("/v1/users/{bob_id}/unfollow"), Some(&alice), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::DELETE, &format!("/v1/posts/{post_id}"), Some(&bob), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::DELETE, &format!("/v1/users/{bob_id}"), Some(&bob), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
