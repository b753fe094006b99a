//! HTTP request handlers
//!
//! Login flow, the viewer page and embedded static assets.

use axum::{
    extract::{Form, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use deskview_auth::SESSION_COOKIE;
use deskview_web::Assets;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::broadcast::AppState;

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/login", get(login_page_handler).post(login_handler))
        .route("/logout", get(logout_handler))
        .route("/ws", get(crate::websocket::viewer_ws_handler))
        .route("/assets/*path", get(asset_handler))
        .with_state(state)
}

/// The user behind the request's session cookie, if logged in
pub(crate) async fn session_user(state: &AppState, jar: &CookieJar) -> Option<String> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    state.sessions.user(&token).await
}

/// Serve the viewer page to logged-in users
async fn index_handler(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if session_user(&state, &jar).await.is_none() {
        return Redirect::to("/login?next=/").into_response();
    }

    match Assets::get("index.html") {
        Some(content) => Html(content.data.to_vec()).into_response(),
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Serve assets from /assets/ path
async fn asset_handler(Path(path): Path<String>) -> Response {
    serve_asset(&format!("assets/{}", path.trim_start_matches('/')))
}

fn serve_asset(path: &str) -> Response {
    let path = path.trim_start_matches('/');

    debug!("Serving asset: {}", path);

    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path)
                .first_or_octet_stream()
                .to_string();

            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime)],
                content.data.to_vec(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct LoginQuery {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
    #[serde(default)]
    next: Option<String>,
}

async fn login_page_handler(Query(query): Query<LoginQuery>) -> Html<String> {
    Html(login_page(safe_next(query.next.as_deref()), None))
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next(form.next.as_deref());

    if !state.credentials.authenticate(&form.username, &form.password) {
        warn!("Failed login attempt for user '{}'", form.username);
        return Html(login_page(next, Some("Invalid username or password."))).into_response();
    }

    let token = state.sessions.create(&form.username).await;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    info!("User '{}' logged in", form.username);
    (jar.add(cookie), Redirect::to(next)).into_response()
}

async fn logout_handler(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(cookie.value()).await;
    }

    let cookie = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (jar.remove(cookie), Redirect::to("/login")).into_response()
}

/// Only same-site absolute paths are followed after login
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn login_page(next: &str, error: Option<&str>) -> String {
    let error_html = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, html_escape(e)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>deskview - Login</title>
<style>
body {{ font-family: sans-serif; background: #1e1e1e; color: #eee; display: flex; justify-content: center; align-items: center; height: 100vh; margin: 0; }}
form {{ background: #2b2b2b; padding: 2em; border-radius: 8px; display: flex; flex-direction: column; gap: 0.8em; min-width: 260px; }}
input {{ padding: 0.5em; border: 1px solid #555; border-radius: 4px; background: #1e1e1e; color: #eee; }}
button {{ padding: 0.6em; border: 0; border-radius: 4px; background: #3d7eff; color: #fff; cursor: pointer; }}
.error {{ color: #ff6b6b; margin: 0; }}
</style>
</head>
<body>
<form method="post" action="/login">
<h2>deskview</h2>
{error_html}
<input type="text" name="username" placeholder="Username" autocomplete="username" required autofocus>
<input type="password" name="password" placeholder="Password" autocomplete="current-password" required>
<input type="hidden" name="next" value="{next}">
<button type="submit">Log in</button>
</form>
</body>
</html>
"#,
        error_html = error_html,
        next = html_escape(next),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Broadcaster, SourceFactory, StreamSession};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use deskview_auth::Credentials;
    use deskview_core::{Config, Error};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let config = Config::new();
        let broadcaster = Broadcaster::new();
        let factory: SourceFactory =
            Arc::new(|| Err(Error::CaptureError("no display in tests".to_string())));
        let stream = StreamSession::new(config.clone(), factory, broadcaster.clone());
        let (input_tx, _) = mpsc::channel(8);
        Arc::new(AppState::new(
            config,
            (1920, 1080),
            broadcaster,
            stream,
            input_tx,
            Credentials::new("admin", "secret"),
        ))
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn login(form: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap()
    }

    fn header_value<'a>(response: &'a Response, name: header::HeaderName) -> &'a str {
        response.headers()[name].to_str().unwrap()
    }

    /// Log in and return the `name=value` cookie pair
    async fn logged_in_cookie(state: &Arc<AppState>) -> String {
        let response = create_router(state.clone())
            .oneshot(login("username=admin&password=secret"))
            .await
            .unwrap();
        let set_cookie = header_value(&response, header::SET_COOKIE);
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_index_redirects_to_login() {
        let response = create_router(test_state())
            .oneshot(get("/", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(header_value(&response, header::LOCATION), "/login?next=/");
    }

    #[tokio::test]
    async fn test_index_served_after_login() {
        let state = test_state();
        let cookie = logged_in_cookie(&state).await;

        let response = create_router(state)
            .oneshot(get("/", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ws_requires_session() {
        let response = create_router(test_state())
            .oneshot(get("/ws", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = create_router(test_state())
            .oneshot(get("/ws", Some("deskview_session=forged")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_ws_with_session_passes_auth() {
        let state = test_state();
        let cookie = logged_in_cookie(&state).await;

        // Not a real upgrade, so the request fails past the session check
        let response = create_router(state)
            .oneshot(get("/ws", Some(&cookie)))
            .await
            .unwrap();
        assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_sets_cookie_and_redirects() {
        let state = test_state();
        let response = create_router(state.clone())
            .oneshot(login("username=admin&password=secret&next=%2Fassets%2Fviewer.js"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(header_value(&response, header::LOCATION), "/assets/viewer.js");

        let set_cookie = header_value(&response, header::SET_COOKIE);
        assert!(set_cookie.starts_with("deskview_session="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("Path=/"));
        assert_eq!(state.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn test_login_ignores_offsite_next() {
        let response = create_router(test_state())
            .oneshot(login("username=admin&password=secret&next=https%3A%2F%2Fevil.example"))
            .await
            .unwrap();
        assert_eq!(header_value(&response, header::LOCATION), "/");
    }

    #[tokio::test]
    async fn test_failed_login_shows_error() {
        let state = test_state();
        let response = create_router(state.clone())
            .oneshot(login("username=admin&password=wrong"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert!(state.sessions.is_empty().await);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&body).contains("Invalid username or password."));
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let state = test_state();
        let cookie = logged_in_cookie(&state).await;

        let response = create_router(state.clone())
            .oneshot(get("/logout", Some(&cookie)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(header_value(&response, header::LOCATION), "/login");
        assert!(header_value(&response, header::SET_COOKIE).starts_with("deskview_session="));
        assert!(state.sessions.is_empty().await);

        let response = create_router(state)
            .oneshot(get("/", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_asset_content_type() {
        let response = create_router(test_state())
            .oneshot(get("/assets/viewer.js", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(header_value(&response, header::CONTENT_TYPE).contains("javascript"));
    }

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(None), "/");
        assert_eq!(safe_next(Some("/")), "/");
        assert_eq!(safe_next(Some("/assets/app.js")), "/assets/app.js");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(Some("")), "/");
    }

    #[test]
    fn test_login_page_escapes_next() {
        let page = login_page("/\"><script>", None);
        assert!(page.contains(r#"value="/&quot;&gt;&lt;script&gt;""#));
        assert!(!page.contains("<script>"));
        assert!(!page.contains("class=\"error\""));
    }

    #[test]
    fn test_login_page_error() {
        let page = login_page("/", Some("Invalid username or password."));
        assert!(page.contains("Invalid username or password."));
    }
}
