use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use http_body_util::BodyExt;
use snippetbox::modules::snippets::store::MemorySnippetStore;
use snippetbox::modules::users::store::MemoryUserStore;
use snippetbox::router::init_router;
use snippetbox::session::SESSION_COOKIE_NAME;
use snippetbox::state::AppState;
use snippetbox_config::SessionConfig;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

pub const PASSWORD: &str = "pa$$word123";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    #[allow(dead_code)]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }
}

/// The full router over in-memory stores, plus a one-cookie jar so
/// consecutive requests share a session like a browser would.
pub struct TestApp {
    router: Router,
    pub snippets: Arc<MemorySnippetStore>,
    pub users: Arc<MemoryUserStore>,
    session_cookie: Option<String>,
}

impl TestApp {
    pub fn new() -> Self {
        let snippets = Arc::new(MemorySnippetStore::default());
        let users = Arc::new(MemoryUserStore::default());
        let state = AppState::new(snippets.clone(), users.clone());

        let static_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("ui/static");
        let router = init_router(
            state,
            MemoryStore::default(),
            &SessionConfig::default(),
            &static_dir,
        );

        Self {
            router,
            snippets,
            users,
            session_cookie: None,
        }
    }

    #[allow(dead_code)]
    pub fn session_cookie(&self) -> Option<&str> {
        self.session_cookie.as_deref()
    }

    #[allow(dead_code)]
    pub fn forget_session(&mut self) {
        self.session_cookie = None;
    }

    pub async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let mut request = request;
        if let Some(cookie) = &self.session_cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            let pair = value.to_str().unwrap().split(';').next().unwrap().trim();
            if pair.starts_with(&format!("{SESSION_COOKIE_NAME}=")) {
                self.session_cookie = Some(pair.to_string());
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Posts `fields` exactly as given, with no CSRF token added.
    pub async fn post_form_raw(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = serde_urlencoded::to_string(fields).unwrap();
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    /// Fetches a fresh token for the current session, then posts `fields`
    /// with it.
    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let token = self.csrf_token().await;
        let mut fields = fields.to_vec();
        fields.push(("csrf_token", token.as_str()));
        self.post_form_raw(uri, &fields).await
    }

    pub async fn csrf_token(&mut self) -> String {
        let page = self.get("/user/login").await;
        extract_csrf_token(&page.body).expect("login page carries a CSRF token")
    }

    #[allow(dead_code)]
    pub async fn signup(&mut self, name: &str, email: &str, password: &str) -> TestResponse {
        self.post_form(
            "/user/signup",
            &[("name", name), ("email", email), ("password", password)],
        )
        .await
    }

    #[allow(dead_code)]
    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.post_form("/user/login", &[("email", email), ("password", password)])
            .await
    }

    /// Signs up a fresh user and logs in as them.
    #[allow(dead_code)]
    pub async fn login_new_user(&mut self) -> String {
        let email = generate_unique_email();
        let signup = self.signup("Test User", &email, PASSWORD).await;
        assert_eq!(signup.status, StatusCode::SEE_OTHER);

        let login = self.login(&email, PASSWORD).await;
        assert_eq!(login.status, StatusCode::SEE_OTHER);
        email
    }
}

pub fn extract_csrf_token(html: &str) -> Option<String> {
    let marker = r#"name="csrf_token" value=""#;
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('"')? + start;
    Some(html[start..end].to_string())
}

pub fn generate_unique_email() -> String {
    format!("test-{}@example.com", uuid::Uuid::new_v4())
}
