mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::TestApp;
use snippetbox::modules::snippets::store::SnippetStore;
use snippetbox_models::Snippet;

fn expired_snippet(id: i64) -> Snippet {
    let created = Utc::now() - Duration::days(8);
    Snippet {
        id,
        title: "Gone".to_string(),
        content: "This one has expired".to_string(),
        created,
        expires: created + Duration::days(7),
    }
}

#[tokio::test]
async fn test_home_lists_latest_unexpired_snippets() {
    let mut app = TestApp::new();
    app.snippets.seed(expired_snippet(1)).await;
    app.snippets
        .insert("An old silent pond", "A frog jumps into the pond", 7)
        .await
        .unwrap();

    let response = app.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("An old silent pond"));
    assert!(response.body.contains(r#"href="/snippet/view/2""#));
    assert!(!response.body.contains("Gone"));
}

#[tokio::test]
async fn test_home_with_no_snippets() {
    let mut app = TestApp::new();

    let response = app.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("nothing to see here... yet!"));
}

#[tokio::test]
async fn test_view_existing_snippet() {
    let mut app = TestApp::new();
    let id = app
        .snippets
        .insert("Over the wintry forest", "winds howl in rage", 1)
        .await
        .unwrap();

    let response = app.get(&format!("/snippet/view/{id}")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Over the wintry forest"));
    assert!(response.body.contains("winds howl in rage"));
}

#[tokio::test]
async fn test_view_missing_expired_or_invalid_id_is_not_found() {
    let mut app = TestApp::new();
    app.snippets.seed(expired_snippet(1)).await;

    for uri in [
        "/snippet/view/1",
        "/snippet/view/99",
        "/snippet/view/0",
        "/snippet/view/-1",
        "/snippet/view/1.23",
        "/snippet/view/foo",
        "/snippet/view/",
    ] {
        let response = app.get(uri).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_create_requires_login() {
    let mut app = TestApp::new();

    let response = app.get("/snippet/create").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/user/login"));

    let response = app
        .post_form(
            "/snippet/create",
            &[("title", "t"), ("content", "c"), ("expires", "7")],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/user/login"));
    assert_eq!(app.snippets.count().await, 0);
}

#[tokio::test]
async fn test_create_form_preselects_one_year() {
    let mut app = TestApp::new();
    app.login_new_user().await;

    let response = app.get("/snippet/create").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains(r#"value="365" checked"#));
    assert_eq!(
        response.headers.get("cache-control").unwrap(),
        "no-store"
    );
}

#[tokio::test]
async fn test_create_snippet_redirects_and_flashes_once() {
    let mut app = TestApp::new();
    app.login_new_user().await;

    let response = app
        .post_form(
            "/snippet/create",
            &[
                ("title", "O snail"),
                ("content", "Climb Mount Fuji,\nBut slowly, slowly!"),
                ("expires", "7"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/snippet/view/1"));

    let snippet = app.snippets.get(1).await.unwrap();
    assert_eq!(snippet.expires - snippet.created, Duration::days(7));

    let first = app.get("/snippet/view/1").await;
    assert_eq!(first.status, StatusCode::OK);
    assert!(first.body.contains("Snippet successfully created!"));

    let second = app.get("/snippet/view/1").await;
    assert!(!second.body.contains("Snippet successfully created!"));
}

#[tokio::test]
async fn test_create_accepts_each_permitted_expiry() {
    let mut app = TestApp::new();
    app.login_new_user().await;

    for days in ["1", "7", "365"] {
        let response = app
            .post_form(
                "/snippet/create",
                &[("title", "t"), ("content", "c"), ("expires", days)],
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "expires={days}");
    }
    assert_eq!(app.snippets.count().await, 3);
}

#[tokio::test]
async fn test_create_validation_errors() {
    let mut app = TestApp::new();
    app.login_new_user().await;
    let long_title = "a".repeat(101);

    let cases: [(&[(&str, &str)], &str); 4] = [
        (
            &[("title", ""), ("content", "c"), ("expires", "7")],
            "This field cannot be blank.",
        ),
        (
            &[("title", long_title.as_str()), ("content", "c"), ("expires", "7")],
            "This field cannot be more than 100 characters long.",
        ),
        (
            &[("title", "t"), ("content", "   "), ("expires", "7")],
            "This field cannot be blank.",
        ),
        (
            &[("title", "t"), ("content", "c"), ("expires", "30")],
            "This field must equal 1, 7 or 365.",
        ),
    ];

    for (fields, message) in cases {
        let response = app.post_form("/snippet/create", fields).await;

        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.body.matches(r#"class="error""#).count(), 1);
        assert!(response.body.contains(message));
    }
    assert_eq!(app.snippets.count().await, 0);
}

#[tokio::test]
async fn test_create_with_blank_expiry_is_unprocessable() {
    let mut app = TestApp::new();
    app.login_new_user().await;

    let response = app
        .post_form(
            "/snippet/create",
            &[("title", "t"), ("content", "c"), ("expires", "")],
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body.matches(r#"class="error""#).count(), 1);
    assert!(response.body.contains("This field must equal 1, 7 or 365."));
    assert_eq!(app.snippets.count().await, 0);
}

#[tokio::test]
async fn test_create_with_undecodable_expiry_is_bad_request() {
    let mut app = TestApp::new();
    app.login_new_user().await;

    let response = app
        .post_form(
            "/snippet/create",
            &[("title", "t"), ("content", "c"), ("expires", "soon")],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.snippets.count().await, 0);
}
