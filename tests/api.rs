use std::num::NonZeroUsize;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use base64::{Engine, engine::general_purpose::STANDARD};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use blogboard::application::services::{AppServices, ServiceLimits};
use blogboard::infra::db::DocumentRepositories;
use blogboard::infra::http::{self, ApiState, ListingDefaults};
use blogboard::infra::identity::StoreIdentityProvider;
use blogboard::infra::media::FsImageStore;
use blogboard::infra::store::memory::MemoryDocumentStore;
use blogboard::infra::store::{DocumentStore, Fields};

const MAX_IMAGE_BYTES: usize = 1024 * 1024;

struct TestApp {
    router: Router,
    store: Arc<MemoryDocumentStore>,
    _media: TempDir,
}

fn per_page(value: usize) -> NonZeroUsize {
    NonZeroUsize::new(value).expect("non-zero page size")
}

fn build_app() -> TestApp {
    build_app_with(Arc::new(MemoryDocumentStore::new()), Vec::new())
}

fn build_app_with(store: Arc<MemoryDocumentStore>, admin_emails: Vec<String>) -> TestApp {
    let media = TempDir::new().expect("media dir");
    let repositories = Arc::new(DocumentRepositories::new(store.clone()));
    let images = Arc::new(
        FsImageStore::new(media.path().to_path_buf(), "http://localhost").expect("image store"),
    );

    let services = AppServices::new(
        repositories,
        Arc::new(StoreIdentityProvider::new(store.clone())),
        images.clone(),
        ServiceLimits {
            max_image_bytes: MAX_IMAGE_BYTES,
            min_password_length: 6,
        },
    )
    .with_admin_emails(admin_emails);
    let state = ApiState {
        services,
        images,
        listing: ListingDefaults {
            posts_per_page: per_page(6),
            admin_posts_per_page: per_page(6),
            comments_per_page: per_page(5),
        },
    };

    TestApp {
        router: http::build_router(state, http::body_limit_for(MAX_IMAGE_BYTES)),
        store,
        _media: media,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("response body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// Registers an account and returns `(token, user_id)`.
    async fn register(&self, email: &str, name: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/api/v1/auth/register",
                None,
                json!({"email": email, "password": "secret-pass", "display_name": name}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        (
            body["token"].as_str().expect("token").to_string(),
            body["principal"]["id"].as_str().expect("user id").to_string(),
        )
    }

    async fn register_admin(&self, email: &str) -> String {
        let (token, user_id) = self.register(email, "Admin").await;
        let mut fields = Fields::new();
        fields.insert("role".into(), json!("admin"));
        self.store
            .merge("users", &user_id, fields)
            .await
            .expect("grant admin role");
        token
    }

    async fn create_post(&self, token: &str, title: &str, category_id: Option<&str>) -> String {
        let (status, body) = self
            .post(
                "/api/v1/posts",
                Some(token),
                json!({
                    "title": title,
                    "description": format!("{title} description"),
                    "content": format!("{title} content"),
                    "category_id": category_id,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create post failed: {body}");
        body["id"].as_str().expect("post id").to_string()
    }
}

fn titles(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .expect("items")
        .iter()
        .map(|card| card["post"]["title"].as_str().expect("title").to_string())
        .collect()
}

#[tokio::test]
async fn health_reports_no_content() {
    let app = build_app();
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn register_login_and_me_share_the_account() {
    let app = build_app();
    let (_, user_id) = app.register("reader@example.com", "Reader").await;

    let (status, login) = app
        .post(
            "/api/v1/auth/login",
            None,
            json!({"email": "reader@example.com", "password": "secret-pass"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = login["token"].as_str().expect("token");

    let (status, me) = app.get("/api/v1/me", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["principal"]["id"], json!(user_id));
    assert_eq!(me["profile"]["display_name"], json!("Reader"));
    assert_eq!(me["profile"]["role"], json!("member"));
}

#[tokio::test]
async fn accounts_and_admin_access_survive_a_restart() {
    let snapshot_dir = TempDir::new().expect("snapshot dir");
    let snapshot = snapshot_dir.path().join("board.json");

    let first = build_app();
    let (old_token, user_id) = first.register("owner@example.com", "Owner").await;
    first.store.save_snapshot(&snapshot).await.expect("save snapshot");

    let store = Arc::new(
        MemoryDocumentStore::load_snapshot(&snapshot)
            .await
            .expect("load snapshot"),
    );
    let restarted = build_app_with(store, vec!["owner@example.com".to_string()]);

    let (status, _) = restarted.get("/api/v1/me", Some(&old_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login) = restarted
        .post(
            "/api/v1/auth/login",
            None,
            json!({"email": "owner@example.com", "password": "secret-pass"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "login after restart failed: {login}");
    assert_eq!(login["principal"]["id"], json!(user_id));
    let token = login["token"].as_str().expect("token");

    let (status, me) = restarted.get("/api/v1/me", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["profile"]["display_name"], json!("Owner"));
    assert_eq!(me["profile"]["role"], json!("admin"));

    let (status, _) = restarted.get("/api/v1/admin/overview", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let app = build_app();
    app.register("reader@example.com", "Reader").await;

    let (status, body) = app
        .post(
            "/api/v1/auth/login",
            None,
            json!({"email": "reader@example.com", "password": "wrong-pass"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], json!("invalid_credentials"));
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = build_app();
    app.register("reader@example.com", "Reader").await;

    let (status, body) = app
        .post(
            "/api/v1/auth/register",
            None,
            json!({"email": "reader@example.com", "password": "another-pass"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], json!("email_taken"));
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = build_app();
    let (token, _) = app.register("reader@example.com", "Reader").await;

    let (status, _) = app
        .send(Method::POST, "/api/v1/auth/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get("/api/v1/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn anonymous_writes_require_sign_in() {
    let app = build_app();

    let (status, body) = app
        .post(
            "/api/v1/posts",
            None,
            json!({"title": "T", "description": "D", "content": "C"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], json!("unauthorized"));

    let (status, _) = app.get("/api/v1/posts", Some("bb_not-a-real-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, page) = app.get("/api/v1/posts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_items"], json!(0));
}

#[tokio::test]
async fn listing_searches_and_sorts_by_title() {
    let app = build_app();
    let (token, _) = app.register("writer@example.com", "Writer").await;
    app.create_post(&token, "Learning Rust", None).await;
    app.create_post(&token, "Async rust patterns", None).await;
    app.create_post(&token, "Gardening", None).await;

    let (status, page) = app
        .get("/api/v1/posts?search=RUST&sort=title&order=asc", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&page), vec!["Async rust patterns", "Learning Rust"]);
    assert_eq!(page["total_items"], json!(2));

    let (_, page) = app.get("/api/v1/posts?sort=title&order=desc", None).await;
    assert_eq!(
        titles(&page),
        vec!["Learning Rust", "Gardening", "Async rust patterns"]
    );
}

#[tokio::test]
async fn last_page_holds_the_remainder() {
    let app = build_app();
    let (token, _) = app.register("writer@example.com", "Writer").await;
    for index in 1..=5 {
        app.create_post(&token, &format!("Post {index}"), None).await;
    }

    let (status, page) = app
        .get("/api/v1/posts?sort=title&order=asc&per_page=2&page=3", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&page), vec!["Post 5"]);
    assert_eq!(page["page"], json!(3));
    assert_eq!(page["total_pages"], json!(3));

    let (_, page) = app
        .get("/api/v1/posts?sort=title&order=asc&per_page=2&page=9", None)
        .await;
    assert_eq!(page["page"], json!(3));
    assert_eq!(titles(&page), vec!["Post 5"]);
}

#[tokio::test]
async fn members_cannot_reach_admin_routes() {
    let app = build_app();
    let (token, _) = app.register("member@example.com", "Member").await;

    let (status, body) = app.get("/api/v1/admin/overview", Some(&token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], json!("forbidden"));

    let (status, _) = app
        .post("/api/v1/categories", Some(&token), json!({"name": "News"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deleting_a_category_clears_posts_but_keeps_them() {
    let app = build_app();
    let admin = app.register_admin("admin@example.com").await;

    let (status, category) = app
        .post("/api/v1/categories", Some(&admin), json!({"name": "News"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = category["id"].as_str().expect("category id").to_string();

    let (status, _) = app
        .post("/api/v1/categories", Some(&admin), json!({"name": "news"}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let first = app.create_post(&admin, "First", Some(&category_id)).await;
    let second = app.create_post(&admin, "Second", Some(&category_id)).await;

    let (status, listing) = app
        .get(&format!("/api/v1/posts?category={category_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["total_items"], json!(2));

    let (status, deleted) = app
        .send(
            Method::DELETE,
            &format!("/api/v1/categories/{category_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let mut cleared: Vec<String> = deleted["cleared_posts"]
        .as_array()
        .expect("cleared posts")
        .iter()
        .map(|id| id.as_str().expect("post id").to_string())
        .collect();
    cleared.sort();
    let mut expected = vec![first.clone(), second.clone()];
    expected.sort();
    assert_eq!(cleared, expected);

    for id in [&first, &second] {
        let (status, detail) = app.get(&format!("/api/v1/posts/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["post"]["category_id"], Value::Null);
    }

    let (_, categories) = app.get("/api/v1/categories", None).await;
    assert_eq!(categories, json!([]));
}

#[tokio::test]
async fn admin_edits_post_partially() {
    let app = build_app();
    let admin = app.register_admin("admin@example.com").await;
    let post_id = app.create_post(&admin, "Draft title", None).await;

    let (status, updated) = app
        .send(
            Method::PATCH,
            &format!("/api/v1/posts/{post_id}"),
            Some(&admin),
            Some(json!({"title": "Final title"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "update failed: {updated}");
    assert_eq!(updated["title"], json!("Final title"));
    assert_eq!(updated["content"], json!("Draft title content"));

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/v1/posts/{post_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.get(&format!("/api/v1/posts/{post_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], json!("not_found"));
}

#[tokio::test]
async fn like_toggles_twice_and_filters_listing() {
    let app = build_app();
    let (token, _) = app.register("reader@example.com", "Reader").await;
    let liked = app.create_post(&token, "Liked one", None).await;
    app.create_post(&token, "Other one", None).await;

    let like_uri = format!("/api/v1/posts/{liked}/like");
    let (status, first) = app.post(&like_uri, Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["active"], json!(true));
    assert_eq!(first["kind"], json!("liked"));

    let (_, page) = app.get("/api/v1/posts?filter=liked", Some(&token)).await;
    assert_eq!(titles(&page), vec!["Liked one"]);
    assert_eq!(page["items"][0]["liked"], json!(true));

    let (_, second) = app.post(&like_uri, Some(&token), json!({})).await;
    assert_eq!(second["active"], json!(false));

    let (_, page) = app.get("/api/v1/posts?filter=liked", Some(&token)).await;
    assert_eq!(page["total_items"], json!(0));

    let (status, _) = app.get("/api/v1/posts?filter=liked", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn comments_are_added_and_listed_newest_first() {
    let app = build_app();
    let (token, _) = app.register("reader@example.com", "Reader").await;
    let post_id = app.create_post(&token, "Discussed", None).await;
    let uri = format!("/api/v1/posts/{post_id}/comments");

    let (status, comment) = app.post(&uri, Some(&token), json!({"text": "first"})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["user_name"], json!("Reader"));
    app.post(&uri, Some(&token), json!({"text": "second"})).await;

    let (status, empty) = app.post(&uri, Some(&token), json!({"text": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{empty}");

    let (status, page) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_items"], json!(2));
    assert_eq!(page["items"][0]["text"], json!("second"));
    assert_eq!(page["items"][1]["text"], json!("first"));
}

#[tokio::test]
async fn uploaded_image_is_served_back() {
    let app = build_app();
    let (token, _) = app.register("writer@example.com", "Writer").await;

    let (status, post) = app
        .post(
            "/api/v1/posts",
            Some(&token),
            json!({
                "title": "With picture",
                "description": "d",
                "content": "c",
                "image": {"file_name": "Cover Photo.png", "data_base64": STANDARD.encode(b"png-bytes")},
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {post}");
    let image_url = post["image_url"].as_str().expect("image url");
    let path = image_url
        .strip_prefix("http://localhost")
        .expect("public base url prefix");
    assert!(path.starts_with("/media/images/"));
    assert!(path.ends_with("-cover-photo.png"));

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri(path)
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("media response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).expect("content type"),
        "image/png"
    );
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("media body")
        .to_bytes();
    assert_eq!(bytes.as_ref(), b"png-bytes");
}
