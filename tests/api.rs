mod support;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use inkpost::domain::types::UserRole;
use inkpost::infra::http::build_router;

use support::{MemoryStore, api_state, enabled_cache};

fn app(store: &Arc<MemoryStore>) -> Router {
    build_router(api_state(store, enabled_cache()))
}

fn request(method: Method, uri: &str, user: Option<Uuid>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request should build")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

#[tokio::test]
async fn post_lifecycle_over_http() {
    let store = MemoryStore::new();
    let author = store.seed_profile("Ada", UserRole::User);
    let app = app(&store);

    let (status, created) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/posts",
            Some(author.id),
            Some(json!({
                "title": "Over the wire",
                "content": "First paragraph.\n\nSecond.",
                "tags": ["http", " http ", "axum"]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["excerpt"], "First paragraph.");
    assert_eq!(created["tags"], json!(["http", "axum"]));
    assert_eq!(created["comments_count"], 0);
    assert_eq!(created["author"]["name"], "Ada");
    assert_eq!(created["author"]["bio"], "");
    let id = created["id"].as_str().expect("post id").to_string();

    let (status, listed) = send(&app, request(Method::GET, "/api/v1/posts", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["id"], id.as_str());

    let (status, updated) = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/v1/posts/{id}"),
            Some(author.id),
            Some(json!({ "title": "Renamed" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Renamed");

    let (status, comment) = send(
        &app,
        request(
            Method::POST,
            &format!("/api/v1/posts/{id}/comments"),
            Some(author.id),
            Some(json!({ "content": "first!" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["content"], "first!");

    let (status, fetched) = send(
        &app,
        request(Method::GET, &format!("/api/v1/posts/{id}"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["comments_count"], 1);

    let (status, _) = send(
        &app,
        request(
            Method::DELETE,
            &format!("/api/v1/posts/{id}"),
            Some(author.id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        request(Method::GET, &format!("/api/v1/posts/{id}"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn anonymous_comment_is_unauthorized() {
    let store = MemoryStore::new();
    let author = store.seed_profile("Ada", UserRole::User);
    let post = store.seed_post(author.id, "Members only");
    let app = app(&store);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            &format!("/api/v1/posts/{}/comments", post.id),
            None,
            Some(json!({ "content": "hi" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");
    assert_eq!(store.comment_count(), 0);
}

#[tokio::test]
async fn unknown_or_malformed_identity_is_rejected() {
    let store = MemoryStore::new();
    let app = app(&store);

    let (status, _) = send(
        &app,
        request(Method::GET, "/api/v1/posts", Some(Uuid::new_v4()), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let malformed = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/posts")
        .header("x-user-id", "not-a-uuid")
        .body(Body::empty())
        .expect("request should build");
    let (status, body) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn validation_failures_carry_a_hint() {
    let store = MemoryStore::new();
    let author = store.seed_profile("Ada", UserRole::User);
    let app = app(&store);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/posts",
            Some(author.id),
            Some(json!({ "title": "  ", "content": "body" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_input");
    assert_eq!(body["error"]["hint"], "title must not be empty");
}

#[tokio::test]
async fn stranger_cannot_delete_post() {
    let store = MemoryStore::new();
    let author = store.seed_profile("Ada", UserRole::User);
    let stranger = store.seed_profile("Mallory", UserRole::User);
    let post = store.seed_post(author.id, "Mine");
    let app = app(&store);

    let (status, body) = send(
        &app,
        request(
            Method::DELETE,
            &format!("/api/v1/posts/{}", post.id),
            Some(stranger.id),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "forbidden");
}

#[tokio::test]
async fn profiles_and_analytics_endpoints() {
    let store = MemoryStore::new();
    let app = app(&store);
    let id = Uuid::new_v4();

    let (status, created) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/profiles",
            Some(id),
            Some(json!({
                "name": "Grace",
                "email": "grace@example.com"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], id.to_string());
    assert_eq!(created["role"], "user");

    let (status, updated) = send(
        &app,
        request(
            Method::PATCH,
            &format!("/api/v1/profiles/{id}"),
            Some(id),
            Some(json!({ "bio": "Compiler pioneer" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["bio"], "Compiler pioneer");

    let (status, fetched) = send(
        &app,
        request(Method::GET, &format!("/api/v1/profiles/{id}"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Grace");

    let (status, summary) = send(&app, request(Method::GET, "/api/v1/analytics", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        summary,
        json!({
            "total_posts": 0,
            "total_comments": 0,
            "total_users": 1,
            "total_views": 0
        })
    );
}

#[tokio::test]
async fn health_reflects_store_ping() {
    let store = MemoryStore::new();
    let app = app(&store);

    let (status, _) = send(&app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    store.fail_pings(true);
    let (status, _) = send(&app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn profile_registration_requires_the_matching_subject() {
    let store = MemoryStore::new();
    let app = app(&store);
    let subject = Uuid::new_v4();
    let victim = Uuid::new_v4();
    let body = |id: Uuid| {
        Some(json!({
            "id": id,
            "name": "Mallory",
            "email": "mallory@example.com"
        }))
    };

    let (status, anonymous) = send(
        &app,
        request(Method::POST, "/api/v1/profiles", None, body(victim)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous["error"]["code"], "unauthorized");

    let (status, _) = send(
        &app,
        request(Method::POST, "/api/v1/profiles", Some(subject), body(victim)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        request(Method::GET, &format!("/api/v1/profiles/{victim}"), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, created) = send(
        &app,
        request(Method::POST, "/api/v1/profiles", Some(subject), body(subject)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], subject.to_string());
}

async fn publish(app: &Router, author: Uuid, title: &str, tags: &[&str]) -> String {
    let (status, created) = send(
        app,
        request(
            Method::POST,
            "/api/v1/posts",
            Some(author),
            Some(json!({
                "title": title,
                "content": format!("All about {title}."),
                "tags": tags
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    created["id"].as_str().expect("post id").to_string()
}

fn titles(body: &Value) -> Vec<&str> {
    body.as_array()
        .expect("post array")
        .iter()
        .map(|post| post["title"].as_str().expect("title"))
        .collect()
}

#[tokio::test]
async fn post_list_search_tag_and_sort() {
    let store = MemoryStore::new();
    let ada = store.seed_profile("Ada", UserRole::User);
    let grace = store.seed_profile("Grace", UserRole::User);
    let app = app(&store);

    publish(&app, ada.id, "Lifetimes", &["rust"]).await;
    let compilers = publish(&app, grace.id, "Compilers", &["rust", "history"]).await;
    publish(&app, grace.id, "Tea", &["life"]).await;
    store.set_views(compilers.parse().expect("post uuid"), 5);

    let (status, newest) = send(&app, request(Method::GET, "/api/v1/posts", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&newest), ["Tea", "Compilers", "Lifetimes"]);

    let (_, oldest) = send(
        &app,
        request(Method::GET, "/api/v1/posts?sort=oldest", None, None),
    )
    .await;
    assert_eq!(titles(&oldest), ["Lifetimes", "Compilers", "Tea"]);

    let (_, popular) = send(
        &app,
        request(Method::GET, "/api/v1/posts?sort=popular", None, None),
    )
    .await;
    assert_eq!(titles(&popular), ["Compilers", "Tea", "Lifetimes"]);

    let (_, by_author) = send(
        &app,
        request(Method::GET, "/api/v1/posts?search=GRACE", None, None),
    )
    .await;
    assert_eq!(titles(&by_author), ["Tea", "Compilers"]);

    let (_, tagged) = send(
        &app,
        request(Method::GET, "/api/v1/posts?tag=rust&search=about", None, None),
    )
    .await;
    assert_eq!(titles(&tagged), ["Compilers", "Lifetimes"]);

    let (status, bad_sort) = send(
        &app,
        request(Method::GET, "/api/v1/posts?sort=random", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_sort["error"]["code"], "invalid_input");

    let (status, tags) = send(&app, request(Method::GET, "/api/v1/tags", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags, json!(["history", "life", "rust"]));
}
