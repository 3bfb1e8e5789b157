use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::http::routes::{comments, health, reactions, replies};
use crate::state::AppState;

pub fn build(state: AppState) -> Router {
    let cors = build_cors(&state);
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);
    let mut router = Router::new()
        .route("/health", get(health::health))
        .route("/api/v1/comments", post(comments::create_comment))
        .route(
            "/api/v1/comments/with-media",
            post(comments::create_comment_with_media).layer(upload_limit),
        )
        .route("/api/v1/comments/reconcile", post(comments::reconcile))
        .route(
            "/api/v1/comments/advertisement/{advertisement_id}",
            get(comments::list_by_advertisement),
        )
        .route("/api/v1/comments/reply", post(replies::create_reply))
        .route(
            "/api/v1/comments/reply/with-media",
            post(replies::create_reply_with_media).layer(upload_limit),
        )
        .route(
            "/api/v1/comments/reply/comment/{comment_id}",
            get(replies::list_by_comment),
        )
        .route(
            "/api/v1/comments/reply/{id}",
            get(replies::get_reply)
                .put(replies::update_reply)
                .delete(replies::delete_reply),
        )
        .route("/api/v1/comments/reaction", post(reactions::add_reaction))
        .route(
            "/api/v1/comments/reaction/user",
            get(reactions::get_user_reaction),
        )
        .route(
            "/api/v1/comments/reaction/{id}",
            delete(reactions::remove_reaction),
        )
        .route(
            "/api/v1/comments/{id}",
            get(comments::get_comment)
                .put(comments::update_comment)
                .delete(comments::delete_comment),
        );

    let media = state.comments.media();
    if media.public_prefix().starts_with('/') {
        router = router.nest_service(media.public_prefix(), ServeDir::new(media.root()));
    }

    let mut router = router
        .layer(TraceLayer::new_for_http())
        .with_state(state);
    if let Some(cors) = cors {
        router = router.layer(cors);
    }
    router
}

fn build_cors(state: &AppState) -> Option<CorsLayer> {
    let mut origins = Vec::new();
    let mut allow_any = false;
    for origin in state.config.cors_allow_origins.iter() {
        if origin.trim() == "*" {
            allow_any = true;
            break;
        }
        match HeaderValue::from_str(origin.trim()) {
            Ok(value) => origins.push(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "invalid CORS origin ignored");
            }
        }
    }
    if !allow_any && origins.is_empty() {
        return None;
    }

    let cors = CorsLayer::new().allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ]);
    if allow_any {
        Some(cors.allow_origin(Any).allow_headers(Any))
    } else {
        Some(
            cors.allow_origin(AllowOrigin::list(origins))
                .allow_headers([CONTENT_TYPE]),
        )
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, Bytes};
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    const BOUNDARY: &str = "adboard-test-boundary";

    struct TestApp {
        router: Router,
        _uploads: tempfile::TempDir,
    }

    impl TestApp {
        fn new() -> Self {
            let uploads = tempfile::tempdir().unwrap();
            let router = build(AppState::in_memory(uploads.path()));
            TestApp {
                router,
                _uploads: uploads,
            }
        }

        async fn raw(&self, request: Request<Body>) -> (StatusCode, Bytes) {
            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            (status, bytes)
        }

        async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
            let (status, bytes) = self.raw(request).await;
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn get(&self, uri: &str) -> (StatusCode, Value) {
            self.send(Request::get(uri).body(Body::empty()).unwrap())
                .await
        }

        async fn json(&self, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            self.send(request).await
        }

        async fn delete(&self, uri: &str) -> (StatusCode, Value) {
            self.send(Request::delete(uri).body(Body::empty()).unwrap())
                .await
        }

        async fn create_comment(&self, advertisement_id: &str) -> Value {
            let (status, body) = self
                .json(
                    Method::POST,
                    "/api/v1/comments",
                    json!({
                        "advertisementId": advertisement_id,
                        "authorId": "u1",
                        "content": "hi",
                        "commentType": "Text"
                    }),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            body
        }
    }

    fn multipart(fields: &[(&str, &str)], file: (&str, &str, &[u8])) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        let (file_name, content_type, bytes) = file;
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"media\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        Request::post("/api/v1/comments/with-media")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_memory_backend() {
        let app = TestApp::new();
        let (status, body) = app.get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["modules"]["store"]["backend"], "memory");
        assert_eq!(body["modules"]["media"]["public_prefix"], "/uploads");
    }

    #[tokio::test]
    async fn comment_crud_over_http() {
        let app = TestApp::new();
        let created = app.create_comment("ad-1").await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(id.len(), 24);
        assert_eq!(created["likeCount"], 0);
        assert_eq!(created["replyCount"], 0);
        assert_eq!(created["mediaUrl"], Value::Null);

        let (status, fetched) = app.get(&format!("/api/v1/comments/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, updated) = app
            .json(
                Method::PUT,
                &format!("/api/v1/comments/{id}"),
                json!({ "content": "edited", "commentType": "Emoticon" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["content"], "edited");
        assert_eq!(updated["commentType"], "Emoticon");

        let (status, _) = app.delete(&format!("/api/v1/comments/{id}")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = app.get(&format!("/api/v1/comments/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains(&id));
    }

    #[tokio::test]
    async fn bad_ids_and_paging_are_rejected() {
        let app = TestApp::new();
        let (status, body) = app.get("/api/v1/comments/not-an-id").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = app
            .get("/api/v1/comments/advertisement/ad-1?page=0")
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = app
            .get("/api/v1/comments/advertisement/ad-1?limit=ten")
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .json(
                Method::POST,
                "/api/v1/comments",
                json!({ "advertisementId": "ad-1", "authorId": "u1", "content": "x", "commentType": "Audio" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn listing_uses_default_page_and_world_id_alias() {
        let app = TestApp::new();
        for _ in 0..3 {
            app.create_comment("ad-1").await;
        }
        let (status, _) = app
            .json(
                Method::POST,
                "/api/v1/comments",
                json!({ "advertisementId": "ad-1", "worldId": "w-7", "content": "legacy", "commentType": "Text" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, page) = app.get("/api/v1/comments/advertisement/ad-1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["total"], 4);
        assert_eq!(page["page"], 1);
        assert_eq!(page["limit"], 10);
        assert_eq!(page["comments"][0]["authorId"], "w-7");

        let (_, page) = app
            .get("/api/v1/comments/advertisement/ad-1?page=2&limit=3")
            .await;
        assert_eq!(page["comments"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn replies_and_reactions_over_http() {
        let app = TestApp::new();
        let comment = app.create_comment("ad-1").await;
        let comment_id = comment["id"].as_str().unwrap().to_string();

        let (status, reply) = app
            .json(
                Method::POST,
                "/api/v1/comments/reply",
                json!({ "commentId": comment_id, "authorId": "u2", "content": "yo", "commentType": "Text" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(reply["commentId"], comment_id.as_str());
        let (_, fetched) = app.get(&format!("/api/v1/comments/{comment_id}")).await;
        assert_eq!(fetched["replyCount"], 1);

        let (status, replies) = app
            .get(&format!("/api/v1/comments/reply/comment/{comment_id}"))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(replies["total"], 1);

        let (status, reaction) = app
            .json(
                Method::POST,
                "/api/v1/comments/reaction",
                json!({ "targetId": comment_id, "targetType": "Comment", "authorId": "u2", "reactionType": "Like" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let reaction_id = reaction["id"].as_str().unwrap().to_string();

        let (status, mine) = app
            .get(&format!(
                "/api/v1/comments/reaction/user?targetId={comment_id}&targetType=Comment&authorId=u2"
            ))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine["id"], reaction_id.as_str());
        assert_eq!(mine["reactionType"], "Like");

        let (status, _) = app
            .delete(&format!("/api/v1/comments/reaction/{reaction_id}"))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, mine) = app
            .get(&format!(
                "/api/v1/comments/reaction/user?targetId={comment_id}&targetType=Comment&worldId=u2"
            ))
            .await;
        assert_eq!(mine, Value::Null);

        let (status, _) = app
            .get(&format!(
                "/api/v1/comments/reaction/user?targetId={comment_id}&targetType=Comment"
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let reply_id = reply["id"].as_str().unwrap();
        let (status, _) = app
            .delete(&format!("/api/v1/comments/reply/{reply_id}"))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, fetched) = app.get(&format!("/api/v1/comments/{comment_id}")).await;
        assert_eq!(fetched["replyCount"], 0);
        assert_eq!(fetched["likeCount"], 0);
    }

    #[tokio::test]
    async fn reconcile_returns_refreshed_target() {
        let app = TestApp::new();
        let comment = app.create_comment("ad-1").await;
        let comment_id = comment["id"].as_str().unwrap();

        let (status, body) = app
            .json(
                Method::POST,
                "/api/v1/comments/reconcile",
                json!({ "targetType": "Comment", "targetId": comment_id }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["targetType"], "Comment");
        assert_eq!(body["target"]["id"], comment_id);

        let (status, _) = app
            .json(
                Method::POST,
                "/api/v1/comments/reconcile",
                json!({ "targetType": "Advertisement", "targetId": comment_id }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn media_upload_is_served_back() {
        let app = TestApp::new();
        let fields = [
            ("advertisementId", "ad-1"),
            ("authorId", "u1"),
            ("content", "look"),
            ("commentType", "Image"),
        ];
        let (status, comment) = app
            .send(multipart(&fields, ("cat.png", "image/png", b"not really a png")))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let media_url = comment["mediaUrl"].as_str().unwrap().to_string();
        assert!(media_url.starts_with("/uploads/comments/"));

        let (status, bytes) = app
            .raw(Request::get(media_url.as_str()).body(Body::empty()).unwrap())
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&bytes[..], b"not really a png");
    }

    #[tokio::test]
    async fn unsupported_media_is_a_bad_request() {
        let app = TestApp::new();
        let fields = [
            ("advertisementId", "ad-1"),
            ("authorId", "u1"),
            ("content", "doc"),
            ("commentType", "Image"),
        ];
        let (status, body) = app
            .send(multipart(&fields, ("doc.pdf", "application/pdf", b"%PDF-1.7")))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("application/pdf"));

        let (_, page) = app.get("/api/v1/comments/advertisement/ad-1").await;
        assert_eq!(page["total"], 0);
    }

    #[tokio::test]
    async fn uploads_over_the_body_limit_are_rejected() {
        let app = TestApp::new();
        let limit = crate::config::AppConfig::for_tests(app._uploads.path()).max_upload_bytes;
        let fields = [
            ("advertisementId", "ad-1"),
            ("authorId", "u1"),
            ("content", "big"),
            ("commentType", "Image"),
        ];

        let oversized = vec![0u8; limit * 2];
        let (status, body) = app
            .send(multipart(&fields, ("big.png", "image/png", &oversized)))
            .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["error"].is_string());

        let fits = vec![0u8; limit / 2];
        let (status, comment) = app
            .send(multipart(&fields, ("small.png", "image/png", &fits)))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(comment["mediaUrl"].as_str().is_some());

        let (_, page) = app.get("/api/v1/comments/advertisement/ad-1").await;
        assert_eq!(page["total"], 1);
    }
}
