pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/analyze", post(handlers::handle_analyze))
        .route("/api/v1/report/:username", get(handlers::handle_report))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::analysis::pipeline::tests::{pipeline, FakeFetcher, FixedModel, LIVE_REPLY};
    use crate::analysis::rate_limit::{RateLimiter, WINDOW};
    use crate::github::FetchError;

    fn router(limiter: RateLimiter, fetcher: Arc<FakeFetcher>) -> Router {
        let pipeline = pipeline(limiter, fetcher, Some(FixedModel::new(LIVE_REPLY)));
        build_router(AppState {
            pipeline: Arc::new(pipeline),
        })
    }

    fn analyze_request(body: Value) -> Request<Body> {
        Request::post("/api/v1/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(RateLimiter::default(), FakeFetcher::found());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "hireability-api");
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_returns_report() {
        let app = router(RateLimiter::default(), FakeFetcher::found());
        let response = app
            .oneshot(analyze_request(json!({ "username": "github.com/octocat" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["total_score"], 64);
        assert_eq!(body["data"]["recruiter_verdict"], "Interview");
        assert_eq!(body["profileData"]["user"]["login"], "octocat");
        assert!(body["data"].get("isMockData").is_none());
        assert!(body.get("error").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_string_username_is_bad_request() {
        let app = router(RateLimiter::default(), FakeFetcher::found());
        let response = app
            .oneshot(analyze_request(json!({ "username": 42 })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(
            body["error"],
            "Please enter a valid GitHub username or profile URL."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_body_is_invalid_input_after_admission() {
        let fetcher = FakeFetcher::found();
        let app = router(RateLimiter::new(2, WINDOW), fetcher.clone());

        let malformed = Request::post("/api/v1/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::from("{not json"))
            .unwrap();
        let no_content_type = Request::post("/api/v1/analyze")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::from(r#"{"username": "octocat"}"#))
            .unwrap();

        for request in [malformed, no_content_type] {
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = json_body(response).await;
            assert_eq!(
                body,
                json!({
                    "success": false,
                    "error": "Please enter a valid GitHub username or profile URL."
                })
            );
        }

        // Both rejected bodies consumed the client's two admissions.
        let denied = app
            .oneshot(analyze_request(json!({ "username": "octocat" })))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            fetcher.calls.load(std::sync::atomic::Ordering::SeqCst),
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_client_gets_retry_after() {
        let app = router(RateLimiter::new(1, WINDOW), FakeFetcher::found());

        let first = app
            .clone()
            .oneshot(analyze_request(json!({ "username": "octocat" })))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(analyze_request(json!({ "username": "octocat" })))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(second.headers()[header::RETRY_AFTER], "60");
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_route_maps_missing_user_to_404() {
        let app = router(
            RateLimiter::default(),
            FakeFetcher::failing(|| FetchError::NotFound),
        );
        let response = app
            .oneshot(
                Request::get("/api/v1/report/ghost-user")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(
            body["error"],
            "GitHub user \"ghost-user\" not found. Please check the username and try again."
        );
    }
}
