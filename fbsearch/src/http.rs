use crate::error::SearchError;
use crate::types::*;
use crate::tools::web_top_limit;
use crate::{mcp, AppState};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

type ApiResult<T> = Result<Json<ResultsResponse<T>>, (StatusCode, Json<ErrorResponse>)>;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/search/places", post(places_handler))
        .route("/search/top", post(top_handler))
        .route("/search/users", post(users_handler))
        .route("/search/music", post(music_handler))
        .route("/search/hashtags", post(hashtags_handler))
        .route("/search/suggested", post(suggested_handler))
        .route("/search/recent", get(recent_handler))
        .route("/search/web-top", post(web_top_handler))
        .route("/mcp/tools", get(mcp::list_tools))
        .route("/mcp/call", post(mcp::call_tool))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "fbsearch",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn respond<T>(what: &str, outcome: Result<Vec<T>, SearchError>) -> ApiResult<T> {
    match outcome {
        Ok(results) => Ok(Json(results.into())),
        Err(e) => {
            error!("{} error: {}", what, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

async fn places_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlacesRequest>,
) -> ApiResult<Location> {
    let outcome = state
        .client
        .fbsearch_places(&request.query, request.lat, request.lng)
        .await;
    respond("Places search", outcome)
}

async fn top_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> ApiResult<TopSearchItem> {
    respond(
        "Top search",
        state.client.fbsearch_topsearch_flat(&request.query).await,
    )
}

async fn users_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> ApiResult<UserShort> {
    respond("User search", state.client.search_users(&request.query).await)
}

async fn music_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> ApiResult<Track> {
    respond("Music search", state.client.search_music(&request.query).await)
}

async fn hashtags_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> ApiResult<Hashtag> {
    respond(
        "Hashtag search",
        state.client.search_hashtags(&request.query).await,
    )
}

async fn suggested_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SuggestedRequest>,
) -> ApiResult<UserShort> {
    respond(
        "Suggested profiles",
        state
            .client
            .fbsearch_suggested_profiles(&request.user_id)
            .await,
    )
}

async fn recent_handler(State(state): State<Arc<AppState>>) -> ApiResult<RecentSearch> {
    respond("Recent searches", state.client.fbsearch_recent().await)
}

async fn web_top_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<WebTopRequest>,
) -> ApiResult<Media> {
    let limit = web_top_limit(request.limit).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;
    respond(
        "Web top search",
        state
            .client
            .fbsearch_web_top_serp(&request.query, limit)
            .await,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionContext;
    use crate::search::SearchClient;
    use crate::testing::ScriptedTransport;
    use crate::transport::Transport;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(transport: Arc<ScriptedTransport>) -> Router {
        let transport: Arc<dyn Transport> = transport;
        let client = SearchClient::new(transport, SessionContext::new(0, "s"));
        router(Arc::new(AppState::new(client)))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_service() {
        let response = app(Arc::new(ScriptedTransport::new(vec![])))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn user_search_returns_counted_results() {
        let transport = Arc::new(ScriptedTransport::new(vec![json!({"users": [
            {"pk": 1, "username": "a"}, {"pk": 2, "username": "b"}
        ]})]));
        let response = app(transport.clone())
            .oneshot(post_json("/search/users", json!({"query": "ab"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["results"][1]["username"], "b");
        assert_eq!(transport.calls()[0].params["q"], "ab");
    }

    #[tokio::test]
    async fn web_top_limit_above_service_maximum_is_rejected() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let response = app(transport.clone())
            .oneshot(post_json(
                "/search/web-top",
                json!({"query": "cats", "limit": 1_000_000}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("maximum of 1000"));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn search_failure_maps_to_500() {
        let response = app(Arc::new(ScriptedTransport::failing()))
            .oneshot(Request::builder().uri("/search/recent").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("status 500"));
    }
}
