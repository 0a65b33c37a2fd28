use axum::{
    body::Bytes,
    extract::State,
    http::{ header::CONTENT_TYPE, Method, StatusCode },
    response::{ IntoResponse, Response },
    routing::any,
    Json,
    Router,
};
use governor::{ clock::DefaultClock, state::{ InMemoryState, NotKeyed }, Quota, RateLimiter };
use log::{ debug, error, warn };
use serde_json::{ json, Value };
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::cors::{ Any, CorsLayer };

pub const CHAT_ROUTE: &str = "/api/chat";

#[derive(Debug, Error)]
enum RelayError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub upstream_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub rate_limit_per_second: u32,
}

#[derive(Clone)]
pub struct RelayState {
    http: reqwest::Client,
    upstream_url: Arc<str>,
    api_key: Option<Arc<str>>,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RelayState {
    pub fn new(config: RelayConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let per_second = NonZeroU32::new(config.rate_limit_per_second).unwrap_or(NonZeroU32::MIN);
        Ok(Self {
            http,
            upstream_url: config.upstream_url.into(),
            api_key: config.api_key.filter(|k| !k.trim().is_empty()).map(Into::into),
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

pub fn router(state: RelayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route(CHAT_ROUTE, any(chat_handler))
        .layer(cors)
        .with_state(state)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn chat_handler(State(state): State<RelayState>, method: Method, body: Bytes) -> Response {
    if method != Method::POST {
        debug!("Rejected {} request to {}", method, CHAT_ROUTE);
        return error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    let Some(api_key) = state.api_key.clone() else {
        error!("Upstream API key is not configured; rejecting chat request");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "API Key not configured");
    };

    if state.limiter.check().is_err() {
        warn!("Global relay rate limit exceeded. Rejecting chat request.");
        return error_response(StatusCode::TOO_MANY_REQUESTS, "Too many requests");
    }

    match forward(&state, &api_key, body).await {
        Ok((status, data)) => {
            debug!("Upstream responded with {}", status);
            (status, Json(data)).into_response()
        }
        Err(e) => {
            error!("API Error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch AI response")
        }
    }
}

async fn forward(state: &RelayState, api_key: &str, body: Bytes) -> Result<(StatusCode, Value), RelayError> {
    let response = state.http
        .post(&*state.upstream_url)
        .header(CONTENT_TYPE, "application/json")
        .bearer_auth(api_key)
        .body(body)
        .send().await?;

    let status = response.status();
    let data: Value = response.json().await?;
    Ok((status, data))
}
