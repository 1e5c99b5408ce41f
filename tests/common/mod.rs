// Shared fixtures for the integration tests
#![allow(dead_code)]

use std::{
    convert::Infallible,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::post,
};
use faq_relay::{
    email::Mailer,
    error::AppError,
    models::{ContactForm, JobPosting, NewsItem, SiteSetting},
    rate_limit::RateLimiter,
    relay::CompletionClient,
    state::AppState,
    store::ContentStore,
};
use serde_json::Value;
use tokio::net::TcpListener;

/// In-memory store. `None` for a table makes its query fail.
#[derive(Default)]
pub struct MockStore {
    pub news: Option<Vec<NewsItem>>,
    pub jobs: Option<Vec<JobPosting>>,
    pub contact: Option<Vec<SiteSetting>>,
    pub fail_insert: bool,
    pub calls: AtomicUsize,
    pub submissions: Mutex<Vec<ContactForm>>,
}

impl MockStore {
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self {
            news: Some(vec![]),
            jobs: Some(vec![]),
            contact: Some(vec![]),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer<T: Clone>(&self, rows: &Option<Vec<T>>) -> Result<Vec<T>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        rows.clone()
            .ok_or_else(|| AppError::Store("connection refused".into()))
    }
}

#[async_trait]
impl ContentStore for MockStore {
    async fn latest_news(&self, limit: usize) -> Result<Vec<NewsItem>, AppError> {
        self.answer(&self.news)
            .map(|rows| rows.into_iter().take(limit).collect())
    }

    async fn open_jobs(&self) -> Result<Vec<JobPosting>, AppError> {
        self.answer(&self.jobs)
    }

    async fn contact_settings(&self, _keys: &[&str]) -> Result<Vec<SiteSetting>, AppError> {
        self.answer(&self.contact)
    }

    async fn insert_contact_submission(&self, form: &ContactForm) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert {
            return Err(AppError::Store("insert failed".into()));
        }
        self.submissions.lock().unwrap().push(form.clone());
        Ok(())
    }
}

/// What the fake completion and email endpoints answer with.
#[derive(Clone)]
pub struct UpstreamConfig {
    pub status: StatusCode,
    pub chunks: Vec<&'static str>,
    pub email_status: StatusCode,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            chunks: vec![
                "data: {\"choices\":[{\"delta\":{\"content\":\"สวัสดี\"}}]}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"ครับ\"}}]}\n\n",
                "data: [DONE]\n\n",
            ],
            email_status: StatusCode::OK,
        }
    }
}

#[derive(Default)]
pub struct Recorded {
    pub completion_hits: AtomicUsize,
    pub completion_body: Mutex<Option<Value>>,
    pub completion_auth: Mutex<Option<String>>,
    pub emails: Mutex<Vec<Value>>,
}

pub struct MockUpstream {
    pub base_url: String,
    pub recorded: Arc<Recorded>,
    handle: tokio::task::JoinHandle<()>,
}

struct UpstreamState {
    config: UpstreamConfig,
    recorded: Arc<Recorded>,
}

impl MockUpstream {
    pub async fn start(config: UpstreamConfig) -> Self {
        let recorded = Arc::new(Recorded::default());
        let state = Arc::new(UpstreamState {
            config,
            recorded: Arc::clone(&recorded),
        });

        let app = Router::new()
            .route("/v1/chat/completions", post(completions))
            .route("/emails", post(emails))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            recorded,
            handle,
        }
    }

    pub fn completion_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    pub fn email_url(&self) -> String {
        format!("{}/emails", self.base_url)
    }

    pub fn completion_hits(&self) -> usize {
        self.recorded.completion_hits.load(Ordering::SeqCst)
    }

    pub fn completion_body(&self) -> Value {
        self.recorded
            .completion_body
            .lock()
            .unwrap()
            .clone()
            .expect("completion service was not called")
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn completions(
    State(state): State<Arc<UpstreamState>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let recorded = &state.recorded;
    recorded.completion_hits.fetch_add(1, Ordering::SeqCst);
    *recorded.completion_body.lock().unwrap() = Some(body);
    *recorded.completion_auth.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if !state.config.status.is_success() {
        return (state.config.status, "upstream says no: internal detail").into_response();
    }

    let chunks: Vec<Result<Bytes, Infallible>> = state
        .config
        .chunks
        .iter()
        .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes())))
        .collect();

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/event-stream")
        .body(Body::from_stream(futures::stream::iter(chunks)))
        .unwrap()
}

async fn emails(State(state): State<Arc<UpstreamState>>, Json(body): Json<Value>) -> StatusCode {
    state.recorded.emails.lock().unwrap().push(body);
    state.config.email_status
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub store: Arc<MockStore>,
    pub upstream: MockUpstream,
}

pub struct TestAppBuilder {
    store: MockStore,
    upstream: UpstreamConfig,
    completion_key: Option<&'static str>,
    email_key: Option<&'static str>,
    completion_url: Option<String>,
    limit: u32,
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            store: MockStore::empty(),
            upstream: UpstreamConfig::default(),
            completion_key: Some("test-completion-key"),
            email_key: Some("test-email-key"),
            completion_url: None,
            limit: 10,
        }
    }

    pub fn router(&self) -> Router {
        faq_relay::build_router(Arc::clone(&self.state))
    }
}

impl TestAppBuilder {
    pub fn store(mut self, store: MockStore) -> Self {
        self.store = store;
        self
    }

    pub fn upstream(mut self, upstream: UpstreamConfig) -> Self {
        self.upstream = upstream;
        self
    }

    pub fn completion_key(mut self, key: Option<&'static str>) -> Self {
        self.completion_key = key;
        self
    }

    pub fn email_key(mut self, key: Option<&'static str>) -> Self {
        self.email_key = key;
        self
    }

    /// Sends chat traffic somewhere other than the mock upstream.
    pub fn completion_url(mut self, url: String) -> Self {
        self.completion_url = Some(url);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub async fn start(self) -> TestApp {
        let upstream = MockUpstream::start(self.upstream).await;
        let store = Arc::new(self.store);
        let client = reqwest::Client::builder().no_proxy().build().unwrap();

        let state = Arc::new(AppState {
            rate_limiter: Arc::new(RateLimiter::new(self.limit, Duration::from_secs(60))),
            store: store.clone(),
            completion: CompletionClient::new(
                client.clone(),
                self.completion_url
                    .unwrap_or_else(|| upstream.completion_url()),
                "google/gemini-2.5-flash".to_string(),
                self.completion_key.map(str::to_string),
            ),
            mailer: Mailer::new(
                client,
                upstream.email_url(),
                self.email_key.map(str::to_string),
                "Website <noreply@example.com>".to_string(),
                "staff@example.com".to_string(),
            ),
        });

        TestApp {
            state,
            store,
            upstream,
        }
    }
}

/// A loopback address nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/v1/chat/completions")
}

pub async fn body_bytes(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
