//! Client for the hosted data store's table API.
//!
//! Only the handful of reads the chat context needs and the single insert
//! the contact form performs live here. Everything else the site does with
//! the store goes through the platform's own SDK in the browser.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::AppError;
use crate::models::{ContactForm, JobPosting, NewsItem, SiteSetting};

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Published news, newest first.
    async fn latest_news(&self, limit: usize) -> Result<Vec<NewsItem>, AppError>;

    /// Published job postings in display order.
    async fn open_jobs(&self) -> Result<Vec<JobPosting>, AppError>;

    async fn contact_settings(&self, keys: &[&str]) -> Result<Vec<SiteSetting>, AppError>;

    async fn insert_contact_submission(&self, form: &ContactForm) -> Result<(), AppError>;
}

pub struct RestStore {
    client: Client,
    base_url: String,
    service_key: String,
}

#[derive(Serialize)]
struct SubmissionRow<'a> {
    name: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
    subject: Option<&'a str>,
    message: &'a str,
}

impl RestStore {
    pub fn new(client: Client, base_url: &str, service_key: String) -> Self {
        Self {
            client,
            base_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            service_key,
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, AppError> {
        debug!(table, "store select");

        let url = Url::parse_with_params(&format!("{}/{}", self.base_url, table), query)
            .map_err(|e| AppError::Store(format!("bad store url: {e}")))?;

        let res = self
            .authorized(self.client.get(url))
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| AppError::Store(format!("select {table}: {e}")))?;

        res.json::<Vec<T>>()
            .await
            .map_err(|e| AppError::Store(format!("decode {table}: {e}")))
    }
}

#[async_trait]
impl ContentStore for RestStore {
    async fn latest_news(&self, limit: usize) -> Result<Vec<NewsItem>, AppError> {
        self.select(
            "news",
            &[
                ("select", "title,excerpt,category,published_at".to_string()),
                ("is_published", "eq.true".to_string()),
                ("order", "published_at.desc".to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn open_jobs(&self) -> Result<Vec<JobPosting>, AppError> {
        self.select(
            "job_postings",
            &[
                (
                    "select",
                    "title,department,location,employment_type,requirements".to_string(),
                ),
                ("is_published", "eq.true".to_string()),
                ("order", "display_order.asc".to_string()),
            ],
        )
        .await
    }

    async fn contact_settings(&self, keys: &[&str]) -> Result<Vec<SiteSetting>, AppError> {
        self.select(
            "site_settings",
            &[
                ("select", "key,value".to_string()),
                ("key", format!("in.({})", keys.join(","))),
            ],
        )
        .await
    }

    async fn insert_contact_submission(&self, form: &ContactForm) -> Result<(), AppError> {
        let row = SubmissionRow {
            name: &form.name,
            email: &form.email,
            phone: form.phone.as_deref(),
            subject: form.subject.as_deref(),
            message: &form.message,
        };

        self.authorized(
            self.client
                .post(format!("{}/contact_submissions", self.base_url)),
        )
        .header("Prefer", "return=minimal")
        .json(&row)
        .send()
        .await
        .and_then(|res| res.error_for_status())
        .map_err(|e| AppError::Store(format!("insert contact_submissions: {e}")))?;

        Ok(())
    }
}
