//! Publishing to external platforms
//!
//! Platform clients sit behind `Publisher`. When a platform call fails the
//! post is kept as a mock post on disk by `FilePublisher` so no generated
//! content is lost.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};

use super::content::PublishingResult;

const MOCK_POST_SEPARATOR_LEN: usize = 40;

/// A post ready to send to a platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub title: String,
    /// Long-form markdown body
    pub body: String,
    /// Title, summary and link in a few lines, for feeds and microblogs
    pub short_text: String,
    pub link: String,
    pub tags: Vec<String>,
    /// Content type being published ("blog", "video", ...)
    pub content_type: String,
}

impl Post {
    /// Markdown body followed by the buy link
    pub fn body_with_link(&self) -> String {
        format!("{}\n\nBuy here: {}", self.body, self.link)
    }

    pub(super) fn result(&self, platform: &str, url: impl Into<String>, status: &str) -> PublishingResult {
        PublishingResult {
            platform: platform.to_string(),
            url: url.into(),
            status: status.to_string(),
            timestamp: Utc::now(),
            content_type: self.content_type.clone(),
            content_title: self.title.clone(),
        }
    }
}

#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    /// Platform name used in results and mock post file names
    fn platform(&self) -> &str;

    async fn publish(&self, post: &Post) -> Result<PublishingResult>;

    /// Publish `parts` as one thread of replies
    async fn publish_thread(&self, title: &str, parts: &[String]) -> Result<PublishingResult> {
        anyhow::bail!(
            "{} does not support threads ({}, {} parts)",
            self.platform(),
            title,
            parts.len()
        )
    }
}

/// Status check shared by the platform clients; returns the JSON body
pub(super) async fn json_response(response: reqwest::Response, platform: &str) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("{} API error ({}): {}", platform, status, body);
    }
    let text = response
        .text()
        .await
        .with_context(|| format!("Failed to read {} response", platform))?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {} response", platform))
}

/// Appends posts to `<dir>/<platform>_mock_post.txt`
#[derive(Debug, Clone)]
pub struct FilePublisher {
    dir: PathBuf,
    platform: String,
}

impl FilePublisher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            platform: "file".to_string(),
        }
    }

    /// Publish under a specific platform name
    pub fn for_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn mock_post_path(&self, platform: &str) -> PathBuf {
        self.dir.join(format!("{}_mock_post.txt", platform))
    }

    /// Append one post for `platform`; returns the file written
    pub fn save_mock_post(&self, platform: &str, title: &str, body: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {:?}", self.dir))?;
        let path = self.mock_post_path(platform);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {:?}", path))?;
        write!(
            file,
            "Title: {}\n\n{}\n{}\n",
            title,
            body,
            "=".repeat(MOCK_POST_SEPARATOR_LEN)
        )?;

        tracing::info!("[Publish] Saved mock post for {} at {:?}", platform, path);
        Ok(path)
    }
}

#[async_trait::async_trait]
impl Publisher for FilePublisher {
    fn platform(&self) -> &str {
        &self.platform
    }

    async fn publish(&self, post: &Post) -> Result<PublishingResult> {
        let path = self.save_mock_post(&self.platform, &post.title, &post.short_text)?;
        Ok(post.result(&self.platform, format!("file://{}", path.display()), "mock"))
    }

    async fn publish_thread(&self, title: &str, parts: &[String]) -> Result<PublishingResult> {
        let path = self.save_mock_post(&self.platform, title, &parts.join("\n\n"))?;
        Ok(PublishingResult {
            platform: self.platform.clone(),
            url: format!("file://{}", path.display()),
            status: "mock".to_string(),
            timestamp: Utc::now(),
            content_type: "thread".to_string(),
            content_title: title.to_string(),
        })
    }
}

/// Dev.to articles API
#[derive(Debug, Clone)]
pub struct DevtoPublisher {
    client: Client,
    api_key: String,
    api_base: String,
}

impl DevtoPublisher {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: "https://dev.to/api".to_string(),
        }
    }

    /// Reads `DEVTO_API_KEY`; `None` when unset
    pub fn from_env() -> Option<Self> {
        std::env::var("DEVTO_API_KEY").ok().map(Self::new)
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

/// Dev.to tags are lowercase alphanumerics
fn devto_tag(tag: &str) -> String {
    tag.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

#[async_trait::async_trait]
impl Publisher for DevtoPublisher {
    fn platform(&self) -> &str {
        "devto"
    }

    async fn publish(&self, post: &Post) -> Result<PublishingResult> {
        let tags: Vec<String> = post
            .tags
            .iter()
            .map(|t| devto_tag(t))
            .filter(|t| !t.is_empty())
            .take(4)
            .collect();

        let payload = json!({
            "article": {
                "title": post.title,
                "body_markdown": post.body_with_link(),
                "published": true,
                "tags": tags,
                "canonical_url": post.link,
            }
        });

        let response = self
            .client
            .post(format!("{}/articles", self.api_base))
            .header("api-key", &self.api_key)
            .json(&payload)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .context("Failed to reach Dev.to")?;

        let article = json_response(response, "Dev.to").await?;
        let url = article
            .get("url")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        tracing::info!("[Dev.to] Published {:?} at {}", post.title, url);

        Ok(post.result("devto", url, "success"))
    }
}
