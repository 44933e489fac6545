//! Social and blogging platform clients
//!
//! Each client reads its credentials from the environment and is skipped when
//! they are missing. The promotion pass writes a mock post for any platform
//! without a client.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};

use super::content::PublishingResult;
use super::publish::{json_response, DevtoPublisher, Post, Publisher};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Every platform client whose credentials are set
pub fn publishers_from_env() -> Vec<Arc<dyn Publisher>> {
    let mut publishers: Vec<Arc<dyn Publisher>> = Vec::new();
    if let Some(p) = TwitterPublisher::from_env() {
        publishers.push(Arc::new(p));
    }
    if let Some(p) = DevtoPublisher::from_env() {
        publishers.push(Arc::new(p));
    }
    if let Some(p) = HashnodePublisher::from_env() {
        publishers.push(Arc::new(p));
    }
    if let Some(p) = BloggerPublisher::from_env() {
        publishers.push(Arc::new(p));
    }
    if let Some(p) = LinkedInPublisher::from_env() {
        publishers.push(Arc::new(p));
    }
    if let Some(p) = FacebookPublisher::from_env() {
        publishers.push(Arc::new(p));
    }
    tracing::info!(
        "[Publish] Configured platforms: {:?}",
        publishers.iter().map(|p| p.platform()).collect::<Vec<_>>()
    );
    publishers
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn str_field<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(|v| v.as_str())
}

/// Twitter API v2 tweets, posted with a user-context bearer token
#[derive(Debug, Clone)]
pub struct TwitterPublisher {
    client: Client,
    bearer_token: String,
    api_base: String,
}

impl TwitterPublisher {
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            bearer_token: bearer_token.into(),
            api_base: "https://api.twitter.com".to_string(),
        }
    }

    /// Reads `TWITTER_BEARER_TOKEN`
    pub fn from_env() -> Option<Self> {
        env_nonempty("TWITTER_BEARER_TOKEN").map(Self::new)
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Post one tweet, optionally as a reply; returns the tweet id
    async fn tweet(&self, text: &str, reply_to: Option<&str>) -> Result<String> {
        let mut payload = json!({ "text": text });
        if let Some(id) = reply_to {
            payload["reply"] = json!({ "in_reply_to_tweet_id": id });
        }

        let response = self
            .client
            .post(format!("{}/2/tweets", self.api_base))
            .bearer_auth(&self.bearer_token)
            .json(&payload)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("Failed to reach Twitter")?;

        let body = json_response(response, "Twitter").await?;
        str_field(&body, "/data/id")
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Twitter response has no tweet id: {}", body))
    }

    fn status_url(id: &str) -> String {
        format!("https://twitter.com/i/web/status/{}", id)
    }
}

#[async_trait::async_trait]
impl Publisher for TwitterPublisher {
    fn platform(&self) -> &str {
        "twitter"
    }

    async fn publish(&self, post: &Post) -> Result<PublishingResult> {
        let id = self.tweet(&post.short_text, None).await?;
        tracing::info!("[Twitter] Posted tweet {}", id);
        Ok(post.result("twitter", Self::status_url(&id), "success"))
    }

    async fn publish_thread(&self, title: &str, parts: &[String]) -> Result<PublishingResult> {
        anyhow::ensure!(!parts.is_empty(), "Thread {:?} has no parts", title);

        let mut first = None;
        let mut previous: Option<String> = None;
        for part in parts {
            let id = self.tweet(part, previous.as_deref()).await?;
            first.get_or_insert_with(|| id.clone());
            previous = Some(id);
        }
        let first = first.unwrap_or_default();
        tracing::info!("[Twitter] Posted thread {:?} ({} tweets)", title, parts.len());

        Ok(PublishingResult {
            platform: "twitter".to_string(),
            url: Self::status_url(&first),
            status: "success".to_string(),
            timestamp: Utc::now(),
            content_type: "thread".to_string(),
            content_title: title.to_string(),
        })
    }
}

const CREATE_STORY_MUTATION: &str = "mutation CreateStory($input: CreateStoryInput!) { createStory(input: $input) { code success message post { slug } } }";

/// Hashnode GraphQL API
#[derive(Debug, Clone)]
pub struct HashnodePublisher {
    client: Client,
    token: String,
    publication_id: Option<String>,
    api_base: String,
}

impl HashnodePublisher {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            publication_id: None,
            api_base: "https://api.hashnode.com".to_string(),
        }
    }

    /// Reads `HASHNODE_TOKEN` and the optional `HASHNODE_PUBLICATION_ID`
    pub fn from_env() -> Option<Self> {
        let publisher = Self::new(env_nonempty("HASHNODE_TOKEN")?);
        Some(match env_nonempty("HASHNODE_PUBLICATION_ID") {
            Some(id) => publisher.with_publication_id(id),
            None => publisher,
        })
    }

    /// Publish into a publication instead of the personal blog
    pub fn with_publication_id(mut self, id: impl Into<String>) -> Self {
        self.publication_id = Some(id.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn request_body(&self, post: &Post) -> Value {
        let mut input = json!({
            "title": post.title,
            "contentMarkdown": post.body_with_link(),
            "tags": post.tags,
            "isPublished": true,
        });
        if let Some(ref publication_id) = self.publication_id {
            input["publicationId"] = json!(publication_id);
        }
        json!({ "query": CREATE_STORY_MUTATION, "variables": { "input": input } })
    }
}

#[async_trait::async_trait]
impl Publisher for HashnodePublisher {
    fn platform(&self) -> &str {
        "hashnode"
    }

    async fn publish(&self, post: &Post) -> Result<PublishingResult> {
        let response = self
            .client
            .post(&self.api_base)
            .header("Authorization", &self.token)
            .json(&self.request_body(post))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("Failed to reach Hashnode")?;

        let body = json_response(response, "Hashnode").await?;
        if let Some(errors) = body.get("errors").and_then(|e| e.as_array()) {
            if !errors.is_empty() {
                let messages: Vec<&str> = errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
                    .collect();
                anyhow::bail!("Hashnode GraphQL error: {}", messages.join("; "));
            }
        }

        let story = body.pointer("/data/createStory").cloned().unwrap_or_default();
        if !story.get("success").and_then(|v| v.as_bool()).unwrap_or(false) {
            anyhow::bail!(
                "Hashnode did not publish the story: {}",
                str_field(&story, "/message").unwrap_or("no message")
            );
        }
        let url = str_field(&story, "/post/slug")
            .map(|slug| format!("https://hashnode.com/post/{}", slug))
            .unwrap_or_default();
        tracing::info!("[Hashnode] Published {:?} {}", post.title, url);

        Ok(post.result("hashnode", url, "success"))
    }
}

/// Blogger v3 posts API
#[derive(Debug, Clone)]
pub struct BloggerPublisher {
    client: Client,
    access_token: String,
    blog_id: String,
    api_base: String,
}

impl BloggerPublisher {
    pub fn new(access_token: impl Into<String>, blog_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.into(),
            blog_id: blog_id.into(),
            api_base: "https://www.googleapis.com".to_string(),
        }
    }

    /// Reads `BLOGGER_ACCESS_TOKEN` and `BLOGGER_BLOG_ID`
    pub fn from_env() -> Option<Self> {
        Some(Self::new(
            env_nonempty("BLOGGER_ACCESS_TOKEN")?,
            env_nonempty("BLOGGER_BLOG_ID")?,
        ))
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait::async_trait]
impl Publisher for BloggerPublisher {
    fn platform(&self) -> &str {
        "blogger"
    }

    async fn publish(&self, post: &Post) -> Result<PublishingResult> {
        let payload = json!({
            "kind": "blogger#post",
            "title": post.title,
            "content": post.body_with_link(),
            "labels": post.tags,
        });

        let response = self
            .client
            .post(format!("{}/blogger/v3/blogs/{}/posts/", self.api_base, self.blog_id))
            .bearer_auth(&self.access_token)
            .json(&payload)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("Failed to reach Blogger")?;

        let body = json_response(response, "Blogger").await?;
        let url = str_field(&body, "/url").unwrap_or_default().to_string();
        tracing::info!("[Blogger] Published {:?} at {}", post.title, url);

        Ok(post.result("blogger", url, "success"))
    }
}

/// LinkedIn UGC posts API
#[derive(Debug, Clone)]
pub struct LinkedInPublisher {
    client: Client,
    access_token: String,
    author_urn: String,
    api_base: String,
}

impl LinkedInPublisher {
    /// `author_urn` is the posting member or organization, e.g. `urn:li:person:abc`
    pub fn new(access_token: impl Into<String>, author_urn: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.into(),
            author_urn: author_urn.into(),
            api_base: "https://api.linkedin.com".to_string(),
        }
    }

    /// Reads `LINKEDIN_ACCESS_TOKEN` and `LINKEDIN_AUTHOR_URN`
    pub fn from_env() -> Option<Self> {
        Some(Self::new(
            env_nonempty("LINKEDIN_ACCESS_TOKEN")?,
            env_nonempty("LINKEDIN_AUTHOR_URN")?,
        ))
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn request_body(&self, post: &Post) -> Value {
        json!({
            "author": self.author_urn,
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": { "text": post.short_text },
                    "shareMediaCategory": "ARTICLE",
                    "media": [{
                        "status": "READY",
                        "originalUrl": post.link,
                        "title": { "text": post.title },
                    }],
                }
            },
            "visibility": { "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC" },
        })
    }
}

#[async_trait::async_trait]
impl Publisher for LinkedInPublisher {
    fn platform(&self) -> &str {
        "linkedin"
    }

    async fn publish(&self, post: &Post) -> Result<PublishingResult> {
        let response = self
            .client
            .post(format!("{}/v2/ugcPosts", self.api_base))
            .bearer_auth(&self.access_token)
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&self.request_body(post))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("Failed to reach LinkedIn")?;

        let header_id = response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = json_response(response, "LinkedIn").await?;
        let id = str_field(&body, "/id")
            .map(str::to_string)
            .or(header_id)
            .unwrap_or_default();
        tracing::info!("[LinkedIn] Shared {:?} as {}", post.title, id);

        Ok(post.result(
            "linkedin",
            format!("https://www.linkedin.com/feed/update/{}", id),
            "success",
        ))
    }
}

/// Facebook Graph API page feed
#[derive(Debug, Clone)]
pub struct FacebookPublisher {
    client: Client,
    access_token: String,
    page_id: String,
    api_base: String,
}

impl FacebookPublisher {
    pub fn new(access_token: impl Into<String>, page_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            access_token: access_token.into(),
            page_id: page_id.into(),
            api_base: "https://graph.facebook.com".to_string(),
        }
    }

    /// Reads `FACEBOOK_ACCESS_TOKEN` and `FACEBOOK_PAGE_ID`
    pub fn from_env() -> Option<Self> {
        Some(Self::new(
            env_nonempty("FACEBOOK_ACCESS_TOKEN")?,
            env_nonempty("FACEBOOK_PAGE_ID")?,
        ))
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait::async_trait]
impl Publisher for FacebookPublisher {
    fn platform(&self) -> &str {
        "facebook"
    }

    async fn publish(&self, post: &Post) -> Result<PublishingResult> {
        let response = self
            .client
            .post(format!("{}/v19.0/{}/feed", self.api_base, self.page_id))
            .form(&[
                ("message", post.short_text.as_str()),
                ("access_token", self.access_token.as_str()),
            ])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("Failed to reach Facebook")?;

        let body = json_response(response, "Facebook").await?;
        let id = str_field(&body, "/id").unwrap_or_default();
        tracing::info!("[Facebook] Posted {:?} as {}", post.title, id);

        Ok(post.result("facebook", format!("https://www.facebook.com/{}", id), "success"))
    }
}
