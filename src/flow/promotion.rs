//! Product promotion pass
//!
//! Discover products, build content for each, publish it. Each step
//! degrades instead of failing the cycle: a source that errors contributes
//! no products, and a platform that errors or has no client gets a mock post.

use std::sync::Arc;

use anyhow::Result;

use crate::catalog::{
    affiliate_link_for, generate_content_for_product, generate_video_for_product, only_english,
    youtube_safe_title, AliExpressClient, ContentData, ContentKind, EbayClient, FilePublisher,
    Post, ProductData, ProductSource, Publisher, PublishingResult, VideoContentData,
};
use crate::agent::config::CatalogSettings;

const SUMMARY_PREVIEW_CHARS: usize = 200;

/// Platforms every blog post goes to
const BLOG_PLATFORMS: [&str; 6] = ["twitter", "devto", "hashnode", "blogger", "linkedin", "facebook"];

/// Platforms that take long-form markdown, used for comparison tables
const LONG_FORM_PLATFORMS: [&str; 3] = ["devto", "hashnode", "blogger"];

/// Q&A content goes out as a thread here
const THREAD_PLATFORM: &str = "twitter";

/// What to search for where
struct SourceQuery {
    source: Arc<dyn ProductSource>,
    query: String,
}

/// Everything one promotion pass produced
#[derive(Debug, Clone, Default)]
pub struct PromotionReport {
    pub discovered: Vec<ProductData>,
    pub content: Vec<ContentData>,
    pub videos: Vec<VideoContentData>,
    pub published: Vec<PublishingResult>,
}

impl PromotionReport {
    /// Results that only reached the mock post files
    pub fn mock_count(&self) -> usize {
        self.published.iter().filter(|r| r.status == "mock").count()
    }
}

pub struct ProductPromotion {
    sources: Vec<SourceQuery>,
    products_per_source: usize,
    publishers: Vec<Arc<dyn Publisher>>,
    mock_posts: FilePublisher,
}

impl ProductPromotion {
    /// `mock_posts` keeps whatever could not reach its platform
    pub fn new(mock_posts: FilePublisher) -> Self {
        Self {
            sources: Vec::new(),
            products_per_source: 3,
            publishers: Vec::new(),
            mock_posts,
        }
    }

    /// eBay and AliExpress sources for whichever credentials are configured
    pub fn from_settings(settings: &CatalogSettings) -> Self {
        let mut promotion = Self::new(FilePublisher::new(&settings.mock_posts_dir))
            .with_products_per_source(settings.products_per_source);

        if let Some(ebay) = EbayClient::from_settings(settings) {
            promotion = promotion.with_source(Arc::new(ebay), settings.ebay_query.clone());
        } else {
            tracing::info!("[Promotion] eBay credentials not configured, skipping source");
        }
        if let Some(aliexpress) = AliExpressClient::from_settings(settings) {
            promotion = promotion.with_source(Arc::new(aliexpress), settings.aliexpress_query.clone());
        } else {
            tracing::info!("[Promotion] AliExpress credentials not configured, skipping source");
        }
        promotion
    }

    pub fn with_source(mut self, source: Arc<dyn ProductSource>, query: impl Into<String>) -> Self {
        self.sources.push(SourceQuery {
            source,
            query: query.into(),
        });
        self
    }

    /// Register a platform client. Platforms outside the default set also get blog posts.
    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publishers.push(publisher);
        self
    }

    pub fn with_publishers(mut self, publishers: impl IntoIterator<Item = Arc<dyn Publisher>>) -> Self {
        self.publishers.extend(publishers);
        self
    }

    pub fn with_products_per_source(mut self, count: usize) -> Self {
        self.products_per_source = count;
        self
    }

    pub async fn run(&self) -> PromotionReport {
        let mut report = PromotionReport {
            discovered: self.discover().await,
            ..Default::default()
        };
        tracing::info!(
            "[Promotion] Discovered: {:?}",
            report.discovered.iter().map(ProductData::label).collect::<Vec<_>>()
        );

        for product in &report.discovered {
            let (blog, video) = content_plan(product);
            tracing::info!(
                "[Promotion] {} -> blog: {}, video: {}",
                product.label(),
                blog,
                video
            );
            if blog {
                report.content.extend(generate_content_for_product(product));
            }
            if video {
                report.videos.push(generate_video_for_product(product));
            }
        }

        for content in &report.content {
            if let Err(e) = content.ensure_publishable() {
                tracing::warn!("[Promotion] {}", e);
                continue;
            }
            let results = match content.kind {
                ContentKind::Blog => {
                    let post = blog_post(content, only_english(&content.body));
                    self.publish_everywhere(&self.blog_platforms(), &post).await
                }
                ContentKind::Table => {
                    let body = format!(
                        "{}\n\n{}",
                        content.table_markdown(),
                        only_english(&content.body)
                    );
                    let post = blog_post(content, body);
                    self.publish_everywhere(&LONG_FORM_PLATFORMS, &post).await
                }
                ContentKind::Qa => self.publish_thread(content).await.into_iter().collect(),
            };
            report.published.extend(results);
        }

        for video in &report.videos {
            match self.publish_video(video).await {
                Ok(result) => report.published.push(result),
                Err(e) => tracing::error!("[Promotion] Could not save video post: {:#}", e),
            }
        }

        tracing::info!(
            "[Promotion] Published {} items ({} as mock posts)",
            report.published.len(),
            report.mock_count()
        );
        report
    }

    async fn discover(&self) -> Vec<ProductData> {
        let mut products = Vec::new();
        for SourceQuery { source, query } in &self.sources {
            if !source.can_request() {
                tracing::warn!("[Promotion] {} request budget exhausted", source.name());
                continue;
            }
            match source.search_products(query, self.products_per_source).await {
                Ok(found) => products.extend(found),
                Err(e) => tracing::error!("[Promotion] {} search failed: {:#}", source.name(), e),
            }
        }
        products
    }

    /// The default blog platforms plus any other registered client
    fn blog_platforms(&self) -> Vec<&str> {
        let mut platforms = BLOG_PLATFORMS.to_vec();
        for publisher in &self.publishers {
            if !platforms.contains(&publisher.platform()) {
                platforms.push(publisher.platform());
            }
        }
        platforms
    }

    fn publisher_for(&self, platform: &str) -> Option<&Arc<dyn Publisher>> {
        self.publishers.iter().find(|p| p.platform() == platform)
    }

    fn mock_publisher(&self, platform: &str) -> FilePublisher {
        self.mock_posts.clone().for_platform(platform)
    }

    async fn publish_everywhere(&self, platforms: &[&str], post: &Post) -> Vec<PublishingResult> {
        let mut results = Vec::new();
        for platform in platforms {
            if let Some(result) = self.publish_to(platform, post).await {
                results.push(result);
            }
        }
        results
    }

    /// Publish to `platform`, or keep a mock post when its client is missing or fails
    async fn publish_to(&self, platform: &str, post: &Post) -> Option<PublishingResult> {
        match self.publisher_for(platform) {
            Some(publisher) => match publisher.publish(post).await {
                Ok(result) => return Some(result),
                Err(e) => tracing::warn!("[Promotion] {} failed: {:#}", platform, e),
            },
            None => tracing::debug!("[Promotion] {} not configured, saving mock post", platform),
        }

        match self.mock_publisher(platform).publish(post).await {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::error!("[Promotion] Could not save mock post: {:#}", e);
                None
            }
        }
    }

    async fn publish_thread(&self, content: &ContentData) -> Option<PublishingResult> {
        let title = only_english(&content.title);
        let parts: Vec<String> = content.qa_thread().iter().map(|p| only_english(p)).collect();
        if parts.is_empty() {
            tracing::warn!("[Promotion] {:?} has no Q&A pairs", title);
            return None;
        }

        match self.publisher_for(THREAD_PLATFORM) {
            Some(publisher) => match publisher.publish_thread(&title, &parts).await {
                Ok(result) => return Some(result),
                Err(e) => tracing::warn!("[Promotion] {} thread failed: {:#}", THREAD_PLATFORM, e),
            },
            None => tracing::debug!(
                "[Promotion] {} not configured, saving thread as mock post",
                THREAD_PLATFORM
            ),
        }

        match self.mock_publisher(THREAD_PLATFORM).publish_thread(&title, &parts).await {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::error!("[Promotion] Could not save mock thread: {:#}", e);
                None
            }
        }
    }

    async fn publish_video(&self, video: &VideoContentData) -> Result<PublishingResult> {
        let title = youtube_safe_title(&only_english(&video.title));
        let link = affiliate_link_for(video);
        let description = format!("{}\n\nBuy here: {}", only_english(&video.description), link);
        let post = Post {
            title,
            body: description.clone(),
            short_text: description,
            link,
            tags: Vec::new(),
            content_type: "video".to_string(),
        };
        self.mock_publisher("youtube").publish(&post).await
    }
}

/// Post for long-form `body`, with the short feed text every platform can take
fn blog_post(content: &ContentData, body: String) -> Post {
    let title = only_english(&content.title);
    let summary: String = only_english(&content.summary)
        .chars()
        .take(SUMMARY_PREVIEW_CHARS)
        .collect();
    let link = affiliate_link_for(content);

    Post {
        short_text: format!("{}\n{}...\nBuy here: {}", title, summary, link),
        title,
        body,
        link,
        tags: content.tags.iter().map(|t| only_english(t)).collect(),
        content_type: content.kind.as_str().to_string(),
    }
}

/// Which content to build for a product: (blog, video)
fn content_plan(product: &ProductData) -> (bool, bool) {
    match product.source.as_str() {
        "ebay" => (true, true),
        "aliexpress" => (false, true),
        _ => (true, false),
    }
}
