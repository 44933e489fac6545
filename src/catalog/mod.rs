//! Products, affiliate links, promotional content and publishing
//!
//! - `ProductSource` - marketplace search (`EbayClient`, `AliExpressClient`)
//! - `links` - affiliate tagging and request signing
//! - `content` - blog/table/Q&A/video records built from products
//! - `Publisher` - platform clients (`platforms`), with `FilePublisher` for mock posts

mod aliexpress;
mod content;
mod ebay;
mod links;
mod platforms;
mod product;
mod publish;

pub use aliexpress::AliExpressClient;
pub use content::{
    affiliate_link_for, generate_content_for_product, generate_video_for_product, only_english,
    youtube_safe_title, AffiliateTarget, ContentData, ContentError, ContentKind, PublishingResult,
    QaPair, VideoContentData,
};
pub use ebay::EbayClient;
pub use links::{add_ebay_affiliate_params, ensure_tracking_id, sign_aliexpress_params};
pub use platforms::{
    publishers_from_env, BloggerPublisher, FacebookPublisher, HashnodePublisher, LinkedInPublisher,
    TwitterPublisher,
};
pub use product::{value_features_text, ProductData};
pub use publish::{DevtoPublisher, FilePublisher, Post, Publisher};

use anyhow::Result;

/// A marketplace that can be searched for affiliate products
#[async_trait::async_trait]
pub trait ProductSource: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the request budget allows another search
    fn can_request(&self) -> bool;

    async fn search_products(&self, query: &str, limit: usize) -> Result<Vec<ProductData>>;
}
