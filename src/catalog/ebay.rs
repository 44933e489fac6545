//! eBay Browse API product source
//!
//! Searches `item_summary/search` with a user token, refreshing it through the
//! OAuth refresh-token grant when it is missing, expired, or rejected.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::links::add_ebay_affiliate_params;
use super::product::ProductData;
use super::ProductSource;
use crate::agent::config::CatalogSettings;

const DEFAULT_API_BASE: &str = "https://api.ebay.com";
const SEARCH_PATH: &str = "/buy/browse/v1/item_summary/search";
const TOKEN_PATH: &str = "/identity/v1/oauth2/token";
const OAUTH_SCOPE: &str = "https://api.ebay.com/oauth/api_scope";
/// Refresh this long before the token actually expires
const EXPIRY_MARGIN_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    7200
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default, rename = "itemSummaries")]
    item_summaries: Vec<ItemSummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemSummary {
    #[serde(default)]
    title: String,
    price: Option<Amount>,
    #[serde(default)]
    item_web_url: String,
    image: Option<Image>,
    #[serde(default)]
    condition: String,
    seller: Option<Seller>,
    #[serde(default)]
    shipping_options: Vec<ShippingOption>,
}

#[derive(Debug, Deserialize)]
struct Amount {
    value: String,
    #[serde(default)]
    currency: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Image {
    image_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Seller {
    #[serde(default)]
    username: String,
    feedback_percentage: Option<String>,
    feedback_score: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShippingOption {
    shipping_cost: Option<Amount>,
}

#[derive(Debug, Default)]
struct TokenState {
    token: Option<String>,
    expires_at: Option<Instant>,
}

/// eBay product search with affiliate-tagged links
#[derive(Debug)]
pub struct EbayClient {
    client: Client,
    api_base: String,
    client_id: String,
    client_secret: String,
    refresh_token: Option<String>,
    campaign_id: String,
    token: Mutex<TokenState>,
    request_count: AtomicU32,
    request_limit: u32,
}

impl EbayClient {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>, campaign_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: None,
            campaign_id: campaign_id.into(),
            token: Mutex::new(TokenState::default()),
            request_count: AtomicU32::new(0),
            request_limit: 5000,
        }
    }

    /// Build from settings; `None` when credentials are not configured
    pub fn from_settings(settings: &CatalogSettings) -> Option<Self> {
        let client_id = settings.ebay_client_id.clone()?;
        let client_secret = settings.ebay_client_secret.clone()?;
        let campaign_id = settings.ebay_campaign_id.clone().unwrap_or_default();

        let mut client = Self::new(client_id, client_secret, campaign_id)
            .with_request_limit(settings.request_limit);
        client.refresh_token = settings.ebay_refresh_token.clone();
        if let Some(ref token) = settings.ebay_user_token {
            client = client.with_user_token(token.clone());
        }
        Some(client)
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Start with a token of unknown age; it is used until rejected
    pub fn with_user_token(self, token: impl Into<String>) -> Self {
        if let Ok(mut state) = self.token.lock() {
            state.token = Some(token.into());
            state.expires_at = None;
        }
        self
    }

    pub fn with_request_limit(mut self, limit: u32) -> Self {
        self.request_limit = limit;
        self
    }

    pub fn request_count(&self) -> u32 {
        self.request_count.load(Ordering::Relaxed)
    }

    fn cached_token(&self) -> Option<String> {
        let state = self.token.lock().ok()?;
        match (state.token.as_ref(), state.expires_at) {
            (Some(token), Some(expires_at)) if Instant::now() < expires_at => Some(token.clone()),
            (Some(token), None) => Some(token.clone()),
            _ => None,
        }
    }

    /// Exchange the refresh token for a fresh access token
    async fn refresh_access_token(&self) -> Result<String> {
        let refresh_token = self
            .refresh_token
            .as_deref()
            .context("No eBay refresh token configured")?;

        let basic = STANDARD.encode(format!("{}:{}", self.client_id, self.client_secret));
        let response = self
            .client
            .post(format!("{}{}", self.api_base, TOKEN_PATH))
            .header("Authorization", format!("Basic {}", basic))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("scope", OAUTH_SCOPE),
            ])
            .send()
            .await
            .context("Failed to reach eBay token endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("[eBay] Failed to refresh token: {} - {}", status, body);
            anyhow::bail!("eBay token refresh failed ({}): {}", status, body);
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse eBay token response")?;
        let lifetime = token.expires_in.saturating_sub(EXPIRY_MARGIN_SECS);

        if let Ok(mut state) = self.token.lock() {
            state.token = Some(token.access_token.clone());
            state.expires_at = Some(Instant::now() + Duration::from_secs(lifetime));
        }
        tracing::info!("[eBay] Access token refreshed (valid {}s)", lifetime);

        Ok(token.access_token)
    }

    async fn valid_token(&self) -> Result<String> {
        match self.cached_token() {
            Some(token) => Ok(token),
            None => self.refresh_access_token().await,
        }
    }

    async fn search_once(&self, token: &str, query: &str, limit: usize) -> Result<reqwest::Response> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.client
            .get(format!("{}{}", self.api_base, SEARCH_PATH))
            .bearer_auth(token)
            .query(&[("q", query.to_string()), ("limit", limit.to_string())])
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .context("Failed to reach eBay Browse API")
    }

    fn to_product(&self, item: ItemSummary) -> ProductData {
        let affiliate_link = if item.item_web_url.is_empty() {
            String::new()
        } else {
            add_ebay_affiliate_params(&item.item_web_url, &self.campaign_id).unwrap_or_else(|e| {
                tracing::warn!("[eBay] Could not tag {}: {:#}", item.item_web_url, e);
                item.item_web_url.clone()
            })
        };

        let (price, currency) = item
            .price
            .map(|p| (p.value.parse().unwrap_or(0.0), p.currency))
            .unwrap_or((0.0, String::new()));

        let seller_trust = item.seller.map(|s| {
            format!(
                "{} ({}%, {} reviews)",
                s.username,
                s.feedback_percentage.unwrap_or_default(),
                s.feedback_score.map(|n| n.to_string()).unwrap_or_default()
            )
        });

        let shipping_info = item.shipping_options.first().map(|option| match option.shipping_cost {
            Some(ref cost) => format!("Shipping: {} {}", cost.value, cost.currency),
            None => "Shipping: N/A".to_string(),
        });

        ProductData {
            title: item.title,
            price,
            url: item.item_web_url,
            image: item.image.map(|i| i.image_url).unwrap_or_default(),
            affiliate_link,
            source: "ebay".to_string(),
            description: item.condition,
            currency: if currency.is_empty() { "USD".to_string() } else { currency },
            seller_trust,
            shipping_info,
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl ProductSource for EbayClient {
    fn name(&self) -> &str {
        "ebay"
    }

    fn can_request(&self) -> bool {
        self.request_count() < self.request_limit
    }

    async fn search_products(&self, query: &str, limit: usize) -> Result<Vec<ProductData>> {
        if !self.can_request() {
            tracing::warn!("[eBay] Request limit reached ({})", self.request_limit);
            return Ok(Vec::new());
        }

        let token = self.valid_token().await?;
        let mut response = self.search_once(&token, query, limit).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("[eBay] Token expired or invalid, refreshing...");
            let token = self.refresh_access_token().await?;
            response = self.search_once(&token, query, limit).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("eBay API error ({}): {}", status, body);
        }

        let search: SearchResponse = response
            .json()
            .await
            .context("Failed to parse eBay search response")?;

        let products: Vec<ProductData> = search
            .item_summaries
            .into_iter()
            .map(|item| self.to_product(item))
            .collect();
        tracing::info!("[eBay] {} products for {:?}", products.len(), query);

        Ok(products)
    }
}
