//! AliExpress affiliate API product source

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;

use super::links::{ensure_tracking_id, sign_aliexpress_params};
use super::product::ProductData;
use super::ProductSource;
use crate::agent::config::CatalogSettings;

const DEFAULT_ENDPOINT: &str = "https://api-sg.aliexpress.com/sync";
const QUERY_METHOD: &str = "aliexpress.affiliate.product.query";
const QUERY_FIELDS: &str = "productId,productTitle,productUrl,productImage,originalPrice,salePrice,promotion_link,product_detail_url";

/// AliExpress product search through the signed affiliate API
#[derive(Debug)]
pub struct AliExpressClient {
    client: Client,
    endpoint: String,
    app_key: String,
    app_secret: String,
    tracking_id: Option<String>,
    request_count: AtomicU32,
    request_limit: u32,
}

impl AliExpressClient {
    pub fn new(app_key: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            app_key: app_key.into(),
            app_secret: app_secret.into(),
            tracking_id: None,
            request_count: AtomicU32::new(0),
            request_limit: 5000,
        }
    }

    /// Build from settings; `None` when credentials are not configured
    pub fn from_settings(settings: &CatalogSettings) -> Option<Self> {
        let client = Self::new(
            settings.aliexpress_app_key.clone()?,
            settings.aliexpress_app_secret.clone()?,
        )
        .with_request_limit(settings.request_limit);

        Some(match settings.aliexpress_tracking_id {
            Some(ref pid) => client.with_tracking_id(pid.clone()),
            None => client,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_tracking_id(mut self, tracking_id: impl Into<String>) -> Self {
        self.tracking_id = Some(tracking_id.into());
        self
    }

    pub fn with_request_limit(mut self, limit: u32) -> Self {
        self.request_limit = limit;
        self
    }

    pub fn request_count(&self) -> u32 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Signed query parameters for a product search
    fn signed_params(&self, query: &str, limit: usize, timestamp_ms: i64) -> Result<BTreeMap<String, String>> {
        let mut params: BTreeMap<String, String> = [
            ("app_key", self.app_key.clone()),
            ("timestamp", timestamp_ms.to_string()),
            ("sign_method", "sha256".to_string()),
            ("method", QUERY_METHOD.to_string()),
            ("keywords", query.to_string()),
            ("page_no", "1".to_string()),
            ("page_size", limit.to_string()),
            ("fields", QUERY_FIELDS.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        if let Some(ref pid) = self.tracking_id {
            params.insert("tracking_id".to_string(), pid.clone());
        }

        let sign = sign_aliexpress_params(&params, &self.app_secret)?;
        params.insert("sign".to_string(), sign);
        Ok(params)
    }

    fn to_product(&self, item: &Value) -> ProductData {
        let text = |key: &str| item.get(key).and_then(Value::as_str).unwrap_or_default().to_string();

        let detail_url = text("product_detail_url");
        let mut affiliate_link = text("promotion_link");
        if affiliate_link.is_empty() {
            affiliate_link = detail_url.clone();
        }
        if let Some(ref pid) = self.tracking_id {
            affiliate_link = ensure_tracking_id(&affiliate_link, pid);
            if !affiliate_link.contains(pid.as_str()) {
                tracing::warn!("[AliExpress] tracking_id missing from {}", affiliate_link);
            }
        }

        let price = match item.get("target_sale_price") {
            Some(Value::String(s)) => s.parse().unwrap_or(0.0),
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            _ => 0.0,
        };
        let currency = Some(text("target_sale_price_currency"))
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "USD".to_string());

        ProductData {
            title: text("product_title"),
            price,
            url: detail_url,
            image: text("product_main_image_url"),
            affiliate_link,
            source: "aliexpress".to_string(),
            currency,
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl ProductSource for AliExpressClient {
    fn name(&self) -> &str {
        "aliexpress"
    }

    fn can_request(&self) -> bool {
        self.request_count() < self.request_limit
    }

    async fn search_products(&self, query: &str, limit: usize) -> Result<Vec<ProductData>> {
        if !self.can_request() {
            tracing::warn!("[AliExpress] Request limit reached ({})", self.request_limit);
            return Ok(Vec::new());
        }

        let params = self.signed_params(query, limit, chrono::Utc::now().timestamp_millis())?;

        self.request_count.fetch_add(1, Ordering::Relaxed);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .context("Failed to reach AliExpress API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("AliExpress API error ({}): {}", status, body);
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse AliExpress response")?;

        let items = body
            .pointer("/aliexpress_affiliate_product_query_response/resp_result/result/products/product")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let products: Vec<ProductData> = items.iter().map(|item| self.to_product(item)).collect();
        tracing::info!("[AliExpress] {} products for {:?}", products.len(), query);

        Ok(products)
    }
}
