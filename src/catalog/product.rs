//! Discovered products

use serde::{Deserialize, Serialize};

/// A product offered through an affiliate program
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductData {
    pub title: String,
    pub price: f64,
    pub url: String,
    pub image: String,
    pub affiliate_link: String,
    /// Marketplace the product came from ("ebay", "aliexpress", ...)
    pub source: String,
    pub description: String,
    pub rating: Option<f64>,
    pub reviews: Option<u32>,
    pub currency: String,

    // Value features shown to buyers alongside the price
    pub guarantees: Option<String>,
    pub return_policy: Option<String>,
    pub seller_trust: Option<String>,
    pub shipping_info: Option<String>,
    pub certifications: Option<String>,
    pub official_store: Option<bool>,
}

impl ProductData {
    pub fn new(
        title: impl Into<String>,
        price: f64,
        url: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            price,
            url: url.into(),
            source: source.into(),
            currency: "USD".to_string(),
            ..Default::default()
        }
    }

    /// `title (source)`, used in discovery logs
    pub fn label(&self) -> String {
        format!("{} ({})", self.title, self.source)
    }
}

/// One line summarizing whichever value features the product has
pub fn value_features_text(product: &ProductData) -> String {
    let mut features = Vec::new();
    let labelled = [
        ("Guarantee", &product.guarantees),
        ("Return policy", &product.return_policy),
        ("Seller trust", &product.seller_trust),
        ("Shipping info", &product.shipping_info),
        ("Certifications", &product.certifications),
    ];
    for (label, value) in labelled {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            features.push(format!("{}: {}", label, value));
        }
    }
    if let Some(official) = product.official_store {
        features.push(format!(
            "Official store: {}",
            if official { "Yes" } else { "No" }
        ));
    }
    features.join(" | ")
}
