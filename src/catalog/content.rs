//! Promotional content records
//!
//! Blog posts, comparison tables, Q&A sets and video scripts built from a
//! discovered product, plus the text clean-up applied before anything is
//! published.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::product::{value_features_text, ProductData};

const AFFILIATE_DISCLOSURE: &str = "This post contains affiliate links.";
const AI_DISCLOSURE: &str = "This content was generated by AI.";
const AUTHOR: &str = "AffiliateBot";
const YOUTUBE_TITLE_MAX: usize = 95;
const YOUTUBE_FALLBACK_TITLE: &str = "AI Product Review";

static GREEK_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Greek}").expect("greek pattern is valid"));

/// Greek value-feature labels and their English replacements
const LABEL_TRANSLATIONS: [(&str, &str); 6] = [
    ("Αξιοπιστία πωλητή", "Seller trust"),
    ("Πολιτική επιστροφών", "Return policy"),
    ("Επίσημο κατάστημα", "Official store"),
    ("Πιστοποιήσεις", "Certifications"),
    ("Αποστολή", "Shipping info"),
    ("Εγγύηση", "Guarantee"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Blog,
    Table,
    Qa,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Blog => "blog",
            ContentKind::Table => "table",
            ContentKind::Qa => "qa",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub q: String,
    pub a: String,
}

/// A required field was empty at publish time
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot publish {kind} '{title}': missing {field}")]
pub struct ContentError {
    pub kind: String,
    pub title: String,
    pub field: &'static str,
}

/// Written content about one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentData {
    pub product: ProductData,
    pub kind: ContentKind,
    pub title: String,
    pub body: String,
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Rows of a comparison table, header first
    #[serde(default)]
    pub table: Vec<Vec<String>>,
    #[serde(default)]
    pub qa: Vec<QaPair>,
    /// Overrides the product's affiliate link
    pub affiliate_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub language: String,
    pub author: String,
}

impl ContentData {
    fn new(product: &ProductData, kind: ContentKind, title: String, body: String, summary: String) -> Self {
        Self {
            product: product.clone(),
            kind,
            title,
            body,
            summary,
            tags: vec![
                product.source.clone(),
                match kind {
                    ContentKind::Blog => "review",
                    ContentKind::Table => "comparison",
                    ContentKind::Qa => "qa",
                }
                .to_string(),
                "affiliate".to_string(),
                "ai-generated".to_string(),
            ],
            table: Vec::new(),
            qa: Vec::new(),
            affiliate_link: None,
            created_at: Utc::now(),
            language: "en".to_string(),
            author: AUTHOR.to_string(),
        }
    }

    /// Check the fields every platform needs
    pub fn ensure_publishable(&self) -> Result<(), ContentError> {
        let missing = |field| ContentError {
            kind: self.kind.as_str().to_string(),
            title: self.title.clone(),
            field,
        };
        if self.title.trim().is_empty() {
            return Err(missing("title"));
        }
        if self.body.trim().is_empty() {
            return Err(missing("body"));
        }
        if affiliate_link_for(self).is_empty() {
            return Err(missing("affiliate link"));
        }
        Ok(())
    }

    /// The comparison rows as a markdown table; empty when there are none
    pub fn table_markdown(&self) -> String {
        let Some((header, rows)) = self.table.split_first() else {
            return String::new();
        };
        let divider = vec!["---".to_string(); header.len()];
        let mut lines = vec![markdown_row(header), markdown_row(&divider)];
        lines.extend(rows.iter().map(|row| markdown_row(row)));
        lines.join("\n")
    }

    /// One `Q: ...\nA: ...` entry per pair, ready to post as a thread
    pub fn qa_thread(&self) -> Vec<String> {
        self.qa
            .iter()
            .map(|pair| format!("Q: {}\nA: {}", pair.q, pair.a))
            .collect()
    }
}

fn markdown_row(cells: &[String]) -> String {
    format!("| {} |", cells.join(" | "))
}

/// Script and metadata for a product video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoContentData {
    pub product: ProductData,
    pub script: String,
    /// Filled in once a media generator has rendered the video
    pub video_path: Option<String>,
    pub thumbnail: String,
    pub duration_sec: u32,
    pub title: String,
    pub description: String,
    pub affiliate_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub language: String,
    pub author: String,
}

/// Outcome of publishing one item to one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishingResult {
    pub platform: String,
    pub url: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub content_type: String,
    pub content_title: String,
}

/// Something that can point buyers at a product
pub trait AffiliateTarget {
    fn own_affiliate_link(&self) -> Option<&str>;
    fn own_url(&self) -> Option<&str> {
        None
    }
    fn product(&self) -> Option<&ProductData> {
        None
    }
}

impl AffiliateTarget for ProductData {
    fn own_affiliate_link(&self) -> Option<&str> {
        Some(&self.affiliate_link)
    }

    fn own_url(&self) -> Option<&str> {
        Some(&self.url)
    }
}

impl AffiliateTarget for ContentData {
    fn own_affiliate_link(&self) -> Option<&str> {
        self.affiliate_link.as_deref()
    }

    fn product(&self) -> Option<&ProductData> {
        Some(&self.product)
    }
}

impl AffiliateTarget for VideoContentData {
    fn own_affiliate_link(&self) -> Option<&str> {
        self.affiliate_link.as_deref()
    }

    fn product(&self) -> Option<&ProductData> {
        Some(&self.product)
    }
}

/// First non-empty of: own affiliate link, product affiliate link, own URL,
/// product URL. Empty when none is set.
pub fn affiliate_link_for(target: &impl AffiliateTarget) -> String {
    let product = target.product();
    [
        target.own_affiliate_link(),
        product.map(|p| p.affiliate_link.as_str()),
        target.own_url(),
        product.map(|p| p.url.as_str()),
    ]
    .into_iter()
    .flatten()
    .find(|link| !link.is_empty())
    .unwrap_or_default()
    .to_string()
}

/// Translate known Greek labels, then drop any remaining Greek characters
pub fn only_english(text: &str) -> String {
    let translated = LABEL_TRANSLATIONS
        .iter()
        .fold(text.to_string(), |acc, (greek, english)| acc.replace(greek, english));
    GREEK_CHARS.replace_all(&translated, "").into_owned()
}

/// YouTube rejects long titles and some punctuation
pub fn youtube_safe_title(title: &str) -> String {
    let safe: String = title
        .chars()
        .take(YOUTUBE_TITLE_MAX)
        .filter(|c| *c != '|' && *c != ':')
        .collect();
    let safe = safe.trim();
    if safe.is_empty() {
        YOUTUBE_FALLBACK_TITLE.to_string()
    } else {
        safe.to_string()
    }
}

/// Blog, comparison table and Q&A for one product
pub fn generate_content_for_product(product: &ProductData) -> Vec<ContentData> {
    let features = value_features_text(product);
    let preamble = format!("{}\n{}\n\n", AI_DISCLOSURE, AFFILIATE_DISCLOSURE);

    let blog = ContentData::new(
        product,
        ContentKind::Blog,
        format!("Review: {}", product.title),
        format!(
            "{}A detailed look at the {}. Features: {}. Price: {} {}. {}",
            preamble, product.title, product.description, product.price, product.currency, features
        ),
        format!("{}: {}", product.title, features),
    );

    let mut table = ContentData::new(
        product,
        ContentKind::Table,
        format!("Comparison: {} vs Competition", product.title),
        format!("{}See the table for comparison. {}", preamble, features),
        format!("{} vs competition: {}", product.title, features),
    );
    table.table = vec![
        vec!["Product".into(), "Price".into(), "Rating".into(), "Warranty".into()],
        vec![
            product.title.clone(),
            product.price.to_string(),
            product.rating.map(|r| r.to_string()).unwrap_or_else(|| "-".into()),
            product.guarantees.clone().unwrap_or_else(|| "-".into()),
        ],
    ];

    let mut qa = ContentData::new(
        product,
        ContentKind::Qa,
        format!("Q&A: {}", product.title),
        format!("{}Frequently asked questions about the product. {}", preamble, features),
        format!("Answers for {}: {}", product.title, features),
    );
    qa.qa = vec![
        QaPair {
            q: format!("Is {} worth it?", product.title),
            a: format!("Yes, for its price and features. {}", features),
        },
        QaPair {
            q: "Where can I buy it?".to_string(),
            a: affiliate_link_for(product),
        },
    ];

    tracing::debug!("[Content] Generated blog, table and Q&A for {}", product.title);
    vec![blog, table, qa]
}

/// Narration script and metadata for a product video
pub fn generate_video_for_product(product: &ProductData) -> VideoContentData {
    let features = value_features_text(product);
    let link = affiliate_link_for(product);

    let script = format!(
        "[Narrator]\nToday we're reviewing the {title}.\n\n\
         It comes with {features}.\n\n\
         [Disclosure]\nThis video contains affiliate links. Content generated by AI.\n\n\
         [Call-to-Action]\nCheck the link in the description to get yours now!",
        title = product.title,
        features = if features.is_empty() { "a strong feature set".to_string() } else { features.clone() },
    );

    VideoContentData {
        product: product.clone(),
        script,
        video_path: None,
        thumbnail: product.image.clone(),
        duration_sec: 90,
        title: format!("{} Review & Unboxing! {}", product.title, features),
        description: format!(
            "This video was generated by AI.\nHands-on review of {}. {} Affiliate link: {}",
            product.title, features, link
        ),
        affiliate_link: None,
        created_at: Utc::now(),
        language: "en".to_string(),
        author: AUTHOR.to_string(),
    }
}
