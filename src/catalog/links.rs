//! Affiliate link helpers

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

const EBAY_AFFILIATE_KEYS: [&str; 6] = ["mkcid", "mkrid", "siteid", "campid", "toolid", "mkevt"];

/// Tag an eBay item URL with the partner network parameters for `campid`.
///
/// Existing query parameters are kept; affiliate ones are replaced.
pub fn add_ebay_affiliate_params(item_url: &str, campid: &str) -> Result<String> {
    let mut url = Url::parse(item_url).with_context(|| format!("Invalid eBay URL: {}", item_url))?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| {
            let key: &str = key;
            !EBAY_AFFILIATE_KEYS.contains(&key)
        })
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (key, value) in &kept {
            query.append_pair(key, value);
        }
        query
            .append_pair("mkcid", "1")
            .append_pair("mkrid", "711-53200-19255-0")
            .append_pair("siteid", "0")
            .append_pair("campid", campid)
            .append_pair("toolid", "10001")
            .append_pair("mkevt", "1");
    }

    Ok(url.into())
}

/// Append `tracking_id=<pid>` unless the link already carries one
pub fn ensure_tracking_id(link: &str, pid: &str) -> String {
    if link.is_empty() || pid.is_empty() || link.contains("tracking_id") {
        return link.to_string();
    }
    let separator = if link.contains('?') { '&' } else { '?' };
    format!("{}{}tracking_id={}", link, separator, pid)
}

/// AliExpress open platform signature: key-sorted `k1v1k2v2...`,
/// HMAC-SHA256 with the app secret, uppercase hex
pub fn sign_aliexpress_params(params: &BTreeMap<String, String>, secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid AliExpress secret: {}", e))?;
    for (key, value) in params {
        mac.update(key.as_bytes());
        mac.update(value.as_bytes());
    }
    Ok(hex::encode_upper(mac.finalize().into_bytes()))
}
