use affiliate_promoter::catalog::{AliExpressClient, EbayClient, ProductSource};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ebay_search_body() -> serde_json::Value {
    serde_json::json!({
        "itemSummaries": [
            {
                "title": "Gaming Laptop",
                "price": {"value": "899.99", "currency": "USD"},
                "itemWebUrl": "https://www.ebay.com/itm/123",
                "image": {"imageUrl": "https://i.ebayimg.com/123.jpg"},
                "condition": "New",
                "seller": {"username": "shop", "feedbackPercentage": "99.5", "feedbackScore": 1200},
                "shippingOptions": [{"shippingCost": {"value": "0.00", "currency": "USD"}}]
            }
        ]
    })
}

#[tokio::test]
async fn test_ebay_search_tags_affiliate_links() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/buy/browse/v1/item_summary/search"))
        .and(query_param("q", "laptop"))
        .and(query_param("limit", "3"))
        .and(header("authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ebay_search_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = EbayClient::new("id", "secret", "5338")
        .with_api_base(mock_server.uri())
        .with_user_token("user-token");

    let products = client.search_products("laptop", 3).await.unwrap();
    assert_eq!(products.len(), 1);

    let laptop = &products[0];
    assert_eq!(laptop.title, "Gaming Laptop");
    assert_eq!(laptop.price, 899.99);
    assert_eq!(laptop.source, "ebay");
    assert!(laptop.affiliate_link.contains("campid=5338"));
    assert_eq!(laptop.seller_trust.as_deref(), Some("shop (99.5%, 1200 reviews)"));
    assert_eq!(laptop.shipping_info.as_deref(), Some("Shipping: 0.00 USD"));
    assert_eq!(client.request_count(), 1);
}

#[tokio::test]
async fn test_ebay_refreshes_rejected_token_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/buy/browse/v1/item_summary/search"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/identity/v1/oauth2/token"))
        // base64("id:secret")
        .and(header("authorization", "Basic aWQ6c2VjcmV0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh",
            "expires_in": 7200
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/buy/browse/v1/item_summary/search"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ebay_search_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = EbayClient::new("id", "secret", "5338")
        .with_api_base(mock_server.uri())
        .with_refresh_token("refresh")
        .with_user_token("stale");

    let products = client.search_products("laptop", 3).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(client.request_count(), 2);
}

#[tokio::test]
async fn test_ebay_without_refresh_token_fails() {
    let mock_server = MockServer::start().await;

    let client = EbayClient::new("id", "secret", "5338").with_api_base(mock_server.uri());
    let err = client.search_products("laptop", 3).await.unwrap_err();
    assert!(err.to_string().contains("refresh token"));
}

#[tokio::test]
async fn test_aliexpress_search() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sync"))
        .and(query_param("method", "aliexpress.affiliate.product.query"))
        .and(query_param("keywords", "smartwatch"))
        .and(query_param("app_key", "app-1"))
        .and(query_param("tracking_id", "pid-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "aliexpress_affiliate_product_query_response": {
                "resp_result": {
                    "result": {
                        "products": {
                            "product": [
                                {
                                    "product_title": "Smart Watch",
                                    "target_sale_price": "29.99",
                                    "target_sale_price_currency": "EUR",
                                    "promotion_link": "https://s.click.aliexpress.com/e/abc",
                                    "product_detail_url": "https://www.aliexpress.com/item/1.html"
                                }
                            ]
                        }
                    }
                }
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = AliExpressClient::new("app-1", "secret")
        .with_endpoint(format!("{}/sync", mock_server.uri()))
        .with_tracking_id("pid-1");

    let products = client.search_products("smartwatch", 5).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].currency, "EUR");
    assert_eq!(
        products[0].affiliate_link,
        "https://s.click.aliexpress.com/e/abc?tracking_id=pid-1"
    );
}

#[tokio::test]
async fn test_request_budget_stops_searches() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = AliExpressClient::new("app-1", "secret")
        .with_endpoint(format!("{}/sync", mock_server.uri()))
        .with_request_limit(0);

    assert!(client.search_products("smartwatch", 5).await.unwrap().is_empty());
}
