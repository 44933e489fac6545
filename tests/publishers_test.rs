use affiliate_promoter::catalog::{
    DevtoPublisher, FacebookPublisher, HashnodePublisher, LinkedInPublisher, Post, Publisher,
    TwitterPublisher,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn post() -> Post {
    Post {
        title: "Review: Gaming Laptop".into(),
        body: "A detailed look at the Gaming Laptop.".into(),
        short_text: "Review: Gaming Laptop\nFast and light...\nBuy here: https://www.ebay.com/itm/123?campid=5338".into(),
        link: "https://www.ebay.com/itm/123?campid=5338".into(),
        tags: vec!["ebay".into(), "review".into()],
        content_type: "blog".into(),
    }
}

#[tokio::test]
async fn test_devto_posts_article_with_link() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/articles"))
        .and(header("api-key", "devto-key"))
        .and(body_partial_json(json!({
            "article": {
                "title": "Review: Gaming Laptop",
                "body_markdown": "A detailed look at the Gaming Laptop.\n\nBuy here: https://www.ebay.com/itm/123?campid=5338",
                "tags": ["ebay", "review"]
            }
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "url": "https://dev.to/me/review-1" })),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let devto = DevtoPublisher::new("devto-key").with_api_base(mock_server.uri());
    let result = devto.publish(&post()).await.unwrap();
    assert_eq!(result.platform, "devto");
    assert_eq!(result.status, "success");
    assert_eq!(result.url, "https://dev.to/me/review-1");
}

#[tokio::test]
async fn test_hashnode_creates_story() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("authorization", "hn-token"))
        .and(body_string_contains("createStory"))
        .and(body_partial_json(json!({
            "variables": { "input": { "title": "Review: Gaming Laptop" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "createStory": { "code": 201, "success": true, "post": { "slug": "review-gaming-laptop" } } }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let hashnode = HashnodePublisher::new("hn-token").with_api_base(mock_server.uri());
    let result = hashnode.publish(&post()).await.unwrap();
    assert_eq!(result.platform, "hashnode");
    assert_eq!(result.url, "https://hashnode.com/post/review-gaming-laptop");
}

#[tokio::test]
async fn test_hashnode_graphql_errors_fail_the_post() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "variables": { "input": { "publicationId": "pub-1" } } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{ "message": "Invalid tag" }, { "message": "Not a member" }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let hashnode = HashnodePublisher::new("hn-token")
        .with_publication_id("pub-1")
        .with_api_base(mock_server.uri());
    let err = hashnode.publish(&post()).await.unwrap_err();
    assert!(err.to_string().contains("Invalid tag; Not a member"));
}

#[tokio::test]
async fn test_hashnode_unsuccessful_story_fails_the_post() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "createStory": { "code": 400, "success": false, "message": "Title too short" } }
        })))
        .mount(&mock_server)
        .await;

    let hashnode = HashnodePublisher::new("hn-token").with_api_base(mock_server.uri());
    let err = hashnode.publish(&post()).await.unwrap_err();
    assert!(err.to_string().contains("Title too short"));
}

#[tokio::test]
async fn test_linkedin_shares_with_restli_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .and(header("authorization", "Bearer li-token"))
        .and(header("x-restli-protocol-version", "2.0.0"))
        .and(body_partial_json(json!({
            "author": "urn:li:person:abc",
            "lifecycleState": "PUBLISHED"
        })))
        .respond_with(ResponseTemplate::new(201).insert_header("x-restli-id", "urn:li:share:42"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let linkedin = LinkedInPublisher::new("li-token", "urn:li:person:abc")
        .with_api_base(mock_server.uri());
    let result = linkedin.publish(&post()).await.unwrap();
    assert_eq!(result.platform, "linkedin");
    assert_eq!(result.url, "https://www.linkedin.com/feed/update/urn:li:share:42");
}

#[tokio::test]
async fn test_facebook_posts_to_page_feed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v19.0/page-1/feed"))
        .and(body_string_contains("access_token=fb-token"))
        .and(body_string_contains("message=Review%3A+Gaming+Laptop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "page-1_99" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let facebook = FacebookPublisher::new("fb-token", "page-1").with_api_base(mock_server.uri());
    let result = facebook.publish(&post()).await.unwrap();
    assert_eq!(result.url, "https://www.facebook.com/page-1_99");
}

#[tokio::test]
async fn test_facebook_rejection_is_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v19.0/page-1/feed"))
        .respond_with(ResponseTemplate::new(403).set_body_string("permissions error"))
        .mount(&mock_server)
        .await;

    let facebook = FacebookPublisher::new("fb-token", "page-1").with_api_base(mock_server.uri());
    let err = facebook.publish(&post()).await.unwrap_err();
    assert!(err.to_string().contains("Facebook API error (403 Forbidden)"));
}

#[tokio::test]
async fn test_twitter_thread_chains_replies() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(header("authorization", "Bearer tw-token"))
        .and(body_partial_json(json!({ "text": "Q: Is it worth it?\nA: Yes" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": "100" } })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/2/tweets"))
        .and(body_partial_json(json!({
            "text": "Q: Where can I buy it?\nA: https://ebay.com",
            "reply": { "in_reply_to_tweet_id": "100" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "data": { "id": "101" } })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let twitter = TwitterPublisher::new("tw-token").with_api_base(mock_server.uri());
    let parts = vec![
        "Q: Is it worth it?\nA: Yes".to_string(),
        "Q: Where can I buy it?\nA: https://ebay.com".to_string(),
    ];
    let result = twitter.publish_thread("Q&A: Gaming Laptop", &parts).await.unwrap();
    assert_eq!(result.content_type, "thread");
    assert_eq!(result.url, "https://twitter.com/i/web/status/100");
}
