//! Integration tests for channel video discovery against mock listing pages.

use std::time::Duration;

use media_downloader::channel::{MAX_ATTEMPTS, PageLayout};
use media_downloader::http_client::{PageTimeouts, build_page_client};
use media_downloader::{ChannelError, ChannelLimit, ChannelResolver, LinkSet};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LEGACY_PAGE: &str = r#"<html><body>
<a id="thumbnail" href="/watch?v=aaa111">one</a>
<a id="video-title" href="/watch?v=aaa111">one again</a>
<a href="/watch?v=bbb222&amp;t=10s">two</a>
<a href="/channel/about">about</a>
<a href="/watch?v=ccc333">three</a>
</body></html>"#;

const CHANNEL_PAGE: &str = r#"{"thumbnails":[
{"url":"https://i.ytimg.com/vi/id001/hqdefault.jpg?sqp=x"},
{"url":"https://i.ytimg.com/vi/id002/hqdefault.jpg"},
{"url":"https://i.ytimg.com/vi/id001/hqdefault.jpg"},
{"url":"https://i.ytimg.com/vi/id003/hqdefault.jpg"},
{"url":"https://i.ytimg.com/vi/id004/hqdefault.jpg"},
{"url":"https://i.ytimg.com/vi/id005/hqdefault.jpg"}
]}"#;

fn resolver(server: &MockServer) -> ChannelResolver {
    let client = build_page_client(PageTimeouts::default()).unwrap();
    ChannelResolver::new(client)
        .with_base_url(Url::parse(&server.uri()).unwrap())
        .with_retry_delay(Duration::ZERO)
}

#[tokio::test]
async fn test_legacy_profile_page_yields_watch_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/WhiteHouse/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LEGACY_PAGE))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c/WhiteHouse/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHANNEL_PAGE))
        .expect(0)
        .mount(&server)
        .await;

    let videos = resolver(&server)
        .resolve("WhiteHouse", ChannelLimit::Unlimited)
        .await
        .unwrap();

    assert_eq!(videos.layout, PageLayout::LegacyProfile);
    assert_eq!(videos.attempt, 1);
    assert_eq!(
        videos.links,
        [
            "https://www.youtube.com/watch?v=aaa111",
            "https://www.youtube.com/watch?v=bbb222&t=10s",
            "https://www.youtube.com/watch?v=ccc333",
        ]
    );
}

#[tokio::test]
async fn test_falls_back_to_channel_listing_thumbnails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/somechan/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>no videos</html>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c/somechan/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHANNEL_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let videos = resolver(&server)
        .resolve("somechan", ChannelLimit::Unlimited)
        .await
        .unwrap();

    assert_eq!(videos.layout, PageLayout::ChannelListing);
    assert_eq!(videos.links.len(), 5);
    assert_eq!(videos.links[0], "https://www.youtube.com/watch?v=id001");
    assert_eq!(videos.links[1], "https://www.youtube.com/watch?v=id002");
}

#[tokio::test]
async fn test_limit_truncates_distinct_matches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/somechan/videos"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c/somechan/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CHANNEL_PAGE))
        .mount(&server)
        .await;

    let mut links = LinkSet::new();
    let added = resolver(&server)
        .append_to("somechan", ChannelLimit::from(2), &mut links)
        .await;

    assert_eq!(added, 2);
    let collected: Vec<&str> = links.iter().collect();
    assert_eq!(
        collected,
        [
            "https://www.youtube.com/watch?v=id001",
            "https://www.youtube.com/watch?v=id002",
        ]
    );
}

#[tokio::test]
async fn test_not_found_after_three_attempts_without_appending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/ghost/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(u64::from(MAX_ATTEMPTS))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c/ghost/videos"))
        .respond_with(ResponseTemplate::new(500))
        .expect(u64::from(MAX_ATTEMPTS))
        .mount(&server)
        .await;

    let resolver = resolver(&server);
    let err = resolver
        .resolve("ghost", ChannelLimit::Unlimited)
        .await
        .unwrap_err();
    assert!(matches!(err, ChannelError::NotFound { attempts: 3, .. }), "{err}");

    server.verify().await;
    server.reset().await;
    let mut links: LinkSet = ["https://v.example/kept"].into_iter().collect();
    let added = resolver
        .append_to("ghost", ChannelLimit::Unlimited, &mut links)
        .await;
    assert_eq!(added, 0);
    assert_eq!(links.len(), 1);
}

#[tokio::test]
async fn test_channel_links_merge_into_existing_set_without_duplicates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/WhiteHouse/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LEGACY_PAGE))
        .mount(&server)
        .await;

    let mut links: LinkSet = ["https://www.youtube.com/watch?v=aaa111"].into_iter().collect();
    let added = resolver(&server)
        .append_to("WhiteHouse", ChannelLimit::Unlimited, &mut links)
        .await;

    assert_eq!(added, 2);
    assert_eq!(links.len(), 3);
}
