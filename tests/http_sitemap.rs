mod support;

use std::time::Duration;

use axum::http::{StatusCode, header::CONTENT_TYPE};
use forum_sitemap::{
    cache::{CacheKey, DocumentCache},
    domain::entities::{ForumRecord, PostRecord, TopicRecord},
    domain::types::ForumStatus,
    infra::{db::normalize_timestamp, http::XML_CONTENT_TYPE},
};
use time::macros::datetime;

use support::{ForumData, app, body_string, forum, get, unavailable_app};

const ENDPOINT: &str = "/wp-json/asgaros/v1/forum-sitemap";
const VIRTUAL: &str = "/forum-sitemap.xml";

fn closed_forum() -> ForumRecord {
    let mut closed = forum(1, 0, "staff");
    closed.status = ForumStatus::Closed;
    closed
}

fn sample_forum() -> ForumData {
    ForumData {
        forums: vec![
            forum(42, 2, ""),
            forum(7, 1, "announcements"),
            closed_forum(),
            forum(3, 2, "general"),
        ],
        topics: vec![
            TopicRecord {
                id: 20,
                forum_id: 7,
                slug: "welcome".to_string(),
                last_post_at: Some(datetime!(2025-05-02 18:30)),
            },
            TopicRecord {
                id: 11,
                forum_id: 3,
                slug: String::new(),
                last_post_at: None,
            },
        ],
        posts: vec![
            PostRecord {
                id: 102,
                topic_id: 20,
                posted_at: Some(datetime!(2025-05-02 18:30)),
            },
            PostRecord {
                id: 100,
                topic_id: 20,
                posted_at: Some(datetime!(2025-05-01 09:00)),
            },
            PostRecord {
                id: 101,
                topic_id: 20,
                posted_at: None,
            },
        ],
    }
}

fn element_values<'a>(xml: &'a str, name: &str) -> Vec<&'a str> {
    let open = format!("<{name}>");
    let close = format!("</{name}>");
    xml.lines()
        .filter_map(|line| {
            line.trim()
                .strip_prefix(open.as_str())
                .and_then(|rest| rest.strip_suffix(close.as_str()))
        })
        .collect()
}

#[tokio::test]
async fn endpoint_serves_sitemap_with_headers() {
    let app = app(sample_forum());
    let response = get(&app.router, ENDPOINT).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        XML_CONTENT_TYPE
    );
    assert_eq!(response.headers().get("x-robots-tag").unwrap(), "noindex");

    let xml = body_string(response).await;
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
    assert!(xml.contains("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">"));
    assert!(xml.ends_with("</urlset>"));
}

#[tokio::test]
async fn both_adapters_return_identical_documents() {
    let app = app(sample_forum());

    let endpoint = body_string(get(&app.router, ENDPOINT).await).await;

    let virtual_path = get(&app.router, VIRTUAL).await;
    assert_eq!(virtual_path.status(), StatusCode::OK);
    assert_eq!(
        virtual_path.headers().get(CONTENT_TYPE).unwrap(),
        XML_CONTENT_TYPE
    );
    assert_eq!(
        virtual_path.headers().get("x-robots-tag").unwrap(),
        "noindex"
    );
    let virtual_path = body_string(virtual_path).await;
    let flagged = body_string(get(&app.router, "/index.php?forum_sitemap=1").await).await;

    assert_eq!(endpoint, virtual_path);
    assert_eq!(endpoint, flagged);
}

#[tokio::test]
async fn records_follow_forum_then_topic_order() {
    let app = app(sample_forum());
    let xml = body_string(get(&app.router, ENDPOINT).await).await;

    assert_eq!(
        element_values(&xml, "loc"),
        vec![
            "https://forum.example/community/",
            "https://forum.example/community/forum/announcements/",
            "https://forum.example/community/forum/general/",
            "https://forum.example/community/?view=forum&amp;id=42",
            "https://forum.example/community/?view=topic&amp;id=11",
            "https://forum.example/community/topic/welcome/",
            "https://forum.example/community/topic/welcome/#postid-100",
            "https://forum.example/community/topic/welcome/#postid-101",
            "https://forum.example/community/topic/welcome/?part=2#postid-102",
        ]
    );
    assert_eq!(
        element_values(&xml, "changefreq"),
        vec![
            "hourly", "daily", "daily", "daily", "weekly", "weekly", "monthly", "monthly",
            "monthly",
        ]
    );
    assert_eq!(
        element_values(&xml, "priority"),
        vec!["1.0", "0.8", "0.8", "0.8", "0.7", "0.7", "0.6", "0.6", "0.6"]
    );
    assert_eq!(
        element_values(&xml, "lastmod"),
        vec![
            "2025-06-15",
            "2025-06-15",
            "2025-06-15",
            "2025-06-15",
            "2025-06-15",
            "2025-05-02",
            "2025-05-01",
            "2025-05-02",
            "2025-05-02",
        ]
    );
}

#[tokio::test]
async fn every_lastmod_is_a_w3c_date() {
    let app = app(sample_forum());
    let xml = body_string(get(&app.router, ENDPOINT).await).await;

    for lastmod in element_values(&xml, "lastmod") {
        let bytes = lastmod.as_bytes();
        assert_eq!(bytes.len(), 10, "{lastmod}");
        assert!(
            bytes.iter().enumerate().all(|(index, byte)| match index {
                4 | 7 => *byte == b'-',
                _ => byte.is_ascii_digit(),
            }),
            "{lastmod}"
        );
        assert_ne!(lastmod, "1000-01-01");
    }
}

#[tokio::test]
async fn empty_forum_yields_single_url() {
    let app = app(ForumData::default());
    let xml = body_string(get(&app.router, ENDPOINT).await).await;

    assert_eq!(xml.matches("<url>").count(), 1);
    assert_eq!(
        element_values(&xml, "loc"),
        vec!["https://forum.example/community/"]
    );
}

#[tokio::test]
async fn sentinel_post_date_falls_back_to_today() {
    let app = app(ForumData {
        topics: vec![TopicRecord {
            id: 5,
            forum_id: 1,
            slug: "quiet".to_string(),
            last_post_at: normalize_timestamp(Some(datetime!(1000-01-01 0:00))),
        }],
        posts: vec![PostRecord {
            id: 50,
            topic_id: 5,
            posted_at: normalize_timestamp(Some(datetime!(1000-01-01 0:00))),
        }],
        ..ForumData::default()
    });
    let xml = body_string(get(&app.router, ENDPOINT).await).await;

    assert_eq!(
        element_values(&xml, "lastmod"),
        vec!["2025-06-15", "2025-06-15", "2025-06-15"]
    );
    assert!(!xml.contains("1000-01-01"));
}

#[tokio::test]
async fn second_request_is_served_from_cache() {
    let app = app(sample_forum());

    let first = body_string(get(&app.router, ENDPOINT).await).await;
    let second = body_string(get(&app.router, VIRTUAL).await).await;

    assert_eq!(first, second);
    assert_eq!(app.repo.queries(), 1);
    assert_eq!(
        app.cache.get(CacheKey::SITEMAP_XML).await.unwrap().as_deref(),
        Some(first.as_str())
    );
}

#[tokio::test]
async fn nocache_rebuilds_and_refreshes_cache() {
    let app = app(sample_forum());
    let first = body_string(get(&app.router, ENDPOINT).await).await;

    app.repo.replace(ForumData::default());

    let cached = body_string(get(&app.router, ENDPOINT).await).await;
    assert_eq!(cached, first);

    let bypassed = body_string(get(&app.router, &format!("{ENDPOINT}?nocache=1")).await).await;
    assert_ne!(bypassed, first);
    assert_eq!(bypassed.matches("<url>").count(), 1);

    let after = body_string(get(&app.router, VIRTUAL).await).await;
    assert_eq!(after, bypassed);
    assert_eq!(app.repo.queries(), 2);
}

#[tokio::test]
async fn nocache_on_virtual_path_also_bypasses() {
    let app = app(sample_forum());
    let _ = body_string(get(&app.router, VIRTUAL).await).await;
    let _ = body_string(get(&app.router, &format!("{VIRTUAL}?nocache=true")).await).await;
    let _ = body_string(get(&app.router, &format!("{VIRTUAL}?nocache=0")).await).await;

    assert_eq!(app.repo.queries(), 2);
}

#[tokio::test]
async fn repeated_nocache_is_read_the_same_by_both_adapters() {
    let app = app(sample_forum());
    let _ = body_string(get(&app.router, ENDPOINT).await).await;

    let endpoint = get(&app.router, &format!("{ENDPOINT}?nocache=1&nocache=1")).await;
    assert_eq!(endpoint.status(), StatusCode::OK);
    let endpoint = body_string(endpoint).await;

    let virtual_path = get(&app.router, &format!("{VIRTUAL}?nocache=1&nocache=1")).await;
    assert_eq!(virtual_path.status(), StatusCode::OK);
    assert_eq!(body_string(virtual_path).await, endpoint);

    // initial build plus one rebuild per bypassed request
    assert_eq!(app.repo.queries(), 3);
}

#[tokio::test]
async fn forum_installed_after_startup_becomes_available() {
    let app = app(sample_forum());
    app.repo.set_installed(false);

    let endpoint = get(&app.router, ENDPOINT).await;
    assert_eq!(endpoint.status(), StatusCode::SERVICE_UNAVAILABLE);
    let virtual_path = get(&app.router, VIRTUAL).await;
    assert_eq!(virtual_path.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(app.cache.is_empty());

    app.repo.set_installed(true);
    let endpoint = get(&app.router, ENDPOINT).await;
    assert_eq!(endpoint.status(), StatusCode::OK);
    let virtual_path = get(&app.router, VIRTUAL).await;
    assert_eq!(virtual_path.status(), StatusCode::OK);
    assert_eq!(app.repo.queries(), 1);
}

#[tokio::test]
async fn unavailable_forum_answers_503_on_both_adapters() {
    let app = unavailable_app();
    app.cache
        .set(
            CacheKey::SITEMAP_XML,
            "<urlset/>".to_string(),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

    let endpoint = get(&app.router, &format!("{ENDPOINT}?nocache=1")).await;
    assert_eq!(endpoint.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        endpoint.headers().get(CONTENT_TYPE).unwrap(),
        XML_CONTENT_TYPE
    );
    assert_eq!(
        body_string(endpoint).await,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><error><code>asgaros_not_loaded</code><message>Asgaros Forum is not active</message></error>"
    );

    let virtual_path = get(&app.router, &format!("{VIRTUAL}?nocache=1")).await;
    assert_eq!(virtual_path.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body_string(virtual_path).await,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><error>Asgaros Forum is not active</error>"
    );

    assert_eq!(
        app.cache.get(CacheKey::SITEMAP_XML).await.unwrap().as_deref(),
        Some("<urlset/>")
    );
    assert_eq!(app.repo.queries(), 0);
}

#[tokio::test]
async fn health_without_database_is_unavailable() {
    let app = app(ForumData::default());
    let response = get(&app.router, "/_health/db").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let app = app(ForumData::default());

    for uri in ["/", "/sitemap.xml", "/?forum_sitemap=0"] {
        let response = get(&app.router, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
    assert_eq!(app.repo.queries(), 0);
}
