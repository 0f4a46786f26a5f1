//! Canonical link resolution for forum entities.
//!
//! A [`LinkResolver`] may or may not know the public URL of an entity. The
//! `*_link` functions wrap a resolver with the query-string fallback so every
//! entity always ends up with a definite URL.

use std::{borrow::Cow, num::NonZeroU32};

use url::Url;

use crate::domain::entities::{ForumRecord, PostRecord, TopicRecord};

/// View name used by the forum for single-post links.
pub const POST_VIEW_NAME: &str = "post";

pub trait LinkResolver: Send + Sync {
    fn home(&self) -> Option<String>;
    fn forum(&self, forum: &ForumRecord) -> Option<String>;
    fn topic(&self, topic: &TopicRecord) -> Option<String>;
    /// `position` is the zero-based index of the post within its topic.
    fn post(&self, post: &PostRecord, topic: &TopicRecord, position: usize) -> Option<String>;
}

/// Forum-level options consulted when the resolver has no answer.
#[derive(Debug, Clone)]
pub struct ForumOptions {
    pub site_url: String,
    pub location_url: Option<String>,
    pub view_name_forum: String,
    pub view_name_topic: String,
}

impl Default for ForumOptions {
    fn default() -> Self {
        Self {
            site_url: "http://localhost/".to_string(),
            location_url: None,
            view_name_forum: "forum".to_string(),
            view_name_topic: "topic".to_string(),
        }
    }
}

/// Pretty-permalink resolver built from stored slugs.
#[derive(Debug, Clone)]
pub struct PermalinkResolver {
    home: Option<String>,
    pretty_permalinks: bool,
    view_name_forum: String,
    view_name_topic: String,
    posts_per_page: NonZeroU32,
}

impl PermalinkResolver {
    pub fn new(
        home: Option<String>,
        pretty_permalinks: bool,
        view_name_forum: impl Into<String>,
        view_name_topic: impl Into<String>,
        posts_per_page: NonZeroU32,
    ) -> Self {
        Self {
            home: home.filter(|value| !value.trim().is_empty()),
            pretty_permalinks,
            view_name_forum: view_name_forum.into(),
            view_name_topic: view_name_topic.into(),
            posts_per_page,
        }
    }

    fn slug_link(&self, view: &str, slug: &str) -> Option<String> {
        if !self.pretty_permalinks || slug.trim().is_empty() {
            return None;
        }
        let home = self.home.as_deref()?;
        Some(format!("{}/{}/{}/", home.trim_end_matches('/'), view, slug.trim()))
    }
}

impl LinkResolver for PermalinkResolver {
    fn home(&self) -> Option<String> {
        self.home.clone()
    }

    fn forum(&self, forum: &ForumRecord) -> Option<String> {
        self.slug_link(&self.view_name_forum, &forum.slug)
    }

    fn topic(&self, topic: &TopicRecord) -> Option<String> {
        self.slug_link(&self.view_name_topic, &topic.slug)
    }

    fn post(&self, post: &PostRecord, topic: &TopicRecord, position: usize) -> Option<String> {
        let topic_link = self.topic(topic)?;
        let per_page = usize::try_from(self.posts_per_page.get()).unwrap_or(usize::MAX);
        let page = position / per_page + 1;
        let mut link = if page > 1 {
            add_query_args(&topic_link, &[("part", &page.to_string())])
        } else {
            topic_link
        };
        link.push_str(&format!("#postid-{}", post.id));
        Some(link)
    }
}

/// Forum home: resolver, then the landing page, then the site root.
pub fn home_link(resolver: &dyn LinkResolver, options: &ForumOptions) -> String {
    resolver
        .home()
        .filter(|link| !link.is_empty())
        .or_else(|| options.location_url.clone().filter(|link| !link.is_empty()))
        .unwrap_or_else(|| options.site_url.clone())
}

pub fn forum_link(
    resolver: &dyn LinkResolver,
    options: &ForumOptions,
    home: &str,
    forum: &ForumRecord,
) -> String {
    resolver
        .forum(forum)
        .filter(|link| !link.is_empty())
        .unwrap_or_else(|| view_link(home, &options.view_name_forum, forum.id))
}

pub fn topic_link(
    resolver: &dyn LinkResolver,
    options: &ForumOptions,
    home: &str,
    topic: &TopicRecord,
) -> String {
    resolver
        .topic(topic)
        .filter(|link| !link.is_empty())
        .unwrap_or_else(|| view_link(home, &options.view_name_topic, topic.id))
}

/// Post link with HTML entities decoded; resolvers may hand back
/// attribute-escaped URLs such as `?a=1&#038;b=2`.
pub fn post_link(
    resolver: &dyn LinkResolver,
    home: &str,
    post: &PostRecord,
    topic: &TopicRecord,
    position: usize,
) -> String {
    resolver
        .post(post, topic, position)
        .map(|link| decode_entities(&link).into_owned())
        .filter(|link| !link.is_empty())
        .unwrap_or_else(|| view_link(home, POST_VIEW_NAME, post.id))
}

fn view_link(home: &str, view: &str, id: i64) -> String {
    add_query_args(home, &[("view", view), ("id", &id.to_string())])
}

/// Append query arguments to `base`, replacing any existing arguments with
/// the same names and keeping the fragment in place.
pub fn add_query_args(base: &str, args: &[(&str, &str)]) -> String {
    match Url::parse(base) {
        Ok(mut url) => {
            let retained: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(key, _)| !args.iter().any(|(name, _)| key == name))
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect();
            url.set_query(None);
            {
                let mut pairs = url.query_pairs_mut();
                for (key, value) in &retained {
                    pairs.append_pair(key, value);
                }
                for (key, value) in args {
                    pairs.append_pair(key, value);
                }
            }
            url.into()
        }
        Err(_) => append_raw_query(base, args),
    }
}

fn append_raw_query(base: &str, args: &[(&str, &str)]) -> String {
    let (head, fragment) = match base.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (base, None),
    };
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(args.iter().copied())
        .finish();
    let separator = if head.contains('?') { '&' } else { '?' };
    let mut link = format!("{head}{separator}{encoded}");
    if let Some(fragment) = fragment {
        link.push('#');
        link.push_str(fragment);
    }
    link
}

/// Decode character, XML and common HTML entity references. References that
/// name nothing known are left as written.
pub fn decode_entities(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    if let Ok(decoded) = quick_xml::escape::unescape(raw) {
        return decoded;
    }

    let mut decoded = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        decoded.push_str(&rest[..start]);
        let tail = &rest[start..];
        let end = tail[1..]
            .find(|ch: char| ch == ';' || ch == '&' || ch.is_whitespace())
            .map(|offset| offset + 1);
        match end {
            Some(end) if tail[end..].starts_with(';') => {
                let reference = &tail[..=end];
                match quick_xml::escape::unescape(reference) {
                    Ok(text) => decoded.push_str(&text),
                    Err(_) => decoded.push_str(html_entity(&tail[1..end]).unwrap_or(reference)),
                }
                rest = &tail[end + 1..];
            }
            _ => {
                decoded.push('&');
                rest = &tail[1..];
            }
        }
    }
    decoded.push_str(rest);
    Cow::Owned(decoded)
}

fn html_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "nbsp" => "\u{a0}",
        "hellip" => "\u{2026}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "copy" => "\u{a9}",
        _ => return None,
    })
}
