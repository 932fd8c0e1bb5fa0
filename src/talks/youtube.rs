//! YouTube channel feeds and single featured videos.

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, warn};
use url::Url;

use super::{Talk, TalkSource, feed::parse_feed};
use crate::{
    config::{ChannelConfig, FeaturedConfig},
    extract::nested_value,
    http::Fetch,
};

// Also matches the canonical `<link>` of a channel page.
static CHANNEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)youtube\.com/channel/(UC[\w-]+)").unwrap());
static EXTERNAL_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"externalId":"(UC[\w-]+)""#).unwrap());
static DATE_PUBLISHED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""datePublished":"([0-9]{4}-[0-9]{2}-[0-9]{2})""#).unwrap());

const FEED_URL: &str = "https://www.youtube.com/feeds/videos.xml";
const OEMBED_URL: &str = "https://www.youtube.com/oembed";

pub(crate) fn feed_url(channel_id: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse(FEED_URL)?;
    url.query_pairs_mut().append_pair("channel_id", channel_id);
    Ok(url)
}

pub(crate) fn watch_url(video_id: &str) -> anyhow::Result<Url> {
    let mut url = Url::parse("https://www.youtube.com/watch")?;
    url.query_pairs_mut().append_pair("v", video_id);
    Ok(url)
}

pub(crate) fn oembed_url(watch: &Url) -> anyhow::Result<Url> {
    let mut url = Url::parse(OEMBED_URL)?;
    url.query_pairs_mut()
        .append_pair("url", watch.as_str())
        .append_pair("format", "json");
    Ok(url)
}

/// Talks discovered through a channel's public Atom feed.
pub struct ChannelFeed<'a> {
    config: &'a ChannelConfig,
}

impl<'a> ChannelFeed<'a> {
    pub fn new(config: &'a ChannelConfig) -> Self {
        ChannelFeed { config }
    }

    /// Channel id from the configured URL itself, else from the channel page markup.
    fn resolve_channel_id(&self, fetcher: &dyn Fetch) -> anyhow::Result<Option<String>> {
        if let Some(caps) = CHANNEL_RE.captures(&self.config.url) {
            return Ok(Some(caps[1].to_string()));
        }

        let page_url = Url::parse(&self.config.url)
            .with_context(|| format!("invalid channel URL {}", self.config.url))?;
        let page = fetcher.get(&page_url, None)?;

        Ok(CHANNEL_RE
            .captures(&page)
            .or_else(|| EXTERNAL_ID_RE.captures(&page))
            .map(|caps| caps[1].to_string()))
    }
}

impl TalkSource for ChannelFeed<'_> {
    fn label(&self) -> &str {
        &self.config.name
    }

    fn collect(&self, fetcher: &dyn Fetch) -> anyhow::Result<Vec<Talk>> {
        let Some(channel_id) = self.resolve_channel_id(fetcher)? else {
            warn!(channel = %self.config.name, url = %self.config.url, "no channel id found");
            return Ok(Vec::new());
        };

        let url = feed_url(&channel_id)?;
        info!(channel = %self.config.name, %url, "fetching channel feed");
        let xml = fetcher.get(&url, None)?;
        let entries = parse_feed(&xml)
            .with_context(|| format!("unreadable feed for channel {channel_id}"))?;

        let name = &self.config.name;
        let talks = entries
            .into_iter()
            .filter_map(|entry| {
                if entry.title.is_empty() || entry.link.is_empty() {
                    debug!(channel = %name, "skipping feed entry without title or link");
                    return None;
                }
                let date = normalise_date(&entry.published);
                Some(Talk {
                    title: entry.title,
                    event: format!("{name} Session"),
                    year: year_of(&date),
                    date,
                    url: entry.link,
                    source: entry.author.unwrap_or_else(|| name.clone()),
                    format: self.config.format.clone(),
                    featured: false,
                })
            })
            .collect();
        Ok(talks)
    }
}

/// A single curated video, always marked as featured.
pub struct FeaturedVideo<'a> {
    config: &'a FeaturedConfig,
}

impl<'a> FeaturedVideo<'a> {
    pub fn new(config: &'a FeaturedConfig) -> Self {
        FeaturedVideo { config }
    }
}

impl TalkSource for FeaturedVideo<'_> {
    fn label(&self) -> &str {
        &self.config.url
    }

    fn collect(&self, fetcher: &dyn Fetch) -> anyhow::Result<Vec<Talk>> {
        let Some(video_id) = extract_video_id(&self.config.url) else {
            warn!(url = %self.config.url, "not a recognised YouTube video URL");
            return Ok(Vec::new());
        };
        let watch = watch_url(&video_id)?;

        let mut title = "Featured Public Talk".to_string();
        let mut source = "YouTube".to_string();
        match fetcher.get_json(&oembed_url(&watch)?, Some("application/json")) {
            Ok(meta) => {
                let t = nested_value(&meta, &["title"]);
                if !t.is_empty() {
                    title = t;
                }
                let a = nested_value(&meta, &["author_name"]);
                if !a.is_empty() {
                    source = a;
                }
            }
            Err(e) => warn!(video = %video_id, error = %format!("{e:#}"), "oEmbed lookup failed"),
        }

        let date = match fetcher.get(&watch, None) {
            Ok(page) => DATE_PUBLISHED_RE
                .captures(&page)
                .map(|caps| caps[1].to_string())
                .unwrap_or_default(),
            Err(e) => {
                warn!(video = %video_id, error = %format!("{e:#}"), "watch page fetch failed");
                String::new()
            }
        };

        Ok(vec![Talk {
            title,
            event: self.config.event.clone(),
            year: year_of(&date),
            date,
            url: watch.to_string(),
            source,
            format: self.config.format.clone(),
            featured: true,
        }])
    }
}

/// Video id from `youtu.be/<id>`, `/watch?v=<id>` or `/shorts/<id>` URLs.
pub(crate) fn extract_video_id(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let host = url.host_str().unwrap_or_default();

    let id = if host.ends_with("youtu.be") {
        url.path().trim_matches('/').to_string()
    } else if url.path() == "/watch" {
        url.query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.trim().to_string())
            .unwrap_or_default()
    } else if let Some(rest) = url.path().strip_prefix("/shorts/") {
        rest.trim().to_string()
    } else {
        String::new()
    };

    (!id.is_empty()).then_some(id)
}

/// `YYYY-MM-DD` from an ISO-8601 or RFC 2822 timestamp, in the timestamp's own offset.
pub(crate) fn normalise_date(raw: &str) -> String {
    let t = raw.trim();
    if t.is_empty() {
        return String::new();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = t.parse::<NaiveDateTime>() {
        return dt.format("%Y-%m-%d").to_string();
    }
    if let Ok(d) = t.parse::<NaiveDate>() {
        return d.format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(t) {
        return dt.format("%Y-%m-%d").to_string();
    }
    String::new()
}

fn year_of(date: &str) -> String {
    date.get(..4).unwrap_or_default().to_string()
}
