//! The talk sources file (`talk_sources.json`).

use std::{fs, path::Path};

use anyhow::{Context, bail};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::extract::nested_value;

/// A YouTube channel whose feed contributes talks.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    pub name: String,
    pub url: String,
    pub format: String,
}

/// A single hand-picked video.
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturedConfig {
    pub url: String,
    pub event: String,
    pub format: String,
}

#[derive(Debug, Default, PartialEq)]
pub struct TalkSources {
    pub channels: Vec<ChannelConfig>,
    pub featured: Vec<FeaturedConfig>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSources {
    #[serde(default)]
    youtube_channels: Vec<Value>,
    #[serde(default)]
    featured: Vec<Value>,
}

impl TalkSources {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read talk sources from {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid talk sources in {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        let value: Value = serde_json::from_str(raw)?;
        if !value.is_object() {
            bail!("talk sources must be a JSON object");
        }
        let raw: RawSources = serde_json::from_value(value)?;

        let channels = raw
            .youtube_channels
            .iter()
            .filter_map(|item| {
                let url = usable_url(item)?;
                Some(ChannelConfig {
                    name: field_or(item, "name", "YouTube"),
                    url,
                    format: field_or(item, "format", "Talk and Workshop"),
                })
            })
            .collect();

        let featured = raw
            .featured
            .iter()
            .filter_map(|item| {
                let url = usable_url(item)?;
                Some(FeaturedConfig {
                    url,
                    event: field_or(item, "event", "Featured Public Talk"),
                    format: field_or(item, "format", "Technical Talk"),
                })
            })
            .collect();

        Ok(TalkSources { channels, featured })
    }

    pub fn source_count(&self) -> usize {
        self.channels.len() + self.featured.len()
    }
}

fn usable_url(item: &Value) -> Option<String> {
    if !item.is_object() {
        debug!(%item, "skipping non-object talk source");
        return None;
    }
    let url = nested_value(item, &["url"]);
    if url.is_empty() {
        debug!(%item, "skipping talk source without url");
        return None;
    }
    Some(url)
}

fn field_or(item: &Value, key: &str, default: &str) -> String {
    let v = nested_value(item, &[key]);
    if v.is_empty() { default.to_string() } else { v }
}
