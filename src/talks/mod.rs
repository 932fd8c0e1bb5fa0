use std::{cmp::Reverse, collections::HashSet};

use indicatif::ProgressBar;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{config::TalkSources, http::Fetch};

mod feed;
pub mod youtube;

use youtube::{ChannelFeed, FeaturedVideo};

/// One entry of `talks.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Talk {
    pub title: String,
    pub event: String,
    pub date: String,
    pub year: String,
    pub url: String,
    pub source: String,
    pub format: String,
    pub featured: bool,
}

impl Talk {
    /// The date itself, else January 1st of a numeric year, else the earliest possible key.
    fn date_key(&self) -> String {
        if !self.date.is_empty() {
            self.date.clone()
        } else if !self.year.is_empty() && self.year.bytes().all(|b| b.is_ascii_digit()) {
            format!("{}-01-01", self.year)
        } else {
            "0000-00-00".to_string()
        }
    }

    fn featured_rank(&self) -> u8 {
        if self.featured { 0 } else { 1 }
    }
}

/// Somewhere talks come from. A failing source is skipped, never fatal.
pub trait TalkSource {
    fn label(&self) -> &str;
    fn collect(&self, fetcher: &dyn Fetch) -> anyhow::Result<Vec<Talk>>;
}

/// Run every channel, then every featured video, and merge the results.
pub fn collect_talks(fetcher: &dyn Fetch, sources: &TalkSources, progress: &ProgressBar) -> Vec<Talk> {
    let mut all: Vec<Box<dyn TalkSource + '_>> = Vec::with_capacity(sources.source_count());
    for channel in &sources.channels {
        all.push(Box::new(ChannelFeed::new(channel)));
    }
    for featured in &sources.featured {
        all.push(Box::new(FeaturedVideo::new(featured)));
    }

    progress.set_length(all.len() as u64);
    let mut talks = Vec::new();
    for source in &all {
        progress.set_message(source.label().to_string());
        match source.collect(fetcher) {
            Ok(found) => {
                debug!(source = source.label(), count = found.len(), "collected talks");
                talks.extend(found);
            }
            Err(e) => warn!(source = source.label(), error = %format!("{e:#}"), "skipping talk source"),
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    let mut talks = dedup_by_url(talks);
    sort_talks(&mut talks);
    talks
}

/// Keep the first talk per URL; talks without a URL are dropped.
pub fn dedup_by_url(talks: Vec<Talk>) -> Vec<Talk> {
    let mut seen = HashSet::new();
    talks
        .into_iter()
        .filter(|t| {
            let url = t.url.trim();
            !url.is_empty() && seen.insert(url.to_string())
        })
        .collect()
}

/// Newest first; on the same day featured talks lead, then titles run Z to A.
pub fn sort_talks(talks: &mut [Talk]) {
    talks.sort_by_cached_key(|t| {
        (
            Reverse(t.date_key()),
            t.featured_rank(),
            Reverse(t.title.to_lowercase()),
        )
    });
}
