use std::{fmt, str::FromStr};

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::info;
use url::Url;

use crate::http::Fetch;

pub mod profile;
pub mod works;

const API_BASE: &str = "https://pub.orcid.org/v3.0";

/// A syntactically valid ORCID iD such as `0000-0002-1825-0097`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrcidId(String);

impl FromStr for OrcidId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut id = s.trim();

        // Accept the iD the way orcid.org prints it.
        if let Some(rest) = id
            .strip_prefix("https://orcid.org/")
            .or_else(|| id.strip_prefix("http://orcid.org/"))
            .or_else(|| id.strip_prefix("orcid.org/"))
        {
            id = rest.trim_end_matches('/');
        }

        static ORCID_RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^\d{4}-\d{4}-\d{4}-\d{3}[\dXx]$").unwrap());

        if ORCID_RE.is_match(id) {
            Ok(OrcidId(id.to_ascii_uppercase()))
        } else {
            Err(format!("invalid ORCID iD: {s}"))
        }
    }
}

impl fmt::Display for OrcidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl OrcidId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub(crate) fn section_url(id: &OrcidId, section: &str) -> anyhow::Result<Url> {
    Url::parse(&format!("{API_BASE}/{id}/{section}"))
        .with_context(|| format!("bad ORCID endpoint for {id}/{section}"))
}

/// Fetch one section (`person`, `works`, ...) of a public ORCID record.
pub(crate) fn fetch_section(fetcher: &dyn Fetch, id: &OrcidId, section: &str) -> anyhow::Result<Value> {
    let url = section_url(id, section)?;
    info!(%url, "fetching ORCID {section}");
    fetcher
        .get_json(&url, Some("application/json"))
        .with_context(|| format!("failed to fetch ORCID {section} for {id}"))
}
