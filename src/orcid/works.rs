//! ORCID works → `publications.json`.

use std::{cmp::Reverse, collections::HashSet};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{OrcidId, fetch_section};
use crate::{
    extract::{nested, nested_list, nested_value, numeric_or_zero},
    http::Fetch,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Publication {
    pub title: String,
    pub venue: String,
    pub year: String,
    pub doi: String,
    pub url: String,
}

impl Publication {
    /// Identity used to drop duplicate works: case-folded title, year, case-folded DOI.
    fn fingerprint(&self) -> (String, String, String) {
        (
            caseless::default_case_fold_str(&self.title),
            self.year.clone(),
            caseless::default_case_fold_str(&self.doi),
        )
    }
}

pub fn fetch_publications(fetcher: &dyn Fetch, id: &OrcidId) -> anyhow::Result<Vec<Publication>> {
    let works = fetch_section(fetcher, id, "works")?;
    Ok(normalize_works(&works))
}

/// Normalize every work group, drop repeated fingerprints, and sort newest first.
pub fn normalize_works(works: &Value) -> Vec<Publication> {
    let mut seen = HashSet::new();
    let mut publications: Vec<Publication> = nested_list(works, &["group"])
        .iter()
        .map(normalize_group)
        .filter(|p| {
            let fresh = seen.insert(p.fingerprint());
            if !fresh {
                debug!(title = %p.title, "dropping duplicate work");
            }
            fresh
        })
        .collect();
    sort_publications(&mut publications);
    publications
}

fn normalize_group(group: &Value) -> Publication {
    static EMPTY: Value = Value::Null;
    let summary = best_summary(group).unwrap_or(&EMPTY);

    let title = nested_value(summary, &["title", "title", "value"]);

    let mut venue = nested_value(summary, &["journal-title", "value"]);
    if venue.is_empty() {
        let work_type = nested_value(summary, &["type"]).replace('-', " ");
        let work_type = work_type.trim();
        venue = if work_type.is_empty() {
            "Unspecified venue".to_string()
        } else {
            title_case(work_type)
        };
    }

    let summary_ids = nested(summary, &["external-ids"]);
    let group_ids = nested(group, &["external-ids"]);

    let doi = extract_doi(summary_ids)
        .or_else(|| extract_doi(group_ids))
        .unwrap_or_default();

    let url = Some(nested_value(summary, &["url", "value"]))
        .filter(|u| !u.is_empty())
        .or_else(|| external_url(summary_ids))
        .or_else(|| external_url(group_ids))
        .or_else(|| (!doi.is_empty()).then(|| format!("https://doi.org/{doi}")))
        .unwrap_or_default();

    Publication {
        title: if title.is_empty() { "Untitled".to_string() } else { title },
        venue,
        year: nested_value(summary, &["publication-date", "year", "value"]),
        doi,
        url,
    }
}

/// The most recently modified summary; the first one wins a tie.
fn best_summary(group: &Value) -> Option<&Value> {
    let modified = |s: &Value| numeric_or_zero(&nested_value(s, &["last-modified-date", "value"]));
    nested_list(group, &["work-summary"])
        .iter()
        .reduce(|best, s| if modified(s) > modified(best) { s } else { best })
}

fn external_id_list(ids: Option<&Value>) -> &[Value] {
    ids.map(|ids| nested_list(ids, &["external-id"]))
        .unwrap_or(&[])
}

fn extract_doi(ids: Option<&Value>) -> Option<String> {
    external_id_list(ids)
        .iter()
        .find(|item| nested_value(item, &["external-id-type"]).to_lowercase() == "doi")
        .map(|item| nested_value(item, &["external-id-value"]))
        .filter(|doi| !doi.is_empty())
}

fn external_url(ids: Option<&Value>) -> Option<String> {
    external_id_list(ids)
        .iter()
        .map(|item| nested_value(item, &["external-id-url", "value"]))
        .find(|url| !url.is_empty())
}

/// `"journal article"` → `"Journal Article"`: upper-case the first letter of every alphabetic
/// run, lower-case the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}

/// Descending numeric year, then ascending case-folded title.
pub fn sort_publications(publications: &mut [Publication]) {
    publications.sort_by_cached_key(|p| (Reverse(numeric_or_zero(&p.year)), p.title.to_lowercase()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fake::FakeFetcher;
    use serde_json::json;

    fn summary(title: &str, year: &str, modified: &str) -> Value {
        json!({
            "title": { "title": { "value": title } },
            "publication-date": { "year": { "value": year } },
            "last-modified-date": { "value": modified },
        })
    }

    fn publication(title: &str, year: &str) -> Publication {
        Publication {
            title: title.into(),
            venue: String::new(),
            year: year.into(),
            doi: String::new(),
            url: String::new(),
        }
    }

    #[test]
    fn picks_most_recently_modified_summary() {
        let group = json!({ "work-summary": [
            summary("Old", "2020", "100"),
            summary("New", "2021", "300"),
            summary("Tie", "2022", "300"),
            summary("Bad", "2023", "n/a"),
        ]});
        let p = normalize_group(&group);
        assert_eq!(p.title, "New");
        assert_eq!(p.year, "2021");
    }

    #[test]
    fn empty_group_falls_back_to_placeholders() {
        let p = normalize_group(&json!({}));
        assert_eq!(p.title, "Untitled");
        assert_eq!(p.venue, "Unspecified venue");
        assert_eq!((p.year.as_str(), p.doi.as_str(), p.url.as_str()), ("", "", ""));
    }

    #[test]
    fn venue_falls_back_to_humanized_type() {
        let group = json!({ "work-summary": [{ "type": "CONFERENCE-paper" }] });
        assert_eq!(normalize_group(&group).venue, "Conference Paper");

        let group = json!({ "work-summary": [{
            "type": "journal-article",
            "journal-title": { "value": "Nature" }
        }]});
        assert_eq!(normalize_group(&group).venue, "Nature");
    }

    #[test]
    fn doi_lookup_is_case_insensitive_and_falls_back_to_group() {
        let group = json!({
            "external-ids": { "external-id": [
                { "external-id-type": " DOI ", "external-id-value": " 10.5555/group " }
            ]},
            "work-summary": [{
                "external-ids": { "external-id": [
                    { "external-id-type": "isbn", "external-id-value": "978-3-16" }
                ]}
            }]
        });
        let p = normalize_group(&group);
        assert_eq!(p.doi, "10.5555/group");
        assert_eq!(p.url, "https://doi.org/10.5555/group");
    }

    #[test]
    fn url_prefers_explicit_then_external_then_doi() {
        let explicit = json!({ "work-summary": [{
            "url": { "value": "https://example.org/paper" },
            "external-ids": { "external-id": [{
                "external-id-type": "doi",
                "external-id-value": "10.1/xyz",
                "external-id-url": { "value": "https://doi.org/10.1/xyz-ext" }
            }]}
        }]});
        assert_eq!(normalize_group(&explicit).url, "https://example.org/paper");

        let external = json!({ "work-summary": [{
            "external-ids": { "external-id": [
                { "external-id-type": "doi", "external-id-value": "10.1/xyz" },
                { "external-id-type": "uri", "external-id-url": { "value": "https://repo.example/1" } }
            ]}
        }]});
        assert_eq!(normalize_group(&external).url, "https://repo.example/1");

        let doi_only = json!({ "work-summary": [{
            "external-ids": { "external-id": [
                { "external-id-type": "doi", "external-id-value": "10.1/xyz", "external-id-url": null }
            ]}
        }]});
        let p = normalize_group(&doi_only);
        assert_eq!(p.doi, "10.1/xyz");
        assert_eq!(p.url, "https://doi.org/10.1/xyz");
    }

    #[test]
    fn duplicate_fingerprints_keep_first() {
        let works = json!({ "group": [
            { "work-summary": [{
                "title": { "title": { "value": "Deep Nets" } },
                "journal-title": { "value": "First Venue" },
                "publication-date": { "year": { "value": "2022" } },
                "external-ids": { "external-id": [{ "external-id-type": "doi", "external-id-value": "10.1/ABC" }] }
            }]},
            { "work-summary": [{
                "title": { "title": { "value": "deep nets" } },
                "journal-title": { "value": "Second Venue" },
                "publication-date": { "year": { "value": "2022" } },
                "external-ids": { "external-id": [{ "external-id-type": "doi", "external-id-value": "10.1/abc" }] }
            }]},
            { "work-summary": [{
                "title": { "title": { "value": "Deep Nets" } },
                "publication-date": { "year": { "value": "2021" } }
            }]}
        ]});
        let pubs = normalize_works(&works);
        assert_eq!(pubs.len(), 2);
        assert_eq!(pubs[0].venue, "First Venue");
        assert_eq!(pubs[1].year, "2021");
    }

    #[test]
    fn fingerprints_use_full_case_folding() {
        let works = json!({ "group": [
            { "work-summary": [summary("Straße Networks", "2020", "1")] },
            { "work-summary": [summary("STRASSE NETWORKS", "2020", "1")] },
            { "work-summary": [summary("ﬁnite Fields", "2020", "1")] },
            { "work-summary": [summary("FINITE FIELDS", "2020", "1")] },
        ]});
        let titles: Vec<_> = normalize_works(&works).into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["Straße Networks", "ﬁnite Fields"]);
    }

    #[test]
    fn sorts_by_year_desc_then_title() {
        let mut pubs = vec![
            publication("B", "2019"),
            publication("A", "2023"),
            publication("C", "2023"),
        ];
        sort_publications(&mut pubs);
        let order: Vec<_> = pubs.iter().map(|p| (p.title.as_str(), p.year.as_str())).collect();
        assert_eq!(order, vec![("A", "2023"), ("C", "2023"), ("B", "2019")]);
    }

    #[test]
    fn non_numeric_years_sort_last() {
        let mut pubs = vec![
            publication("z", ""),
            publication("Y", "circa 2000"),
            publication("x", "1999"),
        ];
        sort_publications(&mut pubs);
        let titles: Vec<_> = pubs.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["x", "Y", "z"]);
    }

    #[test]
    fn fetches_works_endpoint() {
        let id: OrcidId = "0000-0002-1825-0097".parse().unwrap();
        let f = FakeFetcher::new().route(
            "https://pub.orcid.org/v3.0/0000-0002-1825-0097/works",
            r#"{"group":[{"work-summary":[{"title":{"title":{"value":"Only"}}}]}]}"#,
        );
        let pubs = fetch_publications(&f, &id).unwrap();
        assert_eq!(pubs.len(), 1);
        assert_eq!(pubs[0].title, "Only");
        assert_eq!(f.calls().len(), 1);
    }
}
