//! Person, education and membership sections of an ORCID record.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use super::{OrcidId, fetch_section};
use crate::{
    extract::{dedup_in_place, nested, nested_list, nested_value, numeric_or_zero},
    http::Fetch,
    text::normalize_text,
};

/// The `orcid_profile.json` document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub orcid: String,
    pub fetched_at: String,
    pub profile: Profile,
    pub educations: Vec<Education>,
    pub memberships: Vec<Membership>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub biography: String,
    pub keywords: Vec<String>,
    pub researcher_urls: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Education {
    pub degree: String,
    pub org: String,
    pub period: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Membership {
    pub organization: String,
    pub detail: String,
}

/// Fetch `person`, `educations` and `memberships` and assemble the snapshot.
pub fn fetch_snapshot(
    fetcher: &dyn Fetch,
    id: &OrcidId,
    fetched_at: DateTime<Utc>,
) -> anyhow::Result<ProfileSnapshot> {
    let person = fetch_section(fetcher, id, "person")?;
    let educations = fetch_section(fetcher, id, "educations")?;
    let memberships = fetch_section(fetcher, id, "memberships")?;

    Ok(ProfileSnapshot {
        orcid: id.as_str().to_string(),
        fetched_at: fetched_at.to_rfc3339_opts(SecondsFormat::Micros, false),
        profile: extract_profile(&person),
        educations: extract_educations(&educations),
        memberships: extract_memberships(&memberships),
    })
}

pub fn extract_profile(person: &Value) -> Profile {
    let credit_name = nested_value(person, &["name", "credit-name", "value"]);
    let name = if credit_name.is_empty() {
        [
            nested_value(person, &["name", "given-names", "value"]),
            nested_value(person, &["name", "family-name", "value"]),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    } else {
        credit_name
    };

    let mut keywords: Vec<String> = nested_list(person, &["keywords", "keyword"])
        .iter()
        .map(|item| nested_value(item, &["content"]))
        .filter(|content| !content.is_empty())
        .collect();
    dedup_in_place(&mut keywords);

    let researcher_urls = nested_list(person, &["researcher-urls", "researcher-url"])
        .iter()
        .filter_map(|item| {
            let url = nested_value(item, &["url", "value"]);
            if url.is_empty() {
                return None;
            }
            let name = nested_value(item, &["url-name"]);
            Some(Link {
                name: if name.is_empty() { "Profile".to_string() } else { name },
                url,
            })
        })
        .collect();

    Profile {
        name,
        biography: normalize_text(&nested_value(person, &["biography", "content"])),
        keywords,
        researcher_urls,
    }
}

/// `"2020 - 2023"`, `"2020 - Present"`, `"2023"` or `""` from ORCID fuzzy dates.
pub fn format_period(start: Option<&Value>, end: Option<&Value>) -> String {
    let year = |date: Option<&Value>| {
        date.map(|d| nested_value(d, &["year", "value"]))
            .unwrap_or_default()
    };
    match (year(start), year(end)) {
        (s, e) if !s.is_empty() && !e.is_empty() => format!("{s} - {e}"),
        (s, _) if !s.is_empty() => format!("{s} - Present"),
        (_, e) => e,
    }
}

static NULL: Value = Value::Null;

/// Iterate every `<kind>-summary` object across all affiliation groups.
fn affiliation_summaries<'a>(section: &'a Value, kind: &'a str) -> impl Iterator<Item = &'a Value> {
    nested_list(section, &["affiliation-group"])
        .iter()
        .flat_map(|group| nested_list(group, &["summaries"]))
        .map(move |summary| nested(summary, &[kind]).unwrap_or(&NULL))
}

pub fn extract_educations(section: &Value) -> Vec<Education> {
    let mut items: Vec<Education> = affiliation_summaries(section, "education-summary")
        .map(|edu| {
            let role = nested_value(edu, &["role-title"]);
            let department = nested_value(edu, &["department-name"]);
            let org = nested_value(edu, &["organization", "name"]);

            let degree = match (role.is_empty(), department.is_empty()) {
                (false, false) => format!("{role} in {department}"),
                (true, false) => department,
                (false, true) => role,
                (true, true) => "Education".to_string(),
            };

            Education {
                degree,
                org: if org.is_empty() { "Unknown institution".to_string() } else { org },
                period: format_period(nested(edu, &["start-date"]), nested(edu, &["end-date"])),
                summary: String::new(),
            }
        })
        .collect();

    // Newest first; equal start years fall back to the degree label, also descending.
    items.sort_by(|a, b| {
        let start = |e: &Education| {
            numeric_or_zero(e.period.split(" - ").next().unwrap_or_default().trim())
        };
        (start(b), &b.degree).cmp(&(start(a), &a.degree))
    });
    items
}

pub fn extract_memberships(section: &Value) -> Vec<Membership> {
    affiliation_summaries(section, "membership-summary")
        .map(|membership| {
            let org = nested_value(membership, &["organization", "name"]);
            let role = nested_value(membership, &["role-title"]);
            let period = format_period(
                nested(membership, &["start-date"]),
                nested(membership, &["end-date"]),
            );

            let role = if role.is_empty() { "Member".to_string() } else { role };
            let detail = [role, period]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" | ");

            Membership {
                organization: if org.is_empty() {
                    "Professional Organization".to_string()
                } else {
                    org
                },
                detail,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fake::FakeFetcher;
    use serde_json::json;

    fn year(y: i64) -> Value {
        json!({ "year": { "value": y.to_string() } })
    }

    #[test]
    fn period_formats() {
        assert_eq!(format_period(Some(&year(2020)), Some(&year(2023))), "2020 - 2023");
        assert_eq!(format_period(Some(&year(2020)), None), "2020 - Present");
        assert_eq!(format_period(None, Some(&year(2023))), "2023");
        assert_eq!(format_period(None, None), "");
        assert_eq!(format_period(Some(&json!({ "year": null })), Some(&Value::Null)), "");
    }

    #[test]
    fn profile_prefers_credit_name_and_dedups_keywords() {
        let person = json!({
            "name": {
                "credit-name": null,
                "given-names": { "value": "Grace" },
                "family-name": { "value": " Hopper " }
            },
            "biography": { "content": "  Rear   admiral.\n\n Compiler  pioneer. " },
            "keywords": { "keyword": [
                { "content": "COBOL" },
                { "content": "compilers" },
                { "content": "COBOL" },
                { "content": "" }
            ]},
            "researcher-urls": { "researcher-url": [
                { "url-name": "Homepage", "url": { "value": "https://example.org" } },
                { "url-name": null, "url": { "value": "https://example.net" } },
                { "url-name": "Broken", "url": null }
            ]}
        });
        let profile = extract_profile(&person);
        assert_eq!(profile.name, "Grace Hopper");
        assert_eq!(profile.biography, "Rear admiral.\nCompiler pioneer.");
        assert_eq!(profile.keywords, vec!["COBOL", "compilers"]);
        assert_eq!(
            profile.researcher_urls,
            vec![
                Link { name: "Homepage".into(), url: "https://example.org".into() },
                Link { name: "Profile".into(), url: "https://example.net".into() },
            ]
        );

        let credited = json!({ "name": { "credit-name": { "value": "G. M. Hopper" } } });
        assert_eq!(extract_profile(&credited).name, "G. M. Hopper");
    }

    #[test]
    fn profile_tolerates_empty_person() {
        let profile = extract_profile(&json!({ "keywords": null, "researcher-urls": 7 }));
        assert_eq!(profile.name, "");
        assert!(profile.keywords.is_empty());
        assert!(profile.researcher_urls.is_empty());
    }

    fn edu(role: Option<&str>, dept: Option<&str>, org: Option<&str>, start: Option<i64>) -> Value {
        let mut e = serde_json::Map::new();
        if let Some(r) = role {
            e.insert("role-title".into(), json!(r));
        }
        if let Some(d) = dept {
            e.insert("department-name".into(), json!(d));
        }
        if let Some(o) = org {
            e.insert("organization".into(), json!({ "name": o }));
        }
        if let Some(s) = start {
            e.insert("start-date".into(), year(s));
        }
        json!({ "education-summary": Value::Object(e) })
    }

    #[test]
    fn educations_take_every_summary_and_sort_newest_first() {
        let section = json!({ "affiliation-group": [
            { "summaries": [
                edu(Some("BSc"), Some("Physics"), Some("Uni A"), Some(2010)),
                edu(None, Some("Mathematics"), None, Some(2018)),
            ]},
            { "summaries": [ edu(None, None, Some("Uni C"), None) ] },
            { "summaries": [ edu(Some("MSc"), None, Some("Uni D"), Some(2018)) ] },
        ]});
        let items = extract_educations(&section);
        let degrees: Vec<_> = items.iter().map(|e| e.degree.as_str()).collect();
        // Equal start years compare the labels byte-wise, descending.
        assert_eq!(degrees, vec!["Mathematics", "MSc", "BSc in Physics", "Education"]);
        assert_eq!(items[0].org, "Unknown institution");
        assert_eq!(items[0].period, "2018 - Present");
        assert_eq!(items[3].period, "");
        assert!(items.iter().all(|e| e.summary.is_empty()));
    }

    #[test]
    fn memberships_keep_upstream_order() {
        let section = json!({ "affiliation-group": [
            { "summaries": [
                { "membership-summary": {
                    "organization": { "name": "IEEE" },
                    "role-title": "Senior Member",
                    "start-date": { "year": { "value": "2019" } },
                    "end-date": { "year": { "value": "2022" } }
                }},
                { "membership-summary": { "organization": null } }
            ]},
            { "summaries": "garbage" },
            { "summaries": [
                { "membership-summary": {
                    "organization": { "name": "ACM" },
                    "start-date": { "year": { "value": "2021" } }
                }}
            ]}
        ]});
        assert_eq!(
            extract_memberships(&section),
            vec![
                Membership { organization: "IEEE".into(), detail: "Senior Member | 2019 - 2022".into() },
                Membership { organization: "Professional Organization".into(), detail: "Member".into() },
                Membership { organization: "ACM".into(), detail: "Member | 2021 - Present".into() },
            ]
        );
    }

    #[test]
    fn snapshot_fetches_three_sections() {
        let id: OrcidId = "0000-0002-1825-0097".parse().unwrap();
        let base = "https://pub.orcid.org/v3.0/0000-0002-1825-0097";
        let f = FakeFetcher::new()
            .route(format!("{base}/person"), r#"{"name":{"credit-name":{"value":"Josiah Carberry"}}}"#)
            .route(format!("{base}/educations"), r#"{"affiliation-group":[]}"#)
            .route(format!("{base}/memberships"), "{}");
        let at = DateTime::parse_from_rfc3339("2024-05-06T07:08:09Z").unwrap().with_timezone(&Utc);

        let snap = fetch_snapshot(&f, &id, at).unwrap();
        assert_eq!(snap.profile.name, "Josiah Carberry");
        assert_eq!(snap.fetched_at, "2024-05-06T07:08:09.000000+00:00");

        let v = serde_json::to_value(&snap).unwrap();
        assert_eq!(v["orcid"], "0000-0002-1825-0097");
        assert!(v["profile"]["researcherUrls"].is_array());
        assert!(v.get("fetchedAt").is_some());
    }

    #[test]
    fn snapshot_fails_when_a_section_is_unreachable() {
        let id: OrcidId = "0000-0002-1825-0097".parse().unwrap();
        let f = FakeFetcher::new()
            .route("https://pub.orcid.org/v3.0/0000-0002-1825-0097/person", "{}");
        let err = fetch_snapshot(&f, &id, Utc::now()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to fetch ORCID educations"));
    }
}
