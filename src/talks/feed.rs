//! Atom feed parsing for YouTube channel feeds.

use quick_xml::{
    NsReader,
    escape::{resolve_predefined_entity, unescape},
    events::{BytesStart, Event},
    name::{Namespace, ResolveResult},
};

const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";

/// Raw fields of one `<entry>`, trimmed but otherwise untouched.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: String,
    pub author: Option<String>,
}

#[derive(Clone, Copy)]
enum Field {
    Title,
    Published,
    AuthorName,
}

/// Which fields of the current entry are already settled. The first occurrence of each wins,
/// even when it is empty.
#[derive(Default)]
struct Taken {
    title: bool,
    published: bool,
    author: bool,
    link: bool,
}

impl Taken {
    fn claim(&mut self, field: Field) -> Option<Field> {
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Published => &mut self.published,
            Field::AuthorName => &mut self.author,
        };
        (!std::mem::replace(slot, true)).then_some(field)
    }
}

/// Collect every Atom `entry` that is a direct child of the root element.
///
/// Only elements in the Atom namespace are read, so `media:title` and friends inside
/// `media:group` never shadow the entry title.
pub(crate) fn parse_feed(xml: &str) -> anyhow::Result<Vec<FeedEntry>> {
    let mut reader = NsReader::from_str(xml);

    let mut entries = Vec::new();
    let mut entry: Option<FeedEntry> = None;
    let mut depth = 0usize;
    let mut in_author = false;
    let mut capture: Option<Field> = None;
    let mut taken = Taken::default();
    let mut text = String::new();

    let mut buf = Vec::new();
    loop {
        match reader.read_resolved_event_into(&mut buf) {
            Ok((_, Event::Eof)) => break,
            Ok((ns, Event::Start(e))) => {
                depth += 1;
                let atom = is_atom(ns);
                let local = e.local_name();
                match (depth, local.as_ref()) {
                    (2, b"entry") if atom => {
                        entry = Some(FeedEntry::default());
                        taken = Taken::default();
                    }
                    (3, b"title") if atom && entry.is_some() => capture = taken.claim(Field::Title),
                    (3, b"published") if atom && entry.is_some() => {
                        capture = taken.claim(Field::Published)
                    }
                    (3, b"author") if atom && entry.is_some() => in_author = true,
                    (3, b"link") if atom => take_link(&mut entry, &mut taken, &e),
                    (4, b"name") if atom && in_author => capture = taken.claim(Field::AuthorName),
                    _ => {}
                }
                text.clear();
            }
            Ok((ns, Event::Empty(e))) => {
                if depth + 1 == 3 && is_atom(ns) && entry.is_some() {
                    // A self-closing element still settles its field as empty.
                    match e.local_name().as_ref() {
                        b"link" => take_link(&mut entry, &mut taken, &e),
                        b"title" => {
                            let _ = taken.claim(Field::Title);
                        }
                        b"published" => {
                            let _ = taken.claim(Field::Published);
                        }
                        _ => {}
                    }
                }
            }
            Ok((_, Event::Text(t))) => {
                if capture.is_some() {
                    let raw = String::from_utf8_lossy(t.as_ref());
                    match unescape(&raw) {
                        Ok(s) => text.push_str(&s),
                        Err(_) => text.push_str(&raw),
                    }
                }
            }
            Ok((_, Event::CData(t))) => {
                if capture.is_some() {
                    text.push_str(&String::from_utf8_lossy(t.as_ref()));
                }
            }
            Ok((_, Event::GeneralRef(r))) => {
                if capture.is_some() {
                    push_reference(&mut text, &String::from_utf8_lossy(r.as_ref()));
                }
            }
            Ok((_, Event::End(_))) => {
                if let (Some(field), Some(current)) = (capture.take(), entry.as_mut()) {
                    let value = text.trim().to_string();
                    match field {
                        Field::Title => current.title = value,
                        Field::Published => current.published = value,
                        Field::AuthorName if !value.is_empty() => current.author = Some(value),
                        Field::AuthorName => {}
                    }
                }
                match depth {
                    3 => in_author = false,
                    2 => entries.extend(entry.take()),
                    _ => {}
                }
                text.clear();
                depth = depth.saturating_sub(1);
            }
            Err(e) => return Err(anyhow::anyhow!("feed XML parse error: {e}")),
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

fn is_atom(ns: ResolveResult<'_>) -> bool {
    matches!(ns, ResolveResult::Bound(Namespace(n)) if n == ATOM_NS)
}

// Only the first link counts; without an `href` the entry has no link at all.
fn take_link(entry: &mut Option<FeedEntry>, taken: &mut Taken, e: &BytesStart<'_>) {
    if let Some(entry) = entry
        && !std::mem::replace(&mut taken.link, true)
    {
        entry.link = get_attr_value(e, b"href").unwrap_or_default().trim().to_string();
    }
}

fn get_attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .map(|a| {
            let raw = String::from_utf8_lossy(a.value.as_ref()).to_string();
            unescape(&raw).map(|v| v.into_owned()).unwrap_or(raw)
        })
}

/// Resolve `&amp;`-style and numeric references that the reader reports separately.
fn push_reference(out: &mut String, name: &str) {
    let numeric = name.strip_prefix('#').and_then(|n| match n.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => n.parse().ok(),
    });
    if let Some(ch) = numeric.and_then(char::from_u32) {
        out.push(ch);
    } else if let Some(s) = resolve_predefined_entity(name) {
        out.push_str(s);
    } else {
        out.push('&');
        out.push_str(name);
        out.push(';');
    }
}
