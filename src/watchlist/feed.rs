//! YouTube Atom feed parsing.

use super::WatchlistError;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

/// One `<entry>` of a channel feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub video_id: String,
    /// Raw `<published>` timestamp.
    pub published: String,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    VideoId,
    Published,
}

/// Extract `(yt:videoId, published)` pairs.  Entries missing either are
/// dropped.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, WatchlistError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut in_entry = false;
    let mut field: Option<Field> = None;
    let mut video_id = String::new();
    let mut published = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"entry" => {
                    in_entry = true;
                    video_id.clear();
                    published.clear();
                }
                b"videoId" if in_entry => field = Some(Field::VideoId),
                b"published" if in_entry => field = Some(Field::Published),
                _ => {}
            },
            Event::Text(t) => {
                if let Some(f) = field {
                    let text = t.unescape().unwrap_or_default();
                    match f {
                        Field::VideoId => video_id.push_str(&text),
                        Field::Published => published.push_str(&text),
                    }
                }
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"entry" {
                    if !video_id.is_empty() && !published.is_empty() {
                        entries.push(FeedEntry {
                            video_id: std::mem::take(&mut video_id),
                            published: std::mem::take(&mut published),
                        });
                    }
                    in_entry = false;
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(entries)
}

/// Parse an Atom timestamp.  Offsets are honoured; a timestamp without
/// one is taken as UTC.
pub fn parse_timestamp(published: &str) -> Option<DateTime<Utc>> {
    let s = published.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Whether `published` lies less than `max_age` before `now`.
/// Unparseable timestamps are never recent.
pub fn is_recent(published: &str, now: DateTime<Utc>, max_age: Duration) -> bool {
    match parse_timestamp(published) {
        Some(ts) => now - ts < max_age,
        None => false,
    }
}
