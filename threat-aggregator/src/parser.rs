use crate::types::{AggregatorError, ParsedEntry, ParsedFeed, Result};
use feed_rs::parser;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

/// Elements carrying an entry's publication date: RSS 2.0 `pubDate`,
/// Atom `published` and Dublin Core `dc:date`.
const DATE_ELEMENTS: &[&[u8]] = &[b"pubDate", b"published", b"date"];

#[derive(Debug, Default, Clone, Copy)]
pub struct FeedParser;

impl FeedParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse an RSS or Atom document. Entries keep the order the feed
    /// lists them in.
    pub fn parse_feed(&self, content: &str) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let total = feed.entries.len();
        let mut raw_dates = raw_entry_dates(content);
        if raw_dates.len() != total {
            warn!(
                "Found {} raw entry dates for {} entries, using normalized dates",
                raw_dates.len(),
                total
            );
            raw_dates = vec![None; total];
        }

        let title = feed.title.map(|t| t.content);
        let entries: Vec<ParsedEntry> = feed
            .entries
            .into_iter()
            .zip(raw_dates)
            .filter_map(|(entry, raw_date)| self.parse_entry(entry, raw_date))
            .collect();

        if entries.len() < total {
            debug!("Dropped {} entries without a link", total - entries.len());
        }
        debug!("Parsed feed with {} entries", entries.len());

        Ok(ParsedFeed { title, entries })
    }

    fn parse_entry(
        &self,
        entry: feed_rs::model::Entry,
        raw_date: Option<String>,
    ) -> Option<ParsedEntry> {
        let title = entry
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Untitled".to_string());

        // Records are keyed on the link, so an entry without one is useless.
        let link = entry.links.first()?.href.clone();

        // The feed's own text wins, even when it is not a date we understand.
        let published = raw_date.or_else(|| entry.published.map(|dt| dt.to_rfc2822()));

        // Prefer the summary, then the full content body, then nothing.
        let summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .unwrap_or_default();

        Some(ParsedEntry {
            title,
            link,
            published,
            summary,
        })
    }
}

/// Publication date text of every `item`/`entry`, in document order,
/// exactly as the feed wrote it (trimmed). `None` where an entry has no
/// non-empty date element.
fn raw_entry_dates(content: &str) -> Vec<Option<String>> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut dates: Vec<Option<String>> = Vec::new();
    let mut in_entry = false;
    let mut capture: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if !in_entry && matches!(name.as_ref(), b"item" | b"entry") {
                    in_entry = true;
                    dates.push(None);
                } else if in_entry
                    && DATE_ELEMENTS.contains(&name.as_ref())
                    && matches!(dates.last(), Some(None))
                {
                    capture = Some(String::new());
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(buf) = capture.as_mut() {
                    match text.unescape() {
                        Ok(value) => buf.push_str(&value),
                        Err(e) => debug!("Unreadable date text: {}", e),
                    }
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(buf) = capture.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                if matches!(name.as_ref(), b"item" | b"entry") {
                    in_entry = false;
                    capture = None;
                } else if DATE_ELEMENTS.contains(&name.as_ref()) {
                    if let Some(text) = capture.take() {
                        let text = text.trim();
                        if !text.is_empty() {
                            if let Some(slot) = dates.last_mut() {
                                *slot = Some(text.to_string());
                            }
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Stopped scanning raw entry dates: {}", e);
                break;
            }
        }
    }

    dates
}
