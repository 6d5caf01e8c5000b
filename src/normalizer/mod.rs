use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{ChanfeedError, Result};
use crate::domain::FeedItem;

#[derive(Debug, Clone, Default)]
pub struct FeedMeta {
    pub title: Option<String>,
}

/// Turns a fetched feed document into [`FeedItem`]s.
#[derive(Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, body: &[u8]) -> Result<(FeedMeta, Vec<FeedItem>)> {
        let body = strip_xml_declaration(body);

        // An entry without a guid must keep an empty id so that its title
        // becomes the identity, instead of feed-rs's generated hash.
        let feed = parser::Builder::new()
            .id_generator(|_, _, _| String::new())
            .build()
            .parse(body)
            .map_err(|e| ChanfeedError::FeedParse(e.to_string()))?;

        let meta = FeedMeta {
            title: feed.title.map(|t| decode(&t.content)),
        };

        let items = feed
            .entries
            .into_iter()
            .map(|entry| FeedItem {
                title: entry.title.map(|t| decode(&t.content)).unwrap_or_default(),
                description: entry.summary.map(|s| decode(&s.content)).unwrap_or_default(),
                link: entry
                    .links
                    .into_iter()
                    .next()
                    .map(|l| l.href)
                    .unwrap_or_default(),
                guid: entry.id.trim().to_string(),
            })
            .collect();

        Ok((meta, items))
    }
}

fn decode(text: &str) -> String {
    decode_html_entities(text.trim()).to_string()
}

/// Drops a leading `<?xml ... ?>` declaration.
fn strip_xml_declaration(body: &[u8]) -> &[u8] {
    if !body.starts_with(b"<?xml") {
        return body;
    }
    match body.windows(2).position(|w| w == b"?>") {
        Some(end) => &body[end + 2..],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <description>A test feed</description>
    <item>
      <title>Test Item 1</title>
      <link>https://example.com/item1</link>
      <guid>item-1</guid>
      <description>This is item 1</description>
    </item>
    <item>
      <title>Fish &amp; Chips</title>
      <link>https://example.com/item2</link>
      <description>No guid here</description>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test Feed</title>
  <entry>
    <title>Atom Entry 1</title>
    <link href="https://example.com/atom1"/>
    <id>atom-entry-1</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <summary>This is Atom entry 1</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss() {
        let (meta, items) = Normalizer::new().normalize(RSS_SAMPLE.as_bytes()).unwrap();

        assert_eq!(meta.title.as_deref(), Some("Test Feed"));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Test Item 1");
        assert_eq!(items[0].link, "https://example.com/item1");
        assert_eq!(items[0].description, "This is item 1");
        assert_eq!(items[0].identity(), "item-1");
    }

    #[test]
    fn test_missing_guid_falls_back_to_title() {
        let (_, items) = Normalizer::new().normalize(RSS_SAMPLE.as_bytes()).unwrap();

        assert_eq!(items[1].guid, "");
        assert_eq!(items[1].identity(), "Fish & Chips");
    }

    #[test]
    fn test_parse_atom() {
        let (meta, items) = Normalizer::new().normalize(ATOM_SAMPLE.as_bytes()).unwrap();

        assert_eq!(meta.title.as_deref(), Some("Atom Test Feed"));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].identity(), "atom-entry-1");
        assert_eq!(items[0].link, "https://example.com/atom1");
    }

    #[test]
    fn test_garbage_is_an_error() {
        let err = Normalizer::new().normalize(b"this is not xml").unwrap_err();
        assert!(matches!(err, ChanfeedError::FeedParse(_)));
    }

    #[test]
    fn test_strip_xml_declaration() {
        assert_eq!(
            strip_xml_declaration(b"<?xml version=\"1.0\"?>\n<rss/>"),
            b"\n<rss/>"
        );
        assert_eq!(strip_xml_declaration(b"<rss/>"), b"<rss/>");
    }
}
