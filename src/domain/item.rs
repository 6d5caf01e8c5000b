/// One entry of a syndicated feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub description: String,
    pub link: String,
    pub guid: String,
}

impl FeedItem {
    /// Deduplication key: the guid, or the title when the guid is empty.
    pub fn identity(&self) -> &str {
        if self.guid.is_empty() {
            &self.title
        } else {
            &self.guid
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, guid: &str) -> FeedItem {
        FeedItem {
            title: title.into(),
            guid: guid.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_identity_prefers_guid() {
        assert_eq!(item("Title", "guid-1").identity(), "guid-1");
    }

    #[test]
    fn test_identity_falls_back_to_title() {
        assert_eq!(item("Title", "").identity(), "Title");
    }

    #[test]
    fn test_display_title_without_title() {
        assert_eq!(item("", "g").display_title(), "(Untitled)");
        assert_eq!(item("My Article", "g").display_title(), "My Article");
    }
}
