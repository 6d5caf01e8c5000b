/// Polling state of one feed URL.
#[derive(Debug, Clone)]
pub struct Feed {
    pub url: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl Feed {
    pub fn new(url: String) -> Self {
        Self {
            url,
            etag: None,
            last_modified: None,
        }
    }
}
