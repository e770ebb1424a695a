//! Application Configuration
//!
//! Limits applied by the forum use cases.

/// Forum application configuration
#[derive(Debug, Clone)]
pub struct ForumConfig {
    /// Max problem title length (characters)
    pub title_max_len: usize,
    /// Max problem or solution description length (characters)
    pub description_max_len: usize,
    /// Max problem location length (characters)
    pub location_max_len: usize,
    /// Max comment length (characters)
    pub comment_max_len: usize,
    /// Max images attached to a problem
    pub images_max: usize,
    /// Max length of one image URL
    pub image_url_max_len: usize,
    /// Page size when the client does not ask for one
    pub default_page_size: u32,
    /// Upper bound on the requested page size
    pub max_page_size: u32,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            title_max_len: 200,
            description_max_len: 2000,
            location_max_len: 200,
            comment_max_len: 500,
            images_max: 10,
            image_url_max_len: 2048,
            default_page_size: 10,
            max_page_size: 50,
        }
    }
}

impl ForumConfig {
    /// Clamp client paging input to sane values
    pub fn page_window(&self, page: Option<u32>, limit: Option<u32>) -> (u32, u32) {
        let page = page.unwrap_or(1).max(1);
        let limit = limit
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size);
        (page, limit)
    }
}
