//! Server configuration.

/// Configuration for the reference service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Maximum number of entries returned per page, whatever the client asks.
    pub max_page_size: u32,
    /// Whether listing an unknown collection is reported as a permission
    /// error instead of "not found".
    pub hide_unknown_collections: bool,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new() -> Self {
        Self {
            max_page_size: 100,
            hide_unknown_collections: false,
        }
    }

    /// Sets the maximum page size.
    pub fn with_max_page_size(mut self, size: u32) -> Self {
        self.max_page_size = size.max(1);
        self
    }

    /// Reports unknown collections as permission errors.
    pub fn with_hidden_unknown_collections(mut self) -> Self {
        self.hide_unknown_collections = true;
        self
    }

    /// Clamps a client-requested page size to the server limits.
    pub fn clamp_limit(&self, requested: u32) -> u32 {
        requested.clamp(1, self.max_page_size.max(1))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}
