use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "SiteMirror/1.0";

/// Size of the slices an asset body is written in; progress is reported after each one.
pub const CHUNK_SIZE: usize = 1024;

/// Transport settings shared by every request of a traversal.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    pub user_agent: String,
    /// Whole-request timeout. `None` leaves requests unbounded, so a hung
    /// server stalls the traversal until cancelled.
    pub timeout: Option<Duration>,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }
}

impl MirrorConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
