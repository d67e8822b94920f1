use serde::Deserialize;

/// Rolling limit on vote actions per member.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VoteLimit {
    /// Votes allowed inside one window.
    pub max_votes: u32,
    /// Window length in seconds.
    pub window_secs: i64,
}

impl Default for VoteLimit {
    fn default() -> Self {
        Self {
            max_votes: 10,
            window_secs: 3600,
        }
    }
}

/// Configuration options specific to the forum service.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    /// Path of the SQLite database file.
    pub database_url: String,
    /// Number of entries in the cached latest-posts list.
    #[serde(default = "default_latest_posts_limit")]
    pub latest_posts_limit: i64,
    #[serde(default)]
    pub vote_limit: VoteLimit,
}

fn default_latest_posts_limit() -> i64 {
    5
}
