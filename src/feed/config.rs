//! Upstream feed configuration

use std::time::Duration;

/// Live play-by-play endpoint; `{}` is replaced with the game id
pub const DEFAULT_PLAY_BY_PLAY_URL: &str =
    "https://cdn.nba.com/static/json/liveData/playbyplay/playbyplay_{}.json";

/// Live box score endpoint; `{}` is replaced with the game id
pub const DEFAULT_BOXSCORE_URL: &str =
    "https://cdn.nba.com/static/json/liveData/boxscore/boxscore_{}.json";

/// HTTP feed options
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Play-by-play URL template
    pub play_by_play_url: String,

    /// Box score URL template
    pub boxscore_url: String,

    /// Per-request timeout
    pub request_timeout: Duration,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            play_by_play_url: DEFAULT_PLAY_BY_PLAY_URL.to_string(),
            boxscore_url: DEFAULT_BOXSCORE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            user_agent: concat!("courtside/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FeedConfig {
    /// Set the play-by-play URL template
    pub fn play_by_play_url(mut self, template: impl Into<String>) -> Self {
        self.play_by_play_url = template.into();
        self
    }

    /// Set the box score URL template
    pub fn boxscore_url(mut self, template: impl Into<String>) -> Self {
        self.boxscore_url = template.into();
        self
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub(crate) fn play_by_play_for(&self, game_id: &str) -> String {
        self.play_by_play_url.replace("{}", game_id)
    }

    pub(crate) fn boxscore_for(&self, game_id: &str) -> String {
        self.boxscore_url.replace("{}", game_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FeedConfig::default();

        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("courtside/"));
        assert_eq!(
            config.play_by_play_for("0022400061"),
            "https://cdn.nba.com/static/json/liveData/playbyplay/playbyplay_0022400061.json"
        );
        assert_eq!(
            config.boxscore_for("0022400061"),
            "https://cdn.nba.com/static/json/liveData/boxscore/boxscore_0022400061.json"
        );
    }

    #[test]
    fn test_builder_chaining() {
        let config = FeedConfig::default()
            .play_by_play_url("http://127.0.0.1:9000/pbp/{}")
            .boxscore_url("http://127.0.0.1:9000/box/{}")
            .request_timeout(Duration::from_secs(2))
            .user_agent("test");

        assert_eq!(config.play_by_play_for("g1"), "http://127.0.0.1:9000/pbp/g1");
        assert_eq!(config.boxscore_for("g1"), "http://127.0.0.1:9000/box/g1");
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert_eq!(config.user_agent, "test");
    }
}
