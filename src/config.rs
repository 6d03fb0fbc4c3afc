use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Configuration for the engagement engine
///
/// Loaded once at startup and passed into each component at construction;
/// nothing reads the environment after `from_env` returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Point values per action
    pub points: PointsConfig,
    /// Rank threshold table
    pub ranks: RanksConfig,
    /// Duel timing and thresholds
    pub duel: DuelConfig,
    /// Content validation limits
    pub content: ContentConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// Points awarded per action kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsConfig {
    /// Awarded to the author when a submission is approved
    pub content_approved: i64,
    /// Awarded to the reacting user for a like or dislike
    pub reaction: i64,
    /// Awarded to the winning author when a duel resolves with a winner
    pub duel_win: i64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            content_approved: 20,
            reaction: 1,
            duel_win: 30,
        }
    }
}

/// One tier of the rank table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankTier {
    /// Minimum points for this tier
    pub threshold: i64,
    /// Rank label shown to callers
    pub label: String,
}

/// Ordered points -> label table; thresholds strictly increasing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RanksConfig {
    pub tiers: Vec<RankTier>,
}

impl Default for RanksConfig {
    fn default() -> Self {
        let tiers = [
            (0, "Newcomer"),
            (50, "Joker"),
            (150, "Comedian"),
            (400, "Humorist"),
            (1000, "Legend"),
        ];
        Self {
            tiers: tiers
                .iter()
                .map(|(threshold, label)| RankTier {
                    threshold: *threshold,
                    label: (*label).to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuelConfig {
    /// Length of the public voting window in seconds
    pub voting_window_secs: i64,
    /// Minimum total votes for a duel to produce a winner
    pub min_votes: u32,
    /// How often the background sweep looks for expired duels, in seconds
    pub resolve_interval_secs: u64,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            voting_window_secs: 3600,
            min_votes: 3,
            resolve_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Maximum body length for short-form text submissions
    pub max_joke_len: usize,
    /// Maximum body length for media-reference submissions
    pub max_meme_len: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            max_joke_len: 2000,
            max_meme_len: 512,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub postgres_url: String,
    /// Enable PostgreSQL (if false, state is in-memory only)
    pub postgres_enabled: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            postgres_url: "postgresql://localhost:5432/banter_arena".to_string(),
            postgres_enabled: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Enable per-request logging spans
    pub log_requests: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8460,
            },
            points: PointsConfig::default(),
            ranks: RanksConfig::default(),
            duel: DuelConfig::default(),
            content: ContentConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                log_requests: false,
            },
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults, and validate cross-field requirements
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Server configuration
        if let Ok(host) = env::var("ARENA_HOST") {
            config.server.host = host;
        }

        if let Ok(port) = env::var("ARENA_PORT") {
            config.server.port = port.parse().context("Invalid ARENA_PORT value")?;
        }

        // Point values
        if let Ok(points) = env::var("ARENA_POINTS_APPROVAL") {
            config.points.content_approved = points
                .parse()
                .context("Invalid ARENA_POINTS_APPROVAL value")?;
        }

        if let Ok(points) = env::var("ARENA_POINTS_REACTION") {
            config.points.reaction = points
                .parse()
                .context("Invalid ARENA_POINTS_REACTION value")?;
        }

        if let Ok(points) = env::var("ARENA_POINTS_DUEL_WIN") {
            config.points.duel_win = points
                .parse()
                .context("Invalid ARENA_POINTS_DUEL_WIN value")?;
        }

        // Duel configuration
        if let Ok(window) = env::var("ARENA_DUEL_VOTING_WINDOW_SECS") {
            config.duel.voting_window_secs = window
                .parse()
                .context("Invalid ARENA_DUEL_VOTING_WINDOW_SECS value")?;
        }

        if let Ok(min_votes) = env::var("ARENA_DUEL_MIN_VOTES") {
            config.duel.min_votes = min_votes
                .parse()
                .context("Invalid ARENA_DUEL_MIN_VOTES value")?;
        }

        if let Ok(interval) = env::var("ARENA_DUEL_RESOLVE_INTERVAL_SECS") {
            config.duel.resolve_interval_secs = interval
                .parse()
                .context("Invalid ARENA_DUEL_RESOLVE_INTERVAL_SECS value")?;
        }

        // Content limits
        if let Ok(max_len) = env::var("ARENA_MAX_JOKE_LEN") {
            config.content.max_joke_len =
                max_len.parse().context("Invalid ARENA_MAX_JOKE_LEN value")?;
        }

        if let Ok(max_len) = env::var("ARENA_MAX_MEME_LEN") {
            config.content.max_meme_len =
                max_len.parse().context("Invalid ARENA_MAX_MEME_LEN value")?;
        }

        // Database configuration
        if let Ok(url) = env::var("ARENA_DATABASE_URL") {
            config.database.postgres_url = url;
            config.database.postgres_enabled = true;
        }

        if let Ok(enabled) = env::var("ARENA_DATABASE_ENABLED") {
            config.database.postgres_enabled = enabled
                .parse()
                .context("Invalid ARENA_DATABASE_ENABLED value")?;
        }

        // Logging configuration
        if let Ok(level) = env::var("ARENA_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(log_requests) = env::var("ARENA_LOG_REQUESTS") {
            config.logging.log_requests = log_requests
                .parse()
                .context("Invalid ARENA_LOG_REQUESTS value")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field requirements that env parsing cannot catch
    fn validate(&self) -> Result<()> {
        if self.ranks.tiers.is_empty() {
            return Err(anyhow::anyhow!("rank table must contain at least one tier"));
        }

        let mut prev = None;
        for tier in &self.ranks.tiers {
            if let Some(prev) = prev {
                if tier.threshold <= prev {
                    return Err(anyhow::anyhow!(
                        "rank thresholds must be strictly increasing (found {} after {})",
                        tier.threshold,
                        prev
                    ));
                }
            }
            prev = Some(tier.threshold);
        }

        if self.points.content_approved < 0 || self.points.reaction < 0 || self.points.duel_win < 0
        {
            return Err(anyhow::anyhow!("point values must be non-negative"));
        }

        if self.duel.voting_window_secs <= 0 {
            return Err(anyhow::anyhow!("duel voting window must be positive"));
        }

        Ok(())
    }
}
