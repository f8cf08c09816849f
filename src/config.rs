use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

/// Log levels as defined in log2 crate
#[derive(Debug, Serialize, Deserialize, Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// All program arguments. `CrawlerConfig` is built from this and
/// describes only the crawler itself
#[derive(Parser, Debug, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Seed URL, may be given several times
    #[arg(
        short,
        long = "seed-url",
        default_values_t = [
            "https://www.ics.uci.edu".to_string(),
            "https://www.cs.uci.edu".to_string(),
            "https://www.informatics.uci.edu".to_string(),
            "https://www.stat.uci.edu".to_string(),
        ]
    )]
    pub seed_urls: Vec<String>,
    /// User agent sent with every request
    #[arg(short, long, default_value = "uci-crawler/0.1")]
    pub user_agent: String,
    /// Cache server (host:port) every page is requested through
    #[arg(long)]
    pub cache_server: Option<String>,
    /// Delay every worker waits after each page, in milliseconds
    #[arg(short, long, default_value = "500")]
    pub request_delay: u64,
    /// Minimum delay between two fetches to the same host, in milliseconds
    #[arg(long, default_value = "500")]
    pub politeness_delay: u64,
    /// Number of concurrent workers
    #[arg(short, long, default_value = "4")]
    pub worker_count: usize,
    /// How many times pages sharing one query-less URL may be crawled
    #[arg(long, default_value = "20")]
    pub visit_cap: usize,
    /// Maximum redirects followed for one URL
    #[arg(long, default_value = "6")]
    pub redirect_limit: usize,
    /// Pages at least this similar to a seen page are dropped (0, 1]
    #[arg(long, default_value = "0.95")]
    pub similarity_threshold: f64,
    /// A path segment repeated more often than this marks a trap
    #[arg(long, default_value = "4")]
    pub segment_repeat_limit: usize,
    /// Request timeout in seconds
    #[arg(long, default_value = "10")]
    pub request_timeout: u64,
    /// Number of most common words in the report
    #[arg(long, default_value = "50")]
    pub top_words: usize,
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", value_enum)]
    pub log_level: LogLevel,
}

impl Config {
    pub fn new() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.seed_urls.is_empty() {
            anyhow::bail!("at least one seed url is required");
        }
        if self.worker_count == 0 {
            anyhow::bail!("worker_count must be greater than 0");
        }
        if self.visit_cap == 0 {
            anyhow::bail!("visit_cap must be greater than 0");
        }
        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }
        if self.segment_repeat_limit == 0 {
            anyhow::bail!("segment_repeat_limit must be greater than 0");
        }
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            anyhow::bail!("similarity_threshold must be in (0, 1]");
        }
        Ok(())
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["uci-crawler"];
        argv.extend_from_slice(args);
        Config::parse_from(argv)
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = parse(&[]);
        assert_eq!(cfg.seed_urls.len(), 4);
        assert_eq!(cfg.redirect_limit, 6);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn repeated_seed_urls_replace_defaults() {
        let cfg = parse(&[
            "--seed-url",
            "https://www.ics.uci.edu/a",
            "--seed-url",
            "https://www.ics.uci.edu/b",
        ]);
        assert_eq!(
            cfg.seed_urls,
            vec!["https://www.ics.uci.edu/a", "https://www.ics.uci.edu/b"]
        );
    }

    #[test]
    fn rejects_zero_workers() {
        let cfg = parse(&["--worker-count", "0"]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_request_timeout() {
        let cfg = parse(&["--request-timeout", "0"]);
        assert!(cfg.validate().is_err());
        let cfg = parse(&["--request-timeout", "1"]);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        let cfg = parse(&["--similarity-threshold", "1.5"]);
        assert!(cfg.validate().is_err());
        let cfg = parse(&["--similarity-threshold", "0"]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn log_level_displays_lowercase() {
        assert_eq!(LogLevel::Warn.to_string(), "warn");
    }
}
