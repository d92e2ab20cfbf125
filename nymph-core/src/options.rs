use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://www.troutnut.com";
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_HARVEST_DELAY: Duration = Duration::from_secs(3);

/// What happens to a specimen URL whose page could not be harvested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log and forget the URL.
    Drop,
    /// Push the URL back onto the tail of the queue.
    Requeue,
    /// Record the URL and the reason in `quarantine.txt` under the data root.
    #[default]
    Quarantine,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Drop => "drop",
            FailurePolicy::Requeue => "requeue",
            FailurePolicy::Quarantine => "quarantine",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(FailurePolicy::Drop),
            "requeue" => Ok(FailurePolicy::Requeue),
            "quarantine" => Ok(FailurePolicy::Quarantine),
            other => Err(format!("Unknown failure policy: {}", other)),
        }
    }
}

/// Resolved settings for one run.
#[derive(Debug, Clone)]
pub struct TrawlOptions {
    pub base_url: String,
    /// Root of the per-order image directories.
    pub data_root: PathBuf,
    /// Directory holding the queue snapshots.
    pub state_dir: PathBuf,
    /// Pause before each listing page after the first.
    pub page_delay: Duration,
    /// Pause between specimen pages.
    pub harvest_delay: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for TrawlOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_root: PathBuf::from("data"),
            state_dir: PathBuf::from("."),
            page_delay: DEFAULT_PAGE_DELAY,
            harvest_delay: DEFAULT_HARVEST_DELAY,
            failure_policy: FailurePolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_policy_parse() {
        assert_eq!("drop".parse::<FailurePolicy>(), Ok(FailurePolicy::Drop));
        assert_eq!(" Requeue ".parse::<FailurePolicy>(), Ok(FailurePolicy::Requeue));
        assert_eq!("QUARANTINE".parse::<FailurePolicy>(), Ok(FailurePolicy::Quarantine));
        assert!("retry".parse::<FailurePolicy>().is_err());
    }

    #[test]
    fn test_defaults() {
        let options = TrawlOptions::default();
        assert_eq!(options.base_url, DEFAULT_BASE_URL);
        assert_eq!(options.page_delay, Duration::from_secs(2));
        assert_eq!(options.harvest_delay, Duration::from_secs(3));
        assert_eq!(options.failure_policy, FailurePolicy::Quarantine);
    }
}
