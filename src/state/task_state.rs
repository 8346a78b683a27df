/// Terminal states of scheduled tasks
use std::fmt;

/// How a task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskState {
    /// Page fetched and parsed; its records and follow-ups were handed on
    Parsed,

    /// Page fetched but the parser rejected it (e.g. no infobox title)
    ParseFailed,

    /// HTTP 404 or 410
    DeadLink,

    /// Connection refused, DNS failure, TLS error or repeated timeouts
    Unreachable,

    /// HTTP 429
    RateLimited,

    /// Any other fetch failure (5xx after retries, unexpected status, body error)
    Failed,

    /// Response was not HTML
    ContentMismatch,

    /// Disallowed by the host's robots.txt
    RobotsDenied,
}

impl TaskState {
    /// All states, in display order
    pub const ALL: [TaskState; 8] = [
        Self::Parsed,
        Self::ParseFailed,
        Self::DeadLink,
        Self::Unreachable,
        Self::RateLimited,
        Self::Failed,
        Self::ContentMismatch,
        Self::RobotsDenied,
    ];

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Parsed)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::Parsed | Self::RobotsDenied)
    }

    /// Stable lowercase name, used in logs and the statistics table
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsed => "parsed",
            Self::ParseFailed => "parse_failed",
            Self::DeadLink => "dead_link",
            Self::Unreachable => "unreachable",
            Self::RateLimited => "rate_limited",
            Self::Failed => "failed",
            Self::ContentMismatch => "content_mismatch",
            Self::RobotsDenied => "robots_denied",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
