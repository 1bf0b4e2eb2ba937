use std::fmt;

/// Machine-readable error codes surfaced by the CLI alongside messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    CredentialMissing,
    CredentialInvalid,
    BoardNotFound,
    BucketNotFound,
    NoActivity,
    InvalidTimestamp,
    UpstreamRequestFailed,
    UpstreamDecodeFailed,
    CacheReadFailed,
    CacheWriteFailed,
    CacheCorrupt,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::CredentialMissing => "E1002",
            Self::CredentialInvalid => "E1003",
            Self::BoardNotFound => "E2001",
            Self::BucketNotFound => "E2002",
            Self::NoActivity => "E2003",
            Self::InvalidTimestamp => "E3001",
            Self::UpstreamRequestFailed => "E4001",
            Self::UpstreamDecodeFailed => "E4002",
            Self::CacheReadFailed => "E5001",
            Self::CacheWriteFailed => "E5002",
            Self::CacheCorrupt => "E5003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::CredentialMissing => "API credential missing",
            Self::CredentialInvalid => "API credential malformed",
            Self::BoardNotFound => "Board not found",
            Self::BucketNotFound => "List not found on board",
            Self::NoActivity => "Board has no usable activity",
            Self::InvalidTimestamp => "Action timestamp could not be parsed",
            Self::UpstreamRequestFailed => "Board service request failed",
            Self::UpstreamDecodeFailed => "Board service returned unexpected JSON",
            Self::CacheReadFailed => "Cache read failed",
            Self::CacheWriteFailed => "Cache write failed",
            Self::CacheCorrupt => "Cache file is malformed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in cardflow.toml and retry."),
            Self::CredentialMissing => Some(
                "Set TRELLO_KEY/TRELLO_TOKEN or create .ttrellokey/.ttrellotoken; see https://developers.trello.com/docs/api-introduction",
            ),
            Self::CredentialInvalid => {
                Some("Trello API keys are 32 characters and tokens are 64 characters.")
            }
            Self::BoardNotFound => Some("Run `cardflow boards` to see available board names."),
            Self::BucketNotFound => Some("Run `cardflow lists --board <name>` to see list names."),
            Self::NoActivity => Some("The board has no card actions with a destination list."),
            Self::InvalidTimestamp | Self::UpstreamDecodeFailed => None,
            Self::UpstreamRequestFailed => Some("Check network access and credentials, then retry."),
            Self::CacheReadFailed | Self::CacheWriteFailed => {
                Some("Check permissions on the cache directory.")
            }
            Self::CacheCorrupt => Some("Re-run with --force to regenerate cached data."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
