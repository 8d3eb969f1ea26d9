use thiserror::Error;

/// The closed error taxonomy surfaced by every public operation in this crate.
///
/// Parsing errors at the item level (a single bad message inside a batch) are
/// logged and the item is skipped rather than turned into one of these —
/// see the call sites in `receive` and `opengroup::client` for that policy.
#[derive(Debug, Error, Clone)]
pub enum NetworkError {
    /// Non-2xx HTTP response, or a transport-level failure (status 0, no body).
    #[error("request failed with status {status}")]
    HttpRequestFailed { status: u16, body: Option<String> },

    /// 421 from a service node: the key's swarm has moved.
    #[error("snode reported wrong swarm (421)")]
    SnodeMigrated,

    /// 432 from a service node; `DifficultyState` has already been updated
    /// as a side effect by the time this is returned.
    #[error("insufficient proof of work, required difficulty is now {required_difficulty}")]
    InsufficientProofOfWork { required_difficulty: u64 },

    /// 401 on an authenticated open-group call; the cached token has already
    /// been cleared by the time this is returned.
    #[error("auth token expired or rejected")]
    TokenExpired,

    /// Structurally invalid JSON, or a required field was missing/untyped.
    #[error("failed to parse response: {0}")]
    ParsingFailed(String),

    #[error("failed to sign message: {0}")]
    MessageSigningFailed(String),

    #[error("failed to convert message to wire format: {0}")]
    MessageConversionFailed(String),

    #[error("failed to compute proof of work: {0}")]
    ProofOfWorkCalculationFailed(String),

    #[error("payload exceeds maximum allowed size")]
    MaxSizeExceeded,

    #[error("{0}")]
    Generic(String),
}

impl NetworkError {
    /// §7's propagation policy: errors in this set are fatal to the
    /// *current* call and must be surfaced rather than retried, because the
    /// side effect they carry (swarm eviction, difficulty bump, token clear)
    /// already changed the world the retry would run in.
    pub fn is_fatal_to_call(&self) -> bool {
        matches!(
            self,
            NetworkError::SnodeMigrated | NetworkError::InsufficientProofOfWork { .. } | NetworkError::TokenExpired
        )
    }
}

pub type Result<T> = std::result::Result<T, NetworkError>;
