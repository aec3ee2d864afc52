use std::fmt::{Display, Formatter};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::model::{CardRecommendation, Fingerprint, ProviderOutcome, RecommendationRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    TransportError,
    InvalidResponse,
    Cancelled,
}

impl FailureKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::TransportError => "transport_error",
            Self::InvalidResponse => "invalid_response",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single provider produced no cards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("no response within {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("cancelled by caller")]
    Cancelled,
}

impl ProviderError {
    pub fn timeout(deadline: Duration) -> Self {
        Self::Timeout {
            after_ms: deadline.as_millis() as u64,
        }
    }

    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Transport(_) => FailureKind::TransportError,
            Self::InvalidResponse(_) => FailureKind::InvalidResponse,
            Self::Cancelled => FailureKind::Cancelled,
        }
    }
}

/// A card-provider backend.
///
/// Implementations translate the canonical request into their own wire shape, make exactly one
/// call, and never block past `deadline`. Every failure is reported through the returned
/// outcome; adapters do not log.
#[async_trait]
pub trait CardProvider: Send + Sync {
    /// Stable provider identifier, copied onto every card it returns.
    fn id(&self) -> &str;

    async fn fetch(&self, request: &RecommendationRequest, deadline: Duration) -> ProviderOutcome;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache unreachable: {0}")]
    Connectivity(String),

    #[error("cached payload is corrupt: {0}")]
    Corrupt(String),

    #[error("cache error: {0}")]
    Other(String),
}

impl CacheError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

/// Key-value store for normalised result sets.
///
/// Must tolerate concurrent reads and writes from many orchestrations.
#[async_trait]
pub trait CacheGateway: Send + Sync {
    async fn read(&self, key: &Fingerprint) -> Result<Option<Vec<CardRecommendation>>, CacheError>;

    async fn write(
        &self,
        key: &Fingerprint,
        cards: &[CardRecommendation],
        ttl: Duration,
    ) -> Result<(), CacheError>;
}
