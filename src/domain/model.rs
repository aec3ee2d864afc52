use std::fmt::{Display, Formatter};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::ports::ProviderError;
use crate::utils::error::Result;
use crate::utils::validation::{require_non_empty, require_range};

pub const MAX_CREDIT_SCORE: u16 = 700;

/// Upper bound of the unified card score. Every normalised score lies in `[0, CARD_SCORE_MAX]`.
pub const CARD_SCORE_MAX: Decimal = dec!(10);

/// A validated customer query. Identity for caching is the exact field triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecommendationRequest {
    name: String,
    credit_score: u16,
    annual_salary: u64,
}

impl RecommendationRequest {
    pub fn new(name: impl Into<String>, credit_score: i64, annual_salary: i64) -> Result<Self> {
        let name = name.into();
        require_non_empty("name", &name, "Name is required")?;
        require_range(
            "score",
            credit_score,
            0,
            i64::from(MAX_CREDIT_SCORE),
            "Score must be between 0 and 700",
        )?;
        require_range("salary", annual_salary, 0, i64::MAX, "Salary must be positive")?;

        Ok(Self {
            name,
            credit_score: credit_score as u16,
            annual_salary: annual_salary as u64,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn credit_score(&self) -> u16 {
        self.credit_score
    }

    pub fn annual_salary(&self) -> u64 {
        self.annual_salary
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self)
    }
}

/// Deterministic cache key for a request.
///
/// The two integer fields cannot contain `:`, so putting the free-form name last keeps the
/// key injective over `(name, credit_score, annual_salary)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(request: &RecommendationRequest) -> Self {
        Self(format!(
            "recommendations:{}:{}:{}",
            request.credit_score, request.annual_salary, request.name
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scale a provider reports its eligibility-style signal on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalScale {
    /// An eligibility figure out of ten.
    ZeroToTen,
    /// A probability-like approval rating.
    ZeroToOne,
}

impl SignalScale {
    pub const fn upper_bound(self) -> Decimal {
        match self {
            Self::ZeroToTen => dec!(10),
            Self::ZeroToOne => Decimal::ONE,
        }
    }

    pub fn contains(self, value: Decimal) -> bool {
        value >= Decimal::ZERO && value <= self.upper_bound()
    }
}

/// One card as advertised by a provider, before normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProviderCard {
    pub provider: String,
    pub card_name: String,
    pub apr: Decimal,
    pub raw_signal: Decimal,
    pub raw_signal_scale: SignalScale,
}

/// Canonical recommendation; `score` is on the unified `[0, 10]` scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecommendation {
    pub provider: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub apr: Decimal,
    #[serde(rename = "cardScore", with = "rust_decimal::serde::float")]
    pub score: Decimal,
}

/// Outcome of a single provider call.
pub type ProviderOutcome = std::result::Result<Vec<RawProviderCard>, ProviderError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderStatus {
    Succeeded { cards: usize },
    Failed(ProviderError),
}

/// What happened to one provider during a fan-out.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReport {
    pub provider: String,
    pub status: ProviderStatus,
    pub elapsed_ms: u64,
}

impl ProviderReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, ProviderStatus::Failed(_))
    }
}

/// Result of one orchestration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Recommendations {
    pub cards: Vec<CardRecommendation>,
    pub from_cache: bool,
    /// Per-provider reports; empty when served from cache.
    pub providers: Vec<ProviderReport>,
    /// Faults absorbed while answering.
    pub warnings: Vec<String>,
}

impl Recommendations {
    pub fn cached(cards: Vec<CardRecommendation>, warnings: Vec<String>) -> Self {
        Self {
            cards,
            from_cache: true,
            providers: Vec::new(),
            warnings,
        }
    }

    /// Fresh, empty, and every configured provider failed.
    pub fn provider_outage(&self) -> bool {
        !self.from_cache
            && self.cards.is_empty()
            && !self.providers.is_empty()
            && self.providers.iter().all(ProviderReport::is_failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ProviderError;

    #[test]
    fn test_request_validation_bounds() {
        assert!(RecommendationRequest::new("Test", 0, 0).is_ok());
        assert!(RecommendationRequest::new("Test", 700, 30000).is_ok());

        let err = RecommendationRequest::new("Test", 701, 30000).unwrap_err();
        assert_eq!(err.to_string(), "Score must be between 0 and 700");

        let err = RecommendationRequest::new("Test", -1, 30000).unwrap_err();
        assert!(err.is_validation());

        let err = RecommendationRequest::new("Test", 500, -5).unwrap_err();
        assert_eq!(err.to_string(), "Salary must be positive");

        let err = RecommendationRequest::new("  ", 500, 10).unwrap_err();
        assert_eq!(err.to_string(), "Name is required");
    }

    #[test]
    fn test_fingerprint_is_exact_value_equality() {
        let a = RecommendationRequest::new("Test", 700, 30000).unwrap();
        let b = RecommendationRequest::new("Test", 700, 30000).unwrap();
        let lower = RecommendationRequest::new("test", 700, 30000).unwrap();
        let padded = RecommendationRequest::new("Test ", 700, 30000).unwrap();

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), lower.fingerprint());
        assert_ne!(a.fingerprint(), padded.fingerprint());
        assert_eq!(a.fingerprint().as_str(), "recommendations:700:30000:Test");
    }

    #[test]
    fn test_fingerprint_separates_colon_names() {
        let a = RecommendationRequest::new("x:1", 2, 3).unwrap();
        let b = RecommendationRequest::new("1", 2, 3).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_card_serializes_with_numeric_fields() {
        let card = CardRecommendation {
            provider: "ScoredCards".to_string(),
            name: "PremiumRewards".to_string(),
            apr: dec!(21.9),
            score: dec!(7.5),
        };

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["apr"], serde_json::json!(21.9));
        assert_eq!(json["cardScore"], serde_json::json!(7.5));
        assert_eq!(json["name"], "PremiumRewards");
    }

    #[test]
    fn test_provider_outage_requires_every_provider_failed() {
        let failed = ProviderReport {
            provider: "CSCards".to_string(),
            status: ProviderStatus::Failed(ProviderError::Timeout { after_ms: 10 }),
            elapsed_ms: 10,
        };
        let empty_success = ProviderReport {
            provider: "ScoredCards".to_string(),
            status: ProviderStatus::Succeeded { cards: 0 },
            elapsed_ms: 3,
        };

        let outage = Recommendations {
            providers: vec![failed.clone()],
            ..Recommendations::default()
        };
        assert!(outage.provider_outage());

        let none_found = Recommendations {
            providers: vec![failed, empty_success],
            ..Recommendations::default()
        };
        assert!(!none_found.provider_outage());

        assert!(!Recommendations::default().provider_outage());
    }
}
