use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::adapters::checked_card;
use crate::adapters::http::{decode_cards, default_client, post_json};
use crate::domain::model::{ProviderOutcome, RecommendationRequest, SignalScale};
use crate::domain::ports::CardProvider;

/// ScoredCards: approval rating in `[0, 1]`, salary included in the query.
#[derive(Debug, Clone)]
pub struct ScoredCardsProvider {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
struct ScoredCardsRequest<'a> {
    name: &'a str,
    score: u16,
    salary: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoredCard {
    card: String,
    #[serde(with = "rust_decimal::serde::float")]
    apr: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    approval_rating: Decimal,
}

impl ScoredCardsProvider {
    pub const ID: &'static str = "ScoredCards";
    pub const SCALE: SignalScale = SignalScale::ZeroToOne;

    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(default_client(), endpoint)
    }

    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl CardProvider for ScoredCardsProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn fetch(&self, request: &RecommendationRequest, deadline: Duration) -> ProviderOutcome {
        let body = ScoredCardsRequest {
            name: request.name(),
            score: request.credit_score(),
            salary: request.annual_salary(),
        };

        let payload = post_json(&self.client, &self.endpoint, &body, deadline).await?;

        decode_cards::<ScoredCard>(payload)?
            .into_iter()
            .map(|card| checked_card(Self::ID, card.card, card.apr, card.approval_rating, Self::SCALE))
            .collect()
    }
}
