use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::adapters::checked_card;
use crate::adapters::http::{decode_cards, default_client, post_json};
use crate::domain::model::{ProviderOutcome, RecommendationRequest, SignalScale};
use crate::domain::ports::CardProvider;

/// CSCards: eligibility out of ten, income not part of the query.
#[derive(Debug, Clone)]
pub struct CsCardsProvider {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CsCardsRequest<'a> {
    name: &'a str,
    credit_score: u16,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsCard {
    card_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    apr: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    eligibility: Decimal,
}

impl CsCardsProvider {
    pub const ID: &'static str = "CSCards";
    pub const SCALE: SignalScale = SignalScale::ZeroToTen;

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
impl CardProvider for CsCardsProvider {
    fn id(&self) -> &str {
        Self::ID
    }

    async fn fetch(&self, request: &RecommendationRequest, deadline: Duration) -> ProviderOutcome {
        let body = CsCardsRequest {
            name: request.name(),
            credit_score: request.credit_score(),
        };

        let payload = post_json(&self.client, &self.endpoint, &body, deadline).await?;

        decode_cards::<CsCard>(payload)?
            .into_iter()
            .map(|card| checked_card(Self::ID, card.card_name, card.apr, card.eligibility, Self::SCALE))
            .collect()
    }
}
