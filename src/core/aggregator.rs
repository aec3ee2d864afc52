//! Concurrent fan-out across every configured card provider.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;

use crate::core::cancel::CancelSignal;
use crate::domain::model::{
    ProviderOutcome, ProviderReport, ProviderStatus, RawProviderCard, RecommendationRequest,
};
use crate::domain::ports::{CardProvider, ProviderError};

/// Union of successful cards plus one report per provider, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct FanOut {
    pub cards: Vec<RawProviderCard>,
    pub reports: Vec<ProviderReport>,
}

impl FanOut {
    /// Every configured provider failed (false when none are configured).
    pub fn all_failed(&self) -> bool {
        !self.reports.is_empty() && self.reports.iter().all(ProviderReport::is_failure)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ProviderError)> {
        self.reports.iter().filter_map(|report| match &report.status {
            ProviderStatus::Failed(error) => Some((report.provider.as_str(), error)),
            ProviderStatus::Succeeded { .. } => None,
        })
    }
}

pub struct ProviderAggregator {
    providers: Vec<Arc<dyn CardProvider>>,
}

impl ProviderAggregator {
    pub fn new(providers: Vec<Arc<dyn CardProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_ids(&self) -> Vec<&str> {
        self.providers.iter().map(|provider| provider.id()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Call every provider concurrently and wait for each to finish, time out, or be cancelled.
    ///
    /// Wall time is bounded by the slowest provider's own deadline. Cards from one provider
    /// keep that provider's ordering. A failing provider never fails the fan-out.
    pub async fn fetch_all(
        &self,
        request: &RecommendationRequest,
        deadline: Duration,
        cancel: &CancelSignal,
    ) -> FanOut {
        let calls = self.providers.iter().map(|provider| {
            let mut cancel = cancel.clone();
            async move {
                let started = Instant::now();
                let outcome: ProviderOutcome = tokio::select! {
                    outcome = provider.fetch(request, deadline) => outcome,
                    _ = cancel.cancelled() => Err(ProviderError::Cancelled),
                };
                (provider.id().to_string(), outcome, started.elapsed())
            }
        });

        join_all(calls)
            .await
            .into_iter()
            .fold(FanOut::default(), |mut fan_out, (provider, outcome, elapsed)| {
                let status = match outcome {
                    Ok(mut cards) => {
                        let count = cards.len();
                        fan_out.cards.append(&mut cards);
                        ProviderStatus::Succeeded { cards: count }
                    }
                    Err(error) => ProviderStatus::Failed(error),
                };
                fan_out.reports.push(ProviderReport {
                    provider,
                    status,
                    elapsed_ms: elapsed.as_millis() as u64,
                });
                fan_out
            })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::model::SignalScale;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted provider for core tests.
    pub(crate) struct StubProvider {
        id: String,
        outcome: ProviderOutcome,
        delay: Duration,
        pub(crate) calls: AtomicUsize,
    }

    impl StubProvider {
        pub(crate) fn cards(id: &str, cards: Vec<(&str, Decimal, Decimal, SignalScale)>) -> Self {
            let cards = cards
                .into_iter()
                .map(|(name, apr, signal, scale)| RawProviderCard {
                    provider: id.to_string(),
                    card_name: name.to_string(),
                    apr,
                    raw_signal: signal,
                    raw_signal_scale: scale,
                })
                .collect();
            Self::with_outcome(id, Ok(cards))
        }

        pub(crate) fn failing(id: &str, error: ProviderError) -> Self {
            Self::with_outcome(id, Err(error))
        }

        pub(crate) fn with_outcome(id: &str, outcome: ProviderOutcome) -> Self {
            Self {
                id: id.to_string(),
                outcome,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl CardProvider for StubProvider {
        fn id(&self) -> &str {
            &self.id
        }

        async fn fetch(&self, _request: &RecommendationRequest, deadline: Duration) -> ProviderOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.delay > deadline {
                tokio::time::sleep(deadline).await;
                return Err(ProviderError::timeout(deadline));
            }
            tokio::time::sleep(self.delay).await;
            self.outcome.clone()
        }
    }

    fn request() -> RecommendationRequest {
        RecommendationRequest::new("Test", 700, 30000).unwrap()
    }

    #[tokio::test]
    async fn test_union_of_successful_providers() {
        let aggregator = ProviderAggregator::new(vec![
            Arc::new(StubProvider::cards(
                "CSCards",
                vec![
                    ("SuperSaver", dec!(15.0), dec!(8.0), SignalScale::ZeroToTen),
                    ("SuperSpender", dec!(19.2), dec!(5.0), SignalScale::ZeroToTen),
                ],
            )),
            Arc::new(StubProvider::cards(
                "ScoredCards",
                vec![("PremiumRewards", dec!(21.9), dec!(0.75), SignalScale::ZeroToOne)],
            )),
        ]);

        let fan_out = aggregator
            .fetch_all(&request(), Duration::from_secs(1), &CancelSignal::never())
            .await;

        assert_eq!(fan_out.cards.len(), 3);
        assert!(!fan_out.all_failed());
        assert_eq!(fan_out.failures().count(), 0);

        let cs_names: Vec<_> = fan_out
            .cards
            .iter()
            .filter(|card| card.provider == "CSCards")
            .map(|card| card.card_name.as_str())
            .collect();
        assert_eq!(cs_names, vec!["SuperSaver", "SuperSpender"]);
        assert_eq!(fan_out.reports[0].status, ProviderStatus::Succeeded { cards: 2 });
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_survivors() {
        let aggregator = ProviderAggregator::new(vec![
            Arc::new(StubProvider::failing(
                "CSCards",
                ProviderError::Transport("connection refused".to_string()),
            )),
            Arc::new(StubProvider::cards(
                "ScoredCards",
                vec![("PremiumRewards", dec!(21.9), dec!(0.75), SignalScale::ZeroToOne)],
            )),
        ]);

        let fan_out = aggregator
            .fetch_all(&request(), Duration::from_secs(1), &CancelSignal::never())
            .await;

        assert_eq!(fan_out.cards.len(), 1);
        assert_eq!(fan_out.cards[0].provider, "ScoredCards");
        assert!(!fan_out.all_failed());

        let failures: Vec<_> = fan_out.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "CSCards");
    }

    #[tokio::test]
    async fn test_all_failed_is_reported() {
        let aggregator = ProviderAggregator::new(vec![
            Arc::new(StubProvider::failing(
                "CSCards",
                ProviderError::InvalidResponse("missing field".to_string()),
            )),
            Arc::new(
                StubProvider::cards("ScoredCards", vec![]).delayed(Duration::from_secs(5)),
            ),
        ]);

        let fan_out = aggregator
            .fetch_all(&request(), Duration::from_millis(50), &CancelSignal::never())
            .await;

        assert!(fan_out.cards.is_empty());
        assert!(fan_out.all_failed());
        assert_eq!(fan_out.reports.len(), 2);
        match &fan_out.reports[1].status {
            ProviderStatus::Failed(error) => assert!(matches!(error, ProviderError::Timeout { .. })),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_runs_providers_in_parallel() {
        let slow = Duration::from_millis(200);
        let aggregator = ProviderAggregator::new(vec![
            Arc::new(StubProvider::cards("A", vec![("a", dec!(1.0), dec!(1.0), SignalScale::ZeroToTen)]).delayed(slow)),
            Arc::new(StubProvider::cards("B", vec![("b", dec!(1.0), dec!(0.1), SignalScale::ZeroToOne)]).delayed(slow)),
            Arc::new(StubProvider::cards("C", vec![("c", dec!(1.0), dec!(2.0), SignalScale::ZeroToTen)]).delayed(slow)),
        ]);

        let started = Instant::now();
        let fan_out = aggregator
            .fetch_all(&request(), Duration::from_secs(2), &CancelSignal::never())
            .await;

        assert_eq!(fan_out.cards.len(), 3);
        assert!(started.elapsed() < Duration::from_millis(550));
    }

    #[tokio::test]
    async fn test_no_providers_is_not_a_failure() {
        let aggregator = ProviderAggregator::new(Vec::new());
        let fan_out = aggregator
            .fetch_all(&request(), Duration::from_secs(1), &CancelSignal::never())
            .await;

        assert!(aggregator.is_empty());
        assert!(fan_out.cards.is_empty());
        assert!(!fan_out.all_failed());
    }

    #[tokio::test]
    async fn test_cancellation_stops_in_flight_calls() {
        let aggregator = ProviderAggregator::new(vec![Arc::new(
            StubProvider::cards("Slow", vec![("s", dec!(1.0), dec!(1.0), SignalScale::ZeroToTen)])
                .delayed(Duration::from_secs(5)),
        )]);
        let (handle, signal) = CancelSignal::pair();
        let request = request();

        let started = Instant::now();
        let cancel_soon = async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            handle.cancel();
        };
        let (fan_out, ()) = tokio::join!(
            aggregator.fetch_all(&request, Duration::from_secs(10), &signal),
            cancel_soon
        );

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(
            fan_out.reports[0].status,
            ProviderStatus::Failed(ProviderError::Cancelled)
        );
    }
}
