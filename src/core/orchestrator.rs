use std::time::Duration;

use crate::core::aggregator::ProviderAggregator;
use crate::core::cancel::CancelSignal;
use crate::core::normalizer::normalize;
use crate::domain::model::{CardRecommendation, Fingerprint, Recommendations, RecommendationRequest};
use crate::domain::ports::CacheGateway;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub provider_deadline: Duration,
    pub cache_ttl: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            provider_deadline: Duration::from_secs(3),
            cache_ttl: Duration::from_secs(300),
        }
    }
}

/// Cache-aside recommendation engine.
///
/// Per call: cache lookup, then on miss or fault a provider fan-out, normalisation, and a
/// best-effort cache write. Cache and provider faults are absorbed and recorded as warnings;
/// only cancellation or an internal fault becomes an `Err`.
pub struct RecommendationEngine<C: CacheGateway> {
    cache: C,
    aggregator: ProviderAggregator,
    settings: EngineSettings,
}

impl<C: CacheGateway> RecommendationEngine<C> {
    pub fn new(cache: C, aggregator: ProviderAggregator, settings: EngineSettings) -> Self {
        Self {
            cache,
            aggregator,
            settings,
        }
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    pub fn aggregator(&self) -> &ProviderAggregator {
        &self.aggregator
    }

    pub async fn get_recommendations(&self, request: &RecommendationRequest) -> Result<Recommendations> {
        self.get_recommendations_with_cancel(request, CancelSignal::never())
            .await
    }

    pub async fn get_recommendations_with_cancel(
        &self,
        request: &RecommendationRequest,
        cancel: CancelSignal,
    ) -> Result<Recommendations> {
        let key = request.fingerprint();
        let mut warnings = Vec::new();

        if let Some(cards) = self.lookup(&key, &mut warnings).await {
            tracing::debug!(key = %key, cards = cards.len(), "serving recommendations from cache");
            return Ok(Recommendations::cached(cards, warnings));
        }

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let fan_out = self
            .aggregator
            .fetch_all(request, self.settings.provider_deadline, &cancel)
            .await;

        if cancel.is_cancelled() {
            tracing::info!(key = %key, "request cancelled during provider fan-out");
            return Err(AppError::Cancelled);
        }

        for (provider, error) in fan_out.failures() {
            tracing::warn!(provider, kind = %error.kind(), error = %error, "provider failed");
            warnings.push(format!("provider {provider} failed: {error}"));
        }

        if fan_out.cards.is_empty() {
            if fan_out.all_failed() {
                tracing::warn!(key = %key, "all providers failed; returning empty result");
            } else {
                tracing::info!(key = %key, "no recommendations available");
            }
            return Ok(Recommendations {
                cards: Vec::new(),
                from_cache: false,
                providers: fan_out.reports,
                warnings,
            });
        }

        let cards = normalize(fan_out.cards);
        self.store(&key, &cards, &mut warnings).await;

        tracing::debug!(key = %key, cards = cards.len(), "fetched recommendations from providers");
        Ok(Recommendations {
            cards,
            from_cache: false,
            providers: fan_out.reports,
            warnings,
        })
    }

    /// A non-empty cached list, or `None` on miss, empty entry, or any read fault.
    async fn lookup(&self, key: &Fingerprint, warnings: &mut Vec<String>) -> Option<Vec<CardRecommendation>> {
        match self.cache.read(key).await {
            Ok(Some(cards)) if !cards.is_empty() => Some(cards),
            Ok(_) => None,
            Err(error) if error.is_connectivity() => {
                tracing::warn!(error = %error, "cache unavailable, falling back to providers");
                warnings.push(format!("cache unavailable, falling back to providers: {error}"));
                None
            }
            Err(error) => {
                tracing::error!(error = %error, "unexpected error accessing cache, falling back to providers");
                warnings.push(format!("unexpected error accessing cache: {error}"));
                None
            }
        }
    }

    async fn store(&self, key: &Fingerprint, cards: &[CardRecommendation], warnings: &mut Vec<String>) {
        if let Err(error) = self.cache.write(key, cards, self.settings.cache_ttl).await {
            tracing::warn!(error = %error, "failed to store results in cache");
            warnings.push(format!("failed to store results in cache: {error}"));
        }
    }
}
