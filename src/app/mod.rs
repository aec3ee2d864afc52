//! Wiring from configuration to a ready engine.

#[cfg(feature = "server")]
pub mod server;

use std::sync::Arc;

use crate::adapters::{CsCardsProvider, MemoryCache, ScoredCardsProvider};
use crate::config::AppConfig;
use crate::core::aggregator::ProviderAggregator;
use crate::core::orchestrator::RecommendationEngine;
use crate::domain::ports::CardProvider;

pub type Engine = RecommendationEngine<MemoryCache>;

/// Enabled providers in configuration order. The order fixes the order of per-provider reports.
pub fn build_providers(config: &AppConfig) -> Vec<Arc<dyn CardProvider>> {
    let mut providers: Vec<Arc<dyn CardProvider>> = Vec::new();

    if config.providers.cscards.enabled {
        providers.push(Arc::new(CsCardsProvider::new(
            config.providers.cscards.endpoint.clone(),
        )));
    }
    if config.providers.scoredcards.enabled {
        providers.push(Arc::new(ScoredCardsProvider::new(
            config.providers.scoredcards.endpoint.clone(),
        )));
    }

    if providers.is_empty() {
        tracing::warn!("no card providers enabled; every fresh request will return no cards");
    }
    providers
}

pub fn build_cache(config: &AppConfig) -> MemoryCache {
    if !config.cache.enabled {
        return MemoryCache::disabled();
    }
    match config.cache.max_entries {
        Some(max_entries) => MemoryCache::with_max_entries(max_entries),
        None => MemoryCache::new(),
    }
}

pub fn build_engine(config: &AppConfig) -> Engine {
    let providers = build_providers(config);
    tracing::info!(
        providers = providers.len(),
        cache_enabled = config.cache.enabled,
        timeout_ms = config.providers.timeout_ms,
        "recommendation engine configured"
    );
    RecommendationEngine::new(
        build_cache(config),
        ProviderAggregator::new(providers),
        config.engine_settings(),
    )
}
