pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{CsCardsProvider, MemoryCache, ScoredCardsProvider};
pub use app::{build_engine, Engine};
pub use config::AppConfig;
pub use core::aggregator::{FanOut, ProviderAggregator};
pub use core::cancel::{CancelHandle, CancelSignal};
pub use core::orchestrator::{EngineSettings, RecommendationEngine};
pub use domain::model::{
    CardRecommendation, Fingerprint, ProviderReport, ProviderStatus, RawProviderCard,
    Recommendations, RecommendationRequest, SignalScale,
};
pub use domain::ports::{CacheError, CacheGateway, CardProvider, FailureKind, ProviderError};
pub use utils::error::{AppError, Result};
