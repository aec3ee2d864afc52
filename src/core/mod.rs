pub mod aggregator;
pub mod cancel;
pub mod normalizer;
pub mod orchestrator;

pub use crate::domain::model::{CardRecommendation, RawProviderCard, Recommendations, RecommendationRequest};
pub use crate::domain::ports::{CacheGateway, CardProvider};
pub use crate::utils::error::Result;
