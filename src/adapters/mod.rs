// Adapters layer: concrete implementations of the domain ports (providers, cache, http).

pub mod cscards;
pub mod http;
pub mod memory_cache;
pub mod scoredcards;

pub use cscards::CsCardsProvider;
pub use memory_cache::MemoryCache;
pub use scoredcards::ScoredCardsProvider;

use rust_decimal::Decimal;

use crate::domain::model::{RawProviderCard, SignalScale};
use crate::domain::ports::ProviderError;

/// Shape-check one advertised card before it leaves the adapter.
pub(crate) fn checked_card(
    provider: &str,
    name: String,
    apr: Decimal,
    signal: Decimal,
    scale: SignalScale,
) -> Result<RawProviderCard, ProviderError> {
    if name.trim().is_empty() {
        return Err(ProviderError::InvalidResponse(format!(
            "{provider} returned a card without a name"
        )));
    }
    if apr < Decimal::ZERO {
        return Err(ProviderError::InvalidResponse(format!(
            "{provider} card '{name}' has negative apr {apr}"
        )));
    }
    if !scale.contains(signal) {
        return Err(ProviderError::InvalidResponse(format!(
            "{provider} card '{name}' has signal {signal} outside 0..={}",
            scale.upper_bound()
        )));
    }

    Ok(RawProviderCard {
        provider: provider.to_string(),
        card_name: name,
        apr,
        raw_signal: signal,
        raw_signal_scale: scale,
    })
}
