//! Score normalisation: every provider signal onto the unified `[0, 10]` card score.

use rust_decimal::Decimal;

use crate::domain::model::{CardRecommendation, RawProviderCard, SignalScale, CARD_SCORE_MAX};

/// Rescale `raw` linearly from `scale` onto `[0, CARD_SCORE_MAX]`, clamping out-of-range input
/// to the nearest bound.
pub fn card_score(raw: Decimal, scale: SignalScale) -> Decimal {
    let factor = CARD_SCORE_MAX / scale.upper_bound();
    let rescaled = match raw.checked_mul(factor) {
        Some(rescaled) => rescaled,
        None if raw.is_sign_positive() => CARD_SCORE_MAX,
        None => Decimal::ZERO,
    };
    rescaled.clamp(Decimal::ZERO, CARD_SCORE_MAX)
}

/// Convert raw provider cards to recommendations. Order, provider, name and APR are preserved;
/// no ranking or truncation happens here.
pub fn normalize(cards: Vec<RawProviderCard>) -> Vec<CardRecommendation> {
    cards
        .into_iter()
        .map(|card| CardRecommendation {
            score: card_score(card.raw_signal, card.raw_signal_scale),
            provider: card.provider,
            name: card.card_name,
            apr: card.apr,
        })
        .collect()
}
