//! The closed signal taxonomy (spec.md §4.5). Modeled as an enum rather than
//! a raw string so a typo in a detector can never silently fail to round-trip
//! through storage and the query engine (I4 — signal closure).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalTag {
    RsiOversold,
    RsiOverbought,
    RsiDivergenceBullish,
    RsiDivergenceBearish,
    MacdBullishCross,
    MacdBearishCross,
    MacdZeroCrossUp,
    MacdZeroCrossDown,
    MacdDivergenceBullish,
    MacdDivergenceBearish,
    MaGoldenCross,
    MaDeathCross,
    MaBullishArrangement,
    MaBearishArrangement,
    PriceAboveMa50,
    PriceBelowMa50,
    BbUpperTouch,
    BbLowerTouch,
    BbMiddleCrossUp,
    BbMiddleCrossDown,
    BbSqueeze,
    BbExpansion,
    KdjOversold,
    KdjOverbought,
    KdjGoldenCross,
    KdjDeathCross,
    StochOversold,
    StochOverbought,
    StochBullishCross,
    StochBearishCross,
    CciOversold,
    CciOverbought,
    CciZeroCrossUp,
    CciZeroCrossDown,
    VolumeSpike,
    VolumeDry,
}

impl SignalTag {
    pub const ALL: &'static [SignalTag] = &[
        SignalTag::RsiOversold,
        SignalTag::RsiOverbought,
        SignalTag::RsiDivergenceBullish,
        SignalTag::RsiDivergenceBearish,
        SignalTag::MacdBullishCross,
        SignalTag::MacdBearishCross,
        SignalTag::MacdZeroCrossUp,
        SignalTag::MacdZeroCrossDown,
        SignalTag::MacdDivergenceBullish,
        SignalTag::MacdDivergenceBearish,
        SignalTag::MaGoldenCross,
        SignalTag::MaDeathCross,
        SignalTag::MaBullishArrangement,
        SignalTag::MaBearishArrangement,
        SignalTag::PriceAboveMa50,
        SignalTag::PriceBelowMa50,
        SignalTag::BbUpperTouch,
        SignalTag::BbLowerTouch,
        SignalTag::BbMiddleCrossUp,
        SignalTag::BbMiddleCrossDown,
        SignalTag::BbSqueeze,
        SignalTag::BbExpansion,
        SignalTag::KdjOversold,
        SignalTag::KdjOverbought,
        SignalTag::KdjGoldenCross,
        SignalTag::KdjDeathCross,
        SignalTag::StochOversold,
        SignalTag::StochOverbought,
        SignalTag::StochBullishCross,
        SignalTag::StochBearishCross,
        SignalTag::CciOversold,
        SignalTag::CciOverbought,
        SignalTag::CciZeroCrossUp,
        SignalTag::CciZeroCrossDown,
        SignalTag::VolumeSpike,
        SignalTag::VolumeDry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalTag::RsiOversold => "RSI_OVERSOLD",
            SignalTag::RsiOverbought => "RSI_OVERBOUGHT",
            SignalTag::RsiDivergenceBullish => "RSI_DIVERGENCE_BULLISH",
            SignalTag::RsiDivergenceBearish => "RSI_DIVERGENCE_BEARISH",
            SignalTag::MacdBullishCross => "MACD_BULLISH_CROSS",
            SignalTag::MacdBearishCross => "MACD_BEARISH_CROSS",
            SignalTag::MacdZeroCrossUp => "MACD_ZERO_CROSS_UP",
            SignalTag::MacdZeroCrossDown => "MACD_ZERO_CROSS_DOWN",
            SignalTag::MacdDivergenceBullish => "MACD_DIVERGENCE_BULLISH",
            SignalTag::MacdDivergenceBearish => "MACD_DIVERGENCE_BEARISH",
            SignalTag::MaGoldenCross => "MA_GOLDEN_CROSS",
            SignalTag::MaDeathCross => "MA_DEATH_CROSS",
            SignalTag::MaBullishArrangement => "MA_BULLISH_ARRANGEMENT",
            SignalTag::MaBearishArrangement => "MA_BEARISH_ARRANGEMENT",
            SignalTag::PriceAboveMa50 => "PRICE_ABOVE_MA50",
            SignalTag::PriceBelowMa50 => "PRICE_BELOW_MA50",
            SignalTag::BbUpperTouch => "BB_UPPER_TOUCH",
            SignalTag::BbLowerTouch => "BB_LOWER_TOUCH",
            SignalTag::BbMiddleCrossUp => "BB_MIDDLE_CROSS_UP",
            SignalTag::BbMiddleCrossDown => "BB_MIDDLE_CROSS_DOWN",
            SignalTag::BbSqueeze => "BB_SQUEEZE",
            SignalTag::BbExpansion => "BB_EXPANSION",
            SignalTag::KdjOversold => "KDJ_OVERSOLD",
            SignalTag::KdjOverbought => "KDJ_OVERBOUGHT",
            SignalTag::KdjGoldenCross => "KDJ_GOLDEN_CROSS",
            SignalTag::KdjDeathCross => "KDJ_DEATH_CROSS",
            SignalTag::StochOversold => "STOCH_OVERSOLD",
            SignalTag::StochOverbought => "STOCH_OVERBOUGHT",
            SignalTag::StochBullishCross => "STOCH_BULLISH_CROSS",
            SignalTag::StochBearishCross => "STOCH_BEARISH_CROSS",
            SignalTag::CciOversold => "CCI_OVERSOLD",
            SignalTag::CciOverbought => "CCI_OVERBOUGHT",
            SignalTag::CciZeroCrossUp => "CCI_ZERO_CROSS_UP",
            SignalTag::CciZeroCrossDown => "CCI_ZERO_CROSS_DOWN",
            SignalTag::VolumeSpike => "VOLUME_SPIKE",
            SignalTag::VolumeDry => "VOLUME_DRY",
        }
    }
}

impl fmt::Display for SignalTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SignalTag {
    type Err = crate::domain::errors::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| Self::Err::validation(format!("unknown signal tag: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tag_round_trips_through_its_display_string() {
        for tag in SignalTag::ALL {
            let parsed: SignalTag = tag.as_str().parse().unwrap();
            assert_eq!(parsed, *tag);
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!("NOT_A_REAL_SIGNAL".parse::<SignalTag>().is_err());
    }
}
