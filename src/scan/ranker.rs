//! Opportunity ranking.
//!
//! Joins the per-scanner signals by symbol and computes a composite
//! score. Price deviation is the mandatory gating signal: a symbol
//! absent from the deviation results is never an opportunity, no
//! matter how strongly the other scans fired. Every other signal is an
//! additive bonus with its own cap.

use std::collections::HashMap;

use crate::types::{
    AtrSignal, Catalyst, DeviationSignal, Direction, Opportunity, StrengthSignal, VolumeSignal,
};

// Scoring table. Contributions are independently capped; the
// directional bonus biases the list toward longs.
const DEVIATION_WEIGHT: f64 = 5.0;
const DEVIATION_CAP: f64 = 50.0;
const UPSIDE_BONUS: f64 = 10.0;
const VOLUME_WEIGHT: f64 = 5.0;
const VOLUME_CAP: f64 = 20.0;
const ATR_WEIGHT: f64 = 5.0;
const ATR_CAP: f64 = 15.0;
const CATALYST_BONUS: f64 = 25.0;
const STRENGTH_DIVISOR: f64 = 5.0;

/// Join scan outputs into a scored, descending-sorted opportunity list.
pub fn rank_opportunities(
    deviations: &[DeviationSignal],
    volumes: &[VolumeSignal],
    atrs: &[AtrSignal],
    catalysts: &[Catalyst],
    strengths: &[StrengthSignal],
) -> Vec<Opportunity> {
    let volume_by_symbol: HashMap<&str, &VolumeSignal> =
        volumes.iter().map(|v| (v.symbol.as_str(), v)).collect();
    let atr_by_symbol: HashMap<&str, &AtrSignal> =
        atrs.iter().map(|a| (a.symbol.as_str(), a)).collect();
    let catalyst_by_symbol: HashMap<&str, &Catalyst> =
        catalysts.iter().map(|c| (c.symbol.as_str(), c)).collect();
    let strength_by_symbol: HashMap<&str, &StrengthSignal> =
        strengths.iter().map(|s| (s.symbol.as_str(), s)).collect();

    let mut opportunities: Vec<Opportunity> = deviations
        .iter()
        .map(|deviation| {
            let symbol = deviation.symbol.as_str();

            let mut score = (deviation.deviation_pct.abs() * DEVIATION_WEIGHT).min(DEVIATION_CAP);
            if deviation.direction == Direction::Up {
                score += UPSIDE_BONUS;
            }

            let relative_volume = volume_by_symbol.get(symbol).map(|v| v.relative_volume);
            if let Some(rel_volume) = relative_volume {
                score += (rel_volume * VOLUME_WEIGHT).min(VOLUME_CAP);
            }

            let atr_signal = atr_by_symbol.get(symbol);
            if let Some(atr) = atr_signal {
                score += (atr.atr_ratio * ATR_WEIGHT).min(ATR_CAP);
            }

            let catalyst = catalyst_by_symbol.get(symbol).map(|c| (*c).clone());
            if catalyst.is_some() {
                score += CATALYST_BONUS;
            }

            let strength_percentile = strength_by_symbol.get(symbol).map(|s| s.percentile);
            if let Some(percentile) = strength_percentile {
                score += percentile / STRENGTH_DIVISOR;
            }

            Opportunity {
                symbol: deviation.symbol.clone(),
                score,
                price: deviation.current_price,
                deviation_pct: deviation.deviation_pct,
                direction: deviation.direction,
                relative_volume,
                atr_percentage: atr_signal.map(|a| a.atr_percentage),
                strength_percentile,
                catalyst,
            }
        })
        .collect();

    opportunities.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    opportunities
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Headline;
    use chrono::Utc;

    fn deviation(symbol: &str, deviation_pct: f64, price: f64) -> DeviationSignal {
        DeviationSignal {
            symbol: symbol.to_string(),
            current_price: price,
            prev_close: price / (1.0 + deviation_pct / 100.0),
            deviation_pct,
            direction: if deviation_pct > 0.0 { Direction::Up } else { Direction::Down },
            last_update: Utc::now(),
        }
    }

    fn volume(symbol: &str, relative_volume: f64) -> VolumeSignal {
        VolumeSignal {
            symbol: symbol.to_string(),
            relative_volume,
            current_volume: relative_volume * 1_000_000.0,
            avg_volume: 1_000_000.0,
        }
    }

    fn atr(symbol: &str, atr_ratio: f64) -> AtrSignal {
        AtrSignal {
            symbol: symbol.to_string(),
            atr: 2.0,
            atr_percentage: atr_ratio * 2.0,
            price: 100.0,
            atr_ratio,
        }
    }

    fn strength(symbol: &str, percentile: f64) -> StrengthSignal {
        StrengthSignal {
            symbol: symbol.to_string(),
            performance_pct: percentile / 2.0,
            rank: 1,
            percentile,
        }
    }

    fn catalyst(symbol: &str) -> Catalyst {
        Catalyst {
            symbol: symbol.to_string(),
            catalyst_types: vec!["earnings".to_string()],
            headline: Headline {
                title: "Earnings beat".to_string(),
                publisher: "Newswire".to_string(),
                link: String::new(),
                published: Utc::now(),
            },
        }
    }

    #[test]
    fn test_deviation_gate_is_mandatory() {
        // Strong volume/ATR/catalyst/strength, but no deviation hit:
        // the symbol must not appear.
        let opportunities = rank_opportunities(
            &[deviation("IN", 5.0, 105.0)],
            &[volume("OUT", 10.0), volume("IN", 2.0)],
            &[atr("OUT", 3.0)],
            &[catalyst("OUT")],
            &[strength("OUT", 100.0)],
        );
        assert_eq!(opportunities.len(), 1);
        assert_eq!(opportunities[0].symbol, "IN");
    }

    #[test]
    fn test_deviation_only_score() {
        // 5% up: min(5*5, 50) + 10 directional bonus = 35.
        let opportunities = rank_opportunities(&[deviation("A", 5.0, 105.0)], &[], &[], &[], &[]);
        assert!((opportunities[0].score - 35.0).abs() < 1e-10);
        assert!(opportunities[0].relative_volume.is_none());
        assert!(opportunities[0].atr_percentage.is_none());
        assert!(opportunities[0].strength_percentile.is_none());
        assert!(!opportunities[0].has_catalyst());
    }

    #[test]
    fn test_down_move_gets_no_directional_bonus() {
        // -5%: min(5*5, 50) = 25, no bonus.
        let opportunities = rank_opportunities(&[deviation("A", -5.0, 95.0)], &[], &[], &[], &[]);
        assert!((opportunities[0].score - 25.0).abs() < 1e-10);
        assert_eq!(opportunities[0].direction, Direction::Down);
    }

    #[test]
    fn test_deviation_contribution_caps_at_fifty() {
        // 30% move would be 150 uncapped; capped at 50, plus 10 for up.
        let opportunities = rank_opportunities(&[deviation("A", 30.0, 130.0)], &[], &[], &[], &[]);
        assert!((opportunities[0].score - 60.0).abs() < 1e-10);
    }

    #[test]
    fn test_bonus_contributions_and_caps() {
        // deviation: 4% up → 20 + 10 = 30
        // volume: rel 10 → min(50, 20) = 20
        // atr: ratio 5 → min(25, 15) = 15
        // catalyst: 25
        // strength: percentile 100 → 20
        // total = 110
        let opportunities = rank_opportunities(
            &[deviation("A", 4.0, 104.0)],
            &[volume("A", 10.0)],
            &[atr("A", 5.0)],
            &[catalyst("A")],
            &[strength("A", 100.0)],
        );
        assert!((opportunities[0].score - 110.0).abs() < 1e-10);
        assert_eq!(opportunities[0].relative_volume, Some(10.0));
        assert_eq!(opportunities[0].strength_percentile, Some(100.0));
        assert!(opportunities[0].has_catalyst());
    }

    #[test]
    fn test_sorted_by_score_descending() {
        let opportunities = rank_opportunities(
            &[
                deviation("SMALL", 4.0, 104.0),
                deviation("BIG", 9.0, 109.0),
                deviation("MID", 6.0, 106.0),
            ],
            &[],
            &[],
            &[],
            &[],
        );
        assert_eq!(opportunities[0].symbol, "BIG");
        assert_eq!(opportunities[1].symbol, "MID");
        assert_eq!(opportunities[2].symbol, "SMALL");
    }

    #[test]
    fn test_empty_deviation_results_yield_empty() {
        let opportunities =
            rank_opportunities(&[], &[volume("A", 5.0)], &[], &[catalyst("A")], &[]);
        assert!(opportunities.is_empty());
    }
}
