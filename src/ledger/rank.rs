//! Rank Derivation
//!
//! A rank label is the greatest configured threshold that does not exceed
//! the point total. The table comes from configuration and is immutable for
//! the lifetime of the engine.

use crate::config::RanksConfig;

/// Ordered points -> label table
#[derive(Debug, Clone)]
pub struct RankTable {
    tiers: Vec<(i64, String)>,
}

impl RankTable {
    /// Build from configuration. Thresholds are validated as strictly
    /// increasing at config load, so the table can be trusted here.
    pub fn from_config(config: &RanksConfig) -> Self {
        Self {
            tiers: config
                .tiers
                .iter()
                .map(|tier| (tier.threshold, tier.label.clone()))
                .collect(),
        }
    }

    /// Label of the greatest threshold <= points. Totals below the first
    /// threshold fall back to the first tier.
    pub fn label_for(&self, points: i64) -> &str {
        let mut label = &self.tiers[0].1;
        for (threshold, tier_label) in &self.tiers {
            if points >= *threshold {
                label = tier_label;
            } else {
                break;
            }
        }
        label
    }

    /// Lowest rank label (zero-balance accounts)
    pub fn base_label(&self) -> &str {
        &self.tiers[0].1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RankTier;

    fn table() -> RankTable {
        RankTable::from_config(&RanksConfig {
            tiers: vec![
                RankTier { threshold: 0, label: "Newcomer".to_string() },
                RankTier { threshold: 50, label: "Joker".to_string() },
                RankTier { threshold: 150, label: "Comedian".to_string() },
            ],
        })
    }

    #[test]
    fn test_label_for_thresholds() {
        let table = table();
        assert_eq!(table.label_for(0), "Newcomer");
        assert_eq!(table.label_for(49), "Newcomer");
        assert_eq!(table.label_for(50), "Joker");
        assert_eq!(table.label_for(149), "Joker");
        assert_eq!(table.label_for(150), "Comedian");
        assert_eq!(table.label_for(10_000), "Comedian");
    }

    #[test]
    fn test_label_is_pure() {
        let table = table();
        // Recomputation for the same total always gives the same label
        for _ in 0..3 {
            assert_eq!(table.label_for(75), "Joker");
        }
    }
}
