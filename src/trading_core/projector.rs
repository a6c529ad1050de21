//! Fibonacci level ladder around a reference close

use std::collections::BTreeMap;

/// Ratios of ATR projected above and below the reference close
pub const FIB_RATIOS: [f64; 7] = [1.0, 0.786, 0.618, 0.5, 0.382, 0.236, 0.0];

/// A single projected price level
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedLevel {
    /// e.g. "Level_+0.618", "Level_-1.0", "Level_0"
    pub label: String,
    /// Signed ratio of volatility applied to the reference close
    pub ratio: f64,
    pub price: f64,
}

/// Symmetric ladder of levels: close +/- volatility * ratio
#[derive(Debug, Clone, PartialEq)]
pub struct LevelLadder {
    pub reference_close: f64,
    pub volatility: f64,
    levels: Vec<ProjectedLevel>,
}

impl LevelLadder {
    pub fn project(reference_close: f64, volatility: f64) -> Self {
        let mut levels = Vec::with_capacity(FIB_RATIOS.len() * 2 - 1);

        for ratio in FIB_RATIOS {
            if ratio == 0.0 {
                levels.push(ProjectedLevel {
                    label: "Level_0".to_string(),
                    ratio: 0.0,
                    price: reference_close,
                });
            } else {
                levels.push(ProjectedLevel {
                    label: format!("Level_+{:?}", ratio),
                    ratio,
                    price: reference_close + volatility * ratio,
                });
                levels.push(ProjectedLevel {
                    label: format!("Level_-{:?}", ratio),
                    ratio: -ratio,
                    price: reference_close - volatility * ratio,
                });
            }
        }

        Self {
            reference_close,
            volatility,
            levels,
        }
    }

    /// Levels in projection order
    pub fn levels(&self) -> &[ProjectedLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Levels sorted by price, highest first
    pub fn descending(&self) -> Vec<&ProjectedLevel> {
        let mut sorted: Vec<_> = self.levels.iter().collect();
        sorted.sort_by(|a, b| b.price.total_cmp(&a.price));
        sorted
    }

    pub fn price(&self, label: &str) -> Option<f64> {
        self.levels.iter().find(|l| l.label == label).map(|l| l.price)
    }

    /// Label -> price mapping for persistence
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.levels
            .iter()
            .map(|l| (l.label.clone(), l.price))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_fixture() {
        let ladder = LevelLadder::project(100.0, 10.0);

        assert_eq!(ladder.len(), 13);
        assert_eq!(ladder.price("Level_0"), Some(100.0));
        assert_eq!(ladder.price("Level_+1.0"), Some(110.0));
        assert_eq!(ladder.price("Level_-1.0"), Some(90.0));
        assert_eq!(ladder.price("Level_+0.5"), Some(105.0));
        assert_eq!(ladder.price("Level_-0.5"), Some(95.0));

        let sorted = ladder.descending();
        assert_eq!(sorted[0].price, 110.0);
        assert_eq!(sorted[6].label, "Level_0");
        assert_eq!(sorted[12].price, 90.0);
        assert!(sorted.windows(2).all(|w| w[0].price >= w[1].price));
    }

    #[test]
    fn test_labels() {
        let ladder = LevelLadder::project(500.0, 4.0);
        let map = ladder.to_map();

        assert_eq!(map.len(), 13);
        for label in [
            "Level_+0.786",
            "Level_-0.786",
            "Level_+0.618",
            "Level_-0.618",
            "Level_+0.382",
            "Level_-0.382",
            "Level_+0.236",
            "Level_-0.236",
        ] {
            assert!(map.contains_key(label), "missing {}", label);
        }
        assert!((map["Level_+0.618"] - (500.0 + 4.0 * 0.618)).abs() < 1e-9);
    }

    #[test]
    fn test_zero_volatility_collapses_to_close() {
        let ladder = LevelLadder::project(250.0, 0.0);
        assert_eq!(ladder.len(), 13);
        assert!(ladder.levels().iter().all(|l| l.price == 250.0));
    }

    #[test]
    fn test_sort_is_by_price_not_label() {
        // Negative volatility is not rejected; the sort still follows price
        let ladder = LevelLadder::project(100.0, -10.0);
        let sorted = ladder.descending();
        assert_eq!(sorted[0].label, "Level_-1.0");
        assert_eq!(sorted[0].price, 110.0);
    }
}
