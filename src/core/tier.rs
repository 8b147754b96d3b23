use std::fmt;

/// Rating every player starts from on the site.
pub const BASE_RATING: f64 = 1300.0;

/// Offset of the top player's rating from the base, never negative.
/// Rounds half to even.
pub fn elo_offset(top_rating: f64) -> u32 {
    let offset = (top_rating - BASE_RATING).round_ties_even();
    if !offset.is_finite() || offset <= 0.0 {
        0
    } else {
        offset as u32
    }
}

/// Difficulty bucket of a game, ordered from the hardest tier down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EloTier {
    Above800,
    From700To800,
    From600To700,
    From500To600,
    Below500,
}

impl EloTier {
    pub const ALL: [EloTier; 5] = [
        EloTier::Above800,
        EloTier::From700To800,
        EloTier::From600To700,
        EloTier::From500To600,
        EloTier::Below500,
    ];

    /// Games without a known rating land in the lowest tier.
    pub fn classify(elo: Option<u32>) -> Self {
        match elo {
            Some(e) if e > 800 => EloTier::Above800,
            Some(e) if e >= 700 => EloTier::From700To800,
            Some(e) if e >= 600 => EloTier::From600To700,
            Some(e) if e >= 500 => EloTier::From500To600,
            _ => EloTier::Below500,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EloTier::Above800 => ">800",
            EloTier::From700To800 => "700-800",
            EloTier::From600To700 => "600-700",
            EloTier::From500To600 => "500-600",
            EloTier::Below500 => "<500",
        }
    }
}

impl fmt::Display for EloTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(EloTier::classify(None), EloTier::Below500);
        assert_eq!(EloTier::classify(Some(0)), EloTier::Below500);
        assert_eq!(EloTier::classify(Some(499)), EloTier::Below500);
        assert_eq!(EloTier::classify(Some(500)), EloTier::From500To600);
        assert_eq!(EloTier::classify(Some(599)), EloTier::From500To600);
        assert_eq!(EloTier::classify(Some(600)), EloTier::From600To700);
        assert_eq!(EloTier::classify(Some(700)), EloTier::From700To800);
        assert_eq!(EloTier::classify(Some(800)), EloTier::From700To800);
        assert_eq!(EloTier::classify(Some(801)), EloTier::Above800);
    }

    #[test]
    fn test_classify_is_pure() {
        for elo in [None, Some(450), Some(650), Some(900)] {
            assert_eq!(EloTier::classify(elo), EloTier::classify(elo));
        }
    }

    #[test]
    fn test_elo_offset() {
        assert_eq!(elo_offset(2100.0), 800);
        assert_eq!(elo_offset(1200.0), 0);
        assert_eq!(elo_offset(1300.0), 0);
        assert_eq!(elo_offset(1850.4), 550);
        // 0.5 進位到偶數
        assert_eq!(elo_offset(1800.5), 500);
        assert_eq!(elo_offset(1801.5), 502);
        assert_eq!(elo_offset(f64::NAN), 0);
    }

    #[test]
    fn test_tiers_are_listed_hardest_first() {
        let labels: Vec<&str> = EloTier::ALL.iter().map(EloTier::label).collect();
        assert_eq!(labels, vec![">800", "700-800", "600-700", "500-600", "<500"]);
        let mut sorted = EloTier::ALL;
        sorted.sort();
        assert_eq!(sorted, EloTier::ALL);
    }
}
