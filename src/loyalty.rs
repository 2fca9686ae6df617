use serde::Serialize;

use crate::models::LoyaltyTier;

/// One point per 100 units spent.
pub const SPEND_PER_POINT: i64 = 100;

const SILVER_FROM: i64 = 20_000;
const GOLD_FROM: i64 = 50_000;
const PLATINUM_FROM: i64 = 100_000;

impl LoyaltyTier {
    pub fn for_total_spent(total_spent: i64) -> Self {
        if total_spent >= PLATINUM_FROM {
            LoyaltyTier::Platinum
        } else if total_spent >= GOLD_FROM {
            LoyaltyTier::Gold
        } else if total_spent >= SILVER_FROM {
            LoyaltyTier::Silver
        } else {
            LoyaltyTier::Bronze
        }
    }

    /// Points target shown for the tier; platinum has none.
    pub fn next_tier_points(self) -> i64 {
        match self {
            LoyaltyTier::Bronze => 200,
            LoyaltyTier::Silver => 500,
            LoyaltyTier::Gold => 1_000,
            LoyaltyTier::Platinum => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoyaltyTier::Bronze => "bronze",
            LoyaltyTier::Silver => "silver",
            LoyaltyTier::Gold => "gold",
            LoyaltyTier::Platinum => "platinum",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoyaltyProgram {
    pub current_points: i64,
    pub total_earned: i64,
    pub total_redeemed: i64,
    pub tier: LoyaltyTier,
    pub next_tier_points: i64,
    pub points_to_next_tier: i64,
}

impl LoyaltyProgram {
    pub fn from_total_spent(total_spent: i64) -> Self {
        let current_points = points_for(total_spent);
        let tier = LoyaltyTier::for_total_spent(total_spent);
        let next_tier_points = tier.next_tier_points();
        Self {
            current_points,
            total_earned: current_points,
            total_redeemed: 0,
            tier,
            next_tier_points,
            points_to_next_tier: (next_tier_points - current_points).max(0),
        }
    }
}

pub fn points_for(total_spent: i64) -> i64 {
    total_spent.max(0).div_euclid(SPEND_PER_POINT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gold_customer() {
        let program = LoyaltyProgram::from_total_spent(75_000);
        assert_eq!(program.tier, LoyaltyTier::Gold);
        assert_eq!(program.current_points, 750);
        assert_eq!(program.next_tier_points, 1_000);
        assert_eq!(program.points_to_next_tier, 250);
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(LoyaltyTier::for_total_spent(0), LoyaltyTier::Bronze);
        assert_eq!(LoyaltyTier::for_total_spent(19_999), LoyaltyTier::Bronze);
        assert_eq!(LoyaltyTier::for_total_spent(20_000), LoyaltyTier::Silver);
        assert_eq!(LoyaltyTier::for_total_spent(49_999), LoyaltyTier::Silver);
        assert_eq!(LoyaltyTier::for_total_spent(50_000), LoyaltyTier::Gold);
        assert_eq!(LoyaltyTier::for_total_spent(100_000), LoyaltyTier::Platinum);
    }

    #[test]
    fn platinum_has_nothing_left_to_earn() {
        let program = LoyaltyProgram::from_total_spent(250_000);
        assert_eq!(program.current_points, 2_500);
        assert_eq!(program.next_tier_points, 0);
        assert_eq!(program.points_to_next_tier, 0);
    }

    #[test]
    fn points_floor_partial_hundreds() {
        assert_eq!(points_for(199), 1);
        assert_eq!(points_for(54_086), 540);
        assert_eq!(points_for(-10), 0);
    }
}
