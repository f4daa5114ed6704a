//! Reward purchase rules.

use crate::types::{Reward, UserProgress};
use serde::Serialize;

/// What a purchase attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PurchaseOutcome {
    Purchased { cost: u32, remaining: u32 },
    InsufficientPoints { needed: u32, available: u32 },
    AlreadyOwned,
}

/// Buy `reward` if the balance covers it.
pub fn purchase_reward(progress: &UserProgress, reward: &Reward) -> UserProgress {
    purchase_reward_with_outcome(progress, reward).0
}

/// Buy `reward` if the balance covers it, reporting what happened.
///
/// An unaffordable or already owned reward leaves the progress untouched;
/// the balance can never go negative.
pub fn purchase_reward_with_outcome(
    progress: &UserProgress,
    reward: &Reward,
) -> (UserProgress, PurchaseOutcome) {
    if progress.owns(&reward.id) {
        return (progress.clone(), PurchaseOutcome::AlreadyOwned);
    }

    let Some(remaining) = progress.points.checked_sub(reward.cost) else {
        return (
            progress.clone(),
            PurchaseOutcome::InsufficientPoints {
                needed: reward.cost,
                available: progress.points,
            },
        );
    };

    let mut next = progress.clone();
    next.points = remaining;
    next.unlocked_rewards.insert(reward.id.clone());
    (
        next,
        PurchaseOutcome::Purchased {
            cost: reward.cost,
            remaining,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RewardKind;

    fn reward(id: &str, cost: u32) -> Reward {
        Reward {
            id: id.into(),
            title: "A drawing of you".into(),
            kind: RewardKind::Text,
            content: "A drawing of you made by me.".into(),
            cost,
        }
    }

    fn with_points(points: u32) -> UserProgress {
        let mut p = UserProgress::new("sam");
        p.points = points;
        p
    }

    #[test]
    fn purchase_deducts_and_unlocks() {
        let (next, outcome) = purchase_reward_with_outcome(&with_points(120), &reward("r1", 50));
        assert_eq!(outcome, PurchaseOutcome::Purchased { cost: 50, remaining: 70 });
        assert_eq!(next.points, 70);
        assert!(next.owns("r1"));
    }

    #[test]
    fn exact_balance_is_enough() {
        let next = purchase_reward(&with_points(50), &reward("r1", 50));
        assert_eq!(next.points, 0);
        assert!(next.owns("r1"));
    }

    #[test]
    fn insufficient_points_leaves_state_unchanged() {
        for (points, cost) in [(0, 1), (49, 50), (499, 500)] {
            let start = with_points(points);
            let (next, outcome) = purchase_reward_with_outcome(&start, &reward("r2", cost));
            assert_eq!(next, start);
            assert_eq!(
                outcome,
                PurchaseOutcome::InsufficientPoints { needed: cost, available: points }
            );
        }
    }

    #[test]
    fn owned_reward_is_not_bought_twice() {
        let first = purchase_reward(&with_points(200), &reward("r5", 150));
        let mut topped_up = first.clone();
        topped_up.points = 500;
        let (second, outcome) = purchase_reward_with_outcome(&topped_up, &reward("r5", 150));
        assert_eq!(outcome, PurchaseOutcome::AlreadyOwned);
        assert_eq!(second.points, 500);
    }

    #[test]
    fn free_reward_unlocks_with_zero_balance() {
        let next = purchase_reward(&with_points(0), &reward("r0", 0));
        assert!(next.owns("r0"));
        assert_eq!(next.points, 0);
    }
}
