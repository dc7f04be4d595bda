//! Purchase price of the next level.
//!
//! `cost = floor(base_cost * cost_multiplier ^ level)` where `level` is the
//! effective level before the purchase.

use crate::catalog::SkillDefinition;

/// Absorbs representation error so exact products like `50 * 1.8^1 = 90`
/// never floor to one less.
const COST_EPSILON: f64 = 1e-9;

/// Price of the level after `level`.
pub fn level_cost(base_cost: f64, cost_multiplier: f64, level: u32) -> u64 {
    let raw = base_cost * cost_multiplier.powi(level as i32);
    if !raw.is_finite() || raw <= 0.0 {
        // Overflowing growth is unaffordable rather than free
        return if raw > 0.0 { u64::MAX } else { 0 };
    }
    (raw + COST_EPSILON).floor() as u64
}

/// Price of the next level of `skill` at its current effective level.
pub fn next_cost(skill: &SkillDefinition, effective_level: u32) -> u64 {
    level_cost(skill.base_cost, skill.cost_multiplier, effective_level)
}

/// Sum of prices to take a skill from `from` to `to` (exclusive of `to`).
pub fn cumulative_cost(skill: &SkillDefinition, from: u32, to: u32) -> u64 {
    (from..to).fold(0u64, |acc, level| acc.saturating_add(next_cost(skill, level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(base: f64, mult: f64) -> SkillDefinition {
        SkillDefinition {
            id: "s".into(),
            name: "S".into(),
            description: String::new(),
            base_cost: base,
            cost_multiplier: mult,
            max_level: 5,
            children: vec![],
            position: None,
            radius: None,
        }
    }

    #[test]
    fn standard_progression() {
        let s = skill(50.0, 1.8);
        let costs: Vec<u64> = (0..5).map(|l| next_cost(&s, l)).collect();
        assert_eq!(costs, vec![50, 90, 162, 291, 524]);
    }

    #[test]
    fn free_root() {
        assert_eq!(level_cost(0.0, 1.0, 0), 0);
        assert_eq!(level_cost(0.0, 3.0, 4), 0);
    }

    #[test]
    fn flat_multiplier() {
        assert_eq!(level_cost(25.0, 1.0, 7), 25);
    }

    #[test]
    fn overflow_is_unaffordable() {
        assert_eq!(level_cost(1e300, 1e10, 10), u64::MAX);
    }

    #[test]
    fn cumulative_sums_levels() {
        let s = skill(50.0, 1.8);
        assert_eq!(cumulative_cost(&s, 0, 3), 50 + 90 + 162);
        assert_eq!(cumulative_cost(&s, 2, 2), 0);
    }
}
