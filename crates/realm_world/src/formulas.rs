//! Combat formulas.

use rand::Rng;

/// Damage dealt by a hit from `weapon_level` against `armor_level`.
///
/// The result is never negative. When armor absorbs the whole blow a small
/// random chip damage in `0..=3` still goes through.
pub fn damage<R: Rng + ?Sized>(rng: &mut R, weapon_level: i32, armor_level: i32) -> i32 {
    let dealt = weapon_level * rng.gen_range(5..=10);
    let absorbed = armor_level * rng.gen_range(1..=3);
    let dmg = dealt - absorbed;

    if dmg <= 0 {
        rng.gen_range(0..=3)
    } else {
        dmg
    }
}

/// Maximum hit points of a player wearing armor of the given level.
pub fn hit_points(armor_level: i32) -> i32 {
    80 + (armor_level - 1) * 30
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn roll_range(weapon: i32, armor: i32) -> (i32, i32) {
        let mut rng = StdRng::seed_from_u64(42);
        let mut min = i32::MAX;
        let mut max = i32::MIN;
        for _ in 0..500 {
            let dmg = damage(&mut rng, weapon, armor);
            min = min.min(dmg);
            max = max.max(dmg);
        }
        (min, max)
    }

    #[test]
    fn damage_without_armor() {
        let (min, max) = roll_range(1, 0);
        assert!(min >= 5 && max <= 10, "rolled {}..{}", min, max);
    }

    #[test]
    fn damage_with_armor() {
        let (min, max) = roll_range(1, 1);
        assert!(min >= 0 && max <= 9, "rolled {}..{}", min, max);
    }

    #[test]
    fn armor_far_above_weapon_only_chips() {
        let (min, max) = roll_range(1, 10);
        assert!(min >= 0 && max <= 3, "rolled {}..{}", min, max);
    }

    #[test]
    fn more_armor_lowers_average_damage() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut averages = Vec::new();
        for armor in 0..4 {
            let total: i32 = (0..1000).map(|_| damage(&mut rng, 3, armor)).sum();
            averages.push(total as f64 / 1000.0);
        }
        for pair in averages.windows(2) {
            assert!(pair[0] > pair[1], "{:?}", averages);
        }
    }

    #[test]
    fn hit_points_scale_with_armor() {
        assert_eq!(hit_points(1), 80);
        assert_eq!(hit_points(2), 110);
        assert_eq!(hit_points(3), 140);
    }
}
