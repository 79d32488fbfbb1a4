use rust_decimal::Decimal;

use crate::domain::subscription::Cadence;

const DAYS_PER_YEAR: u32 = 365;

/// Nearest rung of the weekly / biweekly / monthly ladder.
///
/// A mean interval further than `tolerance_days` from every rung becomes
/// `Custom` with the interval rounded to whole days, never less than one
/// day. Equidistant rungs resolve to the shorter one.
pub fn match_cadence(mean_interval_days: f64, tolerance_days: f64) -> (Cadence, u32) {
    let mut nearest: Option<(Cadence, u32, f64)> = None;
    for cadence in Cadence::LADDER {
        let Some(rung) = cadence.rung_days() else {
            continue;
        };
        let distance = (mean_interval_days - f64::from(rung)).abs();
        if nearest.map_or(true, |(_, _, best)| distance < best) {
            nearest = Some((cadence, rung, distance));
        }
    }

    match nearest {
        Some((cadence, rung, distance)) if distance <= tolerance_days => (cadence, rung),
        _ => (Cadence::Custom, mean_interval_days.round().max(1.0) as u32),
    }
}

/// `unit_price * (365 / interval_days) * discount_rate`, rounded to cents.
///
/// Missing prices, a zero interval or an arithmetic overflow all yield zero.
pub fn estimate_annual_savings(
    unit_price: Option<Decimal>,
    interval_days: u32,
    discount_rate: Decimal,
) -> Decimal {
    let Some(unit_price) = unit_price else {
        return Decimal::ZERO;
    };
    if interval_days == 0 {
        return Decimal::ZERO;
    }

    unit_price
        .checked_mul(Decimal::from(DAYS_PER_YEAR))
        .and_then(|yearly| yearly.checked_mul(discount_rate))
        .and_then(|discounted| discounted.checked_div(Decimal::from(interval_days)))
        .map(|savings| savings.round_dp(2).max(Decimal::ZERO))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{estimate_annual_savings, match_cadence};
    use crate::domain::subscription::Cadence;

    #[test]
    fn exact_rungs_map_to_ladder() {
        assert_eq!(match_cadence(7.0, 3.0), (Cadence::Weekly, 7));
        assert_eq!(match_cadence(14.0, 3.0), (Cadence::Biweekly, 14));
        assert_eq!(match_cadence(30.0, 3.0), (Cadence::Monthly, 30));
    }

    #[test]
    fn near_rungs_within_tolerance_snap() {
        assert_eq!(match_cadence(8.4, 3.0), (Cadence::Weekly, 7));
        assert_eq!(match_cadence(12.5, 3.0), (Cadence::Biweekly, 14));
        assert_eq!(match_cadence(28.0, 3.0), (Cadence::Monthly, 30));
    }

    #[test]
    fn intervals_outside_tolerance_are_custom() {
        assert_eq!(match_cadence(21.4, 3.0), (Cadence::Custom, 21));
        assert_eq!(match_cadence(45.6, 3.0), (Cadence::Custom, 46));
        assert_eq!(match_cadence(3.0, 3.0), (Cadence::Custom, 3));
    }

    #[test]
    fn sub_day_intervals_round_up_to_one_day() {
        assert_eq!(match_cadence(0.3, 3.0), (Cadence::Custom, 1));
        assert_eq!(match_cadence(0.0, 3.0), (Cadence::Custom, 1));
    }

    #[test]
    fn zero_tolerance_only_matches_exact_rungs() {
        assert_eq!(match_cadence(7.0, 0.0), (Cadence::Weekly, 7));
        assert_eq!(match_cadence(7.2, 0.0), (Cadence::Custom, 7));
    }

    #[test]
    fn equidistant_rungs_prefer_the_shorter() {
        assert_eq!(match_cadence(10.5, 4.0), (Cadence::Weekly, 7));
    }

    #[test]
    fn savings_follow_price_frequency_and_discount() {
        // 5.49 * 365 / 7 * 0.05 = 14.3130...
        let savings = estimate_annual_savings(Some(Decimal::new(549, 2)), 7, Decimal::new(5, 2));
        assert_eq!(savings, Decimal::new(1431, 2));
    }

    #[test]
    fn missing_price_yields_zero_savings() {
        assert_eq!(estimate_annual_savings(None, 7, Decimal::new(5, 2)), Decimal::ZERO);
        assert_eq!(estimate_annual_savings(Some(Decimal::ONE), 0, Decimal::ONE), Decimal::ZERO);
    }
}
