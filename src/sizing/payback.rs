//! Cumulative payback timeline and break-even search.

use super::types::PaybackPoint;

/// Builds the yearly timeline for years `0..=years`.
///
/// Investment is constant, cumulative savings grow linearly, and the balance
/// at year 0 is the negated investment.
///
/// # Examples
///
/// ```
/// use solar_match::sizing::payback::build_timeline;
///
/// let t = build_timeline(5040, 672, 15);
/// assert_eq!(t.len(), 16);
/// assert_eq!(t[0].balance_eur, -5040);
/// assert_eq!(t[15].balance_eur, 672 * 15 - 5040);
/// ```
pub fn build_timeline(investment_eur: u32, annual_savings_eur: u32, years: u32) -> Vec<PaybackPoint> {
    let investment = i64::from(investment_eur);
    let annual = i64::from(annual_savings_eur);
    (0..=years)
        .map(|year| {
            let cumulative = annual * i64::from(year);
            PaybackPoint {
                year,
                investment_eur: investment,
                cumulative_savings_eur: cumulative,
                balance_eur: cumulative - investment,
            }
        })
        .collect()
}

/// First year whose balance is non-negative, or `None` within the horizon.
pub fn break_even_year(timeline: &[PaybackPoint]) -> Option<u32> {
    timeline.iter().find(|p| p.balance_eur >= 0).map(|p| p.year)
}
