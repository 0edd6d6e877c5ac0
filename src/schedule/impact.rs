use super::types::ImpactEstimate;

/// Estimates energy and emissions of running an appliance.
///
/// `average_intensity` is in gCO2/kWh, so emissions are converted from
/// grams to kilograms. Inputs must be finite and non-negative.
///
/// # Examples
///
/// ```
/// use gridslot::schedule::estimate;
///
/// let impact = estimate(2.0, 1.5, 120.0);
/// assert_eq!(impact.energy_kwh, 3.0);
/// assert!((impact.emissions_kg - 0.36).abs() < 1e-9);
/// ```
pub fn estimate(power_kw: f64, duration_hours: f64, average_intensity: f64) -> ImpactEstimate {
    let energy_kwh = power_kw * duration_hours;
    ImpactEstimate {
        energy_kwh,
        emissions_kg: energy_kwh * average_intensity / 1000.0,
    }
}
