//! Radial falloff profile shared by every brush.
//!
//! The weight is a Gaussian with standard deviation `radius / 3`, cut off to
//! zero at the radius so that a brush never touches anything outside its
//! footprint. At `d = radius` the Gaussian itself would still be `exp(-4.5)`;
//! the cutoff treats the support as the open ball, so a vertex sitting exactly
//! on the rim stays put.

/// Smallest radius the profile will use.
pub const MIN_RADIUS: f64 = 1e-9;

/// Falloff weight in `[0, 1]` for a vertex at `distance` from the anchor.
///
/// # Example
///
/// ```
/// use chisel::algo::falloff::falloff;
///
/// assert_eq!(falloff(0.0, 2.0), 1.0);
/// assert_eq!(falloff(2.0, 2.0), 0.0);
/// assert!(falloff(1.0, 2.0) > 0.0 && falloff(1.0, 2.0) < 1.0);
/// ```
#[inline]
pub fn falloff(distance: f64, radius: f64) -> f64 {
    let radius = radius.max(MIN_RADIUS);
    if distance >= radius {
        return 0.0;
    }
    let sigma = radius / 3.0;
    (-(distance * distance) / (2.0 * sigma * sigma)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_and_cutoff() {
        assert_eq!(falloff(0.0, 1.0), 1.0);
        assert_eq!(falloff(1.0, 1.0), 0.0);
        assert_eq!(falloff(1.5, 1.0), 0.0);
        assert_eq!(falloff(100.0, 1.0), 0.0);
    }

    #[test]
    fn test_gaussian_interior() {
        // sigma = 1 for radius 3
        let w = falloff(1.0, 3.0);
        assert!((w - (-0.5_f64).exp()).abs() < 1e-12);

        // Just inside the rim the Gaussian tail is small but non-zero
        let rim = falloff(2.999_999, 3.0);
        assert!(rim > 0.0 && rim < 0.012);
    }

    #[test]
    fn test_monotone() {
        let mut prev = falloff(0.0, 5.0);
        for i in 1..=50 {
            let w = falloff(i as f64 * 0.1, 5.0);
            assert!(w <= prev);
            assert!((0.0..=1.0).contains(&w));
            prev = w;
        }
    }

    #[test]
    fn test_degenerate_radius() {
        assert_eq!(falloff(0.0, 0.0), 1.0);
        assert_eq!(falloff(0.0, -3.0), 1.0);
        assert_eq!(falloff(1e-6, 0.0), 0.0);
        assert!(falloff(0.0, f64::MIN_POSITIVE).is_finite());
    }
}
