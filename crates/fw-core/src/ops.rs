//! Small numeric helpers for writing behaviors.

/// Multiply factors that may be infinite or zero.
///
/// Earlier factors take precedence: a leading infinity makes the product
/// infinite even if a later factor is zero, while a zero before an infinity
/// makes it zero. Otherwise this is the ordinary product. An empty slice
/// yields `1.0`.
pub fn m2to1(factors: &[f64]) -> f64 {
    match factors {
        [] => 1.0,
        [x] => *x,
        [first, rest @ ..] => {
            let tail = m2to1(rest);
            if *first == f64::INFINITY {
                f64::INFINITY
            } else if tail == f64::INFINITY {
                if *first == 0.0 { 0.0 } else { f64::INFINITY }
            } else {
                first * tail
            }
        }
    }
}

/// Cap a value at 2.0.
pub fn trunc(x: f64) -> f64 {
    truncn(x, 2.0)
}

/// Cap a value at `n`.
pub fn truncn(x: f64, n: f64) -> f64 {
    if x > n { n } else { x }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn m2to1_plain_product() {
        assert!((m2to1(&[2.0, 3.0, 0.5]) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn m2to1_leading_infinity_wins_over_zero() {
        assert_eq!(m2to1(&[f64::INFINITY, 0.0]), f64::INFINITY);
    }

    #[test]
    fn m2to1_leading_zero_wins_over_infinity() {
        assert_eq!(m2to1(&[0.0, f64::INFINITY]), 0.0);
        assert_eq!(m2to1(&[1.0, 0.0, f64::INFINITY]), 0.0);
    }

    #[test]
    fn m2to1_infinity_propagates() {
        assert_eq!(m2to1(&[1.0, 2.0, f64::INFINITY]), f64::INFINITY);
    }

    #[test]
    fn truncation() {
        assert_eq!(trunc(3.5), 2.0);
        assert_eq!(trunc(1.5), 1.5);
        assert_eq!(truncn(7.0, 5.0), 5.0);
    }
}
