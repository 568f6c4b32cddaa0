//! Standard normal helpers used by the TrueSkill update
//!
//! `v_win` and `w_win` are the mean and variance corrections of a Gaussian
//! truncated at zero, i.e. the evidence "the winner out-performed the loser".

use std::f64::consts::{PI, SQRT_2};

/// Complementary error function (Chebyshev fit, |error| < 1.2e-7)
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let r = t * (-z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87
                                    + t * (-0.822_152_23 + t * 0.170_872_77)))))))))
        .exp();

    if x >= 0.0 {
        r
    } else {
        2.0 - r
    }
}

/// Standard normal probability density
pub fn pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Standard normal cumulative distribution
pub fn cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Mean shift for an observed win with normalized performance gap `t`
pub fn v_win(t: f64) -> f64 {
    let denom = cdf(t);
    if denom > f64::MIN_POSITIVE {
        pdf(t) / denom
    } else {
        // pdf(t) / cdf(t) tends to -t as t goes to -inf
        -t
    }
}

/// Variance reduction factor for an observed win, always in [0, 1]
pub fn w_win(t: f64) -> f64 {
    let v = v_win(t);
    (v * (v + t)).clamp(0.0, 1.0)
}
