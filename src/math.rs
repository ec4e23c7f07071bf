// Special functions backing the windowed multipole evaluation: the error
// function, the Faddeeva function w(z) and its derivatives, and Doppler
// broadening of the curvefit polynomial basis.

use num_complex::Complex64;

use crate::constants::SQRT_PI;

const ONEI: Complex64 = Complex64::new(0.0, 1.0);

/// Error function, Abramowitz & Stegun 7.1.26 rational approximation
/// (absolute error below 1.5e-7 everywhere).
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = t * (A1 + t * (A2 + t * (A3 + t * (A4 + t * A5))));
    sign * (1.0 - poly * (-x * x).exp())
}

/// Complementary error function.
pub fn erfc(x: f64) -> f64 {
    1.0 - erf(x)
}

/// Faddeeva function in the pole-integral convention.
///
/// The pole sums want
///   w(z) = i/pi * Integrate[Exp[-t^2]/(z-t), {t, -Inf, Inf}]
/// (Hwang, Nucl. Sci. Eng. 96 (1987) 192), whereas the rational
/// approximation below evaluates the function form exp(-z^2)erfc(-iz),
/// valid in the upper half plane. The two are related by
///   Im(z) > 0:  w_int(z) = w_fun(z)
///   Im(z) < 0:  w_int(z) = -conj(w_fun(conj(z)))
pub fn faddeeva(z: Complex64) -> Complex64 {
    if z.im > 0.0 {
        humlicek_w4(z)
    } else {
        -humlicek_w4(z.conj()).conj()
    }
}

/// Humlicek's four-region rational approximation to w(z) for Im(z) >= 0
/// (J. Quant. Spectrosc. Radiat. Transfer 27 (1982) 437). Relative error
/// stays near 1e-4 over the whole half plane, which is ample for Doppler
/// broadening of resonance poles.
fn humlicek_w4(z: Complex64) -> Complex64 {
    let x = z.re;
    let y = z.im;
    let t = Complex64::new(y, -x);
    let s = x.abs() + y;

    if s >= 15.0 {
        // Region I: single-term asymptotic form
        t * 0.5641896 / (0.5 + t * t)
    } else if s >= 5.5 {
        // Region II
        let u = t * t;
        t * (1.410474 + u * 0.5641896) / (0.75 + u * (3.0 + u))
    } else if y >= 0.195 * x.abs() - 0.176 {
        // Region III
        (16.4955 + t * (20.20933 + t * (11.96482 + t * (3.778987 + t * 0.5642236))))
            / (16.4955 + t * (38.82363 + t * (39.27121 + t * (21.69274 + t * (6.699398 + t)))))
    } else {
        // Region IV
        let u = t * t;
        let numerator = t
            * (36183.31
                - u * (3321.9905
                    - u * (1540.787
                        - u * (219.0313 - u * (35.76683 - u * (1.320522 - u * 0.56419))))));
        let denominator = 32066.6
            - u * (24322.84
                - u * (9022.228
                    - u * (2186.181 - u * (364.2191 - u * (61.57037 - u * (1.841439 - u))))));
        u.exp() - numerator / denominator
    }
}

/// n-th derivative of the Faddeeva function.
///
/// Uses w'(z) = -2 z w(z) + 2i/sqrt(pi) and the recurrence
/// w^(n)(z) = -2 (n-1) w^(n-2)(z) - 2 z w^(n-1)(z).
pub fn w_derivative(z: Complex64, order: usize) -> Complex64 {
    match order {
        0 => faddeeva(z),
        1 => -2.0 * z * faddeeva(z) + 2.0 * ONEI / SQRT_PI,
        n => {
            -2.0 * (n as f64 - 1.0) * w_derivative(z, n - 2) - 2.0 * z * w_derivative(z, n - 1)
        }
    }
}

/// Doppler-broadened curvefit basis for the windowed multipole smooth
/// background.
///
/// The curvefit represents the smooth cross section as
/// sum_k c_k * E^((k-2)/2), i.e. terms 1/E, 1/sqrt(E), 1, sqrt(E), ...
/// This returns the exactly broadened value of each basis term at energy
/// `e` (eV) for Doppler width parameter `dopp` = sqrt(AWR)/sqrt(kT); the
/// first three terms have closed forms and higher orders follow from the
/// two-step recurrence in beta^2 = E * dopp^2. As `dopp -> inf` each
/// factor tends to its unbroadened basis term.
///
/// `n` is the number of terms (fit order + 1) and must be at least 3.
pub fn broaden_wmp_polynomials(e: f64, dopp: f64, n: usize) -> Vec<f64> {
    debug_assert!(n >= 3);
    let sqrt_e = e.sqrt();
    let beta = sqrt_e * dopp;
    let half_inv_dopp2 = 0.5 / (dopp * dopp);
    let quarter_inv_dopp4 = half_inv_dopp2 * half_inv_dopp2;

    let (erf_beta, exp_m_beta2) = if beta > 6.0 {
        // erf(6) is unity to machine precision, and exp(-36) vanishes
        (1.0, 0.0)
    } else {
        (erf(beta), (-beta * beta).exp())
    };

    let mut factors = vec![0.0; n];
    factors[0] = erf_beta / e;
    factors[1] = 1.0 / sqrt_e;
    factors[2] = factors[0] * (half_inv_dopp2 + e) + exp_m_beta2 / (beta * SQRT_PI);

    // Broaden the higher-order terms recursively. The i = 1 step drops the
    // factors[i - 2] term, whose coefficient is exactly zero there.
    for i in 1..n.saturating_sub(2) {
        let ip1 = (i + 1) as f64;
        if i == 1 {
            factors[3] = factors[1] * (e + (1.0 + 2.0 * ip1) * half_inv_dopp2);
        } else {
            factors[i + 2] = -factors[i - 2] * (ip1 - 1.0) * (ip1 - 2.0) * quarter_inv_dopp4
                + factors[i] * (e + (1.0 + 2.0 * ip1) * half_inv_dopp2);
        }
    }
    factors
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference values from Abramowitz & Stegun / scipy.special
    #[test]
    fn test_erf_reference_values() {
        let cases = [
            (0.0, 0.0),
            (0.5, 0.5204998778),
            (1.0, 0.8427007929),
            (2.0, 0.9953222650),
            (-1.0, -0.8427007929),
            (3.0, 0.9999779095),
        ];
        for (x, expected) in cases {
            assert!(
                (erf(x) - expected).abs() < 1e-6,
                "erf({}) = {}, want {}",
                x,
                erf(x),
                expected
            );
        }
        assert!((erfc(1.0) - 0.1572992070).abs() < 1e-6);
    }

    #[test]
    fn test_faddeeva_on_imaginary_axis() {
        // w(iy) = exp(y^2) erfc(y), purely real
        let w = faddeeva(Complex64::new(0.0, 1.0));
        assert!((w.re - 0.4275835761558070).abs() < 1e-4, "re = {}", w.re);
        assert!(w.im.abs() < 1e-4, "im = {}", w.im);
    }

    #[test]
    fn test_faddeeva_reference_point() {
        // scipy.special.wofz(1 + 1j)
        let w = faddeeva(Complex64::new(1.0, 1.0));
        assert!((w.re - 0.3047442052569126).abs() < 2e-4, "re = {}", w.re);
        assert!((w.im - 0.2082189382028316).abs() < 2e-4, "im = {}", w.im);
    }

    #[test]
    fn test_faddeeva_asymptotic() {
        // |z| large: w(z) -> i / (sqrt(pi) z)
        let z = Complex64::new(20.0, 20.0);
        let expected = ONEI / (SQRT_PI * z);
        let w = faddeeva(z);
        assert!((w - expected).norm() / expected.norm() < 1e-3);
    }

    #[test]
    fn test_faddeeva_lower_half_plane() {
        // w_int(conj(z)) = -conj(w_int(z)) by construction
        let z = Complex64::new(1.3, 0.7);
        let upper = faddeeva(z);
        let lower = faddeeva(z.conj());
        assert!((lower + upper.conj()).norm() < 1e-12);
    }

    #[test]
    fn test_w_second_derivative_closed_form() {
        // w'' = (4z^2 - 2) w - 4iz/sqrt(pi)
        let z = Complex64::new(0.8, 1.4);
        let direct = (4.0 * z * z - 2.0) * faddeeva(z) - 4.0 * ONEI * z / SQRT_PI;
        let recursive = w_derivative(z, 2);
        assert!((direct - recursive).norm() < 1e-10 * direct.norm().max(1.0));
    }

    #[test]
    fn test_broaden_wmp_polynomials_unbroadened_limit() {
        // At very large dopp (cold target) each factor approaches the raw
        // basis term E^((k-2)/2).
        let e = 12.0;
        let factors = broaden_wmp_polynomials(e, 1e6, 6);
        let sqrt_e = e.sqrt();
        let expected = [
            1.0 / e,
            1.0 / sqrt_e,
            1.0,
            sqrt_e,
            e,
            e * sqrt_e,
        ];
        for (k, want) in expected.iter().enumerate() {
            assert!(
                (factors[k] - want).abs() / want < 1e-9,
                "k = {}: got {}, want {}",
                k,
                factors[k],
                want
            );
        }
    }

    #[test]
    fn test_broaden_wmp_polynomials_constant_term() {
        // The broadened constant term has the classic closed form
        // (1 + 1/(2 beta^2)) erf(beta) + exp(-beta^2)/(beta sqrt(pi)).
        let e: f64 = 0.5;
        let dopp = 2.0;
        let beta = e.sqrt() * dopp;
        let expected =
            (1.0 + 0.5 / (beta * beta)) * erf(beta) + (-beta * beta).exp() / (beta * SQRT_PI);
        let factors = broaden_wmp_polynomials(e, dopp, 4);
        assert!(
            (factors[2] - expected).abs() < 1e-10,
            "got {}, want {}",
            factors[2],
            expected
        );
    }

    #[test]
    fn test_broaden_wmp_polynomials_one_over_v_invariant() {
        // 1/sqrt(E) broadens to itself at any temperature.
        let factors = broaden_wmp_polynomials(3.0, 0.7, 5);
        assert!((factors[1] - 1.0 / 3.0_f64.sqrt()).abs() < 1e-12);
    }
}
