// Windowed multipole resonance representation.
//
// Cross sections in the resolved resonance range are stored as sums over
// complex poles grouped into equal-width windows in sqrt(E), plus a
// per-window polynomial fit of the smooth background. Doppler broadening to
// any temperature is analytic through the Faddeeva function, so a single
// data set serves every material temperature.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::constants::{
    FIT_A, FIT_CHANNELS, FIT_F, FIT_T, FORM_MLBW, FORM_RM, K_BOLTZMANN, MLBW_RA, MLBW_RF,
    MLBW_RT, MLBW_RX, MP_EA, RM_RA, RM_RF, RM_RT, SQRT_PI,
};
use crate::math::{broaden_wmp_polynomials, faddeeva, w_derivative};

const ONEI: Complex64 = Complex64::new(0.0, 1.0);

/// Resonance formalism the pole residues were derived from. The residue
/// layout per pole is the only difference: MLBW carries four residues
/// (RT, RX, RA, RF), Reich-Moore three (RT, RA, RF).
///
/// Dispatch happens once per evaluation, outside the pole loops, so the
/// inner loops stay branch-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Formalism {
    Mlbw,
    ReichMoore,
}

impl TryFrom<i32> for Formalism {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            FORM_MLBW => Ok(Formalism::Mlbw),
            FORM_RM => Ok(Formalism::ReichMoore),
            other => Err(format!("Unknown multipole formalism id {}", other)),
        }
    }
}

impl From<Formalism> for i32 {
    fn from(value: Formalism) -> Self {
        match value {
            Formalism::Mlbw => FORM_MLBW,
            Formalism::ReichMoore => FORM_RM,
        }
    }
}

/// Windowed multipole data for one nuclide.
///
/// Immutable after load and shared between threads. Windows are half-open
/// pole ranges `window_start[i]..window_end[i]`; an empty range means the
/// window has only its curvefit background.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowedMultipole {
    pub formalism: Formalism,
    pub fissionable: bool,
    /// Lowest energy the representation covers, in eV.
    pub e_min: f64,
    /// Highest energy the representation covers, in eV.
    pub e_max: f64,
    /// Window width in sqrt(eV).
    pub spacing: f64,
    /// sqrt of the atomic weight ratio.
    pub sqrt_awr: f64,
    /// Order of the curvefit polynomial.
    pub fit_order: usize,
    /// First pole of each window.
    pub window_start: Vec<usize>,
    /// One past the last pole of each window.
    pub window_end: Vec<usize>,
    /// Whether the curvefit of each window is Doppler broadened.
    pub broaden_poly: Vec<bool>,
    /// Curvefit coefficients, `curvefit[window][order][channel]` with the
    /// channels ordered total, absorption, fission.
    pub curvefit: Vec<Vec<[f64; FIT_CHANNELS]>>,
    /// Complex pole data, `data[pole][field]`; field 0 is the pole location
    /// and the rest are the formalism's residues, in persisted order.
    pub data: Vec<Vec<Complex64>>,
    /// Angular momentum (l) quantum number of each pole, 1-based.
    pub l_value: Vec<usize>,
    /// Number of distinct l values.
    pub num_l: usize,
    /// Pseudo k0*RS per l value, for the hard-sphere phase shift.
    pub pseudo_k0rs: Vec<f64>,
}

impl WindowedMultipole {
    /// Whether `e` falls inside the energy range this representation covers.
    pub fn contains(&self, e: f64) -> bool {
        (self.e_min..=self.e_max).contains(&e)
    }

    /// Window holding sqrt(E), clamped to the last window at the top edge.
    fn window_index(&self, sqrt_e: f64) -> usize {
        let i = ((sqrt_e - self.e_min.sqrt()) / self.spacing) as usize;
        i.min(self.window_start.len() - 1)
    }

    /// Complex phase factor applied to the total cross section for each
    /// angular momentum, from the hard-sphere phase shift phi_l:
    /// exp(-2i phi_l) = cos(2 phi_l) - i sin(2 phi_l).
    fn sigma_t_factor(&self, sqrt_e: f64) -> Vec<Complex64> {
        (0..self.num_l)
            .map(|l| {
                let phi = self.pseudo_k0rs[l] * sqrt_e;
                let shifted = match l {
                    0 => phi,
                    1 => phi - phi.atan(),
                    2 => phi - (3.0 * phi / (3.0 - phi * phi)).atan(),
                    _ => {
                        phi - (phi * (15.0 - phi * phi) / (15.0 - 6.0 * phi * phi)).atan()
                    }
                };
                let twophi = 2.0 * shifted;
                Complex64::new(twophi.cos(), -twophi.sin())
            })
            .collect()
    }

    /// Smooth-background contribution of the curvefit polynomial, added in
    /// place. Broadened with the window's flag set and a finite temperature,
    /// otherwise evaluated as a raw polynomial in sqrt(E) with leading term
    /// 1/E.
    fn add_curvefit(
        &self,
        i_window: usize,
        e: f64,
        sqrt_kt: f64,
        sig: &mut (f64, f64, f64),
    ) {
        if sqrt_kt != 0.0 && self.broaden_poly[i_window] {
            let dopp = self.sqrt_awr / sqrt_kt;
            let broadened = broaden_wmp_polynomials(e, dopp, self.fit_order + 1);
            for (k, factor) in broadened.iter().enumerate() {
                let c = &self.curvefit[i_window][k];
                sig.0 += c[FIT_T] * factor;
                sig.1 += c[FIT_A] * factor;
                if self.fissionable {
                    sig.2 += c[FIT_F] * factor;
                }
            }
        } else {
            let sqrt_e = e.sqrt();
            let mut term = 1.0 / e;
            for k in 0..=self.fit_order {
                let c = &self.curvefit[i_window][k];
                sig.0 += c[FIT_T] * term;
                sig.1 += c[FIT_A] * term;
                if self.fissionable {
                    sig.2 += c[FIT_F] * term;
                }
                term *= sqrt_e;
            }
        }
    }

    /// Evaluate (total, absorption, fission) at energy `e` (eV) and
    /// temperature `sqrt_kt` (sqrt(eV)). A `sqrt_kt` of exactly zero selects
    /// the unbroadened asymptotic pole form.
    pub fn evaluate(&self, e: f64, sqrt_kt: f64) -> (f64, f64, f64) {
        let sqrt_e = e.sqrt();
        let inv_e = 1.0 / e;
        let i_window = self.window_index(sqrt_e);
        let startw = self.window_start[i_window];
        let endw = self.window_end[i_window];

        let mut sig = (0.0, 0.0, 0.0);

        // Hard-sphere phase factors are only needed when poles contribute.
        let sig_t_factor = if startw < endw {
            self.sigma_t_factor(sqrt_e)
        } else {
            Vec::new()
        };

        self.add_curvefit(i_window, e, sqrt_kt, &mut sig);

        if sqrt_kt == 0.0 {
            // Asymptotic form: psi/chi collapses to a simple pole at sqrt(E).
            match self.formalism {
                Formalism::Mlbw => {
                    for p in startw..endw {
                        let pole = &self.data[p];
                        let psi_chi = -ONEI / (pole[MP_EA] - sqrt_e);
                        let c_temp = psi_chi * inv_e;
                        let factor = sig_t_factor[self.l_value[p] - 1];
                        sig.0 += (pole[MLBW_RT] * c_temp * factor + pole[MLBW_RX] * c_temp).re;
                        sig.1 += (pole[MLBW_RA] * c_temp).re;
                        if self.fissionable {
                            sig.2 += (pole[MLBW_RF] * c_temp).re;
                        }
                    }
                }
                Formalism::ReichMoore => {
                    for p in startw..endw {
                        let pole = &self.data[p];
                        let psi_chi = -ONEI / (pole[MP_EA] - sqrt_e);
                        let c_temp = psi_chi * inv_e;
                        sig.0 += (pole[RM_RT] * c_temp * sig_t_factor[self.l_value[p] - 1]).re;
                        sig.1 += (pole[RM_RA] * c_temp).re;
                        if self.fissionable {
                            sig.2 += (pole[RM_RF] * c_temp).re;
                        }
                    }
                }
            }
        } else {
            // Doppler broadened form through the Faddeeva function.
            let dopp = self.sqrt_awr / sqrt_kt;
            match self.formalism {
                Formalism::Mlbw => {
                    for p in startw..endw {
                        let pole = &self.data[p];
                        let z = (sqrt_e - pole[MP_EA]) * dopp;
                        let w_val = faddeeva(z) * dopp * inv_e * SQRT_PI;
                        let factor = sig_t_factor[self.l_value[p] - 1];
                        sig.0 += ((pole[MLBW_RT] * factor + pole[MLBW_RX]) * w_val).re;
                        sig.1 += (pole[MLBW_RA] * w_val).re;
                        if self.fissionable {
                            sig.2 += (pole[MLBW_RF] * w_val).re;
                        }
                    }
                }
                Formalism::ReichMoore => {
                    for p in startw..endw {
                        let pole = &self.data[p];
                        let z = (sqrt_e - pole[MP_EA]) * dopp;
                        let w_val = faddeeva(z) * dopp * inv_e * SQRT_PI;
                        sig.0 += (pole[RM_RT] * w_val * sig_t_factor[self.l_value[p] - 1]).re;
                        sig.1 += (pole[RM_RA] * w_val).re;
                        if self.fissionable {
                            sig.2 += (pole[RM_RF] * w_val).re;
                        }
                    }
                }
            }
        }

        sig
    }

    /// Evaluate the temperature derivative (d sigma / dT) of (total,
    /// absorption, fission) at `e` and `sqrt_kt`, via the second derivative
    /// of the Faddeeva function.
    ///
    /// The curvefit polynomial derivative is omitted: its temperature
    /// dependence is negligible except at very low energies.
    ///
    /// # Panics
    /// Panics when `sqrt_kt` is zero; the derivative of the asymptotic form
    /// is not defined here and requesting it is a caller error.
    pub fn evaluate_deriv(&self, e: f64, sqrt_kt: f64) -> (f64, f64, f64) {
        if sqrt_kt == 0.0 {
            panic!("Windowed multipole temperature derivatives require a finite temperature");
        }

        let sqrt_e = e.sqrt();
        let inv_e = 1.0 / e;
        let i_window = self.window_index(sqrt_e);
        let startw = self.window_start[i_window];
        let endw = self.window_end[i_window];
        let dopp = self.sqrt_awr / sqrt_kt;
        let t = sqrt_kt * sqrt_kt / K_BOLTZMANN;

        let mut sig = (0.0, 0.0, 0.0);

        let sig_t_factor = if startw < endw {
            self.sigma_t_factor(sqrt_e)
        } else {
            Vec::new()
        };

        match self.formalism {
            Formalism::Mlbw => {
                for p in startw..endw {
                    let pole = &self.data[p];
                    let z = (sqrt_e - pole[MP_EA]) * dopp;
                    let w_val = -inv_e * SQRT_PI * 0.5 * w_derivative(z, 2);
                    let factor = sig_t_factor[self.l_value[p] - 1];
                    sig.0 += ((pole[MLBW_RT] * factor + pole[MLBW_RX]) * w_val).re;
                    sig.1 += (pole[MLBW_RA] * w_val).re;
                    if self.fissionable {
                        sig.2 += (pole[MLBW_RF] * w_val).re;
                    }
                }
            }
            Formalism::ReichMoore => {
                for p in startw..endw {
                    let pole = &self.data[p];
                    let z = (sqrt_e - pole[MP_EA]) * dopp;
                    let w_val = -inv_e * SQRT_PI * 0.5 * w_derivative(z, 2);
                    sig.0 += (pole[RM_RT] * w_val * sig_t_factor[self.l_value[p] - 1]).re;
                    sig.1 += (pole[RM_RA] * w_val).re;
                    if self.fissionable {
                        sig.2 += (pole[RM_RF] * w_val).re;
                    }
                }
            }
        }

        let scale = -0.5 * self.sqrt_awr / K_BOLTZMANN.sqrt() * t.powf(-1.5);
        (sig.0 * scale, sig.1 * scale, sig.2 * scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MP_FIELDS_MLBW;

    /// One MLBW pole at sqrt(E) = x0 - i*gamma with a purely real
    /// absorption residue, no curvefit, covering 1 eV to 100 eV.
    fn single_pole(x0: f64, gamma: f64, ra: f64) -> WindowedMultipole {
        let e_min: f64 = 1.0;
        let e_max: f64 = 100.0;
        let spacing = e_max.sqrt() - e_min.sqrt();
        let mut pole = vec![Complex64::new(0.0, 0.0); MP_FIELDS_MLBW];
        pole[MP_EA] = Complex64::new(x0, -gamma);
        pole[MLBW_RA] = Complex64::new(ra, 0.0);
        WindowedMultipole {
            formalism: Formalism::Mlbw,
            fissionable: false,
            e_min,
            e_max,
            spacing,
            sqrt_awr: 15.0,
            fit_order: 2,
            window_start: vec![0],
            window_end: vec![1],
            broaden_poly: vec![false],
            curvefit: vec![vec![[0.0; FIT_CHANNELS]; 3]],
            data: vec![pole],
            l_value: vec![1],
            num_l: 1,
            pseudo_k0rs: vec![0.0],
        }
    }

    #[test]
    fn test_absorption_peaks_at_pole_energy() {
        // With a purely real RA, the 0 K absorption is a Lorentzian in
        // sqrt(E) centered on Re(pole), i.e. a peak at E = Re(pole)^2.
        let x0 = 3.0;
        let gamma = 0.05;
        let ra = 2.0;
        let wmp = single_pole(x0, gamma, ra);

        let sigma_a = |e: f64| wmp.evaluate(e, 0.0).1;
        let e_peak = x0 * x0;
        let at_peak = sigma_a(e_peak);
        assert!(at_peak > sigma_a(e_peak * 0.95));
        assert!(at_peak > sigma_a(e_peak * 1.05));

        // Analytic Lorentzian profile: RA * gamma / ((x0-u)^2 + gamma^2) / E
        for e in [7.5, 8.7, 9.0, 9.3, 10.8] {
            let u = f64::sqrt(e);
            let expected = ra * gamma / ((x0 - u).powi(2) + gamma * gamma) / e;
            let got = sigma_a(e);
            assert!(
                (got - expected).abs() < 1e-12 * expected.abs().max(1.0),
                "E = {}: got {}, want {}",
                e,
                got,
                expected
            );
        }
    }

    #[test]
    fn test_broadened_converges_to_zero_kelvin() {
        // As sqrt(kT) -> 0 the Faddeeva form must approach the asymptotic
        // form (no curvefit present here).
        let wmp = single_pole(3.0, 0.1, 1.5);
        let e = 9.4;
        let cold = wmp.evaluate(e, 0.0);
        let warm = wmp.evaluate(e, 1e-4);
        assert!(
            (warm.1 - cold.1).abs() / cold.1 < 1e-3,
            "warm {} vs cold {}",
            warm.1,
            cold.1
        );
        assert!((warm.0 - cold.0).abs() <= 1e-3 * cold.0.abs().max(1.0));
    }

    #[test]
    fn test_curvefit_only_window() {
        // An empty pole window leaves just the raw polynomial:
        // sigma = (c0 + c1 sqrt(E) + c2 E) / E at 0 K.
        let mut wmp = single_pole(3.0, 0.1, 1.0);
        wmp.window_end = vec![0];
        wmp.curvefit = vec![vec![
            [4.0, 1.0, 0.0],
            [0.5, 0.0, 0.0],
            [0.25, 0.0, 0.0],
        ]];
        let e = 16.0;
        let (sig_t, sig_a, sig_f) = wmp.evaluate(e, 0.0);
        let expected_t = (4.0 + 0.5 * 4.0 + 0.25 * 16.0) / 16.0;
        assert!((sig_t - expected_t).abs() < 1e-12);
        assert!((sig_a - 1.0 / 16.0).abs() < 1e-12);
        assert_eq!(sig_f, 0.0);
    }

    #[test]
    fn test_sigma_t_factor_s_wave() {
        // For l = 1 the phase shift is phi itself.
        let mut wmp = single_pole(3.0, 0.1, 1.0);
        wmp.pseudo_k0rs = vec![0.3];
        let sqrt_e = 2.0;
        let factor = wmp.sigma_t_factor(sqrt_e)[0];
        let twophi = 2.0 * 0.3 * sqrt_e;
        assert!((factor.re - twophi.cos()).abs() < 1e-15);
        assert!((factor.im + twophi.sin()).abs() < 1e-15);
    }

    #[test]
    #[should_panic(expected = "finite temperature")]
    fn test_deriv_at_zero_kelvin_is_fatal() {
        let wmp = single_pole(3.0, 0.1, 1.0);
        wmp.evaluate_deriv(9.0, 0.0);
    }

    #[test]
    fn test_deriv_matches_finite_difference() {
        let wmp = single_pole(3.0, 0.08, 2.0);
        // On top of the resonance the peak height drops steadily with
        // temperature, so the central difference is well conditioned there.
        let e = 9.0;
        let t: f64 = 600.0;
        let sqrt_kt = (K_BOLTZMANN * t).sqrt();
        let dt = 10.0;
        let lo = wmp.evaluate(e, (K_BOLTZMANN * (t - dt)).sqrt()).1;
        let hi = wmp.evaluate(e, (K_BOLTZMANN * (t + dt)).sqrt()).1;
        let numeric = (hi - lo) / (2.0 * dt);
        let analytic = wmp.evaluate_deriv(e, sqrt_kt).1;
        assert!(
            numeric < 0.0 && analytic < 0.0,
            "peak height should fall with temperature: numeric {}, analytic {}",
            numeric,
            analytic
        );
        assert!(
            (numeric - analytic).abs() < 0.05 * numeric.abs(),
            "numeric {} vs analytic {}",
            numeric,
            analytic
        );
    }

    #[test]
    fn test_formalism_roundtrip() {
        assert_eq!(Formalism::try_from(FORM_MLBW).unwrap(), Formalism::Mlbw);
        assert_eq!(i32::from(Formalism::ReichMoore), FORM_RM);
        assert!(Formalism::try_from(7).is_err());
    }
}
