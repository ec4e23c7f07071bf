// Unresolved-resonance-range probability tables.
//
// In the unresolved range individual resonances cannot be tabulated, so the
// cross section is sampled: each incident-energy row carries a cumulative
// probability distribution over bands, and one band is selected per
// collision from a dedicated random stream.

use serde::{Deserialize, Serialize};

use crate::constants::{LINEAR_LINEAR, LOG_LOG, URR_CUM_PROB, URR_PARAMS};

/// Interpolation law between URR incident-energy rows, using the standard
/// ENDF interpolation ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum UrrInterpolation {
    LinLin,
    LogLog,
}

impl TryFrom<i32> for UrrInterpolation {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            LINEAR_LINEAR => Ok(UrrInterpolation::LinLin),
            LOG_LOG => Ok(UrrInterpolation::LogLog),
            other => Err(format!("Unsupported URR interpolation id {}", other)),
        }
    }
}

impl From<UrrInterpolation> for i32 {
    fn from(value: UrrInterpolation) -> Self {
        match value {
            UrrInterpolation::LinLin => LINEAR_LINEAR,
            UrrInterpolation::LogLog => LOG_LOG,
        }
    }
}

/// Probability tables for one nuclide at one temperature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrrData {
    /// Interpolation law between incident-energy rows.
    pub interp: UrrInterpolation,
    /// MT of the reaction supplying the smooth inelastic contribution, or
    /// zero/negative when the unresolved range carries no inelastic part.
    pub inelastic_flag: i32,
    /// Other-absorption flag from the source data (carried through for
    /// fidelity with the persisted format; not consumed here).
    pub absorption_flag: i32,
    /// Whether the sampled factors multiply the smooth tabulated cross
    /// sections instead of standing on their own.
    pub multiply_smooth: bool,
    /// Incident energies of the table rows, ascending, in eV.
    pub energy: Vec<f64>,
    /// Table body: `prob[row][param][band]`, with the params ordered
    /// cumulative probability, elastic, fission, capture.
    pub prob: Vec<Vec<Vec<f64>>>,
}

impl UrrData {
    /// Number of bands per row.
    pub fn n_bands(&self) -> usize {
        self.prob.first().map_or(0, |row| row[URR_CUM_PROB].len())
    }

    /// Whether `e` lies strictly inside the tabulated energy range.
    pub fn contains(&self, e: f64) -> bool {
        match (self.energy.first(), self.energy.last()) {
            (Some(&lo), Some(&hi)) => e > lo && e < hi,
            _ => false,
        }
    }

    /// Row index and linear interpolation factor for energy `e`, which must
    /// lie strictly inside the table range. The scan is linear: URR tables
    /// carry at most a few dozen rows.
    pub fn energy_row(&self, e: f64) -> (usize, f64) {
        debug_assert!(self.contains(e));
        let mut i = 0;
        while e >= self.energy[i + 1] {
            i += 1;
        }
        let f = (e - self.energy[i]) / (self.energy[i + 1] - self.energy[i]);
        (i, f)
    }

    /// Smallest band whose cumulative probability exceeds `r` on the given
    /// row. The last band's cumulative probability is one, so the scan
    /// terminates for any r in [0, 1).
    pub fn sample_band(&self, i_energy: usize, r: f64) -> usize {
        let cum = &self.prob[i_energy][URR_CUM_PROB];
        let mut band = 0;
        while band + 1 < cum.len() && cum[band] <= r {
            band += 1;
        }
        band
    }

    /// Table value for one parameter at (row, band).
    pub fn value(&self, i_energy: usize, param: usize, band: usize) -> f64 {
        debug_assert!(param < URR_PARAMS);
        self.prob[i_energy][param][band]
    }

    /// Interpolate one channel between two rows with pre-selected bands.
    /// Under log-log interpolation a non-positive endpoint zeroes the
    /// channel for this lookup.
    pub fn interpolate_channel(
        &self,
        param: usize,
        i_energy: usize,
        band_low: usize,
        band_up: usize,
        f: f64,
    ) -> f64 {
        let lo = self.value(i_energy, param, band_low);
        let hi = self.value(i_energy + 1, param, band_up);
        match self.interp {
            UrrInterpolation::LinLin => (1.0 - f) * lo + f * hi,
            UrrInterpolation::LogLog => {
                if lo <= 0.0 || hi <= 0.0 {
                    0.0
                } else {
                    ((1.0 - f) * lo.ln() + f * hi.ln()).exp()
                }
            }
        }
    }

    /// Logarithmic interpolation factor between rows `i` and `i + 1`.
    pub fn log_factor(&self, i_energy: usize, e: f64) -> f64 {
        (e / self.energy[i_energy]).ln()
            / (self.energy[i_energy + 1] / self.energy[i_energy]).ln()
    }
}
