// Run-time configuration for the cross section evaluation core.

use serde::{Deserialize, Serialize};

/// How material temperatures map onto the discrete temperatures carried by
/// the nuclear data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureMethod {
    /// Use the tabulated temperature closest to the material temperature.
    Nearest,
    /// Sample stochastically between the two bracketing temperatures with
    /// probability proportional to proximity. No physical averaging happens
    /// at runtime; the estimator is unbiased over many histories.
    Interpolation,
}

/// Settings consumed by the evaluation core.
///
/// Owned by the driver and passed by reference into every evaluation call;
/// nothing here is global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Temperature treatment for tabulated and S(a,b) data.
    pub temperature_method: TemperatureMethod,
    /// Tolerance in kelvin for the nearest-temperature S(a,b) search.
    pub temperature_tolerance: f64,
    /// Sample unresolved-resonance probability tables when a nuclide has them.
    pub urr_ptables: bool,
    /// Evaluate the six depletion reaction channels alongside the summed ones.
    pub need_depletion_rx: bool,
    /// Lower bound of the neutron energy range in eV; origin of the shared
    /// logarithmic lattice.
    pub energy_min_neutron: f64,
    /// Upper bound of the neutron energy range in eV.
    pub energy_max_neutron: f64,
    /// Number of equal-lethargy bins in the shared logarithmic lattice.
    pub n_log_bins: usize,
}

impl Settings {
    /// Width of one logarithmic-lattice bin in lethargy.
    pub fn log_spacing(&self) -> f64 {
        (self.energy_max_neutron / self.energy_min_neutron).ln() / self.n_log_bins as f64
    }

    /// Bucket index of `energy` on the shared logarithmic lattice, clamped to
    /// the lattice range.
    pub fn log_grid_index(&self, energy: f64) -> usize {
        let i = ((energy / self.energy_min_neutron).ln() / self.log_spacing()) as usize;
        i.min(self.n_log_bins - 1)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            temperature_method: TemperatureMethod::Nearest,
            temperature_tolerance: 10.0,
            urr_ptables: true,
            need_depletion_rx: false,
            energy_min_neutron: 1e-5,
            energy_max_neutron: 2e7,
            n_log_bins: 8000,
        }
    }
}
