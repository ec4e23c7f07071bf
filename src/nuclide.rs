// Per-nuclide cross section data and evaluation.
//
// A Nuclide is immutable once loaded and shared read-only between transport
// threads. Evaluation writes only the caller's per-particle cache entry.
// The dispatcher prefers the windowed multipole representation inside its
// energy range and falls back to the tabulated point-wise data elsewhere,
// then layers S(a,b) thermal scattering and unresolved-resonance sampling
// on top as the material and settings demand.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::{
    DEPLETION_RX, DEPLETION_RX_N_GAMMA, MT_ELASTIC, URR_ELASTIC, URR_FISSION, URR_N_GAMMA,
};
use crate::multipole::WindowedMultipole;
use crate::particle::MicroXs;
use crate::rng::{PrnStream, STREAM_URR_PTABLE};
use crate::sab::ThermalScattering;
use crate::settings::{Settings, TemperatureMethod};
use crate::urr::{UrrData, UrrInterpolation};
use crate::utilities::{interpolate_linear, lower_bound_index};

/// Fission neutron emission category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmissionMode {
    Total,
    Prompt,
    Delayed,
}

/// Representation of nu-bar, the mean neutron yield per fission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum NuFunction {
    /// Polynomial in energy, coefficients in ascending order.
    Polynomial { coefficients: Vec<f64> },
    /// Tabulated yield, linearly interpolated in energy.
    Tabulated { energy: Vec<f64>, value: Vec<f64> },
}

impl NuFunction {
    pub fn evaluate(&self, e: f64) -> f64 {
        match self {
            NuFunction::Polynomial { coefficients } => {
                coefficients.iter().rev().fold(0.0, |acc, &c| acc * e + c)
            }
            NuFunction::Tabulated { energy, value } => interpolate_linear(energy, value, e),
        }
    }
}

/// Energy grid at one temperature, with its map from the shared logarithmic
/// lattice onto this grid.
///
/// `grid_index[k]` brackets lattice point k from below, so a lookup inside
/// lattice bucket k only needs a binary search over
/// `energy[grid_index[k] ..= grid_index[k + 1] + 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyGrid {
    /// Energy points in eV, ascending.
    pub energy: Vec<f64>,
    /// Lattice-bucket to grid-index map, `n_log_bins + 1` entries.
    pub grid_index: Vec<usize>,
}

impl EnergyGrid {
    /// Build the lattice map for `energy` against the lattice described by
    /// `settings`. Every temperature of a nuclide is mapped against the
    /// same lattice, so a stochastic temperature switch never changes the
    /// lattice being consulted.
    pub fn new(energy: Vec<f64>, settings: &Settings) -> Self {
        let m = settings.n_log_bins;
        let spacing = settings.log_spacing();
        let log_e_min = settings.energy_min_neutron.ln();
        let mut grid_index = vec![0usize; m + 1];
        let mut j = 0usize;
        for (k, slot) in grid_index.iter_mut().enumerate() {
            let e_lattice = (log_e_min + k as f64 * spacing).exp();
            while j + 1 < energy.len() - 1 && energy[j + 1] < e_lattice {
                j += 1;
            }
            *slot = j;
        }
        Self { energy, grid_index }
    }
}

/// Summed cross sections at one temperature, aligned with that
/// temperature's energy grid. Fission channels are empty for
/// non-fissionable nuclides and must not be consulted then.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XsSet {
    pub total: Vec<f64>,
    pub absorption: Vec<f64>,
    #[serde(default)]
    pub fission: Vec<f64>,
    #[serde(default)]
    pub nu_fission: Vec<f64>,
}

/// Cross section of one reaction channel at one temperature. The value
/// array starts at `threshold` on the parent energy grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionXs {
    pub threshold: usize,
    pub value: Vec<f64>,
}

/// A reaction channel identified by its ENDF/MT number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub mt: i32,
    #[serde(default)]
    pub q_value: f64,
    /// Per-temperature thresholded cross sections.
    pub xs: Vec<ReactionXs>,
}

impl Reaction {
    /// Interpolate this reaction at a grid interval already located on the
    /// parent grid. `None` when the interval lies below the reaction
    /// threshold (or past the tabulated values).
    pub fn xs_at(&self, i_temp: usize, i_grid: usize, f: f64) -> Option<f64> {
        let rx = &self.xs[i_temp];
        if i_grid < rx.threshold {
            return None;
        }
        let k = i_grid - rx.threshold;
        if k + 1 >= rx.value.len() {
            return None;
        }
        Some((1.0 - f) * rx.value[k] + f * rx.value[k + 1])
    }
}

/// Core data model for a single nuclide: point-wise cross sections at one
/// or more temperatures, optional windowed multipole and unresolved
/// resonance representations, and fission yield data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nuclide {
    /// Canonical nuclide name (e.g. "U238").
    pub name: Option<String>,
    /// Atomic weight ratio (target mass / neutron mass).
    pub atomic_weight_ratio: Option<f64>,
    /// True if any fission channel is present.
    pub fissionable: bool,
    /// kT values in eV, ascending, one per loaded temperature.
    pub kts: Vec<f64>,
    /// Per-temperature energy grids with their lattice maps.
    pub grid: Vec<EnergyGrid>,
    /// Per-temperature summed cross sections.
    pub xs: Vec<XsSet>,
    /// Reaction channels.
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    /// MT number -> index into `reactions`.
    #[serde(skip, default)]
    pub reaction_index: HashMap<i32, usize>,
    /// 0 K elastic grid for resonance upscattering.
    #[serde(default)]
    pub energy_0k: Vec<f64>,
    /// 0 K elastic cross section on that grid.
    #[serde(default)]
    pub elastic_0k: Vec<f64>,
    /// Unresolved-resonance probability tables, one per temperature.
    #[serde(default)]
    pub urr: Option<Vec<UrrData>>,
    /// Windowed multipole representation.
    #[serde(default)]
    pub multipole: Option<WindowedMultipole>,
    /// Total nu-bar.
    #[serde(default)]
    pub total_nu: Option<NuFunction>,
    /// Delayed nu-bar.
    #[serde(default)]
    pub delayed_nu: Option<NuFunction>,
    /// Slot in the nuclide store; assigned on registration.
    #[serde(skip, default)]
    pub index: usize,
}

impl Nuclide {
    /// Deserialize a nuclide from a JSON string and rebuild the derived
    /// reaction index.
    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let mut nuclide: Nuclide =
            serde_json::from_str(json).map_err(|e| format!("Error parsing nuclide: {}", e))?;
        nuclide.rebuild_reaction_index();
        Ok(nuclide)
    }

    /// Rebuild the MT lookup after constructing or mutating `reactions`.
    pub fn rebuild_reaction_index(&mut self) {
        self.reaction_index = self
            .reactions
            .iter()
            .enumerate()
            .map(|(i, rx)| (rx.mt, i))
            .collect();
    }

    /// Mean neutron yield per fission at energy `e`. Zero for
    /// non-fissionable nuclides in every mode.
    pub fn nu(&self, e: f64, mode: EmissionMode) -> f64 {
        if !self.fissionable {
            return 0.0;
        }
        match mode {
            EmissionMode::Total => self.total_nu.as_ref().map_or(0.0, |nu| nu.evaluate(e)),
            EmissionMode::Delayed => self.delayed_nu.as_ref().map_or(0.0, |nu| nu.evaluate(e)),
            EmissionMode::Prompt => {
                self.nu(e, EmissionMode::Total) - self.nu(e, EmissionMode::Delayed)
            }
        }
    }

    /// Elastic cross section on the 0 K grid, for resonance-scattering
    /// sampling. Clamps to the terminal intervals outside the grid.
    pub fn elastic_xs_0k(&self, e: f64) -> f64 {
        let n = self.energy_0k.len();
        if n == 0 {
            return 0.0;
        }
        if n == 1 {
            return self.elastic_0k[0];
        }
        let mut i = if e < self.energy_0k[0] {
            0
        } else if e > self.energy_0k[n - 1] {
            n - 2
        } else {
            lower_bound_index(&self.energy_0k, e)
        };
        // Rare case of coincident grid points
        if self.energy_0k[i] == self.energy_0k[i + 1] && i + 2 < n {
            i += 1;
        }
        let f = (e - self.energy_0k[i]) / (self.energy_0k[i + 1] - self.energy_0k[i]);
        (1.0 - f) * self.elastic_0k[i] + f * self.elastic_0k[i + 1]
    }

    /// Free-atom elastic cross section at the cache entry's phase-space
    /// point, materializing it into the entry on first demand. On the
    /// tabulated path this interpolates the elastic reaction at the cached
    /// interval; on the multipole path elastic is whatever the total
    /// leaves after absorption.
    pub fn free_atom_elastic(&self, micro: &mut MicroXs) -> f64 {
        if let Some(v) = micro.elastic {
            return v;
        }
        let v = match micro.index_temp {
            Some(i_temp) => match self.reaction_index.get(&MT_ELASTIC) {
                Some(&i_rx) => self.reactions[i_rx]
                    .xs_at(i_temp, micro.index_grid, micro.interp_factor)
                    .unwrap_or(0.0),
                None => 0.0,
            },
            None => micro.total - micro.absorption,
        };
        micro.elastic = Some(v);
        v
    }

    /// Choose the temperature index for kT according to the configured
    /// treatment. Interpolation draws one sample from the active stream
    /// when kT lies strictly between two tabulated temperatures.
    fn temperature_index(&self, kt: f64, streams: &mut PrnStream, settings: &Settings) -> usize {
        let n = self.kts.len();
        match settings.temperature_method {
            TemperatureMethod::Nearest => {
                let mut best = f64::INFINITY;
                let mut i_temp = 0;
                for (i, &t) in self.kts.iter().enumerate() {
                    let diff = (t - kt).abs();
                    if diff < best {
                        best = diff;
                        i_temp = i;
                    }
                }
                i_temp
            }
            TemperatureMethod::Interpolation => {
                if n == 1 || kt < self.kts[0] {
                    0
                } else if kt >= self.kts[n - 1] {
                    n - 1
                } else {
                    let i = lower_bound_index(&self.kts, kt);
                    let f = (kt - self.kts[i]) / (self.kts[i + 1] - self.kts[i]);
                    if f > streams.prn() {
                        i + 1
                    } else {
                        i
                    }
                }
            }
        }
    }

    /// Locate the interval holding `e` on the energy grid of temperature
    /// `i_temp`, using the shared logarithmic lattice to bound the binary
    /// search. Returns the interval index and interpolation factor;
    /// energies outside the grid clamp to the terminal intervals.
    fn grid_search(&self, i_temp: usize, e: f64, i_log_union: usize) -> (usize, f64) {
        let grid = &self.grid[i_temp];
        let energy = &grid.energy;
        let n = energy.len();
        let mut i_grid = if e < energy[0] {
            0
        } else if e > energy[n - 1] {
            n - 2
        } else {
            let i_low = grid.grid_index[i_log_union];
            let i_high = (grid.grid_index[i_log_union + 1] + 1).min(n - 1);
            i_low + lower_bound_index(&energy[i_low..=i_high], e)
        };
        // Rare case of coincident grid points
        if energy[i_grid] == energy[i_grid + 1] && i_grid + 2 < n {
            i_grid += 1;
        }
        let f = (e - energy[i_grid]) / (energy[i_grid + 1] - energy[i_grid]);
        (i_grid, f)
    }

    /// Evaluate this nuclide's microscopic cross sections at (`e`,
    /// `sqrt_kt`) into the particle's cache entry.
    ///
    /// `sab` carries the thermal scattering assignment from the material
    /// (table slot, table, fraction) when the nuclide is bound below the
    /// table threshold. `i_log_union` is the shared lattice bucket computed
    /// once per material lookup.
    #[allow(clippy::too_many_arguments)]
    pub fn calculate_xs(
        &self,
        micro: &mut MicroXs,
        e: f64,
        sqrt_kt: f64,
        i_log_union: usize,
        sab: Option<(usize, &ThermalScattering, f64)>,
        streams: &mut PrnStream,
        settings: &Settings,
    ) {
        micro.elastic = None;
        micro.thermal = 0.0;
        micro.thermal_elastic = 0.0;

        let multipole = self
            .multipole
            .as_ref()
            .filter(|wmp| wmp.contains(e));

        if let Some(wmp) = multipole {
            let (sig_t, sig_a, sig_f) = wmp.evaluate(e, sqrt_kt);
            micro.total = sig_t;
            micro.absorption = sig_a;
            micro.fission = sig_f;
            micro.nu_fission = if self.fissionable {
                sig_f * self.nu(e, EmissionMode::Total)
            } else {
                0.0
            };
            if settings.need_depletion_rx {
                // (n,gamma) is the only depletion channel the pole
                // representation can reconstruct
                micro.reaction = [0.0; DEPLETION_RX.len()];
                micro.reaction[DEPLETION_RX_N_GAMMA] = sig_a - sig_f;
            }
            // No grid interval exists on this path; tabulated accessors key
            // off index_temp being None and must not read these fields.
            micro.index_temp = None;
            micro.index_grid = 0;
            micro.interp_factor = 0.0;
        } else {
            let i_temp = self.temperature_index(sqrt_kt * sqrt_kt, streams, settings);
            let (i_grid, f) = self.grid_search(i_temp, e, i_log_union);
            let xs = &self.xs[i_temp];

            micro.index_temp = Some(i_temp);
            micro.index_grid = i_grid;
            micro.interp_factor = f;

            micro.total = (1.0 - f) * xs.total[i_grid] + f * xs.total[i_grid + 1];
            micro.absorption =
                (1.0 - f) * xs.absorption[i_grid] + f * xs.absorption[i_grid + 1];
            if self.fissionable {
                micro.fission = (1.0 - f) * xs.fission[i_grid] + f * xs.fission[i_grid + 1];
                micro.nu_fission =
                    (1.0 - f) * xs.nu_fission[i_grid] + f * xs.nu_fission[i_grid + 1];
            } else {
                micro.fission = 0.0;
                micro.nu_fission = 0.0;
            }

            if settings.need_depletion_rx {
                for (j, mt) in DEPLETION_RX.iter().enumerate() {
                    micro.reaction[j] = match self.reaction_index.get(mt) {
                        Some(&i_rx) => self.reactions[i_rx]
                            .xs_at(i_temp, i_grid, f)
                            .unwrap_or(0.0),
                        None => 0.0,
                    };
                }
            }
        }

        micro.index_sab = None;
        micro.sab_frac = 0.0;
        micro.use_ptable = false;

        if let Some((i_sab, table, sab_frac)) = sab {
            self.calculate_sab_xs(micro, e, sqrt_kt, i_sab, sab_frac, table, streams, settings);
        }

        if settings.urr_ptables {
            if let (Some(urr_tables), Some(i_temp)) = (self.urr.as_ref(), micro.index_temp) {
                let urr = &urr_tables[i_temp];
                if urr.contains(e) {
                    self.calculate_urr_xs(micro, urr, i_temp, e, streams);
                }
            }
        }

        micro.last_e = e;
        micro.last_sqrt_kt = sqrt_kt;
    }

    /// Apply an S(a,b) table to the cache entry: evaluate the thermal
    /// channels, swap the bound fraction of the free-atom elastic for the
    /// thermal cross section, and rewrite total and elastic accordingly.
    #[allow(clippy::too_many_arguments)]
    fn calculate_sab_xs(
        &self,
        micro: &mut MicroXs,
        e: f64,
        sqrt_kt: f64,
        i_sab: usize,
        sab_frac: f64,
        table: &ThermalScattering,
        streams: &mut PrnStream,
        settings: &Settings,
    ) {
        micro.index_sab = Some(i_sab);

        let (i_temp_sab, elastic_sab, inelastic) =
            table.calculate_xs(e, sqrt_kt, streams, settings);
        let elastic_free = self.free_atom_elastic(micro);

        micro.thermal = sab_frac * (elastic_sab + inelastic);
        micro.thermal_elastic = sab_frac * elastic_sab;
        micro.total += micro.thermal - sab_frac * elastic_free;
        micro.elastic = Some(micro.thermal + (1.0 - sab_frac) * elastic_free);

        micro.index_temp_sab = Some(i_temp_sab);
        micro.sab_frac = sab_frac;
    }

    /// Sample a probability-table band and replace the smooth cross
    /// sections of the cache entry with the sampled ones.
    ///
    /// The band draw peeks at the dedicated URR stream keyed by this
    /// nuclide's slot without advancing it, so two lookups for the same
    /// nuclide at the same collision (e.g. at different temperatures of a
    /// multi-temperature material) see the same random value and stay
    /// correlated.
    fn calculate_urr_xs(
        &self,
        micro: &mut MicroXs,
        urr: &UrrData,
        i_temp: usize,
        e: f64,
        streams: &mut PrnStream,
    ) {
        micro.use_ptable = true;

        let (i_energy, mut f) = urr.energy_row(e);

        let prev_stream = streams.stream();
        streams.set_stream(STREAM_URR_PTABLE);
        let r = streams.future_prn(self.index as u64);
        streams.set_stream(prev_stream);

        let band_low = urr.sample_band(i_energy, r);
        let band_up = urr.sample_band(i_energy + 1, r);

        if urr.interp == UrrInterpolation::LogLog {
            f = urr.log_factor(i_energy, e);
        }
        let mut elastic = urr.interpolate_channel(URR_ELASTIC, i_energy, band_low, band_up, f);
        let mut fission = if self.fissionable {
            urr.interpolate_channel(URR_FISSION, i_energy, band_low, band_up, f)
        } else {
            0.0
        };
        let mut capture = urr.interpolate_channel(URR_N_GAMMA, i_energy, band_low, band_up, f);

        // Smooth inelastic contribution from the designated reaction,
        // reusing the grid interval cached by the tabulated branch.
        let mut inelastic = 0.0;
        if urr.inelastic_flag > 0 {
            if let Some(&i_rx) = self.reaction_index.get(&urr.inelastic_flag) {
                inelastic = self.reactions[i_rx]
                    .xs_at(i_temp, micro.index_grid, micro.interp_factor)
                    .unwrap_or(0.0);
            }
        }

        if urr.multiply_smooth {
            let elastic_free = self.free_atom_elastic(micro);
            elastic *= elastic_free;
            capture *= micro.absorption - micro.fission;
            fission *= micro.fission;
        }

        // Negative values can fall out of the interpolation; clip them
        if elastic < 0.0 {
            elastic = 0.0;
        }
        if fission < 0.0 {
            fission = 0.0;
        }
        if capture < 0.0 {
            capture = 0.0;
        }

        micro.elastic = Some(elastic);
        micro.fission = fission;
        micro.absorption = capture + fission;
        // The total is reconstructed from the sampled channels, never taken
        // from the table
        micro.total = elastic + inelastic + capture + fission;
        micro.nu_fission = if self.fissionable {
            self.nu(e, EmissionMode::Total) * fission
        } else {
            0.0
        };
    }
}
