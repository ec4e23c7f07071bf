// S(alpha,beta) thermal scattering tables.
//
// Below a few eV the free-atom scattering model breaks down for bound
// moderators; these tables replace the free-atom elastic and add a thermal
// inelastic channel. Coherent scatterers (crystalline moderators) carry
// Bragg-edge data evaluated as P(E)/E; incoherent scatterers tabulate the
// cross section directly.

use serde::{Deserialize, Serialize};

use crate::constants::{K_BOLTZMANN, SAB_ELASTIC_EXACT, SAB_ELASTIC_INCOHERENT};
use crate::rng::PrnStream;
use crate::settings::{Settings, TemperatureMethod};
use crate::utilities::lower_bound_index;

/// Treatment of the thermal elastic channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum SabElasticMode {
    /// Coherent elastic with exact Bragg edges; the table stores the
    /// cumulative structure factor P and the cross section is P/E.
    CoherentExact,
    /// Incoherent approximation; the table stores the cross section itself.
    Incoherent,
}

impl TryFrom<i32> for SabElasticMode {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            SAB_ELASTIC_EXACT => Ok(SabElasticMode::CoherentExact),
            SAB_ELASTIC_INCOHERENT => Ok(SabElasticMode::Incoherent),
            other => Err(format!("Unknown S(a,b) elastic mode id {}", other)),
        }
    }
}

impl From<SabElasticMode> for i32 {
    fn from(value: SabElasticMode) -> Self {
        match value {
            SabElasticMode::CoherentExact => SAB_ELASTIC_EXACT,
            SabElasticMode::Incoherent => SAB_ELASTIC_INCOHERENT,
        }
    }
}

/// S(alpha,beta) data at a single temperature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermalData {
    pub elastic_mode: SabElasticMode,
    /// Upper energy of the thermal inelastic channel, in eV.
    pub threshold_inelastic: f64,
    /// Upper energy of the thermal elastic channel, in eV (zero when the
    /// table has no elastic part).
    pub threshold_elastic: f64,
    /// Incident energy grid of the inelastic channel.
    pub inelastic_energy: Vec<f64>,
    /// Inelastic cross section on that grid.
    pub inelastic_xs: Vec<f64>,
    /// Incident energy grid of the elastic channel (Bragg edges for
    /// coherent scatterers).
    pub elastic_energy: Vec<f64>,
    /// Elastic data on that grid: cumulative P for coherent tables, the
    /// cross section itself for incoherent ones.
    pub elastic_p: Vec<f64>,
}

impl ThermalData {
    /// Thermal (elastic, inelastic) cross sections at energy `e`.
    pub fn calculate_xs(&self, e: f64) -> (f64, f64) {
        let inelastic = match self.inelastic_energy.len() {
            0 => 0.0,
            1 => self.inelastic_xs[0],
            _ => {
                if e < self.inelastic_energy[0] {
                    // Below the grid: clamp to the first point
                    self.inelastic_xs[0]
                } else {
                    let i = lower_bound_index(&self.inelastic_energy, e);
                    let f = (e - self.inelastic_energy[i])
                        / (self.inelastic_energy[i + 1] - self.inelastic_energy[i]);
                    (1.0 - f) * self.inelastic_xs[i] + f * self.inelastic_xs[i + 1]
                }
            }
        };

        let elastic = if e < self.threshold_elastic && !self.elastic_energy.is_empty() {
            match self.elastic_mode {
                SabElasticMode::CoherentExact => {
                    if e < self.elastic_energy[0] {
                        // Below the lowest Bragg edge no coherent
                        // scattering is possible
                        0.0
                    } else if self.elastic_energy.len() == 1 {
                        self.elastic_p[0] / e
                    } else {
                        let i = lower_bound_index(&self.elastic_energy, e);
                        self.elastic_p[i] / e
                    }
                }
                SabElasticMode::Incoherent => {
                    if e < self.elastic_energy[0] || self.elastic_energy.len() == 1 {
                        self.elastic_p[0]
                    } else {
                        let i = lower_bound_index(&self.elastic_energy, e);
                        let f = (e - self.elastic_energy[i])
                            / (self.elastic_energy[i + 1] - self.elastic_energy[i]);
                        (1.0 - f) * self.elastic_p[i] + f * self.elastic_p[i + 1]
                    }
                }
            }
        } else {
            0.0
        };

        (elastic, inelastic)
    }
}

/// An S(alpha,beta) table: ascending temperatures plus the data at each.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermalScattering {
    /// Name of the bound scatterer (e.g. "c_H_in_H2O").
    pub name: Option<String>,
    /// kT values in eV, ascending, one per entry of `data`.
    pub kts: Vec<f64>,
    /// Per-temperature tables.
    pub data: Vec<ThermalData>,
}

impl ThermalScattering {
    /// Upper energy below which this table applies (the inelastic
    /// threshold of the first temperature).
    pub fn threshold(&self) -> f64 {
        self.data.first().map_or(0.0, |d| d.threshold_inelastic)
    }

    /// Deserialize a table from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Error parsing S(a,b) table: {}", e))
    }

    /// Select a temperature and evaluate the thermal (elastic, inelastic)
    /// pair at energy `e`. Returns the chosen temperature index so the
    /// caller can record it in the cache.
    pub fn calculate_xs(
        &self,
        e: f64,
        sqrt_kt: f64,
        streams: &mut PrnStream,
        settings: &Settings,
    ) -> (usize, f64, f64) {
        let kt = sqrt_kt * sqrt_kt;
        let n = self.kts.len();
        let i_temp = match settings.temperature_method {
            TemperatureMethod::Nearest => {
                // Linear scan for a temperature within tolerance
                let tol = K_BOLTZMANN * settings.temperature_tolerance;
                let mut i = 0;
                while i + 1 < n && (self.kts[i] - kt).abs() >= tol {
                    i += 1;
                }
                i
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
        };

        let (elastic, inelastic) = self.data[i_temp].calculate_xs(e);
        (i_temp, elastic, inelastic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coherent_table() -> ThermalData {
        ThermalData {
            elastic_mode: SabElasticMode::CoherentExact,
            threshold_inelastic: 5.0,
            threshold_elastic: 4.0,
            inelastic_energy: vec![1e-5, 1.0, 5.0],
            inelastic_xs: vec![20.0, 10.0, 2.0],
            // Bragg edges
            elastic_energy: vec![2e-3, 4e-3, 8e-3],
            elastic_p: vec![0.6, 1.1, 1.5],
        }
    }

    #[test]
    fn test_coherent_below_first_bragg_edge() {
        let data = coherent_table();
        let (elastic, _) = data.calculate_xs(1e-3);
        assert_eq!(elastic, 0.0);
    }

    #[test]
    fn test_coherent_between_edges_is_p_over_e() {
        let data = coherent_table();
        let e = 5e-3;
        let (elastic, _) = data.calculate_xs(e);
        // Between the second and third edges: P = 1.1, no interpolation
        assert!((elastic - 1.1 / e).abs() < 1e-12);
    }

    #[test]
    fn test_elastic_above_threshold_is_zero() {
        let data = coherent_table();
        let (elastic, inelastic) = data.calculate_xs(4.5);
        assert_eq!(elastic, 0.0);
        assert!(inelastic > 0.0);
    }

    #[test]
    fn test_incoherent_interpolates() {
        let mut data = coherent_table();
        data.elastic_mode = SabElasticMode::Incoherent;
        data.elastic_energy = vec![1e-3, 3e-3];
        data.elastic_p = vec![2.0, 4.0];
        let (elastic, _) = data.calculate_xs(2e-3);
        assert!((elastic - 3.0).abs() < 1e-12);
        // Below the grid: saturate to the first value
        let (elastic, _) = data.calculate_xs(1e-4);
        assert!((elastic - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_inelastic_clamps_below_grid() {
        let data = coherent_table();
        let (_, inelastic) = data.calculate_xs(1e-6);
        assert_eq!(inelastic, 20.0);
    }

    #[test]
    fn test_temperature_selection_nearest() {
        let table = ThermalScattering {
            name: Some("c_Graphite".to_string()),
            kts: vec![0.0253, 0.0500],
            data: vec![coherent_table(), coherent_table()],
        };
        let settings = Settings::default();
        let mut streams = PrnStream::new(1);
        // kT within tolerance of the second temperature
        let sqrt_kt = 0.0500_f64.sqrt();
        let (i_temp, _, _) = table.calculate_xs(1e-3, sqrt_kt, &mut streams, &settings);
        assert_eq!(i_temp, 1);
    }

    #[test]
    fn test_temperature_selection_interpolation_brackets() {
        let table = ThermalScattering {
            name: None,
            kts: vec![0.02, 0.04],
            data: vec![coherent_table(), coherent_table()],
        };
        let settings = Settings {
            temperature_method: TemperatureMethod::Interpolation,
            ..Settings::default()
        };
        let mut streams = PrnStream::new(7);
        // Exactly at the lower temperature: f = 0, always the lower index
        let (i_temp, _, _) = table.calculate_xs(1e-3, 0.02_f64.sqrt(), &mut streams, &settings);
        assert_eq!(i_temp, 0);
        // Above the top temperature: clamp to the last index
        let (i_temp, _, _) = table.calculate_xs(1e-3, 0.08_f64.sqrt(), &mut streams, &settings);
        assert_eq!(i_temp, 1);
    }

    #[test]
    fn test_json_roundtrip() {
        let table = ThermalScattering {
            name: Some("c_H_in_H2O".to_string()),
            kts: vec![0.0253],
            data: vec![coherent_table()],
        };
        let json = serde_json::to_string(&table).unwrap();
        let back = ThermalScattering::from_json_str(&json).unwrap();
        assert_eq!(back.kts, table.kts);
        assert_eq!(back.data[0].elastic_mode, SabElasticMode::CoherentExact);
        assert_eq!(back.threshold(), 5.0);
    }
}
