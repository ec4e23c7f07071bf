// Material composition and the macroscopic cross section driver.
//
// A material references nuclides by slot in the shared nuclear data store
// and carries one atom density per slot. Thermal scattering assignments
// live in companion arrays sorted by nuclide position, so the evaluation
// loop can merge them in a single pass.

use serde::{Deserialize, Serialize};

use crate::data::NuclearData;
use crate::particle::{MacroXs, Particle};
use crate::settings::Settings;

/// A homogeneous material: nuclide slots, atom densities, and thermal
/// scattering assignments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Material {
    /// Optional name of the material
    pub name: Option<String>,
    /// Unique identifier for the material
    pub id: Option<u32>,
    /// Slots into the nuclide store, one per constituent.
    pub nuclide: Vec<usize>,
    /// Atom density of each constituent in atoms/b-cm.
    pub atom_density: Vec<f64>,
    /// Positions within `nuclide` that have a thermal scattering table,
    /// strictly ascending.
    pub i_sab_nuclides: Vec<usize>,
    /// Thermal scattering table slot for each entry of `i_sab_nuclides`.
    pub i_sab_tables: Vec<usize>,
    /// Fraction of the nuclide bound in the thermal scatterer, aligned with
    /// `i_sab_nuclides`.
    pub sab_fracs: Vec<f64>,
}

impl Material {
    pub fn new() -> Self {
        Material::default()
    }

    /// Append a constituent nuclide with its atom density in atoms/b-cm.
    pub fn add_nuclide(&mut self, slot: usize, atom_density: f64) -> Result<(), String> {
        if atom_density < 0.0 {
            return Err(String::from("Atom density cannot be negative"));
        }
        self.nuclide.push(slot);
        self.atom_density.push(atom_density);
        Ok(())
    }

    /// Assign a thermal scattering table to the constituent at `position`
    /// (an index into this material's nuclide list). Assignments must be
    /// added in ascending position order so the evaluation loop can merge
    /// them in one pass.
    pub fn assign_sab(
        &mut self,
        position: usize,
        table_slot: usize,
        frac: f64,
    ) -> Result<(), String> {
        if position >= self.nuclide.len() {
            return Err(format!(
                "S(a,b) assignment position {} out of range for {} nuclides",
                position,
                self.nuclide.len()
            ));
        }
        if let Some(&last) = self.i_sab_nuclides.last() {
            if position <= last {
                return Err(String::from(
                    "S(a,b) assignments must be in ascending nuclide order",
                ));
            }
        }
        self.i_sab_nuclides.push(position);
        self.i_sab_tables.push(table_slot);
        self.sab_fracs.push(frac);
        Ok(())
    }

    /// True when the material has no constituents (a void region).
    pub fn is_void(&self) -> bool {
        self.nuclide.is_empty()
    }

    /// Evaluate the macroscopic cross sections of this material at the
    /// particle's energy and temperature.
    ///
    /// Walks the constituents, re-evaluating each nuclide's microscopic
    /// entry only when its cache key `(E, sqrt(kT), S(a,b) slot, S(a,b)
    /// fraction)` differs from the lookup, and accumulates the
    /// atom-density-weighted sums into the particle's material cache.
    pub fn calculate_xs(&self, p: &mut Particle, data: &NuclearData, settings: &Settings) {
        p.macro_xs = MacroXs::default();
        if self.is_void() {
            return;
        }
        p.resize_xs_cache(data.nuclides.len());

        let e = p.energy;
        let sqrt_kt = p.sqrt_kt;
        // Shared logarithmic lattice bucket, computed once per material
        let i_log_union = settings.log_grid_index(e);

        // Cursor into the sorted S(a,b) companion arrays
        let mut j = 0;
        for (i, &i_nuclide) in self.nuclide.iter().enumerate() {
            let mut i_sab = None;
            let mut sab_frac = 0.0;
            if j < self.i_sab_nuclides.len() && i == self.i_sab_nuclides[j] {
                let table_slot = self.i_sab_tables[j];
                // Above the table's inelastic threshold the bound model no
                // longer applies; fall back to the free-atom treatment
                if e <= data.thermal_scatt[table_slot].threshold() {
                    i_sab = Some(table_slot);
                    sab_frac = self.sab_fracs[j];
                }
                j += 1;
            }

            let nuclide = &data.nuclides[i_nuclide];
            let micro = &mut p.micro_xs[i_nuclide];
            if e != micro.last_e
                || sqrt_kt != micro.last_sqrt_kt
                || i_sab != micro.index_sab
                || sab_frac != micro.sab_frac
            {
                let sab = i_sab.map(|slot| (slot, &*data.thermal_scatt[slot], sab_frac));
                nuclide.calculate_xs(
                    micro,
                    e,
                    sqrt_kt,
                    i_log_union,
                    sab,
                    &mut p.streams,
                    settings,
                );
            }

            let rho = self.atom_density[i];
            let micro = &p.micro_xs[i_nuclide];
            p.macro_xs.total += rho * micro.total;
            p.macro_xs.absorption += rho * micro.absorption;
            p.macro_xs.fission += rho * micro.fission;
            p.macro_xs.nu_fission += rho * micro.nu_fission;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_nuclide_rejects_negative_density() {
        let mut material = Material::new();
        assert!(material.add_nuclide(0, -1.0).is_err());
        assert!(material.add_nuclide(0, 0.05).is_ok());
        assert_eq!(material.nuclide, vec![0]);
    }

    #[test]
    fn test_assign_sab_enforces_order() {
        let mut material = Material::new();
        material.add_nuclide(0, 1.0).unwrap();
        material.add_nuclide(1, 1.0).unwrap();
        material.add_nuclide(2, 1.0).unwrap();
        assert!(material.assign_sab(1, 0, 1.0).is_ok());
        // Same or earlier position must be rejected
        assert!(material.assign_sab(1, 0, 1.0).is_err());
        assert!(material.assign_sab(0, 0, 1.0).is_err());
        assert!(material.assign_sab(2, 0, 0.5).is_ok());
        // Out-of-range position
        assert!(material.assign_sab(9, 0, 1.0).is_err());
    }

    #[test]
    fn test_void_material() {
        let material = Material::new();
        assert!(material.is_void());
    }
}
