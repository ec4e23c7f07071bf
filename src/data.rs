// Owned store of loaded nuclear data.
//
// Nuclides and thermal scattering tables are loaded once, wrapped in `Arc`,
// and shared read-only with every transport thread. Materials and particle
// caches refer to them by slot index. Keeping the store an owned value
// (rather than a process-wide global) lets each driver decide its own
// sharing and lifetime.

use std::sync::Arc;

use crate::nuclide::Nuclide;
use crate::sab::ThermalScattering;

/// The loaded nuclear data consumed by the evaluation core.
#[derive(Debug, Clone, Default)]
pub struct NuclearData {
    /// Loaded nuclides, indexed by slot.
    pub nuclides: Vec<Arc<Nuclide>>,
    /// Loaded thermal scattering tables, indexed by slot.
    pub thermal_scatt: Vec<Arc<ThermalScattering>>,
}

impl NuclearData {
    pub fn new() -> Self {
        NuclearData::default()
    }

    /// Register a nuclide, assigning its slot. The slot doubles as the key
    /// for the nuclide's dedicated URR random-stream lookups, so it must be
    /// stable for the lifetime of the store.
    pub fn add_nuclide(&mut self, mut nuclide: Nuclide) -> usize {
        let slot = self.nuclides.len();
        nuclide.index = slot;
        self.nuclides.push(Arc::new(nuclide));
        slot
    }

    /// Register a thermal scattering table, returning its slot.
    pub fn add_thermal_scattering(&mut self, table: ThermalScattering) -> usize {
        let slot = self.thermal_scatt.len();
        self.thermal_scatt.push(Arc::new(table));
        slot
    }

    /// Find a nuclide slot by name.
    pub fn nuclide_slot(&self, name: &str) -> Option<usize> {
        self.nuclides
            .iter()
            .position(|n| n.name.as_deref() == Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nuclide::{EnergyGrid, XsSet};
    use crate::settings::Settings;
    use std::collections::HashMap;

    fn stub_nuclide(name: &str) -> Nuclide {
        let settings = Settings::default();
        Nuclide {
            name: Some(name.to_string()),
            atomic_weight_ratio: Some(1.0),
            fissionable: false,
            kts: vec![0.0253],
            grid: vec![EnergyGrid::new(vec![1e-5, 2e7], &settings)],
            xs: vec![XsSet {
                total: vec![1.0, 1.0],
                absorption: vec![0.1, 0.1],
                fission: Vec::new(),
                nu_fission: Vec::new(),
            }],
            reactions: Vec::new(),
            reaction_index: HashMap::new(),
            energy_0k: Vec::new(),
            elastic_0k: Vec::new(),
            urr: None,
            multipole: None,
            total_nu: None,
            delayed_nu: None,
            index: 0,
        }
    }

    #[test]
    fn test_slots_are_assigned_in_order() {
        let mut data = NuclearData::new();
        let a = data.add_nuclide(stub_nuclide("H1"));
        let b = data.add_nuclide(stub_nuclide("O16"));
        assert_eq!((a, b), (0, 1));
        assert_eq!(data.nuclides[1].index, 1);
        assert_eq!(data.nuclide_slot("O16"), Some(1));
        assert_eq!(data.nuclide_slot("Fe56"), None);
    }
}
