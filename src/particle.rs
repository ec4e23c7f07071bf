// Particle state consumed by the cross section core, including the
// per-particle evaluation caches. Each transport thread owns its particles
// outright, so nothing here needs synchronization.

use serde::{Deserialize, Serialize};

use crate::constants::DEPLETION_RX;
use crate::rng::{PrnStream, DEFAULT_SEED};

/// Cached microscopic cross sections for one nuclide at the particle's
/// current phase-space point.
///
/// An entry is valid for a lookup iff `(last_e, last_sqrt_kt, index_sab,
/// sab_frac)` all match the lookup key; anything else triggers a recompute.
/// `elastic` is materialized lazily: a recompute clears it to `None` and it
/// is only filled in when thermal scattering, probability-table sampling, or
/// resonance scattering actually needs the free-atom elastic value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroXs {
    pub total: f64,
    pub absorption: f64,
    pub fission: f64,
    pub nu_fission: f64,
    /// Free-atom elastic, or the S(a,b)-adjusted elastic once thermal
    /// scattering has rewritten it. `None` until first demanded.
    pub elastic: Option<f64>,
    /// Thermal (S(a,b)) total contribution.
    pub thermal: f64,
    /// Thermal (S(a,b)) elastic contribution.
    pub thermal_elastic: f64,
    /// Depletion reaction channels, ordered as [`DEPLETION_RX`].
    pub reaction: [f64; DEPLETION_RX.len()],

    /// Energy-grid interval used by the tabulated path.
    pub index_grid: usize,
    /// Interpolation factor on that interval.
    pub interp_factor: f64,
    /// Temperature index of the tabulated path, or `None` when the windowed
    /// multipole evaluation produced this entry. Tabulated accessors must
    /// not be consulted while this is `None`.
    pub index_temp: Option<usize>,

    /// S(a,b) table applied to this entry, if any.
    pub index_sab: Option<usize>,
    /// Temperature index chosen within that S(a,b) table.
    pub index_temp_sab: Option<usize>,
    /// Fraction of this nuclide bound in the S(a,b) scatterer.
    pub sab_frac: f64,
    /// Whether a URR probability table was sampled for this entry.
    pub use_ptable: bool,

    /// Cache key: energy of the last evaluation.
    pub last_e: f64,
    /// Cache key: sqrt(kT) of the last evaluation.
    pub last_sqrt_kt: f64,
}

impl Default for MicroXs {
    fn default() -> Self {
        MicroXs {
            total: 0.0,
            absorption: 0.0,
            fission: 0.0,
            nu_fission: 0.0,
            elastic: None,
            thermal: 0.0,
            thermal_elastic: 0.0,
            reaction: [0.0; DEPLETION_RX.len()],
            index_grid: 0,
            interp_factor: 0.0,
            index_temp: None,
            index_sab: None,
            index_temp_sab: None,
            sab_frac: 0.0,
            use_ptable: false,
            last_e: 0.0,
            last_sqrt_kt: 0.0,
        }
    }
}

/// Macroscopic material cross sections at the particle's current energy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroXs {
    pub total: f64,
    pub absorption: f64,
    pub fission: f64,
    pub nu_fission: f64,
}

/// A neutron being transported.
///
/// Carries the phase-space coordinates the cross section core reads
/// (energy, sqrt(kT), material slot) together with the state it writes:
/// the per-nuclide micro cache, the material macro cache, and the random
/// number streams.
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: [f64; 3],
    pub direction: [f64; 3],
    /// Kinetic energy in eV.
    pub energy: f64,
    /// sqrt(kT) of the material being traversed, in sqrt(eV).
    pub sqrt_kt: f64,
    /// Slot of the current material, or `None` in void.
    pub material: Option<usize>,
    pub alive: bool,
    /// Particle history id; seeds the random streams.
    pub id: usize,
    /// Per-particle random number streams.
    pub streams: PrnStream,
    /// Per-nuclide cross section cache, indexed by nuclide slot.
    pub micro_xs: Vec<MicroXs>,
    /// Material cross sections from the latest evaluation.
    pub macro_xs: MacroXs,
}

impl Particle {
    pub fn new(position: [f64; 3], direction: [f64; 3], energy: f64) -> Self {
        Self {
            position,
            direction,
            energy,
            sqrt_kt: 0.0,
            material: None,
            alive: true,
            id: 0,
            streams: PrnStream::new(DEFAULT_SEED),
            micro_xs: Vec::new(),
            macro_xs: MacroXs::default(),
        }
    }

    /// Seed the random streams for history `id` and reset the caches, as
    /// done at the start of each source particle.
    pub fn init_history(&mut self, id: usize, master_seed: u64) {
        self.id = id;
        self.streams = PrnStream::for_particle(master_seed, id as u64);
        for micro in &mut self.micro_xs {
            *micro = MicroXs::default();
        }
        self.macro_xs = MacroXs::default();
    }

    /// Ensure the micro cache has one slot per loaded nuclide.
    pub fn resize_xs_cache(&mut self, n_nuclides: usize) {
        if self.micro_xs.len() < n_nuclides {
            self.micro_xs.resize(n_nuclides, MicroXs::default());
        }
    }

    /// Move the particle along its current direction by the specified distance
    pub fn move_by(&mut self, distance: f64) {
        for i in 0..3 {
            self.position[i] += self.direction[i] * distance;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_particle_construction() {
        let p = Particle::new([0.0, 1.0, 2.0], [1.0, 0.0, 0.0], 1e6);
        assert_eq!(p.position, [0.0, 1.0, 2.0]);
        assert_eq!(p.direction, [1.0, 0.0, 0.0]);
        assert_eq!(p.energy, 1e6);
        assert!(p.alive);
        assert!(p.material.is_none());
    }

    #[test]
    fn test_particle_move_by() {
        let mut p = Particle::new([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 1e6);
        p.move_by(2.0);
        assert_eq!(p.position, [2.0, 0.0, 0.0]);
        p.move_by(1.5);
        assert_eq!(p.position, [3.5, 0.0, 0.0]);
    }

    #[test]
    fn test_micro_xs_default_is_invalid() {
        let micro = MicroXs::default();
        // A default entry must never match a real lookup key.
        assert!(micro.elastic.is_none());
        assert!(micro.index_temp.is_none());
        assert_eq!(micro.last_e, 0.0);
    }

    #[test]
    fn test_init_history_reseeds_and_clears() {
        let mut p = Particle::new([0.0; 3], [0.0, 0.0, 1.0], 1e6);
        p.resize_xs_cache(3);
        p.micro_xs[1].total = 42.0;
        p.macro_xs.total = 7.0;
        p.init_history(5, 1);
        assert_eq!(p.micro_xs[1], MicroXs::default());
        assert_eq!(p.macro_xs, MacroXs::default());
        assert_eq!(p.streams, PrnStream::for_particle(1, 5));
    }
}
