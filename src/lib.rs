// Continuous-energy neutron cross section evaluation for Monte Carlo
// transport: tabulated point-wise data, windowed multipole Doppler
// broadening, S(a,b) thermal scattering, and unresolved-resonance
// probability tables behind a per-particle caching contract.

pub mod constants;
pub mod data;
pub mod material;
pub mod math;
pub mod multipole;
pub mod nuclide;
pub mod particle;
pub mod rng;
pub mod sab;
pub mod settings;
pub mod urr;
pub mod utilities;

pub use data::NuclearData;
pub use material::Material;
pub use multipole::{Formalism, WindowedMultipole};
pub use nuclide::{EmissionMode, EnergyGrid, NuFunction, Nuclide, Reaction, ReactionXs, XsSet};
pub use particle::{MacroXs, MicroXs, Particle};
pub use rng::{PrnStream, STREAM_TRACKING, STREAM_URR_PTABLE};
pub use sab::{SabElasticMode, ThermalData, ThermalScattering};
pub use settings::{Settings, TemperatureMethod};
pub use urr::{UrrData, UrrInterpolation};
pub use utilities::{interpolate_linear, interpolate_log_log};
