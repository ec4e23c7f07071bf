// Physical constants and fixed integer layouts for persisted nuclear data.
// The index constants mirror the on-disk ordering of the multipole, URR and
// depletion tables; changing any of them breaks parsing of existing files.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Boltzmann constant in eV/K (CODATA 2018).
pub const K_BOLTZMANN: f64 = 8.617333262e-5;

/// sqrt(pi), precomputed since `f64::sqrt` is not const.
pub const SQRT_PI: f64 = 1.772453850905516;

// ---------------------------------------------------------------------------
// Windowed multipole layouts
// ---------------------------------------------------------------------------

/// Multi-level Breit-Wigner formalism id (persisted value).
pub const FORM_MLBW: i32 = 1;
/// Reich-Moore formalism id (persisted value).
pub const FORM_RM: i32 = 2;

/// Pole-data field: complex pole location (both formalisms).
pub const MP_EA: usize = 0;

/// MLBW residue fields, in persisted order after the pole location.
pub const MLBW_RT: usize = 1;
pub const MLBW_RX: usize = 2;
pub const MLBW_RA: usize = 3;
pub const MLBW_RF: usize = 4;
/// Number of complex fields per pole under MLBW.
pub const MP_FIELDS_MLBW: usize = 5;

/// Reich-Moore residue fields, in persisted order after the pole location.
pub const RM_RT: usize = 1;
pub const RM_RA: usize = 2;
pub const RM_RF: usize = 3;
/// Number of complex fields per pole under Reich-Moore.
pub const MP_FIELDS_RM: usize = 4;

/// Curvefit channels: total, absorption, fission.
pub const FIT_T: usize = 0;
pub const FIT_A: usize = 1;
pub const FIT_F: usize = 2;
/// Number of curvefit channels.
pub const FIT_CHANNELS: usize = 3;

// ---------------------------------------------------------------------------
// Unresolved-resonance probability tables
// ---------------------------------------------------------------------------

/// URR table parameter rows, in persisted order.
pub const URR_CUM_PROB: usize = 0;
pub const URR_ELASTIC: usize = 1;
pub const URR_FISSION: usize = 2;
pub const URR_N_GAMMA: usize = 3;
/// Number of parameter rows per URR incident energy.
pub const URR_PARAMS: usize = 4;

/// ENDF interpolation law: linear-linear.
pub const LINEAR_LINEAR: i32 = 2;
/// ENDF interpolation law: logarithmic-logarithmic.
pub const LOG_LOG: i32 = 5;

// ---------------------------------------------------------------------------
// S(alpha,beta) elastic modes
// ---------------------------------------------------------------------------

/// Coherent (Bragg-edge) elastic treatment (persisted value).
pub const SAB_ELASTIC_EXACT: i32 = 1;
/// Incoherent-approximation elastic treatment (persisted value).
pub const SAB_ELASTIC_INCOHERENT: i32 = 2;

// ---------------------------------------------------------------------------
// ENDF MT numbers
// ---------------------------------------------------------------------------

pub const MT_TOTAL: i32 = 1;
pub const MT_ELASTIC: i32 = 2;
pub const MT_N_2N: i32 = 16;
pub const MT_N_3N: i32 = 17;
pub const MT_FISSION: i32 = 18;
pub const MT_N_4N: i32 = 37;
pub const MT_N_GAMMA: i32 = 102;
pub const MT_N_P: i32 = 103;
pub const MT_N_A: i32 = 107;

/// Reactions tracked for depletion coupling, in persisted order.
/// (n,gamma) sits at position 4 and is the only channel the multipole
/// representation can reconstruct (as absorption minus fission).
pub const DEPLETION_RX: [i32; 6] =
    [MT_N_2N, MT_N_3N, MT_N_4N, MT_N_GAMMA, MT_N_P, MT_N_A];

/// Index of (n,gamma) within [`DEPLETION_RX`].
pub const DEPLETION_RX_N_GAMMA: usize = 3;

/// Map from ENDF MT number to a short human-readable reaction name.
///
/// Covers the channels this crate evaluates directly; unlisted MTs are
/// rendered as `"MT=<n>"` by [`reaction_name`].
pub static REACTION_NAMES: Lazy<HashMap<i32, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(MT_TOTAL, "total");
    m.insert(MT_ELASTIC, "(n,elastic)");
    m.insert(MT_N_2N, "(n,2n)");
    m.insert(MT_N_3N, "(n,3n)");
    m.insert(MT_FISSION, "fission");
    m.insert(MT_N_4N, "(n,4n)");
    m.insert(MT_N_GAMMA, "(n,gamma)");
    m.insert(MT_N_P, "(n,p)");
    m.insert(MT_N_A, "(n,a)");
    m
});

/// Human-readable name for an MT number.
pub fn reaction_name(mt: i32) -> String {
    match REACTION_NAMES.get(&mt) {
        Some(name) => (*name).to_string(),
        None => format!("MT={}", mt),
    }
}
