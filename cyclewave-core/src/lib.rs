#![cfg_attr(not(feature = "std"), no_std)]
//! Cyclewave Core — the pure half of the ambient generator.
//!
//! Features
//! - `std`      : (default) use the Rust standard library
//! - `no-std`   : build with `#![no_std]` and use `libm` as math backend
//! - `fast-math`: polynomial sine for the oscillator hot path
//!
//! Modules
//! - [`dsp`]     : math backend, phase wrap, one-pole coefficients, sine
//! - [`cycle`]   : wall-clock time → [`CycleDescriptor`](cycle::CycleDescriptor)
//! - [`mapping`] : cycle → [`SynthesisParameters`](mapping::SynthesisParameters)
//! - [`glide`]   : exponential target follower used for retuning
//!
//! Design
//! - No heap allocations, no hidden state: same input, same bits out
//! - Cycle math in `f64`, per-sample math in `f32`

pub mod cycle;
pub mod dsp;
pub mod glide;
pub mod mapping;

/// Commonly used types/functions for convenience:
pub mod prelude {
    pub use crate::cycle::{compute_cycle, CycleDescriptor, PhaseName, CYCLE_SECONDS};
    pub use crate::dsp::{kill_denormals, one_pole_coeff_s, sin01, wrap_phase01, TAU};
    pub use crate::glide::Glide;
    pub use crate::mapping::{
        map_to_parameters, palette_index, SynthesisParameters, BASE_FREQUENCY_HZ, NOTE_PALETTE,
        VOICE_COUNT, VOICE_MULTIPLIERS,
    };
}

#[cfg(test)]
mod smoke {

    #[test]
    fn prelude_exists() {
        use crate::prelude::*;
        let c = compute_cycle(0.0);
        let p = map_to_parameters(&c);
        let mut g = Glide::new(0.5, 48_000.0);
        g.jump_to(p.root_frequency_hz as f32);
        let _ = g.next();
    }
}
