//! Deterministic random number generation
//!
//! Uses xorshift64* algorithm for fast, deterministic random number generation.
//! CRITICAL: All randomness in the engine (initial opinions, pair selection)
//! MUST go through this module so that a seed reproduces a run exactly.

mod xorshift;

pub use xorshift::RngManager;
