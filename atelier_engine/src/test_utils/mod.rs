//! Helpers for integration tests: scratch databases and seeded marketplace state.
pub mod prepare_env;
pub mod seed;
