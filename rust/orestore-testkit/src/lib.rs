//! Test utilities and helpers for the orestore crates.
//!
//! This crate provides:
//! - [`ore_map::OreMapFixture`], a builder for small hand-written ORE maps
//! - [`data_gen`], seeded generation of larger collection trees
//! - helpers publishing fixtures into a data directory laid out the way
//!   `LocalArchiveStore` expects

pub mod data_gen;
pub mod ore_map;

pub use ore_map::OreMapFixture;
