//! Curated antimicrobial-resistance datasets from the PATRIC genome database.
//!
//! The core is pure: [`metadata`] parses the AMR metadata table, [`dedup`]
//! removes repeated and contradictory measurements, [`datasets`] enumerates
//! (species, antibiotic) tasks meeting count thresholds and [`labels`]
//! produces index-aligned label arrays for one antibiotic. The remaining
//! modules fetch release files and drive the command-line tool.

pub mod app;
pub mod config;
pub mod datasets;
pub mod dedup;
pub mod domain;
pub mod error;
pub mod labels;
pub mod metadata;
pub mod output;
pub mod patric;
pub mod release;
pub mod store;
