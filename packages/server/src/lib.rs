//! Anonymous real-time presence and messaging broker.
//!
//! Layers follow the usual split: `domain` owns the rules, `usecase` runs
//! them under the broker lock, `infrastructure` implements the domain traits
//! and `ui` exposes everything over axum.

pub mod config;

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
