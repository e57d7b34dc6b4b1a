//! Shared test utilities for the status-keeper workspace.
//!
//! This crate provides standardised fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`library`]: [`TestLibrary`] builder for a mod library next to a
//!   central state file

pub mod library;

pub use library::TestLibrary;
