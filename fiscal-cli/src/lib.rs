//! Command-line front end for the fiscal simulator.
//!
//! Each command loads a settings profile, runs one engine computation and
//! returns a JSON document that [`output`] renders as tables or JSON.

pub mod app;
pub mod commands;
pub mod output;
