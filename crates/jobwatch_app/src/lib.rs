//! Terminal front end for jobwatch: configuration, persisted client state,
//! and the interactive watch loop over the core state machine.
pub mod cli;
pub mod config;
pub mod platform;
