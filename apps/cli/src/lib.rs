//! snooze command line front-end library
//!
//! This module exposes the configuration, controller and renderers for the
//! `snooze` binary and for testing.

pub mod cli;
pub mod config;
pub mod controller;
pub mod in_flight;
pub mod render;

pub use config::{CliConfig, ConfigError, SessionBackend};
pub use controller::{Controller, ControllerError, ControllerResult, SessionContext};
pub use in_flight::{InFlight, InFlightGuard};
