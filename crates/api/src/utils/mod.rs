//! Helpers shared by the command surface and the binary

pub mod command_helpers;
pub mod health;
pub mod logging;
