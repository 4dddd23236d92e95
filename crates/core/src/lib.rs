//! Core types and traits for lightchat
//!
//! This crate contains domain types shared across all other crates.

mod chat;
mod constants;
mod device;
mod env_config;
mod error;
mod tool;

pub use chat::*;
pub use constants::*;
pub use device::*;
pub use env_config::*;
pub use error::*;
pub use tool::*;
