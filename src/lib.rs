// src/lib.rs

#[macro_use]
pub mod macros;
#[macro_use]
pub mod log;

pub mod aggregate;
pub mod cli;
pub mod core;
pub mod error;
pub mod page;
pub mod present;
pub mod score;
pub mod session;
