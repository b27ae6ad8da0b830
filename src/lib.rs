// lib.rs
// Library modules for the location bingo card

pub mod defs;
pub mod error;
pub mod logging;
pub mod config;
pub mod board;
pub mod reward;
pub mod codec;
pub mod controller;
pub mod page;
pub mod server;
pub mod terminal;
