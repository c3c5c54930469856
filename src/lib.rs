pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod network;
pub mod output;
pub mod scanner;

pub use error::{Result, ScanError};
