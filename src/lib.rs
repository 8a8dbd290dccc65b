//! axview mirrors a web page as a tree of plain terminal elements built from
//! the page's accessibility snapshot, and forwards interaction back to it.

pub mod ax;
pub mod bridge;
pub mod browser;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod render;
pub mod shell;

pub use error::{AxviewError, Result};
