//! # TSPL Protocol
//!
//! Directive builders for the TSC label printer command language.
//!
//! ## Modules
//!
//! - [`commands`]: setup, CLS, TEXT, BITMAP and PRINT builders

pub mod commands;

pub use commands::{LabelSetup, TextStyle};
