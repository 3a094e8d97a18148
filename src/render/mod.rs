//! # Raster Generation
//!
//! This module produces 1-bit-per-pixel raster buffers for the BITMAP
//! directive.
//!
//! ## Modules
//!
//! - [`stripe`]: deterministic stripe test pattern

pub mod stripe;

pub use stripe::BitmapBuffer;
