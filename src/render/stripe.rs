//! # Stripe Test Pattern
//!
//! Generates the horizontal-stripe calibration pattern used by the stripe
//! test job: every even row fully dark, every odd row fully light.
//!
//! ## Bit Packing
//!
//! The printer expects 1 bit per pixel, rows padded to whole bytes,
//! MSB-first within each byte:
//!
//! ```text
//! pixel (x, y)  ->  byte y * stride + x / 8,  bit 7 - (x % 8)
//! ```
//!
//! A set bit means a dark dot.

/// # 1-bpp Raster Buffer
///
/// A packed monochrome bitmap in the printer's native layout.
///
/// ## Invariant
///
/// `pixels.len() == row_stride * height` always holds; the constructors
/// enforce it, so a mismatch is a programming error, never a runtime input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapBuffer {
    /// Width in pixels
    pub width: u32,

    /// Height in rows
    pub height: u32,

    /// Bytes per row: `ceil(width / 8)`
    pub row_stride: u32,

    /// Packed pixel data, MSB-first, 1 = dark
    pub pixels: Vec<u8>,
}

impl BitmapBuffer {
    /// Generate the horizontal-stripe test pattern.
    ///
    /// Row `y` is fully dark when `y % 2 == 0`, fully light otherwise.
    ///
    /// ## Panics
    ///
    /// Panics if `width` or `height` is zero. A zero dimension would
    /// produce a mis-sized buffer downstream, so we fail fast here.
    ///
    /// ## Example
    ///
    /// ```
    /// use etiqueta::render::BitmapBuffer;
    ///
    /// let bmp = BitmapBuffer::stripe(16, 2);
    /// assert_eq!(bmp.pixels, vec![0xFF, 0xFF, 0x00, 0x00]);
    /// ```
    pub fn stripe(width: u32, height: u32) -> Self {
        assert!(width > 0, "stripe width must be positive");
        assert!(height > 0, "stripe height must be positive");

        let row_stride = width.div_ceil(8);
        let mut pixels = vec![0u8; (row_stride * height) as usize];

        for y in 0..height {
            if y % 2 != 0 {
                continue; // odd rows stay light
            }
            let row_start = (y * row_stride) as usize;
            for x in 0..width {
                let byte_index = row_start + (x / 8) as usize;
                let bit = 7 - (x % 8);
                pixels[byte_index] |= 1 << bit;
            }
        }

        Self {
            width,
            height,
            row_stride,
            pixels,
        }
    }

    /// Total size of the packed pixel data in bytes.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// True when the buffer holds no pixel data.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Read back a single pixel; true means dark.
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        let byte = self.pixels[(y * self.row_stride + x / 8) as usize];
        byte & (1 << (7 - (x % 8))) != 0
    }
}

// ============================================================================
// TESTS
// ============================================================================
