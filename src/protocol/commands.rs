//! # TSPL Command Builders
//!
//! This module implements the subset of the TSC printer language (TSPL)
//! used for label printing: geometry setup, buffer clear, text placement,
//! raw bitmaps, and the print trigger.
//!
//! ## Protocol Overview
//!
//! TSPL is line-oriented: every directive is an ASCII keyword plus
//! parameters, terminated by LF. The single exception is BITMAP, whose
//! directive line is followed immediately by a declared number of raw
//! binary bytes.
//!
//! ```text
//! SIZE 72 mm,10 mm
//! GAP 0 mm,0 mm
//! CLS
//! TEXT 100,20,"courmon.TTF",0,12,12,"HELLO"
//! PRINT 1,1
//! ```
//!
//! ## Design
//!
//! Every builder is a pure function returning owned byte buffers; nothing
//! here touches a channel. Concatenation order is significant and chosen
//! by the session layer.

use crate::error::EtiquetaError;

/// Line delimiter terminating every directive
pub const DELIMITER: u8 = b'\n';

// ============================================================================
// LABEL SETUP
// ============================================================================

/// # Label Setup Parameters
///
/// Geometry and print-quality settings emitted as the directive block at
/// the start of every job. Each field maps to exactly one directive line.
///
/// ## Defaults
///
/// | Directive | Default |
/// |-----------|---------|
/// | SIZE | 72 mm x 10 mm |
/// | GAP | 0 mm |
/// | SPEED | 4 |
/// | DENSITY | 12 |
/// | CODEPAGE | UTF-8 |
/// | SET TEAR | ON |
/// | SET CUTTER | OFF |
/// | DIRECTION | 0 |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSetup {
    /// Label width in millimeters
    pub width_mm: u32,

    /// Label height in millimeters
    pub height_mm: u32,

    /// Gap between labels in millimeters
    pub gap_mm: u32,

    /// Print speed setting
    pub speed: u32,

    /// Print density (darkness), 0-15 on most models
    pub density: u32,

    /// Character codepage name
    pub codepage: String,

    /// Enable the tear bar
    pub tear_on: bool,

    /// Enable the cutter
    pub cutter_on: bool,

    /// Print direction
    pub direction: u32,
}

impl Default for LabelSetup {
    fn default() -> Self {
        Self {
            width_mm: 72,
            height_mm: 10,
            gap_mm: 0,
            speed: 4,
            density: 12,
            codepage: "UTF-8".to_string(),
            tear_on: true,
            cutter_on: false,
            direction: 0,
        }
    }
}

/// Build the label setup directive block.
///
/// Emits one directive per line, in the fixed order SIZE, GAP, SPEED,
/// DENSITY, CODEPAGE, SET TEAR, SET CUTTER, DIRECTION. The printer
/// re-reads the whole block at the start of each job, so all eight lines
/// are always sent even when a field holds its default.
///
/// ## Example
///
/// ```
/// use etiqueta::protocol::commands::{setup, LabelSetup};
///
/// let block = setup(&LabelSetup::default());
/// assert!(block.starts_with(b"SIZE 72 mm,10 mm\n"));
/// ```
pub fn setup(options: &LabelSetup) -> Vec<u8> {
    let mut out = String::new();
    out.push_str(&format!(
        "SIZE {} mm,{} mm\n",
        options.width_mm, options.height_mm
    ));
    out.push_str(&format!("GAP {} mm,0 mm\n", options.gap_mm));
    out.push_str(&format!("SPEED {}\n", options.speed));
    out.push_str(&format!("DENSITY {}\n", options.density));
    out.push_str(&format!("CODEPAGE {}\n", options.codepage));
    out.push_str(&format!(
        "SET TEAR {}\n",
        if options.tear_on { "ON" } else { "OFF" }
    ));
    out.push_str(&format!(
        "SET CUTTER {}\n",
        if options.cutter_on { "ON" } else { "OFF" }
    ));
    out.push_str(&format!("DIRECTION {}\n", options.direction));
    out.into_bytes()
}

// ============================================================================
// BUFFER CLEAR
// ============================================================================

/// # Clear Image Buffer (CLS)
///
/// Clears the printer's internal image buffer. Must follow the setup block
/// and precede any TEXT or BITMAP directives.
#[inline]
pub fn cls() -> Vec<u8> {
    b"CLS\n".to_vec()
}

// ============================================================================
// TEXT PLACEMENT
// ============================================================================

/// # Text Placement Parameters
///
/// Position and styling for TEXT directives. `origin_y` is the vertical
/// position of the first line; each subsequent input line advances by
/// `y_step` dots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextStyle {
    /// Horizontal position in dots
    pub origin_x: u32,

    /// Vertical position of the first line in dots
    pub origin_y: u32,

    /// Vertical advance per input line in dots
    pub y_step: u32,

    /// Font identifier as known to the printer
    pub font: String,

    /// Rotation in degrees (0, 90, 180, 270)
    pub rotation: u32,

    /// Horizontal size multiplier
    pub x_mul: u32,

    /// Vertical size multiplier
    pub y_mul: u32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            origin_x: 100,
            origin_y: 20,
            y_step: 30,
            font: "courmon.TTF".to_string(),
            rotation: 0,
            x_mul: 12,
            y_mul: 12,
        }
    }
}

/// Build TEXT directives for a (possibly multi-line) string.
///
/// Emits one `TEXT x,y,"font",rotation,xmul,ymul,"line"` directive per
/// input line, advancing y by `style.y_step` each line. The content is
/// embedded verbatim between the quote characters and encoded as UTF-8,
/// so non-ASCII label text survives intact.
///
/// ## Errors
///
/// Returns [`EtiquetaError::InvalidText`] if any line contains a `"`
/// character. The wire format has no escape sequence for quotes; embedding
/// one would produce a malformed directive, so such input is rejected
/// outright.
///
/// ## Example
///
/// ```
/// use etiqueta::protocol::commands::{text, TextStyle};
///
/// let block = text("HELLO", &TextStyle::default()).unwrap();
/// assert_eq!(block, b"TEXT 100,20,\"courmon.TTF\",0,12,12,\"HELLO\"\n");
/// ```
pub fn text(content: &str, style: &TextStyle) -> Result<Vec<u8>, EtiquetaError> {
    let mut out = String::new();
    for (index, line) in content.lines().enumerate() {
        if line.contains('"') {
            return Err(EtiquetaError::InvalidText(format!(
                "line {} contains a quote character, which cannot be \
                 represented in a TEXT directive",
                index + 1
            )));
        }
        let y = style.origin_y + index as u32 * style.y_step;
        out.push_str(&format!(
            "TEXT {},{},\"{}\",{},{},{},\"{}\"\n",
            style.origin_x, y, style.font, style.rotation, style.x_mul, style.y_mul, line
        ));
    }
    Ok(out.into_bytes())
}

// ============================================================================
// BITMAP
// ============================================================================

/// Build a BITMAP directive for a packed 1-bpp buffer.
///
/// Returns two buffers: the directive line
/// `BITMAP x,y,stride,height,1,` and the raw pixel payload followed by the
/// trailing delimiter. They are kept separate so the caller can sequence
/// the binary payload onto the wire without re-encoding it as text.
///
/// The declared byte count on the wire is `stride * height`, which by the
/// [`BitmapBuffer`](crate::render::BitmapBuffer) invariant is exactly the
/// payload length. The fixed `1` is the bit-depth tag.
///
/// ## Example
///
/// ```
/// use etiqueta::protocol::commands::bitmap;
/// use etiqueta::render::BitmapBuffer;
///
/// let bmp = BitmapBuffer::stripe(16, 2);
/// let (directive, payload) = bitmap(&bmp, 0, 0);
/// assert_eq!(directive, b"BITMAP 0,0,2,2,1,");
/// assert_eq!(payload, vec![0xFF, 0xFF, 0x00, 0x00, b'\n']);
/// ```
pub fn bitmap(buffer: &crate::render::BitmapBuffer, x: u32, y: u32) -> (Vec<u8>, Vec<u8>) {
    let directive = format!(
        "BITMAP {},{},{},{},1,",
        x, y, buffer.row_stride, buffer.height
    )
    .into_bytes();

    let mut payload = buffer.pixels.clone();
    payload.push(DELIMITER);

    (directive, payload)
}

// ============================================================================
// PRINT TRIGGER
// ============================================================================

/// # Print Trigger (PRINT)
///
/// Prints the composed buffer. `copies` labels per set, `sets` repetitions.
///
/// ## Example
///
/// ```
/// use etiqueta::protocol::commands::print;
///
/// assert_eq!(print(1, 1), b"PRINT 1,1\n");
/// assert_eq!(print(3, 2), b"PRINT 3,2\n");
/// ```
#[inline]
pub fn print(copies: u32, sets: u32) -> Vec<u8> {
    format!("PRINT {},{}\n", copies, sets).into_bytes()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::BitmapBuffer;

    #[test]
    fn test_setup_defaults() {
        let expected = "SIZE 72 mm,10 mm\n\
                        GAP 0 mm,0 mm\n\
                        SPEED 4\n\
                        DENSITY 12\n\
                        CODEPAGE UTF-8\n\
                        SET TEAR ON\n\
                        SET CUTTER OFF\n\
                        DIRECTION 0\n";
        assert_eq!(setup(&LabelSetup::default()), expected.as_bytes());
    }

    #[test]
    fn test_setup_overrides() {
        let options = LabelSetup {
            width_mm: 100,
            height_mm: 20,
            gap_mm: 3,
            speed: 6,
            density: 8,
            codepage: "850".to_string(),
            tear_on: false,
            cutter_on: true,
            direction: 1,
        };
        let expected = "SIZE 100 mm,20 mm\n\
                        GAP 3 mm,0 mm\n\
                        SPEED 6\n\
                        DENSITY 8\n\
                        CODEPAGE 850\n\
                        SET TEAR OFF\n\
                        SET CUTTER ON\n\
                        DIRECTION 1\n";
        assert_eq!(setup(&options), expected.as_bytes());
    }

    #[test]
    fn test_cls() {
        assert_eq!(cls(), b"CLS\n");
    }

    #[test]
    fn test_text_single_line() {
        let block = text("HELLO", &TextStyle::default()).unwrap();
        assert_eq!(block, b"TEXT 100,20,\"courmon.TTF\",0,12,12,\"HELLO\"\n");
    }

    #[test]
    fn test_text_multi_line_advances_y() {
        let block = text("ONE\nTWO\nTHREE", &TextStyle::default()).unwrap();
        let expected = "TEXT 100,20,\"courmon.TTF\",0,12,12,\"ONE\"\n\
                        TEXT 100,50,\"courmon.TTF\",0,12,12,\"TWO\"\n\
                        TEXT 100,80,\"courmon.TTF\",0,12,12,\"THREE\"\n";
        assert_eq!(block, expected.as_bytes());
    }

    #[test]
    fn test_text_non_ascii_is_utf8() {
        // Thai label text must survive byte-for-byte
        let block = text("สวัสดี", &TextStyle::default()).unwrap();
        let line = String::from_utf8(block).unwrap();
        assert!(line.contains("\"สวัสดี\""));
    }

    #[test]
    fn test_text_custom_style() {
        let style = TextStyle {
            origin_x: 10,
            origin_y: 5,
            y_step: 40,
            font: "ROMAN.TTF".to_string(),
            rotation: 90,
            x_mul: 2,
            y_mul: 3,
        };
        let block = text("A\nB", &style).unwrap();
        let expected = "TEXT 10,5,\"ROMAN.TTF\",90,2,3,\"A\"\n\
                        TEXT 10,45,\"ROMAN.TTF\",90,2,3,\"B\"\n";
        assert_eq!(block, expected.as_bytes());
    }

    #[test]
    fn test_text_rejects_embedded_quote() {
        let err = text("say \"hi\"", &TextStyle::default()).unwrap_err();
        assert!(matches!(err, EtiquetaError::InvalidText(_)));
    }

    #[test]
    fn test_text_reports_offending_line() {
        let err = text("fine\nbad\"line", &TextStyle::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("line 2"), "got: {}", message);
    }

    #[test]
    fn test_bitmap_directive_and_payload() {
        let bmp = BitmapBuffer::stripe(300, 20);
        let (directive, payload) = bitmap(&bmp, 0, 0);
        assert_eq!(directive, b"BITMAP 0,0,38,20,1,");
        assert_eq!(payload.len(), 38 * 20 + 1);
        assert_eq!(*payload.last().unwrap(), b'\n');
        assert_eq!(&payload[..payload.len() - 1], &bmp.pixels[..]);
    }

    #[test]
    fn test_bitmap_origin() {
        let bmp = BitmapBuffer::stripe(8, 1);
        let (directive, _) = bitmap(&bmp, 40, 60);
        assert_eq!(directive, b"BITMAP 40,60,1,1,1,");
    }

    #[test]
    fn test_print_defaults_and_counts() {
        assert_eq!(print(1, 1), b"PRINT 1,1\n");
        assert_eq!(print(5, 1), b"PRINT 5,1\n");
    }
}
