//! MAX7456 register map
//!
//! Source: Maxim MAX7456 datasheet (19-0576, rev. 1). AB7456 and other
//! register-compatible clones share this layout.
//!
//! # Addressing
//!
//! Every SPI transaction starts with one address byte. Writes use the
//! address as listed; reads of the write-side registers OR in [`READ`]
//! (`VM0` reads back at `0x80`). The status register only exists on the
//! read side and already sits at `0xA0`, so it is read as-is.
//!
//! # Display memory
//!
//! Display memory holds one glyph code per cell, addressed linearly
//! (`row * 30 + column`) through `DMAH` (bit 0 = address bit 8) and
//! `DMAL` (address bits 7..0). A `DMDI` write stores the glyph using the
//! attribute bits most recently written to `DMM`.
//!
//! # Character memory (NVM)
//!
//! Each of the 256 glyphs occupies 54 bytes of non-volatile memory
//! (12 × 18 pixels, 2 bits per pixel). Programming loads the glyph into
//! the shadow RAM byte by byte (`CMAH` = glyph, `CMAL` = offset, `CMDI` =
//! byte), then `CMM = WRITE_NVM` commits it. OSD output must be disabled
//! while the NVM is accessed; the chip reports completion through
//! [`STAT_NVR_BUSY`].

// ---------------------------------------------------------------------------
// Register addresses
// ---------------------------------------------------------------------------

/// Video mode 0: standard select, OSD enable, software reset
pub const VM0: u8 = 0x00;

/// Video mode 1: background brightness and blink timing
pub const VM1: u8 = 0x01;

/// Horizontal offset
pub const HOS: u8 = 0x02;

/// Vertical offset
pub const VOS: u8 = 0x03;

/// Display memory mode: attribute for subsequent `DMDI` writes, clear
pub const DMM: u8 = 0x04;

/// Display memory address, high bit (bit 0 = address bit 8)
pub const DMAH: u8 = 0x05;

/// Display memory address, low byte
pub const DMAL: u8 = 0x06;

/// Display memory data in: glyph code for the addressed cell
pub const DMDI: u8 = 0x07;

/// Character memory mode: NVM read/write commands
pub const CMM: u8 = 0x08;

/// Character memory address, high: glyph number
pub const CMAH: u8 = 0x09;

/// Character memory address, low: byte offset within the glyph
pub const CMAL: u8 = 0x0A;

/// Character memory data in
pub const CMDI: u8 = 0x0B;

/// OSD insertion mux
pub const OSDM: u8 = 0x0C;

/// Row 0 brightness; rows 1..=15 follow consecutively (`RB0 + row`)
pub const RB0: u8 = 0x10;

/// Number of row brightness registers
pub const ROW_BRIGHTNESS_REGS: u8 = 16;

/// OSD black level
pub const OSDBL: u8 = 0x6C;

/// Status (read-only, read address)
pub const STAT: u8 = 0xA0;

/// Read flag OR-ed into a write-side address to read it back
pub const READ: u8 = 0x80;

// ---------------------------------------------------------------------------
// VM0 bits
// ---------------------------------------------------------------------------

/// VM0 bit 0: disable video buffer
pub const VM0_BUFFER_DISABLE: u8 = 0x01;

/// VM0 bit 1: software reset (self-clearing; reads back 0 once done)
pub const VM0_RESET: u8 = 0x02;

/// VM0 bit 2: enable OSD at next VSYNC
pub const VM0_VSYNC: u8 = 0x04;

/// VM0 bit 3: OSD image enable
pub const VM0_OSD_ENABLE: u8 = 0x08;

/// VM0 bit 6: PAL timing (clear = NTSC)
pub const VM0_PAL: u8 = 0x40;

/// VM0 value with every bit clear: NTSC, OSD off
pub const VM0_NTSC: u8 = 0x00;

// ---------------------------------------------------------------------------
// VM1 fields
// ---------------------------------------------------------------------------

/// VM1 bits 1..0: blink duty cycle mask
pub const VM1_DUTY_MASK: u8 = 0x03;

/// VM1 bits 3..2: blink time mask
pub const VM1_BLINK_TIME_MASK: u8 = 0x0C;

/// VM1 bits 6..4: background brightness shift
pub const VM1_BACKGROUND_SHIFT: u8 = 4;

// ---------------------------------------------------------------------------
// DMM bits
// ---------------------------------------------------------------------------

/// DMM bit 4: subsequent characters blink
pub const DMM_BLINK: u8 = 0x10;

/// DMM bit 3: subsequent characters inverted
pub const DMM_INVERT: u8 = 0x08;

/// DMM bit 2: clear display memory (self-clearing, ~20 µs)
pub const DMM_CLEAR_DISPLAY: u8 = 0x04;

/// DMM bits 2..1: clear display memory, vertical-sync timed
pub const DMM_CLEAR_DISPLAY_VERT: u8 = 0x06;

/// DMM bit 0: auto-increment display address
pub const DMM_AUTOINCREMENT: u8 = 0x01;

/// Attribute bits of DMM carried per cell
pub const DMM_ATTRIBUTE_MASK: u8 = DMM_BLINK | DMM_INVERT;

// ---------------------------------------------------------------------------
// STAT bits
// ---------------------------------------------------------------------------

/// STAT bit 0: PAL signal detected
pub const STAT_PAL: u8 = 0x01;

/// STAT bit 1: NTSC signal detected
pub const STAT_NTSC: u8 = 0x02;

/// STAT bit 2: loss of sync
pub const STAT_LOS: u8 = 0x04;

/// STAT bit 5: character memory (NVM) busy
pub const STAT_NVR_BUSY: u8 = 0x20;

// ---------------------------------------------------------------------------
// CMM commands
// ---------------------------------------------------------------------------

/// Commit the shadow glyph to NVM
pub const CMM_WRITE_NVM: u8 = 0xA0;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Columns per row (both standards)
pub const COLUMNS: usize = 30;

/// Rows in PAL
pub const ROWS_PAL: usize = 16;

/// Rows in NTSC
pub const ROWS_NTSC: usize = 13;

/// Cells in a PAL frame; sizes every frame plane
pub const CELLS_PAL: usize = COLUMNS * ROWS_PAL;

/// Cells in an NTSC frame
pub const CELLS_NTSC: usize = COLUMNS * ROWS_NTSC;

/// Glyphs in character memory
pub const GLYPH_COUNT: usize = 256;

/// Bytes per glyph in character memory
pub const GLYPH_BYTES: usize = 54;

/// Size of a complete font image
pub const FONT_BYTES: usize = GLYPH_COUNT * GLYPH_BYTES;
