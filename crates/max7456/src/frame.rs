//! Frame store: the character grid the application draws into, plus the
//! shadow of what the chip's display memory currently holds.
//!
//! Four planes of [`CELLS_PAL`] bytes each, row-major, one byte per cell:
//!
//! ```text
//! glyphs         attrs          ← written by the application
//! shadow_glyphs  shadow_attrs   ← written only by the sync engine
//! ```
//!
//! Planes are always sized for PAL so a format switch never reallocates;
//! in NTSC the last three rows are simply not transmitted.

use platform::{BufferPool, CharAttr, MemoryRegion};

use crate::registers::{CELLS_PAL, COLUMNS, ROWS_PAL};

/// Glyph code of a blank cell.
pub const BLANK_GLYPH: u8 = b' ';

/// Shadow value that never matches a frame cell after a reinit.
pub const STALE: u8 = 0xFF;

/// One cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharCell {
    /// Glyph code (index into character memory)
    pub glyph: u8,
    /// Display attribute as stored (unmasked)
    pub attr: CharAttr,
}

/// Borrowed view of all four planes, as the sync engine needs them.
pub(crate) struct Planes<'a> {
    pub glyphs: &'a [u8],
    pub attrs: &'a [u8],
    pub shadow_glyphs: &'a mut [u8],
    pub shadow_attrs: &'a mut [u8],
}

/// Frame and shadow planes backed by pool buffers.
pub struct FrameStore<B> {
    glyphs: B,
    attrs: B,
    shadow_glyphs: B,
    shadow_attrs: B,
}

impl<B> FrameStore<B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Allocate the four planes from [`MemoryRegion::Fast`].
    ///
    /// Returns `None` if any allocation fails or a buffer comes back with
    /// the wrong length; planes already obtained are dropped (returned to
    /// the pool) on the way out.
    pub fn allocate<P>(pool: &P) -> Option<Self>
    where
        P: BufferPool<Buffer = B>,
    {
        let plane = || {
            pool.allocate(MemoryRegion::Fast, CELLS_PAL)
                .filter(|buffer| AsRef::<[u8]>::as_ref(buffer).len() == CELLS_PAL)
        };
        Some(Self {
            glyphs: plane()?,
            attrs: plane()?,
            shadow_glyphs: plane()?,
            shadow_attrs: plane()?,
        })
    }

    /// Place `text` at (`column`, `row`) with `attr`.
    ///
    /// Ignored if `row` is past the PAL grid or `text` is empty. Text stops
    /// at the first NUL byte and is clipped at the right edge; it never
    /// wraps onto the next row.
    pub fn write(&mut self, column: usize, row: usize, text: &[u8], attr: CharAttr) {
        if row >= ROWS_PAL {
            return;
        }
        let text = text.split(|&b| b == 0).next().unwrap_or_default();
        if text.is_empty() {
            return;
        }
        fill_row(self.glyphs.as_mut(), row, column, text.iter().copied());
        fill_row(
            self.attrs.as_mut(),
            row,
            column,
            core::iter::repeat(attr.bits()).take(text.len()),
        );
    }

    /// Blank every cell of the PAL grid: glyph `' '`, no attribute.
    pub fn clear(&mut self) {
        self.glyphs.as_mut().fill(BLANK_GLYPH);
        self.attrs.as_mut().fill(CharAttr::NONE.bits());
    }

    /// Mark every shadow cell stale so the next sync cycles retransmit the
    /// whole frame.
    pub fn invalidate_shadow(&mut self) {
        self.shadow_glyphs.as_mut().fill(STALE);
        self.shadow_attrs.as_mut().fill(STALE);
    }

    /// Cell at linear `index`, or `None` past the PAL grid.
    pub fn cell(&self, index: usize) -> Option<CharCell> {
        cell_at(self.glyphs.as_ref(), self.attrs.as_ref(), index)
    }

    /// Last transmitted state of the cell at linear `index`.
    pub fn shadow_cell(&self, index: usize) -> Option<CharCell> {
        cell_at(self.shadow_glyphs.as_ref(), self.shadow_attrs.as_ref(), index)
    }

    pub(crate) fn planes(&mut self) -> Planes<'_> {
        Planes {
            glyphs: self.glyphs.as_ref(),
            attrs: self.attrs.as_ref(),
            shadow_glyphs: self.shadow_glyphs.as_mut(),
            shadow_attrs: self.shadow_attrs.as_mut(),
        }
    }
}

fn fill_row(plane: &mut [u8], row: usize, column: usize, values: impl Iterator<Item = u8>) {
    if let Some(cells) = plane.chunks_exact_mut(COLUMNS).nth(row) {
        for (dst, value) in cells.iter_mut().skip(column).zip(values) {
            *dst = value;
        }
    }
}

fn cell_at(glyphs: &[u8], attrs: &[u8], index: usize) -> Option<CharCell> {
    Some(CharCell {
        glyph: *glyphs.get(index)?,
        attr: CharAttr::from_bits(*attrs.get(index)?),
    })
}
