//! Differential sync: turn frame/shadow differences into display memory
//! writes.
//!
//! Cells are scanned in raster order over the active format's area. Each
//! changed cell costs three register writes (address high, address low,
//! glyph), plus a DMM write whenever its attribute differs from the
//! previous changed cell's, so runs of text with one attribute cost three
//! pairs per cell. At most [`MAX_UPDATED_CHARS`] cells are sent per cycle;
//! the rest stay dirty and go out on the following cycles.

use crate::command::{CommandBuffer, MAX_UPDATED_CHARS};
use crate::frame::FrameStore;
use crate::log::osd_debug;
use crate::registers::{DMAH, DMAL, DMDI, DMM, DMM_ATTRIBUTE_MASK};

/// Rebuild `commands` with the writes bringing the chip up to date for
/// the first `active_cells` cells, and mark those cells clean in the
/// shadow.
///
/// Returns the number of cells queued.
pub fn build_frame_update<F, C>(
    frame: &mut FrameStore<F>,
    active_cells: usize,
    commands: &mut CommandBuffer<C>,
) -> usize
where
    F: AsRef<[u8]> + AsMut<[u8]>,
    C: AsRef<[u8]> + AsMut<[u8]>,
{
    commands.reset();

    let planes = frame.planes();
    let cells = planes
        .glyphs
        .iter()
        .zip(planes.attrs)
        .zip(planes.shadow_glyphs.iter_mut().zip(planes.shadow_attrs.iter_mut()))
        .take(active_cells)
        .enumerate();

    let mut updated = 0usize;
    let mut last_attribute = None;

    for (index, ((&glyph, &attr), (shadow_glyph, shadow_attr))) in cells {
        if glyph == *shadow_glyph && attr == *shadow_attr {
            continue;
        }
        if updated >= MAX_UPDATED_CHARS {
            osd_debug!("sync capped at {} cells, resuming at {}", MAX_UPDATED_CHARS, index);
            break;
        }
        // Display memory addresses are 9 bits; the planes never exceed that.
        let Ok(address) = u16::try_from(index) else {
            break;
        };
        let [high, low] = address.to_be_bytes();

        *shadow_glyph = glyph;
        *shadow_attr = attr;
        updated = updated.saturating_add(1);

        let attribute = attr & DMM_ATTRIBUTE_MASK;
        if last_attribute != Some(attribute) {
            commands.push(DMM, attribute);
            last_attribute = Some(attribute);
        }
        commands.push(DMAH, high);
        commands.push(DMAL, low);
        commands.push(DMDI, glyph);
    }

    updated
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::registers::{CELLS_NTSC, CELLS_PAL, COLUMNS};
    use platform::mocks::{MockBuffer, MockPool};
    use platform::CharAttr;

    struct Fixture {
        frame: FrameStore<MockBuffer>,
        commands: CommandBuffer<MockBuffer>,
        _pool: MockPool,
    }

    /// Blank frame whose shadow already matches it.
    fn converged() -> Fixture {
        let pool = MockPool::new();
        let mut frame = FrameStore::allocate(&pool).unwrap();
        let mut commands = CommandBuffer::allocate(&pool).unwrap();
        frame.clear();
        frame.invalidate_shadow();
        while build_frame_update(&mut frame, CELLS_PAL, &mut commands) > 0 {}
        Fixture { frame, commands, _pool: pool }
    }

    fn pairs(commands: &CommandBuffer<MockBuffer>) -> Vec<(u8, u8)> {
        commands
            .as_bytes()
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
            .collect()
    }

    #[test]
    fn converged_frame_sends_nothing() {
        let mut fx = converged();
        assert_eq!(build_frame_update(&mut fx.frame, CELLS_PAL, &mut fx.commands), 0);
        assert!(fx.commands.is_empty());
    }

    #[test]
    fn text_with_one_attribute_needs_one_dmm_write() {
        let mut fx = converged();
        // Chip shows "#######" where the label goes, so all seven cells change.
        fx.frame.write(0, 0, b"#######", CharAttr::NONE);
        while build_frame_update(&mut fx.frame, CELLS_PAL, &mut fx.commands) > 0 {}
        fx.frame.clear();
        fx.frame.write(0, 0, b"ALT 100", CharAttr::NONE);
        assert_eq!(build_frame_update(&mut fx.frame, CELLS_PAL, &mut fx.commands), 7);

        let pairs = pairs(&fx.commands);
        assert_eq!(pairs[0], (DMM, 0x00));
        assert_eq!(pairs.len(), 1 + 7 * 3);
        for (i, triple) in pairs[1..].chunks_exact(3).enumerate() {
            assert_eq!(triple, &[(DMAH, 0), (DMAL, i as u8), (DMDI, b"ALT 100"[i])]);
        }
        for (i, &glyph) in b"ALT 100".iter().enumerate() {
            assert_eq!(fx.frame.shadow_cell(i).unwrap().glyph, glyph);
        }
    }

    #[test]
    fn cells_already_blank_on_chip_are_skipped() {
        let mut fx = converged();
        // The space matches the blank the chip already shows.
        fx.frame.write(0, 0, b"ALT 100", CharAttr::NONE);
        assert_eq!(build_frame_update(&mut fx.frame, CELLS_PAL, &mut fx.commands), 6);
        assert!(!pairs(&fx.commands).contains(&(DMAL, 3)));
    }

    #[test]
    fn attribute_changes_emit_dmm_masked() {
        let mut fx = converged();
        fx.frame.write(0, 0, b"A", CharAttr::from_bits(0xFF));
        fx.frame.write(1, 0, b"B", CharAttr::NONE);
        build_frame_update(&mut fx.frame, CELLS_PAL, &mut fx.commands);
        let dmm: Vec<u8> = pairs(&fx.commands)
            .into_iter()
            .filter(|&(reg, _)| reg == DMM)
            .map(|(_, value)| value)
            .collect();
        assert_eq!(dmm, vec![0x18, 0x00]);
        // Shadow keeps the unmasked attribute so the cell stays clean.
        assert_eq!(fx.frame.shadow_cell(0).unwrap().attr.bits(), 0xFF);
    }

    #[test]
    fn addresses_above_255_set_high_bit() {
        let mut fx = converged();
        fx.frame.write(0, 9, b"X", CharAttr::NONE);
        build_frame_update(&mut fx.frame, CELLS_PAL, &mut fx.commands);
        let index = 9 * COLUMNS;
        assert!(pairs(&fx.commands).ends_with(&[
            (DMAH, 0x01),
            (DMAL, (index & 0xFF) as u8),
            (DMDI, b'X'),
        ]));
    }

    #[test]
    fn cycle_is_capped_and_resumes_in_order() {
        let mut fx = converged();
        for row in 0..4 {
            fx.frame.write(0, row, &[b'#'; COLUMNS], CharAttr::NONE);
        }
        assert_eq!(build_frame_update(&mut fx.frame, CELLS_PAL, &mut fx.commands), 64);
        assert_eq!(fx.commands.len(), (1 + 64 * 3) * 2);
        assert_eq!(fx.frame.shadow_cell(63).unwrap().glyph, b'#');
        assert_eq!(fx.frame.shadow_cell(64).unwrap().glyph, b' ');

        assert_eq!(build_frame_update(&mut fx.frame, CELLS_PAL, &mut fx.commands), 56);
        let first = pairs(&fx.commands);
        assert_eq!(first[1], (DMAH, 0));
        assert_eq!(first[2], (DMAL, 64));
        assert_eq!(build_frame_update(&mut fx.frame, CELLS_PAL, &mut fx.commands), 0);
    }

    #[test]
    fn ntsc_leaves_bottom_rows_alone() {
        let mut fx = converged();
        fx.frame.write(0, 15, b"PAL ONLY", CharAttr::NONE);
        assert_eq!(build_frame_update(&mut fx.frame, CELLS_NTSC, &mut fx.commands), 0);
        // Seven cells: the space is already blank on the chip.
        assert_eq!(build_frame_update(&mut fx.frame, CELLS_PAL, &mut fx.commands), 7);
    }

    #[test]
    fn stale_shadow_retransmits_from_the_top() {
        let mut fx = converged();
        fx.frame.write(0, 0, b"ALT 100", CharAttr::NONE);
        fx.frame.invalidate_shadow();
        assert_eq!(build_frame_update(&mut fx.frame, CELLS_PAL, &mut fx.commands), 64);
        let pairs = pairs(&fx.commands);
        assert_eq!(pairs.iter().filter(|(reg, _)| *reg == DMM).count(), 1);
        let glyphs: Vec<u8> = pairs
            .iter()
            .filter(|(reg, _)| *reg == DMDI)
            .map(|&(_, glyph)| glyph)
            .take(7)
            .collect();
        assert_eq!(glyphs, b"ALT 100");
    }
}
