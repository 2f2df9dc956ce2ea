//! Command buffer: `(register, value)` byte pairs streamed to the chip in
//! a single bus transaction.
//!
//! The buffer is DMA-reachable so the bus peripheral can stream it
//! without a copy. Capacity covers the worst sync cycle
//! ([`MAX_UPDATED_CHARS`] cells × 4 pairs) with one pair-set of headroom,
//! and a whole glyph upload (111 pairs).

use platform::{BufferPool, MemoryRegion};

/// Upper bound on cells transmitted per sync cycle.
pub const MAX_UPDATED_CHARS: usize = 64;

/// Command buffer size in bytes: `(MAX_UPDATED_CHARS + 1) * 8`.
pub const COMMAND_BUFFER_SIZE: usize = (MAX_UPDATED_CHARS + 1) * 8;

/// Append-only list of register writes, rebuilt for every transaction.
pub struct CommandBuffer<B> {
    buffer: B,
    len: usize,
}

impl<B> CommandBuffer<B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Allocate [`COMMAND_BUFFER_SIZE`] bytes from [`MemoryRegion::DmaSafe`].
    pub fn allocate<P>(pool: &P) -> Option<Self>
    where
        P: BufferPool<Buffer = B>,
    {
        let buffer = pool
            .allocate(MemoryRegion::DmaSafe, COMMAND_BUFFER_SIZE)
            .filter(|buffer| AsRef::<[u8]>::as_ref(buffer).len() == COMMAND_BUFFER_SIZE)?;
        Some(Self { buffer, len: 0 })
    }

    /// Discard the pending commands.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Append a register write.
    ///
    /// Returns `false`, leaving the buffer unchanged, if the pair does not
    /// fit.
    pub fn push(&mut self, reg: u8, value: u8) -> bool {
        let Some(end) = self.len.checked_add(2) else {
            return false;
        };
        match self.buffer.as_mut().get_mut(self.len..end) {
            Some(slot) => {
                slot.copy_from_slice(&[reg, value]);
                self.len = end;
                true
            }
            None => false,
        }
    }

    /// Pending bytes, in transmission order.
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_ref().get(..self.len).unwrap_or_default()
    }

    /// Number of pending bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation
)]
mod tests {
    use super::*;
    use platform::mocks::MockPool;

    fn buffer() -> CommandBuffer<platform::mocks::MockBuffer> {
        CommandBuffer::allocate(&MockPool::new()).unwrap()
    }

    #[test]
    fn allocates_from_dma_safe_region() {
        let pool = MockPool::new();
        let commands = CommandBuffer::allocate(&pool).unwrap();
        assert!(commands.is_empty());
        assert_eq!(pool.requests(), vec![(MemoryRegion::DmaSafe, 520)]);
    }

    #[test]
    fn pairs_are_kept_in_order() {
        let mut commands = buffer();
        assert!(commands.push(0x04, 0x10));
        assert!(commands.push(0x05, 0x01));
        assert_eq!(commands.as_bytes(), &[0x04, 0x10, 0x05, 0x01]);
        commands.reset();
        assert!(commands.is_empty());
        assert_eq!(commands.as_bytes(), &[] as &[u8]);
    }

    #[test]
    fn pushes_beyond_capacity_are_dropped() {
        let mut commands = buffer();
        for i in 0..COMMAND_BUFFER_SIZE / 2 {
            assert!(commands.push(0x07, i as u8));
        }
        assert!(!commands.push(0xAA, 0xBB));
        assert_eq!(commands.len(), COMMAND_BUFFER_SIZE);
        assert_eq!(commands.as_bytes().last(), Some(&((COMMAND_BUFFER_SIZE / 2 - 1) as u8)));
    }

    #[test]
    fn worst_case_sync_cycle_fits() {
        assert!(MAX_UPDATED_CHARS * 4 * 2 <= COMMAND_BUFFER_SIZE);
    }
}
