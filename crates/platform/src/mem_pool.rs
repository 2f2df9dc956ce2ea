//! Region-tagged buffer pools.
//!
//! ## Why regions matter
//!
//! Not every RAM bank is reachable by every bus master. On a typical
//! Cortex-M7 target:
//!
//! | Memory Region | DMA | Use case |
//! |---------------|-----|----------|
//! | AXI SRAM      | YES | SPI burst command buffers |
//! | SRAM1/2       | YES | general buffers |
//! | DTCM          | NO  | CPU-only hot data: frame planes, stacks |
//!
//! A buffer that the SPI peripheral streams by DMA must come from a
//! DMA-reachable region; buffers only the CPU touches are best placed in
//! the fastest (tightly coupled) memory. Drivers state which they need with
//! [`MemoryRegion`] and the deployment supplies a [`BufferPool`] that knows
//! where each region lives.
//!
//! ## Ownership
//!
//! Every buffer is owned by whoever allocated it and is returned to its
//! pool when dropped. A driver that fails halfway through acquiring its
//! buffers therefore releases the ones it already holds simply by
//! returning.

/// Memory region a buffer must come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoryRegion {
    /// CPU-only memory with the lowest access latency.
    Fast,
    /// Memory reachable by the DMA controller feeding the bus peripheral.
    DmaSafe,
}

/// Source of owned, zero-filled byte buffers.
pub trait BufferPool {
    /// Owned buffer; returned to the pool on drop.
    type Buffer: AsRef<[u8]> + AsMut<[u8]>;

    /// Allocate exactly `len` zeroed bytes from `region`.
    ///
    /// Returns `None` when the region cannot satisfy the request.
    fn allocate(&self, region: MemoryRegion, len: usize) -> Option<Self::Buffer>;
}

impl<T: BufferPool + ?Sized> BufferPool for &T {
    type Buffer = T::Buffer;

    fn allocate(&self, region: MemoryRegion, len: usize) -> Option<Self::Buffer> {
        (**self).allocate(region, len)
    }
}

/// Allocator-free pool: each buffer is a `heapless::Vec` of capacity `N`
/// stored inline in its owner.
///
/// Where the memory lives is decided by where the owner is placed (for
/// example a `static` with a `#[link_section]`), so the region tag is not
/// consulted. Requests larger than `N` fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlinePool<const N: usize>;

impl<const N: usize> BufferPool for InlinePool<N> {
    type Buffer = heapless::Vec<u8, N>;

    fn allocate(&self, _region: MemoryRegion, len: usize) -> Option<Self::Buffer> {
        let mut buffer = heapless::Vec::new();
        buffer.resize(len, 0).ok()?;
        Some(buffer)
    }
}

/// Routes [`MemoryRegion::Fast`] requests to one pool and
/// [`MemoryRegion::DmaSafe`] requests to another.
#[derive(Debug, Clone, Copy)]
pub struct RegionPool<F, D> {
    fast: F,
    dma: D,
}

impl<F, D> RegionPool<F, D> {
    /// Combine a fast-memory pool and a DMA-reachable pool.
    pub const fn new(fast: F, dma: D) -> Self {
        Self { fast, dma }
    }
}

impl<F, D> BufferPool for RegionPool<F, D>
where
    F: BufferPool,
    D: BufferPool<Buffer = F::Buffer>,
{
    type Buffer = F::Buffer;

    fn allocate(&self, region: MemoryRegion, len: usize) -> Option<Self::Buffer> {
        match region {
            MemoryRegion::Fast => self.fast.allocate(region, len),
            MemoryRegion::DmaSafe => self.dma.allocate(region, len),
        }
    }
}
