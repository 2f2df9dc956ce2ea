//! Mock implementations for testing
//!
//! This module provides mock implementations of all platform capabilities
//! for use in unit and integration tests. Every mock records what it was
//! asked to do so tests can assert on exact register traffic, lock
//! discipline, elapsed time and buffer ownership.

#![cfg(any(test, feature = "std"))]
// Mocks count and index freely; none of this reaches firmware builds.
#![allow(clippy::arithmetic_side_effects)]
#![allow(clippy::indexing_slicing)]

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::*;

// ── Bus ─────────────────────────────────────────────────────────────────────

/// One recorded bus interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusOp {
    /// Lock acquired (recorded by [`MockSharedBus`])
    Lock,
    /// Lock released (recorded by [`MockSharedBus`])
    Unlock,
    /// Single register write
    Write {
        /// Register address
        reg: u8,
        /// Value written
        value: u8,
    },
    /// Single register read
    Read {
        /// Register address as sent on the wire
        reg: u8,
    },
    /// Burst transfer of pre-built bytes
    Transfer(Vec<u8>),
    /// Clock speed change
    SetSpeed(BusSpeed),
}

/// Error returned by a [`MockBus`] switched into failing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockBusError;

/// Register-file mock of a [`RegisterBus`] device.
///
/// Reads return queued values first (see [`MockBus::queue_reads`]), then
/// the register file contents. Writes never change the register file:
/// tests decide what the "chip" reports back.
pub struct MockBus {
    ops: Vec<BusOp>,
    registers: [u8; 256],
    queued: HashMap<u8, VecDeque<u8>>,
    failing: bool,
}

impl MockBus {
    /// Create a mock with an all-zero register file.
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            registers: [0; 256],
            queued: HashMap::new(),
            failing: false,
        }
    }

    /// Set the value returned by reads of `reg` (wire address).
    pub fn set_register(&mut self, reg: u8, value: u8) {
        self.registers[usize::from(reg)] = value;
    }

    /// Queue values returned by the next reads of `reg`, in order, before
    /// falling back to the register file.
    pub fn queue_reads(&mut self, reg: u8, values: &[u8]) {
        self.queued
            .entry(reg)
            .or_default()
            .extend(values.iter().copied());
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    /// Record a marker without touching the register file.
    pub fn record(&mut self, op: BusOp) {
        self.ops.push(op);
    }

    /// All recorded operations, in order.
    pub fn ops(&self) -> &[BusOp] {
        &self.ops
    }

    /// Forget recorded operations.
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Every `(register, value)` pair sent, with bursts split into pairs.
    pub fn writes(&self) -> Vec<(u8, u8)> {
        let mut pairs = Vec::new();
        for op in &self.ops {
            match op {
                BusOp::Write { reg, value } => pairs.push((*reg, *value)),
                BusOp::Transfer(bytes) => {
                    pairs.extend(bytes.chunks_exact(2).map(|pair| (pair[0], pair[1])));
                }
                _ => {}
            }
        }
        pairs
    }

    /// Burst transfers sent, in order.
    pub fn transfers(&self) -> Vec<&[u8]> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                BusOp::Transfer(bytes) => Some(bytes.as_slice()),
                _ => None,
            })
            .collect()
    }

    /// Number of reads of `reg` (wire address).
    pub fn reads_of(&self, reg: u8) -> usize {
        self.ops
            .iter()
            .filter(|op| **op == BusOp::Read { reg })
            .count()
    }

    fn check(&self) -> Result<(), MockBusError> {
        if self.failing {
            Err(MockBusError)
        } else {
            Ok(())
        }
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBus for MockBus {
    type Error = MockBusError;

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        self.check()?;
        self.ops.push(BusOp::Write { reg, value });
        Ok(())
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, Self::Error> {
        self.check()?;
        self.ops.push(BusOp::Read { reg });
        let queued = self.queued.get_mut(&reg).and_then(VecDeque::pop_front);
        Ok(queued.unwrap_or(self.registers[usize::from(reg)]))
    }

    fn transfer(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.check()?;
        self.ops.push(BusOp::Transfer(data.to_vec()));
        Ok(())
    }

    fn set_speed(&mut self, speed: BusSpeed) -> Result<(), Self::Error> {
        self.check()?;
        self.ops.push(BusOp::SetSpeed(speed));
        Ok(())
    }
}

/// [`SharedBus`] around a [`MockBus`] that audits lock discipline.
///
/// Each acquisition and release is counted and recorded in the bus log as
/// [`BusOp::Lock`] / [`BusOp::Unlock`], so tests can check which register
/// operations shared a lock. Nested acquisition fails the test.
pub struct MockSharedBus {
    bus: RefCell<MockBus>,
    acquisitions: Cell<usize>,
    releases: Cell<usize>,
}

impl MockSharedBus {
    /// Wrap a fresh [`MockBus`].
    pub fn new() -> Self {
        Self::from_bus(MockBus::new())
    }

    /// Wrap a pre-configured [`MockBus`].
    pub fn from_bus(bus: MockBus) -> Self {
        Self {
            bus: RefCell::new(bus),
            acquisitions: Cell::new(0),
            releases: Cell::new(0),
        }
    }

    /// Inspect the inner bus.
    pub fn bus(&self) -> Ref<'_, MockBus> {
        self.bus.borrow()
    }

    /// Reconfigure the inner bus between driver calls.
    pub fn bus_mut(&self) -> RefMut<'_, MockBus> {
        self.bus.borrow_mut()
    }

    /// Number of times the lock was taken.
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.get()
    }

    /// Number of times the lock was given back.
    pub fn releases(&self) -> usize {
        self.releases.get()
    }

    /// `true` while a closure holds the lock.
    pub fn is_held(&self) -> bool {
        self.acquisitions.get() != self.releases.get()
    }
}

impl Default for MockSharedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedBus for MockSharedBus {
    type Bus = MockBus;

    fn with_lock<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut MockBus) -> R,
    {
        assert!(!self.is_held(), "bus lock acquired while already held");
        self.acquisitions.set(self.acquisitions.get() + 1);
        let mut bus = self.bus.borrow_mut();
        bus.record(BusOp::Lock);
        let result = f(&mut bus);
        bus.record(BusOp::Unlock);
        drop(bus);
        self.releases.set(self.releases.get() + 1);
        result
    }
}

// ── Time ────────────────────────────────────────────────────────────────────

/// Fake time source shared between a [`Clock`] and a delay provider.
///
/// Clones share the same time. Delays advance time instead of sleeping,
/// so bounded busy-wait loops run instantly in tests.
#[derive(Clone, Default)]
pub struct MockClock {
    nanos: Rc<Cell<u64>>,
    delays: Rc<Cell<usize>>,
}

impl MockClock {
    /// Start at `ms` milliseconds since boot.
    pub fn at_ms(ms: u64) -> Self {
        let clock = Self::default();
        clock.set_ms(ms);
        clock
    }

    /// Jump to an absolute time.
    pub fn set_ms(&self, ms: u64) {
        self.nanos.set(ms * 1_000_000);
    }

    /// Move time forward.
    pub fn advance_ms(&self, ms: u64) {
        self.nanos.set(self.nanos.get() + ms * 1_000_000);
    }

    /// Number of delay calls made so far.
    pub fn delay_calls(&self) -> usize {
        self.delays.get()
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.nanos.get() / 1_000_000
    }
}

impl embedded_hal::delay::DelayNs for MockClock {
    fn delay_ns(&mut self, ns: u32) {
        self.delays.set(self.delays.get() + 1);
        self.nanos.set(self.nanos.get() + u64::from(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.set(self.delays.get() + 1);
        self.advance_ms(u64::from(ms));
    }
}

// ── Memory ──────────────────────────────────────────────────────────────────

/// Buffer handed out by [`MockPool`]; decrements the live count on drop.
pub struct MockBuffer {
    data: Vec<u8>,
    live: Rc<Cell<usize>>,
}

impl AsRef<[u8]> for MockBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl AsMut<[u8]> for MockBuffer {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

/// [`BufferPool`] with allocation accounting and failure injection.
#[derive(Default)]
pub struct MockPool {
    live: Rc<Cell<usize>>,
    requests: RefCell<Vec<(MemoryRegion, usize)>>,
    fail_at: Option<usize>,
}

impl MockPool {
    /// Pool that satisfies every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool whose `index`-th request (0-based) fails.
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    /// Buffers currently allocated and not yet dropped.
    pub fn live(&self) -> usize {
        self.live.get()
    }

    /// Every request made, in order, including failed ones.
    pub fn requests(&self) -> Vec<(MemoryRegion, usize)> {
        self.requests.borrow().clone()
    }
}

impl BufferPool for MockPool {
    type Buffer = MockBuffer;

    fn allocate(&self, region: MemoryRegion, len: usize) -> Option<MockBuffer> {
        let index = self.requests.borrow().len();
        self.requests.borrow_mut().push((region, len));
        if self.fail_at == Some(index) {
            return None;
        }
        self.live.set(self.live.get() + 1);
        Some(MockBuffer {
            data: vec![0; len],
            live: Rc::clone(&self.live),
        })
    }
}

// ── Assets ──────────────────────────────────────────────────────────────────

/// In-memory [`AssetStore`].
#[derive(Default)]
pub struct MockAssets {
    entries: HashMap<String, Vec<u8>>,
}

impl MockAssets {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with one asset.
    pub fn with(name: &str, data: Vec<u8>) -> Self {
        let mut assets = Self::new();
        assets.insert(name, data);
        assets
    }

    /// Add or replace an asset.
    pub fn insert(&mut self, name: &str, data: Vec<u8>) {
        self.entries.insert(name.into(), data);
    }
}

impl AssetStore for MockAssets {
    fn find(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(Vec::as_slice)
    }
}
