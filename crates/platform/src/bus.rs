//! Shared register bus abstraction
//!
//! Overlay chips are driven through a register-oriented serial bus: every
//! interaction is an ordered stream of `(address, value)` byte pairs, and
//! reads are register reads of a single byte. The bus is shared with other
//! peripheral drivers, so every multi-register interaction runs under a
//! blocking mutual-exclusion lock.
//!
//! The lock is closure-scoped ([`SharedBus::with_lock`]): it is released
//! when the closure returns, including early `?` exits, so no exit path
//! can leave it held.
//!
//! # Read addressing
//!
//! The bus does not add a read marker to the address byte. Chip drivers
//! that reserve a high bit for reads OR it into `reg` themselves.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal::spi::{Operation, SpiDevice};

/// Bus clock selection.
///
/// Concrete frequencies are a board decision; drivers only choose between
/// the board's conservative and fast settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusSpeed {
    /// Conservative clock, used while probing unknown devices
    Low,
    /// Fastest clock the board wiring supports
    #[default]
    High,
}

/// Register-level access to one device on the bus.
pub trait RegisterBus {
    /// Error type
    type Error: core::fmt::Debug;

    /// Write one register.
    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error>;

    /// Read one register.
    fn read_register(&mut self, reg: u8) -> Result<u8, Self::Error>;

    /// Send a pre-built burst of bytes in a single bus transaction.
    fn transfer(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Request a bus clock speed.
    ///
    /// Buses with a fixed clock keep the default, which ignores the request.
    fn set_speed(&mut self, speed: BusSpeed) -> Result<(), Self::Error> {
        let _ = speed;
        Ok(())
    }
}

/// A [`RegisterBus`] shared with other drivers behind a blocking lock.
pub trait SharedBus {
    /// The device handle available while the lock is held
    type Bus: RegisterBus;

    /// Run `f` with exclusive access to the bus.
    ///
    /// Blocks until the lock is available. The lock is held for the whole
    /// closure and released when it returns. Calls must not nest.
    fn with_lock<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut Self::Bus) -> R;
}

/// Error type of the device behind a [`SharedBus`].
pub type SharedBusError<S> = <<S as SharedBus>::Bus as RegisterBus>::Error;

impl<M, B> SharedBus for Mutex<M, RefCell<B>>
where
    M: RawMutex,
    B: RegisterBus,
{
    type Bus = B;

    fn with_lock<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut B) -> R,
    {
        self.lock(|cell| f(&mut *cell.borrow_mut()))
    }
}

impl<T> SharedBus for &T
where
    T: SharedBus + ?Sized,
{
    type Bus = T::Bus;

    fn with_lock<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut Self::Bus) -> R,
    {
        (**self).with_lock(f)
    }
}

/// [`RegisterBus`] over any embedded-hal [`SpiDevice`].
///
/// `SpiDevice` manages chip-select per transaction. Register writes are two
/// byte transactions; reads send the address byte then clock one byte back
/// inside the same transaction.
pub struct SpiRegisterBus<D> {
    spi: D,
}

impl<D: SpiDevice> SpiRegisterBus<D> {
    /// Wrap a configured SPI device.
    pub fn new(spi: D) -> Self {
        Self { spi }
    }

    /// Release the underlying SPI device.
    pub fn release(self) -> D {
        self.spi
    }
}

impl<D: SpiDevice> RegisterBus for SpiRegisterBus<D> {
    type Error = D::Error;

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error> {
        self.spi.write(&[reg, value])
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, Self::Error> {
        let mut value = [0u8];
        self.spi
            .transaction(&mut [Operation::Write(&[reg]), Operation::Read(&mut value)])?;
        let [byte] = value;
        Ok(byte)
    }

    fn transfer(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if data.is_empty() {
            return Ok(());
        }
        self.spi.write(data)
    }
}
