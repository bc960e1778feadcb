//! Driver for the PCA9554 / PCA9554A 8-bit I2C GPIO expander.
//!
//! Each of the eight pins of the chip is available as a [`DigitalPin`] with its own direction,
//! polarity and level.  The single INT output of the chip can be bound to a host GPIO line
//! ([`InterruptLine`]); every falling edge on it is turned into calls of the handlers registered
//! with [`DigitalPin::watch()`] for the pins that read as set.
//!
//! ```
//! # let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[
//! #     embedded_hal_mock::eh1::i2c::Transaction::write(0x38, vec![0x03, 0x00]),
//! #     embedded_hal_mock::eh1::i2c::Transaction::write(0x38, vec![0x01, 0x40]),
//! # ]);
//! # let mut done = i2c.clone();
//! use pca9554::{Pca9554, PinState};
//!
//! let pca = Pca9554::new(i2c, 0x38);
//! pca.write_configuration(0x00)?;
//!
//! let led = pca.digital_pin("GPIO_6")?;
//! led.write(PinState::High)?;
//! assert_eq!(pca.registers().output, 0x40);
//! # done.done();
//! # Ok::<(), pca9554::Error<embedded_hal::i2c::ErrorKind>>(())
//! ```

mod bus;
mod common;
pub mod dev;
mod error;
mod interrupt;
mod mutex;
mod pin;
mod pin_map;

#[cfg(test)]
mod test_util;

pub use bus::I2cBus;
pub use common::{Direction, Edge, Registers};
pub use embedded_hal::digital::PinState;
pub use error::{Error, InterruptFault, LineError};
pub use interrupt::{EdgeCallback, InterruptLine};
pub use pin::DigitalPin;
pub use pin_map::{PinDesc, PinKey, PIN_MAP};

pub(crate) use bus::I2cExt;

pub use dev::pca9554::{Parts, Pca9554};
