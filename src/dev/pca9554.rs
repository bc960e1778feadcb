//! Support for the `PCA9554` "8-bit I2C-bus and SMBus I/O port with interrupt"
use crate::common::{Edge, Regs, Registers};
use crate::error::{Error, InterruptFault};
use crate::interrupt::{Dispatcher, EdgeCallback, InterruptLine};
use crate::mutex::Shared;
use crate::pin::{DigitalPin, WatchHandler};
use crate::pin_map::{self, PinKey};
use crate::I2cExt;
use embedded_hal::i2c::Error as _;
use log::{debug, error, trace};
use std::sync::{Arc, Weak};

/// `PCA9554` "8-bit I2C-bus and SMBus I/O port with interrupt"
///
/// The device owns the bus handle and a cache of the four chip registers.  Writes go to the chip
/// first and only update the cache once the transfer succeeded; explicit reads refresh the cache.
/// Nothing refreshes it behind the caller's back, so changes made by another bus master stay
/// invisible until the next read (see [`sync_registers()`][Self::sync_registers]).
///
/// All state sits behind one lock which is shared with the interrupt callback, so the device can
/// be used from the owning thread while the host delivers edges on its own thread.
///
/// Dropping the device drops a still bound interrupt line on the dropping thread, without closing
/// it.  Edges that arrive afterwards are ignored.
pub struct Pca9554<I2C> {
    inner: Arc<Inner<I2C>>,
    /// `false` for the short-lived handle the interrupt callback builds.
    owner: bool,
}

struct Inner<I2C> {
    address: u8,
    state: Shared<State<I2C>>,
}

pub(crate) struct State<I2C> {
    i2c: I2C,
    regs: Registers,
    interrupt: Option<Box<dyn InterruptLine>>,
    pub(crate) watchers: Dispatcher<WatchHandler<I2C>>,
}

pub struct Parts<'a, I2C> {
    pub io0: DigitalPin<'a, I2C>,
    pub io1: DigitalPin<'a, I2C>,
    pub io2: DigitalPin<'a, I2C>,
    pub io3: DigitalPin<'a, I2C>,
    pub io4: DigitalPin<'a, I2C>,
    pub io5: DigitalPin<'a, I2C>,
    pub io6: DigitalPin<'a, I2C>,
    pub io7: DigitalPin<'a, I2C>,
}

impl<I2C> Pca9554<I2C> {
    /// Create a driver for the chip at the 7-bit `address` (`0x20..=0x27` for the PCA9554,
    /// `0x38..=0x3f` for the PCA9554A).
    ///
    /// No bus transfer happens here; the cache starts out at the power-on defaults.
    ///
    /// # Panics
    ///
    /// If `address` does not fit in 7 bits (an 8-bit address with the R/W bit included).
    pub fn new(i2c: I2C, address: u8) -> Self {
        assert!(address < 0x80, "not a 7-bit address: {:#04x}", address);
        Self {
            inner: Arc::new(Inner {
                address,
                state: Shared::create(State {
                    i2c,
                    regs: Registers::POWER_ON,
                    interrupt: None,
                    watchers: Dispatcher::new(),
                }),
            }),
            owner: true,
        }
    }

    pub fn address(&self) -> u8 {
        self.inner.address
    }

    /// Snapshot of the cached registers.
    pub fn registers(&self) -> Registers {
        self.lock(|st| st.regs)
    }

    pub fn has_interrupt_pin(&self) -> bool {
        self.lock(|st| st.interrupt.is_some())
    }

    /// Get the pin matching `key`: its name (`"IO3"`), an alias (`"3"`, `"GPIO_3"`) or its index.
    pub fn digital_pin<'k, K>(&self, key: K) -> Result<DigitalPin<'_, I2C>, Error<I2C::BusError>>
    where
        I2C: crate::I2cBus,
        K: Into<PinKey<'k>>,
    {
        let key = key.into();
        match pin_map::lookup(key) {
            Some(desc) => Ok(DigitalPin::new(self, desc.index)),
            None => Err(Error::UnknownPin(key.to_string())),
        }
    }

    pub fn split(&self) -> Parts<'_, I2C> {
        Parts {
            io0: DigitalPin::new(self, 0),
            io1: DigitalPin::new(self, 1),
            io2: DigitalPin::new(self, 2),
            io3: DigitalPin::new(self, 3),
            io4: DigitalPin::new(self, 4),
            io5: DigitalPin::new(self, 5),
            io6: DigitalPin::new(self, 6),
            io7: DigitalPin::new(self, 7),
        }
    }

    pub(crate) fn lock<R, F: FnOnce(&mut State<I2C>) -> R>(&self, f: F) -> R {
        self.inner.state.lock(f)
    }

    /// Call every watching pin whose bit is set in `snapshot`.
    ///
    /// This is the fan-out stage of the interrupt callback; it can also be fed by hand.  Handlers
    /// run without the state lock held, so they may use their pin or change registrations.
    pub fn dispatch(&self, snapshot: u8) {
        let targets = self.lock(|st| st.watchers.targets(snapshot));
        trace!(
            "pca9554@{:#04x}: dispatching [{:#04x}] to {} pin(s)",
            self.inner.address,
            snapshot,
            targets.len()
        );
        for (index, handler) in targets {
            let pin = DigitalPin::new(self, index);
            handler(&pin);
        }
    }
}

impl<I2C: crate::I2cBus> Pca9554<I2C> {
    fn write_register(&self, reg: Regs, value: u8) -> Result<(), Error<I2C::BusError>> {
        let address = self.inner.address;
        self.lock(|st| {
            st.i2c
                .write_reg(address, reg, value)
                .map_err(Error::Bus)?;
            st.regs.set(reg, value);
            Ok(())
        })
    }

    fn read_register(&self, reg: Regs) -> Result<u8, Error<I2C::BusError>> {
        let address = self.inner.address;
        self.lock(|st| {
            let value = st.i2c.read_reg(address, reg).map_err(Error::Bus)?;
            st.regs.set(reg, value);
            Ok(value)
        })
    }

    /// Replace the bits outside `clear_mask` of the cached `reg` with `bits` and write the result.
    ///
    /// Cache read and bus write happen under one lock so a concurrent update of a different pin
    /// can't be lost.
    pub(crate) fn update_register(
        &self,
        reg: Regs,
        clear_mask: u8,
        bits: u8,
    ) -> Result<u8, Error<I2C::BusError>> {
        let address = self.inner.address;
        self.lock(|st| {
            let value = (st.regs.get(reg) & clear_mask) | bits;
            debug!("pca9554@{:#04x}: updating {:?} to [{:#04x}]", address, reg, value);
            st.i2c
                .write_reg(address, reg, value)
                .map_err(Error::Bus)?;
            st.regs.set(reg, value);
            Ok(value)
        })
    }

    /// Write pin directions (register 3).  A set bit makes the pin an input.
    pub fn write_configuration(&self, conf: u8) -> Result<(), Error<I2C::BusError>> {
        debug!(
            "pca9554@{:#04x}: new GPIO configuration [{:#04x}]",
            self.inner.address, conf
        );
        self.write_register(Regs::Configuration, conf)
    }

    /// Read pin directions (register 3).
    pub fn read_configuration(&self) -> Result<u8, Error<I2C::BusError>> {
        let conf = self.read_register(Regs::Configuration)?;
        debug!(
            "pca9554@{:#04x}: current GPIO configuration [{:#04x}]",
            self.inner.address, conf
        );
        Ok(conf)
    }

    /// Write polarity inversion (register 2).  A set bit inverts the value read for that pin.
    pub fn write_polarity_inversion(&self, reg: u8) -> Result<(), Error<I2C::BusError>> {
        debug!(
            "pca9554@{:#04x}: write polarity inversion settings [{:#04x}]",
            self.inner.address, reg
        );
        self.write_register(Regs::PolarityInversion, reg)
    }

    /// Read polarity inversion (register 2).
    pub fn read_polarity_inversion(&self) -> Result<u8, Error<I2C::BusError>> {
        let reg = self.read_register(Regs::PolarityInversion)?;
        debug!(
            "pca9554@{:#04x}: current polarity inversion settings [{:#04x}]",
            self.inner.address, reg
        );
        Ok(reg)
    }

    /// Read the logic level of all pins (register 0), whatever their direction.
    pub fn read_input(&self) -> Result<u8, Error<I2C::BusError>> {
        let b = self.read_register(Regs::InputPort)?;
        debug!("pca9554@{:#04x}: reading [{:#04x}] from input", self.inner.address, b);
        Ok(b)
    }

    /// Write the output register (register 1).  Bits of input pins are ignored by the chip.
    pub fn write_output(&self, b: u8) -> Result<(), Error<I2C::BusError>> {
        debug!("pca9554@{:#04x}: writing [{:#04x}] to pins", self.inner.address, b);
        self.write_register(Regs::OutputPort, b)
    }

    /// Read back the output register (register 1).
    pub fn read_output(&self) -> Result<u8, Error<I2C::BusError>> {
        let b = self.read_register(Regs::OutputPort)?;
        debug!("pca9554@{:#04x}: reading [{:#04x}] from output", self.inner.address, b);
        Ok(b)
    }

    /// Refresh the whole cache from the chip.
    ///
    /// Registers are read in address order; on failure the ones read so far stay refreshed.
    pub fn sync_registers(&self) -> Result<Registers, Error<I2C::BusError>> {
        self.read_input()?;
        self.read_output()?;
        self.read_polarity_inversion()?;
        self.read_configuration()?;
        Ok(self.registers())
    }

    /// Read the input register and keep only the bits of input-configured pins.
    fn read_interrupt_snapshot(&self) -> Result<u8, I2C::BusError> {
        let address = self.inner.address;
        self.lock(|st| {
            let snapshot = st.i2c.read_reg(address, Regs::InputPort)?;
            debug!("pca9554@{:#04x}: reading [{:#04x}] from input", address, snapshot);
            st.regs.input = snapshot;
            Ok(st.regs.input_pins(snapshot))
        })
    }

    fn service_interrupt<F: FnMut(u8)>(&self, mut handler: F) -> Result<u8, I2C::BusError> {
        let b = self.read_interrupt_snapshot()?;
        trace!("pca9554@{:#04x}: interrupt [{:#04x}]", self.inner.address, b);
        handler(b);
        self.dispatch(b);
        Ok(b)
    }

    /// Run one interrupt cycle by hand: read the input register, mask it with the configuration
    /// and fan it out to the watching pins.
    ///
    /// Meant for hosts that poll the INT line instead of binding it with
    /// [`set_interrupt_pin()`][Self::set_interrupt_pin].  Returns the masked byte.
    pub fn handle_interrupt(&self) -> Result<u8, Error<I2C::BusError>> {
        self.service_interrupt(|_| {}).map_err(Error::Bus)
    }

    /// Bind the host line connected to the INT output of the chip.
    ///
    /// The line is made an input and watched for falling edges (INT is active-low).  On every
    /// edge the input register is read and masked with the configuration, then `handler` is called
    /// with the result, then the watching pins are dispatched.  A failed read aborts that cycle and
    /// is returned to the host as an [`InterruptFault`].
    ///
    /// The chip has a single INT output, so binding a second line fails with
    /// [`Error::InterruptPinAlreadySet`] and leaves the first binding in place.
    pub fn set_interrupt_pin<L, F>(&self, line: L, handler: F) -> Result<(), Error<I2C::BusError>>
    where
        I2C: Send + 'static,
        L: InterruptLine + 'static,
        F: FnMut(u8) + Send + 'static,
    {
        let mut line = line;
        let callback = self.interrupt_callback(handler);
        self.lock(|st| {
            if let Some(bound) = &st.interrupt {
                return Err(Error::InterruptPinAlreadySet(bound.number()));
            }

            line.set_input().map_err(Error::Line)?;
            line.watch(Edge::Falling, callback).map_err(Error::Line)?;

            debug!(
                "pca9554@{:#04x}: interrupt pin set to {}",
                self.inner.address,
                line.number()
            );
            st.interrupt = Some(Box::new(line));
            Ok(())
        })
    }

    fn interrupt_callback<F>(&self, handler: F) -> EdgeCallback
    where
        I2C: Send + 'static,
        F: FnMut(u8) + Send + 'static,
    {
        let weak: Weak<Inner<I2C>> = Arc::downgrade(&self.inner);
        let address = self.inner.address;
        let mut handler = handler;
        Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                // device is gone, nobody left to notify
                return Ok(());
            };
            let device = Pca9554 {
                inner,
                owner: false,
            };
            match device.service_interrupt(&mut handler) {
                Ok(_) => Ok(()),
                Err(e) => {
                    let fault = InterruptFault {
                        address,
                        kind: e.kind(),
                    };
                    error!("{}", fault);
                    Err(fault)
                }
            }
        })
    }

    /// Release the interrupt line, if one is bound.
    ///
    /// If the line fails to close it stays bound and the error is returned.  Register and pin
    /// operations keep working either way.
    pub fn close(&self) -> Result<(), Error<I2C::BusError>> {
        // the host may wait for a running callback when closing, which needs the lock
        let Some(mut line) = self.lock(|st| st.interrupt.take()) else {
            return Ok(());
        };

        match line.close() {
            Ok(()) => {
                debug!(
                    "pca9554@{:#04x}: released interrupt pin {}",
                    self.inner.address,
                    line.number()
                );
                Ok(())
            }
            Err(e) => {
                self.lock(|st| {
                    if st.interrupt.is_none() {
                        st.interrupt = Some(line);
                    }
                });
                Err(Error::Line(e))
            }
        }
    }
}

impl<I2C> Drop for Pca9554<I2C> {
    fn drop(&mut self) {
        if !self.owner {
            return;
        }
        // a callback may still hold the state; the line must not end up dropped on its thread
        let line = self.lock(|st| st.interrupt.take());
        drop(line);
    }
}
