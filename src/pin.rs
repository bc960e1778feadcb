use crate::common::{Direction, Edge, Regs};
use crate::error::Error;
use crate::pin_map::PIN_MAP;
use crate::Pca9554;
use core::fmt;
use embedded_hal::digital::{self as hal_digital, PinState};
use log::trace;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Handler of a watching pin, called with the pin whose bit was set in the interrupt snapshot.
pub(crate) type WatchHandler<I2C> = Arc<dyn Fn(&DigitalPin<'_, I2C>) + Send + Sync + 'static>;

/// One of the eight pins of a [`Pca9554`].
///
/// `DigitalPin` is a view on a single bit of the device registers; it holds no state of its own.
/// Get one by name with [`Pca9554::digital_pin()`] or all of them with [`Pca9554::split()`].
pub struct DigitalPin<'a, I2C> {
    device: &'a Pca9554<I2C>,
    index: u8,
    bit_mask: u8,
    clear_mask: u8,
}

impl<'a, I2C> DigitalPin<'a, I2C> {
    pub(crate) fn new(device: &'a Pca9554<I2C>, index: u8) -> Self {
        assert!(index < 8);
        let bit_mask = 1 << index;
        Self {
            device,
            index,
            bit_mask,
            clear_mask: !bit_mask,
        }
    }

    /// Bit position of this pin, `0..=7`.
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Canonical name of this pin, `IO0` to `IO7`.
    pub fn id(&self) -> &'static str {
        PIN_MAP[usize::from(self.index)].id
    }

    pub fn bit_mask(&self) -> u8 {
        self.bit_mask
    }

    pub fn clear_mask(&self) -> u8 {
        self.clear_mask
    }

    /// The device this pin belongs to.
    pub fn device(&self) -> &'a Pca9554<I2C> {
        self.device
    }

    /// Whether this pin currently has an interrupt handler registered.
    pub fn is_watching(&self) -> bool {
        self.device.lock(|st| st.watchers.is_registered(self.index))
    }
}

impl<'a, I2C: crate::I2cBus> DigitalPin<'a, I2C> {
    pub fn set_direction(&self, dir: Direction) -> Result<(), Error<I2C::BusError>> {
        let bits = match dir {
            Direction::Input => self.bit_mask,
            Direction::Output => 0,
        };
        self.device
            .update_register(Regs::Configuration, self.clear_mask, bits)
            .map(|_| ())
    }

    /// Invert the value read from this pin (or stop doing so).
    pub fn active_low(&self, inverted: bool) -> Result<(), Error<I2C::BusError>> {
        let bits = if inverted { self.bit_mask } else { 0 };
        self.device
            .update_register(Regs::PolarityInversion, self.clear_mask, bits)
            .map(|_| ())
    }

    /// Drive this pin.  Only the bit of this pin changes in the output register.
    pub fn write(&self, state: PinState) -> Result<(), Error<I2C::BusError>> {
        let bits = match state {
            PinState::High => self.bit_mask,
            PinState::Low => 0,
        };
        self.device
            .update_register(Regs::OutputPort, self.clear_mask, bits)
            .map(|_| ())
    }

    /// Read the current level of this pin from the input register.
    pub fn read(&self) -> Result<PinState, Error<I2C::BusError>> {
        let reg = self.device.read_input()?;
        Ok(PinState::from(reg & self.bit_mask != 0))
    }

    /// Level this pin was last driven to, according to the output cache.
    pub fn output_state(&self) -> PinState {
        PinState::from(self.device.registers().output & self.bit_mask != 0)
    }

    /// Call `handler` whenever an interrupt reports this pin.
    ///
    /// The pin is switched to input first.  `edge` is not used to filter: the handler runs for
    /// every interrupt in which this pin's input bit reads as set.  A previous handler of the same
    /// pin is replaced.
    pub fn watch<F>(&self, edge: Edge, handler: F) -> Result<(), Error<I2C::BusError>>
    where
        F: Fn(&DigitalPin<'_, I2C>) + Send + Sync + 'static,
    {
        self.set_direction(Direction::Input)?;
        trace!("{}: watching for {:?}", self, edge);
        let handler: WatchHandler<I2C> = Arc::new(handler);
        self.device
            .lock(|st| st.watchers.register(self.index, handler));
        Ok(())
    }

    /// Remove the interrupt handler of this pin.  Does nothing if there is none.
    pub fn stop_watching(&self) -> Result<(), Error<I2C::BusError>> {
        if self.device.lock(|st| st.watchers.unregister(self.index)) {
            trace!("{}: stopped watching", self);
        }
        Ok(())
    }

    /// Measure how long the pin stays at `state`.
    ///
    /// Polls the input register until the pin is at the opposite level (so a pulse that is already
    /// running is skipped), then until it reaches `state`, then until it leaves it again.  Returns
    /// the time between the last two transitions.
    ///
    /// This is a busy loop on the bus.  Without a `deadline` it waits forever for a pin that never
    /// toggles; with one it gives up with [`Error::Timeout`] once `deadline` has passed since the
    /// call.
    pub fn time_pulse(
        &self,
        state: PinState,
        deadline: Option<Duration>,
    ) -> Result<Duration, Error<I2C::BusError>> {
        let started = Instant::now();
        let wait_for = |level: PinState| -> Result<(), Error<I2C::BusError>> {
            loop {
                if self.read()? == level {
                    return Ok(());
                }
                if let Some(deadline) = deadline {
                    if started.elapsed() >= deadline {
                        return Err(Error::Timeout(deadline));
                    }
                }
            }
        };

        wait_for(!state)?;
        wait_for(state)?;
        let pulse_start = Instant::now();
        wait_for(!state)?;
        Ok(pulse_start.elapsed())
    }

    pub fn pull_up(&self) -> Result<(), Error<I2C::BusError>> {
        Err(Error::NotSupported("pull-up"))
    }

    pub fn pull_down(&self) -> Result<(), Error<I2C::BusError>> {
        Err(Error::NotSupported("pull-down"))
    }

    /// Release this pin's interrupt registration.
    pub fn close(&self) -> Result<(), Error<I2C::BusError>> {
        self.stop_watching()
    }
}

impl<I2C> fmt::Display for DigitalPin<'_, I2C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#04x}", self.id(), self.device.address())
    }
}

impl<I2C> fmt::Debug for DigitalPin<'_, I2C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigitalPin")
            .field("address", &self.device.address())
            .field("index", &self.index)
            .finish()
    }
}

impl<'a, I2C: crate::I2cBus> hal_digital::ErrorType for DigitalPin<'a, I2C> {
    type Error = Error<I2C::BusError>;
}

impl<'a, I2C: crate::I2cBus> hal_digital::InputPin for DigitalPin<'a, I2C> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read()? == PinState::High)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read()? == PinState::Low)
    }
}

impl<'a, I2C: crate::I2cBus> hal_digital::OutputPin for DigitalPin<'a, I2C> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(PinState::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(PinState::High)
    }
}

impl<'a, I2C: crate::I2cBus> hal_digital::StatefulOutputPin for DigitalPin<'a, I2C> {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.output_state() == PinState::High)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.output_state() == PinState::Low)
    }
}
