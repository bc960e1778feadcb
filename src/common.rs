/// Direction of a single expander pin, as stored in the configuration register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Configuration bit set.
    Input,
    /// Configuration bit cleared.
    Output,
}

/// Edge selection passed through [`watch`][crate::DigitalPin::watch] and
/// [`InterruptLine::watch`][crate::InterruptLine::watch].
///
/// The interrupt fan-out reports every pin whose bit is set in the masked input snapshot; it does
/// not filter on the edge kind.  For the expander pins this is a hint only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    None,
    Rising,
    Falling,
    Both,
}

/// The four registers of the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Regs {
    InputPort = 0x00,
    OutputPort = 0x01,
    PolarityInversion = 0x02,
    Configuration = 0x03,
}

impl From<Regs> for u8 {
    fn from(r: Regs) -> u8 {
        r as u8
    }
}

/// Cached copy of the chip registers.
///
/// Bit `n` of every field belongs to pin `n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    /// Last logic levels read from the input port register.
    pub input: u8,
    /// Last value written to (or read from) the output port register.
    pub output: u8,
    /// Polarity inversion, a set bit inverts the value read for that pin.
    pub polarity: u8,
    /// Pin directions, a set bit makes the pin an input.
    pub configuration: u8,
}

impl Registers {
    /// Register contents after power-on reset, with the output cache starting cleared.
    pub const POWER_ON: Registers = Registers {
        input: 0x00,
        output: 0x00,
        polarity: 0x00,
        configuration: 0xff,
    };

    pub(crate) fn get(&self, reg: Regs) -> u8 {
        match reg {
            Regs::InputPort => self.input,
            Regs::OutputPort => self.output,
            Regs::PolarityInversion => self.polarity,
            Regs::Configuration => self.configuration,
        }
    }

    pub(crate) fn set(&mut self, reg: Regs, value: u8) {
        match reg {
            Regs::InputPort => self.input = value,
            Regs::OutputPort => self.output = value,
            Regs::PolarityInversion => self.polarity = value,
            Regs::Configuration => self.configuration = value,
        }
    }

    /// Mask an input snapshot so only input-configured pins remain.
    pub fn input_pins(&self, snapshot: u8) -> u8 {
        snapshot & self.configuration
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::POWER_ON
    }
}

#[cfg(test)]
mod tests {
    use super::{Registers, Regs};

    #[test]
    fn register_slots() {
        let mut regs = Registers::default();
        assert_eq!(regs.get(Regs::Configuration), 0xff);

        regs.set(Regs::OutputPort, 0x40);
        regs.set(Regs::PolarityInversion, 0x03);
        assert_eq!(regs.output, 0x40);
        assert_eq!(regs.polarity, 0x03);
        assert_eq!(regs.get(Regs::InputPort), 0x00);
    }

    #[test]
    fn masks_output_pins_from_snapshot() {
        let regs = Registers {
            configuration: 0x0f,
            ..Registers::POWER_ON
        };
        assert_eq!(regs.input_pins(0xff), 0x0f);
        assert_eq!(regs.input_pins(0xa6), 0x06);
    }
}
