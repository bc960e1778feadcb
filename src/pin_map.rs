//! Symbolic names of the expander pins.
use core::fmt;

/// Description of one expander pin.
#[derive(Debug, PartialEq, Eq)]
pub struct PinDesc {
    /// Canonical name, `IO0` to `IO7`.
    pub id: &'static str,
    /// Alternative names accepted by the lookup.
    pub aliases: [&'static str; 2],
    /// Bit position in every register.
    pub index: u8,
}

/// The eight pins of a PCA9554.
pub const PIN_MAP: [PinDesc; 8] = [
    PinDesc { id: "IO0", aliases: ["0", "GPIO_0"], index: 0 },
    PinDesc { id: "IO1", aliases: ["1", "GPIO_1"], index: 1 },
    PinDesc { id: "IO2", aliases: ["2", "GPIO_2"], index: 2 },
    PinDesc { id: "IO3", aliases: ["3", "GPIO_3"], index: 3 },
    PinDesc { id: "IO4", aliases: ["4", "GPIO_4"], index: 4 },
    PinDesc { id: "IO5", aliases: ["5", "GPIO_5"], index: 5 },
    PinDesc { id: "IO6", aliases: ["6", "GPIO_6"], index: 6 },
    PinDesc { id: "IO7", aliases: ["7", "GPIO_7"], index: 7 },
];

/// Key used to look up a pin: its name, one of its aliases, or its bit index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinKey<'k> {
    Name(&'k str),
    Index(u8),
}

impl<'k> From<&'k str> for PinKey<'k> {
    fn from(name: &'k str) -> Self {
        PinKey::Name(name)
    }
}

impl From<u8> for PinKey<'_> {
    fn from(index: u8) -> Self {
        PinKey::Index(index)
    }
}

impl fmt::Display for PinKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinKey::Name(name) => f.write_str(name),
            PinKey::Index(index) => write!(f, "{}", index),
        }
    }
}

pub(crate) fn lookup(key: PinKey<'_>) -> Option<&'static PinDesc> {
    match key {
        PinKey::Index(index) => PIN_MAP.get(usize::from(index)),
        PinKey::Name(name) => PIN_MAP
            .iter()
            .find(|desc| desc.id == name || desc.aliases.iter().any(|alias| *alias == name)),
    }
}
