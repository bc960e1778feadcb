use core::time::Duration;
use embedded_hal::i2c;

/// Error reported by a host [`InterruptLine`][crate::InterruptLine].
pub type LineError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors of the driver, generic over the error type of the I2C bus.
#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    /// The bus transfer failed.  The register cache keeps its last known value.
    #[error("i2c bus error: {0:?}")]
    Bus(E),
    /// The device already has an interrupt pin, the chip only has one INT output.
    #[error("interrupt pin has already been set to {0}")]
    InterruptPinAlreadySet(u32),
    /// The host interrupt line could not be configured or released.
    #[error("interrupt line error")]
    Line(#[source] LineError),
    /// No pin of the chip matches the requested name, alias or index.
    #[error("could not find pin matching {0}")]
    UnknownPin(String),
    /// The chip has no hardware for the requested feature.
    #[error("{0} is not supported")]
    NotSupported(&'static str),
    /// Pulse measurement did not finish before its deadline.
    #[error("pulse timing exceeded its deadline of {0:?}")]
    Timeout(Duration),
}

impl<E: core::fmt::Debug> embedded_hal::digital::Error for Error<E> {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// Failure while servicing an interrupt.
///
/// Without the input register the driver cannot know which pins changed, so the whole dispatch
/// cycle is dropped and this fault is handed back to the host that invoked the edge callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("pca9554 at {address:#04x}: can't read input register ({kind})")]
pub struct InterruptFault {
    /// Bus address of the device.
    pub address: u8,
    /// What went wrong on the bus.
    pub kind: i2c::ErrorKind,
}

#[cfg(test)]
mod tests {
    use super::{Error, InterruptFault};
    use embedded_hal::i2c::ErrorKind;

    #[test]
    fn messages() {
        let err: Error<ErrorKind> = Error::InterruptPinAlreadySet(17);
        assert_eq!(err.to_string(), "interrupt pin has already been set to 17");

        let err: Error<ErrorKind> = Error::NotSupported("pull-up");
        assert_eq!(err.to_string(), "pull-up is not supported");

        let fault = InterruptFault {
            address: 0x38,
            kind: ErrorKind::Bus,
        };
        assert!(fault.to_string().starts_with("pca9554 at 0x38"));
    }

    #[test]
    fn line_error_is_source() {
        use std::error::Error as _;

        let err: Error<ErrorKind> = Error::Line("gpio busy".into());
        assert_eq!(err.source().unwrap().to_string(), "gpio busy");
    }
}
