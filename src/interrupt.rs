//! Interrupt fan-out.
//!
//! The PCA9554 has a single open-drain INT output which is pulled low whenever an input pin
//! changes.  The host watches that line through an [`InterruptLine`]; on every falling edge the
//! device reads its input register and hands the masked byte to a [`Dispatcher`], which decides
//! which of the watching pins get called.
use crate::common::Edge;
use crate::error::{InterruptFault, LineError};
use heapless::LinearMap;

/// Callback installed on the host line, invoked from the host's edge-detection thread.
///
/// An `Err` means the dispatch cycle was aborted and must be reported by the host.
pub type EdgeCallback = Box<dyn FnMut() -> Result<(), InterruptFault> + Send + 'static>;

/// A host GPIO line connected to the INT output of the chip.
pub trait InterruptLine: Send {
    /// Host pin number, used in diagnostics.
    fn number(&self) -> u32;

    /// Configure the line as an input.
    fn set_input(&mut self) -> Result<(), LineError>;

    /// Invoke `callback` on every `edge` of the line, from a host thread.
    ///
    /// The callback must not be invoked from within this method.
    fn watch(&mut self, edge: Edge, callback: EdgeCallback) -> Result<(), LineError>;

    /// Stop watching and release the line.
    fn close(&mut self) -> Result<(), LineError>;
}

/// Registration set of pins watching for interrupts, keyed by pin index.
pub(crate) struct Dispatcher<H> {
    watchers: LinearMap<u8, H, 8>,
}

impl<H: Clone> Dispatcher<H> {
    pub(crate) fn new() -> Self {
        Self {
            watchers: LinearMap::new(),
        }
    }

    /// Insert or replace the handler for pin `index`.
    pub(crate) fn register(&mut self, index: u8, handler: H) {
        assert!(index < 8);
        if self.watchers.insert(index, handler).is_err() {
            unreachable!("at most 8 pins can be registered");
        }
    }

    pub(crate) fn unregister(&mut self, index: u8) -> bool {
        self.watchers.remove(&index).is_some()
    }

    pub(crate) fn is_registered(&self, index: u8) -> bool {
        self.watchers.contains_key(&index)
    }

    /// Snapshot of all registered handlers whose pin bit is set in `snapshot`.
    ///
    /// The snapshot is taken so the handlers can run without the state lock and freely register or
    /// unregister pins themselves.
    pub(crate) fn targets(&self, snapshot: u8) -> heapless::Vec<(u8, H), 8> {
        self.watchers
            .iter()
            .filter(|(index, _)| snapshot & (1 << **index) != 0)
            .map(|(index, handler)| (*index, handler.clone()))
            .collect()
    }
}
