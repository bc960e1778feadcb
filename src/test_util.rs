//! Test doubles: a bus that behaves like the chip's register file, and a host interrupt line.
use crate::{Edge, EdgeCallback, InterruptFault, InterruptLine, LineError};
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};
use std::sync::{Arc, Mutex};

struct Chip {
    /// Register file; slot 0 holds the levels applied to the input pins from outside.
    regs: [u8; 4],
    pointer: usize,
    fail_next: bool,
}

impl Chip {
    fn value(&self, reg: usize) -> u8 {
        let [external, output, polarity, configuration] = self.regs;
        match reg {
            0 => {
                (output & !configuration) | ((external ^ polarity) & configuration)
            }
            r => self.regs[r],
        }
    }
}

/// Bus with one PCA9554 on it that echoes what was written.
///
/// Reading the input register gives the output level of output pins and the externally applied
/// level (see [`set_register()`][Self::set_register] with register 0) of input pins, inverted by
/// the polarity register.
#[derive(Clone)]
pub(crate) struct EchoBus(Arc<Mutex<Chip>>);

impl EchoBus {
    pub(crate) fn new() -> Self {
        Self(Arc::new(Mutex::new(Chip {
            regs: [0x00, 0x00, 0x00, 0xff],
            pointer: 0,
            fail_next: false,
        })))
    }

    pub(crate) fn register(&self, reg: u8) -> u8 {
        self.0.lock().unwrap().value(usize::from(reg))
    }

    pub(crate) fn set_register(&self, reg: u8, value: u8) {
        self.0.lock().unwrap().regs[usize::from(reg)] = value;
    }

    /// Make the next transaction fail without touching the registers.
    pub(crate) fn fail_next(&self) {
        self.0.lock().unwrap().fail_next = true;
    }
}

impl ErrorType for EchoBus {
    type Error = ErrorKind;
}

impl I2c for EchoBus {
    fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut chip = self.0.lock().unwrap();
        if chip.fail_next {
            chip.fail_next = false;
            return Err(ErrorKind::Other);
        }

        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if let Some((reg, rest)) = bytes.split_first() {
                        chip.pointer = usize::from(*reg & 0x03);
                        if let Some(value) = rest.first() {
                            // the input register is read-only
                            if chip.pointer != 0 {
                                let pointer = chip.pointer;
                                chip.regs[pointer] = *value;
                            }
                        }
                    }
                }
                Operation::Read(buf) => {
                    let value = chip.value(chip.pointer);
                    buf.fill(value);
                }
            }
        }
        Ok(())
    }
}

struct Line {
    number: u32,
    input: bool,
    edge: Option<Edge>,
    callback: Option<EdgeCallback>,
    closed: bool,
    fail_set_input: bool,
    fail_watch: bool,
    fail_close: bool,
}

/// Host line that keeps the installed callback so tests can fire edges by hand.
#[derive(Clone)]
pub(crate) struct MockLine(Arc<Mutex<Line>>);

impl MockLine {
    pub(crate) fn new(number: u32) -> Self {
        Self(Arc::new(Mutex::new(Line {
            number,
            input: false,
            edge: None,
            callback: None,
            closed: false,
            fail_set_input: false,
            fail_watch: false,
            fail_close: false,
        })))
    }

    pub(crate) fn is_input(&self) -> bool {
        self.0.lock().unwrap().input
    }

    pub(crate) fn edge(&self) -> Option<Edge> {
        self.0.lock().unwrap().edge
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.0.lock().unwrap().closed
    }

    pub(crate) fn fail_set_input(&self) {
        self.0.lock().unwrap().fail_set_input = true;
    }

    pub(crate) fn fail_watch(&self) {
        self.0.lock().unwrap().fail_watch = true;
    }

    pub(crate) fn fail_close(&self) {
        self.0.lock().unwrap().fail_close = true;
    }

    /// Deliver one edge, the way a host edge thread would.
    pub(crate) fn fire(&self) -> Result<(), InterruptFault> {
        let mut callback = self
            .0
            .lock()
            .unwrap()
            .callback
            .take()
            .expect("line is not watched");
        let result = callback();

        let mut line = self.0.lock().unwrap();
        if line.callback.is_none() && !line.closed {
            line.callback = Some(callback);
        }
        result
    }
}

impl InterruptLine for MockLine {
    fn number(&self) -> u32 {
        self.0.lock().unwrap().number
    }

    fn set_input(&mut self) -> Result<(), LineError> {
        let mut line = self.0.lock().unwrap();
        if line.fail_set_input {
            return Err("line is not exported".into());
        }
        line.input = true;
        Ok(())
    }

    fn watch(&mut self, edge: Edge, callback: EdgeCallback) -> Result<(), LineError> {
        let mut line = self.0.lock().unwrap();
        if line.fail_watch {
            return Err("line is busy".into());
        }
        line.edge = Some(edge);
        line.callback = Some(callback);
        Ok(())
    }

    fn close(&mut self) -> Result<(), LineError> {
        let mut line = self.0.lock().unwrap();
        if line.fail_close {
            return Err("line is busy".into());
        }
        line.closed = true;
        line.callback = None;
        Ok(())
    }
}
