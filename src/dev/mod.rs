//! The device module contains the register-level driver of the chip.
//!
//! In most cases you will not need anything from here explicitly, the exposed types at the root of
//! the crate should be enough.

pub mod pca9554;
