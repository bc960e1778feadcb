use std::sync::{Mutex, PoisonError};

/// Lock around the complete driver state.
///
/// The bus handle, the register cache, the interrupt binding and the pin registrations all live
/// behind this one lock.  It is shared between the thread owning the device and the host thread
/// running the interrupt callback, so every access is scoped to a closure and no guard ever
/// escapes the driver.
pub(crate) struct Shared<T>(Mutex<T>);

impl<T> Shared<T> {
    pub(crate) fn create(v: T) -> Self {
        Self(Mutex::new(v))
    }

    /// Lock the state and give a closure access to it.
    ///
    /// A panic in another holder does not leave the state half-updated (every mutation is a single
    /// assignment after the bus transfer succeeded), so poisoning is ignored.
    pub(crate) fn lock<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> R {
        let mut v = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut v)
    }
}

#[cfg(test)]
mod tests {
    use super::Shared;
    use std::sync::Arc;

    #[test]
    fn survives_poisoning() {
        let shared = Arc::new(Shared::create(1u8));

        let other = Arc::clone(&shared);
        let result = std::thread::spawn(move || {
            other.lock(|_| panic!("holder panicked"));
        })
        .join();
        assert!(result.is_err());

        assert_eq!(shared.lock(|v| *v), 1);
        shared.lock(|v| *v = 2);
        assert_eq!(shared.lock(|v| *v), 2);
    }
}
