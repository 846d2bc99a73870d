//! Console registry.
//!
//! Holds up to [`MAX_CONSOLES`] consoles in registration order and selects
//! at most one of them as the active console. All console traffic
//! (`read`, `write`, `put`) goes to the active console.
//!
//! Invariants:
//!   - entries are identity-distinct and keep their relative order when
//!     others are removed;
//!   - the active console, when there is one, is always registered;
//!   - switching the active console always deactivates the old one before
//!     activating the new one.
//!
//! The registry does no locking of its own. The kernel keeps it behind a
//! lock in its boot context; tests simply own one.

use core::fmt;

use thiserror::Error;

use crate::console::{same_console, Console};

/// Maximum number of consoles that can be registered at once.
pub const MAX_CONSOLES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("console registry is full ({MAX_CONSOLES} consoles)")]
    Full,
    #[error("console is already registered")]
    AlreadyRegistered,
    #[error("console is not registered")]
    NotRegistered,
    #[error("no console is active")]
    NoActiveConsole,
}

/// Bounded, ordered set of consoles plus the active selection.
///
/// `'a` is the registration contract: every console must outlive the
/// registry it is registered with.
pub struct ConsoleRegistry<'a> {
    consoles: [Option<&'a dyn Console>; MAX_CONSOLES],
    count: usize,
    active: Option<&'a dyn Console>,
}

impl<'a> ConsoleRegistry<'a> {
    pub const fn new() -> Self {
        Self {
            consoles: [None; MAX_CONSOLES],
            count: 0,
            active: None,
        }
    }

    /// Append `console`.
    ///
    /// The first console registered into an empty registry becomes active.
    pub fn register(&mut self, console: &'a dyn Console) -> Result<(), RegistryError> {
        if self.count >= MAX_CONSOLES {
            klog::warn!("console: cannot register {}: registry full", console.name());
            return Err(RegistryError::Full);
        }
        if self.is_registered(console) {
            return Err(RegistryError::AlreadyRegistered);
        }

        self.consoles[self.count] = Some(console);
        self.count += 1;
        klog::debug!("console: registered {} ({}/{})", console.name(), self.count, MAX_CONSOLES);

        if self.count == 1 {
            self.activate(console)?;
        }
        Ok(())
    }

    /// Remove `console`, deactivating it first if it is active.
    ///
    /// No other console is promoted in its place.
    pub fn deregister(&mut self, console: &dyn Console) -> Result<(), RegistryError> {
        let index = self.position(console).ok_or(RegistryError::NotRegistered)?;

        if self.is_active(console) {
            self.deactivate()?;
        }

        self.consoles.copy_within(index + 1..self.count, index);
        self.count -= 1;
        self.consoles[self.count] = None;
        klog::debug!("console: deregistered {} ({}/{})", console.name(), self.count, MAX_CONSOLES);
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The console at `index` in registration order.
    pub fn get(&self, index: usize) -> Option<&'a dyn Console> {
        if index < self.count {
            self.consoles[index]
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a dyn Console> + '_ {
        self.consoles[..self.count].iter().flatten().copied()
    }

    pub fn is_registered(&self, console: &dyn Console) -> bool {
        self.position(console).is_some()
    }

    fn position(&self, console: &dyn Console) -> Option<usize> {
        self.iter().position(|entry| same_console(entry, console))
    }

    fn is_active(&self, console: &dyn Console) -> bool {
        self.active
            .map_or(false, |active| same_console(active, console))
    }

    /// Make `console` the active console.
    ///
    /// The previously active console, if any, is deactivated first.
    pub fn activate(&mut self, console: &'a dyn Console) -> Result<(), RegistryError> {
        if !self.is_registered(console) {
            return Err(RegistryError::NotRegistered);
        }

        if let Some(previous) = self.active.take() {
            previous.deactivate();
        }
        self.active = Some(console);
        console.activate();
        klog::debug!("console: {} is active", console.name());
        Ok(())
    }

    /// Deactivate the active console and leave none active.
    pub fn deactivate(&mut self) -> Result<(), RegistryError> {
        let active = self.active.take().ok_or(RegistryError::NoActiveConsole)?;
        active.deactivate();
        klog::debug!("console: {} deactivated", active.name());
        Ok(())
    }

    pub fn active(&self) -> Option<&'a dyn Console> {
        self.active
    }

    /// Read from the active console; 0 when none is active.
    pub fn read(&self, data: &mut [u8]) -> usize {
        self.active.map_or(0, |console| console.read(data))
    }

    /// Write to the active console; 0 when none is active.
    pub fn write(&self, data: &[u8]) -> usize {
        self.active.map_or(0, |console| console.write(data))
    }

    /// Put one byte to the active console; `false` when none is active.
    pub fn put(&self, byte: u8) -> bool {
        self.active.map_or(false, |console| console.put(byte))
    }
}

impl Default for ConsoleRegistry<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConsoleRegistry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleRegistry")
            .field("consoles", &DebugNames(self))
            .field("active", &self.active.map(|console| console.name()))
            .finish()
    }
}

struct DebugNames<'r, 'a>(&'r ConsoleRegistry<'a>);

impl fmt::Debug for DebugNames<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.0.iter().map(|console| console.name()))
            .finish()
    }
}
