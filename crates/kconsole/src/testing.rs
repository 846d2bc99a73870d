//! Recording console for unit tests.

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::console::{Console, ConsoleName};

pub struct MockConsole {
    name: ConsoleName,
    activations: AtomicUsize,
    deactivations: AtomicUsize,
    /// Bytes `put` still accepts before declining.
    budget: AtomicUsize,
    output: spin::Mutex<Vec<u8>>,
    input: spin::Mutex<Vec<u8>>,
}

impl MockConsole {
    pub const fn new(name: &str) -> Self {
        Self {
            name: ConsoleName::new(name),
            activations: AtomicUsize::new(0),
            deactivations: AtomicUsize::new(0),
            budget: AtomicUsize::new(usize::MAX),
            output: spin::Mutex::new(Vec::new()),
            input: spin::Mutex::new(Vec::new()),
        }
    }

    /// Accept `budget` more bytes, then decline everything.
    pub fn limit(&self, budget: usize) {
        self.budget.store(budget, Ordering::Relaxed);
    }

    pub fn feed(&self, data: &[u8]) {
        self.input.lock().extend_from_slice(data);
    }

    pub fn output(&self) -> Vec<u8> {
        self.output.lock().clone()
    }

    pub fn activations(&self) -> usize {
        self.activations.load(Ordering::Relaxed)
    }

    pub fn deactivations(&self) -> usize {
        self.deactivations.load(Ordering::Relaxed)
    }
}

impl Console for MockConsole {
    fn name(&self) -> &ConsoleName {
        &self.name
    }

    fn activate(&self) {
        self.activations.fetch_add(1, Ordering::Relaxed);
    }

    fn deactivate(&self) {
        self.deactivations.fetch_add(1, Ordering::Relaxed);
    }

    fn read(&self, data: &mut [u8]) -> usize {
        let mut input = self.input.lock();
        let count = data.len().min(input.len());
        data[..count].copy_from_slice(&input[..count]);
        input.drain(..count);
        count
    }

    fn write(&self, data: &[u8]) -> usize {
        data.iter().take_while(|&&byte| self.put(byte)).count()
    }

    fn put(&self, byte: u8) -> bool {
        let granted = self
            .budget
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |left| left.checked_sub(1))
            .is_ok();
        if granted {
            self.output.lock().push(byte);
        }
        granted
    }
}
