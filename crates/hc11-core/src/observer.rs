//! Display observers refreshed once per execution slice.

use std::fmt;

use crate::api::CoreState;

/// A view that redraws itself from the current machine state.
pub trait Observer: Send {
    /// Unique (case-insensitive) name used for registration and removal.
    fn name(&self) -> &str;

    /// Called after each execution slice.
    fn visual_update(&mut self, state: &CoreState);
}

/// Registered observers in insertion order.
#[derive(Default)]
pub struct ObserverList {
    observers: Vec<Box<dyn Observer>>,
}

impl fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.observers.iter().map(|observer| observer.name()))
            .finish()
    }
}

impl ObserverList {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Registers `observer`. Returns `false` if the name is already taken,
    /// ignoring ASCII case.
    pub fn add(&mut self, observer: Box<dyn Observer>) -> bool {
        if self.contains(observer.name()) {
            log::debug!("observer {:?} already registered", observer.name());
            return false;
        }
        log::debug!("observer {:?} registered", observer.name());
        self.observers.push(observer);
        true
    }

    /// Removes the observer called `name`.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Observer>> {
        let index = self
            .observers
            .iter()
            .position(|observer| observer.name().eq_ignore_ascii_case(name))?;
        Some(self.observers.remove(index))
    }

    /// Returns `true` if an observer with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.observers
            .iter()
            .any(|observer| observer.name().eq_ignore_ascii_case(name))
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Calls [`Observer::visual_update`] on every observer in order.
    pub fn notify(&mut self, state: &CoreState) {
        for observer in &mut self.observers {
            observer.visual_update(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{Observer, ObserverList};
    use crate::api::CoreState;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<(&'static str, u16)>>>,
    }

    impl Observer for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn visual_update(&mut self, state: &CoreState) {
            self.log
                .lock()
                .expect("observer log lock")
                .push((self.name, state.regs.pc()));
        }
    }

    fn recorder(name: &'static str, log: &Arc<Mutex<Vec<(&'static str, u16)>>>) -> Box<Recorder> {
        Box::new(Recorder {
            name,
            log: Arc::clone(log),
        })
    }

    #[test]
    fn names_are_unique_ignoring_case() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut list = ObserverList::new();
        assert!(list.add(recorder("Registers", &log)));
        assert!(!list.add(recorder("REGISTERS", &log)));
        assert!(list.add(recorder("memory", &log)));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn notify_follows_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut list = ObserverList::new();
        list.add(recorder("first", &log));
        list.add(recorder("second", &log));

        let mut state = CoreState::default();
        state.regs.set_pc(0x1234);
        list.notify(&state);

        assert_eq!(
            *log.lock().expect("observer log lock"),
            vec![("first", 0x1234), ("second", 0x1234)]
        );
    }

    #[test]
    fn removal_is_case_insensitive() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut list = ObserverList::new();
        list.add(recorder("Disasm", &log));
        assert!(list.remove("disasm").is_some());
        assert!(list.remove("disasm").is_none());
        assert!(list.is_empty());
    }
}
