//! Address trap registry and the hits it records during execution.

/// Opaque handle naming a trap observer owned by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ObserverId(u32);

impl ObserverId {
    /// Wraps a raw handle value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw handle value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Direction of a trapped access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TrapKind {
    /// Trapped read.
    Read,
    /// Trapped write.
    Write,
}

/// One `(address, observer)` registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrapEntry {
    /// Trapped address.
    pub addr: u16,
    /// Observer notified on access.
    pub observer: ObserverId,
}

/// A trapped access waiting to be delivered to its observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrapHit {
    /// Observer to notify.
    pub observer: ObserverId,
    /// Read or write.
    pub kind: TrapKind,
    /// Accessed address.
    pub addr: u16,
    /// Address of the instruction that performed the access.
    pub instr_addr: u16,
}

/// Ordered list of trap registrations.
///
/// Several observers may trap the same address, and the same observer may
/// register an address more than once; notification follows registration order.
#[derive(Debug, Clone, Default)]
pub struct TrapRegistry {
    entries: Vec<TrapEntry>,
    hits: Vec<TrapHit>,
}

impl TrapRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            hits: Vec::new(),
        }
    }

    /// Registers `observer` on `addr`.
    pub fn add(&mut self, addr: u16, observer: ObserverId) {
        self.entries.push(TrapEntry { addr, observer });
    }

    /// Removes the first `(addr, observer)` registration. Returns `true` if one was found.
    pub fn remove(&mut self, addr: u16, observer: ObserverId) -> bool {
        let found = self
            .entries
            .iter()
            .position(|entry| entry.addr == addr && entry.observer == observer);
        if let Some(index) = found {
            self.entries.remove(index);
        }
        found.is_some()
    }

    /// Removes every registration on `addr`. Returns how many were removed.
    pub fn remove_at(&mut self, addr: u16) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.addr != addr);
        before - self.entries.len()
    }

    /// Removes every registration held by `observer`. Returns how many were removed.
    pub fn remove_observer(&mut self, observer: ObserverId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.observer != observer);
        before - self.entries.len()
    }

    /// Returns `true` if any observer traps `addr`.
    #[must_use]
    pub fn is_trapped(&self, addr: u16) -> bool {
        self.entries.iter().any(|entry| entry.addr == addr)
    }

    /// Current registrations in notification order.
    #[must_use]
    pub fn entries(&self) -> &[TrapEntry] {
        &self.entries
    }

    /// Records one hit per matching registration.
    pub fn record(&mut self, kind: TrapKind, addr: u16, instr_addr: u16) {
        if self.entries.is_empty() {
            return;
        }
        let hits = self
            .entries
            .iter()
            .filter(|entry| entry.addr == addr)
            .map(|entry| TrapHit {
                observer: entry.observer,
                kind,
                addr,
                instr_addr,
            });
        self.hits.extend(hits);
    }

    /// Takes every hit recorded since the last call, in access order.
    pub fn take_hits(&mut self) -> Vec<TrapHit> {
        std::mem::take(&mut self.hits)
    }

    /// Returns `true` if hits are waiting for delivery.
    #[must_use]
    pub fn has_hits(&self) -> bool {
        !self.hits.is_empty()
    }
}
