//! 64 KiB memory bus with silent and trapped access paths.

/// Trap registry and recorded trap hits.
pub mod trap;

pub use trap::{ObserverId, TrapEntry, TrapHit, TrapKind, TrapRegistry};

use crate::fault::Fault;

/// Size in bytes of the flat architectural address space (64 KiB).
pub const ADDRESS_SPACE_BYTES: usize = u16::MAX as usize + 1;

/// Allocates a zeroed 64 KiB backing store.
#[must_use]
pub fn new_address_space() -> Box<[u8]> {
    vec![0; ADDRESS_SPACE_BYTES].into_boxed_slice()
}

/// Byte-addressed memory plus the trap registry consulted on trapped accesses.
///
/// Silent accesses never touch the registry. Trapped accesses record a
/// [`TrapHit`] per matching registration; the owner delivers them once the
/// current instruction has finished.
#[derive(Debug, Clone)]
pub struct MemoryBus {
    bytes: Box<[u8]>,
    traps: TrapRegistry,
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus {
    /// Creates a zeroed bus with no traps.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: new_address_space(),
            traps: TrapRegistry::new(),
        }
    }

    /// Trapped read. `instr_addr` is the address of the accessing instruction.
    pub fn read(&mut self, addr: u16, instr_addr: u16) -> u8 {
        self.traps.record(TrapKind::Read, addr, instr_addr);
        self.read_silent(addr)
    }

    /// Untrapped read.
    #[must_use]
    pub fn read_silent(&self, addr: u16) -> u8 {
        self.bytes[usize::from(addr)]
    }

    /// Untrapped read reinterpreted as a two's-complement byte.
    #[must_use]
    pub fn read_signed_silent(&self, addr: u16) -> i8 {
        i8::from_ne_bytes([self.read_silent(addr)])
    }

    /// Untrapped big-endian word read; the second byte wraps at `0xFFFF`.
    #[must_use]
    pub fn read_u16_silent(&self, addr: u16) -> u16 {
        u16::from_be_bytes([self.read_silent(addr), self.read_silent(addr.wrapping_add(1))])
    }

    /// Trapped write. `instr_addr` is the address of the accessing instruction.
    pub fn write(&mut self, addr: u16, value: u8, instr_addr: u16) {
        self.write_silent(addr, value);
        self.traps.record(TrapKind::Write, addr, instr_addr);
    }

    /// Untrapped write.
    pub fn write_silent(&mut self, addr: u16, value: u8) {
        self.bytes[usize::from(addr)] = value;
    }

    /// Untrapped bulk write used by program loaders.
    ///
    /// A block that runs past `0xFFFF` wraps to `0x0000` and is reported as
    /// [`Fault::AddressOutOfRange`].
    pub fn write_block(&mut self, addr: u16, data: &[u8]) {
        let end = u32::from(addr) + u32::try_from(data.len()).unwrap_or(u32::MAX);
        if end > u32::from(u16::MAX) + 1 {
            Fault::AddressOutOfRange { addr: end - 1 }.report();
        }
        let mut cursor = addr;
        for byte in data {
            self.write_silent(cursor, *byte);
            cursor = cursor.wrapping_add(1);
        }
    }

    /// Whole memory image.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Trap registry.
    #[must_use]
    pub const fn traps(&self) -> &TrapRegistry {
        &self.traps
    }

    /// Mutable trap registry.
    pub const fn traps_mut(&mut self) -> &mut TrapRegistry {
        &mut self.traps
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{new_address_space, MemoryBus, ObserverId, TrapKind, ADDRESS_SPACE_BYTES};

    #[test]
    fn canonical_backing_store_size_is_64kib() {
        let memory = new_address_space();
        assert_eq!(memory.len(), ADDRESS_SPACE_BYTES);
        assert!(memory.iter().all(|byte| *byte == 0));
    }

    #[test]
    fn silent_paths_never_record_hits() {
        let mut bus = MemoryBus::new();
        bus.traps_mut().add(0x0010, ObserverId::new(7));

        bus.write_silent(0x0010, 0xAA);
        assert_eq!(bus.read_silent(0x0010), 0xAA);
        assert_eq!(bus.read_signed_silent(0x0010), -86);
        assert!(!bus.traps().has_hits());
    }

    #[test]
    fn trapped_paths_record_instruction_address() {
        let mut bus = MemoryBus::new();
        bus.traps_mut().add(0x0010, ObserverId::new(7));

        bus.write(0x0010, 0x55, 0x2000);
        assert_eq!(bus.read(0x0010, 0x2002), 0x55);

        let hits = bus.traps_mut().take_hits();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].kind, TrapKind::Write);
        assert_eq!(hits[0].instr_addr, 0x2000);
        assert_eq!(hits[1].kind, TrapKind::Read);
        assert_eq!(hits[1].instr_addr, 0x2002);
    }

    #[test]
    fn block_write_wraps_past_top_of_memory() {
        let mut bus = MemoryBus::new();
        bus.write_block(0xFFFE, &[1, 2, 3]);
        assert_eq!(bus.read_silent(0xFFFE), 1);
        assert_eq!(bus.read_silent(0xFFFF), 2);
        assert_eq!(bus.read_silent(0x0000), 3);
    }

    #[test]
    fn word_read_is_big_endian() {
        let mut bus = MemoryBus::new();
        bus.write_block(0x0100, &[0x12, 0x34]);
        assert_eq!(bus.read_u16_silent(0x0100), 0x1234);
    }

    proptest! {
        #[test]
        fn trapped_write_then_read_round_trips(addr in any::<u16>(), value in any::<u8>()) {
            let mut bus = MemoryBus::new();
            bus.write(addr, value, 0);
            prop_assert_eq!(bus.read(addr, 0), value);
        }
    }
}
