use crate::encoding::{classify_opcode, Page};

/// Cycles charged when an unmapped opcode is executed as a no-op.
pub const INVALID_OPCODE_CYCLES: u8 = 2;

/// Looks up the fixed cycle cost of an opcode on a page.
///
/// Costs come from [`crate::encoding::OPCODE_TABLE`]; `None` means the
/// opcode is unmapped and costs [`INVALID_OPCODE_CYCLES`] when executed.
#[must_use]
pub fn cycle_cost(page: Page, opcode: u8) -> Option<u8> {
    classify_opcode(page, opcode).map(|descriptor| descriptor.cycles)
}

/// Cycle cost of the instruction as it will actually be charged.
#[must_use]
pub fn charged_cycles(page: Page, opcode: u8) -> u8 {
    cycle_cost(page, opcode).unwrap_or(INVALID_OPCODE_CYCLES)
}
