//! SDRAM command decoding.
//!
//! Commands are encoded on the chip-select, row-strobe, column-strobe and
//! write-enable lines (all active low) and sampled at each rising edge of
//! the controller clock.

/// A decoded SDRAM command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Chip deselected; the cycle is ignored.
    Deselect,
    /// No operation.
    Nop,
    /// Open a row in a bank.
    Active,
    /// Begin a read burst from the open row.
    Read,
    /// Begin a write burst into the open row.
    Write,
    /// Terminate the current burst early.
    BurstStop,
    /// Close the addressed bank's row (or all banks with A10 high).
    Precharge,
    /// Auto refresh; timing bookkeeping only.
    Refresh,
    /// Load the mode register (burst length, CAS latency).
    LoadMode,
}

impl Command {
    /// Decodes the command lines sampled at a rising clock edge.
    ///
    /// Arguments are raw pin levels: `true` is electrically high, so a
    /// `false` chip select means "selected".
    pub fn decode(cs_n: bool, ras_n: bool, cas_n: bool, we_n: bool) -> Self {
        if cs_n {
            return Self::Deselect;
        }
        match (ras_n, cas_n, we_n) {
            (false, false, false) => Self::LoadMode,
            (false, false, true) => Self::Refresh,
            (false, true, false) => Self::Precharge,
            (false, true, true) => Self::Active,
            (true, false, false) => Self::Write,
            (true, false, true) => Self::Read,
            (true, true, false) => Self::BurstStop,
            (true, true, true) => Self::Nop,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Deselect => "DESL",
            Self::Nop => "NOP",
            Self::Active => "ACT",
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::BurstStop => "BST",
            Self::Precharge => "PRE",
            Self::Refresh => "REF",
            Self::LoadMode => "LMR",
        };
        f.write_str(s)
    }
}
