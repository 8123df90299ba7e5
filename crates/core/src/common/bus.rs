//! Tri-state bus modeling and arbitration.
//!
//! A bidirectional bus is represented as a tagged value rather than a raw
//! read/write pin pair with a manual enable flag. Either exactly one party
//! drives a level, or the bus floats: a floating bus is *undefined* and must
//! never be mistaken for a driven zero. Arbitration happens in exactly one
//! place, once per half-cycle, so the single-driver invariant is checked
//! rather than assumed.

use crate::common::error::SimError;

/// The state of a tri-state capable signal during one half-cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusState {
    /// A party is actively driving this level onto the bus.
    Driven(u64),
    /// No party drives the bus; the level is undefined (high impedance).
    HighZ,
}

impl BusState {
    /// Returns `true` if a party is actively driving the bus.
    #[inline]
    pub fn is_driven(self) -> bool {
        matches!(self, Self::Driven(_))
    }

    /// Returns the driven level, or `None` when the bus floats.
    #[inline]
    pub fn level(self) -> Option<u64> {
        match self {
            Self::Driven(v) => Some(v),
            Self::HighZ => None,
        }
    }
}

/// One party's claim on a shared bus during a half-cycle.
#[derive(Debug, Clone, Copy)]
pub struct BusClaim<'a> {
    /// Name of the claiming party, used in contention diagnostics.
    pub driver: &'a str,
    /// What the party puts on the bus this half-cycle.
    pub state: BusState,
}

/// Resolves all claims on one bus for one half-cycle.
///
/// Returns the driven state if at most one claimant drives and `HighZ` if
/// none does. Two simultaneous drivers are a fatal modeling bug: the error
/// names both drivers and the half-cycle at which they collided.
pub fn resolve(bus: &str, edge: u64, claims: &[BusClaim<'_>]) -> Result<BusState, SimError> {
    let mut winner: Option<&BusClaim<'_>> = None;
    for claim in claims {
        if claim.state.is_driven() {
            if let Some(prev) = winner {
                return Err(SimError::BusContention {
                    edge,
                    bus: bus.to_owned(),
                    first: prev.driver.to_owned(),
                    second: claim.driver.to_owned(),
                });
            }
            winner = Some(claim);
        }
    }
    Ok(winner.map_or(BusState::HighZ, |c| c.state))
}
