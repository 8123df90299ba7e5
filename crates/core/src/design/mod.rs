//! The design handle: named pins and the `Design` trait.
//!
//! The harness treats the externally supplied synchronous design as an opaque
//! set of named pins plus an `advance()` operation that settles its
//! combinational network after a clock edge. This module provides:
//! 1. **`PinSet`:** Declared named pins with width-masked, bounds-checked
//!    accessors.
//! 2. **`PinId`:** A resolved pin handle; name lookup happens once at bind
//!    time, never in the hot loop.
//! 3. **`Design`:** The trait a design implementation (or a test double)
//!    provides to the simulation loop.

use std::collections::HashMap;

use crate::common::error::SimError;

/// A resolved handle to one declared pin.
///
/// Obtained from [`PinSet::resolve`]; valid for the lifetime of the `PinSet`
/// that produced it. Using a `PinId` from a different `PinSet` is a
/// programming error and panics on access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinId(usize);

struct Pin {
    name: String,
    width: u32,
    mask: u64,
    value: u64,
}

/// The declared pin interface of a design.
///
/// Every pin has a fixed width of 1..=64 bits; writes are masked to the
/// declared width so a stray wide value can never corrupt a neighboring
/// signal. Pins are declared up front; resolving an undeclared name is a
/// startup-time error, reading or writing through a stale handle is a panic.
#[derive(Default)]
pub struct PinSet {
    pins: Vec<Pin>,
    index: HashMap<String, usize>,
}

impl PinSet {
    /// Creates an empty pin set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a pin with the given width in bits and returns its handle.
    ///
    /// # Panics
    ///
    /// Panics on a duplicate name or a width outside 1..=64; both are
    /// design-construction bugs, not runtime conditions.
    pub fn declare(&mut self, name: &str, width: u32) -> PinId {
        assert!(
            (1..=64).contains(&width),
            "pin \"{name}\": width {width} out of range 1..=64"
        );
        assert!(
            !self.index.contains_key(name),
            "pin \"{name}\" declared twice"
        );
        let id = self.pins.len();
        let mask = if width == 64 {
            u64::MAX
        } else {
            (1u64 << width) - 1
        };
        self.pins.push(Pin {
            name: name.to_owned(),
            width,
            mask,
            value: 0,
        });
        let _ = self.index.insert(name.to_owned(), id);
        PinId(id)
    }

    /// Resolves a pin name to a handle.
    ///
    /// A missing name indicates a harness/design mismatch and is fatal at
    /// startup.
    pub fn resolve(&self, name: &str) -> Result<PinId, SimError> {
        self.index
            .get(name)
            .map(|&i| PinId(i))
            .ok_or_else(|| SimError::UnknownPin(name.to_owned()))
    }

    /// Returns whether a pin with the given name is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Reads the current value of a pin.
    #[inline]
    pub fn read(&self, pin: PinId) -> u64 {
        self.pins[pin.0].value
    }

    /// Returns `true` if the pin's value is nonzero.
    #[inline]
    pub fn is_high(&self, pin: PinId) -> bool {
        self.pins[pin.0].value != 0
    }

    /// Writes a value to a pin, masked to the declared width.
    #[inline]
    pub fn write(&mut self, pin: PinId, value: u64) {
        let p = &mut self.pins[pin.0];
        p.value = value & p.mask;
    }

    /// Declared width of a pin in bits.
    pub fn width(&self, pin: PinId) -> u32 {
        self.pins[pin.0].width
    }

    /// Name of a pin, for diagnostics.
    pub fn name(&self, pin: PinId) -> &str {
        &self.pins[pin.0].name
    }

    /// Number of declared pins.
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// Returns whether no pins are declared.
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

impl std::fmt::Debug for PinSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for pin in &self.pins {
            let _ = map.key(&pin.name).value(&format_args!(
                "{:#x}/{}b",
                pin.value, pin.width
            ));
        }
        map.finish()
    }
}

/// An externally supplied synchronous design under simulation.
///
/// The loop toggles the design's clock pin, calls [`advance`](Self::advance)
/// to settle combinational logic, then hands the settled pin state to the
/// peripheral models. Evaluation is deterministic given pin inputs and never
/// blocks.
pub trait Design {
    /// The design's declared pins.
    fn pins(&self) -> &PinSet;

    /// Mutable access to the declared pins (the loop writes inputs here).
    fn pins_mut(&mut self) -> &mut PinSet;

    /// Settles the combinational network to a fixed point after an edge has
    /// been applied to the input pins.
    fn advance(&mut self);
}
