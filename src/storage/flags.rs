use serde::{Deserialize, Serialize};

/// Packed per-edge vehicle flags.
///
/// Layout: bit0 = forward access, bit1 = backward access, bits 2..10 = speed in km/h.
/// The remaining bits belong to the encoder that produced the value. The store only
/// relies on the two access bits, which it swaps when an edge is read against its
/// stored orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EdgeFlags(u32);

const FORWARD: u32 = 1;
const BACKWARD: u32 = 1 << 1;
const SPEED_SHIFT: u32 = 2;
const SPEED_MASK: u32 = 0xFF << SPEED_SHIFT;

impl EdgeFlags {
    pub const NONE: EdgeFlags = EdgeFlags(0);

    pub fn new(forward: bool, backward: bool, speed_kmh: u32) -> Self {
        let mut bits = speed_kmh.min(0xFF) << SPEED_SHIFT;
        if forward {
            bits |= FORWARD;
        }
        if backward {
            bits |= BACKWARD;
        }
        Self(bits)
    }

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn forward(self) -> bool {
        self.0 & FORWARD != 0
    }

    pub fn backward(self) -> bool {
        self.0 & BACKWARD != 0
    }

    pub fn is_oneway(self) -> bool {
        self.forward() != self.backward()
    }

    pub fn speed_kmh(self) -> u32 {
        (self.0 & SPEED_MASK) >> SPEED_SHIFT
    }

    /// Same edge read in the opposite direction
    pub fn reversed(self) -> Self {
        let mut bits = self.0 & !(FORWARD | BACKWARD);
        if self.forward() {
            bits |= BACKWARD;
        }
        if self.backward() {
            bits |= FORWARD;
        }
        Self(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversed_swaps_access_only() {
        let flags = EdgeFlags::new(true, false, 50);
        let rev = flags.reversed();

        assert!(!rev.forward());
        assert!(rev.backward());
        assert_eq!(rev.speed_kmh(), 50);
        assert_eq!(rev.reversed(), flags);
    }

    #[test]
    fn test_speed_saturates() {
        assert_eq!(EdgeFlags::new(true, true, 1000).speed_kmh(), 255);
        assert!(!EdgeFlags::new(true, true, 30).is_oneway());
    }
}
