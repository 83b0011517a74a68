//! Per-axis end-stop test conditions, packed into a compact bitfield.
//!
//! Each axis carries a (min, max) pair of conditions. `Towards` arms the stop
//! only when the commanded motion heads into it, which is what homing and
//! anti-crash interlocks want. The packed `u32` form is also the JSON
//! encoding.

use crate::{AxisIndex, MAX_AXES};

/// Index of the minimum-end stop within an axis pair.
pub const MIN_VAL_IDX: usize = 0;
/// Index of the maximum-end stop within an axis pair.
pub const MAX_VAL_IDX: usize = 1;
/// End-stops per axis (min and max).
pub const ENDSTOPS_PER_AXIS: usize = 2;

const BITS_PER_CONDITION: u32 = 2;
const CONDITION_MASK: u32 = 0b11;

/// What to test an end-stop input for while a block executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndstopCondition {
    /// Do not test this stop.
    #[default]
    None,
    /// Stop the block when the switch is triggered.
    Hit,
    /// Stop the block when the switch is released (moving off a switch).
    NotHit,
    /// Like `Hit`, but armed only if the motion heads towards this stop.
    Towards,
}

impl EndstopCondition {
    fn from_bits(bits: u32) -> Self {
        match bits & CONDITION_MASK {
            1 => EndstopCondition::Hit,
            2 => EndstopCondition::NotHit,
            3 => EndstopCondition::Towards,
            _ => EndstopCondition::None,
        }
    }

    fn to_bits(self) -> u32 {
        match self {
            EndstopCondition::None => 0,
            EndstopCondition::Hit => 1,
            EndstopCondition::NotHit => 2,
            EndstopCondition::Towards => 3,
        }
    }
}

/// Packed per-axis (min, max) end-stop conditions.
///
/// Two bits per stop, min before max, axis 0 in the least significant bits.
/// A zero word means "test nothing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisMinMaxBools(u32);

impl AxisMinMaxBools {
    /// No end-stop testing on any axis.
    pub const fn none() -> Self {
        Self(0)
    }

    /// Test every stop on every axis for `Hit`.
    pub fn all_hit() -> Self {
        let mut out = Self::none();
        for axis in 0..MAX_AXES {
            for idx in 0..ENDSTOPS_PER_AXIS {
                out.set(axis, idx, EndstopCondition::Hit);
            }
        }
        out
    }

    fn shift(axis: AxisIndex, idx: usize) -> u32 {
        ((axis * ENDSTOPS_PER_AXIS + idx) as u32) * BITS_PER_CONDITION
    }

    pub fn set(&mut self, axis: AxisIndex, idx: usize, cond: EndstopCondition) {
        if axis >= MAX_AXES || idx >= ENDSTOPS_PER_AXIS {
            return;
        }
        let shift = Self::shift(axis, idx);
        self.0 = (self.0 & !(CONDITION_MASK << shift)) | (cond.to_bits() << shift);
    }

    pub fn get(&self, axis: AxisIndex, idx: usize) -> EndstopCondition {
        if axis >= MAX_AXES || idx >= ENDSTOPS_PER_AXIS {
            return EndstopCondition::None;
        }
        EndstopCondition::from_bits(self.0 >> Self::shift(axis, idx))
    }

    /// Whether any stop on any axis is to be tested.
    #[inline]
    pub fn any(&self) -> bool {
        self.0 != 0
    }

    /// Raw packed form (also the serialized encoding).
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn from_u32(raw: u32) -> Self {
        Self(raw)
    }
}

#[cfg(feature = "serde-support")]
mod serde_impls {
    use super::AxisMinMaxBools;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for AxisMinMaxBools {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_u32(self.as_u32())
        }
    }

    impl<'de> Deserialize<'de> for AxisMinMaxBools {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            Ok(AxisMinMaxBools::from_u32(u32::deserialize(deserializer)?))
        }
    }
}
