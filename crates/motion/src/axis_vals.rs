//! Dense per-axis value arrays with validity masks.
//!
//! Commands may specify only a subset of axes; the validity mask records
//! which entries are meaningful. The JSON form is a plain array of values
//! (validity is a transport-local concern, not serialized).

use crate::{AxisIndex, MAX_AXES};

/// Per-axis `f32` values (millimetres or mm/s depending on context).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisFloats {
    vals: [f32; MAX_AXES],
    valid_mask: u8,
}

impl AxisFloats {
    pub const fn new() -> Self {
        Self {
            vals: [0.0; MAX_AXES],
            valid_mask: 0,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Sets a value and marks the axis valid.
    pub fn set_val(&mut self, axis: AxisIndex, val: f32) {
        if axis < MAX_AXES {
            self.vals[axis] = val;
            self.valid_mask |= 1 << axis;
        }
    }

    pub fn set_valid(&mut self, axis: AxisIndex, valid: bool) {
        if axis < MAX_AXES {
            if valid {
                self.valid_mask |= 1 << axis;
            } else {
                self.valid_mask &= !(1 << axis);
            }
        }
    }

    /// Value regardless of validity.
    #[inline]
    pub fn val(&self, axis: AxisIndex) -> f32 {
        self.vals[axis]
    }

    #[inline]
    pub fn is_valid(&self, axis: AxisIndex) -> bool {
        axis < MAX_AXES && (self.valid_mask >> axis) & 1 != 0
    }

    pub fn any_valid(&self) -> bool {
        self.valid_mask != 0
    }

    /// Marks every axis valid, keeping current values.
    pub fn set_all_valid(&mut self) {
        self.valid_mask = (1 << MAX_AXES) - 1;
    }
}

/// Per-axis `i32` values (step counts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisInt32s {
    vals: [i32; MAX_AXES],
    valid_mask: u8,
}

impl AxisInt32s {
    pub const fn new() -> Self {
        Self {
            vals: [0; MAX_AXES],
            valid_mask: 0,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn set_val(&mut self, axis: AxisIndex, val: i32) {
        if axis < MAX_AXES {
            self.vals[axis] = val;
            self.valid_mask |= 1 << axis;
        }
    }

    #[inline]
    pub fn val(&self, axis: AxisIndex) -> i32 {
        self.vals[axis]
    }

    #[inline]
    pub fn is_valid(&self, axis: AxisIndex) -> bool {
        axis < MAX_AXES && (self.valid_mask >> axis) & 1 != 0
    }

    pub fn any_valid(&self) -> bool {
        self.valid_mask != 0
    }
}

#[cfg(feature = "serde-support")]
mod serde_impls {
    use super::*;
    use serde::de::{SeqAccess, Visitor};
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for AxisFloats {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(MAX_AXES))?;
            for v in &self.vals {
                seq.serialize_element(v)?;
            }
            seq.end()
        }
    }

    impl<'de> Deserialize<'de> for AxisFloats {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            struct V;
            impl<'de> Visitor<'de> for V {
                type Value = AxisFloats;
                fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                    write!(f, "an array of at most {} floats", MAX_AXES)
                }
                fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                    let mut out = AxisFloats::new();
                    let mut axis = 0;
                    while let Some(v) = seq.next_element::<f32>()? {
                        if axis < MAX_AXES {
                            out.set_val(axis, v);
                        }
                        axis += 1;
                    }
                    Ok(out)
                }
            }
            deserializer.deserialize_seq(V)
        }
    }

    impl Serialize for AxisInt32s {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(MAX_AXES))?;
            for v in &self.vals {
                seq.serialize_element(v)?;
            }
            seq.end()
        }
    }

    impl<'de> Deserialize<'de> for AxisInt32s {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            struct V;
            impl<'de> Visitor<'de> for V {
                type Value = AxisInt32s;
                fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                    write!(f, "an array of at most {} integers", MAX_AXES)
                }
                fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                    let mut out = AxisInt32s::new();
                    let mut axis = 0;
                    while let Some(v) = seq.next_element::<i32>()? {
                        if axis < MAX_AXES {
                            out.set_val(axis, v);
                        }
                        axis += 1;
                    }
                    Ok(out)
                }
            }
            deserializer.deserialize_seq(V)
        }
    }
}
