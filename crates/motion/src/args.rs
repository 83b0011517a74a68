//! The command envelope handed to the planner by the command interpreter.
//!
//! Serializes to the compact JSON form used for diagnostics, with keys
//! `XYZ` (mm point), `ABC` (step point), `F`, `E`, `mv`, `end`, `OoB`,
//! `num`, `Qd` and `pause`.

use crate::axis_vals::{AxisFloats, AxisInt32s};
use crate::endstops::{AxisMinMaxBools, EndstopCondition};
use crate::status::NUMBERED_COMMAND_NONE;
use crate::AxisIndex;

/// How the target point is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveType {
    #[default]
    None,
    Absolute,
    Relative,
}

/// One logical move request: target point, feedrate, end-stop tests and
/// planning flags.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct RobotCommandArgs {
    /// Target point in mm (when `units_are_steps` is false).
    #[cfg_attr(feature = "serde-support", serde(rename = "XYZ"))]
    pub pt_mm: AxisFloats,
    /// Target point in steps (when `units_are_steps` is true).
    #[cfg_attr(feature = "serde-support", serde(rename = "ABC"))]
    pub pt_steps: AxisInt32s,
    #[cfg_attr(
        feature = "serde-support",
        serde(rename = "F", skip_serializing_if = "Option::is_none")
    )]
    pub feedrate_mm_s: Option<f32>,
    /// Extrusion value, passed through opaquely for robots that use it.
    #[cfg_attr(
        feature = "serde-support",
        serde(rename = "E", skip_serializing_if = "Option::is_none")
    )]
    pub extrude: Option<f32>,
    #[cfg_attr(feature = "serde-support", serde(rename = "mv"))]
    pub move_type: MoveType,
    #[cfg_attr(feature = "serde-support", serde(rename = "end"))]
    pub endstops: AxisMinMaxBools,
    #[cfg_attr(
        feature = "serde-support",
        serde(rename = "OoB", with = "serde_yn")
    )]
    pub allow_out_of_bounds: bool,
    #[cfg_attr(feature = "serde-support", serde(rename = "num"))]
    pub numbered_command_index: i32,
    /// Commands currently queued upstream; diagnostic only.
    #[cfg_attr(feature = "serde-support", serde(rename = "Qd"))]
    pub queued_commands: i32,
    #[cfg_attr(feature = "serde-support", serde(rename = "pause", with = "serde_int_bool"))]
    pub pause: bool,
    #[cfg_attr(feature = "serde-support", serde(skip))]
    pub units_are_steps: bool,
    #[cfg_attr(feature = "serde-support", serde(skip))]
    pub dont_split_move: bool,
    #[cfg_attr(feature = "serde-support", serde(skip))]
    pub more_moves_coming: bool,
}

impl Default for RobotCommandArgs {
    fn default() -> Self {
        Self {
            pt_mm: AxisFloats::new(),
            pt_steps: AxisInt32s::new(),
            feedrate_mm_s: None,
            extrude: None,
            move_type: MoveType::None,
            endstops: AxisMinMaxBools::none(),
            allow_out_of_bounds: false,
            numbered_command_index: NUMBERED_COMMAND_NONE,
            queued_commands: 0,
            pause: false,
            units_are_steps: false,
            dont_split_move: false,
            more_moves_coming: false,
        }
    }
}

impl RobotCommandArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Sets an axis target in mm and switches the envelope to mm units.
    pub fn set_axis_val_mm(&mut self, axis: AxisIndex, value: f32) {
        self.pt_mm.set_val(axis, value);
        self.units_are_steps = false;
    }

    /// Sets an axis target in steps and switches the envelope to step units.
    pub fn set_axis_steps(&mut self, axis: AxisIndex, value: i32) {
        self.pt_steps.set_val(axis, value);
        self.pt_mm.set_valid(axis, true);
        self.units_are_steps = true;
    }

    pub fn is_valid(&self, axis: AxisIndex) -> bool {
        self.pt_mm.is_valid(axis)
    }

    pub fn any_valid(&self) -> bool {
        self.pt_mm.any_valid()
    }

    pub fn set_feedrate(&mut self, feedrate_mm_s: f32) {
        self.feedrate_mm_s = Some(feedrate_mm_s);
    }

    pub fn set_test_end_stop(&mut self, axis: AxisIndex, idx: usize, cond: EndstopCondition) {
        self.endstops.set(axis, idx, cond);
    }

    pub fn set_test_all_end_stops(&mut self) {
        self.endstops = AxisMinMaxBools::all_hit();
    }

    pub fn set_test_no_end_stops(&mut self) {
        self.endstops = AxisMinMaxBools::none();
    }
}

#[cfg(feature = "serde-support")]
mod move_type_serde {
    use super::MoveType;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for MoveType {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                MoveType::Relative => serializer.serialize_str("rel"),
                _ => serializer.serialize_str("abs"),
            }
        }
    }

    impl<'de> Deserialize<'de> for MoveType {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            // Short-string friendly even without alloc.
            let s: &str = <&str>::deserialize(deserializer)?;
            Ok(if s == "rel" {
                MoveType::Relative
            } else {
                MoveType::Absolute
            })
        }
    }
}

#[cfg(feature = "serde-support")]
mod serde_yn {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *v { "Y" } else { "N" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let s: &str = <&str>::deserialize(deserializer)?;
        Ok(s == "Y")
    }
}

#[cfg(feature = "serde-support")]
mod serde_int_bool {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(u8::deserialize(deserializer)? != 0)
    }
}
