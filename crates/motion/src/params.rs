//! Static per-axis physical parameters and master motion settings.
//!
//! These are configuration inputs, typically deserialized from a robot
//! description; the planner reads them on every move, the actuator never
//! touches them directly.

use crate::{AxisIndex, MAX_AXES};

/// Physical limits and conversion factors for one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct AxisParams {
    /// Maximum feedrate along this axis, mm/s.
    pub max_speed_mm_s: f32,
    /// Maximum acceleration, mm/s^2.
    pub max_accel_mm_s2: f32,
    /// Step resolution.
    pub steps_per_mm: f32,
    /// Soft limit at the minimum end, if any.
    pub min_val_mm: Option<f32>,
    /// Soft limit at the maximum end, if any.
    pub max_val_mm: Option<f32>,
    /// Primary axes contribute to the euclidean move distance used for
    /// feedrate planning; auxiliary axes (e.g. a pen lift) do not.
    pub is_primary_axis: bool,
    /// Continuous-rotation axes wrap their step counter each revolution
    /// while the mm value tracks the unwrapped angle.
    pub is_continuous_rotation: bool,
    /// Units (mm or degrees) in one revolution, for continuous-rotation
    /// step wrapping.
    pub units_per_rev: Option<f32>,
}

impl Default for AxisParams {
    fn default() -> Self {
        Self {
            max_speed_mm_s: 100.0,
            max_accel_mm_s2: 100.0,
            steps_per_mm: 80.0,
            min_val_mm: None,
            max_val_mm: None,
            is_primary_axis: true,
            is_continuous_rotation: false,
            units_per_rev: None,
        }
    }
}

impl AxisParams {
    /// Steps in one revolution, when `units_per_rev` is configured.
    pub fn steps_per_rev(&self) -> Option<i32> {
        self.units_per_rev
            .map(|upr| (upr * self.steps_per_mm) as i32)
    }

    /// Whether `mm` violates a configured soft limit.
    pub fn out_of_bounds(&self, mm: f32) -> bool {
        if let Some(min) = self.min_val_mm {
            if mm < min {
                return true;
            }
        }
        if let Some(max) = self.max_val_mm {
            if mm > max {
                return true;
            }
        }
        false
    }
}

/// Parameters for the whole axis set plus master planning settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct AxesParams {
    pub axes: [AxisParams; MAX_AXES],
    /// Cornering tolerance for junction-deviation speed planning, mm.
    pub junction_deviation_mm: f32,
    /// Maximum distance of a single block; longer moves are split so curved
    /// geometries stay linearized. Zero disables splitting.
    pub block_distance_mm: f32,
}

impl Default for AxesParams {
    fn default() -> Self {
        Self {
            axes: [AxisParams::default(); MAX_AXES],
            junction_deviation_mm: 0.05,
            block_distance_mm: 0.0,
        }
    }
}

impl AxesParams {
    #[inline]
    pub fn steps_per_mm(&self, axis: AxisIndex) -> f32 {
        self.axes[axis].steps_per_mm
    }

    #[inline]
    pub fn max_speed(&self, axis: AxisIndex) -> f32 {
        self.axes[axis].max_speed_mm_s
    }

    #[inline]
    pub fn max_accel(&self, axis: AxisIndex) -> f32 {
        self.axes[axis].max_accel_mm_s2
    }

    #[inline]
    pub fn is_primary(&self, axis: AxisIndex) -> bool {
        self.axes[axis].is_primary_axis
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_limit_checks() {
        let p = AxisParams {
            min_val_mm: Some(0.0),
            max_val_mm: Some(200.0),
            ..AxisParams::default()
        };
        assert!(p.out_of_bounds(-0.1));
        assert!(p.out_of_bounds(200.1));
        assert!(!p.out_of_bounds(100.0));
    }

    #[test]
    fn unbounded_axis_never_out_of_bounds() {
        let p = AxisParams::default();
        assert!(!p.out_of_bounds(-1e6));
        assert!(!p.out_of_bounds(1e6));
    }

    #[cfg(feature = "serde-support")]
    #[test]
    fn config_json_roundtrip() {
        let mut params = AxesParams::default();
        params.axes[1].max_speed_mm_s = 50.0;
        params.axes[2].is_primary_axis = false;
        params.junction_deviation_mm = 0.1;
        let json = serde_json::to_string(&params).unwrap();
        let back: AxesParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
