//! Robot geometry plug-ins.
//!
//! The planner is parameterised over three pure transforms: point to
//! actuator coordinates (with soft-limit checking), actuator coordinates
//! back to a point, and step-counter wrapping for continuous-rotation axes.
//! Robot-specific geometries (SCARA arms, polar sand tables, ...) implement
//! this trait outside the core.

use crate::axis_vals::AxisFloats;
use crate::params::AxesParams;
use crate::position::AxisPosition;
use crate::MAX_AXES;

/// A kinematic model translating cartesian points to actuator positions.
pub trait RobotGeometry {
    /// Converts a target point (mm, per-axis validity respected; invalid
    /// axes hold their current position) into actuator coordinates in mm.
    ///
    /// Returns false if the target violates a soft limit; the conversion is
    /// still performed so callers with `allow_out_of_bounds` can proceed.
    fn pt_to_actuator(
        &self,
        target_pt: &AxisFloats,
        out_actuator: &mut AxisFloats,
        cur_pos: &AxisPosition,
        params: &AxesParams,
        allow_out_of_bounds: bool,
    ) -> bool;

    /// Converts actuator coordinates (mm) back to a cartesian point.
    fn actuator_to_pt(
        &self,
        actuator: &AxisFloats,
        out_pt: &mut AxisFloats,
        cur_pos: &AxisPosition,
        params: &AxesParams,
    );

    /// Wraps step counters on continuous-rotation axes; called after every
    /// enqueue. The default handles per-axis wrapping, which suits most
    /// geometries.
    fn correct_step_overflow(&self, cur_pos: &mut AxisPosition, params: &AxesParams) {
        for axis in 0..MAX_AXES {
            let ap = &params.axes[axis];
            if !ap.is_continuous_rotation {
                continue;
            }
            if let Some(spr) = ap.steps_per_rev() {
                if spr > 0 {
                    cur_pos.steps[axis] = cur_pos.steps[axis].rem_euclid(spr);
                }
            }
        }
    }
}

/// Resolved per-axis target in mm: the commanded value where valid, the
/// current position elsewhere.
fn resolve_axis(target_pt: &AxisFloats, cur_pos: &AxisPosition, axis: usize) -> f32 {
    if target_pt.is_valid(axis) {
        target_pt.val(axis)
    } else {
        cur_pos.mm[axis] as f32
    }
}

/// Plain cartesian robot: each stepper maps directly to one axis.
#[derive(Debug, Default, Clone, Copy)]
pub struct XYBotGeometry;

impl RobotGeometry for XYBotGeometry {
    fn pt_to_actuator(
        &self,
        target_pt: &AxisFloats,
        out_actuator: &mut AxisFloats,
        cur_pos: &AxisPosition,
        params: &AxesParams,
        _allow_out_of_bounds: bool,
    ) -> bool {
        let mut in_bounds = true;
        for axis in 0..MAX_AXES {
            let val = resolve_axis(target_pt, cur_pos, axis);
            if params.axes[axis].out_of_bounds(val) {
                in_bounds = false;
            }
            out_actuator.set_val(axis, val);
        }
        in_bounds
    }

    fn actuator_to_pt(
        &self,
        actuator: &AxisFloats,
        out_pt: &mut AxisFloats,
        _cur_pos: &AxisPosition,
        _params: &AxesParams,
    ) {
        for axis in 0..MAX_AXES {
            out_pt.set_val(axis, actuator.val(axis));
        }
    }
}

/// HBot/CoreXY belt arrangement: two coupled steppers drive X and Y, the
/// third axis (if present) is direct.
///
/// See: https://corexy.com/theory.html
#[derive(Debug, Default, Clone, Copy)]
pub struct HBotGeometry;

impl RobotGeometry for HBotGeometry {
    fn pt_to_actuator(
        &self,
        target_pt: &AxisFloats,
        out_actuator: &mut AxisFloats,
        cur_pos: &AxisPosition,
        params: &AxesParams,
        _allow_out_of_bounds: bool,
    ) -> bool {
        let x = resolve_axis(target_pt, cur_pos, 0);
        let y = resolve_axis(target_pt, cur_pos, 1);
        // Bounds apply in cartesian space, before the belt transform.
        let mut in_bounds =
            !params.axes[0].out_of_bounds(x) && !params.axes[1].out_of_bounds(y);
        out_actuator.set_val(0, x + y);
        out_actuator.set_val(1, x - y);
        for axis in 2..MAX_AXES {
            let val = resolve_axis(target_pt, cur_pos, axis);
            if params.axes[axis].out_of_bounds(val) {
                in_bounds = false;
            }
            out_actuator.set_val(axis, val);
        }
        in_bounds
    }

    fn actuator_to_pt(
        &self,
        actuator: &AxisFloats,
        out_pt: &mut AxisFloats,
        _cur_pos: &AxisPosition,
        _params: &AxesParams,
    ) {
        let a = actuator.val(0);
        let b = actuator.val(1);
        out_pt.set_val(0, (a + b) / 2.0);
        out_pt.set_val(1, (a - b) / 2.0);
        for axis in 2..MAX_AXES {
            out_pt.set_val(axis, actuator.val(axis));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f32, y: f32) -> AxisFloats {
        let mut p = AxisFloats::new();
        p.set_val(0, x);
        p.set_val(1, y);
        p
    }

    #[test]
    fn cartesian_is_identity() {
        let geom = XYBotGeometry;
        let params = AxesParams::default();
        let pos = AxisPosition::new();
        let mut act = AxisFloats::new();
        assert!(geom.pt_to_actuator(&pt(10.0, -3.5), &mut act, &pos, &params, false));
        assert_eq!(act.val(0), 10.0);
        assert_eq!(act.val(1), -3.5);

        let mut back = AxisFloats::new();
        geom.actuator_to_pt(&act, &mut back, &pos, &params);
        assert_eq!(back.val(0), 10.0);
        assert_eq!(back.val(1), -3.5);
    }

    #[test]
    fn cartesian_reports_soft_limit() {
        let geom = XYBotGeometry;
        let mut params = AxesParams::default();
        params.axes[0].min_val_mm = Some(0.0);
        let pos = AxisPosition::new();
        let mut act = AxisFloats::new();
        assert!(!geom.pt_to_actuator(&pt(-1.0, 0.0), &mut act, &pos, &params, false));
        // Conversion still happens for allow-out-of-bounds callers.
        assert_eq!(act.val(0), -1.0);
    }

    #[test]
    fn invalid_axes_hold_position() {
        let geom = XYBotGeometry;
        let params = AxesParams::default();
        let mut pos = AxisPosition::new();
        pos.set_axis(1, 7.0, 560);
        let mut target = AxisFloats::new();
        target.set_val(0, 1.0);
        let mut act = AxisFloats::new();
        geom.pt_to_actuator(&target, &mut act, &pos, &params, false);
        assert_eq!(act.val(1), 7.0);
    }

    #[test]
    fn hbot_roundtrip_within_one_step() {
        let geom = HBotGeometry;
        let params = AxesParams::default();
        let pos = AxisPosition::new();
        let mut act = AxisFloats::new();
        geom.pt_to_actuator(&pt(12.25, 3.75), &mut act, &pos, &params, false);
        assert_eq!(act.val(0), 16.0);
        assert_eq!(act.val(1), 8.5);

        let mut back = AxisFloats::new();
        geom.actuator_to_pt(&act, &mut back, &pos, &params);
        let step = 1.0 / params.steps_per_mm(0);
        assert!((back.val(0) - 12.25).abs() < step);
        assert!((back.val(1) - 3.75).abs() < step);
    }

    #[test]
    fn continuous_rotation_wraps_steps_only() {
        let geom = XYBotGeometry;
        let mut params = AxesParams::default();
        params.axes[2].is_continuous_rotation = true;
        params.axes[2].units_per_rev = Some(360.0);
        params.axes[2].steps_per_mm = 10.0; // steps per degree here
        let mut pos = AxisPosition::new();
        pos.set_axis(2, 450.0, 4500);
        geom.correct_step_overflow(&mut pos, &params);
        assert_eq!(pos.steps[2], 900); // wrapped past one revolution
        assert_eq!(pos.mm[2], 450.0); // unwrapped angle untouched

        pos.set_axis(2, -90.0, -900);
        geom.correct_step_overflow(&mut pos, &params);
        assert_eq!(pos.steps[2], 2700);
    }
}
