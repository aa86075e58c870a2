use serde::{Deserialize, Serialize};

use crate::mapping::Rgba;

/// Distance below which a channel snaps onto its target.
const SNAP_EPSILON: f32 = 1e-5;

/// Exponential decay rates, in 1/seconds, for each smoothed channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub scale_rate: f32,
    pub color_rate: f32,
    pub angular_velocity_rate: f32,
    pub alpha_rate: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            scale_rate: 2.0,
            color_rate: 2.0,
            angular_velocity_rate: 2.0,
            alpha_rate: 1.5,
        }
    }
}

/// Snapshot of the smoothed output for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedValues {
    pub scale: f32,
    pub color: Rgba,
    /// Rotation in degrees, kept within `[0, 360)`.
    pub angle: f32,
    pub angular_velocity: f32,
    pub alpha: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AnimationState {
    current_scale: f32,
    target_scale: f32,
    current_color: Rgba,
    target_color: Rgba,
    current_angular_velocity: f32,
    target_angular_velocity: f32,
    angle: f32,
    current_alpha: f32,
    target_alpha: f32,
}

impl AnimationState {
    fn settled(scale: f32, color: Rgba, angular_velocity: f32, alpha: f32) -> Self {
        Self {
            current_scale: scale,
            target_scale: scale,
            current_color: color,
            target_color: color,
            current_angular_velocity: angular_velocity,
            target_angular_velocity: angular_velocity,
            angle: 0.0,
            current_alpha: alpha,
            target_alpha: alpha,
        }
    }
}

/// Moves scale, colour, angular velocity and alpha towards their targets
/// with frame-rate independent exponential smoothing.
#[derive(Debug, Clone)]
pub struct ParameterSmoother {
    config: SmoothingConfig,
    state: AnimationState,
}

impl ParameterSmoother {
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            config,
            state: AnimationState::settled(1.0, Rgba::WHITE, 0.0, 1.0),
        }
    }

    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    /// Replaces the targets without touching the current values.
    pub fn set_targets(&mut self, scale: f32, color: Rgba, angular_velocity: f32, alpha: f32) {
        self.state.target_scale = scale;
        self.state.target_color = color;
        self.state.target_angular_velocity = angular_velocity;
        self.state.target_alpha = alpha;
    }

    /// Makes the given values both current and target, and rewinds the
    /// rotation to zero.
    pub fn reset_to(&mut self, scale: f32, color: Rgba, angular_velocity: f32, alpha: f32) {
        self.state = AnimationState::settled(scale, color, angular_velocity, alpha);
    }

    /// Overwrites the current scale and alpha, leaving targets untouched.
    pub fn set_current_scale_alpha(&mut self, scale: f32, alpha: f32) {
        self.state.current_scale = scale;
        self.state.current_alpha = alpha;
    }

    pub fn advance(&mut self, delta_seconds: f32) {
        // Rejects zero, negative and NaN deltas alike.
        if !(delta_seconds > 0.0) || !delta_seconds.is_finite() {
            return;
        }

        let config = self.config;
        let state = &mut self.state;

        state.current_scale = approach(
            state.current_scale,
            state.target_scale,
            factor(config.scale_rate, delta_seconds),
        );

        let color_factor = factor(config.color_rate, delta_seconds);
        state.current_color = Rgba {
            r: approach(state.current_color.r, state.target_color.r, color_factor),
            g: approach(state.current_color.g, state.target_color.g, color_factor),
            b: approach(state.current_color.b, state.target_color.b, color_factor),
            a: approach(state.current_color.a, state.target_color.a, color_factor),
        };

        state.current_angular_velocity = approach(
            state.current_angular_velocity,
            state.target_angular_velocity,
            factor(config.angular_velocity_rate, delta_seconds),
        );
        state.current_alpha = approach(
            state.current_alpha,
            state.target_alpha,
            factor(config.alpha_rate, delta_seconds),
        );

        state.angle = wrap_degrees(state.angle + state.current_angular_velocity * delta_seconds);
    }

    pub fn current_values(&self) -> SmoothedValues {
        SmoothedValues {
            scale: self.state.current_scale,
            color: self.state.current_color,
            angle: self.state.angle,
            angular_velocity: self.state.current_angular_velocity,
            alpha: self.state.current_alpha,
        }
    }

    /// Targets as `(scale, colour, angular velocity, alpha)`.
    pub fn targets(&self) -> (f32, Rgba, f32, f32) {
        (
            self.state.target_scale,
            self.state.target_color,
            self.state.target_angular_velocity,
            self.state.target_alpha,
        )
    }

    pub fn is_settled(&self) -> bool {
        let state = &self.state;
        state.current_scale == state.target_scale
            && state.current_color == state.target_color
            && state.current_angular_velocity == state.target_angular_velocity
            && state.current_alpha == state.target_alpha
    }
}

impl Default for ParameterSmoother {
    fn default() -> Self {
        Self::new(SmoothingConfig::default())
    }
}

fn factor(rate: f32, delta_seconds: f32) -> f32 {
    let rate = if rate.is_finite() { rate.max(0.0) } else { 0.0 };
    (rate * delta_seconds).min(1.0)
}

/// Moves `current` towards `target`, snapping once the step no longer
/// changes the value or the gap is within a relative epsilon.
fn approach(current: f32, target: f32, factor: f32) -> f32 {
    let next = current + (target - current) * factor;
    if next == current || (target - next).abs() <= SNAP_EPSILON * target.abs().max(1.0) {
        target
    } else {
        next
    }
}

/// `rem_euclid` rounds tiny negative angles up to exactly 360.
fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smoother() -> ParameterSmoother {
        let mut smoother = ParameterSmoother::default();
        smoother.reset_to(0.7, Rgba::rgb(0.2, 0.4, 0.8), 10.0, 1.0);
        smoother
    }

    #[test]
    fn set_targets_leaves_current_values_alone() {
        let mut smoother = smoother();
        let before = smoother.current_values();
        smoother.set_targets(1.5, Rgba::rgb(0.9, 0.4, 0.1), 40.0, 0.0);
        smoother.set_targets(1.5, Rgba::rgb(0.9, 0.4, 0.1), 40.0, 0.0);
        assert_eq!(smoother.current_values(), before);
        assert_eq!(smoother.targets().0, 1.5);
    }

    #[test]
    fn zero_delta_is_a_no_op() {
        let mut smoother = smoother();
        smoother.set_targets(1.5, Rgba::rgb(0.9, 0.4, 0.1), 40.0, 0.0);
        smoother.advance(0.25);
        let before = smoother.current_values();

        smoother.advance(0.0);
        smoother.advance(-1.0);
        smoother.advance(f32::NAN);

        let after = smoother.current_values();
        assert_eq!(after.scale.to_bits(), before.scale.to_bits());
        assert_eq!(after.angle.to_bits(), before.angle.to_bits());
        assert_eq!(after, before);
    }

    #[test]
    fn advance_contracts_towards_target_without_overshoot() {
        let mut smoother = smoother();
        smoother.set_targets(1.5, Rgba::rgb(0.9, 0.4, 0.1), 40.0, 0.0);

        let mut previous = (1.5_f32 - smoother.current_values().scale).abs();
        for _ in 0..1200 {
            smoother.advance(1.0 / 60.0);
            let values = smoother.current_values();
            let distance = (1.5 - values.scale).abs();
            assert!(distance <= previous);
            assert!(values.scale <= 1.5);
            assert!(values.alpha >= 0.0);
            previous = distance;
        }

        assert!(smoother.is_settled());
        let values = smoother.current_values();
        assert_eq!(values.scale, 1.5);
        assert_eq!(values.color, Rgba::rgb(0.9, 0.4, 0.1));
        assert_eq!(values.angular_velocity, 40.0);
        assert_eq!(values.alpha, 0.0);
    }

    #[test]
    fn small_steps_near_a_large_target_still_settle() {
        let mut smoother = smoother();
        smoother.set_targets(1.5, Rgba::rgb(0.9, 0.4, 0.1), 40.0, 0.0);

        for _ in 0..100_000 {
            smoother.advance(1.0 / 60.0);
            if smoother.is_settled() {
                break;
            }
        }

        assert!(smoother.is_settled());
        assert_eq!(smoother.current_values().angular_velocity, 40.0);

        smoother.set_targets(1.5, Rgba::rgb(0.9, 0.4, 0.1), 40.0 - 5e-5, 0.0);
        for _ in 0..100_000 {
            smoother.advance(1.0 / 60.0);
        }
        assert_eq!(smoother.current_values().angular_velocity, 40.0 - 5e-5);
    }

    #[test]
    fn large_delta_lands_exactly_on_target() {
        let mut smoother = smoother();
        smoother.set_targets(2.0, Rgba::WHITE, 5.0, 0.5);
        smoother.advance(10.0);

        let values = smoother.current_values();
        assert_eq!(values.scale, 2.0);
        assert_eq!(values.color, Rgba::WHITE);
        assert_eq!(values.alpha, 0.5);
        assert!(values.angle.is_finite());
    }

    #[test]
    fn rotation_integrates_smoothed_velocity() {
        let mut smoother = ParameterSmoother::default();
        smoother.reset_to(1.0, Rgba::WHITE, 90.0, 1.0);

        smoother.advance(1.0);
        assert!((smoother.current_values().angle - 90.0).abs() < 1e-4);

        for _ in 0..4 {
            smoother.advance(1.0);
        }
        let angle = smoother.current_values().angle;
        assert!((0.0..360.0).contains(&angle));
        assert!((angle - 90.0).abs() < 1e-3);
    }

    #[test]
    fn negative_velocity_wraps_into_range() {
        let mut smoother = ParameterSmoother::default();
        smoother.reset_to(1.0, Rgba::WHITE, -30.0, 1.0);
        smoother.advance(1.0);
        assert!((smoother.current_values().angle - 330.0).abs() < 1e-3);
    }

    #[test]
    fn tiny_negative_rotation_stays_below_full_turn() {
        let mut smoother = ParameterSmoother::default();
        smoother.reset_to(1.0, Rgba::WHITE, -1e-6, 1.0);
        smoother.advance(0.01);

        let angle = smoother.current_values().angle;
        assert!((0.0..360.0).contains(&angle), "angle {angle} left [0, 360)");
    }
}
