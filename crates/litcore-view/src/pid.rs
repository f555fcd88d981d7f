//! Dynamic-resolution PID controller (`spec.md` §4.4.4), new code in the
//! teacher's idiom — grounded on the general shape of `ard-render-camera`'s
//! per-frame update methods (snapshot current state, diff against a
//! `last_*` field, write back) rather than on a literal teacher type, since
//! no PID controller exists in the teacher repo.

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicResolutionConfig {
    pub target_frame_time_ms: f32,
    pub head_room_ratio: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// §4.4.4 "non-homogeneous scaling": scale the major axis toward the
    /// minor axis before scaling both uniformly.
    pub allow_non_homogeneous: bool,
}

impl Default for DynamicResolutionConfig {
    fn default() -> Self {
        Self {
            target_frame_time_ms: 16.6,
            head_room_ratio: 0.1,
            min_scale: 0.5,
            max_scale: 1.0,
            kp: 0.5,
            ki: 0.1,
            kd: 0.05,
            allow_non_homogeneous: true,
        }
    }
}

const INTEGRAL_LIMIT: f32 = 100.0;
const DEADBAND_LOW: f32 = -0.01;
const DEADBAND_HIGH: f32 = 0.05;

/// A PID controller producing a resolution-scale multiplier from measured
/// frame time. One instance per view.
pub struct DynamicResolutionController {
    config: DynamicResolutionConfig,
    integral: f32,
    last_error: f32,
    scale: f32,
    clamped: bool,
}

impl DynamicResolutionController {
    pub fn new(config: DynamicResolutionConfig) -> Self {
        let scale = config.max_scale;
        Self { config, integral: 0.0, last_error: 0.0, scale, clamped: false }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Advances the controller by one frame. `measured_frame_time_ms` should
    /// already be denoised (e.g. an EMA) per §4.4.4's "process variable =
    /// denoised measured frame time".
    pub fn update(&mut self, dt_seconds: f32, measured_frame_time_ms: f32) -> f32 {
        let setpoint = self.config.target_frame_time_ms * (1.0 - self.config.head_room_ratio);
        let error = measured_frame_time_ms - setpoint;

        if !self.clamped {
            self.integral = (self.integral + error * dt_seconds).clamp(-INTEGRAL_LIMIT, INTEGRAL_LIMIT);
        }
        let derivative = if dt_seconds > 0.0 { (error - self.last_error) / dt_seconds } else { 0.0 };
        self.last_error = error;

        let mut output =
            self.config.kp * error + self.config.ki * self.integral + self.config.kd * derivative;

        // Positive error (frame too slow) should shrink the scale; a raw
        // PID output is framed the other way round, so the sign is flipped
        // once here rather than negating every gain.
        output = -output * 0.001;

        if (DEADBAND_LOW..=DEADBAND_HIGH).contains(&output) {
            output = 0.0;
        }

        let proposed = self.scale + output;
        let clamped = proposed.clamp(self.config.min_scale, self.config.max_scale);
        self.clamped = clamped != proposed;
        self.scale = clamped;
        self.scale
    }

    /// Splits the scalar `scale()` into independent (x, y) axis scales per
    /// §4.4.4's non-homogeneous mode: the major axis is scaled down to
    /// parity with the minor axis before the minor axis gives up any of its
    /// own budget.
    pub fn axis_scales(&self, width: u32, height: u32) -> (f32, f32) {
        let scale = self.scale;
        if scale >= 1.0 || !self.config.allow_non_homogeneous || width == 0 || height == 0 {
            return (scale, scale);
        }

        let w = width as f32;
        let h = height as f32;
        let target_area = scale * scale;

        if w >= h {
            let major_scale_to_square = h / w;
            if target_area >= major_scale_to_square {
                (target_area, 1.0)
            } else {
                let remaining = (target_area / major_scale_to_square).sqrt();
                (major_scale_to_square * remaining, remaining)
            }
        } else {
            let major_scale_to_square = w / h;
            if target_area >= major_scale_to_square {
                (1.0, target_area)
            } else {
                let remaining = (target_area / major_scale_to_square).sqrt();
                (remaining, major_scale_to_square * remaining)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_stays_within_configured_bounds() {
        let config = DynamicResolutionConfig { min_scale: 0.6, max_scale: 1.0, ..Default::default() };
        let mut controller = DynamicResolutionController::new(config);

        // xorshift for deterministic, dependency-free pseudo-randomness.
        let mut state = 0x1234_5678u32;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state
        };

        for _ in 0..500 {
            let frame_time = 5.0 + (next() % 4000) as f32 / 100.0; // 5..45 ms
            let scale = controller.update(1.0 / 60.0, frame_time);
            assert!(scale >= config.min_scale - 1e-5, "scale {scale} below min");
            assert!(scale <= config.max_scale + 1e-5, "scale {scale} above max");
        }
    }

    #[test]
    fn sustained_slow_frames_drive_scale_down() {
        let mut controller = DynamicResolutionController::new(DynamicResolutionConfig::default());
        for _ in 0..200 {
            controller.update(1.0 / 60.0, 33.0);
        }
        assert!(controller.scale() < 1.0, "persistent overbudget frame time should reduce scale");
    }

    #[test]
    fn axis_scales_keep_minor_axis_at_full_size_for_mild_reduction() {
        let config = DynamicResolutionConfig { min_scale: 0.1, max_scale: 1.0, ..Default::default() };
        let mut controller = DynamicResolutionController::new(config);
        controller.scale = 0.95;
        let (sx, sy) = controller.axis_scales(1920, 1080);
        assert!(sx < 1.0);
        assert!((sy - 1.0).abs() < 1e-5, "minor axis should stay untouched for a mild reduction");
    }
}
