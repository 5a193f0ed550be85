//! Data-driven movement tuning
//!
//! Defaults come from `consts`. Overrides are JSON: a file named by the
//! `WAYFARER_TUNING` environment variable on native, LocalStorage on web.
//! Missing fields keep their defaults.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Environment variable naming a tuning JSON file (native)
pub const TUNING_ENV: &str = "WAYFARER_TUNING";

/// Movement and interaction tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Per-tick step size; the direct path advances half of it
    pub step: f32,
    /// Distance under which the player counts as arrived
    pub arrival_epsilon: f32,
    /// Corner navigation step as a fraction of `step`
    pub corner_step_factor: f32,
    /// Deflections (degrees) tried around the bearing, in priority order
    pub corner_angles_deg: Vec<f32>,
    /// Pickup radius as a fraction of the player footprint
    pub pickup_radius_factor: f32,
    /// Edge band that triggers a scene exit
    pub exit_margin: f32,
    /// Inset from the opposite edge when entering a scene
    pub entry_margin: f32,
    /// Target offset for a directional move request
    pub move_offset: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            step: STEP,
            arrival_epsilon: ARRIVAL_EPSILON,
            corner_step_factor: CORNER_STEP_FACTOR,
            corner_angles_deg: CORNER_ANGLES_DEG.to_vec(),
            pickup_radius_factor: PICKUP_RADIUS_FACTOR,
            exit_margin: EXIT_MARGIN,
            entry_margin: ENTRY_MARGIN,
            move_offset: MOVE_OFFSET,
        }
    }
}

impl Tuning {
    /// Step length for the direct path
    #[inline]
    pub fn direct_step(&self) -> f32 {
        self.step * 0.5
    }

    /// Step length for axis slides
    #[inline]
    pub fn slide_step(&self) -> f32 {
        self.step * 0.5
    }

    /// Step length for corner deflections
    #[inline]
    pub fn corner_step(&self) -> f32 {
        self.step * self.corner_step_factor
    }

    /// Distance within which a pickup is collected
    #[inline]
    pub fn pickup_radius(&self) -> f32 {
        CUBE_SIZE * self.pickup_radius_factor
    }

    /// Parse overrides; absent fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let tuning: Tuning = serde_json::from_str(json)?;
        Ok(tuning.sanitized())
    }

    /// Replace non-positive or non-finite values with defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let fix = |value: &mut f32, fallback: f32, name: &str| {
            if !value.is_finite() || *value <= 0.0 {
                log::warn!("Tuning: invalid {} ({}), using {}", name, value, fallback);
                *value = fallback;
            }
        };
        fix(&mut self.step, defaults.step, "step");
        fix(&mut self.arrival_epsilon, defaults.arrival_epsilon, "arrival_epsilon");
        fix(&mut self.corner_step_factor, defaults.corner_step_factor, "corner_step_factor");
        fix(&mut self.pickup_radius_factor, defaults.pickup_radius_factor, "pickup_radius_factor");
        fix(&mut self.exit_margin, defaults.exit_margin, "exit_margin");
        fix(&mut self.entry_margin, defaults.entry_margin, "entry_margin");
        fix(&mut self.move_offset, defaults.move_offset, "move_offset");
        self.corner_angles_deg.retain(|a| a.is_finite());
        self
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "wayfarer_tuning";

    /// Load tuning from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(tuning) => {
                        log::info!("Loaded tuning from LocalStorage");
                        return tuning;
                    }
                    Err(e) => log::warn!("Ignoring stored tuning: {}", e),
                }
            }
        }

        log::info!("Using default tuning");
        Self::default()
    }

    /// Load tuning from the file named by `WAYFARER_TUNING` (native)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Some(path) = std::env::var_os(TUNING_ENV) else {
            log::info!("Using default tuning");
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path.to_string_lossy());
                    tuning
                }
                Err(e) => {
                    log::warn!("Ignoring tuning file {}: {}", path.to_string_lossy(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read tuning file {}: {}", path.to_string_lossy(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_consts() {
        let t = Tuning::default();
        assert_eq!(t.step, STEP);
        assert_eq!(t.corner_angles_deg, vec![30.0, -30.0, 45.0, -45.0, 60.0, -60.0]);
        assert!((t.pickup_radius() - 0.21).abs() < 1e-6);
        assert!((t.direct_step() - 0.1).abs() < 1e-6);
        assert!((t.corner_step() - 0.06).abs() < 1e-6);
    }

    #[test]
    fn test_partial_override() {
        let t = Tuning::from_json(r#"{ "step": 0.4 }"#).unwrap();
        assert_eq!(t.step, 0.4);
        assert_eq!(t.exit_margin, EXIT_MARGIN);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let t = Tuning::from_json(r#"{ "step": -1.0, "exit_margin": 0.0 }"#).unwrap();
        assert_eq!(t.step, STEP);
        assert_eq!(t.exit_margin, EXIT_MARGIN);
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(Tuning::from_json("{ step: ").is_err());
    }
}
