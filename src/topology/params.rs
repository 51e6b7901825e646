use serde::{Deserialize, Serialize};

/// Parameters controlling location equality, face grouping and perimeter
/// extraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MorphParams {
    /// Grid spacing used to quantize positions; points whose quantized
    /// positions match are considered colocated.
    pub location_precision: f64,
    /// Maximum angle (radians) between two normals still considered
    /// conormal. `0.0` requires exact equality.
    pub normal_tolerance: f64,
    /// Maximum number of steps a perimeter walk may take before failing.
    pub max_perimeter_steps: usize,
    /// If `true`, mesh ingestion reuses a point only when its shading
    /// attributes match as well as its location, so hard edges keep one point
    /// per attribute set.
    pub split_attributes: bool,
}

impl Default for MorphParams {
    fn default() -> Self {
        Self {
            location_precision: 1e-6,
            normal_tolerance: 0.0,
            max_perimeter_steps: 999,
            split_attributes: false,
        }
    }
}
