//! Solutions: the concrete ways a problem's workload is submitted to the GPU.

pub mod untextured_objects;

/// Failure to make a solution ready on a device.
#[derive(Debug, thiserror::Error)]
pub enum SolutionError {
    /// The problem has no solution of this name.
    #[error("unknown solution {0:?}")]
    Unknown(String),
    /// The device lacks features the solution relies on.
    #[error("the device is missing required features: {0:?}")]
    MissingFeatures(wgpu::Features),
    /// Resource creation raised a validation error.
    #[error("GPU resource creation failed: {0}")]
    Validation(#[from] wgpu::Error),
}

/// Checks that `available` contains everything in `required`.
pub fn require_features(
    available: wgpu::Features,
    required: wgpu::Features,
) -> Result<(), SolutionError> {
    let missing = required - available;
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SolutionError::MissingFeatures(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_features_are_reported() {
        let required = wgpu::Features::MULTI_DRAW_INDIRECT | wgpu::Features::INDIRECT_FIRST_INSTANCE;
        match require_features(wgpu::Features::MULTI_DRAW_INDIRECT, required) {
            Err(SolutionError::MissingFeatures(missing)) => {
                assert_eq!(missing, wgpu::Features::INDIRECT_FIRST_INSTANCE);
            }
            other => panic!("expected missing features, got {other:?}"),
        }
        assert!(require_features(required, required).is_ok());
        assert!(require_features(wgpu::Features::empty(), wgpu::Features::empty()).is_ok());
    }
}
