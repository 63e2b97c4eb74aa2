use cubecl::prelude::LaunchError;
use thiserror::Error;

/// Errors surfaced by the host launch path before or during a kernel launch.
///
/// Precondition violations are reported before anything touches the device;
/// a launch that was accepted either completes or fails as a whole.
#[derive(Error, Debug)]
pub enum GroupedGemmError {
    #[error("{name} tensor must be contiguous")]
    NonContiguous { name: &'static str },
    #[error("shape mismatch: {message}")]
    ShapeMismatch { message: String },
    /// A single group hits an unresolved defect in the on-device output
    /// descriptor store path and is rejected rather than miscomputed.
    #[error("grouped GEMM with {groups} group(s) is not supported")]
    UnsupportedGroupCount { groups: usize },
    #[error("either both or neither of a_scale/b_scale must be provided")]
    MissingScale,
    #[error("K={k} must be divisible by the K tile size ({block_k})")]
    UnalignedK { k: usize, block_k: usize },
    #[error("invalid group offsets: {message}")]
    InvalidOffsets { message: String },
    #[error("kernel launch failed: {0:?}")]
    Launch(#[from] LaunchError),
}
