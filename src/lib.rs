//! Grouped GEMM for ragged batches.
//!
//! Computes G independently-sized matrix products `C_g = A_g * B_g^T` in a
//! single persistent-kernel launch: the activation rows of all groups share
//! one contiguous buffer with per-group boundaries given by `m_offsets`, and
//! a fixed grid of workers walks the combined tile space. A plain float path
//! and a row-wise-quantized e4m3 path share the same scheduler and
//! descriptor machinery.

pub mod error;
pub mod kernel;
pub mod modules;
pub mod quantize;
pub mod tensor;
pub mod tune;

pub use error::GroupedGemmError;
pub use kernel::{grouped_gemm, grouped_gemm_fp8_rowwise, launch_grouped_gemm, worker_count};
pub use quantize::{quantize_fp8_row, quantize_fp8_row_bf16};
pub use tensor::{DeviceTensor, upload_offsets};
pub use tune::{ConfigSource, DefaultConfigs, KernelConfig, TuneKey};
