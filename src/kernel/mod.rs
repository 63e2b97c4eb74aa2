pub mod descriptor;
pub mod grouped_gemm;
pub mod schedule;
pub mod workspace;

pub use grouped_gemm::{
    GroupedShapeConfig, LINE_SIZE, grouped_gemm, grouped_gemm_fp8_rowwise, launch_grouped_gemm,
    launch_grouped_gemm_into,
};
pub use workspace::{DEFAULT_WORKER_COUNT, descriptor_workspace, worker_count};
