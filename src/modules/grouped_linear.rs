use crate::kernel::LINE_SIZE;
use crate::kernel::grouped_gemm::launch_grouped_gemm_into;
use burn::{
    module::{Param, ParamId},
    prelude::*,
};
use burn_cubecl::{BoolElement, CubeBackend, CubeRuntime, FloatElement, IntElement};
use burn_tensor::{DType, Int, TensorMetadata, TensorPrimitive};

/// Configuration for a grouped linear layer: `groups` independent
/// `d_input -> d_output` projections stored as one `[groups * d_output,
/// d_input]` weight, applied to a ragged activation batch whose group
/// boundaries arrive as row offsets.
#[derive(Clone, Debug)]
pub struct GroupedLinearConfig {
    groups: usize,
    d_input: usize,
    d_output: usize,
}

impl GroupedLinearConfig {
    pub fn new(groups: usize, d_input: usize, d_output: usize) -> Self {
        Self {
            groups,
            d_input,
            d_output,
        }
    }

    pub fn build<B: Backend>(&self, device: &Device<B>) -> GroupedLinear<B> {
        assert!(
            self.groups >= 2,
            "grouped linear needs at least 2 groups"
        );
        assert!(self.d_output > 0, "d_output must be > 0");
        assert!(
            self.d_input.is_multiple_of(LINE_SIZE),
            "d_input must be divisible by the line size ({LINE_SIZE})"
        );

        let weight = Param::initialized(
            ParamId::new(),
            Tensor::<B, 2>::empty([self.groups * self.d_output, self.d_input], device),
        );

        GroupedLinear {
            weight,
            groups: self.groups,
        }
    }
}

/// One fused projection over a ragged batch: rows
/// `[m_offsets[g-1], m_offsets[g])` of the input go through group `g`'s
/// `[d_output, d_input]` weight slice.
#[derive(Debug, Module)]
pub struct GroupedLinear<B: Backend> {
    weight: Param<Tensor<B, 2>>,
    groups: usize,
}

impl<B: Backend> GroupedLinear<B> {
    pub fn groups(&self) -> usize {
        self.groups
    }

    pub fn d_output(&self) -> usize {
        let rows = *self.weight.val().shape().first().unwrap();
        rows / self.groups
    }
}

impl<R: CubeRuntime, F: FloatElement, I: IntElement, BT: BoolElement>
    GroupedLinear<CubeBackend<R, F, I, BT>>
{
    /// `input` is `[M, d_input]` with group boundaries given by `m_offsets`
    /// (length `groups`, last entry `M`); returns `[M, d_output]`.
    pub fn forward(
        &self,
        input: Tensor<CubeBackend<R, F, I, BT>, 2>,
        m_offsets: Tensor<CubeBackend<R, F, I, BT>, 1, Int>,
    ) -> Tensor<CubeBackend<R, F, I, BT>, 2> {
        let [m, k] = input.dims();
        let weight = self.weight.val();
        let [weight_rows, k_from_weight] = weight.dims();
        assert_eq!(k, k_from_weight, "input last dim (K) must match weight cols");
        let n = weight_rows / self.groups;
        assert_eq!(
            m_offsets.dims()[0],
            self.groups,
            "m_offsets length must equal the group count"
        );

        let offsets_primitive = m_offsets.into_primitive();
        assert!(
            matches!(offsets_primitive.dtype(), DType::I32 | DType::U32),
            "m_offsets must have i32/u32 dtype"
        );

        let device = input.device();
        let output = Tensor::<CubeBackend<R, F, I, BT>, 2>::empty([m, n], &device);

        let input_primitive = match input.into_primitive() {
            TensorPrimitive::Float(float) => float,
            TensorPrimitive::QFloat(_) => panic!("unsupported qfloat"),
        };
        let weight_primitive = match weight.into_primitive() {
            TensorPrimitive::Float(float) => float,
            TensorPrimitive::QFloat(_) => panic!("unsupported qfloat"),
        };
        let output_primitive = match output.into_primitive() {
            TensorPrimitive::Float(float) => float,
            TensorPrimitive::QFloat(_) => panic!("unsupported qfloat"),
        };

        launch_grouped_gemm_into::<R, F>(
            &input_primitive.client,
            &device,
            &input_primitive.as_handle_ref(),
            &weight_primitive.as_handle_ref(),
            &offsets_primitive.as_handle_ref(),
            None,
            None,
            &output_primitive.as_handle_ref(),
            None,
        )
        .expect("grouped GEMM launch failed");

        Tensor::<CubeBackend<R, F, I, BT>, 2>::from_primitive(TensorPrimitive::Float(
            output_primitive,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::GroupedLinearConfig;
    use burn_cubecl::CubeBackend;
    use cubecl::wgpu::{WgpuDevice, WgpuRuntime};

    type TestBackend = CubeBackend<WgpuRuntime, f32, i32, u32>;

    // Both rejections fire before any tensor is created, so no device is
    // touched.
    #[test]
    #[should_panic(expected = "at least 2 groups")]
    fn config_rejects_a_single_group() {
        let config = GroupedLinearConfig::new(1, 64, 32);
        config.build::<TestBackend>(&WgpuDevice::default());
    }

    #[test]
    #[should_panic(expected = "d_input must be divisible")]
    fn config_rejects_unaligned_d_input() {
        let config = GroupedLinearConfig::new(4, 63, 32);
        config.build::<TestBackend>(&WgpuDevice::default());
    }
}
