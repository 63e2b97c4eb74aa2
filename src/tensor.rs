use std::marker::PhantomData;

use cubecl::bytes::Bytes;
use cubecl::prelude::*;
use cubecl::server::Handle;

use crate::error::GroupedGemmError;
use crate::kernel::schedule;

/// Owned device buffer plus the row-major metadata needed to hand it to a
/// kernel launch.
pub struct DeviceTensor<R: Runtime> {
    handle: Handle,
    shape: Vec<usize>,
    strides: Vec<usize>,
    elem_size: usize,
    _marker: PhantomData<R>,
}

fn contiguous_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![0; shape.len()];
    let mut stride = 1;
    for i in (0..shape.len()).rev() {
        strides[i] = stride;
        stride *= shape[i];
    }
    strides
}

/// Row-major with no padding between rows.
pub(crate) fn is_row_major(shape: &[usize], strides: &[usize]) -> bool {
    shape.len() == strides.len() && strides == contiguous_strides(shape)
}

impl<R: Runtime> DeviceTensor<R> {
    /// Upload `data` as a contiguous row-major tensor of the given shape.
    pub fn from_slice<T: bytemuck::NoUninit>(
        client: &ComputeClient<R>,
        shape: Vec<usize>,
        data: &[T],
    ) -> Self {
        assert_eq!(
            shape.iter().product::<usize>(),
            data.len(),
            "shape does not cover the uploaded data"
        );
        let bytes = Bytes::from_bytes_vec(bytemuck::cast_slice(data).to_vec());
        let handle = client.create(bytes);
        let strides = contiguous_strides(&shape);
        Self {
            handle,
            strides,
            shape,
            elem_size: std::mem::size_of::<T>(),
            _marker: PhantomData,
        }
    }

    /// Allocate an uninitialized contiguous tensor.
    pub fn empty(client: &ComputeClient<R>, shape: Vec<usize>, elem_size: usize) -> Self {
        let num_elements: usize = shape.iter().product();
        let handle = client.empty(num_elements * elem_size);
        let strides = contiguous_strides(&shape);
        Self {
            handle,
            strides,
            shape,
            elem_size,
            _marker: PhantomData,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn as_ref(&self) -> TensorHandleRef<'_, R> {
        TensorHandleRef {
            handle: &self.handle,
            strides: &self.strides,
            shape: &self.shape,
            elem_size: self.elem_size,
            runtime: PhantomData,
        }
    }

    /// Synchronous readback of the raw bytes.
    pub fn read(&self, client: &ComputeClient<R>) -> Vec<u8> {
        client.read_one(self.handle.clone()).to_vec()
    }
}

/// Upload group offsets from the host, validating the ragged-batch contract
/// (`m_offsets` monotonically non-decreasing, last entry equal to `m`) that
/// the device entry points cannot re-check.
pub fn upload_offsets<R: Runtime>(
    client: &ComputeClient<R>,
    m_offsets: &[i32],
    m: usize,
) -> Result<DeviceTensor<R>, GroupedGemmError> {
    schedule::validate_offsets(m_offsets, m)?;
    Ok(DeviceTensor::from_slice(
        client,
        vec![m_offsets.len()],
        m_offsets,
    ))
}

#[cfg(test)]
mod tests {
    use super::{contiguous_strides, is_row_major};

    #[test]
    fn contiguous_strides_are_row_major() {
        assert_eq!(contiguous_strides(&[4, 8]), vec![8, 1]);
        assert_eq!(contiguous_strides(&[2, 3, 5]), vec![15, 5, 1]);
    }

    #[test]
    fn transposed_strides_are_not_contiguous() {
        assert!(is_row_major(&[4, 8], &[8, 1]));
        assert!(!is_row_major(&[4, 8], &[1, 4]));
        assert!(!is_row_major(&[4, 8], &[16, 1]));
    }
}
