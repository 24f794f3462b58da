//! Dimension bookkeeping for tensor descriptors.

use smallvec::SmallVec;

use super::{DataFormat, DataType};
use crate::error::{OptError, OptResult};

/// Maximum rank a descriptor can hold.
pub const MAX_DIM_COUNT: usize = 8;

/// Dimensions plus the data type and data format selected for a tensor.
///
/// `real_dim_count` is the rank actually in use; the backing storage always has room for
/// [`MAX_DIM_COUNT`] dimensions so reshaping never reallocates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TensorShape {
    dims: SmallVec<[i64; MAX_DIM_COUNT]>,
    data_type: DataType,
    data_format: DataFormat,
}

impl TensorShape {
    pub fn new(dims: &[i64], data_type: DataType, data_format: DataFormat) -> OptResult<Self> {
        let mut shape = TensorShape {
            dims: SmallVec::new(),
            data_type,
            data_format,
        };
        shape.reshape(dims)?;
        Ok(shape)
    }

    pub fn dims(&self) -> &[i64] {
        &self.dims
    }

    pub fn dim(&self, axis: usize) -> i64 {
        self.dims[axis]
    }

    pub fn real_dim_count(&self) -> usize {
        self.dims.len()
    }

    /// Replaces every dimension, keeping type and format.
    pub fn reshape(&mut self, dims: &[i64]) -> OptResult<()> {
        if dims.len() > MAX_DIM_COUNT {
            return Err(OptError::invalid_shape(format!(
                "rank {} exceeds the maximum of {MAX_DIM_COUNT}",
                dims.len()
            )));
        }
        self.dims.clear();
        self.dims.extend_from_slice(dims);
        Ok(())
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = data_type;
    }

    pub fn data_format(&self) -> DataFormat {
        self.data_format
    }

    pub fn set_data_format(&mut self, data_format: DataFormat) {
        self.data_format = data_format;
    }

    /// Normalizes a possibly negative axis against this rank.
    pub fn resolve_axis(&self, axis: i64) -> OptResult<usize> {
        let rank = self.real_dim_count() as i64;
        let resolved = if axis < 0 { axis + rank } else { axis };
        if resolved < 0 || resolved >= rank {
            return Err(OptError::invalid_shape(format!(
                "axis {axis} is out of range for rank {rank}"
            )));
        }
        Ok(resolved as usize)
    }
}
