//! Tensor metadata registry consumed by every optimization kernel.

mod descriptor;
mod dtype;
mod format;
mod shape;

pub use descriptor::{TensorDescriptor, TensorTable};
pub use dtype::DataType;
pub use format::DataFormat;
pub use shape::{TensorShape, MAX_DIM_COUNT};
