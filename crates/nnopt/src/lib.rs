//! Operator-level optimization kernels for a multi-backend inference engine.
//!
//! Every graph node gets one [`optimizer::OptKernel`] picked from the build-time
//! [`registry`] for the active backend. The [`driver::Compiler`] walks the graph and runs
//! the per-node sequence `init -> select type -> select format -> infer type -> infer dims
//! -> finalize -> create kernel`, deferring nodes whose shapes depend on buffers that are not
//! materialized yet. With the `pmx` feature the resulting decisions can be frozen into a
//! binary container and restored without re-running optimization.

pub use linkme;

pub mod config;
pub mod driver;
mod env;
pub mod error;
pub mod ir;
pub mod kernel;
pub mod oputils;
pub mod optimizer;
pub mod params;
#[cfg(feature = "pmx")]
pub mod pmx;
pub mod quant;
pub mod registry;
pub mod tensor;
pub mod view;

pub use config::OptimizerConfig;
pub use error::{OptError, OptResult};
pub use optimizer::{OpKind, OptKernel, OptKernelOptions};
pub use tensor::{DataFormat, DataType, TensorDescriptor, TensorShape, TensorTable};
pub use view::InputOutputInfo;
