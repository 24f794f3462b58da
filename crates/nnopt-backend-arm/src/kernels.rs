use nnopt::params::{CastParam, SoftmaxParam, TopKParam};

nnopt::param_kernel!(
    /// Element-wise type conversion.
    CastKernel,
    CastParam,
    crate::BACKEND_NAME
);

nnopt::param_kernel!(SoftmaxKernel, SoftmaxParam, crate::BACKEND_NAME);

nnopt::param_kernel!(
    /// Selects `k` values and their `Int32` indices along one axis.
    TopKKernel,
    TopKParam,
    crate::BACKEND_NAME
);
