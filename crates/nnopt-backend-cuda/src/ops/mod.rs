mod cast;
mod softmax;
mod topk;

pub use cast::CastOp;
pub use softmax::SoftmaxOp;
pub use topk::TopKOp;
