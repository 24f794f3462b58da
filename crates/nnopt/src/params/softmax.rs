use serde::{Deserialize, Serialize};

use super::{axis_attr, LoadParam};
use crate::ir::{Attributes, OpType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftmaxParam {
    pub axis: i32,
}

impl LoadParam for SoftmaxParam {
    fn load(op_type: &OpType, attrs: &Attributes) -> Result<Self, String> {
        // opset 13 moved the default axis from 1 to -1
        let default_axis = if op_type.version >= 13 { -1 } else { 1 };
        Ok(SoftmaxParam {
            axis: axis_attr(attrs, default_axis)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::AttrValue;

    #[test]
    fn default_axis_depends_on_opset() {
        let attrs = Attributes::new();
        let old = SoftmaxParam::load(&OpType::onnx("Softmax", 11), &attrs)
            .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        let new = SoftmaxParam::load(&OpType::onnx("Softmax", 13), &attrs)
            .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        assert_eq!(old.axis, 1);
        assert_eq!(new.axis, -1);
    }

    #[test]
    fn explicit_axis_wins() {
        let attrs = Attributes::new().with("axis", AttrValue::Int(2));
        let param = SoftmaxParam::load(&OpType::onnx("Softmax", 13), &attrs)
            .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        assert_eq!(param.axis, 2);
    }
}
