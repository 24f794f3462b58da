use serde::{Deserialize, Serialize};

use super::{axis_attr, flag_attr, LoadParam};
use crate::ir::{Attributes, OpType};

/// `k` itself is not a parameter: it arrives through the second input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopKParam {
    pub axis: i32,
    pub largest: bool,
    pub sorted: bool,
}

impl LoadParam for TopKParam {
    fn load(_op_type: &OpType, attrs: &Attributes) -> Result<Self, String> {
        Ok(TopKParam {
            axis: axis_attr(attrs, -1)?,
            largest: flag_attr(attrs, "largest", true)?,
            sorted: flag_attr(attrs, "sorted", true)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::AttrValue;

    #[test]
    fn defaults_follow_onnx() {
        let param = TopKParam::load(&OpType::onnx("TopK", 11), &Attributes::new())
            .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        assert_eq!(
            param,
            TopKParam {
                axis: -1,
                largest: true,
                sorted: true
            }
        );
    }

    #[test]
    fn non_boolean_flag_is_rejected() {
        let attrs = Attributes::new().with("sorted", AttrValue::Int(2));
        let err = TopKParam::load(&OpType::onnx("TopK", 11), &attrs).expect_err("2 is not a flag");
        assert!(err.contains("sorted"), "{err}");
    }
}
