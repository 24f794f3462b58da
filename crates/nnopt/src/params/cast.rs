use serde::{Deserialize, Serialize};

use super::LoadParam;
use crate::ir::{Attributes, OpType};
use crate::tensor::DataType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastParam {
    /// Target element type. Fixed at compile time, independent of backend precision.
    pub to: DataType,
}

impl LoadParam for CastParam {
    fn load(_op_type: &OpType, attrs: &Attributes) -> Result<Self, String> {
        let code = attrs
            .int("to")?
            .ok_or_else(|| "missing required attribute 'to'".to_string())?;
        let to = DataType::from_onnx(code)
            .filter(|dtype| *dtype != DataType::Unknown)
            .ok_or_else(|| format!("unsupported cast target type code {code}"))?;
        Ok(CastParam { to })
    }
}
