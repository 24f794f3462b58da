use std::env;
use std::sync::OnceLock;

use crate::tensor::DataType;

static NNOPT_SPECULATIVE_DIM: OnceLock<Option<i64>> = OnceLock::new();
static NNOPT_PREFERRED_FP: OnceLock<Option<DataType>> = OnceLock::new();

fn non_empty(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

pub(crate) fn speculative_dim_override() -> Option<i64> {
    *NNOPT_SPECULATIVE_DIM.get_or_init(|| {
        non_empty("NNOPT_SPECULATIVE_DIM")
            .and_then(|value| value.trim().parse::<i64>().ok())
            .filter(|dim| *dim > 0)
    })
}

pub(crate) fn preferred_fp_override() -> Option<DataType> {
    *NNOPT_PREFERRED_FP.get_or_init(|| {
        non_empty("NNOPT_PREFERRED_FP")
            .and_then(|value| value.parse::<DataType>().ok())
            .filter(|dtype| dtype.is_float())
    })
}
