use std::io::Write;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::container::Container;
use super::private_data::PrivateDataSchema;
use super::{DeserializationContext, SerializationContext};
use crate::error::{OptError, OptResult};
use crate::optimizer::CommonParam;
use crate::params::{CastParam, SoftmaxParam, TopKParam};

const OP_PARAM_MAGIC: &[u8; 4] = b"NNOP";

/// Tags of the portable-parameter union. Values are part of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpParamType {
    CastParam = 1,
    SoftmaxParam = 2,
    TopKParam = 3,
}

impl OpParamType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(OpParamType::CastParam),
            2 => Some(OpParamType::SoftmaxParam),
            3 => Some(OpParamType::TopKParam),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

/// Portable parameter with a registered outer tag.
pub trait PmxParam: Serialize + DeserializeOwned {
    const PARAM_TYPE: OpParamType;
}

impl PmxParam for CastParam {
    const PARAM_TYPE: OpParamType = OpParamType::CastParam;
}

impl PmxParam for SoftmaxParam {
    const PARAM_TYPE: OpParamType = OpParamType::SoftmaxParam;
}

impl PmxParam for TopKParam {
    const PARAM_TYPE: OpParamType = OpParamType::TopKParam;
}

/// Outer payload: the encoded parameter and the embedded private-data container.
#[derive(Serialize, Deserialize)]
struct OpParamRecord {
    param: Vec<u8>,
    data: Vec<u8>,
}

/// Encodes `common` into the backend container, wraps it with `param` in the outer
/// container and writes the result to `ds`.
pub fn serialize_op<P: PmxParam>(
    ctx: &SerializationContext,
    param: &P,
    common: &CommonParam,
    schema: &PrivateDataSchema,
    ds: &mut dyn Write,
) -> OptResult<()> {
    let data = schema.encode(ctx.format_version, common)?;
    let record = OpParamRecord {
        param: bincode::serialize(param)?,
        data,
    };
    let payload = bincode::serialize(&record)?;
    let bytes = Container::finish(
        OP_PARAM_MAGIC,
        ctx.format_version,
        P::PARAM_TYPE.tag(),
        &payload,
    )?;
    ds.write_all(&bytes)?;
    Ok(())
}

/// Reverses [`serialize_op`]. Nothing is returned unless both levels decode.
pub fn deserialize_op<P: PmxParam>(
    ctx: &DeserializationContext,
    bytes: &[u8],
    schema: &PrivateDataSchema,
) -> OptResult<(P, CommonParam)> {
    let container = Container::open(OP_PARAM_MAGIC, ctx.format_version, bytes)?;
    let param_type =
        OpParamType::from_tag(container.tag).ok_or(OptError::UnknownSchemaTag {
            schema: "OpParamType",
            tag: container.tag,
        })?;
    if param_type != P::PARAM_TYPE {
        return Err(OptError::serialization(format!(
            "container holds {param_type:?}, expected {:?}",
            P::PARAM_TYPE
        )));
    }
    let record: OpParamRecord = bincode::deserialize(container.payload)?;
    let param: P = bincode::deserialize(&record.param)?;
    let common = schema.decode(ctx.format_version, &record.data)?;
    Ok((param, common))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pmx::FORMAT_VERSION;
    use crate::tensor::{DataFormat, DataType};

    const SCHEMA: PrivateDataSchema = PrivateDataSchema::new("test", *b"NNTS");

    fn common() -> CommonParam {
        CommonParam {
            output_types: vec![DataType::Float16, DataType::Int32],
            output_formats: vec![DataFormat::Ndarray, DataFormat::Ndarray],
        }
    }

    fn encode<P: PmxParam>(param: &P) -> Vec<u8> {
        let mut bytes = Vec::new();
        serialize_op(&SerializationContext::default(), param, &common(), &SCHEMA, &mut bytes)
            .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        bytes
    }

    #[test]
    fn round_trip_restores_param_and_common() {
        let param = TopKParam {
            axis: 1,
            largest: false,
            sorted: true,
        };
        let bytes = encode(&param);
        let (decoded, restored) =
            deserialize_op::<TopKParam>(&DeserializationContext::default(), &bytes, &SCHEMA)
                .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        assert_eq!(decoded, param);
        assert_eq!(restored, common());
    }

    #[test]
    fn unknown_outer_tag_is_rejected() {
        let payload = bincode::serialize(&OpParamRecord {
            param: Vec::new(),
            data: Vec::new(),
        })
        .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        let bytes = Container::finish(OP_PARAM_MAGIC, FORMAT_VERSION, 42, &payload)
            .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        let err = deserialize_op::<CastParam>(&DeserializationContext::default(), &bytes, &SCHEMA)
            .expect_err("tag 42 is not registered");
        assert!(matches!(
            err,
            OptError::UnknownSchemaTag {
                schema: "OpParamType",
                tag: 42
            }
        ));
    }

    #[test]
    fn unknown_inner_tag_is_rejected() {
        let inner = Container::finish(&SCHEMA.magic, FORMAT_VERSION, 9, &[])
            .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        let record = OpParamRecord {
            param: bincode::serialize(&SoftmaxParam { axis: -1 })
                .unwrap_or_else(|err| panic!("unexpected error: {err}")),
            data: inner,
        };
        let payload = bincode::serialize(&record).unwrap_or_else(|err| panic!("unexpected error: {err}"));
        let bytes = Container::finish(
            OP_PARAM_MAGIC,
            FORMAT_VERSION,
            OpParamType::SoftmaxParam.tag(),
            &payload,
        )
        .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        let err = deserialize_op::<SoftmaxParam>(&DeserializationContext::default(), &bytes, &SCHEMA)
            .expect_err("tag 9 is not registered");
        assert!(matches!(
            err,
            OptError::UnknownSchemaTag {
                schema: "PrivateDataType",
                tag: 9
            }
        ));
    }

    #[test]
    fn mismatched_param_type_is_rejected() {
        let bytes = encode(&CastParam { to: DataType::Int64 });
        let err = deserialize_op::<TopKParam>(&DeserializationContext::default(), &bytes, &SCHEMA)
            .expect_err("cast container decoded as topk");
        assert!(matches!(err, OptError::Serialization(_)));
    }

    #[test]
    fn inner_container_of_other_backend_is_rejected() {
        let bytes = encode(&SoftmaxParam { axis: 0 });
        let other = PrivateDataSchema::new("other", *b"NNXX");
        let err = deserialize_op::<SoftmaxParam>(&DeserializationContext::default(), &bytes, &other)
            .expect_err("magic differs");
        assert!(matches!(err, OptError::Serialization(_)));
    }
}
