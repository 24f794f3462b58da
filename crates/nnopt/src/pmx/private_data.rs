use serde::{Deserialize, Serialize};

use super::container::Container;
use crate::error::{OptError, OptResult};
use crate::optimizer::CommonParam;
use crate::tensor::{DataFormat, DataType};

/// Tags of the backend-private union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivateDataType {
    OutputData = 1,
}

impl PrivateDataType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(PrivateDataType::OutputData),
            _ => None,
        }
    }
}

/// Wire form of [`CommonParam`]: parallel dtype and dformat tag sequences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputData {
    pub dtype: Vec<u32>,
    pub dformat: Vec<u32>,
}

impl From<&CommonParam> for OutputData {
    fn from(common: &CommonParam) -> Self {
        Self {
            dtype: common.output_types.iter().map(|t| t.tag()).collect(),
            dformat: common.output_formats.iter().map(|f| f.tag()).collect(),
        }
    }
}

impl TryFrom<OutputData> for CommonParam {
    type Error = OptError;

    fn try_from(data: OutputData) -> OptResult<Self> {
        let output_types = data
            .dtype
            .iter()
            .map(|&tag| {
                DataType::from_tag(tag)
                    .ok_or_else(|| OptError::serialization(format!("unknown data type tag {tag}")))
            })
            .collect::<OptResult<Vec<_>>>()?;
        let output_formats = data
            .dformat
            .iter()
            .map(|&tag| {
                DataFormat::from_tag(tag)
                    .ok_or_else(|| OptError::serialization(format!("unknown data format tag {tag}")))
            })
            .collect::<OptResult<Vec<_>>>()?;
        Ok(CommonParam {
            output_types,
            output_formats,
        })
    }
}

/// Identifies one backend's private-data container by its magic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivateDataSchema {
    pub backend: &'static str,
    pub magic: [u8; 4],
}

impl PrivateDataSchema {
    pub const fn new(backend: &'static str, magic: [u8; 4]) -> Self {
        Self { backend, magic }
    }

    pub fn encode(&self, version: u16, common: &CommonParam) -> OptResult<Vec<u8>> {
        let payload = bincode::serialize(&OutputData::from(common))?;
        Container::finish(&self.magic, version, PrivateDataType::OutputData as u8, &payload)
    }

    pub fn decode(&self, version: u16, bytes: &[u8]) -> OptResult<CommonParam> {
        let container = Container::open(&self.magic, version, bytes)?;
        match PrivateDataType::from_tag(container.tag) {
            Some(PrivateDataType::OutputData) => {
                let data: OutputData = bincode::deserialize(container.payload)?;
                CommonParam::try_from(data)
            }
            None => Err(OptError::UnknownSchemaTag {
                schema: "PrivateDataType",
                tag: container.tag,
            }),
        }
    }
}
