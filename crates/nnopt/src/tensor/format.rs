//! Memory layout conventions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Memory layout selected for a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataFormat {
    #[default]
    Unknown,
    /// Plain row-major layout.
    Ndarray,
    /// Channels blocked by 4 (`N, C/4, H, W, 4`).
    N4cx,
    /// Channels blocked by 8, used for fp16 vector kernels.
    N8cx,
    /// Channels blocked by 16.
    N16cx,
    /// Channels-last padded to 8.
    Nhwc8,
    /// Channels-last padded to 16.
    Nhwc16,
}

impl DataFormat {
    pub const ALL: [DataFormat; 7] = [
        DataFormat::Unknown,
        DataFormat::Ndarray,
        DataFormat::N4cx,
        DataFormat::N8cx,
        DataFormat::N16cx,
        DataFormat::Nhwc8,
        DataFormat::Nhwc16,
    ];

    pub fn tag(self) -> u32 {
        match self {
            DataFormat::Unknown => 0,
            DataFormat::Ndarray => 1,
            DataFormat::N4cx => 2,
            DataFormat::N8cx => 3,
            DataFormat::N16cx => 4,
            DataFormat::Nhwc8 => 5,
            DataFormat::Nhwc16 => 6,
        }
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        DataFormat::ALL.into_iter().find(|format| format.tag() == tag)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataFormat::Unknown => "unknown",
            DataFormat::Ndarray => "ndarray",
            DataFormat::N4cx => "n4cx",
            DataFormat::N8cx => "n8cx",
            DataFormat::N16cx => "n16cx",
            DataFormat::Nhwc8 => "nhwc8",
            DataFormat::Nhwc16 => "nhwc16",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
