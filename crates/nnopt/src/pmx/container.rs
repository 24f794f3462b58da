use crate::error::{OptError, OptResult};

/// Container format version written by this build.
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = 4 + 2 + 1 + 4;
const CHECKSUM_LEN: usize = 8;

/// A validated view of one framed container.
///
/// Layout (little-endian): `magic[4] | version u16 | tag u8 | len u32 | payload | checksum[8]`,
/// where the checksum is the first 8 bytes of the BLAKE3 hash of everything before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Container<'a> {
    pub tag: u8,
    pub payload: &'a [u8],
}

impl<'a> Container<'a> {
    pub fn finish(magic: &[u8; 4], version: u16, tag: u8, payload: &[u8]) -> OptResult<Vec<u8>> {
        let len = u32::try_from(payload.len()).map_err(|_| {
            OptError::serialization(format!("payload of {} bytes is too large", payload.len()))
        })?;
        let mut out = Vec::with_capacity(HEADER_LEN + payload.len() + CHECKSUM_LEN);
        out.extend_from_slice(magic);
        out.extend_from_slice(&version.to_le_bytes());
        out.push(tag);
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(payload);
        let checksum = checksum(&out);
        out.extend_from_slice(&checksum);
        Ok(out)
    }

    /// Validates framing, version and checksum. The tag is returned undecoded.
    pub fn open(magic: &[u8; 4], version: u16, bytes: &'a [u8]) -> OptResult<Self> {
        if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
            return Err(OptError::serialization(format!(
                "container of {} bytes is truncated",
                bytes.len()
            )));
        }
        if &bytes[..4] != magic {
            return Err(OptError::serialization(format!(
                "bad container magic {:?}, expected {:?}",
                &bytes[..4],
                magic
            )));
        }
        let found = u16::from_le_bytes([bytes[4], bytes[5]]);
        if found != version {
            return Err(OptError::serialization(format!(
                "container version {found} does not match expected {version}"
            )));
        }
        let tag = bytes[6];
        let len = u32::from_le_bytes([bytes[7], bytes[8], bytes[9], bytes[10]]) as usize;
        if HEADER_LEN + len + CHECKSUM_LEN != bytes.len() {
            return Err(OptError::serialization(format!(
                "container declares {len} payload bytes but holds {}",
                bytes.len() - HEADER_LEN - CHECKSUM_LEN
            )));
        }
        let body_end = HEADER_LEN + len;
        if checksum(&bytes[..body_end]) != bytes[body_end..] {
            return Err(OptError::serialization("container checksum mismatch"));
        }
        Ok(Container {
            tag,
            payload: &bytes[HEADER_LEN..body_end],
        })
    }
}

fn checksum(bytes: &[u8]) -> [u8; CHECKSUM_LEN] {
    let hash = blake3::hash(bytes);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&hash.as_bytes()[..CHECKSUM_LEN]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAGIC: &[u8; 4] = b"TEST";

    fn framed() -> Vec<u8> {
        Container::finish(MAGIC, FORMAT_VERSION, 7, b"payload")
            .unwrap_or_else(|err| panic!("unexpected error: {err}"))
    }

    #[test]
    fn open_returns_tag_and_payload() {
        let bytes = framed();
        let container = Container::open(MAGIC, FORMAT_VERSION, &bytes)
            .unwrap_or_else(|err| panic!("unexpected error: {err}"));
        assert_eq!(container.tag, 7);
        assert_eq!(container.payload, b"payload");
    }

    #[test]
    fn corrupted_payload_fails_checksum() {
        let mut bytes = framed();
        bytes[HEADER_LEN] ^= 0xff;
        let err = Container::open(MAGIC, FORMAT_VERSION, &bytes).expect_err("corrupted");
        assert!(err.to_string().contains("checksum"), "{err}");
    }

    #[test]
    fn truncated_and_foreign_containers_are_rejected() {
        let bytes = framed();
        assert!(Container::open(MAGIC, FORMAT_VERSION, &bytes[..bytes.len() - 1]).is_err());
        assert!(Container::open(b"ELSE", FORMAT_VERSION, &bytes).is_err());
        assert!(Container::open(MAGIC, FORMAT_VERSION + 1, &bytes).is_err());
    }
}
