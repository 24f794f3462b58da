use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, ensure, Context, Result};

use super::{DeserializationContext, SerializationContext};
use crate::driver::CompiledNode;
use crate::ir::{Graph, NodeId};
use crate::registry;

const MAGIC: &[u8; 8] = b"NNOPTKRN";
const VERSION_V1: u32 = 1;
/// Node id and payload length in front of every entry.
const ENTRY_HEADER_LEN: usize = 8;

/// File of serialized optimization kernels for one backend, keyed by node id.
///
/// Layout: `MAGIC | version u32 | backend len u32 | backend | count u32 | entries`, where each
/// entry is `node id u32 | len u32 | kernel container`. Integers are little-endian.
pub struct KernelArchive;

impl KernelArchive {
    pub fn to_bytes(backend: &str, nodes: &[CompiledNode]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        write_u32(&mut out, VERSION_V1);
        write_u32(&mut out, len_u32(backend.len())?);
        out.extend_from_slice(backend.as_bytes());
        write_u32(&mut out, len_u32(nodes.len())?);

        let ctx = SerializationContext::default();
        for compiled in nodes {
            let kernel = &compiled.kernel;
            let node = kernel.node();
            ensure!(
                kernel.backend() == backend,
                "node {} was compiled for backend '{}', archive is for '{}'",
                node.name,
                kernel.backend(),
                backend
            );
            let pmx = kernel
                .as_pmx()
                .ok_or_else(|| anyhow!("kernel for node {} ({}) is not serializable", node.name, node.op_type))?;
            let mut bytes = Vec::new();
            pmx.serialize_data(&ctx, &mut bytes)
                .with_context(|| format!("serialize kernel for node {}", node.name))?;
            write_u32(&mut out, node.id.0);
            write_u32(&mut out, len_u32(bytes.len())?);
            out.extend_from_slice(&bytes);
        }
        Ok(out)
    }

    pub fn save(path: impl AsRef<Path>, backend: &str, nodes: &[CompiledNode]) -> Result<()> {
        let bytes = Self::to_bytes(backend, nodes)?;
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Restores kernels for `graph` without re-running inference. Every entry must name a node
    /// of `graph` whose kernel on `backend` is serializable.
    pub fn from_bytes(bytes: &[u8], graph: &Graph, backend: &str) -> Result<Vec<CompiledNode>> {
        let mut reader = Cursor::new(bytes);
        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            bail!("invalid kernel archive magic header");
        }
        let version = read_u32(&mut reader)?;
        if version != VERSION_V1 {
            bail!("unsupported kernel archive version {}", version);
        }

        let backend_len = read_u32(&mut reader)? as usize;
        let name = read_bytes(&mut reader, backend_len, "backend name")?;
        let stored_backend = String::from_utf8(name)?;
        ensure!(
            stored_backend == backend,
            "kernel archive was written for backend '{}', expected '{}'",
            stored_backend,
            backend
        );

        let count = read_u32(&mut reader)? as usize;
        let room = remaining(&reader) / ENTRY_HEADER_LEN;
        ensure!(
            count <= room,
            "kernel archive declares {} entries but has room for at most {}",
            count,
            room
        );
        let ctx = DeserializationContext::default();
        let mut nodes = Vec::with_capacity(count);
        for _ in 0..count {
            let id = NodeId(read_u32(&mut reader)?);
            let len = read_u32(&mut reader)? as usize;
            let data = read_bytes(&mut reader, len, "kernel entry")?;

            let node = graph
                .node(id)
                .ok_or_else(|| anyhow!("kernel archive references unknown node {}", id))?;
            let mut kernel = registry::create_opt_kernel(backend, Arc::clone(node))
                .ok_or_else(|| anyhow!("no kernel for {} on backend '{}'", node.op_type, backend))?;
            kernel
                .as_pmx_mut()
                .ok_or_else(|| anyhow!("kernel for {} is not serializable", node.op_type))?
                .deserialize_data(&ctx, &data)
                .with_context(|| format!("restore kernel for node {}", node.name))?;
            let kernel_impl = kernel.create_kernel_impl()?;
            nodes.push(CompiledNode {
                kernel,
                kernel_impl,
            });
        }
        ensure!(
            reader.position() as usize == bytes.len(),
            "trailing bytes after kernel archive"
        );
        Ok(nodes)
    }

    pub fn load(path: impl AsRef<Path>, graph: &Graph, backend: &str) -> Result<Vec<CompiledNode>> {
        let path = path.as_ref();
        let mut bytes = Vec::new();
        File::open(path)
            .with_context(|| format!("open kernel archive {}", path.display()))?
            .read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes, graph, backend)
    }
}

fn len_u32(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| anyhow!("length {} does not fit the archive format", len))
}

fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn read_u32(reader: &mut impl Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn remaining(reader: &Cursor<&[u8]>) -> usize {
    let position = usize::try_from(reader.position()).unwrap_or(usize::MAX);
    reader.get_ref().len().saturating_sub(position)
}

/// Reads `len` bytes, refusing lengths beyond the end of the buffer before allocating.
fn read_bytes(reader: &mut Cursor<&[u8]>, len: usize, what: &str) -> Result<Vec<u8>> {
    let left = remaining(reader);
    ensure!(
        len <= left,
        "{} of {} bytes runs past the end of the kernel archive ({} bytes left)",
        what,
        len,
        left
    );
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
