//! Multi-mesh data packs
//!
//! Several tile payloads share one blob file. The file begins with a
//! fixed-size table of `i32` offsets, one entry per packed mesh, each
//! pointing at the absolute start of that mesh's serialized payload within
//! the same file; readers seek by table slot without parsing earlier
//! payloads. The entry count is carried out of band (the quadtree knows how
//! many meshes exist), keeping the table entries fixed-width.

use std::io::Write;

use terramesh_core::TileMeshData;

use crate::error::{IoError, Result};
use crate::mesh_format::{read_tile_mesh, write_i32, write_tile_mesh};

/// Collects tile payloads and writes the offset table plus payload blob
#[derive(Default)]
pub struct DataPackWriter {
    payloads: Vec<Vec<u8>>,
}

impl DataPackWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize a tile into the pack; returns its table slot
    pub fn add_tile(&mut self, tile: &TileMeshData) -> Result<usize> {
        let mut payload = Vec::new();
        write_tile_mesh(&mut payload, tile)?;
        self.payloads.push(payload);
        Ok(self.payloads.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Write the offset table followed by every payload
    pub fn finalize<W: Write>(self, writer: &mut W) -> Result<()> {
        let table_size = 4 * self.payloads.len();
        let mut offset = table_size as i64;
        for payload in &self.payloads {
            if offset > i32::MAX as i64 {
                return Err(IoError::InvalidRecord {
                    message: format!("data pack exceeds offset range at {}", offset),
                });
            }
            write_i32(writer, offset as i32)?;
            offset += payload.len() as i64;
        }
        for payload in &self.payloads {
            writer.write_all(payload)?;
        }
        Ok(())
    }
}

/// Random access over a data pack blob. The mesh count comes from the
/// caller; the table itself is just fixed-width entries.
pub struct DataPackReader<'a> {
    bytes: &'a [u8],
    offsets: Vec<u32>,
}

impl<'a> DataPackReader<'a> {
    pub fn new(bytes: &'a [u8], mesh_count: usize) -> Result<Self> {
        let table_size = 4 * mesh_count;
        if bytes.len() < table_size {
            return Err(IoError::InvalidRecord {
                message: format!(
                    "pack of {} bytes cannot hold a {}-entry offset table",
                    bytes.len(),
                    mesh_count
                ),
            });
        }
        let mut offsets = Vec::with_capacity(mesh_count);
        for index in 0..mesh_count {
            let raw = i32::from_le_bytes(bytes[index * 4..index * 4 + 4].try_into().unwrap());
            if raw < table_size as i32 || raw as usize > bytes.len() {
                return Err(IoError::BadOffset {
                    index,
                    offset: raw.max(0) as u32,
                });
            }
            offsets.push(raw as u32);
        }
        Ok(Self { bytes, offsets })
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// The raw payload bytes of one table slot
    pub fn payload(&self, index: usize) -> Result<&'a [u8]> {
        let start = *self
            .offsets
            .get(index)
            .ok_or_else(|| IoError::InvalidRecord {
                message: format!("slot {} out of {} entries", index, self.offsets.len()),
            })? as usize;
        let end = self
            .offsets
            .get(index + 1)
            .map(|&next| next as usize)
            .unwrap_or(self.bytes.len());
        if end < start {
            return Err(IoError::BadOffset {
                index,
                offset: start as u32,
            });
        }
        Ok(&self.bytes[start..end])
    }

    /// Deserialize the tile stored in one table slot
    pub fn read_tile(&self, index: usize) -> Result<TileMeshData> {
        let mut payload = self.payload(index)?;
        read_tile_mesh(&mut payload)
    }
}
