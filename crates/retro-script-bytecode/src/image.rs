//! Persisted bytecode image
//!
//! Layout (little endian):
//!
//! 1. `u32` code word count, then the words in blocks
//! 2. `u32` jump-table entry count, then the entries in blocks
//! 3. `u16` object script count, the code pointers of every script (main,
//!    draw, startup), then the jump pointers in the same order
//! 4. `u16` function count, every function code pointer, then every jump pointer
//!
//! A block starts with a byte whose low 7 bits hold the entry count. With the
//! high bit set the entries are 4-byte words, otherwise single bytes.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{BytecodeError, Result};
use crate::program::{ObjectScript, ScriptDescriptor};

const WIDE_BLOCK: u8 = 0x80;
const MAX_BLOCK_LEN: usize = 0x7F;

/// Compiled code, jump table and descriptors in their persisted form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BytecodeImage {
    /// Code and data words
    pub code: Vec<i32>,
    /// Jump-table entries
    pub jump_table: Vec<i32>,
    /// Object event descriptors, one per type in the loaded range
    pub objects: Vec<ObjectScript>,
    /// Function descriptors
    pub functions: Vec<ScriptDescriptor>,
}

impl BytecodeImage {
    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        write_blocks(&mut bytes, &self.code);
        write_blocks(&mut bytes, &self.jump_table);

        let script_count = table_len("object script", self.objects.len())?;
        bytes.extend_from_slice(&script_count.to_le_bytes());
        for script in &self.objects {
            for descriptor in [script.main, script.draw, script.startup] {
                bytes.extend_from_slice(&descriptor.code_ptr.to_le_bytes());
            }
        }
        for script in &self.objects {
            for descriptor in [script.main, script.draw, script.startup] {
                bytes.extend_from_slice(&descriptor.jump_ptr.to_le_bytes());
            }
        }

        let function_count = table_len("function", self.functions.len())?;
        bytes.extend_from_slice(&function_count.to_le_bytes());
        for function in &self.functions {
            bytes.extend_from_slice(&function.code_ptr.to_le_bytes());
        }
        for function in &self.functions {
            bytes.extend_from_slice(&function.jump_ptr.to_le_bytes());
        }
        Ok(bytes)
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader { bytes, pos: 0 };
        let code = read_blocks(&mut reader)?;
        let jump_table = read_blocks(&mut reader)?;

        let script_count = usize::from(reader.u16()?);
        let mut code_ptrs = Vec::with_capacity(script_count * 3);
        for _ in 0..script_count * 3 {
            code_ptrs.push(reader.i32()?);
        }
        let mut objects = Vec::with_capacity(script_count);
        for chunk in code_ptrs.chunks_exact(3) {
            let main = ScriptDescriptor::new(chunk[0], reader.i32()?);
            let draw = ScriptDescriptor::new(chunk[1], reader.i32()?);
            let startup = ScriptDescriptor::new(chunk[2], reader.i32()?);
            objects.push(ObjectScript {
                main,
                draw,
                startup,
            });
        }

        let function_count = usize::from(reader.u16()?);
        let mut function_ptrs = Vec::with_capacity(function_count);
        for _ in 0..function_count {
            function_ptrs.push(reader.i32()?);
        }
        let mut functions = Vec::with_capacity(function_count);
        for code_ptr in function_ptrs {
            functions.push(ScriptDescriptor::new(code_ptr, reader.i32()?));
        }

        Ok(Self {
            code,
            jump_table,
            objects,
            functions,
        })
    }

    /// Write image to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let bytes = self.to_bytes()?;
        writer.write_all(&bytes)?;
        Ok(())
    }

    /// Read image from a reader
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    /// Serialize to pretty JSON for inspection
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn table_len(what: &'static str, len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| BytecodeError::capacity(what, len, usize::from(u16::MAX)))
}

#[inline]
fn fits_byte(value: i32) -> bool {
    (0..=0xFF).contains(&value)
}

fn write_blocks(out: &mut Vec<u8>, values: &[i32]) {
    out.extend_from_slice(&(values.len() as u32).to_le_bytes());
    let mut start = 0;
    while start < values.len() {
        let wide = !fits_byte(values[start]);
        let len = values[start..]
            .iter()
            .take(MAX_BLOCK_LEN)
            .take_while(|value| fits_byte(**value) != wide)
            .count();
        if wide {
            out.push(WIDE_BLOCK | len as u8);
            for value in &values[start..start + len] {
                out.extend_from_slice(&value.to_le_bytes());
            }
        } else {
            out.push(len as u8);
            out.extend(values[start..start + len].iter().map(|value| *value as u8));
        }
        start += len;
    }
}

fn read_blocks(reader: &mut ByteReader<'_>) -> Result<Vec<i32>> {
    let count = reader.u32()? as usize;
    let mut values = Vec::with_capacity(count.min(crate::SCRIPT_DATA_COUNT));
    while values.len() < count {
        let offset = reader.pos;
        let header = reader.u8()?;
        let len = usize::from(header & !WIDE_BLOCK);
        if len == 0 || values.len() + len > count {
            return Err(BytecodeError::InvalidBlock { offset });
        }
        for _ in 0..len {
            let value = if header & WIDE_BLOCK != 0 {
                reader.i32()?
            } else {
                i32::from(reader.u8()?)
            };
            values.push(value);
        }
    }
    Ok(values)
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl ByteReader<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let chunk = self
            .bytes
            .get(self.pos..self.pos + N)
            .ok_or(BytecodeError::UnexpectedEnd)?;
        self.pos += N;
        let mut out = [0u8; N];
        out.copy_from_slice(chunk);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take::<1>()?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_grouping() {
        let mut out = Vec::new();
        write_blocks(&mut out, &[1, 2, 300, -1, 4]);
        assert_eq!(
            out,
            vec![
                5, 0, 0, 0, // count
                2, 1, 2, // byte block
                0x82, 44, 1, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, // word block
                1, 4, // byte block
            ]
        );
    }

    #[test]
    fn test_long_runs_split_at_127() {
        let values = vec![7; 200];
        let mut out = Vec::new();
        write_blocks(&mut out, &values);
        assert_eq!(out[4], 127);
        assert_eq!(out[4 + 1 + 127], 73);

        let mut reader = ByteReader {
            bytes: &out,
            pos: 0,
        };
        assert_eq!(read_blocks(&mut reader).unwrap(), values);
    }

    #[test]
    fn test_zero_length_block_is_rejected() {
        let bytes = [1, 0, 0, 0, 0];
        let mut reader = ByteReader {
            bytes: &bytes,
            pos: 0,
        };
        assert!(matches!(
            read_blocks(&mut reader),
            Err(BytecodeError::InvalidBlock { offset: 4 })
        ));
    }
}
