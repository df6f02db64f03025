//! Operand records
//!
//! Every operand starts with a tag word:
//!
//! - `1` variable reference: `[1, mode, (source, value)?, variable]`, where the
//!   index pair is present only when `mode != 0`
//! - `2` integer constant: `[2, value]`
//! - `3` string constant: `[3, length, words...]`, the bytes followed by a
//!   closing `"` packed big-endian four per word

use serde::{Deserialize, Serialize};

use crate::error::{BytecodeError, Result};
use crate::variable::Variable;
use crate::{ARRAY_POSITION_COUNT, SCRIPT_DATA_COUNT};

/// Tag of a variable reference
pub const TAG_VARIABLE: i32 = 1;
/// Tag of an integer constant
pub const TAG_INT: i32 = 2;
/// Tag of a string constant
pub const TAG_STRING: i32 = 3;

const MODE_CURRENT: i32 = 0;
const MODE_ARRAY: i32 = 1;
const MODE_ENTITY_PLUS: i32 = 2;
const MODE_ENTITY_MINUS: i32 = 3;

const SOURCE_LITERAL: i32 = 0;
const SOURCE_REGISTER: i32 = 1;

/// Where an array index comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexSource {
    /// Index written into the bytecode
    Literal(i32),
    /// Index read from an array-position register (`arrayPos0..7`, `tempObjectPos`)
    Register(u8),
}

/// Addressing mode of a variable reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Address {
    /// The current entity (or the whole variable for scalars)
    Current,
    /// An absolute index: `name[i]`
    Array(IndexSource),
    /// Relative to the current entity: `name[+i]`
    EntityPlus(IndexSource),
    /// Relative to the current entity: `name[-i]`
    EntityMinus(IndexSource),
}

impl Address {
    fn mode(self) -> i32 {
        match self {
            Self::Current => MODE_CURRENT,
            Self::Array(_) => MODE_ARRAY,
            Self::EntityPlus(_) => MODE_ENTITY_PLUS,
            Self::EntityMinus(_) => MODE_ENTITY_MINUS,
        }
    }

    /// Index source, if the mode carries one
    pub fn index(self) -> Option<IndexSource> {
        match self {
            Self::Current => None,
            Self::Array(source) | Self::EntityPlus(source) | Self::EntityMinus(source) => {
                Some(source)
            }
        }
    }
}

/// A variable with its addressing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableRef {
    /// Referenced variable
    pub variable: Variable,
    /// How the storage slot is selected
    pub address: Address,
}

impl VariableRef {
    /// Reference the current slot of a variable
    pub const fn current(variable: Variable) -> Self {
        Self {
            variable,
            address: Address::Current,
        }
    }
}

/// A decoded operand record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// Variable reference
    Variable(VariableRef),
    /// Integer constant
    Int(i32),
    /// String constant
    Str(String),
}

impl Operand {
    /// Append the encoded record to a code buffer
    pub fn encode(&self, out: &mut Vec<i32>) {
        match self {
            Self::Variable(reference) => {
                out.push(TAG_VARIABLE);
                out.push(reference.address.mode());
                match reference.address.index() {
                    Some(IndexSource::Literal(value)) => {
                        out.push(SOURCE_LITERAL);
                        out.push(value);
                    }
                    Some(IndexSource::Register(register)) => {
                        out.push(SOURCE_REGISTER);
                        out.push(i32::from(register));
                    }
                    None => {}
                }
                out.push(reference.variable.index());
            }
            Self::Int(value) => {
                out.push(TAG_INT);
                out.push(*value);
            }
            Self::Str(text) => encode_string(text, out),
        }
    }

    /// Decode one record starting at `*pos`, advancing past it
    pub fn decode(code: &[i32], pos: &mut usize) -> Result<Self> {
        let offset = *pos;
        match read_word(code, pos)? {
            TAG_VARIABLE => {
                let mode = read_word(code, pos)?;
                let address = if mode == MODE_CURRENT {
                    Address::Current
                } else {
                    let source = match read_word(code, pos)? {
                        SOURCE_LITERAL => IndexSource::Literal(read_word(code, pos)?),
                        _ => {
                            let register = read_word(code, pos)?;
                            match u8::try_from(register) {
                                Ok(index) if usize::from(index) < ARRAY_POSITION_COUNT => {
                                    IndexSource::Register(index)
                                }
                                _ => return Err(BytecodeError::InvalidRegister(register)),
                            }
                        }
                    };
                    match mode {
                        MODE_ARRAY => Address::Array(source),
                        MODE_ENTITY_PLUS => Address::EntityPlus(source),
                        MODE_ENTITY_MINUS => Address::EntityMinus(source),
                        _ => return Err(BytecodeError::InvalidArrayMode { mode, offset }),
                    }
                };
                let id = read_word(code, pos)?;
                let variable = Variable::from_index(id).ok_or(BytecodeError::InvalidVariable(id))?;
                Ok(Self::Variable(VariableRef { variable, address }))
            }
            TAG_INT => Ok(Self::Int(read_word(code, pos)?)),
            TAG_STRING => {
                *pos = offset;
                decode_string(code, pos).map(Self::Str)
            }
            tag => Err(BytecodeError::InvalidOperandTag { tag, offset }),
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Variable(reference) => {
                let index = |source: IndexSource| match source {
                    IndexSource::Literal(value) => value.to_string(),
                    IndexSource::Register(8) => "tempObjectPos".to_string(),
                    IndexSource::Register(register) => format!("arrayPos{register}"),
                };
                match reference.address {
                    Address::Current => write!(f, "{}", reference.variable),
                    Address::Array(source) => {
                        write_indexed(f, reference.variable, "", &index(source))
                    }
                    Address::EntityPlus(source) => {
                        write_indexed(f, reference.variable, "+", &index(source))
                    }
                    Address::EntityMinus(source) => {
                        write_indexed(f, reference.variable, "-", &index(source))
                    }
                }
            }
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(text) => write!(f, "{text:?}"),
        }
    }
}

// `object.xpos` with an index reads as `object[i].xpos`
fn write_indexed(
    f: &mut std::fmt::Formatter<'_>,
    variable: Variable,
    sign: &str,
    index: &str,
) -> std::fmt::Result {
    let name = variable.name();
    match name.split_once('.') {
        Some((head, tail)) => write!(f, "{head}[{sign}{index}].{tail}"),
        None => write!(f, "{name}[{sign}{index}]"),
    }
}

#[inline]
fn read_word(code: &[i32], pos: &mut usize) -> Result<i32> {
    let word = code.get(*pos).copied().ok_or(BytecodeError::UnexpectedEnd)?;
    *pos += 1;
    Ok(word)
}

/// Append a string constant record
pub fn encode_string(text: &str, out: &mut Vec<i32>) {
    out.push(TAG_STRING);
    out.push(text.len() as i32);
    let mut word = 0u32;
    let mut filled = 0;
    for byte in text.bytes().chain(std::iter::once(b'"')) {
        word |= u32::from(byte) << (24 - 8 * filled);
        filled += 1;
        if filled == 4 {
            out.push(word as i32);
            word = 0;
            filled = 0;
        }
    }
    if filled > 0 {
        out.push(word as i32);
    }
}

/// Decode a string constant record starting at its tag
pub fn decode_string(code: &[i32], pos: &mut usize) -> Result<String> {
    let offset = *pos;
    let tag = read_word(code, pos)?;
    if tag != TAG_STRING {
        return Err(BytecodeError::InvalidOperandTag { tag, offset });
    }
    let length = read_word(code, pos)?;
    let len = usize::try_from(length)
        .ok()
        .filter(|len| *len < SCRIPT_DATA_COUNT)
        .ok_or(BytecodeError::InvalidStringLength { length, offset })?;
    let words = len / 4 + 1;
    let packed = code
        .get(*pos..*pos + words)
        .ok_or(BytecodeError::UnexpectedEnd)?;
    let bytes: Vec<u8> = packed
        .iter()
        .flat_map(|word| (*word as u32).to_be_bytes())
        .take(len)
        .collect();
    *pos += words;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
