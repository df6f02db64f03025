//! Decoded instructions and disassembly

use serde::{Deserialize, Serialize};

use crate::error::{BytecodeError, Result};
use crate::opcode::Opcode;
use crate::operand::Operand;

/// One opcode with its operand records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Opcode
    pub opcode: Opcode,
    /// Operand records, exactly `opcode.arity()` of them
    pub operands: Vec<Operand>,
}

impl Instruction {
    /// Create an instruction
    pub fn new(opcode: Opcode, operands: Vec<Operand>) -> Self {
        Self { opcode, operands }
    }

    /// Decode the instruction at `*pos`, advancing past it
    pub fn decode(code: &[i32], pos: &mut usize) -> Result<Self> {
        let opcode = decode_opcode(code, pos)?;
        let mut operands = Vec::with_capacity(opcode.arity());
        decode_operands(opcode, code, pos, &mut operands)?;
        Ok(Self { opcode, operands })
    }

    /// Append the encoded instruction to a code buffer
    pub fn encode(&self, out: &mut Vec<i32>) {
        out.push(self.opcode.index());
        for operand in &self.operands {
            operand.encode(out);
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.opcode)?;
        if self.operands.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, operand) in self.operands.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{operand}")?;
        }
        f.write_str(")")
    }
}

/// Decode the opcode word at `*pos`
pub fn decode_opcode(code: &[i32], pos: &mut usize) -> Result<Opcode> {
    let word = code.get(*pos).copied().ok_or(BytecodeError::UnexpectedEnd)?;
    *pos += 1;
    Opcode::from_index(word).ok_or(BytecodeError::InvalidOpcode(word))
}

/// Decode the operand records of `opcode` into a reusable buffer
pub fn decode_operands(
    opcode: Opcode,
    code: &[i32],
    pos: &mut usize,
    out: &mut Vec<Operand>,
) -> Result<()> {
    out.clear();
    for _ in 0..opcode.arity() {
        out.push(Operand::decode(code, pos)?);
    }
    Ok(())
}

/// Disassemble a script body starting at `start`
///
/// Stops after `End`, or after a `return` outside any structured block.
pub fn disassemble(code: &[i32], start: usize) -> Result<Vec<(usize, Instruction)>> {
    let mut listing = Vec::new();
    let mut pos = start;
    let mut depth = 0usize;
    loop {
        let offset = pos;
        let instruction = Instruction::decode(code, &mut pos)?;
        let opcode = instruction.opcode;
        listing.push((offset, instruction));
        match opcode {
            Opcode::End => break,
            Opcode::Return if depth == 0 => break,
            Opcode::IfEqual
            | Opcode::IfGreater
            | Opcode::IfGreaterOrEqual
            | Opcode::IfLower
            | Opcode::IfLowerOrEqual
            | Opcode::IfNotEqual
            | Opcode::WEqual
            | Opcode::WGreater
            | Opcode::WGreaterOrEqual
            | Opcode::WLower
            | Opcode::WLowerOrEqual
            | Opcode::WNotEqual
            | Opcode::ForEachActive
            | Opcode::ForEachAll
            | Opcode::Switch => depth += 1,
            Opcode::EndIf | Opcode::Loop | Opcode::Next | Opcode::EndSwitch => {
                depth = depth.saturating_sub(1);
            }
            _ => {}
        }
    }
    Ok(listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::VariableRef;
    use crate::variable::Variable;

    #[test]
    fn test_display() {
        let instruction = Instruction::new(
            Opcode::Equal,
            vec![
                Operand::Variable(VariableRef::current(Variable::ObjectState)),
                Operand::Int(1),
            ],
        );
        assert_eq!(instruction.to_string(), "Equal(object.state, 1)");
        assert_eq!(Instruction::new(Opcode::EndIf, vec![]).to_string(), "endif");
    }

    #[test]
    fn test_disassemble_stops_at_outer_return() {
        let mut code = Vec::new();
        Instruction::new(
            Opcode::IfEqual,
            vec![Operand::Int(0), Operand::Int(1), Operand::Int(1)],
        )
        .encode(&mut code);
        Instruction::new(Opcode::Return, vec![]).encode(&mut code);
        Instruction::new(Opcode::EndIf, vec![]).encode(&mut code);
        Instruction::new(Opcode::Return, vec![]).encode(&mut code);
        code.push(12345);

        let listing = disassemble(&code, 0).unwrap();
        let opcodes: Vec<_> = listing.iter().map(|(_, i)| i.opcode).collect();
        assert_eq!(
            opcodes,
            vec![Opcode::IfEqual, Opcode::Return, Opcode::EndIf, Opcode::Return]
        );
    }

    #[test]
    fn test_invalid_opcode() {
        let mut pos = 0;
        assert!(matches!(
            Instruction::decode(&[-3], &mut pos),
            Err(BytecodeError::InvalidOpcode(-3))
        ));
    }
}
