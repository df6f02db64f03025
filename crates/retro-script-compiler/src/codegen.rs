//! Bytecode generation from canonical calls
//!
//! [`CodeGen`] owns the program being built and the per-body state: the
//! code and jump-table offsets of the event or function being compiled and
//! the stack of open blocks. Jump-table entries are reserved when a block
//! opens and patched when its closing keyword is emitted.

use retro_script_bytecode::{
    Address, IndexSource, JUMP_TABLE_COUNT, Opcode, Operand, Program, SCRIPT_DATA_COUNT,
    ScriptDescriptor, TEMP_OBJECT_POSITION, Variable, VariableRef,
};

use crate::error::{CompileError, CompileResult, Diagnostics};
use crate::literal::parse_integer;
use crate::names::{NameLookup, NameTables};
use crate::rewriter::{BlockKind, CaseLabel, split_indexed};
use crate::symbols::Symbols;

/// Maximum nesting of open blocks
pub const JUMP_STACK_COUNT: usize = 0x400;

/// Initial lower bound of a switch before any case is seen
pub const SWITCH_MIN_UNSET: i32 = 0x10000;

/// Initial upper bound of a switch before any case is seen
pub const SWITCH_MAX_UNSET: i32 = -0x10000;

/// An open block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpEntry {
    /// Kind of the block
    pub kind: BlockKind,
    /// Absolute index of the block's first jump-table slot
    pub slot: usize,
    /// Case slots following a switch header
    pub case_count: usize,
}

/// State of the event or function being compiled
#[derive(Debug, Clone, Default)]
pub struct BodyContext {
    /// Code position of the first opcode
    pub code_offset: usize,
    /// Jump-table position of the first entry
    pub jump_offset: usize,
    /// Open blocks, innermost last
    pub stack: Vec<JumpEntry>,
}

/// Everything operand resolution reads, plus where diagnostics go
pub struct EmitContext<'a> {
    /// Symbol tables
    pub symbols: &'a Symbols,
    /// External name tables
    pub names: &'a NameTables,
    /// Diagnostic sink
    pub diagnostics: &'a mut Diagnostics,
    /// File being compiled
    pub file: &'a str,
    /// Line of the statement being compiled
    pub line: u32,
}

impl EmitContext<'_> {
    /// Record an error at the current statement
    pub fn error(&mut self, error: CompileError) {
        self.diagnostics.error(self.file, self.line, error);
    }

    /// Record a warning at the current statement
    pub fn warning(&mut self, message: impl Into<String>) {
        self.diagnostics.warning(self.file, self.line, message);
    }

    /// Resolve a `Name[key]` lookup, 0 with a warning when unknown
    fn lookup(&mut self, kind: NameLookup, key: &str) -> i32 {
        match self.names.lookup(kind, key) {
            Some(index) => index,
            None => {
                self.warning(format!("Unknown {} \"{key}\"", kind.label()));
                0
            }
        }
    }

    /// Resolve a case label value
    ///
    /// Warnings are reported only when `report` is set, so the look-ahead
    /// over a switch body does not repeat them.
    pub fn case_value(&mut self, text: &str, report: bool) -> Option<i32> {
        let resolved = if text.contains('[') {
            let (name, key) = split_indexed(text);
            match NameLookup::from_keyword(&name) {
                Some(kind) if report => self.lookup(kind, &key).to_string(),
                Some(kind) => self.names.lookup(kind, &key).unwrap_or(0).to_string(),
                None => name,
            }
        } else {
            let alias = self
                .symbols
                .aliases
                .private
                .get(text)
                .or_else(|| self.symbols.aliases.public.get(text));
            alias.cloned().unwrap_or_else(|| text.to_string())
        };

        let value = parse_integer(&resolved);
        if value.is_none() && report {
            self.warning(format!("unable to read case string \"{resolved}\" as an int"));
        }
        value
    }
}

/// A call argument split into its name and bracketed index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RawOperand {
    name: String,
    index: String,
}

/// Split the arguments of `Name(a,b[c],"d")`
///
/// Commas and parentheses inside string literals do not split. Bracketed
/// text goes to the index; quotes are kept on string literals.
fn split_arguments(args: &str, count: usize) -> Vec<RawOperand> {
    let mut chars = args.chars().peekable();
    let mut operands = Vec::with_capacity(count);
    for _ in 0..count {
        // skip the '(' or ',' before the argument
        chars.next();
        let mut operand = RawOperand::default();
        let mut in_index = false;
        let mut in_string = false;
        while let Some(&c) = chars.peek() {
            if !in_string && (c == ',' || c == ')') {
                break;
            }
            match c {
                '"' => {
                    in_string = !in_string;
                    if in_index {
                        operand.index.push(c);
                    } else {
                        operand.name.push(c);
                    }
                }
                '[' if !in_string && !in_index => in_index = true,
                ']' if !in_string && in_index => in_index = false,
                _ if in_index => operand.index.push(c),
                _ => operand.name.push(c),
            }
            chars.next();
        }
        operands.push(operand);
    }
    operands
}

/// Array-position register of an index name
fn index_register(name: &str) -> Option<u8> {
    if name.eq_ignore_ascii_case("tempObjectPos") {
        return Some(TEMP_OBJECT_POSITION);
    }
    let digit = name
        .get(..8)
        .filter(|prefix| prefix.eq_ignore_ascii_case("arrayPos"))
        .and_then(|_| name.get(8..))?;
    match digit.as_bytes() {
        [d @ b'0'..=b'7'] => Some(d - b'0'),
        _ => None,
    }
}

/// Generates bytecode into a [`Program`]
#[derive(Debug, Clone, Default)]
pub struct CodeGen {
    program: Program,
    body: BodyContext,
}

impl CodeGen {
    /// Create an empty code generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Program built so far
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Mutable program, for installing descriptors
    pub fn program_mut(&mut self) -> &mut Program {
        &mut self.program
    }

    /// Take the program
    pub fn into_program(self) -> Program {
        self.program
    }

    /// Drop all generated code and body state
    pub fn reset(&mut self) {
        self.program.clear();
        self.body = BodyContext::default();
    }

    /// Number of open blocks
    pub fn stack_depth(&self) -> usize {
        self.body.stack.len()
    }

    /// Forget open blocks
    pub fn clear_stack(&mut self) {
        self.body.stack.clear();
    }

    /// Code position relative to the current body
    pub fn code_pos(&self) -> i32 {
        (self.program.code.len() - self.body.code_offset) as i32
    }

    /// Jump-table index the next block will use
    pub fn jump_index(&self) -> i32 {
        (self.program.jump_table.len() - self.body.jump_offset) as i32
    }

    /// Start an event or function body at the current positions
    pub fn begin_body(&mut self) -> ScriptDescriptor {
        self.body.code_offset = self.program.code.len();
        self.body.jump_offset = self.program.jump_table.len();
        ScriptDescriptor::new(
            self.body.code_offset as i32,
            self.body.jump_offset as i32,
        )
    }

    /// Finish a body with `End` or `Return`
    ///
    /// Returns the innermost block that was still open; the block stack is
    /// cleared either way.
    pub fn end_body(&mut self, terminator: Opcode) -> CompileResult<Option<BlockKind>> {
        let unclosed = self.body.stack.last().map(|entry| entry.kind);
        self.body.stack.clear();
        self.push_word(terminator.index())?;
        Ok(unclosed)
    }

    /// Append one word to the code segment
    pub fn push_word(&mut self, word: i32) -> CompileResult<usize> {
        if self.program.code.len() >= SCRIPT_DATA_COUNT {
            return Err(CompileError::capacity("script data words", SCRIPT_DATA_COUNT));
        }
        self.program.code.push(word);
        Ok(self.program.code.len() - 1)
    }

    fn push_jump_slot(&mut self, value: i32) -> CompileResult<()> {
        if self.program.jump_table.len() >= JUMP_TABLE_COUNT {
            return Err(CompileError::capacity("jump table entries", JUMP_TABLE_COUNT));
        }
        self.program.jump_table.push(value);
        Ok(())
    }

    /// Open a block, reserving its jump-table header
    pub fn open_block(&mut self, kind: BlockKind) -> CompileResult<()> {
        if self.body.stack.len() >= JUMP_STACK_COUNT {
            return Err(CompileError::capacity("nested blocks", JUMP_STACK_COUNT));
        }
        let slot = self.program.jump_table.len();
        let pos = self.code_pos();
        let header: &[i32] = match kind {
            BlockKind::If => &[-1, 0],
            BlockKind::While | BlockKind::ForEach => &[pos, 0],
            BlockKind::Switch => &[SWITCH_MIN_UNSET, SWITCH_MAX_UNSET, -1, 0],
        };
        for value in header {
            self.push_jump_slot(*value)?;
        }
        self.body.stack.push(JumpEntry {
            kind,
            slot,
            case_count: 0,
        });
        Ok(())
    }

    /// Widen the innermost switch's bounds to include a case value
    pub fn note_case_value(&mut self, value: i32) {
        let Some(entry) = self.body.stack.last() else {
            return;
        };
        if entry.kind != BlockKind::Switch {
            return;
        }
        let slot = entry.slot;
        let table = &mut self.program.jump_table;
        table[slot] = table[slot].min(value);
        table[slot + 1] = table[slot + 1].max(value);
    }

    /// Reserve one slot per value between the innermost switch's bounds
    pub fn reserve_case_slots(&mut self) -> CompileResult<()> {
        let Some(entry) = self.body.stack.last().copied() else {
            return Ok(());
        };
        let (min, max) = (
            self.program.jump_table[entry.slot],
            self.program.jump_table[entry.slot + 1],
        );
        let count = if max < min {
            0
        } else {
            (i64::from(max) - i64::from(min) + 1) as usize
        };
        if self.program.jump_table.len() + count > JUMP_TABLE_COUNT {
            return Err(CompileError::capacity("jump table entries", JUMP_TABLE_COUNT));
        }
        self.program
            .jump_table
            .resize(self.program.jump_table.len() + count, -1);
        if let Some(top) = self.body.stack.last_mut() {
            top.case_count = count;
        }
        Ok(())
    }

    fn fill_unset_cases(&mut self, entry: JumpEntry, target: i32) {
        let start = entry.slot + 4;
        for slot in &mut self.program.jump_table[start..start + entry.case_count] {
            if *slot < 0 {
                *slot = target;
            }
        }
    }

    /// Record a `case`/`default` label of the innermost switch
    pub fn emit_case(&mut self, label: &CaseLabel, cx: &mut EmitContext<'_>) {
        let entry = match self.body.stack.last().copied() {
            Some(entry) if entry.kind == BlockKind::Switch => entry,
            _ => {
                let keyword = match label {
                    CaseLabel::Default => "default",
                    CaseLabel::Case(_) => "case",
                };
                cx.error(CompileError::CaseOutsideSwitch(keyword.to_string()));
                return;
            }
        };
        let pos = self.code_pos();
        match label {
            CaseLabel::Default => {
                self.program.jump_table[entry.slot + 2] = pos;
                self.fill_unset_cases(entry, pos);
            }
            CaseLabel::Case(text) => {
                let Some(value) = cx.case_value(text, true) else {
                    return;
                };
                let min = self.program.jump_table[entry.slot];
                let index = i64::from(value) - i64::from(min);
                match usize::try_from(index) {
                    Ok(index) if index < entry.case_count => {
                        self.program.jump_table[entry.slot + 4 + index] = pos;
                    }
                    _ => cx.warning(format!("case {value} is outside of the switch range")),
                }
            }
        }
    }

    /// Patch and pop the innermost block for a closing opcode
    ///
    /// Runs after the closing opcode word has been written.
    fn close_block(&mut self, opcode: Opcode, cx: &mut EmitContext<'_>) {
        let expected = match opcode {
            Opcode::Else | Opcode::EndIf => BlockKind::If,
            Opcode::Loop => BlockKind::While,
            Opcode::Next => BlockKind::ForEach,
            Opcode::EndSwitch => BlockKind::Switch,
            Opcode::Break => {
                if !self.body.stack.iter().any(|e| e.kind == BlockKind::Switch) {
                    cx.warning("break outside of a switch");
                }
                return;
            }
            _ => return,
        };
        let entry = match self.body.stack.last().copied() {
            None => {
                cx.error(CompileError::UnmatchedClose(opcode.name().to_string()));
                return;
            }
            Some(entry) if entry.kind != expected => {
                cx.error(CompileError::MismatchedClose {
                    close: opcode.name().to_string(),
                    open: entry.kind.keyword(),
                });
                return;
            }
            Some(entry) => entry,
        };

        let pos = self.code_pos();
        let table = &mut self.program.jump_table;
        match opcode {
            Opcode::Else => {
                table[entry.slot] = pos;
                return;
            }
            Opcode::EndIf => {
                table[entry.slot + 1] = pos;
                if table[entry.slot] == -1 {
                    table[entry.slot] = pos - 1;
                }
            }
            Opcode::EndSwitch => {
                table[entry.slot + 3] = pos;
                if table[entry.slot + 2] == -1 {
                    table[entry.slot + 2] = pos - 1;
                    self.fill_unset_cases(entry, pos - 1);
                }
            }
            _ => table[entry.slot + 1] = pos,
        }
        self.body.stack.pop();
    }

    /// Emit a canonical `Name(args)` call
    pub fn emit_call(&mut self, text: &str, cx: &mut EmitContext<'_>) {
        let name_end = text.find('(').unwrap_or(text.len());
        let name = &text[..name_end];
        let opcode = match Opcode::from_name(name) {
            Some(opcode) if opcode != Opcode::End => opcode,
            _ => {
                cx.error(CompileError::OpcodeNotFound(name.to_string()));
                return;
            }
        };

        if let Err(error) = self.push_word(opcode.index()) {
            cx.error(error);
            return;
        }
        self.close_block(opcode, cx);

        let mut encoded = Vec::new();
        for raw in split_arguments(&text[name_end..], opcode.arity()) {
            Self::resolve_operand(raw, cx).encode(&mut encoded);
        }
        if self.program.code.len() + encoded.len() > SCRIPT_DATA_COUNT {
            cx.error(CompileError::capacity("script data words", SCRIPT_DATA_COUNT));
            return;
        }
        self.program.code.extend_from_slice(&encoded);
    }

    fn resolve_operand(raw: RawOperand, cx: &mut EmitContext<'_>) -> Operand {
        let RawOperand {
            mut name,
            mut index,
        } = raw;
        let symbols = cx.symbols;

        // aliases: private, then public on the substituted name
        for table in [&symbols.aliases.private, &symbols.aliases.public] {
            if let Some(value) = table.get(&name) {
                let (value_name, value_index) = split_indexed(value);
                name = value_name;
                if value.contains('[') {
                    index = value_index;
                }
            }
        }

        if !index.is_empty() {
            let (prefix, key) = match index.as_bytes()[0] {
                b'+' | b'-' => index.split_at(1),
                _ => ("", index.as_str()),
            };
            // a public alias overrides a private one with the same name
            let alias = symbols
                .aliases
                .public
                .get(key)
                .or_else(|| symbols.aliases.private.get(key));
            if let Some(value) = alias {
                index = format!("{prefix}{}", split_indexed(value).0);
            }
        }

        if let Some(data_pos) = symbols.statics.get(&name) {
            name = "local".to_string();
            index = data_pos.to_string();
        }
        if let Some(table) = symbols.tables.get(&name) {
            name = table.data_pos.to_string();
            index.clear();
        }
        if let Some(global) = cx.names.global_variable(&name) {
            name = "global".to_string();
            index = global.to_string();
        }
        if let Some(id) = symbols.functions.id(&name) {
            name = id.to_string();
        }
        if let Some(kind) = NameLookup::from_keyword(&name) {
            name = cx.lookup(kind, &index).to_string();
        }

        if let Some(value) = parse_integer(&name) {
            return Operand::Int(value);
        }
        if let Some(body) = name.strip_prefix('"') {
            let text = body.strip_suffix('"').unwrap_or(body);
            return Operand::Str(text.to_string());
        }

        let address = if index.is_empty() {
            Address::Current
        } else {
            let (wrap, key): (fn(IndexSource) -> Address, &str) = match index.as_bytes()[0] {
                b'+' => (Address::EntityPlus, &index[1..]),
                b'-' => (Address::EntityMinus, &index[1..]),
                _ => (Address::Array, index.as_str()),
            };
            let source = match parse_integer(key) {
                Some(value) => IndexSource::Literal(value),
                None => match index_register(key) {
                    Some(register) => IndexSource::Register(register),
                    None => {
                        cx.error(CompileError::UnknownArrayIndex(key.to_string()));
                        IndexSource::Register(0)
                    }
                },
            };
            wrap(source)
        };

        let variable = Variable::from_name(&name).unwrap_or_else(|| {
            cx.error(CompileError::OperandNotFound(name.clone()));
            Variable::Temp0
        });
        Operand::Variable(VariableRef { variable, address })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::Visibility;

    fn emit(codegen: &mut CodeGen, symbols: &Symbols, names: &NameTables, text: &str) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        let mut cx = EmitContext {
            symbols,
            names,
            diagnostics: &mut diagnostics,
            file: "Test.txt",
            line: 1,
        };
        codegen.emit_call(text, &mut cx);
        diagnostics
    }

    #[test]
    fn test_split_arguments() {
        let args = split_arguments("(object[+1].xpos,\"a,b)\",5)", 3);
        assert_eq!(args[0].name, "object.xpos");
        assert_eq!(args[0].index, "+1");
        assert_eq!(args[1].name, "\"a,b)\"");
        assert_eq!(args[2].name, "5");
    }

    #[test]
    fn test_index_registers() {
        assert_eq!(index_register("arrayPos0"), Some(0));
        assert_eq!(index_register("ARRAYPOS7"), Some(7));
        assert_eq!(index_register("tempObjectPos"), Some(TEMP_OBJECT_POSITION));
        assert_eq!(index_register("arrayPos8"), None);
        assert_eq!(index_register("temp0"), None);
    }

    #[test]
    fn test_emit_equal() {
        let mut codegen = CodeGen::new();
        let diagnostics = emit(
            &mut codegen,
            &Symbols::new(),
            &NameTables::default(),
            "Equal(object.state,1)",
        );
        assert!(diagnostics.is_empty());
        let mut expected = vec![Opcode::Equal.index()];
        Operand::Variable(VariableRef::current(Variable::ObjectState)).encode(&mut expected);
        Operand::Int(1).encode(&mut expected);
        assert_eq!(codegen.program().code, expected);
    }

    #[test]
    fn test_non_ascii_string_keeps_its_bytes() {
        let mut codegen = CodeGen::new();
        let diagnostics = emit(
            &mut codegen,
            &Symbols::new(),
            &NameTables::default(),
            "Print(\"Café, ñ\",0,1)",
        );
        assert!(diagnostics.is_empty());
        let mut pos = 0;
        let instruction =
            retro_script_bytecode::Instruction::decode(&codegen.program().code, &mut pos).unwrap();
        assert_eq!(instruction.operands[0], Operand::Str("Café, ñ".to_string()));
    }

    #[test]
    fn test_public_alias_wins_inside_brackets() {
        let mut symbols = Symbols::new();
        symbols.aliases.private.insert("Slot", "3".into()).unwrap();
        symbols.aliases.public.insert("Slot", "5".into()).unwrap();
        let mut codegen = CodeGen::new();
        let diagnostics = emit(
            &mut codegen,
            &symbols,
            &NameTables::default(),
            "Equal(global[Slot],1)",
        );
        assert!(diagnostics.is_empty());
        let mut expected = vec![Opcode::Equal.index()];
        Operand::Variable(VariableRef {
            variable: Variable::Global,
            address: Address::Array(IndexSource::Literal(5)),
        })
        .encode(&mut expected);
        Operand::Int(1).encode(&mut expected);
        assert_eq!(codegen.program().code, expected);
    }

    #[test]
    fn test_aliases_statics_and_registers() {
        let mut symbols = Symbols::new();
        symbols
            .aliases
            .scope_mut(Visibility::Private)
            .insert("Speed", "object.value1".into())
            .unwrap();
        symbols.statics.public.insert("Counter", 42).unwrap();
        let mut codegen = CodeGen::new();
        let diagnostics = emit(
            &mut codegen,
            &symbols,
            &NameTables::default(),
            "Add(Speed,object[arrayPos2].xvel)",
        );
        assert!(diagnostics.is_empty());
        let mut expected = vec![Opcode::Add.index()];
        Operand::Variable(VariableRef::current(Variable::ObjectValue1)).encode(&mut expected);
        Operand::Variable(VariableRef {
            variable: Variable::ObjectXVel,
            address: Address::Array(IndexSource::Register(2)),
        })
        .encode(&mut expected);
        assert_eq!(codegen.program().code, expected);

        codegen.reset();
        emit(&mut codegen, &symbols, &NameTables::default(), "Inc(Counter)");
        let mut expected = vec![Opcode::Inc.index()];
        Operand::Variable(VariableRef {
            variable: Variable::Local,
            address: Address::Array(IndexSource::Literal(42)),
        })
        .encode(&mut expected);
        assert_eq!(codegen.program().code, expected);
    }

    #[test]
    fn test_unknown_operand_uses_placeholder() {
        let mut codegen = CodeGen::new();
        let diagnostics = emit(
            &mut codegen,
            &Symbols::new(),
            &NameTables::default(),
            "Inc(object.nothing)",
        );
        assert!(diagnostics.has_errors());
        assert_eq!(codegen.program().code.len(), 4);
    }

    #[test]
    fn test_unknown_opcode_emits_nothing() {
        let mut codegen = CodeGen::new();
        let diagnostics = emit(
            &mut codegen,
            &Symbols::new(),
            &NameTables::default(),
            "Teleport(temp0)",
        );
        assert_eq!(
            diagnostics.errors().next().unwrap().message,
            "OPCODE NOT FOUND: Teleport"
        );
        assert!(codegen.program().code.is_empty());
    }

    #[test]
    fn test_if_patches_on_endif() {
        let mut codegen = CodeGen::new();
        let symbols = Symbols::new();
        let names = NameTables::default();
        codegen.begin_body();
        codegen.open_block(BlockKind::If).unwrap();
        emit(&mut codegen, &symbols, &names, "IfEqual(0,temp0,1)");
        emit(&mut codegen, &symbols, &names, "endif");
        assert_eq!(codegen.stack_depth(), 0);
        let end = codegen.code_pos();
        assert_eq!(codegen.program().jump_table, vec![end - 1, end]);
    }

    #[test]
    fn test_unmatched_close() {
        let mut codegen = CodeGen::new();
        let diagnostics = emit(&mut codegen, &Symbols::new(), &NameTables::default(), "endif");
        assert!(diagnostics.has_errors());

        codegen.open_block(BlockKind::While).unwrap();
        let diagnostics = emit(&mut codegen, &Symbols::new(), &NameTables::default(), "next");
        assert!(diagnostics.has_errors());
        assert_eq!(codegen.stack_depth(), 1);
    }

    #[test]
    fn test_lookup_names() {
        let names = NameTables {
            types: vec!["Blank Object".into(), "Ring".into()],
            global_variables: vec!["player.lives".into()],
            ..NameTables::default()
        };
        let mut codegen = CodeGen::new();
        let diagnostics = emit(
            &mut codegen,
            &Symbols::new(),
            &names,
            "Equal(player.lives,TypeName[Ring])",
        );
        assert!(diagnostics.is_empty());
        let mut expected = vec![Opcode::Equal.index()];
        Operand::Variable(VariableRef {
            variable: Variable::Global,
            address: Address::Array(IndexSource::Literal(0)),
        })
        .encode(&mut expected);
        Operand::Int(1).encode(&mut expected);
        assert_eq!(codegen.program().code, expected);
    }
}
