//! Per-file compile driver
//!
//! Walks the statements of a script file through the parse modes: file scope
//! (declarations and event/function headers), bodies, skipped platform
//! blocks and table bodies.

use std::path::Path;

use retro_script_bytecode::{
    Event, FUNCTION_COUNT, OBJECT_COUNT, Opcode, Program, SCRIPT_DATA_COUNT, ScriptDescriptor,
};

use crate::codegen::{CodeGen, EmitContext};
use crate::error::{CompileError, CompileFailure, CompileResult, Diagnostics};
use crate::literal::parse_integer;
use crate::names::NameTables;
use crate::reader::{Statement, StatementReader};
use crate::rewriter::{
    BlockOpen, CaseLabel, parse_case_label, rewrite_assignment, rewrite_condition, rewrite_foreach,
    rewrite_switch,
};
use crate::symbols::{
    Inserted, Symbols, TABLE_ENTRY_COUNT, TableFull, TableSymbol, Visibility,
};

/// Compiler options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Tags that keep a `#platform:` block; a block is compiled when one of
    /// them occurs in its header line
    pub platform_tags: Vec<String>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            platform_tags: vec![
                "Standard".to_string(),
                "HW_Rendering".to_string(),
                "USE_DECOMP".to_string(),
            ],
        }
    }
}

/// What kind of body is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Event,
    Function,
}

/// A table being read
#[derive(Debug, Clone)]
struct PendingTable {
    name: String,
    visibility: Visibility,
    values: Vec<i32>,
    overflowed: bool,
}

#[derive(Debug, Clone)]
enum ParseMode {
    FileScope,
    Body(BodyKind),
    PlatformSkip(BodyKind),
    Table(PendingTable),
}

/// Script compiler
///
/// One compiler builds one program from any number of script files. Public
/// symbols and functions persist across files; private symbols reset per
/// file.
#[derive(Debug, Clone)]
pub struct Compiler {
    options: CompilerOptions,
    names: NameTables,
    symbols: Symbols,
    codegen: CodeGen,
    diagnostics: Diagnostics,
    file: String,
}

impl Compiler {
    /// Create a compiler
    pub fn new(names: NameTables, options: CompilerOptions) -> Self {
        Self {
            options,
            names,
            symbols: Symbols::new(),
            codegen: CodeGen::new(),
            diagnostics: Diagnostics::new(),
            file: String::new(),
        }
    }

    /// Program built so far
    pub fn program(&self) -> &Program {
        self.codegen.program()
    }

    /// Diagnostics of the pass
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Whether any error was recorded
    pub fn failed(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Symbol tables
    pub fn symbols(&self) -> &Symbols {
        &self.symbols
    }

    /// External name tables
    pub fn names(&self) -> &NameTables {
        &self.names
    }

    /// Number of blocks still open
    pub fn jump_stack_depth(&self) -> usize {
        self.codegen.stack_depth()
    }

    /// Full reset: code, descriptors, public symbols and diagnostics
    pub fn reset(&mut self) {
        self.codegen.reset();
        self.symbols.reset();
        self.diagnostics.clear();
        self.file.clear();
    }

    /// Finish the pass
    pub fn finish(self) -> Result<Program, CompileFailure> {
        if self.diagnostics.has_errors() {
            return Err(CompileFailure {
                diagnostics: self.diagnostics.into_vec(),
            });
        }
        Ok(self.codegen.into_program())
    }

    /// Read and compile a script file for an object type
    pub fn compile_file(&mut self, path: &Path, object_type: usize) -> CompileResult<()> {
        let source = std::fs::read(path)?;
        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.compile_source(&file, &source, object_type);
        Ok(())
    }

    /// Compile script source for an object type
    ///
    /// Problems are recorded as diagnostics; check [`Compiler::failed`].
    pub fn compile_source(&mut self, file: &str, source: &[u8], object_type: usize) {
        tracing::debug!(file, object_type, "compiling script");
        self.file = file.to_string();
        self.symbols.begin_file();
        self.codegen.clear_stack();

        if object_type >= OBJECT_COUNT {
            self.diagnostics.error(
                file,
                0,
                CompileError::capacity("object types", OBJECT_COUNT),
            );
            return;
        }

        let mut reader = StatementReader::new(source);
        let mut mode = ParseMode::FileScope;
        let mut last_line = 0;
        while let Some(statement) = reader.next_statement() {
            last_line = statement.line;
            mode = match mode {
                ParseMode::FileScope => self.file_scope(&statement, object_type),
                ParseMode::Body(kind) => self.body_statement(&statement, kind, &reader),
                ParseMode::PlatformSkip(kind) => {
                    if statement.text.starts_with("#endplatform") {
                        ParseMode::Body(kind)
                    } else {
                        ParseMode::PlatformSkip(kind)
                    }
                }
                ParseMode::Table(table) => self.table_statement(&statement, table),
            };
        }

        match mode {
            ParseMode::FileScope => {}
            ParseMode::Body(_) | ParseMode::PlatformSkip(_) => {
                self.diagnostics.error(
                    file,
                    last_line,
                    CompileError::syntax("event or function not closed before end of file"),
                );
                self.codegen.clear_stack();
            }
            ParseMode::Table(table) => {
                self.diagnostics.error(
                    file,
                    last_line,
                    CompileError::syntax(format!("table {} not closed by endtable", table.name)),
                );
            }
        }
    }

    fn error(&mut self, line: u32, error: CompileError) {
        self.diagnostics.error(&self.file, line, error);
    }

    fn warning(&mut self, line: u32, message: impl Into<String>) {
        self.diagnostics.warning(&self.file, line, message);
    }

    // ==================== File scope ====================

    fn file_scope(&mut self, statement: &Statement, object_type: usize) -> ParseMode {
        let text = statement.text.as_str();
        let line = statement.line;

        if let Some((visibility, rest)) = declaration(text, "publicalias", "privatealias") {
            self.declare_alias(line, visibility, rest);
        }
        if let Some((visibility, rest)) = declaration(text, "publicvalue", "privatevalue") {
            self.declare_static(line, visibility, rest);
        }
        if let Some((visibility, name)) = declaration(text, "publictable", "privatetable") {
            return ParseMode::Table(PendingTable {
                name: name.to_string(),
                visibility,
                values: Vec::new(),
                overflowed: false,
            });
        }

        for event in [Event::Main, Event::Draw, Event::Startup] {
            if text.eq_ignore_ascii_case(event.keyword()) {
                let descriptor = self.codegen.begin_body();
                *self.codegen.program_mut().objects[object_type].event_mut(event) = descriptor;
                tracing::debug!(file = %self.file, line, ?event, "event body");
                return ParseMode::Body(BodyKind::Event);
            }
        }

        if let Some(name) = text.strip_prefix("reservefunction") {
            self.reserve_function(line, name);
        } else if let Some(name) = text.strip_prefix("function") {
            if self.define_function(line, name) {
                return ParseMode::Body(BodyKind::Function);
            }
        }
        ParseMode::FileScope
    }

    fn declare_alias(&mut self, line: u32, visibility: Visibility, rest: &str) {
        let Some((value, name)) = rest.split_once(':') else {
            self.warning(line, format!("malformed alias \"{rest}\", expected value:name"));
            return;
        };
        let result = self
            .symbols
            .aliases
            .scope_mut(visibility)
            .insert(name, value.to_string());
        self.report_insert(line, result, "alias", name);
    }

    fn declare_static(&mut self, line: u32, visibility: Visibility, rest: &str) {
        let (name, value_text) = match rest.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (rest, None),
        };
        let value = match value_text {
            Some(text) => self.integer_value(text).unwrap_or_else(|| {
                self.warning(
                    line,
                    format!("unable to convert static value \"{text}\" to an int"),
                );
                0
            }),
            None => 0,
        };

        let table = self.symbols.statics.scope_mut(visibility);
        if table.len() >= table.capacity() {
            let capacity = table.capacity();
            self.error(line, CompileError::capacity("static values", capacity));
            return;
        }
        let data_pos = match self.codegen.push_word(value) {
            Ok(pos) => pos as i32,
            Err(error) => {
                self.error(line, error);
                return;
            }
        };
        let result = self
            .symbols
            .statics
            .scope_mut(visibility)
            .insert(name, data_pos);
        self.report_insert(line, result, "static value", name);
    }

    fn report_insert(
        &mut self,
        line: u32,
        result: Result<Inserted, TableFull>,
        what: &'static str,
        name: &str,
    ) {
        match result {
            Ok(Inserted::New) => {}
            Ok(Inserted::Replaced) => {
                self.warning(line, format!("{what} {name} has already been used"));
            }
            Err(full) => self.error(line, CompileError::capacity(what, full.capacity)),
        }
    }

    /// Integer literal, or an alias that resolves to one
    fn integer_value(&self, text: &str) -> Option<i32> {
        parse_integer(text).or_else(|| {
            self.symbols
                .expand_alias(text)
                .and_then(parse_integer)
        })
    }

    fn reserve_function(&mut self, line: u32, name: &str) {
        if self.symbols.functions.id(name).is_some() {
            self.warning(line, format!("function {name} has already been reserved"));
        } else if self.symbols.functions.len() >= FUNCTION_COUNT {
            self.error(line, CompileError::capacity("functions", FUNCTION_COUNT));
        } else {
            self.symbols.functions.push(name);
            self.codegen
                .program_mut()
                .functions
                .push(ScriptDescriptor::UNSET);
        }
    }

    /// Start a function body; `false` if it could not be declared
    fn define_function(&mut self, line: u32, name: &str) -> bool {
        let id = match self.symbols.functions.id(name) {
            Some(id) => {
                let defined = self
                    .codegen
                    .program()
                    .functions
                    .get(id)
                    .is_some_and(ScriptDescriptor::is_set);
                if defined {
                    self.warning(line, format!("function {name} is defined more than once"));
                }
                id
            }
            None if self.symbols.functions.len() >= FUNCTION_COUNT => {
                self.error(line, CompileError::capacity("functions", FUNCTION_COUNT));
                return false;
            }
            None => {
                self.codegen
                    .program_mut()
                    .functions
                    .push(ScriptDescriptor::UNSET);
                self.symbols.functions.push(name)
            }
        };
        let descriptor = self.codegen.begin_body();
        self.codegen.program_mut().functions[id] = descriptor;
        tracing::debug!(file = %self.file, line, function = name, "function body");
        true
    }

    // ==================== Tables ====================

    fn table_statement(&mut self, statement: &Statement, mut table: PendingTable) -> ParseMode {
        let line = statement.line;
        if statement.text.eq_ignore_ascii_case("endtable") {
            self.finish_table(line, table);
            return ParseMode::FileScope;
        }

        for item in statement.text.split(',').filter(|item| !item.is_empty()) {
            let value = self.integer_value(item).unwrap_or_else(|| {
                self.warning(
                    line,
                    format!(
                        "unable to convert table value {} \"{item}\" to an int",
                        table.values.len()
                    ),
                );
                0
            });
            if table.values.len() >= TABLE_ENTRY_COUNT {
                if !table.overflowed {
                    self.error(line, CompileError::capacity("table values", TABLE_ENTRY_COUNT));
                    table.overflowed = true;
                }
                continue;
            }
            table.values.push(value);
        }
        ParseMode::Table(table)
    }

    fn finish_table(&mut self, line: u32, table: PendingTable) {
        let words = table.values.len() + 1;
        if self.program().code.len() + words > SCRIPT_DATA_COUNT {
            self.error(line, CompileError::capacity("script data words", SCRIPT_DATA_COUNT));
            return;
        }
        let data_pos = self.program().code.len() as i32;
        let code = &mut self.codegen.program_mut().code;
        code.push(table.values.len() as i32);
        code.extend_from_slice(&table.values);

        let symbol = TableSymbol {
            data_pos,
            len: table.values.len(),
        };
        let result = self
            .symbols
            .tables
            .scope_mut(table.visibility)
            .insert(&table.name, symbol);
        self.report_insert(line, result, "table", &table.name);
    }

    // ==================== Bodies ====================

    fn body_statement(
        &mut self,
        statement: &Statement,
        kind: BodyKind,
        reader: &StatementReader<'_>,
    ) -> ParseMode {
        let text = statement.text.as_str();
        let line = statement.line;

        let closer = match kind {
            BodyKind::Event => ("endevent", Opcode::End),
            BodyKind::Function => ("endfunction", Opcode::Return),
        };
        if text.eq_ignore_ascii_case(closer.0) {
            self.end_body(line, closer.1);
            return ParseMode::FileScope;
        }

        if text.starts_with("#endplatform") {
            return ParseMode::Body(kind);
        }
        if text.starts_with("#platform:") {
            let enabled = self
                .options
                .platform_tags
                .iter()
                .any(|tag| text.contains(tag.as_str()));
            return if enabled {
                ParseMode::Body(kind)
            } else {
                ParseMode::PlatformSkip(kind)
            };
        }

        self.compile_statement(statement, reader);
        ParseMode::Body(kind)
    }

    fn end_body(&mut self, line: u32, terminator: Opcode) {
        match self.codegen.end_body(terminator) {
            Ok(None) => {}
            Ok(Some(open)) => self.error(line, CompileError::UnclosedBlock(open.keyword())),
            Err(error) => self.error(line, error),
        }
    }

    fn open(&mut self, line: u32, open: BlockOpen) -> String {
        if let Err(error) = self.codegen.open_block(open.kind) {
            self.error(line, error);
        }
        open.text
    }

    /// Rewrite and emit one body statement
    fn compile_statement(&mut self, statement: &Statement, reader: &StatementReader<'_>) {
        let line = statement.line;
        let mut text = statement.text.clone();

        let jump_index = self.codegen.jump_index();
        if let Some(open) = rewrite_condition(&text, jump_index) {
            text = self.open(line, open);
        }
        let jump_index = self.codegen.jump_index();
        if let Some(open) = rewrite_foreach(&text, jump_index) {
            text = self.open(line, open);
        }
        let jump_index = self.codegen.jump_index();
        if let Some(open) = rewrite_switch(&text, jump_index) {
            text = self.open(line, open);
            self.scan_switch(line, reader.clone());
        }
        if let Some(call) = rewrite_assignment(&text) {
            text = call;
        }

        let mut cx = EmitContext {
            symbols: &self.symbols,
            names: &self.names,
            diagnostics: &mut self.diagnostics,
            file: &self.file,
            line,
        };
        match parse_case_label(&text) {
            Some(label) => self.codegen.emit_case(&label, &mut cx),
            None => self.codegen.emit_call(&text, &mut cx),
        }
    }

    /// Look ahead over a switch body to size its case table
    ///
    /// Nested switches are skipped; their cases belong to their own table.
    fn scan_switch(&mut self, line: u32, mut reader: StatementReader<'_>) {
        let mut depth = 0usize;
        let mut terminated = false;
        let mut cx = EmitContext {
            symbols: &self.symbols,
            names: &self.names,
            diagnostics: &mut self.diagnostics,
            file: &self.file,
            line,
        };
        for statement in reader.by_ref() {
            let text = statement.text.as_str();
            if text.starts_with("switch") {
                depth += 1;
            }
            if depth > 0 {
                if text.starts_with("endswitch") {
                    depth -= 1;
                }
            } else if text.starts_with("endswitch") {
                terminated = true;
                break;
            } else if let Some(CaseLabel::Case(value)) = parse_case_label(text) {
                if let Some(value) = cx.case_value(&value, false) {
                    self.codegen.note_case_value(value);
                }
            }
        }

        if !terminated {
            self.error(line, CompileError::UnterminatedSwitch);
            return;
        }
        if let Err(error) = self.codegen.reserve_case_slots() {
            self.error(line, error);
        }
    }
}

/// Split a `public<kw>`/`private<kw>` declaration into visibility and the rest
fn declaration<'t>(text: &'t str, public: &str, private: &str) -> Option<(Visibility, &'t str)> {
    if let Some(rest) = text.strip_prefix(public) {
        Some((Visibility::Public, rest))
    } else {
        text.strip_prefix(private)
            .map(|rest| (Visibility::Private, rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(source: &str) -> Compiler {
        let mut compiler = Compiler::new(NameTables::default(), CompilerOptions::default());
        compiler.compile_source("Test.txt", source.as_bytes(), 1);
        compiler
    }

    #[test]
    fn test_declaration_prefixes() {
        assert_eq!(
            declaration("publicalias1:ON", "publicalias", "privatealias"),
            Some((Visibility::Public, "1:ON"))
        );
        assert_eq!(
            declaration("privatetableSpeeds", "publictable", "privatetable"),
            Some((Visibility::Private, "Speeds"))
        );
        assert_eq!(declaration("Equal(a,b)", "publicalias", "privatealias"), None);
    }

    #[test]
    fn test_event_descriptor_installed() {
        let compiler = compile("privatevalue x = 3\nevent ObjectMain\nInc(x)\nendevent\n");
        assert!(!compiler.failed(), "{:?}", compiler.diagnostics());
        let main = compiler.program().objects[1].main;
        assert_eq!(main, ScriptDescriptor::new(1, 0));
        assert_eq!(compiler.program().code[0], 3);
        assert_eq!(compiler.program().objects[1].draw, ScriptDescriptor::UNSET);
    }

    #[test]
    fn test_malformed_alias_warns() {
        let compiler = compile("publicalias 5\n");
        assert!(!compiler.failed());
        assert_eq!(compiler.diagnostics().len(), 1);
    }

    #[test]
    fn test_duplicate_static_warns_and_last_wins() {
        let compiler = compile("publicvalue Speed = 1\npublicvalue Speed = 2\n");
        assert!(!compiler.failed());
        assert_eq!(compiler.symbols().statics.get("speed"), Some(&1));
        assert_eq!(compiler.diagnostics().len(), 1);
    }

    #[test]
    fn test_static_value_through_alias() {
        let compiler = compile("privatealias 0x20:BASE\nprivatevalue Top = BASE\n");
        assert_eq!(compiler.program().code, vec![0x20]);
        let compiler = compile("privatevalue Top = Nope\n");
        assert_eq!(compiler.program().code, vec![0]);
        assert_eq!(compiler.diagnostics().len(), 1);
    }

    #[test]
    fn test_unclosed_body_is_error() {
        let compiler = compile("event ObjectMain\nInc(temp0)\n");
        assert!(compiler.failed());
    }

    #[test]
    fn test_case_outside_switch() {
        let compiler = compile("event ObjectMain\ncase 1:\nendevent\n");
        assert!(compiler.failed());
    }

    #[test]
    fn test_bad_object_type() {
        let mut compiler = Compiler::new(NameTables::default(), CompilerOptions::default());
        compiler.compile_source("Test.txt", b"", OBJECT_COUNT);
        assert!(compiler.failed());
    }
}
