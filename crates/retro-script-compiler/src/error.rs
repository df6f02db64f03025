//! Compilation errors and diagnostics

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Compilation errors
#[derive(Debug, Error)]
pub enum CompileError {
    /// Call to a name that is not an opcode
    #[error("OPCODE NOT FOUND: {0}")]
    OpcodeNotFound(String),

    /// Operand that resolves to nothing
    #[error("OPERAND NOT FOUND: {0}")]
    OperandNotFound(String),

    /// Array index that is neither a literal nor an array-position register
    #[error("Unknown array index: {0}")]
    UnknownArrayIndex(String),

    /// A fixed-size table is full
    #[error("Too many {what} (max {capacity})")]
    CapacityExceeded {
        /// What ran out
        what: &'static str,
        /// Capacity of the table
        capacity: usize,
    },

    /// A closing keyword with no open block
    #[error("'{0}' without a matching open block")]
    UnmatchedClose(String),

    /// A closing keyword that does not fit the innermost open block
    #[error("'{close}' cannot close an open {open} block")]
    MismatchedClose {
        /// The closing keyword
        close: String,
        /// Kind of the innermost open block
        open: &'static str,
    },

    /// Blocks still open at the end of an event or function
    #[error("{0} block not closed before end of script")]
    UnclosedBlock(&'static str),

    /// `case`/`default` outside a switch
    #[error("'{0}' outside of a switch")]
    CaseOutsideSwitch(String),

    /// `switch` with no matching `endswitch`
    #[error("switch without endswitch")]
    UnterminatedSwitch,

    /// Malformed declaration
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// IO error while reading a script
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    /// Create a syntax error
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax(message.into())
    }

    /// Create a capacity error
    pub fn capacity(what: &'static str, capacity: usize) -> Self {
        Self::CapacityExceeded { what, capacity }
    }
}

/// Result type for compilation
pub type CompileResult<T> = Result<T, CompileError>;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Logged; the program is still usable
    Warning,
    /// The compile pass has failed
    Error,
}

/// One compile-time message with its source position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Script file name
    pub file: String,
    /// 1-based source line
    pub line: u32,
    /// Message text
    pub message: String,
}

impl Diagnostic {
    /// Whether this diagnostic fails the compile pass
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}:{}: {}: {}", self.file, self.line, severity, self.message)
    }
}

/// Diagnostics collected over a compile pass
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    failed: bool,
}

impl Diagnostics {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error; the pass is marked as failed
    pub fn error(&mut self, file: &str, line: u32, error: CompileError) {
        tracing::debug!(file, line, %error, "script error");
        self.failed = true;
        self.items.push(Diagnostic {
            severity: Severity::Error,
            file: file.to_string(),
            line,
            message: error.to_string(),
        });
    }

    /// Record a warning
    pub fn warning(&mut self, file: &str, line: u32, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(file, line, "{message}");
        self.items.push(Diagnostic {
            severity: Severity::Warning,
            file: file.to_string(),
            line,
            message,
        });
    }

    /// Whether any error was recorded
    pub fn has_errors(&self) -> bool {
        self.failed
    }

    /// All diagnostics in the order they were recorded
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Errors only
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.is_error())
    }

    /// Number of diagnostics
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Forget everything and clear the failure flag
    pub fn clear(&mut self) {
        self.items.clear();
        self.failed = false;
    }

    /// Take the collected diagnostics
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

/// A failed compile pass
#[derive(Debug, Clone)]
pub struct CompileFailure {
    /// Everything recorded during the pass, warnings included
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileFailure {
    /// The first error, the one a player-facing error screen shows
    pub fn first_error(&self) -> Option<&Diagnostic> {
        self.diagnostics.iter().find(|d| d.is_error())
    }
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.diagnostics.iter().filter(|d| d.is_error()).count();
        write!(f, "script compilation failed with {count} error(s)")?;
        if let Some(first) = self.first_error() {
            write!(f, "; first: {first}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_do_not_fail() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warning("Test.txt", 3, "Alias X has already been used");
        assert!(!diagnostics.has_errors());
        diagnostics.error("Test.txt", 7, CompileError::OpcodeNotFound("Foo".into()));
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.errors().count(), 1);
        assert_eq!(
            diagnostics.errors().next().unwrap().to_string(),
            "Test.txt:7: error: OPCODE NOT FOUND: Foo"
        );
    }

    #[test]
    fn test_failure_display_names_first_error() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warning("A.txt", 1, "w");
        diagnostics.error("A.txt", 2, CompileError::UnterminatedSwitch);
        let failure = CompileFailure {
            diagnostics: diagnostics.into_vec(),
        };
        assert_eq!(
            failure.to_string(),
            "script compilation failed with 1 error(s); first: A.txt:2: error: switch without endswitch"
        );
    }
}
