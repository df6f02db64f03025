//! Statement reader
//!
//! Splits script text into statements. Outside string literals whitespace is
//! dropped, `//` starts a comment running to the end of the line, and a
//! newline, `;`, `{` or `}` ends the statement. Inside a string spaces are
//! kept, tabs, carriage returns and `;` are dropped, and only a newline ends
//! the statement.

/// One logical statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Normalized statement text
    pub text: String,
    /// 1-based line the statement starts on
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    String,
    Comment,
}

/// Reads statements from script source
#[derive(Debug, Clone)]
pub struct StatementReader<'a> {
    source: &'a [u8],
    pos: usize,
    line: u32,
}

impl<'a> StatementReader<'a> {
    /// Create a reader over script source
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
        }
    }

    /// Read the next non-empty statement; `None` at end of input
    ///
    /// A statement cut off by the end of input is still returned.
    pub fn next_statement(&mut self) -> Option<Statement> {
        loop {
            if self.pos >= self.source.len() {
                return None;
            }
            let statement = self.read_raw();
            if !statement.text.is_empty() {
                return Some(statement);
            }
        }
    }

    fn read_raw(&mut self) -> Statement {
        let line = self.line;
        let mut text: Vec<u8> = Vec::new();
        let mut mode = Mode::Normal;
        let mut prev = 0u8;

        while let Some(&c) = self.source.get(self.pos) {
            self.pos += 1;
            if c == b'\n' {
                self.line += 1;
                break;
            }
            match mode {
                Mode::Normal => match c {
                    b' ' | b'\t' | b'\r' => {}
                    b';' | b'{' | b'}' => break,
                    b'"' => {
                        text.push(c);
                        mode = Mode::String;
                    }
                    b'/' if prev == b'/' && !text.is_empty() => {
                        text.pop();
                        mode = Mode::Comment;
                    }
                    _ => text.push(c),
                },
                Mode::String => match c {
                    b'\t' | b'\r' | b';' => {}
                    b'"' => {
                        text.push(c);
                        mode = Mode::Normal;
                    }
                    _ => text.push(c),
                },
                Mode::Comment => {}
            }
            prev = c;
        }

        Statement {
            text: String::from_utf8_lossy(&text).into_owned(),
            line,
        }
    }
}

impl Iterator for StatementReader<'_> {
    type Item = Statement;

    fn next(&mut self) -> Option<Statement> {
        self.next_statement()
    }
}
