//! Shorthand syntax rewriting
//!
//! Statements such as `if(a==b)`, `foreach(group,arrayPos0,ALL_ENTITIES)`,
//! `switch(x)` and `a+=b` are rewritten into canonical `Function(args)` calls
//! before code generation. The rewrites are pure text transforms; reserving
//! jump-table slots for the opened block is left to the caller.

use retro_script_bytecode::Opcode;

/// Assignment operators in scan order, with the opcode each one becomes
pub const ASSIGNMENT_TOKENS: [(&str, Opcode); 13] = [
    ("=", Opcode::Equal),
    ("+=", Opcode::Add),
    ("-=", Opcode::Sub),
    ("++", Opcode::Inc),
    ("--", Opcode::Dec),
    ("*=", Opcode::Mul),
    ("/=", Opcode::Div),
    (">>=", Opcode::ShR),
    ("<<=", Opcode::ShL),
    ("&=", Opcode::And),
    ("|=", Opcode::Or),
    ("^=", Opcode::Xor),
    ("%=", Opcode::Mod),
];

/// Comparison operators in scan order, with their `if` and `while` opcodes
pub const COMPARISON_TOKENS: [(&str, Opcode, Opcode); 6] = [
    ("==", Opcode::IfEqual, Opcode::WEqual),
    (">", Opcode::IfGreater, Opcode::WGreater),
    (">=", Opcode::IfGreaterOrEqual, Opcode::WGreaterOrEqual),
    ("<", Opcode::IfLower, Opcode::WLower),
    ("<=", Opcode::IfLowerOrEqual, Opcode::WLowerOrEqual),
    ("!=", Opcode::IfNotEqual, Opcode::WNotEqual),
];

/// Kind of a structured block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// `if` ... `else` ... `endif`
    If,
    /// `while` ... `loop`
    While,
    /// `foreach` ... `next`
    ForEach,
    /// `switch` ... `endswitch`
    Switch,
}

impl BlockKind {
    /// Keyword that opens the block
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::While => "while",
            Self::ForEach => "foreach",
            Self::Switch => "switch",
        }
    }

    /// Jump-table slots reserved when the block opens, case slots excluded
    pub const fn slot_count(self) -> usize {
        match self {
            Self::Switch => 4,
            _ => 2,
        }
    }
}

/// A rewritten statement that opens a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOpen {
    /// Canonical call text
    pub text: String,
    /// Opened block
    pub kind: BlockKind,
}

/// Byte offset of the first occurrence of `token` outside double quotes
pub fn find_token(text: &str, token: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let needle = token.as_bytes();
    if needle.is_empty() || needle.len() > bytes.len() {
        return None;
    }
    let mut quoted = false;
    for start in 0..=bytes.len() - needle.len() {
        if bytes[start] == b'"' {
            quoted = !quoted;
            continue;
        }
        if !quoted && bytes[start..].starts_with(needle) {
            return Some(start);
        }
    }
    None
}

/// Pick the operator of `tokens` that is last in table order among those
/// occurring in the text, returning its table index and position
fn last_token_match<'t, I>(text: &str, tokens: I) -> Option<(usize, usize)>
where
    I: IntoIterator<Item = &'t str>,
{
    tokens
        .into_iter()
        .enumerate()
        .filter_map(|(index, token)| find_token(text, token).map(|pos| (index, pos)))
        .last()
}

/// Copy `text[start..]`, dropping `skip` characters outside quotes
fn copy_without(text: &str, start: usize, skip: &[char]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut quoted = false;
    for c in text.get(start..).unwrap_or_default().chars() {
        if c == '"' {
            quoted = !quoted;
        }
        if quoted || !skip.contains(&c) {
            out.push(c);
        }
    }
    out
}

/// Rewrite `if(a<op>b)` and `while(a<op>b)` into `IfXxx`/`WXxx` calls
///
/// The comparison operator is replaced by the argument separator; `=` and
/// parentheses are dropped from the condition.
pub fn rewrite_condition(text: &str, jump_index: i32) -> Option<BlockOpen> {
    let (kind, start) = if text.starts_with("if") {
        (BlockKind::If, 2)
    } else if text.starts_with("while") {
        (BlockKind::While, 5)
    } else {
        return None;
    };
    let (index, pos) = last_token_match(text, COMPARISON_TOKENS.iter().map(|(t, _, _)| *t))?;
    let (_, if_opcode, while_opcode) = COMPARISON_TOKENS[index];
    let opcode = match kind {
        BlockKind::If => if_opcode,
        _ => while_opcode,
    };

    let mut condition = String::with_capacity(text.len());
    condition.push_str(&text[..pos]);
    condition.push(',');
    condition.push_str(&text[pos + 1..]);
    let args = copy_without(&condition, start, &['=', '(', ')']);
    Some(BlockOpen {
        text: format!("{}({jump_index},{args})", opcode.name()),
        kind,
    })
}

/// Rewrite `foreach(group,cursor,ACTIVE_ENTITIES|ALL_ENTITIES)`
pub fn rewrite_foreach(text: &str, jump_index: i32) -> Option<BlockOpen> {
    if !text.starts_with("foreach") {
        return None;
    }
    let opcode = if find_token(text, "ACTIVE_ENTITIES").is_some_and(|pos| pos > 0) {
        Opcode::ForEachActive
    } else if find_token(text, "ALL_ENTITIES").is_some_and(|pos| pos > 0) {
        Opcode::ForEachAll
    } else {
        return None;
    };

    let mut args = String::with_capacity(text.len());
    let mut separators = 0;
    for c in text[7..].chars() {
        match c {
            '(' | ')' => {}
            ',' => {
                separators += 1;
                if separators == 2 {
                    break;
                }
                args.push(c);
            }
            _ => args.push(c),
        }
    }
    Some(BlockOpen {
        text: format!("{}({jump_index},{args})", opcode.name()),
        kind: BlockKind::ForEach,
    })
}

/// Rewrite `switch(expr)` into `switch(jumpIndex,expr)`
pub fn rewrite_switch(text: &str, jump_index: i32) -> Option<BlockOpen> {
    if !text.starts_with("switch") {
        return None;
    }
    let args = copy_without(text, 6, &['=', '(', ')']);
    Some(BlockOpen {
        text: format!("{}({jump_index},{args})", Opcode::Switch.name()),
        kind: BlockKind::Switch,
    })
}

/// Rewrite assignment shorthand (`a=b`, `a+=b`, `a++`, ...)
///
/// Every operator is located by its first occurrence outside string
/// literals; when several occur, the one latest in [`ASSIGNMENT_TOKENS`]
/// order wins.
pub fn rewrite_assignment(text: &str) -> Option<String> {
    let (index, pos) = last_token_match(text, ASSIGNMENT_TOKENS.iter().map(|(t, _)| *t))?;
    let (token, opcode) = ASSIGNMENT_TOKENS[index];
    let lhs = &text[..pos];
    Some(if opcode.arity() > 1 {
        let rhs = &text[pos + token.len()..];
        format!("{}({lhs},{rhs})", opcode.name())
    } else {
        format!("{}({lhs})", opcode.name())
    })
}

/// A `case` or `default` label
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseLabel {
    /// `default:`
    Default,
    /// `case <value>:` with the colons removed
    Case(String),
}

/// Recognize a switch label
pub fn parse_case_label(text: &str) -> Option<CaseLabel> {
    if let Some(value) = text.strip_prefix("case") {
        Some(CaseLabel::Case(value.chars().filter(|c| *c != ':').collect()))
    } else if text.starts_with("default") {
        Some(CaseLabel::Default)
    } else {
        None
    }
}

/// Split `Name[key]` into its name and bracketed key
///
/// Text after the closing bracket is appended to the name, matching how
/// operands are tokenized.
pub fn split_indexed(text: &str) -> (String, String) {
    let mut name = String::new();
    let mut key = String::new();
    let mut in_key = false;
    for c in text.chars() {
        match c {
            '[' if !in_key => in_key = true,
            ']' if in_key => in_key = false,
            _ if in_key => key.push(c),
            _ => name.push(c),
        }
    }
    (name, key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_if_rewrite() {
        let open = rewrite_condition("if(object.state==0)", 0).unwrap();
        assert_eq!(open.text, "IfEqual(0,object.state,0)");
        assert_eq!(open.kind, BlockKind::If);

        let open = rewrite_condition("if(temp0>=arrayPos1)", 4).unwrap();
        assert_eq!(open.text, "IfGreaterOrEqual(4,temp0,arrayPos1)");

        let open = rewrite_condition("if(temp0!=1)", 2).unwrap();
        assert_eq!(open.text, "IfNotEqual(2,temp0,1)");

        assert_eq!(rewrite_condition("if(temp0)", 0), None);
        assert_eq!(rewrite_condition("IfEqual(0,a,b)", 0), None);
    }

    #[test]
    fn test_while_rewrite() {
        let open = rewrite_condition("while(temp0<10)", 6).unwrap();
        assert_eq!(open.text, "WLower(6,temp0,10)");
        assert_eq!(open.kind, BlockKind::While);

        let open = rewrite_condition("while(temp0<=object[+1].xpos)", 0).unwrap();
        assert_eq!(open.text, "WLowerOrEqual(0,temp0,object[+1].xpos)");
    }

    #[test]
    fn test_foreach_rewrite() {
        let open = rewrite_foreach("foreach(TypeName[Ring],arrayPos0,ALL_ENTITIES)", 2).unwrap();
        assert_eq!(open.text, "ForEachAll(2,TypeName[Ring],arrayPos0)");
        let open = rewrite_foreach("foreach(GROUP_ALL,arrayPos1,ACTIVE_ENTITIES)", 0).unwrap();
        assert_eq!(open.text, "ForEachActive(0,GROUP_ALL,arrayPos1)");
        assert_eq!(rewrite_foreach("foreach(a,b)", 0), None);
    }

    #[test]
    fn test_switch_rewrite() {
        let open = rewrite_switch("switch(object.state)", 8).unwrap();
        assert_eq!(open.text, "switch(8,object.state)");
        assert_eq!(rewrite_switch("endswitch", 0), None);
    }

    #[test]
    fn test_assignment_rewrite() {
        assert_eq!(rewrite_assignment("temp0=5").as_deref(), Some("Equal(temp0,5)"));
        assert_eq!(rewrite_assignment("temp0+=temp1").as_deref(), Some("Add(temp0,temp1)"));
        assert_eq!(rewrite_assignment("object.frame++").as_deref(), Some("Inc(object.frame)"));
        assert_eq!(rewrite_assignment("temp0>>=2").as_deref(), Some("ShR(temp0,2)"));
        assert_eq!(rewrite_assignment("temp0=-1").as_deref(), Some("Equal(temp0,-1)"));
        assert_eq!(rewrite_assignment("Inc(temp0)"), None);
    }

    #[test]
    fn test_assignment_ignores_quoted_operators() {
        assert_eq!(rewrite_assignment("Print(\"a=b\",0,1)"), None);
        assert_eq!(find_token("x\"+=\"+=", "+="), Some(5));
    }

    #[test]
    fn test_case_labels() {
        assert_eq!(
            parse_case_label("case5:"),
            Some(CaseLabel::Case("5".to_string()))
        );
        assert_eq!(parse_case_label("default:"), Some(CaseLabel::Default));
        assert_eq!(parse_case_label("Equal(a,b)"), None);
    }

    #[test]
    fn test_split_indexed() {
        assert_eq!(
            split_indexed("object[+1].xpos"),
            ("object.xpos".to_string(), "+1".to_string())
        );
        assert_eq!(
            split_indexed("TypeName[PlayerObject]"),
            ("TypeName".to_string(), "PlayerObject".to_string())
        );
        assert_eq!(split_indexed("temp0"), ("temp0".to_string(), String::new()));
    }
}
