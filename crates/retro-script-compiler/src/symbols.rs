//! Symbol tables for aliases, static values, named tables and functions
//!
//! Each kind exists twice: a public table that lives for the whole compile
//! pass and a private one that is cleared before every file. Names compare
//! ASCII case-insensitively. Redefining a name is a warning and the most
//! recent definition wins.

use rustc_hash::FxHashMap;

use crate::builtins::BUILTIN_ALIASES;

/// Private alias capacity per file
pub const PRIVATE_ALIAS_COUNT: usize = 0xE0;

/// Public alias capacity on top of the built-in aliases
pub const PUBLIC_ALIAS_COUNT: usize = 0xE0 + 0xFFF;

/// Static value capacity per scope
pub const STATIC_VALUE_COUNT: usize = 0x200;

/// Table capacity per scope
pub const TABLE_COUNT: usize = 0x200;

/// Values per table
pub const TABLE_ENTRY_COUNT: usize = 0x400;

/// Symbol visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Visible to every file compiled after the declaration
    Public,
    /// Visible to the declaring file only
    Private,
}

/// Outcome of a successful insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inserted {
    /// The name was new
    New,
    /// The name already existed and now refers to the new value
    Replaced,
}

/// The table is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFull {
    /// Capacity of the table
    pub capacity: usize,
}

/// A fixed-capacity, case-insensitive name table
#[derive(Debug, Clone)]
pub struct SymbolTable<T> {
    entries: Vec<(String, T)>,
    index: FxHashMap<String, usize>,
    capacity: usize,
}

impl<T> SymbolTable<T> {
    /// Create an empty table
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
            capacity,
        }
    }

    /// Declare a name
    ///
    /// Every declaration takes a slot, duplicates included, so the capacity
    /// bounds the number of declarations rather than distinct names.
    pub fn insert(&mut self, name: &str, value: T) -> Result<Inserted, TableFull> {
        if self.entries.len() >= self.capacity {
            return Err(TableFull {
                capacity: self.capacity,
            });
        }
        let slot = self.entries.len();
        self.entries.push((name.to_string(), value));
        Ok(match self.index.insert(name.to_ascii_lowercase(), slot) {
            Some(_) => Inserted::Replaced,
            None => Inserted::New,
        })
    }

    /// Look a name up
    pub fn get(&self, name: &str) -> Option<&T> {
        let slot = *self.index.get(&name.to_ascii_lowercase())?;
        self.entries.get(slot).map(|(_, value)| value)
    }

    /// Number of declarations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was declared
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Declarations in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Drop every declaration
    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

/// A public/private pair of tables
#[derive(Debug, Clone)]
pub struct ScopedTable<T> {
    /// Public declarations
    pub public: SymbolTable<T>,
    /// Private declarations
    pub private: SymbolTable<T>,
}

impl<T> ScopedTable<T> {
    fn new(public: usize, private: usize) -> Self {
        Self {
            public: SymbolTable::new(public),
            private: SymbolTable::new(private),
        }
    }

    /// Table for a visibility
    pub fn scope_mut(&mut self, visibility: Visibility) -> &mut SymbolTable<T> {
        match visibility {
            Visibility::Public => &mut self.public,
            Visibility::Private => &mut self.private,
        }
    }

    /// Private declaration first, then public
    pub fn get(&self, name: &str) -> Option<&T> {
        self.private.get(name).or_else(|| self.public.get(name))
    }
}

/// A declared named table, resolved to its offset in the data segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSymbol {
    /// Offset of the `[count, values...]` record
    pub data_pos: i32,
    /// Number of values
    pub len: usize,
}

/// Function name table, shared by every file of a compile pass
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    names: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl FunctionTable {
    /// Function id of a name
    pub fn id(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_ascii_lowercase()).copied()
    }

    /// Append a name; the caller checks the capacity
    pub fn push(&mut self, name: &str) -> usize {
        let id = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_ascii_lowercase(), id);
        id
    }

    /// Name of a function id
    pub fn name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Number of functions
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no function was declared
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Drop every function
    pub fn clear(&mut self) {
        self.names.clear();
        self.index.clear();
    }
}

/// Every symbol table of a compile pass
#[derive(Debug, Clone)]
pub struct Symbols {
    /// Aliases, name to replacement text
    pub aliases: ScopedTable<String>,
    /// Static values, name to data offset
    pub statics: ScopedTable<i32>,
    /// Named tables
    pub tables: ScopedTable<TableSymbol>,
    /// Function names
    pub functions: FunctionTable,
}

impl Default for Symbols {
    fn default() -> Self {
        Self::new()
    }
}

impl Symbols {
    /// Create the tables with the built-in aliases registered
    pub fn new() -> Self {
        let mut symbols = Self {
            aliases: ScopedTable::new(
                BUILTIN_ALIASES.len() + PUBLIC_ALIAS_COUNT,
                PRIVATE_ALIAS_COUNT,
            ),
            statics: ScopedTable::new(STATIC_VALUE_COUNT, STATIC_VALUE_COUNT),
            tables: ScopedTable::new(TABLE_COUNT, TABLE_COUNT),
            functions: FunctionTable::default(),
        };
        symbols.register_builtins();
        symbols
    }

    fn register_builtins(&mut self) {
        for (name, value) in BUILTIN_ALIASES {
            // capacity covers the built-ins
            let _ = self.aliases.public.insert(name, value.to_string());
        }
    }

    /// Clear the private tables before a new file
    pub fn begin_file(&mut self) {
        self.aliases.private.clear();
        self.statics.private.clear();
        self.tables.private.clear();
    }

    /// Clear everything and re-register the built-in aliases
    pub fn reset(&mut self) {
        self.begin_file();
        self.aliases.public.clear();
        self.statics.public.clear();
        self.tables.public.clear();
        self.functions.clear();
        self.register_builtins();
    }

    /// Substitute a name through the private then the public aliases
    ///
    /// A private alias may expand to a public alias name, which is expanded
    /// in turn. Returns `None` when neither table has the name.
    pub fn expand_alias(&self, name: &str) -> Option<&str> {
        let private = self.aliases.private.get(name).map(String::as_str);
        let public = self.aliases.public.get(private.unwrap_or(name)).map(String::as_str);
        public.or(private)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive_and_last_wins() {
        let mut table = SymbolTable::new(4);
        assert_eq!(table.insert("Speed", 1), Ok(Inserted::New));
        assert_eq!(table.get("SPEED"), Some(&1));
        assert_eq!(table.insert("speed", 2), Ok(Inserted::Replaced));
        assert_eq!(table.get("Speed"), Some(&2));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_capacity() {
        let mut table = SymbolTable::new(1);
        table.insert("a", ()).unwrap();
        assert_eq!(table.insert("b", ()), Err(TableFull { capacity: 1 }));
    }

    #[test]
    fn test_private_shadows_public() {
        let mut symbols = Symbols::new();
        symbols
            .aliases
            .scope_mut(Visibility::Public)
            .insert("SPEED", "4".into())
            .unwrap();
        assert_eq!(symbols.expand_alias("speed"), Some("4"));
        symbols
            .aliases
            .scope_mut(Visibility::Private)
            .insert("SPEED", "8".into())
            .unwrap();
        assert_eq!(symbols.expand_alias("SPEED"), Some("8"));
        symbols.begin_file();
        assert_eq!(symbols.expand_alias("SPEED"), Some("4"));
    }

    #[test]
    fn test_private_alias_chains_into_public() {
        let mut symbols = Symbols::new();
        symbols
            .aliases
            .private
            .insert("MY_INK", "INK_ALPHA".into())
            .unwrap();
        assert_eq!(symbols.expand_alias("MY_INK"), Some("2"));
    }

    #[test]
    fn test_reset_restores_builtins() {
        let mut symbols = Symbols::new();
        symbols.aliases.public.insert("true", "7".into()).unwrap();
        symbols.functions.push("Fn");
        assert_eq!(symbols.expand_alias("true"), Some("7"));
        symbols.reset();
        assert_eq!(symbols.expand_alias("true"), Some("1"));
        assert!(symbols.functions.is_empty());
        assert_eq!(symbols.aliases.public.len(), BUILTIN_ALIASES.len());
    }

    #[test]
    fn test_function_ids() {
        let mut functions = FunctionTable::default();
        assert_eq!(functions.push("Player_Move"), 0);
        assert_eq!(functions.push("Player_Jump"), 1);
        assert_eq!(functions.id("player_jump"), Some(1));
        assert_eq!(functions.name(0), Some("Player_Move"));
        assert_eq!(functions.id("Other"), None);
    }
}
