//! External name tables
//!
//! Game configuration names that scripts can refer to symbolically, for
//! example `TypeName[Player Object]` or `SfxName[Jump]`. Names compare ASCII
//! case-insensitively with spaces removed, since the statement reader strips
//! spaces from script text.

use serde::{Deserialize, Serialize};

/// Stage list selected by the first letter of a `StageName[...]` key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageList {
    /// `P`
    Presentation,
    /// `R`
    Regular,
    /// `S`
    Special,
    /// `B`
    Bonus,
}

impl StageList {
    /// Parse the list letter
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'P' => Some(Self::Presentation),
            'R' => Some(Self::Regular),
            'S' => Some(Self::Special),
            'B' => Some(Self::Bonus),
            _ => None,
        }
    }
}

/// Names supplied by the game configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameTables {
    /// Object type names, indexed by type id
    pub types: Vec<String>,
    /// Sound-effect names
    pub sfx: Vec<String>,
    /// Global variable names, resolved to `global[index]`
    pub global_variables: Vec<String>,
    /// Achievement names
    pub achievements: Vec<String>,
    /// Player names
    pub players: Vec<String>,
    /// Presentation stage names
    pub presentation_stages: Vec<String>,
    /// Regular stage names
    pub regular_stages: Vec<String>,
    /// Special stage names
    pub special_stages: Vec<String>,
    /// Bonus stage names
    pub bonus_stages: Vec<String>,
}

/// Which named lookup an operand uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameLookup {
    /// `TypeName[...]`
    Type,
    /// `SfxName[...]`
    Sfx,
    /// `VarName[...]`
    Var,
    /// `AchievementName[...]`
    Achievement,
    /// `PlayerName[...]`
    Player,
    /// `StageName[...]`
    Stage,
}

impl NameLookup {
    /// Recognize a lookup keyword
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        [
            ("TypeName", Self::Type),
            ("SfxName", Self::Sfx),
            ("VarName", Self::Var),
            ("AchievementName", Self::Achievement),
            ("PlayerName", Self::Player),
            ("StageName", Self::Stage),
        ]
        .into_iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(keyword))
        .map(|(_, lookup)| lookup)
    }

    /// Label used in warnings
    pub fn label(self) -> &'static str {
        match self {
            Self::Type => "typename",
            Self::Sfx => "sfxname",
            Self::Var => "varname",
            Self::Achievement => "achievement",
            Self::Player => "player",
            Self::Stage => "StageName",
        }
    }
}

fn same_name(a: &str, b: &str) -> bool {
    let mut a = a.chars().filter(|c| *c != ' ');
    let mut b = b.chars().filter(|c| *c != ' ');
    loop {
        match (a.next(), b.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x.eq_ignore_ascii_case(&y) => {}
            _ => return false,
        }
    }
}

fn position(list: &[String], key: &str) -> Option<i32> {
    list.iter()
        .position(|name| same_name(name, key))
        .map(|index| index as i32)
}

impl NameTables {
    /// Stage names of a list
    pub fn stages(&self, list: StageList) -> &[String] {
        match list {
            StageList::Presentation => &self.presentation_stages,
            StageList::Regular => &self.regular_stages,
            StageList::Special => &self.special_stages,
            StageList::Bonus => &self.bonus_stages,
        }
    }

    /// Index of a global variable
    pub fn global_variable(&self, name: &str) -> Option<i32> {
        position(&self.global_variables, name)
    }

    /// Resolve a named lookup key to its index
    pub fn lookup(&self, kind: NameLookup, key: &str) -> Option<i32> {
        match kind {
            NameLookup::Type => position(&self.types, key),
            NameLookup::Sfx => position(&self.sfx, key),
            NameLookup::Var => position(&self.global_variables, key),
            NameLookup::Achievement => position(&self.achievements, key),
            NameLookup::Player => position(&self.players, key),
            NameLookup::Stage => {
                let mut chars = key.chars();
                let list = chars.next().and_then(StageList::from_letter)?;
                // `R-NAME`: the list letter and separator precede the name
                chars.next()?;
                position(self.stages(list), chars.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> NameTables {
        NameTables {
            types: vec!["Blank Object".into(), "Player Object".into()],
            regular_stages: vec!["Green Hill Zone 1".into(), "Green Hill Zone 2".into()],
            players: vec!["SONIC".into()],
            ..NameTables::default()
        }
    }

    #[test]
    fn test_names_ignore_spaces_and_case() {
        let tables = tables();
        assert_eq!(tables.lookup(NameLookup::Type, "PlayerObject"), Some(1));
        assert_eq!(tables.lookup(NameLookup::Type, "playerobject"), Some(1));
        assert_eq!(tables.lookup(NameLookup::Player, "Sonic"), Some(0));
        assert_eq!(tables.lookup(NameLookup::Type, "Ring"), None);
    }

    #[test]
    fn test_stage_lookup_uses_list_letter() {
        let tables = tables();
        assert_eq!(tables.lookup(NameLookup::Stage, "R-GREENHILLZONE2"), Some(1));
        assert_eq!(tables.lookup(NameLookup::Stage, "S-GREENHILLZONE2"), None);
        assert_eq!(tables.lookup(NameLookup::Stage, "X-GREENHILLZONE2"), None);
        assert_eq!(tables.lookup(NameLookup::Stage, "R"), None);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(NameLookup::from_keyword("SfxName"), Some(NameLookup::Sfx));
        assert_eq!(NameLookup::from_keyword("stagename"), Some(NameLookup::Stage));
        assert_eq!(NameLookup::from_keyword("object"), None);
    }
}
