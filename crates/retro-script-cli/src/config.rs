//! Project file parsing (`project.toml`).

use retro_script_compiler::{CompilerOptions, NameTables};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A script project: name tables, compiler settings and the script list.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectConfig {
    /// Compiler settings
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Names resolved inside scripts
    #[serde(default)]
    pub names: NamesConfig,

    /// Stage lists
    #[serde(default)]
    pub stages: StagesConfig,

    /// Scripts in load order
    #[serde(default)]
    pub scripts: Vec<ScriptEntry>,

    /// Directory the project file lives in; script paths are relative to it
    #[serde(skip)]
    pub root: PathBuf,
}

/// Compiler settings.
#[derive(Debug, Deserialize)]
pub struct CompilerConfig {
    /// Tags that keep a `#platform:` block
    #[serde(default = "default_platform_tags")]
    pub platform_tags: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            platform_tags: default_platform_tags(),
        }
    }
}

/// Name tables supplied by the game configuration.
#[derive(Debug, Default, Deserialize)]
pub struct NamesConfig {
    /// Object type names, indexed by type id (index 0 is the blank object)
    #[serde(default)]
    pub types: Vec<String>,

    /// Sound-effect names
    #[serde(default)]
    pub sfx: Vec<String>,

    /// Global variable names
    #[serde(default)]
    pub global_variables: Vec<String>,

    /// Achievement names
    #[serde(default)]
    pub achievements: Vec<String>,

    /// Player names
    #[serde(default)]
    pub players: Vec<String>,
}

/// Stage names per list.
#[derive(Debug, Default, Deserialize)]
pub struct StagesConfig {
    #[serde(default)]
    pub presentation: Vec<String>,

    #[serde(default)]
    pub regular: Vec<String>,

    #[serde(default)]
    pub special: Vec<String>,

    #[serde(default)]
    pub bonus: Vec<String>,
}

/// One script file.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptEntry {
    /// Path relative to the project file
    pub path: PathBuf,

    /// Object type id; defaults to the script's position in the list plus one
    #[serde(rename = "type")]
    pub object_type: Option<usize>,
}

fn default_platform_tags() -> Vec<String> {
    CompilerOptions::default().platform_tags
}

impl ProjectConfig {
    /// Compiler options for this project
    pub fn compiler_options(&self) -> CompilerOptions {
        CompilerOptions {
            platform_tags: self.compiler.platform_tags.clone(),
        }
    }

    /// Name tables for this project
    pub fn name_tables(&self) -> NameTables {
        NameTables {
            types: self.names.types.clone(),
            sfx: self.names.sfx.clone(),
            global_variables: self.names.global_variables.clone(),
            achievements: self.names.achievements.clone(),
            players: self.names.players.clone(),
            presentation_stages: self.stages.presentation.clone(),
            regular_stages: self.stages.regular.clone(),
            special_stages: self.stages.special.clone(),
            bonus_stages: self.stages.bonus.clone(),
        }
    }

    /// Scripts with resolved paths and object types
    pub fn resolved_scripts(&self) -> impl Iterator<Item = (PathBuf, usize)> + '_ {
        self.scripts.iter().enumerate().map(|(index, script)| {
            let object_type = script.object_type.unwrap_or(index + 1);
            (self.root.join(&script.path), object_type)
        })
    }

    /// Highest object type any script is compiled for
    pub fn last_type(&self) -> usize {
        self.resolved_scripts()
            .map(|(_, object_type)| object_type)
            .max()
            .unwrap_or(0)
    }
}

/// Load a project file.
pub fn load_project(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
    let mut project: ProjectConfig = toml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
    project.root = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    Ok(project)
}

/// Load a project file, or fall back to an empty project.
pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<ProjectConfig> {
    match path {
        Some(path) => load_project(path),
        None => Ok(ProjectConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_project() {
        let project = ProjectConfig::default();
        assert_eq!(
            project.compiler.platform_tags,
            vec!["Standard", "HW_Rendering", "USE_DECOMP"]
        );
        assert!(project.scripts.is_empty());
        assert_eq!(project.last_type(), 0);
    }

    #[test]
    fn test_parse_project() {
        let toml = r#"
[compiler]
platform_tags = ["Mobile"]

[names]
types = ["Blank Object", "Player", "Ring"]
sfx = ["Jump", "Ring"]
global_variables = ["lampPostID"]

[stages]
regular = ["Green Hill 1", "Green Hill 2"]

[[scripts]]
path = "Player.txt"

[[scripts]]
path = "Global/Ring.txt"
type = 5
"#;
        let project: ProjectConfig = toml::from_str(toml).unwrap();
        assert_eq!(project.compiler.platform_tags, vec!["Mobile"]);
        assert_eq!(project.names.types.len(), 3);

        let names = project.name_tables();
        assert_eq!(names.sfx, vec!["Jump", "Ring"]);
        assert_eq!(names.regular_stages.len(), 2);
        assert!(names.special_stages.is_empty());

        let scripts: Vec<_> = project.resolved_scripts().collect();
        assert_eq!(scripts[0], (PathBuf::from("Player.txt"), 1));
        assert_eq!(scripts[1], (PathBuf::from("Global/Ring.txt"), 5));
        assert_eq!(project.last_type(), 5);
    }

    #[test]
    fn test_script_paths_relative_to_project() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[[scripts]]\npath = \"Scripts/Player.txt\"").unwrap();

        let project = load_project(&path).unwrap();
        let (script, object_type) = project.resolved_scripts().next().unwrap();
        assert_eq!(script, dir.path().join("Scripts/Player.txt"));
        assert_eq!(object_type, 1);
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[[scripts]]\npath = 3\n").unwrap();

        let err = load_project(&path).unwrap_err().to_string();
        assert!(err.contains("broken.toml"));
    }

    #[test]
    fn test_missing_project_path_is_default() {
        let project = load_or_default(None).unwrap();
        assert!(project.scripts.is_empty());
    }
}
