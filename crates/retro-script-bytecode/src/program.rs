//! Program buffers and script descriptors

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{BytecodeError, Result};
use crate::image::BytecodeImage;
use crate::{FUNCTION_COUNT, JUMP_TABLE_COUNT, OBJECT_COUNT, SCRIPT_DATA_COUNT};

/// Entry point of an event or function in the shared buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptDescriptor {
    /// Absolute offset of the first opcode in the code segment
    pub code_ptr: i32,
    /// Base offset for this script's jump-table indices
    pub jump_ptr: i32,
}

impl ScriptDescriptor {
    /// Descriptor of an event that was never defined; running it does nothing
    pub const UNSET: Self = Self {
        code_ptr: SCRIPT_DATA_COUNT as i32 - 1,
        jump_ptr: JUMP_TABLE_COUNT as i32 - 1,
    };

    /// Create a descriptor
    #[inline]
    pub const fn new(code_ptr: i32, jump_ptr: i32) -> Self {
        Self { code_ptr, jump_ptr }
    }

    /// Whether the descriptor points at compiled code
    #[inline]
    pub fn is_set(&self) -> bool {
        *self != Self::UNSET
    }
}

impl Default for ScriptDescriptor {
    fn default() -> Self {
        Self::UNSET
    }
}

/// Object event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// Per-frame update (`eventObjectMain`)
    Main,
    /// Per-frame drawing (`eventObjectDraw`)
    Draw,
    /// One-time type setup (`eventObjectStartup`)
    Startup,
}

impl Event {
    /// Source keyword that starts this event
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Main => "eventObjectMain",
            Self::Draw => "eventObjectDraw",
            Self::Startup => "eventObjectStartup",
        }
    }

    /// Parse a short event name (`main`, `draw`, `startup`)
    pub fn from_short_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "main" => Some(Self::Main),
            "draw" => Some(Self::Draw),
            "startup" | "setup" => Some(Self::Startup),
            _ => None,
        }
    }
}

/// Event descriptors of one object type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectScript {
    /// `eventObjectMain`
    pub main: ScriptDescriptor,
    /// `eventObjectDraw`
    pub draw: ScriptDescriptor,
    /// `eventObjectStartup`
    pub startup: ScriptDescriptor,
}

impl ObjectScript {
    /// Descriptor of an event
    pub fn event(&self, event: Event) -> ScriptDescriptor {
        match event {
            Event::Main => self.main,
            Event::Draw => self.draw,
            Event::Startup => self.startup,
        }
    }

    /// Mutable descriptor of an event
    pub fn event_mut(&mut self, event: Event) -> &mut ScriptDescriptor {
        match event {
            Event::Main => &mut self.main,
            Event::Draw => &mut self.draw,
            Event::Startup => &mut self.startup,
        }
    }
}

/// A compiled program
///
/// Code, static values and tables share the `code` segment; control-flow
/// targets live in `jump_table`, relative to each script's `jump_ptr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Code and data words
    pub code: Vec<i32>,
    /// Jump-table entries
    pub jump_table: Vec<i32>,
    /// Event descriptors per object type
    pub objects: Vec<ObjectScript>,
    /// Function descriptors
    pub functions: Vec<ScriptDescriptor>,
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Program {
    /// Create an empty program with every object event unset
    pub fn new() -> Self {
        Self {
            code: Vec::new(),
            jump_table: Vec::new(),
            objects: vec![ObjectScript::default(); OBJECT_COUNT],
            functions: Vec::new(),
        }
    }

    /// Drop all code, tables and descriptors
    pub fn clear(&mut self) {
        self.code.clear();
        self.jump_table.clear();
        self.objects.fill(ObjectScript::default());
        self.functions.clear();
    }

    /// Event descriptor of an object type
    pub fn event(&self, object_type: usize, event: Event) -> Option<ScriptDescriptor> {
        self.objects.get(object_type).map(|script| script.event(event))
    }

    /// Extract an image of everything appended since `code_start`/`jump_start`
    /// together with the descriptors of `types` and every function
    pub fn export_image(
        &self,
        code_start: usize,
        jump_start: usize,
        types: Range<usize>,
    ) -> BytecodeImage {
        let types = types.start.min(self.objects.len())..types.end.min(self.objects.len());
        BytecodeImage {
            code: self.code.get(code_start..).unwrap_or_default().to_vec(),
            jump_table: self.jump_table.get(jump_start..).unwrap_or_default().to_vec(),
            objects: self.objects[types].to_vec(),
            functions: self.functions.clone(),
        }
    }

    /// Append an image and install its descriptors for types starting at `first_type`
    ///
    /// Descriptor pointers are absolute, so images must be loaded in the order
    /// they were produced.
    pub fn load_image(&mut self, image: &BytecodeImage, first_type: usize) -> Result<()> {
        let code_len = self.code.len() + image.code.len();
        if code_len > SCRIPT_DATA_COUNT {
            return Err(BytecodeError::capacity("code", code_len, SCRIPT_DATA_COUNT));
        }
        let jump_len = self.jump_table.len() + image.jump_table.len();
        if jump_len > JUMP_TABLE_COUNT {
            return Err(BytecodeError::capacity("jump table", jump_len, JUMP_TABLE_COUNT));
        }
        let last_type = first_type + image.objects.len();
        if last_type > OBJECT_COUNT {
            return Err(BytecodeError::capacity("object type", last_type, OBJECT_COUNT));
        }
        if image.functions.len() > FUNCTION_COUNT {
            return Err(BytecodeError::capacity(
                "function",
                image.functions.len(),
                FUNCTION_COUNT,
            ));
        }

        self.code.extend_from_slice(&image.code);
        self.jump_table.extend_from_slice(&image.jump_table);
        self.objects[first_type..last_type].copy_from_slice(&image.objects);
        if self.functions.len() < image.functions.len() {
            self.functions
                .resize(image.functions.len(), ScriptDescriptor::UNSET);
        }
        self.functions[..image.functions.len()].copy_from_slice(&image.functions);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_program_has_unset_events() {
        let program = Program::new();
        assert_eq!(program.objects.len(), OBJECT_COUNT);
        assert_eq!(program.event(3, Event::Main), Some(ScriptDescriptor::UNSET));
        assert!(!ScriptDescriptor::UNSET.is_set());
        assert!(ScriptDescriptor::new(0, 0).is_set());
        assert_eq!(program.event(OBJECT_COUNT, Event::Main), None);
    }

    #[test]
    fn test_export_then_load_appends() {
        let mut global = Program::new();
        global.code = vec![1, 2, 3];
        global.jump_table = vec![-1, 0];
        global.objects[1].main = ScriptDescriptor::new(0, 0);
        global.functions.push(ScriptDescriptor::new(2, 1));

        let image = global.export_image(0, 0, 1..2);
        let mut loaded = Program::new();
        loaded.load_image(&image, 1).unwrap();
        assert_eq!(loaded, global);
    }

    #[test]
    fn test_load_rejects_type_overflow() {
        let image = BytecodeImage {
            objects: vec![ObjectScript::default(); 2],
            ..BytecodeImage::default()
        };
        let mut program = Program::new();
        assert!(matches!(
            program.load_image(&image, OBJECT_COUNT - 1),
            Err(BytecodeError::CapacityExceeded { .. })
        ));
    }
}
