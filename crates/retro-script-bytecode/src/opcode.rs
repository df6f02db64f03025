//! Opcode catalog
//!
//! The catalog is positional: an opcode is stored in the code segment as its
//! ordinal, followed by `arity` operand records.

use serde::{Deserialize, Serialize};

/// How the interpreter treats operands after an opcode has executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WriteBack {
    /// Variable operands are written back from the operand registers
    Store,
    /// Nothing is written back
    Skip,
    /// Written back while a loop is iterating, skipped when it exits
    WhileIterating,
}

macro_rules! define_opcodes {
    ($( $(#[$meta:meta])* $variant:ident => $name:literal, $arity:literal, $write_back:ident; )*) => {
        /// Script VM opcodes
        ///
        /// The discriminant is the ordinal stored in bytecode. Names are the
        /// identifiers used in script source.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u8)]
        pub enum Opcode {
            $( $(#[$meta])* $variant, )*
        }

        impl Opcode {
            /// Every opcode in ordinal order
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant),*];

            /// Name used in script source
            pub const fn name(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $name,)*
                }
            }

            /// Number of operand records following the opcode
            pub const fn arity(self) -> usize {
                match self {
                    $(Opcode::$variant => $arity,)*
                }
            }

            /// Write-back policy after execution
            pub const fn write_back(self) -> WriteBack {
                match self {
                    $(Opcode::$variant => WriteBack::$write_back,)*
                }
            }
        }
    };
}

define_opcodes! {
    // ==================== Arithmetic ====================
    /// End of event: stops execution
    End => "End", 0, Store;
    /// a = b
    Equal => "Equal", 2, Store;
    /// a += b
    Add => "Add", 2, Store;
    /// a -= b
    Sub => "Sub", 2, Store;
    /// a += 1
    Inc => "Inc", 1, Store;
    /// a -= 1
    Dec => "Dec", 1, Store;
    /// a *= b
    Mul => "Mul", 2, Store;
    /// a /= b
    Div => "Div", 2, Store;
    /// a >>= b
    ShR => "ShR", 2, Store;
    /// a <<= b
    ShL => "ShL", 2, Store;
    /// a &= b
    And => "And", 2, Store;
    /// a |= b
    Or => "Or", 2, Store;
    /// a ^= b
    Xor => "Xor", 2, Store;
    /// a %= b
    Mod => "Mod", 2, Store;
    /// a = -a
    FlipSign => "FlipSign", 1, Store;

    // ==================== Comparison ====================
    /// checkResult = a == b
    CheckEqual => "CheckEqual", 2, Skip;
    /// checkResult = a > b
    CheckGreater => "CheckGreater", 2, Skip;
    /// checkResult = a < b
    CheckLower => "CheckLower", 2, Skip;
    /// checkResult = a != b
    CheckNotEqual => "CheckNotEqual", 2, Skip;

    // ==================== If ====================
    /// Enter the branch if a == b
    IfEqual => "IfEqual", 3, Skip;
    /// Enter the branch if a > b
    IfGreater => "IfGreater", 3, Skip;
    /// Enter the branch if a >= b
    IfGreaterOrEqual => "IfGreaterOrEqual", 3, Skip;
    /// Enter the branch if a < b
    IfLower => "IfLower", 3, Skip;
    /// Enter the branch if a <= b
    IfLowerOrEqual => "IfLowerOrEqual", 3, Skip;
    /// Enter the branch if a != b
    IfNotEqual => "IfNotEqual", 3, Skip;
    /// Start of the else branch
    Else => "else", 0, Skip;
    /// End of an if block
    EndIf => "endif", 0, Skip;

    // ==================== While ====================
    /// Loop while a == b
    WEqual => "WEqual", 3, Skip;
    /// Loop while a > b
    WGreater => "WGreater", 3, Skip;
    /// Loop while a >= b
    WGreaterOrEqual => "WGreaterOrEqual", 3, Skip;
    /// Loop while a < b
    WLower => "WLower", 3, Skip;
    /// Loop while a <= b
    WLowerOrEqual => "WLowerOrEqual", 3, Skip;
    /// Loop while a != b
    WNotEqual => "WNotEqual", 3, Skip;
    /// End of a while loop
    Loop => "loop", 0, Skip;

    // ==================== ForEach ====================
    /// Iterate the entity references of a type group
    ForEachActive => "ForEachActive", 3, WhileIterating;
    /// Iterate every entity of an object type
    ForEachAll => "ForEachAll", 3, WhileIterating;
    /// End of a foreach loop
    Next => "next", 0, Skip;

    // ==================== Switch ====================
    /// Jump to the case matching the value
    Switch => "switch", 2, Skip;
    /// Leave the enclosing switch
    Break => "break", 0, Skip;
    /// End of a switch block
    EndSwitch => "endswitch", 0, Skip;

    // ==================== Math ====================
    /// a = random value in 0..b
    Rand => "Rand", 2, Store;
    /// a = sin(b), 512 steps per turn
    Sin => "Sin", 2, Store;
    /// a = cos(b), 512 steps per turn
    Cos => "Cos", 2, Store;
    /// a = sin(b), 256 steps per turn
    Sin256 => "Sin256", 2, Store;
    /// a = cos(b), 256 steps per turn
    Cos256 => "Cos256", 2, Store;
    /// a = angle of the vector (x, y), 256 steps per turn
    ATan2 => "ATan2", 3, Store;
    /// a = blend of b and c by percent d (0..256)
    Interpolate => "Interpolate", 4, Store;
    /// (x, y) = blend of two points by percent
    InterpolateXY => "InterpolateXY", 7, Store;

    // ==================== Graphics ====================
    /// Load a sprite sheet for the current object type
    LoadSpriteSheet => "LoadSpriteSheet", 1, Skip;
    /// Release a sprite sheet
    RemoveSpriteSheet => "RemoveSpriteSheet", 1, Skip;
    /// Draw a sprite frame at the object position
    DrawSprite => "DrawSprite", 1, Skip;
    /// Draw a sprite frame at a world position
    DrawSpriteXY => "DrawSpriteXY", 3, Skip;
    /// Draw a sprite frame at a screen position
    DrawSpriteScreenXY => "DrawSpriteScreenXY", 3, Skip;
    /// Draw a tinted rectangle
    DrawTintRect => "DrawTintRect", 4, Skip;
    /// Draw a number with sprite digits
    DrawNumbers => "DrawNumbers", 7, Skip;
    /// Draw a zone title with sprite letters
    DrawActName => "DrawActName", 7, Skip;
    /// Draw a text menu
    DrawMenu => "DrawMenu", 3, Skip;
    /// Define a sprite frame
    SpriteFrame => "SpriteFrame", 6, Skip;
    /// Edit an existing sprite frame
    EditFrame => "EditFrame", 7, Skip;
    /// Load a palette file
    LoadPalette => "LoadPalette", 5, Skip;
    /// Rotate palette entries
    RotatePalette => "RotatePalette", 4, Skip;
    /// Fade the screen to a colour
    SetScreenFade => "SetScreenFade", 4, Skip;
    /// Classic-style screen fade
    SetClassicFade => "SetClassicFade", 4, Skip;
    /// Select the active palette for a line range
    SetActivePalette => "SetActivePalette", 3, Skip;
    /// Blend a palette range
    SetPaletteFade => "SetPaletteFade", 6, Store;
    /// Write a palette colour
    SetPaletteEntry => "SetPaletteEntry", 3, Store;
    /// Read a palette colour
    GetPaletteEntry => "GetPaletteEntry", 3, Store;
    /// Copy palette entries between banks
    CopyPalette => "CopyPalette", 5, Skip;
    /// Fill the screen with a palette colour
    ClearScreen => "ClearScreen", 1, Skip;
    /// Draw a sprite frame with effects at a world position
    DrawSpriteFX => "DrawSpriteFX", 4, Skip;
    /// Draw a sprite frame with effects at a screen position
    DrawSpriteScreenFX => "DrawSpriteScreenFX", 4, Skip;

    // ==================== Objects & Menus ====================
    /// Load an animation file for the current object type
    LoadAnimation => "LoadAnimation", 1, Skip;
    /// Set up a text menu
    SetupMenu => "SetupMenu", 4, Skip;
    /// Append a menu entry
    AddMenuEntry => "AddMenuEntry", 3, Skip;
    /// Replace a menu entry
    EditMenuEntry => "EditMenuEntry", 4, Skip;
    /// Request a stage load
    LoadStage => "LoadStage", 0, Skip;
    /// Draw a filled rectangle
    DrawRect => "DrawRect", 8, Skip;
    /// Tint a colour range
    ClassicTint => "ClassicTint", 8, Skip;
    /// Reset an entity slot to a fresh object
    ResetObjectEntity => "ResetObjectEntity", 5, Skip;
    /// Test two hitboxes against each other
    BoxCollisionTest => "BoxCollisionTest", 11, Skip;
    /// Spawn an object in the temporary entity range
    CreateTempObject => "CreateTempObject", 4, Skip;
    /// Apply the current object's movement
    ProcessObjectMovement => "ProcessObjectMovement", 0, Skip;
    /// Apply the current object's controller input
    ProcessObjectControl => "ProcessObjectControl", 0, Skip;
    /// Advance the current object's animation
    ProcessAnimation => "ProcessAnimation", 0, Skip;
    /// Draw the current object's animation frame
    DrawObjectAnimation => "DrawObjectAnimation", 0, Skip;

    // ==================== Audio ====================
    /// Assign a file to a music slot
    SetMusicTrack => "SetMusicTrack", 3, Skip;
    /// Play a music slot
    PlayMusic => "PlayMusic", 1, Skip;
    /// Stop the music
    StopMusic => "StopMusic", 0, Skip;
    /// Pause the music
    PauseMusic => "PauseMusic", 0, Skip;
    /// Resume the music
    ResumeMusic => "ResumeMusic", 0, Skip;
    /// Swap the playing music track
    SwapMusicTrack => "SwapMusicTrack", 4, Skip;
    /// Play a sound effect
    PlaySfx => "PlaySfx", 2, Skip;
    /// Stop a sound effect
    StopSfx => "StopSfx", 1, Skip;
    /// Set volume and pan of a sound effect
    SetSfxAttributes => "SetSfxAttributes", 3, Skip;

    // ==================== Collision & Video ====================
    /// Check a point against the tile layout
    ObjectTileCollision => "ObjectTileCollision", 4, Skip;
    /// Snap a point to the tile layout
    ObjectTileGrip => "ObjectTileGrip", 4, Skip;
    /// Start a video
    LoadVideo => "LoadVideo", 1, Skip;
    /// Advance the playing video
    NextVideoFrame => "NextVideoFrame", 0, Skip;
    /// a = !a
    Not => "Not", 1, Store;

    // ==================== 3D ====================
    /// Render the 3D scene
    Draw3DScene => "Draw3DScene", 0, Skip;
    /// Load the identity into a matrix
    SetIdentityMatrix => "SetIdentityMatrix", 1, Skip;
    /// a = a * b
    MatrixMultiply => "MatrixMultiply", 2, Skip;
    /// Translate a matrix
    MatrixTranslateXYZ => "MatrixTranslateXYZ", 4, Skip;
    /// Scale a matrix
    MatrixScaleXYZ => "MatrixScaleXYZ", 4, Skip;
    /// Rotate a matrix around X
    MatrixRotateX => "MatrixRotateX", 2, Skip;
    /// Rotate a matrix around Y
    MatrixRotateY => "MatrixRotateY", 2, Skip;
    /// Rotate a matrix around Z
    MatrixRotateZ => "MatrixRotateZ", 2, Skip;
    /// Rotate a matrix around all axes
    MatrixRotateXYZ => "MatrixRotateXYZ", 4, Skip;
    /// Invert a matrix
    MatrixInverse => "MatrixInverse", 1, Skip;
    /// Transform vertices through a matrix
    TransformVertices => "TransformVertices", 3, Skip;

    // ==================== Functions ====================
    /// Call a script function
    CallFunction => "CallFunction", 1, Skip;
    /// Return from a script function
    Return => "return", 0, Skip;

    // ==================== Stage ====================
    /// Configure a layer deformation wave
    SetLayerDeformation => "SetLayerDeformation", 6, Skip;
    /// Find a touch point inside a rectangle
    CheckTouchRect => "CheckTouchRect", 4, Skip;
    /// Read a tile of a layer
    GetTileLayerEntry => "GetTileLayerEntry", 4, Store;
    /// Write a tile of a layer
    SetTileLayerEntry => "SetTileLayerEntry", 4, Store;
    /// a = bit c of b
    GetBit => "GetBit", 3, Store;
    /// Set or clear bit b of a
    SetBit => "SetBit", 3, Store;
    /// Empty a draw list
    ClearDrawList => "ClearDrawList", 1, Skip;
    /// Append an entity to a draw list
    AddDrawListEntityRef => "AddDrawListEntityRef", 2, Skip;
    /// Read a draw list entry
    GetDrawListEntityRef => "GetDrawListEntityRef", 3, Store;
    /// Write a draw list entry
    SetDrawListEntityRef => "SetDrawListEntityRef", 3, Skip;
    /// Read a property of a 16x16 tile
    Get16x16TileInfo => "Get16x16TileInfo", 4, Store;
    /// Write a property of a 16x16 tile
    Set16x16TileInfo => "Set16x16TileInfo", 4, Store;
    /// Copy a 16x16 tile
    Copy16x16Tile => "Copy16x16Tile", 2, Skip;
    /// Look up an animation by name
    GetAnimationByName => "GetAnimationByName", 2, Store;
    /// Load save RAM
    ReadSaveRAM => "ReadSaveRAM", 0, Skip;
    /// Store save RAM
    WriteSaveRAM => "WriteSaveRAM", 0, Skip;

    // ==================== Text & Tables ====================
    /// Load a text file into a menu
    LoadTextFile => "LoadTextFile", 2, Skip;
    /// Query text menu information
    GetTextInfo => "GetTextInfo", 5, Store;
    /// Load the version string into a menu
    GetVersionNumber => "GetVersionNumber", 2, Skip;
    /// Read a named table entry
    GetTableValue => "GetTableValue", 3, Store;
    /// Write a named table entry
    SetTableValue => "SetTableValue", 3, Skip;
    /// Compare the current stage folder
    CheckCurrentStageFolder => "CheckCurrentStageFolder", 1, Skip;
    /// a = |a|
    Abs => "Abs", 1, Store;

    // ==================== Native & Misc ====================
    /// Call a native function without arguments
    CallNativeFunction => "CallNativeFunction", 1, Skip;
    /// Call a native function with two arguments
    CallNativeFunction2 => "CallNativeFunction2", 3, Store;
    /// Call a native function with four arguments
    CallNativeFunction4 => "CallNativeFunction4", 5, Store;
    /// Resize the active object range
    SetObjectRange => "SetObjectRange", 1, Skip;
    /// Read object.value[index] of an entity
    GetObjectValue => "GetObjectValue", 3, Store;
    /// Write object.value[index] of an entity
    SetObjectValue => "SetObjectValue", 3, Skip;
    /// Copy a range of entities
    CopyObject => "CopyObject", 3, Store;
    /// Print a value or string to the log
    Print => "Print", 3, Store;
    /// Recompute the current object's rotation
    CalculateObjectRotation => "CalculateObjectRotation", 0, Skip;
    /// Open a website
    LoadWebsite => "LoadWebsite", 1, Skip;
    /// Apply controller input mirrored horizontally
    ProcessFlippedObjectControl => "ProcessFlippedObjectControl", 0, Skip;
}

impl Opcode {
    /// Number of opcodes in the catalog
    pub const COUNT: usize = Self::ALL.len();

    /// Convert from a bytecode word
    #[inline]
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// Ordinal stored in bytecode
    #[inline]
    pub const fn index(self) -> i32 {
        self as i32
    }

    /// Look up an opcode by its source name (ASCII case-insensitive, first match)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|opcode| opcode.name().eq_ignore_ascii_case(name))
    }

    /// Whether this opcode opens or closes a structured control-flow block
    pub const fn is_control_flow(self) -> bool {
        matches!(
            self,
            Self::IfEqual
                | Self::IfGreater
                | Self::IfGreaterOrEqual
                | Self::IfLower
                | Self::IfLowerOrEqual
                | Self::IfNotEqual
                | Self::Else
                | Self::EndIf
                | Self::WEqual
                | Self::WGreater
                | Self::WGreaterOrEqual
                | Self::WLower
                | Self::WLowerOrEqual
                | Self::WNotEqual
                | Self::Loop
                | Self::ForEachActive
                | Self::ForEachAll
                | Self::Next
                | Self::Switch
                | Self::Break
                | Self::EndSwitch
        )
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_are_stable() {
        assert_eq!(Opcode::End.index(), 0);
        assert_eq!(Opcode::Equal.index(), 1);
        assert_eq!(Opcode::IfEqual.index(), 19);
        assert_eq!(Opcode::ForEachActive.index(), 34);
        assert_eq!(Opcode::Switch.index(), 37);
        assert_eq!(Opcode::CallFunction.index(), 110);
        assert_eq!(Opcode::Return.index(), 111);
        assert_eq!(
            Opcode::ALL.last().copied(),
            Some(Opcode::ProcessFlippedObjectControl)
        );
    }

    #[test]
    fn test_from_index_matches_all() {
        for (index, opcode) in Opcode::ALL.iter().enumerate() {
            assert_eq!(Opcode::from_index(index as i32), Some(*opcode));
        }
        assert_eq!(Opcode::from_index(-1), None);
        assert_eq!(Opcode::from_index(Opcode::COUNT as i32), None);
    }

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(Opcode::from_name("ifequal"), Some(Opcode::IfEqual));
        assert_eq!(Opcode::from_name("ENDIF"), Some(Opcode::EndIf));
        assert_eq!(Opcode::from_name("NoSuchOpcode"), None);
    }

    #[test]
    fn test_arity_never_exceeds_operand_registers() {
        assert!(
            Opcode::ALL
                .iter()
                .all(|opcode| opcode.arity() <= crate::MAX_OPERANDS)
        );
        assert_eq!(Opcode::BoxCollisionTest.arity(), 11);
    }
}
