//! Aliases every script can use without declaring them
/// Built-in public aliases as `(name, value)`, registered before any script
/// is read so that scripts can shadow them
pub const BUILTIN_ALIASES: &[(&str, &str)] = &[
    // Booleans
    ("true", "1"),
    ("false", "0"),

    // Sprite effects
    ("FX_FLIP", "1"),
    ("FX_ROTATE", "2"),
    ("FX_SCALE", "4"),
    ("FX_ROTOZOOM", "6"),
    ("FX_INK", "8"),

    // Stage list categories
    ("PRESENTATION_STAGE", "0"),
    ("REGULAR_STAGE", "1"),
    ("BONUS_STAGE", "2"),
    ("SPECIAL_STAGE", "3"),

    // Menus
    ("MENU_1", "0"),
    ("MENU_2", "1"),
    ("MENU_3", "2"),
    ("MENU_4", "3"),

    // Collision types
    ("C_TOUCH", "0"),
    ("C_BOX", "1"),
    ("C_BOX2", "2"),
    ("C_PLATFORM", "3"),

    // Matrices
    ("MAT_WORLD", "0"),
    ("MAT_VIEW", "1"),
    ("MAT_TEMP", "2"),

    // Facing and flipping
    ("FACING_LEFT", "1"),
    ("FACING_RIGHT", "0"),
    ("FLIP_NONE", "0"),
    ("FLIP_X", "1"),
    ("FLIP_Y", "2"),
    ("FLIP_XY", "3"),

    // Stage states
    ("STAGE_RUNNING", "1"),
    ("STAGE_PAUSED", "2"),
    ("STAGE_FROZEN", "3"),
    ("STAGE_2P", "4"),

    // Engine states
    ("ENGINE_DEVMENU", "0"),
    ("ENGINE_MAINGAME", "1"),
    ("ENGINE_INITDEVMENU", "2"),
    ("ENGINE_WAIT", "3"),
    ("ENGINE_SCRIPTERROR", "4"),
    ("ENGINE_INITPAUSE", "5"),
    ("ENGINE_EXITPAUSE", "6"),
    ("ENGINE_ENDGAME", "7"),
    ("ENGINE_RESETGAME", "8"),
    ("RESET_GAME", "2"),

    // Device types
    ("RETRO_STANDARD", "0"),
    ("RETRO_MOBILE", "1"),

    // Ink effects
    ("INK_NONE", "0"),
    ("INK_BLEND", "1"),
    ("INK_ALPHA", "2"),
    ("INK_ADD", "3"),
    ("INK_SUB", "4"),
    ("INK_PINKIFIED", "5"),
    ("INK_BLANK", "6"),
    ("INK_CUSTOM", "7"),

    // Collision sides and modes
    ("CSIDE_FLOOR", "0"),
    ("CSIDE_LWALL", "1"),
    ("CSIDE_RWALL", "2"),
    ("CSIDE_ROOF", "3"),
    ("CMODE_FLOOR", "0"),
    ("CMODE_LWALL", "1"),
    ("CMODE_ROOF", "2"),
    ("CMODE_RWALL", "3"),
    ("COL_NONE", "0"),
    ("COL_TOP", "1"),
    ("COL_LEFT", "2"),
    ("COL_RIGHT", "3"),
    ("COL_BOTTOM", "4"),
    ("PATH_A", "0"),
    ("PATH_B", "1"),
    ("GRAVITY_GROUND", "0"),
    ("GRAVITY_AIR", "1"),

    // 3D face flags
    ("FACE_TEXTURED_3D", "0"),
    ("FACE_TEXTURED_2D", "1"),
    ("FACE_COLOURED_3D", "2"),
    ("FACE_COLOURED_2D", "3"),
    ("FACE_FADED", "4"),
    ("FACE_TEXTURED_C", "5"),
    ("FACE_TEXTURED_C_BLEND", "6"),
    ("FACE_TEXTURED_D", "6"),
    ("FACE_SPRITE_3D", "7"),

    // Object priorities
    ("PRIORITY_ACTIVE_BOUNDS", "0"),
    ("PRIORITY_ACTIVE", "1"),
    ("PRIORITY_ACTIVE_PAUSED", "2"),
    ("PRIORITY_XBOUNDS", "3"),
    ("PRIORITY_XBOUNDS_DESTROY", "4"),
    ("PRIORITY_INACTIVE", "5"),
    ("PRIORITY_BOUNDS_SMALL", "6"),
    ("PRIORITY_ACTIVE_SMALL", "7"),
    ("PRIORITY_UNKNOWN", "7"),

    // Player control and camera
    ("CONTROLMODE_NONE", "-1"),
    ("CONTROLMODE_NORMAL", "0"),
    ("CAMERASTYLE_FOLLOW", "0"),
    ("CAMERASTYLE_EXTENDED", "1"),
    ("CAMERASTYLE_EXTENDED_OFFSET_L", "2"),
    ("CAMERASTYLE_EXTENDED_OFFSET_R", "3"),
    ("CAMERASTYLE_HLOCKED", "4"),

    // Tile and text info
    ("TILEINFO_INDEX", "0"),
    ("TILEINFO_DIRECTION", "1"),
    ("TILEINFO_VISUALPLANE", "2"),
    ("TILEINFO_SOLIDITYA", "3"),
    ("TILEINFO_SOLIDITYB", "4"),
    ("TILEINFO_FLAGSA", "5"),
    ("TILEINFO_ANGLEA", "6"),
    ("TILEINFO_FLAGSB", "7"),
    ("TILEINFO_ANGLEB", "8"),
    ("TEXTINFO_TEXTDATA", "0"),
    ("TEXTINFO_TEXTSIZE", "1"),
    ("TEXTINFO_ROWCOUNT", "2"),

    // Tile layers
    ("TILELAYER_NOSCROLL", "0"),
    ("TILELAYER_HSCROLL", "1"),
    ("TILELAYER_VSCROLL", "2"),
    ("TILELAYER_3DFLOOR", "3"),
    ("TILELAYER_3DSKY", "4"),

    // Groups
    ("GROUP_ALL", "0"),

    // Platforms
    ("RETRO_WIN", "0"),
    ("RETRO_OSX", "1"),
    ("RETRO_XBOX_360", "2"),
    ("RETRO_PS3", "3"),
    ("RETRO_iOS", "4"),
    ("RETRO_ANDROID", "5"),
    ("RETRO_WP7", "6"),
    ("RETRO_UWP", "7"),
    ("RETRO_LINUX", "8"),
    ("RETRO_SWITCH", "9"),

    // Screen flips
    ("SCREENFLIP_NONE", "0"),
    ("SCREENFLIP_X", "1"),
    ("SCREENFLIP_Y", "2"),
    ("SCREENFLIP_XY", "3"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::parse_integer;

    #[test]
    fn test_builtin_values_parse() {
        for (name, value) in BUILTIN_ALIASES {
            assert!(parse_integer(value).is_some(), "{name} = {value}");
        }
    }

    #[test]
    fn test_builtin_lookup() {
        let find = |name: &str| BUILTIN_ALIASES.iter().find(|(n, _)| *n == name).map(|(_, v)| *v);
        assert_eq!(find("true"), Some("1"));
        assert_eq!(find("CONTROLMODE_NONE"), Some("-1"));
        assert_eq!(find("RETRO_SWITCH"), Some("9"));
    }
}
