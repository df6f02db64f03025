//! Engine state visible to scripts
//!
//! [`World`] is everything a script can read or write through the variable
//! namespace: the entity pool, type groups, global variables and the stage,
//! screen, input, audio, tile layer and 3D scene state. The engine owns it
//! and lends it to the interpreter for each invocation.

use retro_script_bytecode::OBJECT_COUNT;
use retro_script_bytecode::variable::OBJECT_VALUE_COUNT;
use serde::{Deserialize, Serialize};

/// Size of the entity pool
pub const ENTITY_COUNT: usize = 0x4A0;

/// First slot reserved for temporary objects
pub const TEMP_ENTITY_START: usize = ENTITY_COUNT - 0x80;

/// Number of type groups (one per object type plus the collision groups)
pub const TYPE_GROUP_COUNT: usize = 0x103;

/// Number of global variables
pub const GLOBAL_VARIABLE_COUNT: usize = 0x100;

/// Number of tile layers
pub const LAYER_COUNT: usize = 9;

/// Side length of a tile layer in tiles
pub const LAYER_SIZE: usize = 0x100;

/// Number of active tile layer slots
pub const ACTIVE_LAYER_COUNT: usize = 4;

/// Number of draw lists
pub const DRAW_LIST_COUNT: usize = 7;

/// Lines of deformation data per set
pub const DEFORMATION_COUNT: usize = 0x240;

/// Entries per parallax table
pub const PARALLAX_COUNT: usize = 0x100;

/// Vertex buffer size
pub const VERTEX_COUNT: usize = 0x1000;

/// Face buffer size
pub const FACE_COUNT: usize = 0x400;

/// Save RAM size in words
pub const SAVE_RAM_SIZE: usize = 0x2000;

/// Number of touch points
pub const TOUCH_COUNT: usize = 8;

/// Number of text menus
pub const MENU_COUNT: usize = 3;

/// Number of buttons in an input state
pub const BUTTON_COUNT: usize = 14;

/// Default screen width
pub const SCREEN_XSIZE: i32 = 424;

/// Default screen height
pub const SCREEN_YSIZE: i32 = 240;

/// Object type of an empty slot
pub const BLANK_OBJECT: i32 = 0;

/// `stage.state` value of two-player mode
pub const STAGE_MODE_2P: i32 = 4;

/// `object.priority`: active inside the normal bounds
pub const PRIORITY_ACTIVE_BOUNDS: i32 = 0;

/// `object.priority`: always active
pub const PRIORITY_ACTIVE: i32 = 1;

/// `object.priority`: active inside the small bounds
pub const PRIORITY_ACTIVE_BOUNDS_SMALL: i32 = 6;

/// `object.priority`: always active, small bounds
pub const PRIORITY_ACTIVE_SMALL: i32 = 7;

macro_rules! entity_fields {
    ($( $variant:ident => $field:ident; )*) => {
        /// One slot of the entity pool
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct Entity {
            $(
                #[allow(missing_docs)]
                pub $field: i32,
            )*
            /// `object.floorSensorL/C/R/LC/RC`
            pub floor_sensors: [i32; 5],
            /// `object.value0` .. `object.value51`
            pub values: Vec<i32>,
            /// `object.value100`
            pub extra_value: i32,
        }

        impl Default for Entity {
            fn default() -> Self {
                Self {
                    $( $field: 0, )*
                    floor_sensors: [0; 5],
                    values: vec![0; OBJECT_VALUE_COUNT],
                    extra_value: 0,
                }
            }
        }

        impl Entity {
            /// Storage of a plain `object.*` variable
            pub fn field_mut(&mut self, variable: retro_script_bytecode::Variable) -> Option<&mut i32> {
                use retro_script_bytecode::Variable;
                if let Some(slot) = variable.object_value_slot() {
                    return self.values.get_mut(slot);
                }
                match variable {
                    $( Variable::$variant => Some(&mut self.$field), )*
                    Variable::ObjectFloorSensorL => Some(&mut self.floor_sensors[0]),
                    Variable::ObjectFloorSensorC => Some(&mut self.floor_sensors[1]),
                    Variable::ObjectFloorSensorR => Some(&mut self.floor_sensors[2]),
                    Variable::ObjectFloorSensorLC => Some(&mut self.floor_sensors[3]),
                    Variable::ObjectFloorSensorRC => Some(&mut self.floor_sensors[4]),
                    Variable::ObjectValue100 => Some(&mut self.extra_value),
                    _ => None,
                }
            }

            /// Value of a plain `object.*` variable
            pub fn field(&self, variable: retro_script_bytecode::Variable) -> Option<i32> {
                use retro_script_bytecode::Variable;
                if let Some(slot) = variable.object_value_slot() {
                    return self.values.get(slot).copied();
                }
                match variable {
                    $( Variable::$variant => Some(self.$field), )*
                    Variable::ObjectFloorSensorL => Some(self.floor_sensors[0]),
                    Variable::ObjectFloorSensorC => Some(self.floor_sensors[1]),
                    Variable::ObjectFloorSensorR => Some(self.floor_sensors[2]),
                    Variable::ObjectFloorSensorLC => Some(self.floor_sensors[3]),
                    Variable::ObjectFloorSensorRC => Some(self.floor_sensors[4]),
                    Variable::ObjectValue100 => Some(self.extra_value),
                    _ => None,
                }
            }
        }
    };
}

entity_fields! {
    ObjectGroupId => group_id;
    ObjectType => object_type;
    ObjectPropertyValue => property_value;
    ObjectXPos => xpos;
    ObjectYPos => ypos;
    ObjectXVel => xvel;
    ObjectYVel => yvel;
    ObjectSpeed => speed;
    ObjectState => state;
    ObjectRotation => rotation;
    ObjectScale => scale;
    ObjectPriority => priority;
    ObjectDrawOrder => draw_order;
    ObjectDirection => direction;
    ObjectInkEffect => ink_effect;
    ObjectAlpha => alpha;
    ObjectFrame => frame;
    ObjectAnimation => animation;
    ObjectPrevAnimation => prev_animation;
    ObjectAnimationSpeed => animation_speed;
    ObjectAnimationTimer => animation_timer;
    ObjectAngle => angle;
    ObjectLookPosX => look_pos_x;
    ObjectLookPosY => look_pos_y;
    ObjectCollisionMode => collision_mode;
    ObjectCollisionPlane => collision_plane;
    ObjectControlMode => control_mode;
    ObjectControlLock => control_lock;
    ObjectPushing => pushing;
    ObjectVisible => visible;
    ObjectTileCollisions => tile_collisions;
    ObjectInteraction => interaction;
    ObjectGravity => gravity;
    ObjectUp => up;
    ObjectDown => down;
    ObjectLeft => left;
    ObjectRight => right;
    ObjectJumpPress => jump_press;
    ObjectJumpHold => jump_hold;
    ObjectScrollTracking => scroll_tracking;
    ObjectWidth => width;
    ObjectHeight => height;
    ObjectInkRed => ink_red;
    ObjectInkGreen => ink_green;
    ObjectInkBlue => ink_blue;
}

impl Entity {
    /// A freshly spawned entity
    pub fn spawn(object_type: i32, property_value: i32, xpos: i32, ypos: i32, priority: i32) -> Self {
        Self {
            object_type,
            property_value,
            xpos,
            ypos,
            priority,
            draw_order: 3,
            scale: 512,
            interaction: 1,
            visible: 1,
            tile_collisions: 1,
            ..Self::default()
        }
    }
}

/// Entities of one type group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeGroup {
    /// Entity slots in iteration order
    pub entity_refs: Vec<i32>,
}

/// Stage progress and boundaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct StageState {
    pub mode: i32,
    pub active_list: i32,
    pub list_pos: i32,
    /// Number of stages in each list
    pub list_sizes: [i32; 4],
    /// Folder of the current stage
    pub folder: String,
    pub time_enabled: i32,
    pub milliseconds: i32,
    pub seconds: i32,
    pub minutes: i32,
    pub act_num: i32,
    pub pause_enabled: i32,
    pub new_x_boundary1: i32,
    pub new_x_boundary2: i32,
    pub new_y_boundary1: i32,
    pub new_y_boundary2: i32,
    pub cur_x_boundary1: i32,
    pub cur_x_boundary2: i32,
    pub cur_y_boundary1: i32,
    pub cur_y_boundary2: i32,
    /// `stage.deformationData0..3`
    pub deformation: [Vec<i32>; 4],
    pub water_level: i32,
    pub active_layers: [i32; ACTIVE_LAYER_COUNT],
    pub mid_point: i32,
    pub player_list_pos: i32,
    pub debug_mode: i32,
}

impl Default for StageState {
    fn default() -> Self {
        Self {
            mode: 0,
            active_list: 0,
            list_pos: 0,
            list_sizes: [0; 4],
            folder: String::new(),
            time_enabled: 0,
            milliseconds: 0,
            seconds: 0,
            minutes: 0,
            act_num: 0,
            pause_enabled: 0,
            new_x_boundary1: 0,
            new_x_boundary2: 0,
            new_y_boundary1: 0,
            new_y_boundary2: 0,
            cur_x_boundary1: 0,
            cur_x_boundary2: 0,
            cur_y_boundary1: 0,
            cur_y_boundary2: 0,
            deformation: std::array::from_fn(|_| vec![0; DEFORMATION_COUNT]),
            water_level: 0,
            active_layers: [0; ACTIVE_LAYER_COUNT],
            mid_point: 0,
            player_list_pos: 0,
            debug_mode: 0,
        }
    }
}

/// Camera and screen state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ScreenState {
    pub camera_enabled: i32,
    pub camera_target: i32,
    pub camera_style: i32,
    pub camera_x: i32,
    pub camera_y: i32,
    pub x_size: i32,
    pub y_size: i32,
    pub x_offset: i32,
    pub y_offset: i32,
    pub shake_x: i32,
    pub shake_y: i32,
    pub adjust_camera_y: i32,
}

impl Default for ScreenState {
    fn default() -> Self {
        Self {
            camera_enabled: 0,
            camera_target: 0,
            camera_style: 0,
            camera_x: 0,
            camera_y: 0,
            x_size: SCREEN_XSIZE,
            y_size: SCREEN_YSIZE,
            x_offset: 0,
            y_offset: 0,
            shake_x: 0,
            shake_y: 0,
            adjust_camera_y: 0,
        }
    }
}

impl ScreenState {
    /// Horizontal center of the screen
    pub fn x_center(&self) -> i32 {
        self.x_size / 2
    }

    /// Vertical center of the screen
    pub fn y_center(&self) -> i32 {
        self.y_size / 2
    }
}

/// Distances from the camera beyond which objects count as out of bounds
///
/// `x1..y2` are the normal bounds, `x3..y4` the small ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ObjectBorders {
    pub x1: i32,
    pub x2: i32,
    pub x3: i32,
    pub x4: i32,
    pub y1: i32,
    pub y2: i32,
    pub y3: i32,
    pub y4: i32,
}

impl Default for ObjectBorders {
    fn default() -> Self {
        Self {
            x1: 0x80,
            x2: SCREEN_XSIZE + 0x80,
            x3: 0x20,
            x4: SCREEN_XSIZE + 0x20,
            y1: 0x100,
            y2: SCREEN_YSIZE + 0x100,
            y3: 0x80,
            y4: SCREEN_YSIZE + 0x80,
        }
    }
}

impl ObjectBorders {
    /// Recompute the horizontal borders for a screen width
    pub fn set_range(&mut self, width: i32, x_center: i32) {
        let offset = (width >> 1).wrapping_sub(x_center);
        self.x1 = offset.wrapping_add(0x80);
        self.x2 = width.wrapping_add(0x80).wrapping_sub(offset);
        self.x3 = offset.wrapping_add(0x20);
        self.x4 = width.wrapping_add(0x20).wrapping_sub(offset);
    }
}

/// A touch point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct TouchPoint {
    pub down: i32,
    pub x: i32,
    pub y: i32,
}

/// Controller input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    /// Buttons held, in `up, down, left, right, A, B, C, X, Y, Z, L, R, start, select` order
    pub down: [i32; BUTTON_COUNT],
    /// Buttons pressed this frame, same order
    pub press: [i32; BUTTON_COUNT],
    /// Touch points
    pub touches: [TouchPoint; TOUCH_COUNT],
    /// Number of active touch points
    pub touch_count: usize,
}

/// A tile layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct TileLayer {
    pub x_size: i32,
    pub y_size: i32,
    pub kind: i32,
    pub angle: i32,
    pub xpos: i32,
    pub ypos: i32,
    pub zpos: i32,
    pub parallax_factor: i32,
    pub scroll_speed: i32,
    pub scroll_pos: i32,
    pub deformation_offset: i32,
    pub deformation_offset_w: i32,
    /// Chunk indices, row-major with [`LAYER_SIZE`] columns
    pub tiles: Vec<i32>,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self {
            x_size: 0,
            y_size: 0,
            kind: 0,
            angle: 0,
            xpos: 0,
            ypos: 0,
            zpos: 0,
            parallax_factor: 0,
            scroll_speed: 0,
            scroll_pos: 0,
            deformation_offset: 0,
            deformation_offset_w: 0,
            tiles: vec![0; LAYER_SIZE * LAYER_SIZE],
        }
    }
}

/// Per-line parallax tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Parallax {
    pub parallax_factor: Vec<i32>,
    pub scroll_speed: Vec<i32>,
    pub scroll_pos: Vec<i32>,
}

impl Default for Parallax {
    fn default() -> Self {
        Self {
            parallax_factor: vec![0; PARALLAX_COUNT],
            scroll_speed: vec![0; PARALLAX_COUNT],
            scroll_pos: vec![0; PARALLAX_COUNT],
        }
    }
}

/// A 3D vertex
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Vertex {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub u: i32,
    pub v: i32,
}

/// A 3D face
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Face {
    pub a: i32,
    pub b: i32,
    pub c: i32,
    pub d: i32,
    pub flag: i32,
    pub color: i32,
}

/// 3D scene buffers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Scene3d {
    pub vertex_count: i32,
    pub face_count: i32,
    pub projection_x: i32,
    pub projection_y: i32,
    pub fog_color: i32,
    pub fog_strength: i32,
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
}

impl Default for Scene3d {
    fn default() -> Self {
        Self {
            vertex_count: 0,
            face_count: 0,
            projection_x: 136,
            projection_y: 160,
            fog_color: 0,
            fog_strength: 0,
            vertices: vec![Vertex::default(); VERTEX_COUNT],
            faces: vec![Face::default(); FACE_COUNT],
        }
    }
}

/// Music playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct MusicState {
    pub volume: i32,
    pub current_track: i32,
    pub position: i32,
}

impl Default for MusicState {
    fn default() -> Self {
        Self {
            volume: 100,
            current_track: -1,
            position: 0,
        }
    }
}

/// An ordered list of entities drawn on one layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawList {
    /// Entity slots; only the first `size` are drawn
    pub entity_refs: Vec<i32>,
    /// Number of entries in use
    pub size: i32,
}

impl Default for DrawList {
    fn default() -> Self {
        Self {
            entity_refs: vec![0; ENTITY_COUNT],
            size: 0,
        }
    }
}

/// Engine-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct EngineState {
    pub state: i32,
    pub language: i32,
    pub online_active: i32,
    pub sfx_volume: i32,
    pub bgm_volume: i32,
    pub platform_id: i32,
    pub trial_mode: i32,
    pub device_type: i32,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            state: 0,
            language: 0,
            online_active: 0,
            sfx_volume: 100,
            bgm_volume: 100,
            platform_id: 0,
            trial_mode: 0,
            device_type: 0,
        }
    }
}

/// Everything scripts can observe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    /// The entity pool
    pub entities: Vec<Entity>,
    /// Slot of the entity whose script is running
    pub entity_pos: i32,
    /// Type groups
    pub type_groups: Vec<TypeGroup>,
    /// Sprite sheet of each object type
    pub sprite_sheets: Vec<i32>,
    /// Global variables
    pub globals: Vec<i32>,
    /// Stage state
    pub stage: StageState,
    /// Screen state
    pub screen: ScreenState,
    /// Object activity borders
    pub borders: ObjectBorders,
    /// Input state
    pub input: InputState,
    /// `menuN.selection`
    pub menu_selection: [i32; MENU_COUNT],
    /// Tile layers
    pub tile_layers: Vec<TileLayer>,
    /// Horizontal parallax
    pub h_parallax: Parallax,
    /// Vertical parallax
    pub v_parallax: Parallax,
    /// 3D scene
    pub scene: Scene3d,
    /// Music state
    pub music: MusicState,
    /// Save RAM
    pub save_ram: Vec<i32>,
    /// Draw lists
    pub draw_lists: Vec<DrawList>,
    /// Engine settings
    pub engine: EngineState,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create an empty world
    pub fn new() -> Self {
        Self {
            entities: vec![Entity::default(); ENTITY_COUNT],
            entity_pos: 0,
            type_groups: vec![TypeGroup::default(); TYPE_GROUP_COUNT],
            sprite_sheets: vec![0; OBJECT_COUNT],
            globals: vec![0; GLOBAL_VARIABLE_COUNT],
            stage: StageState::default(),
            screen: ScreenState::default(),
            borders: ObjectBorders::default(),
            input: InputState::default(),
            menu_selection: [0; MENU_COUNT],
            tile_layers: vec![TileLayer::default(); LAYER_COUNT],
            h_parallax: Parallax::default(),
            v_parallax: Parallax::default(),
            scene: Scene3d::default(),
            music: MusicState::default(),
            save_ram: vec![0; SAVE_RAM_SIZE],
            draw_lists: vec![DrawList::default(); DRAW_LIST_COUNT],
            engine: EngineState::default(),
        }
    }

    /// Place an entity in a slot and register it with its type group
    pub fn spawn(&mut self, slot: usize, entity: Entity) -> Option<&mut Entity> {
        let group = usize::try_from(entity.object_type).ok();
        let target = self.entities.get_mut(slot)?;
        *target = entity;
        if let Some(group) = group.and_then(|group| self.type_groups.get_mut(group)) {
            group.entity_refs.push(slot as i32);
        }
        self.entities.get_mut(slot)
    }

    /// Rebuild every type group from the entity pool
    pub fn rebuild_type_groups(&mut self) {
        for group in &mut self.type_groups {
            group.entity_refs.clear();
        }
        for (slot, entity) in self.entities.iter().enumerate() {
            if entity.object_type == BLANK_OBJECT {
                continue;
            }
            if let Some(group) = usize::try_from(entity.object_type)
                .ok()
                .and_then(|group| self.type_groups.get_mut(group))
            {
                group.entity_refs.push(slot as i32);
            }
        }
    }

    /// Whether an entity is outside the activity bounds
    ///
    /// In two-player mode the entity must be outside the bounds around both
    /// players (slots 0 and 1).
    pub fn out_of_bounds(&self, slot: usize) -> Option<bool> {
        let entity = self.entities.get(slot)?;
        let small = matches!(
            entity.priority,
            PRIORITY_ACTIVE_BOUNDS_SMALL | PRIORITY_ACTIVE_SMALL
        );
        if self.stage.mode == STAGE_MODE_2P {
            let (half_x, half_y) = if small { (0x180, 0x100) } else { (0x200, 0x180) };
            let outside = |player: &Entity| {
                let x = i64::from(entity.xpos);
                let y = i64::from(entity.ypos);
                let px = i64::from(player.xpos);
                let py = i64::from(player.ypos);
                let dx = i64::from(half_x) << 16;
                let dy = i64::from(half_y) << 16;
                x <= px - dx || x >= px + dx || y <= py - dy || y >= py + dy
            };
            let p1 = self.entities.first().is_none_or(&outside);
            let p2 = self.entities.get(1).is_none_or(&outside);
            return Some(p1 && p2);
        }
        let (left, right, top, bottom) = if small {
            (self.borders.x3, self.borders.x4, self.borders.y3, self.borders.y4)
        } else {
            (self.borders.x1, self.borders.x2, self.borders.y1, self.borders.y2)
        };
        let x = entity.xpos >> 16;
        let y = entity.ypos >> 16;
        let offset_x = self.screen.x_offset;
        let offset_y = self.screen.y_offset;
        Some(
            x <= offset_x.wrapping_sub(left)
                || x >= offset_x.wrapping_add(right)
                || y <= offset_y.wrapping_sub(top)
                || y >= offset_y.wrapping_add(bottom),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retro_script_bytecode::Variable;

    #[test]
    fn test_entity_field_access() {
        let mut entity = Entity::default();
        *entity.field_mut(Variable::ObjectState).unwrap() = 3;
        *entity.field_mut(Variable::ObjectValue49).unwrap() = 9;
        *entity.field_mut(Variable::ObjectFloorSensorRC).unwrap() = 1;
        assert_eq!(entity.state, 3);
        assert_eq!(entity.values[49], 9);
        assert_eq!(entity.field(Variable::ObjectFloorSensorRC), Some(1));
        assert_eq!(entity.field(Variable::ObjectIXPos), None);
        assert_eq!(entity.field(Variable::Temp0), None);
    }

    #[test]
    fn test_spawn_registers_type_group() {
        let mut world = World::new();
        world.spawn(5, Entity::spawn(2, 0, 0, 0, PRIORITY_ACTIVE));
        world.spawn(9, Entity::spawn(2, 0, 0, 0, PRIORITY_ACTIVE));
        assert_eq!(world.type_groups[2].entity_refs, vec![5, 9]);
        world.rebuild_type_groups();
        assert_eq!(world.type_groups[2].entity_refs, vec![5, 9]);
    }

    #[test]
    fn test_out_of_bounds_single_player() {
        let mut world = World::new();
        world.entities[3].xpos = 100 << 16;
        assert_eq!(world.out_of_bounds(3), Some(false));
        world.entities[3].xpos = (SCREEN_XSIZE + 0x80) << 16;
        assert_eq!(world.out_of_bounds(3), Some(true));
        assert_eq!(world.out_of_bounds(ENTITY_COUNT), None);
    }

    #[test]
    fn test_out_of_bounds_two_player_needs_both() {
        let mut world = World::new();
        world.stage.mode = STAGE_MODE_2P;
        world.entities[0].xpos = 0;
        world.entities[1].xpos = 0x1000 << 16;
        world.entities[3].xpos = 0x300 << 16;
        assert_eq!(world.out_of_bounds(3), Some(true));
        world.entities[3].xpos = 0x100 << 16;
        assert_eq!(world.out_of_bounds(3), Some(false));
        world.entities[3].xpos = 0xF00 << 16;
        assert_eq!(world.out_of_bounds(3), Some(false));
    }

    #[test]
    fn test_set_object_range() {
        let mut borders = ObjectBorders::default();
        borders.set_range(400, 200);
        assert_eq!(borders.x1, 0x80);
        assert_eq!(borders.x2, 400 + 0x80);
        assert_eq!(borders.x4, 400 + 0x20);
    }

    #[test]
    fn test_extreme_offsets_wrap() {
        let mut borders = ObjectBorders::default();
        borders.set_range(i32::MAX, i32::MIN);
        assert_eq!(borders.x1, (i32::MAX >> 1).wrapping_sub(i32::MIN).wrapping_add(0x80));

        let mut world = World::new();
        world.entities[3].xpos = 100 << 16;
        world.screen.x_offset = i32::MIN;
        assert!(world.out_of_bounds(3).is_some());
        world.screen.x_offset = i32::MAX;
        world.screen.y_offset = i32::MIN;
        assert!(world.out_of_bounds(3).is_some());
    }
}
