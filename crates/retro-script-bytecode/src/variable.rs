//! Script variable namespace
//!
//! Variables are encoded by ordinal, so the order below is part of the
//! bytecode format. Names are matched ASCII case-insensitively when compiling.

use std::sync::OnceLock;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

macro_rules! define_variables {
    ($( $variant:ident => $name:literal; )*) => {
        /// A variable of the script namespace
        ///
        /// Each variant maps to one storage location of the VM or the engine
        /// world; see the interpreter's accessors for read and write behavior.
        #[allow(missing_docs)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u16)]
        pub enum Variable {
            $( $variant, )*
        }

        impl Variable {
            /// Every variable in ordinal order
            pub const ALL: &'static [Variable] = &[$(Variable::$variant),*];

            /// Name used in script source
            pub const fn name(self) -> &'static str {
                match self {
                    $(Variable::$variant => $name,)*
                }
            }
        }
    };
}

define_variables! {
    // ==================== VM registers ====================
    Temp0 => "temp0";
    Temp1 => "temp1";
    Temp2 => "temp2";
    Temp3 => "temp3";
    Temp4 => "temp4";
    Temp5 => "temp5";
    Temp6 => "temp6";
    Temp7 => "temp7";
    Temp8 => "temp8";
    Temp9 => "temp9";
    Temp10 => "temp10";
    CheckResult => "checkResult";
    ArrayPos0 => "arrayPos0";
    ArrayPos1 => "arrayPos1";
    ArrayPos2 => "arrayPos2";
    ArrayPos3 => "arrayPos3";
    ArrayPos4 => "arrayPos4";
    ArrayPos5 => "arrayPos5";
    ArrayPos6 => "arrayPos6";
    ArrayPos7 => "arrayPos7";
    Global => "global";
    Local => "local";

    // ==================== Object properties ====================
    ObjectEntityPos => "object.entityPos";
    ObjectGroupId => "object.groupID";
    ObjectType => "object.type";
    ObjectPropertyValue => "object.propertyValue";
    ObjectXPos => "object.xpos";
    ObjectYPos => "object.ypos";
    ObjectIXPos => "object.ixpos";
    ObjectIYPos => "object.iypos";
    ObjectXVel => "object.xvel";
    ObjectYVel => "object.yvel";
    ObjectSpeed => "object.speed";
    ObjectState => "object.state";
    ObjectRotation => "object.rotation";
    ObjectScale => "object.scale";
    ObjectPriority => "object.priority";
    ObjectDrawOrder => "object.drawOrder";
    ObjectDirection => "object.direction";
    ObjectInkEffect => "object.inkEffect";
    ObjectAlpha => "object.alpha";
    ObjectFrame => "object.frame";
    ObjectAnimation => "object.animation";
    ObjectPrevAnimation => "object.prevAnimation";
    ObjectAnimationSpeed => "object.animationSpeed";
    ObjectAnimationTimer => "object.animationTimer";
    ObjectAngle => "object.angle";
    ObjectLookPosX => "object.lookPosX";
    ObjectLookPosY => "object.lookPosY";
    ObjectCollisionMode => "object.collisionMode";
    ObjectCollisionPlane => "object.collisionPlane";
    ObjectControlMode => "object.controlMode";
    ObjectControlLock => "object.controlLock";
    ObjectPushing => "object.pushing";
    ObjectVisible => "object.visible";
    ObjectTileCollisions => "object.tileCollisions";
    ObjectInteraction => "object.interaction";
    ObjectGravity => "object.gravity";
    ObjectUp => "object.up";
    ObjectDown => "object.down";
    ObjectLeft => "object.left";
    ObjectRight => "object.right";
    ObjectJumpPress => "object.jumpPress";
    ObjectJumpHold => "object.jumpHold";
    ObjectScrollTracking => "object.scrollTracking";
    ObjectFloorSensorL => "object.floorSensorL";
    ObjectFloorSensorC => "object.floorSensorC";
    ObjectFloorSensorR => "object.floorSensorR";
    ObjectFloorSensorLC => "object.floorSensorLC";
    ObjectFloorSensorRC => "object.floorSensorRC";
    ObjectCollisionLeft => "object.collisionLeft";
    ObjectCollisionTop => "object.collisionTop";
    ObjectCollisionRight => "object.collisionRight";
    ObjectCollisionBottom => "object.collisionBottom";
    ObjectOutOfBounds => "object.outOfBounds";
    ObjectSpriteSheet => "object.spriteSheet";

    // ==================== Object values ====================
    ObjectValue0 => "object.value0";
    ObjectValue1 => "object.value1";
    ObjectValue2 => "object.value2";
    ObjectValue3 => "object.value3";
    ObjectValue4 => "object.value4";
    ObjectValue5 => "object.value5";
    ObjectValue6 => "object.value6";
    ObjectValue7 => "object.value7";
    ObjectValue8 => "object.value8";
    ObjectValue9 => "object.value9";
    ObjectValue10 => "object.value10";
    ObjectValue11 => "object.value11";
    ObjectValue12 => "object.value12";
    ObjectValue13 => "object.value13";
    ObjectValue14 => "object.value14";
    ObjectValue15 => "object.value15";
    ObjectValue16 => "object.value16";
    ObjectValue17 => "object.value17";
    ObjectValue18 => "object.value18";
    ObjectValue19 => "object.value19";
    ObjectValue20 => "object.value20";
    ObjectValue21 => "object.value21";
    ObjectValue22 => "object.value22";
    ObjectValue23 => "object.value23";
    ObjectValue24 => "object.value24";
    ObjectValue25 => "object.value25";
    ObjectValue26 => "object.value26";
    ObjectValue27 => "object.value27";
    ObjectValue28 => "object.value28";
    ObjectValue29 => "object.value29";
    ObjectValue30 => "object.value30";
    ObjectValue31 => "object.value31";
    ObjectValue32 => "object.value32";
    ObjectValue33 => "object.value33";
    ObjectValue34 => "object.value34";
    ObjectValue35 => "object.value35";
    ObjectValue36 => "object.value36";
    ObjectValue37 => "object.value37";
    ObjectValue38 => "object.value38";
    ObjectValue39 => "object.value39";
    ObjectValue40 => "object.value40";
    ObjectValue41 => "object.value41";
    ObjectValue42 => "object.value42";
    ObjectValue43 => "object.value43";
    ObjectValue44 => "object.value44";
    ObjectValue45 => "object.value45";
    ObjectValue46 => "object.value46";
    ObjectValue47 => "object.value47";

    // ==================== Stage ====================
    StageState => "stage.state";
    StageActiveList => "stage.activeList";
    StageListPos => "stage.listPos";
    StageTimeEnabled => "stage.timeEnabled";
    StageMilliSeconds => "stage.milliSeconds";
    StageSeconds => "stage.seconds";
    StageMinutes => "stage.minutes";
    StageActNum => "stage.actNum";
    StagePauseEnabled => "stage.pauseEnabled";
    StageListSize => "stage.listSize";
    StageNewXBoundary1 => "stage.newXBoundary1";
    StageNewXBoundary2 => "stage.newXBoundary2";
    StageNewYBoundary1 => "stage.newYBoundary1";
    StageNewYBoundary2 => "stage.newYBoundary2";
    StageCurXBoundary1 => "stage.curXBoundary1";
    StageCurXBoundary2 => "stage.curXBoundary2";
    StageCurYBoundary1 => "stage.curYBoundary1";
    StageCurYBoundary2 => "stage.curYBoundary2";
    StageDeformationData0 => "stage.deformationData0";
    StageDeformationData1 => "stage.deformationData1";
    StageDeformationData2 => "stage.deformationData2";
    StageDeformationData3 => "stage.deformationData3";
    StageWaterLevel => "stage.waterLevel";
    StageActiveLayer => "stage.activeLayer";
    StageMidPoint => "stage.midPoint";
    StagePlayerListPos => "stage.playerListPos";
    StageDebugMode => "stage.debugMode";
    StageEntityPos => "stage.entityPos";

    // ==================== Screen & touch ====================
    ScreenCameraEnabled => "screen.cameraEnabled";
    ScreenCameraTarget => "screen.cameraTarget";
    ScreenCameraStyle => "screen.cameraStyle";
    ScreenCameraX => "screen.cameraX";
    ScreenCameraY => "screen.cameraY";
    ScreenDrawListSize => "screen.drawListSize";
    ScreenXCenter => "screen.xcenter";
    ScreenYCenter => "screen.ycenter";
    ScreenXSize => "screen.xsize";
    ScreenYSize => "screen.ysize";
    ScreenXOffset => "screen.xoffset";
    ScreenYOffset => "screen.yoffset";
    ScreenShakeX => "screen.shakeX";
    ScreenShakeY => "screen.shakeY";
    ScreenAdjustCameraY => "screen.adjustCameraY";
    TouchscreenDown => "touchscreen.down";
    TouchscreenXPos => "touchscreen.xpos";
    TouchscreenYPos => "touchscreen.ypos";

    // ==================== Music ====================
    MusicVolume => "music.volume";
    MusicCurrentTrack => "music.currentTrack";
    MusicPosition => "music.position";

    // ==================== Input ====================
    InputDownUp => "inputDown.up";
    InputDownDown => "inputDown.down";
    InputDownLeft => "inputDown.left";
    InputDownRight => "inputDown.right";
    InputDownButtonA => "inputDown.buttonA";
    InputDownButtonB => "inputDown.buttonB";
    InputDownButtonC => "inputDown.buttonC";
    InputDownButtonX => "inputDown.buttonX";
    InputDownButtonY => "inputDown.buttonY";
    InputDownButtonZ => "inputDown.buttonZ";
    InputDownButtonL => "inputDown.buttonL";
    InputDownButtonR => "inputDown.buttonR";
    InputDownStart => "inputDown.start";
    InputDownSelect => "inputDown.select";
    InputPressUp => "inputPress.up";
    InputPressDown => "inputPress.down";
    InputPressLeft => "inputPress.left";
    InputPressRight => "inputPress.right";
    InputPressButtonA => "inputPress.buttonA";
    InputPressButtonB => "inputPress.buttonB";
    InputPressButtonC => "inputPress.buttonC";
    InputPressButtonX => "inputPress.buttonX";
    InputPressButtonY => "inputPress.buttonY";
    InputPressButtonZ => "inputPress.buttonZ";
    InputPressButtonL => "inputPress.buttonL";
    InputPressButtonR => "inputPress.buttonR";
    InputPressStart => "inputPress.start";
    InputPressSelect => "inputPress.select";

    // ==================== Menus ====================
    Menu1Selection => "menu1.selection";
    Menu2Selection => "menu2.selection";

    // ==================== Tile layers ====================
    TileLayerXSize => "tileLayer.xsize";
    TileLayerYSize => "tileLayer.ysize";
    TileLayerType => "tileLayer.type";
    TileLayerAngle => "tileLayer.angle";
    TileLayerXPos => "tileLayer.xpos";
    TileLayerYPos => "tileLayer.ypos";
    TileLayerZPos => "tileLayer.zpos";
    TileLayerParallaxFactor => "tileLayer.parallaxFactor";
    TileLayerScrollSpeed => "tileLayer.scrollSpeed";
    TileLayerScrollPos => "tileLayer.scrollPos";
    TileLayerDeformationOffset => "tileLayer.deformationOffset";
    TileLayerDeformationOffsetW => "tileLayer.deformationOffsetW";
    HParallaxParallaxFactor => "hParallax.parallaxFactor";
    HParallaxScrollSpeed => "hParallax.scrollSpeed";
    HParallaxScrollPos => "hParallax.scrollPos";
    VParallaxParallaxFactor => "vParallax.parallaxFactor";
    VParallaxScrollSpeed => "vParallax.scrollSpeed";
    VParallaxScrollPos => "vParallax.scrollPos";

    // ==================== 3D scene ====================
    Scene3dVertexCount => "scene3D.vertexCount";
    Scene3dFaceCount => "scene3D.faceCount";
    Scene3dProjectionX => "scene3D.projectionX";
    Scene3dProjectionY => "scene3D.projectionY";
    Scene3dFogColor => "scene3D.fogColor";
    Scene3dFogStrength => "scene3D.fogStrength";
    VertexBufferX => "vertexBuffer.x";
    VertexBufferY => "vertexBuffer.y";
    VertexBufferZ => "vertexBuffer.z";
    VertexBufferU => "vertexBuffer.u";
    VertexBufferV => "vertexBuffer.v";
    FaceBufferA => "faceBuffer.a";
    FaceBufferB => "faceBuffer.b";
    FaceBufferC => "faceBuffer.c";
    FaceBufferD => "faceBuffer.d";
    FaceBufferFlag => "faceBuffer.flag";
    FaceBufferColor => "faceBuffer.color";

    // ==================== Save data ====================
    SaveRam => "saveRAM";

    // ==================== Engine ====================
    EngineState => "engine.state";
    EngineLanguage => "engine.language";
    EngineOnlineActive => "engine.onlineActive";
    EngineSfxVolume => "engine.sfxVolume";
    EngineBgmVolume => "engine.bgmVolume";
    EnginePlatformId => "engine.platformID";
    EngineTrialMode => "engine.trialMode";
    EngineDeviceType => "engine.deviceType";
    EngineTimer => "engine.timer";

    // ==================== Extended object properties ====================
    ObjectValue100 => "object.value100";
    ObjectValue48 => "object.value48";
    ObjectValue49 => "object.value49";
    ObjectValue50 => "object.value50";
    ObjectValue51 => "object.value51";
    ObjectWidth => "object.width";
    ObjectHeight => "object.height";
    ObjectInkRed => "object.inkred";
    ObjectInkGreen => "object.inkgreen";
    ObjectInkBlue => "object.inkblue";

    // ==================== Extended engine state ====================
    Menu3Selection => "menu3.selection";
    CurrentUnix => "current.unix";
    LocalUnix => "local.unix";
}

/// Number of general-purpose `object.valueN` slots addressable by index
pub const OBJECT_VALUE_COUNT: usize = 52;

fn name_index() -> &'static FxHashMap<String, Variable> {
    static INDEX: OnceLock<FxHashMap<String, Variable>> = OnceLock::new();
    INDEX.get_or_init(|| {
        Variable::ALL
            .iter()
            .map(|variable| (variable.name().to_ascii_lowercase(), *variable))
            .collect()
    })
}

impl Variable {
    /// Number of variables in the namespace
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

    /// Look up a variable by source name (ASCII case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        name_index().get(&name.to_ascii_lowercase()).copied()
    }

    /// Slot of `object.valueN`, if this is one of them
    pub fn object_value_slot(self) -> Option<usize> {
        let ordinal = self as usize;
        let first = Self::ObjectValue0 as usize;
        if (first..=Self::ObjectValue47 as usize).contains(&ordinal) {
            return Some(ordinal - first);
        }
        let first = Self::ObjectValue48 as usize;
        if (first..=Self::ObjectValue51 as usize).contains(&ordinal) {
            return Some(48 + ordinal - first);
        }
        None
    }

    /// Index of `tempN`, if this is one of them
    pub fn temp_slot(self) -> Option<usize> {
        let ordinal = self as usize;
        (Self::Temp0 as usize..=Self::Temp10 as usize)
            .contains(&ordinal)
            .then(|| ordinal - Self::Temp0 as usize)
    }

    /// Index of `arrayPosN`, if this is one of them
    pub fn array_position_slot(self) -> Option<usize> {
        let ordinal = self as usize;
        (Self::ArrayPos0 as usize..=Self::ArrayPos7 as usize)
            .contains(&ordinal)
            .then(|| ordinal - Self::ArrayPos0 as usize)
    }

    /// Button index of `inputDown.*`, if this is one of them
    pub fn input_down_slot(self) -> Option<usize> {
        let ordinal = self as usize;
        (Self::InputDownUp as usize..=Self::InputDownSelect as usize)
            .contains(&ordinal)
            .then(|| ordinal - Self::InputDownUp as usize)
    }

    /// Button index of `inputPress.*`, if this is one of them
    pub fn input_press_slot(self) -> Option<usize> {
        let ordinal = self as usize;
        (Self::InputPressUp as usize..=Self::InputPressSelect as usize)
            .contains(&ordinal)
            .then(|| ordinal - Self::InputPressUp as usize)
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_are_stable() {
        assert_eq!(Variable::Temp0.index(), 0);
        assert_eq!(Variable::Local.index(), 21);
        assert_eq!(Variable::ObjectEntityPos.index(), 22);
        assert_eq!(Variable::ObjectState.index(), 33);
        assert_eq!(Variable::ObjectValue0.index(), 76);
        assert_eq!(Variable::StageState.index(), 124);
        assert_eq!(Variable::COUNT, 261);
        assert_eq!(Variable::ALL.last().copied(), Some(Variable::LocalUnix));
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(Variable::from_name("object.state"), Some(Variable::ObjectState));
        assert_eq!(Variable::from_name("Object.State"), Some(Variable::ObjectState));
        assert_eq!(Variable::from_name("scene3D.fogColor"), Some(Variable::Scene3dFogColor));
        assert_eq!(Variable::from_name("object.nothing"), None);
    }

    #[test]
    fn test_object_value_slots() {
        assert_eq!(Variable::ObjectValue0.object_value_slot(), Some(0));
        assert_eq!(Variable::ObjectValue47.object_value_slot(), Some(47));
        assert_eq!(Variable::ObjectValue48.object_value_slot(), Some(48));
        assert_eq!(Variable::ObjectValue51.object_value_slot(), Some(51));
        assert_eq!(Variable::ObjectValue100.object_value_slot(), None);
        assert_eq!(Variable::ObjectState.object_value_slot(), None);
    }

    #[test]
    fn test_register_slots() {
        assert_eq!(Variable::Temp10.temp_slot(), Some(10));
        assert_eq!(Variable::ArrayPos3.array_position_slot(), Some(3));
        assert_eq!(Variable::InputPressStart.input_press_slot(), Some(12));
        assert_eq!(Variable::InputDownUp.input_press_slot(), None);
    }
}
