//! Integration tests: compile scripts and execute them

use chrono::{DateTime, Local, TimeZone};
use proptest::prelude::*;
use retro_script_bytecode::{BytecodeImage, Event, OBJECT_COUNT, Opcode, Program};
use retro_script_compiler::{Compiler, CompilerOptions, NameTables};
use retro_script_vm::world::{PRIORITY_ACTIVE, SCREEN_XSIZE};
use retro_script_vm::{Entity, Host, HostCall, Interpreter, NullHost, VmError, VmResult, World};

const PLAYER: usize = 1;

fn build(source: &str) -> Program {
    let mut compiler = Compiler::new(NameTables::default(), CompilerOptions::default());
    compiler.compile_source("Test.txt", source.as_bytes(), PLAYER);
    match compiler.finish() {
        Ok(program) => program,
        Err(failure) => panic!("compile failed: {:?}", failure.diagnostics),
    }
}

fn world_with_player() -> World {
    let mut world = World::new();
    world.entities[0] = Entity::spawn(PLAYER as i32, 0, 0, 0, PRIORITY_ACTIVE);
    world
}

fn interpreter() -> Interpreter<NullHost> {
    Interpreter::new(NullHost).with_step_limit(100_000)
}

#[test]
fn test_state_machine_advances_once() {
    let mut program = build(
        "event ObjectMain
        if(object.state==0){
            Equal(object.state,1);
        }
        endif
        endevent",
    );
    let mut world = world_with_player();
    let mut vm = interpreter();

    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    assert_eq!(world.entities[0].state, 1);

    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    assert_eq!(world.entities[0].state, 1);
}

#[test]
fn test_if_else_branches() {
    let mut program = build(
        "event ObjectMain
        if(object.state==0)
            object.state=1
        else
            object.state=5
        endif
        temp0=9
        endevent",
    );
    let mut world = world_with_player();
    let mut vm = interpreter();
    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    assert_eq!(world.entities[0].state, 1);
    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    assert_eq!(world.entities[0].state, 5);
    assert_eq!(vm.context().registers.temp[0], 9);
    assert!(vm.context().jump_stack.is_empty());
}

#[test]
fn test_while_loop_accumulates() {
    let mut program = build(
        "event ObjectMain
        temp0=0
        temp1=0
        while(temp0<5)
            temp1+=temp0
            temp0++
        loop
        endevent",
    );
    let mut world = world_with_player();
    let mut vm = interpreter();
    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    assert_eq!(vm.context().registers.temp[0], 5);
    assert_eq!(vm.context().registers.temp[1], 10);
}

const SWITCH: &str = "event ObjectMain
    switch(temp0)
    case 2:
        temp1=20
        break
    case 5:
        temp1=50
        break
    case 7:
        temp1=70
        break
    default:
        temp1=-1
        break
    endswitch
    temp2=1
    endevent";

#[test]
fn test_switch_gap_goes_to_default() {
    let mut program = build(SWITCH);
    let mut world = world_with_player();
    let mut vm = interpreter();

    for (input, expected) in [(2, 20), (4, -1), (5, 50), (7, 70), (8, -1), (-3, -1)] {
        vm.context_mut().registers.temp[0] = input;
        vm.context_mut().registers.temp[2] = 0;
        vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
        assert_eq!(vm.context().registers.temp[1], expected, "input {input}");
        assert_eq!(vm.context().registers.temp[2], 1);
    }
}

#[test]
fn test_foreach_active_visits_group_in_order() {
    let mut program = build(
        "event ObjectMain
        temp0=0
        foreach(2,arrayPos0,ACTIVE_ENTITIES)
            temp0++
            object[arrayPos0].value0=temp0
        next
        endevent",
    );
    let mut world = world_with_player();
    for slot in [30, 10, 20] {
        world.spawn(slot, Entity::spawn(2, 0, 0, 0, PRIORITY_ACTIVE));
    }
    let mut vm = interpreter();
    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();

    assert_eq!(vm.context().registers.temp[0], 3);
    assert_eq!(world.entities[30].values[0], 1);
    assert_eq!(world.entities[10].values[0], 2);
    assert_eq!(world.entities[20].values[0], 3);
    assert_eq!(vm.context().foreach_stack.depth(), 0);
}

#[test]
fn test_foreach_all_scans_by_type() {
    let mut program = build(
        "event ObjectMain
        temp0=0
        foreach(3,arrayPos1,ALL_ENTITIES)
            temp0+=arrayPos1
        next
        endevent",
    );
    let mut world = world_with_player();
    world.entities[5].object_type = 3;
    world.entities[7].object_type = 3;
    let mut vm = interpreter();
    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    assert_eq!(vm.context().registers.temp[0], 12);
}

#[test]
fn test_foreach_over_empty_group_skips_body() {
    let mut program = build(
        "event ObjectMain
        temp0=0
        foreach(9,arrayPos0,ACTIVE_ENTITIES)
            temp0=99
        next
        temp1=1
        endevent",
    );
    let mut world = world_with_player();
    let mut vm = interpreter();
    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    assert_eq!(vm.context().registers.temp[0], 0);
    assert_eq!(vm.context().registers.temp[1], 1);
}

#[test]
fn test_function_call_and_return() {
    let mut program = build(
        "reservefunction AddTen
        event ObjectMain
            temp0=1
            CallFunction(AddTen)
            CallFunction(AddTen)
            temp1=temp0
        endevent
        function AddTen
            temp0+=10
        endfunction",
    );
    let mut world = world_with_player();
    let mut vm = interpreter();
    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    assert_eq!(vm.context().registers.temp[0], 21);
    assert_eq!(vm.context().registers.temp[1], 21);
    assert!(vm.context().call_stack.is_empty());
}

#[test]
fn test_top_level_return_ends_event() {
    let mut program = build(
        "event ObjectMain
        temp0=1
        return
        temp0=2
        endevent",
    );
    let mut world = world_with_player();
    let mut vm = interpreter();
    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    assert_eq!(vm.context().registers.temp[0], 1);
}

#[test]
fn test_unbounded_recursion_overflows_call_stack() {
    let mut program = build(
        "reservefunction Forever
        event ObjectMain
            CallFunction(Forever)
        endevent
        function Forever
            CallFunction(Forever)
        endfunction",
    );
    let mut world = world_with_player();
    let mut vm = interpreter();
    let result = vm.run_event(&mut program, &mut world, 0, Event::Main);
    assert!(matches!(result, Err(VmError::StackOverflow { stack: "call", .. })));
}

#[test]
fn test_step_limit_stops_infinite_loop() {
    let mut program = build(
        "event ObjectMain
        temp0=0
        while(temp0==0)
            temp1++
        loop
        endevent",
    );
    let mut world = world_with_player();
    let mut vm = Interpreter::new(NullHost).with_step_limit(500);
    let result = vm.run_event(&mut program, &mut world, 0, Event::Main);
    assert!(matches!(result, Err(VmError::StepLimitExceeded(500))));
}

#[test]
fn test_statics_and_tables() {
    let mut program = build(
        "privatevalue Timer = 3
        publictable Speeds
        4,8,15
        endtable
        event ObjectMain
        Timer--
        temp0=Timer
        GetTableValue(temp1,2,Speeds)
        GetTableValue(temp2,3,Speeds)
        SetTableValue(16,0,Speeds)
        endevent",
    );
    let mut world = world_with_player();
    let mut vm = interpreter();
    vm.context_mut().registers.temp[2] = -7;
    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    assert_eq!(vm.context().registers.temp[0], 2);
    assert_eq!(vm.context().registers.temp[1], 15);
    assert_eq!(vm.context().registers.temp[2], -7);
    assert_eq!(&program.code[..5], &[2, 3, 16, 8, 15]);
}

#[derive(Default)]
struct RecordingHost {
    calls: Vec<(Opcode, Vec<i32>, String)>,
    printed: Vec<String>,
    volumes: Vec<(i32, i32)>,
    now: Option<DateTime<Local>>,
}

impl Host for RecordingHost {
    fn call(&mut self, call: HostCall<'_>) -> VmResult<()> {
        self.calls
            .push((call.opcode, call.operands.to_vec(), call.text.to_string()));
        if call.opcode == Opcode::GetPaletteEntry {
            call.operands[2] = 0x123456;
        }
        Ok(())
    }

    fn print(&mut self, message: &str) {
        self.printed.push(message.to_string());
    }

    fn volumes_changed(&mut self, bgm_volume: i32, sfx_volume: i32) {
        self.volumes.push((bgm_volume, sfx_volume));
    }

    fn now(&self) -> DateTime<Local> {
        self.now.unwrap_or_else(Local::now)
    }
}

#[test]
fn test_host_receives_forwarded_calls() {
    let mut program = build(
        "event ObjectMain
        PlaySfx(3,0)
        LoadPalette(\"Title.act\",0,0,0,256)
        GetPaletteEntry(0,5,temp3)
        engine.sfxVolume=40
        endevent",
    );
    let mut world = world_with_player();
    let mut vm = Interpreter::new(RecordingHost::default());
    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    assert_eq!(vm.context().registers.temp[3], 0x123456);

    let host = vm.into_host();
    assert_eq!(host.calls.len(), 3);
    assert_eq!(host.calls[0].0, Opcode::PlaySfx);
    assert_eq!(host.calls[0].1, vec![3, 0]);
    assert_eq!(host.calls[1].2, "Title.act");
    assert_eq!(host.volumes, vec![(100, 40)]);
    assert_eq!(world.engine.sfx_volume, 40);
}

#[test]
fn test_print_formats_numbers_and_text() {
    let mut program = build(
        "event ObjectMain
        temp0=21
        Print(\"hello\",0,1)
        Print(temp0,1,0)
        endevent",
    );
    let mut world = world_with_player();
    let mut vm = Interpreter::new(RecordingHost::default());
    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    assert_eq!(vm.host().printed, vec!["hello\n".to_string(), "21".to_string()]);
}

#[test]
fn test_engine_timer_uses_host_clock() {
    let mut program = build(
        "event ObjectMain
        temp0=engine.timer
        temp1=current.unix
        endevent",
    );
    let fixed = Local.with_ymd_and_hms(2024, 5, 17, 13, 45, 30).unwrap();
    let mut world = world_with_player();
    let mut vm = Interpreter::new(RecordingHost {
        now: Some(fixed),
        ..RecordingHost::default()
    });
    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    let expected = (24 << 26) | (5 << 22) | (17 << 17) | (13 << 12) | (45 << 6) | 30;
    assert_eq!(vm.context().registers.temp[0], expected);
    assert_eq!(vm.context().registers.temp[1], fixed.timestamp() as i32);
}

#[test]
fn test_out_of_bounds_and_read_only_variables() {
    let mut program = build(
        "event ObjectMain
        temp0=object.outOfBounds
        screen.xcenter=5
        temp1=screen.xcenter
        object.ixpos=20
        endevent",
    );
    let mut world = world_with_player();
    world.entities[0].xpos = (SCREEN_XSIZE + 0x200) << 16;
    let mut vm = interpreter();
    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    assert_eq!(vm.context().registers.temp[0], 1);
    assert_eq!(vm.context().registers.temp[1], SCREEN_XSIZE / 2);
    assert_eq!(world.entities[0].xpos, 20 << 16);
}

#[test]
fn test_entity_relative_addressing() {
    let mut program = build(
        "event ObjectMain
        object[+1].xpos=object[-1].ypos
        endevent",
    );
    let mut world = World::new();
    world.entities[5] = Entity::spawn(PLAYER as i32, 0, 0, 0, PRIORITY_ACTIVE);
    world.entities[4].ypos = 77;
    let mut vm = interpreter();
    vm.run_event(&mut program, &mut world, 5, Event::Main).unwrap();
    assert_eq!(world.entities[6].xpos, 77);
    assert_eq!(world.entity_pos, 5);
}

#[test]
fn test_image_round_trip_executes_equivalently() {
    let source = "publictable Steps
        3,6,9
        endtable
        reservefunction Bump
        event ObjectMain
        temp0=0
        while(temp0<3)
            GetTableValue(temp1,temp0,Steps)
            object.value1+=temp1
            temp0++
        loop
        CallFunction(Bump)
        endevent
        function Bump
            object.state++
        endfunction";
    let mut original = build(source);
    let image = original.export_image(0, 0, 0..OBJECT_COUNT);
    let bytes = image.to_bytes().unwrap();
    let mut restored = Program::new();
    restored
        .load_image(&BytecodeImage::from_bytes(&bytes).unwrap(), 0)
        .unwrap();

    let mut first = world_with_player();
    let mut second = world_with_player();
    interpreter()
        .run_event(&mut original, &mut first, 0, Event::Main)
        .unwrap();
    interpreter()
        .run_event(&mut restored, &mut second, 0, Event::Main)
        .unwrap();
    assert_eq!(first.entities[0].values[1], 18);
    assert_eq!(first.entities[0].state, 1);
    assert_eq!(first, second);
}

#[test]
fn test_draw_lists_and_tile_layers() {
    let mut program = build(
        "event ObjectMain
        ClearDrawList(2)
        AddDrawListEntityRef(2,17)
        AddDrawListEntityRef(2,23)
        GetDrawListEntityRef(temp0,2,1)
        temp1=screen.drawListSize[2]
        SetTileLayerEntry(99,0,3,4)
        GetTileLayerEntry(temp2,0,3,4)
        endevent",
    );
    let mut world = world_with_player();
    world.draw_lists[2].size = 5;
    let mut vm = interpreter();
    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    assert_eq!(vm.context().registers.temp[0], 23);
    assert_eq!(vm.context().registers.temp[1], 2);
    assert_eq!(vm.context().registers.temp[2], 99);
    assert_eq!(world.tile_layers[0].tiles[3 + 0x100 * 4], 99);
}

#[test]
fn test_bit_and_math_opcodes() {
    let mut program = build(
        "event ObjectMain
        temp0=0
        SetBit(temp0,3,1)
        GetBit(temp1,temp0,3)
        Sin(temp2,128)
        temp3=-5
        Abs(temp3)
        Interpolate(temp4,200,100,128)
        endevent",
    );
    let mut world = world_with_player();
    let mut vm = interpreter();
    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    let temp = vm.context().registers.temp;
    assert_eq!(temp[0], 8);
    assert_eq!(temp[1], 1);
    assert_eq!(temp[2], 512);
    assert_eq!(temp[3], 5);
    assert_eq!(temp[4], 150);
}

#[test]
fn test_extreme_operands_do_not_overflow() {
    let mut program = build(
        "event ObjectMain
        Interpolate(temp0,1,2,0x80000000)
        InterpolateXY(temp1,temp2,0x7FFFFFFF,1,2,0x80000000,0x80000000)
        SetObjectRange(0x7FFFFFFF)
        screen.xoffset=0x80000000
        temp3=object.outOfBounds
        endevent",
    );
    let mut world = world_with_player();
    let mut vm = interpreter();
    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    assert_eq!(world.screen.x_offset, i32::MIN);
    assert_eq!(vm.context().registers.temp[3], 1);
}

#[test]
fn test_stage_folder_check() {
    let mut program = build(
        "event ObjectMain
        CheckCurrentStageFolder(\"Zone01\")
        temp0=checkResult
        endevent",
    );
    let mut world = world_with_player();
    world.stage.folder = "zone01".into();
    let mut vm = interpreter();
    vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();
    assert_eq!(vm.context().registers.temp[0], 1);
}

proptest! {
    #[test]
    fn prop_arithmetic_wraps(a in any::<i32>(), b in any::<i32>()) {
        let mut program = build(
            "event ObjectMain
            temp2=temp0
            temp2+=temp1
            temp3=temp0
            temp3-=temp1
            temp4=temp0
            temp4*=temp1
            endevent",
        );
        let mut world = world_with_player();
        let mut vm = interpreter();
        vm.context_mut().registers.temp[0] = a;
        vm.context_mut().registers.temp[1] = b;
        vm.run_event(&mut program, &mut world, 0, Event::Main).unwrap();

        let temp = &vm.context().registers.temp;
        prop_assert_eq!(temp[2], a.wrapping_add(b));
        prop_assert_eq!(temp[3], a.wrapping_sub(b));
        prop_assert_eq!(temp[4], a.wrapping_mul(b));
    }
}
