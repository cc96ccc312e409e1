//! The rendered Lua text and the reference host must agree frame by frame.

#![cfg(feature = "lua")]

use scenelogic::driver::compile;
use scenelogic::emit::LuaRenderer;
use scenelogic::host::SceneHost;
use scenelogic::lua_host::LuaHost;
use scenelogic::scene::{HEAD, Scene};
use scenelogic::CompilerConfig;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

const WATCHED: &[(&str, &str)] = &[
    ("door", "alpha"),
    ("door", "visible"),
    ("door", "orientation.w"),
    ("door", "orientation.z"),
    ("door", "sound.creak.volume"),
    ("door", "sound.creak.playing"),
    ("door", "trig.near_door.prev"),
    ("door", "trig.leave_room.state"),
    ("door", "tl.opening.running"),
    ("lamp_left", "alpha"),
    ("lamp_right", "visible"),
];

/// Head path of the walkthrough: outside, at the door, out of the room.
fn head_at(frame: u64) -> [f64; 3] {
    match frame {
        0..=4 => [0.0, 0.0, 0.0],
        5..=119 => [0.0, 3.0, 0.0],
        _ => [20.0, 0.0, 0.0],
    }
}

#[test]
fn door_walkthrough_matches_reference_host() {
    let scene = Scene::from_json(include_str!("../demos/door.json")).unwrap();
    let compiled = compile(&scene, &CompilerConfig::new().with_tick_rate(60.0)).unwrap();
    let mut reference = SceneHost::new(&scene, &compiled);
    let mut lua = LuaHost::new(&scene, &compiled, &LuaRenderer::new(2, 1)).unwrap();
    let mut lua_commands = Vec::new();

    for frame in 0..260 {
        reference.set_position(HEAD, head_at(frame));
        lua.set_position(HEAD, head_at(frame)).unwrap();
        if frame == 200 {
            reference.click("switch");
            lua.click("switch").unwrap();
        }
        reference.run_frame();
        lua.run_frame().unwrap();
        lua_commands.extend(lua.drain_commands());

        for (id, key) in WATCHED {
            let expected = reference.get(id, key);
            let actual = lua.get(id, key).unwrap();
            assert!(
                approx_eq(expected, actual),
                "frame {}: {}:{} reference {} lua {}",
                reference.frame(),
                id,
                key,
                expected,
                actual
            );
        }
    }

    assert_eq!(lua.frame(), reference.frame());
    assert_eq!(lua_commands, reference.commands());
}

#[test]
fn lua_host_loads_objects_in_run_order() {
    let scene = Scene::from_json(include_str!("../demos/door.json")).unwrap();
    let compiled = compile(&scene, &CompilerConfig::new()).unwrap();
    let lua = LuaHost::new(&scene, &compiled, &LuaRenderer::default()).unwrap();
    assert_eq!(lua.ids(), compiled.ids());
    // objects without logic still get a bag
    assert_eq!(lua.get("hall", "visible").unwrap(), 1.0);
    assert_eq!(lua.get(HEAD, "forward.y").unwrap(), 1.0);
}
