//! Lua host.
//!
//! Runs the rendered text of a compiled scene inside a Lua VM, the way an
//! engine with an embedded Lua runtime would install it. Every object gets a
//! property table whose absent keys read as `0`, and every non-empty fragment
//! is loaded once as a chunk whose environment binds `o` to that table and
//! falls back to the shared globals (`scene`, `host`, `math`).
//!
//! Host calls made by the fragments are queued in the VM's app data and
//! drained by the caller, like the command queues of an engine's Lua API.

use std::cell::{Cell, RefCell};

use log::{debug, info};
use mlua::prelude::*;

use crate::driver::CompiledScene;
use crate::emit::keys::{CLICKED, FORWARD, POSITION};
use crate::emit::{HostCall, LuaRenderer, Phase};
use crate::host::components::PropertyBag;
use crate::host::resources::HostCommand;
use crate::host::{seed_bag, seed_head};
use crate::scene::{HEAD, Scene};

/// Shared state reachable from Lua closures.
struct LuaHostData {
    frame: Cell<u64>,
    commands: RefCell<Vec<HostCommand>>,
}

/// Globals every fragment can see.
const PRELUDE: &str = r#"
scene = {}
ids = {}

local defaults = { __index = function() return 0 end }

function __add_object(id)
    local o = setmetatable({}, defaults)
    scene[id] = o
    ids[o] = id
    return o
end

host = {
    play_sound = function(o, name) __host_call("play", ids[o], name) end,
    stop_sound = function(o, name) __host_call("stop", ids[o], name) end,
}

-- forward is the rotated +Y axis; the head's is set by the host
function __sync_forward()
    for id, o in pairs(scene) do
        if id ~= "head" then
            local w, x = o["orientation.w"], o["orientation.x"]
            local y, z = o["orientation.y"], o["orientation.z"]
            local n = w * w + x * x + y * y + z * z
            if n == 0 then
                w, n = 1, 1
            end
            o["forward.x"] = 2 * (x * y - w * z) / n
            o["forward.y"] = (w * w - x * x + y * y - z * z) / n
            o["forward.z"] = 2 * (y * z + w * x) / n
        end
    end
end

function __clear_clicks()
    for _, o in pairs(scene) do
        if o["clicked"] ~= 0 then
            o["clicked"] = 0
        end
    end
end
"#;

/// Loaded chunks of one object; `None` where the fragment is empty.
struct LuaObject {
    id: String,
    enter: Option<LuaFunction>,
    continue_: Option<LuaFunction>,
    exit: Option<LuaFunction>,
}

impl LuaObject {
    fn chunk(&self, phase: Phase) -> Option<&LuaFunction> {
        match phase {
            Phase::Enter => self.enter.as_ref(),
            Phase::Continue => self.continue_.as_ref(),
            Phase::Exit => self.exit.as_ref(),
        }
    }
}

pub struct LuaHost {
    lua: Lua,
    objects: Vec<LuaObject>,
    frame: u64,
}

impl LuaHost {
    /// Create the VM, spawn the scene's bags and load every fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if a fragment fails to compile.
    pub fn new(
        scene: &Scene,
        compiled: &CompiledScene,
        renderer: &LuaRenderer,
    ) -> LuaResult<Self> {
        let lua = Lua::new();
        lua.set_app_data(LuaHostData {
            frame: Cell::new(0),
            commands: RefCell::new(Vec::new()),
        });
        Self::register_host_api(&lua)?;
        lua.load(PRELUDE).set_name("prelude").exec()?;

        let mut host = Self {
            lua,
            objects: Vec::new(),
            frame: 0,
        };
        for object in scene.walk() {
            host.add_object(&object.id, &seed_bag(object))?;
        }
        host.add_object(HEAD, &seed_head())?;

        for rendered in compiled.render(renderer) {
            let env = host.environment(&rendered.id)?;
            let f = &rendered.fragments;
            let object = LuaObject {
                enter: host.load_chunk(&rendered.id, Phase::Enter, &f.enter, &env)?,
                continue_: host.load_chunk(&rendered.id, Phase::Continue, &f.continue_, &env)?,
                exit: host.load_chunk(&rendered.id, Phase::Exit, &f.exit, &env)?,
                id: rendered.id,
            };
            host.objects.push(object);
        }
        info!("Lua host ready: {} objects with logic", host.objects.len());
        Ok(host)
    }

    fn register_host_api(lua: &Lua) -> LuaResult<()> {
        let host_call = lua.create_function(
            |lua, (kind, object, sound): (String, Option<String>, String)| {
                let data = lua
                    .app_data_ref::<LuaHostData>()
                    .ok_or_else(|| LuaError::runtime("LuaHostData not found"))?;
                let call = match kind.as_str() {
                    "play" => HostCall::PlaySound(sound),
                    "stop" => HostCall::StopSound(sound),
                    other => {
                        return Err(LuaError::runtime(format!("unknown host call '{}'", other)));
                    }
                };
                let object = object.unwrap_or_default();
                debug!(target: "lua", "frame {}: {} {:?}", data.frame.get(), object, call);
                data.commands.borrow_mut().push(HostCommand {
                    frame: data.frame.get(),
                    object,
                    call,
                });
                Ok(())
            },
        )?;
        lua.globals().set("__host_call", host_call)
    }

    fn add_object(&self, id: &str, bag: &PropertyBag) -> LuaResult<()> {
        let add: LuaFunction = self.lua.globals().get("__add_object")?;
        let table: LuaTable = add.call(id)?;
        for (key, value) in bag.get_values() {
            table.set(key.as_str(), *value)?;
        }
        Ok(())
    }

    /// `{ o = scene[id] }` falling back to the globals.
    fn environment(&self, id: &str) -> LuaResult<LuaTable> {
        let env = self.lua.create_table()?;
        env.set("o", self.bag(id)?)?;
        let meta = self.lua.create_table()?;
        meta.set("__index", self.lua.globals())?;
        env.set_metatable(Some(meta))?;
        Ok(env)
    }

    fn load_chunk(
        &self,
        id: &str,
        phase: Phase,
        text: &str,
        env: &LuaTable,
    ) -> LuaResult<Option<LuaFunction>> {
        if text.is_empty() {
            return Ok(None);
        }
        self.lua
            .load(text)
            .set_name(format!("{}:{}", id, phase.name()))
            .set_environment(env.clone())
            .into_function()
            .map(Some)
    }

    fn bag(&self, id: &str) -> LuaResult<LuaTable> {
        let scene: LuaTable = self.lua.globals().get("scene")?;
        scene
            .get::<Option<LuaTable>>(id)?
            .ok_or_else(|| LuaError::runtime(format!("unknown object '{}'", id)))
    }

    /// Run one frame: forward sync, every enter, every continue, every exit,
    /// then clear clicks.
    pub fn run_frame(&mut self) -> LuaResult<()> {
        self.frame += 1;
        if let Some(data) = self.lua.app_data_ref::<LuaHostData>() {
            data.frame.set(self.frame);
        }
        let globals = self.lua.globals();
        globals.get::<LuaFunction>("__sync_forward")?.call::<()>(())?;
        for phase in Phase::ALL {
            for object in &self.objects {
                if let Some(chunk) = object.chunk(phase) {
                    chunk.call::<()>(())?;
                }
            }
        }
        globals.get::<LuaFunction>("__clear_clicks")?.call::<()>(())
    }

    pub fn run_frames(&mut self, frames: u64) -> LuaResult<()> {
        for _ in 0..frames {
            self.run_frame()?;
        }
        Ok(())
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Ids of the objects with logic, in run order.
    pub fn ids(&self) -> Vec<&str> {
        self.objects.iter().map(|o| o.id.as_str()).collect()
    }

    pub fn get(&self, id: &str, key: &str) -> LuaResult<f64> {
        self.bag(id)?.get(key)
    }

    pub fn set(&self, id: &str, key: &str, value: f64) -> LuaResult<()> {
        self.bag(id)?.set(key, value)
    }

    pub fn set_position(&self, id: &str, position: [f64; 3]) -> LuaResult<()> {
        let bag = self.bag(id)?;
        for (k, v) in POSITION.iter().zip(position) {
            bag.set(*k, v)?;
        }
        Ok(())
    }

    /// Turn the head to face `direction`, normalized.
    pub fn look(&self, direction: [f64; 3]) -> LuaResult<()> {
        let forward = glam::DVec3::from_array(direction)
            .try_normalize()
            .ok_or_else(|| LuaError::runtime("zero look direction"))?;
        let head = self.bag(HEAD)?;
        for (k, v) in FORWARD.iter().zip(forward.to_array()) {
            head.set(*k, v)?;
        }
        Ok(())
    }

    pub fn click(&self, id: &str) -> LuaResult<()> {
        self.set(id, CLICKED, 1.0)
    }

    /// Take the host calls queued since the last drain.
    pub fn drain_commands(&self) -> Vec<HostCommand> {
        self.lua
            .app_data_ref::<LuaHostData>()
            .map(|data| data.commands.borrow_mut().drain(..).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use crate::driver::compile;
    use crate::host::SceneHost;
    use crate::scene::{Action, SceneObject, SoundChange};

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn lua_host(scene: &Scene, rate: f64) -> LuaHost {
        let compiled = compile(scene, &CompilerConfig::new().with_tick_rate(rate)).unwrap();
        LuaHost::new(scene, &compiled, &LuaRenderer::default()).unwrap()
    }

    #[test]
    fn test_bags_default_to_zero() {
        let scene = Scene::new().with_object(SceneObject::new("lamp").with_position([1.0, 0.0, 0.0]));
        let host = lua_host(&scene, 60.0);
        assert_eq!(host.get("lamp", "position.x").unwrap(), 1.0);
        assert_eq!(host.get("lamp", "anything").unwrap(), 0.0);
        assert!(host.get("ghost", "alpha").is_err());
    }

    #[test]
    fn test_forward_synced_from_orientation() {
        let half = std::f64::consts::FRAC_PI_4;
        let mut lamp = SceneObject::new("lamp");
        lamp.orientation = [half.cos(), 0.0, 0.0, half.sin()];
        let scene = Scene::new().with_object(lamp);
        let mut host = lua_host(&scene, 60.0);
        host.run_frame().unwrap();
        assert!(approx_eq(host.get("lamp", "forward.x").unwrap(), -1.0));
        assert!(approx_eq(host.get("lamp", "forward.y").unwrap(), 0.0));
        assert_eq!(host.get(HEAD, "forward.y").unwrap(), 1.0);
    }

    #[test]
    fn test_click_sound_commands() {
        let scene = Scene::new().with_object(
            SceneObject::new("radio")
                .with_link_action(Action::sound("hum", SoundChange::Start { volume: 0.5 }, 0.0)),
        );
        let mut host = lua_host(&scene, 60.0);
        host.click("radio").unwrap();
        host.run_frame().unwrap();
        let commands = host.drain_commands();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].object, "radio");
        assert_eq!(commands[0].call, HostCall::PlaySound("hum".into()));
        assert_eq!(commands[0].frame, 1);
        assert!(host.drain_commands().is_empty());
        assert_eq!(host.get("radio", "clicked").unwrap(), 0.0);
    }

    #[test]
    fn test_matches_reference_host() {
        let scene = Scene::new().with_object(
            SceneObject::new("ghost")
                .with_visible(false)
                .with_link_action(Action::visibility(true, 0.3))
                .with_link_action(Action::reset(0.5).with_target("ghost")),
        );
        let compiled = compile(&scene, &CompilerConfig::new().with_tick_rate(20.0)).unwrap();
        let mut reference = SceneHost::new(&scene, &compiled);
        let mut lua = LuaHost::new(&scene, &compiled, &LuaRenderer::new(2, 1)).unwrap();
        reference.click("ghost");
        lua.click("ghost").unwrap();
        for _ in 0..12 {
            reference.run_frame();
            lua.run_frame().unwrap();
            for key in ["alpha", "visible", "act.0.active", "act.1.elapsed"] {
                assert!(approx_eq(
                    reference.get("ghost", key),
                    lua.get("ghost", key).unwrap()
                ));
            }
        }
    }
}
