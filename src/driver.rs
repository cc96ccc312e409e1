//! Compilation driver.
//!
//! Walks the scene in depth-first pre-order and wires every generator into
//! per-object enter/continue/exit fragments:
//!
//! - **enter**: first-frame setup (guarded by `__init`), then trigger
//!   evaluation, link actions, and timeline sequencing of the object's own
//!   logic. Dispatches run the dispatched actions' enter blocks inline.
//! - **continue**: advance every active action that targets the object.
//! - **exit**: snap every action targeting the object whose tick budget ran
//!   out.
//!
//! Compilation is a pure function of the scene and the configuration: action
//! keys are numbered in traversal order, and the same input always yields the
//! same output.

use std::collections::BTreeMap;

use log::{debug, info};
use serde::Serialize;

use crate::actions::{ActionInstance, instantiate};
use crate::config::CompilerConfig;
use crate::emit::keys::INIT;
use crate::emit::{ActionKey, Block, Expr, FragmentSet, LuaRenderer, RenderedFragments, Stmt};
use crate::error::{CompileError, ConfigError};
use crate::scene::{Action, HEAD, ObjectId, Scene, SceneIndex, SceneObject};
use crate::sequencer::{CompiledTimeline, SequencedAction, dispatch_order};
use crate::triggers::{TriggerEval, link_block, trigger_block};

/// One action instance as seen by one of its targets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledAction {
    /// State namespace, e.g. `act.3`.
    pub key: String,
    pub kind: &'static str,
    /// Ticks the continue phase runs; `0` for instantaneous actions.
    pub ticks: u64,
    pub fragments: FragmentSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledObject {
    pub id: ObjectId,
    pub fragments: FragmentSet,
    /// Actions targeting this object, in key order.
    pub actions: Vec<CompiledAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledScene {
    pub tick_rate: f64,
    /// Objects in the order the host must run them.
    pub objects: Vec<CompiledObject>,
}

/// Rendered text of one object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedObject {
    pub id: ObjectId,
    #[serde(flatten)]
    pub fragments: RenderedFragments,
}

#[derive(Serialize)]
struct Manifest<'a> {
    tick_rate: f64,
    objects: &'a [RenderedObject],
}

impl CompiledScene {
    pub fn object(&self, id: &str) -> Option<&CompiledObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Ids in run order.
    pub fn ids(&self) -> Vec<&str> {
        self.objects.iter().map(|o| o.id.as_str()).collect()
    }

    /// Object id to rendered text, in run order.
    pub fn render(&self, renderer: &LuaRenderer) -> Vec<RenderedObject> {
        self.objects
            .iter()
            .map(|o| RenderedObject {
                id: o.id.clone(),
                fragments: renderer.render_fragments(&o.fragments),
            })
            .collect()
    }

    /// The rendered scene as a JSON manifest for installation into a host.
    pub fn to_json(&self, renderer: &LuaRenderer) -> Result<String, String> {
        let objects = self.render(renderer);
        serde_json::to_string_pretty(&Manifest {
            tick_rate: self.tick_rate,
            objects: &objects,
        })
        .map_err(|e| format!("Failed to serialize compiled scene: {}", e))
    }
}

/// Logic an object owns, before the per-target blocks are attached.
struct OwnedLogic {
    setup: Block,
    enter: Block,
}

struct Compiler<'s> {
    index: SceneIndex<'s>,
    tick_rate: f64,
    next_key: usize,
    instances: Vec<ActionInstance>,
}

impl<'s> Compiler<'s> {
    fn instantiate_all(
        &mut self,
        actions: &[Action],
        owner: &str,
        context: &str,
    ) -> Result<Vec<ActionInstance>, ConfigError> {
        actions
            .iter()
            .map(|action| self.instantiate(action, owner, context))
            .collect()
    }

    fn instantiate(
        &mut self,
        action: &Action,
        owner: &str,
        context: &str,
    ) -> Result<ActionInstance, ConfigError> {
        let key = ActionKey::new(self.next_key);
        self.next_key += 1;
        let instance = instantiate(action, owner, &self.index, key, self.tick_rate, context)?;
        self.instances.push(instance.clone());
        Ok(instance)
    }

    fn owned_logic(&mut self, object: &SceneObject) -> Result<OwnedLogic, ConfigError> {
        let mut setup = Block::new();
        let mut enter = Block::new();

        for trigger in &object.triggers {
            let context = format!("trigger '{}'", trigger.name);
            let eval = TriggerEval::build(trigger, &self.index, &context)?;
            let dispatch = dispatch_all(&self.instantiate_all(&trigger.actions, &object.id, &context)?);
            enter.push(Stmt::comment(format!(
                "trigger {} ({})",
                trigger.name,
                trigger.condition.label()
            )));
            enter.extend(trigger_block(trigger, &eval, dispatch));
        }

        if !object.actions.is_empty() {
            let context = format!("object '{}' link", object.id);
            let dispatch = dispatch_all(&self.instantiate_all(&object.actions, &object.id, &context)?);
            enter.extend(link_block(dispatch));
        }

        for timeline in &object.timelines {
            let context = format!("timeline '{}'", timeline.name);
            let mut entries = Vec::new();
            for entry in dispatch_order(timeline, &context)? {
                let instance = self.instantiate(&entry.action, &object.id, &context)?;
                entries.push(SequencedAction {
                    start: entry.start,
                    instance,
                });
            }
            let compiled = CompiledTimeline::new(timeline, self.tick_rate, entries);
            setup.extend(compiled.setup());
            enter.extend(compiled.sequence_block());
        }

        Ok(OwnedLogic { setup, enter })
    }
}

fn dispatch_all(instances: &[ActionInstance]) -> Block {
    let mut block = Block::new();
    for instance in instances {
        block.extend(instance.dispatch());
    }
    block
}

/// Reject instances that break the three-phase contract.
fn check_instance(instance: &ActionInstance) -> Result<(), CompileError> {
    let name = format!("{} ({})", instance.key.as_str(), instance.label);
    let f = &instance.fragments;
    if instance.is_timed() {
        if f.exit.is_empty() {
            return Err(CompileError::Invariant(format!(
                "timed action {} has no exit snap",
                name
            )));
        }
    } else {
        if f.enter.is_empty() {
            return Err(CompileError::Invariant(format!(
                "instantaneous action {} has an empty enter",
                name
            )));
        }
        if !f.continue_.is_empty() || !f.exit.is_empty() {
            return Err(CompileError::Invariant(format!(
                "instantaneous action {} has continue or exit logic",
                name
            )));
        }
    }
    Ok(())
}

/// Per-target blocks gathered from every instance that targets an object.
#[derive(Default)]
struct TargetLogic {
    setup: Vec<Block>,
    continue_: Block,
    exit: Block,
    actions: Vec<CompiledAction>,
}

fn guarded_setup(setup: Block) -> Block {
    if setup.is_empty() {
        return Block::new();
    }
    let mut body = setup;
    body.push(Stmt::set(INIT, Expr::num(1.0)));
    vec![Stmt::when(Expr::prop(INIT).equals(Expr::num(0.0)), body)].into()
}

/// Compile a scene into per-object logic.
pub fn compile(scene: &Scene, config: &CompilerConfig) -> Result<CompiledScene, CompileError> {
    config.validate()?;
    let mut compiler = Compiler {
        index: SceneIndex::build(scene)?,
        tick_rate: config.tick_rate,
        next_key: 0,
        instances: Vec::new(),
    };

    // Pass 1: owned logic and dispatch, numbering actions in traversal order.
    let objects = compiler.index.objects().to_vec();
    let mut owned = Vec::with_capacity(objects.len());
    for object in &objects {
        owned.push(compiler.owned_logic(object)?);
    }

    // Pass 2: continue/exit/setup of each action on each of its targets.
    let mut targets: BTreeMap<&str, TargetLogic> = BTreeMap::new();
    for instance in &compiler.instances {
        check_instance(instance)?;
        for target in &instance.targets {
            let logic = targets.entry(target.as_str()).or_default();
            if !instance.setup.is_empty() && !logic.setup.contains(&instance.setup) {
                logic.setup.push(instance.setup.clone());
            }
            logic.continue_.extend(instance.continue_block());
            logic.exit.extend(instance.exit_block());
            logic.actions.push(CompiledAction {
                key: instance.key.as_str().to_string(),
                kind: instance.label,
                ticks: if instance.is_timed() { instance.ticks } else { 0 },
                fragments: instance.fragments.clone(),
            });
        }
    }

    let mut compiled = Vec::new();
    for (object, own) in objects.iter().zip(owned) {
        let target = targets.remove(object.id.as_str());
        if !object.has_logic() && target.is_none() {
            continue;
        }
        compiled.push(assemble(&object.id, own, target.unwrap_or_default()));
    }
    if let Some(head) = targets.remove(HEAD) {
        let own = OwnedLogic {
            setup: Block::new(),
            enter: Block::new(),
        };
        compiled.push(assemble(HEAD, own, head));
    }

    info!(
        "Compiled {} objects with {} actions at {} Hz",
        compiled.len(),
        compiler.instances.len(),
        config.tick_rate
    );
    Ok(CompiledScene {
        tick_rate: config.tick_rate,
        objects: compiled,
    })
}

fn assemble(id: &str, own: OwnedLogic, target: TargetLogic) -> CompiledObject {
    let mut setup = Block::new();
    for block in target.setup {
        setup.extend(block);
    }
    setup.extend(own.setup);

    let mut enter = guarded_setup(setup);
    enter.extend(own.enter);

    debug!(
        "object '{}': {} statements in enter, {} actions targeting it",
        id,
        enter.stmts().len(),
        target.actions.len()
    );
    CompiledObject {
        id: id.to_string(),
        fragments: FragmentSet {
            enter,
            continue_: target.continue_,
            exit: target.exit,
        },
        actions: target.actions,
    }
}
