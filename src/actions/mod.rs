//! Action state-machine generators.
//!
//! Every behavior kind implements [`ActionGenerator`]: three emitters producing
//! the *enter*, *continue* and *exit* blocks of a bounded linear transition,
//! plus an optional first-frame *setup* block run on each target.
//!
//! [`ActionGen`] is the dispatch table that selects the generator from the
//! declared [`ActionKind`]. [`instantiate`] resolves targets, validates
//! parameters and binds the generator to its state key, producing an
//! [`ActionInstance`] the driver and the sequencer wire into object logic.
//!
//! Submodules overview:
//! - [`visibility`] – alpha fades
//! - [`movement`] – position and orientation interpolation
//! - [`sound`] – playback start/stop with volume fades
//! - [`timeline`] – run-state changes of a named timeline
//! - [`group`] – fan-out of an object action to group members
//! - [`reset`] – restore the state captured on the first frame
//! - [`toggle`] – enable or disable a named trigger

pub mod group;
pub mod movement;
pub mod reset;
pub mod sound;
pub mod timeline;
pub mod toggle;
pub mod visibility;

use crate::config;
use crate::emit::{ActionKey, Block, Expr, FragmentSet, Stmt};
use crate::error::{ConfigError, check_duration};
use crate::scene::index::Members;
use crate::scene::{Action, ActionKind, ObjectId, SceneIndex};

pub use group::GroupAction;
pub use movement::MoveAction;
pub use reset::ResetAction;
pub use sound::SoundAction;
pub use timeline::TimelineAction;
pub use toggle::ToggleAction;
pub use visibility::VisibilityAction;

/// What a generator knows about the instance it emits for.
#[derive(Debug, Clone)]
pub struct ActionContext {
    /// State namespace of the instance.
    pub key: ActionKey,
    /// Seconds until the target state is reached.
    pub duration: f64,
    /// Host ticks per second, fixed for the compilation.
    pub tick_rate: f64,
}

impl ActionContext {
    pub fn new(key: ActionKey, duration: f64, tick_rate: f64) -> Self {
        Self {
            key,
            duration,
            tick_rate,
        }
    }

    /// Instantaneous actions apply their end state inside enter.
    pub fn is_instant(&self) -> bool {
        self.duration == 0.0
    }

    /// Divisor turning a total change into a per-tick delta.
    pub fn steps(&self) -> f64 {
        config::tick_span(self.duration, self.tick_rate)
    }

    /// Ticks the continue phase runs before exit snaps.
    pub fn ticks(&self) -> u64 {
        config::ticks(self.duration, self.tick_rate)
    }

    /// Read one of this instance's stored values on the current target.
    pub fn stored(&self, field: &str) -> Expr {
        Expr::prop(self.key.field(field))
    }

    /// Store a value on the current target.
    pub fn store(&self, field: &str, value: Expr) -> Stmt {
        Stmt::set(self.key.field(field), value)
    }

    /// `(target - current) / steps`, the per-tick increment towards `target`.
    pub fn per_tick(&self, target: Expr, current: Expr) -> Expr {
        target.sub(current).div(Expr::num(self.steps()))
    }
}

/// The three-phase contract shared by every behavior kind.
///
/// Instantaneous instances (`ctx.is_instant()`) must return their whole effect
/// from [`emit_enter`](Self::emit_enter) and empty continue/exit blocks. Timed
/// instances must return a non-empty exit that snaps to the exact target.
pub trait ActionGenerator {
    /// First-frame statements run on each target before any logic.
    fn emit_setup(&self) -> Block {
        Block::new()
    }
    fn emit_enter(&self, ctx: &ActionContext) -> Block;
    fn emit_continue(&self, ctx: &ActionContext) -> Block;
    fn emit_exit(&self, ctx: &ActionContext) -> Block;

    fn fragments(&self, ctx: &ActionContext) -> FragmentSet {
        FragmentSet {
            enter: self.emit_enter(ctx),
            continue_: self.emit_continue(ctx),
            exit: self.emit_exit(ctx),
        }
    }
}

/// Dispatch table over the generator implementations.
#[derive(Debug, Clone)]
pub enum ActionGen {
    Visibility(VisibilityAction),
    Move(MoveAction),
    Sound(SoundAction),
    Timeline(TimelineAction),
    Group(GroupAction),
    Reset(ResetAction),
    Toggle(ToggleAction),
}

impl ActionGen {
    pub fn generator(&self) -> &dyn ActionGenerator {
        match self {
            ActionGen::Visibility(g) => g,
            ActionGen::Move(g) => g,
            ActionGen::Sound(g) => g,
            ActionGen::Timeline(g) => g,
            ActionGen::Group(g) => g,
            ActionGen::Reset(g) => g,
            ActionGen::Toggle(g) => g,
        }
    }

    /// Generator for a kind that acts on one object's own properties.
    pub fn for_object(
        kind: &ActionKind,
        index: &SceneIndex<'_>,
        context: &str,
    ) -> Result<Self, ConfigError> {
        match kind {
            ActionKind::Visibility { visible } => {
                Ok(ActionGen::Visibility(VisibilityAction::new(*visible)))
            }
            ActionKind::Move {
                placement,
                move_relative,
            } => {
                let action = MoveAction::new(context, placement, *move_relative)?;
                if let Some(reference) = action.reference() {
                    index.require_object(context, reference)?;
                }
                Ok(ActionGen::Move(action))
            }
            ActionKind::Sound { sound, change } => {
                Ok(ActionGen::Sound(SoundAction::new(context, sound, change)?))
            }
            ActionKind::Reset => Ok(ActionGen::Reset(ResetAction)),
            other => Err(ConfigError::Unsupported {
                context: context.to_string(),
                reason: format!("'{}' is not an object action", other.label()),
            }),
        }
    }
}

/// One compiled action: a generator bound to its key, tick count and targets.
///
/// Every target receives the same blocks; state lives in each target's own
/// bag under the shared key.
#[derive(Debug, Clone)]
pub struct ActionInstance {
    pub key: ActionKey,
    pub label: &'static str,
    pub targets: Members,
    pub duration: f64,
    pub ticks: u64,
    pub fragments: FragmentSet,
    pub setup: Block,
}

impl ActionInstance {
    /// Whether the instance runs continue/exit after dispatch.
    pub fn is_timed(&self) -> bool {
        self.duration > 0.0
    }

    /// Statements a dispatcher runs: the enter block on every target, then
    /// activation of the continue phase when the instance is timed.
    pub fn dispatch(&self) -> Block {
        self.targets
            .iter()
            .map(|target| {
                let mut body = self.fragments.enter.clone();
                if self.is_timed() {
                    body.push(Stmt::set(self.key.active(), Expr::num(1.0)));
                    body.push(Stmt::set(self.key.elapsed(), Expr::num(0.0)));
                }
                Stmt::with(target.clone(), body)
            })
            .collect()
    }

    /// Per-target continue: advance while active.
    pub fn continue_block(&self) -> Block {
        if !self.is_timed() {
            return Block::new();
        }
        let elapsed = self.key.elapsed();
        let mut body = self.fragments.continue_.clone();
        body.push(Stmt::set(
            elapsed.clone(),
            Expr::prop(elapsed).add(Expr::num(1.0)),
        ));
        vec![Stmt::when(Expr::prop(self.key.active()).is_set(), body)].into()
    }

    /// Per-target exit: snap once the tick budget is spent.
    pub fn exit_block(&self) -> Block {
        if !self.is_timed() {
            return Block::new();
        }
        let done = Expr::prop(self.key.active())
            .is_set()
            .and(Expr::prop(self.key.elapsed()).ge(Expr::num(self.ticks as f64)));
        let mut body = self.fragments.exit.clone();
        body.push(Stmt::set(self.key.active(), Expr::num(0.0)));
        vec![Stmt::when(done, body)].into()
    }
}

/// Reject a non-zero duration on a kind that is always instantaneous.
fn require_instant(context: &str, duration: f64) -> Result<(), ConfigError> {
    if duration != 0.0 {
        return Err(ConfigError::Unsupported {
            context: context.to_string(),
            reason: "this action is instantaneous; duration must be 0".to_string(),
        });
    }
    Ok(())
}

/// Reject an explicit target on a kind whose target follows from a name.
fn forbid_target(context: &str, action: &Action) -> Result<(), ConfigError> {
    if let Some(target) = &action.target {
        return Err(ConfigError::Unsupported {
            context: context.to_string(),
            reason: format!("explicit target '{}' not allowed here", target),
        });
    }
    Ok(())
}

/// Resolve, validate and bind one action.
///
/// `owner` is the object whose trigger, timeline, or link dispatches the
/// action; it is the default target.
pub fn instantiate(
    action: &Action,
    owner: &str,
    index: &SceneIndex<'_>,
    key: ActionKey,
    tick_rate: f64,
    context: &str,
) -> Result<ActionInstance, ConfigError> {
    let duration = check_duration(context, action.duration)?;

    let (targets, generator): (Members, ActionGen) = match &action.kind {
        ActionKind::Timeline { timeline, change } => {
            forbid_target(context, action)?;
            require_instant(context, duration)?;
            let timeline_owner = index.timeline_owner(context, timeline)?;
            (
                Members::from_iter([timeline_owner.to_string()]),
                ActionGen::Timeline(TimelineAction::new(timeline, *change)),
            )
        }
        ActionKind::TriggerToggle { trigger, enabled } => {
            forbid_target(context, action)?;
            require_instant(context, duration)?;
            let trigger_owner = index.trigger_owner(context, trigger)?;
            (
                Members::from_iter([trigger_owner.to_string()]),
                ActionGen::Toggle(ToggleAction::new(trigger, *enabled)),
            )
        }
        ActionKind::Group { group, action: inner } => {
            forbid_target(context, action)?;
            let members = index.group_members(context, group)?.clone();
            let inner = ActionGen::for_object(inner, index, context)?;
            (
                members.clone(),
                ActionGen::Group(GroupAction::new(group, members, inner)),
            )
        }
        kind => {
            let target: ObjectId = action.target.clone().unwrap_or_else(|| owner.to_string());
            index.require_object(context, &target)?;
            (
                Members::from_iter([target]),
                ActionGen::for_object(kind, index, context)?,
            )
        }
    };

    let ctx = ActionContext::new(key, duration, tick_rate);
    let g = generator.generator();
    Ok(ActionInstance {
        label: action.kind.label(),
        targets,
        duration,
        ticks: ctx.ticks(),
        fragments: g.fragments(&ctx),
        setup: g.emit_setup(),
        key: ctx.key,
    })
}
