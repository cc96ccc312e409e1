//! Movement: position and orientation interpolation.
//!
//! Positions move linearly. Absolute targets are resolved at dispatch time
//! (a reference object's position is read when the action starts) and stored
//! with the per-tick delta; relative moves store the end position and add a
//! constant per-tick offset.
//!
//! Orientations are unit quaternions stored as `orientation.w|x|y|z`.
//!
//! - Absolute rotations ([`Rotation::Axis`] or [`Rotation::Normal`] without
//!   `move_relative`, and [`Rotation::LookAt`]) are computed here with `glam`
//!   and interpolated component-wise along the shorter arc; the sign is chosen
//!   at dispatch.
//! - Relative rotations apply a constant per-tick quaternion `dq` as
//!   `q = dq * q` and snap to `R * q_start` on exit. A relative normal turns
//!   by the arc from +X to `normal`.
//!
//! A relative look-at is rejected: its facing depends on the position reached
//! at run time, which the emitted arithmetic cannot turn into a quaternion.
//!
//! Intermediate orientations of an absolute rotation are not renormalized;
//! hosts normalize before use. Every path ends on an exact snap.

use glam::{DMat3, DQuat, DVec3};

use super::{ActionContext, ActionGenerator};
use crate::emit::keys::{AXES, ORIENTATION, POSITION, QUAT};
use crate::emit::{Block, Expr, Stmt, vector};
use crate::error::{ConfigError, check_finite_vec};
use crate::scene::{ObjectId, Placement, RelativeTo, Rotation};

/// Below this, a look direction counts as parallel to `up`.
const PARALLEL_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
enum Translation {
    None,
    /// `offset`, plus the reference object's position when given.
    Absolute {
        offset: [f64; 3],
        reference: Option<ObjectId>,
    },
    Relative([f64; 3]),
}

#[derive(Debug, Clone)]
enum Turn {
    None,
    Absolute(DQuat),
    Relative { axis: DVec3, angle: f64 },
}

#[derive(Debug, Clone)]
pub struct MoveAction {
    translation: Translation,
    turn: Turn,
}

fn unsupported(context: &str, reason: &str) -> ConfigError {
    ConfigError::Unsupported {
        context: context.to_string(),
        reason: reason.to_string(),
    }
}

fn unit(context: &str, parameter: &'static str, v: [f64; 3]) -> Result<DVec3, ConfigError> {
    let v = DVec3::from(check_finite_vec(context, parameter, v)?);
    if v.length_squared() == 0.0 {
        return Err(ConfigError::ZeroVector {
            context: context.to_string(),
            parameter,
        });
    }
    Ok(v.normalize())
}

/// Orientation whose +Y axis faces from `from` towards `point`, with `up` as
/// the reference up direction.
fn look_rotation(
    context: &str,
    from: [f64; 3],
    point: [f64; 3],
    up: [f64; 3],
) -> Result<DQuat, ConfigError> {
    let point = DVec3::from(check_finite_vec(context, "point", point)?);
    let facing = unit(context, "point", (point - DVec3::from(from)).to_array())?;
    let up = unit(context, "up", up)?;
    let side = facing.cross(up);
    if side.length() < PARALLEL_EPSILON {
        return Err(unsupported(context, "look direction is parallel to up"));
    }
    let side = side.normalize();
    let back = side.cross(facing);
    Ok(DQuat::from_mat3(&DMat3::from_cols(side, facing, back)).normalize())
}

fn quat_components(q: DQuat) -> [f64; 4] {
    [q.w, q.x, q.y, q.z]
}

/// Hamilton product `a * b` over `(w, x, y, z)` expressions.
fn hamilton(a: &[Expr; 4], b: &[Expr; 4]) -> [Expr; 4] {
    let m = |i: usize, j: usize| a[i].clone().mul(b[j].clone());
    [
        m(0, 0).sub(m(1, 1)).sub(m(2, 2)).sub(m(3, 3)),
        m(0, 1).add(m(1, 0)).add(m(2, 3)).sub(m(3, 2)),
        m(0, 2).sub(m(1, 3)).add(m(2, 0)).add(m(3, 1)),
        m(0, 3).add(m(1, 2)).sub(m(2, 1)).add(m(3, 0)),
    ]
}

fn orientation() -> [Expr; 4] {
    ORIENTATION.map(Expr::prop)
}

fn set_orientation(values: [Expr; 4]) -> Block {
    ORIENTATION
        .iter()
        .zip(values)
        .map(|(k, v)| Stmt::set(*k, v))
        .collect()
}

/// Bind the current orientation to locals, then write `rotation * q`.
fn rotate_current(rotation: DQuat) -> Block {
    let locals = QUAT.map(|c| Expr::local(format!("q{c}")));
    let mut block: Block = QUAT
        .iter()
        .zip(ORIENTATION)
        .map(|(c, k)| Stmt::local(format!("q{c}"), Expr::prop(k)))
        .collect();
    let r = quat_components(rotation).map(Expr::num);
    block.extend(set_orientation(hamilton(&r, &locals)));
    block
}

impl MoveAction {
    pub fn new(
        context: &str,
        placement: &Placement,
        move_relative: bool,
    ) -> Result<Self, ConfigError> {
        let translation = match placement.position {
            None => Translation::None,
            Some(p) => {
                let p = check_finite_vec(context, "position", p)?;
                match (&placement.relative_to, move_relative) {
                    (RelativeTo::Center, true) => Translation::Relative(p),
                    (RelativeTo::Object(_), true) => {
                        return Err(unsupported(
                            context,
                            "relative moves take no reference object",
                        ));
                    }
                    (RelativeTo::Center, false) => Translation::Absolute {
                        offset: p,
                        reference: None,
                    },
                    (RelativeTo::Object(id), false) => Translation::Absolute {
                        offset: p,
                        reference: Some(id.clone()),
                    },
                }
            }
        };

        let turn = match &placement.rotation {
            Rotation::None => Turn::None,
            Rotation::Axis { axis, angle } => {
                if !angle.is_finite() {
                    return Err(ConfigError::InvalidParameter {
                        context: context.to_string(),
                        parameter: "angle",
                        value: *angle,
                    });
                }
                let axis = unit(context, "axis", *axis)?;
                let angle = angle.to_radians();
                if move_relative {
                    Turn::Relative { axis, angle }
                } else {
                    Turn::Absolute(DQuat::from_axis_angle(axis, angle))
                }
            }
            Rotation::Normal { normal } => {
                let arc = DQuat::from_rotation_arc(DVec3::X, unit(context, "normal", *normal)?);
                if move_relative {
                    let (axis, angle) = arc.to_axis_angle();
                    Turn::Relative { axis, angle }
                } else {
                    Turn::Absolute(arc)
                }
            }
            Rotation::LookAt { point, up } => {
                if move_relative {
                    return Err(unsupported(context, "look-at rotations cannot be relative"));
                }
                let from = match (&translation, placement.position) {
                    (Translation::Absolute { reference: None, .. }, Some(p)) => p,
                    _ => {
                        return Err(unsupported(
                            context,
                            "look-at needs an absolute position relative to the center",
                        ));
                    }
                };
                Turn::Absolute(look_rotation(context, from, *point, *up)?)
            }
        };

        if matches!((&translation, &turn), (Translation::None, Turn::None)) {
            return Err(unsupported(
                context,
                "movement changes neither position nor rotation",
            ));
        }
        Ok(Self { translation, turn })
    }

    /// Reference object read at dispatch, if any.
    pub fn reference(&self) -> Option<&str> {
        match &self.translation {
            Translation::Absolute {
                reference: Some(id),
                ..
            } => Some(id),
            _ => None,
        }
    }

    /// Absolute target position, as read at dispatch.
    fn absolute_target(offset: [f64; 3], reference: &Option<ObjectId>) -> vector::Vec3Expr {
        match reference {
            None => vector::constant(offset),
            Some(id) => vector::add(vector::position_of(id), vector::constant(offset)),
        }
    }

    fn field(prefix: &str, component: &str) -> String {
        format!("{prefix}{component}")
    }

    fn stored_position(ctx: &ActionContext) -> Block {
        POSITION
            .iter()
            .zip(AXES)
            .map(|(k, c)| Stmt::set(*k, ctx.stored(&Self::field("t", c))))
            .collect()
    }

    fn enter_timed(&self, ctx: &ActionContext) -> Block {
        let mut block = Block::new();
        match &self.translation {
            Translation::None => {}
            Translation::Absolute { offset, reference } => {
                let target = Self::absolute_target(*offset, reference);
                for (c, t) in AXES.iter().zip(target) {
                    block.push(ctx.store(&Self::field("t", c), t));
                }
                for (k, c) in POSITION.iter().zip(AXES) {
                    block.push(ctx.store(
                        &Self::field("d", c),
                        ctx.per_tick(ctx.stored(&Self::field("t", c)), Expr::prop(*k)),
                    ));
                }
            }
            Translation::Relative(offset) => {
                for ((k, c), o) in POSITION.iter().zip(AXES).zip(offset) {
                    block.push(ctx.store(
                        &Self::field("t", c),
                        Expr::prop(*k).add(Expr::num(*o)),
                    ));
                    block.push(ctx.store(&Self::field("d", c), Expr::num(o / ctx.steps())));
                }
            }
        }
        match &self.turn {
            Turn::None => {}
            Turn::Absolute(q) => {
                let target = quat_components(*q);
                let dot = orientation()
                    .into_iter()
                    .zip(target)
                    .map(|(cur, t)| cur.mul(Expr::num(t)))
                    .reduce(Expr::add)
                    .unwrap_or(Expr::num(0.0));
                block.push(Stmt::local(
                    "s",
                    Expr::select(dot.lt(Expr::num(0.0)), Expr::num(-1.0), Expr::num(1.0)),
                ));
                for (c, t) in QUAT.iter().zip(target) {
                    block.push(ctx.store(
                        &Self::field("q", c),
                        Expr::local("s").mul(Expr::num(t)),
                    ));
                }
                for (k, c) in ORIENTATION.iter().zip(QUAT) {
                    block.push(ctx.store(
                        &Self::field("dq", c),
                        ctx.per_tick(ctx.stored(&Self::field("q", c)), Expr::prop(*k)),
                    ));
                }
            }
            Turn::Relative { .. } => {
                for (k, c) in ORIENTATION.iter().zip(QUAT) {
                    block.push(ctx.store(&Self::field("q0", c), Expr::prop(*k)));
                }
            }
        }
        block
    }

    fn enter_instant(&self) -> Block {
        let mut block = Block::new();
        match &self.translation {
            Translation::None => {}
            Translation::Absolute { offset, reference } => {
                let target = Self::absolute_target(*offset, reference);
                for (k, t) in POSITION.iter().zip(target) {
                    block.push(Stmt::set(*k, t));
                }
            }
            Translation::Relative(offset) => {
                for (k, o) in POSITION.iter().zip(offset) {
                    block.push(Stmt::set(*k, Expr::prop(*k).add(Expr::num(*o))));
                }
            }
        }
        match &self.turn {
            Turn::None => {}
            Turn::Absolute(q) => {
                block.extend(set_orientation(quat_components(*q).map(Expr::num)));
            }
            Turn::Relative { axis, angle } => {
                block.extend(rotate_current(DQuat::from_axis_angle(*axis, *angle)));
            }
        }
        block
    }
}

impl ActionGenerator for MoveAction {
    fn emit_enter(&self, ctx: &ActionContext) -> Block {
        if ctx.is_instant() {
            self.enter_instant()
        } else {
            self.enter_timed(ctx)
        }
    }

    fn emit_continue(&self, ctx: &ActionContext) -> Block {
        if ctx.is_instant() {
            return Block::new();
        }
        let mut block = Block::new();
        if !matches!(self.translation, Translation::None) {
            for (k, c) in POSITION.iter().zip(AXES) {
                block.push(Stmt::set(
                    *k,
                    Expr::prop(*k).add(ctx.stored(&Self::field("d", c))),
                ));
            }
        }
        match &self.turn {
            Turn::None => {}
            Turn::Absolute(_) => {
                for (k, c) in ORIENTATION.iter().zip(QUAT) {
                    block.push(Stmt::set(
                        *k,
                        Expr::prop(*k).add(ctx.stored(&Self::field("dq", c))),
                    ));
                }
            }
            Turn::Relative { axis, angle } => {
                let step = DQuat::from_axis_angle(*axis, angle / ctx.steps());
                block.extend(rotate_current(step));
            }
        }
        block
    }

    fn emit_exit(&self, ctx: &ActionContext) -> Block {
        if ctx.is_instant() {
            return Block::new();
        }
        let mut block = Block::new();
        if !matches!(self.translation, Translation::None) {
            block.extend(Self::stored_position(ctx));
        }
        match &self.turn {
            Turn::None => {}
            Turn::Absolute(_) => {
                block.extend(set_orientation(
                    QUAT.map(|c| ctx.stored(&Self::field("q", c))),
                ));
            }
            Turn::Relative { axis, angle } => {
                let r = quat_components(DQuat::from_axis_angle(*axis, *angle)).map(Expr::num);
                let start = QUAT.map(|c| ctx.stored(&Self::field("q0", c)));
                block.extend(set_orientation(hamilton(&r, &start)));
            }
        }
        block
    }
}
