//! Component-wise vector expressions.
//!
//! Property bags only hold scalars, so a 3D vector is three expressions. These
//! helpers keep the expansion in one place.

use super::ir::{Builtin, Expr};
use super::keys;

pub type Vec3Expr = [Expr; 3];

/// Degrees per radian.
const RAD_TO_DEG: f64 = 180.0 / std::f64::consts::PI;

pub fn constant(v: [f64; 3]) -> Vec3Expr {
    v.map(Expr::Num)
}

/// Position of a named object.
pub fn position_of(object: &str) -> Vec3Expr {
    keys::POSITION.map(|k| Expr::prop_of(object, k))
}

/// Position of the current target.
pub fn position() -> Vec3Expr {
    keys::POSITION.map(Expr::prop)
}

/// Forward vector of a named object.
pub fn forward_of(object: &str) -> Vec3Expr {
    keys::FORWARD.map(|k| Expr::prop_of(object, k))
}

/// Three locals `{prefix}x`, `{prefix}y`, `{prefix}z`.
pub fn locals(prefix: &str) -> Vec3Expr {
    keys::AXES.map(|axis| Expr::local(format!("{prefix}{axis}")))
}

pub fn add(a: Vec3Expr, b: Vec3Expr) -> Vec3Expr {
    let [a0, a1, a2] = a;
    let [b0, b1, b2] = b;
    [a0.add(b0), a1.add(b1), a2.add(b2)]
}

pub fn sub(a: Vec3Expr, b: Vec3Expr) -> Vec3Expr {
    let [a0, a1, a2] = a;
    let [b0, b1, b2] = b;
    [a0.sub(b0), a1.sub(b1), a2.sub(b2)]
}

pub fn dot(a: Vec3Expr, b: Vec3Expr) -> Expr {
    let [a0, a1, a2] = a;
    let [b0, b1, b2] = b;
    a0.mul(b0).add(a1.mul(b1)).add(a2.mul(b2))
}

pub fn length(a: Vec3Expr) -> Expr {
    let [x, y, z] = a;
    x.clone()
        .mul(x)
        .add(y.clone().mul(y))
        .add(z.clone().mul(z))
        .sqrt()
}

/// Smallest length product used as a divisor; a zero vector reads as 90 degrees.
const MIN_NORM: f64 = 1e-12;

/// Angle in degrees between two vectors. The cosine is clamped so rounding
/// never leaves the domain of `acos`.
pub fn angle_deg(a: Vec3Expr, b: Vec3Expr) -> Expr {
    let norm = Expr::call(
        Builtin::Max,
        vec![Expr::num(MIN_NORM), length(a.clone()).mul(length(b.clone()))],
    );
    let cosine = dot(a, b).div(norm);
    let clamped = Expr::call(
        Builtin::Max,
        vec![
            Expr::num(-1.0),
            Expr::call(Builtin::Min, vec![Expr::num(1.0), cosine]),
        ],
    );
    Expr::call(Builtin::Acos, vec![clamped]).mul(Expr::num(RAD_TO_DEG))
}
