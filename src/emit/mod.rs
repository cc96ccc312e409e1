//! Code-emission primitives shared by every generator.
//!
//! - [`ir`] – the statement/expression tree generators produce
//! - [`keys`] – property-bag key spelling
//! - [`vector`] – component-wise vector math over expressions
//! - [`lua`] – the serialization stage that renders trees as host text

pub mod ir;
pub mod keys;
pub mod lua;
pub mod vector;

pub use ir::{Block, Expr, FragmentSet, HostCall, Phase, Stmt, Target};
pub use keys::ActionKey;
pub use lua::{LuaRenderer, RenderedFragments};
