//! Logic intermediate representation.
//!
//! Generators build small statement trees instead of text. Nesting is
//! structural, so indentation never carries meaning; a single serialization
//! stage ([`LuaRenderer`](super::lua::LuaRenderer)) turns trees into the text
//! the host runs, and the reference host interprets the same trees directly.
//!
//! Values in a property bag are always numbers. Conditions are booleans and
//! only appear where a boolean is expected (`If`, `And`, `Or`, `Not`,
//! `Select`); [`Expr::flag`] converts a condition back into `0`/`1`.

use serde::{Deserialize, Serialize};

use crate::scene::ObjectId;

/// Whose property bag a read addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Target {
    /// The object currently bound by the enclosing fragment or `With`.
    This,
    /// A named object.
    Object(ObjectId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }
}

/// Math functions the host scripting runtime provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Builtin {
    Sqrt,
    Acos,
    Abs,
    Min,
    Max,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Num(f64),
    Prop { on: Target, key: String },
    Local(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Builtin, Vec<Expr>),
    /// `cond ? a : b`; `a` and `b` are numbers.
    Select(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn num(value: f64) -> Expr {
        Expr::Num(value)
    }
    /// Property of the current target.
    pub fn prop(key: impl Into<String>) -> Expr {
        Expr::Prop {
            on: Target::This,
            key: key.into(),
        }
    }
    /// Property of a named object.
    pub fn prop_of(object: impl Into<ObjectId>, key: impl Into<String>) -> Expr {
        Expr::Prop {
            on: Target::Object(object.into()),
            key: key.into(),
        }
    }
    pub fn local(name: impl Into<String>) -> Expr {
        Expr::Local(name.into())
    }

    fn binary(op: BinaryOp, a: Expr, b: Expr) -> Expr {
        Expr::Binary(op, Box::new(a), Box::new(b))
    }
    pub fn add(self, rhs: Expr) -> Expr {
        Self::binary(BinaryOp::Add, self, rhs)
    }
    pub fn sub(self, rhs: Expr) -> Expr {
        Self::binary(BinaryOp::Sub, self, rhs)
    }
    pub fn mul(self, rhs: Expr) -> Expr {
        Self::binary(BinaryOp::Mul, self, rhs)
    }
    pub fn div(self, rhs: Expr) -> Expr {
        Self::binary(BinaryOp::Div, self, rhs)
    }
    pub fn lt(self, rhs: Expr) -> Expr {
        Self::binary(BinaryOp::Lt, self, rhs)
    }
    pub fn le(self, rhs: Expr) -> Expr {
        Self::binary(BinaryOp::Le, self, rhs)
    }
    pub fn gt(self, rhs: Expr) -> Expr {
        Self::binary(BinaryOp::Gt, self, rhs)
    }
    pub fn ge(self, rhs: Expr) -> Expr {
        Self::binary(BinaryOp::Ge, self, rhs)
    }
    pub fn equals(self, rhs: Expr) -> Expr {
        Self::binary(BinaryOp::Eq, self, rhs)
    }
    pub fn differs(self, rhs: Expr) -> Expr {
        Self::binary(BinaryOp::Ne, self, rhs)
    }
    pub fn and(self, rhs: Expr) -> Expr {
        Self::binary(BinaryOp::And, self, rhs)
    }
    pub fn or(self, rhs: Expr) -> Expr {
        Self::binary(BinaryOp::Or, self, rhs)
    }
    pub fn neg(self) -> Expr {
        Expr::Unary(UnaryOp::Neg, Box::new(self))
    }
    pub fn not(self) -> Expr {
        Expr::Unary(UnaryOp::Not, Box::new(self))
    }
    pub fn call(builtin: Builtin, args: Vec<Expr>) -> Expr {
        Expr::Call(builtin, args)
    }
    pub fn sqrt(self) -> Expr {
        Expr::Call(Builtin::Sqrt, vec![self])
    }
    /// Number is non-zero, as a condition.
    pub fn is_set(self) -> Expr {
        self.differs(Expr::Num(0.0))
    }
    /// Condition as a `0`/`1` number.
    pub fn flag(self) -> Expr {
        Expr::Select(
            Box::new(self),
            Box::new(Expr::Num(1.0)),
            Box::new(Expr::Num(0.0)),
        )
    }
    pub fn select(cond: Expr, a: Expr, b: Expr) -> Expr {
        Expr::Select(Box::new(cond), Box::new(a), Box::new(b))
    }
}

/// Host engine calls available to emitted logic. Both address the current
/// target object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostCall {
    PlaySound(String),
    StopSound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// Write a property of the current target.
    Set { key: String, value: Expr },
    /// Bind a fragment-local temporary.
    Local { name: String, value: Expr },
    If {
        cond: Expr,
        then: Block,
        otherwise: Block,
    },
    /// Rebind the current target for the nested block.
    With { object: ObjectId, body: Block },
    Host(HostCall),
    Comment(String),
}

impl Stmt {
    pub fn set(key: impl Into<String>, value: Expr) -> Stmt {
        Stmt::Set {
            key: key.into(),
            value,
        }
    }
    pub fn local(name: impl Into<String>, value: Expr) -> Stmt {
        Stmt::Local {
            name: name.into(),
            value,
        }
    }
    pub fn when(cond: Expr, then: Block) -> Stmt {
        Stmt::If {
            cond,
            then,
            otherwise: Block::new(),
        }
    }
    pub fn if_else(cond: Expr, then: Block, otherwise: Block) -> Stmt {
        Stmt::If {
            cond,
            then,
            otherwise,
        }
    }
    pub fn with(object: impl Into<ObjectId>, body: Block) -> Stmt {
        Stmt::With {
            object: object.into(),
            body,
        }
    }
    pub fn comment(text: impl Into<String>) -> Stmt {
        Stmt::Comment(text.into())
    }

    /// Whether the statement does anything when run.
    fn is_effective(&self) -> bool {
        match self {
            Stmt::Comment(_) => false,
            Stmt::If {
                then, otherwise, ..
            } => !then.is_empty() || !otherwise.is_empty(),
            Stmt::With { body, .. } => !body.is_empty(),
            _ => true,
        }
    }
}

/// An ordered list of statements; the body of one phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block(pub Vec<Stmt>);

impl Block {
    pub fn new() -> Self {
        Self(Vec::new())
    }
    pub fn push(&mut self, stmt: Stmt) {
        self.0.push(stmt);
    }
    pub fn extend(&mut self, other: Block) {
        self.0.extend(other.0);
    }
    /// A block is empty when running it would have no effect.
    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(Stmt::is_effective)
    }
    pub fn stmts(&self) -> &[Stmt] {
        &self.0
    }
}

impl From<Vec<Stmt>> for Block {
    fn from(stmts: Vec<Stmt>) -> Self {
        Block(stmts)
    }
}

impl FromIterator<Stmt> for Block {
    fn from_iter<I: IntoIterator<Item = Stmt>>(iter: I) -> Self {
        Block(iter.into_iter().collect())
    }
}

/// The three phases of a unit of logic. Missing phases are empty blocks, never
/// absent, so the host's three calling points are always satisfiable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentSet {
    pub enter: Block,
    #[serde(rename = "continue")]
    pub continue_: Block,
    pub exit: Block,
}

/// One of the three calling points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Enter,
    Continue,
    Exit,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Enter, Phase::Continue, Phase::Exit];

    pub fn name(self) -> &'static str {
        match self {
            Phase::Enter => "enter",
            Phase::Continue => "continue",
            Phase::Exit => "exit",
        }
    }
}

impl FragmentSet {
    pub fn phase(&self, phase: Phase) -> &Block {
        match phase {
            Phase::Enter => &self.enter,
            Phase::Continue => &self.continue_,
            Phase::Exit => &self.exit,
        }
    }
    pub fn phase_mut(&mut self, phase: Phase) -> &mut Block {
        match phase {
            Phase::Enter => &mut self.enter,
            Phase::Continue => &mut self.continue_,
            Phase::Exit => &mut self.exit,
        }
    }
    pub fn is_empty(&self) -> bool {
        Phase::ALL.iter().all(|p| self.phase(*p).is_empty())
    }
}
