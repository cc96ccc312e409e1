//! IR interpreter.
//!
//! Runs logic blocks directly against property bags, with the value semantics
//! of the rendered Lua text: numbers and booleans, Lua truthiness (only
//! `false` is falsy here, since bags never hold `nil`), short-circuit
//! `and`/`or` returning an operand, and `select` as `cond and a or b`.
//!
//! Emitted logic has no failure path, so neither has the interpreter: unknown
//! locals read as `0` and writes to unknown objects are dropped, both logged.

use log::warn;
use rustc_hash::FxHashMap;

use crate::emit::ir::{BinaryOp, Builtin, UnaryOp};
use crate::emit::{Block, Expr, HostCall, Stmt, Target};

/// Access to the bags of every object, addressed by id.
pub trait BagAccess {
    fn read(&self, object: &str, key: &str) -> f64;
    fn write(&mut self, object: &str, key: &str, value: f64);
    fn host_call(&mut self, object: &str, call: &HostCall);
}

/// Runtime value of an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Num(f64),
    Bool(bool),
}

impl Value {
    pub fn truthy(self) -> bool {
        !matches!(self, Value::Bool(false))
    }

    /// Numeric view; booleans read as `1`/`0`.
    pub fn number(self) -> f64 {
        match self {
            Value::Num(n) => n,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
        }
    }
}

pub struct Interpreter<'b, B: BagAccess + ?Sized> {
    bags: &'b mut B,
    scopes: Vec<FxHashMap<String, Value>>,
}

impl<'b, B: BagAccess + ?Sized> Interpreter<'b, B> {
    pub fn new(bags: &'b mut B) -> Self {
        Self {
            bags,
            scopes: Vec::new(),
        }
    }

    /// Run `block` with `object` as the current target.
    pub fn run(&mut self, object: &str, block: &Block) {
        self.exec_block(object, block);
    }

    fn exec_block(&mut self, object: &str, block: &Block) {
        self.scopes.push(FxHashMap::default());
        for stmt in block.stmts() {
            self.exec_stmt(object, stmt);
        }
        self.scopes.pop();
    }

    fn exec_stmt(&mut self, object: &str, stmt: &Stmt) {
        match stmt {
            Stmt::Set { key, value } => {
                let value = self.eval(object, value).number();
                self.bags.write(object, key, value);
            }
            Stmt::Local { name, value } => {
                let value = self.eval(object, value);
                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(name.clone(), value);
                }
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(object, cond).truthy() {
                    self.exec_block(object, then);
                } else {
                    self.exec_block(object, otherwise);
                }
            }
            Stmt::With { object: target, body } => self.exec_block(target, body),
            Stmt::Host(call) => self.bags.host_call(object, call),
            Stmt::Comment(_) => {}
        }
    }

    fn local(&self, name: &str) -> Value {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.get(name) {
                return *value;
            }
        }
        warn!("Read of unbound local '{}'", name);
        Value::Num(0.0)
    }

    pub fn eval(&self, object: &str, expr: &Expr) -> Value {
        match expr {
            Expr::Num(n) => Value::Num(*n),
            Expr::Prop { on, key } => match on {
                Target::This => Value::Num(self.bags.read(object, key)),
                Target::Object(id) => Value::Num(self.bags.read(id, key)),
            },
            Expr::Local(name) => self.local(name),
            Expr::Unary(op, inner) => {
                let v = self.eval(object, inner);
                match op {
                    UnaryOp::Neg => Value::Num(-v.number()),
                    UnaryOp::Not => Value::Bool(!v.truthy()),
                }
            }
            Expr::Binary(op, a, b) => self.binary(object, *op, a, b),
            Expr::Call(builtin, args) => {
                let args: Vec<f64> = args.iter().map(|a| self.eval(object, a).number()).collect();
                Value::Num(call(*builtin, &args))
            }
            Expr::Select(cond, a, b) => {
                if self.eval(object, cond).truthy() {
                    let a = self.eval(object, a);
                    if a.truthy() {
                        return a;
                    }
                }
                self.eval(object, b)
            }
        }
    }

    fn binary(&self, object: &str, op: BinaryOp, a: &Expr, b: &Expr) -> Value {
        match op {
            BinaryOp::And => {
                let a = self.eval(object, a);
                if a.truthy() { self.eval(object, b) } else { a }
            }
            BinaryOp::Or => {
                let a = self.eval(object, a);
                if a.truthy() { a } else { self.eval(object, b) }
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                let same = match (self.eval(object, a), self.eval(object, b)) {
                    (Value::Num(x), Value::Num(y)) => x == y,
                    (Value::Bool(x), Value::Bool(y)) => x == y,
                    _ => false,
                };
                Value::Bool(if op == BinaryOp::Eq { same } else { !same })
            }
            _ => {
                let x = self.eval(object, a).number();
                let y = self.eval(object, b).number();
                match op {
                    BinaryOp::Add => Value::Num(x + y),
                    BinaryOp::Sub => Value::Num(x - y),
                    BinaryOp::Mul => Value::Num(x * y),
                    BinaryOp::Div => Value::Num(x / y),
                    BinaryOp::Lt => Value::Bool(x < y),
                    BinaryOp::Le => Value::Bool(x <= y),
                    BinaryOp::Gt => Value::Bool(x > y),
                    BinaryOp::Ge => Value::Bool(x >= y),
                    // logical and equality operators return early
                    BinaryOp::And | BinaryOp::Or | BinaryOp::Eq | BinaryOp::Ne => Value::Num(y),
                }
            }
        }
    }
}

fn call(builtin: Builtin, args: &[f64]) -> f64 {
    let first = args.first().copied().unwrap_or(0.0);
    match builtin {
        Builtin::Sqrt => first.sqrt(),
        Builtin::Acos => first.acos(),
        Builtin::Abs => first.abs(),
        Builtin::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
        Builtin::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

/// Run `block` on `object`'s bag.
pub fn run_block<B: BagAccess + ?Sized>(bags: &mut B, object: &str, block: &Block) {
    Interpreter::new(bags).run(object, block);
}

/// Plain in-memory bags, for running logic without a world.
#[derive(Debug, Default, Clone)]
pub struct MemoryBags {
    bags: FxHashMap<String, FxHashMap<String, f64>>,
    pub calls: Vec<(String, HostCall)>,
}

impl MemoryBags {
    pub fn get(&self, object: &str, key: &str) -> f64 {
        self.bags
            .get(object)
            .and_then(|bag| bag.get(key))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn set(&mut self, object: &str, key: &str, value: f64) {
        self.bags
            .entry(object.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }
}

impl BagAccess for MemoryBags {
    fn read(&self, object: &str, key: &str) -> f64 {
        self.get(object, key)
    }

    fn write(&mut self, object: &str, key: &str, value: f64) {
        self.set(object, key, value);
    }

    fn host_call(&mut self, object: &str, call: &HostCall) {
        self.calls.push((object.to_string(), call.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: Expr) -> Value {
        let mut bags = MemoryBags::default();
        bags.set("a", "x", 3.0);
        Interpreter::new(&mut bags).eval("a", &expr)
    }

    // ==================== EXPRESSION TESTS ====================

    #[test]
    fn test_absent_keys_read_zero() {
        assert_eq!(eval(Expr::prop("missing")), Value::Num(0.0));
        assert_eq!(eval(Expr::prop_of("nobody", "x")), Value::Num(0.0));
    }

    #[test]
    fn test_zero_is_truthy_like_lua() {
        assert!(Value::Num(0.0).truthy());
        assert!(!Value::Bool(false).truthy());
    }

    #[test]
    fn test_select_follows_and_or() {
        let e = Expr::select(Expr::prop("x").gt(Expr::num(1.0)), Expr::num(1.0), Expr::num(0.0));
        assert_eq!(eval(e), Value::Num(1.0));
        let e = Expr::prop("x").lt(Expr::num(1.0)).flag();
        assert_eq!(eval(e), Value::Num(0.0));
    }

    #[test]
    fn test_and_or_return_operands() {
        assert_eq!(eval(Expr::num(2.0).and(Expr::num(5.0))), Value::Num(5.0));
        assert_eq!(
            eval(Expr::num(1.0).lt(Expr::num(0.0)).or(Expr::num(7.0))),
            Value::Num(7.0)
        );
    }

    #[test]
    fn test_builtins() {
        assert_eq!(eval(Expr::num(16.0).sqrt()), Value::Num(4.0));
        assert_eq!(
            eval(Expr::call(Builtin::Min, vec![Expr::num(1.0), Expr::prop("x")])),
            Value::Num(1.0)
        );
        assert_eq!(
            eval(Expr::call(Builtin::Max, vec![Expr::num(1.0), Expr::prop("x")])),
            Value::Num(3.0)
        );
    }

    // ==================== STATEMENT TESTS ====================

    #[test]
    fn test_with_rebinds_and_locals_scope() {
        let block: Block = vec![
            Stmt::local("v", Expr::num(1.0)),
            Stmt::with(
                "b",
                vec![
                    Stmt::local("v", Expr::num(9.0)),
                    Stmt::set("inner", Expr::local("v")),
                    Stmt::Host(HostCall::PlaySound("hum".into())),
                ]
                .into(),
            ),
            Stmt::set("outer", Expr::local("v")),
        ]
        .into();
        let mut bags = MemoryBags::default();
        run_block(&mut bags, "a", &block);
        assert_eq!(bags.get("b", "inner"), 9.0);
        assert_eq!(bags.get("a", "outer"), 1.0);
        assert_eq!(bags.calls, vec![("b".to_string(), HostCall::PlaySound("hum".into()))]);
    }

    #[test]
    fn test_if_else_branches() {
        let block: Block = vec![Stmt::if_else(
            Expr::prop("flag").is_set(),
            vec![Stmt::set("r", Expr::num(1.0))].into(),
            vec![Stmt::set("r", Expr::num(2.0))].into(),
        )]
        .into();
        let mut bags = MemoryBags::default();
        run_block(&mut bags, "a", &block);
        assert_eq!(bags.get("a", "r"), 2.0);
        bags.set("a", "flag", 1.0);
        run_block(&mut bags, "a", &block);
        assert_eq!(bags.get("a", "r"), 1.0);
    }
}
