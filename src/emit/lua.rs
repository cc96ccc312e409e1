//! Lua serialization of logic blocks.
//!
//! The single stage that turns IR into host text. Output is deterministic:
//! the same block always renders to the same bytes.
//!
//! # Host environment
//!
//! Each rendered fragment is a Lua chunk evaluated with an environment that
//! provides:
//!
//! - `o` – the owning object's property table (absent keys read as `0`)
//! - `scene` – object id to property table
//! - `host` – `host.play_sound(obj, name)` and `host.stop_sound(obj, name)`
//! - `math` – the standard math library
//!
//! `With` statements shadow `o` inside a `do ... end` block.

use serde::Serialize;
use std::fmt::Write as FmtWrite;

use super::ir::{BinaryOp, Block, Builtin, Expr, FragmentSet, HostCall, Stmt, Target, UnaryOp};

/// Rendered text of the three phases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedFragments {
    pub enter: String,
    #[serde(rename = "continue")]
    pub continue_: String,
    pub exit: String,
}

/// Renders IR blocks as Lua source.
#[derive(Debug, Clone, Copy)]
pub struct LuaRenderer {
    /// Spaces per indentation level.
    pub indent_width: usize,
    /// Indentation level of top-level statements.
    pub offset: usize,
}

impl Default for LuaRenderer {
    fn default() -> Self {
        Self {
            indent_width: 4,
            offset: 0,
        }
    }
}

impl LuaRenderer {
    pub fn new(indent_width: usize, offset: usize) -> Self {
        Self {
            indent_width,
            offset,
        }
    }

    /// Render a block. A block without effect renders as an empty string at
    /// any offset.
    pub fn render_block(&self, block: &Block) -> String {
        if block.is_empty() {
            return String::new();
        }
        let mut out = String::new();
        self.write_block(&mut out, block, self.offset);
        out
    }

    pub fn render_fragments(&self, set: &FragmentSet) -> RenderedFragments {
        RenderedFragments {
            enter: self.render_block(&set.enter),
            continue_: self.render_block(&set.continue_),
            exit: self.render_block(&set.exit),
        }
    }

    fn pad(&self, level: usize) -> String {
        " ".repeat(self.indent_width * level)
    }

    fn write_block(&self, out: &mut String, block: &Block, level: usize) {
        for stmt in block.stmts() {
            self.write_stmt(out, stmt, level);
        }
    }

    fn write_stmt(&self, out: &mut String, stmt: &Stmt, level: usize) {
        let pad = self.pad(level);
        // Writing to a String cannot fail.
        let _ = match stmt {
            Stmt::Set { key, value } => {
                writeln!(out, "{pad}o[{}] = {}", quote(key), expr(value))
            }
            Stmt::Local { name, value } => writeln!(out, "{pad}local {name} = {}", expr(value)),
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                let _ = writeln!(out, "{pad}if {} then", expr(cond));
                self.write_block(out, then, level + 1);
                if !otherwise.stmts().is_empty() {
                    let _ = writeln!(out, "{pad}else");
                    self.write_block(out, otherwise, level + 1);
                }
                writeln!(out, "{pad}end")
            }
            Stmt::With { object, body } => {
                let _ = writeln!(out, "{pad}do");
                let _ = writeln!(
                    out,
                    "{}local o = scene[{}]",
                    self.pad(level + 1),
                    quote(object)
                );
                self.write_block(out, body, level + 1);
                writeln!(out, "{pad}end")
            }
            Stmt::Host(call) => match call {
                HostCall::PlaySound(sound) => {
                    writeln!(out, "{pad}host.play_sound(o, {})", quote(sound))
                }
                HostCall::StopSound(sound) => {
                    writeln!(out, "{pad}host.stop_sound(o, {})", quote(sound))
                }
            },
            Stmt::Comment(text) => writeln!(out, "{pad}-- {}", text.replace(['\n', '\r'], " ")),
        };
    }
}

/// Render an expression. Every compound expression is parenthesized, so
/// operator precedence never depends on context.
pub fn expr(e: &Expr) -> String {
    match e {
        Expr::Num(n) => number(*n),
        Expr::Prop { on, key } => match on {
            Target::This => format!("o[{}]", quote(key)),
            Target::Object(id) => format!("scene[{}][{}]", quote(id), quote(key)),
        },
        Expr::Local(name) => name.clone(),
        Expr::Unary(op, inner) => match op {
            UnaryOp::Neg => format!("(-{})", expr(inner)),
            UnaryOp::Not => format!("(not {})", expr(inner)),
        },
        Expr::Binary(op, a, b) => format!("({} {} {})", expr(a), binary_op(*op), expr(b)),
        Expr::Call(builtin, args) => {
            let args: Vec<String> = args.iter().map(expr).collect();
            format!("{}({})", builtin_name(*builtin), args.join(", "))
        }
        Expr::Select(cond, a, b) => {
            format!("({} and {} or {})", expr(cond), expr(a), expr(b))
        }
    }
}

fn binary_op(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "~=",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
    }
}

fn builtin_name(builtin: Builtin) -> &'static str {
    match builtin {
        Builtin::Sqrt => "math.sqrt",
        Builtin::Acos => "math.acos",
        Builtin::Abs => "math.abs",
        Builtin::Min => "math.min",
        Builtin::Max => "math.max",
    }
}

/// Shortest decimal that reads back as the same `f64`. Negative literals are
/// parenthesized so `a - -1` never turns into a `--` comment.
fn number(n: f64) -> String {
    if n < 0.0 {
        format!("({})", n)
    } else if n == 0.0 {
        // also folds -0.0
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

/// Lua string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                let _ = write!(out, "\\{:03}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
