//! Scene logic compiler library.
//!
//! Compiles a declarative scene (objects, triggers, timelines, actions) into
//! per-object enter/continue/exit logic for a frame-driven host engine, and
//! provides two hosts that run the result: a `bevy_ecs` reference host over
//! the logic IR and a Lua host over the rendered text.
//!
//! # Project Structure
//!
//! - [`scene`] – the scene graph consumed by the compiler
//! - [`emit`] – logic IR, key spelling, Lua serialization
//! - [`actions`] – action state-machine generators
//! - [`triggers`] – trigger evaluators and edge detection
//! - [`sequencer`] – timeline sequencing
//! - [`driver`] – the compilation driver
//! - [`host`] – the `bevy_ecs` reference host
//! - [`lua_host`] – the Lua host (feature `lua`)
//! - [`config`] – compiler settings from INI files
//! - [`error`] – configuration and compilation errors

pub mod actions;
pub mod config;
pub mod driver;
pub mod emit;
pub mod error;
pub mod host;
#[cfg(feature = "lua")]
pub mod lua_host;
pub mod scene;
pub mod sequencer;
pub mod triggers;

pub use config::CompilerConfig;
pub use driver::{CompiledScene, compile};
pub use error::{CompileError, ConfigError};
pub use scene::Scene;
