//! Compile-time error types.
//!
//! Two families exist:
//!
//! - [`ConfigError`] – the scene or the compiler settings are wrong. Always
//!   surfaced to the caller; compilation of the whole scene is abandoned.
//! - [`CompileError::Invariant`] – a generator produced logic that cannot be
//!   correct (for example a timed action without an exit snap). This is a bug in
//!   the compiler, not in the input.
//!
//! Emitted logic has no runtime error path: it only does arithmetic and
//! property-bag access.

use std::fmt;

/// Invalid or inconsistent input detected while compiling a scene.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Two objects share the same identifier.
    DuplicateObject(String),
    /// An object uses an identifier reserved for the host (e.g. `head`).
    ReservedObject(String),
    /// A reference to an object that does not exist in the scene.
    UnknownObject { context: String, object: String },
    /// A group action references a group that does not exist.
    UnknownGroup { context: String, group: String },
    /// A timeline action references a timeline that does not exist.
    UnknownTimeline { context: String, timeline: String },
    /// A toggle action references a trigger that does not exist.
    UnknownTrigger { context: String, trigger: String },
    /// Two triggers, timelines, or groups share a name.
    DuplicateName { kind: &'static str, name: String },
    /// Groups that (transitively) contain themselves.
    GroupCycle(String),
    /// A duration that is negative or not finite.
    InvalidDuration { context: String, duration: f64 },
    /// A numeric parameter outside its valid range.
    InvalidParameter {
        context: String,
        parameter: &'static str,
        value: f64,
    },
    /// A direction or axis vector of zero length.
    ZeroVector { context: String, parameter: &'static str },
    /// A parameter combination the generators cannot express.
    Unsupported { context: String, reason: String },
    /// The host tick rate is not a positive finite number.
    InvalidTickRate(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::DuplicateObject(id) => write!(f, "Duplicate object id: '{}'", id),
            ConfigError::ReservedObject(id) => {
                write!(f, "Object id '{}' is reserved for the host", id)
            }
            ConfigError::UnknownObject { context, object } => {
                write!(f, "{}: unknown object '{}'", context, object)
            }
            ConfigError::UnknownGroup { context, group } => {
                write!(f, "{}: unknown group '{}'", context, group)
            }
            ConfigError::UnknownTimeline { context, timeline } => {
                write!(f, "{}: unknown timeline '{}'", context, timeline)
            }
            ConfigError::UnknownTrigger { context, trigger } => {
                write!(f, "{}: unknown trigger '{}'", context, trigger)
            }
            ConfigError::DuplicateName { kind, name } => {
                write!(f, "Duplicate {} name: '{}'", kind, name)
            }
            ConfigError::GroupCycle(name) => write!(f, "Group '{}' contains itself", name),
            ConfigError::InvalidDuration { context, duration } => {
                write!(f, "{}: invalid duration {}", context, duration)
            }
            ConfigError::InvalidParameter {
                context,
                parameter,
                value,
            } => write!(f, "{}: invalid {} {}", context, parameter, value),
            ConfigError::ZeroVector { context, parameter } => {
                write!(f, "{}: {} must not be a zero vector", context, parameter)
            }
            ConfigError::Unsupported { context, reason } => {
                write!(f, "{}: unsupported: {}", context, reason)
            }
            ConfigError::InvalidTickRate(rate) => write!(f, "Invalid tick rate: {}", rate),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Error returned by [`compile`](crate::driver::compile).
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Bad input. Nothing was compiled.
    Config(ConfigError),
    /// A generator broke its own contract.
    Invariant(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Config(err) => write!(f, "Configuration error: {}", err),
            CompileError::Invariant(msg) => write!(f, "Compiler invariant violated: {}", msg),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Config(err) => Some(err),
            CompileError::Invariant(_) => None,
        }
    }
}

impl From<ConfigError> for CompileError {
    fn from(err: ConfigError) -> Self {
        CompileError::Config(err)
    }
}

/// Reject negative or non-finite durations.
pub(crate) fn check_duration(context: &str, duration: f64) -> Result<f64, ConfigError> {
    if duration.is_finite() && duration >= 0.0 {
        Ok(duration)
    } else {
        Err(ConfigError::InvalidDuration {
            context: context.to_string(),
            duration,
        })
    }
}

/// Reject negative or non-finite thresholds, epsilons, and offsets.
pub(crate) fn check_non_negative(
    context: &str,
    parameter: &'static str,
    value: f64,
) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidParameter {
            context: context.to_string(),
            parameter,
            value,
        })
    }
}

/// Reject vectors with non-finite components.
pub(crate) fn check_finite_vec(
    context: &str,
    parameter: &'static str,
    v: [f64; 3],
) -> Result<[f64; 3], ConfigError> {
    match v.iter().find(|c| !c.is_finite()) {
        Some(bad) => Err(ConfigError::InvalidParameter {
            context: context.to_string(),
            parameter,
            value: *bad,
        }),
        None => Ok(v),
    }
}
