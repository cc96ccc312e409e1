//! Sound playback.
//!
//! `Start` asks the host to play the sound (unless it already plays) and fades
//! `sound.<name>.volume` to the requested level. `Stop` fades the volume to
//! zero and stops playback once silent.

use super::{ActionContext, ActionGenerator};
use crate::emit::keys::sound_field;
use crate::emit::{Block, Expr, HostCall, Stmt};
use crate::error::ConfigError;
use crate::scene::SoundChange;

const DELTA: &str = "delta";

#[derive(Debug, Clone)]
pub struct SoundAction {
    sound: String,
    /// Target volume; `None` stops playback.
    volume: Option<f64>,
}

impl SoundAction {
    pub fn new(context: &str, sound: &str, change: &SoundChange) -> Result<Self, ConfigError> {
        let volume = match change {
            SoundChange::Start { volume } => {
                if !volume.is_finite() || !(0.0..=1.0).contains(volume) {
                    return Err(ConfigError::InvalidParameter {
                        context: context.to_string(),
                        parameter: "volume",
                        value: *volume,
                    });
                }
                Some(*volume)
            }
            SoundChange::Stop => None,
        };
        Ok(Self {
            sound: sound.to_string(),
            volume,
        })
    }

    fn volume_key(&self) -> String {
        sound_field(&self.sound, "volume")
    }

    fn playing_key(&self) -> String {
        sound_field(&self.sound, "playing")
    }

    fn target(&self) -> f64 {
        self.volume.unwrap_or(0.0)
    }

    fn start_playback(&self) -> Stmt {
        Stmt::when(
            Expr::prop(self.playing_key()).equals(Expr::num(0.0)),
            vec![
                Stmt::Host(HostCall::PlaySound(self.sound.clone())),
                Stmt::set(self.playing_key(), Expr::num(1.0)),
            ]
            .into(),
        )
    }

    fn stop_playback(&self) -> Block {
        vec![
            Stmt::Host(HostCall::StopSound(self.sound.clone())),
            Stmt::set(self.playing_key(), Expr::num(0.0)),
        ]
        .into()
    }

    /// Volume snap, followed by the stop when the action silences the sound.
    fn snap(&self) -> Block {
        let mut block: Block = vec![Stmt::set(self.volume_key(), Expr::num(self.target()))].into();
        if self.volume.is_none() {
            block.extend(self.stop_playback());
        }
        block
    }
}

impl ActionGenerator for SoundAction {
    fn emit_enter(&self, ctx: &ActionContext) -> Block {
        let mut block = Block::new();
        if self.volume.is_some() {
            block.push(self.start_playback());
        }
        if ctx.is_instant() {
            block.extend(self.snap());
        } else {
            block.push(ctx.store(
                DELTA,
                ctx.per_tick(Expr::num(self.target()), Expr::prop(self.volume_key())),
            ));
        }
        block
    }

    fn emit_continue(&self, ctx: &ActionContext) -> Block {
        if ctx.is_instant() {
            return Block::new();
        }
        vec![Stmt::set(
            self.volume_key(),
            Expr::prop(self.volume_key()).add(ctx.stored(DELTA)),
        )]
        .into()
    }

    fn emit_exit(&self, ctx: &ActionContext) -> Block {
        if ctx.is_instant() {
            return Block::new();
        }
        self.snap()
    }
}
