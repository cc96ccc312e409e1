//! Timeline sequencer.
//!
//! A timeline's state lives in its owner's bag under `tl.<name>.*`:
//!
//! - `running` – the sequencer advances this frame
//! - `started` – the timeline was started at least once
//! - `elapsed` – ticks since the last start
//! - `cursor` – index of the next entry to dispatch
//!
//! Entries are stable-sorted by start offset, so two entries sharing an offset
//! dispatch in declared order and a later offset never dispatches first. Each
//! running frame dispatches every due entry in cursor order, then counts the
//! tick. Once all entries fired and the longest of them had time to finish,
//! the timeline stops itself.

use crate::actions::{ActionInstance, TimelineAction};
use crate::config;
use crate::emit::keys::timeline_field;
use crate::emit::{Block, Expr, Stmt};
use crate::error::{ConfigError, check_non_negative};
use crate::scene::{TimedAction, Timeline, TimelineChange};

/// A dispatched entry of a compiled timeline.
#[derive(Debug, Clone)]
pub struct SequencedAction {
    /// Seconds after the timeline's start.
    pub start: f64,
    pub instance: ActionInstance,
}

/// Timeline entries in dispatch order, with start offsets validated.
pub fn dispatch_order<'t>(
    timeline: &'t Timeline,
    context: &str,
) -> Result<Vec<&'t TimedAction>, ConfigError> {
    for entry in &timeline.actions {
        check_non_negative(context, "start", entry.start)?;
    }
    let mut entries: Vec<&TimedAction> = timeline.actions.iter().collect();
    // stable: equal offsets keep declared order
    entries.sort_by(|a, b| a.start.total_cmp(&b.start));
    Ok(entries)
}

#[derive(Debug, Clone)]
pub struct CompiledTimeline {
    name: String,
    autostart: bool,
    tick_rate: f64,
    entries: Vec<SequencedAction>,
}

impl CompiledTimeline {
    /// `entries` must already be in [`dispatch_order`].
    pub fn new(timeline: &Timeline, tick_rate: f64, entries: Vec<SequencedAction>) -> Self {
        Self {
            name: timeline.name.clone(),
            autostart: timeline.autostart,
            tick_rate,
            entries,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[SequencedAction] {
        &self.entries
    }

    fn field(&self, name: &str) -> String {
        timeline_field(&self.name, name)
    }

    /// Tick at which an entry becomes due.
    fn start_tick(&self, start: f64) -> u64 {
        config::ticks(start, self.tick_rate)
    }

    /// Ticks after which every entry has dispatched and finished.
    pub fn end_tick(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| self.start_tick(e.start) + e.instance.ticks)
            .max()
            .unwrap_or(0)
    }

    /// First-frame statements of the owner.
    pub fn setup(&self) -> Block {
        if self.autostart {
            TimelineAction::new(&self.name, TimelineChange::StartIfNotStarted).apply()
        } else {
            Block::new()
        }
    }

    /// Per-frame sequencing logic, run in the owner's enter phase.
    pub fn sequence_block(&self) -> Block {
        let cursor = self.field("cursor");
        let elapsed = self.field("elapsed");
        let running = self.field("running");

        let mut body: Block = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let due = Expr::prop(&cursor)
                    .equals(Expr::num(i as f64))
                    .and(Expr::prop(&elapsed).ge(Expr::num(self.start_tick(entry.start) as f64)));
                // advance before dispatching so a restart from inside sticks
                let mut then: Block =
                    vec![Stmt::set(&cursor, Expr::num((i + 1) as f64))].into();
                then.extend(entry.instance.dispatch());
                Stmt::when(due, then)
            })
            .collect();

        body.push(Stmt::set(
            &elapsed,
            Expr::prop(&elapsed).add(Expr::num(1.0)),
        ));
        let finished = Expr::prop(&cursor)
            .ge(Expr::num(self.entries.len() as f64))
            .and(Expr::prop(&elapsed).ge(Expr::num(self.end_tick() as f64)));
        body.push(Stmt::when(
            finished,
            vec![Stmt::set(&running, Expr::num(0.0))].into(),
        ));

        vec![
            Stmt::comment(format!("timeline {}", self.name)),
            Stmt::when(Expr::prop(running).is_set(), body),
        ]
        .into()
    }
}
