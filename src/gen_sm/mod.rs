//! Table-driven state-machine substrate shared by the roaming engine and the
//! connection machines.
//!
//! A machine is a current-state cell plus a [`TransitionTable`] that maps
//! `(state, event)` to `(next_state, action)`. Pairs without an entry are
//! absorbed as a logged no-op; lookup never panics and never blocks. Actions run
//! before the new state is committed, so they observe the old state, and they may
//! hand back one follow-up event that is dispatched after the commit.

mod trace;


use heapless::HistoryBuffer;

pub use trace::{TransitionRecord, TRACE_DEPTH};

/// Guards against actions that keep handing back follow-up events.
pub const MAX_CHAINED_EVENTS: usize = 8;

pub trait SmLabel: Copy + Eq + core::fmt::Debug {
    fn name(self) -> &'static str;
}

pub type Action<C, E> = fn(&mut C) -> Option<E>;

pub struct Transition<S, E, C> {
    pub next: S,
    pub action: Action<C, E>,
}

impl<S, E, C> Transition<S, E, C> {
    pub const fn new(next: S, action: Action<C, E>) -> Self {
        Self { next, action }
    }
}

impl<S: Copy, E, C> Clone for Transition<S, E, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Copy, E, C> Copy for Transition<S, E, C> {}

pub trait TransitionTable<S, E, C> {
    fn lookup(&self, state: S, event: E) -> Option<Transition<S, E, C>>;
}

/// Structural no-op action.
pub fn nop<C, E>(_: &mut C) -> Option<E> {
    None
}

pub struct StateMachine<S, E> {
    name: &'static str,
    current: S,
    trace: HistoryBuffer<TransitionRecord<S, E>, TRACE_DEPTH>,
    transitions: u32,
    unexpected: u32,
}

impl<S: SmLabel, E: SmLabel> StateMachine<S, E> {
    pub const fn new(name: &'static str, initial: S) -> Self {
        Self {
            name,
            current: initial,
            trace: HistoryBuffer::new(),
            transitions: 0,
            unexpected: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    pub fn unexpected_events(&self) -> u32 {
        self.unexpected
    }

    pub fn last(&self) -> Option<&TransitionRecord<S, E>> {
        self.trace.recent()
    }

    pub fn trace(&self) -> impl Iterator<Item = &TransitionRecord<S, E>> {
        self.trace.oldest_ordered()
    }

    /// Forces the current state without running an action. Used when the owning
    /// component is reset rather than rebuilt.
    pub fn reset(&mut self, state: S) {
        debug!("{}: reset {} -> {}", self.name, self.current.name(), state.name());
        self.current = state;
    }

    /// Dispatches `event` and any follow-up events the actions hand back.
    /// Returns the state committed by the last dispatch step.
    pub fn fire<C, T>(&mut self, table: &T, event: E, ctx: &mut C) -> S
    where
        T: TransitionTable<S, E, C> + ?Sized,
    {
        let mut next_event = Some(event);
        let mut steps = 0usize;

        while let Some(event) = next_event.take() {
            if steps == MAX_CHAINED_EVENTS {
                error!(
                    "{}: dropping chained event {} in state {}; chain limit reached",
                    self.name,
                    event.name(),
                    self.current.name()
                );
                break;
            }
            steps += 1;
            next_event = self.step(table, event, ctx);
        }

        self.current
    }

    fn step<C, T>(&mut self, table: &T, event: E, ctx: &mut C) -> Option<E>
    where
        T: TransitionTable<S, E, C> + ?Sized,
    {
        let from = self.current;
        let (to, follow_up, unexpected) = match table.lookup(from, event) {
            Some(transition) => {
                let follow_up = (transition.action)(ctx);
                (transition.next, follow_up, false)
            }
            None => {
                warn!(
                    "{}: unexpected event {} in state {}",
                    self.name,
                    event.name(),
                    from.name()
                );
                self.unexpected = self.unexpected.saturating_add(1);
                (from, None, true)
            }
        };

        self.current = to;
        self.transitions = self.transitions.saturating_add(1);
        self.trace.write(TransitionRecord {
            from,
            event,
            to,
            unexpected,
        });
        if from != to {
            trace!(
                "{}: {} --{}--> {}",
                self.name,
                from.name(),
                event.name(),
                to.name()
            );
        }

        follow_up
    }

    pub fn dump(&self) {
        info!(
            "{}: state={} transitions={} unexpected={}",
            self.name,
            self.current.name(),
            self.transitions,
            self.unexpected
        );
        for record in self.trace() {
            info!(
                "{}:   {} --{}--> {}{}",
                self.name,
                record.from.name(),
                record.event.name(),
                record.to.name(),
                if record.unexpected { " (unexpected)" } else { "" }
            );
        }
    }
}
