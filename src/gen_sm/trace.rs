pub const TRACE_DEPTH: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionRecord<S, E> {
    pub from: S,
    pub event: E,
    pub to: S,
    pub unexpected: bool,
}
