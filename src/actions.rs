use heapless::Vec;

/// Ordered side effects recorded by a machine during one dispatch.
///
/// Overflow drops the action and counts it; the caller decides whether a
/// non-zero [`ActionBuffer::dropped`] is worth reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionBuffer<A, const N: usize> {
    slots: Vec<A, N>,
    dropped: u8,
}

impl<A, const N: usize> ActionBuffer<A, N> {
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            dropped: 0,
        }
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.dropped = 0;
    }

    pub fn push(&mut self, action: A) {
        if self.slots.push(action).is_err() {
            self.dropped = self.dropped.saturating_add(1);
            error!("action buffer full; dropped={}", self.dropped);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn dropped(&self) -> u8 {
        self.dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &A> {
        self.slots.iter()
    }

    pub fn as_slice(&self) -> &[A] {
        &self.slots
    }
}

impl<A: PartialEq, const N: usize> ActionBuffer<A, N> {
    pub fn contains(&self, action: &A) -> bool {
        self.slots.iter().any(|a| a == action)
    }
}

impl<A, const N: usize> Default for ActionBuffer<A, N> {
    fn default() -> Self {
        Self::new()
    }
}
