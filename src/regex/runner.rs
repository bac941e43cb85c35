use crate::regex::nfa::{Nfa, StateId};

/// Aggregate status of the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No active branches remain
    Fail,
    /// Some branches are alive, none terminal
    Normal,
    /// At least one active branch is terminal
    Success,
}

/// Set of state ids with O(1) membership, iterated in insertion order
#[derive(Debug, Clone)]
struct ActiveSet {
    members: Vec<StateId>,
    present: Vec<bool>,
}

impl ActiveSet {
    fn with_capacity(states: usize) -> Self {
        Self {
            members: Vec::with_capacity(states),
            present: vec![false; states],
        }
    }

    /// Insert `id`; returns false if it was already present
    #[inline]
    fn insert(&mut self, id: StateId) -> bool {
        let seen = &mut self.present[id.index()];
        if *seen {
            return false;
        }
        *seen = true;
        self.members.push(id);
        true
    }

    fn clear(&mut self) {
        for id in self.members.drain(..) {
            self.present[id.index()] = false;
        }
    }
}

/// Simulates an [`Nfa`] over input one code point at a time, tracking
/// every live branch in parallel. Owned by exactly one scan.
pub struct Runner<'n> {
    nfa: &'n Nfa,
    active: ActiveSet,
    scratch: ActiveSet,
    stack: Vec<StateId>,
    closed: bool,
}

impl<'n> Runner<'n> {
    /// Create a runner positioned at the automaton's head
    pub fn new(nfa: &'n Nfa) -> Self {
        let mut runner = Self {
            nfa,
            active: ActiveSet::with_capacity(nfa.len()),
            scratch: ActiveSet::with_capacity(nfa.len()),
            stack: Vec::new(),
            closed: false,
        };
        runner.reset();
        runner
    }

    /// Active set := epsilon-closure of the head state
    pub fn reset(&mut self) {
        self.active.clear();
        self.active.insert(self.nfa.head());
        self.closed = false;
        self.close();
    }

    /// Consume one code point and report the resulting status
    pub fn next(&mut self, c: char) -> Status {
        self.close();

        let nfa = self.nfa;
        self.scratch.clear();
        for &id in &self.active.members {
            for transition in &nfa.state(id).transitions {
                if transition.guard.accepts(c) {
                    self.scratch.insert(transition.to);
                }
            }
        }
        std::mem::swap(&mut self.active, &mut self.scratch);
        self.closed = false;

        self.close();
        self.status()
    }

    pub fn status(&self) -> Status {
        if self.active.members.is_empty() {
            return Status::Fail;
        }
        let nfa = self.nfa;
        if self.active.members.iter().any(|&id| nfa.state(id).success) {
            Status::Success
        } else {
            Status::Normal
        }
    }

    /// Currently active states, in discovery order
    pub fn active_states(&self) -> &[StateId] {
        &self.active.members
    }

    /// Extend the active set along epsilon edges. The membership mask
    /// doubles as the visited set, so cycles terminate.
    fn close(&mut self) {
        if self.closed {
            return;
        }
        let nfa = self.nfa;
        self.stack.clear();
        self.stack.extend_from_slice(&self.active.members);
        while let Some(id) = self.stack.pop() {
            for &to in &nfa.state(id).epsilons {
                if self.active.insert(to) {
                    self.stack.push(to);
                }
            }
        }
        self.closed = true;
    }
}
