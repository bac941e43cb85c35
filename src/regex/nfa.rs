use std::fmt;

/// Index of a state in its automaton's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(u32);

impl StateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Predicate over one input code point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Exactly this code point
    Char(char),
    /// Any code point except line feed
    AnyExceptNewline,
}

impl Guard {
    #[inline]
    pub fn accepts(&self, c: char) -> bool {
        match self {
            Guard::Char(expected) => *expected == c,
            Guard::AnyExceptNewline => c != '\n',
        }
    }

    /// Human-readable label used in automaton dumps
    pub fn label(&self) -> String {
        match self {
            Guard::Char(c) => format!("{c:?}"),
            Guard::AnyExceptNewline => "any".to_string(),
        }
    }
}

/// A guarded edge between two states
#[derive(Debug, Clone)]
pub struct Transition {
    pub to: StateId,
    pub guard: Guard,
    pub label: String,
}

/// One automaton state. Terminality is a flag, not structural.
#[derive(Debug, Clone, Default)]
pub struct State {
    pub transitions: Vec<Transition>,
    pub epsilons: Vec<StateId>,
    pub success: bool,
}

/// A compiled automaton. Read-only once built; safe to share across
/// threads, with each scan owning its own [`Runner`](crate::regex::Runner).
#[derive(Debug, Clone)]
pub struct Nfa {
    states: Vec<State>,
    head: StateId,
}

impl Nfa {
    pub fn head(&self) -> StateId {
        self.head
    }

    #[inline]
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    /// Number of states in the arena
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterate states with their ids, in allocation order
    pub fn states(&self) -> impl Iterator<Item = (StateId, &State)> {
        self.states
            .iter()
            .enumerate()
            .map(|(i, s)| (StateId(i as u32), s))
    }

    pub fn transition_count(&self) -> usize {
        self.states.iter().map(|s| s.transitions.len()).sum()
    }

    pub fn epsilon_count(&self) -> usize {
        self.states.iter().map(|s| s.epsilons.len()).sum()
    }
}

/// Textual dump: one block per state, guarded edges then epsilon edges
impl fmt::Display for Nfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, state) in self.states() {
            write!(f, "{id}")?;
            if id == self.head {
                write!(f, " (head)")?;
            }
            if state.success {
                write!(f, " (success)")?;
            }
            writeln!(f)?;
            for t in &state.transitions {
                writeln!(f, "  --{}--> {}", t.label, t.to)?;
            }
            for to in &state.epsilons {
                writeln!(f, "  --ε--> {to}")?;
            }
        }
        Ok(())
    }
}

/// Arena builder. States are only ever added and wired, never merged.
#[derive(Debug, Default)]
pub(crate) struct NfaBuilder {
    states: Vec<State>,
}

impl NfaBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_state(&mut self) -> StateId {
        let id = StateId(self.states.len() as u32);
        self.states.push(State::default());
        id
    }

    pub(crate) fn add_transition(&mut self, from: StateId, to: StateId, guard: Guard) {
        self.states[from.index()].transitions.push(Transition {
            to,
            guard,
            label: guard.label(),
        });
    }

    pub(crate) fn add_epsilon(&mut self, from: StateId, to: StateId) {
        self.states[from.index()].epsilons.push(to);
    }

    pub(crate) fn set_success(&mut self, id: StateId) {
        self.states[id.index()].success = true;
    }

    pub(crate) fn finish(self, head: StateId) -> Nfa {
        Nfa {
            states: self.states,
            head,
        }
    }
}
