use crate::error::Result;
use crate::regex::ast::{Modifier, Node};
use crate::regex::nfa::{Guard, Nfa, NfaBuilder, StateId};
use crate::regex::parser::parse;
use tracing::debug;

/// Parse and compile a pattern. Malformed patterns fail here, before any
/// scanning starts.
pub fn compile(pattern: &str) -> Result<Nfa> {
    let tree = parse(pattern)?;
    let nfa = compile_ast(&tree);
    debug!(
        pattern,
        states = nfa.len(),
        transitions = nfa.transition_count(),
        epsilons = nfa.epsilon_count(),
        "compiled pattern"
    );
    Ok(nfa)
}

/// Compile a syntax tree. The root fragment's tail becomes the success state.
pub fn compile_ast(root: &Node) -> Nfa {
    let mut compiler = Compiler {
        builder: NfaBuilder::new(),
    };
    let fragment = compiler.compile_node(root);
    compiler.builder.set_success(fragment.tail);
    compiler.builder.finish(fragment.head)
}

/// A compiled sub-automaton. The tail has no outgoing edges until the
/// caller wires it.
#[derive(Debug, Clone, Copy)]
struct Fragment {
    head: StateId,
    tail: StateId,
}

struct Compiler {
    builder: NfaBuilder,
}

impl Compiler {
    fn compile_node(&mut self, node: &Node) -> Fragment {
        match node {
            Node::Character(c) => self.single(Guard::Char(*c)),
            Node::Wildcard => self.single(Guard::AnyExceptNewline),
            Node::Group(children) => self.group(children),
            Node::Branch(alternatives) => self.branch(alternatives),
            Node::Modifier { modifier, child } => self.modifier(*modifier, child),
        }
    }

    fn single(&mut self, guard: Guard) -> Fragment {
        let head = self.builder.add_state();
        let tail = self.builder.add_state();
        self.builder.add_transition(head, tail, guard);
        Fragment { head, tail }
    }

    fn group(&mut self, children: &[Node]) -> Fragment {
        let Some((first, rest)) = children.split_first() else {
            // Zero-width
            let state = self.builder.add_state();
            return Fragment {
                head: state,
                tail: state,
            };
        };

        let mut fragment = self.compile_node(first);
        for child in rest {
            let next = self.compile_node(child);
            self.builder.add_epsilon(fragment.tail, next.head);
            fragment.tail = next.tail;
        }
        fragment
    }

    fn branch(&mut self, alternatives: &[Node]) -> Fragment {
        let head = self.builder.add_state();
        let tail = self.builder.add_state();
        for alternative in alternatives {
            let inner = self.compile_node(alternative);
            self.builder.add_epsilon(head, inner.head);
            self.builder.add_epsilon(inner.tail, tail);
        }
        Fragment { head, tail }
    }

    fn modifier(&mut self, modifier: Modifier, child: &Node) -> Fragment {
        let inner = self.compile_node(child);
        let start = self.builder.add_state();
        let end = self.builder.add_state();

        if modifier.allows_zero() {
            self.builder.add_epsilon(start, end);
        }
        self.builder.add_epsilon(start, inner.head);
        if modifier != Modifier::ZeroOrOne {
            self.builder.add_epsilon(inner.tail, start);
        }
        self.builder.add_epsilon(inner.tail, end);

        Fragment {
            head: start,
            tail: end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ParseError};

    fn success_states(nfa: &Nfa) -> Vec<StateId> {
        nfa.states()
            .filter(|(_, s)| s.success)
            .map(|(id, _)| id)
            .collect()
    }

    #[test]
    fn test_single_character() {
        let nfa = compile("a").unwrap();
        let head = nfa.state(nfa.head());
        assert_eq!(head.transitions.len(), 1);
        assert_eq!(head.transitions[0].guard, Guard::Char('a'));
        assert!(nfa.state(head.transitions[0].to).success);
        assert_eq!(success_states(&nfa).len(), 1);
    }

    #[test]
    fn test_concatenation_uses_epsilons() {
        let nfa = compile("abc").unwrap();
        assert_eq!(nfa.len(), 6);
        assert_eq!(nfa.transition_count(), 3);
        assert_eq!(nfa.epsilon_count(), 2);
    }

    #[test]
    fn test_empty_pattern_is_zero_width() {
        let nfa = compile("").unwrap();
        assert_eq!(nfa.len(), 1);
        assert!(nfa.state(nfa.head()).success);
    }

    #[test]
    fn test_branch_shape() {
        let nfa = compile("a|b").unwrap();
        // Root group wraps the branch: its head fans out to both alternatives
        let head = nfa.state(nfa.head());
        assert_eq!(head.epsilons.len(), 2);
        assert!(head.transitions.is_empty());
    }

    #[test]
    fn test_zero_or_many_shape() {
        let nfa = compile("a*").unwrap();
        let start = nfa.state(nfa.head());
        // skip edge first, then into the loop body
        assert_eq!(start.epsilons.len(), 2);
        let end = start.epsilons[0];
        assert!(nfa.state(end).success);

        let inner_head = nfa.state(start.epsilons[1]);
        let inner_tail = nfa.state(inner_head.transitions[0].to);
        assert_eq!(inner_tail.epsilons, vec![nfa.head(), end]);
    }

    #[test]
    fn test_one_or_many_has_no_skip() {
        let nfa = compile("a+").unwrap();
        let start = nfa.state(nfa.head());
        assert_eq!(start.epsilons.len(), 1);
        assert!(!nfa.state(start.epsilons[0]).success);
    }

    #[test]
    fn test_zero_or_one_has_no_loop() {
        let nfa = compile("a?").unwrap();
        let start = nfa.state(nfa.head());
        assert_eq!(start.epsilons.len(), 2);
        let inner_head = nfa.state(start.epsilons[1]);
        let inner_tail = nfa.state(inner_head.transitions[0].to);
        assert_eq!(inner_tail.epsilons.len(), 1);
        assert!(nfa.state(inner_tail.epsilons[0]).success);
    }

    #[test]
    fn test_malformed_patterns_fail() {
        assert!(matches!(
            compile("(ab"),
            Err(Error::Parse(ParseError::UnclosedGroup { position: 0 }))
        ));
        assert!(matches!(
            compile("ab)"),
            Err(Error::Parse(ParseError::UnmatchedClose { position: 2 }))
        ));
    }

    #[test]
    fn test_compile_ast_matches_compile() {
        let tree = parse("(G|g)od").unwrap();
        let from_ast = compile_ast(&tree);
        let from_str = compile("(G|g)od").unwrap();
        assert_eq!(from_ast.to_string(), from_str.to_string());
    }
}
