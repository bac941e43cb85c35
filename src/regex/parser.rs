use crate::error::ParseError;
use crate::regex::ast::{Modifier, Node};
use crate::regex::lexer::{lex, Symbol};

/// Parse a pattern into a syntax tree. The root is always a [`Node::Group`].
pub fn parse(pattern: &str) -> Result<Node, ParseError> {
    Parser::new(lex(pattern)).parse()
}

/// Parse an already-lexed symbol sequence
pub fn parse_symbols(symbols: Vec<Symbol>) -> Result<Node, ParseError> {
    Parser::new(symbols).parse()
}

/// Children collected so far for one open fragment
enum Fragment {
    /// Plain concatenation
    Sequence(Vec<Node>),
    /// At least one `|` seen; the last entry is the append point
    Alternatives(Vec<Vec<Node>>),
}

/// An open fragment on the parser stack
struct Frame {
    fragment: Fragment,
    /// Position of the `(` that opened this frame; `None` for the root
    opened_at: Option<usize>,
}

impl Frame {
    fn new(opened_at: Option<usize>) -> Self {
        Self {
            fragment: Fragment::Sequence(Vec::new()),
            opened_at,
        }
    }

    /// Append to the current append point: the sequence itself, or the
    /// newest alternative.
    fn append(&mut self, child: Node) {
        match &mut self.fragment {
            Fragment::Sequence(children) => children.push(child),
            Fragment::Alternatives(alternatives) => match alternatives.last_mut() {
                Some(children) => children.push(child),
                None => alternatives.push(vec![child]),
            },
        }
    }

    /// Start a new alternative, turning the frame into a branch if needed
    fn split(&mut self) {
        let fragment = std::mem::replace(&mut self.fragment, Fragment::Sequence(Vec::new()));
        self.fragment = match fragment {
            Fragment::Alternatives(mut alternatives) => {
                alternatives.push(Vec::new());
                Fragment::Alternatives(alternatives)
            }
            Fragment::Sequence(first) => Fragment::Alternatives(vec![first, Vec::new()]),
        };
    }

    fn into_node(self) -> Node {
        match self.fragment {
            Fragment::Sequence(children) => Node::Group(children),
            Fragment::Alternatives(alternatives) => {
                Node::Branch(alternatives.into_iter().map(Node::Group).collect())
            }
        }
    }
}

struct Parser {
    symbols: Vec<Symbol>,
    stack: Vec<Frame>,
}

impl Parser {
    fn new(symbols: Vec<Symbol>) -> Self {
        Self {
            symbols,
            stack: vec![Frame::new(None)],
        }
    }

    fn parse(mut self) -> Result<Node, ParseError> {
        for pos in 0..self.symbols.len() {
            let symbol = self.symbols[pos];
            match symbol {
                Symbol::Character(c) => {
                    let node = self.wrap_with_modifier(pos, Node::Character(c));
                    self.current().append(node);
                }
                Symbol::Wildcard => {
                    let node = self.wrap_with_modifier(pos, Node::Wildcard);
                    self.current().append(node);
                }
                Symbol::LParen => self.stack.push(Frame::new(Some(pos))),
                Symbol::RParen => {
                    let inner = match self.stack.pop() {
                        Some(frame) if !self.stack.is_empty() => frame,
                        _ => return Err(ParseError::UnmatchedClose { position: pos }),
                    };
                    let node = self.wrap_with_modifier(pos, inner.into_node());
                    self.current().append(node);
                }
                Symbol::Pipe => self.current().split(),
                _ => {
                    // Modifiers are consumed by the atom before them
                    if !self.is_modifiable(pos) {
                        return Err(ParseError::DanglingModifier {
                            position: pos,
                            symbol: symbol.as_char(),
                        });
                    }
                }
            }
        }

        if self.stack.len() > 1 {
            let position = self.stack[1].opened_at.unwrap_or_default();
            return Err(ParseError::UnclosedGroup { position });
        }

        let root = self
            .stack
            .pop()
            .map(Frame::into_node)
            .unwrap_or(Node::Group(Vec::new()));
        Ok(match root {
            Node::Group(_) => root,
            other => Node::Group(vec![other]),
        })
    }

    fn current(&mut self) -> &mut Frame {
        let top = self.stack.len() - 1;
        &mut self.stack[top]
    }

    /// A modifier at `pos` applies to the symbol before it, which must be
    /// a character, a wildcard, or a closing parenthesis.
    fn is_modifiable(&self, pos: usize) -> bool {
        pos > 0
            && matches!(
                self.symbols[pos - 1],
                Symbol::Character(_) | Symbol::Wildcard | Symbol::RParen
            )
    }

    /// Wrap `node` if the next symbol is a modifier
    fn wrap_with_modifier(&self, pos: usize, node: Node) -> Node {
        let modifier = match self.symbols.get(pos + 1) {
            Some(Symbol::ZeroOrMore) => Modifier::ZeroOrMany,
            Some(Symbol::OneOrMore) => Modifier::OneOrMany,
            Some(Symbol::ZeroOrOne) => Modifier::ZeroOrOne,
            _ => return node,
        };
        Node::modified(modifier, node)
    }
}
