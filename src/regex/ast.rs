use std::fmt;

/// Repetition kind applied by a modifier expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// `?`
    ZeroOrOne,
    /// `*`
    ZeroOrMany,
    /// `+`
    OneOrMany,
}

impl Modifier {
    pub fn symbol(&self) -> char {
        match self {
            Modifier::ZeroOrOne => '?',
            Modifier::ZeroOrMany => '*',
            Modifier::OneOrMany => '+',
        }
    }

    /// Whether the wrapped expression may be skipped entirely
    pub fn allows_zero(&self) -> bool {
        !matches!(self, Modifier::OneOrMany)
    }
}

/// Pattern syntax tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Sequential composition of the children
    Group(Vec<Node>),
    /// Each child is a complete alternative
    Branch(Vec<Node>),
    /// One literal code point
    Character(char),
    /// Any code point except line feed
    Wildcard,
    /// A repeated or optional child
    Modifier { modifier: Modifier, child: Box<Node> },
}

impl Node {
    pub fn modified(modifier: Modifier, child: Node) -> Self {
        Node::Modifier {
            modifier,
            child: Box::new(child),
        }
    }

    /// Group of character literals, one per code point of `text`
    pub fn literal_group(text: &str) -> Self {
        Node::Group(text.chars().map(Node::Character).collect())
    }

    /// Number of nodes in the tree, including this one
    pub fn size(&self) -> usize {
        match self {
            Node::Group(children) | Node::Branch(children) => {
                1 + children.iter().map(Node::size).sum::<usize>()
            }
            Node::Modifier { child, .. } => 1 + child.size(),
            Node::Character(_) | Node::Wildcard => 1,
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match self {
            Node::Group(children) => {
                writeln!(f, "{pad}Group")?;
                for child in children {
                    child.write_indented(f, depth + 1)?;
                }
                Ok(())
            }
            Node::Branch(children) => {
                writeln!(f, "{pad}Branch")?;
                for child in children {
                    child.write_indented(f, depth + 1)?;
                }
                Ok(())
            }
            Node::Character(c) => writeln!(f, "{pad}Literal {c:?}"),
            Node::Wildcard => writeln!(f, "{pad}Wildcard"),
            Node::Modifier { modifier, child } => {
                writeln!(f, "{pad}Modifier {}", modifier.symbol())?;
                child.write_indented(f, depth + 1)
            }
        }
    }
}

/// Indented tree rendering, one node per line
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}
