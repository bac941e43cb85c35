/// A lexed pattern symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// Literal code point
    Character(char),
    /// `.`
    Wildcard,
    /// `|`
    Pipe,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
    /// `?`
    ZeroOrOne,
}

impl Symbol {
    /// Classify a single code point. Anything unrecognized is a literal.
    pub fn from_char(c: char) -> Self {
        match c {
            '.' => Symbol::Wildcard,
            '|' => Symbol::Pipe,
            '(' => Symbol::LParen,
            ')' => Symbol::RParen,
            '*' => Symbol::ZeroOrMore,
            '+' => Symbol::OneOrMore,
            '?' => Symbol::ZeroOrOne,
            other => Symbol::Character(other),
        }
    }

    /// True for `*`, `+` and `?`
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Symbol::ZeroOrMore | Symbol::OneOrMore | Symbol::ZeroOrOne
        )
    }

    /// The source character this symbol was lexed from
    pub fn as_char(&self) -> char {
        match self {
            Symbol::Character(c) => *c,
            Symbol::Wildcard => '.',
            Symbol::Pipe => '|',
            Symbol::LParen => '(',
            Symbol::RParen => ')',
            Symbol::ZeroOrMore => '*',
            Symbol::OneOrMore => '+',
            Symbol::ZeroOrOne => '?',
        }
    }
}

/// Lex a pattern into one symbol per code point. Never fails.
pub fn lex(pattern: &str) -> Vec<Symbol> {
    pattern.chars().map(Symbol::from_char).collect()
}
