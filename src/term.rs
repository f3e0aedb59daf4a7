//! Terms: the units an expression is cut into.

use std::fmt;

use crate::combinator::registry::Registry;
use crate::combinator::Combinator;

/// A term at the head of an expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Term<'r> {
    /// A parenthesized term, parentheses included.
    Compound(String),

    /// A variable, `[a-z][_0-9]*`.
    Variable(String),

    /// A registered combinator.
    Macro(&'r Combinator),

    /// Any other single character.
    Opaque(char),
}

/// An iterator over the terms of an expression.
pub struct Terms<'a, 'r> {
    rest: &'a str,
    registry: &'r Registry,
}

impl fmt::Display for Term<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Term::Compound(ref s) | Term::Variable(ref s) => f.write_str(s),
            Term::Macro(c) => f.write_str(c.name()),
            Term::Opaque(c) => write!(f, "{}", c),
        }
    }
}

impl Term<'_> {
    /// Returns the length in bytes of the text of the term.
    pub fn len(&self) -> usize {
        match *self {
            Term::Compound(ref s) | Term::Variable(ref s) => s.len(),
            Term::Macro(c) => c.name().len(),
            Term::Opaque(c) => c.len_utf8(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Length of the compound term at the start of `input`, or of all of `input`
/// if its first parenthesis is never closed.
fn compound_len(input: &str) -> usize {
    let mut depth = 0isize;
    for (i, c) in input.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => (),
        }
        if depth == 0 {
            return i + c.len_utf8();
        }
    }
    input.len()
}

/// Length of the variable at the start of `input`, which must begin with an
/// ASCII lowercase letter.
fn variable_len(input: &str) -> usize {
    input[1..]
        .find(|c: char| !(c.is_ascii_digit() || c == '_'))
        .map_or(input.len(), |n| n + 1)
}

/// Splits the head term off `input`.
///
/// Returns `None` for an empty input. A compound term or variable whose text is
/// exactly a registered name is a [`Term::Macro`].
pub fn split_term<'a, 'r>(input: &'a str, registry: &'r Registry) -> Option<(Term<'r>, &'a str)> {
    let first = input.chars().next()?;
    let len = match first {
        '(' => compound_len(input),
        'a'..='z' => variable_len(input),
        _ => {
            if let Some(c) = registry.find_prefix(input) {
                return Some((Term::Macro(c), &input[c.name().len()..]));
            }
            first.len_utf8()
        }
    };
    let (head, rest) = input.split_at(len);
    let term = match (registry.get(head), first) {
        (Some(c), _) => Term::Macro(c),
        (None, '(') => Term::Compound(head.to_owned()),
        (None, 'a'..='z') => Term::Variable(head.to_owned()),
        (None, _) => Term::Opaque(first),
    };
    Some((term, rest))
}

/// Removes the head term from `buffer` and returns it.
pub fn take_term<'r>(buffer: &mut String, registry: &'r Registry) -> Option<Term<'r>> {
    let (term, rest) = split_term(buffer, registry)?;
    let n = buffer.len() - rest.len();
    buffer.drain(..n);
    Some(term)
}

/// Iterates over the terms of `input` without modifying it.
pub fn terms<'a, 'r>(input: &'a str, registry: &'r Registry) -> Terms<'a, 'r> {
    Terms {
        rest: input,
        registry,
    }
}

impl<'a, 'r> Iterator for Terms<'a, 'r> {
    type Item = Term<'r>;

    fn next(&mut self) -> Option<Self::Item> {
        let (term, rest) = split_term(self.rest, self.registry)?;
        self.rest = rest;
        Some(term)
    }
}

/// Checks that parentheses in `input` are balanced and never close early.
pub fn is_balanced(input: &str) -> bool {
    let mut depth = 0isize;
    for c in input.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => (),
        }
        if depth < 0 {
            return false;
        }
    }
    depth == 0
}
