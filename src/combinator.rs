//! Combinator definitions and their substitution templates.

use std::fmt;
use std::num::ParseIntError;

use failure::Fail;

pub mod registry;

/// A substitution template.
///
/// Every ASCII digit `0`–`9` is a placeholder for the collected argument at that
/// index; every other character is literal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template(String);

/// A named rewrite rule of fixed arity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Combinator {
    name: String,
    arity: usize,
    template: Template,
}

/// A template placeholder with no collected argument behind it.
#[derive(Debug, Fail, PartialEq)]
#[fail(
    display = "placeholder {} refers past the {} collected argument(s)",
    index, available
)]
pub struct UnboundPlaceholder {
    pub index: usize,
    pub available: usize,
}

/// A malformed definition record.
#[derive(Debug, Fail, PartialEq)]
pub enum DefinitionError {
    #[fail(display = "expected 2 or 3 fields, found {}", _0)]
    FieldCount(usize),

    #[fail(display = "invalid arity {:?}: {}", value, cause)]
    Arity {
        value: String,
        #[cause]
        cause: ParseIntError,
    },

    #[fail(display = "empty combinator name")]
    EmptyName,
}

impl Template {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Template(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Replaces each placeholder with the argument it names.
    pub fn substitute<S: AsRef<str>>(&self, args: &[S]) -> Result<String, UnboundPlaceholder> {
        let mut out = String::with_capacity(self.0.len());
        for c in self.0.chars() {
            match c.to_digit(10) {
                Some(d) => {
                    let index = d as usize;
                    let arg = args.get(index).ok_or(UnboundPlaceholder {
                        index,
                        available: args.len(),
                    })?;
                    out.push_str(arg.as_ref());
                }
                None => out.push(c),
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Combinator {
    /// Creates a combinator without checking the template against the arity.
    pub fn new<N, T>(name: N, arity: usize, template: T) -> Self
    where
        N: Into<String>,
        T: Into<String>,
    {
        Combinator {
            name: name.into(),
            arity,
            template: Template::new(template),
        }
    }

    /// Builds a combinator from a `name, template` or `name, arity, template`
    /// record. The two-field form is a constant of arity 0.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self, DefinitionError> {
        let fields: Vec<&str> = fields.iter().map(|f| f.as_ref()).collect();
        let (name, arity, template) = match *fields.as_slice() {
            [name, template] => (name, 0, template),
            [name, arity, template] => {
                let n = arity.parse::<usize>().map_err(|cause| DefinitionError::Arity {
                    value: arity.to_owned(),
                    cause,
                })?;
                (name, n, template)
            }
            _ => return Err(DefinitionError::FieldCount(fields.len())),
        };
        if name.is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        Ok(Combinator::new(name, arity, template))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Rewrites the collected arguments. A constant yields its template verbatim.
    pub fn apply<S: AsRef<str>>(&self, args: &[S]) -> Result<String, UnboundPlaceholder> {
        if self.arity == 0 {
            return Ok(self.template.0.clone());
        }
        self.template.substitute(args)
    }
}

/// Formats as a line of a definitions source.
impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}, {}, {}", self.name, self.arity, self.template)
    }
}
