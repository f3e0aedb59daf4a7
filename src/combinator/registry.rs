//! An ordered collection of combinators.

use super::*;

use std::fs;
use std::io;
use std::iter::FromIterator;
use std::path::Path;
use std::slice;

use log::info;

/// The seed combinators as `(name, arity, template)`.
pub const BUILTINS: [(&str, usize, &str); 5] = [
    ("S", 3, "02(12)"),
    ("K", 2, "0"),
    ("I", 1, "0"),
    ("B", 3, "0(12)"),
    ("C", 3, "021"),
];

/// Characters dropped from every line of a definitions source.
const BLANKS: [char; 3] = [' ', '\u{3000}', '\t'];

/// An ordered list of combinators.
///
/// Lookup is first-match: an earlier definition shadows any later one whose
/// name it prefixes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registry(Vec<Combinator>);

/// A failure to load a definitions source.
#[derive(Debug, Fail)]
pub enum LoadError {
    #[fail(display = "cannot read combinator definitions: {}", _0)]
    Io(#[cause] io::Error),

    #[fail(display = "line {}: {}", line, error)]
    Definition {
        line: usize,
        #[cause]
        error: DefinitionError,
    },
}

impl From<io::Error> for LoadError {
    fn from(e: io::Error) -> Self {
        LoadError::Io(e)
    }
}

/// Parses a definitions source, one definition per line.
///
/// Spaces, full-width spaces and tabs are removed before anything else. Lines
/// left empty are skipped, as are lines starting with `#`.
pub fn parse_definitions(source: &str) -> Result<Vec<Combinator>, LoadError> {
    let mut v = Vec::new();
    for (i, line) in source.lines().enumerate() {
        let line: String = line.chars().filter(|c| !BLANKS.contains(c)).collect();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        let c = Combinator::from_fields(&fields[..])
            .map_err(|error| LoadError::Definition { line: i + 1, error })?;
        v.push(c);
    }
    Ok(v)
}

impl Default for Registry {
    fn default() -> Self {
        Registry::builtins()
    }
}

impl FromIterator<Combinator> for Registry {
    fn from_iter<I: IntoIterator<Item = Combinator>>(iter: I) -> Self {
        Registry(Vec::from_iter(iter))
    }
}

impl Extend<Combinator> for Registry {
    fn extend<I: IntoIterator<Item = Combinator>>(&mut self, iter: I) {
        self.0.extend(iter)
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Combinator;
    type IntoIter = slice::Iter<'a, Combinator>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Registry {
    /// Creates a registry with exactly the given combinators, without the
    /// built-ins.
    pub fn new(combinators: Vec<Combinator>) -> Self {
        Registry(combinators)
    }

    /// Creates a registry holding only `S`, `K`, `I`, `B` and `C`.
    pub fn builtins() -> Self {
        BUILTINS
            .iter()
            .map(|&(name, arity, template)| Combinator::new(name, arity, template))
            .collect()
    }

    /// Creates a registry of the built-ins followed by the definitions in the
    /// file at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let mut r = Registry::builtins();
        r.append_file(path)?;
        Ok(r)
    }

    pub fn push(&mut self, c: Combinator) {
        self.0.push(c)
    }

    /// Appends one `name, template` or `name, arity, template` record.
    pub fn append_record<S: AsRef<str>>(&mut self, fields: &[S]) -> Result<(), DefinitionError> {
        self.push(Combinator::from_fields(fields)?);
        Ok(())
    }

    /// Appends a batch of records. Nothing is appended unless every record is
    /// well-formed.
    pub fn append_records<I, R, S>(&mut self, records: I) -> Result<(), DefinitionError>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let v = records
            .into_iter()
            .map(|r| Combinator::from_fields(r.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.extend(v);
        Ok(())
    }

    /// Appends the definitions of a source text. The registry is unchanged on
    /// failure.
    pub fn append_source(&mut self, source: &str) -> Result<(), LoadError> {
        let v = parse_definitions(source)?;
        info!("loaded {} combinator definition(s)", v.len());
        self.extend(v);
        Ok(())
    }

    /// Appends the definitions of the file at `path`. The registry is unchanged
    /// on failure.
    pub fn append_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), LoadError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        let v = parse_definitions(&source)?;
        info!(
            "loaded {} combinator definition(s) from {}",
            v.len(),
            path.display()
        );
        self.extend(v);
        Ok(())
    }

    /// Gets the first combinator named exactly `name`. Combinators with an
    /// empty name are never found.
    pub fn get(&self, name: &str) -> Option<&Combinator> {
        self.0.iter().find(|c| !c.name.is_empty() && c.name == name)
    }

    /// Gets the first combinator whose name is a prefix of `input`.
    /// Combinators with an empty name are never found.
    pub fn find_prefix(&self, input: &str) -> Option<&Combinator> {
        self.0
            .iter()
            .find(|c| !c.name.is_empty() && input.starts_with(c.name.as_str()))
    }

    pub fn iter(&self) -> slice::Iter<Combinator> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
