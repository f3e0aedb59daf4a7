//! Step-wise rewriting of combinatory-logic expressions.
//!
//! An expression is a flat string of juxtaposed terms such as `Sabc` or
//! `S(KI)ab`. An [`Engine`] owns such a string and rewrites its head one step at
//! a time, using the named combinators of a [`Registry`].
//!
//! ```
//! use clstep::Engine;
//!
//! # fn main() -> Result<(), clstep::StepError> {
//! let mut e = Engine::new("Sabc");
//! e.step()?;
//! assert_eq!(e.current_value(), "ac(bc)");
//! # Ok(())
//! # }
//! ```

pub mod combinator;
pub mod engine;
pub mod term;

pub use combinator::registry::{parse_definitions, LoadError, Registry};
pub use combinator::{Combinator, DefinitionError, Template};
pub use engine::{Config, Engine, Reduction, StepError};
pub use term::Term;
