//! The reduction engine.
//!
//! An [`Engine`] rewrites the head of its buffer one step at a time. Each step
//! takes the head term and, depending on its kind:
//!
//! - a combinator collects its arguments from the following terms and is
//!   replaced by its template, or is put back unchanged if too few terms are
//!   left;
//! - a parenthesized term is reduced as far as it goes by a child engine, and
//!   the result replaces it without the parentheses;
//! - a variable or any other character ends stepping.

use std::fmt;
use std::rc::Rc;
use std::result;

use failure::Fail;
use log::{debug, trace};

use crate::combinator::registry::Registry;
use crate::combinator::{Combinator, UnboundPlaceholder};
use crate::term::{self, Term};

/// Engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// The number of rewrites a child engine may perform on one parenthesized
    /// term. The final step that makes no progress is not counted. Unbounded if
    /// `None`.
    pub sub_expression_limit: Option<usize>,
}

/// A rewriting engine over one expression.
pub struct Engine {
    buffer: String,
    progress: bool,
    registry: Rc<Registry>,
    config: Config,
}

/// The outcome of [`Engine::reduce`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reduction {
    /// Steps that rewrote the buffer.
    pub steps: usize,

    /// Whether stepping stopped by itself rather than at the step limit.
    pub converged: bool,
}

/// An error during a step. The buffer is left as it was before the step.
#[derive(Debug, Fail, PartialEq)]
pub enum StepError {
    #[fail(display = "cannot rewrite {}: {}", name, cause)]
    Substitution {
        name: String,
        #[cause]
        cause: UnboundPlaceholder,
    },

    #[fail(display = "{} did not settle within {} steps", term, limit)]
    Diverged { term: String, limit: usize },
}

type Result<T> = result::Result<T, StepError>;

impl Engine {
    /// Creates an engine over `expr` with the built-in combinators.
    pub fn new<S: Into<String>>(expr: S) -> Self {
        Engine::with_registry(expr, Rc::new(Registry::default()))
    }

    pub fn with_registry<S: Into<String>>(expr: S, registry: Rc<Registry>) -> Self {
        Engine::with_config(expr, registry, Config::default())
    }

    /// Creates an engine with the built-in combinators followed by
    /// `definitions`.
    pub fn with_definitions<S, I>(expr: S, definitions: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = Combinator>,
    {
        let mut r = Registry::default();
        r.extend(definitions);
        Engine::with_registry(expr, Rc::new(r))
    }

    pub fn with_config<S: Into<String>>(expr: S, registry: Rc<Registry>, config: Config) -> Self {
        Engine {
            buffer: expr.into(),
            progress: true,
            registry,
            config,
        }
    }

    /// Performs one rewrite at the head of the buffer.
    ///
    /// If the head cannot be rewritten, the buffer is left as it was and
    /// [`can_step`](Engine::can_step) becomes false.
    pub fn step(&mut self) -> Result<()> {
        let registry = Rc::clone(&self.registry);
        let head = match term::take_term(&mut self.buffer, &registry) {
            Some(t) => t,
            None => {
                self.progress = false;
                return Ok(());
            }
        };
        match head {
            Term::Macro(c) => self.apply(c, &registry),
            Term::Compound(ref s) => match self.reduce_compound(s) {
                Ok(ref r) if !r.is_empty() => {
                    self.buffer.insert_str(0, r);
                    self.progress = true;
                    Ok(())
                }
                Ok(_) => {
                    self.halt(&head);
                    Ok(())
                }
                Err(e) => {
                    self.buffer.insert_str(0, s);
                    Err(e)
                }
            },
            Term::Variable(_) | Term::Opaque(_) => {
                self.halt(&head);
                Ok(())
            }
        }
    }

    /// Puts an irreducible head back.
    fn halt(&mut self, head: &Term) {
        debug!("irreducible head {}", head);
        self.buffer.insert_str(0, &head.to_string());
        self.progress = false;
    }

    fn apply(&mut self, c: &Combinator, registry: &Registry) -> Result<()> {
        let mut args = Vec::with_capacity(c.arity());
        while args.len() < c.arity() {
            match term::take_term(&mut self.buffer, registry) {
                Some(t) => args.push(t.to_string()),
                None => {
                    debug!(
                        "{} is stuck with {} of {} argument(s)",
                        c.name(),
                        args.len(),
                        c.arity()
                    );
                    self.restore(c, &args);
                    self.progress = false;
                    return Ok(());
                }
            }
        }
        match c.apply(&args) {
            Ok(s) => {
                debug!("{}{} -> {}", c.name(), args.concat(), s);
                self.buffer.insert_str(0, &s);
                self.progress = true;
                Ok(())
            }
            Err(cause) => {
                self.restore(c, &args);
                Err(StepError::Substitution {
                    name: c.name().to_owned(),
                    cause,
                })
            }
        }
    }

    /// Puts a combinator and its collected arguments back, in order.
    fn restore(&mut self, c: &Combinator, args: &[String]) {
        let mut s = c.name().to_owned();
        s.push_str(&args.concat());
        self.buffer.insert_str(0, &s);
    }

    /// Reduces the inside of a parenthesized term until it stops making
    /// progress. The parentheses are dropped.
    fn reduce_compound(&self, s: &str) -> Result<String> {
        let inner = if term::is_balanced(s) {
            &s[1..s.len() - 1]
        } else {
            &s[1..]
        };
        trace!("entering {}", s);
        let mut child = Engine::with_config(inner, Rc::clone(&self.registry), self.config.clone());
        let mut n = 0;
        while child.can_step() {
            child.step()?;
            if !child.can_step() {
                break;
            }
            n += 1;
            if let Some(limit) = self.config.sub_expression_limit {
                if n > limit {
                    return Err(StepError::Diverged {
                        term: s.to_owned(),
                        limit,
                    });
                }
            }
        }
        trace!("leaving {} as {}", s, child.buffer);
        Ok(child.buffer)
    }

    /// Steps until no progress is made or `max_steps` steps have been taken.
    ///
    /// If a step fails, its error is returned and the number of steps already
    /// taken is not reported. The buffer holds the result of the last
    /// successful step.
    pub fn reduce(&mut self, max_steps: usize) -> Result<Reduction> {
        let mut steps = 0;
        for _ in 0..max_steps {
            if !self.progress {
                break;
            }
            self.step()?;
            if self.progress {
                steps += 1;
            }
        }
        Ok(Reduction {
            steps,
            converged: !self.progress,
        })
    }

    /// Appends `input` to the end of the buffer and allows stepping again.
    pub fn feed(&mut self, input: &str) {
        self.buffer.push_str(input);
        self.progress = true;
    }

    /// Whether the last step made progress.
    pub fn can_step(&self) -> bool {
        self.progress
    }

    pub fn current_value(&self) -> &str {
        &self.buffer
    }

    /// Checks that the parentheses of the buffer are balanced.
    pub fn is_well_formed(&self) -> bool {
        term::is_balanced(&self.buffer)
    }

    /// Counts the terms of the buffer.
    pub fn term_count(&self) -> usize {
        term::terms(&self.buffer, &self.registry).count()
    }

    pub fn registry(&self) -> &Rc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.buffer)
    }
}

#[cfg(test)]
mod tests {
    #![warn(dead_code)]

    use super::*;

    use quickcheck::{quickcheck, Arbitrary, Gen};
    use rand::Rng;

    macro_rules! assert_steps {
        ($e:expr, $($v:expr),+) => {{
            let mut e = Engine::new($e);
            $(
                e.step().unwrap();
                assert_eq!(e.current_value(), $v);
            )+
        }};
    }

    fn stepped(e: &mut Engine) -> Vec<String> {
        let mut v = vec![e.current_value().to_owned()];
        while e.can_step() && v.len() < 64 {
            e.step().unwrap();
            v.push(e.current_value().to_owned());
        }
        v
    }

    #[test]
    fn builtins() {
        assert_steps!("Ia", "a");
        assert_steps!("Kab", "a");
        assert_steps!("Sabc", "ac(bc)");
        assert_steps!("Babc", "a(bc)");
        assert_steps!("Cabc", "acb");
        assert_steps!("SKKa", "Ka(Ka)", "a");
        assert_steps!("Kx_1y_2z", "x_1z");
    }

    #[test]
    fn stuck() {
        let mut e = Engine::new("Ka");
        e.step().unwrap();
        assert_eq!(e.current_value(), "Ka");
        assert!(!e.can_step());
        e.step().unwrap();
        assert_eq!(e.current_value(), "Ka");
        assert!(!e.can_step());

        e.feed("b");
        assert!(e.can_step());
        e.step().unwrap();
        assert_eq!(e.current_value(), "a");

        let mut e = Engine::new("S(Ka)(bc)");
        e.step().unwrap();
        assert_eq!(e.current_value(), "S(Ka)(bc)");
        assert!(!e.can_step());
    }

    #[test]
    fn irreducible_head() {
        let mut e = Engine::new("aSKK");
        e.step().unwrap();
        assert_eq!(e.current_value(), "aSKK");
        assert!(!e.can_step());

        let mut e = Engine::new("?Ia");
        e.step().unwrap();
        assert_eq!(e.current_value(), "?Ia");
        assert!(!e.can_step());

        let mut e = Engine::new("");
        e.step().unwrap();
        assert_eq!(e.current_value(), "");
        assert!(!e.can_step());
    }

    #[test]
    fn compound() {
        assert_steps!("(Ia)b", "ab");
        assert_steps!("((Ia))b", "ab");
        assert_steps!("(Ka)bc", "Kabc", "ac");
        assert_steps!("(S(KI)a)b", "S(KI)ab");
        assert_steps!("(I(Ka)b)c", "ac");

        let mut e = Engine::new("()a");
        e.step().unwrap();
        assert_eq!(e.current_value(), "()a");
        assert!(!e.can_step());
    }

    #[test]
    fn reduce() {
        let mut e = Engine::new("S(K(SI))Kab");
        let r = e.reduce(100).unwrap();
        assert!(r.converged);
        assert_eq!(r.steps, 6);
        assert_eq!(e.current_value(), "b((Ka)b)");

        let mut e = Engine::new("Ia");
        assert_eq!(
            e.reduce(10).unwrap(),
            Reduction {
                steps: 1,
                converged: true,
            }
        );

        let mut e = Engine::new("SII(SII)");
        assert_eq!(
            e.reduce(50).unwrap(),
            Reduction {
                steps: 50,
                converged: false,
            }
        );
        assert!(e.is_well_formed());
    }

    #[test]
    fn unterminated_compound() {
        assert_steps!("(Ia", "a");
        assert_steps!("(Ka", "Ka");

        let mut e = Engine::new("(Ka");
        assert_eq!(e.term_count(), 1);
        e.reduce(10).unwrap();
        assert_eq!(e.current_value(), "Ka");
        assert!(!e.can_step());
    }

    #[test]
    fn sub_expression_limit_counts_rewrites() {
        let config = |n| Config {
            sub_expression_limit: Some(n),
        };
        let registry = Rc::new(Registry::default());

        let mut e = Engine::with_config("(Ia)b", Rc::clone(&registry), config(1));
        e.step().unwrap();
        assert_eq!(e.current_value(), "ab");

        let mut e = Engine::with_config("(SKKa)", Rc::clone(&registry), config(2));
        e.step().unwrap();
        assert_eq!(e.current_value(), "a");

        let mut e = Engine::with_config("(SKKa)", registry, config(1));
        assert_eq!(
            e.step(),
            Err(StepError::Diverged {
                term: "(SKKa)".to_owned(),
                limit: 1,
            })
        );
        assert_eq!(e.current_value(), "(SKKa)");
    }

    #[test]
    fn empty_name_does_not_stall() {
        let mut e = Engine::with_definitions("?x", vec![Combinator::new("", 0, "")]);
        assert_eq!(e.term_count(), 2);
        e.step().unwrap();
        assert_eq!(e.current_value(), "?x");
        assert!(!e.can_step());
    }

    #[test]
    fn diverging_sub_expression() {
        let config = Config {
            sub_expression_limit: Some(100),
        };
        let mut e = Engine::with_config("(SII(SII))a", Rc::new(Registry::default()), config);
        assert_eq!(
            e.step(),
            Err(StepError::Diverged {
                term: "(SII(SII))".to_owned(),
                limit: 100,
            })
        );
        assert_eq!(e.current_value(), "(SII(SII))a");
    }

    #[test]
    fn unbound_placeholder() {
        let mut r = Registry::default();
        r.append_record(&["M", "1", "01"]).unwrap();
        let r = Rc::new(r);

        let mut e = Engine::with_registry("Ma", Rc::clone(&r));
        assert_eq!(
            e.step(),
            Err(StepError::Substitution {
                name: "M".to_owned(),
                cause: UnboundPlaceholder {
                    index: 1,
                    available: 1,
                },
            })
        );
        assert_eq!(e.current_value(), "Ma");

        let mut e = Engine::with_registry("(Ma)b", r);
        assert!(e.step().is_err());
        assert_eq!(e.current_value(), "(Ma)b");
    }

    #[test]
    fn user_definitions() {
        let mut e = Engine::with_definitions(
            "Wab",
            vec![Combinator::new("W", 2, "011"), Combinator::new("w", 1, "00")],
        );
        e.step().unwrap();
        assert_eq!(e.current_value(), "abb");

        let mut e = Engine::with_definitions("wab", vec![Combinator::new("w", 1, "00")]);
        e.step().unwrap();
        assert_eq!(e.current_value(), "aab");
    }

    #[test]
    fn two_field_constant() {
        let mut short = Registry::default();
        short.append_record(&["<zero>", "(KI)"]).unwrap();
        let mut long = Registry::default();
        long.append_record(&["<zero>", "0", "(KI)"]).unwrap();

        let a = stepped(&mut Engine::with_registry("<zero>ab", Rc::new(short)));
        let b = stepped(&mut Engine::with_registry("<zero>ab", Rc::new(long)));
        assert_eq!(a, b);
        assert_eq!(
            a,
            vec!["<zero>ab", "(KI)ab", "KIab", "Ib", "b", "b"]
        );
    }

    #[test]
    fn well_formed() {
        assert!(!Engine::new("(()").is_well_formed());
        assert!(!Engine::new("())(").is_well_formed());
        assert!(Engine::new("()()").is_well_formed());
        assert!(Engine::new("").is_well_formed());
    }

    #[test]
    fn term_count() {
        let e = Engine::new("S(Ka)x_1?");
        assert_eq!(e.term_count(), 4);
        assert_eq!(e.current_value(), "S(Ka)x_1?");
        assert_eq!(Engine::new("").term_count(), 0);
    }

    /// A well-formed expression over the built-ins and three variables.
    #[derive(Clone, Debug)]
    struct Expr(String);

    fn gen_expr<G: Gen>(g: &mut G, depth: usize, out: &mut String) {
        for _ in 0..g.gen_range(1, 5) {
            match g.gen_range(0, if depth == 0 { 8 } else { 9 }) {
                8 => {
                    out.push('(');
                    gen_expr(g, depth - 1, out);
                    out.push(')');
                }
                i => out.push(b"SKIBCabc"[i] as char),
            }
        }
    }

    impl Arbitrary for Expr {
        fn arbitrary<G: Gen>(g: &mut G) -> Self {
            let mut s = String::new();
            gen_expr(g, 2, &mut s);
            Expr(s)
        }
    }

    #[test]
    fn halting_step_leaves_buffer() {
        fn prop(e: Expr) -> bool {
            let config = Config {
                sub_expression_limit: Some(4),
            };
            let mut e = Engine::with_config(e.0, Rc::new(Registry::default()), config);
            for _ in 0..6 {
                let before = e.current_value().to_owned();
                match e.step() {
                    Err(_) => return e.current_value() == before,
                    Ok(()) if !e.can_step() => {
                        return e.current_value() == before && e.is_well_formed()
                    }
                    Ok(()) => {
                        if !e.is_well_formed() {
                            return false;
                        }
                    }
                }
            }
            true
        }
        quickcheck(prop as fn(Expr) -> bool);
    }
}
