// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ordered fallible strategies, tried until one succeeds.
//
// The caller decides which errors allow moving on to the next strategy; any
// other error ends the chain immediately and is returned unchanged. When
// every strategy fails, the last error wins.

use lesewerk_core::error::{LesewerkError, Result};
use tracing::{debug, warn};

type Strategy<'a, T> = Box<dyn FnOnce() -> Result<T> + 'a>;

/// The value a chain produced and which strategy produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOutcome<T> {
    pub value: T,
    pub strategy: &'static str,
    /// 1-based position of the successful strategy.
    pub attempts: usize,
}

/// An ordered list of named strategies.
pub struct StrategyChain<'a, T> {
    label: &'static str,
    strategies: Vec<(&'static str, Strategy<'a, T>)>,
}

impl<'a, T> StrategyChain<'a, T> {
    /// `label` names the chain in logs.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            strategies: Vec::new(),
        }
    }

    /// Append a strategy.
    pub fn then(mut self, name: &'static str, strategy: impl FnOnce() -> Result<T> + 'a) -> Self {
        self.strategies.push((name, Box::new(strategy)));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run strategies in order.
    ///
    /// # Errors
    ///
    /// The first error for which `advance` returns `false`; otherwise the
    /// last strategy's error; [`LesewerkError::NoStrategies`] for an empty
    /// chain.
    pub fn run(self, advance: impl Fn(&LesewerkError) -> bool) -> Result<StrategyOutcome<T>> {
        let label = self.label;
        let total = self.strategies.len();
        let mut last_error = None;

        for (position, (name, strategy)) in self.strategies.into_iter().enumerate() {
            match strategy() {
                Ok(value) => {
                    debug!(
                        chain = label,
                        strategy = name,
                        attempt = position + 1,
                        "Strategy succeeded"
                    );
                    return Ok(StrategyOutcome {
                        value,
                        strategy: name,
                        attempts: position + 1,
                    });
                }
                Err(err) if !advance(&err) => {
                    debug!(
                        chain = label,
                        strategy = name,
                        class = ?err.class(),
                        %err,
                        "Strategy failed; not advancing"
                    );
                    return Err(err);
                }
                Err(err) => {
                    warn!(
                        chain = label,
                        strategy = name,
                        attempt = position + 1,
                        of = total,
                        class = ?err.class(),
                        %err,
                        "Strategy failed"
                    );
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or(LesewerkError::NoStrategies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn first_success_wins_and_later_strategies_do_not_run() {
        let ran_third = Cell::new(false);
        let outcome = StrategyChain::new("test")
            .then("a", || Err(LesewerkError::Ocr("down".into())))
            .then("b", || Ok(2))
            .then("c", || {
                ran_third.set(true);
                Ok(3)
            })
            .run(|_| true)
            .unwrap();

        assert_eq!(outcome.value, 2);
        assert_eq!(outcome.strategy, "b");
        assert_eq!(outcome.attempts, 2);
        assert!(!ran_third.get());
    }

    #[test]
    fn last_error_is_kept() {
        let err = StrategyChain::<()>::new("test")
            .then("a", || Err(LesewerkError::Ocr("first".into())))
            .then("b", || Err(LesewerkError::Storage("second".into())))
            .run(|_| true)
            .unwrap_err();
        assert!(matches!(err, LesewerkError::Storage(message) if message == "second"));
    }

    #[test]
    fn non_advancing_error_stops_the_chain() {
        let ran_second = Cell::new(false);
        let err = StrategyChain::new("test")
            .then("a", || Err(LesewerkError::Ocr("fatal".into())))
            .then("b", || {
                ran_second.set(true);
                Ok(())
            })
            .run(LesewerkError::is_unsupported_document)
            .unwrap_err();

        assert!(matches!(err, LesewerkError::Ocr(_)));
        assert!(!ran_second.get());
    }

    #[test]
    fn empty_chain_reports_no_strategies() {
        let chain = StrategyChain::<u8>::new("empty");
        assert!(chain.is_empty());
        assert!(matches!(chain.run(|_| true), Err(LesewerkError::NoStrategies)));
    }
}
