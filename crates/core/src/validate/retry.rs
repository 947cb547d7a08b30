//! Retrier and Catcher checks, shared by Task, Parallel, and Map.

use indexmap::IndexMap;

use crate::error::Violation;
use crate::state::{Catcher, Retrier, State};

use super::{check_target, state::check_result_path};

const ALL: &str = "States.ALL";

fn check_error_equals(path: &str, errors: &[String], is_last: bool, violations: &mut Vec<Violation>) {
    if errors.is_empty() {
        violations.push(Violation::new(
            format!("{}.errorEquals", path),
            "must contain at least one error name",
        ));
        return;
    }
    if errors.iter().any(|e| e == ALL) {
        if errors.len() > 1 {
            violations.push(Violation::new(
                format!("{}.errorEquals", path),
                "States.ALL must be the only error name in its list",
            ));
        }
        if !is_last {
            violations.push(Violation::new(
                format!("{}.errorEquals", path),
                "the States.ALL entry must come last",
            ));
        }
    }
}

pub(super) fn check_retriers(
    state_path: &str,
    retriers: &[Retrier],
    violations: &mut Vec<Violation>,
) {
    let last = retriers.len().saturating_sub(1);
    for (i, r) in retriers.iter().enumerate() {
        let path = format!("{}.retriers[{}]", state_path, i);
        check_error_equals(&path, &r.error_equals, i == last, violations);
        if let Some(n) = r.interval_seconds {
            if n <= 0 {
                violations.push(Violation::new(
                    format!("{}.intervalSeconds", path),
                    "must be a positive integer",
                ));
            }
        }
        if let Some(n) = r.max_attempts {
            if n < 0 {
                violations.push(Violation::new(
                    format!("{}.maxAttempts", path),
                    "must be a non-negative integer",
                ));
            }
        }
        if let Some(rate) = r.backoff_rate {
            if rate < 1.0 {
                violations.push(Violation::new(
                    format!("{}.backoffRate", path),
                    "must be greater than or equal to 1.0",
                ));
            }
        }
        if let Some(n) = r.max_delay_seconds {
            if n <= 0 {
                violations.push(Violation::new(
                    format!("{}.maxDelaySeconds", path),
                    "must be a positive integer",
                ));
            }
        }
    }
}

pub(super) fn check_catchers(
    state_path: &str,
    catchers: &[Catcher],
    siblings: &IndexMap<String, State>,
    violations: &mut Vec<Violation>,
) {
    let last = catchers.len().saturating_sub(1);
    for (i, c) in catchers.iter().enumerate() {
        let path = format!("{}.catchers[{}]", state_path, i);
        check_error_equals(&path, &c.error_equals, i == last, violations);
        check_result_path(&path, &c.result_path, violations);
        check_target(&format!("{}.next", path), &c.next, siblings, violations);
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::{self, StateMachineBuilder};
    use crate::state::{Catcher, Retrier};

    fn task_with_retriers(retriers: Vec<Retrier>) -> Result<(), crate::error::ValidationError> {
        let mut t = builder::task("arn:resource").end();
        for r in retriers {
            t = t.retrier(r);
        }
        StateMachineBuilder::new()
            .start_at("T")
            .state("T", t)
            .build()
            .map(|_| ())
    }

    #[test]
    fn states_all_must_be_sole_name() {
        let err = task_with_retriers(vec![Retrier::for_errors([
            "States.Timeout",
            "States.ALL",
        ])])
        .unwrap_err();
        assert!(err.has_violation_at("states.T.retriers[0].errorEquals"));
    }

    #[test]
    fn states_all_must_be_last_retrier() {
        let err = task_with_retriers(vec![
            Retrier::for_errors(["States.ALL"]),
            Retrier::for_errors(["States.Timeout"]),
        ])
        .unwrap_err();
        assert!(err.has_violation_at("states.T.retriers[0].errorEquals"));
    }

    #[test]
    fn states_all_as_sole_last_retrier_is_fine() {
        assert!(task_with_retriers(vec![
            Retrier::for_errors(["States.Timeout"]),
            Retrier::for_errors(["States.ALL"]),
        ])
        .is_ok());
    }

    #[test]
    fn numeric_domains_checked_per_retrier() {
        let err = task_with_retriers(vec![
            Retrier::for_errors(["States.Timeout"]),
            Retrier::for_errors(["States.ALL"])
                .interval_seconds(0)
                .max_attempts(-1)
                .backoff_rate(0.5)
                .max_delay_seconds(0),
        ])
        .unwrap_err();
        assert!(err.has_violation_at("states.T.retriers[1].intervalSeconds"));
        assert!(err.has_violation_at("states.T.retriers[1].maxAttempts"));
        assert!(err.has_violation_at("states.T.retriers[1].backoffRate"));
        assert!(err.has_violation_at("states.T.retriers[1].maxDelaySeconds"));
    }

    #[test]
    fn empty_error_equals_reported() {
        let err = task_with_retriers(vec![Retrier::for_errors(Vec::<String>::new())]).unwrap_err();
        assert!(err.has_violation_at("states.T.retriers[0].errorEquals"));
    }

    #[test]
    fn catcher_next_must_exist() {
        let err = StateMachineBuilder::new()
            .start_at("T")
            .state(
                "T",
                builder::task("arn:resource")
                    .catcher(Catcher::new(["States.ALL"], "Nowhere"))
                    .end(),
            )
            .build()
            .unwrap_err();
        assert!(err.has_violation_at("states.T.catchers[0].next"));
    }

    #[test]
    fn catcher_states_all_rules_apply() {
        let err = StateMachineBuilder::new()
            .start_at("T")
            .state("Handler", builder::succeed())
            .state(
                "T",
                builder::task("arn:resource")
                    .catcher(Catcher::new(["States.ALL"], "Handler"))
                    .catcher(Catcher::new(["States.Timeout"], "Handler"))
                    .end(),
            )
            .build()
            .unwrap_err();
        assert!(err.has_violation_at("states.T.catchers[0].errorEquals"));
    }
}
