//! Per-variant state checks.

use indexmap::IndexMap;

use crate::error::Violation;
use crate::path::{JsonPath, RefPath};
use crate::state::{
    Common, FailState, MapState, OptionalPath, ParallelState, State, TaskState, Transition,
    WaitFor, WaitState,
};

use super::{check_scope, check_target, choice, retry};

pub(super) fn check_state(
    path: &str,
    st: &State,
    siblings: &IndexMap<String, State>,
    violations: &mut Vec<Violation>,
) {
    match st {
        State::Pass(s) => {
            check_common(path, &s.common, violations);
            check_result_path(path, &s.result_path, violations);
            check_transition(path, &s.transition, siblings, violations);
        }
        State::Task(s) => check_task(path, s, siblings, violations),
        State::Choice(s) => {
            check_common(path, &s.common, violations);
            choice::check_choice_state(path, s, siblings, violations);
        }
        State::Wait(s) => check_wait(path, s, siblings, violations),
        State::Succeed(_) => {}
        State::Fail(s) => check_fail(path, s, violations),
        State::Parallel(s) => check_parallel(path, s, siblings, violations),
        State::Map(s) => check_map(path, s, siblings, violations),
    }
}

fn check_common(path: &str, common: &Common, violations: &mut Vec<Violation>) {
    check_json_path_field(&format!("{}.inputPath", path), &common.input_path, violations);
    check_json_path_field(
        &format!("{}.outputPath", path),
        &common.output_path,
        violations,
    );
}

fn check_json_path_field(path: &str, field: &OptionalPath, violations: &mut Vec<Violation>) {
    if let OptionalPath::Path(p) = field {
        if let Err(e) = JsonPath::parse(p) {
            violations.push(Violation::new(path, e.to_string()));
        }
    }
}

pub(super) fn check_result_path(
    state_path: &str,
    field: &OptionalPath,
    violations: &mut Vec<Violation>,
) {
    if let OptionalPath::Path(p) = field {
        if let Err(e) = RefPath::parse(p) {
            violations.push(Violation::new(format!("{}.resultPath", state_path), e.to_string()));
        }
    }
}

fn check_transition(
    path: &str,
    transition: &Transition,
    siblings: &IndexMap<String, State>,
    violations: &mut Vec<Violation>,
) {
    if let Transition::Next(target) = transition {
        check_target(&format!("{}.next", path), target, siblings, violations);
    }
}

fn check_ref_path_str(path: &str, p: &str, violations: &mut Vec<Violation>) {
    if let Err(e) = RefPath::parse(p) {
        violations.push(Violation::new(path, e.to_string()));
    }
}

fn check_task(
    path: &str,
    s: &TaskState,
    siblings: &IndexMap<String, State>,
    violations: &mut Vec<Violation>,
) {
    check_common(path, &s.common, violations);
    check_result_path(path, &s.result_path, violations);
    check_transition(path, &s.transition, siblings, violations);

    if s.resource.is_empty() {
        violations.push(Violation::new(
            format!("{}.resource", path),
            "must be a non-empty string",
        ));
    }
    if s.timeout_seconds.is_some() && s.timeout_seconds_path.is_some() {
        violations.push(Violation::new(
            path,
            "TimeoutSeconds and TimeoutSecondsPath are mutually exclusive",
        ));
    }
    if s.heartbeat_seconds.is_some() && s.heartbeat_seconds_path.is_some() {
        violations.push(Violation::new(
            path,
            "HeartbeatSeconds and HeartbeatSecondsPath are mutually exclusive",
        ));
    }
    if let Some(t) = s.timeout_seconds {
        if t <= 0 {
            violations.push(Violation::new(
                format!("{}.timeoutSeconds", path),
                "must be a positive integer",
            ));
        }
    }
    if let Some(h) = s.heartbeat_seconds {
        if h <= 0 {
            violations.push(Violation::new(
                format!("{}.heartbeatSeconds", path),
                "must be a positive integer",
            ));
        }
    }
    if let (Some(h), Some(t)) = (s.heartbeat_seconds, s.timeout_seconds) {
        if h > 0 && t > 0 && h >= t {
            violations.push(Violation::new(
                format!("{}.heartbeatSeconds", path),
                "must be smaller than TimeoutSeconds",
            ));
        }
    }
    if let Some(p) = &s.timeout_seconds_path {
        check_ref_path_str(&format!("{}.timeoutSecondsPath", path), p, violations);
    }
    if let Some(p) = &s.heartbeat_seconds_path {
        check_ref_path_str(&format!("{}.heartbeatSecondsPath", path), p, violations);
    }

    retry::check_retriers(path, &s.retriers, violations);
    retry::check_catchers(path, &s.catchers, siblings, violations);
}

fn check_wait(
    path: &str,
    s: &WaitState,
    siblings: &IndexMap<String, State>,
    violations: &mut Vec<Violation>,
) {
    check_common(path, &s.common, violations);
    check_transition(path, &s.transition, siblings, violations);
    match &s.wait_for {
        WaitFor::Seconds(n) => {
            if *n < 0 {
                violations.push(Violation::new(
                    format!("{}.seconds", path),
                    "must be a non-negative integer",
                ));
            }
        }
        WaitFor::SecondsPath(p) => {
            check_ref_path_str(&format!("{}.secondsPath", path), p, violations);
        }
        WaitFor::Timestamp(_) => {}
        WaitFor::TimestampPath(p) => {
            check_ref_path_str(&format!("{}.timestampPath", path), p, violations);
        }
    }
}

fn check_fail(path: &str, s: &FailState, violations: &mut Vec<Violation>) {
    if s.error.is_some() && s.error_path.is_some() {
        violations.push(Violation::new(
            path,
            "Error and ErrorPath are mutually exclusive",
        ));
    }
    if s.cause.is_some() && s.cause_path.is_some() {
        violations.push(Violation::new(
            path,
            "Cause and CausePath are mutually exclusive",
        ));
    }
    // Fail paths may be a reference path or an intrinsic call; only the
    // path form is checkable without the intrinsic parser.
    if let Some(p) = &s.error_path {
        if p.starts_with('$') {
            check_ref_path_str(&format!("{}.errorPath", path), p, violations);
        }
    }
    if let Some(p) = &s.cause_path {
        if p.starts_with('$') {
            check_ref_path_str(&format!("{}.causePath", path), p, violations);
        }
    }
}

fn check_parallel(
    path: &str,
    s: &ParallelState,
    siblings: &IndexMap<String, State>,
    violations: &mut Vec<Violation>,
) {
    check_common(path, &s.common, violations);
    check_result_path(path, &s.result_path, violations);
    check_transition(path, &s.transition, siblings, violations);
    retry::check_retriers(path, &s.retriers, violations);
    retry::check_catchers(path, &s.catchers, siblings, violations);

    if s.branches.is_empty() {
        violations.push(Violation::new(
            format!("{}.branches", path),
            "must contain at least one branch",
        ));
    }
    for (i, branch) in s.branches.iter().enumerate() {
        check_scope(
            &format!("{}.branches[{}]", path, i),
            &branch.start_at,
            &branch.states,
            violations,
        );
    }
}

fn check_map(
    path: &str,
    s: &MapState,
    siblings: &IndexMap<String, State>,
    violations: &mut Vec<Violation>,
) {
    check_common(path, &s.common, violations);
    check_result_path(path, &s.result_path, violations);
    check_transition(path, &s.transition, siblings, violations);
    retry::check_retriers(path, &s.retriers, violations);
    retry::check_catchers(path, &s.catchers, siblings, violations);

    if let Some(n) = s.max_concurrency {
        if n < 0 {
            violations.push(Violation::new(
                format!("{}.maxConcurrency", path),
                "must be a non-negative integer",
            ));
        }
    }
    if let Some(p) = &s.items_path {
        check_ref_path_str(&format!("{}.itemsPath", path), p, violations);
    }
    check_scope(
        &format!("{}.itemProcessor", path),
        &s.item_processor.start_at,
        &s.item_processor.states,
        violations,
    );
}
