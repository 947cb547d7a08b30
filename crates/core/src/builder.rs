//! Mutable, unvalidated builders for machines and states.
//!
//! Builders accumulate fields without checking anything; the single gate
//! is [`StateMachineBuilder::build`], which assembles the model and runs
//! the validator. Deserialization goes through the same builders, so a
//! [`crate::machine::StateMachine`] can never exist unvalidated.
//!
//! Where a required field is missing at assembly time (a transition, the
//! Wait strategy, a Map item processor), the assembly records a violation
//! and substitutes a neutral placeholder so the validator can still walk
//! the rest of the document and report every other problem. The placeholder
//! never escapes: `build` fails whenever any violation was recorded.

use indexmap::IndexMap;
use serde_json::Value;

use crate::condition::{Choice, Condition};
use crate::error::{ValidationError, Violation};
use crate::machine::{StateMachine, SubStateMachine};
use crate::state::{
    Catcher, ChoiceState, Common, FailState, MapState, OptionalPath, ParallelState, PassState,
    Retrier, State, SucceedState, TaskState, Transition, WaitFor, WaitState,
};

/// Start building a Pass state.
pub fn pass() -> PassBuilder {
    PassBuilder::default()
}

/// Start building a Task state invoking `resource`.
pub fn task(resource: impl Into<String>) -> TaskBuilder {
    TaskBuilder {
        resource: resource.into(),
        ..TaskBuilder::default()
    }
}

/// Start building a Choice state.
pub fn choice() -> ChoiceBuilder {
    ChoiceBuilder::default()
}

/// Start building a Wait state.
pub fn wait() -> WaitBuilder {
    WaitBuilder::default()
}

/// Start building a Succeed state.
pub fn succeed() -> SucceedBuilder {
    SucceedBuilder::default()
}

/// Start building a Fail state.
pub fn fail() -> FailBuilder {
    FailBuilder::default()
}

/// Start building a Parallel state.
pub fn parallel() -> ParallelBuilder {
    ParallelBuilder::default()
}

/// Start building a Map state.
pub fn map() -> MapBuilder {
    MapBuilder::default()
}

macro_rules! common_setters {
    () => {
        pub fn comment(mut self, comment: impl Into<String>) -> Self {
            self.common.comment = Some(comment.into());
            self
        }

        pub fn input_path(mut self, path: impl Into<String>) -> Self {
            self.common.input_path = OptionalPath::Path(path.into());
            self
        }

        /// Explicit `"InputPath": null` -- the state receives `{}`.
        pub fn input_path_null(mut self) -> Self {
            self.common.input_path = OptionalPath::Null;
            self
        }

        pub fn output_path(mut self, path: impl Into<String>) -> Self {
            self.common.output_path = OptionalPath::Path(path.into());
            self
        }

        /// Explicit `"OutputPath": null` -- the state emits `{}`.
        pub fn output_path_null(mut self) -> Self {
            self.common.output_path = OptionalPath::Null;
            self
        }
    };
}

macro_rules! transition_setters {
    () => {
        pub fn next(mut self, state: impl Into<String>) -> Self {
            self.transition = Some(Transition::Next(state.into()));
            self
        }

        pub fn end(mut self) -> Self {
            self.transition = Some(Transition::End);
            self
        }
    };
}

macro_rules! result_path_setters {
    () => {
        pub fn result_path(mut self, path: impl Into<String>) -> Self {
            self.result_path = OptionalPath::Path(path.into());
            self
        }

        /// Explicit `"ResultPath": null` -- the result is discarded.
        pub fn result_path_null(mut self) -> Self {
            self.result_path = OptionalPath::Null;
            self
        }
    };
}

fn take_transition(
    transition: Option<Transition>,
    path: &str,
    violations: &mut Vec<Violation>,
) -> Transition {
    match transition {
        Some(t) => t,
        None => {
            violations.push(Violation::new(
                path,
                "state requires exactly one of Next or End",
            ));
            Transition::End
        }
    }
}

// ── Pass ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct PassBuilder {
    common: Common,
    result: Option<Value>,
    parameters: Option<Value>,
    result_path: OptionalPath,
    transition: Option<Transition>,
}

impl PassBuilder {
    common_setters!();
    transition_setters!();
    result_path_setters!();

    pub fn result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }

    fn assemble(self, path: &str, violations: &mut Vec<Violation>) -> State {
        State::Pass(PassState {
            common: self.common,
            result: self.result,
            parameters: self.parameters,
            result_path: self.result_path,
            transition: take_transition(self.transition, path, violations),
        })
    }
}

// ── Task ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct TaskBuilder {
    common: Common,
    resource: String,
    timeout_seconds: Option<i64>,
    timeout_seconds_path: Option<String>,
    heartbeat_seconds: Option<i64>,
    heartbeat_seconds_path: Option<String>,
    parameters: Option<Value>,
    result_selector: Option<Value>,
    result_path: OptionalPath,
    retriers: Vec<Retrier>,
    catchers: Vec<Catcher>,
    transition: Option<Transition>,
}

impl TaskBuilder {
    common_setters!();
    transition_setters!();
    result_path_setters!();

    pub fn timeout_seconds(mut self, seconds: i64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    pub fn timeout_seconds_path(mut self, path: impl Into<String>) -> Self {
        self.timeout_seconds_path = Some(path.into());
        self
    }

    pub fn heartbeat_seconds(mut self, seconds: i64) -> Self {
        self.heartbeat_seconds = Some(seconds);
        self
    }

    pub fn heartbeat_seconds_path(mut self, path: impl Into<String>) -> Self {
        self.heartbeat_seconds_path = Some(path.into());
        self
    }

    pub fn parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn result_selector(mut self, selector: Value) -> Self {
        self.result_selector = Some(selector);
        self
    }

    pub fn retrier(mut self, retrier: Retrier) -> Self {
        self.retriers.push(retrier);
        self
    }

    pub fn catcher(mut self, catcher: Catcher) -> Self {
        self.catchers.push(catcher);
        self
    }

    fn assemble(self, path: &str, violations: &mut Vec<Violation>) -> State {
        State::Task(TaskState {
            common: self.common,
            resource: self.resource,
            timeout_seconds: self.timeout_seconds,
            timeout_seconds_path: self.timeout_seconds_path,
            heartbeat_seconds: self.heartbeat_seconds,
            heartbeat_seconds_path: self.heartbeat_seconds_path,
            parameters: self.parameters,
            result_selector: self.result_selector,
            result_path: self.result_path,
            retriers: self.retriers,
            catchers: self.catchers,
            transition: take_transition(self.transition, path, violations),
        })
    }
}

// ── Choice ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ChoiceBuilder {
    common: Common,
    choices: Vec<Choice>,
    default: Option<String>,
}

impl ChoiceBuilder {
    common_setters!();

    /// Add a choice rule: go to `next` when `condition` holds.
    pub fn when(mut self, condition: Condition, next: impl Into<String>) -> Self {
        self.choices.push(Choice::new(condition, next));
        self
    }

    pub fn choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }

    /// The state to go to when no choice matches.
    pub fn default_state(mut self, next: impl Into<String>) -> Self {
        self.default = Some(next.into());
        self
    }

    fn assemble(self) -> State {
        State::Choice(ChoiceState {
            common: self.common,
            choices: self.choices,
            default: self.default,
        })
    }
}

// ── Wait ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct WaitBuilder {
    common: Common,
    seconds: Option<i64>,
    seconds_path: Option<String>,
    timestamp: Option<String>,
    timestamp_path: Option<String>,
    transition: Option<Transition>,
}

impl WaitBuilder {
    common_setters!();
    transition_setters!();

    pub fn seconds(mut self, seconds: i64) -> Self {
        self.seconds = Some(seconds);
        self
    }

    pub fn seconds_path(mut self, path: impl Into<String>) -> Self {
        self.seconds_path = Some(path.into());
        self
    }

    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn timestamp_path(mut self, path: impl Into<String>) -> Self {
        self.timestamp_path = Some(path.into());
        self
    }

    fn assemble(self, path: &str, violations: &mut Vec<Violation>) -> State {
        let mut strategies: Vec<WaitFor> = Vec::new();
        if let Some(s) = self.seconds {
            strategies.push(WaitFor::Seconds(s));
        }
        if let Some(p) = self.seconds_path {
            strategies.push(WaitFor::SecondsPath(p));
        }
        if let Some(t) = self.timestamp {
            strategies.push(WaitFor::Timestamp(t));
        }
        if let Some(p) = self.timestamp_path {
            strategies.push(WaitFor::TimestampPath(p));
        }
        let wait_for = match strategies.len() {
            1 => strategies.remove(0),
            0 => {
                violations.push(Violation::new(
                    path,
                    "requires one of Seconds, SecondsPath, Timestamp, or TimestampPath",
                ));
                WaitFor::Seconds(1)
            }
            _ => {
                violations.push(Violation::new(
                    path,
                    "Seconds, SecondsPath, Timestamp, and TimestampPath are mutually exclusive",
                ));
                strategies.remove(0)
            }
        };
        State::Wait(WaitState {
            common: self.common,
            wait_for,
            transition: take_transition(self.transition, path, violations),
        })
    }
}

// ── Succeed / Fail ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct SucceedBuilder {
    comment: Option<String>,
}

impl SucceedBuilder {
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    fn assemble(self) -> State {
        State::Succeed(SucceedState {
            comment: self.comment,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct FailBuilder {
    comment: Option<String>,
    error: Option<String>,
    error_path: Option<String>,
    cause: Option<String>,
    cause_path: Option<String>,
}

impl FailBuilder {
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn error_path(mut self, path: impl Into<String>) -> Self {
        self.error_path = Some(path.into());
        self
    }

    pub fn cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn cause_path(mut self, path: impl Into<String>) -> Self {
        self.cause_path = Some(path.into());
        self
    }

    fn assemble(self) -> State {
        State::Fail(FailState {
            comment: self.comment,
            error: self.error,
            error_path: self.error_path,
            cause: self.cause,
            cause_path: self.cause_path,
        })
    }
}

// ── Parallel ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ParallelBuilder {
    common: Common,
    branches: Vec<SubStateMachineBuilder>,
    parameters: Option<Value>,
    result_selector: Option<Value>,
    result_path: OptionalPath,
    retriers: Vec<Retrier>,
    catchers: Vec<Catcher>,
    transition: Option<Transition>,
}

impl ParallelBuilder {
    common_setters!();
    transition_setters!();
    result_path_setters!();

    pub fn branch(mut self, branch: SubStateMachineBuilder) -> Self {
        self.branches.push(branch);
        self
    }

    pub fn parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn result_selector(mut self, selector: Value) -> Self {
        self.result_selector = Some(selector);
        self
    }

    pub fn retrier(mut self, retrier: Retrier) -> Self {
        self.retriers.push(retrier);
        self
    }

    pub fn catcher(mut self, catcher: Catcher) -> Self {
        self.catchers.push(catcher);
        self
    }

    fn assemble(self, path: &str, violations: &mut Vec<Violation>) -> State {
        let branches = self
            .branches
            .into_iter()
            .enumerate()
            .map(|(i, b)| b.assemble(&format!("{}.branches[{}]", path, i), violations))
            .collect();
        State::Parallel(ParallelState {
            common: self.common,
            branches,
            parameters: self.parameters,
            result_selector: self.result_selector,
            result_path: self.result_path,
            retriers: self.retriers,
            catchers: self.catchers,
            transition: take_transition(self.transition, path, violations),
        })
    }
}

// ── Map ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MapBuilder {
    common: Common,
    item_processor: Option<SubStateMachineBuilder>,
    items_path: Option<String>,
    max_concurrency: Option<i64>,
    item_selector: Option<Value>,
    result_selector: Option<Value>,
    result_path: OptionalPath,
    retriers: Vec<Retrier>,
    catchers: Vec<Catcher>,
    transition: Option<Transition>,
}

impl MapBuilder {
    common_setters!();
    transition_setters!();
    result_path_setters!();

    pub fn item_processor(mut self, processor: SubStateMachineBuilder) -> Self {
        self.item_processor = Some(processor);
        self
    }

    pub fn items_path(mut self, path: impl Into<String>) -> Self {
        self.items_path = Some(path.into());
        self
    }

    pub fn max_concurrency(mut self, limit: i64) -> Self {
        self.max_concurrency = Some(limit);
        self
    }

    pub fn item_selector(mut self, selector: Value) -> Self {
        self.item_selector = Some(selector);
        self
    }

    pub fn result_selector(mut self, selector: Value) -> Self {
        self.result_selector = Some(selector);
        self
    }

    pub fn retrier(mut self, retrier: Retrier) -> Self {
        self.retriers.push(retrier);
        self
    }

    pub fn catcher(mut self, catcher: Catcher) -> Self {
        self.catchers.push(catcher);
        self
    }

    fn assemble(self, path: &str, violations: &mut Vec<Violation>) -> State {
        let item_processor = match self.item_processor {
            Some(p) => p.assemble(&format!("{}.itemProcessor", path), violations),
            None => {
                violations.push(Violation::new(
                    format!("{}.itemProcessor", path),
                    "Map state requires an item processor",
                ));
                placeholder_sub_machine()
            }
        };
        State::Map(MapState {
            common: self.common,
            item_processor,
            items_path: self.items_path,
            max_concurrency: self.max_concurrency,
            item_selector: self.item_selector,
            result_selector: self.result_selector,
            result_path: self.result_path,
            retriers: self.retriers,
            catchers: self.catchers,
            transition: take_transition(self.transition, path, violations),
        })
    }
}

/// Validates clean, so a missing item processor reports exactly one
/// violation instead of a cascade from an empty machine.
fn placeholder_sub_machine() -> SubStateMachine {
    let mut states = IndexMap::new();
    states.insert(
        "Done".to_string(),
        State::Succeed(SucceedState { comment: None }),
    );
    SubStateMachine {
        comment: None,
        start_at: "Done".to_string(),
        states,
    }
}

// ── State dispatch ──────────────────────────────────────────────────

/// Any state builder, for heterogeneous `states` maps.
#[derive(Debug, Clone)]
pub enum StateBuilder {
    Pass(PassBuilder),
    Task(TaskBuilder),
    Choice(ChoiceBuilder),
    Wait(WaitBuilder),
    Succeed(SucceedBuilder),
    Fail(FailBuilder),
    Parallel(ParallelBuilder),
    Map(MapBuilder),
}

impl StateBuilder {
    fn assemble(self, path: &str, violations: &mut Vec<Violation>) -> State {
        match self {
            StateBuilder::Pass(b) => b.assemble(path, violations),
            StateBuilder::Task(b) => b.assemble(path, violations),
            StateBuilder::Choice(b) => b.assemble(),
            StateBuilder::Wait(b) => b.assemble(path, violations),
            StateBuilder::Succeed(b) => b.assemble(),
            StateBuilder::Fail(b) => b.assemble(),
            StateBuilder::Parallel(b) => b.assemble(path, violations),
            StateBuilder::Map(b) => b.assemble(path, violations),
        }
    }
}

macro_rules! state_builder_from {
    ($( $builder:ident => $variant:ident ;)*) => {
        $(
            impl From<$builder> for StateBuilder {
                fn from(b: $builder) -> StateBuilder {
                    StateBuilder::$variant(b)
                }
            }
        )*
    };
}

state_builder_from! {
    PassBuilder => Pass;
    TaskBuilder => Task;
    ChoiceBuilder => Choice;
    WaitBuilder => Wait;
    SucceedBuilder => Succeed;
    FailBuilder => Fail;
    ParallelBuilder => Parallel;
    MapBuilder => Map;
}

// ── Machines ────────────────────────────────────────────────────────

/// Builder for a top-level state machine. `build` validates.
#[derive(Debug, Clone, Default)]
pub struct StateMachineBuilder {
    comment: Option<String>,
    start_at: Option<String>,
    timeout_seconds: Option<i64>,
    version: Option<String>,
    states: IndexMap<String, StateBuilder>,
}

impl StateMachineBuilder {
    pub fn new() -> Self {
        StateMachineBuilder::default()
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn start_at(mut self, state: impl Into<String>) -> Self {
        self.start_at = Some(state.into());
        self
    }

    pub fn timeout_seconds(mut self, seconds: i64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn state(mut self, name: impl Into<String>, builder: impl Into<StateBuilder>) -> Self {
        self.states.insert(name.into(), builder.into());
        self
    }

    /// Assemble and validate. Returns the immutable machine, or every
    /// violation found.
    pub fn build(self) -> Result<StateMachine, ValidationError> {
        let mut violations = Vec::new();
        let mut states = IndexMap::with_capacity(self.states.len());
        for (name, builder) in self.states {
            let state = builder.assemble(&format!("states.{}", name), &mut violations);
            states.insert(name, state);
        }
        let machine = StateMachine {
            comment: self.comment,
            start_at: self.start_at.unwrap_or_default(),
            timeout_seconds: self.timeout_seconds,
            version: self.version,
            states,
        };
        violations.extend(crate::validate::check(&machine));
        if violations.is_empty() {
            Ok(machine)
        } else {
            Err(ValidationError::new(violations))
        }
    }
}

/// Builder for a Parallel branch or Map item processor.
#[derive(Debug, Clone, Default)]
pub struct SubStateMachineBuilder {
    comment: Option<String>,
    start_at: Option<String>,
    states: IndexMap<String, StateBuilder>,
}

impl SubStateMachineBuilder {
    pub fn new() -> Self {
        SubStateMachineBuilder::default()
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn start_at(mut self, state: impl Into<String>) -> Self {
        self.start_at = Some(state.into());
        self
    }

    pub fn state(mut self, name: impl Into<String>, builder: impl Into<StateBuilder>) -> Self {
        self.states.insert(name.into(), builder.into());
        self
    }

    fn assemble(self, path: &str, violations: &mut Vec<Violation>) -> SubStateMachine {
        let mut states = IndexMap::with_capacity(self.states.len());
        for (name, builder) in self.states {
            let state = builder.assemble(&format!("{}.states.{}", path, name), &mut *violations);
            states.insert(name, state);
        }
        SubStateMachine {
            comment: self.comment,
            start_at: self.start_at.unwrap_or_default(),
            states,
        }
    }
}
