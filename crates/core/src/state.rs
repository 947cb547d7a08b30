//! State variants and their value objects.
//!
//! `State` is a closed sum over the seven ASL state types. Fields every
//! filterable state shares (`Comment`, `InputPath`, `OutputPath`) live in
//! the embedded [`Common`] record; `ResultPath` and the transition sit on
//! the variants that carry them, so a terminal state cannot even express
//! an outgoing edge.

use serde_json::Value;

use crate::condition::Choice;
use crate::machine::SubStateMachine;

/// Tri-state optional path.
///
/// ASL distinguishes a field that is absent (identity, `$`) from a field
/// explicitly set to JSON `null` (discard). Collapsing the two into an
/// `Option` would lose observable behavior, so the distinction is kept in
/// the model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OptionalPath {
    #[default]
    Unset,
    Null,
    Path(String),
}

impl OptionalPath {
    pub fn is_unset(&self) -> bool {
        matches!(self, OptionalPath::Unset)
    }

    pub fn as_path(&self) -> Option<&str> {
        match self {
            OptionalPath::Path(p) => Some(p),
            _ => None,
        }
    }
}

/// Where control goes after a state completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Next(String),
    End,
}

impl Transition {
    pub fn next_state(&self) -> Option<&str> {
        match self {
            Transition::Next(name) => Some(name),
            Transition::End => None,
        }
    }
}

/// The four mutually exclusive Wait strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitFor {
    Seconds(i64),
    SecondsPath(String),
    Timestamp(String),
    TimestampPath(String),
}

/// Retry jitter strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitterStrategy {
    Full,
    None,
}

impl JitterStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            JitterStrategy::Full => "FULL",
            JitterStrategy::None => "NONE",
        }
    }

    pub fn from_str(s: &str) -> Option<JitterStrategy> {
        match s {
            "FULL" => Some(JitterStrategy::Full),
            "NONE" => Some(JitterStrategy::None),
            _ => None,
        }
    }
}

/// A retry policy entry. Defaults follow the ASL spec: interval 1s, three
/// attempts, backoff rate 2.0.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrier {
    pub error_equals: Vec<String>,
    pub interval_seconds: Option<i64>,
    pub max_attempts: Option<i64>,
    pub backoff_rate: Option<f64>,
    pub max_delay_seconds: Option<i64>,
    pub jitter_strategy: Option<JitterStrategy>,
}

impl Retrier {
    pub fn for_errors<I, S>(errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Retrier {
            error_equals: errors.into_iter().map(Into::into).collect(),
            interval_seconds: None,
            max_attempts: None,
            backoff_rate: None,
            max_delay_seconds: None,
            jitter_strategy: None,
        }
    }

    pub fn interval_seconds(mut self, seconds: i64) -> Self {
        self.interval_seconds = Some(seconds);
        self
    }

    pub fn max_attempts(mut self, attempts: i64) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    pub fn backoff_rate(mut self, rate: f64) -> Self {
        self.backoff_rate = Some(rate);
        self
    }

    pub fn max_delay_seconds(mut self, seconds: i64) -> Self {
        self.max_delay_seconds = Some(seconds);
        self
    }

    pub fn jitter_strategy(mut self, strategy: JitterStrategy) -> Self {
        self.jitter_strategy = Some(strategy);
        self
    }

    pub fn effective_interval_seconds(&self) -> i64 {
        self.interval_seconds.unwrap_or(1)
    }

    pub fn effective_max_attempts(&self) -> i64 {
        self.max_attempts.unwrap_or(3)
    }

    pub fn effective_backoff_rate(&self) -> f64 {
        self.backoff_rate.unwrap_or(2.0)
    }
}

/// A catch clause: matched errors divert to `next`, optionally writing the
/// error object through `result_path`.
#[derive(Debug, Clone, PartialEq)]
pub struct Catcher {
    pub error_equals: Vec<String>,
    pub result_path: OptionalPath,
    pub next: String,
}

impl Catcher {
    pub fn new<I, S>(errors: I, next: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Catcher {
            error_equals: errors.into_iter().map(Into::into).collect(),
            result_path: OptionalPath::Unset,
            next: next.into(),
        }
    }

    pub fn result_path(mut self, path: OptionalPath) -> Self {
        self.result_path = path;
        self
    }
}

/// Fields shared by every state that participates in input/output
/// filtering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Common {
    pub comment: Option<String>,
    pub input_path: OptionalPath,
    pub output_path: OptionalPath,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassState {
    pub common: Common,
    pub result: Option<Value>,
    pub parameters: Option<Value>,
    pub result_path: OptionalPath,
    pub transition: Transition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskState {
    pub common: Common,
    pub resource: String,
    pub timeout_seconds: Option<i64>,
    pub timeout_seconds_path: Option<String>,
    pub heartbeat_seconds: Option<i64>,
    pub heartbeat_seconds_path: Option<String>,
    pub parameters: Option<Value>,
    pub result_selector: Option<Value>,
    pub result_path: OptionalPath,
    pub retriers: Vec<Retrier>,
    pub catchers: Vec<Catcher>,
    pub transition: Transition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceState {
    pub common: Common,
    pub choices: Vec<Choice>,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaitState {
    pub common: Common,
    pub wait_for: WaitFor,
    pub transition: Transition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SucceedState {
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailState {
    pub comment: Option<String>,
    pub error: Option<String>,
    pub error_path: Option<String>,
    pub cause: Option<String>,
    pub cause_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParallelState {
    pub common: Common,
    pub branches: Vec<SubStateMachine>,
    pub parameters: Option<Value>,
    pub result_selector: Option<Value>,
    pub result_path: OptionalPath,
    pub retriers: Vec<Retrier>,
    pub catchers: Vec<Catcher>,
    pub transition: Transition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapState {
    pub common: Common,
    pub item_processor: SubStateMachine,
    pub items_path: Option<String>,
    pub max_concurrency: Option<i64>,
    pub item_selector: Option<Value>,
    pub result_selector: Option<Value>,
    pub result_path: OptionalPath,
    pub retriers: Vec<Retrier>,
    pub catchers: Vec<Catcher>,
    pub transition: Transition,
}

impl MapState {
    /// `ItemsPath` defaults to `$`: the whole effective input is the
    /// item array.
    pub fn effective_items_path(&self) -> &str {
        self.items_path.as_deref().unwrap_or("$")
    }
}

/// One state of a machine, tagged by its ASL `Type`.
#[derive(Debug, Clone, PartialEq)]
pub enum State {
    Pass(PassState),
    Task(TaskState),
    Choice(ChoiceState),
    Wait(WaitState),
    Succeed(SucceedState),
    Fail(FailState),
    Parallel(ParallelState),
    Map(MapState),
}

impl State {
    /// The ASL `Type` discriminator value.
    pub fn state_type(&self) -> &'static str {
        match self {
            State::Pass(_) => "Pass",
            State::Task(_) => "Task",
            State::Choice(_) => "Choice",
            State::Wait(_) => "Wait",
            State::Succeed(_) => "Succeed",
            State::Fail(_) => "Fail",
            State::Parallel(_) => "Parallel",
            State::Map(_) => "Map",
        }
    }

    /// The state's transition, for the variants that have one.
    pub fn transition(&self) -> Option<&Transition> {
        match self {
            State::Pass(s) => Some(&s.transition),
            State::Task(s) => Some(&s.transition),
            State::Wait(s) => Some(&s.transition),
            State::Parallel(s) => Some(&s.transition),
            State::Map(s) => Some(&s.transition),
            State::Choice(_) | State::Succeed(_) | State::Fail(_) => None,
        }
    }

    /// Succeed and Fail end an execution and carry no transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, State::Succeed(_) | State::Fail(_))
    }
}
