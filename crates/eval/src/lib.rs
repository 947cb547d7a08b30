//! stateslang-eval: runtime semantics for Amazon States Language
//! documents.
//!
//! Everything here is a pure, synchronous function over JSON values: the
//! Choice condition evaluator, the InputPath/Parameters/ResultSelector/
//! ResultPath/OutputPath pipeline, and the intrinsic function engine that
//! payload templates invoke. Nothing executes tasks, waits, or touches
//! the network -- that is the host workflow engine's job.
//!
//! # Public API
//!
//! - [`evaluate`] / [`choose_next`] -- condition trees and Choice dispatch
//! - [`IoProcessor`] -- the per-state data-flow pipeline
//! - [`IntrinsicRegistry`] / [`register_standard_functions`] -- the
//!   `States.*` function table, open for host extensions
//! - [`parse_intrinsic`] -- the `States.Name(args)` expression parser
//! - [`EvalError`] / [`StatesLanguageError`] -- the runtime error taxonomy

pub mod condition;
pub mod error;
pub mod intrinsics;
pub mod io;
pub mod template;

pub use condition::{choose_next, evaluate};
pub use error::{ConditionErrorKind, EvalError, StatesLanguageError};
pub use intrinsics::parser::{parse_intrinsic, IntrinsicArg, IntrinsicCall};
pub use intrinsics::stdlib::register_standard_functions;
pub use intrinsics::{IntrinsicFn, IntrinsicRegistry};
pub use io::IoProcessor;
pub use template::apply_template;
