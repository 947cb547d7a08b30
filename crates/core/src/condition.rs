//! Condition trees for Choice states.
//!
//! A condition is either a leaf comparison (`Variable` + operator +
//! operand) or a logical combinator over child conditions. The operator
//! set is the full ASL comparator catalog; each operator fixes the JSON
//! type its operand must have.

use serde_json::Number;

/// What kind of operand an operator takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// A literal string (also used for timestamps, which are ISO-8601 strings).
    String,
    /// A literal number.
    Number,
    /// A literal boolean.
    Bool,
    /// A Reference Path resolved against the input at evaluation time.
    Path,
}

macro_rules! comparison_operators {
    ($( $variant:ident => $name:literal, $kind:ident ;)*) => {
        /// Leaf comparison operators, named exactly as they appear in ASL JSON.
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum ComparisonOperator {
            $( $variant, )*
        }

        impl ComparisonOperator {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( ComparisonOperator::$variant => $name, )*
                }
            }

            pub fn from_str(s: &str) -> Option<ComparisonOperator> {
                match s {
                    $( $name => Some(ComparisonOperator::$variant), )*
                    _ => None,
                }
            }

            /// The JSON type the operand must carry for this operator.
            pub fn operand_kind(&self) -> OperandKind {
                match self {
                    $( ComparisonOperator::$variant => OperandKind::$kind, )*
                }
            }

            /// Every operator, in catalog order.
            pub fn all() -> &'static [ComparisonOperator] {
                &[ $( ComparisonOperator::$variant, )* ]
            }
        }
    };
}

comparison_operators! {
    StringEquals => "StringEquals", String;
    StringEqualsPath => "StringEqualsPath", Path;
    StringLessThan => "StringLessThan", String;
    StringLessThanPath => "StringLessThanPath", Path;
    StringGreaterThan => "StringGreaterThan", String;
    StringGreaterThanPath => "StringGreaterThanPath", Path;
    StringLessThanEquals => "StringLessThanEquals", String;
    StringLessThanEqualsPath => "StringLessThanEqualsPath", Path;
    StringGreaterThanEquals => "StringGreaterThanEquals", String;
    StringGreaterThanEqualsPath => "StringGreaterThanEqualsPath", Path;
    StringMatches => "StringMatches", String;
    NumericEquals => "NumericEquals", Number;
    NumericEqualsPath => "NumericEqualsPath", Path;
    NumericLessThan => "NumericLessThan", Number;
    NumericLessThanPath => "NumericLessThanPath", Path;
    NumericGreaterThan => "NumericGreaterThan", Number;
    NumericGreaterThanPath => "NumericGreaterThanPath", Path;
    NumericLessThanEquals => "NumericLessThanEquals", Number;
    NumericLessThanEqualsPath => "NumericLessThanEqualsPath", Path;
    NumericGreaterThanEquals => "NumericGreaterThanEquals", Number;
    NumericGreaterThanEqualsPath => "NumericGreaterThanEqualsPath", Path;
    BooleanEquals => "BooleanEquals", Bool;
    BooleanEqualsPath => "BooleanEqualsPath", Path;
    TimestampEquals => "TimestampEquals", String;
    TimestampEqualsPath => "TimestampEqualsPath", Path;
    TimestampLessThan => "TimestampLessThan", String;
    TimestampLessThanPath => "TimestampLessThanPath", Path;
    TimestampGreaterThan => "TimestampGreaterThan", String;
    TimestampGreaterThanPath => "TimestampGreaterThanPath", Path;
    TimestampLessThanEquals => "TimestampLessThanEquals", String;
    TimestampLessThanEqualsPath => "TimestampLessThanEqualsPath", Path;
    TimestampGreaterThanEquals => "TimestampGreaterThanEquals", String;
    TimestampGreaterThanEqualsPath => "TimestampGreaterThanEqualsPath", Path;
    IsNull => "IsNull", Bool;
    IsPresent => "IsPresent", Bool;
    IsNumeric => "IsNumeric", Bool;
    IsString => "IsString", Bool;
    IsBoolean => "IsBoolean", Bool;
    IsTimestamp => "IsTimestamp", Bool;
}

impl ComparisonOperator {
    /// Type predicates test the shape of the variable's value rather than
    /// comparing it against another value.
    pub fn is_type_predicate(&self) -> bool {
        matches!(
            self,
            ComparisonOperator::IsNull
                | ComparisonOperator::IsPresent
                | ComparisonOperator::IsNumeric
                | ComparisonOperator::IsString
                | ComparisonOperator::IsBoolean
                | ComparisonOperator::IsTimestamp
        )
    }
}

/// A comparison operand: a literal, or a Reference Path for `*Path`
/// operators.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    String(String),
    Number(Number),
    Bool(bool),
}

impl Operand {
    pub fn kind_matches(&self, kind: OperandKind) -> bool {
        match kind {
            OperandKind::String | OperandKind::Path => matches!(self, Operand::String(_)),
            OperandKind::Number => matches!(self, Operand::Number(_)),
            OperandKind::Bool => matches!(self, Operand::Bool(_)),
        }
    }
}

/// The recursive Boolean grammar of Choice rules.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
    Comparison {
        variable: String,
        operator: ComparisonOperator,
        operand: Operand,
    },
}

impl Condition {
    pub fn and(children: Vec<Condition>) -> Condition {
        Condition::And(children)
    }

    pub fn or(children: Vec<Condition>) -> Condition {
        Condition::Or(children)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Condition) -> Condition {
        Condition::Not(Box::new(child))
    }

    pub fn compare(
        variable: impl Into<String>,
        operator: ComparisonOperator,
        operand: Operand,
    ) -> Condition {
        Condition::Comparison {
            variable: variable.into(),
            operator,
            operand,
        }
    }
}

/// One rule of a Choice state: a condition plus the state to go to when
/// it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub condition: Condition,
    pub next: String,
}

impl Choice {
    pub fn new(condition: Condition, next: impl Into<String>) -> Self {
        Choice {
            condition,
            next: next.into(),
        }
    }
}
