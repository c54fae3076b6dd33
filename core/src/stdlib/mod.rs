//! Standard library
//!
//! Builtin functions available to every program:
//! - Conversions: `int`, `uint`, `double`, `string`, `bytes`, `bool`, `dyn`,
//!   `type`, `timestamp`, `duration`
//! - Strings and collections: `size`, `contains`, `startsWith`, `endsWith`,
//!   `toLower`, `toUpper`, `trim`, `split`
//! - Math: `abs`, `ceil`, `floor`, `round`, `sqrt`, `pow`, `min`, `max`
//! - Time accessors: `getFullYear`, `getMonth`, `getHours`, ...
//!
//! A builtin receives its arguments already evaluated; for member calls such
//! as `s.startsWith("a")` the receiver is the first argument. Argument counts
//! are checked by the evaluator before the builtin runs.

use hashbrown::HashMap;

use crate::evaluator::ExecutionErrorKind;
use crate::values::Value;

pub mod conversions;
pub mod math;
pub mod strings;
pub mod time;

pub type BuiltinFn = fn(&[Value]) -> Result<Value, ExecutionErrorKind>;

/// A native function with an argument count range.
#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub min_arity: usize,
    pub max_arity: usize,
    pub function: BuiltinFn,
}

impl Builtin {
    pub const fn new(name: &'static str, arity: usize, function: BuiltinFn) -> Self {
        Self {
            name,
            min_arity: arity,
            max_arity: arity,
            function,
        }
    }

    pub const fn ranged(
        name: &'static str,
        min_arity: usize,
        max_arity: usize,
        function: BuiltinFn,
    ) -> Self {
        Self {
            name,
            min_arity,
            max_arity,
            function,
        }
    }

    /// The arity when it is a single number.
    pub fn fixed_arity(&self) -> Option<usize> {
        (self.min_arity == self.max_arity).then_some(self.min_arity)
    }

    pub fn accepts(&self, count: usize) -> bool {
        (self.min_arity..=self.max_arity).contains(&count)
    }

    /// Human-readable arity, e.g. `1` or `1 to 2`.
    pub fn arity_description(&self) -> String {
        match self.fixed_arity() {
            Some(n) => n.to_string(),
            None => format!("{} to {}", self.min_arity, self.max_arity),
        }
    }
}

pub type Library = HashMap<&'static str, Builtin>;

/// Build the table of every builtin.
pub fn standard_library() -> Library {
    let mut library = Library::new();
    for builtin in conversions::BUILTINS
        .iter()
        .chain(strings::BUILTINS)
        .chain(math::BUILTINS)
        .chain(time::BUILTINS)
    {
        library.insert(builtin.name, *builtin);
    }
    library
}

/// Fails with `TypeMismatch` naming `function` and the argument kinds.
pub(crate) fn no_overload(function: &str, args: &[Value]) -> ExecutionErrorKind {
    ExecutionErrorKind::no_overload(function, &args.iter().collect::<Vec<_>>())
}

#[cfg(test)]
mod stdlib_test;
