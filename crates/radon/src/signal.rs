use crate::{error::Error, value::Value};

/// Non-local control flow carried in the `Err` channel during evaluation.
///
/// Every evaluation step returns `RunResult<Value>`; a plain value flows
/// through `Ok` and anything that must unwind enclosing forms flows through
/// `Err`. This makes exactly one unwind reason active at a time and lets `?`
/// do the propagation the original envelope did with `register` +
/// `should_return` checks after every step.
#[derive(Debug)]
pub enum Signal {
    /// A runtime error; propagates unchanged to the program boundary.
    Error(Box<Error>),
    /// `return` with its value; caught at the function-call boundary.
    Return(Value),
    /// `break`; caught by the nearest enclosing loop.
    Break,
    /// `continue`; caught by the nearest enclosing loop.
    Continue,
    /// `continue_outer`; the nearest loop stops and re-raises `Continue`
    /// for its own enclosing loop.
    ContinueOuter,
    /// `exit()`; propagates through every frame to the process boundary.
    Exit(Value),
}

/// Result alias used by every evaluation step and builtin.
pub type RunResult<T> = Result<T, Signal>;

impl Signal {
    /// Returns the contained error, if this is the error variant.
    pub fn into_error(self) -> Result<Error, Self> {
        match self {
            Self::Error(err) => Ok(*err),
            other => Err(other),
        }
    }

    pub fn is_exit(&self) -> bool {
        matches!(self, Self::Exit(_))
    }
}

impl From<Error> for Signal {
    fn from(err: Error) -> Self {
        Self::Error(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorKind, position::Span};

    #[test]
    fn exactly_one_unwind_reason_at_a_time() {
        // The flat encoding makes the "exactly one flag" invariant structural:
        // a Signal is one variant, and Ok carries no flag at all.
        let ok: RunResult<Value> = Ok(Value::Int(1));
        assert!(ok.is_ok());

        let signals = [
            Signal::from(Error::new(ErrorKind::RTError, Span::internal(), "boom")),
            Signal::Return(Value::Null),
            Signal::Break,
            Signal::Continue,
            Signal::ContinueOuter,
            Signal::Exit(Value::Null),
        ];
        for signal in signals {
            let res: RunResult<Value> = Err(signal);
            assert!(res.is_err());
        }
    }
}
