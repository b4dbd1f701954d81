//! Result-normalizing call wrapper.
//!
//! [`to`] runs one deferred asynchronous operation and hands back an
//! [`Outcome`] instead of an error or a panic, so call sites branch on a
//! single value rather than wrapping every invocation in their own handling.

use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallErrorKind {
    /// The operation resolved to an error value.
    Rejected,
    /// The operation panicked while being built or polled.
    Panicked,
}

/// Uniform error shape for a failed operation. Only the shape changes: the
/// message is the rejection's own string representation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CallError {
    kind: CallErrorKind,
    message: String,
}

impl CallError {
    pub fn rejected(reason: impl fmt::Display) -> Self {
        Self {
            kind: CallErrorKind::Rejected,
            message: reason.to_string(),
        }
    }

    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        Self {
            kind: CallErrorKind::Panicked,
            message: panic_message(payload.as_ref()),
        }
    }

    pub fn kind(&self) -> CallErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Either side of a finished call, never both and never neither.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Failure(CallError),
    Success(T),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn error(&self) -> Option<&CallError> {
        match self {
            Outcome::Failure(err) => Some(err),
            Outcome::Success(_) => None,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failure(err) => Outcome::Failure(err),
        }
    }

    /// The `[error, value]` pair form.
    pub fn into_pair(self) -> (Option<CallError>, Option<T>) {
        match self {
            Outcome::Failure(err) => (Some(err), None),
            Outcome::Success(value) => (None, Some(value)),
        }
    }

    pub fn into_result(self) -> Result<T, CallError> {
        self.into()
    }
}

impl<T> From<Outcome<T>> for Result<T, CallError> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(err) => Err(err),
        }
    }
}

/// The text of a panic payload, for the two payload types `panic!` produces.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "operation panicked".to_string()
    }
}

/// Await the operation produced by `op` and normalize whatever it does into
/// an [`Outcome`]. Never panics and never retries.
pub async fn to<F, Fut, T, E>(op: F) -> Outcome<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let fut = match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(fut) => fut,
        Err(payload) => return Outcome::Failure(CallError::from_panic(payload)),
    };
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(value)) => Outcome::Success(value),
        Ok(Err(reason)) => Outcome::Failure(CallError::rejected(reason)),
        Err(payload) => Outcome::Failure(CallError::from_panic(payload)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolved_value_lands_on_the_success_side() {
        let outcome = to(|| async { Ok::<_, String>(42) }).await;
        assert_eq!(outcome.clone().into_pair(), (None, Some(42)));
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn absent_value_is_still_a_success() {
        let outcome = to(|| async { Ok::<Option<u8>, String>(None) }).await;
        assert_eq!(outcome, Outcome::Success(None));

        let unit = to(|| async { Ok::<(), String>(()) }).await;
        assert_eq!(unit.into_pair(), (None, Some(())));
    }

    #[tokio::test]
    async fn rejection_keeps_its_message() {
        let outcome = to(|| async { Err::<u8, _>("token expired") }).await;
        let (err, value) = outcome.into_pair();
        let err = err.expect("failure side populated");
        assert_eq!(err.message(), "token expired");
        assert_eq!(err.kind(), CallErrorKind::Rejected);
        assert_eq!(err.to_string(), "token expired");
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn panicking_future_is_captured() {
        let outcome = to(|| async {
            if true {
                panic!("boom");
            }
            Ok::<u8, String>(1)
        })
        .await;
        let err = outcome.error().cloned().expect("failure side populated");
        assert_eq!(err.kind(), CallErrorKind::Panicked);
        assert_eq!(err.message(), "boom");
    }

    #[tokio::test]
    async fn panicking_thunk_is_captured() {
        let outcome: Outcome<u8> = to(|| -> futures::future::Ready<Result<u8, String>> {
            panic!("{}", String::from("thunk failed"))
        })
        .await;
        assert_eq!(outcome.error().map(CallError::message), Some("thunk failed"));
    }

    #[test]
    fn into_result_matches_sides() {
        let ok: Result<u8, CallError> = Outcome::Success(3).into_result();
        assert_eq!(ok, Ok(3));
        let err: Result<u8, CallError> = Outcome::Failure(CallError::rejected("no")).into();
        assert_eq!(err.map_err(|e| e.to_string()), Err("no".to_string()));
    }
}
