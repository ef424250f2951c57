use crate::data::store::StoreError;
use crate::error::ValidationError;
use crate::gate::Denial;
use crate::week::InvalidWeek;

pub mod jwt;
pub mod page;
pub mod problem;

use problem::Problem;

/// Anything a guarded handler can fail with.
#[derive(Debug, Responder)]
pub enum Rejection {
    Denied(Denial),
    Problem(Problem),
}

impl From<Denial> for Rejection {
    fn from(value: Denial) -> Self {
        Rejection::Denied(value)
    }
}

impl From<Problem> for Rejection {
    fn from(value: Problem) -> Self {
        Rejection::Problem(value)
    }
}

impl From<StoreError> for Rejection {
    fn from(value: StoreError) -> Self {
        Rejection::Problem(value.into())
    }
}

impl From<InvalidWeek> for Rejection {
    fn from(value: InvalidWeek) -> Self {
        Rejection::Problem(value.into())
    }
}

impl From<ValidationError> for Rejection {
    fn from(value: ValidationError) -> Self {
        Rejection::Problem(value.into())
    }
}

impl From<jsonwebtoken::errors::Error> for Rejection {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        Rejection::Problem(value.into())
    }
}
