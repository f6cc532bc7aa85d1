use thiserror::Error;

/// Which part of a tick's input was unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputFault {
    #[error("no sensor snapshot was supplied")]
    MissingSnapshot,
    #[error("raw fix is not a finite position")]
    NonFiniteFix,
    #[error("delta time is not a finite number")]
    NonFiniteDeltaTime,
}

/// Hard failures of a positioning step. Engine state is left untouched.
///
/// Missing optional signals and degenerate time steps are not errors; the
/// pipeline absorbs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PositioningError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputFault),
}
