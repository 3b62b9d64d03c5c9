use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("Control not found: {0}")]
    ControlNotFound(String),

    #[error("Control is not interactable: {0}")]
    NotInteractable(String),

    #[error("Hook target could not be resolved: {0}")]
    HookUnresolved(String),

    #[error("Hook could not be attached: {0}")]
    HookAttachFailed(String),

    #[error("Engine error: {0}")]
    EngineError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
