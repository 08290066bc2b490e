use porch_common::FromMessage;

use crate::state::WizardStep;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{field} is required")]
    Validation { field: &'static str },
    #[error("cannot {action} on the {step} step")]
    InvalidState {
        step: WizardStep,
        action: &'static str,
    },
    #[error("unknown add-on '{id}'")]
    UnknownAddOn { id: String },
    #[error("unknown tier '{name}'")]
    UnknownTier { name: String },
    #[error("no onboarding wizard is open")]
    NotOpen,
    #[error("submission failed: {message}")]
    Submission { message: String },
    #[error("submission cancelled because the wizard was closed")]
    Cancelled,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{message}")]
    Message { message: String },
}

impl Error {
    pub(crate) fn invalid_state(step: WizardStep, action: &'static str) -> Self {
        Self::InvalidState { step, action }
    }

    pub(crate) fn submission(message: impl Into<String>) -> Self {
        Self::Submission {
            message: message.into(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

porch_common::impl_context!();
