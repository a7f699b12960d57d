//! Form state: repeatable sections and the orchestrator that ties values,
//! validation and submission together

mod orchestrator;
mod repeatable;

pub use orchestrator::{
    validate_all, DynamicForm, FormAction, FormModel, FormPhase, PendingSubmit, SubmitCompletion,
    SubmitOutcome, BLOCKED_MESSAGE, BUSY_MESSAGE, SUCCESS_MESSAGE,
};
pub use repeatable::RepeatableSection;
