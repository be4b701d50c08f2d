pub mod scenarios;
pub mod validation;

pub use scenarios::{credit_hours, ScenarioInfo, ToilPolicy, ToilScenario};
pub use validation::{validate, ErrorCode, FieldError, ToilSubmission};
