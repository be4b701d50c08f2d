use serde::Serialize;
use serde_json::Value;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, Time};

use super::scenarios::ToilScenario;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// A fully validated TOIL submission. Each variant carries exactly the fields
/// its scenario requires; anything else in the raw payload is dropped during
/// validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "scenario", rename_all = "snake_case")]
pub enum ToilSubmission {
    LocalShow {
        travel_date: Date,
        reason: String,
    },
    WorkingDayPanel {
        travel_date: Date,
        reason: String,
        covering_user_id: String,
    },
    OvernightDayOff {
        travel_date: Date,
        reason: String,
        return_date: Date,
    },
    OvernightWorkingDay {
        travel_date: Date,
        reason: String,
        return_date: Date,
        return_time: Time,
    },
}

impl ToilSubmission {
    pub fn scenario(&self) -> ToilScenario {
        match self {
            ToilSubmission::LocalShow { .. } => ToilScenario::LocalShow,
            ToilSubmission::WorkingDayPanel { .. } => ToilScenario::WorkingDayPanel,
            ToilSubmission::OvernightDayOff { .. } => ToilScenario::OvernightDayOff,
            ToilSubmission::OvernightWorkingDay { .. } => ToilScenario::OvernightWorkingDay,
        }
    }

    pub fn travel_date(&self) -> Date {
        match self {
            ToilSubmission::LocalShow { travel_date, .. }
            | ToilSubmission::WorkingDayPanel { travel_date, .. }
            | ToilSubmission::OvernightDayOff { travel_date, .. }
            | ToilSubmission::OvernightWorkingDay { travel_date, .. } => *travel_date,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            ToilSubmission::LocalShow { reason, .. }
            | ToilSubmission::WorkingDayPanel { reason, .. }
            | ToilSubmission::OvernightDayOff { reason, .. }
            | ToilSubmission::OvernightWorkingDay { reason, .. } => reason,
        }
    }

    pub fn return_date(&self) -> Option<Date> {
        match self {
            ToilSubmission::OvernightDayOff { return_date, .. }
            | ToilSubmission::OvernightWorkingDay { return_date, .. } => Some(*return_date),
            _ => None,
        }
    }

    pub fn return_time(&self) -> Option<Time> {
        match self {
            ToilSubmission::OvernightWorkingDay { return_time, .. } => Some(*return_time),
            _ => None,
        }
    }

    pub fn covering_user_id(&self) -> Option<&str> {
        match self {
            ToilSubmission::WorkingDayPanel {
                covering_user_id, ..
            } => Some(covering_user_id),
            _ => None,
        }
    }
}

/// Machine-readable reason a field was rejected. The UI keys off these to
/// attach messages to the right form control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    UnknownScenario,
    TravelDateRequired,
    InvalidTravelDate,
    ReasonTooShort,
    CoverageRequired,
    ReturnDateRequired,
    InvalidReturnDate,
    InvalidReturnTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub code: ErrorCode,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            field,
            code,
            message: message.into(),
        }
    }
}

const MIN_REASON_CHARS: usize = 10;

/// Validate a raw submission payload against the rules of its declared
/// scenario.
///
/// Pure and side-effect free: no I/O, no balance lookups. A missing,
/// mistyped, or unrecognised `scenario` rejects immediately (no tag means no
/// further rules apply); otherwise every violated field is reported, not just
/// the first.
pub fn validate(raw: &Value) -> Result<ToilSubmission, Vec<FieldError>> {
    let scenario = raw
        .get("scenario")
        .and_then(Value::as_str)
        .and_then(ToilScenario::from_wire);

    let Some(scenario) = scenario else {
        return Err(vec![FieldError::new(
            "scenario",
            ErrorCode::UnknownScenario,
            "Scenario must be one of local_show, working_day_panel, overnight_day_off, overnight_working_day",
        )]);
    };

    let mut errors = Vec::new();

    let travel_date = parse_date_field(raw, "travel_date", &mut errors, true);
    let reason = validate_reason(raw, &mut errors);

    let mut covering_user_id = None;
    let mut return_date = None;
    let mut return_time = None;

    match scenario {
        ToilScenario::LocalShow => {}
        ToilScenario::WorkingDayPanel => {
            covering_user_id = match raw.get("covering_user_id").and_then(Value::as_str) {
                Some(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
                _ => {
                    errors.push(FieldError::new(
                        "covering_user_id",
                        ErrorCode::CoverageRequired,
                        "Name the colleague covering your duties",
                    ));
                    None
                }
            };
        }
        ToilScenario::OvernightDayOff => {
            return_date = parse_date_field(raw, "return_date", &mut errors, false);
        }
        ToilScenario::OvernightWorkingDay => {
            return_date = parse_date_field(raw, "return_date", &mut errors, false);
            return_time = match raw.get("return_time").and_then(Value::as_str) {
                Some(s) => match parse_return_time(s) {
                    Some(t) => Some(t),
                    None => {
                        errors.push(FieldError::new(
                            "return_time",
                            ErrorCode::InvalidReturnTime,
                            "Return time must be a 24-hour HH:MM time",
                        ));
                        None
                    }
                },
                None => {
                    errors.push(FieldError::new(
                        "return_time",
                        ErrorCode::InvalidReturnTime,
                        "Return time is required for an overnight working-day return",
                    ));
                    None
                }
            };
        }
    }

    // Every recorded error left its field as None, so when the error list is
    // empty the required options are all Some.
    let built = (|| {
        let travel_date = travel_date?;
        let reason = reason?;
        Some(match scenario {
            ToilScenario::LocalShow => ToilSubmission::LocalShow { travel_date, reason },
            ToilScenario::WorkingDayPanel => ToilSubmission::WorkingDayPanel {
                travel_date,
                reason,
                covering_user_id: covering_user_id?,
            },
            ToilScenario::OvernightDayOff => ToilSubmission::OvernightDayOff {
                travel_date,
                reason,
                return_date: return_date?,
            },
            ToilScenario::OvernightWorkingDay => ToilSubmission::OvernightWorkingDay {
                travel_date,
                reason,
                return_date: return_date?,
                return_time: return_time?,
            },
        })
    })();

    match built {
        Some(submission) if errors.is_empty() => Ok(submission),
        _ => Err(errors),
    }
}

fn parse_date_field(
    raw: &Value,
    field: &'static str,
    errors: &mut Vec<FieldError>,
    is_travel_date: bool,
) -> Option<Date> {
    let required_code = if is_travel_date {
        ErrorCode::TravelDateRequired
    } else {
        ErrorCode::ReturnDateRequired
    };
    match raw.get(field).and_then(Value::as_str) {
        None => {
            errors.push(FieldError::new(
                field,
                required_code,
                format!("{} is required", label_for(field)),
            ));
            None
        }
        Some(s) => match Date::parse(s, DATE_FORMAT) {
            Ok(d) => Some(d),
            Err(_) => {
                let code = if is_travel_date {
                    ErrorCode::InvalidTravelDate
                } else {
                    ErrorCode::InvalidReturnDate
                };
                errors.push(FieldError::new(
                    field,
                    code,
                    format!("{} must be a valid YYYY-MM-DD date", label_for(field)),
                ));
                None
            }
        },
    }
}

fn label_for(field: &str) -> &'static str {
    match field {
        "travel_date" => "Travel date",
        "return_date" => "Return date",
        _ => "Field",
    }
}

fn validate_reason(raw: &Value, errors: &mut Vec<FieldError>) -> Option<String> {
    let reason = raw.get("reason").and_then(Value::as_str).unwrap_or("");
    // Character count, not byte length.
    if reason.chars().count() < MIN_REASON_CHARS {
        errors.push(FieldError::new(
            "reason",
            ErrorCode::ReasonTooShort,
            format!("Reason must be at least {} characters", MIN_REASON_CHARS),
        ));
        None
    } else {
        Some(reason.to_string())
    }
}

/// Parse a 24-hour `HH:MM` time. A single-digit hour is accepted ("9:30");
/// anything outside 00:00–23:59 is not.
fn parse_return_time(s: &str) -> Option<Time> {
    let (h, m) = s.split_once(':')?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return None;
    }
    if !h.bytes().all(|b| b.is_ascii_digit()) || !m.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hour: u8 = h.parse().ok()?;
    let minute: u8 = m.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Time::from_hms(hour, minute, 0).ok()
}
