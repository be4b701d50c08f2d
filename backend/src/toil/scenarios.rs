use serde::{Deserialize, Serialize};

use super::validation::ToilSubmission;

/// The four travel situations a TOIL submission can describe. The scenario
/// tag decides which fields the submission must carry and how much TOIL it
/// earns once approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "toil_scenario", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ToilScenario {
    LocalShow,
    WorkingDayPanel,
    OvernightDayOff,
    OvernightWorkingDay,
}

/// Display metadata for one scenario. Rendering-only; validation never reads
/// from here.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ScenarioInfo {
    pub label: &'static str,
    pub description: &'static str,
    pub help_text: &'static str,
}

impl ToilScenario {
    pub const ALL: [ToilScenario; 4] = [
        ToilScenario::LocalShow,
        ToilScenario::WorkingDayPanel,
        ToilScenario::OvernightDayOff,
        ToilScenario::OvernightWorkingDay,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToilScenario::LocalShow => "local_show",
            ToilScenario::WorkingDayPanel => "working_day_panel",
            ToilScenario::OvernightDayOff => "overnight_day_off",
            ToilScenario::OvernightWorkingDay => "overnight_working_day",
        }
    }

    /// Parse the wire spelling used in API payloads. Returns `None` for
    /// anything outside the fixed set.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "local_show" => Some(ToilScenario::LocalShow),
            "working_day_panel" => Some(ToilScenario::WorkingDayPanel),
            "overnight_day_off" => Some(ToilScenario::OvernightDayOff),
            "overnight_working_day" => Some(ToilScenario::OvernightWorkingDay),
            _ => None,
        }
    }

    pub fn info(self) -> &'static ScenarioInfo {
        match self {
            ToilScenario::LocalShow => &ScenarioInfo {
                label: "Local show",
                description: "Attending a show or event in your home city.",
                help_text: "No overnight stay and no travel outside your base — no TOIL is credited.",
            },
            ToilScenario::WorkingDayPanel => &ScenarioInfo {
                label: "Panel / showcase on a working day",
                description: "Travelling to sit on a panel or showcase that falls on a working day.",
                help_text: "Name the colleague covering your duties. Your next working day is treated as starting at 1pm.",
            },
            ToilScenario::OvernightDayOff => &ScenarioInfo {
                label: "Overnight, returning on a day off",
                description: "Overnight travel where the return journey lands on a scheduled day off.",
                help_text: "A fixed TOIL credit is added to your balance once the request is approved.",
            },
            ToilScenario::OvernightWorkingDay => &ScenarioInfo {
                label: "Overnight, returning on a working day",
                description: "Overnight travel where the return journey lands on a working day.",
                help_text: "Enter your arrival time (24-hour HH:MM). TOIL is credited for the part of the working day spent travelling.",
            },
        }
    }
}

/// TOIL crediting knobs, sourced from `Config` at startup.
#[derive(Debug, Clone, Copy)]
pub struct ToilPolicy {
    /// Fixed credit for an overnight return on a day off.
    pub day_off_credit_hours: f64,
    /// Cap on the computed credit for a return on a working day.
    pub max_daily_credit_hours: f64,
}

impl Default for ToilPolicy {
    fn default() -> Self {
        Self {
            day_off_credit_hours: 4.0,
            max_daily_credit_hours: 8.0,
        }
    }
}

/// TOIL hours a validated submission earns on approval.
///
/// A working-day return credits the stretch from midnight to the arrival
/// time, on the reading that those are the hours of the would-be working day
/// lost to travel, capped by policy. Local shows and working-day panels earn
/// nothing here; the panel scenario's "start at 1pm next day" rule is a
/// scheduling concern, not a balance credit.
pub fn credit_hours(submission: &ToilSubmission, policy: &ToilPolicy) -> f64 {
    match submission {
        ToilSubmission::LocalShow { .. } | ToilSubmission::WorkingDayPanel { .. } => 0.0,
        ToilSubmission::OvernightDayOff { .. } => policy.day_off_credit_hours,
        ToilSubmission::OvernightWorkingDay { return_time, .. } => {
            let minutes = return_time.hour() as f64 * 60.0 + return_time.minute() as f64;
            (minutes / 60.0).min(policy.max_daily_credit_hours)
        }
    }
}
