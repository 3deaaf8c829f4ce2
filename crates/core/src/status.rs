//! Status-code behaviour.
//!
//! Every status code a dispatcher can put a unit in carries a `should_do`
//! marker. Two of them move a unit across the duty boundary; the rest are
//! sub-states of being on duty.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Behaviour attached to a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShouldDo {
    SetStatus,
    SetOnDuty,
    SetOffDuty,
    SetAssigned,
    PanicButtonOn,
    PanicButtonOff,
}

/// The duty-boundary transition a status change triggers, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DutyTransition {
    OnDuty,
    OffDuty,
}

impl ShouldDo {
    pub fn as_str(self) -> &'static str {
        match self {
            ShouldDo::SetStatus => "set_status",
            ShouldDo::SetOnDuty => "set_on_duty",
            ShouldDo::SetOffDuty => "set_off_duty",
            ShouldDo::SetAssigned => "set_assigned",
            ShouldDo::PanicButtonOn => "panic_button_on",
            ShouldDo::PanicButtonOff => "panic_button_off",
        }
    }

    pub fn duty_transition(self) -> Option<DutyTransition> {
        match self {
            ShouldDo::SetOnDuty => Some(DutyTransition::OnDuty),
            ShouldDo::SetOffDuty => Some(DutyTransition::OffDuty),
            _ => None,
        }
    }

    pub fn is_off_duty(self) -> bool {
        self == ShouldDo::SetOffDuty
    }
}

impl fmt::Display for ShouldDo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShouldDo {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "set_status" => Ok(ShouldDo::SetStatus),
            "set_on_duty" => Ok(ShouldDo::SetOnDuty),
            "set_off_duty" => Ok(ShouldDo::SetOffDuty),
            "set_assigned" => Ok(ShouldDo::SetAssigned),
            "panic_button_on" => Ok(ShouldDo::PanicButtonOn),
            "panic_button_off" => Ok(ShouldDo::PanicButtonOff),
            other => Err(CoreError::Validation(format!("Unknown should_do: {other}"))),
        }
    }
}
