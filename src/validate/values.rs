use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::SubmitError;

/// Requested wall-clock limit, `HH:MM:SS`
///
/// Hours are unbounded (but always two digits), minutes and seconds must be below 60.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Walltime {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Walltime {
    pub fn parse(value: &str) -> Result<Walltime, SubmitError> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"^([0-9]{2}):([0-9]{2}):([0-9]{2})$").expect("valid walltime regex")
        });

        let invalid = || SubmitError::InvalidFormat { name: "WALLTIME", value: value.to_string() };
        let caps = pattern.captures(value).ok_or_else(invalid)?;
        let field = |i: usize| -> Result<u32, SubmitError> {
            caps[i].parse::<u32>().map_err(|_| invalid())
        };
        let (hours, minutes, seconds) = (field(1)?, field(2)?, field(3)?);

        if minutes >= 60 {
            return Err(SubmitError::InvalidRange { name: "WALLTIME minutes", value: value.to_string() });
        }
        if seconds >= 60 {
            return Err(SubmitError::InvalidRange { name: "WALLTIME seconds", value: value.to_string() });
        }

        Ok(Walltime { hours, minutes, seconds })
    }
}

impl fmt::Display for Walltime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// When the scheduler should email the user about the job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationMode {
    /// begin, end and abort
    AllTransitions,
    None,
}

impl NotificationMode {
    /// EMAIL_NOTIFICATIONS is a `0`/`1` switch
    pub fn from_flag(value: &str) -> Result<NotificationMode, SubmitError> {
        match value {
            "1" => Ok(NotificationMode::AllTransitions),
            "0" => Ok(NotificationMode::None),
            _ => Err(SubmitError::InvalidRange {
                name: "EMAIL_NOTIFICATIONS",
                value: value.to_string(),
            }),
        }
    }

    /// Argument to `#PBS -m`
    pub fn pbs_events(&self) -> &'static str {
        match self {
            NotificationMode::AllTransitions => "abe",
            NotificationMode::None => "n",
        }
    }
}

/// NPROCESS must be a positive integer
pub fn parse_nprocess(value: &str) -> Result<u32, SubmitError> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(SubmitError::InvalidFormat { name: "NPROCESS", value: value.to_string() });
    }
    match value.parse::<u32>() {
        Ok(0) | Err(_) => Err(SubmitError::InvalidRange { name: "NPROCESS", value: value.to_string() }),
        Ok(n) => Ok(n),
    }
}
