use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SubmitError;

/// The option names a run configuration recognises. All of them are required.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionName {
    Binary,
    Namelist,
    Nprocess,
    Walltime,
    Memory,
    Queue,
    Project,
    Email,
    EmailNotifications,
    JobName,
}

impl OptionName {
    /// Required options, in the order presence is checked
    pub const REQUIRED: [OptionName; 10] = [
        OptionName::Binary,
        OptionName::Namelist,
        OptionName::Nprocess,
        OptionName::Walltime,
        OptionName::Memory,
        OptionName::Queue,
        OptionName::Project,
        OptionName::Email,
        OptionName::EmailNotifications,
        OptionName::JobName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionName::Binary => "BINARY",
            OptionName::Namelist => "NAMELIST",
            OptionName::Nprocess => "NPROCESS",
            OptionName::Walltime => "WALLTIME",
            OptionName::Memory => "MEMORY",
            OptionName::Queue => "QUEUE",
            OptionName::Project => "PROJECT",
            OptionName::Email => "EMAIL",
            OptionName::EmailNotifications => "EMAIL_NOTIFICATIONS",
            OptionName::JobName => "JOB_NAME",
        }
    }
}

impl fmt::Display for OptionName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OptionName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OptionName::REQUIRED
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or(())
    }
}

/// Option values read from a run configuration file
///
/// Values are stored exactly as parsed (after interpolation). Once validation passes every
/// required option is present and non-empty; only BINARY and NAMELIST are rewritten afterwards,
/// when their paths are made absolute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    values: BTreeMap<OptionName, String>,
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: OptionName, value: impl Into<String>) {
        self.values.insert(name, value.into());
    }

    #[cfg(test)]
    pub fn remove(&mut self, name: OptionName) -> Option<String> {
        self.values.remove(&name)
    }

    /// Raw lookup, empty values included
    pub fn get(&self, name: OptionName) -> Option<&str> {
        self.values.get(&name).map(String::as_str)
    }

    /// Lookup that treats an absent or empty value as missing
    pub fn require(&self, name: OptionName) -> Result<&str, SubmitError> {
        match self.get(name) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(SubmitError::MissingVariable(name)),
        }
    }
}
