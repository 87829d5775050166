//! Permission set consulted before a change set is executed.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::changeset::ChangeKind;
use crate::error::Error;

/// A kind of mutation the caller may allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ApplyAction {
    AddService,
    UpdateService,
    DeleteService,
    AddDestination,
    UpdateDestination,
    DeleteDestination,
}

impl ApplyAction {
    pub const ALL: [ApplyAction; 6] = [
        ApplyAction::AddService,
        ApplyAction::UpdateService,
        ApplyAction::DeleteService,
        ApplyAction::AddDestination,
        ApplyAction::UpdateDestination,
        ApplyAction::DeleteDestination,
    ];

    /// Two-letter code used on the command line.
    pub fn code(&self) -> &'static str {
        match self {
            ApplyAction::AddService => "as",
            ApplyAction::UpdateService => "us",
            ApplyAction::DeleteService => "ds",
            ApplyAction::AddDestination => "ad",
            ApplyAction::UpdateDestination => "ud",
            ApplyAction::DeleteDestination => "dd",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.code() == code)
    }
}

impl From<ChangeKind> for ApplyAction {
    fn from(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::AddService => ApplyAction::AddService,
            ChangeKind::UpdateService => ApplyAction::UpdateService,
            ChangeKind::DeleteService => ApplyAction::DeleteService,
            ChangeKind::AddDestination => ApplyAction::AddDestination,
            ChangeKind::UpdateDestination => ApplyAction::UpdateDestination,
            ChangeKind::DeleteDestination => ApplyAction::DeleteDestination,
        }
    }
}

impl fmt::Display for ApplyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Set of allowed actions. The default allows nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedActions(BTreeSet<ApplyAction>);

impl AllowedActions {
    pub fn all() -> Self {
        Self(ApplyAction::ALL.into_iter().collect())
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn only(actions: impl IntoIterator<Item = ApplyAction>) -> Self {
        Self(actions.into_iter().collect())
    }

    pub fn allows(&self, action: ApplyAction) -> bool {
        self.0.contains(&action)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AllowedActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self.0.iter().map(ApplyAction::code).collect();
        f.write_str(&codes.join(","))
    }
}

impl FromStr for AllowedActions {
    type Err = Error;

    /// `*` allows everything, otherwise a comma-separated list of codes.
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let spec = spec.trim();
        if spec == "*" {
            return Ok(Self::all());
        }
        spec.split(',')
            .map(|code| {
                let code = code.trim();
                ApplyAction::from_code(code)
                    .ok_or_else(|| Error::Validation(format!("invalid action: {}", code)))
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }
}

/// Options for building and applying a change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOpts {
    /// Leave live weights untouched when updating destinations.
    pub keep_weights: bool,
    pub allowed_actions: AllowedActions,
}

impl Default for ApplyOpts {
    fn default() -> Self {
        Self {
            keep_weights: false,
            allowed_actions: AllowedActions::all(),
        }
    }
}
