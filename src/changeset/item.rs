//! Change set items.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::types::{Destination, Service};

/// Discriminant of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    AddService,
    UpdateService,
    DeleteService,
    AddDestination,
    UpdateDestination,
    DeleteDestination,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeKind::AddService => "add-service",
            ChangeKind::UpdateService => "update-service",
            ChangeKind::DeleteService => "delete-service",
            ChangeKind::AddDestination => "add-destination",
            ChangeKind::UpdateDestination => "update-destination",
            ChangeKind::DeleteDestination => "delete-destination",
        })
    }
}

/// A single structural change with its payload.
///
/// `AddService` carries the complete target service including its
/// destinations. Destination-scoped changes carry a reference to the
/// service (without its destinations) they belong to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Change {
    AddService {
        service: Service,
    },
    UpdateService {
        service: Service,
    },
    DeleteService {
        service: Service,
    },
    AddDestination {
        service: Service,
        destination: Destination,
    },
    UpdateDestination {
        service: Service,
        destination: Destination,
    },
    DeleteDestination {
        service: Service,
        destination: Destination,
    },
}

impl Change {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::AddService { .. } => ChangeKind::AddService,
            Change::UpdateService { .. } => ChangeKind::UpdateService,
            Change::DeleteService { .. } => ChangeKind::DeleteService,
            Change::AddDestination { .. } => ChangeKind::AddDestination,
            Change::UpdateDestination { .. } => ChangeKind::UpdateDestination,
            Change::DeleteDestination { .. } => ChangeKind::DeleteDestination,
        }
    }

    pub fn service(&self) -> &Service {
        match self {
            Change::AddService { service }
            | Change::UpdateService { service }
            | Change::DeleteService { service }
            | Change::AddDestination { service, .. }
            | Change::UpdateDestination { service, .. }
            | Change::DeleteDestination { service, .. } => service,
        }
    }

    /// The destination, for destination-scoped changes.
    pub fn destination(&self) -> Option<&Destination> {
        match self {
            Change::AddDestination { destination, .. }
            | Change::UpdateDestination { destination, .. }
            | Change::DeleteDestination { destination, .. } => Some(destination),
            _ => None,
        }
    }
}

/// A change plus a human-readable reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSetItem {
    #[serde(flatten)]
    pub change: Change,
    pub description: String,
}

impl ChangeSetItem {
    pub fn new(change: Change, description: impl Into<String>) -> Self {
        Self {
            change,
            description: description.into(),
        }
    }

    pub fn kind(&self) -> ChangeKind {
        self.change.kind()
    }
}

/// Ordered list of changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSet {
    pub items: Vec<ChangeSetItem>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_change(&mut self, item: ChangeSetItem) {
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChangeSetItem> {
        self.items.iter()
    }

    /// Number of items of the given kind.
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.items.iter().filter(|i| i.kind() == kind).count()
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a ChangeSetItem;
    type IntoIter = std::slice::Iter<'a, ChangeSetItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
