use std::collections::BTreeSet;

use super::model::FileId;
use super::protocol::{Group, Protocol, Purpose, Subworld, WorldType};
use crate::error::QueryResult;

// ---------------------------------------------------------------------------
// ObjectQuery – every dimension `Database::objects` can filter on
// ---------------------------------------------------------------------------

/// Filter criteria for file objects.
///
/// An empty set means "no constraint" for `protocols`, `groups` and
/// `purposes`. Combinations that cannot match anything are allowed and simply
/// select no file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectQuery {
    pub protocols: BTreeSet<Protocol>,
    pub groups: BTreeSet<Group>,
    pub purposes: BTreeSet<Purpose>,
    pub world_type: WorldType,
    pub subworld: Subworld,
    /// Restrict dev/eval files to these models (enrollment file ids).
    pub model_ids: Option<BTreeSet<FileId>>,
}

impl ObjectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse criteria given by name, as they arrive from the command line.
    pub fn from_names(
        protocol: Option<&str>,
        groups: &[&str],
        purposes: &[&str],
        world_type: Option<&str>,
        subworld: Option<&str>,
    ) -> QueryResult<Self> {
        let mut query = ObjectQuery::new();
        if let Some(protocol) = protocol {
            query = query.protocol(protocol.parse()?);
        }
        for group in groups {
            query = query.group(group.parse()?);
        }
        for purpose in purposes {
            query = query.purpose(purpose.parse()?);
        }
        if let Some(world_type) = world_type {
            query = query.world_type(world_type.parse()?);
        }
        if let Some(subworld) = subworld {
            query = query.subworld(subworld.parse()?);
        }
        Ok(query)
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocols.insert(protocol);
        self
    }

    pub fn group(mut self, group: Group) -> Self {
        self.groups.insert(group);
        self
    }

    pub fn groups(mut self, groups: impl IntoIterator<Item = Group>) -> Self {
        self.groups.extend(groups);
        self
    }

    pub fn purpose(mut self, purpose: Purpose) -> Self {
        self.purposes.insert(purpose);
        self
    }

    pub fn purposes(mut self, purposes: impl IntoIterator<Item = Purpose>) -> Self {
        self.purposes.extend(purposes);
        self
    }

    pub fn world_type(mut self, world_type: WorldType) -> Self {
        self.world_type = world_type;
        self
    }

    pub fn subworld(mut self, subworld: Subworld) -> Self {
        self.subworld = subworld;
        self
    }

    pub fn model_ids(mut self, ids: impl IntoIterator<Item = FileId>) -> Self {
        self.model_ids.get_or_insert_with(BTreeSet::new).extend(ids);
        self
    }

    /// Protocols to search: the chosen ones, or all of them.
    pub fn selected_protocols(&self) -> Vec<Protocol> {
        select_or_all(&self.protocols, Protocol::all())
    }

    pub fn selected_groups(&self) -> Vec<Group> {
        select_or_all(&self.groups, Group::ALL.to_vec())
    }

    /// Whether files with `purpose` pass the purpose filter.
    pub fn wants(&self, purpose: Purpose) -> bool {
        self.purposes.is_empty() || self.purposes.contains(&purpose)
    }
}

/// The members of `chosen`, or `all` when nothing was chosen.
pub fn select_or_all<T: Copy + Ord>(chosen: &BTreeSet<T>, all: Vec<T>) -> Vec<T> {
    if chosen.is_empty() {
        all
    } else {
        chosen.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;

    #[test]
    fn defaults_select_everything() {
        let query = ObjectQuery::new();
        assert_eq!(query.selected_protocols().len(), 11);
        assert_eq!(query.selected_groups(), Group::ALL.to_vec());
        assert!(query.wants(Purpose::Probe));
        assert_eq!(query.world_type, WorldType::Unrestricted);
        assert_eq!(query.subworld, Subworld::Sevenfolds);
        assert!(query.model_ids.is_none());
    }

    #[test]
    fn from_names_parses_each_dimension() {
        let query = ObjectQuery::from_names(
            Some("fold8"),
            &["dev"],
            &["enrol"],
            Some("restricted"),
            Some("threefolds"),
        )
        .unwrap();
        assert_eq!(query.selected_protocols(), vec![Protocol::Fold(8)]);
        assert_eq!(query.selected_groups(), vec![Group::Dev]);
        assert!(query.wants(Purpose::Enrol));
        assert!(!query.wants(Purpose::Probe));
        assert_eq!(query.world_type, WorldType::Restricted);
        assert_eq!(query.subworld, Subworld::Threefolds);
    }

    #[test]
    fn from_names_rejects_unknown_values() {
        let err = ObjectQuery::from_names(None, &["train"], &[], None, None).unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument { kind: "group", .. }));
        let err = ObjectQuery::from_names(None, &[], &["gallery"], None, None).unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument { kind: "purpose", .. }));
    }

    #[test]
    fn model_ids_accumulate() {
        let query = ObjectQuery::new().model_ids([3, 1]).model_ids([2]);
        assert_eq!(query.model_ids, Some(BTreeSet::from([1, 2, 3])));
    }
}
