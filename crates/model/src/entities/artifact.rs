//! Artifact: an evidence record owned by exactly one container.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde_json::Value;

use crate::sparse::entity;
use crate::{ArtifactId, ContainerId, PlaybookRunId, SoarError, Timestamp};

entity! {
    /// An evidence record attached to a container.
    ///
    /// The owning container is referenced by id only. It is read from the
    /// `container` field of server records and written as `container_id`,
    /// which is what the artifact creation endpoint expects.
    ///
    /// Equality and hashing are structural over `(name, label, container)`;
    /// see [`Artifact::identity_key`].
    "artifact" => pub struct Artifact {
        /// Server-assigned identity; `None` until created.
        pub id: Option<ArtifactId>,
        /// Owning container.
        #[serde(rename(serialize = "container_id", deserialize = "container"))]
        pub container: Option<ContainerId>,
        pub name: String,
        pub label: String,
        pub description: String,
        pub tags: Vec<String>,
        /// Common Event Format fields (`sourceAddress`, `fileHash`, …).
        pub cef: BTreeMap<String, Value>,
        /// Contains-type hints per CEF field.
        pub cef_types: BTreeMap<String, Vec<String>>,
        pub data: Value,
        pub severity: String,
        pub source_data_identifier: String,
        #[serde(rename = "type")]
        pub kind: String,
        pub owner_id: Option<u64>,
        pub kill_chain: String,
        pub playbook_run: Option<PlaybookRunId>,
        pub hash: String,
        pub in_case: bool,
        pub version: Option<u64>,
        pub parent_container: Option<ContainerId>,
        pub parent_artifact: Option<ArtifactId>,
        pub create_time: Option<Timestamp>,
        pub start_time: Option<Timestamp>,
        pub end_time: Option<Timestamp>,
        pub update_time: Option<Timestamp>,
    }
}

impl Artifact {
    /// Creates an uncreated artifact with a name and label.
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            ..Self::default()
        }
    }

    /// Adds a CEF field.
    #[must_use]
    pub fn with_cef(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.cef.insert(key.into(), value.into());
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Returns `true` once the artifact carries a server-assigned id.
    pub fn is_created(&self) -> bool {
        self.id.is_some()
    }

    /// The tuple that defines artifact equality.
    pub fn identity_key(&self) -> (&str, &str, Option<ContainerId>) {
        (&self.name, &self.label, self.container)
    }

    /// Checks the artifact has a name or a label.
    pub fn validate_for_creation(&self) -> Result<(), SoarError> {
        if self.name.is_empty() && self.label.is_empty() {
            return Err(SoarError::ObjectMissingAttributes {
                message: "artifact must have a name or a label".into(),
            });
        }
        Ok(())
    }

    /// Returns a copy holding only the fields accepted at creation.
    ///
    /// Server-managed fields (times, hash, version) are dropped so the server
    /// assigns them.
    pub fn creation_payload(&self) -> Artifact {
        Artifact {
            container: self.container,
            name: self.name.clone(),
            label: self.label.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
            cef: self.cef.clone(),
            cef_types: self.cef_types.clone(),
            data: self.data.clone(),
            severity: self.severity.clone(),
            source_data_identifier: self.source_data_identifier.clone(),
            kind: self.kind.clone(),
            owner_id: self.owner_id,
            ..Artifact::default()
        }
    }
}

impl PartialEq for Artifact {
    fn eq(&self, other: &Self) -> bool {
        self.identity_key() == other.identity_key()
    }
}

impl Eq for Artifact {}

impl Hash for Artifact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity_key().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::Entity;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn container_reference_uses_distinct_wire_names() {
        let fetched: Artifact =
            serde_json::from_value(json!({ "id": 5, "container": 17, "name": "ip" })).unwrap();
        assert_eq!(fetched.container, Some(ContainerId::new(17)));

        let payload = fetched.creation_payload().to_payload().unwrap();
        assert_eq!(payload, json!({ "container_id": 17, "name": "ip" }));
    }

    #[test]
    fn equality_does_not_collide_on_concatenation() {
        let a = Artifact::new("ab", "c");
        let b = Artifact::new("a", "bc");
        assert_ne!(a, b);

        let set: HashSet<Artifact> = [a.clone(), b, a].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn equality_ignores_non_identity_fields() {
        let a = Artifact::new("ip", "event").with_cef("sourceAddress", "10.0.0.1");
        let b = Artifact::new("ip", "event");
        assert_eq!(a, b);
    }

    #[test]
    fn creation_requires_name_or_label() {
        assert!(Artifact::new("", "").validate_for_creation().is_err());
        assert!(Artifact::new("", "event").validate_for_creation().is_ok());
    }

    #[test]
    fn creation_payload_drops_server_fields() {
        let mut artifact = Artifact::new("ip", "event").with_tag("suspicious");
        artifact.id = Some(ArtifactId::new(3));
        artifact.hash = "abc".into();
        artifact.version = Some(2);

        let payload = artifact.creation_payload().to_payload().unwrap();
        assert_eq!(
            payload,
            json!({ "name": "ip", "label": "event", "tags": ["suspicious"] })
        );
    }
}
