//! Scenario files: one container, its artifacts and the playbooks to run.
//!
//! ```toml
//! scope = "new"
//!
//! [container]
//! name = "Suspicious login"
//! label = "events"
//! tags = ["triage"]
//!
//! [[container.artifacts]]
//! name = "source address"
//! label = "event"
//! cef = { sourceAddress = "10.1.1.7" }
//!
//! [[playbooks]]
//! name = "local/block_ip"
//! prompts = { "confirm block" = ["yes"] }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use soar_model::{Artifact, Container, Playbook, PlaybookId, RunScope};

use crate::config::ConfigError;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default)]
    pub scope: RunScope,
    pub container: ContainerDecl,
    #[serde(default)]
    pub playbooks: Vec<PlaybookDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerDecl {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub sensitivity: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactDecl {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cef: BTreeMap<String, Value>,
}

/// A playbook to run, named or given by definition id.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaybookDecl {
    pub name: Option<String>,
    pub id: Option<u64>,
    /// Prompt name to the responses submitted when it is raised.
    #[serde(default)]
    pub prompts: BTreeMap<String, Vec<String>>,
}

impl Scenario {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scenario: Scenario = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.playbooks.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "playbooks",
                reason: "at least one playbook is required".to_string(),
            });
        }
        if let Some(index) = self
            .playbooks
            .iter()
            .position(|playbook| {
                playbook.name.as_deref().map_or(true, str::is_empty) && playbook.id.is_none()
            })
        {
            return Err(ConfigError::InvalidValue {
                field: "playbooks",
                reason: format!("playbook #{index} needs a name or an id"),
            });
        }
        Ok(())
    }

    /// The uncreated container (with its artifacts) and the playbooks to run.
    pub fn into_parts(self) -> (Container, Vec<Playbook>, RunScope) {
        let declared = self.container;
        let mut container = Container::new(declared.name, declared.label);
        container.description = declared.description;
        container.severity = declared.severity;
        container.sensitivity = declared.sensitivity;
        container.tags = declared.tags;
        for artifact in declared.artifacts {
            container.add_artifact(artifact.into_artifact());
        }

        let playbooks = self
            .playbooks
            .into_iter()
            .map(PlaybookDecl::into_playbook)
            .collect();
        (container, playbooks, self.scope)
    }
}

impl ArtifactDecl {
    fn into_artifact(self) -> Artifact {
        let mut artifact = Artifact::new(self.name, self.label);
        artifact.description = self.description;
        artifact.severity = self.severity;
        artifact.tags = self.tags;
        artifact.cef = self.cef;
        artifact
    }
}

impl PlaybookDecl {
    fn into_playbook(self) -> Playbook {
        let mut playbook = match self.id {
            Some(id) => Playbook::from_id(PlaybookId::new(id)),
            None => Playbook::default(),
        };
        if let Some(name) = self.name {
            playbook.name = name;
        }
        playbook.prompts = self.prompts;
        playbook
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soar_model::ArtifactId;

    const SCENARIO: &str = r#"
        scope = "new"

        [container]
        name = "Suspicious login"
        label = "events"
        severity = "high"
        tags = ["triage"]

        [[container.artifacts]]
        name = "source address"
        label = "event"
        cef = { sourceAddress = "10.1.1.7", destinationPort = 22 }

        [[playbooks]]
        name = "local/block_ip"
        prompts = { "confirm block" = ["yes", "24h"] }

        [[playbooks]]
        id = 17
    "#;

    #[test]
    fn scenario_builds_container_and_playbooks() {
        let scenario: Scenario = toml::from_str(SCENARIO).unwrap();
        scenario.validate().unwrap();

        let (container, playbooks, scope) = scenario.into_parts();

        assert_eq!(scope, RunScope::New);
        assert_eq!(container.name, "Suspicious login");
        assert_eq!(container.severity, "high");
        assert!(container.id.is_none());
        assert_eq!(container.artifacts.len(), 1);
        assert_eq!(
            container.artifacts[0].cef.get("destinationPort"),
            Some(&serde_json::json!(22))
        );

        assert_eq!(playbooks.len(), 2);
        assert_eq!(playbooks[0].name, "local/block_ip");
        assert_eq!(
            playbooks[0].responses_for("confirm block"),
            Some(["yes".to_string(), "24h".to_string()].as_slice())
        );
        assert_eq!(playbooks[1].playbook_id, Some(PlaybookId::new(17)));
    }

    #[test]
    fn scope_defaults_to_all_and_accepts_artifact_ids() {
        let minimal: Scenario =
            toml::from_str("[container]\nname = \"c\"\n[[playbooks]]\nname = \"p\"\n").unwrap();
        assert_eq!(minimal.scope, RunScope::All);

        let explicit: Scenario = toml::from_str(
            "scope = [4, 5]\n[container]\nname = \"c\"\n[[playbooks]]\nname = \"p\"\n",
        )
        .unwrap();
        assert_eq!(
            explicit.scope,
            RunScope::Artifacts(vec![ArtifactId::new(4), ArtifactId::new(5)])
        );
    }

    #[test]
    fn scenario_without_playbooks_is_rejected() {
        let scenario: Scenario = toml::from_str("[container]\nname = \"c\"\n").unwrap();
        assert!(matches!(
            scenario.validate().unwrap_err(),
            ConfigError::InvalidValue { field: "playbooks", .. }
        ));
    }

    #[test]
    fn playbook_without_name_or_id_is_rejected() {
        let scenario: Scenario = toml::from_str(
            "[container]\nname = \"c\"\n[[playbooks]]\nname = \"p\"\n[[playbooks]]\nprompts = {}\n",
        )
        .unwrap();
        let err = scenario.validate().unwrap_err();
        assert!(err.to_string().contains("playbook #1"), "got: {err}");
    }
}
