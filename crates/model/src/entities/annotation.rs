//! Notes and pins: append-only annotations on a container.

use serde_json::Value;

use crate::sparse::entity;
use crate::{ArtifactId, ContainerId, NoteId, PinId, Timestamp};

entity! {
    /// A note attached to a container.
    #[derive(PartialEq)]
    "note" => pub struct Note {
        pub id: Option<NoteId>,
        pub title: String,
        pub content: String,
        /// `"markdown"` or `"html"`.
        #[serde(rename = "note_format")]
        pub format: String,
        /// `"general"`, `"artifact"`, or `"task"`.
        #[serde(rename = "note_type")]
        pub kind: String,
        pub container: Option<ContainerId>,
        pub artifact: Option<ArtifactId>,
        pub artifact_name: String,
        pub author: Option<u64>,
        #[serde(rename = "_pretty_author")]
        pub author_name: String,
        pub phase: Option<u64>,
        pub task: Option<u64>,
        pub task_name: String,
        pub container_attachments: Vec<Value>,
        pub modified_time: Option<Timestamp>,
    }
}

entity! {
    /// A pin (HUD card) shown on a container.
    #[derive(PartialEq)]
    "pin" => pub struct Pin {
        pub id: Option<PinId>,
        pub container: Option<ContainerId>,
        pub message: String,
        pub data: String,
        #[serde(rename = "pin_style")]
        pub style: String,
        #[serde(rename = "pin_type")]
        pub kind: String,
    }
}

impl Note {
    /// A general markdown note.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            format: "markdown".into(),
            kind: "general".into(),
            ..Self::default()
        }
    }
}

impl Pin {
    /// A pin with a message and data card.
    pub fn new(message: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: data.into(),
            ..Self::default()
        }
    }
}
