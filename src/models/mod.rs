use serde::{Deserialize, Serialize};
use strum::Display;

/// Anatomical region a muscle group belongs to.
///
/// The backend has been seen emitting both kebab-case and snake/upper-case
/// spellings; we always send kebab-case.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub(crate) enum MuscleCategory {
    #[serde(rename = "upper-body", alias = "upper_body", alias = "UPPER_BODY")]
    #[strum(to_string = "Upper body")]
    UpperBody,
    #[serde(rename = "lower-body", alias = "lower_body", alias = "LOWER_BODY")]
    #[strum(to_string = "Lower body")]
    LowerBody,
    #[serde(rename = "core", alias = "CORE")]
    #[strum(to_string = "Core")]
    Core,
}

impl MuscleCategory {
    pub const ALL: [MuscleCategory; 3] = [
        MuscleCategory::UpperBody,
        MuscleCategory::LowerBody,
        MuscleCategory::Core,
    ];

    /// Wire value, also used as the `<option value>` in forms.
    pub fn as_key(&self) -> &'static str {
        match self {
            MuscleCategory::UpperBody => "upper-body",
            MuscleCategory::LowerBody => "lower-body",
            MuscleCategory::Core => "core",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_key() == key)
    }
}

/// Member muscle of a group.
///
/// Depending on the endpoint the backend either embeds the muscle or only
/// sends its id.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub(crate) enum MuscleRef {
    Embedded {
        #[serde(alias = "_id")]
        id: String,
        name: String,
    },
    Id(String),
}

impl MuscleRef {
    pub fn label(&self) -> &str {
        match self {
            MuscleRef::Embedded { name, .. } => name,
            MuscleRef::Id(id) => id,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MuscleGroup {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub category: MuscleCategory,
    #[serde(default)]
    pub description: Option<String>,
    /// `None` means root.
    #[serde(default)]
    pub parent_group_id: Option<String>,
    #[serde(default)]
    pub muscles: Vec<MuscleRef>,
    /// Sibling order persisted by the reorder endpoint.
    #[serde(default)]
    pub order: Option<i32>,
}

/// Read-side projection built by the backend: a group plus its materialized children.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct HierarchyNode {
    #[serde(flatten)]
    pub group: MuscleGroup,
    #[serde(default)]
    pub children: Vec<HierarchyNode>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct OrderUpdate {
    pub id: String,
    pub order: i32,
}
