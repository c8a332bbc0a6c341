use serde::{Deserialize, Deserializer};

/// A contact as delivered by the storage service.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "saturating_strength")]
    pub connection_strength: u8,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub meet_through_id: Option<String>,
}

/// Reads any non-negative integer and saturates it at
/// [`ContactRecord::MAX_STRENGTH`].
fn saturating_strength<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = u64::deserialize(deserializer)?;
    Ok(raw.min(u64::from(ContactRecord::MAX_STRENGTH)) as u8)
}

impl ContactRecord {
    pub const DEFAULT_CATEGORY: &'static str = "default";
    pub const MAX_STRENGTH: u8 = 100;

    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            category: None,
            connection_strength: 0,
            tags: None,
            image_ref: None,
            meet_through_id: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_strength(mut self, strength: u8) -> Self {
        self.connection_strength = strength;
        self
    }

    pub fn with_meet_through(mut self, id: impl Into<String>) -> Self {
        self.meet_through_id = Some(id.into());
        self
    }

    pub fn category_or_default(&self) -> &str {
        self.category
            .as_deref()
            .filter(|category| !category.is_empty())
            .unwrap_or(Self::DEFAULT_CATEGORY)
    }
}
