use serde::{Deserialize, Serialize};

/// Membership of an identity in a team, organization or similar group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct GroupMembership {
    #[serde(rename = "type")]
    pub group_type: String,
    pub id: String,
    pub name: String,
}

impl GroupMembership {
    pub fn new(
        group_type: impl Into<String>,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            group_type: group_type.into(),
            id: id.into(),
            name: name.into(),
        }
    }

    /// `type:id` form used by the Vortex JWT `groups` claim
    pub fn scoped_id(&self) -> String {
        format!("{}:{}", self.group_type, self.id)
    }
}

/// An authenticated principal.
///
/// Group order is preserved as given; it carries no meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub role: String,
    pub groups: Vec<GroupMembership>,
}
