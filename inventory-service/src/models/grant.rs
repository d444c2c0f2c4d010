use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    User,
    Team,
}

/// Access level carried by a grant. Declaration order is privilege order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleLevel {
    Read,
    Use,
    Admin,
}

impl RoleLevel {
    pub fn allows(&self, required: RoleLevel) -> bool {
        *self >= required
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    #[serde(rename = "type")]
    pub subject_type: SubjectType,
    pub subject_id: String,
    pub role: RoleLevel,
}

impl RoleGrant {
    pub fn user(user_id: impl Into<String>, role: RoleLevel) -> Self {
        Self {
            subject_type: SubjectType::User,
            subject_id: user_id.into(),
            role,
        }
    }

    pub fn team(team_id: impl Into<String>, role: RoleLevel) -> Self {
        Self {
            subject_type: SubjectType::Team,
            subject_id: team_id.into(),
            role,
        }
    }

    pub fn names(&self, subject_type: SubjectType, subject_id: &str) -> bool {
        self.subject_type == subject_type && self.subject_id == subject_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_implies_lower_levels() {
        assert!(RoleLevel::Admin.allows(RoleLevel::Read));
        assert!(RoleLevel::Admin.allows(RoleLevel::Use));
        assert!(RoleLevel::Use.allows(RoleLevel::Read));
        assert!(!RoleLevel::Read.allows(RoleLevel::Admin));
    }

    #[test]
    fn grants_serialize_with_type_tag() {
        let grant = RoleGrant::team("ops", RoleLevel::Use);
        let json = serde_json::to_value(&grant).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "team", "subject_id": "ops", "role": "use" })
        );
    }
}
