use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::UserError;

/// User entity - a single record in the directory, stored in MongoDB
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique identifier (stored as _id in MongoDB), assigned at insertion
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// Contact email, unique across all users
    pub email: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// DTO for registering a new user
///
/// Both fields are presence-checked only; no format validation beyond that.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
}

/// The subset of fields an update applies to a matched user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// Criteria used to locate exactly one user for update/delete.
///
/// Exactly one criterion is in play per call; which one is decided once at
/// the request boundary by [`Selector::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    ById(Uuid),
    ByEmail(String),
    ByName(String),
}

impl Selector {
    /// Resolve the wire fields into a single criterion.
    ///
    /// Priority is fixed: id over email over name. Empty strings count as
    /// absent. Fails when nothing usable is supplied or when the id is not
    /// a valid UUID.
    pub fn resolve(
        id: Option<&str>,
        email: Option<&str>,
        name: Option<&str>,
    ) -> Result<Self, UserError> {
        fn present(value: Option<&str>) -> Option<&str> {
            value.filter(|v| !v.is_empty())
        }

        if let Some(id) = present(id) {
            let id = Uuid::parse_str(id)
                .map_err(|_| UserError::Validation(format!("'{}' is not a valid user id", id)))?;
            return Ok(Selector::ById(id));
        }

        if let Some(email) = present(email) {
            return Ok(Selector::ByEmail(email.to_string()));
        }

        if let Some(name) = present(name) {
            return Ok(Selector::ByName(name.to_string()));
        }

        Err(UserError::Validation(
            "Provide id, email, or name to select a user".to_string(),
        ))
    }
}

/// Request body for `PUT /update-user`: selector fields plus the patch
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    pub id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "newName")]
    pub new_name: Option<String>,
    #[serde(rename = "newEmail")]
    pub new_email: Option<String>,
}

impl UpdateUserRequest {
    pub fn selector(&self) -> Result<Selector, UserError> {
        Selector::resolve(self.id.as_deref(), self.email.as_deref(), self.name.as_deref())
    }

    /// Patch fields to apply; empty strings count as absent
    pub fn patch(&self) -> UserPatch {
        fn present(value: &Option<String>) -> Option<String> {
            value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
        }

        UserPatch {
            name: present(&self.new_name),
            email: present(&self.new_email),
        }
    }
}

/// Request body for `DELETE /delete-user`: selector fields only
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct DeleteUserRequest {
    pub id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl DeleteUserRequest {
    pub fn selector(&self) -> Result<Selector, UserError> {
        Selector::resolve(self.id.as_deref(), self.email.as_deref(), self.name.as_deref())
    }
}

impl User {
    /// Create a new user from a CreateUser DTO
    pub fn new(input: CreateUser) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            email: input.email,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply patch fields to this user, leaving unset fields untouched
    pub fn apply_patch(&mut self, patch: UserPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_input() -> CreateUser {
        CreateUser {
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
        }
    }

    #[test]
    fn test_new_user_gets_id_and_timestamps() {
        let user = User::new(create_input());
        assert!(!user.id.is_nil());
        assert_eq!(user.name, "Ann");
        assert_eq!(user.email, "ann@x.com");
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_apply_patch_only_touches_supplied_fields() {
        let mut user = User::new(create_input());

        user.apply_patch(UserPatch {
            name: Some("Annie".to_string()),
            email: None,
        });

        assert_eq!(user.name, "Annie");
        assert_eq!(user.email, "ann@x.com");
        assert!(user.updated_at >= user.created_at);
    }

    #[test]
    fn test_selector_priority_id_over_email_over_name() {
        let id = Uuid::now_v7();
        let id_str = id.to_string();

        let selector =
            Selector::resolve(Some(&id_str), Some("ann@x.com"), Some("Ann")).unwrap();
        assert_eq!(selector, Selector::ById(id));

        let selector = Selector::resolve(None, Some("ann@x.com"), Some("Ann")).unwrap();
        assert_eq!(selector, Selector::ByEmail("ann@x.com".to_string()));

        let selector = Selector::resolve(None, None, Some("Ann")).unwrap();
        assert_eq!(selector, Selector::ByName("Ann".to_string()));
    }

    #[test]
    fn test_selector_treats_empty_strings_as_absent() {
        let selector = Selector::resolve(Some(""), Some(""), Some("Ann")).unwrap();
        assert_eq!(selector, Selector::ByName("Ann".to_string()));
    }

    #[test]
    fn test_selector_requires_at_least_one_field() {
        let result = Selector::resolve(None, None, None);
        assert!(matches!(result, Err(UserError::Validation(_))));
    }

    #[test]
    fn test_selector_rejects_malformed_id() {
        let result = Selector::resolve(Some("not-a-uuid"), None, None);
        assert!(matches!(result, Err(UserError::Validation(_))));
    }

    #[test]
    fn test_update_request_wire_names() {
        let request: UpdateUserRequest = serde_json::from_str(
            r#"{"email":"ann@x.com","newName":"Annie","newEmail":"annie@x.com"}"#,
        )
        .unwrap();

        assert_eq!(request.email.as_deref(), Some("ann@x.com"));
        let patch = request.patch();
        assert_eq!(patch.name.as_deref(), Some("Annie"));
        assert_eq!(patch.email.as_deref(), Some("annie@x.com"));
    }

    #[test]
    fn test_update_request_empty_patch_fields_are_absent() {
        let request: UpdateUserRequest =
            serde_json::from_str(r#"{"email":"ann@x.com","newName":""}"#).unwrap();

        assert!(request.patch().is_empty());
    }

    #[test]
    fn test_user_serializes_id_as_underscore_id() {
        let user = User::new(create_input());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("_id").is_some());
        assert!(json.get("id").is_none());
    }

    #[test]
    fn test_create_user_presence_validation() {
        let valid = create_input();
        assert!(valid.validate().is_ok());

        let missing_name = CreateUser {
            name: String::new(),
            email: "ann@x.com".to_string(),
        };
        assert!(missing_name.validate().is_err());

        let missing_email = CreateUser {
            name: "Ann".to_string(),
            email: String::new(),
        };
        assert!(missing_email.validate().is_err());
    }
}
