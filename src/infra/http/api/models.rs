use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::application::identity::Principal;
use crate::application::listing::{SortKey, SortOrder};
use crate::application::media::ImageUpload;
use crate::domain::entities::UserProfileRecord;
use crate::domain::types::MembershipKind;

use super::error::ApiError;

/// Image sent inline with a post as base64.
#[derive(Debug, Deserialize, Serialize)]
pub struct ImagePayload {
    pub file_name: String,
    pub data_base64: String,
}

impl ImagePayload {
    pub fn decode(self) -> Result<ImageUpload, ApiError> {
        let data = STANDARD
            .decode(self.data_base64.trim())
            .map_err(|err| ApiError::bad_request("Invalid image encoding", Some(err.to_string())))?;
        Ok(ImageUpload {
            file_name: self.file_name,
            data: data.into(),
        })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct PrincipalResponse {
    pub id: String,
    pub email: String,
}

impl From<&Principal> for PrincipalResponse {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id.clone(),
            email: principal.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub principal: PrincipalResponse,
    pub profile: UserProfileRecord,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub principal: PrincipalResponse,
    pub profile: UserProfileRecord,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PostCreateRequest {
    pub title: String,
    pub description: String,
    pub content: String,
    pub category_id: Option<String>,
    pub image: Option<ImagePayload>,
}

/// Partial edit; absent fields keep their current value.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PostUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    /// `Some("")` clears the category.
    pub category_id: Option<String>,
    pub image: Option<ImagePayload>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CommentCreateRequest {
    pub text: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CategoryRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub post_id: String,
    pub kind: MembershipKind,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct CategoryDeletedResponse {
    pub category_id: String,
    pub cleared_posts: Vec<String>,
}

/// Query string shared by every paginated listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<SortKey>,
    pub order: Option<SortOrder>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub filter: Option<MembershipKind>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}
