//! Tag API endpoints.

use super::{success, ApiResult};
use crate::models::{tag_catalogue, TagGroup};

/// GET /api/tags - Main tags and their suggested sub-tags.
pub async fn list_tags() -> ApiResult<Vec<TagGroup>> {
    success(tag_catalogue())
}
