//! Tag catalogue offered by the admin form.

use serde::Serialize;

use super::MainTag;

/// A main tag with the sub-tags suggested for it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagGroup {
    pub main_tag: MainTag,
    pub suggested_sub_tags: Vec<&'static str>,
}

const TOURIST_SUB_TAGS: [&str; 5] = ["Restaurant", "Beach", "Hotel", "Activities", "Shopping"];
const RESIDENT_SUB_TAGS: [&str; 5] = [
    "Supermarket",
    "Healthcare",
    "Services",
    "Community",
    "Education",
];

/// Fixed catalogue; sub-tags outside it are still accepted on videos.
pub fn tag_catalogue() -> Vec<TagGroup> {
    vec![
        TagGroup {
            main_tag: MainTag::Tourist,
            suggested_sub_tags: TOURIST_SUB_TAGS.to_vec(),
        },
        TagGroup {
            main_tag: MainTag::Resident,
            suggested_sub_tags: RESIDENT_SUB_TAGS.to_vec(),
        },
    ]
}
