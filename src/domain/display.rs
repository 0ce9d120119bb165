//! Display fallbacks for referenced documents that are missing or incomplete.

use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

use crate::domain::entities::{CategoryRecord, UserProfileRecord};

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const UNKNOWN_AUTHOR: &str = "Unknown author";
pub const ANONYMOUS: &str = "Anonymous";
pub const DATE_NOT_SPECIFIED: &str = "Not specified";

pub const DISPLAY_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[day].[month].[year] [hour]:[minute]");

/// Resolve a post's category name, tolerating dangling references.
pub fn category_name<'a>(categories: &'a [CategoryRecord], category_id: Option<&str>) -> &'a str {
    category_id
        .and_then(|id| categories.iter().find(|category| category.id == id))
        .map(|category| category.name.as_str())
        .unwrap_or(UNCATEGORIZED)
}

/// Name shown for a profile: display name, else the local part of the email.
pub fn profile_name(profile: &UserProfileRecord) -> Option<String> {
    non_blank(profile.display_name.as_deref())
        .or_else(|| profile.email.as_deref().and_then(email_local_part))
        .map(str::to_string)
}

/// Author line for a post whose owner profile may be absent.
pub fn author_name(profile: Option<&UserProfileRecord>) -> String {
    profile
        .and_then(profile_name)
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
}

/// Name recorded on a new comment.
pub fn commenter_name(profile: Option<&UserProfileRecord>, email: Option<&str>) -> String {
    profile
        .and_then(profile_name)
        .or_else(|| email.and_then(email_local_part).map(str::to_string))
        .unwrap_or_else(|| ANONYMOUS.to_string())
}

pub fn format_timestamp(value: Option<OffsetDateTime>) -> String {
    value
        .and_then(|ts| ts.format(DISPLAY_DATE_FORMAT).ok())
        .unwrap_or_else(|| DATE_NOT_SPECIFIED.to_string())
}

fn email_local_part(email: &str) -> Option<&str> {
    non_blank(email.split('@').next())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}
