use chrono::{DateTime, Utc};
use serde::Serialize;
use store::models::Attachment;

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedUser {
    pub id: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_last_name: Option<String>,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub project_count: usize,
}

/// Trimmed user view for the author picker.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl From<ProcessedUser> for Student {
    fn from(user: ProcessedUser) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            code: user.code,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Seo {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedProject {
    pub id: String,
    pub numeric_id: u64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover: Option<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub gallery: Vec<Attachment>,
    pub videos: Vec<String>,
    pub authors: Vec<ProcessedUser>,
    pub categories: Vec<String>,
    pub courses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub seo: Seo,
}
