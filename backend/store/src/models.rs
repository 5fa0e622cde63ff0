//! # Airtable Schema
//!
//! Field bags as stored in the base. Airtable drops empty cells from the
//! payload entirely, so every field tolerates absence.
//!
//! ## Tables
//! - users: students credited on projects
//! - categories, courses: display names linked from projects
//! - projects: the portfolio entries, with up to 5 gallery and 5 video slots
//! - tickets: write-only work requests from the site
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RawRecord<T> {
    pub id: String,
    pub fields: T,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Attachment {
    pub id: String,
    pub url: String,
    pub filename: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnails: Option<Thumbnails>,
}

// Non-image attachments come back with only some sizes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Thumbnails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<Thumbnail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<Thumbnail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full: Option<Thumbnail>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Thumbnail {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct UserFields {
    #[serde(default)]
    pub first_name: String,
    pub last_name: Option<String>,
    pub second_last_name: Option<String>,
    pub code: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
    pub posts_id: Option<Vec<String>>,
    pub tickets: Option<Vec<String>>,
}

/// Shared by categories and courses.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct NamedFields {
    #[serde(rename = "Name", default)]
    pub name: String,
    pub projects: Option<Vec<String>>,
}

pub type CategoryFields = NamedFields;
pub type CourseFields = NamedFields;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ProjectFields {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub course: Option<Vec<String>>,
    pub cycle: Option<String>,
    pub category: Option<Vec<String>>,
    pub cover: Option<Vec<Attachment>>,
    pub url: Option<String>,
    pub gallery_1: Option<Vec<Attachment>>,
    pub gallery_2: Option<Vec<Attachment>>,
    pub gallery_3: Option<Vec<Attachment>>,
    pub gallery_4: Option<Vec<Attachment>>,
    pub gallery_5: Option<Vec<Attachment>>,
    pub video_1: Option<String>,
    pub video_2: Option<String>,
    pub video_3: Option<String>,
    pub video_4: Option<String>,
    pub video_5: Option<String>,
    pub authors: Option<Vec<String>>,
    pub contact: Option<String>,
    pub created: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub slug: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub published_to_webflow: Option<bool>,
}

impl ProjectFields {
    /// Gallery slots in field-number order.
    pub fn gallery_slots(&self) -> [Option<&Vec<Attachment>>; 5] {
        [
            self.gallery_1.as_ref(),
            self.gallery_2.as_ref(),
            self.gallery_3.as_ref(),
            self.gallery_4.as_ref(),
            self.gallery_5.as_ref(),
        ]
    }

    /// Video slots in field-number order.
    pub fn video_slots(&self) -> [Option<&String>; 5] {
        [
            self.video_1.as_ref(),
            self.video_2.as_ref(),
            self.video_3.as_ref(),
            self.video_4.as_ref(),
            self.video_5.as_ref(),
        ]
    }
}

pub const TICKET_KINDS: [&str; 3] = ["update-users", "update-images", "update-videos"];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TicketKind {
    UpdateUsers,
    UpdateImages,
    UpdateVideos,
}

impl TicketKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketKind::UpdateUsers => TICKET_KINDS[0],
            TicketKind::UpdateImages => TICKET_KINDS[1],
            TicketKind::UpdateVideos => TICKET_KINDS[2],
        }
    }
}

impl FromStr for TicketKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "update-users" => Ok(TicketKind::UpdateUsers),
            "update-images" => Ok(TicketKind::UpdateImages),
            "update-videos" => Ok(TicketKind::UpdateVideos),
            other => Err(format!("unknown ticket type: {other}")),
        }
    }
}

impl fmt::Display for TicketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields written when a ticket is created. Links are single-element arrays
/// because Airtable link cells always hold record id lists.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewTicket {
    #[serde(rename = "type")]
    pub kind: TicketKind,
    pub project: Vec<String>,
    #[serde(
        rename = "update-users",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub update_users: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewTicket {
    pub fn new(kind: TicketKind, project_id: impl Into<String>) -> Self {
        Self {
            kind,
            project: vec![project_id.into()],
            update_users: None,
            notes: None,
        }
    }

    /// Empty lists are not written.
    pub fn with_users(mut self, user_ids: Vec<String>) -> Self {
        if !user_ids.is_empty() {
            self.update_users = Some(user_ids);
        }
        self
    }

    /// Blank notes are not written.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        let notes = notes.into();
        if !notes.is_empty() {
            self.notes = Some(notes);
        }
        self
    }
}
