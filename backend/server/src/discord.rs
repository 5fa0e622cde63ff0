//! # Deploy Notifications
//!
//! Vercel posts deployment events here; we repost them to a Discord channel
//! webhook as a single embed.
//!
//! ## Colors
//! - READY or `deployment.succeeded`: green
//! - ERROR or `deployment.error`: red
//! - BUILDING: yellow
//! - anything else: blurple
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const USERNAME: &str = "Vercel Deploy";
pub const AVATAR_URL: &str = "https://assets.vercel.com/image/upload/front/favicon/vercel/180x180.png";

pub const BLURPLE: u32 = 0x5865F2;
pub const GREEN: u32 = 0x57F287;
pub const RED: u32 = 0xED4245;
pub const YELLOW: u32 = 0xFEE75C;

const SUCCEEDED: &str = "deployment.succeeded";
const FAILED: &str = "deployment.error";

#[derive(Deserialize, Debug)]
pub struct WebhookRequest {
    pub payload: DeployEvent,
}

#[derive(Deserialize, Debug, Default)]
pub struct DeployEvent {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub target: Option<String>,
    pub deployment: Option<Deployment>,
    pub project: Option<Named>,
    pub user: Option<Creator>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Deployment {
    pub url: Option<String>,
    pub state: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Named {
    pub name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Creator {
    pub username: Option<String>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct Message {
    pub username: &'static str,
    pub avatar_url: &'static str,
    pub embeds: Vec<Embed>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub timestamp: String,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct EmbedField {
    pub name: &'static str,
    pub value: String,
    pub inline: bool,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

impl DeployEvent {
    fn state(&self) -> Option<&str> {
        present(self.deployment.as_ref().and_then(|d| d.state.as_ref()))
            .or_else(|| present(self.kind.as_ref()))
    }

    fn is(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }

    fn style(&self) -> (u32, &'static str) {
        match self.state() {
            _ if self.is(SUCCEEDED) => (GREEN, "✅"),
            Some("READY") => (GREEN, "✅"),
            _ if self.is(FAILED) => (RED, "❌"),
            Some("ERROR") => (RED, "❌"),
            Some("BUILDING") => (YELLOW, "🔨"),
            _ => (BLURPLE, "🚀"),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn build_message(event: &DeployEvent, timestamp: String) -> Message {
    let (color, emoji) = event.style();

    let heading = if event.is(SUCCEEDED) {
        "Deployment Successful"
    } else {
        "Deployment Update"
    };

    let project = present(event.project.as_ref().and_then(|p| p.name.as_ref()))
        .unwrap_or("Unknown Project");
    let creator = present(event.user.as_ref().and_then(|u| u.username.as_ref()))
        .unwrap_or("Unknown User");
    let target = present(event.target.as_ref()).unwrap_or("production");
    let url = present(event.deployment.as_ref().and_then(|d| d.url.as_ref()))
        .map(|url| format!("https://{url}"));

    Message {
        username: USERNAME,
        avatar_url: AVATAR_URL,
        embeds: vec![Embed {
            title: format!("{emoji} {heading}"),
            description: format!("**{project}** has been deployed"),
            color,
            fields: vec![
                EmbedField {
                    name: "Status",
                    value: event.state().unwrap_or("Success").to_string(),
                    inline: true,
                },
                EmbedField {
                    name: "Environment",
                    value: capitalize(target),
                    inline: true,
                },
                EmbedField {
                    name: "Deployed by",
                    value: creator.to_string(),
                    inline: true,
                },
            ],
            url,
            timestamp,
        }],
    }
}

pub fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub async fn send(client: &Client, webhook_url: &str, message: &Message) -> Result<(), AppError> {
    let response = client
        .post(webhook_url)
        .json(message)
        .send()
        .await
        .map_err(|e| AppError::DownstreamSendFailed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::DownstreamSendFailed(format!("{status}: {body}")));
    }

    Ok(())
}
