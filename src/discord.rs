//! Discord webhook notifications for ingest runs.

use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

const USERNAME: &str = "kinmap";
const COLOR_SUCCESS: u32 = 0x00FF00;
const COLOR_FAILURE: u32 = 0xFF0000;

#[derive(Serialize, Debug)]
struct DiscordEmbed {
    title: String,
    description: String,
    color: u32,
    timestamp: String,
}

#[derive(Serialize, Debug)]
struct DiscordPayload {
    username: String,
    embeds: Vec<DiscordEmbed>,
}

impl DiscordPayload {
    fn new(title: &str, description: &str, success: bool) -> Self {
        Self {
            username: USERNAME.to_string(),
            embeds: vec![DiscordEmbed {
                title: title.to_string(),
                description: description.to_string(),
                color: if success { COLOR_SUCCESS } else { COLOR_FAILURE },
                timestamp: chrono::Utc::now().to_rfc3339(),
            }],
        }
    }
}

pub struct DiscordWebhook {
    url: String,
    client: reqwest::Client,
}

impl DiscordWebhook {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }

    pub async fn send_notification(
        &self,
        title: &str,
        description: &str,
        success: bool,
    ) -> Result<()> {
        let payload = DiscordPayload::new(title, description, success);
        let response = self.client.post(&self.url).json(&payload).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            anyhow::bail!("Discord notification failed: {}", error_text);
        }

        info!("Sent Discord notification: {}", title);
        Ok(())
    }

    /// Like `send_notification`, but only logs delivery failures.
    pub async fn notify(&self, title: &str, description: &str, success: bool) {
        if let Err(e) = self.send_notification(title, description, success).await {
            warn!("Failed to send Discord notification '{}': {}", title, e);
        }
    }
}
