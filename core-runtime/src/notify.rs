//! Notification channels.
//!
//! One aggregated notification is dispatched per account at the end of its
//! pass. Channels are configured per account; accounts without endpoints
//! degrade to log-only.

use crate::config::AccountConfig;
use crate::error::{Result, RuntimeError};
use async_trait::async_trait;
use core_http::{HttpClient, HttpRequest};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Accepts a (title, aggregated body) pair and dispatches it to one channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, title: &str, body: &str) -> Result<()>;
}

/// Telegram bot channel (`sendMessage`).
pub struct TelegramNotifier {
    http: Arc<dyn HttpClient>,
    bot_token: String,
    chat_id: String,
}

#[derive(Serialize)]
struct TelegramMessage<'a> {
    chat_id: &'a str,
    text: String,
}

impl TelegramNotifier {
    pub fn new(http: Arc<dyn HttpClient>, bot_token: String, chat_id: String) -> Self {
        Self {
            http,
            bot_token,
            chat_id,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, title: &str, body: &str) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let message = TelegramMessage {
            chat_id: &self.chat_id,
            text: format!("{}\n{}", title, body),
        };
        let request = HttpRequest::post(url)
            .json(&message)
            .map_err(|e| RuntimeError::Notify(e.to_string()))?;

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| RuntimeError::Notify(e.to_string()))?;

        if response.is_success() {
            info!("Telegram notification sent");
            Ok(())
        } else {
            Err(RuntimeError::Notify(format!(
                "Telegram returned status {}",
                response.status
            )))
        }
    }
}

/// DingTalk robot webhook channel (plain access-token variant).
pub struct DingTalkNotifier {
    http: Arc<dyn HttpClient>,
    access_token: String,
}

#[derive(Serialize)]
struct DingTalkMessage {
    msgtype: &'static str,
    text: DingTalkText,
}

#[derive(Serialize)]
struct DingTalkText {
    content: String,
}

impl DingTalkNotifier {
    pub fn new(http: Arc<dyn HttpClient>, access_token: String) -> Self {
        Self { http, access_token }
    }
}

#[async_trait]
impl Notifier for DingTalkNotifier {
    async fn send(&self, title: &str, body: &str) -> Result<()> {
        let url = format!(
            "https://oapi.dingtalk.com/robot/send?access_token={}",
            urlencoding::encode(&self.access_token)
        );
        let message = DingTalkMessage {
            msgtype: "text",
            text: DingTalkText {
                content: format!("{}\n{}", title, body),
            },
        };
        let request = HttpRequest::post(url)
            .json(&message)
            .map_err(|e| RuntimeError::Notify(e.to_string()))?;

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| RuntimeError::Notify(e.to_string()))?;

        if response.is_success() {
            info!("DingTalk notification sent");
            Ok(())
        } else {
            Err(RuntimeError::Notify(format!(
                "DingTalk returned status {}",
                response.status
            )))
        }
    }
}

/// Build the channels configured on an account. May be empty.
pub fn channels_for(account: &AccountConfig, http: Arc<dyn HttpClient>) -> Vec<Box<dyn Notifier>> {
    let mut channels: Vec<Box<dyn Notifier>> = Vec::new();

    if let (Some(token), Some(chat)) = (&account.tg_bot_token, &account.tg_user_id) {
        channels.push(Box::new(TelegramNotifier::new(
            http.clone(),
            token.clone(),
            chat.clone(),
        )));
    }
    if let Some(token) = &account.dd_bot_token {
        channels.push(Box::new(DingTalkNotifier::new(http.clone(), token.clone())));
    }

    channels
}
