use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode};
use tracing::info;

use crate::announcement::Announcement;
use crate::error::DispatchError;

/// Destination for composed announcements.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait AnnouncementSink: Send + Sync {
    async fn send_announcement(&self, announcement: &Announcement) -> Result<(), DispatchError>;
}

/// Posts announcements as a photo with caption and inline keyboard to one
/// fixed Telegram channel.
pub struct TelegramChannel {
    bot: Bot,
    channel: ChatId,
    banner: Url,
}

impl TelegramChannel {
    pub fn new(bot: Bot, channel_id: i64, banner_url: &str) -> Result<Self> {
        let banner = Url::parse(banner_url)
            .with_context(|| format!("Invalid banner URL: {}", banner_url))?;
        Ok(Self {
            bot,
            channel: ChatId(channel_id),
            banner,
        })
    }
}

#[async_trait]
impl AnnouncementSink for TelegramChannel {
    async fn send_announcement(&self, announcement: &Announcement) -> Result<(), DispatchError> {
        let markup = keyboard(announcement)?;

        let sent = self
            .bot
            .send_photo(self.channel, InputFile::url(self.banner.clone()))
            .caption(announcement.caption.clone())
            .parse_mode(ParseMode::MarkdownV2)
            .reply_markup(markup)
            .await?;

        info!(
            "Announcement posted to channel {} (message {})",
            self.channel.0, sent.id.0
        );
        Ok(())
    }
}

/// Build the inline keyboard, rejecting any button whose URL does not parse.
pub fn keyboard(announcement: &Announcement) -> Result<InlineKeyboardMarkup, DispatchError> {
    let rows = announcement
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| {
                    let url = Url::parse(&button.url).map_err(|e| DispatchError::InvalidUrl {
                        label: button.label.clone(),
                        url: button.url.clone(),
                        reason: e.to_string(),
                    })?;
                    Ok(InlineKeyboardButton::url(button.label.clone(), url))
                })
                .collect::<Result<Vec<_>, DispatchError>>()
        })
        .collect::<Result<Vec<_>, DispatchError>>()?;

    Ok(InlineKeyboardMarkup::new(rows))
}
