use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode, Recipient,
};
use tracing::warn;

use crate::gamerpower::Giveaway;

/// Longest description carried in a message before truncation kicks in.
const MAX_DESCRIPTION_CHARS: usize = 300;

/// Delivers one formatted giveaway to one destination channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, channel: &str, giveaway: &Giveaway) -> Result<()>;
}

pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(token: &str) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    /// Exactly one outbound call: sendPhoto with the body as caption
    /// when the giveaway carries a usable image, sendMessage otherwise.
    async fn deliver(&self, channel: &str, giveaway: &Giveaway) -> Result<()> {
        let recipient = parse_recipient(channel);
        let text = format_message(giveaway);
        let markup = claim_button(giveaway);

        let photo = giveaway.image.as_deref().and_then(|raw| match raw.parse() {
            Ok(url) => Some(InputFile::url(url)),
            Err(e) => {
                warn!("Falling back to a text message, bad image URL {:?}: {}", raw, e);
                None
            }
        });

        match photo {
            Some(photo) => {
                let mut request = self
                    .bot
                    .send_photo(recipient, photo)
                    .caption(text)
                    .parse_mode(ParseMode::Html);
                if let Some(markup) = markup {
                    request = request.reply_markup(markup);
                }
                request.await.context("sendPhoto failed")?;
            }
            None => {
                let mut request = self
                    .bot
                    .send_message(recipient, text)
                    .parse_mode(ParseMode::Html);
                if let Some(markup) = markup {
                    request = request.reply_markup(markup);
                }
                request.await.context("sendMessage failed")?;
            }
        }

        Ok(())
    }
}

/// Numeric destinations address a chat id directly; anything else is
/// treated as a channel username.
fn parse_recipient(channel: &str) -> Recipient {
    match channel.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(channel.to_string()),
    }
}

fn claim_button(giveaway: &Giveaway) -> Option<InlineKeyboardMarkup> {
    let raw = giveaway.open_giveaway.as_deref()?;
    match raw.parse() {
        Ok(url) => Some(InlineKeyboardMarkup::new([[InlineKeyboardButton::url(
            "Claim Now ↗️",
            url,
        )]])),
        Err(e) => {
            warn!("Skipping the claim button, bad URL {:?}: {}", raw, e);
            None
        }
    }
}

/// Build the HTML body for one giveaway: bold title, platform and
/// worth lines, an Ends line when a real end date is known, then the
/// description. Field values are passed through as-is.
pub fn format_message(giveaway: &Giveaway) -> String {
    let title = giveaway.title.as_deref().unwrap_or("Unknown Game");
    let platforms = giveaway.platforms.as_deref().unwrap_or("Unknown Platform");
    let worth = giveaway.worth.as_deref().unwrap_or("N/A");
    let description = giveaway.description.as_deref().unwrap_or("No description.");

    let mut text = format!(
        "<b>{}</b>\n\n🎮 <b>Platform:</b> {}\n💰 <b>Worth:</b> {}\n",
        title, platforms, worth
    );

    if let Some(end_date) = giveaway.end_date.as_deref() {
        if end_date != "N/A" {
            text.push_str(&format!("⏳ <b>Ends:</b> {}\n", end_date));
        }
    }

    text.push('\n');
    text.push_str(&truncate_description(description));
    text
}

/// Descriptions over 300 characters are cut to their first 297 plus an
/// ellipsis. Counts characters rather than bytes so multi-byte text
/// cannot be split mid-codepoint.
fn truncate_description(description: &str) -> String {
    if description.chars().count() <= MAX_DESCRIPTION_CHARS {
        return description.to_string();
    }

    let mut cut: String = description
        .chars()
        .take(MAX_DESCRIPTION_CHARS - 3)
        .collect();
    cut.push_str("...");
    cut
}
