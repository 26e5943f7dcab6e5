//! Button surface for picking flag values.
//!
//! Every button's custom ID carries what it does (`<session>:<flag>:<true|false>`,
//! `<session>:apply`, `<session>:cancel`), so one dispatch handles all presses.

use futures::StreamExt;
use poise::serenity_prelude as serenity;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{BotError, Result};
use crate::permissions::{FlagState, OverwriteSettings, PermissionFlag};
use crate::Context;

const MAX_ROWS_PER_MESSAGE: usize = 5;
const FLAGS_PER_ROW: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Toggle(PermissionFlag, bool),
    Apply,
    Cancel,
}

pub fn control_id(session: u64, action: ControlAction) -> String {
    match action {
        ControlAction::Toggle(flag, value) => format!("{}:{}:{}", session, flag.key(), value),
        ControlAction::Apply => format!("{}:apply", session),
        ControlAction::Cancel => format!("{}:cancel", session),
    }
}

/// Inverse of `control_id`; `None` for IDs from another session or garbage
pub fn parse_control_id(session: u64, custom_id: &str) -> Option<ControlAction> {
    let mut parts = custom_id.split(':');
    if parts.next()?.parse::<u64>().ok()? != session {
        return None;
    }

    let action = match (parts.next()?, parts.next()) {
        ("apply", None) => ControlAction::Apply,
        ("cancel", None) => ControlAction::Cancel,
        (key, Some(value)) => {
            let flag = PermissionFlag::from_key(key)?;
            let value = value.parse::<bool>().ok()?;
            ControlAction::Toggle(flag, value)
        }
        _ => return None,
    };

    if parts.next().is_some() {
        return None;
    }
    Some(action)
}

/// Record a toggle; the last press for a flag wins
pub fn apply_toggle(selection: &mut OverwriteSettings, flag: PermissionFlag, value: bool) {
    selection.set(flag, FlagState::from_bool(value));
}

fn toggle_buttons(session: u64, flag: PermissionFlag) -> [serenity::CreateButton; 2] {
    [
        serenity::CreateButton::new(control_id(session, ControlAction::Toggle(flag, true)))
            .label(format!("{}: True", flag.display_name()))
            .style(serenity::ButtonStyle::Success),
        serenity::CreateButton::new(control_id(session, ControlAction::Toggle(flag, false)))
            .label(format!("{}: False", flag.display_name()))
            .style(serenity::ButtonStyle::Danger),
    ]
}

fn control_row(session: u64) -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(control_id(session, ControlAction::Apply))
            .label("Apply")
            .style(serenity::ButtonStyle::Primary),
        serenity::CreateButton::new(control_id(session, ControlAction::Cancel))
            .label("Cancel")
            .style(serenity::ButtonStyle::Secondary),
    ])
}

/// Split the catalog into messages of at most five rows; the last message ends
/// with the Apply/Cancel row.
pub fn build_pages(session: u64) -> Vec<Vec<serenity::CreateActionRow>> {
    let mut rows: Vec<serenity::CreateActionRow> = PermissionFlag::ALL
        .chunks(FLAGS_PER_ROW)
        .map(|flags| {
            serenity::CreateActionRow::Buttons(
                flags
                    .iter()
                    .flat_map(|flag| toggle_buttons(session, *flag))
                    .collect(),
            )
        })
        .collect();
    rows.push(control_row(session));

    let mut pages = Vec::new();
    while !rows.is_empty() {
        let rest = rows.split_off(rows.len().min(MAX_ROWS_PER_MESSAGE));
        pages.push(std::mem::replace(&mut rows, rest));
    }
    pages
}

/// Show the buttons and wait for the invoker to press Apply.
///
/// The window is a hard deadline from the moment the buttons appear. Cancel,
/// the deadline, or Apply with nothing chosen all yield `NoSelection`.
pub async fn collect_selection(ctx: Context<'_>, prompt: &str, window: Duration) -> Result<OverwriteSettings> {
    let session = ctx.id();
    let pages = build_pages(session);
    let page_count = pages.len();

    let mut handles = Vec::with_capacity(page_count);
    for (i, rows) in pages.into_iter().enumerate() {
        let mut reply = poise::CreateReply::default().components(rows);
        if i == 0 {
            reply = reply.content(format!(
                "{}\nPress **Apply** when done. Buttons expire after {} seconds.",
                prompt,
                window.as_secs()
            ));
        }
        handles.push(ctx.send(reply).await?);
    }

    let deadline = Instant::now() + window;
    let filter_prefix = format!("{}:", session);
    // Must stay registered for the whole window, including while responses are in flight
    let mut presses = Box::pin(
        serenity::ComponentInteractionCollector::new(ctx.serenity_context())
            .author_id(ctx.author().id)
            .filter(move |press| press.data.custom_id.starts_with(&filter_prefix))
            .timeout(window)
            .stream(),
    );
    let mut selection = OverwriteSettings::default();

    let outcome = loop {
        let press = match tokio::time::timeout_at(deadline, presses.next()).await {
            Ok(Some(press)) => press,
            Ok(None) | Err(_) => {
                info!("Selection window for {} elapsed", ctx.author().name);
                break None;
            }
        };

        let action = parse_control_id(session, &press.data.custom_id);
        let response = match action {
            Some(ControlAction::Toggle(flag, value)) => {
                apply_toggle(&mut selection, flag, value);
                debug!("{} set {} = {}", ctx.author().name, flag.key(), value);
                serenity::CreateInteractionResponse::Message(
                    serenity::CreateInteractionResponseMessage::new()
                        .content(format!("[INFO] Set {} = {}", flag.display_name(), value))
                        .ephemeral(true),
                )
            }
            _ => serenity::CreateInteractionResponse::Acknowledge,
        };

        if let Err(e) = press.create_response(ctx.http(), response).await {
            warn!("Failed to acknowledge selector press: {}", e);
        }

        match action {
            Some(ControlAction::Apply) => break Some(selection),
            Some(ControlAction::Cancel) => break None,
            _ => {}
        }
    };

    for handle in &handles {
        if let Err(e) = handle.delete(ctx).await {
            warn!("Failed to remove selector message: {}", e);
        }
    }

    finish(outcome)
}

/// `Some` only when Apply was pressed; an empty selection counts as none
pub fn finish(outcome: Option<OverwriteSettings>) -> Result<OverwriteSettings> {
    match outcome {
        Some(selection) if !selection.is_empty() => Ok(selection),
        _ => Err(BotError::NoSelection),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_ids_round_trip() {
        let actions = [
            ControlAction::Toggle(PermissionFlag::SendMessages, true),
            ControlAction::Toggle(PermissionFlag::MoveMembers, false),
            ControlAction::Apply,
            ControlAction::Cancel,
        ];
        for action in actions {
            assert_eq!(parse_control_id(77, &control_id(77, action)), Some(action));
        }
    }

    #[test]
    fn test_foreign_and_malformed_ids() {
        let id = control_id(77, ControlAction::Apply);
        assert_eq!(parse_control_id(78, &id), None);
        assert_eq!(parse_control_id(77, "77:administrator:true"), None);
        assert_eq!(parse_control_id(77, "77:send_messages:maybe"), None);
        assert_eq!(parse_control_id(77, "77:send_messages:true:extra"), None);
        assert_eq!(parse_control_id(77, "config_global"), None);
    }

    #[test]
    fn test_last_press_wins() {
        let mut selection = OverwriteSettings::default();
        apply_toggle(&mut selection, PermissionFlag::Speak, true);
        apply_toggle(&mut selection, PermissionFlag::Speak, false);
        assert_eq!(selection.get(PermissionFlag::Speak), FlagState::Deny);
        assert_eq!(selection.explicit().count(), 1);
    }

    #[test]
    fn test_finish() {
        // Deadline or Cancel
        assert!(matches!(finish(None), Err(BotError::NoSelection)));
        // Apply with nothing chosen
        assert!(matches!(
            finish(Some(OverwriteSettings::default())),
            Err(BotError::NoSelection)
        ));

        let chosen = OverwriteSettings::default().with(PermissionFlag::Connect, FlagState::Allow);
        assert_eq!(finish(Some(chosen)).unwrap(), chosen);
    }

    #[test]
    fn test_pages_fit_discord_limits() {
        let pages = build_pages(1);
        assert_eq!(pages.len(), 2);

        let mut buttons = 0;
        for page in &pages {
            assert!(page.len() <= MAX_ROWS_PER_MESSAGE);
            for row in page {
                let json = serde_json::to_value(row).unwrap();
                let count = json["components"].as_array().unwrap().len();
                assert!(count <= 5);
                buttons += count;
            }
        }
        // Two per flag plus Apply and Cancel.
        assert_eq!(buttons, PermissionFlag::ALL.len() * 2 + 2);
    }
}
