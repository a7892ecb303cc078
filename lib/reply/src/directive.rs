//! Directive extraction passes.
//!
//! A raw segment goes through [`PASSES`] in order. Each pass reads the
//! residual text left by the previous one, returns a new residual and records
//! what it found in [`Effects`]. Later passes only ever see text the earlier
//! ones left behind, so a directive removed by an early pass can never be
//! re-matched (for example `$askForLocation` is gone before `$variable`
//! interpolation runs).

use crate::contact;
use crate::context::VariableContext;
use crate::message::{MessageSegment, QuickReply};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Adds a location quick reply to the segment.
pub const ASK_FOR_LOCATION: &str = "$askForLocation";

/// Appends the agency contact card after the segment.
pub const CONTACT_AGENCY: &str = "$contactAgency";

/// Starts a text quick-reply option.
const QUICK_REPLY_MARKER: &str = ":: ";

static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[image:([^\]\n]+)\]").expect("image pattern is valid"));

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[A-Za-z0-9_]+").expect("variable pattern is valid"));

/// Side effects collected while rendering one segment.
#[derive(Debug, Default)]
pub(crate) struct Effects {
    pub quick_replies: Vec<QuickReply>,
    pub images: Vec<String>,
    pub extra_segments: Vec<MessageSegment>,
}

/// One extraction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pass {
    Trim,
    AskForLocation,
    ContactAgency,
    Image,
    Interpolate,
    QuickReplyOptions,
}

/// The passes applied to every segment, in order.
pub(crate) const PASSES: [Pass; 7] = [
    Pass::Trim,
    Pass::AskForLocation,
    Pass::ContactAgency,
    Pass::Image,
    Pass::Interpolate,
    Pass::QuickReplyOptions,
    Pass::Trim,
];

impl Pass {
    pub(crate) fn apply(
        self,
        input: &str,
        context: &VariableContext,
        effects: &mut Effects,
    ) -> String {
        match self {
            Self::Trim => input.trim().to_string(),
            Self::AskForLocation => extract_token(input, ASK_FOR_LOCATION, || {
                effects.quick_replies.push(QuickReply::Location);
            }),
            Self::ContactAgency => extract_token(input, CONTACT_AGENCY, || {
                effects
                    .extra_segments
                    .push(contact::agency_card_segment());
            }),
            Self::Image => extract_first_image(input, &mut effects.images),
            Self::Interpolate => interpolate(input, context),
            Self::QuickReplyOptions => extract_quick_replies(input, &mut effects.quick_replies),
        }
    }
}

/// Removes every occurrence of `token`, calling `on_match` once per removal.
fn extract_token(input: &str, token: &str, mut on_match: impl FnMut()) -> String {
    let mut residual = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(at) = rest.find(token) {
        residual.push_str(&rest[..at]);
        on_match();
        rest = &rest[at + token.len()..];
    }
    residual.push_str(rest);
    residual
}

/// Removes the first `[image:<name>]` marker only; later markers stay as text.
fn extract_first_image(input: &str, images: &mut Vec<String>) -> String {
    match IMAGE.captures(input) {
        Some(caps) => {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                return input.to_string();
            };
            images.push(name.as_str().to_string());
            let mut residual = String::with_capacity(input.len());
            residual.push_str(&input[..whole.start()]);
            residual.push_str(&input[whole.end()..]);
            residual
        }
        None => input.to_string(),
    }
}

fn interpolate(input: &str, context: &VariableContext) -> String {
    VARIABLE
        .replace_all(input, |caps: &Captures<'_>| {
            let token = &caps[0];
            context.resolve_token(token).unwrap_or(token).to_string()
        })
        .into_owned()
}

/// Extracts `:: <text>` options.
///
/// An option's text runs until the next marker or the end of its line and is
/// trimmed. A marker with nothing after it is left in place.
fn extract_quick_replies(input: &str, quick_replies: &mut Vec<QuickReply>) -> String {
    let mut residual = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(at) = rest.find(QUICK_REPLY_MARKER) {
        residual.push_str(&rest[..at]);
        let after = &rest[at + QUICK_REPLY_MARKER.len()..];
        let end = [after.find(QUICK_REPLY_MARKER), after.find('\n')]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(after.len());
        let option = after[..end].trim();
        if option.is_empty() {
            residual.push_str(QUICK_REPLY_MARKER);
        } else {
            quick_replies.push(QuickReply::text(option));
        }
        rest = &after[end..];
    }
    residual.push_str(rest);
    residual
}
