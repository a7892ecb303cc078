//! Template rendering.

use crate::context::VariableContext;
use crate::directive::{Effects, PASSES};
use crate::message::MessageSegment;

/// Separates independently rendered segments of a template.
pub const SEGMENT_SEPARATOR: &str = "---";

/// Renders a reply template into the messages to send, in order.
///
/// Rendering is pure and never fails: directives that do not match their
/// pattern exactly, and `$tokens` with no value in `context`, are left in the
/// output as literal text.
#[must_use]
pub fn render(template: &str, context: &VariableContext) -> Vec<MessageSegment> {
    template
        .split(SEGMENT_SEPARATOR)
        .flat_map(|raw| render_segment(raw, context))
        .collect()
}

fn render_segment(raw: &str, context: &VariableContext) -> Vec<MessageSegment> {
    let mut effects = Effects::default();
    let text = PASSES
        .iter()
        .fold(raw.to_string(), |text, pass| pass.apply(&text, context, &mut effects));

    let Effects {
        quick_replies,
        images,
        extra_segments,
    } = effects;

    let mut segments = Vec::with_capacity(1 + images.len() + extra_segments.len());
    if !text.is_empty() {
        segments.push(MessageSegment::text(text));
    }
    segments.extend(images.into_iter().map(MessageSegment::image));
    segments.extend(extra_segments);

    if !quick_replies.is_empty() {
        if segments.is_empty() {
            segments.push(MessageSegment::text(""));
        }
        if let Some(last) = segments.last_mut() {
            last.quick_replies = quick_replies;
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact;
    use crate::context::Variable;
    use crate::message::{Attachment, QuickReply};

    fn alex() -> VariableContext {
        VariableContext::new().with(Variable::PersonName, "Alex")
    }

    #[test]
    fn plain_text_renders_trimmed() {
        let segments = render("  Good morning!\n", &VariableContext::new());
        assert_eq!(segments, vec![MessageSegment::text("Good morning!")]);
    }

    #[test]
    fn empty_template_renders_nothing() {
        assert!(render("", &VariableContext::new()).is_empty());
        assert!(render("  ---  ", &VariableContext::new()).is_empty());
    }

    #[test]
    fn greeting_with_quick_replies() {
        let segments = render("Hi $personName! :: Yes :: No", &alex());
        assert_eq!(
            segments,
            vec![
                MessageSegment::text("Hi Alex!")
                    .with_quick_replies(vec![QuickReply::text("Yes"), QuickReply::text("No")])
            ]
        );
    }

    #[test]
    fn location_request() {
        let segments = render("Look $askForLocation", &VariableContext::new());
        assert_eq!(
            segments,
            vec![MessageSegment::text("Look").with_quick_replies(vec![QuickReply::Location])]
        );
    }

    #[test]
    fn segments_split_on_separator() {
        let segments = render("A---B", &VariableContext::new());
        assert_eq!(
            segments,
            vec![MessageSegment::text("A"), MessageSegment::text("B")]
        );
    }

    #[test]
    fn unknown_variables_pass_through_and_rerender_unchanged() {
        let ctx = alex();
        let segments = render("$personName is at $lat,$long", &ctx);
        let text = segments[0].text.clone().expect("text");
        assert_eq!(text, "Alex is at $lat,$long");

        let again = render(&text, &ctx);
        assert_eq!(again[0].text.as_deref(), Some("Alex is at $lat,$long"));
    }

    #[test]
    fn image_follows_text() {
        let segments = render("Here it is [image:carangidae.png]", &VariableContext::new());
        assert_eq!(
            segments,
            vec![
                MessageSegment::text("Here it is"),
                MessageSegment::image("carangidae.png"),
            ]
        );
    }

    #[test]
    fn second_image_marker_in_segment_stays_literal() {
        let segments = render("[image:a.png]\n[image:b.png]", &VariableContext::new());
        assert_eq!(
            segments,
            vec![
                MessageSegment::text("[image:b.png]"),
                MessageSegment::image("a.png"),
            ]
        );
    }

    #[test]
    fn contact_cards_follow_text_and_images() {
        let segments = render(
            "Call them $contactAgency [image:map.png] $contactAgency",
            &VariableContext::new(),
        );
        assert_eq!(
            segments,
            vec![
                MessageSegment::text("Call them"),
                MessageSegment::image("map.png"),
                contact::agency_card_segment(),
                contact::agency_card_segment(),
            ]
        );
    }

    #[test]
    fn contact_card_stays_within_its_segment() {
        let segments = render("first $contactAgency --- second", &VariableContext::new());
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].text.as_deref(), Some("first"));
        assert!(matches!(segments[1].attachment, Some(Attachment::Template(_))));
        assert_eq!(segments[2].text.as_deref(), Some("second"));
    }

    #[test]
    fn quick_replies_attach_to_last_segment_of_their_source() {
        let segments = render(
            "Nice [image:fish.png] :: More --- Bye",
            &VariableContext::new(),
        );
        assert_eq!(
            segments,
            vec![
                MessageSegment::text("Nice"),
                MessageSegment::image("fish.png")
                    .with_quick_replies(vec![QuickReply::text("More")]),
                MessageSegment::text("Bye"),
            ]
        );
    }

    #[test]
    fn quick_replies_alone_get_an_empty_carrier() {
        let segments = render("Hello --- $askForLocation :: Skip", &VariableContext::new());
        assert_eq!(
            segments,
            vec![
                MessageSegment::text("Hello"),
                MessageSegment::text("")
                    .with_quick_replies(vec![QuickReply::Location, QuickReply::text("Skip")]),
            ]
        );
    }

    #[test]
    fn line_break_variable_expands() {
        let ctx = VariableContext::new().with(Variable::Br, "\n");
        let segments = render("one$br two", &ctx);
        assert_eq!(segments[0].text.as_deref(), Some("one\n two"));
    }

    #[test]
    fn directives_are_not_interpolated() {
        let ctx = VariableContext::new().with(Variable::Location, "Nantou");
        let segments = render("$location $askForLocation", &ctx);
        assert_eq!(
            segments,
            vec![MessageSegment::text("Nantou").with_quick_replies(vec![QuickReply::Location])]
        );
    }

    #[test]
    fn variables_end_at_non_ascii_letters() {
        let ctx = VariableContext::new()
            .with(Variable::PersonName, "Alex")
            .with(Variable::LocationName, "Puli");
        let segments = render("$personName你好, welcome to $locationName的海邊", &ctx);
        assert_eq!(
            segments[0].text.as_deref(),
            Some("Alex你好, welcome to Puli的海邊")
        );
    }
}
