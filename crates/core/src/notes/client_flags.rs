//! Client flag trio stored in the client note.
//!
//! Three boolean tags, conventionally kept contiguous on one line at the
//! head of the note. Updates always strip and rewrite all three together so
//! repeated partial toggles can never make them drift apart or duplicate.

use dunner_domain::utils::tags::{bool_value, parse_bool_tag, remove_tag};
use dunner_domain::{ClientFlags, ClientFlagsPatch};

pub const WINDYKACJA_TAG: &str = "WINDYKACJA";
pub const LIST_POLECONY_TAG: &str = "LIST_POLECONY";
pub const LIST_POLECONY_IGNORED_TAG: &str = "LIST_POLECONY_IGNORED";

/// Parse the three client flags; absent tags read as false.
pub fn parse_client_flags(note: &str) -> ClientFlags {
    ClientFlags {
        windykacja: parse_bool_tag(note, WINDYKACJA_TAG),
        list_polecony: parse_bool_tag(note, LIST_POLECONY_TAG),
        list_polecony_ignored: parse_bool_tag(note, LIST_POLECONY_IGNORED_TAG),
    }
}

/// Merge a partial flag update over the current note state and rewrite the
/// note. The freshly computed tags are prefixed as one space-joined block
/// ahead of whatever free text remains.
pub fn update_client_flags(note: &str, patch: ClientFlagsPatch) -> String {
    let current = parse_client_flags(note);
    let merged = ClientFlags {
        windykacja: patch.windykacja.unwrap_or(current.windykacja),
        list_polecony: patch.list_polecony.unwrap_or(current.list_polecony),
        list_polecony_ignored: patch
            .list_polecony_ignored
            .unwrap_or(current.list_polecony_ignored),
    };

    let mut rest = remove_tag(note, WINDYKACJA_TAG);
    rest = remove_tag(&rest, LIST_POLECONY_IGNORED_TAG);
    rest = remove_tag(&rest, LIST_POLECONY_TAG);

    let block = render_flags(merged);
    if rest.is_empty() {
        block
    } else {
        format!("{block} {rest}")
    }
}

fn render_flags(flags: ClientFlags) -> String {
    format!(
        "[{w}]{wv}[/{w}] [{lp}]{lpv}[/{lp}] [{lpi}]{lpiv}[/{lpi}]",
        w = WINDYKACJA_TAG,
        wv = bool_value(flags.windykacja),
        lp = LIST_POLECONY_TAG,
        lpv = bool_value(flags.list_polecony),
        lpi = LIST_POLECONY_IGNORED_TAG,
        lpiv = bool_value(flags.list_polecony_ignored),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch_windykacja(enabled: bool) -> ClientFlagsPatch {
        ClientFlagsPatch { windykacja: Some(enabled), ..ClientFlagsPatch::default() }
    }

    #[test]
    fn empty_note_parses_to_all_false() {
        assert_eq!(parse_client_flags(""), ClientFlags::default());
    }

    #[test]
    fn update_on_empty_note_writes_all_three_tags() {
        let note = update_client_flags("", patch_windykacja(true));
        assert_eq!(
            note,
            "[WINDYKACJA]true[/WINDYKACJA] [LIST_POLECONY]false[/LIST_POLECONY] \
             [LIST_POLECONY_IGNORED]false[/LIST_POLECONY_IGNORED]"
        );
    }

    #[test]
    fn update_preserves_unrelated_text_after_the_block() {
        let note = update_client_flags("prefers invoices by post", patch_windykacja(true));
        assert!(note.ends_with("prefers invoices by post"));
        assert!(note.starts_with("[WINDYKACJA]true[/WINDYKACJA]"));
    }

    #[test]
    fn unsupplied_flags_keep_their_current_value() {
        let note = update_client_flags("", patch_windykacja(true));
        let note = update_client_flags(
            &note,
            ClientFlagsPatch { list_polecony: Some(true), ..ClientFlagsPatch::default() },
        );

        let flags = parse_client_flags(&note);
        assert!(flags.windykacja);
        assert!(flags.list_polecony);
        assert!(!flags.list_polecony_ignored);
    }

    #[test]
    fn repeated_toggles_do_not_duplicate_tags() {
        let mut note = "some context".to_string();
        for enabled in [true, false, true, false, true] {
            note = update_client_flags(&note, patch_windykacja(enabled));
        }

        assert_eq!(note.matches("[WINDYKACJA]").count(), 1);
        assert_eq!(note.matches("[LIST_POLECONY]").count(), 1);
        assert_eq!(note.matches("[LIST_POLECONY_IGNORED]").count(), 1);
        assert!(note.ends_with("some context"));
        assert!(parse_client_flags(&note).windykacja);
    }

    #[test]
    fn ignored_flag_does_not_shadow_the_list_polecony_flag() {
        let note = update_client_flags(
            "",
            ClientFlagsPatch {
                list_polecony_ignored: Some(true),
                ..ClientFlagsPatch::default()
            },
        );

        let flags = parse_client_flags(&note);
        assert!(!flags.list_polecony);
        assert!(flags.list_polecony_ignored);
    }

    #[test]
    fn flags_scattered_by_hand_edits_are_regrouped() {
        let note = "[WINDYKACJA]true[/WINDYKACJA] called twice \
                    [LIST_POLECONY]true[/LIST_POLECONY] no answer";
        let updated = update_client_flags(note, ClientFlagsPatch::default());
        assert!(updated.starts_with(
            "[WINDYKACJA]true[/WINDYKACJA] [LIST_POLECONY]true[/LIST_POLECONY]"
        ));
        assert!(updated.ends_with("called twice no answer"));
    }
}
