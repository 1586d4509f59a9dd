use tether_core::commands::{CommandTable, Trigger};
use tether_core::context::{ContextHandle, Geometry};
use tether_core::parser::{Action, Parser, ParserState};
use tether_core::prompt::PromptTracker;
use tether_core::wrap::{CaretDelta, Wrap};
use tether_core::{EditBuffer, SequenceError};

fn feed(p: &mut Parser, bytes: &[u8]) -> Vec<Result<Action, SequenceError>> {
    bytes.iter().map(|&b| p.advance(b)).collect()
}

fn buffer_from(s: &str) -> EditBuffer {
    let mut buf = EditBuffer::new();
    for c in s.chars() {
        buf.insert(c);
    }
    buf
}

// ============================================================================
// Parser: Ground
// ============================================================================

#[test]
fn test_printable_range_prints() {
    let mut p = Parser::new();
    assert_eq!(p.advance(b' '), Ok(Action::Print(' ')));
    assert_eq!(p.advance(b'~'), Ok(Action::Print('~')));
    assert_eq!(p.state(), ParserState::Ground);
}

#[test]
fn test_capital_f_is_just_a_letter() {
    let mut p = Parser::new();
    assert_eq!(p.advance(b'F'), Ok(Action::Print('F')));
}

#[test]
fn test_ground_editing_keys() {
    let mut p = Parser::new();
    assert_eq!(p.advance(0x0C), Ok(Action::FormFeed));
    assert_eq!(p.advance(0x0D), Ok(Action::CarriageReturn));
    assert_eq!(p.advance(0x7F), Ok(Action::Backspace));
}

#[test]
fn test_ground_unhandled_c0_is_unsupported() {
    for byte in [0x00, 0x01, 0x09, 0x17, 0x19, 0x1C, 0x1F] {
        let mut p = Parser::new();
        assert_eq!(
            p.advance(byte),
            Err(SequenceError::UnsupportedSequence {
                state: ParserState::Ground,
                byte
            })
        );
    }
}

#[test]
fn test_stray_continuation_byte_in_ground() {
    let mut p = Parser::new();
    assert!(matches!(
        p.advance(0xA9),
        Err(SequenceError::UnsupportedSequence { byte: 0xA9, .. })
    ));
}

// ============================================================================
// Parser: Anywhere transitions
// ============================================================================

#[test]
fn test_anywhere_execute_bytes_are_unsupported() {
    for byte in [0x18, 0x1A, 0x80, 0x8F, 0x91, 0x97, 0x99, 0x9A] {
        let mut p = Parser::new();
        assert!(
            matches!(
                p.advance(byte),
                Err(SequenceError::UnsupportedSequence { .. })
            ),
            "byte 0x{:02X}",
            byte
        );
    }
}

#[test]
fn test_anywhere_string_introducers_are_unsupported() {
    for byte in [0x90, 0x9D, 0x98, 0x9E, 0x9F] {
        let mut p = Parser::new();
        assert!(p.advance(byte).is_err(), "byte 0x{:02X}", byte);
    }
}

#[test]
fn test_anywhere_applies_in_every_state() {
    let mut p = Parser::new();
    feed(&mut p, &[0x1b, b'[', b'1']);
    assert_eq!(p.state(), ParserState::CsiParam);
    assert!(matches!(
        p.advance(0x18),
        Err(SequenceError::UnsupportedSequence {
            state: ParserState::CsiParam,
            byte: 0x18
        })
    ));
}

#[test]
fn test_eight_bit_csi_enters_csi_entry() {
    let mut p = Parser::new();
    assert_eq!(p.advance(0x9B), Ok(Action::None));
    assert_eq!(p.state(), ParserState::CsiEntry);
    assert_eq!(p.advance(b'D'), Ok(Action::CursorBack));
    assert_eq!(p.state(), ParserState::Ground);
}

#[test]
fn test_string_terminator_returns_to_ground() {
    let mut p = Parser::new();
    p.advance(0x1b).unwrap();
    assert_eq!(p.advance(0x9C), Ok(Action::None));
    assert_eq!(p.state(), ParserState::Ground);
}

// ============================================================================
// Parser: Escape / CSI
// ============================================================================

#[test]
fn test_cursor_forward_trace() {
    let mut p = Parser::new();
    let mut states = vec![p.state()];
    let mut actions = Vec::new();
    for b in [0x1b, b'[', b'C'] {
        actions.push(p.advance(b).unwrap());
        states.push(p.state());
    }
    assert_eq!(
        states,
        vec![
            ParserState::Ground,
            ParserState::Escape,
            ParserState::CsiEntry,
            ParserState::Ground
        ]
    );
    let forwards = actions
        .iter()
        .filter(|a| **a == Action::CursorForward)
        .count();
    assert_eq!(forwards, 1);
}

#[test]
fn test_end_key() {
    let mut p = Parser::new();
    let out = feed(&mut p, b"\x1b[F");
    assert_eq!(out.last(), Some(&Ok(Action::End)));
}

#[test]
fn test_unbound_csi_final_is_unsupported() {
    let mut p = Parser::new();
    let out = feed(&mut p, b"\x1b[A");
    assert_eq!(
        out.last(),
        Some(&Err(SequenceError::UnsupportedSequence {
            state: ParserState::CsiEntry,
            byte: b'A'
        }))
    );
    assert_eq!(p.state(), ParserState::Ground);
}

#[test]
fn test_malformed_parameter() {
    let mut p = Parser::new();
    let out = feed(&mut p, b"\x1b[38");
    assert!(out.iter().all(|r| r.is_ok()));
    assert_eq!(p.state(), ParserState::CsiParam);
    assert_eq!(p.params(), "38");

    assert_eq!(
        p.advance(b'x'),
        Err(SequenceError::MalformedParameter {
            byte: b'x',
            params: "38".to_string()
        })
    );
}

#[test]
fn test_parameter_nine_and_separator_accepted() {
    let mut p = Parser::new();
    feed(&mut p, b"\x1b[9;19");
    assert_eq!(p.state(), ParserState::CsiParam);
    assert_eq!(p.params(), "9;19");
}

#[test]
fn test_delete_ignored_in_escape_and_csi_entry() {
    let mut p = Parser::new();
    p.advance(0x1b).unwrap();
    assert_eq!(p.advance(0x7F), Ok(Action::None));
    assert_eq!(p.state(), ParserState::Escape);
    p.advance(b'[').unwrap();
    assert_eq!(p.advance(0x7F), Ok(Action::None));
    assert_eq!(p.state(), ParserState::CsiEntry);
}

#[test]
fn test_escape_final_dispatches_and_returns_to_ground() {
    let mut p = Parser::new();
    let out = feed(&mut p, b"\x1bO");
    assert_eq!(out.last(), Some(&Ok(Action::EscDispatch(b'O'))));
    assert_eq!(p.state(), ParserState::Ground);
}

#[test]
fn test_escape_rejects_c0_and_gaps() {
    for byte in [0x05, 0x50, 0x58, 0x5D] {
        let mut p = Parser::new();
        p.advance(0x1b).unwrap();
        assert!(p.advance(byte).is_err(), "byte 0x{:02X}", byte);
    }
}

#[test]
fn test_csi_entry_rejects_c0() {
    let mut p = Parser::new();
    feed(&mut p, b"\x1b[");
    assert!(matches!(
        p.advance(0x02),
        Err(SequenceError::UnsupportedSequence {
            state: ParserState::CsiEntry,
            ..
        })
    ));
}

// ============================================================================
// Parser: UTF-8
// ============================================================================

#[test]
fn test_two_byte_character_decodes() {
    let mut p = Parser::new();
    assert_eq!(p.advance(0xC3), Ok(Action::None));
    assert_eq!(p.state(), ParserState::UnicodeContinuation);
    assert_eq!(p.advance(0xA9), Ok(Action::Print('é')));
    assert_eq!(p.state(), ParserState::Ground);
    assert!(p.pending_utf8().is_empty());
}

#[test]
fn test_continuation_in_c1_range_is_not_a_control() {
    // "À" is C3 80 and "Ü" is C3 9C; 0x80 and 0x9C are C1 codes elsewhere.
    let mut p = Parser::new();
    let out = feed(&mut p, "ÀÜ".as_bytes());
    assert_eq!(out[1], Ok(Action::Print('À')));
    assert_eq!(out[3], Ok(Action::Print('Ü')));
}

#[test]
fn test_three_and_four_byte_characters_unimplemented() {
    for text in ["€", "😀", "\u{10FFFF}"] {
        let bytes = text.as_bytes();
        let lead = bytes[0];
        let mut p = Parser::new();
        let out = feed(&mut p, bytes);

        // every continuation byte is swallowed, the error comes once at the end
        for step in &out[..bytes.len() - 1] {
            assert_eq!(*step, Ok(Action::None));
        }
        assert_eq!(
            out[bytes.len() - 1],
            Err(SequenceError::UnimplementedEncoding { lead })
        );
        assert_eq!(p.state(), ParserState::Ground);
        assert!(p.pending_utf8().is_empty());
    }
}

#[test]
fn test_long_character_continuations_in_c1_range() {
    // "€" is E2 82 AC; 0x82 would otherwise be a C1 control.
    let mut p = Parser::new();
    assert_eq!(p.advance(0xE2), Ok(Action::None));
    assert_eq!(p.advance(0x82), Ok(Action::None));
    assert_eq!(p.pending_utf8(), &[0xE2, 0x82]);
}

#[test]
fn test_truncated_character_keeps_following_byte() {
    let mut p = Parser::new();
    p.advance(0xC3).unwrap();
    assert_eq!(p.advance(b'a'), Ok(Action::Print('a')));
    assert_eq!(p.state(), ParserState::Ground);
    assert!(p.pending_utf8().is_empty());
}

#[test]
fn test_truncated_character_before_control() {
    let mut p = Parser::new();
    p.advance(0xE2).unwrap();
    p.advance(0x82).unwrap();
    assert_eq!(p.advance(b'\r'), Ok(Action::CarriageReturn));
}

#[test]
fn test_new_lead_replaces_truncated_character() {
    let mut p = Parser::new();
    p.advance(0xC3).unwrap();
    assert_eq!(p.advance(0xC3), Ok(Action::None));
    assert_eq!(p.advance(0xA9), Ok(Action::Print('é')));
}

#[test]
fn test_reset_clears_everything() {
    let mut p = Parser::new();
    feed(&mut p, b"\x1b[12");
    p.reset();
    assert_eq!(p.state(), ParserState::Ground);
    assert!(p.params().is_empty());
}

// ============================================================================
// EditBuffer
// ============================================================================

#[test]
fn test_plain_typing_appends() {
    let buf = buffer_from("hello");
    assert_eq!(buf.to_string(), "hello");
    assert_eq!(buf.cursor_offset(), 0);
}

#[test]
fn test_insert_in_middle_keeps_right_segment() {
    let mut buf = buffer_from("abcd");
    buf.move_cursor_back();
    buf.move_cursor_back();
    assert_eq!(buf.right_string(), "cd");

    buf.insert('X');
    assert_eq!(buf.to_string(), "abXcd");
    assert_eq!(buf.cursor_offset(), 2);
}

#[test]
fn test_carriage_return_always_appends() {
    let mut buf = buffer_from("ab");
    buf.move_cursor_back();
    buf.insert('\r');
    assert_eq!(buf.to_string(), "ab\r");
}

#[test]
fn test_delete_before_cursor() {
    let mut buf = buffer_from("abcdef");
    buf.move_cursor_back();
    buf.move_cursor_back();
    assert_eq!(buf.delete_before_cursor(2), 2);
    assert_eq!(buf.to_string(), "abef");
    assert_eq!(buf.cursor_offset(), 2);
}

#[test]
fn test_delete_zero_is_noop() {
    let mut buf = buffer_from("abc");
    assert_eq!(buf.delete_before_cursor(0), 0);
    assert_eq!(buf.to_string(), "abc");
}

#[test]
fn test_delete_with_empty_left_segment_is_noop() {
    let mut buf = buffer_from("abc");
    while buf.move_cursor_back() {}
    assert_eq!(buf.cursor_offset(), 3);
    assert_eq!(buf.delete_before_cursor(1), 0);
    assert_eq!(buf.to_string(), "abc");
}

#[test]
fn test_delete_clamps_to_left_segment() {
    let mut buf = buffer_from("abcd");
    buf.move_cursor_back();
    assert_eq!(buf.delete_before_cursor(10), 3);
    assert_eq!(buf.to_string(), "d");
    assert_eq!(buf.cursor_offset(), 1);
}

#[test]
fn test_cursor_moves_stay_in_bounds() {
    let mut buf = buffer_from("ab");
    assert!(!buf.move_cursor_forward());
    assert_eq!(buf.cursor_offset(), 0);

    assert!(buf.move_cursor_back());
    assert!(buf.move_cursor_back());
    assert!(!buf.move_cursor_back());
    assert_eq!(buf.cursor_offset(), 2);

    buf.move_to_end();
    assert_eq!(buf.cursor_offset(), 0);
}

#[test]
fn test_take_resets() {
    let mut buf = buffer_from("ls");
    buf.move_cursor_back();
    assert_eq!(buf.take(), "ls");
    assert!(buf.is_empty());
    assert_eq!(buf.cursor_offset(), 0);
}

#[test]
fn test_multibyte_chars_count_once() {
    let buf = buffer_from("café");
    assert_eq!(buf.len(), 4);
}

// ============================================================================
// Wrap arithmetic
// ============================================================================

#[test]
fn test_last_column_is_end_of_row() {
    let w = Wrap::new(0, 79, 0, 80);
    assert!(w.at_end_of_row());
    assert!(!w.at_start_of_row());
}

#[test]
fn test_full_row_puts_caret_at_start_of_next() {
    let w = Wrap::new(0, 80, 0, 80);
    assert!(w.at_start_of_row());
    assert!(!w.at_end_of_row());
    assert_eq!(w.caret_row(), 1);
}

#[test]
fn test_same_row_delta_is_horizontal() {
    // "$ hello", caret two left of the end
    let w = Wrap::new(2, 5, 2, 10);
    assert_eq!(w.offset_to_caret(2), CaretDelta { rows: 0, cols: -2 });
}

#[test]
fn test_cross_row_delta() {
    // 23 chars in width 10: end at row 2 col 3; offset 7 -> row 1 col 6
    let w = Wrap::new(3, 20, 7, 10);
    assert_eq!(w.offset_to_caret(7), CaretDelta { rows: 1, cols: 3 });

    // offset 15 -> position 8: row 0 col 8
    assert_eq!(w.offset_to_caret(15), CaretDelta { rows: 2, cols: 5 });
}

#[test]
fn test_negated_delta_goes_back() {
    let d = CaretDelta { rows: 2, cols: -4 };
    assert_eq!(-d, CaretDelta { rows: -2, cols: 4 });
    assert!(CaretDelta::default().is_zero());
}

// ============================================================================
// CommandTable
// ============================================================================

#[test]
fn test_submit_pattern_matches_with_cr() {
    let table = CommandTable::new()
        .with(r"^wopwop\r$", "alias_test", Trigger::OnSubmit)
        .unwrap();
    assert_eq!(table.check("wopwop\r", Trigger::OnSubmit), Some("alias_test"));
    assert_eq!(table.check("wopwop", Trigger::OnSubmit), None);
    assert_eq!(table.check("wopwop\r", Trigger::OnKeystroke), None);
}

#[test]
fn test_first_registered_wins() {
    let table = CommandTable::new()
        .with("^git", "first", Trigger::OnSubmit)
        .unwrap()
        .with("^git push", "second", Trigger::OnSubmit)
        .unwrap();
    assert_eq!(table.check("git push\r", Trigger::OnSubmit), Some("first"));
    assert_eq!(table.len(), 2);
}

#[test]
fn test_invalid_pattern_is_rejected() {
    let mut table = CommandTable::new();
    let err = table.register("(unclosed", "broken", Trigger::OnSubmit);
    assert!(err.is_err());
    assert!(table.is_empty());
}

// ============================================================================
// PromptTracker
// ============================================================================

#[test]
fn test_prompt_is_text_after_last_newline() {
    let mut t = PromptTracker::new();
    t.feed(b"total 0\r\nuser@host:~$ ");
    assert_eq!(t.line(), "user@host:~$ ");
}

#[test]
fn test_prompt_skips_osc_and_csi() {
    let mut t = PromptTracker::new();
    t.feed(b"\x1b]0;user@host\x07\x1b[01;32muser\x1b[00m$ ");
    assert_eq!(t.line(), "user$ ");
}

#[test]
fn test_prompt_sequence_split_across_reads() {
    let mut t = PromptTracker::new();
    t.feed(b"a\x1b[");
    t.feed(b"32mb\x1b]7;file:///tmp\x1b");
    t.feed(b"\\c");
    assert_eq!(t.line(), "abc");
}

#[test]
fn test_prompt_backspace_removes_whole_char() {
    let mut t = PromptTracker::new();
    t.feed("xé\x08y".as_bytes());
    assert_eq!(t.line(), "xy");
}

// ============================================================================
// ContextHandle
// ============================================================================

#[test]
fn test_geometry_never_zero() {
    let g = Geometry::new(0, 0);
    assert_eq!(g.columns, 1);
    assert_eq!(g.rows, 1);
    assert_eq!(g.width(), 1);
}

#[test]
fn test_context_handle_is_shared() {
    let ctx = ContextHandle::new(Geometry::new(80, 24));
    let other = ctx.clone();
    other.set_last_line("$ ");
    assert_eq!(ctx.last_line(), "$ ");
    assert_eq!(ctx.prefix_len(), 2);

    assert!(other.set_geometry(Geometry::new(100, 30)));
    assert!(!other.set_geometry(Geometry::new(100, 30)));
    assert_eq!(ctx.geometry().columns, 100);
}

// ============================================================================
// Serde
// ============================================================================

#[test]
fn test_error_policy_lowercase_names() {
    use tether_core::ErrorPolicy;
    assert_eq!(serde_json::to_string(&ErrorPolicy::Strict).unwrap(), "\"strict\"");
    let p: ErrorPolicy = serde_json::from_str("\"resilient\"").unwrap();
    assert_eq!(p, ErrorPolicy::Resilient);
}

#[test]
fn test_geometry_from_json() {
    let g: Geometry = serde_json::from_str(r#"{ "columns": 120, "rows": 40 }"#).unwrap();
    assert_eq!(g, Geometry::new(120, 40));
}
