mod common;
use common::*;

use core_actions::{CommandError, Completion, DispatchState, HandlerOutcome, Violation};
use core_state::{EditorContext, JumpLocation};
use core_text::Position;
use pretty_assertions::assert_eq;

#[test]
fn count_prefix_selects_index_and_records_jump() {
    let mut h = Harness::new(5).at_line(2);
    let before = JumpLocation::of(&h.editor);

    let res = h.dispatch("3argument");

    assert_eq!(
        res,
        Ok(Completion::Executed {
            command: "argument".into(),
            outcome: HandlerOutcome::Changed,
            jump_recorded: true,
        })
    );
    assert_eq!(h.current_file().as_deref(), Some("file3.txt"));
    assert_eq!(h.jumps.len(), 1);
    assert_eq!(h.jumps.current(), Some(&before));
}

#[test]
fn argument_without_count_is_successful_noop() {
    let mut h = Harness::new(5);

    let res = h.dispatch("argument");

    assert_eq!(
        res,
        Ok(Completion::Executed {
            command: "argument".into(),
            outcome: HandlerOutcome::Unchanged,
            jump_recorded: false,
        })
    );
    assert_eq!(h.current_file().as_deref(), Some("file1.txt"));
    assert!(h.jumps.is_empty());
    assert!(h.status.is_none());
}

#[test]
fn explicit_zero_count_is_also_noop() {
    let mut h = Harness::new(5);
    assert!(h.dispatch("0argument").is_ok());
    assert!(h.dispatch("argument 0").is_ok());
    assert!(h.jumps.is_empty());
    assert!(h.args.take_pending_open().is_none());
}

#[test]
fn numeric_argument_is_count() {
    let mut h = Harness::new(5);
    assert!(h.dispatch("argu 4").is_ok());
    assert_eq!(h.current_file().as_deref(), Some("file4.txt"));
}

#[test]
fn abbreviation_and_full_name_resolve_alike() {
    for typed in ["argu", "argum", "argumen", "argument"] {
        let mut h = Harness::new(5);
        assert!(h.dispatch(&format!("2{typed}")).is_ok(), "{typed}");
        assert_eq!(h.current_file().as_deref(), Some("file2.txt"));
    }
}

#[test]
fn unknown_command_changes_nothing() {
    let mut h = Harness::new(5).at_line(3);
    let registered = h.registry.len();

    let res = h.dispatch("xyz");

    assert_eq!(res, Err(CommandError::UnknownCommand("xyz".into())));
    assert_eq!(h.status.as_deref(), Some("E492: Not an editor command: xyz"));
    assert!(h.jumps.is_empty());
    assert_eq!(h.registry.len(), registered);
    assert_eq!(h.editor.cursor(), Position::new(3, 0));
    assert_eq!(h.current_file().as_deref(), Some("file1.txt"));
}

#[test]
fn too_short_abbreviation_is_unknown() {
    let mut h = Harness::new(5);
    assert_eq!(
        h.dispatch("arg"),
        Err(CommandError::UnknownCommand("arg".into()))
    );
}

#[test]
fn repeated_failures_are_idempotent() {
    let mut h = Harness::new(2);
    h.dispatch("2argument").unwrap();
    let jumps = h.jump_lines();
    let registered = h.registry.len();

    for _ in 0..3 {
        assert!(h.dispatch("xyz").is_err());
        assert!(h.dispatch("9argument").is_err());
        assert!(h.dispatch("first 1").is_err());
        assert_eq!(h.jump_lines(), jumps);
        assert_eq!(h.registry.len(), registered);
        assert_eq!(h.dispatcher.state(), DispatchState::Idle);
    }
    assert_eq!(h.current_file().as_deref(), Some("file2.txt"));
}

#[test]
fn flag_violations_stop_before_handler() {
    let mut h = Harness::new(3);
    assert_eq!(
        h.dispatch("2first"),
        Err(CommandError::FlagViolation {
            command: "first".into(),
            reason: Violation::RangeNotAllowed,
        })
    );
    assert_eq!(h.status.as_deref(), Some("E481: No range allowed: first"));
    assert_eq!(
        h.dispatch("last now"),
        Err(CommandError::FlagViolation {
            command: "last".into(),
            reason: Violation::TrailingCharacters,
        })
    );
    assert_eq!(
        h.dispatch("argument!"),
        Err(CommandError::FlagViolation {
            command: "argument".into(),
            reason: Violation::BangNotAllowed,
        })
    );
    assert!(h.args.take_pending_open().is_none());
}

#[test]
fn mark_and_pattern_addresses_become_counts() {
    let mut h = Harness::new(5);
    assert!(h.editor.set_mark('a', Position::new(3, 0)));
    h.dispatch("'aargument").unwrap();
    assert_eq!(h.current_file().as_deref(), Some("file4.txt"));

    h.dispatch("/beta/argument").unwrap();
    assert_eq!(h.current_file().as_deref(), Some("file3.txt"));

    assert_eq!(
        h.dispatch("'bargument"),
        Err(CommandError::MarkNotSet('b'))
    );
    assert_eq!(
        h.dispatch("/delta/argument"),
        Err(CommandError::PatternNotFound("delta".into()))
    );
}

#[test]
fn malformed_range_reported() {
    let mut h = Harness::new(1);
    let res = h.dispatch("'");
    assert!(matches!(res, Err(CommandError::MalformedRange(_))));
    assert!(h.status.as_deref().is_some_and(|s| s.starts_with("E16")));
}

#[test]
fn bare_line_number_jumps() {
    let mut h = Harness::new(0);
    assert_eq!(h.dispatch("4"), Ok(Completion::LineJump { line: 4 }));
    assert_eq!(h.editor.cursor(), Position::new(3, 0));
    assert_eq!(h.dispatch(":/gamma/"), Ok(Completion::LineJump { line: 5 }));
    assert_eq!(h.jump_lines(), vec![0, 3]);
}

#[test]
fn every_successful_selection_adds_a_jump() {
    let mut h = Harness::new(5).at_line(2);

    h.dispatch("3argument").unwrap();
    assert_eq!(h.jumps.len(), 1);
    h.dispatch("3argument").unwrap();
    assert_eq!(h.jumps.len(), 2);
    assert_eq!(h.jump_lines(), vec![2, 2]);
    assert_eq!(h.current_file().as_deref(), Some("file3.txt"));
}
