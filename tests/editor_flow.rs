//! End-to-end flows across the document model, the tokenizer, and the
//! layout pass: what a frontend actually does each frame, minus the
//! drawing.

use notemark::config::Config;
use notemark::core::clipboard::{Clipboard, LocalClipboard};
use notemark::core::document::{Document, Mode};
use notemark::core::geometry::{Point, Rect};
use notemark::core::input::{dispatch, InputEvent, Key, Modifiers, Outcome};
use notemark::core::layout::{visible_row_capacity, LayoutEngine, LayoutParams};
use notemark::core::markup::Token;
use notemark::core::metrics::MonospaceMetrics;

fn layout_params(doc: &Document, viewport: Rect) -> LayoutParams {
    LayoutParams {
        viewport,
        row_start: doc.scroll_row_start(),
        cursor: doc.cursor(),
        selection: doc.selection(),
        pick: None,
    }
}

/// Sum of token logical lengths must always equal the buffer length; this
/// is what keeps layout geometry addressable by document offsets.
fn assert_offset_space(doc: &Document) {
    let logical: usize = doc.tokens().iter().map(Token::logical_len).sum();
    assert_eq!(logical, doc.len());
}

#[test]
fn typing_session_keeps_tokens_and_offsets_in_sync() {
    let mut doc = Document::new();
    let mut clip = LocalClipboard::new();

    for ev in [
        InputEvent::Insert("# title".into()),
        InputEvent::Key {
            key: Key::Enter,
            mods: Modifiers::default(),
        },
        InputEvent::Insert("body with ".into()),
        // typing '*' auto-pairs; the second '*'-pair completes "**bold**"
        InputEvent::Insert("*".into()),
        InputEvent::Insert("*".into()),
        InputEvent::Insert("bold".into()),
    ] {
        dispatch(&mut doc, &mut clip, &ev);
        assert_offset_space(&doc);
    }

    assert_eq!(doc.text(), "# title\nbody with **bold**");
    // cursor sits between the bold pair
    assert_eq!(doc.cursor(), 24);
    let has_bold = doc.tokens().iter().any(|t| {
        t.as_text()
            .is_some_and(|(f, v)| f.contains(notemark::core::markup::Format::BOLD) && v == "**bold**")
    });
    assert!(has_bold, "tokens: {:?}", doc.tokens());
}

#[test]
fn selection_replacement_via_events() {
    let mut doc = Document::from_text("abcdef");
    let mut clip = LocalClipboard::new();
    doc.set_cursor(2);
    let shift = Modifiers {
        shift: true,
        ctrl: false,
    };
    for _ in 0..3 {
        dispatch(
            &mut doc,
            &mut clip,
            &InputEvent::Key {
                key: Key::Right,
                mods: shift,
            },
        );
    }
    assert_eq!(doc.selection(), Some((2, 5)));
    dispatch(&mut doc, &mut clip, &InputEvent::Insert("X".into()));
    assert_eq!(doc.text(), "abXf");
    assert_eq!(doc.cursor(), 3);
    assert_eq!(doc.mode(), Mode::Insert);
    assert_offset_space(&doc);
}

#[test]
fn click_resolves_through_layout_to_cursor() {
    let mut doc = Document::from_text("hello\nworld");
    let mut clip = LocalClipboard::new();
    let metrics = MonospaceMetrics::new(0.5);
    let config = Config {
        font_size: 10.0,
        ..Config::default()
    };
    let engine = LayoutEngine::new(&metrics, &config);
    let viewport = Rect::new(0.0, 0.0, 400.0, 300.0);

    // click between 'o' and 'r' on the second row
    let click = InputEvent::Click(Point::new(11.0, 15.0));
    let outcome = dispatch(&mut doc, &mut clip, &click);
    let Outcome::Pick(point) = outcome else {
        panic!("expected a pick, got {outcome:?}");
    };

    let mut params = layout_params(&doc, viewport);
    params.pick = Some(point);
    let out = engine.layout(doc.tokens(), &params);
    doc.set_cursor(out.picked.expect("pick resolution"));
    assert_eq!(doc.cursor(), 8); // "wo|rld"
}

#[test]
fn click_below_content_goes_to_end_of_buffer() {
    let mut doc = Document::from_text("short");
    let metrics = MonospaceMetrics::new(0.5);
    let config = Config {
        font_size: 10.0,
        ..Config::default()
    };
    let engine = LayoutEngine::new(&metrics, &config);
    let mut params = layout_params(&doc, Rect::new(0.0, 0.0, 400.0, 300.0));
    params.pick = Some(Point::new(50.0, 250.0));
    let out = engine.layout(doc.tokens(), &params);
    doc.set_cursor(out.picked.expect("pick resolution"));
    assert_eq!(doc.cursor(), 5);
}

#[test]
fn scroll_feedback_keeps_cursor_visible() {
    let text: String = (0..40).map(|i| format!("line {i}\n")).collect();
    let mut doc = Document::from_text(text);
    let metrics = MonospaceMetrics::new(0.5);
    let config = Config {
        font_size: 10.0,
        ..Config::default()
    };
    let engine = LayoutEngine::new(&metrics, &config);
    let viewport = Rect::new(0.0, 0.0, 400.0, 100.0);

    // the frame loop: layout, feed the row bound back, then navigate
    let out = engine.layout(doc.tokens(), &layout_params(&doc, viewport));
    doc.set_row_max(out.rows.max(visible_row_capacity(&viewport, config.font_size)));

    doc.line_end(false, true); // jump to the last row
    assert!(doc.scroll_row_start() > 0, "window must have scrolled");

    // keep running frames until the window settles, as a frontend would
    for _ in 0..5 {
        let out = engine.layout(doc.tokens(), &layout_params(&doc, viewport));
        doc.set_row_max(out.rows.max(visible_row_capacity(&viewport, config.font_size)));
        doc.set_cursor(doc.cursor()); // re-clamp against the new bound
    }
    let out = engine.layout(doc.tokens(), &layout_params(&doc, viewport));
    let caret = out.caret.expect("caret visible after scroll");
    assert!(caret.pos.y + caret.height <= viewport.bottom());
}

#[test]
fn clipboard_cut_paste_round_trip_via_events() {
    let mut doc = Document::from_text("keep CUT keep");
    let mut clip = LocalClipboard::new();
    let ctrl = Modifiers {
        shift: false,
        ctrl: true,
    };
    let shift = Modifiers {
        shift: true,
        ctrl: false,
    };

    doc.set_cursor(5);
    for _ in 0..3 {
        dispatch(
            &mut doc,
            &mut clip,
            &InputEvent::Key {
                key: Key::Right,
                mods: shift,
            },
        );
    }
    dispatch(
        &mut doc,
        &mut clip,
        &InputEvent::Key {
            key: Key::Char('x'),
            mods: ctrl,
        },
    );
    assert_eq!(doc.text(), "keep  keep");
    assert_eq!(clip.get_text(), "CUT");

    dispatch(
        &mut doc,
        &mut clip,
        &InputEvent::Key {
            key: Key::End,
            mods: ctrl,
        },
    );
    dispatch(
        &mut doc,
        &mut clip,
        &InputEvent::Key {
            key: Key::Char('v'),
            mods: ctrl,
        },
    );
    assert_eq!(doc.text(), "keep  keepCUT");
    assert_offset_space(&doc);
}

#[test]
fn save_and_reload_preserves_text_and_cleans_dirty_flag() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("note.md");

    let mut doc = Document::new();
    doc.insert("# saved\n");
    assert!(doc.is_modified());
    doc.save_as(&path).expect("save");
    assert!(!doc.is_modified());

    let reloaded = Document::load(&path).expect("load");
    assert_eq!(reloaded.text(), "# saved\n");
    assert!(!reloaded.is_modified());
    assert_eq!(reloaded.path(), Some(path.as_path()));
}

#[test]
fn failed_save_leaves_document_dirty_and_intact() {
    let mut doc = Document::new();
    doc.insert("unsaved");
    let err = doc.save().expect_err("no path set");
    assert!(matches!(
        err,
        notemark::core::persistence::PersistError::NoPath
    ));
    assert!(doc.is_modified());
    assert_eq!(doc.text(), "unsaved");

    let dir = tempfile::tempdir().expect("tempdir");
    let bad = dir.path().join("missing/dir/note.md");
    let err = doc.save_as(&bad).expect_err("unwritable path");
    assert!(matches!(
        err,
        notemark::core::persistence::PersistError::Write { .. }
    ));
    assert!(doc.is_modified());
    assert_eq!(doc.text(), "unsaved");
}

#[test]
fn crlf_files_normalize_on_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("dos.md");
    std::fs::write(&path, "# a\r\nb\r\n").expect("seed");
    let doc = Document::load(&path).expect("load");
    assert_eq!(doc.text(), "# a\nb\n");
    assert_offset_space(&doc);
}

#[test]
fn markup_survives_arbitrary_edits() {
    let mut doc = Document::from_text("# h\n**bold** ~~s~~ [i.png]\n|a|b|\n|c|d|\n\tcode\n");
    let mut clip = LocalClipboard::new();
    let events = [
        InputEvent::Key {
            key: Key::Down,
            mods: Modifiers::default(),
        },
        InputEvent::Insert("x".into()),
        InputEvent::Key {
            key: Key::Backspace,
            mods: Modifiers {
                shift: false,
                ctrl: true,
            },
        },
        InputEvent::Key {
            key: Key::End,
            mods: Modifiers::default(),
        },
        InputEvent::Key {
            key: Key::Enter,
            mods: Modifiers::default(),
        },
        InputEvent::Insert("tail".into()),
    ];
    for ev in events {
        dispatch(&mut doc, &mut clip, &ev);
        assert_offset_space(&doc);
        assert!(doc.text().is_char_boundary(doc.cursor()));
    }
}
