//! Abstract input events and their dispatch onto a document.
//!
//! Frontends translate their native events into these and call
//! [`dispatch`]; the core never sees a window system. Shift extends the
//! selection, ctrl switches to word/whole-buffer granularity, exactly one
//! document operation runs per event.

use crate::core::clipboard::Clipboard;
use crate::core::document::Document;
use crate::core::geometry::Point;

/// Named keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Backspace,
    Enter,
    Tab,
    Char(char),
}

/// Modifier state accompanying a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
}

/// One discrete input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A fragment of typed text (IME or plain keystrokes).
    Insert(String),
    Key { key: Key, mods: Modifiers },
    /// Wheel delta; positive scrolls the view up.
    Wheel(i32),
    /// Pointer press at a pixel position.
    Click(Point),
}

/// What the caller still has to do after an event was applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Handled,
    /// Resolve this point against the next layout pass and feed the result
    /// to [`Document::set_cursor`].
    Pick(Point),
    /// Persist the document (may need a save-as prompt when it has no path).
    SaveRequested,
    Ignored,
}

/// Apply one event to the document.
pub fn dispatch(
    doc: &mut Document,
    clipboard: &mut dyn Clipboard,
    event: &InputEvent,
) -> Outcome {
    match event {
        InputEvent::Insert(text) => {
            doc.insert(text);
            Outcome::Handled
        }
        InputEvent::Wheel(delta) => {
            doc.scroll_by(-delta);
            Outcome::Handled
        }
        InputEvent::Click(point) => {
            doc.begin_click();
            Outcome::Pick(*point)
        }
        InputEvent::Key { key, mods } => match key {
            Key::Left => {
                doc.move_left(mods.ctrl, mods.shift);
                Outcome::Handled
            }
            Key::Right => {
                doc.move_right(mods.ctrl, mods.shift);
                Outcome::Handled
            }
            Key::Up => {
                doc.move_up(mods.shift);
                Outcome::Handled
            }
            Key::Down => {
                doc.move_down(mods.shift);
                Outcome::Handled
            }
            Key::Home => {
                doc.line_start(mods.shift, mods.ctrl);
                Outcome::Handled
            }
            Key::End => {
                doc.line_end(mods.shift, mods.ctrl);
                Outcome::Handled
            }
            Key::Backspace => {
                doc.backspace(mods.ctrl);
                Outcome::Handled
            }
            Key::Enter => {
                doc.newline();
                Outcome::Handled
            }
            Key::Tab => {
                doc.tab();
                Outcome::Handled
            }
            Key::Char(c) if mods.ctrl => match c.to_ascii_lowercase() {
                'c' => {
                    doc.copy(clipboard);
                    Outcome::Handled
                }
                'x' => {
                    doc.cut(clipboard);
                    Outcome::Handled
                }
                'v' => {
                    doc.paste(clipboard);
                    Outcome::Handled
                }
                'a' => {
                    doc.select_all();
                    Outcome::Handled
                }
                's' => Outcome::SaveRequested,
                _ => Outcome::Ignored,
            },
            Key::Char(c) => {
                doc.insert(&c.to_string());
                Outcome::Handled
            }
        },
    }
}
