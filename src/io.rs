use crossterm::event::Event as CrossTermEvent;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use tracing::trace;

use crate::events::AppEvent;
use crate::events::CursorEvent;
use crate::events::Event;
use crate::events::TreeEvent;

/// Converts a crossterm event into a viewer event
pub fn convert_event(event: CrossTermEvent) -> Option<Event> {
    match event {
        CrossTermEvent::Key(key_event) => {
            trace!("{:?}", key_event);

            if key_event.kind == KeyEventKind::Release {
                return None;
            }

            let event = match key_event {
                KeyEvent {
                    code: KeyCode::Char('q'),
                    ..
                }
                | KeyEvent {
                    code: KeyCode::Char('c'),
                    modifiers: KeyModifiers::CONTROL,
                    ..
                } => Event::AppEvent(AppEvent::Exit),

                KeyEvent {
                    code: KeyCode::Char('h') | KeyCode::Left,
                    ..
                } => Event::AppEvent(AppEvent::CursorEvent(CursorEvent::Left)),
                KeyEvent {
                    code: KeyCode::Char('j') | KeyCode::Down,
                    ..
                } => Event::AppEvent(AppEvent::CursorEvent(CursorEvent::Down)),
                KeyEvent {
                    code: KeyCode::Char('k') | KeyCode::Up,
                    ..
                } => Event::AppEvent(AppEvent::CursorEvent(CursorEvent::Up)),
                KeyEvent {
                    code: KeyCode::Char('l') | KeyCode::Right,
                    ..
                } => Event::AppEvent(AppEvent::CursorEvent(CursorEvent::Right)),

                KeyEvent {
                    code: KeyCode::Char('a'),
                    ..
                } => Event::AppEvent(AppEvent::Layer(-1)),
                KeyEvent {
                    code: KeyCode::Char('s'),
                    ..
                } => Event::AppEvent(AppEvent::Layer(1)),
                KeyEvent {
                    code: KeyCode::Char('t'),
                    ..
                } => Event::AppEvent(AppEvent::Dump),
                KeyEvent {
                    code: KeyCode::Char('g'),
                    ..
                } => Event::AppEvent(AppEvent::ToggleLayout),

                KeyEvent {
                    code: KeyCode::Char(' '),
                    ..
                } => Event::TreeEvent(TreeEvent::Insert),
                KeyEvent {
                    code: KeyCode::Char('d'),
                    ..
                } => Event::TreeEvent(TreeEvent::Delete),
                KeyEvent {
                    code: KeyCode::Char('r'),
                    ..
                } => Event::TreeEvent(TreeEvent::Select),
                KeyEvent {
                    code: KeyCode::Char('c'),
                    ..
                } => Event::TreeEvent(TreeEvent::Clear),

                _ => return None,
            };

            Some(event)
        }
        CrossTermEvent::Resize(cols, rows) => Some(Event::AppEvent(AppEvent::Resize { cols, rows })),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> CrossTermEvent {
        CrossTermEvent::Key(KeyEvent::new(code, modifiers))
    }

    fn app(code: KeyCode) -> Option<AppEvent> {
        match convert_event(key(code, KeyModifiers::NONE)) {
            Some(Event::AppEvent(e)) => Some(e),
            _ => None,
        }
    }

    fn tree(code: KeyCode) -> Option<TreeEvent> {
        match convert_event(key(code, KeyModifiers::NONE)) {
            Some(Event::TreeEvent(e)) => Some(e),
            _ => None,
        }
    }

    #[test]
    fn ctrl_c_exits_but_c_clears() {
        assert!(matches!(
            convert_event(key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Event::AppEvent(AppEvent::Exit))
        ));
        assert_eq!(tree(KeyCode::Char('c')), Some(TreeEvent::Clear));
    }

    #[test]
    fn arrows_and_vim_keys_agree() {
        assert_eq!(app(KeyCode::Char('h')), app(KeyCode::Left));
        assert_eq!(app(KeyCode::Char('k')), app(KeyCode::Up));
        assert_eq!(
            app(KeyCode::Down),
            Some(AppEvent::CursorEvent(CursorEvent::Down))
        );
    }

    #[test]
    fn tree_keys() {
        assert_eq!(tree(KeyCode::Char(' ')), Some(TreeEvent::Insert));
        assert_eq!(tree(KeyCode::Char('d')), Some(TreeEvent::Delete));
        assert_eq!(tree(KeyCode::Char('r')), Some(TreeEvent::Select));
        assert_eq!(app(KeyCode::Char('s')), Some(AppEvent::Layer(1)));
        assert_eq!(app(KeyCode::Char('x')), None);
    }

    #[test]
    fn view_keys() {
        assert_eq!(app(KeyCode::Char('g')), Some(AppEvent::ToggleLayout));
        assert_eq!(app(KeyCode::Char('t')), Some(AppEvent::Dump));
        assert_eq!(app(KeyCode::Char('a')), Some(AppEvent::Layer(-1)));
    }

    #[test]
    fn resize() {
        assert!(matches!(
            convert_event(CrossTermEvent::Resize(80, 24)),
            Some(Event::AppEvent(AppEvent::Resize { cols: 80, rows: 24 }))
        ));
    }
}
