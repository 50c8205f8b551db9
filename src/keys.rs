//! Keyboard input mapping.
//!
//! Translates winit logical keys into the few actions the application knows about:
//! the interactive navigation commands and quit.

use crate::app::selection::NavigationCommand;
use winit::keyboard;

/// Something a key release asks the application to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyAction {
    /// Change the active selection (interactive mode only).
    Navigate(NavigationCommand),
    /// Leave the application, flushing the report.
    Quit,
}

macro_rules! match_char_key {
    ($c:expr, {
        $($key:literal => $variant:expr),* $(,)?
    }) => {{
        match $c.to_ascii_lowercase().as_str() {
            $($key => Some($variant),)*
            _ => None,
        }
    }};
}

macro_rules! match_named_key {
    ($k:expr, {
        $($key:ident => $variant:expr),* $(,)?
    }) => {{
        match $k {
            $(winit::keyboard::NamedKey::$key => Some($variant),)*
            _ => None,
        }
    }};
}

/// Converts a winit key into an application action.
pub fn winit_key_to_action(key: &keyboard::Key) -> Option<KeyAction> {
    use NavigationCommand::*;

    match key {
        keyboard::Key::Named(named) => match_named_key!(named, {
            ArrowLeft => KeyAction::Navigate(PrevProblem),
            ArrowRight => KeyAction::Navigate(NextProblem),
            ArrowUp => KeyAction::Navigate(PrevSolution),
            ArrowDown => KeyAction::Navigate(NextSolution),
            Escape => KeyAction::Quit,
        }),

        keyboard::Key::Character(c) => match_char_key!(c, {
            "a" => KeyAction::Navigate(NextApi),
            "q" => KeyAction::Quit,
        }),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::{Key, NamedKey};

    #[test]
    fn arrows_navigate_problems_and_solutions() {
        assert_eq!(
            winit_key_to_action(&Key::Named(NamedKey::ArrowRight)),
            Some(KeyAction::Navigate(NavigationCommand::NextProblem))
        );
        assert_eq!(
            winit_key_to_action(&Key::Named(NamedKey::ArrowUp)),
            Some(KeyAction::Navigate(NavigationCommand::PrevSolution))
        );
    }

    #[test]
    fn characters_are_case_insensitive() {
        assert_eq!(
            winit_key_to_action(&Key::Character("A".into())),
            Some(KeyAction::Navigate(NavigationCommand::NextApi))
        );
        assert_eq!(winit_key_to_action(&Key::Character("z".into())), None);
    }
}
