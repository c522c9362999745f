/*
 * Copyright 2019 Michael Lodato <zvxryb@gmail.com>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::fmt;

/// What the player asked for, independent of which key or button did it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Trigger {
    /// start/continue: opens the pending incident, or closes an answered one
    Action,
    /// closes an answered incident
    Dismiss,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Button {
    Key(String),
    Click(String),
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Button::Key  (code) => { write!(f, "{}", code) }
            Button::Click(id  ) => { write!(f, "#{}", id) }
        }
    }
}

pub struct KeyBinds {
    pub action: Vec<Button>,
    pub dismiss: Vec<Button>,
}

impl KeyBinds {
    pub fn lookup(&self, button: &Button) -> Option<Trigger> {
        if self.action.contains(button) {
            Some(Trigger::Action)
        } else if self.dismiss.contains(button) {
            Some(Trigger::Dismiss)
        } else {
            None
        }
    }

    pub fn key(&self, code: &str) -> Option<Trigger> {
        self.lookup(&Button::Key(code.to_string()))
    }

    pub fn click(&self, id: &str) -> Option<Trigger> {
        self.lookup(&Button::Click(id.to_string()))
    }
}

impl Default for KeyBinds {
    fn default() -> Self {
        Self{
            action: vec![
                Button::Key  ("Space"    .to_string()),
                Button::Click("start-btn".to_string()),
            ],
            dismiss: vec![
                Button::Key  ("Enter"       .to_string()),
                Button::Click("continue-btn".to_string()),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds() {
        let binds = KeyBinds::default();
        assert_eq!(binds.key("Space"), Some(Trigger::Action));
        assert_eq!(binds.key("Enter"), Some(Trigger::Dismiss));
        assert_eq!(binds.click("start-btn"), Some(Trigger::Action));
        assert_eq!(binds.click("continue-btn"), Some(Trigger::Dismiss));
        assert_eq!(binds.key("KeyW"), None);
        assert_eq!(binds.click("Space"), None);
    }

    #[test]
    fn buttons_display_like_their_source() {
        assert_eq!(Button::Key("Space".to_string()).to_string(), "Space");
        assert_eq!(Button::Click("start-btn".to_string()).to_string(), "#start-btn");
    }
}
