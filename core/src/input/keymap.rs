//! Physical key to logical axis mapping

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

use super::InputError;

/// Logical axis passed to the module's `onKeyDown`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Forward,
    Left,
    Back,
    Right,
    Jump,
    Crouch,
    Aux1,
    Aux2,
    Aux3,
}

impl Axis {
    /// Number the module sees
    pub fn index(self) -> u32 {
        match self {
            Self::Forward => 0,
            Self::Left => 1,
            Self::Back => 2,
            Self::Right => 3,
            Self::Jump => 4,
            Self::Crouch => 5,
            Self::Aux1 => 6,
            Self::Aux2 => 7,
            Self::Aux3 => 8,
        }
    }
}

macro_rules! key_names {
    ($($key:ident),* $(,)?) => {
        /// Config name of a key (the `KeyboardEvent.code` spelling)
        pub fn key_name(key: KeyCode) -> Option<&'static str> {
            match key {
                $(KeyCode::$key => Some(stringify!($key)),)*
                _ => None,
            }
        }

        /// Parse a config key name
        pub fn key_from_name(name: &str) -> Option<KeyCode> {
            match name {
                $(stringify!($key) => Some(KeyCode::$key),)*
                _ => None,
            }
        }
    };
}

key_names! {
    KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI, KeyJ, KeyK, KeyL, KeyM,
    KeyN, KeyO, KeyP, KeyQ, KeyR, KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,
    Digit0, Digit1, Digit2, Digit3, Digit4, Digit5, Digit6, Digit7, Digit8, Digit9,
    ArrowUp, ArrowDown, ArrowLeft, ArrowRight,
    ShiftLeft, ShiftRight, ControlLeft, ControlRight, AltLeft, AltRight,
    Space, Enter, Tab, Backspace,
    Comma, Period, Slash, Semicolon, Quote, BracketLeft, BracketRight, Minus, Equal,
    Numpad0, Numpad1, Numpad2, Numpad3, Numpad4, Numpad5, Numpad6, Numpad7, Numpad8, Numpad9,
}

/// Key bindings. Several keys may drive the same axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Axis>", into = "BTreeMap<String, Axis>")]
pub struct Keymap {
    bindings: HashMap<KeyCode, Axis>,
}

impl Keymap {
    /// A map with no bindings
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    pub fn axis(&self, key: KeyCode) -> Option<Axis> {
        self.bindings.get(&key).copied()
    }

    pub fn bind(&mut self, key: KeyCode, axis: Axis) {
        self.bindings.insert(key, axis);
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for Keymap {
    fn default() -> Self {
        let mut keymap = Self::empty();
        for (key, axis) in [
            (KeyCode::KeyW, Axis::Forward),
            (KeyCode::ArrowUp, Axis::Forward),
            (KeyCode::KeyA, Axis::Left),
            (KeyCode::ArrowLeft, Axis::Left),
            (KeyCode::KeyS, Axis::Back),
            (KeyCode::ArrowDown, Axis::Back),
            (KeyCode::KeyD, Axis::Right),
            (KeyCode::ArrowRight, Axis::Right),
            (KeyCode::Space, Axis::Jump),
            (KeyCode::ShiftLeft, Axis::Crouch),
            (KeyCode::KeyZ, Axis::Aux1),
            (KeyCode::KeyX, Axis::Aux2),
            (KeyCode::KeyC, Axis::Aux3),
        ] {
            keymap.bind(key, axis);
        }
        keymap
    }
}

impl TryFrom<BTreeMap<String, Axis>> for Keymap {
    type Error = InputError;

    fn try_from(names: BTreeMap<String, Axis>) -> Result<Self, Self::Error> {
        let mut keymap = Self::empty();
        for (name, axis) in names {
            let key = key_from_name(&name).ok_or(InputError::UnknownKey(name))?;
            keymap.bind(key, axis);
        }
        Ok(keymap)
    }
}

impl From<Keymap> for BTreeMap<String, Axis> {
    fn from(keymap: Keymap) -> Self {
        keymap
            .bindings
            .into_iter()
            .filter_map(|(key, axis)| key_name(key).map(|name| (name.to_string(), axis)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let keymap = Keymap::default();
        assert_eq!(keymap.axis(KeyCode::KeyW), Some(Axis::Forward));
        assert_eq!(keymap.axis(KeyCode::ArrowDown), Some(Axis::Back));
        assert_eq!(keymap.axis(KeyCode::ShiftLeft), Some(Axis::Crouch));
        assert_eq!(keymap.axis(KeyCode::KeyC), Some(Axis::Aux3));
        assert_eq!(keymap.axis(KeyCode::KeyQ), None);
        assert_eq!(keymap.len(), 13);
    }

    #[test]
    fn test_axis_indices() {
        assert_eq!(Axis::Forward.index(), 0);
        assert_eq!(Axis::Right.index(), 3);
        assert_eq!(Axis::Jump.index(), 4);
        assert_eq!(Axis::Aux3.index(), 8);
    }

    #[test]
    fn test_key_names_round_trip() {
        assert_eq!(key_name(KeyCode::KeyW), Some("KeyW"));
        assert_eq!(key_from_name("ArrowLeft"), Some(KeyCode::ArrowLeft));
        assert_eq!(key_from_name("W"), None);
        assert_eq!(key_name(KeyCode::F13), None);
    }

    #[test]
    fn test_keymap_toml_round_trip() {
        let keymap = Keymap::default();
        let text = toml::to_string(&keymap).unwrap();
        assert!(text.contains("KeyW = \"forward\""));

        let parsed: Keymap = toml::from_str(&text).unwrap();
        assert_eq!(parsed, keymap);
    }

    #[test]
    fn test_unknown_key_name_is_rejected() {
        let err = toml::from_str::<Keymap>("Hyper = \"jump\"").unwrap_err();
        assert!(err.to_string().contains("unknown key name 'Hyper'"));
    }
}
