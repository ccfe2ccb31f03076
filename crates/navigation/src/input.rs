use std::collections::BTreeSet;

/// Keys the viewer reacts to. Anything else is carried as `Other` so the
/// pressed set mirrors the keyboard faithfully.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    Shift,
    Q,
    Escape,
    ArrowLeft,
    ArrowRight,
    Other(char),
}

impl Key {
    /// Maps a DOM-style key name (`"w"`, `" "`, `"Shift"`, `"ArrowLeft"`...).
    /// Matching ignores case.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        let key = match lower.as_str() {
            " " | "space" => Key::Space,
            "shift" => Key::Shift,
            "escape" | "esc" => Key::Escape,
            "arrowleft" => Key::ArrowLeft,
            "arrowright" => Key::ArrowRight,
            _ => {
                let mut chars = lower.chars();
                let c = chars.next()?.to_ascii_lowercase();
                if chars.next().is_some() {
                    return None;
                }
                match c {
                    'w' => Key::W,
                    'a' => Key::A,
                    's' => Key::S,
                    'd' => Key::D,
                    'q' => Key::Q,
                    other => Key::Other(other),
                }
            }
        };
        Some(key)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// DOM `MouseEvent.button` numbering.
    pub fn from_index(button: i32) -> Self {
        match button {
            1 => PointerButton::Middle,
            2 => PointerButton::Secondary,
            _ => PointerButton::Primary,
        }
    }
}

/// Signed movement axes derived from the pressed keys.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MoveIntent {
    /// +1 forward (W), -1 back (S).
    pub forward: i8,
    /// +1 right (D), -1 left (A).
    pub right: i8,
    /// +1 climb (Space), -1 descend (Shift).
    pub climb: i8,
}

impl MoveIntent {
    pub fn is_idle(&self) -> bool {
        self.forward == 0 && self.right == 0 && self.climb == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PressedKeys {
    keys: BTreeSet<Key>,
}

impl PressedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: Key) -> bool {
        self.keys.insert(key)
    }

    pub fn release(&mut self, key: Key) -> bool {
        self.keys.remove(&key)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn intent(&self) -> MoveIntent {
        let axis = |pos: Key, neg: Key| -> i8 {
            i8::from(self.is_pressed(pos)) - i8::from(self.is_pressed(neg))
        };
        MoveIntent {
            forward: axis(Key::W, Key::S),
            right: axis(Key::D, Key::A),
            climb: axis(Key::Space, Key::Shift),
        }
    }
}
