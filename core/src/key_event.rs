//! Key events as they travel from the request stream into the engine.
//!
//! Key codes are X11 keysyms and the modifier mask follows the X11/rime bit
//! layout, so a front end can forward what its toolkit reports unchanged.

use bitflags::bitflags;

bitflags! {
    /// Modifier mask carried next to a keysym.
    ///
    /// Bits the bridge does not name are kept as-is and handed to the engine.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const SHIFT   = 1 << 0;
        const LOCK    = 1 << 1;
        const CONTROL = 1 << 2;
        const ALT     = 1 << 3;
        const SUPER   = 1 << 26;
        const HYPER   = 1 << 27;
        const META    = 1 << 28;
        const RELEASE = 1 << 30;
    }
}

impl Modifiers {
    /// Build a mask from the raw integer found on the wire.
    pub fn from_raw(raw: i32) -> Self {
        Self::from_bits_retain(raw as u32)
    }

    /// Raw integer form, as the engine expects it.
    pub fn raw(self) -> i32 {
        self.bits() as i32
    }
}

/// X11 keysyms the bundled engine and the tests care about.
pub mod keysym {
    pub const NONE: i32 = 0;
    pub const SPACE: i32 = 0x0020;
    pub const APOSTROPHE: i32 = 0x0027;
    pub const COMMA: i32 = 0x002c;
    pub const MINUS: i32 = 0x002d;
    pub const PERIOD: i32 = 0x002e;
    pub const EQUAL: i32 = 0x003d;
    pub const BACKSPACE: i32 = 0xff08;
    pub const TAB: i32 = 0xff09;
    pub const RETURN: i32 = 0xff0d;
    pub const ESCAPE: i32 = 0xff1b;
    pub const HOME: i32 = 0xff50;
    pub const LEFT: i32 = 0xff51;
    pub const UP: i32 = 0xff52;
    pub const RIGHT: i32 = 0xff53;
    pub const DOWN: i32 = 0xff54;
    pub const PAGE_UP: i32 = 0xff55;
    pub const PAGE_DOWN: i32 = 0xff56;
    pub const END: i32 = 0xff57;
    pub const KP_ENTER: i32 = 0xff8d;
    pub const DELETE: i32 = 0xffff;
}

/// One key press (or release) to feed into a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub keycode: i32,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Stand-in for a request that could not be decoded.
    pub const NEUTRAL: KeyEvent = KeyEvent {
        keycode: keysym::NONE,
        modifiers: Modifiers::empty(),
    };

    pub fn new(keycode: i32, modifiers: Modifiers) -> Self {
        Self { keycode, modifiers }
    }

    pub fn from_raw(keycode: i32, modifiers: i32) -> Self {
        Self::new(keycode, Modifiers::from_raw(modifiers))
    }

    /// Key press without modifiers.
    pub fn plain(keycode: i32) -> Self {
        Self::new(keycode, Modifiers::empty())
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }

    pub fn is_release(&self) -> bool {
        self.modifiers.contains(Modifiers::RELEASE)
    }

    /// Printable ASCII character for Latin-1 keysyms in the 0x20..=0x7e range.
    pub fn printable(&self) -> Option<char> {
        match self.keycode {
            0x20..=0x7e => char::from_u32(self.keycode as u32),
            _ => None,
        }
    }
}

impl Default for KeyEvent {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_event_is_zero() {
        let key = KeyEvent::default();
        assert!(key.is_neutral());
        assert_eq!(key.keycode, 0);
        assert_eq!(key.modifiers.raw(), 0);
    }

    #[test]
    fn unknown_modifier_bits_survive() {
        let raw = (1 << 0) | (1 << 13);
        let mods = Modifiers::from_raw(raw);
        assert!(mods.contains(Modifiers::SHIFT));
        assert_eq!(mods.raw(), raw);
    }

    #[test]
    fn printable_covers_ascii_only() {
        assert_eq!(KeyEvent::plain(0x61).printable(), Some('a'));
        assert_eq!(KeyEvent::plain(keysym::SPACE).printable(), Some(' '));
        assert_eq!(KeyEvent::plain(keysym::RETURN).printable(), None);
        assert_eq!(KeyEvent::plain(-1).printable(), None);
    }

    #[test]
    fn release_flag_detected() {
        let key = KeyEvent::new(0x61, Modifiers::RELEASE | Modifiers::SHIFT);
        assert!(key.is_release());
        assert!(!KeyEvent::plain(0x61).is_release());
    }
}
