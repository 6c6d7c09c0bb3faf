//! Keypad return code decoding.
//!
//! With auto-transmit on, the module sends a code byte for every press and
//! release. When polled (FE 26) instead, the module answers with one code
//! whose MSB flags further activity still buffered; 0x00 means the buffer
//! is empty. The buffer holds at most 10 presses.

use crate::error::{Error, Result};

/// Polled code meaning "no key activity buffered".
pub const NO_KEY: u8 = 0x00;

/// Presses the hardware buffer holds before resetting.
pub const KEY_BUFFER_SIZE: usize = 10;

/// Bit set on a polled code when more activity remains in the buffer.
pub const MORE_BUFFERED: u8 = 0x80;

/// The seven keys of the 7-key tactile layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Center,
    Top,
    Bottom,
}

/// A single press or release reported by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyActivity {
    pub key: Key,
    pub pressed: bool,
}

impl KeyActivity {
    /// Decodes a raw code byte (MSB already stripped for polled reads).
    pub fn from_code(code: u8) -> Result<Self> {
        let (key, pressed) = match code {
            0x42 => (Key::Up, true),
            0x48 => (Key::Down, true),
            0x44 => (Key::Left, true),
            0x43 => (Key::Right, true),
            0x45 => (Key::Center, true),
            0x41 => (Key::Top, true),
            0x47 => (Key::Bottom, true),
            0x62 => (Key::Up, false),
            0x68 => (Key::Down, false),
            0x64 => (Key::Left, false),
            0x63 => (Key::Right, false),
            0x65 => (Key::Center, false),
            0x61 => (Key::Top, false),
            0x67 => (Key::Bottom, false),
            other => return Err(Error::UnknownKey(other)),
        };
        Ok(KeyActivity { key, pressed })
    }
}

/// Decodes one polled response byte into activity plus the more-buffered
/// flag. `None` when the buffer was empty.
pub fn decode_poll(code: u8) -> Result<Option<(KeyActivity, bool)>> {
    if code == NO_KEY {
        return Ok(None);
    }
    let more = code & MORE_BUFFERED != 0;
    let activity = KeyActivity::from_code(code & !MORE_BUFFERED)?;
    Ok(Some((activity, more)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release_codes() {
        let act = KeyActivity::from_code(0x45).unwrap();
        assert_eq!(act.key, Key::Center);
        assert!(act.pressed);

        let act = KeyActivity::from_code(0x65).unwrap();
        assert_eq!(act.key, Key::Center);
        assert!(!act.pressed);
    }

    #[test]
    fn test_unknown_code() {
        assert!(matches!(
            KeyActivity::from_code(0x7F),
            Err(Error::UnknownKey(0x7F))
        ));
    }

    #[test]
    fn test_decode_poll_empty() {
        assert_eq!(decode_poll(NO_KEY).unwrap(), None);
    }

    #[test]
    fn test_decode_poll_more_flag() {
        let (act, more) = decode_poll(0x42).unwrap().unwrap();
        assert_eq!(act.key, Key::Up);
        assert!(act.pressed);
        assert!(!more);

        let (act, more) = decode_poll(0x42 | MORE_BUFFERED).unwrap().unwrap();
        assert_eq!(act.key, Key::Up);
        assert!(more);
    }
}
