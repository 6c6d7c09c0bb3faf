//! GLK protocol definitions and frame encoding.
//!
//! Frame structure:
//! - Prefix byte: 0xFE before every command
//! - Command byte (three commands use a fixed multi-byte sequence)
//! - Parameter bytes in the order and width the command reference documents
//!
//! Text is the exception: it is written as raw ASCII with no prefix.
//! Coordinates are absolute from the top-left corner of the 192x64 panel.

use crate::error::{Error, Result};
use crate::{PANEL_HEIGHT, PANEL_WIDTH};

/// Prefix byte that must precede every command.
pub const CMD_PREFIX: u8 = 0xFE;

/// Single-byte command codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    // Communication
    FlowControlOn = 0x3A,
    FlowControlOff = 0x3B,
    I2cAddress = 0x33,
    BaudRate = 0x39,
    NonStandardBaudRate = 0xA4,
    // Fonts
    UseFont = 0x31,
    FontMetrics = 0x32,
    BoxSpaceMode = 0xAC,
    // Text
    CursorHome = 0x48,
    CursorPosition = 0x47,
    CursorCoordinate = 0x79,
    AutoScrollOn = 0x51,
    AutoScrollOff = 0x52,
    // Bitmaps
    DrawMemoryBitmap = 0x62,
    DrawBitmap = 0x64,
    // Drawing
    DrawingColor = 0x63,
    DrawPixel = 0x70,
    DrawLine = 0x6C,
    ContinueLine = 0x65,
    DrawRect = 0x72,
    DrawSolidRect = 0x78,
    InitBarGraph = 0x67,
    DrawBarGraph = 0x69,
    InitStripChart = 0x6A,
    ShiftStripChart = 0x6B,
    // GPO
    GpoOff = 0x56,
    GpoOn = 0x57,
    StartupGpoState = 0xC3,
    // Keypad
    KeyAutoTransmitOn = 0x41,
    KeyAutoTransmitOff = 0x4F,
    PollKey = 0x26,
    ClearKeyBuffer = 0x45,
    DebounceTime = 0x55,
    AutoRepeatMode = 0x7E,
    AutoRepeatOff = 0x60,
    KeypadCodes = 0xD5,
    // Display
    ClearScreen = 0x58,
    BacklightOn = 0x42,
    BacklightOff = 0x46,
    Brightness = 0x99,
    DefaultBrightness = 0x98,
    Contrast = 0x50,
    DefaultContrast = 0x91,
    // Filesystem
    DeleteFile = 0xAD,
    FreeSpace = 0xAF,
    Directory = 0xB3,
    DownloadFile = 0xB2,
    MoveFile = 0xB4,
    DumpFilesystem = 0x30,
    // Security
    Remember = 0x93,
    WriteCustomerData = 0x34,
    ReadCustomerData = 0x35,
    // Identification
    FirmwareVersion = 0x36,
    ModuleType = 0x37,
}

/// Wipe-filesystem command sequence (deliberately awkward to send by
/// accident).
pub const SEQ_WIPE_FILESYSTEM: [u8; 3] = [0x21, 0x59, 0x21];
/// Lock-level command sequence.
pub const SEQ_LOCK_LEVEL: [u8; 3] = [0xCA, 0xF5, 0xA0];
/// Default-lock-level command sequence.
pub const SEQ_DEFAULT_LOCK_LEVEL: [u8; 3] = [0xCB, 0xF5, 0xA0];

/// Builds a prefixed frame for a single-byte command.
pub fn frame(op: Opcode, params: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(2 + params.len());
    buf.push(CMD_PREFIX);
    buf.push(op as u8);
    buf.extend_from_slice(params);
    buf
}

/// Builds a prefixed frame for a multi-byte command sequence.
pub fn frame_seq(seq: &[u8], params: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + seq.len() + params.len());
    buf.push(CMD_PREFIX);
    buf.extend_from_slice(seq);
    buf.extend_from_slice(params);
    buf
}

fn check_range(what: &'static str, value: u16, min: u16, max: u16) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::OutOfRange {
            what,
            value,
            min,
            max,
        })
    }
}

fn check_point(x: u8, y: u8) -> Result<()> {
    if x < PANEL_WIDTH && y < PANEL_HEIGHT {
        Ok(())
    } else {
        Err(Error::OffPanel { x, y })
    }
}

/// Serial speeds the module accepts, with their protocol code bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum BaudRate {
    B9600 = 0xCF,
    B14400 = 0x8A,
    #[default]
    B19200 = 0x67,
    B28800 = 0x44,
    B38400 = 0x33,
    B57600 = 0x22,
    B76800 = 0x19,
    B115200 = 0x10,
}

impl BaudRate {
    /// Maps a numeric speed to its code, if the module supports it.
    pub fn from_speed(speed: u32) -> Option<Self> {
        match speed {
            9_600 => Some(BaudRate::B9600),
            14_400 => Some(BaudRate::B14400),
            19_200 => Some(BaudRate::B19200),
            28_800 => Some(BaudRate::B28800),
            38_400 => Some(BaudRate::B38400),
            57_600 => Some(BaudRate::B57600),
            76_800 => Some(BaudRate::B76800),
            115_200 => Some(BaudRate::B115200),
            _ => None,
        }
    }

    /// Numeric speed in bits per second.
    pub fn speed(&self) -> u32 {
        match self {
            BaudRate::B9600 => 9_600,
            BaudRate::B14400 => 14_400,
            BaudRate::B19200 => 19_200,
            BaudRate::B28800 => 28_800,
            BaudRate::B38400 => 38_400,
            BaudRate::B57600 => 57_600,
            BaudRate::B76800 => 76_800,
            BaudRate::B115200 => 115_200,
        }
    }
}

/// Bar graph fill directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BarGraphStyle {
    VerticalFromBottom = 0,
    HorizontalFromLeft = 1,
    VerticalFromTop = 2,
    HorizontalFromRight = 3,
}

/// Strip chart shift directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ShiftDirection {
    Left = 0,
    Right = 1,
}

/// Keypad auto-repeat behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AutoRepeatMode {
    /// Held key resends its down code.
    ResendKey = 0,
    /// Held key sends down and up codes.
    KeyUpDown = 1,
}

/// Colors of the three tricolor LEDs hardwired to GPO pairs.
///
/// LED n drives GPOs 2n-1 (odd) and 2n (even); a color is a pair of GPO
/// levels per the module's truth table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedColor {
    Off,
    Green,
    Red,
    Yellow,
}

impl LedColor {
    /// On/off state for the (odd, even) GPO of the pair.
    pub fn gpo_levels(&self) -> (bool, bool) {
        match self {
            LedColor::Off => (true, true),
            LedColor::Green => (true, false),
            LedColor::Red => (false, true),
            LedColor::Yellow => (false, false),
        }
    }
}

/// FE 3A full empty. Byte counts before the almost-full/almost-empty
/// flow-control returns are sent.
pub fn build_flow_control_on(full: u8, empty: u8) -> Result<Vec<u8>> {
    check_range("flow control full mark", full.into(), 0, 128)?;
    check_range("flow control empty mark", empty.into(), 0, 128)?;
    Ok(frame(Opcode::FlowControlOn, &[full, empty]))
}

/// FE A4 lsb msb. The divisor formula is crystal / (8 * baud) - 1; values
/// outside 12-2047 can leave the link unusable, so they are rejected.
pub fn build_non_standard_baud_rate(speed: u16) -> Result<Vec<u8>> {
    check_range("non-standard baud divisor", speed, 12, 2047)?;
    Ok(frame(
        Opcode::NonStandardBaudRate,
        &[(speed & 0xFF) as u8, (speed >> 8) as u8],
    ))
}

/// FE 32 lm tm csp lsp srow.
pub fn build_font_metrics(lm: u8, tm: u8, csp: u8, lsp: u8, srow: u8) -> Vec<u8> {
    frame(Opcode::FontMetrics, &[lm, tm, csp, lsp, srow])
}

/// FE 79 x y.
pub fn build_cursor_coordinates(x: u8, y: u8) -> Result<Vec<u8>> {
    check_point(x, y)?;
    Ok(frame(Opcode::CursorCoordinate, &[x, y]))
}

/// FE 62 id x y.
pub fn build_draw_memory_bitmap(id: u8, x: u8, y: u8) -> Result<Vec<u8>> {
    check_point(x, y)?;
    Ok(frame(Opcode::DrawMemoryBitmap, &[id, x, y]))
}

/// FE 64 x y w h data. Rows are encoded horizontally and padded to a full
/// byte, so the payload must be ceil(w / 8) * h bytes.
pub fn build_draw_bitmap(x: u8, y: u8, width: u8, height: u8, data: &[u8]) -> Result<Vec<u8>> {
    check_point(x, y)?;
    check_range("bitmap width", width.into(), 1, PANEL_WIDTH.into())?;
    check_range("bitmap height", height.into(), 1, PANEL_HEIGHT.into())?;
    let expected = (width as usize).div_ceil(8) * height as usize;
    if data.len() != expected {
        return Err(Error::BadLength {
            what: "bitmap data",
            expected,
            actual: data.len(),
        });
    }
    let mut buf = frame(Opcode::DrawBitmap, &[x, y, width, height]);
    buf.extend_from_slice(data);
    Ok(buf)
}

/// FE 70 x y.
pub fn build_draw_pixel(x: u8, y: u8) -> Result<Vec<u8>> {
    check_point(x, y)?;
    Ok(frame(Opcode::DrawPixel, &[x, y]))
}

/// FE 6C x1 y1 x2 y2. Lines may interpolate differently left-to-right and
/// right-to-left.
pub fn build_draw_line(x1: u8, y1: u8, x2: u8, y2: u8) -> Result<Vec<u8>> {
    check_point(x1, y1)?;
    check_point(x2, y2)?;
    Ok(frame(Opcode::DrawLine, &[x1, y1, x2, y2]))
}

/// FE 65 x y. Continues from the last line endpoint.
pub fn build_continue_line(x: u8, y: u8) -> Result<Vec<u8>> {
    check_point(x, y)?;
    Ok(frame(Opcode::ContinueLine, &[x, y]))
}

/// FE 72 color x1 y1 x2 y2 (outline) or FE 78 (solid).
pub fn build_draw_rect(
    solid: bool,
    color: u8,
    x1: u8,
    y1: u8,
    x2: u8,
    y2: u8,
) -> Result<Vec<u8>> {
    check_point(x1, y1)?;
    check_point(x2, y2)?;
    let op = if solid {
        Opcode::DrawSolidRect
    } else {
        Opcode::DrawRect
    };
    Ok(frame(op, &[color, x1, y1, x2, y2]))
}

/// FE 67 id style x1 y1 x2 y2. Overlapping bar graphs corrupt each other.
pub fn build_init_bar_graph(
    id: u8,
    style: BarGraphStyle,
    x1: u8,
    y1: u8,
    x2: u8,
    y2: u8,
) -> Result<Vec<u8>> {
    check_range("bar graph id", id.into(), 0, 15)?;
    check_point(x1, y1)?;
    check_point(x2, y2)?;
    if x1 > x2 || y1 > y2 {
        return Err(Error::UnorderedExtents { x1, y1, x2, y2 });
    }
    Ok(frame(
        Opcode::InitBarGraph,
        &[id, style as u8, x1, y1, x2, y2],
    ))
}

/// FE 69 id value. Value is in pixels along the graph's axis.
pub fn build_draw_bar_graph(id: u8, value: u8) -> Result<Vec<u8>> {
    check_range("bar graph id", id.into(), 0, 15)?;
    Ok(frame(Opcode::DrawBarGraph, &[id, value]))
}

/// FE 6A id x1 y1 x2 y2. X extents must lie on byte boundaries.
pub fn build_init_strip_chart(id: u8, x1: u8, y1: u8, x2: u8, y2: u8) -> Result<Vec<u8>> {
    check_range("strip chart id", id.into(), 0, 6)?;
    check_point(x1, y1)?;
    check_point(x2, y2)?;
    if x1 % 8 != 0 || x2 % 8 != 0 {
        return Err(Error::OutOfRange {
            what: "strip chart x (must be a multiple of 8)",
            value: if x1 % 8 != 0 { x1.into() } else { x2.into() },
            min: 0,
            max: (PANEL_WIDTH - 8).into(),
        });
    }
    if x1 > x2 || y1 > y2 {
        return Err(Error::UnorderedExtents { x1, y1, x2, y2 });
    }
    Ok(frame(Opcode::InitStripChart, &[id, x1, y1, x2, y2]))
}

/// FE 6B ref. The reference byte packs the chart id in the low bits and the
/// shift direction in the MSB.
pub fn build_shift_strip_chart(id: u8, direction: ShiftDirection) -> Result<Vec<u8>> {
    check_range("strip chart id", id.into(), 0, 6)?;
    Ok(frame(
        Opcode::ShiftStripChart,
        &[id | ((direction as u8) << 7)],
    ))
}

/// FE 57 num (on) or FE 56 num (off).
pub fn build_gpo(num: u8, on: bool) -> Result<Vec<u8>> {
    check_range("GPO number", num.into(), 1, 6)?;
    let op = if on { Opcode::GpoOn } else { Opcode::GpoOff };
    Ok(frame(op, &[num]))
}

/// FE C3 num state. Does not affect the current state.
pub fn build_startup_gpo_state(num: u8, on: bool) -> Result<Vec<u8>> {
    check_range("GPO number", num.into(), 1, 6)?;
    Ok(frame(Opcode::StartupGpoState, &[num, on as u8]))
}

/// FE 42 minutes. Zero keeps the backlight on indefinitely.
pub fn build_backlight_on(minutes: u8) -> Result<Vec<u8>> {
    check_range("backlight minutes", minutes.into(), 0, 90)?;
    Ok(frame(Opcode::BacklightOn, &[minutes]))
}

/// FE D5 + 9 down codes + 9 up codes.
pub fn build_keypad_codes(down: &[u8; 9], up: &[u8; 9]) -> Vec<u8> {
    let mut buf = frame(Opcode::KeypadCodes, down);
    buf.extend_from_slice(up);
    buf
}

/// FE 34 + 16 bytes of customer data.
pub fn build_write_customer_data(data: &[u8]) -> Result<Vec<u8>> {
    if data.len() != 16 {
        return Err(Error::BadLength {
            what: "customer data",
            expected: 16,
            actual: data.len(),
        });
    }
    let mut buf = frame(Opcode::WriteCustomerData, &[]);
    buf.extend_from_slice(data);
    Ok(buf)
}

/// Validates text for the module's ASCII character table.
pub fn check_text(text: &str) -> Result<&[u8]> {
    if text.is_ascii() {
        Ok(text.as_bytes())
    } else {
        Err(Error::NotAscii)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_prefix() {
        assert_eq!(frame(Opcode::ClearScreen, &[]), [0xFE, 0x58]);
        assert_eq!(frame(Opcode::Brightness, &[128]), [0xFE, 0x99, 0x80]);
        assert_eq!(frame(Opcode::Contrast, &[0x80]), [0xFE, 0x50, 0x80]);
    }

    #[test]
    fn test_frame_seq() {
        assert_eq!(
            frame_seq(&SEQ_WIPE_FILESYSTEM, &[]),
            [0xFE, 0x21, 0x59, 0x21]
        );
        assert_eq!(
            frame_seq(&SEQ_LOCK_LEVEL, &[0x08]),
            [0xFE, 0xCA, 0xF5, 0xA0, 0x08]
        );
    }

    #[test]
    fn test_flow_control_bounds() {
        assert_eq!(
            build_flow_control_on(0, 128).unwrap(),
            [0xFE, 0x3A, 0x00, 0x80]
        );
        assert!(build_flow_control_on(129, 0).is_err());
        assert!(build_flow_control_on(0, 129).is_err());
    }

    #[test]
    fn test_non_standard_baud_rate() {
        // 16 MHz / (8 * 9600) - 1 = 207
        assert_eq!(
            build_non_standard_baud_rate(207).unwrap(),
            [0xFE, 0xA4, 0xCF, 0x00]
        );
        assert_eq!(
            build_non_standard_baud_rate(2047).unwrap(),
            [0xFE, 0xA4, 0xFF, 0x07]
        );
        assert!(build_non_standard_baud_rate(11).is_err());
        assert!(build_non_standard_baud_rate(2048).is_err());
    }

    #[test]
    fn test_baud_rate_codes() {
        assert_eq!(BaudRate::B19200 as u8, 0x67);
        assert_eq!(BaudRate::B115200 as u8, 0x10);
        assert_eq!(BaudRate::from_speed(57_600), Some(BaudRate::B57600));
        assert_eq!(BaudRate::from_speed(1_200), None);
        assert_eq!(BaudRate::B76800.speed(), 76_800);
    }

    #[test]
    fn test_cursor_coordinates_bounds() {
        assert_eq!(
            build_cursor_coordinates(191, 63).unwrap(),
            [0xFE, 0x79, 0xBF, 0x3F]
        );
        assert!(build_cursor_coordinates(192, 0).is_err());
        assert!(build_cursor_coordinates(0, 64).is_err());
    }

    #[test]
    fn test_draw_bitmap_length() {
        // 12 pixels wide pads to 2 bytes per row
        let data = [0u8; 6];
        let buf = build_draw_bitmap(10, 20, 12, 3, &data).unwrap();
        assert_eq!(&buf[..6], [0xFE, 0x64, 10, 20, 12, 3]);
        assert_eq!(buf.len(), 6 + 6);
        assert!(matches!(
            build_draw_bitmap(10, 20, 12, 3, &[0u8; 5]),
            Err(Error::BadLength { expected: 6, .. })
        ));
    }

    #[test]
    fn test_draw_rect() {
        assert_eq!(
            build_draw_rect(false, 1, 0, 0, 191, 63).unwrap(),
            [0xFE, 0x72, 1, 0, 0, 191, 63]
        );
        assert_eq!(
            build_draw_rect(true, 0, 5, 5, 10, 10).unwrap(),
            [0xFE, 0x78, 0, 5, 5, 10, 10]
        );
        assert!(build_draw_rect(true, 0, 0, 0, 192, 0).is_err());
    }

    #[test]
    fn test_bar_graph() {
        assert_eq!(
            build_init_bar_graph(15, BarGraphStyle::VerticalFromBottom, 0, 0, 7, 54).unwrap(),
            [0xFE, 0x67, 15, 0, 0, 0, 7, 54]
        );
        assert!(build_init_bar_graph(16, BarGraphStyle::VerticalFromBottom, 0, 0, 7, 54).is_err());
        assert!(matches!(
            build_init_bar_graph(0, BarGraphStyle::HorizontalFromLeft, 10, 0, 5, 54),
            Err(Error::UnorderedExtents {
                x1: 10,
                x2: 5,
                ..
            })
        ));
        assert_eq!(build_draw_bar_graph(3, 42).unwrap(), [0xFE, 0x69, 3, 42]);
        assert!(build_draw_bar_graph(16, 0).is_err());
    }

    #[test]
    fn test_strip_chart() {
        assert_eq!(
            build_init_strip_chart(6, 8, 0, 64, 63).unwrap(),
            [0xFE, 0x6A, 6, 8, 0, 64, 63]
        );
        assert!(build_init_strip_chart(7, 0, 0, 8, 8).is_err());
        assert!(build_init_strip_chart(0, 9, 0, 16, 8).is_err());
        assert!(matches!(
            build_init_strip_chart(0, 16, 0, 8, 8),
            Err(Error::UnorderedExtents { .. })
        ));
        assert_eq!(
            build_shift_strip_chart(2, ShiftDirection::Left).unwrap(),
            [0xFE, 0x6B, 0x02]
        );
        assert_eq!(
            build_shift_strip_chart(2, ShiftDirection::Right).unwrap(),
            [0xFE, 0x6B, 0x82]
        );
    }

    #[test]
    fn test_gpo_bounds() {
        assert_eq!(build_gpo(1, true).unwrap(), [0xFE, 0x57, 1]);
        assert_eq!(build_gpo(6, false).unwrap(), [0xFE, 0x56, 6]);
        assert!(build_gpo(0, true).is_err());
        assert!(build_gpo(7, true).is_err());
        assert_eq!(
            build_startup_gpo_state(2, true).unwrap(),
            [0xFE, 0xC3, 2, 1]
        );
    }

    #[test]
    fn test_backlight_bounds() {
        assert_eq!(build_backlight_on(0).unwrap(), [0xFE, 0x42, 0]);
        assert_eq!(build_backlight_on(90).unwrap(), [0xFE, 0x42, 90]);
        assert!(build_backlight_on(91).is_err());
    }

    #[test]
    fn test_keypad_codes() {
        let down = [1, 2, 3, 4, 5, 6, 7, 8, 9];
        let up = [11, 12, 13, 14, 15, 16, 17, 18, 19];
        let buf = build_keypad_codes(&down, &up);
        assert_eq!(&buf[..2], [0xFE, 0xD5]);
        assert_eq!(&buf[2..11], down);
        assert_eq!(&buf[11..], up);
    }

    #[test]
    fn test_customer_data_length() {
        let buf = build_write_customer_data(&[0xAA; 16]).unwrap();
        assert_eq!(&buf[..2], [0xFE, 0x34]);
        assert_eq!(buf.len(), 18);
        assert!(build_write_customer_data(&[0; 15]).is_err());
    }

    #[test]
    fn test_check_text() {
        assert_eq!(check_text("HELLO").unwrap(), b"HELLO");
        assert!(check_text("héllo").is_err());
    }

    #[test]
    fn test_led_levels() {
        assert_eq!(LedColor::Off.gpo_levels(), (true, true));
        assert_eq!(LedColor::Green.gpo_levels(), (true, false));
        assert_eq!(LedColor::Red.gpo_levels(), (false, true));
        assert_eq!(LedColor::Yellow.gpo_levels(), (false, false));
    }
}
