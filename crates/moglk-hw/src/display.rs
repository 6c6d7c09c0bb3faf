//! GLK device handle.
//!
//! One `Glk` owns one serial port for its lifetime. Every operation is a
//! complete exchange: build the frame, write it, and for the commands that
//! answer, read the documented number of bytes under the read deadline.
//! `&mut self` keeps one command in flight per handle; the wire has no
//! framing to disambiguate interleaved commands.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tokio_serial::{DataBits, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::filesystem::{decode_directory, decode_free_space, DirEntry, FileKind};
use crate::keypad::{decode_poll, KeyActivity};
use crate::module::{FirmwareVersion, ModuleType};
use crate::protocol::{self, AutoRepeatMode, BarGraphStyle, BaudRate, LedColor, Opcode, ShiftDirection};

/// Default response deadline, matching the module's factory serial timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to one GLK module.
pub struct Glk<T> {
    transport: T,
    read_timeout: Duration,
}

impl Glk<SerialStream> {
    /// Opens the serial port with the module's fixed 8N1 framing.
    pub fn open(port_path: &str, baud: u32) -> Result<Self> {
        let transport = tokio_serial::new(port_path, baud)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .open_native_async()
            .map_err(|e| {
                if let tokio_serial::ErrorKind::Io(kind) = &e.kind {
                    if *kind == std::io::ErrorKind::NotFound
                        && !std::path::Path::new(port_path).exists()
                    {
                        return Error::PortNotFound(port_path.to_string());
                    }
                }
                Error::Serial(e)
            })?;

        info!("GLK module opened at {} ({} baud)", port_path, baud);

        Ok(Self {
            transport,
            read_timeout: DEFAULT_READ_TIMEOUT,
        })
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin> Glk<T> {
    /// Wraps an already-open transport. Used by tests and by callers that
    /// manage the port themselves.
    pub fn with_transport(transport: T, read_timeout: Duration) -> Self {
        Self {
            transport,
            read_timeout,
        }
    }

    /// Changes the response deadline.
    pub fn set_read_timeout(&mut self, read_timeout: Duration) {
        self.read_timeout = read_timeout;
    }

    async fn send(&mut self, frame: &[u8]) -> Result<()> {
        debug!("send {:02X?}", frame);
        self.transport.write_all(frame).await?;
        self.transport.flush().await?;
        Ok(())
    }

    async fn read_response(&mut self, buf: &mut [u8]) -> Result<()> {
        match timeout(self.read_timeout, self.transport.read_exact(buf)).await {
            Ok(res) => {
                res?;
                debug!("recv {:02X?}", buf);
                Ok(())
            }
            Err(_) => Err(Error::Timeout {
                expected: buf.len(),
            }),
        }
    }

    /// Reads a 4-byte little-endian size prefix, then that many bytes.
    /// A size beyond the filesystem capacity is a garbled response, not a
    /// request to allocate gigabytes.
    async fn read_sized(&mut self) -> Result<Vec<u8>> {
        let mut size = [0u8; 4];
        self.read_response(&mut size).await?;
        let size = u32::from_le_bytes(size) as usize;
        if size > crate::filesystem::FS_CAPACITY {
            return Err(Error::BadLength {
                what: "sized response",
                expected: crate::filesystem::FS_CAPACITY,
                actual: size,
            });
        }
        let mut payload = vec![0u8; size];
        self.read_response(&mut payload).await?;
        Ok(payload)
    }

    // --- Communication ---

    /// Enables flow control (FE 3A). `full` and `empty` are the byte counts
    /// before the almost-full/almost-empty marks are sent.
    pub async fn set_flow_control_on(&mut self, full: u8, empty: u8) -> Result<()> {
        let frame = protocol::build_flow_control_on(full, empty)?;
        self.send(&frame).await
    }

    /// Disables flow control (FE 3B).
    pub async fn set_flow_control_off(&mut self) -> Result<()> {
        self.send(&protocol::frame(Opcode::FlowControlOff, &[])).await
    }

    /// Sets the module's I2C slave address (FE 33).
    pub async fn set_i2c_address(&mut self, address: u8) -> Result<()> {
        self.send(&protocol::frame(Opcode::I2cAddress, &[address]))
            .await
    }

    /// Switches the module to one of the standard speeds (FE 39). Takes
    /// effect on the module immediately; reopen the port to follow it.
    pub async fn set_baud_rate(&mut self, rate: BaudRate) -> Result<()> {
        self.send(&protocol::frame(Opcode::BaudRate, &[rate as u8]))
            .await
    }

    /// Programs a non-standard speed divisor (FE A4).
    pub async fn set_non_standard_baud_rate(&mut self, divisor: u16) -> Result<()> {
        let frame = protocol::build_non_standard_baud_rate(divisor)?;
        self.send(&frame).await
    }

    // --- Fonts ---

    /// Font upload needs the file transfer protocol, which this driver does
    /// not speak.
    pub fn upload_font(&mut self, _id: u8, _data: &[u8]) -> Result<()> {
        Err(Error::Unsupported("font upload"))
    }

    /// Selects an onboard font (FE 31).
    pub async fn use_font(&mut self, id: u8) -> Result<()> {
        self.send(&protocol::frame(Opcode::UseFont, &[id])).await
    }

    /// Sets margins, spacing and scroll row for the current font (FE 32).
    pub async fn set_font_metrics(
        &mut self,
        left_margin: u8,
        top_margin: u8,
        char_spacing: u8,
        line_spacing: u8,
        scroll_row: u8,
    ) -> Result<()> {
        self.send(&protocol::build_font_metrics(
            left_margin,
            top_margin,
            char_spacing,
            line_spacing,
            scroll_row,
        ))
        .await
    }

    /// Turns box-space mode on or off (FE AC).
    pub async fn set_box_space_mode(&mut self, on: bool) -> Result<()> {
        self.send(&protocol::frame(Opcode::BoxSpaceMode, &[on as u8]))
            .await
    }

    // --- Text ---

    /// Writes ASCII text at the cursor. Sent raw, without the command
    /// prefix.
    pub async fn write_text(&mut self, text: &str) -> Result<()> {
        let bytes = protocol::check_text(text)?.to_vec();
        self.send(&bytes).await
    }

    /// Returns the cursor to the top-left (FE 48).
    pub async fn cursor_home(&mut self) -> Result<()> {
        self.send(&protocol::frame(Opcode::CursorHome, &[])).await
    }

    /// Moves the cursor to a column/row cell of the current font (FE 47).
    pub async fn set_cursor_position(&mut self, col: u8, row: u8) -> Result<()> {
        self.send(&protocol::frame(Opcode::CursorPosition, &[col, row]))
            .await
    }

    /// Moves the cursor to a pixel coordinate (FE 79).
    pub async fn set_cursor_coordinates(&mut self, x: u8, y: u8) -> Result<()> {
        let frame = protocol::build_cursor_coordinates(x, y)?;
        self.send(&frame).await
    }

    /// Turns auto-scroll on (FE 51) or off (FE 52).
    pub async fn set_auto_scroll(&mut self, on: bool) -> Result<()> {
        let op = if on {
            Opcode::AutoScrollOn
        } else {
            Opcode::AutoScrollOff
        };
        self.send(&protocol::frame(op, &[])).await
    }

    // --- Bitmaps ---

    /// Bitmap upload needs the file transfer protocol, which this driver
    /// does not speak.
    pub fn upload_bitmap(&mut self, _id: u8, _data: &[u8]) -> Result<()> {
        Err(Error::Unsupported("bitmap upload"))
    }

    /// Draws a bitmap stored in the onboard filesystem (FE 62).
    pub async fn draw_memory_bitmap(&mut self, id: u8, x: u8, y: u8) -> Result<()> {
        let frame = protocol::build_draw_memory_bitmap(id, x, y)?;
        self.send(&frame).await
    }

    /// Draws bitmap data directly to the panel (FE 64).
    pub async fn draw_bitmap(
        &mut self,
        x: u8,
        y: u8,
        width: u8,
        height: u8,
        data: &[u8],
    ) -> Result<()> {
        let frame = protocol::build_draw_bitmap(x, y, width, height, data)?;
        self.send(&frame).await
    }

    // --- Drawing ---

    /// Sets the drawing color (FE 63): 0 white, anything else black.
    pub async fn set_drawing_color(&mut self, color: u8) -> Result<()> {
        self.send(&protocol::frame(Opcode::DrawingColor, &[color]))
            .await
    }

    /// Draws one pixel (FE 70).
    pub async fn draw_pixel(&mut self, x: u8, y: u8) -> Result<()> {
        let frame = protocol::build_draw_pixel(x, y)?;
        self.send(&frame).await
    }

    /// Draws a line (FE 6C).
    pub async fn draw_line(&mut self, x1: u8, y1: u8, x2: u8, y2: u8) -> Result<()> {
        let frame = protocol::build_draw_line(x1, y1, x2, y2)?;
        self.send(&frame).await
    }

    /// Extends the last line to a new endpoint (FE 65).
    pub async fn continue_line(&mut self, x: u8, y: u8) -> Result<()> {
        let frame = protocol::build_continue_line(x, y)?;
        self.send(&frame).await
    }

    /// Draws a rectangle outline (FE 72).
    pub async fn draw_rect(&mut self, color: u8, x1: u8, y1: u8, x2: u8, y2: u8) -> Result<()> {
        let frame = protocol::build_draw_rect(false, color, x1, y1, x2, y2)?;
        self.send(&frame).await
    }

    /// Draws a filled rectangle (FE 78).
    pub async fn draw_solid_rect(
        &mut self,
        color: u8,
        x1: u8,
        y1: u8,
        x2: u8,
        y2: u8,
    ) -> Result<()> {
        let frame = protocol::build_draw_rect(true, color, x1, y1, x2, y2)?;
        self.send(&frame).await
    }

    /// Defines one of the 16 bar graphs (FE 67).
    pub async fn init_bar_graph(
        &mut self,
        id: u8,
        style: BarGraphStyle,
        x1: u8,
        y1: u8,
        x2: u8,
        y2: u8,
    ) -> Result<()> {
        let frame = protocol::build_init_bar_graph(id, style, x1, y1, x2, y2)?;
        self.send(&frame).await
    }

    /// Draws a bar graph at a value in pixels (FE 69).
    pub async fn draw_bar_graph(&mut self, id: u8, value: u8) -> Result<()> {
        let frame = protocol::build_draw_bar_graph(id, value)?;
        self.send(&frame).await
    }

    /// Defines one of the 7 strip charts (FE 6A).
    pub async fn init_strip_chart(&mut self, id: u8, x1: u8, y1: u8, x2: u8, y2: u8) -> Result<()> {
        let frame = protocol::build_init_strip_chart(id, x1, y1, x2, y2)?;
        self.send(&frame).await
    }

    /// Shifts a strip chart one step (FE 6B).
    pub async fn shift_strip_chart(&mut self, id: u8, direction: ShiftDirection) -> Result<()> {
        let frame = protocol::build_shift_strip_chart(id, direction)?;
        self.send(&frame).await
    }

    // --- GPOs and LEDs ---

    /// Switches a general-purpose output (FE 57 on, FE 56 off).
    pub async fn set_gpo(&mut self, num: u8, on: bool) -> Result<()> {
        let frame = protocol::build_gpo(num, on)?;
        self.send(&frame).await
    }

    /// Sets the state a GPO powers up in (FE C3). Leaves the current state
    /// alone.
    pub async fn set_startup_gpo_state(&mut self, num: u8, on: bool) -> Result<()> {
        let frame = protocol::build_startup_gpo_state(num, on)?;
        self.send(&frame).await
    }

    /// Drives one of the three tricolor LEDs through its GPO pair.
    pub async fn set_led(&mut self, num: u8, color: LedColor) -> Result<()> {
        if !(1..=3).contains(&num) {
            return Err(Error::OutOfRange {
                what: "LED number",
                value: num.into(),
                min: 1,
                max: 3,
            });
        }
        let (odd, even) = color.gpo_levels();
        self.set_gpo(num * 2 - 1, odd).await?;
        self.set_gpo(num * 2, even).await
    }

    // --- Keypad ---

    /// Turns key auto-transmit on (FE 41) or off (FE 4F). With it off the
    /// module buffers up to 10 presses for polling.
    pub async fn set_key_auto_transmit(&mut self, on: bool) -> Result<()> {
        let op = if on {
            Opcode::KeyAutoTransmitOn
        } else {
            Opcode::KeyAutoTransmitOff
        };
        self.send(&protocol::frame(op, &[])).await
    }

    async fn poll_key_raw(&mut self) -> Result<Option<(KeyActivity, bool)>> {
        self.send(&protocol::frame(Opcode::PollKey, &[])).await?;
        let mut code = [0u8; 1];
        self.read_response(&mut code).await?;
        decode_poll(code[0])
    }

    /// Polls the key buffer for one activity (FE 26). `None` when the
    /// buffer is empty.
    pub async fn poll_key(&mut self) -> Result<Option<KeyActivity>> {
        Ok(self.poll_key_raw().await?.map(|(activity, _)| activity))
    }

    /// Polls repeatedly until the buffer is drained. The hardware buffer
    /// holds 10 presses, so the more-buffered flag is never trusted past
    /// that many polls.
    pub async fn drain_keys(&mut self) -> Result<Vec<KeyActivity>> {
        let mut activities = Vec::new();
        for _ in 0..crate::keypad::KEY_BUFFER_SIZE {
            match self.poll_key_raw().await? {
                Some((activity, more)) => {
                    activities.push(activity);
                    if !more {
                        break;
                    }
                }
                None => break,
            }
        }
        Ok(activities)
    }

    /// Empties the key buffer (FE 45).
    pub async fn clear_key_buffer(&mut self) -> Result<()> {
        self.send(&protocol::frame(Opcode::ClearKeyBuffer, &[]))
            .await
    }

    /// Sets the debounce time in 6.554 ms increments (FE 55, default 8).
    pub async fn set_debounce_time(&mut self, time: u8) -> Result<()> {
        self.send(&protocol::frame(Opcode::DebounceTime, &[time]))
            .await
    }

    /// Selects the auto-repeat behavior (FE 7E).
    pub async fn set_auto_repeat_mode(&mut self, mode: AutoRepeatMode) -> Result<()> {
        self.send(&protocol::frame(Opcode::AutoRepeatMode, &[mode as u8]))
            .await
    }

    /// Disables auto-repeat (FE 60).
    pub async fn set_auto_repeat_off(&mut self) -> Result<()> {
        self.send(&protocol::frame(Opcode::AutoRepeatOff, &[]))
            .await
    }

    /// Replaces the key down/up code tables (FE D5).
    pub async fn assign_keypad_codes(&mut self, down: &[u8; 9], up: &[u8; 9]) -> Result<()> {
        self.send(&protocol::build_keypad_codes(down, up)).await
    }

    // --- Display ---

    /// Clears the panel (FE 58).
    pub async fn clear_screen(&mut self) -> Result<()> {
        self.send(&protocol::frame(Opcode::ClearScreen, &[])).await
    }

    /// Turns the backlight on for up to 90 minutes, 0 meaning indefinitely
    /// (FE 42).
    pub async fn backlight_on(&mut self, minutes: u8) -> Result<()> {
        let frame = protocol::build_backlight_on(minutes)?;
        self.send(&frame).await
    }

    /// Turns the backlight off (FE 46).
    pub async fn backlight_off(&mut self) -> Result<()> {
        self.send(&protocol::frame(Opcode::BacklightOff, &[]))
            .await
    }

    /// Sets the backlight brightness (FE 99).
    pub async fn set_brightness(&mut self, brightness: u8) -> Result<()> {
        self.send(&protocol::frame(Opcode::Brightness, &[brightness]))
            .await
    }

    /// Sets and stores the power-up brightness (FE 98).
    pub async fn set_default_brightness(&mut self, brightness: u8) -> Result<()> {
        self.send(&protocol::frame(Opcode::DefaultBrightness, &[brightness]))
            .await
    }

    /// Sets the contrast (FE 50, default 128).
    pub async fn set_contrast(&mut self, contrast: u8) -> Result<()> {
        self.send(&protocol::frame(Opcode::Contrast, &[contrast]))
            .await
    }

    /// Sets and stores the power-up contrast (FE 91).
    pub async fn set_default_contrast(&mut self, contrast: u8) -> Result<()> {
        self.send(&protocol::frame(Opcode::DefaultContrast, &[contrast]))
            .await
    }

    // --- Filesystem ---

    /// Erases the onboard filesystem (FE 21 59 21). Power-cycle the module
    /// afterwards to be sure of filesystem integrity.
    pub async fn wipe_filesystem(&mut self) -> Result<()> {
        self.send(&protocol::frame_seq(&protocol::SEQ_WIPE_FILESYSTEM, &[]))
            .await
    }

    /// Deletes one file (FE AD).
    pub async fn delete_file(&mut self, kind: FileKind, id: u8) -> Result<()> {
        self.send(&protocol::frame(Opcode::DeleteFile, &[kind as u8, id]))
            .await
    }

    /// Reads the free space in bytes (FE AF).
    pub async fn free_space(&mut self) -> Result<u32> {
        self.send(&protocol::frame(Opcode::FreeSpace, &[])).await?;
        let mut raw = [0u8; 4];
        self.read_response(&mut raw).await?;
        Ok(decode_free_space(&raw))
    }

    /// Lists the used filesystem slots (FE B3).
    pub async fn list_directory(&mut self) -> Result<Vec<DirEntry>> {
        self.send(&protocol::frame(Opcode::Directory, &[])).await?;
        let mut count = [0u8; 1];
        self.read_response(&mut count).await?;
        let mut raw = vec![0u8; count[0] as usize * 4];
        self.read_response(&mut raw).await?;
        decode_directory(&raw)
    }

    /// Downloads one file's contents (FE B2).
    pub async fn download_file(&mut self, kind: FileKind, id: u8) -> Result<Vec<u8>> {
        self.send(&protocol::frame(Opcode::DownloadFile, &[kind as u8, id]))
            .await?;
        self.read_sized().await
    }

    /// Renumbers a file (FE B4).
    pub async fn move_file(
        &mut self,
        old_kind: FileKind,
        old_id: u8,
        new_kind: FileKind,
        new_id: u8,
    ) -> Result<()> {
        self.send(&protocol::frame(
            Opcode::MoveFile,
            &[old_kind as u8, old_id, new_kind as u8, new_id],
        ))
        .await
    }

    /// Dumps the complete 16 KB filesystem image (FE 30).
    pub async fn dump_filesystem(&mut self) -> Result<Vec<u8>> {
        self.send(&protocol::frame(Opcode::DumpFilesystem, &[]))
            .await?;
        self.read_sized().await
    }

    /// Filesystem image upload needs the file transfer protocol, which this
    /// driver does not speak.
    pub fn upload_filesystem(&mut self, _image: &[u8]) -> Result<()> {
        Err(Error::Unsupported("filesystem image upload"))
    }

    // --- Security ---

    /// Chooses whether setting commands persist across power cycles
    /// (FE 93).
    pub async fn set_remember(&mut self, on: bool) -> Result<()> {
        self.send(&protocol::frame(Opcode::Remember, &[on as u8]))
            .await
    }

    /// Sets the lock-level bits (FE CA F5 A0).
    pub async fn set_lock_level(&mut self, level: u8) -> Result<()> {
        self.send(&protocol::frame_seq(&protocol::SEQ_LOCK_LEVEL, &[level]))
            .await
    }

    /// Sets and stores the power-up lock-level bits (FE CB F5 A0).
    pub async fn set_default_lock_level(&mut self, level: u8) -> Result<()> {
        self.send(&protocol::frame_seq(
            &protocol::SEQ_DEFAULT_LOCK_LEVEL,
            &[level],
        ))
        .await
    }

    /// Writes the 16-byte customer data area (FE 34).
    pub async fn write_customer_data(&mut self, data: &[u8; 16]) -> Result<()> {
        let frame = protocol::build_write_customer_data(data)?;
        self.send(&frame).await
    }

    /// Reads the 16-byte customer data area (FE 35).
    pub async fn read_customer_data(&mut self) -> Result<[u8; 16]> {
        self.send(&protocol::frame(Opcode::ReadCustomerData, &[]))
            .await?;
        let mut data = [0u8; 16];
        self.read_response(&mut data).await?;
        Ok(data)
    }

    // --- Identification ---

    /// Reads the firmware revision (FE 36).
    pub async fn firmware_version(&mut self) -> Result<FirmwareVersion> {
        self.send(&protocol::frame(Opcode::FirmwareVersion, &[]))
            .await?;
        let mut raw = [0u8; 1];
        self.read_response(&mut raw).await?;
        Ok(FirmwareVersion(raw[0]))
    }

    /// Reads the module type (FE 37).
    pub async fn module_type(&mut self) -> Result<ModuleType> {
        self.send(&protocol::frame(Opcode::ModuleType, &[]))
            .await?;
        let mut raw = [0u8; 1];
        self.read_response(&mut raw).await?;
        ModuleType::from_byte(raw[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypad::Key;
    use tokio::io::duplex;

    fn glk_pair() -> (Glk<tokio::io::DuplexStream>, tokio::io::DuplexStream) {
        let (near, far) = duplex(1024);
        (Glk::with_transport(near, Duration::from_millis(50)), far)
    }

    async fn sent_bytes(far: &mut tokio::io::DuplexStream, n: usize) -> Vec<u8> {
        let mut buf = vec![0u8; n];
        far.read_exact(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn test_clear_screen_frame() {
        let (mut glk, mut far) = glk_pair();
        glk.clear_screen().await.unwrap();
        assert_eq!(sent_bytes(&mut far, 2).await, [0xFE, 0x58]);
    }

    #[tokio::test]
    async fn test_brightness_frame() {
        let (mut glk, mut far) = glk_pair();
        glk.set_brightness(128).await.unwrap();
        assert_eq!(sent_bytes(&mut far, 3).await, [0xFE, 0x99, 0x80]);
    }

    #[tokio::test]
    async fn test_text_sent_raw() {
        let (mut glk, mut far) = glk_pair();
        glk.write_text("HELLO").await.unwrap();
        assert_eq!(sent_bytes(&mut far, 5).await, b"HELLO");
        assert!(matches!(glk.write_text("héllo").await, Err(Error::NotAscii)));
    }

    #[tokio::test]
    async fn test_led_maps_to_gpo_pair() {
        let (mut glk, mut far) = glk_pair();
        glk.set_led(2, LedColor::Red).await.unwrap();
        // LED 2 is GPOs 3 (off) and 4 (on)
        assert_eq!(
            sent_bytes(&mut far, 6).await,
            [0xFE, 0x56, 3, 0xFE, 0x57, 4]
        );
        assert!(glk.set_led(4, LedColor::Off).await.is_err());
    }

    #[tokio::test]
    async fn test_backlight_range() {
        let (mut glk, mut far) = glk_pair();
        glk.backlight_on(90).await.unwrap();
        assert_eq!(sent_bytes(&mut far, 3).await, [0xFE, 0x42, 90]);
        assert!(matches!(
            glk.backlight_on(91).await,
            Err(Error::OutOfRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_poll_key_response() {
        let (mut glk, mut far) = glk_pair();
        far.write_all(&[0x42]).await.unwrap();
        let activity = glk.poll_key().await.unwrap().unwrap();
        assert_eq!(activity.key, Key::Up);
        assert!(activity.pressed);
        assert_eq!(sent_bytes(&mut far, 2).await, [0xFE, 0x26]);
    }

    #[tokio::test]
    async fn test_drain_keys_follows_more_flag() {
        let (mut glk, mut far) = glk_pair();
        // center press with more buffered, then center release, buffer end
        far.write_all(&[0x45 | 0x80, 0x65]).await.unwrap();
        let activities = glk.drain_keys().await.unwrap();
        assert_eq!(activities.len(), 2);
        assert!(activities[0].pressed);
        assert!(!activities[1].pressed);
    }

    #[tokio::test]
    async fn test_firmware_version_response() {
        let (mut glk, mut far) = glk_pair();
        far.write_all(&[0x19]).await.unwrap();
        let version = glk.firmware_version().await.unwrap();
        assert_eq!(version.to_string(), "1.9");
        assert_eq!(sent_bytes(&mut far, 2).await, [0xFE, 0x36]);
    }

    #[tokio::test]
    async fn test_module_type_response() {
        let (mut glk, mut far) = glk_pair();
        far.write_all(&[0x2A]).await.unwrap();
        let module = glk.module_type().await.unwrap();
        assert_eq!(module, ModuleType::Glk19264_7T_1U);
        assert!(module.is_graphic());
    }

    #[tokio::test]
    async fn test_free_space_response() {
        let (mut glk, mut far) = glk_pair();
        far.write_all(&[0x00, 0x40, 0x00, 0x00]).await.unwrap();
        assert_eq!(glk.free_space().await.unwrap(), 16_384);
    }

    #[tokio::test]
    async fn test_list_directory_response() {
        let (mut glk, mut far) = glk_pair();
        far.write_all(&[2, 0x01, 0x02, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00])
            .await
            .unwrap();
        let entries = glk.list_directory().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, FileKind::Font);
        assert_eq!(entries[0].id, 2);
        assert_eq!(entries[0].size, 16);
    }

    #[tokio::test]
    async fn test_download_file_response() {
        let (mut glk, mut far) = glk_pair();
        far.write_all(&[3, 0, 0, 0, 0xAA, 0xBB, 0xCC]).await.unwrap();
        let payload = glk.download_file(FileKind::Bitmap, 1).await.unwrap();
        assert_eq!(payload, [0xAA, 0xBB, 0xCC]);
        assert_eq!(sent_bytes(&mut far, 4).await, [0xFE, 0xB2, 0x01, 0x01]);
    }

    #[tokio::test]
    async fn test_oversized_payload_rejected() {
        let (mut glk, mut far) = glk_pair();
        // size prefix far beyond the 16 KB filesystem
        far.write_all(&[0xFF, 0xFF, 0xFF, 0xFF]).await.unwrap();
        assert!(matches!(
            glk.download_file(FileKind::Font, 0).await,
            Err(Error::BadLength {
                what: "sized response",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_drain_keys_bounded_by_buffer_size() {
        let (mut glk, mut far) = glk_pair();
        // a stuck device that always flags more activity
        far.write_all(&[0x42 | 0x80; 16]).await.unwrap();
        let activities = glk.drain_keys().await.unwrap();
        assert_eq!(activities.len(), crate::keypad::KEY_BUFFER_SIZE);
    }

    #[tokio::test]
    async fn test_missing_response_times_out() {
        let (mut glk, _far) = glk_pair();
        // _far stays open but silent
        assert!(matches!(
            glk.firmware_version().await,
            Err(Error::Timeout { expected: 1 })
        ));
    }

    #[tokio::test]
    async fn test_short_response_times_out() {
        let (mut glk, mut far) = glk_pair();
        far.write_all(&[0x00, 0x40]).await.unwrap();
        assert!(matches!(
            glk.free_space().await,
            Err(Error::Timeout { expected: 4 })
        ));
    }

    #[tokio::test]
    async fn test_write_failure_surfaces_io_error() {
        let (mut glk, far) = glk_pair();
        drop(far);
        assert!(matches!(glk.clear_screen().await, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_uploads_unsupported() {
        let (mut glk, _far) = glk_pair();
        assert!(matches!(
            glk.upload_font(1, &[]),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            glk.upload_bitmap(1, &[]),
            Err(Error::Unsupported(_))
        ));
        assert!(matches!(
            glk.upload_filesystem(&[]),
            Err(Error::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_wipe_filesystem_sequence() {
        let (mut glk, mut far) = glk_pair();
        glk.wipe_filesystem().await.unwrap();
        assert_eq!(sent_bytes(&mut far, 4).await, [0xFE, 0x21, 0x59, 0x21]);
    }
}
