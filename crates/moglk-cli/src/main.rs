//! GLK Display Control Tool
//!
//! CLI for driving a Matrix Orbital GLK-series display over its serial
//! port.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use moglk_hw::{BarGraphStyle, BaudRate, FileKind, Glk, LedColor, ShiftDirection};
use std::time::Duration;
use tokio_serial::SerialStream;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::Config;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliLedColor {
    Off,
    Green,
    Red,
    Yellow,
}

impl From<CliLedColor> for LedColor {
    fn from(color: CliLedColor) -> Self {
        match color {
            CliLedColor::Off => LedColor::Off,
            CliLedColor::Green => LedColor::Green,
            CliLedColor::Red => LedColor::Red,
            CliLedColor::Yellow => LedColor::Yellow,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliBarStyle {
    BottomUp,
    LeftRight,
    TopDown,
    RightLeft,
}

impl From<CliBarStyle> for BarGraphStyle {
    fn from(style: CliBarStyle) -> Self {
        match style {
            CliBarStyle::BottomUp => BarGraphStyle::VerticalFromBottom,
            CliBarStyle::LeftRight => BarGraphStyle::HorizontalFromLeft,
            CliBarStyle::TopDown => BarGraphStyle::VerticalFromTop,
            CliBarStyle::RightLeft => BarGraphStyle::HorizontalFromRight,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliFileKind {
    Font,
    Bitmap,
}

impl From<CliFileKind> for FileKind {
    fn from(kind: CliFileKind) -> Self {
        match kind {
            CliFileKind::Font => FileKind::Font,
            CliFileKind::Bitmap => FileKind::Bitmap,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum Switch {
    On,
    Off,
}

impl Switch {
    fn is_on(self) -> bool {
        matches!(self, Switch::On)
    }
}

#[derive(Parser)]
#[command(name = "moglkctl")]
#[command(about = "Control tool for Matrix Orbital GLK-series displays")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Serial port path (overrides the config file)
    #[arg(long)]
    port: Option<String>,

    /// Baud rate (overrides the config file)
    #[arg(long)]
    baud: Option<u32>,

    /// Response timeout in milliseconds (overrides the config file)
    #[arg(long)]
    timeout: Option<u64>,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen and backlight commands
    Screen {
        #[command(subcommand)]
        action: ScreenCommands,
    },
    /// Text and cursor commands
    Text {
        #[command(subcommand)]
        action: TextCommands,
    },
    /// Drawing commands
    Draw {
        #[command(subcommand)]
        action: DrawCommands,
    },
    /// General-purpose output commands
    Gpo {
        #[command(subcommand)]
        action: GpoCommands,
    },
    /// Tricolor LED commands
    Led {
        /// LED number (1-3)
        num: u8,
        /// Color to show
        color: CliLedColor,
    },
    /// Keypad commands
    Key {
        #[command(subcommand)]
        action: KeyCommands,
    },
    /// Onboard filesystem commands
    Fs {
        #[command(subcommand)]
        action: FsCommands,
    },
    /// Show module type and firmware version
    Info,
}

#[derive(Subcommand)]
enum ScreenCommands {
    /// Clear the screen
    Clear,
    /// Turn the backlight on
    On {
        /// Minutes before it turns back off (0 = stay on)
        #[arg(default_value = "0")]
        minutes: u8,
    },
    /// Turn the backlight off
    Off,
    /// Set backlight brightness
    Brightness {
        /// Brightness (0-255)
        value: u8,
        /// Also store as the power-up default
        #[arg(long)]
        save: bool,
    },
    /// Set contrast
    Contrast {
        /// Contrast (0-255, default 128)
        value: u8,
        /// Also store as the power-up default
        #[arg(long)]
        save: bool,
    },
    /// Switch the module to another baud rate
    Baud {
        /// Speed in bits per second (9600-115200)
        speed: u32,
    },
}

#[derive(Subcommand)]
enum TextCommands {
    /// Write text at the cursor
    Write {
        /// ASCII text to display
        text: String,
    },
    /// Move the cursor to the top-left
    Home,
    /// Move the cursor to a character cell
    Position {
        /// Column (font-derived)
        col: u8,
        /// Row (font-derived)
        row: u8,
    },
    /// Move the cursor to a pixel coordinate
    Coords {
        /// X (0-191)
        x: u8,
        /// Y (0-63)
        y: u8,
    },
    /// Turn auto-scroll on or off
    Autoscroll { state: Switch },
    /// Select an onboard font
    Font {
        /// Font id
        id: u8,
    },
}

#[derive(Subcommand)]
enum DrawCommands {
    /// Set the drawing color (0 = white, 1-255 = black)
    Color { value: u8 },
    /// Draw one pixel
    Pixel { x: u8, y: u8 },
    /// Draw a line
    Line { x1: u8, y1: u8, x2: u8, y2: u8 },
    /// Draw a rectangle
    Rect {
        color: u8,
        x1: u8,
        y1: u8,
        x2: u8,
        y2: u8,
        /// Fill the rectangle
        #[arg(long)]
        solid: bool,
    },
    /// Define a bar graph
    BarInit {
        /// Bar graph id (0-15)
        id: u8,
        /// Fill direction
        style: CliBarStyle,
        x1: u8,
        y1: u8,
        x2: u8,
        y2: u8,
    },
    /// Draw a bar graph at a value
    Bar {
        /// Bar graph id (0-15)
        id: u8,
        /// Value in pixels
        value: u8,
    },
    /// Define a strip chart
    ChartInit {
        /// Strip chart id (0-6)
        id: u8,
        /// X extents must be multiples of 8
        x1: u8,
        y1: u8,
        x2: u8,
        y2: u8,
    },
    /// Shift a strip chart
    ChartShift {
        /// Strip chart id (0-6)
        id: u8,
        /// Shift right instead of left
        #[arg(long)]
        right: bool,
    },
}

#[derive(Subcommand)]
enum GpoCommands {
    /// Turn a GPO on
    On {
        /// GPO number (1-6)
        num: u8,
    },
    /// Turn a GPO off
    Off {
        /// GPO number (1-6)
        num: u8,
    },
    /// Set the state a GPO powers up in
    Startup {
        /// GPO number (1-6)
        num: u8,
        state: Switch,
    },
}

#[derive(Subcommand)]
enum KeyCommands {
    /// Poll the key buffer once
    Poll,
    /// Drain all buffered key activity
    Drain,
    /// Clear the key buffer
    Clear,
    /// Turn key auto-transmit on or off
    Autotransmit { state: Switch },
    /// Set the debounce time (6.554 ms increments)
    Debounce { time: u8 },
}

#[derive(Subcommand)]
enum FsCommands {
    /// Show free space
    Space,
    /// List stored files
    List,
    /// Delete a file
    Delete {
        kind: CliFileKind,
        /// File id (0-127)
        id: u8,
    },
    /// Renumber a file
    Move {
        old_kind: CliFileKind,
        old_id: u8,
        new_kind: CliFileKind,
        new_id: u8,
    },
    /// Download a file's contents
    Download {
        kind: CliFileKind,
        id: u8,
        /// Output file path
        output: String,
    },
    /// Dump the complete filesystem image
    Dump {
        /// Output file path (default: fs.img)
        #[arg(default_value = "fs.img")]
        output: String,
    },
    /// Erase the filesystem
    Wipe {
        /// Confirm the wipe
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(baud) = cli.baud {
        config.baud = baud;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_ms = timeout;
    }
    debug!(
        "using {} at {} baud, {} ms timeout",
        config.port, config.baud, config.timeout_ms
    );

    let mut glk = Glk::open(&config.port, config.baud)
        .with_context(|| format!("Failed to open display at {}", config.port))?;
    glk.set_read_timeout(Duration::from_millis(config.timeout_ms));

    match cli.command {
        Commands::Screen { action } => handle_screen(action, &mut glk).await,
        Commands::Text { action } => handle_text(action, &mut glk).await,
        Commands::Draw { action } => handle_draw(action, &mut glk).await,
        Commands::Gpo { action } => handle_gpo(action, &mut glk).await,
        Commands::Led { num, color } => {
            glk.set_led(num, color.into()).await?;
            println!("LED {} set to {:?}", num, color);
            Ok(())
        }
        Commands::Key { action } => handle_key(action, &mut glk).await,
        Commands::Fs { action } => handle_fs(action, &mut glk).await,
        Commands::Info => handle_info(&mut glk).await,
    }
}

async fn handle_screen(action: ScreenCommands, glk: &mut Glk<SerialStream>) -> Result<()> {
    match action {
        ScreenCommands::Clear => {
            glk.clear_screen().await?;
            println!("Screen cleared");
        }
        ScreenCommands::On { minutes } => {
            glk.backlight_on(minutes).await?;
            if minutes == 0 {
                println!("Backlight on");
            } else {
                println!("Backlight on for {} minute(s)", minutes);
            }
        }
        ScreenCommands::Off => {
            glk.backlight_off().await?;
            println!("Backlight off");
        }
        ScreenCommands::Brightness { value, save } => {
            if save {
                glk.set_default_brightness(value).await?;
            } else {
                glk.set_brightness(value).await?;
            }
            println!("Brightness set to {}", value);
        }
        ScreenCommands::Contrast { value, save } => {
            if save {
                glk.set_default_contrast(value).await?;
            } else {
                glk.set_contrast(value).await?;
            }
            println!("Contrast set to {}", value);
        }
        ScreenCommands::Baud { speed } => {
            let rate = BaudRate::from_speed(speed).with_context(|| {
                format!("Unsupported baud rate: {} (9600-115200 standard speeds)", speed)
            })?;
            glk.set_baud_rate(rate).await?;
            println!("Module switched to {} baud; reconnect with --baud {}", speed, speed);
        }
    }

    Ok(())
}

async fn handle_text(action: TextCommands, glk: &mut Glk<SerialStream>) -> Result<()> {
    match action {
        TextCommands::Write { text } => {
            glk.write_text(&text).await?;
            println!("Wrote {} byte(s)", text.len());
        }
        TextCommands::Home => {
            glk.cursor_home().await?;
            println!("Cursor homed");
        }
        TextCommands::Position { col, row } => {
            glk.set_cursor_position(col, row).await?;
            println!("Cursor at column {}, row {}", col, row);
        }
        TextCommands::Coords { x, y } => {
            glk.set_cursor_coordinates(x, y).await?;
            println!("Cursor at ({}, {})", x, y);
        }
        TextCommands::Autoscroll { state } => {
            glk.set_auto_scroll(state.is_on()).await?;
            println!("Auto-scroll {:?}", state);
        }
        TextCommands::Font { id } => {
            glk.use_font(id).await?;
            println!("Using font {}", id);
        }
    }

    Ok(())
}

async fn handle_draw(action: DrawCommands, glk: &mut Glk<SerialStream>) -> Result<()> {
    match action {
        DrawCommands::Color { value } => {
            glk.set_drawing_color(value).await?;
            println!("Drawing color set to {}", value);
        }
        DrawCommands::Pixel { x, y } => {
            glk.draw_pixel(x, y).await?;
        }
        DrawCommands::Line { x1, y1, x2, y2 } => {
            glk.draw_line(x1, y1, x2, y2).await?;
        }
        DrawCommands::Rect {
            color,
            x1,
            y1,
            x2,
            y2,
            solid,
        } => {
            if solid {
                glk.draw_solid_rect(color, x1, y1, x2, y2).await?;
            } else {
                glk.draw_rect(color, x1, y1, x2, y2).await?;
            }
        }
        DrawCommands::BarInit {
            id,
            style,
            x1,
            y1,
            x2,
            y2,
        } => {
            glk.init_bar_graph(id, style.into(), x1, y1, x2, y2).await?;
            println!("Bar graph {} defined", id);
        }
        DrawCommands::Bar { id, value } => {
            glk.draw_bar_graph(id, value).await?;
        }
        DrawCommands::ChartInit { id, x1, y1, x2, y2 } => {
            glk.init_strip_chart(id, x1, y1, x2, y2).await?;
            println!("Strip chart {} defined", id);
        }
        DrawCommands::ChartShift { id, right } => {
            let direction = if right {
                ShiftDirection::Right
            } else {
                ShiftDirection::Left
            };
            glk.shift_strip_chart(id, direction).await?;
        }
    }

    Ok(())
}

async fn handle_gpo(action: GpoCommands, glk: &mut Glk<SerialStream>) -> Result<()> {
    match action {
        GpoCommands::On { num } => {
            glk.set_gpo(num, true).await?;
            println!("GPO {} on", num);
        }
        GpoCommands::Off { num } => {
            glk.set_gpo(num, false).await?;
            println!("GPO {} off", num);
        }
        GpoCommands::Startup { num, state } => {
            glk.set_startup_gpo_state(num, state.is_on()).await?;
            println!("GPO {} will power up {:?}", num, state);
        }
    }

    Ok(())
}

async fn handle_key(action: KeyCommands, glk: &mut Glk<SerialStream>) -> Result<()> {
    match action {
        KeyCommands::Poll => match glk.poll_key().await? {
            Some(activity) => {
                println!(
                    "{:?} {}",
                    activity.key,
                    if activity.pressed { "pressed" } else { "released" }
                );
            }
            None => println!("No key activity buffered"),
        },
        KeyCommands::Drain => {
            let activities = glk.drain_keys().await?;
            if activities.is_empty() {
                println!("No key activity buffered");
            }
            for activity in activities {
                println!(
                    "{:?} {}",
                    activity.key,
                    if activity.pressed { "pressed" } else { "released" }
                );
            }
        }
        KeyCommands::Clear => {
            glk.clear_key_buffer().await?;
            println!("Key buffer cleared");
        }
        KeyCommands::Autotransmit { state } => {
            glk.set_key_auto_transmit(state.is_on()).await?;
            println!("Key auto-transmit {:?}", state);
        }
        KeyCommands::Debounce { time } => {
            glk.set_debounce_time(time).await?;
            println!("Debounce time set to {} ({}ms)", time, time as f32 * 6.554);
        }
    }

    Ok(())
}

async fn handle_fs(action: FsCommands, glk: &mut Glk<SerialStream>) -> Result<()> {
    match action {
        FsCommands::Space => {
            let free = glk.free_space().await?;
            println!("Free space: {} bytes", free);
        }
        FsCommands::List => {
            let entries = glk.list_directory().await?;
            if entries.is_empty() {
                println!("Filesystem is empty");
            }
            for entry in entries {
                println!("{:?} {}: {} bytes", entry.kind, entry.id, entry.size);
            }
        }
        FsCommands::Delete { kind, id } => {
            glk.delete_file(kind.into(), id).await?;
            println!("Deleted {:?} {}; power-cycle the module to be safe", kind, id);
        }
        FsCommands::Move {
            old_kind,
            old_id,
            new_kind,
            new_id,
        } => {
            glk.move_file(old_kind.into(), old_id, new_kind.into(), new_id)
                .await?;
            println!("Moved {:?} {} to {:?} {}", old_kind, old_id, new_kind, new_id);
        }
        FsCommands::Download { kind, id, output } => {
            let payload = glk.download_file(kind.into(), id).await?;
            std::fs::write(&output, &payload).context("Failed to write output file")?;
            println!("Saved {} bytes to {}", payload.len(), output);
        }
        FsCommands::Dump { output } => {
            let image = glk.dump_filesystem().await?;
            std::fs::write(&output, &image).context("Failed to write output file")?;
            println!("Saved {} bytes to {}", image.len(), output);
        }
        FsCommands::Wipe { force } => {
            if !force {
                anyhow::bail!("Refusing to wipe the filesystem without --force");
            }
            glk.wipe_filesystem().await?;
            println!("Filesystem wiped; power-cycle the module to be safe");
        }
    }

    Ok(())
}

async fn handle_info(glk: &mut Glk<SerialStream>) -> Result<()> {
    let module = glk.module_type().await?;
    let version = glk.firmware_version().await?;
    println!("Module: {:?}", module);
    println!("Firmware: {}", version);
    println!("Graphic commands: {}", if module.is_graphic() { "yes" } else { "no" });
    Ok(())
}
