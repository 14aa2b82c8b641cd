use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use argh::FromArgs;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use tokio::net::{lookup_host, TcpStream};
use tracing::{info, warn};

use ookvnc::{
    Credentials, DecoderRegistry, Encoding, Framebuffer, InputSender, PixelFormat, Rect,
    VncConnector, VncError, VncSession,
};

const DEFAULT_PORT: u16 = 5901;
const NET_TICK: Duration = Duration::from_millis(100);

#[derive(FromArgs)]
#[argh(description = "A VNC (RFB 3.3) client")]
struct Args {
    /// TCP port to connect with
    #[argh(option, short = 'p', default = "DEFAULT_PORT")]
    port: u16,

    /// VNC authentication password
    #[argh(option, short = 'a')]
    password: Option<String>,

    /// enable diagnostic output on standard error
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// disable a particular encoding by name
    /// (hextile, corre, rre, zrle, copyrect, zlib)
    #[argh(option, short = 'd')]
    disable: Vec<String>,

    /// VNC server host name
    #[argh(positional)]
    hostname: String,
}

/// Pixel store shared between the network task (writing) and the UI
/// loop (presenting). One u32 per pixel in 0RGB order, which is both
/// what minifb wants and what the session's rgb888 format produces.
struct Shared {
    buffer: Mutex<Vec<u32>>,
    width: usize,
    height: usize,
    dirty: AtomicBool,
    bell: AtomicBool,
}

struct ViewerFramebuffer {
    shared: Arc<Shared>,
    format: PixelFormat,
}

impl Framebuffer for ViewerFramebuffer {
    fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    fn begin_drawing(&mut self) {}

    fn end_drawing(&mut self, _rect: Rect) {
        self.shared.dirty.store(true, Ordering::Release);
    }

    fn write_pixels(&mut self, x: u16, y: u16, count: usize, data: &[u8]) {
        let (x, y) = (x as usize, y as usize);
        if y >= self.shared.height || x >= self.shared.width {
            return;
        }
        let count = count.min(self.shared.width - x);
        let mut buffer = self.shared.buffer.lock().unwrap();
        let row = y * self.shared.width + x;
        for (i, chunk) in data.chunks_exact(4).take(count).enumerate() {
            buffer[row + i] = u32::from_le_bytes(chunk.try_into().unwrap()) & 0x00ff_ffff;
        }
    }

    fn write_uniform_pixels(&mut self, x: u16, y: u16, count: usize, pixel: u32) {
        let (x, y) = (x as usize, y as usize);
        if y >= self.shared.height || x >= self.shared.width {
            return;
        }
        let count = count.min(self.shared.width - x);
        let mut buffer = self.shared.buffer.lock().unwrap();
        let row = y * self.shared.width + x;
        buffer[row..row + count].fill(pixel & 0x00ff_ffff);
    }

    fn copy_pixels(&mut self, sx: u16, sy: u16, dx: u16, dy: u16, w: u16, h: u16) {
        let (sx, sy) = (sx as usize, sy as usize);
        let (dx, dy) = (dx as usize, dy as usize);
        let (width, height) = (self.shared.width, self.shared.height);
        if sx >= width || dx >= width || sy >= height || dy >= height {
            return;
        }
        let w = (w as usize).min(width - sx).min(width - dx);
        let h = (h as usize).min(height - sy).min(height - dy);

        let mut buffer = self.shared.buffer.lock().unwrap();
        let copy_row = |buffer: &mut Vec<u32>, row: usize| {
            let src = (sy + row) * width + sx;
            let dst = (dy + row) * width + dx;
            buffer.copy_within(src..src + w, dst);
        };
        // Overlap-safe row order.
        if sy > dy {
            for row in 0..h {
                copy_row(&mut buffer, row);
            }
        } else {
            for row in (0..h).rev() {
                copy_row(&mut buffer, row);
            }
        }
    }

    fn bell(&mut self) {
        self.shared.bell.store(true, Ordering::Release);
    }
}

fn build_registry(disable: &[String]) -> Result<DecoderRegistry> {
    let mut registry = DecoderRegistry::all();
    for name in disable {
        match name.to_ascii_lowercase().as_str() {
            "hextile" => registry.disable(Encoding::Hextile),
            "corre" => registry.disable(Encoding::CoRre),
            "rre" => registry.disable(Encoding::Rre),
            "copyrect" => registry.disable(Encoding::CopyRect),
            "zlib" => registry.disable(Encoding::Zlib),
            // ZRLE is not built; accepting the name keeps old command
            // lines working.
            "zrle" => {}
            other => return Err(anyhow!("unknown encoding name '{other}'")),
        }
    }
    Ok(registry)
}

async fn connect(hostname: &str, port: u16) -> Result<TcpStream, VncError> {
    let mut addrs = lookup_host((hostname, port))
        .await
        .map_err(VncError::Resolve)?;
    let addr = addrs.next().ok_or_else(|| {
        VncError::Resolve(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "host name resolved to no addresses",
        ))
    })?;
    TcpStream::connect(addr).await.map_err(VncError::Connect)
}

/// Network context: drives the session until quit is set or the
/// connection dies. Returns the decoder statistics on a clean exit.
async fn network_loop(
    mut session: VncSession<TcpStream>,
    mut fb: ViewerFramebuffer,
    quit: Arc<AtomicBool>,
) -> Result<Vec<(Encoding, u64)>, VncError> {
    let result = async {
        while !quit.load(Ordering::Relaxed) {
            session.process(NET_TICK, &mut fb).await?;
        }
        Ok(())
    }
    .await;
    quit.store(true, Ordering::Relaxed);
    let stats = session.decoder_stats();
    let _ = session.close().await;
    result.map(|()| stats)
}

/// UI context: owns the window, presents the shared buffer and
/// forwards input. Returns when the user quits or the network side
/// sets the quit flag.
fn ui_loop(
    window: &mut Window,
    shared: &Shared,
    sender: &InputSender<TcpStream>,
    quit: &AtomicBool,
    runtime: &tokio::runtime::Handle,
) {
    let mut mouse_buttons = 0u8;
    let mut mouse_pos = (0u16, 0u16);
    let mut cursor_visible = true;

    while window.is_open() && !quit.load(Ordering::Relaxed) {
        if shared.dirty.swap(false, Ordering::Acquire) {
            let buffer = shared.buffer.lock().unwrap();
            let _ = window.update_with_buffer(&buffer, shared.width, shared.height);
        } else {
            window.update();
        }

        if shared.bell.swap(false, Ordering::Acquire) {
            // The closest a terminal gets to "Ding!".
            eprint!("\x07");
        }

        let combo = window.is_key_down(Key::LeftShift) && window.is_key_down(Key::LeftCtrl);
        let shift = window.is_key_down(Key::LeftShift) || window.is_key_down(Key::RightShift);

        for key in window.get_keys_pressed(KeyRepeat::Yes) {
            if combo {
                // Local shortcuts; never forwarded.
                match key {
                    Key::Escape => quit.store(true, Ordering::Relaxed),
                    Key::C => {
                        cursor_visible = !cursor_visible;
                        window.set_cursor_visibility(cursor_visible);
                    }
                    Key::F => warn!("fullscreen toggling is not supported by this window"),
                    _ => {}
                }
                continue;
            }
            if let Some(keysym) = keysym_for(key, shift) {
                let _ = runtime.block_on(sender.key_event(keysym, true));
            }
        }
        for key in window.get_keys_released() {
            if let Some(keysym) = keysym_for(key, shift) {
                let _ = runtime.block_on(sender.key_event(keysym, false));
            }
        }

        if let Some((x, y)) = window.get_mouse_pos(MouseMode::Clamp) {
            let mut buttons = 0u8;
            if window.get_mouse_down(MouseButton::Left) {
                buttons |= 1;
            }
            if window.get_mouse_down(MouseButton::Middle) {
                buttons |= 2;
            }
            if window.get_mouse_down(MouseButton::Right) {
                buttons |= 4;
            }
            let pos = (x as u16, y as u16);
            if pos != mouse_pos || buttons != mouse_buttons {
                let _ = runtime.block_on(sender.pointer_event(pos.0, pos.1, buttons));
                mouse_pos = pos;
                mouse_buttons = buttons;
            }

            if let Some((_, scroll_y)) = window.get_scroll_wheel() {
                if scroll_y != 0.0 {
                    // Wheel is a press of button 4 (up) or 5 (down)
                    // followed by an immediate release.
                    let wheel = if scroll_y > 0.0 { 8 } else { 16 };
                    let _ = runtime.block_on(sender.pointer_event(pos.0, pos.1, wheel));
                    let _ = runtime.block_on(sender.pointer_event(pos.0, pos.1, mouse_buttons));
                }
            }
        }
    }
    quit.store(true, Ordering::Relaxed);
}

async fn run(args: Args) -> Result<()> {
    let registry = build_registry(&args.disable)?;
    if args.verbose {
        info!("supported encodings:");
        for encoding in registry.encodings() {
            info!("    {}", encoding.description());
        }
    }

    info!(host = %args.hostname, port = args.port, "connecting");
    let tcp = connect(&args.hostname, args.port).await?;

    let credentials = match args.password {
        Some(password) => Credentials::password(password),
        None => Credentials::none(),
    };
    let mut session = VncConnector::new(tcp)
        .set_credentials(credentials)
        .allow_shared(true)
        .set_registry(registry)
        .build()
        .try_start()
        .await?
        .finish()?;

    let screen = session.screen();
    let format = session.pixel_format();
    info!(
        desktop = %session.desktop_name(),
        width = screen.width,
        height = screen.height,
        bits = format.depth,
        big_endian = format.big_endian,
        "native desktop format"
    );

    let shared = Arc::new(Shared {
        buffer: Mutex::new(vec![0; screen.width as usize * screen.height as usize]),
        width: screen.width as usize,
        height: screen.height as usize,
        dirty: AtomicBool::new(false),
        bell: AtomicBool::new(false),
    });
    let fb = ViewerFramebuffer {
        shared: Arc::clone(&shared),
        format: PixelFormat::rgb888(),
    };
    session.attach_framebuffer(&fb).await?;

    let mut window = Window::new(
        session.desktop_name(),
        screen.width as usize,
        screen.height as usize,
        WindowOptions::default(),
    )
    .with_context(|| "unable to create window")?;
    window.set_target_fps(60);

    let sender = session.input_sender();
    let quit = Arc::new(AtomicBool::new(false));
    let net = tokio::spawn(network_loop(session, fb, Arc::clone(&quit)));

    let runtime = tokio::runtime::Handle::current();
    let ui_quit = Arc::clone(&quit);
    tokio::task::block_in_place(|| ui_loop(&mut window, &shared, &sender, &ui_quit, &runtime));

    quit.store(true, Ordering::Relaxed);
    let stats = net.await.context("network task panicked")??;
    if args.verbose {
        info!("decoder usage statistics:");
        for (encoding, processed) in stats {
            info!("    {} {} rectangles", processed, encoding.name());
        }
    }
    info!("client is exiting normally");
    Ok(())
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let args: Args = argh::from_env();

    let level = if args.verbose { "trace" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Flagrant VNC error: {error:#}");
            ExitCode::FAILURE
        }
    }
}


/// Translates a minifb key to an X11 keysym, applying the shift
/// modifier to printable characters (keysyms for Latin-1 equal the
/// character codes, so shifted punctuation is just the shifted char).
fn keysym_for(key: Key, shift: bool) -> Option<u32> {
    let ch = |plain: char, shifted: char| -> Option<u32> {
        Some(if shift { shifted as u32 } else { plain as u32 })
    };
    match key {
        Key::Key0 => ch('0', ')'),
        Key::Key1 => ch('1', '!'),
        Key::Key2 => ch('2', '@'),
        Key::Key3 => ch('3', '#'),
        Key::Key4 => ch('4', '$'),
        Key::Key5 => ch('5', '%'),
        Key::Key6 => ch('6', '^'),
        Key::Key7 => ch('7', '&'),
        Key::Key8 => ch('8', '*'),
        Key::Key9 => ch('9', '('),

        Key::A => ch('a', 'A'),
        Key::B => ch('b', 'B'),
        Key::C => ch('c', 'C'),
        Key::D => ch('d', 'D'),
        Key::E => ch('e', 'E'),
        Key::F => ch('f', 'F'),
        Key::G => ch('g', 'G'),
        Key::H => ch('h', 'H'),
        Key::I => ch('i', 'I'),
        Key::J => ch('j', 'J'),
        Key::K => ch('k', 'K'),
        Key::L => ch('l', 'L'),
        Key::M => ch('m', 'M'),
        Key::N => ch('n', 'N'),
        Key::O => ch('o', 'O'),
        Key::P => ch('p', 'P'),
        Key::Q => ch('q', 'Q'),
        Key::R => ch('r', 'R'),
        Key::S => ch('s', 'S'),
        Key::T => ch('t', 'T'),
        Key::U => ch('u', 'U'),
        Key::V => ch('v', 'V'),
        Key::W => ch('w', 'W'),
        Key::X => ch('x', 'X'),
        Key::Y => ch('y', 'Y'),
        Key::Z => ch('z', 'Z'),

        Key::Apostrophe => ch('\'', '"'),
        Key::Backquote => ch('`', '~'),
        Key::Backslash => ch('\\', '|'),
        Key::Comma => ch(',', '<'),
        Key::Equal => ch('=', '+'),
        Key::LeftBracket => ch('[', '{'),
        Key::Minus => ch('-', '_'),
        Key::Period => ch('.', '>'),
        Key::RightBracket => ch(']', '}'),
        Key::Semicolon => ch(';', ':'),
        Key::Slash => ch('/', '?'),
        Key::Space => Some(0x020),

        Key::F1 => Some(0xffbe),
        Key::F2 => Some(0xffbf),
        Key::F3 => Some(0xffc0),
        Key::F4 => Some(0xffc1),
        Key::F5 => Some(0xffc2),
        Key::F6 => Some(0xffc3),
        Key::F7 => Some(0xffc4),
        Key::F8 => Some(0xffc5),
        Key::F9 => Some(0xffc6),
        Key::F10 => Some(0xffc7),
        Key::F11 => Some(0xffc8),
        Key::F12 => Some(0xffc9),
        Key::F13 => Some(0xffca),
        Key::F14 => Some(0xffcb),
        Key::F15 => Some(0xffcc),

        Key::Down => Some(0xff54),
        Key::Left => Some(0xff51),
        Key::Right => Some(0xff53),
        Key::Up => Some(0xff52),

        Key::Backspace => Some(0xff08),
        Key::Delete => Some(0xffff),
        Key::End => Some(0xff57),
        Key::Enter => Some(0xff0d),
        Key::Escape => Some(0xff1b),
        Key::Home => Some(0xff50),
        Key::Insert => Some(0xff63),
        Key::Menu => Some(0xff67),
        Key::PageDown => Some(0xff56),
        Key::PageUp => Some(0xff55),
        Key::Pause => Some(0xff13),
        Key::Tab => Some(0xff09),

        Key::NumLock => Some(0xff7f),
        Key::CapsLock => Some(0xffe5),
        Key::ScrollLock => Some(0xff14),

        Key::LeftShift => Some(0xffe1),
        Key::RightShift => Some(0xffe2),
        Key::LeftCtrl => Some(0xffe3),
        Key::RightCtrl => Some(0xffe4),
        Key::LeftSuper => Some(0xffeb),
        Key::RightSuper => Some(0xffec),
        Key::LeftAlt => Some(0xffe9),
        Key::RightAlt => Some(0xffea),

        Key::NumPad0 => Some(0xffb0),
        Key::NumPad1 => Some(0xffb1),
        Key::NumPad2 => Some(0xffb2),
        Key::NumPad3 => Some(0xffb3),
        Key::NumPad4 => Some(0xffb4),
        Key::NumPad5 => Some(0xffb5),
        Key::NumPad6 => Some(0xffb6),
        Key::NumPad7 => Some(0xffb7),
        Key::NumPad8 => Some(0xffb8),
        Key::NumPad9 => Some(0xffb9),
        Key::NumPadDot => Some(0xffae),
        Key::NumPadSlash => Some(0xffaf),
        Key::NumPadAsterisk => Some(0xffaa),
        Key::NumPadMinus => Some(0xffad),
        Key::NumPadPlus => Some(0xffab),
        Key::NumPadEnter => Some(0xff8d),

        Key::Unknown | Key::Count => None,
    }
}
