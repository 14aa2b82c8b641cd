//! End-to-end session tests against a scripted server on an in-memory
//! duplex transport.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;

use ookvnc::protocol::security::challenge_response;
use ookvnc::{
    Credentials, DecoderRegistry, Encoding, Framebuffer, PixelFormat, Rect, VncConnector,
    VncError, VncSession,
};

const TICK: Duration = Duration::from_millis(200);

/// Records every sink call so tests can assert exact decoder output.
struct RecordingFb {
    format: PixelFormat,
    calls: Vec<FbCall>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FbCall {
    Begin,
    End(Rect),
    Write {
        x: u16,
        y: u16,
        count: usize,
        data: Vec<u8>,
    },
    Uniform {
        x: u16,
        y: u16,
        count: usize,
        pixel: u32,
    },
    Copy {
        sx: u16,
        sy: u16,
        dx: u16,
        dy: u16,
        w: u16,
        h: u16,
    },
    Bell,
}

impl RecordingFb {
    fn new() -> Self {
        Self {
            format: PixelFormat::rgb888(),
            calls: Vec::new(),
        }
    }
}

impl Framebuffer for RecordingFb {
    fn pixel_format(&self) -> PixelFormat {
        self.format
    }
    fn begin_drawing(&mut self) {
        self.calls.push(FbCall::Begin);
    }
    fn end_drawing(&mut self, rect: Rect) {
        self.calls.push(FbCall::End(rect));
    }
    fn write_pixels(&mut self, x: u16, y: u16, count: usize, data: &[u8]) {
        self.calls.push(FbCall::Write {
            x,
            y,
            count,
            data: data.to_vec(),
        });
    }
    fn write_uniform_pixels(&mut self, x: u16, y: u16, count: usize, pixel: u32) {
        self.calls.push(FbCall::Uniform { x, y, count, pixel });
    }
    fn copy_pixels(&mut self, sx: u16, sy: u16, dx: u16, dy: u16, w: u16, h: u16) {
        self.calls.push(FbCall::Copy {
            sx,
            sy,
            dx,
            dy,
            w,
            h,
        });
    }
    fn bell(&mut self) {
        self.calls.push(FbCall::Bell);
    }
}

/// The server's native format used in these tests: 32bpp little-endian
/// true colour, shifts 16/8/0.
fn server_format_bytes() -> [u8; 16] {
    [32, 24, 0, 1, 0, 255, 0, 255, 0, 255, 16, 8, 0, 0, 0, 0]
}

fn spawn_client(
    stream: DuplexStream,
    credentials: Credentials,
    registry: DecoderRegistry,
) -> JoinHandle<Result<VncSession<DuplexStream>, VncError>> {
    tokio::spawn(async move {
        VncConnector::new(stream)
            .set_credentials(credentials)
            .allow_shared(true)
            .set_registry(registry)
            .build()
            .try_start()
            .await?
            .finish()
    })
}

/// Scripted server side of a no-auth 3.3 handshake.
async fn serve_handshake(server: &mut DuplexStream, width: u16, height: u16, name: &str) {
    server.write_all(b"RFB 003.008\n").await.unwrap();

    let mut reply = [0u8; 12];
    server.read_exact(&mut reply).await.unwrap();
    assert_eq!(&reply, b"RFB 003.003\n", "client must pin to RFB 3.3");

    server.write_u32(1).await.unwrap(); // auth: none

    let shared = server.read_u8().await.unwrap();
    assert_eq!(shared, 1, "client asked for a shared desktop");

    server.write_u16(width).await.unwrap();
    server.write_u16(height).await.unwrap();
    server.write_all(&server_format_bytes()).await.unwrap();
    server.write_u32(name.len() as u32).await.unwrap();
    server.write_all(name.as_bytes()).await.unwrap();
}

/// Consumes the three messages `attach_framebuffer` sends and returns
/// their frames.
async fn drain_attach(
    server: &mut DuplexStream,
    num_encodings: usize,
) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let mut set_pixel_format = vec![0u8; 20];
    server.read_exact(&mut set_pixel_format).await.unwrap();
    let mut set_encodings = vec![0u8; 4 + 4 * num_encodings];
    server.read_exact(&mut set_encodings).await.unwrap();
    let mut update_request = vec![0u8; 10];
    server.read_exact(&mut update_request).await.unwrap();
    (set_pixel_format, set_encodings, update_request)
}

async fn send_update_header(server: &mut DuplexStream, num_rects: u16) {
    server.write_u8(0).await.unwrap(); // FramebufferUpdate
    server.write_u8(0).await.unwrap(); // padding
    server.write_u16(num_rects).await.unwrap();
}

async fn send_rect_header(server: &mut DuplexStream, rect: Rect, encoding: u32) {
    server.write_u16(rect.x).await.unwrap();
    server.write_u16(rect.y).await.unwrap();
    server.write_u16(rect.width).await.unwrap();
    server.write_u16(rect.height).await.unwrap();
    server.write_u32(encoding).await.unwrap();
}

async fn read_update_request(server: &mut DuplexStream) -> [u8; 10] {
    let mut buf = [0u8; 10];
    server.read_exact(&mut buf).await.unwrap();
    buf
}

/// Handshake + attach with a default registry; returns a running
/// session and the scripted server end.
async fn running_session(
    width: u16,
    height: u16,
) -> (VncSession<DuplexStream>, RecordingFb, DuplexStream) {
    let (client, mut server) = tokio::io::duplex(1 << 16);
    let handle = spawn_client(client, Credentials::none(), DecoderRegistry::all());
    serve_handshake(&mut server, width, height, "test desktop").await;
    let mut session = handle.await.unwrap().unwrap();

    let fb = RecordingFb::new();
    session.attach_framebuffer(&fb).await.unwrap();
    drain_attach(&mut server, 6).await;
    (session, fb, server)
}

#[tokio::test]
async fn s1_handshake_pins_to_33() {
    let (client, mut server) = tokio::io::duplex(1 << 16);
    let handle = spawn_client(client, Credentials::none(), DecoderRegistry::all());
    serve_handshake(&mut server, 1, 1, "T").await;

    let session = handle.await.unwrap().unwrap();
    assert_eq!(session.desktop_name(), "T");
    assert_eq!(session.screen().width, 1);
    assert_eq!(session.screen().height, 1);
    // Until a framebuffer is attached the session format is the
    // server's native one.
    assert_eq!(session.pixel_format().bytes_per_pixel, 4);
    assert_eq!(session.pixel_format().red_shift, 16);
}

#[tokio::test]
async fn s2_des_challenge_response() {
    let (client, mut server) = tokio::io::duplex(1 << 16);
    let handle = spawn_client(
        client,
        Credentials::password("pass"),
        DecoderRegistry::all(),
    );

    server.write_all(b"RFB 003.003\n").await.unwrap();
    let mut reply = [0u8; 12];
    server.read_exact(&mut reply).await.unwrap();

    server.write_u32(2).await.unwrap(); // VNC auth
    let challenge = [0u8; 16];
    server.write_all(&challenge).await.unwrap();

    let mut response = [0u8; 16];
    server.read_exact(&mut response).await.unwrap();
    assert_eq!(response, challenge_response("pass", &challenge));
    assert_ne!(response, [0u8; 16]);

    server.write_u32(0).await.unwrap(); // result: ok

    let shared = server.read_u8().await.unwrap();
    assert_eq!(shared, 1);
    server.write_u16(8).await.unwrap();
    server.write_u16(8).await.unwrap();
    server.write_all(&server_format_bytes()).await.unwrap();
    server.write_u32(0).await.unwrap();

    let session = handle.await.unwrap().unwrap();
    assert_eq!(session.desktop_name(), "");
}

#[tokio::test]
async fn s3_raw_rect_row_by_row() {
    let (mut session, mut fb, mut server) = running_session(1, 1).await;

    let rect = Rect::new(0, 0, 2, 1);
    send_update_header(&mut server, 1).await;
    send_rect_header(&mut server, rect, 0).await;
    let pixels = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
    server.write_all(&pixels).await.unwrap();

    assert!(session.process(TICK, &mut fb).await.unwrap());
    assert_eq!(
        fb.calls,
        vec![
            FbCall::Begin,
            FbCall::Write {
                x: 0,
                y: 0,
                count: 2,
                data: pixels.to_vec(),
            },
            FbCall::End(rect),
        ]
    );

    // Followed by an incremental full-desktop request.
    assert_eq!(
        read_update_request(&mut server).await,
        [3, 1, 0, 0, 0, 0, 0, 1, 0, 1]
    );
}

#[tokio::test]
async fn raw_rect_emits_one_write_per_row() {
    let (mut session, mut fb, mut server) = running_session(8, 8).await;

    let rect = Rect::new(1, 2, 3, 3);
    send_update_header(&mut server, 1).await;
    send_rect_header(&mut server, rect, 0).await;
    let pixels: Vec<u8> = (0u8..36).collect();
    server.write_all(&pixels).await.unwrap();

    assert!(session.process(TICK, &mut fb).await.unwrap());

    let mut expected = vec![FbCall::Begin];
    for row in 0..3usize {
        expected.push(FbCall::Write {
            x: 1,
            y: 2 + row as u16,
            count: 3,
            data: pixels[row * 12..(row + 1) * 12].to_vec(),
        });
    }
    expected.push(FbCall::End(rect));
    assert_eq!(fb.calls, expected);
}

#[tokio::test]
async fn s4_copyrect() {
    let (mut session, mut fb, mut server) = running_session(64, 64).await;

    let rect = Rect::new(10, 20, 5, 6);
    send_update_header(&mut server, 1).await;
    send_rect_header(&mut server, rect, 1).await;
    server.write_u16(3).await.unwrap();
    server.write_u16(4).await.unwrap();

    assert!(session.process(TICK, &mut fb).await.unwrap());
    assert_eq!(
        fb.calls,
        vec![
            FbCall::Begin,
            FbCall::Copy {
                sx: 3,
                sy: 4,
                dx: 10,
                dy: 20,
                w: 5,
                h: 6,
            },
            FbCall::End(rect),
        ]
    );
}

#[tokio::test]
async fn s5_hextile_single_tile() {
    let (mut session, mut fb, mut server) = running_session(16, 16).await;

    let rect = Rect::new(0, 0, 16, 16);
    send_update_header(&mut server, 1).await;
    send_rect_header(&mut server, rect, 5).await;
    // BackgroundSpecified | ForegroundSpecified | AnySubrects | SubrectsColored
    server.write_u8(0x02 | 0x04 | 0x08 | 0x10).await.unwrap();
    server.write_all(&[1, 1, 1, 1]).await.unwrap(); // tile background
    server.write_all(&[2, 2, 2, 2]).await.unwrap(); // shared foreground (unused)
    server.write_u8(1).await.unwrap(); // one subrect
    server.write_all(&[3, 3, 3, 3]).await.unwrap(); // its own colour
    server.write_u8(0x12).await.unwrap(); // x=1 y=2
    server.write_u8(0x34).await.unwrap(); // w=4 h=5

    assert!(session.process(TICK, &mut fb).await.unwrap());

    let bg = u32::from_ne_bytes([1, 1, 1, 1]);
    let sub = u32::from_ne_bytes([3, 3, 3, 3]);

    let mut expected = vec![FbCall::Begin];
    for y in 0..16 {
        expected.push(FbCall::Uniform {
            x: 0,
            y,
            count: 16,
            pixel: bg,
        });
    }
    for y in 2..7 {
        expected.push(FbCall::Uniform {
            x: 1,
            y,
            count: 4,
            pixel: sub,
        });
    }
    expected.push(FbCall::End(rect));
    assert_eq!(fb.calls, expected);
}

#[tokio::test]
async fn s6_bell_has_no_reply() {
    let (mut session, mut fb, mut server) = running_session(4, 4).await;

    server.write_u8(2).await.unwrap();
    assert!(session.process(TICK, &mut fb).await.unwrap());
    assert_eq!(fb.calls, vec![FbCall::Bell]);

    // Nothing may have been written back.
    let pending = tokio::time::timeout(Duration::from_millis(50), server.read_u8()).await;
    assert!(pending.is_err(), "bell must not produce client traffic");
}

#[tokio::test]
async fn rects_decode_in_arrival_order_before_followup_request() {
    let (mut session, mut fb, mut server) = running_session(32, 32).await;

    let raw_rect = Rect::new(0, 0, 1, 1);
    let copy_rect = Rect::new(4, 4, 2, 2);
    send_update_header(&mut server, 2).await;
    send_rect_header(&mut server, raw_rect, 0).await;
    server.write_all(&[9, 9, 9, 9]).await.unwrap();
    send_rect_header(&mut server, copy_rect, 1).await;
    server.write_u16(0).await.unwrap();
    server.write_u16(0).await.unwrap();

    assert!(session.process(TICK, &mut fb).await.unwrap());
    assert_eq!(
        fb.calls,
        vec![
            FbCall::Begin,
            FbCall::Write {
                x: 0,
                y: 0,
                count: 1,
                data: vec![9, 9, 9, 9],
            },
            FbCall::End(raw_rect),
            FbCall::Begin,
            FbCall::Copy {
                sx: 0,
                sy: 0,
                dx: 4,
                dy: 4,
                w: 2,
                h: 2,
            },
            FbCall::End(copy_rect),
        ]
    );
    assert_eq!(
        read_update_request(&mut server).await,
        [3, 1, 0, 0, 0, 0, 0, 32, 0, 32]
    );
}

#[tokio::test]
async fn rre_background_and_subrects() {
    let (mut session, mut fb, mut server) = running_session(8, 4).await;

    let rect = Rect::new(0, 0, 8, 4);
    send_update_header(&mut server, 1).await;
    send_rect_header(&mut server, rect, 2).await;
    server.write_u32(1).await.unwrap(); // one subrect
    server.write_all(&[9, 9, 9, 9]).await.unwrap(); // background
    server.write_all(&[7, 7, 7, 7]).await.unwrap(); // subrect colour
    server.write_u16(1).await.unwrap(); // x
    server.write_u16(2).await.unwrap(); // y
    server.write_u16(3).await.unwrap(); // w
    server.write_u16(2).await.unwrap(); // h

    assert!(session.process(TICK, &mut fb).await.unwrap());

    let bg = u32::from_ne_bytes([9, 9, 9, 9]);
    let sub = u32::from_ne_bytes([7, 7, 7, 7]);
    let mut expected = vec![FbCall::Begin];
    for y in 0..4 {
        expected.push(FbCall::Uniform {
            x: 0,
            y,
            count: 8,
            pixel: bg,
        });
    }
    for y in 2..4 {
        expected.push(FbCall::Uniform {
            x: 1,
            y,
            count: 3,
            pixel: sub,
        });
    }
    expected.push(FbCall::End(rect));
    assert_eq!(fb.calls, expected);
}

#[tokio::test]
async fn corre_uses_byte_geometry() {
    let (mut session, mut fb, mut server) = running_session(16, 16).await;

    let rect = Rect::new(2, 2, 6, 3);
    send_update_header(&mut server, 1).await;
    send_rect_header(&mut server, rect, 4).await;
    server.write_u32(1).await.unwrap();
    server.write_all(&[1, 2, 3, 4]).await.unwrap(); // background
    server.write_all(&[5, 6, 7, 8]).await.unwrap(); // subrect colour
    server.write_all(&[1, 1, 2, 1]).await.unwrap(); // x y w h, one byte each

    assert!(session.process(TICK, &mut fb).await.unwrap());

    let bg = u32::from_ne_bytes([1, 2, 3, 4]);
    let sub = u32::from_ne_bytes([5, 6, 7, 8]);
    let mut expected = vec![FbCall::Begin];
    for y in 2..5 {
        expected.push(FbCall::Uniform {
            x: 2,
            y,
            count: 6,
            pixel: bg,
        });
    }
    expected.push(FbCall::Uniform {
        x: 3,
        y: 3,
        count: 2,
        pixel: sub,
    });
    expected.push(FbCall::End(rect));
    assert_eq!(fb.calls, expected);
}

#[tokio::test]
async fn hextile_edge_tiles_and_running_background() {
    let (mut session, mut fb, mut server) = running_session(20, 18).await;

    // 20x18 splits into 16x16, 4x16, 16x2 and 4x2 tiles. Only the
    // first tile specifies the background; the rest inherit it.
    let rect = Rect::new(0, 0, 20, 18);
    send_update_header(&mut server, 1).await;
    send_rect_header(&mut server, rect, 5).await;
    server.write_u8(0x02).await.unwrap();
    server.write_all(&[8, 8, 8, 8]).await.unwrap();
    server.write_u8(0x00).await.unwrap();
    server.write_u8(0x00).await.unwrap();
    server.write_u8(0x00).await.unwrap();

    assert!(session.process(TICK, &mut fb).await.unwrap());

    let bg = u32::from_ne_bytes([8, 8, 8, 8]);
    let mut covered = 0usize;
    for call in &fb.calls {
        if let FbCall::Uniform { count, pixel, .. } = call {
            assert_eq!(*pixel, bg, "inherited background colour");
            covered += count;
        }
    }
    assert_eq!(covered, 20 * 18, "every pixel written exactly once");
}

#[tokio::test]
async fn hextile_raw_tile() {
    let (mut session, mut fb, mut server) = running_session(2, 2).await;

    let rect = Rect::new(0, 0, 2, 2);
    send_update_header(&mut server, 1).await;
    send_rect_header(&mut server, rect, 5).await;
    server.write_u8(0x01).await.unwrap(); // raw tile
    let pixels: Vec<u8> = (0u8..16).collect();
    server.write_all(&pixels).await.unwrap();

    assert!(session.process(TICK, &mut fb).await.unwrap());
    assert_eq!(
        fb.calls,
        vec![
            FbCall::Begin,
            FbCall::Write {
                x: 0,
                y: 0,
                count: 2,
                data: pixels[..8].to_vec(),
            },
            FbCall::Write {
                x: 0,
                y: 1,
                count: 2,
                data: pixels[8..].to_vec(),
            },
            FbCall::End(rect),
        ]
    );
}

#[tokio::test]
async fn zlib_rects_share_one_inflate_stream() {
    use flate2::{Compress, Compression, FlushCompress};

    let (mut session, mut fb, mut server) = running_session(4, 4).await;

    let first: Vec<u8> = vec![0x10, 0x20, 0x30, 0x40, 0x50, 0x60, 0x70, 0x80];
    let second: Vec<u8> = vec![0xA0, 0xB0, 0xC0, 0xD0, 0xE0, 0xF0, 0x01, 0x02];

    // One deflate stream for the whole session, flushed per rectangle.
    let mut compressor = Compress::new(Compression::default(), true);
    for (i, payload) in [&first, &second].into_iter().enumerate() {
        let mut compressed = Vec::with_capacity(payload.len() + 64);
        compressor
            .compress_vec(payload, &mut compressed, FlushCompress::Sync)
            .unwrap();

        let rect = Rect::new(0, i as u16, 2, 1);
        send_update_header(&mut server, 1).await;
        send_rect_header(&mut server, rect, 6).await;
        server.write_u32(compressed.len() as u32).await.unwrap();
        server.write_all(&compressed).await.unwrap();

        assert!(session.process(TICK, &mut fb).await.unwrap());
        read_update_request(&mut server).await;
    }

    assert_eq!(
        fb.calls,
        vec![
            FbCall::Begin,
            FbCall::Write {
                x: 0,
                y: 0,
                count: 2,
                data: first,
            },
            FbCall::End(Rect::new(0, 0, 2, 1)),
            FbCall::Begin,
            FbCall::Write {
                x: 0,
                y: 1,
                count: 2,
                data: second,
            },
            FbCall::End(Rect::new(0, 1, 2, 1)),
        ]
    );
}

#[tokio::test]
async fn timeout_without_data_returns_false() {
    let (mut session, mut fb, _server) = running_session(4, 4).await;
    let handled = session
        .process(Duration::from_millis(10), &mut fb)
        .await
        .unwrap();
    assert!(!handled);
    assert!(fb.calls.is_empty());
}

#[tokio::test]
async fn attach_sends_format_encodings_and_full_request() {
    let (client, mut server) = tokio::io::duplex(1 << 16);
    let handle = spawn_client(client, Credentials::none(), DecoderRegistry::all());
    serve_handshake(&mut server, 100, 50, "d").await;
    let mut session = handle.await.unwrap().unwrap();

    let fb = RecordingFb::new();
    session.attach_framebuffer(&fb).await.unwrap();
    let (set_pixel_format, set_encodings, update_request) = drain_attach(&mut server, 6).await;

    // SetPixelFormat carries the arbitrated (local true-colour) format.
    assert_eq!(set_pixel_format[0], 0);
    assert_eq!(
        &set_pixel_format[4..20],
        &[32, 24, 0, 1, 0, 255, 0, 255, 0, 255, 16, 8, 0, 0, 0, 0]
    );

    // SetEncodings lists the registry in preference order, Raw last.
    assert_eq!(&set_encodings[..4], &[2, 0, 0, 6]);
    let ids: Vec<u32> = set_encodings[4..]
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes(c.try_into().unwrap()))
        .collect();
    assert_eq!(ids, vec![6, 5, 4, 2, 1, 0]);

    // The first update request is non-incremental and full-desktop.
    assert_eq!(update_request, [3, 0, 0, 0, 0, 0, 0, 100, 0, 50]);
}

#[tokio::test]
async fn missing_decoder_is_fatal() {
    let (client, mut server) = tokio::io::duplex(1 << 16);
    let mut registry = DecoderRegistry::all();
    registry.disable(Encoding::Hextile);
    let handle = spawn_client(client, Credentials::none(), registry);
    serve_handshake(&mut server, 16, 16, "d").await;
    let mut session = handle.await.unwrap().unwrap();

    let mut fb = RecordingFb::new();
    session.attach_framebuffer(&fb).await.unwrap();
    drain_attach(&mut server, 5).await;

    send_update_header(&mut server, 1).await;
    send_rect_header(&mut server, Rect::new(0, 0, 16, 16), 5).await;

    let error = session.process(TICK, &mut fb).await.unwrap_err();
    assert!(matches!(error, VncError::MissingDecoder(5)));
}

#[tokio::test]
async fn color_map_entries_are_unsupported() {
    let (mut session, mut fb, mut server) = running_session(4, 4).await;
    server.write_u8(1).await.unwrap();
    let error = session.process(TICK, &mut fb).await.unwrap_err();
    assert!(matches!(error, VncError::UnsupportedFeature(_)));
}

#[tokio::test]
async fn cut_text_is_discarded() {
    let (mut session, mut fb, mut server) = running_session(4, 4).await;

    server.write_u8(3).await.unwrap();
    server.write_all(&[0, 0, 0]).await.unwrap();
    let text = b"clipboard contents";
    server.write_u32(text.len() as u32).await.unwrap();
    server.write_all(text).await.unwrap();

    assert!(session.process(TICK, &mut fb).await.unwrap());
    assert!(fb.calls.is_empty());

    // The session keeps working afterwards.
    server.write_u8(2).await.unwrap();
    assert!(session.process(TICK, &mut fb).await.unwrap());
    assert_eq!(fb.calls, vec![FbCall::Bell]);
}

#[tokio::test]
async fn unknown_message_is_fatal() {
    let (mut session, mut fb, mut server) = running_session(4, 4).await;
    server.write_u8(99).await.unwrap();
    let error = session.process(TICK, &mut fb).await.unwrap_err();
    assert!(matches!(error, VncError::UnknownMessage(99)));
}

#[tokio::test]
async fn server_rejection_reports_reason() {
    let (client, mut server) = tokio::io::duplex(1 << 16);
    let handle = spawn_client(client, Credentials::none(), DecoderRegistry::all());

    server.write_all(b"RFB 003.003\n").await.unwrap();
    let mut reply = [0u8; 12];
    server.read_exact(&mut reply).await.unwrap();

    server.write_u32(0).await.unwrap(); // connection failed
    let reason = b"too many clients";
    server.write_u32(reason.len() as u32).await.unwrap();
    server.write_all(reason).await.unwrap();

    let error = handle.await.unwrap().unwrap_err();
    assert!(matches!(error, VncError::AuthRejected(ref r) if r == "too many clients"));
}

#[tokio::test]
async fn unknown_auth_scheme_is_fatal() {
    let (client, mut server) = tokio::io::duplex(1 << 16);
    let handle = spawn_client(client, Credentials::none(), DecoderRegistry::all());

    server.write_all(b"RFB 003.003\n").await.unwrap();
    let mut reply = [0u8; 12];
    server.read_exact(&mut reply).await.unwrap();
    server.write_u32(99).await.unwrap();

    let error = handle.await.unwrap().unwrap_err();
    assert!(matches!(error, VncError::UnknownAuth(99)));
}

#[tokio::test]
async fn failed_and_toomany_auth_results() {
    for (result, expect_toomany) in [(1u32, false), (2u32, true)] {
        let (client, mut server) = tokio::io::duplex(1 << 16);
        let handle = spawn_client(
            client,
            Credentials::password("pw"),
            DecoderRegistry::all(),
        );

        server.write_all(b"RFB 003.003\n").await.unwrap();
        let mut reply = [0u8; 12];
        server.read_exact(&mut reply).await.unwrap();

        server.write_u32(2).await.unwrap();
        server.write_all(&[7u8; 16]).await.unwrap();
        let mut response = [0u8; 16];
        server.read_exact(&mut response).await.unwrap();
        server.write_u32(result).await.unwrap();

        let error = handle.await.unwrap().unwrap_err();
        match error {
            VncError::AuthTooMany => assert!(expect_toomany),
            VncError::AuthFailed => assert!(!expect_toomany),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

#[tokio::test]
async fn oversized_desktop_name_is_rejected() {
    let (client, mut server) = tokio::io::duplex(1 << 16);
    let handle = spawn_client(client, Credentials::none(), DecoderRegistry::all());

    server.write_all(b"RFB 003.003\n").await.unwrap();
    let mut reply = [0u8; 12];
    server.read_exact(&mut reply).await.unwrap();
    server.write_u32(1).await.unwrap();
    let _shared = server.read_u8().await.unwrap();
    server.write_u16(4).await.unwrap();
    server.write_u16(4).await.unwrap();
    server.write_all(&server_format_bytes()).await.unwrap();
    server.write_u32(1001).await.unwrap();

    let error = handle.await.unwrap().unwrap_err();
    assert!(matches!(error, VncError::OversizedString(1001)));
}
