//! ストリーミングシナリオの統合テスト
//!
//! ハンドシェイクからフレーム交換までを、実際のサーバーが受け取る
//! 形の入力 (任意位置での分割、複数レコードの連結) で検証する。

use shiguredo_websock::{
    FeedProgress, FrameDecoder, Method, Opcode, RequestDecoder, encode_frame, handshake,
};

const UPGRADE_REQUEST: &[u8] = b"GET /chat HTTP/1.1\r\n\
    Host: server.example.com\r\n\
    Upgrade: websocket\r\n\
    Connection: Upgrade\r\n\
    Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
    Sec-WebSocket-Version: 13\r\n\r\n";

/// 全ゼロマスク付きフレームを手組みする
fn build_frame(opcode: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0x80 | opcode];
    let len = payload.len();
    if len < 126 {
        out.push(len as u8);
    } else if len <= 65535 {
        out.push(126);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(127);
        out.extend_from_slice(&(len as u64).to_be_bytes());
    }
    out.extend_from_slice(&[0, 0, 0, 0]);
    out.extend_from_slice(payload);
    out
}

#[test]
fn handshake_request_split_at_every_position() {
    for split in 1..UPGRADE_REQUEST.len() {
        let mut decoder = RequestDecoder::new();
        assert_eq!(
            decoder.feed(&UPGRADE_REQUEST[..split]).unwrap(),
            FeedProgress::NeedMore,
            "split={}",
            split
        );
        assert!(decoder.request().is_none());

        let progress = decoder.feed(&UPGRADE_REQUEST[split..]).unwrap();
        assert_eq!(
            progress,
            FeedProgress::Complete {
                consumed: UPGRADE_REQUEST.len() - split
            },
            "split={}",
            split
        );

        let request = decoder.request().unwrap();
        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.path(), "/chat");
        assert!(handshake::is_upgrade_request(&request));
    }
}

#[test]
fn handshake_then_first_frame_in_one_chunk() {
    // クライアントがハンドシェイクと最初のフレームを一息に送るケース
    let frame = build_frame(0x1, b"hi");
    let mut input = UPGRADE_REQUEST.to_vec();
    input.extend_from_slice(&frame);

    let mut request_decoder = RequestDecoder::new();
    let progress = request_decoder.feed(&input).unwrap();
    assert_eq!(
        progress,
        FeedProgress::Complete {
            consumed: UPGRADE_REQUEST.len()
        }
    );

    let response = {
        let request = request_decoder.request().unwrap();
        handshake::build_handshake_response(&request, None).unwrap()
    };
    assert!(response.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));

    // ストラグラーをフレームデコーダーへ引き渡す
    let mut frame_decoder = FrameDecoder::new();
    let progress = frame_decoder.feed(&input[UPGRADE_REQUEST.len()..]).unwrap();
    assert_eq!(
        progress,
        FeedProgress::Complete {
            consumed: frame.len()
        }
    );
    let frame = frame_decoder.frame().unwrap();
    assert_eq!(frame.opcode(), Opcode::Text);
    assert_eq!(frame.payload(), b"hi");
}

#[test]
fn echo_loop_over_split_frames() {
    // Text, Ping, Close の 3 フレームを連結して 5 バイトずつ投入する
    let mut wire = build_frame(0x1, b"echo me");
    wire.extend_from_slice(&build_frame(0x9, b"ping"));
    wire.extend_from_slice(&build_frame(0x8, &[0x03, 0xE8]));

    let mut decoder = FrameDecoder::new();
    let mut replies: Vec<Vec<u8>> = Vec::new();
    let mut closed = false;

    for chunk in wire.chunks(5) {
        let mut offset = 0;
        while offset < chunk.len() {
            match decoder.feed(&chunk[offset..]).unwrap() {
                FeedProgress::NeedMore => offset = chunk.len(),
                FeedProgress::Complete { consumed } => {
                    offset += consumed;
                    let frame = decoder.frame().unwrap();
                    match frame.opcode() {
                        Opcode::Text | Opcode::Bin => {
                            replies
                                .push(encode_frame(true, frame.opcode(), frame.payload()).unwrap());
                        }
                        Opcode::Ping => {
                            replies.push(encode_frame(true, Opcode::Pong, frame.payload()).unwrap());
                        }
                        Opcode::Close => closed = true,
                        Opcode::Pong | Opcode::Cont => {}
                    }
                }
            }
        }
    }

    assert!(closed);
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0], encode_frame(true, Opcode::Text, b"echo me").unwrap());
    assert_eq!(replies[1], encode_frame(true, Opcode::Pong, b"ping").unwrap());
}

#[test]
fn request_views_survive_until_next_feed() {
    let mut decoder = RequestDecoder::new();
    decoder.feed(UPGRADE_REQUEST).unwrap();

    // 同じ完了済みレコードを何度でも読み取れる
    let key_a = decoder.request().unwrap().header("sec-websocket-key");
    let key_b = decoder.request().unwrap().header("sec-websocket-key");
    assert_eq!(key_a, key_b);
    assert_eq!(key_a, Some("dGhlIHNhbXBsZSBub25jZQ=="));
}

#[test]
fn large_payload_roundtrip_through_post() {
    // 長さ拡張の境界を越えるペイロードを HTTP 側でも受けられること
    let payload: Vec<u8> = (0..70000u32).map(|i| (i % 251) as u8).collect();
    let mut input = format!(
        "POST /upload HTTP/1.1\r\nContent-Length: {}\r\n\r\n",
        payload.len()
    )
    .into_bytes();
    input.extend_from_slice(&payload);

    let mut decoder = RequestDecoder::new();
    let mut completed = false;
    for chunk in input.chunks(4096) {
        if let FeedProgress::Complete { consumed } = decoder.feed(chunk).unwrap() {
            assert_eq!(consumed, chunk.len());
            completed = true;
        }
    }
    assert!(completed);
    let request = decoder.request().unwrap();
    assert_eq!(request.method(), Method::Post);
    assert_eq!(request.payload(), payload.as_slice());
}
