//! # shiguredo_websock
//!
//! WebSocket / HTTP/1.1 Upgrade ライブラリ (Sans I/O)
//!
//! ## 特徴
//!
//! - **Sans I/O**: I/O を完全に分離した設計。`feed` は読み書きも
//!   ブロックも行わない
//! - **再開可能**: 任意のチャンク境界で分割された入力を途中から
//!   続きとして消費できる
//! - **ゼロコピー**: パース中はバイトを 1 つのステージングバッファに
//!   集約し、完了済みレコードはバッファを借用するビューとして返す
//!
//! ## 使い方
//!
//! ### ハンドシェイク (リクエスト受信、101 レスポンス送信)
//!
//! ```rust
//! use shiguredo_websock::{handshake, FeedProgress, RequestDecoder};
//!
//! let mut decoder = RequestDecoder::new();
//! let input = b"GET /chat HTTP/1.1\r\n\
//!     Connection: Upgrade\r\n\
//!     Upgrade: websocket\r\n\
//!     Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n";
//! let progress = decoder.feed(input)?;
//! assert!(matches!(progress, FeedProgress::Complete { .. }));
//!
//! let request = decoder.request().unwrap();
//! let response = handshake::build_handshake_response(&request, None)?;
//! // response を送信...
//! # Ok::<(), shiguredo_websock::Error>(())
//! ```
//!
//! ### フレーム (受信デコード、エコー送信)
//!
//! ```rust
//! use shiguredo_websock::{encode_frame, FeedProgress, FrameDecoder};
//!
//! let mut decoder = FrameDecoder::new();
//! // 受信データを feed...
//! // if let FeedProgress::Complete { .. } = decoder.feed(&received_data)? {
//! //     let frame = decoder.frame().unwrap();
//! //     let echo = encode_frame(true, frame.opcode(), frame.payload())?;
//! //     // echo を送信...
//! // }
//! # Ok::<(), shiguredo_websock::Error>(())
//! ```

mod buffer;
mod decoder;
mod encoder;
mod error;
mod frame;
pub mod handshake;
mod limits;
mod request;

pub use decoder::{FeedProgress, FrameDecoder, MAX_HEADERS, RequestDecoder};
pub use encoder::{build_frame_header, encode_frame};
pub use error::Error;
pub use frame::{Frame, Opcode};
pub use limits::DecoderLimits;
pub use request::{Method, Request};
