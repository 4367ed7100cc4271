//! ストリーミングデコーダーモジュール
//!
//! Sans I/O 設計に基づき、任意のサイズに分割されて届くバイト列を
//! 再開可能な状態機械で消費する。`feed` は I/O もブロックも行わない。
//!
//! ## feed 契約
//!
//! ```rust
//! use shiguredo_websock::{FeedProgress, RequestDecoder};
//!
//! let mut decoder = RequestDecoder::new();
//! let input = b"GET / HTTP/1.1\r\nHost: x\r\n\r\n";
//! match decoder.feed(input).unwrap() {
//!     FeedProgress::Complete { consumed } => {
//!         assert_eq!(consumed, input.len());
//!         let request = decoder.request().unwrap();
//!         assert_eq!(request.path(), "/");
//!     }
//!     FeedProgress::NeedMore => unreachable!(),
//! }
//! ```
//!
//! ## ストラグラー
//!
//! 1 つの入力チャンクにレコード完了後の余りバイトが含まれる場合、
//! `Complete { consumed }` の `consumed` が入力長より小さくなる。
//! 完了済みレコードは有効なまま残り、呼び出し側は `&input[consumed..]`
//! を次のレコードとして再投入する。

mod frame;
mod phase;
mod request;

pub use frame::FrameDecoder;
pub use request::{MAX_HEADERS, RequestDecoder};

/// `feed` 1 回の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedProgress {
    /// レコードはまだ完成していない (追加データが必要)
    NeedMore,
    /// レコードが完成した
    ///
    /// `consumed` はこの呼び出しで消費した入力バイト数。入力長より
    /// 小さければ残りはストラグラーで、次のレコードとして再投入する。
    Complete { consumed: usize },
}
