use std::fmt;

/// パースエラー
///
/// ストラグラー (完了したレコードの後に残ったバイト) はエラーではなく、
/// `FeedProgress::Complete { consumed }` の `consumed` で表現される。
/// それ以外のエラーはすべて現在のレコードに対して致命的で、
/// デコーダーは `reset()` されるまで同じエラーを返し続ける。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// 不正なメソッド (GET / HEAD / POST のみ対応)
    InvalidMethod(String),
    /// 不正なリクエストライン (パス欠落など)
    InvalidRequestLine(String),
    /// 不正な HTTP バージョン (HTTP/1.0 / HTTP/1.1 のみ対応)
    InvalidVersion(String),
    /// 先行するヘッダーのない折返し行
    FoldWithoutHeader,
    /// ヘッダー数超過
    TooManyHeaders { count: usize, limit: usize },
    /// POST に Content-Length がない
    MissingContentLength,
    /// 不正な Content-Length 値
    InvalidContentLength(String),
    /// Transfer-Encoding: chunked は未対応
    UnsupportedTransferEncoding(String),
    /// 不正な WebSocket オペコード
    BadOpcode(u8),
    /// ペイロードサイズ超過
    PayloadTooLarge { size: u64, limit: usize },
    /// バッファサイズ超過
    BufferOverflow { size: usize, limit: usize },
    /// バッファ拡張のためのメモリ確保失敗
    OutOfMemory,
    /// サブプロトコル文字列が長すぎる
    SubprotocolTooLong { len: usize, limit: usize },
    /// WebSocket アップグレードリクエストではない
    NotWebSocket,
    /// 不正なペイロード長 (符号ビットが立っている)
    InvalidPayloadLength(u64),
    /// 不正な状態での呼び出し
    InvalidState(&'static str),
    /// 不正なデータ
    InvalidData(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidMethod(method) => write!(f, "invalid method: {}", method),
            Error::InvalidRequestLine(msg) => write!(f, "invalid request line: {}", msg),
            Error::InvalidVersion(version) => write!(f, "invalid HTTP version: {}", version),
            Error::FoldWithoutHeader => {
                write!(f, "folded header line without a preceding header")
            }
            Error::TooManyHeaders { count, limit } => {
                write!(f, "too many headers: {} > {}", count, limit)
            }
            Error::MissingContentLength => {
                write!(f, "missing Content-Length (required for POST)")
            }
            Error::InvalidContentLength(value) => {
                write!(f, "invalid Content-Length: {}", value)
            }
            Error::UnsupportedTransferEncoding(value) => {
                write!(f, "unsupported Transfer-Encoding: {}", value)
            }
            Error::BadOpcode(bits) => write!(f, "bad WebSocket opcode: 0x{:X}", bits),
            Error::PayloadTooLarge { size, limit } => {
                write!(f, "payload too large: {} > {}", size, limit)
            }
            Error::BufferOverflow { size, limit } => {
                write!(f, "buffer overflow: {} > {}", size, limit)
            }
            Error::OutOfMemory => write!(f, "out of memory while growing buffer"),
            Error::SubprotocolTooLong { len, limit } => {
                write!(f, "subprotocol string too long: {} > {}", len, limit)
            }
            Error::NotWebSocket => write!(f, "not a WebSocket upgrade request"),
            Error::InvalidPayloadLength(len) => {
                write!(f, "invalid payload length: 0x{:016X}", len)
            }
            Error::InvalidState(msg) => write!(f, "invalid state: {}", msg),
            Error::InvalidData(msg) => write!(f, "invalid data: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
