//! デコード状態の定義

/// HTTP リクエストのデコード状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DecodePhase {
    /// リクエストライン待ち
    RequestLine,
    /// ヘッダー待ち
    Headers,
    /// ペイロード読み取り中 (Content-Length の残りバイト数)
    Payload { remaining: usize },
    /// 完了 (次の feed でリクエストラインに戻る)
    Complete,
}

/// WebSocket フレームのデコード状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FramePhase {
    /// ヘッダー先頭 2 バイト待ち
    Prefix,
    /// ヘッダー残り待ち (長さ拡張 + マスクキーを含む総ヘッダー長)
    HeaderRest { header_len: usize },
    /// ペイロード読み取り中 (アンマスクしながら残りバイト数を数える)
    Payload { remaining: u64 },
    /// 完了 (次の feed で Prefix に戻る)
    Complete,
}
