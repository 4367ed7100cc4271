//! PBT テスト共通ユーティリティ

use proptest::prelude::*;

// ========================================
// HTTP リクエスト生成
// ========================================

fn token_char() -> impl Strategy<Value = char> {
    prop_oneof![
        prop::char::range('a', 'z'),
        prop::char::range('A', 'Z'),
        prop::char::range('0', '9'),
        Just('-'),
        Just('_'),
        Just('.'),
    ]
}

fn token_string(max_len: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(token_char(), 1..=max_len)
        .prop_map(|chars| chars.into_iter().collect())
}

/// ヘッダー名 (コロン・空白を含まないトークン)
///
/// デコーダーが特別扱いする名前は除外する。
pub fn header_name() -> impl Strategy<Value = String> {
    token_string(24).prop_filter("reserved header name", |name| {
        let lower = name.to_ascii_lowercase();
        lower != "content-length" && lower != "transfer-encoding"
    })
}

/// ヘッダー引数値 (CR/LF・空白・コンマを含まない単一トークン)
pub fn header_value() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_./=;-]{1,32}".prop_map(|s| s)
}

/// リクエストパス
pub fn request_path() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("/".to_string()),
        "/[a-zA-Z0-9/_.%-]{1,64}".prop_map(|s| s),
    ]
}

/// ヘッダー一覧 (ヘッダー数上限の範囲内)
pub fn headers() -> impl Strategy<Value = Vec<(String, String)>> {
    proptest::collection::vec((header_name(), header_value()), 0..10)
}

/// POST ペイロード (CR/LF を含む任意バイト)
pub fn payload() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..256)
}

/// GET リクエストのワイヤ表現を組み立てる
pub fn build_get_request(path: &str, headers: &[(String, String)]) -> Vec<u8> {
    let mut out = format!("GET {} HTTP/1.1\r\n", path).into_bytes();
    for (name, value) in headers {
        out.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
    }
    out.extend_from_slice(b"\r\n");
    out
}

/// POST リクエストのワイヤ表現を組み立てる
pub fn build_post_request(path: &str, headers: &[(String, String)], payload: &[u8]) -> Vec<u8> {
    let mut out = format!("POST {} HTTP/1.1\r\n", path).into_bytes();
    for (name, value) in headers {
        out.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
    }
    out.extend_from_slice(format!("Content-Length: {}\r\n\r\n", payload.len()).as_bytes());
    out.extend_from_slice(payload);
    out
}

// ========================================
// WebSocket フレーム生成
// ========================================

/// 有効なオペコードの 4 ビット値
pub fn opcode_bits() -> impl Strategy<Value = u8> {
    prop_oneof![
        Just(0x0u8),
        Just(0x1),
        Just(0x2),
        Just(0x8),
        Just(0x9),
        Just(0xA),
    ]
}

/// マスクキー
pub fn mask_key() -> impl Strategy<Value = [u8; 4]> {
    any::<[u8; 4]>()
}

/// 長さ符号化の全 3 形態にまたがるペイロード長
pub fn frame_payload() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        proptest::collection::vec(any::<u8>(), 0..=130),
        proptest::collection::vec(any::<u8>(), 65530..=65540),
    ]
}

/// マスク済みフレームのワイヤ表現を組み立てる
pub fn build_masked_frame(fin: bool, opcode: u8, mask: [u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(14 + payload.len());
    let fin_bit = if fin { 0x80 } else { 0x00 };
    out.push(fin_bit | opcode);
    let len = payload.len();
    if len < 126 {
        out.push(0x80 | len as u8);
    } else if len <= 65535 {
        out.push(0x80 | 126);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(0x80 | 127);
        out.extend_from_slice(&(len as u64).to_be_bytes());
    }
    out.extend_from_slice(&mask);
    out.extend(
        payload
            .iter()
            .enumerate()
            .map(|(i, byte)| byte ^ mask[i % 4]),
    );
    out
}
