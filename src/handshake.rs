//! WebSocket アップグレードハンドシェイク (RFC 6455 Section 4)
//!
//! HTTP/1.1 Upgrade リクエストの判定と 101 Switching Protocols
//! レスポンスの組み立て。アクセプトキーはクライアントのキーに
//! マジック GUID を連結して SHA-1 し、Base64 で符号化する。

use base64ct::{Base64, Encoding};
use sha1::{Digest, Sha1};

use crate::error::Error;
use crate::request::Request;

/// RFC 6455 Section 1.3 のマジック GUID
pub const MAGIC_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// サブプロトコル名の最大長
pub const MAX_SUBPROTOCOL_LEN: usize = 32;

/// [`build_handshake_response`] が返すレスポンスの最大長
///
/// 固定部分 + Base64 アクセプトキー 28 バイト + サブプロトコル上限から
/// 静的に決まる。呼び出し側の送信バッファの寸法に使える。
pub const MAX_RESPONSE_LEN: usize = 192;

/// リクエストが WebSocket アップグレード要求かどうか
///
/// 次の 3 条件がすべて成立すること。引数リストは完全一致で比較する。
///
/// - `connection` ヘッダーの引数リストが `Upgrade`
/// - `upgrade` ヘッダーの引数リストが `websocket`
/// - `sec-websocket-key` ヘッダーが存在する
pub fn is_upgrade_request(request: &Request<'_>) -> bool {
    request.header("connection") == Some("Upgrade")
        && request.header("upgrade") == Some("websocket")
        && request.header("sec-websocket-key").is_some()
}

/// アクセプトキーの計算
///
/// `Base64(SHA-1(key + MAGIC_GUID))`。キーはワイヤ上の表記のまま渡す
/// (Base64 デコードはしない)。
pub fn accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(MAGIC_GUID.as_bytes());
    Base64::encode_string(&hasher.finalize())
}

/// 101 Switching Protocols レスポンスを組み立てる
///
/// `request` がアップグレード要求でなければ [`Error::NotWebSocket`]。
/// `sec-websocket-key` の引数リストに複数の値が含まれていた場合は
/// 最初のコンマより前の部分をキーとして使う。
///
/// `subprotocol` は呼び出し側が選択済みのサブプロトコル名。
/// [`MAX_SUBPROTOCOL_LEN`] を超えると [`Error::SubprotocolTooLong`]。
pub fn build_handshake_response(
    request: &Request<'_>,
    subprotocol: Option<&str>,
) -> Result<String, Error> {
    if !is_upgrade_request(request) {
        return Err(Error::NotWebSocket);
    }
    if let Some(name) = subprotocol
        && name.len() > MAX_SUBPROTOCOL_LEN
    {
        return Err(Error::SubprotocolTooLong {
            len: name.len(),
            limit: MAX_SUBPROTOCOL_LEN,
        });
    }

    // is_upgrade_request が存在を保証している
    let key_args = request.header("sec-websocket-key").unwrap_or("");
    let key = key_args.split(',').next().unwrap_or(key_args);

    let mut response = String::with_capacity(MAX_RESPONSE_LEN);
    response.push_str("HTTP/1.1 101 Switching Protocols\r\n");
    response.push_str("Upgrade: websocket\r\n");
    response.push_str("Connection: Upgrade\r\n");
    response.push_str("Sec-WebSocket-Accept: ");
    response.push_str(&accept_key(key));
    response.push_str("\r\n");
    if let Some(name) = subprotocol {
        response.push_str("Sec-WebSocket-Protocol: ");
        response.push_str(name);
        response.push_str("\r\n");
    }
    response.push_str("\r\n");
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::RequestDecoder;

    fn decode(input: &[u8]) -> RequestDecoder {
        let mut decoder = RequestDecoder::new();
        decoder.feed(input).unwrap();
        decoder
    }

    const UPGRADE_REQUEST: &[u8] = b"GET /chat HTTP/1.1\r\n\
        Host: server.example.com\r\n\
        Upgrade: websocket\r\n\
        Connection: Upgrade\r\n\
        Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
        Sec-WebSocket-Version: 13\r\n\r\n";

    #[test]
    fn rfc6455_accept_key_vector() {
        // RFC 6455 Section 1.3 の例
        assert_eq!(
            accept_key("dGhlIHNhbXBsZSBub25jZQ=="),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn upgrade_request_detected() {
        let decoder = decode(UPGRADE_REQUEST);
        assert!(is_upgrade_request(&decoder.request().unwrap()));
    }

    #[test]
    fn connection_args_must_be_exact() {
        let decoder = decode(
            b"GET / HTTP/1.1\r\n\
              Connection: keep-alive, Upgrade\r\n\
              Upgrade: websocket\r\n\
              Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n",
        );
        assert!(!is_upgrade_request(&decoder.request().unwrap()));
    }

    #[test]
    fn plain_get_is_not_upgrade() {
        let decoder = decode(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n");
        let request = decoder.request().unwrap();
        assert!(!is_upgrade_request(&request));
        assert_eq!(
            build_handshake_response(&request, None),
            Err(Error::NotWebSocket)
        );
    }

    #[test]
    fn missing_key_is_not_upgrade() {
        let decoder = decode(
            b"GET / HTTP/1.1\r\n\
              Connection: Upgrade\r\n\
              Upgrade: websocket\r\n\r\n",
        );
        assert!(!is_upgrade_request(&decoder.request().unwrap()));
    }

    #[test]
    fn response_contains_accept_key() {
        let decoder = decode(UPGRADE_REQUEST);
        let response = build_handshake_response(&decoder.request().unwrap(), None).unwrap();
        assert!(response.starts_with("HTTP/1.1 101 Switching Protocols\r\n"));
        assert!(response.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));
        assert!(!response.contains("Sec-WebSocket-Protocol"));
        assert!(response.ends_with("\r\n\r\n"));
        assert!(response.len() <= MAX_RESPONSE_LEN);
    }

    #[test]
    fn response_with_subprotocol() {
        let decoder = decode(UPGRADE_REQUEST);
        let response =
            build_handshake_response(&decoder.request().unwrap(), Some("chat")).unwrap();
        assert!(response.contains("Sec-WebSocket-Protocol: chat\r\n"));
        assert!(response.len() <= MAX_RESPONSE_LEN);
    }

    #[test]
    fn subprotocol_length_capped() {
        let decoder = decode(UPGRADE_REQUEST);
        let long = "x".repeat(MAX_SUBPROTOCOL_LEN + 1);
        assert_eq!(
            build_handshake_response(&decoder.request().unwrap(), Some(&long)),
            Err(Error::SubprotocolTooLong {
                len: MAX_SUBPROTOCOL_LEN + 1,
                limit: MAX_SUBPROTOCOL_LEN,
            })
        );

        let max = "y".repeat(MAX_SUBPROTOCOL_LEN);
        let response =
            build_handshake_response(&decoder.request().unwrap(), Some(&max)).unwrap();
        assert!(response.len() <= MAX_RESPONSE_LEN);
    }

    #[test]
    fn key_list_uses_first_value() {
        let decoder = decode(
            b"GET / HTTP/1.1\r\n\
              Connection: Upgrade\r\n\
              Upgrade: websocket\r\n\
              Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==, other\r\n\r\n",
        );
        let response = build_handshake_response(&decoder.request().unwrap(), None).unwrap();
        assert!(response.contains("Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=\r\n"));
    }
}
