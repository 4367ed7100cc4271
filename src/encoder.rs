//! WebSocket フレームエンコーダー
//!
//! サーバー送信フレームの組み立て。サーバーはマスクしないため
//! マスクビットは立てないが、ヘッダー長をデコーダーと対称にするため
//! キー位置に全ゼロの 4 バイトを置く (ヘッダー長は常に 6 / 8 / 14)。

use crate::error::Error;
use crate::frame::Opcode;

/// フレームヘッダーを組み立てる
///
/// 長さ拡張は `payload_len` に応じて 7 ビット直値 / 16 ビット / 64 ビット
/// (いずれもビッグエンディアン) を選ぶ。`payload_len` の最上位ビットが
/// 立っていれば [`Error::InvalidPayloadLength`]。
pub fn build_frame_header(fin: bool, opcode: Opcode, payload_len: u64) -> Result<Vec<u8>, Error> {
    if payload_len & (1 << 63) != 0 {
        return Err(Error::InvalidPayloadLength(payload_len));
    }

    let mut header = Vec::with_capacity(14);
    let fin_bit = if fin { 0x80 } else { 0x00 };
    header.push(fin_bit | opcode.bits());
    if payload_len < 126 {
        header.push(payload_len as u8);
    } else if payload_len <= 65535 {
        header.push(126);
        header.extend_from_slice(&(payload_len as u16).to_be_bytes());
    } else {
        header.push(127);
        header.extend_from_slice(&payload_len.to_be_bytes());
    }
    // マスクキー位置 (全ゼロ)
    header.extend_from_slice(&[0, 0, 0, 0]);
    Ok(header)
}

/// ペイロード込みの完全なフレームを組み立てる
pub fn encode_frame(fin: bool, opcode: Opcode, payload: &[u8]) -> Result<Vec<u8>, Error> {
    let mut out = build_frame_header(fin, opcode, payload.len() as u64)?;
    out.extend_from_slice(payload);
    Ok(out)
}
