//! パース済み WebSocket フレームの公開ビュー

use std::fmt;

/// WebSocket オペコード (RFC 6455 Section 5.2)
///
/// ここに列挙されていない 4 ビット値はハードエラー (`Error::BadOpcode`)。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    /// 継続フレーム (受理はするが、メッセージ再構成は行わない)
    Cont,
    Text,
    Bin,
    Close,
    Ping,
    Pong,
}

impl Opcode {
    /// 4 ビット値からの変換
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0x0 => Some(Opcode::Cont),
            0x1 => Some(Opcode::Text),
            0x2 => Some(Opcode::Bin),
            0x8 => Some(Opcode::Close),
            0x9 => Some(Opcode::Ping),
            0xA => Some(Opcode::Pong),
            _ => None,
        }
    }

    /// ワイヤ上の 4 ビット値
    pub fn bits(&self) -> u8 {
        match self {
            Opcode::Cont => 0x0,
            Opcode::Text => 0x1,
            Opcode::Bin => 0x2,
            Opcode::Close => 0x8,
            Opcode::Ping => 0x9,
            Opcode::Pong => 0xA,
        }
    }

    /// 制御フレーム (Close / Ping / Pong) かどうか
    pub fn is_control(&self) -> bool {
        matches!(self, Opcode::Close | Opcode::Ping | Opcode::Pong)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::Cont => "CONT",
            Opcode::Text => "TEXT",
            Opcode::Bin => "BIN",
            Opcode::Close => "CLOSE",
            Opcode::Ping => "PING",
            Opcode::Pong => "PONG",
        };
        f.write_str(name)
    }
}

/// パース済みフレーム (完了済みレコードの読み取りビュー)
///
/// [`crate::FrameDecoder::frame`] が完了後にのみ返す。
/// ペイロードはアンマスク済みで、デコーダー内部バッファを借用している。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<'a> {
    pub(crate) opcode: Opcode,
    pub(crate) fin: bool,
    pub(crate) payload: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn fin(&self) -> bool {
        self.fin
    }

    pub fn payload_len(&self) -> u64 {
        self.payload.len() as u64
    }

    /// アンマスク済みペイロード
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_bits_roundtrip() {
        for opcode in [
            Opcode::Cont,
            Opcode::Text,
            Opcode::Bin,
            Opcode::Close,
            Opcode::Ping,
            Opcode::Pong,
        ] {
            assert_eq!(Opcode::from_bits(opcode.bits()), Some(opcode));
        }
    }

    #[test]
    fn reserved_opcodes_rejected() {
        for bits in [0x3, 0x4, 0x5, 0x6, 0x7, 0xB, 0xC, 0xD, 0xE, 0xF] {
            assert_eq!(Opcode::from_bits(bits), None);
        }
    }
}
