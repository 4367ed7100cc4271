//! WebSocket フレームデコーダー
//!
//! RFC 6455 Section 5.2 のフレームヘッダーを固定長フェーズで読み進める
//! 状態機械。ヘッダー長は先頭 2 バイトだけで確定する (2 + 長さ拡張
//! 0/2/8 + マスクキー 4)。ペイロードは投入されたそばからアンマスク
//! しつつステージングバッファへ複写する。

use crate::buffer::{RecordBuf, Span};
use crate::error::Error;
use crate::frame::{Frame, Opcode};
use crate::limits::DecoderLimits;

use super::FeedProgress;
use super::phase::FramePhase;

/// フレームヘッダーの最大長 (2 + 8 + 4)
const MAX_HEADER_LEN: usize = 14;

/// WebSocket フレームデコーダー (Sans I/O)
///
/// マスクキー 4 バイトは常に読み取る。マスクビットが立っていない
/// フレームはキーが全ゼロであることを期待する (XOR が恒等になる)。
///
/// # 使い方
///
/// ```rust
/// use shiguredo_websock::{FeedProgress, FrameDecoder, Opcode};
///
/// let mut decoder = FrameDecoder::new();
/// // マスク済み "Hello" テキストフレーム
/// let input = [
///     0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58,
/// ];
/// let progress = decoder.feed(&input).unwrap();
/// assert!(matches!(progress, FeedProgress::Complete { .. }));
///
/// let frame = decoder.frame().unwrap();
/// assert_eq!(frame.opcode(), Opcode::Text);
/// assert_eq!(frame.payload(), b"Hello");
/// ```
#[derive(Debug)]
pub struct FrameDecoder {
    buf: RecordBuf,
    phase: FramePhase,
    record: FrameRecord,
    limits: DecoderLimits,
    /// 致命的エラー発生後は reset まで同じエラーを返し続ける
    poisoned: Option<Error>,
}

#[derive(Debug, Default)]
struct FrameRecord {
    opcode: Option<Opcode>,
    fin: bool,
    mask: [u8; 4],
    payload_len: u64,
    payload: Span,
}

impl FrameRecord {
    fn reset(&mut self) {
        self.opcode = None;
        self.fin = false;
        self.mask = [0; 4];
        self.payload_len = 0;
        self.payload = Span::default();
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// 新しいデコーダーを作成
    pub fn new() -> Self {
        Self::with_limits(DecoderLimits::default())
    }

    /// 制限付きでデコーダーを作成
    pub fn with_limits(limits: DecoderLimits) -> Self {
        Self {
            buf: RecordBuf::new(),
            phase: FramePhase::Prefix,
            record: FrameRecord::default(),
            limits,
            poisoned: None,
        }
    }

    /// 制限設定を取得
    pub fn limits(&self) -> &DecoderLimits {
        &self.limits
    }

    /// バイト列を投入して状態機械を進める
    ///
    /// 契約は [`crate::RequestDecoder::feed`] と同一。`Complete { consumed }`
    /// の `consumed` が入力長より小さければ残りは次フレームの先頭として
    /// 再投入する。前のフレームが完了した状態で新しいデータを投入すると
    /// 暗黙にリセットされる (空の入力は完了済みフレームを破棄しない)。
    pub fn feed(&mut self, data: &[u8]) -> Result<FeedProgress, Error> {
        if let Some(error) = &self.poisoned {
            return Err(error.clone());
        }
        if self.phase == FramePhase::Complete && !data.is_empty() {
            self.reset_record();
        }

        let mut pos = 0;
        while pos < data.len() {
            match self.phase {
                FramePhase::Prefix => {
                    if let Err(error) = self.push_header_byte(data[pos]) {
                        return Err(self.fail(error));
                    }
                    pos += 1;
                    if self.buf.len() == 2 {
                        if let Err(error) = self.process_prefix() {
                            return Err(self.fail(error));
                        }
                    }
                }
                FramePhase::HeaderRest { header_len } => {
                    if let Err(error) = self.push_header_byte(data[pos]) {
                        return Err(self.fail(error));
                    }
                    pos += 1;
                    if self.buf.len() == header_len {
                        if let Err(error) = self.finish_header(header_len) {
                            return Err(self.fail(error));
                        }
                    }
                }
                FramePhase::Payload { remaining } => {
                    let take = remaining.min((data.len() - pos) as u64) as usize;
                    if let Err(error) = self.buf.ensure_capacity(self.buf.len(), take) {
                        return Err(self.fail(error));
                    }
                    // 複写と同時にアンマスク
                    let done = (self.record.payload_len - remaining) as usize;
                    let write_start = self.buf.len();
                    self.buf.extend_from_slice(&data[pos..pos + take]);
                    let mask = self.record.mask;
                    for (i, byte) in self.buf.bytes_mut()[write_start..].iter_mut().enumerate() {
                        *byte ^= mask[(done + i) % 4];
                    }
                    pos += take;
                    if remaining == take as u64 {
                        self.record.payload.len = self.buf.len() - self.record.payload.start;
                        self.phase = FramePhase::Complete;
                    } else {
                        self.phase = FramePhase::Payload {
                            remaining: remaining - take as u64,
                        };
                    }
                }
                FramePhase::Complete => break,
            }
            if self.phase == FramePhase::Complete {
                return Ok(FeedProgress::Complete { consumed: pos });
            }
        }
        Ok(FeedProgress::NeedMore)
    }

    /// 完了済みフレームを取得
    ///
    /// フレームが完了していなければ `None`。ペイロードはアンマスク済みで
    /// デコーダー内部バッファを借用している。次の `feed` / `reset` まで有効。
    pub fn frame(&self) -> Option<Frame<'_>> {
        if self.phase != FramePhase::Complete {
            return None;
        }
        Some(Frame {
            opcode: self.record.opcode?,
            fin: self.record.fin,
            payload: self.buf.get(self.record.payload),
        })
    }

    /// デコーダーをリセット (エラー状態も解除、バッファ容量は保持)
    pub fn reset(&mut self) {
        self.poisoned = None;
        self.reset_record();
    }

    fn reset_record(&mut self) {
        self.buf.clear();
        self.record.reset();
        self.phase = FramePhase::Prefix;
    }

    fn fail(&mut self, error: Error) -> Error {
        self.poisoned = Some(error.clone());
        error
    }

    fn push_header_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.buf.ensure_capacity(self.buf.len(), MAX_HEADER_LEN)?;
        self.buf.push(byte);
        Ok(())
    }

    /// 先頭 2 バイトからオペコードを検証し、総ヘッダー長を確定する
    fn process_prefix(&mut self) -> Result<(), Error> {
        let prefix = self.buf.bytes()[0];
        let opcode = Opcode::from_bits(prefix & 0x0F)
            .ok_or(Error::BadOpcode(prefix & 0x0F))?;
        self.record.opcode = Some(opcode);
        self.record.fin = prefix & 0x80 != 0;

        let len7 = self.buf.bytes()[1] & 0x7F;
        let extension = match len7 {
            126 => 2,
            127 => 8,
            _ => 0,
        };
        self.phase = FramePhase::HeaderRest {
            header_len: 2 + extension + 4,
        };
        Ok(())
    }

    /// ヘッダー全体が揃った時点でペイロード長とマスクキーを確定する
    fn finish_header(&mut self, header_len: usize) -> Result<(), Error> {
        let header = self.buf.bytes();
        let len7 = header[1] & 0x7F;
        let payload_len = match len7 {
            126 => {
                let mut ext = [0u8; 2];
                ext.copy_from_slice(&header[2..4]);
                u64::from(u16::from_be_bytes(ext))
            }
            127 => {
                let mut ext = [0u8; 8];
                ext.copy_from_slice(&header[2..10]);
                u64::from_be_bytes(ext)
            }
            _ => u64::from(len7),
        };
        // 最上位ビットは RFC 6455 で常に 0
        if payload_len & (1 << 63) != 0 {
            return Err(Error::InvalidPayloadLength(payload_len));
        }
        if payload_len > self.limits.max_payload_size as u64 {
            return Err(Error::PayloadTooLarge {
                size: payload_len,
                limit: self.limits.max_payload_size,
            });
        }
        let mut mask = [0u8; 4];
        mask.copy_from_slice(&header[header_len - 4..header_len]);

        self.record.mask = mask;
        self.record.payload_len = payload_len;
        self.record.payload = Span::new(self.buf.len(), 0);
        if payload_len == 0 {
            self.phase = FramePhase::Complete;
        } else {
            self.phase = FramePhase::Payload {
                remaining: payload_len,
            };
        }
        Ok(())
    }
}
