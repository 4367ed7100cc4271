//! レコード構築用ステージングバッファ
//!
//! デコーダーインスタンスごとに 1 つ所有される追記専用バッファ。
//! 容量は倍々で成長し、縮小しない。`reset` で論理長だけを戻し、
//! 確保済みメモリは次のレコードで再利用する (アロケーション償却)。
//!
//! レコード構築中に発見されたフィールドはすべて [`Span`] (バッファ先頭
//! からの整数オフセット) として記録する。成長でバッファが再配置されても
//! オフセットは構成上そのまま有効である。スライスへの変換はレコード完了後、
//! バッファがそのレコードに対して凍結されてから行う。

use std::ops::Range;

use crate::error::Error;

/// バッファ内の区間 (オフセット + 長さ)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    pub fn range(self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// 追記専用の成長バッファ
#[derive(Debug, Default)]
pub(crate) struct RecordBuf {
    data: Vec<u8>,
}

impl RecordBuf {
    /// 初回確保サイズ
    const INITIAL_CAPACITY: usize = 256;

    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// `write_pos` 以降に `additional` バイト書き込める容量を確保する
    ///
    /// 容量は要求サイズを満たすまで倍々で成長する。確保に失敗した場合は
    /// `Error::OutOfMemory` を返し、レコードは未定義状態になるため
    /// 呼び出し側はインスタンスを破棄 (またはリセット) しなければならない。
    pub fn ensure_capacity(&mut self, write_pos: usize, additional: usize) -> Result<(), Error> {
        let needed = write_pos.checked_add(additional).ok_or(Error::OutOfMemory)?;
        if needed <= self.data.capacity() {
            return Ok(());
        }
        let mut target = self.data.capacity().max(Self::INITIAL_CAPACITY);
        while target < needed {
            target = target.checked_mul(2).ok_or(Error::OutOfMemory)?;
        }
        self.data
            .try_reserve(target - self.data.len())
            .map_err(|_| Error::OutOfMemory)
    }

    /// 書き込みカーソル位置 (次の空きオフセット)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn push(&mut self, byte: u8) {
        self.data.push(byte);
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// 保持しない行末尾を切り戻し、領域を次の行で再利用する
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// `pos` に 1 バイト挿入する (ヘッダー折返しのコンマ結合用)
    pub fn insert(&mut self, pos: usize, byte: u8) {
        self.data.insert(pos, byte);
    }

    /// 論理長をゼロに戻す (容量は保持)
    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn get(&self, span: Span) -> &[u8] {
        &self.data[span.range()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_doubles_and_never_shrinks() {
        let mut buf = RecordBuf::new();
        buf.ensure_capacity(0, 1).unwrap();
        assert!(buf.data.capacity() >= RecordBuf::INITIAL_CAPACITY);

        buf.ensure_capacity(0, 300).unwrap();
        let grown = buf.data.capacity();
        assert!(grown >= 512);

        buf.clear();
        assert_eq!(buf.len(), 0);
        assert_eq!(buf.data.capacity(), grown);
    }

    #[test]
    fn spans_stay_valid_across_growth() {
        let mut buf = RecordBuf::new();
        buf.extend_from_slice(b"hello");
        let span = Span::new(0, 5);

        // 成長後もオフセットは先頭相対なので有効なまま
        buf.ensure_capacity(buf.len(), 10_000).unwrap();
        buf.extend_from_slice(&[0u8; 10_000]);
        assert_eq!(buf.get(span), b"hello");
    }

    #[test]
    fn overflowing_request_is_oom() {
        let mut buf = RecordBuf::new();
        assert_eq!(
            buf.ensure_capacity(usize::MAX, 2),
            Err(Error::OutOfMemory)
        );
    }
}
