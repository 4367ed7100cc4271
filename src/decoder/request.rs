//! HTTP リクエストデコーダー
//!
//! 行指向の状態機械。任意のチャンク境界で分割された入力を受け付け、
//! 1 つのステージングバッファ ([`RecordBuf`]) を呼び出しをまたいで
//! 再利用する。構築中のフィールドはすべて整数オフセット ([`Span`]) で
//! 記録し、レコード完了までスライスを作らない。

use crate::buffer::{RecordBuf, Span};
use crate::error::Error;
use crate::limits::DecoderLimits;
use crate::request::{Method, Request};

use super::FeedProgress;
use super::phase::DecodePhase;

/// 1 リクエストあたりのヘッダー数上限 (プロトコル契約として固定)
pub const MAX_HEADERS: usize = 32;

/// HTTP リクエストデコーダー (Sans I/O)
///
/// サーバー側でクライアントからのリクエストをパースする際に使用。
/// 対応メソッドは GET / HEAD / POST のみ。chunked 転送、パーセント
/// デコード、TLS は扱わない。
///
/// # 使い方
///
/// ```rust
/// use shiguredo_websock::{FeedProgress, RequestDecoder};
///
/// let mut decoder = RequestDecoder::new();
/// let progress = decoder
///     .feed(b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello")
///     .unwrap();
/// assert!(matches!(progress, FeedProgress::Complete { .. }));
///
/// let request = decoder.request().unwrap();
/// assert_eq!(request.path(), "/echo");
/// assert_eq!(request.payload(), b"hello");
/// ```
#[derive(Debug)]
pub struct RequestDecoder {
    buf: RecordBuf,
    phase: DecodePhase,
    /// 論理行の開始カーソル
    line_start: usize,
    record: RequestRecord,
    limits: DecoderLimits,
    /// 致命的エラー発生後は reset まで同じエラーを返し続ける
    poisoned: Option<Error>,
}

/// 構築中レコードのフィールド (すべてオフセット記録)
#[derive(Debug, Default)]
struct RequestRecord {
    method: Option<Method>,
    path: Span,
    headers: Vec<(Span, Span)>,
    /// None はまだ未決定 (Content-Length 未出現)
    payload_len: Option<usize>,
    payload: Span,
}

impl RequestRecord {
    fn reset(&mut self) {
        self.method = None;
        self.path = Span::default();
        self.headers.clear();
        self.payload_len = None;
        self.payload = Span::default();
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestDecoder {
    /// 新しいデコーダーを作成
    pub fn new() -> Self {
        Self::with_limits(DecoderLimits::default())
    }

    /// 制限付きでデコーダーを作成
    pub fn with_limits(limits: DecoderLimits) -> Self {
        Self {
            buf: RecordBuf::new(),
            phase: DecodePhase::RequestLine,
            line_start: 0,
            record: RequestRecord::default(),
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
    /// 戻り値は [`FeedProgress`]。`Complete { consumed }` の `consumed` が
    /// `data.len()` より小さければ残りはストラグラーであり、完了済み
    /// レコードを読み取った後に `&data[consumed..]` を再投入する。
    ///
    /// 前のレコードが完了した状態で新しいデータを投入すると、レコード
    /// フィールドは暗黙にリセットされる (バッファ容量は保持)。空の入力は
    /// 何もせず、完了済みレコードも破棄しない。
    pub fn feed(&mut self, data: &[u8]) -> Result<FeedProgress, Error> {
        if let Some(error) = &self.poisoned {
            return Err(error.clone());
        }
        if self.phase == DecodePhase::Complete && !data.is_empty() {
            self.reset_record();
        }
        if let Err(error) = self.buf.ensure_capacity(self.buf.len(), data.len()) {
            return Err(self.fail(error));
        }

        let mut pos = 0;
        while pos < data.len() {
            match self.phase {
                DecodePhase::RequestLine | DecodePhase::Headers => {
                    let byte = data[pos];
                    pos += 1;
                    if byte == b'\r' {
                        // CR は捨てる
                        continue;
                    }
                    if byte == b'\n' {
                        if let Err(error) = self.dispatch_line() {
                            return Err(self.fail(error));
                        }
                    } else {
                        if self.buf.len() >= self.limits.max_buffer_size {
                            let error = Error::BufferOverflow {
                                size: self.buf.len() + 1,
                                limit: self.limits.max_buffer_size,
                            };
                            return Err(self.fail(error));
                        }
                        self.buf.push(byte);
                    }
                }
                DecodePhase::Payload { remaining } => {
                    // ペイロードは行処理なしの逐語コピー
                    let take = remaining.min(data.len() - pos);
                    if let Err(error) = self.buf.ensure_capacity(self.buf.len(), take) {
                        return Err(self.fail(error));
                    }
                    self.buf.extend_from_slice(&data[pos..pos + take]);
                    pos += take;
                    if remaining == take {
                        self.record.payload.len = self.buf.len() - self.record.payload.start;
                        self.phase = DecodePhase::Complete;
                    } else {
                        self.phase = DecodePhase::Payload {
                            remaining: remaining - take,
                        };
                    }
                }
                DecodePhase::Complete => break,
            }
            if self.phase == DecodePhase::Complete {
                return Ok(FeedProgress::Complete { consumed: pos });
            }
        }
        Ok(FeedProgress::NeedMore)
    }

    /// 完了済みリクエストを取得
    ///
    /// レコードが完了していなければ `None`。この時点でバッファは
    /// このレコードに対して凍結されており、記録済みオフセットを
    /// 借用スライスへ変換する (一括パス)。返されたビューは次の
    /// `feed` / `reset` まで有効。
    pub fn request(&self) -> Option<Request<'_>> {
        if self.phase != DecodePhase::Complete {
            return None;
        }
        let method = self.record.method?;
        let path = self.span_str(self.record.path)?;
        let mut headers = Vec::with_capacity(self.record.headers.len());
        for &(name, args) in &self.record.headers {
            headers.push((self.span_str(name)?, self.span_str(args)?));
        }
        Some(Request {
            method,
            path,
            headers,
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
        self.line_start = 0;
        self.record.reset();
        self.phase = DecodePhase::RequestLine;
    }

    fn fail(&mut self, error: Error) -> Error {
        self.poisoned = Some(error.clone());
        error
    }

    fn span_str(&self, span: Span) -> Option<&str> {
        // 行処理時に UTF-8 検証済みのため失敗しない
        std::str::from_utf8(self.buf.get(span)).ok()
    }

    /// LF 到達時の行ディスパッチ
    fn dispatch_line(&mut self) -> Result<(), Error> {
        match self.phase {
            DecodePhase::RequestLine => self.process_request_line(),
            DecodePhase::Headers => {
                if self.buf.len() == self.line_start {
                    // 空行 = ヘッダー終端
                    self.finish_headers()
                } else if matches!(self.buf.bytes()[self.line_start], b' ' | b'\t') {
                    self.process_fold_line()
                } else {
                    self.process_header_line()
                }
            }
            _ => Err(Error::InvalidState("line dispatch outside header phases")),
        }
    }

    /// リクエストライン処理
    ///
    /// `<METHOD> <PATH> <HTTP/1.0|HTTP/1.1>`。メソッドは大文字小文字を
    /// 区別し、直後にちょうど 1 個のスペースを要求する。プロトコル
    /// トークン以降の行末は検査しない。
    fn process_request_line(&mut self) -> Result<(), Error> {
        let start = self.line_start;
        let (method, method_len) = {
            let line = &self.buf.bytes()[start..];
            if line.starts_with(b"GET ") {
                (Method::Get, 4)
            } else if line.starts_with(b"HEAD ") {
                (Method::Head, 5)
            } else if line.starts_with(b"POST ") {
                (Method::Post, 5)
            } else {
                let token_len = line.iter().position(|&b| b == b' ').unwrap_or(line.len());
                let token = String::from_utf8_lossy(&line[..token_len]).into_owned();
                return Err(Error::InvalidMethod(token));
            }
        };

        let path_start = start + method_len;
        let path_len = {
            let line = self.buf.bytes();
            let rest = &line[path_start..];
            let path_len = rest
                .iter()
                .position(|&b| b == b' ' || b == b'\t')
                .ok_or_else(|| Error::InvalidRequestLine("missing protocol token".to_string()))?;
            if path_len == 0 {
                return Err(Error::InvalidRequestLine("missing path".to_string()));
            }
            let mut proto_start = path_start + path_len;
            while proto_start < line.len() && matches!(line[proto_start], b' ' | b'\t') {
                proto_start += 1;
            }
            let proto = &line[proto_start..];
            if !(proto.starts_with(b"HTTP/1.0") || proto.starts_with(b"HTTP/1.1")) {
                return Err(Error::InvalidVersion(
                    String::from_utf8_lossy(proto).into_owned(),
                ));
            }
            path_len
        };
        let path = Span::new(path_start, path_len);
        if std::str::from_utf8(self.buf.get(path)).is_err() {
            return Err(Error::InvalidData("path is not valid UTF-8".to_string()));
        }

        self.record.method = Some(method);
        self.record.path = path;
        // パスより後ろは保持しない。領域を次の行で再利用する
        self.buf.truncate(path_start + path_len);
        self.line_start = self.buf.len();
        self.phase = DecodePhase::Headers;
        Ok(())
    }

    /// 通常のヘッダー行処理
    ///
    /// 最初の空白またはコロンの連続で名前と引数リストに分割し、
    /// 名前は小文字へ正規化、引数はその場でスクランチする。
    fn process_header_line(&mut self) -> Result<(), Error> {
        if self.record.headers.len() >= MAX_HEADERS {
            return Err(Error::TooManyHeaders {
                count: self.record.headers.len() + 1,
                limit: MAX_HEADERS,
            });
        }

        let start = self.line_start;
        let end = self.buf.len();
        let (name_len, args_off) = {
            let line = &self.buf.bytes()[start..end];
            let name_len = line
                .iter()
                .position(|&b| matches!(b, b' ' | b'\t' | b':'))
                .unwrap_or(line.len());
            let mut args_off = name_len;
            while args_off < line.len() && matches!(line[args_off], b' ' | b'\t' | b':') {
                args_off += 1;
            }
            (name_len, args_off)
        };

        // 名前も引数もその場でスクランチする (名前は小文字へ正規化)
        let name_len = scrunch(&mut self.buf.bytes_mut()[start..start + name_len]);
        self.buf.bytes_mut()[start..start + name_len].make_ascii_lowercase();
        let args_start = start + args_off;
        let args_len = scrunch(&mut self.buf.bytes_mut()[args_start..end]);

        let name_span = Span::new(start, name_len);
        let args_span = Span::new(args_start, args_len);
        {
            let name = std::str::from_utf8(self.buf.get(name_span))
                .map_err(|e| Error::InvalidData(format!("invalid UTF-8 in header name: {e}")))?;
            let args = std::str::from_utf8(self.buf.get(args_span))
                .map_err(|e| Error::InvalidData(format!("invalid UTF-8 in header args: {e}")))?;
            match name {
                "content-length" => {
                    let value = args.split(',').next().unwrap_or(args);
                    let parsed = value
                        .parse::<usize>()
                        .map_err(|_| Error::InvalidContentLength(args.to_string()))?;
                    self.record.payload_len = Some(parsed);
                }
                "transfer-encoding" => {
                    // chunked のみ明示的な未対応エラー。他のコーディングは関知しない
                    if args.split(',').any(|token| token == "chunked") {
                        return Err(Error::UnsupportedTransferEncoding(args.to_string()));
                    }
                }
                _ => {}
            }
        }

        self.record.headers.push((name_span, args_span));
        // スクランチ後の引数末尾より後ろは保持しない
        self.buf.truncate(args_start + args_len);
        self.line_start = self.buf.len();
        Ok(())
    }

    /// 折返し行処理
    ///
    /// 直前ヘッダーの引数末尾と折返し行はバッファ上で連続している。
    /// 区切りにコンマを差し込み、結合した末尾全体を再スクランチする。
    fn process_fold_line(&mut self) -> Result<(), Error> {
        let args_start = match self.record.headers.last() {
            Some(&(_, args)) => args.start,
            None => return Err(Error::FoldWithoutHeader),
        };

        // コンマ挿入も ensure_capacity 経由で成長させる
        self.buf.ensure_capacity(self.buf.len(), 1)?;
        self.buf.insert(self.line_start, b',');
        let combined_len = scrunch(&mut self.buf.bytes_mut()[args_start..]);
        let span = Span::new(args_start, combined_len);
        if std::str::from_utf8(self.buf.get(span)).is_err() {
            return Err(Error::InvalidData(
                "invalid UTF-8 in folded header args".to_string(),
            ));
        }
        if let Some(last) = self.record.headers.last_mut() {
            last.1 = span;
        }
        self.buf.truncate(args_start + combined_len);
        self.line_start = self.buf.len();
        Ok(())
    }

    /// ヘッダー終端 (空行) の処理
    ///
    /// - ペイロード長未決定の POST はエラー (Content-Length 必須)
    /// - GET / HEAD は長さ 0 として即完了
    /// - 明示的に 0 なら即完了
    /// - それ以外はペイロードフェーズへ遷移
    fn finish_headers(&mut self) -> Result<(), Error> {
        let payload_len = match self.record.payload_len {
            None => {
                if self.record.method == Some(Method::Post) {
                    return Err(Error::MissingContentLength);
                }
                self.record.payload_len = Some(0);
                0
            }
            Some(len) => len,
        };

        if payload_len == 0 {
            self.record.payload = Span::new(self.buf.len(), 0);
            self.phase = DecodePhase::Complete;
            return Ok(());
        }

        if payload_len > self.limits.max_payload_size {
            return Err(Error::PayloadTooLarge {
                size: payload_len as u64,
                limit: self.limits.max_payload_size,
            });
        }
        self.record.payload = Span::new(self.buf.len(), 0);
        self.phase = DecodePhase::Payload {
            remaining: payload_len,
        };
        Ok(())
    }
}

/// 引数リストの空白/コンマ正規化 (その場で縮む)
///
/// 空白・タブ・コンマの連続を 1 つの区切りへ潰す。連続中にコンマが
/// 含まれていればコンマ、そうでなければスペース 1 個になる
/// (引数値内部の単一スペースは保持)。先頭と末尾の区切りは捨てる。
/// 戻り値は正規化後の長さ。
pub(crate) fn scrunch(bytes: &mut [u8]) -> usize {
    let mut write = 0;
    let mut read = 0;
    let mut pending: Option<u8> = None;
    while read < bytes.len() {
        let byte = bytes[read];
        if matches!(byte, b' ' | b'\t' | b',') {
            let mut separator = if byte == b',' { b',' } else { b' ' };
            read += 1;
            while read < bytes.len() && matches!(bytes[read], b' ' | b'\t' | b',') {
                if bytes[read] == b',' {
                    separator = b',';
                }
                read += 1;
            }
            if write > 0 {
                pending = Some(separator);
            }
        } else {
            if let Some(separator) = pending.take() {
                bytes[write] = separator;
                write += 1;
            }
            bytes[write] = byte;
            write += 1;
            read += 1;
        }
    }
    write
}
