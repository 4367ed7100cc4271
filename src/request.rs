//! パース済み HTTP リクエストの公開ビュー

use std::fmt;

/// HTTP メソッド (対応するのは 3 種のみ)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Post,
}

impl Method {
    /// ワイヤ上の表記
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// パース済みリクエスト (完了済みレコードの読み取りビュー)
///
/// [`crate::RequestDecoder::request`] が完了後にのみ返す。
/// すべてのスライスはデコーダー内部バッファを借用しており、
/// 次の `feed` / `reset` まで有効。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request<'a> {
    pub(crate) method: Method,
    pub(crate) path: &'a str,
    pub(crate) headers: Vec<(&'a str, &'a str)>,
    pub(crate) payload: &'a [u8],
}

impl<'a> Request<'a> {
    pub fn method(&self) -> Method {
        self.method
    }

    /// リクエストパス
    ///
    /// パーセントエスケープ (`%20` 等) はデコードされず、そのまま保持される。
    pub fn path(&self) -> &'a str {
        self.path
    }

    /// ヘッダー一覧 (出現順)
    ///
    /// 名前は小文字に正規化済み。引数リストは空白を除去しコンマで
    /// 結合済み (折返し行も結合済み)。
    pub fn headers(&self) -> &[(&'a str, &'a str)] {
        &self.headers
    }

    /// ヘッダーの引数リストを名前で取得 (大文字小文字を区別する完全一致)
    ///
    /// 名前は小文字に正規化されているため、小文字で照会すること。
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, args)| *args)
    }

    /// ペイロード (Content-Length で宣言されたバイト列そのまま)
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}
