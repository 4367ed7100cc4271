/// デコーダーの制限設定
///
/// HTTP ヘッダー数の上限 (32) はプロトコル契約の一部であり、
/// ここではなく [`crate::MAX_HEADERS`] で固定されている。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderLimits {
    /// 最大バッファサイズ (デフォルト: 64KB)
    ///
    /// ペイロード前のフェーズ (リクエストライン + ヘッダー、または
    /// フレームヘッダー) でステージングバッファへ蓄積できる上限。
    /// ペイロード自体は `max_payload_size` で制限される。
    pub max_buffer_size: usize,
    /// 最大ペイロードサイズ (デフォルト: 10MB)
    ///
    /// HTTP の Content-Length、および WebSocket フレームの
    /// ペイロード長の宣言値に対してヘッダー解析時点で検査される。
    pub max_payload_size: usize,
}

impl Default for DecoderLimits {
    fn default() -> Self {
        Self {
            max_buffer_size: 64 * 1024,      // 64KB
            max_payload_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl DecoderLimits {
    /// 制限なしの設定を作成
    pub fn unlimited() -> Self {
        Self {
            max_buffer_size: usize::MAX,
            max_payload_size: usize::MAX,
        }
    }
}
