#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use shiguredo_websock::{DecoderLimits, FeedProgress, RequestDecoder};

#[derive(Arbitrary, Debug)]
struct FuzzPlan {
    max_buffer_size: u16,
    max_payload_size: u16,
    chunk_sizes: Vec<u8>,
    data: Vec<u8>,
}

fuzz_target!(|input: FuzzPlan| {
    // データを一度に feed
    let mut decoder = RequestDecoder::new();
    if let Ok(FeedProgress::Complete { consumed }) = decoder.feed(&input.data) {
        assert!(consumed <= input.data.len());
        let request = decoder.request().unwrap();
        let _ = request.path();
        let _ = request.headers();
        let _ = request.payload();
    }

    // 計画どおりのチャンク分割で feed (ストリーミングシナリオ)
    let limits = DecoderLimits {
        max_buffer_size: input.max_buffer_size as usize + 1,
        max_payload_size: input.max_payload_size as usize,
    };
    let mut decoder = RequestDecoder::with_limits(limits);
    let mut sizes = input.chunk_sizes.iter().copied();
    let mut offset = 0;
    while offset < input.data.len() {
        let size = sizes.next().unwrap_or(16) as usize + 1;
        let end = (offset + size).min(input.data.len());
        match decoder.feed(&input.data[offset..end]) {
            Ok(FeedProgress::NeedMore) => offset = end,
            Ok(FeedProgress::Complete { consumed }) => {
                // ストラグラーは次のレコードとして再投入する
                assert!(consumed >= 1 && consumed <= end - offset);
                let _ = decoder.request().unwrap();
                offset += consumed;
            }
            Err(_) => return,
        }
    }
});
