#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_websock::{DecoderLimits, FeedProgress, FrameDecoder};

fuzz_target!(|data: &[u8]| {
    let limits = DecoderLimits {
        max_payload_size: 1024 * 1024,
        ..DecoderLimits::default()
    };

    // データを一度に feed
    let mut decoder = FrameDecoder::with_limits(limits.clone());
    if let Ok(FeedProgress::Complete { consumed }) = decoder.feed(data) {
        assert!(consumed <= data.len());
        let frame = decoder.frame().unwrap();
        assert_eq!(frame.payload_len(), frame.payload().len() as u64);
    }

    // データを分割して feed (ストリーミングシナリオ)
    let mut decoder = FrameDecoder::with_limits(limits);
    for chunk in data.chunks(7) {
        match decoder.feed(chunk) {
            Ok(FeedProgress::NeedMore) => {}
            Ok(FeedProgress::Complete { .. }) => {
                let _ = decoder.frame().unwrap();
            }
            Err(_) => break,
        }
    }
});
