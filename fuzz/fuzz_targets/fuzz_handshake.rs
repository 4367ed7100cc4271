#![no_main]

use libfuzzer_sys::fuzz_target;
use shiguredo_websock::{FeedProgress, RequestDecoder, handshake};

fuzz_target!(|data: &[u8]| {
    let mut decoder = RequestDecoder::new();
    if let Ok(FeedProgress::Complete { .. }) = decoder.feed(data) {
        let request = decoder.request().unwrap();
        if handshake::is_upgrade_request(&request) {
            if let Ok(response) = handshake::build_handshake_response(&request, None) {
                assert!(response.len() <= handshake::MAX_RESPONSE_LEN);
                assert!(response.starts_with("HTTP/1.1 101"));
            }
        }
        let _ = handshake::build_handshake_response(&request, Some("chat"));
    }
});
