//! RequestDecoder のプロパティテスト

use pbt::{build_get_request, build_post_request, header_value, headers, payload, request_path};
use proptest::prelude::*;
use shiguredo_websock::{FeedProgress, RequestDecoder};

/// 一括投入でデコードし、比較可能な形へ写し取る
fn decode_whole(input: &[u8]) -> (String, Vec<(String, String)>, Vec<u8>) {
    let mut decoder = RequestDecoder::new();
    let progress = decoder.feed(input).unwrap();
    assert_eq!(
        progress,
        FeedProgress::Complete {
            consumed: input.len()
        }
    );
    let request = decoder.request().unwrap();
    (
        request.path().to_string(),
        request
            .headers()
            .iter()
            .map(|(n, a)| (n.to_string(), a.to_string()))
            .collect(),
        request.payload().to_vec(),
    )
}

proptest! {
    /// チャンク境界はデコード結果に影響しない
    #[test]
    fn chunking_is_invisible(
        path in request_path(),
        headers in headers(),
        payload in payload(),
        chunk_size in 1usize..64,
    ) {
        let input = build_post_request(&path, &headers, &payload);
        let expected = decode_whole(&input);

        let mut decoder = RequestDecoder::new();
        let mut completed = false;
        for chunk in input.chunks(chunk_size) {
            if let FeedProgress::Complete { consumed } = decoder.feed(chunk).unwrap() {
                prop_assert_eq!(consumed, chunk.len());
                completed = true;
            }
        }
        prop_assert!(completed);
        let request = decoder.request().unwrap();
        prop_assert_eq!(request.path(), expected.0);
        prop_assert_eq!(request.payload(), expected.2.as_slice());
        let got: Vec<_> = request
            .headers()
            .iter()
            .map(|(n, a)| (n.to_string(), a.to_string()))
            .collect();
        prop_assert_eq!(got, expected.1);
    }

    /// ヘッダー名は小文字へ正規化され、値は保持される
    #[test]
    fn header_names_normalized(path in request_path(), headers in headers()) {
        let input = build_get_request(&path, &headers);
        let (_, decoded, _) = decode_whole(&input);
        prop_assert_eq!(decoded.len(), headers.len());
        for ((got_name, got_args), (name, value)) in decoded.iter().zip(&headers) {
            prop_assert_eq!(got_name, &name.to_ascii_lowercase());
            prop_assert_eq!(got_args, value);
        }
    }

    /// 折返し行はコンマ結合した 1 行と等価
    #[test]
    fn fold_equals_comma_join(
        first in header_value(),
        second in header_value(),
        fold_ws in "[ \t]{1,4}",
    ) {
        let folded = format!(
            "GET / HTTP/1.1\r\nX-List: {}\r\n{}{}\r\n\r\n",
            first, fold_ws, second
        );
        let unfolded = format!("GET / HTTP/1.1\r\nX-List: {},{}\r\n\r\n", first, second);
        prop_assert_eq!(decode_whole(folded.as_bytes()), decode_whole(unfolded.as_bytes()));
    }

    /// 2 リクエスト連結時、ストラグラー再投入で両方デコードできる
    #[test]
    fn concatenated_requests_via_stragglers(
        first_path in request_path(),
        second_path in request_path(),
        payload in payload(),
    ) {
        let first = build_post_request(&first_path, &[], &payload);
        let second = build_get_request(&second_path, &[]);
        let mut input = first.clone();
        input.extend_from_slice(&second);

        let mut decoder = RequestDecoder::new();
        let progress = decoder.feed(&input).unwrap();
        prop_assert_eq!(progress, FeedProgress::Complete { consumed: first.len() });
        prop_assert_eq!(decoder.request().unwrap().path(), first_path.as_str());

        let progress = decoder.feed(&input[first.len()..]).unwrap();
        prop_assert_eq!(progress, FeedProgress::Complete { consumed: second.len() });
        prop_assert_eq!(decoder.request().unwrap().path(), second_path.as_str());
    }

    /// ペイロードは逐語コピー (CR/LF を含む任意バイトが保持される)
    #[test]
    fn payload_verbatim(payload in payload()) {
        let input = build_post_request("/p", &[], &payload);
        let (_, _, decoded) = decode_whole(&input);
        prop_assert_eq!(decoded, payload);
    }
}
