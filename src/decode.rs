use std::borrow::Cow;

/// Percent-decode a listing name and repair double-encoded UTF-8.
///
/// Storage listings escape names byte-wise, and some of them were encoded from
/// text that had already been through a Latin-1 round trip (`Ã©` instead of
/// `é`). When every decoded char fits in Latin-1 the bytes are re-read as
/// UTF-8; if that fails the plain percent-decoded text is kept.
pub fn decode_special_chars(text: &str) -> String {
    let bytes = urlencoding::decode_binary(text.as_bytes());
    let decoded = String::from_utf8_lossy(&bytes).into_owned();

    match repair_latin1_mojibake(&decoded) {
        Some(repaired) => repaired,
        None => decoded,
    }
}

fn repair_latin1_mojibake(text: &str) -> Option<String> {
    if !encoding_rs::mem::is_str_latin1(text) {
        return None;
    }

    let latin1 = encoding_rs::mem::encode_latin1_lossy(text);
    match String::from_utf8(latin1.into_owned()) {
        Ok(repaired) => Some(repaired),
        Err(e) => {
            tracing::debug!(text, error = %e, "Keeping percent-decoded name");
            None
        }
    }
}

/// Percent-encode a URL, leaving `:` and `/` untouched.
pub fn encode_url(url: &str) -> String {
    url.split('/')
        .map(|segment| {
            segment
                .split(':')
                .map(urlencoding::encode)
                .collect::<Vec<Cow<'_, str>>>()
                .join(":")
        })
        .collect::<Vec<String>>()
        .join("/")
}
