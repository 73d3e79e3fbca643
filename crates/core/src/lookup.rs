use url::form_urlencoded;

const LOOKUP_BASE: &str = "https://lmgtfy.com/?q=";

/// Builds the "let me google it for you" link offered after a round is
/// exhausted. The answer text is form-encoded as the search query.
pub fn lookup_link(answer: &str) -> String {
    let query: String = form_urlencoded::byte_serialize(answer.as_bytes()).collect();
    format!("{LOOKUP_BASE}{query}")
}
