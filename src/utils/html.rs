// src/utils/html.rs

/// Clean teacher-authored HTML using the ammonia library.
///
/// Whitelist-based: safe formatting tags (like <b>, <p>) survive while
/// <script>, <iframe> and event-handler attributes are stripped, so quiz text
/// can be rendered as rich text by clients without enabling stored XSS.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
