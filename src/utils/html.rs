// src/utils/html.rs

/// Strips dangerous markup from teacher-supplied list titles.
///
/// Whitelist-based: harmless inline tags such as <b> survive, while <script>
/// (with its content), <iframe> and event-handler attributes are removed.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
