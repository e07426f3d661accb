// src/utils/sanitize.rs

/// Clean user-supplied rich text using the ammonia library.
///
/// Rating comments and question explanations accept limited markup from
/// the authoring UI; this strips script tags and event-handler attributes
/// while keeping safe inline formatting.
pub fn clean_rich_text(input: &str) -> String {
    ammonia::clean(input)
}
