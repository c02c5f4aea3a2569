// src/utils/html.rs

/// Sanitizes markup in teacher-entered text (question text, class names, quiz titles).
///
/// Uses ammonia's whitelist sanitizer, so harmless formatting tags survive while
/// `<script>`, `<iframe>` and event-handler attributes are removed.
/// Not applied to answers or options.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_scripts_keeps_formatting() {
        let cleaned = clean_html("What is <b>2+2</b>?<script>alert(1)</script>");
        assert_eq!(cleaned, "What is <b>2+2</b>?");
    }
}
