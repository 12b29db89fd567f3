// crates/quill-federation/src/sanitizer.rs

use quill_core::traits::ContentSanitizer;

/// Keeps ammonia's allow-list of formatting tags and strips everything
/// else: scripts, event handlers, unsafe URL schemes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSanitizer;

impl ContentSanitizer for HtmlSanitizer {
    fn sanitize(&self, content: &str) -> String {
        // Control characters other than line breaks and tabs are dropped.
        let printable: String = content
            .chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
            .collect();
        ammonia::clean(printable.trim()).trim().to_string()
    }
}
