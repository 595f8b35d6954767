//! Filename sanitization utilities

/// Sanitize a custom output name for safe filesystem usage
///
/// Replaces filesystem-unsafe characters with visually similar Unicode
/// alternatives so titles survive unchanged on FAT-formatted players.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' => '⧸',  // U+29F8 - Big Solidus
            '\\' => '⧹', // U+29F9 - Big Reverse Solidus
            ':' => '꞉',  // U+A789 - Modifier Letter Colon
            '*' => '⁎',  // U+204E - Low Asterisk
            '?' => '？', // U+FF1F - Fullwidth Question Mark
            '"' => '″',  // U+2033 - Double Prime
            '<' => '‹',  // U+2039 - Single Left Angle Quote
            '>' => '›',  // U+203A - Single Right Angle Quote
            '|' => '｜', // U+FF5C - Fullwidth Vertical Line
            '\0' => '_', // Null byte has no good lookalike
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}
