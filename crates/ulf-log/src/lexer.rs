/// Characters allowed between the brackets of the timestamp segment,
/// e.g. `2021/08/04 12:00:43.128 +08:00`.
pub fn is_datetime_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '/' | ' ' | ':' | '.' | '+' | '-')
}

/// Characters allowed in the level segment. Only the uppercase spelling is
/// accepted on the wire even though [`Level`](crate::Level) parsing itself is
/// case-insensitive.
pub fn is_level_char(c: char) -> bool {
    c.is_ascii_uppercase()
}

/// Characters allowed in the file name half of a `file:line` location.
pub fn is_filename_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}

pub fn is_line_number_char(c: char) -> bool {
    c.is_ascii_digit()
}

/// Characters allowed in the `<unknown>` location marker.
pub fn is_unknown_location_char(c: char) -> bool {
    c.is_ascii_lowercase() || matches!(c, '<' | '>')
}

/// Characters allowed in an unquoted string literal.
///
/// Control characters, space, and the structural characters `"`, `=`, `[`,
/// `]` terminate a bare literal.
pub fn is_bare_literal_char(c: char) -> bool {
    !(c <= '\u{20}' || matches!(c, '"' | '=' | '[' | ']'))
}
