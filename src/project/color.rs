use crate::foundation::core::Rgba8;

/// Parse a `#RRGGBB` / `#RRGGBBAA` color string (the `#` is optional, hex digits are
/// case-insensitive).
pub fn parse_color(input: &str) -> Option<Rgba8> {
    let s = input.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    fn hex_byte(pair: &str) -> Option<u8> {
        u8::from_str_radix(pair, 16).ok()
    }

    if !s.is_ascii() {
        return None;
    }
    match s.len() {
        6 => Some(Rgba8 {
            r: hex_byte(&s[0..2])?,
            g: hex_byte(&s[2..4])?,
            b: hex_byte(&s[4..6])?,
            a: 255,
        }),
        8 => Some(Rgba8 {
            r: hex_byte(&s[0..2])?,
            g: hex_byte(&s[2..4])?,
            b: hex_byte(&s[4..6])?,
            a: hex_byte(&s[6..8])?,
        }),
        _ => None,
    }
}

/// Lenient variant used for persisted graphic colors: unparsable strings fall back to
/// opaque black instead of failing the run.
pub fn color_or_black(input: &str) -> Rgba8 {
    parse_color(input).unwrap_or(Rgba8::BLACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_rgb_and_rgba() {
        assert_eq!(parse_color("#ff0000"), Some(Rgba8::opaque(255, 0, 0)));
        assert_eq!(parse_color("00FF00"), Some(Rgba8::opaque(0, 255, 0)));
        assert_eq!(
            parse_color("#0000ff80"),
            Some(Rgba8 {
                r: 0,
                g: 0,
                b: 255,
                a: 128
            })
        );
    }

    #[test]
    fn garbage_falls_back_to_black() {
        assert_eq!(parse_color("not-a-color"), None);
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(color_or_black(""), Rgba8::BLACK);
        assert_eq!(color_or_black("#zzzzzz"), Rgba8::BLACK);
        assert_eq!(color_or_black("#ffffff"), Rgba8::WHITE);
    }
}
