use once_cell::sync::Lazy;
use regex::Regex;

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid hex colour regex"));

fn is_hex_color(value: &str) -> bool {
    HEX_COLOR.is_match(value.trim())
}

/// Normalise `#RGB` / `#RRGGBB` to lowercase `#rrggbb`. Returns `None` for anything else.
pub fn normalize_hex_color(value: &str) -> Option<String> {
    let value = value.trim();
    if !is_hex_color(value) {
        return None;
    }
    let digits = &value[1..];
    let expanded: String = if digits.len() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits.to_string()
    };
    Some(format!("#{}", expanded.to_ascii_lowercase()))
}
