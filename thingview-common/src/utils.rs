//! Pure helpers shared by the renderers.

use crate::capabilities::light::Color;

/// Escapes text for use inside HTML content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }

    out
}

/// Turns arbitrary text into something usable as an element id or class name.
///
/// Everything outside `[_a-zA-Z0-9-]` becomes `_`, and a leading digit or dash
/// gets a `_` prefix.
pub fn escape_html_for_id_class(text: &str) -> String {
    let mut out = text
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect::<String>();

    if out.starts_with(|c: char| c.is_ascii_digit() || c == '-') {
        out.insert(0, '_');
    }

    out
}

/// Approximates the RGB color of a black body at the given temperature in
/// kelvin (Tanner Helland's fit).
pub fn color_temperature_to_rgb(kelvin: f64) -> Color {
    let temp = kelvin / 100.0;

    let (r, g) = if temp <= 66.0 {
        (255.0, 99.470_802_586_1 * temp.ln() - 161.119_568_166_1)
    } else {
        (
            329.698_727_446 * (temp - 60.0).powf(-0.133_204_759_2),
            288.122_169_528_3 * (temp - 60.0).powf(-0.075_514_849_2),
        )
    };

    let b = if temp >= 66.0 {
        255.0
    } else if temp <= 19.0 {
        0.0
    } else {
        138.517_731_223_1 * (temp - 10.0).ln() - 305.044_792_730_7
    };

    Color { r: channel(r), g: channel(g), b: channel(b) }
}

fn channel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }

    value.clamp(0.0, 255.0).round() as u8
}
