use core::{fmt::Display, str::FromStr};

/// Red, green, blue, each 0-255. Written as `#rrggbb` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl FromStr for Color {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').ok_or("color must start with #")?;

        if hex.len() != 6 || !hex.is_ascii() {
            return Err("color must be #rrggbb");
        }

        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| "color must be hexadecimal")
        };

        Ok(Color { r: channel(0)?, g: channel(2)?, b: channel(4)? })
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
