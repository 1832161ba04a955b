use ratatui::style::{Color, Modifier, Style};

/// Anchor colors supplied by the palette provider. Everything the screens
/// render derives from these five colors plus the terminal's ANSI palette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub primary: Color,
    pub secondary: Color,
    pub background: Color,
    pub surface: Color,
    pub foreground: Color,
}

struct NamedPalette {
    name: &'static str,
    light: Palette,
    dark: Palette,
}

const PALETTES: &[NamedPalette] = &[
    NamedPalette {
        name: "default",
        light: Palette {
            primary: Color::Rgb(0x7D, 0x56, 0xF4),
            secondary: Color::Rgb(0x2B, 0x6E, 0x85),
            background: Color::Rgb(0xF4, 0xF4, 0xF4),
            surface: Color::Rgb(0x55, 0x55, 0x55),
            foreground: Color::Rgb(0x1A, 0x1A, 0x1A),
        },
        dark: Palette {
            primary: Color::Rgb(0x9B, 0x7D, 0xFF),
            secondary: Color::Rgb(0x58, 0x9E, 0xBF),
            background: Color::Rgb(0x10, 0x10, 0x14),
            surface: Color::Rgb(0x99, 0x99, 0x99),
            foreground: Color::Rgb(0xF1, 0xF1, 0xF1),
        },
    },
    NamedPalette {
        name: "forest",
        light: Palette {
            primary: Color::Rgb(0x23, 0x7A, 0x4F),
            secondary: Color::Rgb(0x4E, 0x80, 0x6A),
            background: Color::Rgb(0xEF, 0xF5, 0xEE),
            surface: Color::Rgb(0x5E, 0x6D, 0x5E),
            foreground: Color::Rgb(0x1C, 0x26, 0x1C),
        },
        dark: Palette {
            primary: Color::Rgb(0x6C, 0xC5, 0x8B),
            secondary: Color::Rgb(0x7F, 0xB5, 0xA3),
            background: Color::Rgb(0x12, 0x1A, 0x12),
            surface: Color::Rgb(0x86, 0x96, 0x86),
            foreground: Color::Rgb(0xD6, 0xE2, 0xD2),
        },
    },
];

/// Look up a palette variant by name. Unknown names fall back to "default".
pub fn palette(name: &str, is_dark: bool) -> Palette {
    let named = PALETTES
        .iter()
        .find(|p| p.name == name)
        .unwrap_or(&PALETTES[0]);
    if is_dark {
        named.dark
    } else {
        named.light
    }
}

/// Styled elements used by the screens, derived from a palette.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub title: Style,
    pub subtle: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub status: Style,
    pub app: Style,
}

impl Theme {
    /// Pure derivation: positional styles come from the anchors; semantic
    /// success/warning/error use ANSI colors so they track the user's
    /// terminal scheme.
    pub fn new(palette: &Palette) -> Self {
        Theme {
            title: Style::default()
                .fg(palette.primary)
                .add_modifier(Modifier::BOLD),
            subtle: Style::default().fg(palette.surface),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),
            status: Style::default().fg(palette.secondary),
            app: Style::default()
                .fg(palette.foreground)
                .bg(palette.background),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::new(&palette("default", false))
    }
}
