use colored::Color;
use comfy_table::Color as TableColor;
use entipath::AssociationState;
use once_cell::sync::Lazy;

/// Colors for the three outcomes of the expansion policy.
pub struct StatePalette {
    pub eager: Color,
    pub deferred: Color,
    pub expanded: Color,
}

/// CLI color theme
pub struct ColorTheme {
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub info: Color,
    pub highlight: Color,
    pub muted: Color,
    pub primary: Color,
    pub secondary: Color,
    pub key: Color,
    pub value: Color,
    pub states: StatePalette,
}

impl ColorTheme {
    pub fn state(&self, state: AssociationState) -> Color {
        match state {
            AssociationState::Eager => self.states.eager,
            AssociationState::Deferred => self.states.deferred,
            AssociationState::Expanded => self.states.expanded,
        }
    }
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            success: Color::Green,
            error: Color::Red,
            warning: Color::Yellow,
            info: Color::Blue,
            highlight: Color::Cyan,
            muted: Color::BrightBlack,
            primary: Color::BrightBlue,
            secondary: Color::Magenta,
            key: Color::BrightCyan,
            value: Color::White,
            states: StatePalette {
                eager: Color::Green,
                deferred: Color::Yellow,
                expanded: Color::Magenta,
            },
        }
    }
}

pub static THEME: Lazy<ColorTheme> = Lazy::new(ColorTheme::default);

/// Same color as comfy-table understands it; bright variants map to its light shades.
pub fn table_color(color: Color) -> TableColor {
    match color {
        Color::Black => TableColor::Black,
        Color::Red => TableColor::DarkRed,
        Color::Green => TableColor::DarkGreen,
        Color::Yellow => TableColor::DarkYellow,
        Color::Blue => TableColor::DarkBlue,
        Color::Magenta => TableColor::DarkMagenta,
        Color::Cyan => TableColor::DarkCyan,
        Color::White => TableColor::Grey,
        Color::BrightBlack => TableColor::DarkGrey,
        Color::BrightRed => TableColor::Red,
        Color::BrightGreen => TableColor::Green,
        Color::BrightYellow => TableColor::Yellow,
        Color::BrightBlue => TableColor::Blue,
        Color::BrightMagenta => TableColor::Magenta,
        Color::BrightCyan => TableColor::Cyan,
        Color::BrightWhite => TableColor::White,
        Color::TrueColor { r, g, b } => TableColor::Rgb { r, g, b },
    }
}

pub struct Icons {
    pub success: &'static str,
    pub error: &'static str,
    pub warning: &'static str,
    pub info: &'static str,
    pub arrow: &'static str,
    pub bullet: &'static str,
    pub eager: &'static str,
    pub deferred: &'static str,
    pub expanded: &'static str,
}

impl Icons {
    pub const fn state(&self, state: AssociationState) -> &'static str {
        match state {
            AssociationState::Eager => self.eager,
            AssociationState::Deferred => self.deferred,
            AssociationState::Expanded => self.expanded,
        }
    }
}

pub const ICONS: Icons = Icons {
    success: "✓",
    error: "✗",
    warning: "⚠",
    info: "ℹ",
    arrow: "→",
    bullet: "•",
    eager: "●",
    deferred: "○",
    expanded: "◐",
};
