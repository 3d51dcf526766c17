//! Colour, line style and legend conventions shared by every figure that
//! compares histogram methods.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const GREEN: Rgb = Rgb(0, 128, 0);
    pub const BLUE: Rgb = Rgb(0, 0, 255);
    pub const CYAN: Rgb = Rgb(0, 191, 191);
    pub const MAGENTA: Rgb = Rgb(191, 0, 191);
    pub const YELLOW: Rgb = Rgb(191, 191, 0);
    pub const ORANGE: Rgb = Rgb(255, 127, 14);
    pub const PURPLE: Rgb = Rgb(148, 103, 189);
    pub const PINK: Rgb = Rgb(227, 119, 194);
    pub const BROWN: Rgb = Rgb(140, 86, 75);
    pub const GRAY: Rgb = Rgb(127, 127, 127);
}

/// Cycle used when series are told apart by position rather than method.
pub const PALETTE: [Rgb; 7] = [
    Rgb::RED,
    Rgb::GREEN,
    Rgb::BLUE,
    Rgb::CYAN,
    Rgb::MAGENTA,
    Rgb::BLACK,
    Rgb::YELLOW,
];

pub fn palette(index: usize) -> Rgb {
    PALETTE[index % PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
    DashDot,
}

const COLORS: &[(&str, Rgb)] = &[
    ("sad", Rgb::RED),
    ("sad-tm", Rgb::RED),
    ("sad3", Rgb::CYAN),
    ("sad3-tm", Rgb::CYAN),
    ("sad3-s1", Rgb::CYAN),
    ("sad3-s1-tm", Rgb::CYAN),
    ("sad3-s2", Rgb::CYAN),
    ("sad3-s2-tm", Rgb::CYAN),
    ("wltmmc-1e-10", Rgb::BLACK),
    ("wltmmc-0.8-1e-10", Rgb::BLACK),
    ("wltmmc-0.8-1e-10-s1", Rgb::BLACK),
    ("vanilla_wang_landau", Rgb::BLACK),
    ("tmmc", Rgb::BLUE),
    ("tmi3", Rgb::GREEN),
    ("toe3", Rgb::ORANGE),
    ("samc", Rgb::MAGENTA),
    ("wltmmc-0.8-0.0001", Rgb::PURPLE),
    ("wltmmc-0.0001", Rgb::PURPLE),
    ("wltmmc-1-0.0001", Rgb::PINK),
    ("wltmmc", Rgb::PURPLE),
    ("samc-1000", Rgb::RED),
    ("samc-10000", Rgb::ORANGE),
    ("samc-100000", Rgb::YELLOW),
    ("samc-1e+06", Rgb::GREEN),
    ("samc-1000-slow", Rgb::RED),
    ("samc-10000-slow", Rgb::ORANGE),
    ("samc-100000-slow", Rgb::YELLOW),
    ("samc-1000-fast", Rgb::RED),
    ("samc-10000-fast", Rgb::ORANGE),
    ("samc-100000-fast", Rgb::YELLOW),
    ("1/sqrt(t)", Rgb::RED),
];

const LINE_STYLES: &[(&str, LineStyle)] = &[
    ("sad-tm", LineStyle::Dashed),
    ("sad3-tm", LineStyle::Dashed),
    ("sad3-s1", LineStyle::Dotted),
    ("sad3-s1-tm", LineStyle::Dashed),
    ("sad3-s2", LineStyle::DashDot),
    ("sad3-s2-tm", LineStyle::Dashed),
    ("vanilla_wang_landau", LineStyle::Dashed),
    ("samc-1000", LineStyle::Dotted),
    ("samc-10000", LineStyle::Dotted),
    ("samc-100000", LineStyle::Dotted),
    ("samc-1000-slow", LineStyle::Dotted),
    ("samc-10000-slow", LineStyle::Dotted),
    ("samc-100000-slow", LineStyle::Dotted),
    ("samc-1000-fast", LineStyle::Dotted),
    ("samc-10000-fast", LineStyle::Dotted),
    ("samc-100000-fast", LineStyle::Dotted),
    ("samc-1e+06", LineStyle::Dotted),
];

const LEGEND_ORDER: &[&str] = &[
    "sad",
    "sad-tm",
    "sad3",
    "sad3-tm",
    "sad3-s1",
    "sad3-s2",
    "tmmc",
    "wltmmc-0.8-0.0001",
    "wltmmc-0.0001",
    "wltmmc",
    "wltmmc-0.8-1e-10",
    "wltmmc-1e-10",
    "vanilla_wang_landau",
    "tmi3",
    "toe3",
    "samc",
    "samc-1000",
    "samc-10000",
    "samc-100000",
    "samc-1e+06",
];

// Plain text, since SVG legends do not typeset TeX.
const LEGEND_LABELS: &[(&str, &str)] = &[
    ("vanilla_wang_landau", "WL"),
    ("sad", "SAD"),
    ("sad-tm", "SAD-TM"),
    ("sad3", "SAD"),
    ("wltmmc", "WLTMMC (10^-4 cutoff)"),
    ("wltmmc-0.8-0.0001", "WLTMMC (10^-4 cutoff)"),
    ("wltmmc-0.0001", "WLTMMC (10^-4 cutoff)"),
    ("wltmmc-0.8-1e-10", "WLTMMC (10^-10 cutoff)"),
    ("wltmmc-1e-10", "WLTMMC (10^-10 cutoff)"),
    ("tmmc", "TMMC"),
    ("tmi3", "TMI"),
    ("toe3", "TOE"),
    ("samc", "SAMC"),
    ("samc-1000", "SAMC (10^3 t0)"),
    ("samc-10000", "SAMC (10^4 t0)"),
    ("samc-100000", "SAMC (10^5 t0)"),
    ("samc-1000-slow", "SAMC (10^3 t0)"),
    ("samc-10000-slow", "SAMC (10^4 t0)"),
    ("samc-100000-slow", "SAMC (10^5 t0)"),
    ("samc-1000-fast", "SAMC (10^3 t0)"),
    ("samc-10000-fast", "SAMC (10^4 t0)"),
    ("samc-100000-fast", "SAMC (10^5 t0)"),
    ("samc-1e+06", "SAMC (10^6 t0)"),
    ("1/sqrt(t)", "1/sqrt(t)"),
];

fn lookup<T: Copy>(table: &[(&str, T)], method: &str) -> Option<T> {
    table
        .iter()
        .find(|(name, _)| *name == method)
        .map(|(_, value)| *value)
}

pub fn method_color(method: &str) -> Rgb {
    lookup(COLORS, method).unwrap_or(Rgb::BLACK)
}

pub fn method_line_style(method: &str) -> LineStyle {
    lookup(LINE_STYLES, method).unwrap_or(LineStyle::Solid)
}

pub fn legend_label(method: &str) -> String {
    lookup(LEGEND_LABELS, method)
        .map(str::to_string)
        .unwrap_or_else(|| method.to_string())
}

/// Unknown methods sort after every known one.
pub fn legend_order(method: &str) -> usize {
    LEGEND_ORDER
        .iter()
        .position(|name| *name == method)
        .unwrap_or(LEGEND_ORDER.len())
}

/// Stable sort, so unknown methods keep their given order.
pub fn sort_by_legend_order(methods: &mut [String]) {
    methods.sort_by_key(|method| legend_order(method));
}

#[cfg(test)]
mod tests {
    use super::{
        LineStyle, Rgb, legend_label, legend_order, method_color, method_line_style,
        sort_by_legend_order,
    };

    #[test]
    fn known_methods_have_fixed_styles() {
        assert_eq!(method_color("tmmc"), Rgb::BLUE);
        assert_eq!(method_color("wltmmc"), Rgb::PURPLE);
        assert_eq!(method_line_style("sad-tm"), LineStyle::Dashed);
        assert_eq!(method_line_style("sad"), LineStyle::Solid);
        assert_eq!(legend_label("vanilla_wang_landau"), "WL");
        assert_eq!(legend_label("samc-1e+06"), "SAMC (10^6 t0)");
    }

    #[test]
    fn unknown_methods_fall_back() {
        assert_eq!(method_color("nohist"), Rgb::BLACK);
        assert_eq!(method_line_style("nohist"), LineStyle::Solid);
        assert_eq!(legend_label("nohist"), "nohist");
        assert_eq!(legend_order("nohist"), legend_order("also-unknown"));
    }

    #[test]
    fn methods_sort_into_legend_order() {
        let mut methods: Vec<String> = ["custom", "samc", "tmmc", "sad"]
            .iter()
            .map(|method| method.to_string())
            .collect();
        sort_by_legend_order(&mut methods);
        assert_eq!(methods, vec!["sad", "tmmc", "samc", "custom"]);
    }
}
