use crate::domain::{PostError, PostResult};
use crate::plot::{Figure, Series, SeriesStyle};
use crate::style::Rgb;
use crate::table::NumericTable;

/// Converts a number density into a filling fraction for unit-radius spheres.
pub const FILLING_PER_DENSITY: f64 = 4.0 * std::f64::consts::PI / 3.0;

/// Contact values above this in the sphere MC runs are sampling noise.
const MC_CONTACT_NOISE_LIMIT: f64 = 5.0;
/// Extra cell length the outer-sphere DFT runs add beyond the cavity.
const OUTER_SPHERE_PADDING: f64 = 4.0;
/// Shift that lines the wall MC coordinates up with the DFT grid.
const WALL_MC_OFFSET: f64 = 13.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    ContactA,
    ContactS,
    Filling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Filling,
    FillingN0,
    FillingNA,
    ContactA,
    ContactS,
    YuWu,
    Gross,
}

impl Quantity {
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Filling => "eta",
            Self::FillingN0 => "eta0",
            Self::FillingNA => "etaA",
            Self::ContactA => "gA",
            Self::ContactS => "gS",
            Self::YuWu => "gYuWu",
            Self::Gross => "gGross",
        }
    }

    const fn panel(self) -> Panel {
        match self {
            Self::Filling | Self::FillingN0 | Self::FillingNA => Panel::Filling,
            Self::ContactA | Self::Gross => Panel::ContactA,
            Self::ContactS | Self::YuWu => Panel::ContactS,
        }
    }

    const fn color(self) -> Rgb {
        match self {
            Self::Filling => Rgb::BLUE,
            Self::FillingN0 => Rgb::CYAN,
            Self::FillingNA => Rgb::MAGENTA,
            Self::ContactA => Rgb::RED,
            Self::Gross => Rgb::ORANGE,
            Self::ContactS => Rgb::GREEN,
            Self::YuWu => Rgb::BROWN,
        }
    }

    fn legend(self, source: &str) -> String {
        match self {
            Self::Filling => format!("{source} n"),
            Self::FillingN0 => format!("{source} n0"),
            Self::FillingNA => format!("{source} nA"),
            Self::ContactA => format!("{source} gA"),
            Self::ContactS => format!("{source} gS"),
            Self::YuWu => "Yu and Wu".to_string(),
            Self::Gross => "Gross".to_string(),
        }
    }
}

/// One data source (MC run or DFT functional) on a shared position axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactProfile {
    pub source: &'static str,
    pub slug: &'static str,
    pub position: Vec<f64>,
    pub columns: Vec<(Quantity, Vec<f64>)>,
}

impl ContactProfile {
    fn new(source: &'static str, slug: &'static str, position: Vec<f64>) -> Self {
        Self {
            source,
            slug,
            position,
            columns: Vec::new(),
        }
    }

    fn with(mut self, quantity: Quantity, values: Vec<f64>) -> Self {
        self.columns.push((quantity, values));
        self
    }

    pub fn column(&self, quantity: Quantity) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(candidate, _)| *candidate == quantity)
            .map(|(_, values)| values.as_slice())
    }

    pub fn header(&self) -> String {
        std::iter::once("x")
            .chain(self.columns.iter().map(|(quantity, _)| quantity.column_name()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn is_mc(&self) -> bool {
        self.slug == "mc"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactComparison {
    pub tag: String,
    pub profiles: Vec<ContactProfile>,
    pub x_window: Option<(f64, f64)>,
    pub surface: Option<f64>,
}

impl ContactComparison {
    /// Three stacked panels: gA on top, gS in the middle, filling fraction
    /// at the bottom.
    pub fn figures(&self, title: &str, x_label: &str) -> Vec<Figure> {
        [
            (Panel::ContactA, "gA"),
            (Panel::ContactS, "gS"),
            (Panel::Filling, "filling fraction"),
        ]
        .into_iter()
        .enumerate()
        .map(|(index, (panel, y_label))| {
            let panel_title = if index == 0 { title } else { "" };
            let mut figure = Figure::new(panel_title, x_label, y_label);
            if let Some((low, high)) = self.x_window {
                figure = figure.with_x_range(low, high);
            }
            if let Some(surface) = self.surface {
                figure = figure.with_vertical_line(surface);
            }
            for profile in &self.profiles {
                for (quantity, values) in &profile.columns {
                    if quantity.panel() != panel {
                        continue;
                    }
                    let style = if profile.is_mc() {
                        SeriesStyle::line(quantity.color())
                    } else {
                        SeriesStyle::points(quantity.color())
                    };
                    figure.push(Series::from_columns(
                        quantity.legend(profile.source),
                        &profile.position,
                        values,
                        style,
                    ));
                }
            }
            figure
        })
        .collect()
    }
}

fn columns<const N: usize>(table: &NumericTable, indices: [usize; N]) -> PostResult<[Vec<f64>; N]> {
    let mut output: [Vec<f64>; N] = std::array::from_fn(|_| Vec::new());
    for (slot, index) in output.iter_mut().zip(indices) {
        *slot = table.column(index)?;
    }
    Ok(output)
}

fn filling(density: &[f64]) -> Vec<f64> {
    density.iter().map(|n| n * FILLING_PER_DENSITY).collect()
}

fn ratio(numerator: &[f64], denominator: &[f64]) -> Vec<f64> {
    numerator
        .iter()
        .zip(denominator)
        .map(|(top, bottom)| top / bottom)
        .collect()
}

fn masked(values: &[f64], keep: impl Fn(usize) -> bool) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| if keep(index) { *value } else { f64::NAN })
        .collect()
}

fn halved(position: &[f64]) -> Vec<f64> {
    position.iter().map(|r| r / 2.0).collect()
}

/// Grid spacing from the second and third rows, as the DFT grids start
/// with an irregular first point.
fn grid_spacing(table: &NumericTable, context: &str) -> PostResult<f64> {
    match (table.value(1, 0), table.value(2, 0)) {
        (Some(first), Some(second)) if second > first => Ok(second - first),
        _ => Err(PostError::input_validation(
            "INPUT.CONTACT_GRID",
            format!("{context} needs at least three increasing positions"),
        )),
    }
}

/// MC sphere tables: `r n ... n0 nA` with the contact histograms at
/// `2 + 2 off` and `3 + 2 off`.
fn mc_sphere_profile(mc: &NumericTable, off: usize) -> PostResult<ContactProfile> {
    let [r, n, n0, n_a, a_hist, s_hist] = columns(mc, [0, 1, 10, 11, 2 + 2 * off, 3 + 2 * off])?;
    let g_s = ratio(&s_hist, &n0);
    let g_s = masked(&g_s, |index| g_s[index] < MC_CONTACT_NOISE_LIMIT);
    Ok(ContactProfile::new("MC", "mc", halved(&r))
        .with(Quantity::ContactA, ratio(&a_hist, &n_a))
        .with(Quantity::ContactS, g_s)
        .with(Quantity::Filling, filling(&n)))
}

pub fn inner_sphere(
    tag: String,
    radius: f64,
    dft: &NumericTable,
    mc: &NumericTable,
) -> PostResult<ContactComparison> {
    dft.require_columns(8, "inner-sphere DFT table")?;
    mc.require_columns(12, "inner-sphere MC table")?;

    let show_min = (radius - 1.0).max(0.0);
    let show_max = radius + 6.0;

    let [r, n, g_s, g_yu_wu, g_a, g_gross] = columns(dft, [0, 1, 3, 4, 6, 7])?;
    let outside_solute = |index: usize| r[index] >= radius;
    let in_window = |index: usize| r[index] >= show_min;
    let dft_profile = ContactProfile::new("DFT", "dft", halved(&r))
        .with(Quantity::ContactA, masked(&g_a, in_window))
        .with(Quantity::Gross, g_gross)
        .with(Quantity::ContactS, masked(&g_s, in_window))
        .with(Quantity::YuWu, g_yu_wu)
        .with(Quantity::Filling, masked(&filling(&n), outside_solute));

    Ok(ContactComparison {
        tag,
        profiles: vec![mc_sphere_profile(mc, 2)?, dft_profile],
        x_window: Some((show_min / 2.0, show_max / 2.0)),
        surface: Some(radius / 2.0),
    })
}

/// The cavity radius is not in the file names' numeric form, so it is
/// recovered from the DFT grid extent.
pub fn outer_sphere_radius(dft: &NumericTable) -> PostResult<f64> {
    let last = dft.last_row().map(|row| row[0]).ok_or_else(|| {
        PostError::input_validation("INPUT.TABLE_EMPTY", "outer-sphere DFT table has no rows")
    })?;
    Ok(last.round() - OUTER_SPHERE_PADDING / 2.0)
}

pub fn outer_sphere(
    tag: String,
    dft: &NumericTable,
    mc: &NumericTable,
) -> PostResult<ContactComparison> {
    dft.require_columns(8, "outer-sphere DFT table")?;
    mc.require_columns(12, "outer-sphere MC table")?;

    let radius = outer_sphere_radius(dft)?;
    let show_min = radius - 6.0;
    let show_max = radius + 1.0;
    let dr = grid_spacing(dft, "outer-sphere DFT table")?;
    let sphere_end = (dft.row_count() as f64 - 1.0 / dr).max(0.0) as usize;

    // Close the MC curves at the cavity wall.
    let mut mc = mc.clone();
    let mut wall = vec![0.0; mc.column_count()];
    wall[0] = radius;
    wall[10] = 1.0;
    mc.push_row(&wall)?;

    let [r, n, g_s, g_a, g_yu_wu, g_gross] = columns(dft, [0, 1, 4, 5, 6, 7])?;
    let in_window = |index: usize| r[index] >= show_min;
    let dft_profile = ContactProfile::new("DFT", "dft", halved(&r))
        .with(Quantity::ContactA, masked(&g_a, in_window))
        .with(Quantity::Gross, g_gross)
        .with(Quantity::ContactS, masked(&g_s, |index| index < sphere_end))
        .with(Quantity::YuWu, g_yu_wu)
        .with(Quantity::Filling, filling(&n));

    Ok(ContactComparison {
        tag,
        profiles: vec![mc_sphere_profile(&mc, 1)?, dft_profile],
        x_window: Some((show_min / 2.0, show_max / 2.0)),
        surface: Some(radius / 2.0),
    })
}

pub struct WallTables<'a> {
    pub mc: &'a NumericTable,
    pub white_bear: &'a NumericTable,
    pub white_bear_tensorial: &'a NumericTable,
    pub mark_two: &'a NumericTable,
}

pub fn walls(tables: WallTables<'_>) -> PostResult<ContactComparison> {
    tables.mc.require_columns(12, "wall MC table")?;
    tables.white_bear.require_columns(9, "White Bear wall table")?;
    tables
        .white_bear_tensorial
        .require_columns(2, "tensorial White Bear wall table")?;
    tables.mark_two.require_columns(6, "mark II wall table")?;

    let dr = grid_spacing(tables.white_bear, "White Bear wall table")?;
    let start = (2.5 / dr) as usize;
    let stop = (tables.white_bear.row_count() as f64 - 1.0 / dr).max(0.0) as usize;
    let contact_rows = |index: usize| index >= start && index < stop;

    let [mc_x, mc_n, mc_n0, mc_na] = columns(tables.mc, [0, 1, 10, 11])?;
    let mc_profile = ContactProfile::new(
        "MC",
        "mc",
        mc_x.iter().map(|x| x + WALL_MC_OFFSET).collect(),
    )
    .with(Quantity::Filling, filling(&mc_n))
    .with(Quantity::FillingN0, filling(&mc_n0))
    .with(Quantity::FillingNA, filling(&mc_na));

    let [x, n, g_s, g_yu_wu, g_a, n0, g_gross, n_a] =
        columns(tables.white_bear, [0, 1, 3, 4, 5, 6, 7, 8])?;
    let white_bear = ContactProfile::new("White Bear", "dft", x)
        .with(Quantity::Filling, filling(&n))
        .with(Quantity::FillingN0, filling(&n0))
        .with(Quantity::FillingNA, filling(&n_a))
        .with(Quantity::ContactA, masked(&g_a, contact_rows))
        .with(Quantity::Gross, g_gross)
        .with(Quantity::ContactS, masked(&g_s, contact_rows))
        .with(Quantity::YuWu, g_yu_wu);

    let [x, n, g_s, g_a] = columns(tables.mark_two, [0, 1, 3, 5])?;
    let mark_two = ContactProfile::new("Mark II", "mark-two", x)
        .with(Quantity::Filling, filling(&n))
        .with(Quantity::ContactA, masked(&g_a, contact_rows))
        .with(Quantity::ContactS, masked(&g_s, contact_rows));

    let [x, n] = columns(tables.white_bear_tensorial, [0, 1])?;
    let tensorial = ContactProfile::new("WBT", "wbt", x).with(Quantity::Filling, filling(&n));

    Ok(ContactComparison {
        tag: "walls".to_string(),
        profiles: vec![mc_profile, white_bear, mark_two, tensorial],
        x_window: None,
        surface: None,
    })
}
