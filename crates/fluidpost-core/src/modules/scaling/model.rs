use crate::domain::{PostError, PostResult};
use crate::modules::serialization::format_general;
use std::path::Path;
use tracing::warn;

/// `N` from the `-N<digits>` segment of a run file name.
pub fn particle_count(path: &Path) -> Option<usize> {
    let name = path.file_name()?.to_str()?;
    name.split('-').find_map(|segment| {
        let digits = segment.strip_prefix('N')?;
        if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    })
}

/// Cost figures of one method at one system size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingPoint {
    pub particles: usize,
    pub initialization_iterations: i64,
    pub min_energy: f64,
    pub samples: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodScaling {
    pub method: String,
    pub points: Vec<ScalingPoint>,
}

impl MethodScaling {
    pub fn point(&self, particles: usize) -> Option<&ScalingPoint> {
        self.points.iter().find(|point| point.particles == particles)
    }

    pub fn column<F>(&self, value: F) -> (Vec<f64>, Vec<f64>)
    where
        F: Fn(&ScalingPoint) -> f64,
    {
        self.points
            .iter()
            .map(|point| (point.particles as f64, value(point)))
            .unzip()
    }
}

fn integer_cell(value: Option<f64>) -> String {
    match value {
        Some(value) if value.is_finite() => format!(" & {} ", value.trunc() as i64),
        _ => " & -- ".to_string(),
    }
}

/// LaTeX tabular with one column per method and three rows per size.
pub fn latex_table(methods: &[MethodScaling], particle_counts: &[usize]) -> String {
    let mut tex = format!("\n\\begin{{tabular}}{{c|{}}}\n", "c".repeat(methods.len()));
    for scaling in methods {
        tex.push_str(" & ");
        tex.push_str(&scaling.method.replace('_', " "));
    }
    tex.push_str("\\\\\n\\hline\\hline\n");

    for &particles in particle_counts {
        tex.push_str(&format!(" N = {particles} \\\\\n  initialization"));
        let rows: [(&str, fn(&ScalingPoint) -> f64); 3] = [
            ("", |point| point.initialization_iterations as f64),
            ("Emin", |point| point.min_energy),
            ("samples", |point| point.samples),
        ];
        for (label, value) in rows {
            tex.push_str(label);
            for scaling in methods {
                tex.push_str(&integer_cell(scaling.point(particles).map(value)));
            }
            tex.push_str("\\\\\n");
        }
    }
    tex.push_str("\\end{tabular}\n");
    tex
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRow {
    pub method: String,
    pub u_error: f64,
    pub cv_error: f64,
    pub s_error: f64,
}

/// Maximum-error summary written by the thermodynamics comparison.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorTable {
    pub min_temperature: Option<f64>,
    pub rows: Vec<ErrorRow>,
}

impl ErrorTable {
    /// Rows are `method u_err _ cv_err _ s_err ...`; any line mentioning
    /// `min_T` carries the temperature as its last token.
    pub fn parse(source: &str) -> PostResult<Self> {
        let mut table = Self::default();
        for (index, line) in source.lines().enumerate() {
            if line.contains("min_T") {
                table.min_temperature = line
                    .split_whitespace()
                    .last()
                    .and_then(|token| token.parse().ok());
                continue;
            }
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            let number = |column: usize| -> PostResult<f64> {
                tokens
                    .get(column)
                    .and_then(|token| token.parse().ok())
                    .ok_or_else(|| {
                        PostError::input_validation(
                            "INPUT.ERROR_TABLE_PARSE",
                            format!("line {}: expected a number in column {}", index + 1, column),
                        )
                    })
            };
            table.rows.push(ErrorRow {
                method: tokens[0].to_string(),
                u_error: number(1)?,
                cv_error: number(3)?,
                s_error: number(5)?,
            });
        }
        Ok(table)
    }
}

/// Per-method `(N, error)` series gathered from several error tables.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorScaling {
    pub min_temperature: Option<f64>,
    pub methods: Vec<String>,
    pub rows: Vec<(usize, ErrorRow)>,
}

impl ErrorScaling {
    pub fn collect(tables: Vec<(usize, ErrorTable)>) -> Self {
        let mut scaling = Self::default();
        let mut temperatures = Vec::new();
        for (particles, table) in tables {
            temperatures.extend(table.min_temperature);
            for row in table.rows {
                if !scaling.methods.contains(&row.method) {
                    scaling.methods.push(row.method.clone());
                }
                scaling.rows.push((particles, row));
            }
        }

        scaling.min_temperature = temperatures.iter().copied().reduce(f64::max);
        if temperatures.iter().any(|t| Some(*t) != scaling.min_temperature) {
            warn!(
                ?temperatures,
                "error tables disagree on the minimum temperature; using the largest"
            );
        }
        scaling
    }

    pub fn series<F>(&self, method: &str, value: F) -> (Vec<f64>, Vec<f64>)
    where
        F: Fn(&ErrorRow) -> f64,
    {
        self.rows
            .iter()
            .filter(|(_, row)| row.method == method)
            .map(|(particles, row)| (*particles as f64, value(row)))
            .unzip()
    }

    pub fn render(&self) -> String {
        let mut text = String::new();
        if let Some(min_temperature) = self.min_temperature {
            text.push_str(&format!("# min_T: {}\n", format_general(min_temperature, 6)));
        }
        text.push_str("# method N u_error cv_error s_error\n");
        for (particles, row) in &self.rows {
            text.push_str(&format!(
                "{} {} {} {} {}\n",
                row.method,
                particles,
                format_general(row.u_error, 6),
                format_general(row.cv_error, 6),
                format_general(row.s_error, 6)
            ));
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorScaling, ErrorTable, MethodScaling, ScalingPoint, latex_table, particle_count};
    use std::path::Path;

    #[test]
    fn particle_count_comes_from_n_segment() {
        assert_eq!(
            particle_count(Path::new("data/periodic-ww1.30-ff0.30-N20-tmmc-lnw.dat")),
            Some(20)
        );
        assert_eq!(particle_count(Path::new("periodic-ww1.30-Nx-tmmc.dat")), None);
    }

    #[test]
    fn table_marks_missing_sizes() {
        let methods = vec![
            MethodScaling {
                method: "wang_landau".to_string(),
                points: vec![ScalingPoint {
                    particles: 5,
                    initialization_iterations: 1200,
                    min_energy: 14.0,
                    samples: 37.6,
                }],
            },
            MethodScaling {
                method: "tmmc".to_string(),
                points: Vec::new(),
            },
        ];
        let tex = latex_table(&methods, &[5]);
        assert!(tex.contains("\\begin{tabular}{c|cc}"));
        assert!(tex.contains(" & wang landau & tmmc\\\\"));
        assert!(tex.contains("  initialization & 1200  & -- \\\\\n"));
        assert!(tex.contains("Emin & 14  & -- \\\\\n"));
        assert!(tex.contains("samples & 37  & -- \\\\\n"));
        assert!(tex.ends_with("\\end{tabular}\n"));
    }

    #[test]
    fn error_tables_take_largest_minimum_temperature() {
        let small = ErrorTable::parse("# min_T 0.2\ntmmc 0.1 x 0.2 x 0.3\n").expect("table");
        let large = ErrorTable::parse("# min_T: 0.3\ntmmc 0.05 x 0.1 x 0.15\nsad 1 x 2 x 3\n")
            .expect("table");
        assert_eq!(small.min_temperature, Some(0.2));

        let scaling = ErrorScaling::collect(vec![(5, small), (10, large)]);
        assert_eq!(scaling.min_temperature, Some(0.3));
        assert_eq!(scaling.methods, vec!["tmmc", "sad"]);
        let (n, cv) = scaling.series("tmmc", |row| row.cv_error);
        assert_eq!(n, vec![5.0, 10.0]);
        assert_eq!(cv, vec![0.2, 0.1]);
        assert!(scaling.render().starts_with("# min_T: 0.3\n"));
    }

    #[test]
    fn short_error_rows_are_rejected() {
        let error = ErrorTable::parse("tmmc 0.1\n").expect_err("too short");
        assert_eq!(error.placeholder(), "INPUT.ERROR_TABLE_PARSE");
    }
}
