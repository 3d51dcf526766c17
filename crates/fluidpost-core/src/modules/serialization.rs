use crate::domain::{PostError, PostResult};
use std::fs;
use std::path::Path;

/// C `%.Ng` rendering, which is what the derived tables have always used.
pub fn format_general(value: f64, significant: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = significant.max(1);
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent = exponent.parse::<i32>().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction_zeros(mantissa),
            sign,
            exponent.abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_fraction_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

/// Shortest round-trip decimal that always keeps a fractional part (`1.0`, `0.51`).
pub fn float_label(value: f64) -> String {
    let rendered = format!("{value}");
    if value.is_finite() && !rendered.contains('.') && !rendered.contains('e') {
        format!("{rendered}.0")
    } else {
        rendered
    }
}

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> PostResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| {
            PostError::io_system(
                "IO.OUTPUT_DIRECTORY",
                format!(
                    "failed to create output directory '{}': {}",
                    parent.display(),
                    source
                ),
            )
        })?;
    }
    fs::write(path, normalize_text_artifact(content)).map_err(|source| {
        PostError::io_system(
            "IO.ARTIFACT_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

#[derive(Debug, Clone)]
pub struct ColumnFormat {
    pub precision: usize,
    pub delimiter: &'static str,
    pub header: Option<String>,
}

impl Default for ColumnFormat {
    fn default() -> Self {
        Self {
            precision: 6,
            delimiter: " ",
            header: None,
        }
    }
}

impl ColumnFormat {
    pub fn with_precision(precision: usize) -> Self {
        Self {
            precision,
            ..Self::default()
        }
    }

    pub fn tab_separated(mut self) -> Self {
        self.delimiter = "\t";
        self
    }

    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }
}

/// Renders equal-length columns as rows, `savetxt` style.
pub fn render_columns(columns: &[&[f64]], format: &ColumnFormat) -> PostResult<String> {
    let rows = columns.first().map(|column| column.len()).unwrap_or(0);
    if let Some(column) = columns.iter().find(|column| column.len() != rows) {
        return Err(PostError::internal(
            "INTERNAL.COLUMN_LENGTH",
            format!(
                "cannot write columns of different lengths ({} and {})",
                rows,
                column.len()
            ),
        ));
    }

    let mut content = String::new();
    if let Some(header) = &format.header {
        for line in header.lines() {
            content.push_str("# ");
            content.push_str(line);
            content.push('\n');
        }
    }
    for row in 0..rows {
        let line = columns
            .iter()
            .map(|column| format_general(column[row], format.precision))
            .collect::<Vec<_>>()
            .join(format.delimiter);
        content.push_str(&line);
        content.push('\n');
    }
    Ok(content)
}

pub fn write_columns(path: &Path, columns: &[&[f64]], format: &ColumnFormat) -> PostResult<()> {
    let content = render_columns(columns, format)?;
    write_text_artifact(path, &content)
}
