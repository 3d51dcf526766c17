use super::NumericTable;
use crate::domain::{ParserResult, PostError};
use std::fs;
use std::path::Path;

pub(super) fn parse_table(source: &str) -> ParserResult<NumericTable> {
    let mut column_count = 0;
    let mut values = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let content = match line.find('#') {
            Some(comment_start) => &line[..comment_start],
            None => line,
        };
        let content = content.trim();
        if content.is_empty() {
            continue;
        }

        let mut row_width = 0;
        for token in content.split_whitespace() {
            let value = token.parse::<f64>().map_err(|_| {
                PostError::input_validation(
                    "INPUT.TABLE_PARSE",
                    format!("line {}: '{}' is not a number", index + 1, token),
                )
            })?;
            values.push(value);
            row_width += 1;
        }

        if column_count == 0 {
            column_count = row_width;
        } else if row_width != column_count {
            return Err(PostError::input_validation(
                "INPUT.TABLE_RAGGED",
                format!(
                    "line {}: expected {} columns but found {}",
                    index + 1,
                    column_count,
                    row_width
                ),
            ));
        }
    }

    Ok(NumericTable::from_rows(column_count, values))
}

pub fn read_table(path: &Path) -> ParserResult<NumericTable> {
    read_table_source(path).map(|(_, table)| table)
}

/// Reads a table and also hands back the raw text so callers can pull
/// metadata out of its comment header.
pub fn read_table_source(path: &Path) -> ParserResult<(String, NumericTable)> {
    let source = fs::read_to_string(path).map_err(|source| {
        PostError::io_system(
            "IO.TABLE_READ",
            format!("failed to read table '{}': {}", path.display(), source),
        )
    })?;
    let table = parse_table(&source).map_err(|error| {
        PostError::new(
            error.category(),
            error.placeholder(),
            format!("{}: {}", path.display(), error.message()),
        )
    })?;
    Ok((source, table))
}

/// First `# key: value` comment in `source`, parsed as an integer.
pub fn header_integer(source: &str, key: &str) -> Option<i64> {
    header_value(source, key).and_then(|token| token.replace(',', "").parse().ok())
}

/// First `# key: value` comment in `source`, parsed as a float.
pub fn header_number(source: &str, key: &str) -> Option<f64> {
    header_value(source, key).and_then(|token| token.parse().ok())
}

fn header_value<'a>(source: &'a str, key: &str) -> Option<&'a str> {
    source.lines().find_map(|line| {
        let body = line.trim_start().strip_prefix('#')?.trim_start();
        let rest = body.strip_prefix(key)?.trim_start().strip_prefix(':')?;
        rest.split_whitespace().next()
    })
}

/// Token following the first whitespace-separated occurrence of `key`,
/// with thousands separators removed.
pub fn token_after(source: &str, key: &str) -> Option<String> {
    source.lines().find_map(|line| {
        let mut tokens = line.split_whitespace();
        tokens.by_ref().find(|token| *token == key)?;
        tokens.next().map(|token| token.replace(',', ""))
    })
}

#[cfg(test)]
mod tests {
    use super::{header_integer, header_number, parse_table, read_table, token_after};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let table = parse_table("# r n\n\n1.0 0.5 # trailing\n  2.0\t0.25\n")
            .expect("table should parse");
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column(0).expect("r"), vec![1.0, 2.0]);
        assert_eq!(table.column(1).expect("n"), vec![0.5, 0.25]);
    }

    #[test]
    fn single_value_files_become_one_by_one_tables() {
        let table = parse_table("3.25\n").expect("single value parses");
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.column_count(), 1);
        assert_eq!(table.value(0, 0), Some(3.25));
    }

    #[test]
    fn special_values_parse() {
        let table = parse_table("nan inf -inf 1e-3\n").expect("special values parse");
        let row = table.row(0).expect("row");
        assert!(row[0].is_nan());
        assert_eq!(row[1], f64::INFINITY);
        assert_eq!(row[2], f64::NEG_INFINITY);
        assert_eq!(row[3], 1e-3);
    }

    #[test]
    fn bad_tokens_and_ragged_rows_are_rejected() {
        let error = parse_table("1 2\n3 x\n").expect_err("x is not numeric");
        assert_eq!(error.placeholder(), "INPUT.TABLE_PARSE");
        assert!(error.message().starts_with("line 2"));

        let error = parse_table("1 2\n3\n").expect_err("ragged rows");
        assert_eq!(error.placeholder(), "INPUT.TABLE_RAGGED");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        let error = read_table(&temp.path().join("absent.dat")).expect_err("file is missing");
        assert_eq!(error.placeholder(), "IO.TABLE_READ");
    }

    #[test]
    fn parse_errors_name_the_file() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("broken.dat");
        fs::write(&path, "1 2\nfoo 3\n").expect("fixture should be written");
        let error = read_table(&path).expect_err("file is malformed");
        assert!(error.message().contains("broken.dat"));
    }

    #[test]
    fn header_values_are_found_in_comments() {
        let source = "# iterations:   123456\n# max_entropy_state: 12\n0 1\n";
        assert_eq!(header_integer(source, "iterations"), Some(123_456));
        assert_eq!(header_number(source, "max_entropy_state"), Some(12.0));
        assert_eq!(header_integer(source, "min_important_energy"), None);
    }

    #[test]
    fn token_after_strips_thousands_separators() {
        let source = "# walkers: 5\n# iterations: 1,234,567 done\n1 2\n";
        assert_eq!(token_after(source, "iterations:").as_deref(), Some("1234567"));
        assert_eq!(token_after(source, "samples:"), None);
    }
}
