//! Table detection over extracted PDF page text, rendered as Markdown.
//!
//! Rows are lines that split into at least two cells on tabs, pipes, or runs of two or more
//! spaces. Two or more consecutive rows form a table; the first row is the header.

use super::pdf::PageText;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static COLUMN_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid column gap regex"));

/// Minimum number of consecutive rows that make a table.
const MIN_ROWS: usize = 2;

/// A table found on a PDF page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedTable {
    /// 1-based page number.
    pub page: u32,
    /// 1-based position of the table on its page.
    pub table_index: usize,
    /// Markdown rendering with a header row.
    pub table_markdown: String,
}

/// Detect tables on every page.
pub fn extract_tables(pages: &[PageText]) -> Vec<ExtractedTable> {
    let mut tables = Vec::new();
    for page in pages {
        let found = detect_tables(&page.text);
        if !found.is_empty() {
            tracing::debug!(page = page.number, tables = found.len(), "Found tables on page");
        }
        tables.extend(found.iter().enumerate().filter_map(|(idx, rows)| {
            let table_markdown = table_to_markdown(rows);
            (!table_markdown.is_empty()).then(|| ExtractedTable {
                page: page.number,
                table_index: idx + 1,
                table_markdown,
            })
        }));
    }
    tracing::info!(tables = tables.len(), "Table extraction finished");
    tables
}

/// Group consecutive tabular lines of `text` into tables of cell rows.
pub fn detect_tables(text: &str) -> Vec<Vec<Vec<String>>> {
    let mut tables = Vec::new();
    let mut current: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        match split_cells(line) {
            Some(cells) if is_rule(&cells) => {}
            Some(cells) => current.push(cells),
            None => {
                if current.len() >= MIN_ROWS {
                    tables.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
        }
    }
    if current.len() >= MIN_ROWS {
        tables.push(current);
    }
    tables
}

fn split_cells(line: &str) -> Option<Vec<String>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let cells: Vec<String> = if trimmed.contains('\t') {
        trimmed.split('\t').map(|cell| cell.trim().to_string()).collect()
    } else if trimmed.contains('|') {
        trimmed
            .trim_matches('|')
            .split('|')
            .map(|cell| cell.trim().to_string())
            .collect()
    } else {
        COLUMN_GAP
            .split(trimmed)
            .map(|cell| cell.trim().to_string())
            .collect()
    };

    (cells.iter().filter(|cell| !cell.is_empty()).count() >= 2).then_some(cells)
}

/// Markdown separator rows such as `|---|:---:|`.
fn is_rule(cells: &[String]) -> bool {
    cells
        .iter()
        .all(|cell| !cell.is_empty() && cell.chars().all(|c| matches!(c, '-' | ':' | ' ')))
}

/// Render rows as a Markdown table. Rows are padded or truncated to the header width.
pub fn table_to_markdown(rows: &[Vec<String>]) -> String {
    let Some((header, body)) = rows.split_first() else {
        return String::new();
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(render_row(header, header.len()));
    lines.push(format!("|{}|", vec![" --- "; header.len()].join("|")));
    lines.extend(body.iter().map(|row| render_row(row, header.len())));
    lines.join("\n")
}

fn render_row(cells: &[String], width: usize) -> String {
    let rendered: Vec<String> = (0..width)
        .map(|idx| cells.get(idx).map(|cell| clean_cell(cell)).unwrap_or_default())
        .collect();
    format!("| {} |", rendered.join(" | "))
}

fn clean_cell(cell: &str) -> String {
    cell.trim().replace('\n', " ").replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn renders_markdown_with_padding_and_truncation() {
        let rows = vec![
            row(&["Name", "Qty"]),
            row(&["apple"]),
            row(&["pear", "2", "extra"]),
        ];
        assert_eq!(
            table_to_markdown(&rows),
            "| Name | Qty |\n| --- | --- |\n| apple |  |\n| pear | 2 |"
        );
    }

    #[test]
    fn escapes_pipes_and_flattens_newlines() {
        assert_eq!(clean_cell(" a|b\nc "), "a\\|b c");
    }

    #[test]
    fn detects_space_and_pipe_separated_tables() {
        let text = "Quarterly summary\nRegion    Revenue    Growth\nNorth    120    4%\nSouth    98    2%\nClosing remarks.\n| a | b |\n|---|---|\n| 1 | 2 |";
        let tables = detect_tables(text);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].len(), 3);
        assert_eq!(tables[0][0], row(&["Region", "Revenue", "Growth"]));
        assert_eq!(tables[1], vec![row(&["a", "b"]), row(&["1", "2"])]);
    }

    #[test]
    fn single_rows_are_not_tables() {
        assert!(detect_tables("Key    Value\nplain text follows").is_empty());
    }

    #[test]
    fn numbers_tables_per_page() {
        let pages = vec![
            PageText {
                number: 2,
                text: "a\tb\nc\td\n\ne\tf\ng\th".into(),
            },
            PageText {
                number: 5,
                text: "no tables here".into(),
            },
        ];
        let tables = extract_tables(&pages);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1].page, 2);
        assert_eq!(tables[1].table_index, 2);
        assert!(tables[0].table_markdown.starts_with("| a | b |"));
    }
}
