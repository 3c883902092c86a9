//! URL list loading.
//!
//! Liberal about shape: a CSV with a `url` or `link` column (any
//! casing) uses that column; anything else is treated as one URL per
//! line, first cell. Fields are split on plain commas; URL lists do
//! not need quoting.

use pagecheck_core::Error;
use std::path::Path;

/// Load the ordered URL list from a CSV or plain-text file.
pub fn load_urls(path: &Path) -> Result<Vec<String>, Error> {
    let content = std::fs::read_to_string(path)?;
    let mut lines = content.lines();

    let Some(first) = lines.next() else {
        return Ok(Vec::new());
    };

    let header: Vec<String> = split_row(first).iter().map(|cell| cell.to_lowercase()).collect();
    let url_column = header.iter().position(|cell| cell == "url" || cell == "link");

    let mut urls = Vec::new();

    match url_column {
        Some(column) => {
            for line in lines {
                if let Some(cell) = split_row(line).into_iter().nth(column)
                    && !cell.is_empty()
                {
                    urls.push(cell);
                }
            }
        }
        None => {
            // No recognizable header: every line is a URL row.
            for line in std::iter::once(first).chain(lines) {
                if let Some(cell) = split_row(line).into_iter().next()
                    && !cell.is_empty()
                {
                    urls.push(cell);
                }
            }
        }
    }

    tracing::info!("loaded {} URLs from {}", urls.len(), path.display());
    Ok(urls)
}

fn split_row(line: &str) -> Vec<String> {
    line.split(',').map(|cell| cell.trim().to_string()).collect()
}
