//! Terminal output helpers shared by the CLI commands.

use std::io::{self, Write};

use crate::models::PluginInfo;

/// Turn an app name into something safe to use in a filename.
///
/// Alphanumeric characters, `-`, and `_` pass through; everything else
/// becomes `_`.
pub(crate) fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Ask a yes/no question and read the answer from stdin.
///
/// Anything other than `y`/`yes` (case-insensitive) counts as no.
pub(crate) fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Render the plugin list as an aligned text table.
pub(crate) fn plugin_table(plugins: &[PluginInfo]) -> String {
    if plugins.is_empty() {
        return "No plugins found".to_string();
    }

    let headers = ["Name", "Version", "Source", "Installation ID"];
    let rows: Vec<[&str; 4]> = plugins
        .iter()
        .map(|p| {
            [
                p.plugin_id.as_str(),
                p.version.as_str(),
                p.source.as_str(),
                p.id.as_str(),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    let format_row = |cells: &[&str; 4]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}", width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let header_line = format_row(&headers);
    let mut lines = vec![header_line.clone(), "-".repeat(header_line.len())];
    for row in &rows {
        lines.push(format_row(row));
    }
    lines.join("\n")
}
