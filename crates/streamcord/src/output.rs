//! Output formatting: table, JSON, YAML.

use std::io::{self, IsTerminal, Write};

use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable items in the chosen format.
///
/// `table` goes through `to_row` and the `Tabled` derive; the structured
/// formats serialize the items themselves.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
    })
}

/// Print the rendered output to stdout.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Item {
        name: &'static str,
        count: u32,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Name")]
        name: String,
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                name: "Movies",
                count: 42,
            },
            Item {
                name: "Shows",
                count: 7,
            },
        ]
    }

    fn row(item: &Item) -> Row {
        Row {
            name: item.name.into(),
        }
    }

    #[test]
    fn table_uses_row_projection() {
        let out = render_list(OutputFormat::Table, &items(), row).unwrap();
        assert!(out.contains("Name"));
        assert!(out.contains("Movies"));
        assert!(!out.contains("42"));
    }

    #[test]
    fn structured_formats_keep_all_fields() {
        let json = render_list(OutputFormat::Json, &items(), row).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["count"], 42);

        let yaml = render_list(OutputFormat::Yaml, &items(), row).unwrap();
        assert!(yaml.contains("count: 7"));
    }

    #[test]
    fn explicit_color_modes() {
        assert!(should_color(ColorMode::Always));
        assert!(!should_color(ColorMode::Never));
    }
}
