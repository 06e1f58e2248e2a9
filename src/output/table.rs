//! Table output formatting

use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

/// Format data as a table
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    if data.is_empty() {
        return "No results found.".to_string();
    }

    let mut table = Table::new(data);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Tabled)]
    struct StageRow {
        #[tabled(rename = "ID")]
        id: u64,
        #[tabled(rename = "STAGE")]
        stage: &'static str,
    }

    #[test]
    fn test_format_table_empty() {
        let rows: Vec<StageRow> = vec![];
        assert_eq!(format_table(&rows), "No results found.");
    }

    #[test]
    fn test_format_table_rows_and_style() {
        let rows = vec![
            StageRow {
                id: 4,
                stage: "seedling",
            },
            StageRow {
                id: 5,
                stage: "flowering",
            },
        ];

        let result = format_table(&rows);

        assert!(result.contains("STAGE"));
        assert!(result.contains("seedling"));
        assert!(result.contains("flowering"));
        // Rounded style corners
        assert!(result.contains("╭"));
        assert!(result.contains("╰"));
    }
}
