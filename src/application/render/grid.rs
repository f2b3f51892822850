//! `grid-template-areas` generation for the card grid.
//!
//! Cards are laid out row-major in display order. Every row carries exactly
//! `columns` tokens; the tail of the last row is padded with `.` so the matrix
//! stays rectangular.

use std::num::NonZeroUsize;

use crate::domain::snippets::SnippetId;

/// Token for a grid cell that no card occupies.
pub const PADDING_TOKEN: &str = ".";

/// CSS area name assigned to the card with the given id.
pub fn area_name(id: &SnippetId) -> String {
    format!("item{id}")
}

/// Build the `grid-template-areas` value for `ids` spread across `columns`.
///
/// Rows are emitted as double-quoted strings separated by a single space.
/// An empty input yields an empty string (zero rows).
pub fn grid_template_areas<'a, I>(ids: I, columns: NonZeroUsize) -> String
where
    I: IntoIterator<Item = &'a SnippetId>,
{
    let columns = columns.get();
    let names: Vec<String> = ids.into_iter().map(area_name).collect();

    names
        .chunks(columns)
        .map(|row| {
            let mut tokens: Vec<&str> = row.iter().map(String::as_str).collect();
            tokens.resize(columns, PADDING_TOKEN);
            format!("\"{}\"", tokens.join(" "))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<SnippetId> {
        values
            .iter()
            .map(|value| SnippetId::new(*value).expect("valid id"))
            .collect()
    }

    fn cols(value: usize) -> NonZeroUsize {
        NonZeroUsize::new(value).expect("non-zero columns")
    }

    /// Split an areas value back into its rows of tokens.
    fn parse_rows(areas: &str) -> Vec<Vec<String>> {
        areas
            .split('"')
            .enumerate()
            .filter(|(index, _)| index % 2 == 1)
            .map(|(_, row)| row.split(' ').map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn three_items_in_two_columns_pad_the_last_row() {
        let items = ids(&["1", "2", "3"]);
        assert_eq!(
            grid_template_areas(&items, cols(2)),
            "\"item1 item2\" \"item3 .\""
        );
    }

    #[test]
    fn empty_input_yields_zero_rows() {
        let empty: Vec<SnippetId> = Vec::new();
        for columns in 1..=6 {
            let areas = grid_template_areas(&empty, cols(columns));
            assert!(areas.is_empty());
            assert!(parse_rows(&areas).is_empty());
        }
    }

    #[test]
    fn more_columns_than_items_left_packs_a_single_row() {
        let items = ids(&["a", "b"]);
        assert_eq!(
            grid_template_areas(&items, cols(4)),
            "\"itema itemb . .\""
        );
    }

    #[test]
    fn single_column_stacks_every_item() {
        let items = ids(&["x", "y", "z"]);
        assert_eq!(
            grid_template_areas(&items, cols(1)),
            "\"itemx\" \"itemy\" \"itemz\""
        );
    }

    #[test]
    fn rows_are_rectangular_and_preserve_order() {
        for len in 0usize..=13 {
            let values: Vec<String> = (0..len).map(|n| format!("{}", n * 7 + 1)).collect();
            let refs: Vec<&str> = values.iter().map(String::as_str).collect();
            let items = ids(&refs);

            for columns in 1..=5 {
                let rows = parse_rows(&grid_template_areas(&items, cols(columns)));

                assert_eq!(rows.len(), len.div_ceil(columns), "len={len} columns={columns}");
                assert!(rows.iter().all(|row| row.len() == columns));

                let occupied: Vec<String> = rows
                    .iter()
                    .flatten()
                    .filter(|token| token.as_str() != PADDING_TOKEN)
                    .cloned()
                    .collect();
                let expected: Vec<String> = items.iter().map(area_name).collect();
                assert_eq!(occupied, expected);

                let padding = rows.iter().flatten().filter(|t| *t == PADDING_TOKEN).count();
                if len % columns == 0 {
                    assert_eq!(padding, 0);
                } else {
                    assert_eq!(padding, columns - len % columns);
                }
            }
        }
    }

    #[test]
    fn output_is_deterministic_for_identical_input() {
        let items = ids(&["9", "4", "7", "1", "5"]);
        let first = grid_template_areas(&items, cols(3));
        let second = grid_template_areas(&items, cols(3));
        assert_eq!(first, second);
    }
}
