//! Responsive stylesheet for the card grid.
//!
//! The grid is laid out for four breakpoints, widest first. The four-column
//! rule is the unconditional base rule; narrower layouts are scoped by
//! `max-width` media queries derived from the card width.

use std::fmt::Write as _;
use std::num::{NonZeroU32, NonZeroUsize};

use crate::domain::snippets::SnippetId;

use super::grid::grid_template_areas;

const fn columns(value: usize) -> NonZeroUsize {
    match NonZeroUsize::new(value) {
        Some(value) => value,
        None => panic!("breakpoint column count must be non-zero"),
    }
}

/// Column counts of the supported breakpoints, widest first.
pub const BREAKPOINT_COLUMNS: [NonZeroUsize; 4] = [columns(4), columns(3), columns(2), columns(1)];

pub const DEFAULT_CONTAINER_CLASS: &str = "card-list";
pub const DEFAULT_CARD_WIDTH_REM: u32 = 28;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridStyleConfig {
    /// Class of the element holding the cards.
    pub container_class: String,
    /// Width of one card column in `rem`.
    pub card_width_rem: NonZeroU32,
}

impl Default for GridStyleConfig {
    fn default() -> Self {
        Self {
            container_class: DEFAULT_CONTAINER_CLASS.to_string(),
            card_width_rem: NonZeroU32::new(DEFAULT_CARD_WIDTH_REM).unwrap_or(NonZeroU32::MIN),
        }
    }
}

/// Layout rule for a single breakpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointRule {
    pub columns: NonZeroUsize,
    /// `None` for the base rule.
    pub media_query: Option<String>,
    /// Areas value computed for this breakpoint's column count.
    pub areas: String,
    pub css: String,
}

#[derive(Debug, Clone, Default)]
pub struct GridStylesheet {
    config: GridStyleConfig,
}

impl GridStylesheet {
    pub fn new(config: GridStyleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GridStyleConfig {
        &self.config
    }

    /// Render the complete stylesheet fragment for the given cards.
    pub fn assemble<'a, I>(&self, ids: I) -> String
    where
        I: IntoIterator<Item = &'a SnippetId>,
    {
        self.rules(ids)
            .into_iter()
            .map(|rule| rule.css)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// One rule per breakpoint, in [`BREAKPOINT_COLUMNS`] order.
    pub fn rules<'a, I>(&self, ids: I) -> Vec<BreakpointRule>
    where
        I: IntoIterator<Item = &'a SnippetId>,
    {
        let ids: Vec<&SnippetId> = ids.into_iter().collect();

        BREAKPOINT_COLUMNS
            .iter()
            .enumerate()
            .map(|(index, &columns)| {
                let areas = grid_template_areas(ids.iter().copied(), columns);
                let media_query = (index > 0).then(|| self.media_query(columns));
                let css = self.rule_css(columns, media_query.as_deref(), &areas);
                BreakpointRule {
                    columns,
                    media_query,
                    areas,
                    css,
                }
            })
            .collect()
    }

    /// Query that activates the layout with `columns` columns: the viewport no
    /// longer fits one more column.
    fn media_query(&self, columns: NonZeroUsize) -> String {
        format!(
            "(max-width: calc({width}rem * {next} + 1rem))",
            width = self.config.card_width_rem,
            next = columns.get() + 1,
        )
    }

    fn rule_css(&self, columns: NonZeroUsize, media_query: Option<&str>, areas: &str) -> String {
        let class = &self.config.container_class;
        let width = self.config.card_width_rem;
        let areas = if areas.is_empty() { "none" } else { areas };
        let stacked = columns.get() == 1;

        let mut container = String::new();
        if media_query.is_none() {
            container.push_str("display: grid;\n");
        }
        if stacked {
            container.push_str("display: block;\nwidth: 100%;\n");
        }
        let _ = writeln!(container, "grid-template-areas: {areas};");
        if stacked {
            container.push_str("grid-template-columns: 1fr;\n");
        } else {
            let _ = writeln!(container, "grid-template-columns: repeat({columns}, {width}rem);");
        }

        let card = if media_query.is_none() {
            Some("padding-left: 0.5rem;\npadding-right: 0.5rem;\npadding-bottom: 1rem;\n")
        } else if stacked {
            Some("padding-left: 0;\npadding-right: 0;\n")
        } else {
            None
        };

        let mut blocks = vec![block(&format!(".{class}"), &container)];
        if let Some(card) = card {
            blocks.push(block(&format!(".{class} > li"), card));
        }
        let body = blocks.join("\n\n");

        match media_query {
            None => body,
            Some(query) => format!("@media {query} {{\n{}}}", indent(&body)),
        }
    }
}

fn block(selector: &str, declarations: &str) -> String {
    format!("{selector} {{\n{}}}", indent(declarations))
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                "\n".to_string()
            } else {
                format!("  {line}\n")
            }
        })
        .collect::<String>()
}
