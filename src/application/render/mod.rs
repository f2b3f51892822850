//! Pure rendering stages of the listing: code highlighting and grid styling.

pub mod grid;
pub mod highlight;
pub mod stylesheet;

pub use grid::{PADDING_TOKEN, area_name, grid_template_areas};
pub use highlight::{
    HighlightError, Highlighter, SyntectHighlighter, THEME_CSS, plain_code_html,
    syntect_highlighter,
};
pub use stylesheet::{BREAKPOINT_COLUMNS, BreakpointRule, GridStyleConfig, GridStylesheet};
