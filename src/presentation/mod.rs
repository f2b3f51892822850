//! HTML presentation: askama templates and the view models they render.

pub mod views;
