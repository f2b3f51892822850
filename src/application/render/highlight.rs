use std::sync::Arc;

use once_cell::sync::Lazy;
use syntect::{
    dumps::from_uncompressed_data,
    html::{ClassStyle, ClassedHTMLGenerator},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};
use thiserror::Error;

use crate::domain::snippets::{Language, UnsupportedLanguage};

/// Stylesheet for the `syntax-` prefixed classes emitted by [`SyntectHighlighter`].
pub const THEME_CSS: &str = include_str!(env!("SYNTAX_THEME_CSS_FILE"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HighlightError {
    #[error(transparent)]
    UnsupportedLanguage(#[from] UnsupportedLanguage),
    #[error("no grammar available for `{language}`")]
    MissingGrammar { language: Language },
    #[error("failed to highlight `{language}` code: {message}")]
    Highlighting { language: Language, message: String },
}

/// Turns source text into highlighted HTML for one of the supported grammars.
pub trait Highlighter: Send + Sync {
    fn highlight(&self, code: &str, language: Language) -> Result<String, HighlightError>;
}

/// Syntect-backed highlighter emitting `syntax-` prefixed CSS classes.
pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
    class_style: ClassStyle,
}

impl SyntectHighlighter {
    fn new() -> Self {
        let syntax_bytes = include_bytes!(env!("SYNTAX_PACK_FILE"));
        let syntax_set: SyntaxSet =
            from_uncompressed_data(syntax_bytes).expect("syntax pack must be valid");
        Self {
            syntax_set,
            class_style: ClassStyle::SpacedPrefixed { prefix: "syntax-" },
        }
    }

    fn find_syntax(&self, language: Language) -> Option<&SyntaxReference> {
        if language == Language::PlainText {
            return Some(self.syntax_set.find_syntax_plain_text());
        }
        let token = language.syntax_token();
        self.syntax_set
            .find_syntax_by_token(token)
            .or_else(|| self.syntax_set.find_syntax_by_extension(token))
            .or_else(|| self.syntax_set.find_syntax_by_token(language.as_str()))
    }
}

static HIGHLIGHTER: Lazy<Arc<SyntectHighlighter>> =
    Lazy::new(|| Arc::new(SyntectHighlighter::new()));

/// Access the shared highlighter instance, initialised on first use.
pub fn syntect_highlighter() -> Arc<SyntectHighlighter> {
    Arc::clone(&HIGHLIGHTER)
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, language: Language) -> Result<String, HighlightError> {
        let syntax = self
            .find_syntax(language)
            .ok_or(HighlightError::MissingGrammar { language })?;

        let mut code_with_newline = code.to_string();
        if !code_with_newline.ends_with('\n') {
            code_with_newline.push('\n');
        }

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, self.class_style);

        for line in LinesWithEndings::from(code_with_newline.as_str()) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(|err| HighlightError::Highlighting {
                    language,
                    message: err.to_string(),
                })?;
        }

        let highlighted = generator.finalize();
        let token = language.as_str();
        Ok(format!(
            "<pre class=\"syntax-highlight syntax-lang-{token}\" data-language=\"{token}\"><code class=\"language-{token} syntax-code\">{highlighted}</code></pre>"
        ))
    }
}

/// Markup used when a snippet cannot be highlighted: the escaped source text.
pub fn plain_code_html(code: &str) -> String {
    format!(
        "<pre class=\"syntax-highlight syntax-plain\"><code class=\"syntax-code\">{}</code></pre>",
        ammonia::clean_text(code)
    )
}
