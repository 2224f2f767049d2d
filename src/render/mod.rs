//! Markdown to sanitized HTML.
//!
//! The preview pane never sees raw renderer output. Every document goes
//! through two stages:
//! - comrak renders GFM (tables, strikethrough, autolinks, task lists)
//!   with hard line breaks, passing raw HTML through untouched
//! - ammonia cleans the result against an allow-list of tags, attributes
//!   and URL schemes
//!
//! Both configurations are built once per process and shared read-only.

use std::sync::LazyLock;

use comrak::{Options, markdown_to_html};

static RENDERER: LazyLock<Renderer> = LazyLock::new(Renderer::new);

/// Render markdown source to sanitized HTML using the shared renderer.
///
/// # Example
///
/// ```
/// let html = marknote::render::render("# Hi");
/// assert_eq!(html.trim(), "<h1>Hi</h1>");
/// assert_eq!(marknote::render::render(""), "");
/// ```
pub fn render(source: &str) -> String {
    RENDERER.render(source)
}

/// Markdown renderer paired with the sanitizer that cleans its output.
pub struct Renderer {
    options: Options<'static>,
    sanitizer: ammonia::Builder<'static>,
}

impl Renderer {
    /// Build a renderer with the preview dialect and allow-list.
    pub fn new() -> Self {
        Self {
            options: create_options(),
            sanitizer: create_sanitizer(),
        }
    }

    /// Render `source` to HTML that is safe to display.
    ///
    /// Empty input short-circuits to an empty string.
    pub fn render(&self, source: &str) -> String {
        if source.is_empty() {
            return String::new();
        }
        let raw = markdown_to_html(source, &self.options);
        self.sanitizer.clean(&raw).to_string()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("hardbreaks", &self.options.render.hardbreaks)
            .finish_non_exhaustive()
    }
}

fn create_options() -> Options<'static> {
    let mut options = Options::default();

    // Enable GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.shortcodes = true;

    // Single newlines become <br>
    options.render.hardbreaks = true;
    // Raw HTML is left in place; the sanitizer decides what survives
    options.render.unsafe_ = true;

    options
}

fn create_sanitizer() -> ammonia::Builder<'static> {
    let mut builder = ammonia::Builder::default();
    builder
        .add_tags(&["input"])
        .add_tag_attributes("input", &["type", "checked", "disabled"])
        .add_tag_attributes("code", &["class"]);
    builder
}
