use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// Identifier of the generated wrapper function. Must stay byte-identical to
/// the artifact of the JavaScript webpack plugin.
pub const PLUGIN_NAME: &str = "DrupalTranslationsWebpackPlugin";

/// Separator placed between extracted calls inside the function body.
pub const CALL_SEPARATOR: &str = "\n  ";

/// Matches any run of carriage returns and line feeds.
static LINE_BREAK_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_line_break_regex() -> &'static Regex {
    LINE_BREAK_REGEX.get_or_init(|| {
        Regex::new(r"[\r\n]+").expect("LINE_BREAK_REGEX pattern is invalid - this is a bug")
    })
}

/// Remove every line break from an extracted call so it fits on one line.
///
/// Idempotent, and borrows when there is nothing to strip. Tabs are kept, so
/// a CRLF source indented with tabs keeps a `\t` where the JavaScript plugin
/// would drop the first one after each `\r\n`.
pub fn normalize_call(call: &str) -> Cow<'_, str> {
    get_line_break_regex().replace_all(call, "")
}

/// Normalize each call and join them with [`CALL_SEPARATOR`], keeping order.
pub fn join_calls<S: AsRef<str>>(calls: &[S]) -> String {
    calls
        .iter()
        .map(|call| normalize_call(call.as_ref()))
        .collect::<Vec<_>>()
        .join(CALL_SEPARATOR)
}

/// Render the generated file around the already joined call expressions.
pub fn render_output(joined_calls: &str) -> String {
    format!(
        "\n\
         // This file is generated by the webpack plugin {name}.\n\
         // It is required for Drupal to figure out which translations are needed,\n\
         // since its regex is unable to process minified webpack code.\n\
         \n\
         function {name} () {{\n  \
         {body}\n\
         }}\n",
        name = PLUGIN_NAME,
        body = joined_calls,
    )
}
