//! Rich-text markup used by poem bodies and informational pages.
//!
//! Block syntax is line based (`#` headers, `>` quotes, `-` list items,
//! `---` rules, `::img:file|alt::` images, blank-line separated
//! paragraphs). Inline tags take the form `::tag:body::` where `tag` is a
//! combination of style letters (`b`, `i`, `u`, `s`, `d`), `link` or `tip`.

mod element;
mod parser;
mod speech;

pub use element::{
    ContentElement, ElementId, ElementKind, InlineSpan, SpanKind, StyleFlags, TextBlock,
};
pub use parser::{parse, parse_inline};
pub use speech::{speech_text, strip_tags};
