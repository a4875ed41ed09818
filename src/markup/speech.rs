use std::sync::LazyLock;

use regex::Regex;

use super::element::{ContentElement, ElementKind};
use super::parser::parse_inline;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid html tag pattern"));

/// Text to hand to a speech synthesiser: every element's readable text, one
/// per line. `None` when nothing readable is left.
pub fn speech_text(elements: &[ContentElement]) -> Option<String> {
    let text = elements
        .iter()
        .map(|element| match &element.kind {
            ElementKind::Paragraph(block)
            | ElementKind::Header { block, .. }
            | ElementKind::Quote(block)
            | ElementKind::ListItem(block) => block.text(),
            ElementKind::Image { alt, .. } => alt.as_deref().unwrap_or(""),
            ElementKind::HorizontalRule => "",
        })
        .collect::<Vec<_>>()
        .join("\n");

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Crude cleanup of raw stored text when it could not be parsed into
/// elements: drops HTML tags and keeps only the labels of markup tags.
pub fn strip_tags(raw: &str) -> Option<String> {
    let without_html = HTML_TAG.replace_all(raw, "");
    let block = parse_inline(&without_html);
    let cleaned = block.text().trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse;

    #[test]
    fn reads_text_alt_and_skips_rules() {
        let elements = parse("## Sobre\n\nUm ::b:gato:: feliz\n\n---\n\n::img:gato.webp|Foto do gato::");
        assert_eq!(
            speech_text(&elements).as_deref(),
            Some("Sobre\nUm gato feliz\n\nFoto do gato")
        );
    }

    #[test]
    fn nothing_readable_is_none() {
        assert_eq!(speech_text(&parse("---\n::img:x.webp::")), None);
        assert_eq!(speech_text(&[]), None);
    }

    #[test]
    fn strip_tags_keeps_labels() {
        assert_eq!(
            strip_tags("<p>Olá ::b:mundo::</p> ::tip:Catfeina|dica::").as_deref(),
            Some("Olá mundo Catfeina")
        );
        assert_eq!(strip_tags("<br/>  "), None);
    }

    #[test]
    fn strip_tags_keeps_link_labels() {
        assert_eq!(
            strip_tags("Leia ::link:site|https://x.com:: hoje").as_deref(),
            Some("Leia site hoje")
        );
    }
}
