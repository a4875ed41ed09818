use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Key for list recycling. Sequential per parse, so the same input always
/// produces the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "el-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyleFlags {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub highlight: bool,
}

impl StyleFlags {
    /// Build flags from a tag such as `bi`. Returns `None` if any letter is
    /// not a style letter.
    pub fn from_tag(tag: &str) -> Option<Self> {
        if tag.is_empty() {
            return None;
        }
        let mut flags = StyleFlags::default();
        for c in tag.chars() {
            match c {
                'b' => flags.bold = true,
                'i' => flags.italic = true,
                'u' => flags.underline = true,
                's' => flags.strikethrough = true,
                'd' => flags.highlight = true,
                _ => return None,
            }
        }
        Some(flags)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    Style(StyleFlags),
    Link { url: String },
    Tooltip { text: String },
}

/// Annotation over the character range `range` (half-open) of its block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineSpan {
    pub range: Range<usize>,
    pub kind: SpanKind,
}

/// Display text plus inline annotations. Ranges are in characters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextBlock {
    text: String,
    spans: Vec<InlineSpan>,
}

impl TextBlock {
    /// Spans that are empty or reach past the end of `text` are dropped.
    pub fn new(text: impl Into<String>, spans: Vec<InlineSpan>) -> Self {
        let text = text.into();
        let len = text.chars().count();
        let spans = spans
            .into_iter()
            .filter(|span| {
                let valid = span.range.start < span.range.end && span.range.end <= len;
                if !valid {
                    tracing::debug!(?span.range, len, "Discarding out-of-range span");
                }
                valid
            })
            .collect();
        Self { text, spans }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn spans(&self) -> &[InlineSpan] {
        &self.spans
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.spans.is_empty()
    }

    /// Text covered by `span`, for renderers that slice by character.
    pub fn slice(&self, span: &InlineSpan) -> String {
        self.text
            .chars()
            .skip(span.range.start)
            .take(span.range.end - span.range.start)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    Paragraph(TextBlock),
    Header { level: u8, block: TextBlock },
    Quote(TextBlock),
    ListItem(TextBlock),
    Image { file: String, alt: Option<String> },
    HorizontalRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentElement {
    pub id: ElementId,
    pub kind: ElementKind,
}

impl ContentElement {
    pub fn block(&self) -> Option<&TextBlock> {
        match &self.kind {
            ElementKind::Paragraph(block)
            | ElementKind::Header { block, .. }
            | ElementKind::Quote(block)
            | ElementKind::ListItem(block) => Some(block),
            ElementKind::Image { .. } | ElementKind::HorizontalRule => None,
        }
    }
}
