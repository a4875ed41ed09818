use std::sync::LazyLock;

use regex::Regex;

use super::element::{
    ContentElement, ElementId, ElementKind, InlineSpan, SpanKind, StyleFlags, TextBlock,
};

static INLINE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"::([A-Za-z]+):(.*?)::").expect("valid inline tag pattern"));

static IMAGE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^::img:([^|:]+?)(?:\|(.*?))?::$").expect("valid image pattern")
});

/// Turn stored markup into display elements.
pub fn parse(input: &str) -> Vec<ContentElement> {
    let mut parser = Parser::default();
    let normalized = input.replace("\r\n", "\n");
    for line in normalized.split('\n') {
        parser.line(line);
    }
    parser.finish()
}

#[derive(Default)]
enum Pending {
    #[default]
    None,
    Paragraph(Vec<String>),
    Quote(Vec<String>),
}

#[derive(Default)]
struct Parser {
    next_id: u64,
    pending: Pending,
    elements: Vec<ContentElement>,
}

impl Parser {
    fn line(&mut self, line: &str) {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            self.flush();
            return;
        }

        if is_rule(trimmed) {
            self.flush();
            self.push(ElementKind::HorizontalRule);
            return;
        }

        if let Some((level, text)) = header(trimmed) {
            self.flush();
            let block = parse_inline(text);
            self.push_text(block, |block| ElementKind::Header { level, block });
            return;
        }

        if let Some(caps) = IMAGE_LINE.captures(trimmed) {
            self.flush();
            let file = caps[1].trim().to_string();
            let alt = caps
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .filter(|alt| !alt.is_empty());
            self.push(ElementKind::Image { file, alt });
            return;
        }

        if let Some(rest) = trimmed.strip_prefix('>') {
            let rest = rest.strip_prefix(' ').unwrap_or(rest).to_string();
            match &mut self.pending {
                Pending::Quote(lines) => lines.push(rest),
                _ => {
                    self.flush();
                    self.pending = Pending::Quote(vec![rest]);
                }
            }
            return;
        }

        if let Some(item) = list_item(trimmed) {
            self.flush();
            self.push_text(parse_inline(item), ElementKind::ListItem);
            return;
        }

        match &mut self.pending {
            Pending::Paragraph(lines) => lines.push(trimmed.to_string()),
            _ => {
                self.flush();
                self.pending = Pending::Paragraph(vec![trimmed.to_string()]);
            }
        }
    }

    fn flush(&mut self) {
        match std::mem::take(&mut self.pending) {
            Pending::None => {}
            Pending::Paragraph(lines) => {
                self.push_text(parse_inline(&lines.join("\n")), ElementKind::Paragraph)
            }
            Pending::Quote(lines) => {
                self.push_text(parse_inline(&lines.join("\n")), ElementKind::Quote)
            }
        }
    }

    fn push_text(&mut self, block: TextBlock, kind: impl FnOnce(TextBlock) -> ElementKind) {
        if block.is_blank() {
            return;
        }
        self.push(kind(block));
    }

    fn push(&mut self, kind: ElementKind) {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.push(ContentElement { id, kind });
    }

    fn finish(mut self) -> Vec<ContentElement> {
        self.flush();
        self.elements
    }
}

fn is_rule(line: &str) -> bool {
    let mut chars = line.chars().filter(|c| !c.is_whitespace());
    let Some(first) = chars.next() else {
        return false;
    };
    if !matches!(first, '-' | '*' | '_') {
        return false;
    }
    let mut count = 1;
    for c in chars {
        if c != first {
            return false;
        }
        count += 1;
    }
    count >= 3
}

fn header(line: &str) -> Option<(u8, &str)> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let text = marker_rest(&line[level..])?;
    Some((level as u8, text))
}

/// A marker with no text after it is not an item; `*` alone is kept as a
/// stanza separator.
fn list_item(line: &str) -> Option<&str> {
    ["-", "*", "•"]
        .iter()
        .find_map(|marker| marker_rest(line.strip_prefix(marker)?))
        .filter(|item| !item.is_empty())
}

/// Text after a block marker, which must be followed by a space or nothing.
fn marker_rest(rest: &str) -> Option<&str> {
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix(' ').map(str::trim)
}

/// Parse inline tags into display text plus spans. Tags that are not
/// understood stay in the text as written.
pub fn parse_inline(source: &str) -> TextBlock {
    let mut text = String::with_capacity(source.len());
    let mut spans = Vec::new();
    let mut chars = 0usize;
    let mut last = 0usize;

    let mut at = 0usize;

    while let Some(caps) = INLINE_TAG.captures_at(source, at) {
        let (Some(whole), Some(tag), Some(body)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            break;
        };
        let Some((label, kind)) = inline_kind(tag.as_str(), body.as_str()) else {
            // Rescan just past this opener so a valid tag inside the match is still found.
            at = whole.start() + 2;
            continue;
        };

        let before = &source[last..whole.start()];
        text.push_str(before);
        chars += before.chars().count();

        let start = chars;
        text.push_str(label);
        chars += label.chars().count();
        if chars > start {
            spans.push(InlineSpan {
                range: start..chars,
                kind,
            });
        }
        last = whole.end();
        at = last;
    }
    text.push_str(&source[last..]);

    TextBlock::new(text, spans)
}

fn inline_kind<'a>(tag: &str, body: &'a str) -> Option<(&'a str, SpanKind)> {
    match tag {
        "link" => {
            let (label, url) = split_pipe(body);
            let url = url.unwrap_or(label).trim();
            if url.is_empty() {
                return None;
            }
            Some((label, SpanKind::Link { url: url.to_string() }))
        }
        "tip" => {
            let (label, tip) = split_pipe(body);
            let tip = tip?.trim();
            if tip.is_empty() {
                return None;
            }
            Some((label, SpanKind::Tooltip { text: tip.to_string() }))
        }
        _ => StyleFlags::from_tag(tag).map(|flags| (body, SpanKind::Style(flags))),
    }
}

fn split_pipe(body: &str) -> (&str, Option<&str>) {
    match body.split_once('|') {
        Some((label, rest)) => (label, Some(rest)),
        None => (body, None),
    }
}
