//! Lightweight description markup: `**bold**` runs and `* ` bullet lines.
//!
//! Descriptions are parsed into a [`Document`] and rendered as HTML for the
//! store. Text outside the markup is passed through untouched, so HTML that
//! is already present in the source survives.

use itertools::Itertools;
use std::fmt;

const BOLD: &str = "**";
const BULLET: &str = "* ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    /// Consecutive bullet lines, one entry per item.
    List(Vec<Vec<Inline>>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

pub fn parse(text: &str) -> Document {
    let mut blocks = Vec::new();
    for line in text.split('\n').map(|l| l.trim_end_matches('\r')) {
        match line.strip_prefix(BULLET) {
            Some(item) => {
                let item = parse_inline(item);
                match blocks.last_mut() {
                    Some(Block::List(items)) => items.push(item),
                    _ => blocks.push(Block::List(vec![item])),
                }
            }
            None => blocks.push(Block::Paragraph(parse_inline(line))),
        }
    }
    Document { blocks }
}

fn parse_inline(line: &str) -> Vec<Inline> {
    let mut inlines = Vec::new();
    let mut rest = line;
    while let Some(start) = rest.find(BOLD) {
        let after = &rest[start + BOLD.len()..];
        let Some(end) = after.find(BOLD) else {
            break;
        };
        push_text(&mut inlines, &rest[..start]);
        inlines.push(Inline::Strong(after[..end].to_string()));
        rest = &after[end + BOLD.len()..];
    }
    push_text(&mut inlines, rest);
    inlines
}

fn push_text(inlines: &mut Vec<Inline>, text: &str) {
    if !text.is_empty() {
        inlines.push(Inline::Text(text.to_string()));
    }
}

/// Converts description markup to HTML.
pub fn to_html(text: &str) -> String {
    parse(text).to_string()
}

fn write_inlines(f: &mut fmt::Formatter<'_>, inlines: &[Inline]) -> fmt::Result {
    for inline in inlines {
        match inline {
            Inline::Text(text) => f.write_str(text)?,
            Inline::Strong(text) => write!(f, "<strong>{text}</strong>")?,
        }
    }
    Ok(())
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Paragraph(inlines) => write_inlines(f, inlines),
            Block::List(items) => {
                f.write_str("<ul>\n")?;
                for item in items {
                    f.write_str("<li>")?;
                    write_inlines(f, item)?;
                    f.write_str("</li>\n")?;
                }
                f.write_str("</ul>")
            }
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.blocks.iter().format("\n"))
    }
}
