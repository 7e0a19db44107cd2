//! PDF export of stored submissions.
//!
//! Renders records onto A4 pages with the standard Helvetica fonts. Each record is laid
//! out in a fixed order: personal information, company, project information, then the
//! free-text details. Lines wrap to the printable width and a new page starts whenever
//! the cursor reaches the bottom margin.

use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::error::{ContactError, Result};
use crate::models::SubmissionRecord;

const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
// Helvetica averages roughly half an em per glyph
const AVERAGE_GLYPH_WIDTH: f32 = 0.5;

const REGULAR: &str = "F1";
const BOLD: &str = "F2";

/// Text style for one laid-out line
#[derive(Debug, Clone, Copy, PartialEq)]
struct Style {
    font: &'static str,
    size: f32,
}

impl Style {
    const TITLE: Self = Self { font: BOLD, size: 20.0 };
    const RECORD_HEADING: Self = Self { font: BOLD, size: 14.0 };
    const SECTION: Self = Self { font: BOLD, size: 12.0 };
    const BODY: Self = Self { font: REGULAR, size: 11.0 };
    const FOOTER: Self = Self { font: REGULAR, size: 9.0 };

    fn leading(self) -> f32 {
        self.size * 1.4
    }

    fn max_chars(self) -> usize {
        let usable = PAGE_WIDTH - 2.0 * MARGIN;
        // Truncation is intended: partial glyphs don't fit
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let chars = (usable / (self.size * AVERAGE_GLYPH_WIDTH)) as usize;
        chars.max(1)
    }
}

#[derive(Debug, Clone)]
enum Block {
    Line(Style, String),
    Gap(f32),
}

/// Renders submissions into a PDF document
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    title: String,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new("Contact Submissions Report")
    }
}

impl ReportGenerator {
    /// Generator printing `title` at the top of the first page
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }

    /// Render `records` in the order given; `generated_at` is printed in the footer
    pub fn render(&self, records: &[SubmissionRecord], generated_at: DateTime<Utc>) -> Result<Vec<u8>> {
        let blocks = self.layout(records, generated_at);
        let pages = paginate(&blocks);
        build_document(&pages)
    }

    fn layout(&self, records: &[SubmissionRecord], generated_at: DateTime<Utc>) -> Vec<Block> {
        let mut blocks = vec![
            Block::Line(Style::TITLE, self.title.clone()),
            Block::Line(Style::BODY, format!("Total submissions: {}", records.len())),
            Block::Gap(12.0),
        ];

        for (index, record) in records.iter().enumerate() {
            blocks.extend(record_blocks(index + 1, record));
        }

        blocks.push(Block::Gap(8.0));
        blocks.push(Block::Line(
            Style::FOOTER,
            format!("Generated on: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        ));
        blocks
    }
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

fn record_blocks(number: usize, record: &SubmissionRecord) -> Vec<Block> {
    let mut blocks = vec![Block::Line(
        Style::RECORD_HEADING,
        format!(
            "Submission #{number} ({})",
            record.created_at.format("%Y-%m-%d %H:%M UTC")
        ),
    )];

    let mut section = |heading: &str, lines: Vec<String>| {
        blocks.push(Block::Line(Style::SECTION, heading.to_string()));
        for line in lines {
            for wrapped in wrap(&line, Style::BODY.max_chars()) {
                blocks.push(Block::Line(Style::BODY, wrapped));
            }
        }
        blocks.push(Block::Gap(6.0));
    };

    section(
        "Personal Information:",
        vec![
            format!("Name: {}", record.name),
            format!("Email: {}", record.email),
            format!("Phone: {}", or_na(&record.phone)),
            format!("Country Code: {}", or_na(&record.country_code)),
        ],
    );

    if !record.company.is_empty() {
        section("Company Information:", vec![format!("Company: {}", record.company)]);
    }

    section(
        "Project Information:",
        vec![
            format!("Project Type: {}", or_na(&record.project_type)),
            format!("Budget Range: {}", or_na(&record.budget_range)),
            format!("Timeline: {}", or_na(&record.timeline)),
        ],
    );

    if !record.project_details.is_empty() {
        section("Project Details:", record.project_details.lines().map(str::to_string).collect());
    }

    blocks.push(Block::Gap(10.0));
    blocks
}

/// Greedy word wrap; words longer than `width` are split
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let current_len = current.chars().count();
        if current_len > 0 && current_len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }

    lines
}

/// A positioned line on a page
#[derive(Debug, Clone)]
struct Placed {
    style: Style,
    y: f32,
    text: String,
}

fn paginate(blocks: &[Block]) -> Vec<Vec<Placed>> {
    let top = PAGE_HEIGHT - MARGIN;
    let mut pages = vec![Vec::new()];
    let mut cursor = top;

    for block in blocks {
        match block {
            Block::Gap(height) => cursor -= height,
            Block::Line(style, text) => {
                if cursor - style.leading() < MARGIN {
                    pages.push(Vec::new());
                    cursor = top;
                }
                cursor -= style.leading();
                if let Some(page) = pages.last_mut() {
                    page.push(Placed {
                        style: *style,
                        y: cursor,
                        text: text.clone(),
                    });
                }
            },
        }
    }

    pages
}

/// Encode text for the standard fonts; characters outside Latin-1 become `?`
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

fn page_content(lines: &[Placed]) -> Content {
    let mut operations = Vec::with_capacity(lines.len() * 5);

    for line in lines {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec![Object::Name(line.style.font.as_bytes().to_vec()), Object::Real(line.style.size)],
        ));
        operations.push(Operation::new("Td", vec![Object::Real(MARGIN), Object::Real(line.y)]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(latin1(&line.text), StringFormat::Literal)],
        ));
        operations.push(Operation::new("ET", vec![]));
    }

    Content { operations }
}

fn font(base: &str) -> Object {
    Object::Dictionary(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Object::Name(base.as_bytes().to_vec()),
        "Encoding" => "WinAnsiEncoding",
    })
}

fn build_document(pages: &[Vec<Placed>]) -> Result<Vec<u8>> {
    let pdf_error = |e: lopdf::Error| ContactError::Internal(format!("Failed to build PDF: {e}"));

    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let regular_id = doc.add_object(font("Helvetica"));
    let bold_id = doc.add_object(font("Helvetica-Bold"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            REGULAR => regular_id,
            BOLD => bold_id,
        },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for lines in pages {
        let content = page_content(lines).encode().map_err(pdf_error)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_WIDTH),
                Object::Real(PAGE_HEIGHT),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ContactError::Internal(format!("Failed to write PDF: {e}")))?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 10);
        assert!(lines.iter().all(|line| line.chars().count() <= 10));
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap("abcdefghijkl", 5);
        assert_eq!(lines, vec!["abcde", "fghij", "kl"]);
    }

    #[test]
    fn test_latin1_replaces_wide_characters() {
        assert_eq!(latin1("café ✓"), vec![b'c', b'a', b'f', 0xE9, b' ', b'?']);
    }

    #[test]
    fn test_paginate_breaks_at_bottom_margin() {
        let blocks: Vec<Block> = (0..200)
            .map(|i| Block::Line(Style::BODY, format!("line {i}")))
            .collect();
        let pages = paginate(&blocks);
        assert!(pages.len() > 1);
        for page in &pages {
            assert!(page.iter().all(|line| line.y >= MARGIN));
        }
    }
}
