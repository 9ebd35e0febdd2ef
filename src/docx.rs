//! In-memory model of a word-processing document and the `.docx` reader
//! that builds it.
//!
//! Only what style extraction needs is modelled: top-level body paragraphs
//! with their runs, direct formatting and embedded image references, the
//! paragraph style sheet with its `basedOn` chains and document defaults,
//! and the binary image parts referenced from the body.
//!
//! Documents can also be assembled directly:
//!
//! ```
//! use docstyle::docx::{Document, Paragraph, Run, Style};
//!
//! let mut doc = Document::default();
//! doc.styles.insert(Style::new("Heading1", "Heading 1"));
//! doc.paragraphs.push(
//!     Paragraph::new()
//!         .with_style("Heading1")
//!         .with_run(Run::new("Chapter One").bold()),
//! );
//! assert_eq!(doc.paragraphs[0].text(), "Chapter One");
//! ```

use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};

use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use tracing::{debug, warn};
use zip::{ZipArchive, result::ZipError};

use crate::error::{Error, Result};

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

/// Twentieths of a point, the unit of indents and spacing.
const TWIPS_PER_POINT: f64 = 20.0;

/// `w:line` value of single spacing under the `auto` line rule.
const SINGLE_LINE: f64 = 240.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Center => "CENTER",
            Self::Right => "RIGHT",
            Self::Justify => "JUSTIFY",
        }
    }

    fn from_val(val: &str) -> Option<Self> {
        match val {
            "left" | "start" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            "both" | "distribute" | "justify" => Some(Self::Justify),
            _ => None,
        }
    }
}

/// Character formatting. `None` means "not set at this level".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontFormat {
    pub name: Option<String>,
    /// Size in points.
    pub size: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strike: Option<bool>,
    /// Hex RGB, upper-case.
    pub color: Option<String>,
    pub all_caps: Option<bool>,
    pub small_caps: Option<bool>,
}

/// Paragraph formatting. Lengths are in points; line spacing is a multiple
/// of single spacing for `auto` rules and points otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParagraphFormat {
    pub alignment: Option<Alignment>,
    pub first_line_indent: Option<f64>,
    pub left_indent: Option<f64>,
    pub right_indent: Option<f64>,
    pub space_before: Option<f64>,
    pub space_after: Option<f64>,
    pub line_spacing: Option<f64>,
    pub keep_together: Option<bool>,
    pub keep_with_next: Option<bool>,
    pub page_break_before: Option<bool>,
    pub widow_control: Option<bool>,
}

/// A run of text sharing direct character formatting.
#[derive(Debug, Clone, Default)]
pub struct Run {
    pub text: String,
    pub font: FontFormat,
    /// The run contains an explicit page break.
    pub page_break: bool,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// A run holding nothing but a page break.
    pub fn page_break() -> Self {
        Self {
            page_break: true,
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.font.bold = Some(true);
        self
    }

    pub fn italic(mut self) -> Self {
        self.font.italic = Some(true);
        self
    }

    pub fn size(mut self, points: f64) -> Self {
        self.font.size = Some(points);
        self
    }

    pub fn font(mut self, name: impl Into<String>) -> Self {
        self.font.name = Some(name.into());
        self
    }

    pub fn with_format(mut self, font: FontFormat) -> Self {
        self.font = font;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Paragraph {
    /// Style id (not display name) from `w:pStyle`.
    pub style_id: Option<String>,
    pub format: ParagraphFormat,
    pub runs: Vec<Run>,
    /// Relationship ids of embedded images, in document order.
    pub images: Vec<String>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style_id: impl Into<String>) -> Self {
        self.style_id = Some(style_id.into());
        self
    }

    pub fn with_run(mut self, run: Run) -> Self {
        self.runs.push(run);
        self
    }

    pub fn with_format(mut self, format: ParagraphFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_image(mut self, relationship_id: impl Into<String>) -> Self {
        self.images.push(relationship_id.into());
        self
    }

    /// Concatenated text of all runs, untrimmed.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn has_page_break(&self) -> bool {
        self.runs.iter().any(|r| r.page_break)
    }
}

/// A named paragraph style.
#[derive(Debug, Clone, Default)]
pub struct Style {
    pub id: String,
    /// Display name, e.g. `Heading 1`.
    pub name: String,
    pub based_on: Option<String>,
    pub font: FontFormat,
    pub paragraph: ParagraphFormat,
}

impl Style {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn based_on(mut self, parent_id: impl Into<String>) -> Self {
        self.based_on = Some(parent_id.into());
        self
    }

    pub fn with_font(mut self, font: FontFormat) -> Self {
        self.font = font;
        self
    }

    pub fn with_paragraph(mut self, paragraph: ParagraphFormat) -> Self {
        self.paragraph = paragraph;
        self
    }
}

/// Paragraph styles keyed by id, plus the document-wide defaults.
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    styles: HashMap<String, Style>,
    default_paragraph: Option<String>,
    /// `w:rPrDefault`.
    pub default_font: FontFormat,
    /// `w:pPrDefault`.
    pub default_paragraph_format: ParagraphFormat,
}

impl StyleSheet {
    pub fn insert(&mut self, style: Style) {
        self.styles.insert(style.id.clone(), style);
    }

    pub fn get(&self, id: &str) -> Option<&Style> {
        self.styles.get(id)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Mark a style as the one applied to paragraphs without `w:pStyle`.
    pub fn set_default_paragraph_style(&mut self, id: impl Into<String>) {
        self.default_paragraph = Some(id.into());
    }

    /// The style in effect for a paragraph: its own, else the default.
    pub fn paragraph_style(&self, paragraph: &Paragraph) -> Option<&Style> {
        paragraph
            .style_id
            .as_deref()
            .and_then(|id| self.get(id))
            .or_else(|| {
                self.default_paragraph.as_deref().and_then(|id| self.get(id))
            })
    }
}

/// An image part referenced from the document body.
#[derive(Debug, Clone)]
pub struct MediaPart {
    /// Package path, e.g. `word/media/image1.png`.
    pub target: String,
    pub data: Vec<u8>,
}

impl MediaPart {
    /// Lower-case file extension of the part, `bin` when it has none.
    pub fn extension(&self) -> String {
        Path::new(&self.target)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "bin".to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub paragraphs: Vec<Paragraph>,
    pub styles: StyleSheet,
    /// Image parts keyed by relationship id.
    pub media: HashMap<String, MediaPart>,
}

impl Document {
    /// Open a `.docx` package from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            Error::DocumentParse(format!("{}: {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(file)).map_err(|e| match e {
            Error::DocumentParse(msg) => {
                Error::DocumentParse(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Read a `.docx` package from any seekable source.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader).map_err(parse_err)?;

        let body = read_part(&mut archive, DOCUMENT_PART)?.ok_or_else(|| {
            Error::DocumentParse(format!("missing part {DOCUMENT_PART}"))
        })?;

        let styles = match read_part(&mut archive, STYLES_PART)? {
            Some(xml) => parse_styles(&xml)?,
            None => StyleSheet::default(),
        };

        let mut media = HashMap::new();
        if let Some(xml) = read_part(&mut archive, DOCUMENT_RELS_PART)? {
            for (id, target) in parse_image_relationships(&xml)? {
                let path = resolve_target(&target);
                match read_binary_part(&mut archive, &path)? {
                    Some(data) => {
                        media.insert(id, MediaPart { target: path, data });
                    }
                    None => {
                        warn!(%id, %path, "image part missing from package");
                    }
                }
            }
        }

        let paragraphs = parse_body(&body)?;
        debug!(
            paragraphs = paragraphs.len(),
            styles = styles.len(),
            media = media.len(),
            "document loaded"
        );

        Ok(Self {
            paragraphs,
            styles,
            media,
        })
    }
}

fn parse_err(e: impl std::fmt::Display) -> Error {
    Error::DocumentParse(e.to_string())
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(f) => f,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(parse_err(e)),
    };
    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(parse_err)?;
    Ok(Some(contents))
}

fn read_binary_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>> {
    let mut file = match archive.by_name(name) {
        Ok(f) => f,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(parse_err(e)),
    };
    let mut data = Vec::new();
    file.read_to_end(&mut data).map_err(parse_err)?;
    Ok(Some(data))
}

/// Relationship targets are relative to `word/` unless absolute.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => {
            let mut parts: Vec<&str> = vec!["word"];
            for segment in target.split('/') {
                match segment {
                    "" | "." => {}
                    ".." => {
                        parts.pop();
                    }
                    s => parts.push(s),
                }
            }
            parts.join("/")
        }
    }
}

fn attr_value(e: &BytesStart<'_>, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// OOXML on/off value: a bare element means on.
fn toggle(e: &BytesStart<'_>) -> bool {
    !matches!(
        attr_value(e, b"val").as_deref(),
        Some("0" | "false" | "off" | "none")
    )
}

fn twips(e: &BytesStart<'_>, local: &[u8]) -> Option<f64> {
    attr_value(e, local)?
        .parse::<f64>()
        .ok()
        .map(|v| v / TWIPS_PER_POINT)
}

/// Apply one child element of `w:rPr`.
fn apply_run_property(font: &mut FontFormat, e: &BytesStart<'_>) {
    match e.local_name().as_ref() {
        b"rFonts" => {
            let name = attr_value(e, b"ascii")
                .or_else(|| attr_value(e, b"hAnsi"))
                .or_else(|| attr_value(e, b"eastAsia"))
                .or_else(|| attr_value(e, b"cs"));
            if name.is_some() {
                font.name = name;
            }
        }
        b"sz" => {
            if let Some(half_points) =
                attr_value(e, b"val").and_then(|v| v.parse::<f64>().ok())
                && half_points > 0.0
            {
                font.size = Some(half_points / 2.0);
            }
        }
        b"b" => font.bold = Some(toggle(e)),
        b"i" => font.italic = Some(toggle(e)),
        b"u" => font.underline = Some(toggle(e)),
        b"strike" => font.strike = Some(toggle(e)),
        b"caps" => font.all_caps = Some(toggle(e)),
        b"smallCaps" => font.small_caps = Some(toggle(e)),
        b"color" => {
            font.color = attr_value(e, b"val")
                .filter(|v| !v.eq_ignore_ascii_case("auto"))
                .map(|v| v.to_ascii_uppercase());
        }
        _ => {}
    }
}

/// Apply one child element of `w:pPr`.
fn apply_paragraph_property(format: &mut ParagraphFormat, e: &BytesStart<'_>) {
    match e.local_name().as_ref() {
        b"jc" => {
            if let Some(alignment) =
                attr_value(e, b"val").as_deref().and_then(Alignment::from_val)
            {
                format.alignment = Some(alignment);
            }
        }
        b"ind" => {
            if let Some(left) = twips(e, b"left").or_else(|| twips(e, b"start"))
            {
                format.left_indent = Some(left);
            }
            if let Some(right) = twips(e, b"right").or_else(|| twips(e, b"end"))
            {
                format.right_indent = Some(right);
            }
            if let Some(first) = twips(e, b"firstLine") {
                format.first_line_indent = Some(first);
            } else if let Some(hanging) = twips(e, b"hanging") {
                format.first_line_indent = Some(-hanging);
            }
        }
        b"spacing" => {
            if let Some(before) = twips(e, b"before") {
                format.space_before = Some(before);
            }
            if let Some(after) = twips(e, b"after") {
                format.space_after = Some(after);
            }
            if let Some(line) =
                attr_value(e, b"line").and_then(|v| v.parse::<f64>().ok())
            {
                let spacing = match attr_value(e, b"lineRule").as_deref() {
                    Some("exact" | "atLeast") => line / TWIPS_PER_POINT,
                    _ => line / SINGLE_LINE,
                };
                format.line_spacing = Some(spacing);
            }
        }
        b"keepLines" => format.keep_together = Some(toggle(e)),
        b"keepNext" => format.keep_with_next = Some(toggle(e)),
        b"pageBreakBefore" => format.page_break_before = Some(toggle(e)),
        b"widowControl" => format.widow_control = Some(toggle(e)),
        _ => {}
    }
}

/// Word stores built-in style names in lower case; present them the way
/// the application shows them.
fn display_style_name(name: &str) -> String {
    const BUILT_IN: &[&str] = &[
        "normal",
        "title",
        "subtitle",
        "caption",
        "header",
        "footer",
        "quote",
        "intense quote",
        "body text",
        "list paragraph",
        "list bullet",
        "list number",
        "no spacing",
    ];

    let is_heading = name
        .strip_prefix("heading ")
        .is_some_and(|n| n.len() == 1 && n.chars().all(|c| c.is_ascii_digit()));
    if !is_heading && !BUILT_IN.contains(&name) {
        return name.to_string();
    }

    name.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn parse_image_relationships(xml: &str) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_str(xml);
    let mut rels = Vec::new();

    loop {
        match reader.read_event().map_err(parse_err)? {
            Event::Start(e) | Event::Empty(e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let is_image = attr_value(&e, b"Type")
                    .is_some_and(|t| t.ends_with("/image"));
                let external = attr_value(&e, b"TargetMode")
                    .is_some_and(|m| m == "External");
                if is_image
                    && !external
                    && let (Some(id), Some(target)) =
                        (attr_value(&e, b"Id"), attr_value(&e, b"Target"))
                {
                    rels.push((id, target));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rels)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum StyleTarget {
    DefaultFont,
    DefaultParagraph,
    Font,
    Paragraph,
}

fn parse_styles(xml: &str) -> Result<StyleSheet> {
    let mut reader = Reader::from_str(xml);
    let mut sheet = StyleSheet::default();
    let mut current: Option<Style> = None;
    let mut current_is_default = false;
    let mut in_rpr_default = false;
    let mut in_ppr_default = false;
    let mut target: Option<StyleTarget> = None;

    loop {
        let event = reader.read_event().map_err(parse_err)?;
        let (e, empty) = match &event {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::End(e) => {
                match e.local_name().as_ref() {
                    b"style" => {
                        if let Some(style) = current.take() {
                            if current_is_default {
                                sheet.set_default_paragraph_style(&style.id);
                            }
                            sheet.insert(style);
                        }
                    }
                    b"rPr" | b"pPr" => target = None,
                    b"rPrDefault" => in_rpr_default = false,
                    b"pPrDefault" => in_ppr_default = false,
                    _ => {}
                }
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        match e.local_name().as_ref() {
            b"rPrDefault" => in_rpr_default = !empty,
            b"pPrDefault" => in_ppr_default = !empty,
            b"style" => {
                let is_paragraph = attr_value(e, b"type")
                    .is_none_or(|t| t == "paragraph");
                if is_paragraph && !empty {
                    let id = attr_value(e, b"styleId").unwrap_or_default();
                    current_is_default = toggle_attr(e, b"default");
                    current = Some(Style::new(id.clone(), id));
                }
            }
            b"name" if target.is_none() => {
                if let (Some(style), Some(name)) =
                    (current.as_mut(), attr_value(e, b"val"))
                {
                    style.name = display_style_name(&name);
                }
            }
            b"basedOn" if target.is_none() => {
                if let Some(style) = current.as_mut() {
                    style.based_on = attr_value(e, b"val");
                }
            }
            b"rPr" if !empty => {
                target = if in_rpr_default {
                    Some(StyleTarget::DefaultFont)
                } else if current.is_some() {
                    Some(StyleTarget::Font)
                } else {
                    None
                };
            }
            b"pPr" if !empty => {
                target = if in_ppr_default {
                    Some(StyleTarget::DefaultParagraph)
                } else if current.is_some() {
                    Some(StyleTarget::Paragraph)
                } else {
                    None
                };
            }
            _ => match target {
                Some(StyleTarget::DefaultFont) => {
                    apply_run_property(&mut sheet.default_font, e)
                }
                Some(StyleTarget::DefaultParagraph) => apply_paragraph_property(
                    &mut sheet.default_paragraph_format,
                    e,
                ),
                Some(StyleTarget::Font) => {
                    if let Some(style) = current.as_mut() {
                        apply_run_property(&mut style.font, e);
                    }
                }
                Some(StyleTarget::Paragraph) => {
                    if let Some(style) = current.as_mut() {
                        apply_paragraph_property(&mut style.paragraph, e);
                    }
                }
                None => {}
            },
        }
    }

    Ok(sheet)
}

fn toggle_attr(e: &BytesStart<'_>, local: &[u8]) -> bool {
    matches!(attr_value(e, local).as_deref(), Some("1" | "true" | "on"))
}

/// Streaming state for `word/document.xml`.
#[derive(Default)]
struct BodyParser {
    paragraphs: Vec<Paragraph>,
    paragraph: Option<Paragraph>,
    run: Option<Run>,
    in_ppr: bool,
    in_mark_rpr: bool,
    in_rpr: bool,
    in_text: bool,
    table_depth: usize,
    /// Depth inside a subtree whose content is ignored entirely.
    skip_depth: usize,
}

impl BodyParser {
    fn open(&mut self, e: &BytesStart<'_>, empty: bool) {
        if self.skip_depth > 0 {
            if !empty {
                self.skip_depth += 1;
            }
            return;
        }

        let name = e.local_name();
        let name = name.as_ref();

        if name == b"tbl" {
            if !empty {
                self.table_depth += 1;
            }
            return;
        }
        if self.table_depth > 0 {
            return;
        }

        let Some(paragraph) = self.paragraph.as_mut() else {
            if name == b"p" {
                self.paragraph = Some(Paragraph::new());
                if empty {
                    self.close(b"p");
                }
            }
            return;
        };

        match name {
            // Text boxes nest whole paragraphs; alternate content repeats
            // drawings; section properties are not paragraph formatting.
            b"txbxContent" | b"Fallback" | b"sectPr" => {
                if !empty {
                    self.skip_depth = 1;
                }
            }
            b"pPr" => self.in_ppr = !empty,
            b"rPr" if self.in_ppr => self.in_mark_rpr = !empty,
            b"pStyle" if self.in_ppr => {
                paragraph.style_id = attr_value(e, b"val");
            }
            _ if self.in_mark_rpr => {}
            _ if self.in_ppr => {
                apply_paragraph_property(&mut paragraph.format, e);
            }
            b"blip" => {
                if let Some(id) = attr_value(e, b"embed") {
                    paragraph.images.push(id);
                }
            }
            b"imagedata" => {
                if let Some(id) = attr_value(e, b"id") {
                    paragraph.images.push(id);
                }
            }
            b"r" => {
                self.run = Some(Run::default());
                if empty {
                    self.close(b"r");
                }
            }
            _ => {
                let Some(run) = self.run.as_mut() else {
                    return;
                };
                match name {
                    b"rPr" => self.in_rpr = !empty,
                    _ if self.in_rpr => apply_run_property(&mut run.font, e),
                    b"t" => self.in_text = !empty,
                    b"tab" => run.text.push('\t'),
                    b"br" => {
                        if attr_value(e, b"type").as_deref() == Some("page") {
                            run.page_break = true;
                        } else {
                            run.text.push('\n');
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    fn close(&mut self, name: &[u8]) {
        if self.skip_depth > 0 {
            self.skip_depth -= 1;
            return;
        }
        if name == b"tbl" {
            self.table_depth = self.table_depth.saturating_sub(1);
            return;
        }
        if self.table_depth > 0 {
            return;
        }

        match name {
            b"p" => {
                if let Some(paragraph) = self.paragraph.take() {
                    self.paragraphs.push(paragraph);
                }
                self.run = None;
                self.in_ppr = false;
                self.in_mark_rpr = false;
                self.in_rpr = false;
                self.in_text = false;
            }
            b"pPr" => self.in_ppr = false,
            b"rPr" if self.in_mark_rpr => self.in_mark_rpr = false,
            b"rPr" => self.in_rpr = false,
            b"r" => {
                if let (Some(run), Some(paragraph)) =
                    (self.run.take(), self.paragraph.as_mut())
                {
                    paragraph.runs.push(run);
                }
                self.in_rpr = false;
                self.in_text = false;
            }
            b"t" => self.in_text = false,
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if self.skip_depth == 0
            && self.in_text
            && let Some(run) = self.run.as_mut()
        {
            run.text.push_str(text);
        }
    }
}

fn parse_body(xml: &str) -> Result<Vec<Paragraph>> {
    let mut reader = Reader::from_str(xml);
    let mut parser = BodyParser::default();

    loop {
        match reader.read_event().map_err(parse_err)? {
            Event::Start(e) => parser.open(&e, false),
            Event::Empty(e) => parser.open(&e, true),
            Event::End(e) => parser.close(e.local_name().as_ref()),
            Event::Text(t) => {
                let text = t.unescape().map_err(parse_err)?;
                parser.text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(parser.paragraphs)
}
