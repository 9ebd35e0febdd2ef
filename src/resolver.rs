//! Effective attribute values for a paragraph.
//!
//! Resolution order, first match wins:
//!
//! 1. direct formatting (runs for character attributes, the paragraph's own
//!    properties for paragraph attributes)
//! 2. the paragraph style and its `basedOn` chain, then document defaults
//! 3. the schema's hard default
//!
//! The last tier always produces a value for every attribute that has a
//! hard default, so resolution never leaves a gap.

use crate::{
    docx::{FontFormat, Paragraph, ParagraphFormat, StyleSheet},
    schema::{Aggregation, AttrValue, Attribute, Level},
};

/// Maximum number of styles visited along a `basedOn` chain.
pub const MAX_STYLE_DEPTH: usize = 5;

/// Name used when a paragraph has no style and the document declares no
/// default paragraph style.
pub const FALLBACK_STYLE_NAME: &str = "Normal";

/// Resolved attributes of one paragraph, in schema order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedAttributes(Vec<(Attribute, AttrValue)>);

impl ResolvedAttributes {
    pub fn get(&self, attr: Attribute) -> Option<&AttrValue> {
        self.0.iter().find(|(a, _)| *a == attr).map(|(_, v)| v)
    }

    pub fn flag(&self, attr: Attribute) -> bool {
        self.get(attr).and_then(AttrValue::as_flag).unwrap_or(false)
    }

    pub fn number(&self, attr: Attribute) -> Option<f64> {
        self.get(attr).and_then(AttrValue::as_number)
    }

    /// Insert or replace a value, keeping schema order.
    pub fn set(&mut self, attr: Attribute, value: AttrValue) {
        match self.0.binary_search_by(|(a, _)| a.cmp(&attr)) {
            Ok(i) => self.0[i].1 = value,
            Err(i) => self.0.insert(i, (attr, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, &AttrValue)> {
        self.0.iter().map(|(a, v)| (*a, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub struct StyleResolver<'a> {
    styles: &'a StyleSheet,
}

impl<'a> StyleResolver<'a> {
    pub fn new(styles: &'a StyleSheet) -> Self {
        Self { styles }
    }

    /// Display name of the style in effect for a paragraph.
    pub fn style_name(&self, paragraph: &Paragraph) -> String {
        self.styles
            .paragraph_style(paragraph)
            .map(|s| s.name.clone())
            .or_else(|| paragraph.style_id.clone())
            .unwrap_or_else(|| FALLBACK_STYLE_NAME.to_string())
    }

    /// Effective value of one attribute. `None` only for attributes
    /// without a hard default that nothing in the document sets.
    ///
    /// # Examples
    ///
    /// ```
    /// use docstyle::docx::{Paragraph, Run, StyleSheet};
    /// use docstyle::resolver::StyleResolver;
    /// use docstyle::schema::{AttrValue, Attribute};
    ///
    /// let styles = StyleSheet::default();
    /// let resolver = StyleResolver::new(&styles);
    /// let para = Paragraph::new().with_run(Run::new("plain"));
    ///
    /// assert_eq!(
    ///     resolver.resolve(&para, Attribute::Size),
    ///     Some(AttrValue::Number(11.0))
    /// );
    /// assert_eq!(resolver.resolve(&para, Attribute::Color), None);
    /// ```
    pub fn resolve(
        &self,
        paragraph: &Paragraph,
        attr: Attribute,
    ) -> Option<AttrValue> {
        self.direct(paragraph, attr)
            .or_else(|| self.inherited(paragraph, attr))
            .or_else(|| attr.hard_default())
    }

    /// Every attribute that resolves, in schema order.
    pub fn resolve_all(&self, paragraph: &Paragraph) -> ResolvedAttributes {
        ResolvedAttributes(
            Attribute::ALL
                .into_iter()
                .filter_map(|attr| {
                    self.resolve(paragraph, attr).map(|v| (attr, v))
                })
                .collect(),
        )
    }

    fn direct(
        &self,
        paragraph: &Paragraph,
        attr: Attribute,
    ) -> Option<AttrValue> {
        match attr.level() {
            Level::Character => aggregate(
                attr,
                paragraph
                    .runs
                    .iter()
                    .filter_map(|run| font_value(&run.font, attr)),
            ),
            Level::Paragraph => paragraph_value(&paragraph.format, attr),
        }
    }

    fn inherited(
        &self,
        paragraph: &Paragraph,
        attr: Attribute,
    ) -> Option<AttrValue> {
        let mut current = self.styles.paragraph_style(paragraph);
        let mut depth = 0;

        while let Some(style) = current
            && depth < MAX_STYLE_DEPTH
        {
            let value = match attr.level() {
                Level::Character => font_value(&style.font, attr),
                Level::Paragraph => paragraph_value(&style.paragraph, attr),
            };
            if value.is_some() {
                return value;
            }
            current =
                style.based_on.as_deref().and_then(|id| self.styles.get(id));
            depth += 1;
        }

        match attr.level() {
            Level::Character => font_value(&self.styles.default_font, attr),
            Level::Paragraph => {
                paragraph_value(&self.styles.default_paragraph_format, attr)
            }
        }
    }
}

/// Collapse the values several runs set for one attribute.
fn aggregate(
    attr: Attribute,
    values: impl Iterator<Item = AttrValue>,
) -> Option<AttrValue> {
    let values: Vec<AttrValue> = values.collect();
    if values.is_empty() {
        return None;
    }

    match attr.aggregation() {
        Aggregation::Max => values
            .iter()
            .filter_map(AttrValue::as_number)
            .reduce(f64::max)
            .map(AttrValue::Number),
        Aggregation::Any => Some(AttrValue::Flag(
            values.iter().any(|v| v.as_flag() == Some(true)),
        )),
        Aggregation::MostFrequent => {
            let mut counts: Vec<(&AttrValue, usize)> = Vec::new();
            for value in &values {
                match counts.iter_mut().find(|(v, _)| *v == value) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((value, 1)),
                }
            }
            // `max_by_key` keeps the last maximum; fold keeps the first.
            counts
                .into_iter()
                .fold(None::<(&AttrValue, usize)>, |best, (v, n)| match best {
                    Some((_, best_n)) if best_n >= n => best,
                    _ => Some((v, n)),
                })
                .map(|(v, _)| v.clone())
        }
    }
}

fn flag(value: Option<bool>) -> Option<AttrValue> {
    value.map(AttrValue::Flag)
}

fn number(value: Option<f64>) -> Option<AttrValue> {
    value.map(AttrValue::Number)
}

fn font_value(font: &FontFormat, attr: Attribute) -> Option<AttrValue> {
    match attr {
        Attribute::FontFamily => font.name.clone().map(AttrValue::Text),
        Attribute::Size => number(font.size.filter(|s| *s > 0.0)),
        Attribute::Bold => flag(font.bold),
        Attribute::Italic => flag(font.italic),
        Attribute::Underline => flag(font.underline),
        Attribute::Strike => flag(font.strike),
        Attribute::Color => font.color.clone().map(AttrValue::Text),
        Attribute::AllCaps => flag(font.all_caps),
        Attribute::SmallCaps => flag(font.small_caps),
        _ => None,
    }
}

fn paragraph_value(
    format: &ParagraphFormat,
    attr: Attribute,
) -> Option<AttrValue> {
    match attr {
        Attribute::Alignment => format
            .alignment
            .map(|a| AttrValue::Text(a.as_str().to_string())),
        Attribute::FirstLineIndent => number(format.first_line_indent),
        Attribute::LeftIndent => number(format.left_indent),
        Attribute::RightIndent => number(format.right_indent),
        Attribute::SpaceBefore => number(format.space_before),
        Attribute::SpaceAfter => number(format.space_after),
        Attribute::LineSpacing => number(format.line_spacing),
        Attribute::KeepTogether => flag(format.keep_together),
        Attribute::KeepWithNext => flag(format.keep_with_next),
        Attribute::PageBreakBefore => flag(format.page_break_before),
        Attribute::WidowControl => flag(format.widow_control),
        _ => None,
    }
}
