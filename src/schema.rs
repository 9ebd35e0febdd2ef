//! The fixed set of formatting attributes docstyle knows how to resolve.
//!
//! Every attribute carries a short tag used in style descriptors, the level
//! it lives on (run or paragraph), how conflicting run values are merged,
//! and the hard default used when nothing in the document sets it.
//!
//! # Examples
//!
//! ```
//! use docstyle::schema::{Attribute, AttrValue, Level};
//!
//! assert_eq!(Attribute::Size.tag(), "P");
//! assert_eq!(Attribute::Alignment.level(), Level::Paragraph);
//! assert_eq!(Attribute::Size.hard_default(), Some(AttrValue::Number(11.0)));
//! assert_eq!(Attribute::Color.hard_default(), None);
//! ```

use std::fmt;

/// Tag for the paragraph style name; always the first descriptor token.
pub const STYLE_TAG: &str = "S";

/// Tag for extracted media references.
pub const MEDIA_TAG: &str = "MEDIA";

/// Font family used when neither runs nor styles name one.
pub const DEFAULT_FONT_FAMILY: &str = "Calibri";

/// Where an attribute is set in the document model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Set on runs (and on the character properties of styles).
    Character,
    /// Set on the paragraph itself (and on paragraph properties of styles).
    Paragraph,
}

/// How values from several runs of one paragraph collapse into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Largest value wins.
    Max,
    /// True if any run is true.
    Any,
    /// Most frequent value, ties go to the first one seen.
    MostFrequent,
}

/// A resolved attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl AttrValue {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Descriptor rendering: one decimal place for numbers, `True`/`False`
/// for flags, text verbatim.
impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(true) => f.write_str("True"),
            Self::Flag(false) => f.write_str("False"),
            Self::Number(n) => write!(f, "{n:.1}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A resolvable formatting attribute.
///
/// Variant order is schema order: character attributes first, then
/// paragraph attributes. Descriptors list attributes in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    FontFamily,
    Size,
    Bold,
    Italic,
    Underline,
    Strike,
    Color,
    AllCaps,
    SmallCaps,
    Alignment,
    FirstLineIndent,
    LeftIndent,
    RightIndent,
    SpaceBefore,
    SpaceAfter,
    LineSpacing,
    KeepTogether,
    KeepWithNext,
    PageBreakBefore,
    WidowControl,
}

impl Attribute {
    /// Every attribute in schema order.
    pub const ALL: [Attribute; 20] = [
        Self::FontFamily,
        Self::Size,
        Self::Bold,
        Self::Italic,
        Self::Underline,
        Self::Strike,
        Self::Color,
        Self::AllCaps,
        Self::SmallCaps,
        Self::Alignment,
        Self::FirstLineIndent,
        Self::LeftIndent,
        Self::RightIndent,
        Self::SpaceBefore,
        Self::SpaceAfter,
        Self::LineSpacing,
        Self::KeepTogether,
        Self::KeepWithNext,
        Self::PageBreakBefore,
        Self::WidowControl,
    ];

    /// Short tag used in style descriptors.
    pub fn tag(self) -> &'static str {
        match self {
            Self::FontFamily => "F",
            Self::Size => "P",
            Self::Bold => "B",
            Self::Italic => "I",
            Self::Underline => "U",
            Self::Strike => "STRIKE",
            Self::Color => "C",
            Self::AllCaps => "CAPS",
            Self::SmallCaps => "SCAPS",
            Self::Alignment => "A",
            Self::FirstLineIndent => "IND-F",
            Self::LeftIndent => "IND-L",
            Self::RightIndent => "IND-R",
            Self::SpaceBefore => "SB",
            Self::SpaceAfter => "SA",
            Self::LineSpacing => "LS",
            Self::KeepTogether => "KEEP",
            Self::KeepWithNext => "KWN",
            Self::PageBreakBefore => "PG",
            Self::WidowControl => "WIDOW",
        }
    }

    /// Look an attribute up by its descriptor tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.tag() == tag)
    }

    pub fn level(self) -> Level {
        match self {
            Self::FontFamily
            | Self::Size
            | Self::Bold
            | Self::Italic
            | Self::Underline
            | Self::Strike
            | Self::Color
            | Self::AllCaps
            | Self::SmallCaps => Level::Character,
            _ => Level::Paragraph,
        }
    }

    pub fn aggregation(self) -> Aggregation {
        match self {
            Self::Size => Aggregation::Max,
            Self::FontFamily | Self::Color | Self::Alignment => {
                Aggregation::MostFrequent
            }
            Self::FirstLineIndent
            | Self::LeftIndent
            | Self::RightIndent
            | Self::SpaceBefore
            | Self::SpaceAfter
            | Self::LineSpacing => Aggregation::Max,
            _ => Aggregation::Any,
        }
    }

    /// Whether the attribute is a true/false flag.
    pub fn is_flag(self) -> bool {
        self.aggregation() == Aggregation::Any
    }

    /// Value used when neither direct formatting nor the style chain sets
    /// the attribute. Only `Color` has none.
    pub fn hard_default(self) -> Option<AttrValue> {
        match self {
            Self::FontFamily => {
                Some(AttrValue::Text(DEFAULT_FONT_FAMILY.to_string()))
            }
            Self::Size => Some(AttrValue::Number(11.0)),
            Self::Alignment => Some(AttrValue::Text("LEFT".to_string())),
            Self::LineSpacing => Some(AttrValue::Number(1.0)),
            Self::Color => None,
            Self::FirstLineIndent
            | Self::LeftIndent
            | Self::RightIndent
            | Self::SpaceBefore
            | Self::SpaceAfter => Some(AttrValue::Number(0.0)),
            _ => Some(AttrValue::Flag(false)),
        }
    }
}

/// All descriptor tags, style tag first, for coverage auditing.
pub fn all_tags() -> Vec<&'static str> {
    std::iter::once(STYLE_TAG)
        .chain(Attribute::ALL.iter().map(|a| a.tag()))
        .collect()
}
