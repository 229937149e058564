//! Block and inline node types produced by the lesson renderer.

/// A block-level element of a rendered lesson.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(Heading),
    Paragraph(Paragraph),
    List(List),
    Table(Table),
    Image(Image),
    Diagram(Diagram),
    Code(Code),
    Callout(Callout),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: u8,
    pub content: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub content: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub ordered: bool,
    pub items: Vec<Vec<Inline>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub header: TableRow,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub cells: Vec<Vec<Inline>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub src: String,
    pub alt: String,
}

/// A fenced diagram block. The source is handed verbatim to the external
/// diagram renderer; `id` is stable within one rendered document.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    pub id: String,
    pub source: String,
}

/// A fenced code block that is not a diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    pub language: Option<String>,
    pub source: String,
}

/// A labeled free-text section requiring distinct visual treatment.
#[derive(Debug, Clone, PartialEq)]
pub struct Callout {
    pub kind: CalloutKind,
    pub body: Vec<Block>,
}

/// The fixed callout vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalloutKind {
    Mnemonic,
    RedFlags,
    ClinicalPearl,
    KeyPoints,
    VisualAid,
}

impl CalloutKind {
    /// Display label for the callout title.
    pub fn label(&self) -> &'static str {
        match self {
            CalloutKind::Mnemonic => "Mnemonic",
            CalloutKind::RedFlags => "Red Flags",
            CalloutKind::ClinicalPearl => "Clinical Pearl",
            CalloutKind::KeyPoints => "Key Points Summary",
            CalloutKind::VisualAid => "Visual Aid",
        }
    }

    /// CSS class suffix used by the HTML serializer.
    pub fn css_class(&self) -> &'static str {
        match self {
            CalloutKind::Mnemonic => "mnemonic",
            CalloutKind::RedFlags => "red-flags",
            CalloutKind::ClinicalPearl => "clinical-pearl",
            CalloutKind::KeyPoints => "key-points",
            CalloutKind::VisualAid => "visual-aid",
        }
    }

    /// Match a label as written in lesson text. Case-insensitive; singular
    /// and plural spellings both occur in generated content.
    pub fn from_label(label: &str) -> Option<CalloutKind> {
        match label.trim().to_ascii_lowercase().as_str() {
            "mnemonic" => Some(CalloutKind::Mnemonic),
            "red flag" | "red flags" => Some(CalloutKind::RedFlags),
            "clinical pearl" | "clinical pearls" => Some(CalloutKind::ClinicalPearl),
            "key points" | "key points summary" => Some(CalloutKind::KeyPoints),
            "visual aid" => Some(CalloutKind::VisualAid),
            _ => None,
        }
    }
}

/// Inline content within a block.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Italic(Vec<Inline>),
    Image(Image),
    /// A navigable reference to a chapter by index in the chapter list.
    ChapterRef { index: usize, label: String },
}

impl Inline {
    pub fn text(s: impl Into<String>) -> Inline {
        Inline::Text(s.into())
    }
}

/// Concatenated plain text of a run of inline nodes (markup dropped).
pub fn plain_text(content: &[Inline]) -> String {
    let mut out = String::new();
    collect_plain(content, &mut out);
    out
}

fn collect_plain(content: &[Inline], out: &mut String) {
    for node in content {
        match node {
            Inline::Text(t) => out.push_str(t),
            Inline::Bold(children) | Inline::Italic(children) => collect_plain(children, out),
            Inline::Image(image) => out.push_str(&image.alt),
            Inline::ChapterRef { label, .. } => out.push_str(label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callout_labels_round_trip() {
        for kind in [
            CalloutKind::Mnemonic,
            CalloutKind::RedFlags,
            CalloutKind::ClinicalPearl,
            CalloutKind::KeyPoints,
            CalloutKind::VisualAid,
        ] {
            assert_eq!(CalloutKind::from_label(kind.label()), Some(kind));
        }
    }

    #[test]
    fn callout_labels_accept_variant_spellings() {
        assert_eq!(
            CalloutKind::from_label("red flag"),
            Some(CalloutKind::RedFlags)
        );
        assert_eq!(
            CalloutKind::from_label("Clinical Pearls"),
            Some(CalloutKind::ClinicalPearl)
        );
        assert_eq!(
            CalloutKind::from_label("KEY POINTS"),
            Some(CalloutKind::KeyPoints)
        );
        assert_eq!(CalloutKind::from_label("Summary"), None);
    }

    #[test]
    fn plain_text_flattens_markup() {
        let content = vec![
            Inline::text("see "),
            Inline::Bold(vec![Inline::text("the heart")]),
            Inline::ChapterRef {
                index: 2,
                label: "Valves".to_string(),
            },
        ];
        assert_eq!(plain_text(&content), "see the heartValves");
    }
}
