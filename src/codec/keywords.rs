//! codec::keywords
//!
//! Keyword expansion for working copies.
//!
//! A contracted keyword is `$Name$`. Expansion rewrites it to
//! `$Name: value $`; contraction finds `$Name:` followed by a closing `$` on
//! the same line and rewrites it back. Archives store contracted text, so a
//! revision's digest does not depend on who fetched it or when.
//!
//! Unknown names and unterminated markers pass through untouched.

const MARKER: u8 = b'$';
const SEPARATOR: u8 = b':';

/// A keyword understood by [`expand`] and [`contract`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Author,
    Date,
    FileName,
    FilePath,
    Header,
    HeaderPath,
    Label,
    Owner,
    Project,
    Revision,
}

impl Keyword {
    pub const ALL: [Keyword; 10] = [
        Keyword::Author,
        Keyword::Date,
        Keyword::FileName,
        Keyword::FilePath,
        Keyword::Header,
        Keyword::HeaderPath,
        Keyword::Label,
        Keyword::Owner,
        Keyword::Project,
        Keyword::Revision,
    ];

    /// Name as written between the markers.
    pub fn name(self) -> &'static str {
        match self {
            Keyword::Author => "Author",
            Keyword::Date => "Date",
            Keyword::FileName => "Filename",
            Keyword::FilePath => "FilePath",
            Keyword::Header => "Header",
            Keyword::HeaderPath => "HeaderPath",
            Keyword::Label => "Label",
            Keyword::Owner => "Owner",
            Keyword::Project => "Project",
            Keyword::Revision => "Revision",
        }
    }
}

/// Values substituted for one revision of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordValues {
    pub revision: String,
    /// Author of the revision.
    pub author: String,
    /// Checkin time of the revision.
    pub date: String,
    /// Creator of the archive.
    pub owner: String,
    pub file_name: String,
    /// Project-relative path.
    pub file_path: String,
    pub project: String,
    /// Label on the revision, or a placeholder when there is none.
    pub label: String,
}

impl KeywordValues {
    /// Text substituted for `keyword`.
    pub fn value(&self, keyword: Keyword) -> String {
        match keyword {
            Keyword::Author => self.author.clone(),
            Keyword::Date => self.date.clone(),
            Keyword::FileName => self.file_name.clone(),
            Keyword::FilePath => self.file_path.clone(),
            Keyword::Header => self.header(&self.file_name),
            Keyword::HeaderPath => self.header(&self.file_path),
            Keyword::Label => self.label.clone(),
            Keyword::Owner => self.owner.clone(),
            Keyword::Project => self.project.clone(),
            Keyword::Revision => self.revision.clone(),
        }
    }

    fn header(&self, name: &str) -> String {
        format!("{name} Revision:{} {} {}", self.revision, self.date, self.owner)
    }
}

/// Replace every contracted keyword in `content` with its expanded form.
///
/// # Example
///
/// ```
/// use branchvault::codec::keywords::{expand, KeywordValues};
///
/// let values = KeywordValues { revision: "1.4".into(), ..KeywordValues::default() };
/// assert_eq!(expand(b"// $Revision$\n", &values), b"// $Revision: 1.4 $\n");
/// ```
pub fn expand(content: &[u8], values: &KeywordValues) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len());
    let mut i = 0;
    while i < content.len() {
        if content[i] == MARKER {
            if let Some((keyword, used)) = contracted_at(&content[i + 1..]) {
                out.push(MARKER);
                out.extend_from_slice(keyword.name().as_bytes());
                out.extend_from_slice(b": ");
                out.extend_from_slice(values.value(keyword).as_bytes());
                out.extend_from_slice(b" $");
                i += 1 + used;
                continue;
            }
        }
        out.push(content[i]);
        i += 1;
    }
    out
}

/// Replace every expanded keyword in `content` with `$Name$`.
pub fn contract(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len());
    let mut i = 0;
    while i < content.len() {
        if content[i] == MARKER {
            if let Some((keyword, used)) = expanded_at(&content[i + 1..]) {
                out.push(MARKER);
                out.extend_from_slice(keyword.name().as_bytes());
                out.push(MARKER);
                i += 1 + used;
                continue;
            }
        }
        out.push(content[i]);
        i += 1;
    }
    out
}

/// Keyword whose name starts `rest` followed by `next`.
fn named(rest: &[u8], next: u8) -> Option<Keyword> {
    Keyword::ALL.into_iter().find(|k| {
        let name = k.name().as_bytes();
        rest.starts_with(name) && rest.get(name.len()) == Some(&next)
    })
}

// `rest` follows an opening marker; `used` counts through the closing one.
fn contracted_at(rest: &[u8]) -> Option<(Keyword, usize)> {
    named(rest, MARKER).map(|k| (k, k.name().len() + 1))
}

fn expanded_at(rest: &[u8]) -> Option<(Keyword, usize)> {
    let keyword = named(rest, SEPARATOR)?;
    let body = &rest[keyword.name().len() + 1..];
    let close = body
        .iter()
        .take_while(|b| **b != b'\n')
        .position(|b| *b == MARKER)?;
    Some((keyword, keyword.name().len() + 1 + close + 1))
}
