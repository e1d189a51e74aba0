/*!
Named-field token records. A token read from a treebank or from an intermediate TSV file always
starts with the ten CoNLL-U columns; the typed representation below makes the column semantics
explicit so that head matching can only ever be done on true integer indices.
*/
use crate::error::FormatError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Placeholder used by CoNLL-U and by every label column of the pipeline.
pub const PLACEHOLDER: &str = "_";

/// Number of CoNLL-U columns every token record starts with.
pub const CORE_COLUMNS: usize = 10;

/// Positive integer index of a word token. `0` is reserved for the root and never a valid id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId(usize);

impl TokenId {
    pub fn new(value: usize) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses a plain decimal number. Signs and leading zeros are rejected so that the textual form of
/// a parsed value is always identical to its input.
fn parse_decimal(s: &str) -> Option<usize> {
    let canonical = !s.is_empty()
        && s.bytes().all(|b| b.is_ascii_digit())
        && (s == "0" || !s.starts_with('0'));
    if canonical {
        s.parse().ok()
    } else {
        None
    }
}

impl FromStr for TokenId {
    type Err = FormatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s)
            .and_then(TokenId::new)
            .ok_or_else(|| FormatError::InvalidIndex(String::from(s)))
    }
}

/// The first column of a token record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenIndex {
    /// A regular word, e.g. `3`.
    Word(TokenId),
    /// An empty node inserted by enhanced dependencies, e.g. `3.1`.
    Empty { major: usize, minor: usize },
    /// A multiword token range, e.g. `1-2`.
    Range { start: TokenId, end: TokenId },
}

impl TokenIndex {
    /// Returns the id if this is a true integer index. Rule logic only ever looks at these.
    pub fn word(&self) -> Option<TokenId> {
        match self {
            Self::Word(id) => Some(*id),
            _ => None,
        }
    }
}

impl FromStr for TokenIndex {
    type Err = FormatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FormatError::InvalidIndex(String::from(s));
        if let Some((major, minor)) = s.split_once('.') {
            let major = parse_decimal(major).ok_or_else(invalid)?;
            let minor = parse_decimal(minor).ok_or_else(invalid)?;
            Ok(Self::Empty { major, minor })
        } else if let Some((start, end)) = s.split_once('-') {
            let start = start.parse::<TokenId>().map_err(|_| invalid())?;
            let end = end.parse::<TokenId>().map_err(|_| invalid())?;
            Ok(Self::Range { start, end })
        } else {
            s.parse::<TokenId>().map(Self::Word).map_err(|_| invalid())
        }
    }
}

impl Display for TokenIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(id) => write!(f, "{}", id),
            Self::Empty { major, minor } => write!(f, "{}.{}", major, minor),
            Self::Range { start, end } => write!(f, "{}-{}", start, end),
        }
    }
}

/// The syntactic governor of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Head {
    Root,
    Token(TokenId),
    /// `_` or empty, as found on empty nodes and multiword ranges.
    Unspecified,
}

impl Head {
    pub fn token(&self) -> Option<TokenId> {
        match self {
            Self::Token(id) => Some(*id),
            _ => None,
        }
    }
}

impl FromStr for Head {
    type Err = FormatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(Self::Root),
            "" | PLACEHOLDER => Ok(Self::Unspecified),
            other => other
                .parse::<TokenId>()
                .map(Self::Token)
                .map_err(|_| FormatError::InvalidHead(String::from(other))),
        }
    }
}

impl Display for Head {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "0"),
            Self::Token(id) => write!(f, "{}", id),
            Self::Unspecified => write!(f, "{}", PLACEHOLDER),
        }
    }
}

/// Morphological features, a `|` delimited list of `Key=Value` attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Features(String);

impl Features {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the `(key, value)` pairs. Attributes without `=` are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.split('|').filter_map(|attr| attr.split_once('='))
    }

    pub fn contains(&self, key: &str, value: &str) -> bool {
        self.iter().any(|(k, v)| k == key && v == value)
    }

    pub fn is_finite_verb(&self) -> bool {
        self.contains("VerbForm", "Fin")
    }

    pub fn is_passive(&self) -> bool {
        self.contains("Voice", "Pass")
    }
}

impl Display for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The ten core CoNLL-U columns of a token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub index: TokenIndex,
    pub form: String,
    pub lemma: String,
    /// Coarse (universal) part of speech.
    pub upos: String,
    /// Fine (language specific) part of speech.
    pub xpos: String,
    pub feats: Features,
    pub head: Head,
    pub deprel: String,
    pub deps: String,
    pub misc: String,
}

impl Token {
    /// Builds a token from the first ten fields of a record. Extra fields are ignored.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self, FormatError> {
        if fields.len() < CORE_COLUMNS {
            return Err(FormatError::TooFewColumns {
                expected: CORE_COLUMNS,
                found: fields.len(),
            });
        }
        let field = |i: usize| String::from(fields[i].as_ref());
        Ok(Self {
            index: fields[0].as_ref().parse()?,
            form: field(1),
            lemma: field(2),
            upos: field(3),
            xpos: field(4),
            feats: Features::new(field(5)),
            head: fields[6].as_ref().parse()?,
            deprel: field(7),
            deps: field(8),
            misc: field(9),
        })
    }

    /// Appends the ten core fields to `record`, in column order.
    pub fn write_fields(&self, record: &mut Vec<String>) {
        record.extend([
            self.index.to_string(),
            self.form.clone(),
            self.lemma.clone(),
            self.upos.clone(),
            self.xpos.clone(),
            self.feats.to_string(),
            self.head.to_string(),
            self.deprel.clone(),
            self.deps.clone(),
            self.misc.clone(),
        ]);
    }

    pub fn word_id(&self) -> Option<TokenId> {
        self.index.word()
    }
}
