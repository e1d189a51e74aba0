/*!
Feature extraction for argument classification. Every token of a view that was identified as an
argument gives one `FeatureRow`; the predicate-level features (lemma, part of speech, voice) are
shared by all the rows of a view.
*/
use crate::argument::position_of;
use crate::error::{LookupError, SrlError};
use crate::sentence::{ArgumentLabel, View};
use crate::token::{Head, Token};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Value of `head_word` for tokens attached to the root.
pub const ROOT_HEAD: &str = "ROOT";

/// Is the argument left or right of its predicate?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Before,
    After,
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before => write!(f, "before"),
            Self::After => write!(f, "after"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Voice {
    Active,
    Passive,
}

impl Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Features of one (predicate, argument) pair together with its gold label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureRow {
    pub lemma: String,
    pub arg_pos: String,
    pub head_word: String,
    pub deprel: String,
    pub pred_lemma: String,
    pub pred_pos: String,
    pub position: Position,
    pub voice: Voice,
    pub label: String,
}

impl FeatureRow {
    /// The categorical features as `(name, value)` pairs. The label is not a feature.
    pub fn features(&self) -> [(&'static str, String); 8] {
        [
            ("lemma", self.lemma.clone()),
            ("arg_pos", self.arg_pos.clone()),
            ("head_word", self.head_word.clone()),
            ("deprel", self.deprel.clone()),
            ("pred_lemma", self.pred_lemma.clone()),
            ("pred_pos", self.pred_pos.clone()),
            ("position", self.position.to_string()),
            ("voice", self.voice.to_string()),
        ]
    }
}

fn head_word(tokens: &[Token], head: &Head) -> Result<String, LookupError> {
    match head {
        Head::Root => Ok(String::from(ROOT_HEAD)),
        Head::Token(id) => {
            let position = position_of(tokens, *id)?;
            Ok(tokens[position].form.clone())
        }
        Head::Unspecified => Ok(head.to_string()),
    }
}

fn voice_of(predicate: &Token) -> Voice {
    if predicate.feats.is_passive() {
        Voice::Passive
    } else {
        Voice::Active
    }
}

/// Extracts the features of every `ARG` row of `view`, in token order. A view without a `V` row has
/// nothing to anchor the arguments on and gives no rows.
pub fn extract_features(view: &View) -> Result<Vec<FeatureRow>, LookupError> {
    let Some(predicate_position) = view
        .rows
        .iter()
        .position(|row| row.predicted_argument == ArgumentLabel::Predicate)
    else {
        if view
            .rows
            .iter()
            .any(|row| row.predicted_argument == ArgumentLabel::Argument)
        {
            warn!("view has arguments but no predicate; its arguments are skipped");
        }
        return Ok(Vec::new());
    };
    let predicate = &view.rows[predicate_position].token;
    let tokens: Vec<Token> = view.tokens().cloned().collect();
    let voice = voice_of(predicate);

    view.rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.predicted_argument == ArgumentLabel::Argument)
        .map(|(i, row)| {
            Ok(FeatureRow {
                lemma: row.token.lemma.clone(),
                arg_pos: row.token.upos.clone(),
                head_word: head_word(&tokens, &row.token.head)?,
                deprel: row.token.deprel.clone(),
                pred_lemma: predicate.lemma.clone(),
                pred_pos: predicate.upos.clone(),
                position: if i < predicate_position {
                    Position::Before
                } else {
                    Position::After
                },
                voice,
                label: row.gold_argument.clone(),
            })
        })
        .collect()
}

/// Extracts the features of all views, flattened in view order.
pub fn extract_all<'a, I>(views: I) -> Result<Vec<FeatureRow>, LookupError>
where
    I: IntoIterator<Item = &'a View>,
{
    let mut rows = Vec::new();
    for view in views {
        rows.extend(extract_features(view)?);
    }
    Ok(rows)
}

fn feature_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote(b'\\')
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer)
}

/// Writes the rows with a header line naming the features.
pub fn write_features<W: Write>(rows: &[FeatureRow], writer: W) -> Result<(), SrlError> {
    let mut csv_writer = feature_writer(writer);
    for (i, row) in rows.iter().enumerate() {
        csv_writer
            .serialize(row)
            .map_err(|e| SrlError::csv(format!("writing feature row {}", i + 1), e))?;
    }
    csv_writer
        .flush()
        .map_err(|e| SrlError::io("flushing the features", e))
}

pub fn write_features_to<P: AsRef<Path>>(rows: &[FeatureRow], path: P) -> Result<(), SrlError> {
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|e| SrlError::io(format!("creating {}", path.display()), e))?;
    write_features(rows, BufWriter::new(file))?;
    info!("wrote {} feature rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn read_features<R: Read>(reader: R) -> Result<Vec<FeatureRow>, SrlError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quote(b'\\')
        .from_reader(reader);
    csv_reader
        .deserialize::<FeatureRow>()
        .enumerate()
        .map(|(i, row)| row.map_err(|e| SrlError::csv(format!("reading feature row {}", i + 1), e)))
        .collect()
}

pub fn read_features_from<P: AsRef<Path>>(path: P) -> Result<Vec<FeatureRow>, SrlError> {
    let path = path.as_ref();
    let file =
        File::open(path).map_err(|e| SrlError::io(format!("opening {}", path.display()), e))?;
    let rows = read_features(BufReader::new(file))?;
    info!("read {} feature rows from {}", rows.len(), path.display());
    Ok(rows)
}
