//! Matrix template ingestion from spreadsheet CSV exports.
//!
//! Accreditation bodies distribute the matrix structure as a spreadsheet
//! with one row per rubric item (`Seq`, `Type`, `Reference` columns). The
//! importer turns such an export into a [`MatrixDefinition`] ready for the
//! catalog.

mod mapping;
mod parser;

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::workflows::assessment::{CriterionKey, DetailItem, MatrixDefinition};

#[derive(Debug)]
pub enum TemplateImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    UnknownKind { row: usize, label: String },
    DuplicateCriterionSeq(String),
    NoCriteria,
}

impl std::fmt::Display for TemplateImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateImportError::Io(err) => write!(f, "failed to read template export: {}", err),
            TemplateImportError::Csv(err) => write!(f, "invalid template CSV data: {}", err),
            TemplateImportError::UnknownKind { row, label } => {
                write!(f, "row {} has unrecognized item type '{}'", row, label)
            }
            TemplateImportError::DuplicateCriterionSeq(seq) => {
                write!(f, "criterion seq '{}' appears more than once", seq)
            }
            TemplateImportError::NoCriteria => {
                write!(f, "template contains no criterion rows")
            }
        }
    }
}

impl std::error::Error for TemplateImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateImportError::Io(err) => Some(err),
            TemplateImportError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TemplateImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for TemplateImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct MatrixTemplateImporter;

impl MatrixTemplateImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        key: CriterionKey,
    ) -> Result<MatrixDefinition, TemplateImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, key)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        key: CriterionKey,
    ) -> Result<MatrixDefinition, TemplateImportError> {
        let mut items = Vec::new();
        let mut criterion_seqs: HashSet<String> = HashSet::new();

        for (row, record) in parser::parse_records(reader)?.into_iter().enumerate() {
            let kind = mapping::kind_from_label(&record.kind_label).ok_or_else(|| {
                TemplateImportError::UnknownKind {
                    row: row + 1,
                    label: record.kind_label.clone(),
                }
            })?;

            if kind.is_editable() && !criterion_seqs.insert(record.seq.clone()) {
                return Err(TemplateImportError::DuplicateCriterionSeq(record.seq));
            }

            items.push(DetailItem {
                seq: record.seq,
                kind,
                reference: record.reference,
            });
        }

        if criterion_seqs.is_empty() {
            return Err(TemplateImportError::NoCriteria);
        }

        Ok(MatrixDefinition::new(key, items))
    }
}
