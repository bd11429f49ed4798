use serde::{Deserialize, Deserializer};
use std::io::Read;

#[derive(Debug)]
pub(crate) struct TemplateRecord {
    pub(crate) seq: String,
    pub(crate) kind_label: String,
    pub(crate) reference: String,
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<Vec<TemplateRecord>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for record in csv_reader.deserialize::<TemplateRow>() {
        let row = record?;
        records.push(TemplateRecord {
            seq: row.seq,
            kind_label: row.kind,
            reference: row.reference.unwrap_or_default(),
        });
    }

    Ok(records)
}

#[derive(Debug, Deserialize)]
struct TemplateRow {
    #[serde(rename = "Seq")]
    seq: String,
    #[serde(rename = "Type")]
    kind: String,
    #[serde(
        rename = "Reference",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    reference: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
