use crate::model::page::RawDocument;
use serde::{Deserialize, Serialize};

/// Column headers of every output table, in order
pub const HEADERS: [&str; 5] = ["Name", "Email", "Position", "Profile_URL", "University"];

/// One employee in the canonical output schema
///
/// Fields are never absent: anything missing upstream is an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeRow {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Email")]
    pub email: String,

    #[serde(rename = "Position")]
    pub position: String,

    #[serde(rename = "Profile_URL")]
    pub profile_url: String,

    #[serde(rename = "University")]
    pub university: String,
}

impl EmployeeRow {
    /// Maps one API document into a row
    ///
    /// `Name` is the first non-empty of `title` and `displayName`; `Email`
    /// is trimmed but keeps its case until assembly.
    pub fn from_document(doc: &RawDocument, university: &str) -> Self {
        let name = doc
            .text("title")
            .filter(|s| !s.is_empty())
            .or_else(|| doc.text("displayName"))
            .unwrap_or_default();

        Self {
            name,
            email: doc
                .text("email")
                .map(|e| e.trim().to_string())
                .unwrap_or_default(),
            position: doc.text("roleTitle").unwrap_or_default(),
            profile_url: doc.text("url").unwrap_or_default(),
            university: university.to_string(),
        }
    }

    /// Values in [`HEADERS`] order
    pub fn fields(&self) -> [&str; 5] {
        [
            self.name.as_str(),
            self.email.as_str(),
            self.position.as_str(),
            self.profile_url.as_str(),
            self.university.as_str(),
        ]
    }
}

/// Maps a page's documents to rows, one row per document
///
/// Never fails and never drops a document, even one with no usable fields.
pub fn map_documents(docs: &[RawDocument], university: &str) -> Vec<EmployeeRow> {
    docs.iter()
        .map(|doc| EmployeeRow::from_document(doc, university))
        .collect()
}
