//! Deduplication and final ordering of harvested rows
//!
//! Rows are collapsed in two tiers that never interact:
//! - rows with an email keep the first occurrence per email
//! - rows without an email keep the first occurrence per profile URL
//!
//! The survivors are sorted by (Name, Email).

use crate::model::row::EmployeeRow;
use std::collections::HashSet;

/// Final deduplicated, sorted table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    rows: Vec<EmployeeRow>,
}

impl Dataset {
    pub fn rows(&self) -> &[EmployeeRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EmployeeRow> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<EmployeeRow> {
        self.rows
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a EmployeeRow;
    type IntoIter = std::slice::Iter<'a, EmployeeRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Normalizes, deduplicates and sorts rows into a [`Dataset`]
///
/// "First occurrence" refers to input order. Assembling an assembled
/// dataset again yields the same dataset.
pub fn assemble(rows: Vec<EmployeeRow>) -> Dataset {
    let mut seen_emails = HashSet::new();
    let mut seen_urls = HashSet::new();
    let mut with_email = Vec::new();
    let mut without_email = Vec::new();

    for mut row in rows {
        row.email = row.email.trim().to_lowercase();
        row.profile_url = row.profile_url.trim().to_string();

        if row.email.is_empty() {
            if seen_urls.insert(row.profile_url.clone()) {
                without_email.push(row);
            }
        } else if seen_emails.insert(row.email.clone()) {
            with_email.push(row);
        }
    }

    let mut rows = with_email;
    rows.append(&mut without_email);
    rows.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.email.cmp(&b.email)));

    Dataset { rows }
}
