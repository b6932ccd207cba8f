use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::{Scheme, SchemeCatalog, SchemeCriteria};
use crate::workflows::intervention::repository::RepositoryError;

/// In-process scheme rules table.
#[derive(Debug, Clone, Default)]
pub struct SchemeTable {
    schemes: Vec<Scheme>,
}

impl SchemeTable {
    pub fn new(schemes: Vec<Scheme>) -> Self {
        Self { schemes }
    }

    /// Built-in programmes used when no table is configured.
    pub fn standard() -> Self {
        let rows = [
            (1, "Pre-Matric Scholarship for SC Students", 1, 10, 250_000, "SC"),
            (2, "Post-Matric Scholarship for SC Students", 11, 12, 250_000, "SC"),
            (3, "Pre-Matric Scholarship for ST Students", 1, 10, 250_000, "ST"),
            (4, "Pre-Matric Scholarship for OBC Students", 1, 10, 250_000, "OBC"),
            (5, "National Means-cum-Merit Scholarship", 9, 12, 350_000, "Any"),
            (6, "Rural Education Support Grant", 1, 12, 100_000, "Any"),
        ];

        Self::new(
            rows.into_iter()
                .map(
                    |(id, name, min_grade, max_grade, income_limit, caste)| Scheme {
                        id,
                        name: name.to_string(),
                        min_grade,
                        max_grade,
                        income_limit,
                        caste_category: caste.to_string(),
                    },
                )
                .collect(),
        )
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SchemeTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut schemes = Vec::new();

        for (index, record) in csv_reader.deserialize::<SchemeRow>().enumerate() {
            let row = record?;
            if row.min_grade > row.max_grade {
                return Err(SchemeTableError::InvalidGradeRange {
                    line: index + 2,
                    min_grade: row.min_grade,
                    max_grade: row.max_grade,
                });
            }
            if schemes.iter().any(|scheme: &Scheme| scheme.id == row.id) {
                return Err(SchemeTableError::DuplicateId(row.id));
            }
            schemes.push(row.into_scheme());
        }

        Ok(Self::new(schemes))
    }

    pub fn from_path(path: &Path) -> Result<Self, SchemeTableError> {
        let file = std::fs::File::open(path).map_err(|source| SchemeTableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn schemes(&self) -> &[Scheme] {
        &self.schemes
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}

impl SchemeCatalog for SchemeTable {
    fn candidates(&self, criteria: &SchemeCriteria) -> Result<Vec<Scheme>, RepositoryError> {
        Ok(self
            .schemes
            .iter()
            .filter(|scheme| scheme.admits(criteria))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct SchemeRow {
    id: u32,
    name: String,
    min_grade: u8,
    max_grade: u8,
    income_limit: u32,
    caste_category: String,
}

impl SchemeRow {
    fn into_scheme(self) -> Scheme {
        Scheme {
            id: self.id,
            name: self.name,
            min_grade: self.min_grade,
            max_grade: self.max_grade,
            income_limit: self.income_limit,
            caste_category: self.caste_category,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemeTableError {
    #[error("unable to open scheme table {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse scheme table: {0}")]
    Csv(#[from] csv::Error),
    #[error("scheme table line {line}: min_grade {min_grade} exceeds max_grade {max_grade}")]
    InvalidGradeRange {
        line: usize,
        min_grade: u8,
        max_grade: u8,
    },
    #[error("scheme table lists id {0} more than once")]
    DuplicateId(u32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parses_csv_rows_with_whitespace() {
        let csv = "id,name,min_grade,max_grade,income_limit,caste_category\n\
                   7, Girls Hostel Grant ,6,12,120000, Any\n\
                   3,Tribal Welfare Bursary,1,8,200000,ST\n";

        let table = SchemeTable::from_reader(Cursor::new(csv)).expect("table parses");

        assert_eq!(table.len(), 2);
        assert_eq!(table.schemes()[0].name, "Girls Hostel Grant");
        assert_eq!(table.schemes()[0].caste_category, "Any");
        assert_eq!(table.schemes()[1].id, 3);
    }

    #[test]
    fn rejects_inverted_grade_ranges() {
        let csv = "id,name,min_grade,max_grade,income_limit,caste_category\n\
                   1,Broken,9,4,100000,Any\n";

        match SchemeTable::from_reader(Cursor::new(csv)) {
            Err(SchemeTableError::InvalidGradeRange { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected invalid grade range, got {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicate_ids() {
        let csv = "id,name,min_grade,max_grade,income_limit,caste_category\n\
                   1,First,1,4,100000,Any\n\
                   1,Second,5,8,100000,Any\n";

        assert!(matches!(
            SchemeTable::from_reader(Cursor::new(csv)),
            Err(SchemeTableError::DuplicateId(1))
        ));
    }

    #[test]
    fn rejects_malformed_numbers() {
        let csv = "id,name,min_grade,max_grade,income_limit,caste_category\n\
                   1,Bad,one,4,100000,Any\n";

        assert!(matches!(
            SchemeTable::from_reader(Cursor::new(csv)),
            Err(SchemeTableError::Csv(_))
        ));
    }

    #[test]
    fn standard_table_has_unique_ids() {
        let table = SchemeTable::standard();
        let ids: std::collections::BTreeSet<u32> =
            table.schemes().iter().map(|scheme| scheme.id).collect();
        assert_eq!(ids.len(), table.len());
    }
}
