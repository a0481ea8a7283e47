use crate::{error::AppError, types::StudentRecord};
use std::{collections::HashSet, io::Read, path::Path};
use tracing::{info, warn};

/// Read-only student table, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Roster {
    students: Vec<StudentRecord>,
}

impl Roster {
    pub fn new(students: Vec<StudentRecord>) -> Self {
        let mut seen = HashSet::new();
        for student in &students {
            if !seen.insert(student.name.as_str()) {
                warn!("Duplicate student name in roster: {}", student.name);
            }
        }
        Self { students }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let roster = Self::from_reader(file)?;
        info!("Loaded {} students from {}", roster.len(), path.display());
        Ok(roster)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AppError> {
        let mut csv_reader = csv::ReaderBuilder::new().from_reader(reader);

        let students = csv_reader
            .deserialize::<StudentRecord>()
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(students))
    }

    /// Index of the first student with exactly this name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.students.iter().position(|s| s.name == name)
    }

    pub fn students(&self) -> &[StudentRecord] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}
