use crate::grading::{
    round_off_2_decimals, score_term, GradeScale, GradingError, TermScores, TermStatus,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum rounded cumulative GPA for promotion. Fixed constant, independent
/// of both the grade scale and the pass-average threshold.
pub const PROMOTION_GPA_MIN: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromotionStatus {
    Promoted,
    Repeated,
}

pub fn promotion_status(cumulative_gpa: f64) -> PromotionStatus {
    if cumulative_gpa >= PROMOTION_GPA_MIN {
        PromotionStatus::Promoted
    } else {
        PromotionStatus::Repeated
    }
}

/// One term's stored outcome. Derived from the scores and the scale active at
/// submission time; never recomputed when the scale changes later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TermRecord {
    pub scores: TermScores,
    pub average: f64,
    pub gpa: f64,
    pub status: TermStatus,
}

impl TermRecord {
    pub fn compute(scale: &GradeScale, scores: TermScores) -> Self {
        let summary = score_term(scale, &scores);
        Self {
            scores,
            average: summary.average,
            gpa: summary.gpa,
            status: summary.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    /// Term key -> record, in first-submission order.
    pub terms: Vec<(String, TermRecord)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Student {
    fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            terms: Vec::new(),
            updated_at: None,
        }
    }

    pub fn term(&self, term: &str) -> Option<&TermRecord> {
        self.terms
            .iter()
            .find(|(t, _)| t == term)
            .map(|(_, record)| record)
    }

    /// Stores or overwrites the record for `term`. Other terms are untouched.
    pub fn record_term(&mut self, scale: &GradeScale, term: &str, scores: TermScores) -> TermRecord {
        let record = TermRecord::compute(scale, scores);
        match self.terms.iter_mut().find(|(t, _)| t == term) {
            Some((_, existing)) => *existing = record.clone(),
            None => self.terms.push((term.to_string(), record.clone())),
        }
        self.updated_at = Some(chrono::Utc::now().to_rfc3339());
        record
    }

    /// Simple mean of stored term GPAs, 2-dp rounded; 0 when no terms exist.
    /// Term order and subject counts do not weight the result.
    pub fn cumulative_gpa(&self) -> f64 {
        if self.terms.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.terms.iter().map(|(_, r)| r.gpa).sum();
        round_off_2_decimals(sum / self.terms.len() as f64)
    }

    pub fn promotion_status(&self) -> PromotionStatus {
        promotion_status(self.cumulative_gpa())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub index: usize,
    pub student_id: String,
    pub created: bool,
    pub record: TermRecord,
}

/// Insertion-ordered roster. Exclusive owner of its students; the trimmed
/// student name is the roster-wide uniqueness key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Roster {
    students: Vec<Student>,
}

impl Roster {
    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Student> {
        self.students.get(index)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.name == name)
    }

    /// Appends a new student. Fails if the name is blank or already taken;
    /// a duplicate never creates a second entry.
    pub fn insert_student(&mut self, name: &str) -> Result<usize, GradingError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GradingError::new(
                "validation_failed",
                "student name is required",
            ));
        }
        if self.find_by_name(name).is_some() {
            return Err(GradingError::new(
                "validation_failed",
                format!("student already exists: {}", name),
            ));
        }
        self.students.push(Student::new(name.to_string()));
        Ok(self.students.len() - 1)
    }

    /// Upserts one term submission: an existing name gets that term's record
    /// overwritten, a new name creates the student at the end of the roster.
    pub fn submit_term(
        &mut self,
        scale: &GradeScale,
        name: &str,
        term: &str,
        scores: TermScores,
    ) -> Result<SubmitOutcome, GradingError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GradingError::new(
                "validation_failed",
                "student name is required",
            ));
        }
        let term = term.trim();
        if term.is_empty() {
            return Err(GradingError::new("validation_failed", "term is required"));
        }

        let (index, created) = match self.students.iter().position(|s| s.name == name) {
            Some(i) => (i, false),
            None => (self.insert_student(name)?, true),
        };
        let student = &mut self.students[index];
        let record = student.record_term(scale, term, scores);
        Ok(SubmitOutcome {
            index,
            student_id: student.id.clone(),
            created,
            record,
        })
    }

    /// Removes exactly the student at `index`; later indices shift down by
    /// one. Out-of-range is a reported failure, never a panic.
    pub fn delete_at(&mut self, index: usize) -> Result<Student, GradingError> {
        if index >= self.students.len() {
            return Err(GradingError::new(
                "not_found",
                format!("no student at index {}", index),
            ));
        }
        Ok(self.students.remove(index))
    }
}
