use crate::grading::{format_mark, GradeScale, TermScores, TermStatus};
use crate::roster::{PromotionStatus, Student};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubjectMark {
    pub subject: String,
    pub score: f64,
    pub letter: String,
}

/// Letters are classified with the scale in force at display time; the
/// stored average/gpa/status next to them keep their entry-time values.
pub fn subject_marks(scale: &GradeScale, scores: &TermScores) -> Vec<SubjectMark> {
    scores
        .entries()
        .iter()
        .map(|(subject, score)| SubjectMark {
            subject: subject.clone(),
            score: *score,
            letter: scale.classify(*score).to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermReport {
    pub term: String,
    pub subjects: Vec<SubjectMark>,
    pub average: f64,
    pub gpa: f64,
    pub status: TermStatus,
}

/// Printable report-card data for one student. Rendering is the shell's job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportModel {
    pub student_name: String,
    pub terms: Vec<TermReport>,
    pub cumulative_gpa: String,
    pub promotion: PromotionStatus,
}

/// Terms are emitted in storage order (first-submission order), with no
/// chronological re-sort.
pub fn build_report(scale: &GradeScale, student: &Student) -> ReportModel {
    let terms = student
        .terms
        .iter()
        .map(|(term, record)| TermReport {
            term: term.clone(),
            subjects: subject_marks(scale, &record.scores),
            average: record.average,
            gpa: record.gpa,
            status: record.status,
        })
        .collect();
    ReportModel {
        student_name: student.name.clone(),
        terms,
        cumulative_gpa: format_mark(student.cumulative_gpa()),
        promotion: student.promotion_status(),
    }
}
