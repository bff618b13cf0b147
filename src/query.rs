use crate::grading::{format_mark, GradeScale, TermStatus};
use crate::report::{subject_marks, SubjectMark};
use crate::roster::{PromotionStatus, Roster};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pass,
    Fail,
}

impl StatusFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "pass" => Some(Self::Pass),
            "fail" => Some(Self::Fail),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    NameAsc,
    NameDesc,
    AvgAsc,
    AvgDesc,
}

impl SortKey {
    /// Unrecognized values mean "no sort": rows keep roster insertion order.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "nameAsc" => Some(Self::NameAsc),
            "nameDesc" => Some(Self::NameDesc),
            "avgAsc" => Some(Self::AvgAsc),
            "avgDesc" => Some(Self::AvgDesc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub search: Option<String>,
    pub status: StatusFilter,
    pub sort: Option<SortKey>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRow {
    pub student_id: String,
    pub name: String,
    pub subjects: Vec<SubjectMark>,
    pub average: f64,
    pub gpa: f64,
    pub status: TermStatus,
    pub cumulative_gpa: String,
    pub promotion: PromotionStatus,
    /// 1-based position by term GPA descending, independent of the display
    /// sort below.
    pub rank: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub rows: Vec<QueryRow>,
    pub empty: bool,
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Term view over the roster. Filters apply in fixed order: name-substring
/// search (case-insensitive), then status (non-`all` keeps only students with
/// a matching record for `term`), then the display sort. Only students with a
/// record for `term` produce rows. Ranking is a separate pass: a stable sort
/// of the surviving rows by term GPA descending assigns 1-based ranks, with
/// roster order breaking ties; the rank labels are attached before the
/// display sort runs, so row order and rank order are independent.
pub fn query_term(
    roster: &Roster,
    scale: &GradeScale,
    term: &str,
    opts: &QueryOptions,
) -> QueryResult {
    let needle = opts
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut rows: Vec<QueryRow> = Vec::new();
    for student in roster.students() {
        if let Some(needle) = &needle {
            if !student.name.to_lowercase().contains(needle.as_str()) {
                continue;
            }
        }
        let record = student.term(term);
        match opts.status {
            StatusFilter::All => {}
            StatusFilter::Pass | StatusFilter::Fail => {
                let want = if opts.status == StatusFilter::Pass {
                    TermStatus::Pass
                } else {
                    TermStatus::Fail
                };
                // Students with no record for the term are excluded outright.
                if record.map(|r| r.status != want).unwrap_or(true) {
                    continue;
                }
            }
        }
        let Some(record) = record else {
            continue;
        };
        rows.push(QueryRow {
            student_id: student.id.clone(),
            name: student.name.clone(),
            subjects: subject_marks(scale, &record.scores),
            average: record.average,
            gpa: record.gpa,
            status: record.status,
            cumulative_gpa: format_mark(student.cumulative_gpa()),
            promotion: student.promotion_status(),
            rank: 0,
        });
    }

    if rows.is_empty() {
        return QueryResult {
            rows: Vec::new(),
            empty: true,
        };
    }

    let mut by_gpa: Vec<usize> = (0..rows.len()).collect();
    by_gpa.sort_by(|&a, &b| {
        rows[b]
            .gpa
            .partial_cmp(&rows[a].gpa)
            .unwrap_or(Ordering::Equal)
    });
    for (pos, &idx) in by_gpa.iter().enumerate() {
        rows[idx].rank = pos + 1;
    }

    match opts.sort {
        Some(SortKey::NameAsc) => rows.sort_by(|a, b| compare_names(&a.name, &b.name)),
        Some(SortKey::NameDesc) => rows.sort_by(|a, b| compare_names(&b.name, &a.name)),
        Some(SortKey::AvgAsc) => rows.sort_by(|a, b| {
            a.average
                .partial_cmp(&b.average)
                .unwrap_or(Ordering::Equal)
        }),
        Some(SortKey::AvgDesc) => rows.sort_by(|a, b| {
            b.average
                .partial_cmp(&a.average)
                .unwrap_or(Ordering::Equal)
        }),
        None => {}
    }

    QueryResult { rows, empty: false }
}
