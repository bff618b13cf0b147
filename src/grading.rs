use serde::{Deserialize, Serialize};

/// Half-up rounding at two decimals: `floor(100*x + 0.5) / 100`.
/// All averages and grade-point figures are stored at this precision.
pub fn round_off_2_decimals(x: f64) -> f64 {
    ((100.0 * x) + 0.5).floor() / 100.0
}

/// Renders a rounded mark the way the shell displays it ("70.00", "0.00").
pub fn format_mark(x: f64) -> String {
    format!("{:.2}", x)
}

/// Minimum rounded term average for a Pass status. Fixed; deliberately not
/// derived from the grade scale bands.
pub const PASS_AVERAGE_MIN: f64 = 45.0;

pub const FALLBACK_LETTER: &str = "F";

#[derive(Debug, Clone, Serialize)]
pub struct GradingError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl GradingError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradeBand {
    pub min: f64,
    pub max: f64,
    pub letter: String,
}

/// Ordered set of grade bands. `classify` walks bands in stored order and the
/// first match wins, so overlapping bands are order-sensitive; callers are
/// expected to list bands highest range first. No overlap validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradeScale {
    bands: Vec<GradeBand>,
}

impl Default for GradeScale {
    fn default() -> Self {
        let bands = [
            (70.0, 100.0, "A"),
            (60.0, 69.0, "B"),
            (50.0, 59.0, "C"),
            (45.0, 49.0, "D"),
            (40.0, 44.0, "E"),
            (0.0, 39.0, "F"),
        ];
        Self {
            bands: bands
                .iter()
                .map(|(min, max, letter)| GradeBand {
                    min: *min,
                    max: *max,
                    letter: letter.to_string(),
                })
                .collect(),
        }
    }
}

impl GradeScale {
    /// Validates and normalizes a replacement band list. All-or-nothing: one
    /// invalid band rejects the whole update. Letters are trimmed and
    /// uppercased; bands are kept in the order given.
    pub fn new(bands: Vec<GradeBand>) -> Result<Self, GradingError> {
        let mut normalized = Vec::with_capacity(bands.len());
        for (i, band) in bands.into_iter().enumerate() {
            if !band.min.is_finite() || !band.max.is_finite() {
                return Err(GradingError::new(
                    "validation_failed",
                    "band min/max must be finite numbers",
                )
                .with_details(serde_json::json!({ "band": i })));
            }
            if band.min > band.max {
                return Err(GradingError::new(
                    "validation_failed",
                    "band min must not exceed max",
                )
                .with_details(serde_json::json!({ "band": i })));
            }
            let letter = band.letter.trim().to_uppercase();
            if letter.is_empty() {
                return Err(
                    GradingError::new("validation_failed", "band letter must not be empty")
                        .with_details(serde_json::json!({ "band": i })),
                );
            }
            normalized.push(GradeBand {
                min: band.min,
                max: band.max,
                letter,
            });
        }
        Ok(Self { bands: normalized })
    }

    pub fn bands(&self) -> &[GradeBand] {
        &self.bands
    }

    /// First band where `min <= score <= max`, else the fallback "F".
    pub fn classify(&self, score: f64) -> &str {
        for band in &self.bands {
            if score >= band.min && score <= band.max {
                return &band.letter;
            }
        }
        FALLBACK_LETTER
    }
}

/// A=5 .. F=0; any unrecognized letter silently maps to 0.
pub fn grade_to_point(letter: &str) -> f64 {
    match letter {
        "A" => 5.0,
        "B" => 4.0,
        "C" => 3.0,
        "D" => 2.0,
        "E" => 1.0,
        "F" => 0.0,
        _ => 0.0,
    }
}

/// One term's subject scores, as an insertion-ordered association list.
/// Construction enforces the invariants: subjects are trimmed non-empty
/// strings, unique by exact (case-sensitive) match, scores finite in [0,100].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TermScores(Vec<(String, f64)>);

impl TermScores {
    pub fn from_entries(entries: Vec<(String, f64)>) -> Result<Self, GradingError> {
        let mut seen: Vec<String> = Vec::with_capacity(entries.len());
        let mut out = Vec::with_capacity(entries.len());
        for (subject, score) in entries {
            let subject = subject.trim().to_string();
            if subject.is_empty() {
                return Err(GradingError::new(
                    "validation_failed",
                    "subject name must not be empty",
                ));
            }
            if seen.iter().any(|s| *s == subject) {
                return Err(GradingError::new(
                    "validation_failed",
                    format!("duplicate subject: {}", subject),
                ));
            }
            if !score.is_finite() || !(0.0..=100.0).contains(&score) {
                return Err(GradingError::new(
                    "validation_failed",
                    format!("score for {} must be between 0 and 100", subject),
                ));
            }
            seen.push(subject.clone());
            out.push((subject, score));
        }
        Ok(Self(out))
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TermSummary {
    pub average: f64,
    pub gpa: f64,
    pub status: TermStatus,
}

/// Scores one term submission against a scale. An empty score set degrades to
/// zero-valued average/gpa (and therefore Fail) rather than erroring.
pub fn score_term(scale: &GradeScale, scores: &TermScores) -> TermSummary {
    if scores.is_empty() {
        return TermSummary {
            average: 0.0,
            gpa: 0.0,
            status: TermStatus::Fail,
        };
    }
    let n = scores.len() as f64;
    let sum: f64 = scores.entries().iter().map(|(_, s)| *s).sum();
    let average = round_off_2_decimals(sum / n);
    let points: f64 = scores
        .entries()
        .iter()
        .map(|(_, s)| grade_to_point(scale.classify(*s)))
        .sum();
    let gpa = round_off_2_decimals(points / n);
    let status = if average >= PASS_AVERAGE_MIN {
        TermStatus::Pass
    } else {
        TermStatus::Fail
    };
    TermSummary {
        average,
        gpa,
        status,
    }
}
