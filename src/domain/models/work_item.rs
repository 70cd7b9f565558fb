//! Diagnostic work items.
//!
//! A [`WorkItem`] is one outstanding diagnostic reported by the static
//! analysis tool. Work items are immutable once parsed; their [`Category`]
//! is derived from the diagnostic code by [`Category::from_code`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source location of a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// Path of the file, as reported by the tool
    pub file: String,
    /// 1-based line number
    pub line: u32,
    /// 1-based column number
    pub column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

impl FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warning" | "warn" => Ok(Self::Warning),
            _ => Err(anyhow::anyhow!("Invalid severity: {s}")),
        }
    }
}

/// Diagnostic category, assigned from the diagnostic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TypeAssignment,
    NullOrUndefined,
    ImportOrModule,
    Generics,
    UnknownType,
    Other,
}

/// Known diagnostic codes and the category each one belongs to.
const CODE_TABLE: &[(&str, Category)] = &[
    // Assignability / argument mismatches
    ("TS2322", Category::TypeAssignment),
    ("TS2345", Category::TypeAssignment),
    ("TS2352", Category::TypeAssignment),
    ("TS2366", Category::TypeAssignment),
    ("TS2741", Category::TypeAssignment),
    ("TS2739", Category::TypeAssignment),
    ("TS2740", Category::TypeAssignment),
    ("TS2769", Category::TypeAssignment),
    // Possibly null / undefined access
    ("TS2531", Category::NullOrUndefined),
    ("TS2532", Category::NullOrUndefined),
    ("TS2533", Category::NullOrUndefined),
    ("TS2454", Category::NullOrUndefined),
    ("TS18047", Category::NullOrUndefined),
    ("TS18048", Category::NullOrUndefined),
    ("TS18049", Category::NullOrUndefined),
    // Module resolution and exports
    ("TS2307", Category::ImportOrModule),
    ("TS2305", Category::ImportOrModule),
    ("TS2306", Category::ImportOrModule),
    ("TS2614", Category::ImportOrModule),
    ("TS2724", Category::ImportOrModule),
    ("TS1192", Category::ImportOrModule),
    ("TS7016", Category::ImportOrModule),
    // Generic arity and constraints
    ("TS2314", Category::Generics),
    ("TS2315", Category::Generics),
    ("TS2344", Category::Generics),
    ("TS2558", Category::Generics),
    // Missing names, implicit any, unknown members
    ("TS2304", Category::UnknownType),
    ("TS2339", Category::UnknownType),
    ("TS2551", Category::UnknownType),
    ("TS2552", Category::UnknownType),
    ("TS7006", Category::UnknownType),
    ("TS7031", Category::UnknownType),
    ("TS18046", Category::UnknownType),
];

impl Category {
    /// Classify a raw diagnostic code. Unmatched codes map to [`Category::Other`].
    ///
    /// Matching ignores case and tolerates a missing `TS` prefix, so `ts2322`
    /// and `2322` classify the same as `TS2322`.
    pub fn from_code(raw_code: &str) -> Self {
        let trimmed = raw_code.trim();
        let normalized = match trimmed.get(..2) {
            Some(prefix) if prefix.eq_ignore_ascii_case("ts") => format!("TS{}", &trimmed[2..]),
            _ => format!("TS{trimmed}"),
        };

        CODE_TABLE
            .iter()
            .find(|(code, _)| *code == normalized)
            .map_or(Self::Other, |(_, category)| *category)
    }

    /// All categories, in reporting order.
    pub const ALL: [Self; 6] = [
        Self::TypeAssignment,
        Self::NullOrUndefined,
        Self::ImportOrModule,
        Self::Generics,
        Self::UnknownType,
        Self::Other,
    ];

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::TypeAssignment => "type assignment",
            Self::NullOrUndefined => "null or undefined",
            Self::ImportOrModule => "import or module",
            Self::Generics => "generics",
            Self::UnknownType => "unknown type",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One outstanding diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItem {
    /// Where the diagnostic points
    pub location: Location,
    /// Diagnostic code (e.g. `TS2322`)
    pub code: String,
    /// Diagnostic message text
    pub message: String,
    /// Severity reported by the tool
    pub severity: Severity,
    /// Category derived from `code`
    pub category: Category,
}

impl WorkItem {
    /// Build a work item, deriving its category from `code`.
    pub fn new(
        file: impl Into<String>,
        line: u32,
        column: u32,
        code: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        let code = code.into();
        let category = Category::from_code(&code);
        Self {
            location: Location {
                file: file.into(),
                line,
                column,
            },
            code,
            message: message.into(),
            severity,
            category,
        }
    }

    /// Identity used to track a diagnostic across iterations.
    ///
    /// Line and column are excluded: edits elsewhere in a file shift them
    /// without the diagnostic itself changing.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            file: self.location.file.clone(),
            code: self.code.clone(),
            message: self.message.clone(),
        }
    }

    /// Single-line rendering used in prompts and logs.
    pub fn render(&self) -> String {
        format!(
            "{} [{}] {}: {}",
            self.location, self.code, self.severity, self.message
        )
    }
}

/// Cross-iteration identity of a [`WorkItem`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint {
    pub file: String,
    pub code: String,
    pub message: String,
}
