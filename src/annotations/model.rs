use std::fmt;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

pub const DEFAULT_FILL: &str = "rgba(0, 123, 255, 0.3)";
pub const DEFAULT_STROKE: &str = "#007bff";
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;
pub const NAME_MAX_CHARS: usize = 50;
pub const MIN_SIZE: f64 = 1.0;

/// A rectangle drawn by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Field values for a record that does not exist yet. Owner, id and timestamps
/// are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnnotation {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
}

impl NewAnnotation {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            name: String::new(),
            x,
            y,
            width,
            height,
            fill: DEFAULT_FILL.to_string(),
            stroke: DEFAULT_STROKE.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_name(&mut errors, &self.name);
        check_finite(&mut errors, "x", "X coordinate", self.x);
        check_finite(&mut errors, "y", "Y coordinate", self.y);
        check_size(&mut errors, "width", "Width", self.width);
        check_size(&mut errors, "height", "Height", self.height);
        check_finite(&mut errors, "strokeWidth", "Stroke width", self.stroke_width);
        errors.into_result()
    }

    pub fn into_annotation(self, owner_id: Uuid, now: OffsetDateTime) -> Annotation {
        Annotation {
            id: Uuid::new_v4(),
            owner_id,
            name: self.name,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            fill: self.fill,
            stroke: self.stroke,
            stroke_width: self.stroke_width,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationPatch {
    pub name: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
}

impl AnnotationPatch {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if let Some(name) = &self.name {
            check_name(&mut errors, name);
        }
        if let Some(x) = self.x {
            check_finite(&mut errors, "x", "X coordinate", x);
        }
        if let Some(y) = self.y {
            check_finite(&mut errors, "y", "Y coordinate", y);
        }
        if let Some(width) = self.width {
            check_size(&mut errors, "width", "Width", width);
        }
        if let Some(height) = self.height {
            check_size(&mut errors, "height", "Height", height);
        }
        if let Some(stroke_width) = self.stroke_width {
            check_finite(&mut errors, "strokeWidth", "Stroke width", stroke_width);
        }
        errors.into_result()
    }

    /// Copies the present fields onto `target` and moves `updated_at` forward.
    pub fn apply(self, target: &mut Annotation, now: OffsetDateTime) {
        if let Some(name) = self.name {
            target.name = name;
        }
        if let Some(x) = self.x {
            target.x = x;
        }
        if let Some(y) = self.y {
            target.y = y;
        }
        if let Some(width) = self.width {
            target.width = width;
        }
        if let Some(height) = self.height {
            target.height = height;
        }
        if let Some(fill) = self.fill {
            target.fill = fill;
        }
        if let Some(stroke) = self.stroke {
            target.stroke = stroke;
        }
        if let Some(stroke_width) = self.stroke_width {
            target.stroke_width = stroke_width;
        }
        target.updated_at = next_updated_at(target.updated_at, now);
    }
}

/// Current time truncated to microseconds, the resolution Postgres keeps.
pub fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(now.microsecond() * 1_000)
        .unwrap_or(now)
}

/// `updated_at` must move strictly forward even when two writes land inside
/// the same microsecond.
pub fn next_updated_at(previous: OffsetDateTime, now: OffsetDateTime) -> OffsetDateTime {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "validation failed ({})", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn check_name(errors: &mut ValidationErrors, name: &str) {
    if name.chars().count() > NAME_MAX_CHARS {
        errors.push("name", "Name cannot exceed 50 characters");
    }
}

fn check_finite(errors: &mut ValidationErrors, field: &'static str, label: &str, value: f64) {
    if !value.is_finite() {
        errors.push(field, format!("{label} must be a number"));
    }
}

fn check_size(errors: &mut ValidationErrors, field: &'static str, label: &str, value: f64) {
    if !value.is_finite() || value < MIN_SIZE {
        errors.push(field, format!("{label} must be at least 1"));
    }
}
