use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::model::{Annotation, AnnotationPatch, NewAnnotation, ValidationErrors};

/// POST body. Fields stay untyped until validation so a wrong type becomes a
/// field error instead of a body rejection. Unknown keys such as `ownerId`
/// are dropped.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnnotationRequest {
    pub name: Option<Value>,
    pub x: Option<Value>,
    pub y: Option<Value>,
    pub width: Option<Value>,
    pub height: Option<Value>,
    pub fill: Option<Value>,
    pub stroke: Option<Value>,
    pub stroke_width: Option<Value>,
}

/// PUT body. Absent and `null` fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAnnotationRequest {
    pub name: Option<Value>,
    pub x: Option<Value>,
    pub y: Option<Value>,
    pub width: Option<Value>,
    pub height: Option<Value>,
    pub fill: Option<Value>,
    pub stroke: Option<Value>,
    pub stroke_width: Option<Value>,
}

impl CreateAnnotationRequest {
    pub fn into_new(self) -> Result<NewAnnotation, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        // Unparseable numbers become NaN; `validate` then reports them with the
        // same message as an out-of-range value.
        let mut new = NewAnnotation::new(
            number_or_nan(self.x.as_ref()),
            number_or_nan(self.y.as_ref()),
            number_or_nan(self.width.as_ref()),
            number_or_nan(self.height.as_ref()),
        );
        if let Some(name) = optional_name(&mut errors, self.name) {
            new.name = name;
        }
        if let Some(fill) = optional_string(&mut errors, "fill", "Fill", self.fill) {
            new.fill = fill;
        }
        if let Some(stroke) = optional_string(&mut errors, "stroke", "Stroke", self.stroke) {
            new.stroke = stroke;
        }
        if let Some(v) = self.stroke_width {
            new.stroke_width = number_or_nan(Some(&v));
        }

        if let Err(more) = new.validate() {
            for e in more.errors() {
                errors.push(e.field, e.message.clone());
            }
        }
        errors.into_result().map(|()| new)
    }
}

impl UpdateAnnotationRequest {
    pub fn into_patch(self) -> Result<AnnotationPatch, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let patch = AnnotationPatch {
            name: optional_string(&mut errors, "name", "Name", self.name),
            x: self.x.map(|v| number_or_nan(Some(&v))),
            y: self.y.map(|v| number_or_nan(Some(&v))),
            width: self.width.map(|v| number_or_nan(Some(&v))),
            height: self.height.map(|v| number_or_nan(Some(&v))),
            fill: optional_string(&mut errors, "fill", "Fill", self.fill),
            stroke: optional_string(&mut errors, "stroke", "Stroke", self.stroke),
            stroke_width: self.stroke_width.map(|v| number_or_nan(Some(&v))),
        };
        if let Err(more) = patch.validate() {
            for e in more.errors() {
                errors.push(e.field, e.message.clone());
            }
        }
        errors.into_result().map(|()| patch)
    }
}

/// JSON numbers and numeric strings ("12", "-3.5") are accepted.
fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn number_or_nan(value: Option<&Value>) -> f64 {
    value.and_then(parse_number).unwrap_or(f64::NAN)
}

/// A falsy name (`""`, `false`, `0`) means "no name".
fn optional_name(errors: &mut ValidationErrors, value: Option<Value>) -> Option<String> {
    match value {
        None | Some(Value::Bool(false)) => None,
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
        other => optional_string(errors, "name", "Name", other),
    }
}

fn optional_string(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    value: Option<Value>,
) -> Option<String> {
    match value {
        None => None,
        Some(Value::String(s)) => Some(s),
        Some(_) => {
            errors.push(field, format!("{label} must be a string"));
            None
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnnotationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub annotation: Annotation,
}

impl AnnotationResponse {
    pub fn new(annotation: Annotation) -> Self {
        Self {
            success: true,
            message: None,
            annotation,
        }
    }

    pub fn with_message(message: &'static str, annotation: Annotation) -> Self {
        Self {
            success: true,
            message: Some(message),
            annotation,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnnotationListResponse {
    pub success: bool,
    pub count: usize,
    pub annotations: Vec<Annotation>,
}

impl From<Vec<Annotation>> for AnnotationListResponse {
    fn from(annotations: Vec<Annotation>) -> Self {
        Self {
            success: true,
            count: annotations.len(),
            annotations,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}
