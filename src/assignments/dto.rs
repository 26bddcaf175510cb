use serde::Deserialize;
use time::Date;

use super::repo::{AssignmentPatch, AssignmentStatus, NewAssignment};
use crate::{
    error::ApiError,
    serde_util::{self, non_blank, present, within_limit},
};

const INVALID_STATUS: &str = "Status must be either Pending or Completed";
const TITLE_MAX: usize = 200;

fn parse_status(raw: &str) -> Result<AssignmentStatus, ApiError> {
    AssignmentStatus::parse(raw.trim()).ok_or_else(|| ApiError::validation(INVALID_STATUS))
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateAssignmentRequest {
    #[serde(default, deserialize_with = "serde_util::lenient_id")]
    pub course_id: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "serde_util::date::option")]
    pub due_date: Option<Date>,
    pub status: Option<String>,
}

/// A create request with its required fields present. The status is still
/// unchecked: it is only judged once the course is known to be the caller's.
#[derive(Debug)]
pub struct AssignmentDraft {
    pub course_id: i32,
    title: String,
    description: Option<String>,
    due_date: Date,
    status: Option<String>,
}

impl CreateAssignmentRequest {
    pub fn validate(self) -> Result<AssignmentDraft, ApiError> {
        let (Some(course_id), Some(title), Some(due_date)) = (
            self.course_id,
            non_blank(self.title.as_deref()),
            self.due_date,
        ) else {
            return Err(ApiError::validation(
                "Please provide course_id, title, and due_date",
            ));
        };
        within_limit("title", title, TITLE_MAX)?;

        Ok(AssignmentDraft {
            course_id,
            title: title.to_string(),
            description: non_blank(self.description.as_deref()).map(str::to_string),
            due_date,
            status: non_blank(self.status.as_deref()).map(str::to_string),
        })
    }
}

impl AssignmentDraft {
    /// A blank or missing status defaults to `Pending`.
    pub fn into_new(self) -> Result<NewAssignment, ApiError> {
        let status = match self.status.as_deref() {
            None => AssignmentStatus::default(),
            Some(raw) => parse_status(raw)?,
        };
        Ok(NewAssignment {
            course_id: self.course_id,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            status,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAssignmentRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "serde_util::date::option")]
    pub due_date: Option<Date>,
    pub status: Option<String>,
}

/// A non-empty patch whose status, if any, has not been checked yet.
#[derive(Debug)]
pub struct PatchDraft {
    patch: AssignmentPatch,
    status: Option<String>,
}

impl UpdateAssignmentRequest {
    pub fn into_patch(self) -> Result<PatchDraft, ApiError> {
        let title = match self.title {
            None => None,
            Some(t) => {
                let t = non_blank(Some(&t))
                    .ok_or_else(|| ApiError::validation("title cannot be empty"))?;
                within_limit("title", t, TITLE_MAX)?;
                Some(t.to_string())
            }
        };
        // Blank and null both clear the description.
        let description = self
            .description
            .map(|d| non_blank(d.as_deref()).map(str::to_string));

        let patch = AssignmentPatch {
            title,
            description,
            due_date: self.due_date,
            status: None,
        };
        if patch.is_empty() && self.status.is_none() {
            return Err(ApiError::validation("No fields to update"));
        }
        Ok(PatchDraft {
            patch,
            status: self.status,
        })
    }
}

impl PatchDraft {
    pub fn into_patch(self) -> Result<AssignmentPatch, ApiError> {
        let status = self.status.as_deref().map(parse_status).transpose()?;
        Ok(AssignmentPatch {
            status,
            ..self.patch
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn create(json: &str) -> Result<NewAssignment, ApiError> {
        serde_json::from_str::<CreateAssignmentRequest>(json)
            .unwrap()
            .validate()?
            .into_new()
    }

    fn update(json: &str) -> Result<AssignmentPatch, ApiError> {
        serde_json::from_str::<UpdateAssignmentRequest>(json)
            .unwrap()
            .into_patch()?
            .into_patch()
    }

    #[test]
    fn create_defaults_status_to_pending() {
        let new = create(r#"{"course_id": 1, "title": "T1", "due_date": "2026-02-15"}"#).unwrap();
        assert_eq!(new.status, AssignmentStatus::Pending);
        assert_eq!(new.due_date, date!(2026 - 02 - 15));
        assert_eq!(new.description, None);

        let new = create(r#"{"course_id": "1", "title": "T1", "due_date": "2026-02-15", "status": ""}"#)
            .unwrap();
        assert_eq!(new.course_id, 1);
        assert_eq!(new.status, AssignmentStatus::Pending);
    }

    #[test]
    fn create_rejects_unknown_status() {
        let err = create(
            r#"{"course_id": 1, "title": "T1", "due_date": "2026-02-15", "status": "Archived"}"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), INVALID_STATUS);
    }

    #[test]
    fn create_status_is_judged_after_required_fields() {
        let body = r#"{"course_id": 1, "title": "T1", "due_date": "2026-02-15", "status": "Archived"}"#;
        let draft = serde_json::from_str::<CreateAssignmentRequest>(body)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(draft.course_id, 1);
        assert!(matches!(draft.into_new(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn create_requires_course_title_and_due_date() {
        for body in [
            r#"{"title": "T1", "due_date": "2026-02-15"}"#,
            r#"{"course_id": 1, "due_date": "2026-02-15"}"#,
            r#"{"course_id": 1, "title": "T1"}"#,
            r#"{"course_id": 1, "title": "  ", "due_date": "2026-02-15"}"#,
            r#"{"course_id": "", "title": "T1", "due_date": "2026-02-15"}"#,
        ] {
            assert!(matches!(create(body), Err(ApiError::Validation(_))), "{}", body);
        }
    }

    #[test]
    fn overlong_title_is_rejected() {
        let body = format!(
            r#"{{"course_id": 1, "title": "{}", "due_date": "2026-02-15"}}"#,
            "T".repeat(201)
        );
        assert_eq!(
            create(&body).unwrap_err().to_string(),
            "title must be at most 200 characters"
        );
        let body = format!(r#"{{"title": "{}"}}"#, "T".repeat(201));
        assert!(matches!(update(&body), Err(ApiError::Validation(_))));
    }

    #[test]
    fn update_keeps_absent_and_null_apart() {
        let patch = update(r#"{"description": null}"#).unwrap();
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.title, None);

        let patch = update(r#"{"status": "Completed"}"#).unwrap();
        assert_eq!(patch.status, Some(AssignmentStatus::Completed));
        assert_eq!(patch.description, None);
    }

    #[test]
    fn update_rejects_empty_and_invalid() {
        assert_eq!(update("{}").unwrap_err().to_string(), "No fields to update");
        assert!(matches!(update(r#"{"status": "Done"}"#), Err(ApiError::Validation(_))));
        assert!(matches!(update(r#"{"title": ""}"#), Err(ApiError::Validation(_))));
    }

    #[test]
    fn update_status_is_judged_after_the_empty_check() {
        let draft = serde_json::from_str::<UpdateAssignmentRequest>(r#"{"status": "Archived"}"#)
            .unwrap()
            .into_patch()
            .unwrap();
        assert_eq!(draft.into_patch().unwrap_err().to_string(), INVALID_STATUS);
    }
}
