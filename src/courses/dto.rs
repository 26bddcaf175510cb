use serde::Deserialize;

use super::repo::{CoursePatch, NewCourse};
use crate::{
    error::ApiError,
    serde_util::{non_blank, present, within_limit},
};

const COURSE_NAME_MAX: usize = 200;
const COURSE_CODE_MAX: usize = 50;
const SEMESTER_MAX: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct CreateCourseRequest {
    pub course_name: Option<String>,
    pub course_code: Option<String>,
    pub semester: Option<String>,
}

impl CreateCourseRequest {
    pub fn validate(self) -> Result<NewCourse, ApiError> {
        let (Some(name), Some(code)) = (
            non_blank(self.course_name.as_deref()),
            non_blank(self.course_code.as_deref()),
        ) else {
            return Err(ApiError::validation(
                "Please provide course_name and course_code",
            ));
        };
        let semester = non_blank(self.semester.as_deref());
        within_limit("course_name", name, COURSE_NAME_MAX)?;
        within_limit("course_code", code, COURSE_CODE_MAX)?;
        if let Some(semester) = semester {
            within_limit("semester", semester, SEMESTER_MAX)?;
        }
        Ok(NewCourse {
            course_name: name.to_string(),
            course_code: code.to_string(),
            semester: semester.map(str::to_string),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCourseRequest {
    pub course_name: Option<String>,
    pub course_code: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub semester: Option<Option<String>>,
}

impl UpdateCourseRequest {
    pub fn into_patch(self) -> Result<CoursePatch, ApiError> {
        let course_name = required_if_present(self.course_name, "course_name", COURSE_NAME_MAX)?;
        let course_code = required_if_present(self.course_code, "course_code", COURSE_CODE_MAX)?;
        // Blank and null both clear the semester.
        let semester = self
            .semester
            .map(|s| non_blank(s.as_deref()).map(str::to_string));
        if let Some(Some(s)) = &semester {
            within_limit("semester", s, SEMESTER_MAX)?;
        }

        let patch = CoursePatch {
            course_name,
            course_code,
            semester,
        };
        if patch.is_empty() {
            return Err(ApiError::validation("No fields to update"));
        }
        Ok(patch)
    }
}

fn required_if_present(
    value: Option<String>,
    field: &str,
    max: usize,
) -> Result<Option<String>, ApiError> {
    let Some(v) = value else {
        return Ok(None);
    };
    let v = non_blank(Some(&v))
        .ok_or_else(|| ApiError::validation(format!("{} cannot be empty", field)))?;
    within_limit(field, v, max)?;
    Ok(Some(v.to_string()))
}
