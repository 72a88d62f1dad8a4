use serde::Deserialize;

use crate::errors::{EvalSystemError, Result};

// 创建教师请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTeacherRequest {
    pub name: String,
}

// 创建课程请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCourseRequest {
    pub name: String,
    pub code: String,
}

// 创建开课请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateClassRequest {
    pub teacher_id: i64,
    pub course_id: i64,
    pub semester: String,
}

impl CreateClassRequest {
    /// 学期格式为 `YYYY-1` 或 `YYYY-2`
    pub fn check_semester(&self) -> Result<()> {
        let valid = match self.semester.split_once('-') {
            Some((year, half)) => {
                year.len() == 4
                    && year.chars().all(|c| c.is_ascii_digit())
                    && (half == "1" || half == "2")
            }
            None => false,
        };
        if valid {
            Ok(())
        } else {
            Err(EvalSystemError::validation(format!(
                "Semester must look like YYYY-S (e.g. 2025-1), got '{}'",
                self.semester
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(semester: &str) -> CreateClassRequest {
        CreateClassRequest {
            teacher_id: 1,
            course_id: 1,
            semester: semester.to_string(),
        }
    }

    #[test]
    fn test_semester_format() {
        assert!(class("2025-1").check_semester().is_ok());
        assert!(class("2025-2").check_semester().is_ok());
        assert!(class("2025-3").check_semester().is_err());
        assert!(class("25-1").check_semester().is_err());
        assert!(class("2025").check_semester().is_err());
    }
}
