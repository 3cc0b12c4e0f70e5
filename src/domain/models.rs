use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::timestamp;

/// Role carried by every account and every issued token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    // ---
    Student,
    Admin,
}

impl Role {
    // ---
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            Role::Student => "STUDENT",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    /// Case-insensitive, so sign-up payloads may send `"admin"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        match s.trim().to_ascii_uppercase().as_str() {
            "STUDENT" => Ok(Role::Student),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A registered account. The password hash never leaves the service layer.
#[derive(Debug, Clone)]
pub struct User {
    // ---
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub role: Role,
}

/// Account data ready to be persisted; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    // ---
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub role: Role,
}

/// Authenticated caller, decoded from a bearer token once per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    // ---
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl Identity {
    // ---
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        // ---
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

/// An exam as stored and as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    // ---
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "timestamp")]
    pub exam_date: DateTime<Utc>,
    pub duration_in_minutes: i32,
    pub max_marks: i32,
    pub passing_marks: i32,
    pub active: bool,
    pub course_name: Option<String>,
    pub created_by: Option<String>,
    /// Declared capacity. Registration does not enforce it.
    pub max_capacity: i32,
    pub name: String,
    #[serde(default, with = "timestamp::option")]
    pub registration_deadline: Option<DateTime<Utc>>,
}

/// Exam payload accepted on create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExam {
    // ---
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "timestamp")]
    pub exam_date: DateTime<Utc>,
    pub duration_in_minutes: i32,
    pub max_marks: i32,
    pub passing_marks: i32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    pub max_capacity: i32,
    pub name: String,
    #[serde(default, with = "timestamp::option")]
    pub registration_deadline: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl NewExam {
    // ---
    /// Materializes the draft with a store-assigned id.
    pub fn into_exam(self, id: i64) -> Exam {
        // ---
        Exam {
            id,
            title: self.title,
            description: self.description,
            exam_date: self.exam_date,
            duration_in_minutes: self.duration_in_minutes,
            max_marks: self.max_marks,
            passing_marks: self.passing_marks,
            active: self.active,
            course_name: self.course_name,
            created_by: self.created_by,
            max_capacity: self.max_capacity,
            name: self.name,
            registration_deadline: self.registration_deadline,
        }
    }
}

impl Exam {
    // ---
    /// Overwrites the fields an admin may change after creation.
    ///
    /// `created_by`, `name`, `max_capacity` and `registration_deadline`
    /// keep their original values.
    pub fn apply_update(&mut self, update: NewExam) {
        // ---
        self.title = update.title;
        self.description = update.description;
        self.exam_date = update.exam_date;
        self.duration_in_minutes = update.duration_in_minutes;
        self.max_marks = update.max_marks;
        self.passing_marks = update.passing_marks;
        self.active = update.active;
        self.course_name = update.course_name;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegistrationStatus {
    // ---
    Registered,
    Cancelled,
    /// Reserved for the grading workflow; nothing produces it yet.
    Completed,
    /// Reserved for the grading workflow; nothing produces it yet.
    Missed,
}

impl RegistrationStatus {
    // ---
    pub fn as_str(&self) -> &'static str {
        // ---
        match self {
            RegistrationStatus::Registered => "REGISTERED",
            RegistrationStatus::Cancelled => "CANCELLED",
            RegistrationStatus::Completed => "COMPLETED",
            RegistrationStatus::Missed => "MISSED",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        match s {
            "REGISTERED" => Ok(RegistrationStatus::Registered),
            "CANCELLED" => Ok(RegistrationStatus::Cancelled),
            "COMPLETED" => Ok(RegistrationStatus::Completed),
            "MISSED" => Ok(RegistrationStatus::Missed),
            other => Err(format!("unknown registration status: {other}")),
        }
    }
}

/// A student's seat on an exam. Unique per (user, exam).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    // ---
    pub id: i64,
    pub user_id: i64,
    pub exam_id: i64,
    pub registration_date: DateTime<Utc>,
    pub status: RegistrationStatus,
    pub score: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewRegistration {
    // ---
    pub user_id: i64,
    pub exam_id: i64,
    pub registration_date: DateTime<Utc>,
    pub status: RegistrationStatus,
}

impl NewRegistration {
    // ---
    pub fn into_registration(self, id: i64) -> Registration {
        // ---
        Registration {
            id,
            user_id: self.user_id,
            exam_id: self.exam_id,
            registration_date: self.registration_date,
            status: self.status,
            score: None,
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn role_parses_case_insensitively() {
        // ---
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" Student ".parse::<Role>().unwrap(), Role::Student);
        assert!("proctor".parse::<Role>().is_err());
    }

    #[test]
    fn status_text_matches_storage_format() {
        // ---
        for status in [
            RegistrationStatus::Registered,
            RegistrationStatus::Cancelled,
            RegistrationStatus::Completed,
            RegistrationStatus::Missed,
        ] {
            assert_eq!(status.as_str().parse::<RegistrationStatus>().unwrap(), status);
        }
        assert!("registered".parse::<RegistrationStatus>().is_err());
    }

    #[test]
    fn exam_payload_accepts_zone_less_dates_and_defaults_active() {
        // ---
        let json = r#"{
            "title": "Algebra I",
            "examDate": "2030-06-01T09:30:00",
            "durationInMinutes": 90,
            "maxMarks": 100,
            "passingMarks": 40,
            "maxCapacity": 30,
            "name": "ALG-1"
        }"#;

        let exam: NewExam = serde_json::from_str(json).unwrap();
        assert!(exam.active);
        assert_eq!(
            exam.exam_date,
            Utc.with_ymd_and_hms(2030, 6, 1, 9, 30, 0).unwrap()
        );
        assert!(exam.registration_deadline.is_none());
        assert!(exam.course_name.is_none());
    }

    #[test]
    fn apply_update_keeps_creation_only_fields() {
        // ---
        let date = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let draft = NewExam {
            title: "Old".to_string(),
            description: None,
            exam_date: date,
            duration_in_minutes: 60,
            max_marks: 100,
            passing_marks: 50,
            active: true,
            course_name: Some("Math".to_string()),
            created_by: Some("root".to_string()),
            max_capacity: 20,
            name: "M-1".to_string(),
            registration_deadline: Some(date),
        };
        let mut exam = draft.clone().into_exam(7);

        let mut update = draft;
        update.title = "New".to_string();
        update.active = false;
        update.created_by = Some("someone-else".to_string());
        update.max_capacity = 999;
        update.registration_deadline = None;
        exam.apply_update(update);

        assert_eq!(exam.id, 7);
        assert_eq!(exam.title, "New");
        assert!(!exam.active);
        assert_eq!(exam.created_by.as_deref(), Some("root"));
        assert_eq!(exam.max_capacity, 20);
        assert_eq!(exam.registration_deadline, Some(date));
    }
}
