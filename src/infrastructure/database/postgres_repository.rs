use anyhow::anyhow;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{
    Exam, ExamStore, HealthProbe, NewExam, NewRegistration, NewUser, Registration,
    RegistrationStatus, RegistrationStore, StoreError, StoreResult, User, UserStore,
};

const EXAM_COLUMNS: &str = "id, title, description, exam_date, duration_in_minutes, max_marks, \
     passing_marks, active, course_name, created_by, max_capacity, name, registration_deadline";

const REGISTRATION_COLUMNS: &str = "id, user_id, exam_id, registration_date, status, score";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    email: String,
    role: String,
}

#[derive(sqlx::FromRow)]
struct ExamRow {
    id: i64,
    title: String,
    description: Option<String>,
    exam_date: DateTime<Utc>,
    duration_in_minutes: i32,
    max_marks: i32,
    passing_marks: i32,
    active: bool,
    course_name: Option<String>,
    created_by: Option<String>,
    max_capacity: i32,
    name: String,
    registration_deadline: Option<DateTime<Utc>>,
}

#[derive(sqlx::FromRow)]
struct RegistrationRow {
    id: i64,
    user_id: i64,
    exam_id: i64,
    registration_date: DateTime<Utc>,
    status: String,
    score: Option<i32>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        // ---
        let role = r.role.parse().map_err(|e: String| anyhow!(e))?;
        Ok(User {
            id: r.id,
            username: r.username,
            password_hash: r.password_hash,
            email: r.email,
            role,
        })
    }
}

impl From<ExamRow> for Exam {
    fn from(r: ExamRow) -> Self {
        // ---
        Exam {
            id: r.id,
            title: r.title,
            description: r.description,
            exam_date: r.exam_date,
            duration_in_minutes: r.duration_in_minutes,
            max_marks: r.max_marks,
            passing_marks: r.passing_marks,
            active: r.active,
            course_name: r.course_name,
            created_by: r.created_by,
            max_capacity: r.max_capacity,
            name: r.name,
            registration_deadline: r.registration_deadline,
        }
    }
}

impl TryFrom<RegistrationRow> for Registration {
    type Error = StoreError;

    fn try_from(r: RegistrationRow) -> Result<Self, Self::Error> {
        // ---
        let status = r.status.parse().map_err(|e: String| anyhow!(e))?;
        Ok(Registration {
            id: r.id,
            user_id: r.user_id,
            exam_id: r.exam_id,
            registration_date: r.registration_date,
            status,
            score: r.score,
        })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        // ---
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::Conflict(db.constraint().unwrap_or("unique").to_string());
            }
        }
        StoreError::Backend(err.into())
    }
}

fn registrations_from(rows: Vec<RegistrationRow>) -> StoreResult<Vec<Registration>> {
    rows.into_iter().map(Registration::try_from).collect()
}

pub struct PostgresRepository {
    // ---
    pool: PgPool,
}

impl PostgresRepository {
    // ---
    pub fn new(pool: PgPool) -> Self {
        // ---
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for PostgresRepository {
    // ---
    async fn find_user(&self, user_id: i64) -> StoreResult<Option<User>> {
        // ---
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, email, role FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        // ---
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, email, role FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        // ---
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        // ---
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        // ---
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (username, password_hash, email, role)
             VALUES ($1, $2, $3, $4)
             RETURNING id, username, password_hash, email, role",
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        User::try_from(row)
    }
}

#[async_trait::async_trait]
impl ExamStore for PostgresRepository {
    // ---
    async fn find_exam(&self, exam_id: i64) -> StoreResult<Option<Exam>> {
        // ---
        let row = sqlx::query_as::<_, ExamRow>(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1"
        ))
        .bind(exam_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Exam::from))
    }

    async fn exam_exists(&self, exam_id: i64) -> StoreResult<bool> {
        // ---
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM exams WHERE id = $1)")
            .bind(exam_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn list_exams(&self) -> StoreResult<Vec<Exam>> {
        // ---
        let rows = sqlx::query_as::<_, ExamRow>(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Exam::from).collect())
    }

    async fn list_active_exams_by_date(&self) -> StoreResult<Vec<Exam>> {
        // ---
        let rows = sqlx::query_as::<_, ExamRow>(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams WHERE active = TRUE ORDER BY exam_date ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Exam::from).collect())
    }

    async fn list_exams_by_course(&self, course_name: &str) -> StoreResult<Vec<Exam>> {
        // ---
        let rows = sqlx::query_as::<_, ExamRow>(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams WHERE course_name = $1 ORDER BY id"
        ))
        .bind(course_name)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Exam::from).collect())
    }

    async fn insert_exam(&self, exam: NewExam) -> StoreResult<Exam> {
        // ---
        let row = sqlx::query_as::<_, ExamRow>(&format!(
            "INSERT INTO exams (title, description, exam_date, duration_in_minutes, max_marks,
                                passing_marks, active, course_name, created_by, max_capacity,
                                name, registration_deadline)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {EXAM_COLUMNS}"
        ))
        .bind(&exam.title)
        .bind(&exam.description)
        .bind(exam.exam_date)
        .bind(exam.duration_in_minutes)
        .bind(exam.max_marks)
        .bind(exam.passing_marks)
        .bind(exam.active)
        .bind(&exam.course_name)
        .bind(&exam.created_by)
        .bind(exam.max_capacity)
        .bind(&exam.name)
        .bind(exam.registration_deadline)
        .fetch_one(&self.pool)
        .await?;

        Ok(Exam::from(row))
    }

    async fn update_exam(&self, exam: &Exam) -> StoreResult<Exam> {
        // ---
        // Single statement, so a concurrent reader never sees half an update.
        let row = sqlx::query_as::<_, ExamRow>(&format!(
            "UPDATE exams
             SET title = $1, description = $2, exam_date = $3, duration_in_minutes = $4,
                 max_marks = $5, passing_marks = $6, active = $7, course_name = $8
             WHERE id = $9
             RETURNING {EXAM_COLUMNS}"
        ))
        .bind(&exam.title)
        .bind(&exam.description)
        .bind(exam.exam_date)
        .bind(exam.duration_in_minutes)
        .bind(exam.max_marks)
        .bind(exam.passing_marks)
        .bind(exam.active)
        .bind(&exam.course_name)
        .bind(exam.id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Exam::from)
            .ok_or_else(|| StoreError::Backend(anyhow!("exam {} vanished during update", exam.id)))
    }

    async fn delete_exam(&self, exam_id: i64) -> StoreResult<bool> {
        // ---
        let result = sqlx::query("DELETE FROM exams WHERE id = $1")
            .bind(exam_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl RegistrationStore for PostgresRepository {
    // ---
    async fn find_registration(&self, registration_id: i64) -> StoreResult<Option<Registration>> {
        // ---
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1"
        ))
        .bind(registration_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Registration::try_from).transpose()
    }

    async fn list_registrations_by_user(&self, user_id: i64) -> StoreResult<Vec<Registration>> {
        // ---
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        registrations_from(rows)
    }

    async fn list_registrations_by_exam(&self, exam_id: i64) -> StoreResult<Vec<Registration>> {
        // ---
        let rows = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE exam_id = $1 ORDER BY id"
        ))
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;

        registrations_from(rows)
    }

    async fn find_registration_for(
        &self,
        user_id: i64,
        exam_id: i64,
    ) -> StoreResult<Option<Registration>> {
        // ---
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE user_id = $1 AND exam_id = $2"
        ))
        .bind(user_id)
        .bind(exam_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Registration::try_from).transpose()
    }

    async fn insert_registration(
        &self,
        registration: NewRegistration,
    ) -> StoreResult<Registration> {
        // ---
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "INSERT INTO registrations (user_id, exam_id, registration_date, status)
             VALUES ($1, $2, $3, $4)
             RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(registration.user_id)
        .bind(registration.exam_id)
        .bind(registration.registration_date)
        .bind(registration.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Registration::try_from(row)
    }

    async fn update_registration(
        &self,
        registration: &Registration,
        expected: RegistrationStatus,
    ) -> StoreResult<Option<Registration>> {
        // ---
        let row = sqlx::query_as::<_, RegistrationRow>(&format!(
            "UPDATE registrations SET registration_date = $1, status = $2, score = $3
             WHERE id = $4 AND status = $5
             RETURNING {REGISTRATION_COLUMNS}"
        ))
        .bind(registration.registration_date)
        .bind(registration.status.as_str())
        .bind(registration.score)
        .bind(registration.id)
        .bind(expected.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Registration::try_from).transpose()
    }
}

#[async_trait::async_trait]
impl HealthProbe for PostgresRepository {
    // ---
    async fn ping(&self) -> StoreResult<()> {
        // ---
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
