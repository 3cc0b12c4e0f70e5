//! In-process store for local runs and tests.
//!
//! Mirrors the PostgreSQL schema's constraints: unique usernames, unique
//! emails, unique (user, exam) registrations, and cascading removal of an
//! exam's registrations when the exam is deleted. Every operation takes the
//! single state lock, so each write is atomic with respect to the others.

use crate::domain::{
    Exam, ExamStore, HealthProbe, NewExam, NewRegistration, NewUser, Registration,
    RegistrationStatus, RegistrationStore, StoreError, StoreResult, Stores, User, UserStore,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct State {
    users: BTreeMap<i64, User>,
    exams: BTreeMap<i64, Exam>,
    registrations: BTreeMap<i64, Registration>,
    next_id: i64,
}

impl State {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    // ---
    state: Mutex<State>,
}

impl MemoryRepository {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Creates an empty in-memory backend split into the individual stores.
pub fn create_memory_repository() -> Stores {
    // ---
    Stores::from_backend(Arc::new(MemoryRepository::new()))
}

#[async_trait::async_trait]
impl UserStore for MemoryRepository {
    // ---
    async fn find_user(&self, user_id: i64) -> StoreResult<Option<User>> {
        Ok(self.state().users.get(&user_id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        // ---
        Ok(self
            .state()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        Ok(self.state().users.values().any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(self.state().users.values().any(|u| u.email == email))
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        // ---
        let mut state = self.state();

        if state.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict("users_username_key".to_string()));
        }
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }

        let id = state.allocate_id();
        let stored = User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
            role: user.role,
        };
        state.users.insert(id, stored.clone());

        Ok(stored)
    }
}

#[async_trait::async_trait]
impl ExamStore for MemoryRepository {
    // ---
    async fn find_exam(&self, exam_id: i64) -> StoreResult<Option<Exam>> {
        Ok(self.state().exams.get(&exam_id).cloned())
    }

    async fn exam_exists(&self, exam_id: i64) -> StoreResult<bool> {
        Ok(self.state().exams.contains_key(&exam_id))
    }

    async fn list_exams(&self) -> StoreResult<Vec<Exam>> {
        Ok(self.state().exams.values().cloned().collect())
    }

    async fn list_active_exams_by_date(&self) -> StoreResult<Vec<Exam>> {
        // ---
        let mut exams: Vec<Exam> = self
            .state()
            .exams
            .values()
            .filter(|e| e.active)
            .cloned()
            .collect();
        exams.sort_by_key(|e| e.exam_date);

        Ok(exams)
    }

    async fn list_exams_by_course(&self, course_name: &str) -> StoreResult<Vec<Exam>> {
        // ---
        Ok(self
            .state()
            .exams
            .values()
            .filter(|e| e.course_name.as_deref() == Some(course_name))
            .cloned()
            .collect())
    }

    async fn insert_exam(&self, exam: NewExam) -> StoreResult<Exam> {
        // ---
        let mut state = self.state();
        let id = state.allocate_id();
        let stored = exam.into_exam(id);
        state.exams.insert(id, stored.clone());

        Ok(stored)
    }

    async fn update_exam(&self, exam: &Exam) -> StoreResult<Exam> {
        // ---
        let mut state = self.state();
        let stored = state.exams.get_mut(&exam.id).ok_or_else(|| {
            StoreError::Backend(anyhow::anyhow!("exam {} vanished during update", exam.id))
        })?;

        stored.title = exam.title.clone();
        stored.description = exam.description.clone();
        stored.exam_date = exam.exam_date;
        stored.duration_in_minutes = exam.duration_in_minutes;
        stored.max_marks = exam.max_marks;
        stored.passing_marks = exam.passing_marks;
        stored.active = exam.active;
        stored.course_name = exam.course_name.clone();

        Ok(stored.clone())
    }

    async fn delete_exam(&self, exam_id: i64) -> StoreResult<bool> {
        // ---
        let mut state = self.state();
        if state.exams.remove(&exam_id).is_none() {
            return Ok(false);
        }
        state.registrations.retain(|_, r| r.exam_id != exam_id);

        Ok(true)
    }
}

#[async_trait::async_trait]
impl RegistrationStore for MemoryRepository {
    // ---
    async fn find_registration(&self, registration_id: i64) -> StoreResult<Option<Registration>> {
        Ok(self.state().registrations.get(&registration_id).cloned())
    }

    async fn list_registrations_by_user(&self, user_id: i64) -> StoreResult<Vec<Registration>> {
        // ---
        Ok(self
            .state()
            .registrations
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_registrations_by_exam(&self, exam_id: i64) -> StoreResult<Vec<Registration>> {
        // ---
        Ok(self
            .state()
            .registrations
            .values()
            .filter(|r| r.exam_id == exam_id)
            .cloned()
            .collect())
    }

    async fn find_registration_for(
        &self,
        user_id: i64,
        exam_id: i64,
    ) -> StoreResult<Option<Registration>> {
        // ---
        Ok(self
            .state()
            .registrations
            .values()
            .find(|r| r.user_id == user_id && r.exam_id == exam_id)
            .cloned())
    }

    async fn insert_registration(
        &self,
        registration: NewRegistration,
    ) -> StoreResult<Registration> {
        // ---
        let mut state = self.state();

        let duplicate = state
            .registrations
            .values()
            .any(|r| r.user_id == registration.user_id && r.exam_id == registration.exam_id);
        if duplicate {
            return Err(StoreError::Conflict(
                "registrations_user_exam_key".to_string(),
            ));
        }

        let id = state.allocate_id();
        let stored = registration.into_registration(id);
        state.registrations.insert(id, stored.clone());

        Ok(stored)
    }

    async fn update_registration(
        &self,
        registration: &Registration,
        expected: RegistrationStatus,
    ) -> StoreResult<Option<Registration>> {
        // ---
        let mut state = self.state();
        let Some(stored) = state
            .registrations
            .get_mut(&registration.id)
            .filter(|stored| stored.status == expected)
        else {
            return Ok(None);
        };

        stored.registration_date = registration.registration_date;
        stored.status = registration.status;
        stored.score = registration.score;

        Ok(Some(stored.clone()))
    }
}

#[async_trait::async_trait]
impl HealthProbe for MemoryRepository {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
