//! Registration lifecycle: admission, re-activation and cancellation.
//!
//! A (user, exam) pair owns at most one registration row. Re-registering
//! after a cancellation flips the existing row back to REGISTERED instead of
//! inserting a second one; the store's uniqueness constraint backs this up
//! when two registrations for the same pair race.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{
    Clock, ClockPtr, Exam, ExamStore, ExamStorePtr, Identity, NewRegistration, Registration,
    RegistrationStatus, RegistrationStore, RegistrationStorePtr, ServiceError, ServiceResult,
    StoreError, UserStore, UserStorePtr, ValidationError,
};

/// Minimum notice, in hours, required to cancel before the exam starts.
pub const CANCELLATION_NOTICE_HOURS: i64 = 24;

/// Checks whether `exam` accepts registrations at `now`.
///
/// Rules apply in order: active flag, registration deadline, exam date.
/// Capacity is not part of admission.
pub fn check_admission(exam: &Exam, now: DateTime<Utc>) -> Result<(), ValidationError> {
    // ---
    if !exam.active {
        return Err(ValidationError::ExamInactive);
    }
    if let Some(deadline) = exam.registration_deadline {
        if now > deadline {
            return Err(ValidationError::DeadlinePassed);
        }
    }
    if exam.exam_date < now {
        return Err(ValidationError::ExamAlreadyOccurred);
    }
    Ok(())
}

/// Checks that an exam at `exam_date` is still far enough away to cancel.
/// Exactly [`CANCELLATION_NOTICE_HOURS`] of notice is accepted.
pub fn check_cancellation_window(
    exam_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    // ---
    if exam_date < now + Duration::hours(CANCELLATION_NOTICE_HOURS) {
        return Err(ValidationError::CancellationWindowClosed);
    }
    Ok(())
}

/// The owner of a registration, or any admin, may cancel it.
pub fn can_cancel(requester: &Identity, registration: &Registration) -> bool {
    registration.user_id == requester.user_id || requester.is_admin()
}

#[derive(Clone)]
pub struct RegistrationService {
    // ---
    users: UserStorePtr,
    exams: ExamStorePtr,
    registrations: RegistrationStorePtr,
    clock: ClockPtr,
}

impl RegistrationService {
    // ---
    pub fn new(
        users: UserStorePtr,
        exams: ExamStorePtr,
        registrations: RegistrationStorePtr,
        clock: ClockPtr,
    ) -> Self {
        // ---
        Self {
            users,
            exams,
            registrations,
            clock,
        }
    }

    /// Registers `user_id` for `exam_id`, or re-activates a cancelled
    /// registration for the same pair.
    pub async fn register(&self, user_id: i64, exam_id: i64) -> ServiceResult<Registration> {
        // ---
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or(ValidationError::UserNotFound(user_id))?;

        let exam = self
            .exams
            .find_exam(exam_id)
            .await?
            .ok_or(ValidationError::ExamNotFound(exam_id))?;

        let now = self.clock.now();
        check_admission(&exam, now)?;

        match self
            .registrations
            .find_registration_for(user.id, exam.id)
            .await?
        {
            None => {
                let draft = NewRegistration {
                    user_id: user.id,
                    exam_id: exam.id,
                    registration_date: now,
                    status: RegistrationStatus::Registered,
                };
                let registration = self
                    .registrations
                    .insert_registration(draft)
                    .await
                    .map_err(|err| match err {
                        // Lost a race with a concurrent registration for the same pair.
                        StoreError::Conflict(_) => {
                            ServiceError::from(ValidationError::AlreadyRegistered)
                        }
                        other => ServiceError::from(other),
                    })?;

                tracing::info!(
                    "User {} registered for exam {} (registration {})",
                    user.id,
                    exam.id,
                    registration.id
                );
                Ok(registration)
            }
            Some(mut existing) if existing.status == RegistrationStatus::Cancelled => {
                existing.status = RegistrationStatus::Registered;
                existing.registration_date = now;
                let registration = self
                    .registrations
                    .update_registration(&existing, RegistrationStatus::Cancelled)
                    .await?
                    .ok_or(ValidationError::AlreadyRegistered)?;

                tracing::info!(
                    "User {} re-activated registration {} for exam {}",
                    user.id,
                    registration.id,
                    exam.id
                );
                Ok(registration)
            }
            Some(existing) => {
                tracing::warn!(
                    "User {} already holds registration {} ({}) for exam {}",
                    user.id,
                    existing.id,
                    existing.status,
                    exam.id
                );
                Err(ValidationError::AlreadyRegistered.into())
            }
        }
    }

    /// Cancels a registration on behalf of its owner or an admin.
    pub async fn cancel(
        &self,
        registration_id: i64,
        requester: &Identity,
    ) -> ServiceResult<Registration> {
        // ---
        let mut registration = self
            .registrations
            .find_registration(registration_id)
            .await?
            .ok_or(ValidationError::RegistrationNotFound(registration_id))?;

        if !can_cancel(requester, &registration) {
            tracing::warn!(
                "User {} attempted to cancel registration {} owned by user {}",
                requester.user_id,
                registration.id,
                registration.user_id
            );
            return Err(ValidationError::NotAuthorized.into());
        }

        if registration.status == RegistrationStatus::Cancelled {
            return Err(ValidationError::AlreadyCancelled.into());
        }

        let exam = self
            .exams
            .find_exam(registration.exam_id)
            .await?
            .ok_or(ValidationError::ExamNotFound(registration.exam_id))?;
        check_cancellation_window(exam.exam_date, self.clock.now())?;

        let previous = registration.status;
        registration.status = RegistrationStatus::Cancelled;
        let registration = self
            .registrations
            .update_registration(&registration, previous)
            .await?
            .ok_or(ValidationError::AlreadyCancelled)?;

        tracing::info!(
            "Registration {} cancelled by user {}",
            registration.id,
            requester.user_id
        );
        Ok(registration)
    }

    /// Every registration of a user, whatever its status.
    pub async fn registrations_for_user(&self, user_id: i64) -> ServiceResult<Vec<Registration>> {
        // ---
        if self.users.find_user(user_id).await?.is_none() {
            return Err(ValidationError::UserNotFound(user_id).into());
        }
        Ok(self.registrations.list_registrations_by_user(user_id).await?)
    }

    pub async fn registrations_for_exam(&self, exam_id: i64) -> ServiceResult<Vec<Registration>> {
        // ---
        if !self.exams.exam_exists(exam_id).await? {
            return Err(ValidationError::ExamNotFound(exam_id).into());
        }
        Ok(self.registrations.list_registrations_by_exam(exam_id).await?)
    }

    pub async fn registration(&self, registration_id: i64) -> ServiceResult<Option<Registration>> {
        Ok(self.registrations.find_registration(registration_id).await?)
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::domain::{FixedClock, NewExam, NewUser, Role, StoreResult};
    use crate::infrastructure::MemoryRepository;
    use chrono::TimeZone;
    use std::sync::Arc;

    struct Fixture {
        repo: Arc<MemoryRepository>,
        clock: Arc<FixedClock>,
        service: RegistrationService,
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 5, 1, 9, 0, 0).unwrap()
    }

    fn fixture() -> Fixture {
        // ---
        let repo = Arc::new(MemoryRepository::new());
        let clock = Arc::new(FixedClock::new(start()));
        let service =
            RegistrationService::new(repo.clone(), repo.clone(), repo.clone(), clock.clone());
        Fixture {
            repo,
            clock,
            service,
        }
    }

    impl Fixture {
        async fn user(&self, name: &str, role: Role) -> Identity {
            // ---
            let user = self
                .repo
                .insert_user(NewUser {
                    username: name.to_string(),
                    password_hash: "hash".to_string(),
                    email: format!("{name}@example.com"),
                    role,
                })
                .await
                .unwrap();
            Identity::from(&user)
        }

        async fn exam(&self, exam_in: Duration, deadline_in: Option<Duration>, active: bool) -> Exam {
            // ---
            let now = start();
            self.repo
                .insert_exam(NewExam {
                    title: "Linear Algebra".to_string(),
                    description: None,
                    exam_date: now + exam_in,
                    duration_in_minutes: 120,
                    max_marks: 100,
                    passing_marks: 50,
                    active,
                    course_name: Some("MATH-201".to_string()),
                    created_by: Some("admin".to_string()),
                    max_capacity: 1,
                    name: "LA-final".to_string(),
                    registration_deadline: deadline_in.map(|d| now + d),
                })
                .await
                .unwrap()
        }
    }

    fn rejection(err: ServiceError) -> ValidationError {
        // ---
        match err {
            ServiceError::Validation(v) => v,
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn full_lifecycle_reuses_cancelled_row() {
        // ---
        let f = fixture();
        let student = f.user("ulla", Role::Student).await;
        let exam = f
            .exam(Duration::hours(48), Some(Duration::hours(24)), true)
            .await;

        let first = f.service.register(student.user_id, exam.id).await.unwrap();
        assert_eq!(first.status, RegistrationStatus::Registered);
        assert_eq!(first.registration_date, start());

        let again = f.service.register(student.user_id, exam.id).await.unwrap_err();
        assert_eq!(rejection(again), ValidationError::AlreadyRegistered);

        let cancelled = f.service.cancel(first.id, &student).await.unwrap();
        assert_eq!(cancelled.status, RegistrationStatus::Cancelled);

        f.clock.advance(Duration::hours(1));
        let revived = f.service.register(student.user_id, exam.id).await.unwrap();
        assert_eq!(revived.id, first.id);
        assert_eq!(revived.status, RegistrationStatus::Registered);
        assert_eq!(revived.registration_date, start() + Duration::hours(1));

        let rows = f.service.registrations_for_exam(exam.id).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn inactive_exam_rejected_before_other_checks() {
        // ---
        let f = fixture();
        let student = f.user("ivan", Role::Student).await;
        // Also past its deadline and date; inactivity must win.
        let exam = f
            .exam(-Duration::hours(5), Some(-Duration::hours(10)), false)
            .await;

        let err = f.service.register(student.user_id, exam.id).await.unwrap_err();
        assert_eq!(rejection(err), ValidationError::ExamInactive);
    }

    #[tokio::test]
    async fn deadline_passed_rejected() {
        // ---
        let f = fixture();
        let student = f.user("fran", Role::Student).await;
        let exam = f
            .exam(Duration::hours(48), Some(-Duration::hours(1)), true)
            .await;

        let err = f.service.register(student.user_id, exam.id).await.unwrap_err();
        assert_eq!(rejection(err), ValidationError::DeadlinePassed);
    }

    #[tokio::test]
    async fn past_exam_rejected() {
        // ---
        let f = fixture();
        let student = f.user("paul", Role::Student).await;
        let exam = f.exam(-Duration::minutes(1), None, true).await;

        let err = f.service.register(student.user_id, exam.id).await.unwrap_err();
        assert_eq!(rejection(err), ValidationError::ExamAlreadyOccurred);
    }

    #[tokio::test]
    async fn unknown_user_and_exam_rejected_in_order() {
        // ---
        let f = fixture();
        let student = f.user("olga", Role::Student).await;
        let exam = f.exam(Duration::hours(48), None, true).await;

        let err = f.service.register(999, 12345).await.unwrap_err();
        assert_eq!(rejection(err), ValidationError::UserNotFound(999));

        let err = f.service.register(student.user_id, 12345).await.unwrap_err();
        assert_eq!(rejection(err), ValidationError::ExamNotFound(12345));

        assert!(f.service.register(student.user_id, exam.id).await.is_ok());
    }

    #[tokio::test]
    async fn completed_and_missed_rows_block_reregistration() {
        // ---
        for status in [RegistrationStatus::Completed, RegistrationStatus::Missed] {
            let f = fixture();
            let student = f.user("gus", Role::Student).await;
            let exam = f.exam(Duration::hours(48), None, true).await;

            let mut row = f.service.register(student.user_id, exam.id).await.unwrap();
            row.status = status;
            f.repo
                .update_registration(&row, RegistrationStatus::Registered)
                .await
                .unwrap();

            let err = f.service.register(student.user_id, exam.id).await.unwrap_err();
            assert_eq!(rejection(err), ValidationError::AlreadyRegistered);
        }
    }

    #[tokio::test]
    async fn capacity_is_not_enforced() {
        // ---
        let f = fixture();
        let exam = f.exam(Duration::hours(48), None, true).await;
        assert_eq!(exam.max_capacity, 1);

        for name in ["a", "b", "c"] {
            let student = f.user(name, Role::Student).await;
            f.service.register(student.user_id, exam.id).await.unwrap();
        }
        assert_eq!(f.service.registrations_for_exam(exam.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn cancellation_window_boundaries() {
        // ---
        let f = fixture();
        let student = f.user("bea", Role::Student).await;

        let exactly = f.exam(Duration::hours(24), None, true).await;
        let row = f.service.register(student.user_id, exactly.id).await.unwrap();
        assert!(f.service.cancel(row.id, &student).await.is_ok());

        let close = f.exam(Duration::hours(10), None, true).await;
        let row = f.service.register(student.user_id, close.id).await.unwrap();
        let err = f.service.cancel(row.id, &student).await.unwrap_err();
        assert_eq!(rejection(err), ValidationError::CancellationWindowClosed);

        let just_short = f
            .exam(Duration::hours(24) - Duration::seconds(1), None, true)
            .await;
        let row = f.service.register(student.user_id, just_short.id).await.unwrap();
        let err = f.service.cancel(row.id, &student).await.unwrap_err();
        assert_eq!(rejection(err), ValidationError::CancellationWindowClosed);

        let roomy = f.exam(Duration::hours(25), None, true).await;
        let row = f.service.register(student.user_id, roomy.id).await.unwrap();
        assert!(f.service.cancel(row.id, &student).await.is_ok());
    }

    #[tokio::test]
    async fn cancel_twice_reports_already_cancelled() {
        // ---
        let f = fixture();
        let student = f.user("cal", Role::Student).await;
        let exam = f.exam(Duration::hours(72), None, true).await;
        let row = f.service.register(student.user_id, exam.id).await.unwrap();

        f.service.cancel(row.id, &student).await.unwrap();
        let err = f.service.cancel(row.id, &student).await.unwrap_err();
        assert_eq!(rejection(err), ValidationError::AlreadyCancelled);
    }

    #[tokio::test]
    async fn only_owner_or_admin_may_cancel() {
        // ---
        let f = fixture();
        let owner = f.user("owner", Role::Student).await;
        let stranger = f.user("stranger", Role::Student).await;
        let admin = f.user("root", Role::Admin).await;
        let exam = f.exam(Duration::hours(72), None, true).await;
        let row = f.service.register(owner.user_id, exam.id).await.unwrap();

        let err = f.service.cancel(row.id, &stranger).await.unwrap_err();
        assert_eq!(rejection(err), ValidationError::NotAuthorized);

        let cancelled = f.service.cancel(row.id, &admin).await.unwrap();
        assert_eq!(cancelled.status, RegistrationStatus::Cancelled);
        assert_eq!(cancelled.user_id, owner.user_id);
    }

    #[tokio::test]
    async fn cancel_unknown_registration() {
        // ---
        let f = fixture();
        let student = f.user("nel", Role::Student).await;

        let err = f.service.cancel(77, &student).await.unwrap_err();
        assert_eq!(rejection(err), ValidationError::RegistrationNotFound(77));
    }

    #[tokio::test]
    async fn listings_require_existing_owner() {
        // ---
        let f = fixture();
        let student = f.user("lis", Role::Student).await;
        let exam = f.exam(Duration::hours(72), None, true).await;

        assert!(f
            .service
            .registrations_for_user(student.user_id)
            .await
            .unwrap()
            .is_empty());

        let row = f.service.register(student.user_id, exam.id).await.unwrap();
        f.service.cancel(row.id, &student).await.unwrap();

        // Cancelled rows still show up.
        let mine = f.service.registrations_for_user(student.user_id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].status, RegistrationStatus::Cancelled);

        let err = f.service.registrations_for_user(4040).await.unwrap_err();
        assert_eq!(rejection(err), ValidationError::UserNotFound(4040));

        let err = f.service.registrations_for_exam(4040).await.unwrap_err();
        assert_eq!(rejection(err), ValidationError::ExamNotFound(4040));

        assert!(f.service.registration(4040).await.unwrap().is_none());
        assert_eq!(f.service.registration(row.id).await.unwrap().unwrap().id, row.id);
    }

    /// Serves a fixed view of one registration to lookups, as if another
    /// request changed the row between this request's read and its write.
    struct StaleView {
        inner: Arc<MemoryRepository>,
        seen: Option<Registration>,
    }

    fn stale_service(f: &Fixture, seen: Option<Registration>) -> RegistrationService {
        // ---
        let view = StaleView {
            inner: f.repo.clone(),
            seen,
        };
        RegistrationService::new(f.repo.clone(), f.repo.clone(), Arc::new(view), f.clock.clone())
    }

    #[async_trait::async_trait]
    impl RegistrationStore for StaleView {
        // ---
        async fn find_registration(&self, _id: i64) -> StoreResult<Option<Registration>> {
            Ok(self.seen.clone())
        }

        async fn list_registrations_by_user(&self, user_id: i64) -> StoreResult<Vec<Registration>> {
            self.inner.list_registrations_by_user(user_id).await
        }

        async fn list_registrations_by_exam(&self, exam_id: i64) -> StoreResult<Vec<Registration>> {
            self.inner.list_registrations_by_exam(exam_id).await
        }

        async fn find_registration_for(
            &self,
            _user_id: i64,
            _exam_id: i64,
        ) -> StoreResult<Option<Registration>> {
            Ok(self.seen.clone())
        }

        async fn insert_registration(
            &self,
            registration: NewRegistration,
        ) -> StoreResult<Registration> {
            self.inner.insert_registration(registration).await
        }

        async fn update_registration(
            &self,
            registration: &Registration,
            expected: RegistrationStatus,
        ) -> StoreResult<Option<Registration>> {
            self.inner.update_registration(registration, expected).await
        }
    }

    #[tokio::test]
    async fn insert_conflict_reported_as_already_registered() {
        // ---
        let f = fixture();
        let student = f.user("race", Role::Student).await;
        let exam = f.exam(Duration::hours(72), None, true).await;

        // The lookup misses the row the first call inserts.
        let blind = stale_service(&f, None);
        let first = blind.register(student.user_id, exam.id).await.unwrap();
        let err = blind.register(student.user_id, exam.id).await.unwrap_err();
        assert_eq!(rejection(err), ValidationError::AlreadyRegistered);

        let rows = f.service.registrations_for_exam(exam.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, first.id);
    }

    #[tokio::test]
    async fn concurrent_cancel_reports_already_cancelled() {
        // ---
        let f = fixture();
        let student = f.user("twin", Role::Student).await;
        let exam = f.exam(Duration::hours(72), None, true).await;
        let row = f.service.register(student.user_id, exam.id).await.unwrap();

        let late = stale_service(&f, Some(row.clone()));
        f.service.cancel(row.id, &student).await.unwrap();

        let err = late.cancel(row.id, &student).await.unwrap_err();
        assert_eq!(rejection(err), ValidationError::AlreadyCancelled);
    }

    #[tokio::test]
    async fn concurrent_reactivation_reports_already_registered() {
        // ---
        let f = fixture();
        let student = f.user("echo", Role::Student).await;
        let exam = f.exam(Duration::hours(72), None, true).await;
        let row = f.service.register(student.user_id, exam.id).await.unwrap();
        let cancelled = f.service.cancel(row.id, &student).await.unwrap();

        let late = stale_service(&f, Some(cancelled));
        f.service.register(student.user_id, exam.id).await.unwrap();

        let err = late.register(student.user_id, exam.id).await.unwrap_err();
        assert_eq!(rejection(err), ValidationError::AlreadyRegistered);

        let current = f.service.registration(row.id).await.unwrap().unwrap();
        assert_eq!(current.status, RegistrationStatus::Registered);
    }

    #[test]
    fn admission_rules_are_ordered() {
        // ---
        let now = start();
        let mut exam = NewExam {
            title: "t".to_string(),
            description: None,
            exam_date: now - Duration::hours(1),
            duration_in_minutes: 60,
            max_marks: 10,
            passing_marks: 5,
            active: true,
            course_name: None,
            created_by: None,
            max_capacity: 1,
            name: "n".to_string(),
            registration_deadline: Some(now - Duration::hours(2)),
        }
        .into_exam(1);

        assert_eq!(check_admission(&exam, now), Err(ValidationError::DeadlinePassed));

        exam.registration_deadline = None;
        assert_eq!(
            check_admission(&exam, now),
            Err(ValidationError::ExamAlreadyOccurred)
        );

        exam.exam_date = now;
        assert_eq!(check_admission(&exam, now), Ok(()));

        // Deadline equal to now is still open.
        exam.registration_deadline = Some(now);
        assert_eq!(check_admission(&exam, now), Ok(()));
    }
}
