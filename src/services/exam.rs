use crate::domain::{
    Clock, ClockPtr, Exam, ExamStore, ExamStorePtr, Identity, NewExam, ServiceResult,
    ValidationError,
};

/// Longest description, in characters, the `exams.description` column holds.
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

fn check_description(exam: &NewExam) -> Result<(), ValidationError> {
    // ---
    match exam.description.as_deref() {
        Some(text) if text.chars().count() > MAX_DESCRIPTION_CHARS => {
            Err(ValidationError::InvalidInput(format!(
                "Description must be at most {MAX_DESCRIPTION_CHARS} characters."
            )))
        }
        _ => Ok(()),
    }
}

#[derive(Clone)]
pub struct ExamService {
    // ---
    exams: ExamStorePtr,
    clock: ClockPtr,
}

impl ExamService {
    // ---
    pub fn new(exams: ExamStorePtr, clock: ClockPtr) -> Self {
        Self { exams, clock }
    }

    /// Creates an exam. `createdBy` falls back to the creating admin.
    pub async fn create(&self, mut draft: NewExam, creator: &Identity) -> ServiceResult<Exam> {
        // ---
        if draft.exam_date < self.clock.now() {
            return Err(ValidationError::PastExamDate.into());
        }
        check_description(&draft)?;
        if draft.created_by.as_deref().map_or(true, |s| s.trim().is_empty()) {
            draft.created_by = Some(creator.username.clone());
        }

        let exam = self.exams.insert_exam(draft).await?;
        tracing::info!("Exam {} '{}' created by {}", exam.id, exam.title, creator.username);
        Ok(exam)
    }

    /// Replaces the editable fields of an existing exam.
    pub async fn update(&self, exam_id: i64, update: NewExam) -> ServiceResult<Exam> {
        // ---
        let mut exam = self
            .exams
            .find_exam(exam_id)
            .await?
            .ok_or(ValidationError::ExamNotFound(exam_id))?;

        if update.exam_date < self.clock.now() {
            return Err(ValidationError::PastExamDate.into());
        }
        check_description(&update)?;

        exam.apply_update(update);
        let exam = self.exams.update_exam(&exam).await?;
        tracing::info!("Exam {} updated", exam.id);
        Ok(exam)
    }

    /// Deletes an exam together with its registrations.
    pub async fn delete(&self, exam_id: i64) -> ServiceResult<()> {
        // ---
        if !self.exams.delete_exam(exam_id).await? {
            return Err(ValidationError::ExamNotFound(exam_id).into());
        }
        tracing::info!("Exam {} deleted", exam_id);
        Ok(())
    }

    pub async fn exam(&self, exam_id: i64) -> ServiceResult<Option<Exam>> {
        Ok(self.exams.find_exam(exam_id).await?)
    }

    pub async fn all_exams(&self) -> ServiceResult<Vec<Exam>> {
        Ok(self.exams.list_exams().await?)
    }

    /// Active exams still ahead of now, soonest first.
    pub async fn upcoming_exams(&self) -> ServiceResult<Vec<Exam>> {
        // ---
        let now = self.clock.now();
        let mut exams = self.exams.list_active_exams_by_date().await?;
        exams.retain(|exam| exam.exam_date > now);
        Ok(exams)
    }

    pub async fn exams_by_course(&self, course_name: &str) -> ServiceResult<Vec<Exam>> {
        Ok(self.exams.list_exams_by_course(course_name).await?)
    }
}
