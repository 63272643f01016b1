// tests/attempt_flow_tests.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use quiz_backend::{
    error::QuizError,
    models::{
        attempt::{AnswerRecord, AttemptState, QuizAttempt},
        caller::Caller,
        id::{OptionId, QuestionId, QuizId, SectionId, StudentId, SubjectId, TeacherId},
        question::{CreateOptionRequest, CreateQuestionRequest, Question, QuestionType},
        quiz::{CreateQuizRequest, Quiz},
    },
    services::{answers, attempts, catalog, scoring},
    store::{MemoryQuizStore, QuizStore},
};

/// A quiz open during [t0, t1] with two questions worth 5 and 10 marks.
/// `o1` and `o3` are the correct options.
struct Fixture {
    store: Arc<MemoryQuizStore>,
    teacher: Caller,
    student: Caller,
    section: SectionId,
    quiz: Quiz,
    q1: Question,
    q2: Question,
    o1: OptionId,
    o2: OptionId,
    o3: OptionId,
    o4: OptionId,
    t0: DateTime<Utc>,
    t1: DateTime<Utc>,
}

impl Fixture {
    async fn start(&self, at: DateTime<Utc>) -> QuizAttempt {
        attempts::start_attempt(self.store.as_ref(), self.quiz.id, &self.student, at)
            .await
            .expect("attempt should start")
    }

    async fn answer(
        &self,
        attempt: &QuizAttempt,
        question_id: QuestionId,
        option_id: Option<OptionId>,
        at: DateTime<Utc>,
    ) -> Result<AnswerRecord, QuizError> {
        answers::record_answer(
            self.store.as_ref(),
            attempt.id,
            question_id,
            option_id,
            &self.student,
            at,
        )
        .await
    }

    async fn submit(&self, at: DateTime<Utc>) -> Result<QuizAttempt, QuizError> {
        attempts::submit_attempt(self.store.as_ref(), self.quiz.id, &self.student, at).await
    }
}

fn quiz_request(section: SectionId, t0: DateTime<Utc>, t1: DateTime<Utc>) -> CreateQuizRequest {
    CreateQuizRequest {
        title: "Unit 3 check".to_string(),
        description: "Fractions and ratios".to_string(),
        subject_id: SubjectId::generate(),
        sections: vec![section],
        total_marks: 15,
        time_limit_minutes: 30,
        instructions: "Answer every question".to_string(),
        due_date: None,
        start_time: t0,
        end_time: t1,
        is_proctored: false,
    }
}

fn question_request(text: &str, marks: i32, position: i32) -> CreateQuestionRequest {
    CreateQuestionRequest {
        text: text.to_string(),
        question_type: QuestionType::MultipleChoice,
        image_url: None,
        marks,
        position,
    }
}

async fn add_option(
    store: &dyn QuizStore,
    question: &Question,
    teacher: &Caller,
    text: &str,
    is_correct: bool,
) -> OptionId {
    catalog::add_option(
        store,
        question.id,
        teacher,
        CreateOptionRequest {
            text: text.to_string(),
            is_correct,
        },
    )
    .await
    .expect("option should be created")
    .id
}

async fn seed() -> Fixture {
    let store = Arc::new(MemoryQuizStore::new());
    let section = SectionId::generate();
    let teacher = Caller::teacher(TeacherId::generate());
    let student = Caller::student(StudentId::generate(), Some(section));

    let t0 = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
    let t1 = t0 + Duration::hours(1);
    let authored = t0 - Duration::days(1);

    let quiz = catalog::create_quiz(
        store.as_ref(),
        &teacher,
        quiz_request(section, t0, t1),
        authored,
    )
    .await
    .expect("quiz should be created");

    let q1 = catalog::add_question(
        store.as_ref(),
        quiz.id,
        &teacher,
        question_request("1/2 + 1/4?", 5, 1),
        authored,
    )
    .await
    .expect("question should be created");
    let o1 = add_option(store.as_ref(), &q1, &teacher, "3/4", true).await;
    let o2 = add_option(store.as_ref(), &q1, &teacher, "2/6", false).await;

    let q2 = catalog::add_question(
        store.as_ref(),
        quiz.id,
        &teacher,
        question_request("Simplify 6:8", 10, 2),
        authored,
    )
    .await
    .expect("question should be created");
    let o3 = add_option(store.as_ref(), &q2, &teacher, "3:4", true).await;
    let o4 = add_option(store.as_ref(), &q2, &teacher, "4:3", false).await;

    Fixture {
        store,
        teacher,
        student,
        section,
        quiz,
        q1,
        q2,
        o1,
        o2,
        o3,
        o4,
        t0,
        t1,
    }
}

#[tokio::test]
async fn correct_then_wrong_answer_scores_first_question_only() {
    let f = seed().await;
    let at = f.t0 + Duration::minutes(1);

    let attempt = f.start(at).await;
    assert_eq!(attempt.started_at, at);
    assert!(!attempt.is_completed);
    assert_eq!(attempt.marks_obtained, 0);

    let a1 = f.answer(&attempt, f.q1.id, Some(f.o1), at).await.unwrap();
    assert_eq!(a1.marks_awarded, 5);

    let a2 = f.answer(&attempt, f.q2.id, Some(f.o4), at).await.unwrap();
    assert_eq!(a2.marks_awarded, 0);

    let done = f.submit(at + Duration::minutes(5)).await.unwrap();
    assert!(done.is_completed);
    assert_eq!(done.marks_obtained, 5);
    assert_eq!(done.ended_at, Some(at + Duration::minutes(5)));
}

#[tokio::test]
async fn start_outside_window_is_rejected() {
    let f = seed().await;
    let store = f.store.as_ref();

    let late_at = f.t1 + Duration::minutes(1);
    let late = attempts::start_attempt(store, f.quiz.id, &f.student, late_at).await;
    assert!(matches!(late, Err(QuizError::QuizNotActive)));

    let early_at = f.t0 - Duration::minutes(1);
    let early = attempts::start_attempt(store, f.quiz.id, &f.student, early_at).await;
    assert!(matches!(early, Err(QuizError::QuizNotActive)));
}

#[tokio::test]
async fn teacher_cannot_start_or_submit() {
    let f = seed().await;
    let at = f.t0 + Duration::minutes(1);

    let start = attempts::start_attempt(f.store.as_ref(), f.quiz.id, &f.teacher, at).await;
    assert!(matches!(start, Err(QuizError::Forbidden(_))));

    let submit = attempts::submit_attempt(f.store.as_ref(), f.quiz.id, &f.teacher, at).await;
    assert!(matches!(submit, Err(QuizError::Forbidden(_))));
}

#[tokio::test]
async fn unknown_quiz_and_other_section_are_not_found() {
    let f = seed().await;
    let store = f.store.as_ref();
    let at = f.t0 + Duration::minutes(1);

    let missing = attempts::start_attempt(store, QuizId::generate(), &f.student, at).await;
    assert!(matches!(missing, Err(QuizError::NotFound(_))));

    let outsider = Caller::student(StudentId::generate(), Some(SectionId::generate()));
    let hidden = attempts::start_attempt(store, f.quiz.id, &outsider, at).await;
    assert!(matches!(hidden, Err(QuizError::NotFound(_))));
}

#[tokio::test]
async fn second_start_reports_existing_attempt() {
    let f = seed().await;
    let store = f.store.as_ref();
    let at = f.t0 + Duration::minutes(1);

    f.start(at).await;
    let again = attempts::start_attempt(store, f.quiz.id, &f.student, at).await;
    assert!(matches!(again, Err(QuizError::AttemptAlreadyExists)));

    // Still refused once the first attempt is submitted.
    f.submit(at).await.unwrap();
    let after_submit = attempts::start_attempt(store, f.quiz.id, &f.student, at).await;
    assert!(matches!(after_submit, Err(QuizError::AttemptAlreadyExists)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_create_exactly_one_attempt() {
    let f = seed().await;
    let at = f.t0 + Duration::minutes(1);
    let n = 16;

    let mut handles = Vec::new();
    for _ in 0..n {
        let store = f.store.clone();
        let quiz_id = f.quiz.id;
        let student = f.student;
        handles.push(tokio::spawn(async move {
            attempts::start_attempt(store.as_ref(), quiz_id, &student, at).await
        }));
    }

    let mut created = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(QuizError::AttemptAlreadyExists) => rejected += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(rejected, n - 1);
    let Caller::Student(student) = f.student else {
        unreachable!()
    };
    let stored = f.store.list_attempts_by_student(student.id).await.unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn re_answering_replaces_the_previous_answer() {
    let f = seed().await;
    let at = f.t0 + Duration::minutes(1);
    let attempt = f.start(at).await;

    let first = f.answer(&attempt, f.q1.id, Some(f.o1), at).await.unwrap();
    let later = at + Duration::seconds(30);
    let second = f.answer(&attempt, f.q1.id, Some(f.o2), later).await.unwrap();

    assert_eq!(second.id, first.id);
    let recorded = f.store.list_answers(attempt.id).await.unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].selected_option_id, Some(f.o2));
    assert_eq!(recorded[0].marks_awarded, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_answers_to_one_question_leave_the_last_write() {
    let f = seed().await;
    let at = f.t0 + Duration::minutes(1);
    let attempt = f.start(at).await;
    let choices = [Some(f.o1), Some(f.o2), None];

    // Each write gets a distinct timestamp so the stored record names its writer.
    let mut handles = Vec::new();
    for i in 0..12 {
        let store = f.store.clone();
        let student = f.student;
        let attempt_id = attempt.id;
        let question_id = f.q1.id;
        let selected = choices[i % choices.len()];
        let answered_at = at + Duration::seconds(i as i64);
        handles.push(tokio::spawn(async move {
            answers::record_answer(
                store.as_ref(),
                attempt_id,
                question_id,
                selected,
                &student,
                answered_at,
            )
            .await
        }));
    }

    let mut written = Vec::new();
    for handle in handles {
        written.push(handle.await.unwrap().expect("answer should be recorded"));
    }

    let recorded = f.store.list_answers(attempt.id).await.unwrap();
    assert_eq!(recorded.len(), 1);
    let survivor = &recorded[0];

    assert!(written.iter().all(|w| w.id == survivor.id));
    let writer = written
        .iter()
        .find(|w| w.answered_at == survivor.answered_at)
        .expect("stored answer should come from one of the writers");
    assert_eq!(writer.selected_option_id, survivor.selected_option_id);
    assert_eq!(
        survivor.marks_awarded,
        answers::grade(&f.q1, survivor.selected_option_id)
    );
}

#[tokio::test]
async fn blank_answer_earns_nothing() {
    let f = seed().await;
    let at = f.t0 + Duration::minutes(1);
    let attempt = f.start(at).await;

    let blank = f.answer(&attempt, f.q2.id, None, at).await.unwrap();
    assert_eq!(blank.selected_option_id, None);
    assert_eq!(blank.marks_awarded, 0);
}

#[tokio::test]
async fn answers_do_not_touch_attempt_score_until_submission() {
    let f = seed().await;
    let at = f.t0 + Duration::minutes(1);
    let attempt = f.start(at).await;

    f.answer(&attempt, f.q2.id, Some(f.o3), at).await.unwrap();

    let in_progress = attempts::get_attempt(f.store.as_ref(), attempt.id, &f.student)
        .await
        .unwrap();
    assert_eq!(in_progress.state, AttemptState::InProgress);
    assert_eq!(in_progress.attempt.marks_obtained, 0);
    assert_eq!(in_progress.answers.len(), 1);
    assert_eq!(in_progress.duration_seconds, None);
}

#[tokio::test]
async fn score_is_sum_of_answers_in_any_order() {
    let f = seed().await;
    let at = f.t0 + Duration::minutes(1);
    let attempt = f.start(at).await;

    f.answer(&attempt, f.q2.id, Some(f.o3), at).await.unwrap();
    f.answer(&attempt, f.q1.id, Some(f.o1), at).await.unwrap();

    let done = f.submit(at).await.unwrap();
    assert_eq!(done.marks_obtained, 15);

    let recorded = f.store.list_answers(attempt.id).await.unwrap();
    assert_eq!(done.marks_obtained, scoring::compute_score(&recorded));
}

#[tokio::test]
async fn completed_attempt_is_frozen() {
    let f = seed().await;
    let at = f.t0 + Duration::minutes(1);
    let attempt = f.start(at).await;
    f.answer(&attempt, f.q1.id, Some(f.o1), at).await.unwrap();

    let done = f.submit(at).await.unwrap();
    assert_eq!(done.marks_obtained, 5);

    let late_answer = f.answer(&attempt, f.q2.id, Some(f.o3), at).await;
    assert!(matches!(late_answer, Err(QuizError::AttemptCompleted)));

    let resubmit = f.submit(at).await;
    assert!(matches!(resubmit, Err(QuizError::AlreadyCompleted)));

    let view = attempts::get_attempt(f.store.as_ref(), attempt.id, &f.student)
        .await
        .unwrap();
    assert_eq!(view.state, AttemptState::Completed);
    assert_eq!(view.attempt.marks_obtained, 5);
    assert_eq!(view.answers.len(), 1);
}

#[tokio::test]
async fn completed_attempt_reports_completion_before_bad_payload() {
    let f = seed().await;
    let at = f.t0 + Duration::minutes(1);
    let attempt = f.start(at).await;
    f.submit(at).await.unwrap();

    // Option of q2 offered for q1, on an attempt that is already over.
    let wrong_option = f.answer(&attempt, f.q1.id, Some(f.o3), at).await;
    assert!(matches!(wrong_option, Err(QuizError::AttemptCompleted)));

    let unknown_question = f.answer(&attempt, QuestionId::generate(), None, at).await;
    assert!(matches!(unknown_question, Err(QuizError::AttemptCompleted)));
}

#[tokio::test]
async fn attempt_started_in_window_can_finish_after_it_closes() {
    let f = seed().await;
    let attempt = f.start(f.t1).await;
    let after = f.t1 + Duration::minutes(10);

    f.answer(&attempt, f.q2.id, Some(f.o3), after).await.unwrap();
    let done = f.submit(after).await.unwrap();

    assert_eq!(done.marks_obtained, 10);
    assert_eq!(done.duration_seconds(), Some(600));
}

#[tokio::test]
async fn submit_without_attempt_is_not_found() {
    let f = seed().await;
    let result = f.submit(f.t0).await;
    assert!(matches!(result, Err(QuizError::NotFound(_))));
}

#[tokio::test]
async fn other_students_cannot_touch_an_attempt() {
    let f = seed().await;
    let store = f.store.as_ref();
    let at = f.t0 + Duration::minutes(1);
    let attempt = f.start(at).await;
    let classmate = Caller::student(StudentId::generate(), Some(f.section));

    let answer =
        answers::record_answer(store, attempt.id, f.q1.id, Some(f.o1), &classmate, at).await;
    assert!(matches!(answer, Err(QuizError::Forbidden(_))));

    let read = attempts::get_attempt(store, attempt.id, &classmate).await;
    assert!(matches!(read, Err(QuizError::Forbidden(_))));

    let teacher_answer =
        answers::record_answer(store, attempt.id, f.q1.id, Some(f.o1), &f.teacher, at).await;
    assert!(matches!(teacher_answer, Err(QuizError::Forbidden(_))));
}

#[tokio::test]
async fn mismatched_question_or_option_is_not_found() {
    let f = seed().await;
    let store = f.store.as_ref();
    let at = f.t0 + Duration::minutes(1);
    let attempt = f.start(at).await;

    // Option of q2 offered as an answer to q1.
    let wrong_option = f.answer(&attempt, f.q1.id, Some(f.o3), at).await;
    assert!(matches!(wrong_option, Err(QuizError::NotFound(_))));

    let unknown_option = f
        .answer(&attempt, f.q1.id, Some(OptionId::generate()), at)
        .await;
    assert!(matches!(unknown_option, Err(QuizError::NotFound(_))));

    // Question from a different quiz.
    let other_quiz = catalog::create_quiz(
        store,
        &f.teacher,
        quiz_request(f.section, f.t0, f.t1),
        f.t0,
    )
    .await
    .unwrap();
    let foreign = catalog::add_question(
        store,
        other_quiz.id,
        &f.teacher,
        question_request("Elsewhere", 1, 0),
        f.t0,
    )
    .await
    .unwrap();
    let foreign_answer = f.answer(&attempt, foreign.id, None, at).await;
    assert!(matches!(foreign_answer, Err(QuizError::NotFound(_))));

    assert!(store.list_answers(attempt.id).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn answers_racing_submission_are_counted_or_rejected() {
    let f = seed().await;
    let at = f.t0 + Duration::minutes(1);
    let attempt = f.start(at).await;

    let mut handles = Vec::new();
    for (question_id, option_id) in [(f.q1.id, f.o1), (f.q2.id, f.o3)] {
        let store = f.store.clone();
        let student = f.student;
        let attempt_id = attempt.id;
        handles.push(tokio::spawn(async move {
            answers::record_answer(
                store.as_ref(),
                attempt_id,
                question_id,
                Some(option_id),
                &student,
                at,
            )
            .await
        }));
    }
    let submit = {
        let store = f.store.clone();
        let student = f.student;
        let quiz_id = f.quiz.id;
        tokio::spawn(async move {
            attempts::submit_attempt(store.as_ref(), quiz_id, &student, at).await
        })
    };

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(record) => accepted += i64::from(record.marks_awarded),
            Err(QuizError::AttemptCompleted) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    let done = submit.await.unwrap().unwrap();

    let recorded = f.store.list_answers(attempt.id).await.unwrap();
    assert_eq!(done.marks_obtained, scoring::compute_score(&recorded));
    assert_eq!(done.marks_obtained, accepted);
}

#[tokio::test]
async fn students_never_see_the_correct_option() {
    let f = seed().await;
    let store = f.store.as_ref();
    let at = f.t0 + Duration::minutes(1);

    let as_student = catalog::get_quiz(store, f.quiz.id, &f.student, at).await.unwrap();
    assert!(as_student.is_active);
    assert_eq!(as_student.questions.len(), 2);
    assert_eq!(as_student.questions[0].id, f.q1.id);
    assert_eq!(as_student.questions[0].options.len(), 2);
    assert!(
        as_student
            .questions
            .iter()
            .all(|q| q.correct_option.is_none())
    );

    let as_owner = catalog::get_quiz(store, f.quiz.id, &f.teacher, at).await.unwrap();
    assert_eq!(as_owner.questions[0].correct_option, Some(f.o1));
    assert_eq!(as_owner.questions[1].correct_option, Some(f.o3));
}

#[tokio::test]
async fn quiz_lists_follow_role_and_section() {
    let f = seed().await;
    let store = f.store.as_ref();
    let at = f.t0 - Duration::minutes(5);

    let mine = catalog::list_quizzes(store, &f.teacher, at).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert!(!mine[0].is_active);

    let enrolled = catalog::list_quizzes(store, &f.student, at).await.unwrap();
    assert_eq!(enrolled.len(), 1);

    let elsewhere = Caller::student(StudentId::generate(), Some(SectionId::generate()));
    let hidden = catalog::list_quizzes(store, &elsewhere, at).await.unwrap();
    assert!(hidden.is_empty());

    let other_teacher = Caller::teacher(TeacherId::generate());
    let foreign = catalog::list_quizzes(store, &other_teacher, at).await.unwrap();
    assert!(foreign.is_empty());
}

#[tokio::test]
async fn authoring_is_limited_to_the_owning_teacher() {
    let f = seed().await;
    let store = f.store.as_ref();
    let intruder = Caller::teacher(TeacherId::generate());

    let question = catalog::add_question(
        store,
        f.quiz.id,
        &intruder,
        question_request("Sneaky", 1, 3),
        f.t0,
    )
    .await;
    assert!(matches!(question, Err(QuizError::Forbidden(_))));

    let by_student = catalog::create_quiz(
        store,
        &f.student,
        quiz_request(f.section, f.t0, f.t1),
        f.t0,
    )
    .await;
    assert!(matches!(by_student, Err(QuizError::Forbidden(_))));

    let foreign_option = catalog::set_correct_option(store, f.q1.id, f.o3, &f.teacher).await;
    assert!(matches!(foreign_option, Err(QuizError::Invalid(_))));

    let switched = catalog::set_correct_option(store, f.q1.id, f.o2, &f.teacher)
        .await
        .unwrap();
    assert_eq!(switched.correct_option, Some(f.o2));
}

#[tokio::test]
async fn quiz_window_must_be_ordered() {
    let f = seed().await;
    let store = f.store.as_ref();

    let backwards = quiz_request(f.section, f.t1, f.t0);
    let result = catalog::create_quiz(store, &f.teacher, backwards, f.t0).await;
    assert!(matches!(result, Err(QuizError::Invalid(_))));

    let empty = quiz_request(f.section, f.t0, f.t0);
    let result = catalog::create_quiz(store, &f.teacher, empty, f.t0).await;
    assert!(matches!(result, Err(QuizError::Invalid(_))));
}

#[tokio::test]
async fn owning_teacher_reviews_submissions() {
    let f = seed().await;
    let store = f.store.as_ref();
    let at = f.t0 + Duration::minutes(1);
    let attempt = f.start(at).await;
    f.submit(at).await.unwrap();

    let submissions = attempts::list_quiz_attempts(store, f.quiz.id, &f.teacher)
        .await
        .unwrap();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].id, attempt.id);

    let view = attempts::get_attempt(store, attempt.id, &f.teacher)
        .await
        .unwrap();
    assert_eq!(view.state, AttemptState::Completed);

    let stranger = Caller::teacher(TeacherId::generate());
    assert!(matches!(
        attempts::list_quiz_attempts(store, f.quiz.id, &stranger).await,
        Err(QuizError::Forbidden(_))
    ));
    assert!(matches!(
        attempts::get_attempt(store, attempt.id, &stranger).await,
        Err(QuizError::Forbidden(_))
    ));
    assert!(matches!(
        attempts::list_quiz_attempts(store, f.quiz.id, &f.student).await,
        Err(QuizError::Forbidden(_))
    ));

    let mine = attempts::list_my_attempts(store, &f.student).await.unwrap();
    assert_eq!(mine.len(), 1);
    let own = attempts::get_attempt_for_quiz(store, f.quiz.id, &f.student)
        .await
        .unwrap();
    assert_eq!(own.attempt.id, attempt.id);
}
