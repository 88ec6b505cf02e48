//! Integration tests for Enrollment repository using in-memory SurrealDB.

use chrono::{Duration, TimeZone, Utc};
use doccon_core::error::DocconError;
use doccon_core::models::enrollment::{
    CreateEnrollment, EnrollmentFilter, EnrollmentStatus, EnrollmentTransition,
};
use doccon_core::models::specialty::Specialty;
use doccon_core::repository::{EnrollmentRepository, Pagination};
use doccon_db::repository::SurrealEnrollmentRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> SurrealEnrollmentRepository<Db> {
    let db: Surreal<Db> = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    doccon_db::run_migrations(&db).await.unwrap();
    SurrealEnrollmentRepository::new(db)
}

fn request(doctor_id: Uuid, hospital_id: Uuid, start_day: u32, end_day: u32) -> CreateEnrollment {
    CreateEnrollment {
        doctor_id,
        hospital_id,
        start_date: Utc.with_ymd_and_hms(2024, 1, start_day, 0, 0, 0).unwrap(),
        end_date: Utc.with_ymd_and_hms(2024, 1, end_day, 0, 0, 0).unwrap(),
        weekly_hours: 20,
        department: Specialty::Cardiology,
        notes: Some("evenings only".into()),
        status: EnrollmentStatus::Pending,
    }
}

#[tokio::test]
async fn create_and_get_enrollment() {
    let repo = setup().await;
    let (doctor, hospital) = (Uuid::new_v4(), Uuid::new_v4());

    let created = repo.create(request(doctor, hospital, 1, 15)).await.unwrap();
    assert_eq!(created.status, EnrollmentStatus::Pending);
    assert_eq!(created.total_hours_completed, 0);
    assert!(!created.certificate_generated);

    let fetched = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched.doctor_id, doctor);
    assert_eq!(fetched.hospital_id, hospital);
    assert_eq!(fetched.department, Specialty::Cardiology);
    assert_eq!(fetched.duration_days(), 14);
}

#[tokio::test]
async fn overlap_only_counts_open_enrollments_at_same_hospital() {
    let repo = setup().await;
    let (doctor, hospital) = (Uuid::new_v4(), Uuid::new_v4());
    let existing = repo.create(request(doctor, hospital, 1, 15)).await.unwrap();

    let start = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
    let end = start + Duration::days(5);

    let hit = repo
        .find_overlapping(doctor, hospital, start, end)
        .await
        .unwrap();
    assert_eq!(hit.map(|e| e.id), Some(existing.id));

    let elsewhere = repo
        .find_overlapping(doctor, Uuid::new_v4(), start, end)
        .await
        .unwrap();
    assert!(elsewhere.is_none());

    repo.transition(
        existing.id,
        EnrollmentStatus::Pending,
        EnrollmentTransition::to(EnrollmentStatus::Cancelled),
    )
    .await
    .unwrap();
    let after_cancel = repo
        .find_overlapping(doctor, hospital, start, end)
        .await
        .unwrap();
    assert!(after_cancel.is_none());
}

#[tokio::test]
async fn transition_is_guarded_by_current_status() {
    let repo = setup().await;
    let created = repo
        .create(request(Uuid::new_v4(), Uuid::new_v4(), 1, 15))
        .await
        .unwrap();

    let mut reject = EnrollmentTransition::to(EnrollmentStatus::Rejected);
    reject.admin_notes = Some("department full".into());
    let rejected = repo
        .transition(created.id, EnrollmentStatus::Pending, reject)
        .await
        .unwrap();
    assert_eq!(rejected.status, EnrollmentStatus::Rejected);
    assert_eq!(rejected.admin_notes.as_deref(), Some("department full"));

    let err = repo
        .transition(
            created.id,
            EnrollmentStatus::Pending,
            EnrollmentTransition::to(EnrollmentStatus::Approved),
        )
        .await
        .unwrap_err();
    match err {
        DocconError::InvalidTransition { status, action } => {
            assert_eq!(status, "rejected");
            assert_eq!(action, "approve");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = repo
        .transition(
            Uuid::new_v4(),
            EnrollmentStatus::Pending,
            EnrollmentTransition::to(EnrollmentStatus::Approved),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DocconError::NotFound { .. }));
}

#[tokio::test]
async fn completion_records_hours_and_date() {
    let repo = setup().await;
    let created = repo
        .create(request(Uuid::new_v4(), Uuid::new_v4(), 1, 15))
        .await
        .unwrap();
    repo.transition(
        created.id,
        EnrollmentStatus::Pending,
        EnrollmentTransition::to(EnrollmentStatus::Approved),
    )
    .await
    .unwrap();

    let now = Utc::now();
    let mut complete = EnrollmentTransition::to(EnrollmentStatus::Completed);
    complete.completion_date = Some(now);
    complete.total_hours_completed = Some(40);
    let done = repo
        .transition(created.id, EnrollmentStatus::Approved, complete)
        .await
        .unwrap();

    assert_eq!(done.status, EnrollmentStatus::Completed);
    assert_eq!(done.total_hours_completed, 40);
    assert!(done.completion_date.is_some());

    let stats = repo.stats_for_doctor(created.doctor_id).await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.total_hours_served, 40);
}

#[tokio::test]
async fn notes_are_editable_only_while_pending() {
    let repo = setup().await;
    let created = repo
        .create(request(Uuid::new_v4(), Uuid::new_v4(), 1, 15))
        .await
        .unwrap();

    let edited = repo
        .update_notes(created.id, Some("mornings".into()))
        .await
        .unwrap();
    assert_eq!(edited.notes.as_deref(), Some("mornings"));

    repo.transition(
        created.id,
        EnrollmentStatus::Pending,
        EnrollmentTransition::to(EnrollmentStatus::Approved),
    )
    .await
    .unwrap();

    let err = repo.update_notes(created.id, None).await.unwrap_err();
    assert!(matches!(err, DocconError::InvalidTransition { .. }));
}

#[tokio::test]
async fn list_filters_by_doctor_and_status() {
    let repo = setup().await;
    let doctor = Uuid::new_v4();
    let first = repo.create(request(doctor, Uuid::new_v4(), 1, 5)).await.unwrap();
    repo.create(request(doctor, Uuid::new_v4(), 6, 9)).await.unwrap();
    repo.create(request(Uuid::new_v4(), Uuid::new_v4(), 1, 5))
        .await
        .unwrap();

    repo.transition(
        first.id,
        EnrollmentStatus::Pending,
        EnrollmentTransition::to(EnrollmentStatus::Approved),
    )
    .await
    .unwrap();

    let mine = repo
        .list(
            EnrollmentFilter {
                doctor_id: Some(doctor),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(mine.total, 2);

    let pending = repo
        .list(
            EnrollmentFilter {
                status: Some(EnrollmentStatus::Pending),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(pending.total, 2);
    assert!(pending
        .items
        .iter()
        .all(|e| e.status == EnrollmentStatus::Pending));
}

#[tokio::test]
async fn active_enrollments_contain_the_instant() {
    let repo = setup().await;
    let doctor = Uuid::new_v4();
    let created = repo.create(request(doctor, Uuid::new_v4(), 1, 15)).await.unwrap();
    repo.transition(
        created.id,
        EnrollmentStatus::Pending,
        EnrollmentTransition::to(EnrollmentStatus::Approved),
    )
    .await
    .unwrap();

    let inside = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();
    let outside = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();

    assert_eq!(repo.list_active(doctor, inside).await.unwrap().len(), 1);
    assert!(repo.list_active(doctor, outside).await.unwrap().is_empty());
}

#[tokio::test]
async fn mark_certificate_generated_sets_flag() {
    let repo = setup().await;
    let created = repo
        .create(request(Uuid::new_v4(), Uuid::new_v4(), 1, 15))
        .await
        .unwrap();

    repo.mark_certificate_generated(created.id).await.unwrap();
    assert!(repo.get_by_id(created.id).await.unwrap().certificate_generated);
}
