//! Integration tests for EnrollmentService using in-memory SurrealDB.

use chrono::{DateTime, Duration, TimeZone, Utc};
use doccon_certs::{CertificateIssuer, FsArtifactStore};
use doccon_core::error::{DocconError, DocconResult};
use doccon_core::models::doctor::{CreateDoctor, Doctor, DoctorRole, UpdateDoctor};
use doccon_core::models::enrollment::{
    CreateEnrollment, CreateEnrollmentRequest, Enrollment, EnrollmentFilter, EnrollmentStats,
    EnrollmentStatus, EnrollmentTransition,
};
use doccon_core::models::hospital::{CreateHospital, Hospital, HospitalKind};
use doccon_core::models::specialty::Specialty;
use doccon_core::repository::{
    CertificateRepository, DoctorRepository, EnrollmentRepository, HospitalRepository,
    PaginatedResult, Pagination,
};
use doccon_db::repository::{
    SurrealCertificateRepository, SurrealDoctorRepository, SurrealEnrollmentRepository,
    SurrealHospitalRepository,
};
use doccon_enrollment::EnrollmentService;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

type Service = EnrollmentService<
    SurrealDoctorRepository<Db>,
    SurrealHospitalRepository<Db>,
    SurrealEnrollmentRepository<Db>,
    SurrealCertificateRepository<Db>,
    FsArtifactStore,
>;

struct Fixture {
    db: Surreal<Db>,
    service: Service,
    doctor: Doctor,
    other_doctor: Doctor,
    admin: Doctor,
    hospital: Hospital,
    second_hospital: Hospital,
}

async fn register(repo: &SurrealDoctorRepository<Db>, email: &str, license: &str) -> Doctor {
    repo.create(CreateDoctor {
        name: "Ravi Menon".into(),
        email: email.into(),
        password: "secret123".into(),
        phone: "9000000001".into(),
        specialization: Specialty::Cardiology,
        license_number: license.into(),
        experience_years: 10,
        address: "7 Beach Road, Fort Kochi".into(),
        city: "Kochi".into(),
        state: "Kerala".into(),
    })
    .await
    .unwrap()
}

async fn hospital(repo: &SurrealHospitalRepository<Db>, name: &str) -> Hospital {
    repo.create(CreateHospital {
        name: name.into(),
        kind: HospitalKind::Government,
        address: Some("Hospital Road".into()),
        city: "Kochi".into(),
        state: "Kerala".into(),
        capacity: Some(300),
        specialties: vec![Specialty::Cardiology, Specialty::Pediatrics],
        facilities: vec![],
    })
    .await
    .unwrap()
}

async fn setup() -> Fixture {
    let db: Surreal<Db> = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    doccon_db::run_migrations(&db).await.unwrap();

    let doctors = SurrealDoctorRepository::new(db.clone());
    let hospitals = SurrealHospitalRepository::new(db.clone());

    let doctor = register(&doctors, "ravi@example.com", "KL-10001").await;
    let other_doctor = register(&doctors, "leela@example.com", "KL-10002").await;
    let admin = register(&doctors, "admin@example.com", "KL-00000").await;
    let admin = doctors
        .update(
            admin.id,
            UpdateDoctor {
                role: Some(DoctorRole::Admin),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let first = hospital(&hospitals, "Ernakulam General Hospital").await;
    let second = hospital(&hospitals, "Lakeshore Hospital").await;

    let store = FsArtifactStore::new(
        std::env::temp_dir().join(format!("doccon-lifecycle-{}", Uuid::new_v4())),
    );
    let issuer = CertificateIssuer::new(SurrealCertificateRepository::new(db.clone()), store);
    let service = EnrollmentService::new(
        doctors,
        hospitals,
        SurrealEnrollmentRepository::new(db.clone()),
        issuer,
    );

    Fixture {
        db,
        service,
        doctor,
        other_doctor,
        admin,
        hospital: first,
        second_hospital: second,
    }
}

fn request(hospital_id: Uuid, start_in_days: i64, length_days: i64) -> CreateEnrollmentRequest {
    let start = Utc::now() + Duration::days(start_in_days);
    CreateEnrollmentRequest {
        hospital_id,
        start_date: start,
        end_date: start + Duration::days(length_days),
        weekly_hours: 10,
        department: Specialty::Cardiology,
        notes: Some("  weekends  ".into()),
    }
}

#[tokio::test]
async fn create_stores_pending_enrollment_with_hospital() {
    let f = setup().await;

    let view = f
        .service
        .create(&f.doctor, request(f.hospital.id, 1, 14))
        .await
        .unwrap();

    assert_eq!(view.enrollment.status, EnrollmentStatus::Pending);
    assert_eq!(view.enrollment.doctor_id, f.doctor.id);
    assert!(f.hospital.offers(view.enrollment.department));
    assert_eq!(view.enrollment.notes.as_deref(), Some("weekends"));
    assert_eq!(view.hospital.name, "Ernakulam General Hospital");
}

#[tokio::test]
async fn create_rejects_invalid_requests() {
    let f = setup().await;

    let mut inverted = request(f.hospital.id, 3, 5);
    inverted.end_date = inverted.start_date;
    let err = f.service.create(&f.doctor, inverted).await.unwrap_err();
    assert!(matches!(err, DocconError::Validation { .. }));

    let err = f
        .service
        .create(&f.doctor, request(f.hospital.id, -2, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, DocconError::Validation { .. }));

    let mut wrong_department = request(f.hospital.id, 1, 5);
    wrong_department.department = Specialty::Urology;
    let err = f
        .service
        .create(&f.doctor, wrong_department)
        .await
        .unwrap_err();
    assert!(matches!(err, DocconError::Validation { .. }));

    let mut too_many_hours = request(f.hospital.id, 1, 5);
    too_many_hours.weekly_hours = 41;
    let err = f.service.create(&f.doctor, too_many_hours).await.unwrap_err();
    assert!(matches!(err, DocconError::Validation { .. }));

    let err = f
        .service
        .create(&f.doctor, request(Uuid::new_v4(), 1, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, DocconError::NotFound { .. }));
}

#[tokio::test]
async fn overlapping_enrollments_at_same_hospital_are_rejected() {
    let f = setup().await;
    let first = f
        .service
        .create(&f.doctor, request(f.hospital.id, 1, 10))
        .await
        .unwrap();

    let err = f
        .service
        .create(&f.doctor, request(f.hospital.id, 5, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, DocconError::Validation { .. }));

    // Another hospital or another doctor is fine.
    f.service
        .create(&f.doctor, request(f.second_hospital.id, 5, 10))
        .await
        .unwrap();
    f.service
        .create(&f.other_doctor, request(f.hospital.id, 5, 10))
        .await
        .unwrap();

    // Cancelling frees the slot.
    f.service
        .cancel(&f.doctor, first.enrollment.id)
        .await
        .unwrap();
    f.service
        .create(&f.doctor, request(f.hospital.id, 5, 10))
        .await
        .unwrap();
}

#[tokio::test]
async fn approving_twice_yields_one_certificate() {
    let f = setup().await;
    let view = f
        .service
        .create(&f.doctor, request(f.hospital.id, 1, 14))
        .await
        .unwrap();
    let id = view.enrollment.id;

    let outcome = f.service.approve(&f.admin, id).await.unwrap();
    assert_eq!(outcome.enrollment.status, EnrollmentStatus::Approved);
    assert!(outcome.enrollment.certificate_generated);
    assert!(outcome.certificate_error.is_none());
    let certificate = outcome.certificate.unwrap();
    assert_eq!(certificate.total_hours, 20);

    let err = f.service.approve(&f.admin, id).await.unwrap_err();
    assert!(matches!(err, DocconError::InvalidTransition { .. }));

    let certificates = SurrealCertificateRepository::new(f.db.clone());
    let stored = certificates.get_by_enrollment(id).await.unwrap().unwrap();
    assert_eq!(stored.id, certificate.id);
    let listed = certificates
        .list_by_doctor(f.doctor.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 1);

    let enrollment = SurrealEnrollmentRepository::new(f.db.clone())
        .get_by_id(id)
        .await
        .unwrap();
    assert!(enrollment.certificate_generated);
}

#[tokio::test]
async fn approval_stands_when_issuance_fails() {
    let f = setup().await;
    let view = f
        .service
        .create(&f.doctor, request(f.hospital.id, 1, 14))
        .await
        .unwrap();

    // A vanished doctor makes issuance impossible.
    f.db.query("DELETE type::record('doctor', $id)")
        .bind(("id", f.doctor.id.to_string()))
        .await
        .unwrap();

    let outcome = f
        .service
        .approve(&f.admin, view.enrollment.id)
        .await
        .unwrap();
    assert_eq!(outcome.enrollment.status, EnrollmentStatus::Approved);
    assert!(outcome.certificate.is_none());
    assert!(outcome.certificate_error.is_some());
    assert!(!outcome.enrollment.certificate_generated);
}

#[tokio::test]
async fn admin_actions_require_admin_role() {
    let f = setup().await;
    let view = f
        .service
        .create(&f.doctor, request(f.hospital.id, 1, 14))
        .await
        .unwrap();
    let id = view.enrollment.id;

    let err = f.service.approve(&f.doctor, id).await.unwrap_err();
    assert!(matches!(err, DocconError::AuthorizationDenied { .. }));
    let err = f.service.reject(&f.doctor, id, "no").await.unwrap_err();
    assert!(matches!(err, DocconError::AuthorizationDenied { .. }));
    let err = f.service.complete(&f.doctor, id).await.unwrap_err();
    assert!(matches!(err, DocconError::AuthorizationDenied { .. }));
    let err = f
        .service
        .list_pending(&f.doctor, Pagination::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DocconError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn reject_requires_a_reason() {
    let f = setup().await;
    let view = f
        .service
        .create(&f.doctor, request(f.hospital.id, 1, 14))
        .await
        .unwrap();
    let id = view.enrollment.id;

    let err = f.service.reject(&f.admin, id, "   ").await.unwrap_err();
    assert!(matches!(err, DocconError::Validation { .. }));

    let long = "x".repeat(501);
    let err = f.service.reject(&f.admin, id, &long).await.unwrap_err();
    assert!(matches!(err, DocconError::Validation { .. }));

    let rejected = f
        .service
        .reject(&f.admin, id, "Department fully staffed")
        .await
        .unwrap();
    assert_eq!(rejected.status, EnrollmentStatus::Rejected);
    assert_eq!(
        rejected.admin_notes.as_deref(),
        Some("Department fully staffed")
    );

    let err = f.service.approve(&f.admin, id).await.unwrap_err();
    assert!(matches!(err, DocconError::InvalidTransition { .. }));
}

#[tokio::test]
async fn complete_waits_for_end_date() {
    let f = setup().await;

    // Future service period: approval works, completion does not.
    let upcoming = f
        .service
        .create(&f.doctor, request(f.hospital.id, 1, 14))
        .await
        .unwrap();
    f.service
        .approve(&f.admin, upcoming.enrollment.id)
        .await
        .unwrap();
    let err = f
        .service
        .complete(&f.admin, upcoming.enrollment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DocconError::InvalidTransition { .. }));

    // Past service period, inserted directly since creation forbids it.
    let past = SurrealEnrollmentRepository::new(f.db.clone())
        .create(CreateEnrollment {
            doctor_id: f.doctor.id,
            hospital_id: f.second_hospital.id,
            start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            weekly_hours: 20,
            department: Specialty::Pediatrics,
            notes: None,
            status: EnrollmentStatus::Pending,
        })
        .await
        .unwrap();

    let err = f.service.complete(&f.admin, past.id).await.unwrap_err();
    assert!(matches!(err, DocconError::InvalidTransition { .. }));

    f.service.approve(&f.admin, past.id).await.unwrap();
    let completed = f.service.complete(&f.admin, past.id).await.unwrap();
    assert_eq!(completed.status, EnrollmentStatus::Completed);
    assert_eq!(completed.total_hours_completed, 40);
    assert!(completed.completion_date.is_some());

    let stats = f.service.stats_for_doctor(&f.doctor).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.approved, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.total_hours_served, 40);
}

#[tokio::test]
async fn only_the_owner_can_cancel() {
    let f = setup().await;
    let view = f
        .service
        .create(&f.doctor, request(f.hospital.id, 1, 14))
        .await
        .unwrap();
    let id = view.enrollment.id;

    let err = f.service.cancel(&f.other_doctor, id).await.unwrap_err();
    assert!(matches!(err, DocconError::NotFound { .. }));
    let err = f
        .service
        .get_for_doctor(&f.other_doctor, id)
        .await
        .unwrap_err();
    assert!(matches!(err, DocconError::NotFound { .. }));

    let cancelled = f.service.cancel(&f.doctor, id).await.unwrap();
    assert_eq!(cancelled.status, EnrollmentStatus::Cancelled);

    let err = f.service.cancel(&f.doctor, id).await.unwrap_err();
    assert!(matches!(err, DocconError::InvalidTransition { .. }));
}

#[tokio::test]
async fn notes_can_change_while_pending() {
    let f = setup().await;
    let view = f
        .service
        .create(&f.doctor, request(f.hospital.id, 1, 14))
        .await
        .unwrap();
    let id = view.enrollment.id;

    let edited = f
        .service
        .update_notes(&f.doctor, id, Some("mornings".into()))
        .await
        .unwrap();
    assert_eq!(edited.enrollment.notes.as_deref(), Some("mornings"));

    f.service.approve(&f.admin, id).await.unwrap();
    let err = f
        .service
        .update_notes(&f.doctor, id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, DocconError::InvalidTransition { .. }));
}

#[tokio::test]
async fn listings_join_doctor_and_hospital() {
    let f = setup().await;
    f.service
        .create(&f.doctor, request(f.hospital.id, 1, 14))
        .await
        .unwrap();
    let second = f
        .service
        .create(&f.other_doctor, request(f.second_hospital.id, 1, 14))
        .await
        .unwrap();
    f.service
        .approve(&f.admin, second.enrollment.id)
        .await
        .unwrap();

    let pending = f
        .service
        .list_pending(&f.admin, Pagination::default())
        .await
        .unwrap();
    assert_eq!(pending.total, 1);
    assert_eq!(pending.items[0].doctor.id, f.doctor.id);
    assert_eq!(pending.items[0].hospital.id, f.hospital.id);

    let all = f
        .service
        .list_all(&f.admin, None, Pagination::default())
        .await
        .unwrap();
    assert_eq!(all.total, 2);

    let mine = f
        .service
        .list_for_doctor(&f.other_doctor, None, Pagination::default())
        .await
        .unwrap();
    assert_eq!(mine.total, 1);
    assert_eq!(mine.items[0].hospital.name, "Lakeshore Hospital");
}

#[tokio::test]
async fn active_enrollments_are_approved_and_in_progress() {
    let f = setup().await;

    let running = SurrealEnrollmentRepository::new(f.db.clone())
        .create(CreateEnrollment {
            doctor_id: f.doctor.id,
            hospital_id: f.hospital.id,
            start_date: Utc::now() - Duration::days(3),
            end_date: Utc::now() + Duration::days(3),
            weekly_hours: 8,
            department: Specialty::Cardiology,
            notes: None,
            status: EnrollmentStatus::Pending,
        })
        .await
        .unwrap();

    assert!(f.service.active_for_doctor(&f.doctor).await.unwrap().is_empty());

    f.service.approve(&f.admin, running.id).await.unwrap();
    let active = f.service.active_for_doctor(&f.doctor).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].enrollment.id, running.id);
}

/// Enrollment store whose `certificate_generated` write always fails.
struct UnflaggableEnrollments(SurrealEnrollmentRepository<Db>);

impl EnrollmentRepository for UnflaggableEnrollments {
    async fn create(&self, input: CreateEnrollment) -> DocconResult<Enrollment> {
        self.0.create(input).await
    }

    async fn get_by_id(&self, id: Uuid) -> DocconResult<Enrollment> {
        self.0.get_by_id(id).await
    }

    async fn find_overlapping(
        &self,
        doctor_id: Uuid,
        hospital_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DocconResult<Option<Enrollment>> {
        self.0
            .find_overlapping(doctor_id, hospital_id, start, end)
            .await
    }

    async fn transition(
        &self,
        id: Uuid,
        from: EnrollmentStatus,
        change: EnrollmentTransition,
    ) -> DocconResult<Enrollment> {
        self.0.transition(id, from, change).await
    }

    async fn update_notes(&self, id: Uuid, notes: Option<String>) -> DocconResult<Enrollment> {
        self.0.update_notes(id, notes).await
    }

    async fn mark_certificate_generated(&self, _id: Uuid) -> DocconResult<()> {
        Err(DocconError::Database("write timed out".into()))
    }

    async fn list(
        &self,
        filter: EnrollmentFilter,
        pagination: Pagination,
    ) -> DocconResult<PaginatedResult<Enrollment>> {
        self.0.list(filter, pagination).await
    }

    async fn list_active(&self, doctor_id: Uuid, at: DateTime<Utc>) -> DocconResult<Vec<Enrollment>> {
        self.0.list_active(doctor_id, at).await
    }

    async fn stats_for_doctor(&self, doctor_id: Uuid) -> DocconResult<EnrollmentStats> {
        self.0.stats_for_doctor(doctor_id).await
    }
}

#[tokio::test]
async fn approval_reports_certificate_when_flag_write_fails() {
    let f = setup().await;
    let dir = std::env::temp_dir().join(format!("doccon-lifecycle-{}", Uuid::new_v4()));
    let service = EnrollmentService::new(
        SurrealDoctorRepository::new(f.db.clone()),
        SurrealHospitalRepository::new(f.db.clone()),
        UnflaggableEnrollments(SurrealEnrollmentRepository::new(f.db.clone())),
        CertificateIssuer::new(
            SurrealCertificateRepository::new(f.db.clone()),
            FsArtifactStore::new(&dir),
        ),
    );

    let view = service
        .create(&f.doctor, request(f.hospital.id, 1, 14))
        .await
        .unwrap();
    let id = view.enrollment.id;

    let outcome = service.approve(&f.admin, id).await.unwrap();
    assert_eq!(outcome.enrollment.status, EnrollmentStatus::Approved);
    assert!(outcome.certificate_error.is_none());
    assert!(!outcome.enrollment.certificate_generated);
    let certificate = outcome.certificate.unwrap();

    let stored = SurrealCertificateRepository::new(f.db.clone())
        .get_by_enrollment(id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.id, certificate.id);

    let _ = tokio::fs::remove_dir_all(&dir).await;
}
