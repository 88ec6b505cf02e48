//! Integration tests for CertificateIssuer using in-memory SurrealDB.

use std::sync::{Arc, Mutex};

use chrono::{TimeZone, Utc};
use doccon_certs::{ArtifactStore, CertError, CertificateIssuer, FsArtifactStore, StoredArtifact};
use doccon_core::error::{DocconError, DocconResult};
use doccon_core::models::certificate::{Certificate, CertificateStats, CreateCertificate};
use doccon_core::models::doctor::DoctorSummary;
use doccon_core::models::enrollment::{Enrollment, EnrollmentDetail, EnrollmentStatus};
use doccon_core::models::hospital::HospitalSummary;
use doccon_core::models::specialty::Specialty;
use doccon_core::repository::{CertificateRepository, PaginatedResult, Pagination};
use doccon_db::repository::SurrealCertificateRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Store that refuses every write.
struct BrokenStore;

impl ArtifactStore for BrokenStore {
    async fn save(&self, _file_name: &str, _bytes: &[u8]) -> Result<StoredArtifact, CertError> {
        Err(std::io::Error::other("disk full").into())
    }

    async fn load(&self, _path: &str) -> Result<Vec<u8>, CertError> {
        Err(std::io::Error::other("disk full").into())
    }

    async fn remove(&self, _path: &str) -> Result<(), CertError> {
        Err(std::io::Error::other("disk full").into())
    }
}

/// Repository that can report number collisions and fail writes on demand.
#[derive(Clone)]
struct ScriptedCertificates {
    inner: SurrealCertificateRepository<Db>,
    collisions: Arc<Mutex<u32>>,
    attempted: Arc<Mutex<Vec<String>>>,
    fail_create: bool,
    fail_attach: bool,
}

impl ScriptedCertificates {
    async fn new() -> Self {
        Self {
            inner: certificates().await,
            collisions: Arc::new(Mutex::new(0)),
            attempted: Arc::new(Mutex::new(Vec::new())),
            fail_create: false,
            fail_attach: false,
        }
    }

    fn attempted(&self) -> Vec<String> {
        self.attempted.lock().unwrap().clone()
    }
}

impl CertificateRepository for ScriptedCertificates {
    async fn create(&self, input: CreateCertificate) -> DocconResult<Certificate> {
        self.attempted
            .lock()
            .unwrap()
            .push(input.certificate_number.clone());
        {
            let mut collisions = self.collisions.lock().unwrap();
            if *collisions > 0 {
                *collisions -= 1;
                return Err(DocconError::AlreadyExists {
                    entity: "certificate".into(),
                    field: "certificate_number".into(),
                });
            }
        }
        if self.fail_create {
            return Err(DocconError::Database("connection reset".into()));
        }
        self.inner.create(input).await
    }

    async fn get_by_id(&self, id: Uuid) -> DocconResult<Certificate> {
        self.inner.get_by_id(id).await
    }

    async fn get_by_enrollment(&self, enrollment_id: Uuid) -> DocconResult<Option<Certificate>> {
        self.inner.get_by_enrollment(enrollment_id).await
    }

    async fn list_by_doctor(
        &self,
        doctor_id: Uuid,
        pagination: Pagination,
    ) -> DocconResult<PaginatedResult<Certificate>> {
        self.inner.list_by_doctor(doctor_id, pagination).await
    }

    async fn attach_artifact(
        &self,
        id: Uuid,
        file_path: String,
        file_size: u64,
    ) -> DocconResult<Certificate> {
        if self.fail_attach {
            return Err(DocconError::Database("connection reset".into()));
        }
        self.inner.attach_artifact(id, file_path, file_size).await
    }

    async fn verify(&self, id: Uuid, verified_by: Uuid) -> DocconResult<Certificate> {
        self.inner.verify(id, verified_by).await
    }

    async fn stats_for_doctor(&self, doctor_id: Uuid) -> DocconResult<CertificateStats> {
        self.inner.stats_for_doctor(doctor_id).await
    }
}

async fn files_in(dir: &std::path::Path) -> Vec<String> {
    let mut names = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return names;
    };
    while let Some(entry) = entries.next_entry().await.unwrap() {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names
}

async fn certificates() -> SurrealCertificateRepository<Db> {
    let db: Surreal<Db> = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    doccon_db::run_migrations(&db).await.unwrap();
    SurrealCertificateRepository::new(db)
}

fn detail() -> EnrollmentDetail {
    let now = Utc::now();
    let doctor_id = Uuid::new_v4();
    let hospital_id = Uuid::new_v4();
    EnrollmentDetail {
        enrollment: Enrollment {
            id: Uuid::new_v4(),
            doctor_id,
            hospital_id,
            start_date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            weekly_hours: 20,
            department: Specialty::Orthopedics,
            status: EnrollmentStatus::Approved,
            notes: None,
            admin_notes: None,
            total_hours_completed: 0,
            completion_date: None,
            certificate_generated: false,
            created_at: now,
            updated_at: now,
        },
        doctor: DoctorSummary {
            id: doctor_id,
            name: "Kabir Shah".into(),
            email: "kabir@example.com".into(),
            specialization: Specialty::Orthopedics,
            license_number: "GJ-77812".into(),
        },
        hospital: HospitalSummary {
            id: hospital_id,
            name: "Riverside Civil Hospital".into(),
            address: Some("Ashram Road".into()),
            city: "Ahmedabad".into(),
            state: "Gujarat".into(),
        },
    }
}

fn scratch_dir() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("doccon-issuer-{}", Uuid::new_v4()))
}

#[tokio::test]
async fn issue_persists_record_and_pdf() {
    let dir = scratch_dir();
    let issuer = CertificateIssuer::new(certificates().await, FsArtifactStore::new(&dir));
    let detail = detail();

    let cert = issuer.issue(&detail).await.unwrap();

    assert!(cert.certificate_number.starts_with("CERT-"));
    assert_eq!(cert.total_hours, 40);
    assert_eq!(cert.service_period, "1/1/2024 - 1/15/2024");
    assert_eq!(cert.department, Specialty::Orthopedics);
    assert_eq!(cert.enrollment_id, detail.enrollment.id);
    assert!(!cert.is_degraded());
    assert!(cert.file_size > 0);

    let bytes = issuer.store().load(&cert.file_path).await.unwrap();
    assert_eq!(bytes.len() as u64, cert.file_size);
    assert!(bytes.starts_with(b"%PDF"));

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn second_issue_for_same_enrollment_conflicts() {
    let dir = scratch_dir();
    let issuer = CertificateIssuer::new(certificates().await, FsArtifactStore::new(&dir));
    let detail = detail();

    issuer.issue(&detail).await.unwrap();
    let err = issuer.issue(&detail).await.unwrap_err();
    assert!(matches!(err, DocconError::AlreadyExists { .. }));

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn storage_failure_yields_degraded_certificate() {
    let repo = certificates().await;
    let issuer = CertificateIssuer::new(repo.clone(), BrokenStore);
    let detail = detail();

    let cert = issuer.issue(&detail).await.unwrap();
    assert!(cert.is_degraded());
    assert_eq!(cert.file_path, "");
    assert_eq!(cert.file_size, 0);

    let stored = repo.get_by_enrollment(detail.enrollment.id).await.unwrap();
    assert_eq!(stored.map(|c| c.id), Some(cert.id));
}

#[tokio::test]
async fn number_collision_retries_without_touching_the_store() {
    let dir = scratch_dir();
    let repo = ScriptedCertificates::new().await;
    *repo.collisions.lock().unwrap() = 2;
    let issuer = CertificateIssuer::new(repo.clone(), FsArtifactStore::new(&dir));

    let cert = issuer.issue(&detail()).await.unwrap();

    let attempted = repo.attempted();
    assert_eq!(attempted.len(), 3);
    assert_eq!(attempted[2], cert.certificate_number);
    assert!(!cert.is_degraded());

    // Only the committed number has a file.
    assert_eq!(files_in(&dir).await, vec![cert.file_name()]);

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}

#[tokio::test]
async fn exhausted_numbers_fail_and_leave_no_files() {
    let dir = scratch_dir();
    let repo = ScriptedCertificates::new().await;
    *repo.collisions.lock().unwrap() = 10;
    let issuer = CertificateIssuer::new(repo.clone(), FsArtifactStore::new(&dir));

    let err = issuer.issue(&detail()).await.unwrap_err();
    assert!(matches!(err, DocconError::Certificate(_)), "{err:?}");
    assert_eq!(repo.attempted().len(), 5);
    assert!(files_in(&dir).await.is_empty());
}

#[tokio::test]
async fn failed_record_creation_leaves_no_files() {
    let dir = scratch_dir();
    let mut repo = ScriptedCertificates::new().await;
    repo.fail_create = true;
    let issuer = CertificateIssuer::new(repo, FsArtifactStore::new(&dir));

    let err = issuer.issue(&detail()).await.unwrap_err();
    assert!(matches!(err, DocconError::Database(_)));
    assert!(files_in(&dir).await.is_empty());
}

#[tokio::test]
async fn unrecorded_artifact_is_discarded() {
    let dir = scratch_dir();
    let mut repo = ScriptedCertificates::new().await;
    repo.fail_attach = true;
    let issuer = CertificateIssuer::new(repo.clone(), FsArtifactStore::new(&dir));
    let detail = detail();

    let cert = issuer.issue(&detail).await.unwrap();
    assert!(cert.is_degraded());
    assert!(files_in(&dir).await.is_empty());

    let stored = repo.inner.get_by_id(cert.id).await.unwrap();
    assert_eq!(stored.file_path, "");

    tokio::fs::remove_dir_all(&dir).await.unwrap();
}
