//! Shared handler state.

use std::path::PathBuf;
use std::sync::Arc;

use doccon_auth::{AuthConfig, AuthService};
use doccon_certs::{CertificateIssuer, FsArtifactStore};
use doccon_db::repository::{
    SurrealCertificateRepository, SurrealDoctorRepository, SurrealEnrollmentRepository,
    SurrealHospitalRepository,
};
use doccon_enrollment::{CertificateService, EnrollmentService};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;

pub type Doctors = SurrealDoctorRepository<Any>;
pub type Hospitals = SurrealHospitalRepository<Any>;
pub type Enrollments = SurrealEnrollmentRepository<Any>;
pub type Certificates = SurrealCertificateRepository<Any>;

pub type Auth = AuthService<Doctors>;
pub type Lifecycle = EnrollmentService<Doctors, Hospitals, Enrollments, Certificates, FsArtifactStore>;
pub type CertificateDesk =
    CertificateService<Doctors, Hospitals, Enrollments, Certificates, FsArtifactStore>;

/// Services and repositories behind the routes. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Auth>,
    pub enrollments: Arc<Lifecycle>,
    pub certificates: Arc<CertificateDesk>,
    pub doctors: Doctors,
    pub hospitals: Hospitals,
}

impl AppState {
    pub fn new(db: Surreal<Any>, auth_config: AuthConfig, certificates_dir: PathBuf) -> Self {
        let doctors = match &auth_config.pepper {
            Some(pepper) => SurrealDoctorRepository::with_pepper(db.clone(), pepper.clone()),
            None => SurrealDoctorRepository::new(db.clone()),
        };
        let hospitals = SurrealHospitalRepository::new(db.clone());
        let enrollments = SurrealEnrollmentRepository::new(db.clone());
        let certificates = SurrealCertificateRepository::new(db);
        let store = FsArtifactStore::new(certificates_dir);

        let lifecycle = EnrollmentService::new(
            doctors.clone(),
            hospitals.clone(),
            enrollments.clone(),
            CertificateIssuer::new(certificates.clone(), store.clone()),
        );
        let desk = CertificateService::new(
            doctors.clone(),
            hospitals.clone(),
            enrollments,
            certificates,
            store,
        );

        Self {
            auth: Arc::new(AuthService::new(doctors.clone(), auth_config)),
            enrollments: Arc::new(lifecycle),
            certificates: Arc::new(desk),
            doctors,
            hospitals,
        }
    }
}
