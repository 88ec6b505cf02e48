//! Authentication service: registration, login, token resolution and
//! profile maintenance.

use doccon_core::error::{DocconError, DocconResult};
use doccon_core::models::doctor::{CreateDoctor, Doctor, RegisterDoctor, UpdateProfile};
use doccon_core::repository::DoctorRepository;
use serde::Serialize;
use tracing::info;
use validator::Validate;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Successful registration or login.
#[derive(Debug, Serialize)]
pub struct AuthOutput {
    /// Signed JWT access token.
    pub token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub doctor: Doctor,
}

/// Fails with `AuthorizationDenied` unless `doctor` is an administrator.
///
/// This is the single role check for the whole system; services call it
/// instead of inspecting roles themselves.
pub fn require_admin(doctor: &Doctor) -> DocconResult<()> {
    if doctor.is_admin() {
        Ok(())
    } else {
        Err(AuthError::AdminRequired.into())
    }
}

/// Authentication service.
///
/// Generic over the doctor store so that the auth layer has no
/// dependency on the database crate.
pub struct AuthService<D: DoctorRepository> {
    doctors: D,
    config: AuthConfig,
}

impl<D: DoctorRepository> AuthService<D> {
    pub fn new(doctors: D, config: AuthConfig) -> Self {
        Self { doctors, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Register a new doctor and issue a token.
    pub async fn register(&self, input: RegisterDoctor) -> DocconResult<AuthOutput> {
        input.validate()?;
        self.check_password_policy(&input.password)?;

        let input = CreateDoctor::from(input);

        // Friendly duplicate errors; the unique indexes still back this up.
        if self.exists(self.doctors.get_by_email(&input.email).await)? {
            return Err(DocconError::AlreadyExists {
                entity: "doctor".into(),
                field: "email".into(),
            });
        }
        if self.exists(
            self.doctors
                .get_by_license_number(&input.license_number)
                .await,
        )? {
            return Err(DocconError::AlreadyExists {
                entity: "doctor".into(),
                field: "license_number".into(),
            });
        }

        let doctor = self.doctors.create(input).await?;
        info!(doctor_id = %doctor.id, "Doctor registered");

        self.issue(doctor)
    }

    /// Authenticate with email + password and issue a token.
    ///
    /// An unknown email and a wrong password produce the same error.
    pub async fn login(&self, email: &str, password: &str) -> DocconResult<AuthOutput> {
        let email = email.trim().to_lowercase();
        let doctor = match self.doctors.get_by_email(&email).await {
            Ok(d) => d,
            Err(DocconError::NotFound { .. }) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        let valid = password::verify_password(
            password,
            &doctor.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        self.issue(doctor)
    }

    /// Resolve the doctor behind a bearer token.
    ///
    /// The returned record has its password hash cleared.
    pub async fn authenticate(&self, bearer: Option<&str>) -> DocconResult<Doctor> {
        let raw = token::bearer_token(bearer)?;
        let claims = token::decode_access_token(raw, &self.config)?;
        let doctor_id = claims.doctor_id()?;

        match self.doctors.get_by_id(doctor_id).await {
            Ok(doctor) => Ok(doctor.without_credentials()),
            Err(DocconError::NotFound { .. }) => {
                Err(AuthError::TokenInvalid("doctor no longer exists".into()).into())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn update_profile(&self, doctor: &Doctor, input: UpdateProfile) -> DocconResult<Doctor> {
        input.validate()?;
        let updated = self.doctors.update(doctor.id, input.into()).await?;
        Ok(updated.without_credentials())
    }

    /// Replace the password after checking the current one.
    pub async fn change_password(
        &self,
        doctor: &Doctor,
        current_password: &str,
        new_password: &str,
    ) -> DocconResult<()> {
        if current_password.is_empty() {
            return Err(DocconError::validation("Current password is required"));
        }
        self.check_password_policy(new_password)?;

        // The caller's record comes from `authenticate` without its hash.
        let stored = self.doctors.get_by_id(doctor.id).await?;
        let valid = password::verify_password(
            current_password,
            &stored.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(DocconError::validation("Current password is incorrect"));
        }

        self.doctors.set_password(doctor.id, new_password).await?;
        info!(doctor_id = %doctor.id, "Password changed");
        Ok(())
    }

    fn issue(&self, doctor: Doctor) -> DocconResult<AuthOutput> {
        let token = token::issue_access_token(&doctor, &self.config)?;
        Ok(AuthOutput {
            token,
            expires_in: self.config.access_token_lifetime_secs,
            doctor: doctor.without_credentials(),
        })
    }

    fn check_password_policy(&self, password: &str) -> DocconResult<()> {
        if password.chars().count() < self.config.min_password_length {
            return Err(DocconError::validation(format!(
                "Password must be at least {} characters long",
                self.config.min_password_length
            )));
        }
        Ok(())
    }

    fn exists(&self, lookup: DocconResult<Doctor>) -> DocconResult<bool> {
        match lookup {
            Ok(_) => Ok(true),
            Err(DocconError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
