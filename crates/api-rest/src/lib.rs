//! # API REST
//!
//! REST API implementation for Thejas.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Request and response bodies are the protobuf messages from `api-shared`, serialized as JSON,
//! so both API surfaces share one schema.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch, post, put},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{convert, pb, HealthService};
use thejas_core::{
    AccountRef, EntryId, ErrorKind, IdentityError, IdentityResult, IdentityService,
    PatientIdentifier,
};

type ApiError = (StatusCode, &'static str);

/// Application state shared by the REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<IdentityService>,
}

impl AppState {
    pub fn new(identity: Arc<IdentityService>) -> Self {
        Self { identity }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        register_patient,
        register_doctor,
        login,
        logout,
        find_patient,
        update_patient_profile,
        search_patients,
        add_daily_entry,
        update_daily_entry,
        list_daily_entries,
        add_prescription,
        update_prescription,
        list_prescriptions,
        add_appointment,
        update_appointment_status,
        list_appointments,
    ),
    components(schemas(
        pb::HealthRes,
        pb::RegisterPatientReq,
        pb::RegisterPatientRes,
        pb::RegisterDoctorReq,
        pb::RegisterDoctorRes,
        pb::LoginReq,
        pb::LoginRes,
        pb::LogoutReq,
        pb::LogoutRes,
        pb::PatientRecord,
        pb::UpdatePatientProfileReq,
        pb::SearchPatientsRes,
        pb::Vitals,
        pb::AddDailyEntryReq,
        pb::DailyEntry,
        pb::ListDailyEntriesRes,
        pb::AddPrescriptionReq,
        pb::UpdatePrescriptionReq,
        pb::Prescription,
        pb::ListPrescriptionsRes,
        pb::AddAppointmentReq,
        pb::UpdateAppointmentStatusReq,
        pb::Appointment,
        pb::ListAppointmentsRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router, including Swagger UI at `/swagger-ui`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients", post(register_patient).get(search_patients))
        .route("/doctors", post(register_doctor))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/profile", patch(update_patient_profile))
        .route("/patients/:identifier", get(find_patient))
        .route(
            "/patients/:identifier/entries",
            post(add_daily_entry).get(list_daily_entries),
        )
        .route("/patients/:identifier/entries/:entry_id", put(update_daily_entry))
        .route(
            "/patients/:identifier/prescriptions",
            post(add_prescription).get(list_prescriptions),
        )
        .route(
            "/patients/:identifier/prescriptions/:prescription_id",
            put(update_prescription),
        )
        .route(
            "/patients/:identifier/appointments",
            post(add_appointment).get(list_appointments),
        )
        .route(
            "/patients/:identifier/appointments/:appointment_id",
            patch(update_appointment_status),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Maps a core error onto an HTTP status and the user-facing message.
pub fn to_http(err: IdentityError) -> ApiError {
    let message = err.user_message();
    let status = match err.kind() {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::InvalidCredentials => StatusCode::UNAUTHORIZED,
        ErrorKind::Conflict | ErrorKind::RetryRegistration => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    };

    if status == StatusCode::SERVICE_UNAVAILABLE {
        tracing::error!("request failed: {:?}", err);
    } else {
        tracing::warn!(error = %err, "request rejected");
    }
    (status, message)
}

fn identifier(raw: &str) -> Result<PatientIdentifier, ApiError> {
    PatientIdentifier::parse(raw).map_err(|e| to_http(e.into()))
}

fn account_ref(raw: &str) -> Result<AccountRef, ApiError> {
    AccountRef::parse(raw).map_err(|e| to_http(e.into()))
}

fn record_id(raw: &str) -> Result<EntryId, ApiError> {
    raw.trim().parse::<EntryId>().map_err(|e| to_http(e.into()))
}

fn reply<T, R: From<T>>(result: IdentityResult<T>) -> Result<Json<R>, ApiError> {
    result.map(|v| Json(v.into())).map_err(to_http)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = pb::HealthRes)
    )
)]
/// Health check endpoint for load balancers and monitoring.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<pb::HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = pb::RegisterPatientReq,
    responses(
        (status = 201, description = "Patient registered", body = pb::RegisterPatientRes),
        (status = 400, description = "Bad request"),
        (status = 409, description = "Email or national ID already registered, or retry needed"),
        (status = 503, description = "Service unavailable")
    )
)]
/// Register a patient
///
/// Creates the login account and profile, and mints the patient's 10-digit identifier.
#[axum::debug_handler]
async fn register_patient(
    State(state): State<AppState>,
    Json(req): Json<pb::RegisterPatientReq>,
) -> Result<(StatusCode, Json<pb::RegisterPatientRes>), ApiError> {
    let registration = convert::patient_registration(req).map_err(to_http)?;
    let registered = state
        .identity
        .register_patient(registration)
        .map_err(to_http)?;
    Ok((StatusCode::CREATED, Json(registered.into())))
}

#[utoipa::path(
    post,
    path = "/doctors",
    request_body = pb::RegisterDoctorReq,
    responses(
        (status = 201, description = "Doctor registered", body = pb::RegisterDoctorRes),
        (status = 400, description = "Bad request"),
        (status = 409, description = "Email, national ID or licence already registered"),
        (status = 503, description = "Service unavailable")
    )
)]
#[axum::debug_handler]
async fn register_doctor(
    State(state): State<AppState>,
    Json(req): Json<pb::RegisterDoctorReq>,
) -> Result<(StatusCode, Json<pb::RegisterDoctorRes>), ApiError> {
    let registration = convert::doctor_registration(req).map_err(to_http)?;
    let registered = state
        .identity
        .register_doctor(registration)
        .map_err(to_http)?;
    Ok((StatusCode::CREATED, Json(registered.into())))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = pb::LoginReq,
    responses(
        (status = 200, description = "Signed in", body = pb::LoginRes),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Invalid credentials"),
        (status = 503, description = "Service unavailable")
    )
)]
/// Sign in as a patient or doctor
///
/// Patients may log in with their email or identifier, together with either their password
/// or their national ID. Doctors may also use their phone number or medical licence ID.
#[axum::debug_handler]
async fn login(
    State(state): State<AppState>,
    Json(req): Json<pb::LoginReq>,
) -> Result<Json<pb::LoginRes>, ApiError> {
    let request = convert::login_request(req).map_err(to_http)?;
    reply(state.identity.login(request))
}

#[utoipa::path(
    post,
    path = "/logout",
    request_body = pb::LogoutReq,
    responses(
        (status = 200, description = "Signed out", body = pb::LogoutRes),
        (status = 400, description = "Bad request")
    )
)]
#[axum::debug_handler]
async fn logout(
    State(state): State<AppState>,
    Json(req): Json<pb::LogoutReq>,
) -> Result<Json<pb::LogoutRes>, ApiError> {
    let account_ref = account_ref(&req.account_ref)?;
    state.identity.logout(&account_ref).map_err(to_http)?;
    Ok(Json(pb::LogoutRes { success: true }))
}

#[utoipa::path(
    get,
    path = "/patients/{identifier}",
    params(("identifier" = String, Path, description = "10-digit patient identifier")),
    responses(
        (status = 200, description = "Patient record", body = pb::PatientRecord),
        (status = 400, description = "Malformed identifier"),
        (status = 404, description = "No patient with this identifier")
    )
)]
/// Look a patient up by identifier
///
/// Used by doctors after typing in or scanning the identifier from the patient's card.
#[axum::debug_handler]
async fn find_patient(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<pb::PatientRecord>, ApiError> {
    let identifier = identifier(&raw)?;
    reply(state.identity.find_patient(&identifier))
}

#[utoipa::path(
    post,
    path = "/patients/{identifier}/entries",
    params(("identifier" = String, Path, description = "10-digit patient identifier")),
    request_body = pb::AddDailyEntryReq,
    responses(
        (status = 201, description = "Entry recorded", body = pb::DailyEntry),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Unknown patient or doctor")
    )
)]
/// Record a daily entry
///
/// The identifier in the path takes precedence over any identifier in the body.
#[axum::debug_handler]
async fn add_daily_entry(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Json(req): Json<pb::AddDailyEntryReq>,
) -> Result<(StatusCode, Json<pb::DailyEntry>), ApiError> {
    let identifier = identifier(&raw)?;
    let doctor_ref = account_ref(&req.doctor_ref)?;
    let details = convert::entry_details(req).map_err(to_http)?;

    let entry = state
        .identity
        .entries()
        .add_entry(&identifier, &doctor_ref, details)
        .map_err(to_http)?;
    Ok((StatusCode::CREATED, Json(entry.into())))
}

#[utoipa::path(
    put,
    path = "/patients/{identifier}/entries/{entry_id}",
    params(
        ("identifier" = String, Path, description = "10-digit patient identifier"),
        ("entry_id" = String, Path, description = "Entry id")
    ),
    request_body = pb::AddDailyEntryReq,
    responses(
        (status = 200, description = "Entry corrected", body = pb::DailyEntry),
        (status = 400, description = "Bad request, or not the recording doctor"),
        (status = 401, description = "Doctor not signed in"),
        (status = 404, description = "Unknown patient, doctor or entry")
    )
)]
/// Correct a daily entry
///
/// Only the doctor who recorded the entry may change it.
#[axum::debug_handler]
async fn update_daily_entry(
    State(state): State<AppState>,
    Path((raw, raw_entry_id)): Path<(String, String)>,
    Json(req): Json<pb::AddDailyEntryReq>,
) -> Result<Json<pb::DailyEntry>, ApiError> {
    let identifier = identifier(&raw)?;
    let entry_id = record_id(&raw_entry_id)?;
    let doctor_ref = account_ref(&req.doctor_ref)?;
    let details = convert::entry_details(req).map_err(to_http)?;

    reply(
        state
            .identity
            .entries()
            .update_entry(&identifier, &entry_id, &doctor_ref, details),
    )
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EntriesQuery {
    /// Only return the latest entry for this visit date (YYYY-MM-DD).
    pub visit_date: Option<String>,
}

#[utoipa::path(
    get,
    path = "/patients/{identifier}/entries",
    params(
        ("identifier" = String, Path, description = "10-digit patient identifier"),
        EntriesQuery
    ),
    responses(
        (status = 200, description = "Entries, newest visit first", body = pb::ListDailyEntriesRes),
        (status = 400, description = "Bad request"),
        (status = 404, description = "No patient with this identifier")
    )
)]
#[axum::debug_handler]
async fn list_daily_entries(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<pb::ListDailyEntriesRes>, ApiError> {
    let identifier = identifier(&raw)?;
    let entries = state.identity.entries();

    let found = match query.visit_date.as_deref().map(str::trim) {
        Some(date) if !date.is_empty() => {
            let date = convert::parse_date(date, "visit_date").map_err(to_http)?;
            entries
                .entry_for_date(&identifier, date)
                .map(|e| e.into_iter().collect())
        }
        _ => entries.entries_for(&identifier),
    }
    .map_err(to_http)?;

    Ok(Json(pb::ListDailyEntriesRes {
        entries: found.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    patch,
    path = "/profile",
    request_body = pb::UpdatePatientProfileReq,
    responses(
        (status = 200, description = "Updated patient record", body = pb::PatientRecord),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Patient not signed in"),
        (status = 404, description = "Unknown account")
    )
)]
/// Edit the signed-in patient's profile
///
/// Empty fields are left unchanged. Email, national ID and identifier cannot be edited.
#[axum::debug_handler]
async fn update_patient_profile(
    State(state): State<AppState>,
    Json(req): Json<pb::UpdatePatientProfileReq>,
) -> Result<Json<pb::PatientRecord>, ApiError> {
    let account_ref = account_ref(&req.account_ref)?;
    let update = convert::profile_update(req).map_err(to_http)?;
    reply(state.identity.update_patient_profile(&account_ref, update))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// The signed-in doctor running the search.
    pub doctor_ref: String,
    /// Name prefix, identifier, phone number or email.
    pub term: String,
}

#[utoipa::path(
    get,
    path = "/patients",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching patients, oldest registration first", body = pb::SearchPatientsRes),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Doctor not signed in")
    )
)]
/// Search patients
#[axum::debug_handler]
async fn search_patients(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<pb::SearchPatientsRes>, ApiError> {
    let doctor_ref = account_ref(&query.doctor_ref)?;
    let found = state
        .identity
        .search_patients(&doctor_ref, &query.term)
        .map_err(to_http)?;

    Ok(Json(pb::SearchPatientsRes {
        patients: found.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/patients/{identifier}/prescriptions",
    params(("identifier" = String, Path, description = "10-digit patient identifier")),
    request_body = pb::AddPrescriptionReq,
    responses(
        (status = 201, description = "Prescription written", body = pb::Prescription),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Doctor not signed in"),
        (status = 404, description = "Unknown patient or doctor")
    )
)]
/// Write a prescription
#[axum::debug_handler]
async fn add_prescription(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Json(req): Json<pb::AddPrescriptionReq>,
) -> Result<(StatusCode, Json<pb::Prescription>), ApiError> {
    let identifier = identifier(&raw)?;
    let doctor_ref = account_ref(&req.doctor_ref)?;
    let details = convert::prescription_details(req).map_err(to_http)?;

    let prescription = state
        .identity
        .entries()
        .add_prescription(&identifier, &doctor_ref, details)
        .map_err(to_http)?;
    Ok((StatusCode::CREATED, Json(prescription.into())))
}

#[utoipa::path(
    put,
    path = "/patients/{identifier}/prescriptions/{prescription_id}",
    params(
        ("identifier" = String, Path, description = "10-digit patient identifier"),
        ("prescription_id" = String, Path, description = "Prescription id")
    ),
    request_body = pb::UpdatePrescriptionReq,
    responses(
        (status = 200, description = "Prescription updated", body = pb::Prescription),
        (status = 400, description = "Bad request, or not the prescribing doctor"),
        (status = 401, description = "Doctor not signed in"),
        (status = 404, description = "Unknown patient, doctor or prescription")
    )
)]
/// Change a prescription's content or status
///
/// The ids in the path take precedence over any in the body.
#[axum::debug_handler]
async fn update_prescription(
    State(state): State<AppState>,
    Path((raw, raw_prescription_id)): Path<(String, String)>,
    Json(req): Json<pb::UpdatePrescriptionReq>,
) -> Result<Json<pb::Prescription>, ApiError> {
    let identifier = identifier(&raw)?;
    let prescription_id = record_id(&raw_prescription_id)?;
    let status = convert::prescription_status(&req.status).map_err(to_http)?;
    let body = req.prescription.unwrap_or_default();
    let doctor_ref = account_ref(&body.doctor_ref)?;
    let details = convert::prescription_details(body).map_err(to_http)?;

    reply(state.identity.entries().update_prescription(
        &identifier,
        &prescription_id,
        &doctor_ref,
        details,
        status,
    ))
}

#[utoipa::path(
    get,
    path = "/patients/{identifier}/prescriptions",
    params(("identifier" = String, Path, description = "10-digit patient identifier")),
    responses(
        (status = 200, description = "Prescriptions, newest first", body = pb::ListPrescriptionsRes),
        (status = 404, description = "No patient with this identifier")
    )
)]
#[axum::debug_handler]
async fn list_prescriptions(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<pb::ListPrescriptionsRes>, ApiError> {
    let identifier = identifier(&raw)?;
    let found = state
        .identity
        .entries()
        .prescriptions_for(&identifier)
        .map_err(to_http)?;

    Ok(Json(pb::ListPrescriptionsRes {
        prescriptions: found.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/patients/{identifier}/appointments",
    params(("identifier" = String, Path, description = "10-digit patient identifier")),
    request_body = pb::AddAppointmentReq,
    responses(
        (status = 201, description = "Appointment scheduled", body = pb::Appointment),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Doctor not signed in"),
        (status = 404, description = "Unknown patient or doctor")
    )
)]
/// Schedule an appointment
#[axum::debug_handler]
async fn add_appointment(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Json(req): Json<pb::AddAppointmentReq>,
) -> Result<(StatusCode, Json<pb::Appointment>), ApiError> {
    let identifier = identifier(&raw)?;
    let doctor_ref = account_ref(&req.doctor_ref)?;
    let details = convert::appointment_details(req).map_err(to_http)?;

    let appointment = state
        .identity
        .entries()
        .add_appointment(&identifier, &doctor_ref, details)
        .map_err(to_http)?;
    Ok((StatusCode::CREATED, Json(appointment.into())))
}

#[utoipa::path(
    patch,
    path = "/patients/{identifier}/appointments/{appointment_id}",
    params(
        ("identifier" = String, Path, description = "10-digit patient identifier"),
        ("appointment_id" = String, Path, description = "Appointment id")
    ),
    request_body = pb::UpdateAppointmentStatusReq,
    responses(
        (status = 200, description = "Status changed", body = pb::Appointment),
        (status = 400, description = "Bad request, or the appointment is already closed"),
        (status = 401, description = "Doctor not signed in"),
        (status = 404, description = "Unknown patient, doctor or appointment")
    )
)]
/// Complete or cancel an appointment
#[axum::debug_handler]
async fn update_appointment_status(
    State(state): State<AppState>,
    Path((raw, raw_appointment_id)): Path<(String, String)>,
    Json(req): Json<pb::UpdateAppointmentStatusReq>,
) -> Result<Json<pb::Appointment>, ApiError> {
    let identifier = identifier(&raw)?;
    let appointment_id = record_id(&raw_appointment_id)?;
    let doctor_ref = account_ref(&req.doctor_ref)?;
    let status = convert::appointment_status(&req.status).map_err(to_http)?;

    reply(state.identity.entries().update_appointment_status(
        &identifier,
        &appointment_id,
        &doctor_ref,
        status,
    ))
}

#[utoipa::path(
    get,
    path = "/patients/{identifier}/appointments",
    params(("identifier" = String, Path, description = "10-digit patient identifier")),
    responses(
        (status = 200, description = "Appointments, latest slot first", body = pb::ListAppointmentsRes),
        (status = 404, description = "No patient with this identifier")
    )
)]
#[axum::debug_handler]
async fn list_appointments(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<pb::ListAppointmentsRes>, ApiError> {
    let identifier = identifier(&raw)?;
    let found = state
        .identity
        .entries()
        .appointments_for(&identifier)
        .map_err(to_http)?;

    Ok(Json(pb::ListAppointmentsRes {
        appointments: found.into_iter().map(Into::into).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use thejas_core::{CoreConfig, RandomSuffix, Stores};
    use tower::ServiceExt;

    fn app() -> Router {
        let identity = IdentityService::new(
            Arc::new(CoreConfig::default()),
            Stores::in_memory(),
            Arc::new(RandomSuffix),
        );
        router(AppState::new(Arc::new(identity)))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(b) => Body::from(b.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    fn asha() -> Value {
        json!({
            "display_name": "Asha Rao",
            "national_id": "490012345678",
            "email": "asha@example.com",
            "password": "correct horse",
            "date_of_birth": "1990-01-15"
        })
    }

    fn meera() -> Value {
        json!({
            "display_name": "Dr Meera Iyer",
            "national_id": "555566667777",
            "email": "meera@example.com",
            "password": "stethoscope",
            "licence_id": "MCI-1234",
            "phone": "9000000001"
        })
    }

    async fn doctor_login(app: &Router) {
        let (status, _) = send(
            app,
            "POST",
            "/login",
            Some(json!({"role": "doctor", "login_input": "meera@example.com", "password": "stethoscope"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_register_and_find_patient() {
        let app = app();
        let (status, registered) = send(&app, "POST", "/patients", Some(asha())).await;
        assert_eq!(status, StatusCode::CREATED);
        let identifier = registered["identifier"].as_str().unwrap().to_string();
        assert!(identifier.starts_with("345678"));

        let (status, record) = send(&app, "GET", &format!("/patients/{identifier}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["display_name"], "Asha Rao");
        assert_eq!(record["date_of_birth"], "1990-01-15");
        assert_eq!(record["last_visit"], "");

        let (status, _) = send(&app, "POST", "/patients", Some(asha())).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(&app, "GET", "/patients/1111119999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "GET", "/patients/12ab", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_statuses() {
        let app = app();
        send(&app, "POST", "/patients", Some(asha())).await;
        send(&app, "POST", "/doctors", Some(meera())).await;

        let (status, body) = send(
            &app,
            "POST",
            "/login",
            Some(json!({"role": "doctor", "login_input": "MCI-1234", "password": "stethoscope"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "doctor");
        assert_eq!(body["email"], "meera@example.com");

        let (status, body) = send(
            &app,
            "POST",
            "/login",
            Some(json!({"role": "patient", "login_input": "meera@example.com", "password": "stethoscope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Invalid credentials.");

        let (status, _) = send(
            &app,
            "POST",
            "/login",
            Some(json!({"role": "patient", "login_input": "asha@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_entries_flow() {
        let app = app();
        let (_, patient) = send(&app, "POST", "/patients", Some(asha())).await;
        let (_, doctor) = send(&app, "POST", "/doctors", Some(meera())).await;
        let identifier = patient["identifier"].as_str().unwrap();
        let uri = format!("/patients/{identifier}/entries");
        let entry_body = json!({
            "doctor_ref": doctor["account_ref"],
            "visit_date": "2025-03-02",
            "symptoms": "Fever",
            "diagnosis": "Viral fever"
        });

        let (status, _) = send(&app, "POST", &uri, Some(entry_body)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        doctor_login(&app).await;

        let (status, entry) = send(
            &app,
            "POST",
            &uri,
            Some(json!({
                "identifier": "9999999999",
                "doctor_ref": doctor["account_ref"],
                "visit_date": "2025-03-02",
                "symptoms": "Fever, headache",
                "diagnosis": "Viral fever",
                "vitals": {"temperature": "38.5"}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(entry["patient_identifier"], identifier);
        assert_eq!(entry["vitals"]["temperature"], "38.5");
        assert_eq!(entry["status"], "completed");

        let (status, list) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["entries"].as_array().unwrap().len(), 1);

        let (status, list) = send(&app, "GET", &format!("{uri}?visit_date=2025-03-01"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(list["entries"].as_array().unwrap().is_empty());

        let (status, _) = send(
            &app,
            "POST",
            &uri,
            Some(json!({
                "doctor_ref": doctor["account_ref"],
                "visit_date": "2025-03-02",
                "symptoms": "Fever",
                "diagnosis": "Viral fever",
                "next_visit": "2025-03-01"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_entry_route() {
        let app = app();
        let (_, patient) = send(&app, "POST", "/patients", Some(asha())).await;
        let (_, doctor) = send(&app, "POST", "/doctors", Some(meera())).await;
        doctor_login(&app).await;
        let identifier = patient["identifier"].as_str().unwrap();
        let body = |diagnosis: &str| {
            json!({
                "doctor_ref": doctor["account_ref"],
                "visit_date": "2025-03-02",
                "symptoms": "Fever",
                "diagnosis": diagnosis
            })
        };

        let (_, entry) = send(
            &app,
            "POST",
            &format!("/patients/{identifier}/entries"),
            Some(body("Viral fever")),
        )
        .await;
        let entry_id = entry["entry_id"].as_str().unwrap();

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/patients/{identifier}/entries/{entry_id}"),
            Some(body("Dengue")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["entry_id"], entry["entry_id"]);
        assert_eq!(updated["diagnosis"], "Dengue");

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/patients/{identifier}/entries/garbage"),
            Some(body("Dengue")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_profile_and_search_routes() {
        let app = app();
        let (_, patient) = send(&app, "POST", "/patients", Some(asha())).await;
        let (_, doctor) = send(&app, "POST", "/doctors", Some(meera())).await;
        let patient_ref = patient["account_ref"].as_str().unwrap();
        let doctor_ref = doctor["account_ref"].as_str().unwrap();

        let edit = json!({"account_ref": patient_ref, "phone": "9123456780"});
        let (status, _) = send(&app, "PATCH", "/profile", Some(edit.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        send(
            &app,
            "POST",
            "/login",
            Some(json!({"role": "patient", "login_input": "asha@example.com", "password": "correct horse"})),
        )
        .await;
        let (status, record) = send(&app, "PATCH", "/profile", Some(edit)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["phone"], "9123456780");
        assert_eq!(record["display_name"], "Asha Rao");

        let search_uri = format!("/patients?doctor_ref={doctor_ref}&term=asha");
        let (status, _) = send(&app, "GET", &search_uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        doctor_login(&app).await;
        let (status, found) = send(&app, "GET", &search_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["patients"][0]["identifier"], patient["identifier"]);

        let (status, found) = send(&app, "GET", &format!("/patients?doctor_ref={doctor_ref}&term=zed"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(found["patients"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prescription_and_appointment_routes() {
        let app = app();
        let (_, patient) = send(&app, "POST", "/patients", Some(asha())).await;
        let (_, doctor) = send(&app, "POST", "/doctors", Some(meera())).await;
        doctor_login(&app).await;
        let identifier = patient["identifier"].as_str().unwrap();

        let prescription = json!({
            "doctor_ref": doctor["account_ref"],
            "date": "2025-09-01",
            "medications": ["Metformin 500mg BD"]
        });
        let (status, written) = send(
            &app,
            "POST",
            &format!("/patients/{identifier}/prescriptions"),
            Some(prescription.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(written["status"], "active");

        let (status, _) = send(
            &app,
            "POST",
            &format!("/patients/{identifier}/prescriptions"),
            Some(json!({"doctor_ref": doctor["account_ref"], "date": "2025-09-01", "medications": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let prescription_id = written["prescription_id"].as_str().unwrap();
        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/patients/{identifier}/prescriptions/{prescription_id}"),
            Some(json!({"status": "discontinued", "prescription": prescription})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "discontinued");

        let (_, list) = send(&app, "GET", &format!("/patients/{identifier}/prescriptions"), None).await;
        assert_eq!(list["prescriptions"].as_array().unwrap().len(), 1);

        let (status, booked) = send(
            &app,
            "POST",
            &format!("/patients/{identifier}/appointments"),
            Some(json!({
                "doctor_ref": doctor["account_ref"],
                "scheduled_for": "2025-10-05T10:30",
                "clinic": "City Clinic"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(booked["status"], "scheduled");

        let appointment_id = booked["appointment_id"].as_str().unwrap();
        let uri = format!("/patients/{identifier}/appointments/{appointment_id}");
        let (status, done) = send(
            &app,
            "PATCH",
            &uri,
            Some(json!({"doctor_ref": doctor["account_ref"], "status": "completed"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["status"], "completed");

        let (status, _) = send(
            &app,
            "PATCH",
            &uri,
            Some(json!({"doctor_ref": doctor["account_ref"], "status": "scheduled"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, list) = send(&app, "GET", &format!("/patients/{identifier}/appointments"), None).await;
        assert_eq!(list["appointments"][0]["status"], "completed");
    }
}
