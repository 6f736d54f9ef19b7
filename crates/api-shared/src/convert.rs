//! Conversions between wire messages and core types.
//!
//! Incoming messages are validated here, so both API surfaces reject malformed input the same
//! way. Empty strings stand for absent optional fields.

use crate::pb;
use chrono::{NaiveDate, NaiveDateTime};
use thejas_core::{
    AccountSummary, Appointment, AppointmentDetails, AppointmentStatus, DailyEntry,
    DoctorRegistration, EmailAddress, EntryDetails, IdentityError, IdentityResult, LoginRequest,
    NationalId, NonEmptyText, Password, PatientProfileUpdate, PatientRegistration, Prescription,
    PrescriptionDetails, PrescriptionStatus, RegisteredDoctor, RegisteredPatient, Role, Secondary,
    Vitals,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const SLOT_FORMAT: &str = "%Y-%m-%dT%H:%M";
const SLOT_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(value: &str, field: &str) -> IdentityResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| IdentityError::Validation(format!("{field} must be a YYYY-MM-DD date")))
}

/// Parses an appointment slot, `YYYY-MM-DDTHH:MM` with optional seconds; a space may stand
/// in for the `T`.
pub fn parse_slot(value: &str, field: &str) -> IdentityResult<NaiveDateTime> {
    let value = value.trim();
    SLOT_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| IdentityError::Validation(format!("{field} must be a YYYY-MM-DDTHH:MM time")))
}

fn optional_date(value: &str, field: &str) -> IdentityResult<Option<NaiveDate>> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_date(value, field).map(Some)
    }
}

fn optional_text(value: String) -> IdentityResult<Option<NonEmptyText>> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(NonEmptyText::new(value)?))
    }
}

fn optional_string(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn date_or_empty(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn text_or_empty(text: Option<NonEmptyText>) -> String {
    text.map(|t| t.to_string()).unwrap_or_default()
}

pub fn patient_registration(req: pb::RegisterPatientReq) -> IdentityResult<PatientRegistration> {
    Ok(PatientRegistration {
        display_name: NonEmptyText::new(req.display_name)?,
        national_id: NationalId::parse(req.national_id)?,
        email: EmailAddress::parse(req.email)?,
        password: Password::new(req.password)?,
        phone: optional_text(req.phone)?,
        date_of_birth: optional_date(&req.date_of_birth, "date_of_birth")?,
        gender: optional_text(req.gender)?,
    })
}

pub fn doctor_registration(req: pb::RegisterDoctorReq) -> IdentityResult<DoctorRegistration> {
    Ok(DoctorRegistration {
        display_name: NonEmptyText::new(req.display_name)?,
        national_id: NationalId::parse(req.national_id)?,
        email: EmailAddress::parse(req.email)?,
        password: Password::new(req.password)?,
        licence_id: NonEmptyText::new(req.licence_id)?,
        phone: optional_text(req.phone)?,
        date_of_birth: optional_date(&req.date_of_birth, "date_of_birth")?,
    })
}

/// Exactly one of `password` and `national_id` must be set.
pub fn login_request(req: pb::LoginReq) -> IdentityResult<LoginRequest> {
    let role: Role = req.role.parse()?;

    let secondary = match (req.password.is_empty(), req.national_id.trim().is_empty()) {
        (false, true) => Secondary::Password(Password::new(req.password)?),
        (true, false) => Secondary::NationalId(NationalId::parse(req.national_id)?),
        (false, false) => {
            return Err(IdentityError::Validation(
                "supply either a password or a national ID, not both".into(),
            ))
        }
        (true, true) => {
            return Err(IdentityError::Validation(
                "a password or national ID is required".into(),
            ))
        }
    };

    Ok(LoginRequest {
        role,
        login_input: req.login_input,
        secondary,
    })
}

pub fn entry_details(req: pb::AddDailyEntryReq) -> IdentityResult<EntryDetails> {
    let vitals = req.vitals.unwrap_or_default();

    Ok(EntryDetails {
        visit_date: parse_date(&req.visit_date, "visit_date")?,
        symptoms: NonEmptyText::new(req.symptoms)?,
        diagnosis: NonEmptyText::new(req.diagnosis)?,
        prescription: optional_string(req.prescription),
        tests_recommended: optional_string(req.tests_recommended),
        notes: optional_string(req.notes),
        next_visit: optional_date(&req.next_visit, "next_visit")?,
        vitals: Vitals {
            blood_pressure: optional_string(vitals.blood_pressure),
            temperature: optional_string(vitals.temperature),
            heart_rate: optional_string(vitals.heart_rate),
            oxygen_level: optional_string(vitals.oxygen_level),
            weight: optional_string(vitals.weight),
            height: optional_string(vitals.height),
        },
    })
}

/// Empty fields are left unchanged.
pub fn profile_update(req: pb::UpdatePatientProfileReq) -> IdentityResult<PatientProfileUpdate> {
    Ok(PatientProfileUpdate {
        display_name: optional_text(req.display_name)?,
        phone: optional_text(req.phone)?,
        date_of_birth: optional_date(&req.date_of_birth, "date_of_birth")?,
        gender: optional_text(req.gender)?,
    })
}

/// Blank medication lines are dropped; at least one must remain.
pub fn prescription_details(req: pb::AddPrescriptionReq) -> IdentityResult<PrescriptionDetails> {
    let medications = req
        .medications
        .into_iter()
        .filter_map(|line| optional_text(line).transpose())
        .collect::<IdentityResult<Vec<_>>>()?;

    Ok(PrescriptionDetails {
        date: parse_date(&req.date, "date")?,
        medications,
        notes: optional_string(req.notes),
        next_visit: optional_date(&req.next_visit, "next_visit")?,
    })
}

/// An empty status means `active`.
pub fn prescription_status(value: &str) -> IdentityResult<PrescriptionStatus> {
    if value.trim().is_empty() {
        Ok(PrescriptionStatus::default())
    } else {
        value.parse()
    }
}

pub fn appointment_details(req: pb::AddAppointmentReq) -> IdentityResult<AppointmentDetails> {
    Ok(AppointmentDetails {
        scheduled_for: parse_slot(&req.scheduled_for, "scheduled_for")?,
        clinic: optional_string(req.clinic),
        reason: optional_string(req.reason),
    })
}

pub fn appointment_status(value: &str) -> IdentityResult<AppointmentStatus> {
    value.parse()
}

impl From<RegisteredPatient> for pb::RegisterPatientRes {
    fn from(registered: RegisteredPatient) -> Self {
        Self {
            account_ref: registered.account_ref.to_string(),
            identifier: registered.identifier.to_string(),
        }
    }
}

impl From<RegisteredDoctor> for pb::RegisterDoctorRes {
    fn from(registered: RegisteredDoctor) -> Self {
        Self {
            account_ref: registered.account_ref.to_string(),
        }
    }
}

impl From<AccountSummary> for pb::LoginRes {
    fn from(summary: AccountSummary) -> Self {
        Self {
            account_ref: summary.account_ref.to_string(),
            role: summary.role.to_string(),
            display_name: summary.display_name.to_string(),
            email: summary.email.to_string(),
            identifier: summary
                .identifier
                .map(|i| i.to_string())
                .unwrap_or_default(),
        }
    }
}

impl From<thejas_core::PatientRecord> for pb::PatientRecord {
    fn from(record: thejas_core::PatientRecord) -> Self {
        Self {
            account_ref: record.account_ref.to_string(),
            identifier: record.identifier.to_string(),
            display_name: record.display_name.to_string(),
            email: record.email.to_string(),
            phone: text_or_empty(record.phone),
            date_of_birth: date_or_empty(record.date_of_birth),
            gender: text_or_empty(record.gender),
            last_visit: date_or_empty(record.last_visit),
            registered_at: record.registered_at.to_rfc3339(),
        }
    }
}

impl From<DailyEntry> for pb::DailyEntry {
    fn from(entry: DailyEntry) -> Self {
        let details = entry.details;
        let vitals = details.vitals;

        Self {
            entry_id: entry.entry_id.to_string(),
            patient_identifier: entry.patient_identifier.to_string(),
            patient_name: entry.patient_name.to_string(),
            doctor_ref: entry.doctor_ref.to_string(),
            doctor_name: entry.doctor_name.to_string(),
            visit_date: details.visit_date.format(DATE_FORMAT).to_string(),
            symptoms: details.symptoms.to_string(),
            diagnosis: details.diagnosis.to_string(),
            prescription: details.prescription.unwrap_or_default(),
            tests_recommended: details.tests_recommended.unwrap_or_default(),
            notes: details.notes.unwrap_or_default(),
            next_visit: date_or_empty(details.next_visit),
            vitals: Some(pb::Vitals {
                blood_pressure: vitals.blood_pressure.unwrap_or_default(),
                temperature: vitals.temperature.unwrap_or_default(),
                heart_rate: vitals.heart_rate.unwrap_or_default(),
                oxygen_level: vitals.oxygen_level.unwrap_or_default(),
                weight: vitals.weight.unwrap_or_default(),
                height: vitals.height.unwrap_or_default(),
            }),
            status: "completed".into(),
            created_at: entry.created_at.to_rfc3339(),
            updated_at: entry.updated_at.to_rfc3339(),
        }
    }
}

impl From<Prescription> for pb::Prescription {
    fn from(prescription: Prescription) -> Self {
        let details = prescription.details;

        Self {
            prescription_id: prescription.prescription_id.to_string(),
            patient_identifier: prescription.patient_identifier.to_string(),
            doctor_ref: prescription.doctor_ref.to_string(),
            doctor_name: prescription.doctor_name.to_string(),
            date: details.date.format(DATE_FORMAT).to_string(),
            medications: details.medications.into_iter().map(|m| m.to_string()).collect(),
            notes: details.notes.unwrap_or_default(),
            next_visit: date_or_empty(details.next_visit),
            status: prescription.status.to_string(),
            created_at: prescription.created_at.to_rfc3339(),
            updated_at: prescription.updated_at.to_rfc3339(),
        }
    }
}

impl From<Appointment> for pb::Appointment {
    fn from(appointment: Appointment) -> Self {
        let details = appointment.details;

        Self {
            appointment_id: appointment.appointment_id.to_string(),
            patient_identifier: appointment.patient_identifier.to_string(),
            doctor_ref: appointment.doctor_ref.to_string(),
            doctor_name: appointment.doctor_name.to_string(),
            scheduled_for: details.scheduled_for.format(SLOT_FORMAT).to_string(),
            clinic: details.clinic.unwrap_or_default(),
            reason: details.reason.unwrap_or_default(),
            status: appointment.status.to_string(),
            created_at: appointment.created_at.to_rfc3339(),
            updated_at: appointment.updated_at.to_rfc3339(),
        }
    }
}
