//! Prescriptions and appointments.
//!
//! Both are per-patient records written from the doctor dashboard and read back on either
//! dashboard. They use the same record stores, session check and patient lookup as daily
//! entries.
//!
//! A prescription can be corrected or closed by the doctor who wrote it. An appointment is
//! booked by a signed-in doctor and moves from `scheduled` to `completed` or `cancelled`
//! exactly once.

use crate::entries::{check_next_visit, DailyEntryService};
use crate::records::StoredRecord;
use crate::{IdentityError, IdentityResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thejas_types::{NonEmptyText, PatientIdentifier};
use thejas_uuid::{AccountRef, EntryId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrescriptionStatus {
    #[default]
    Active,
    Completed,
    Discontinued,
}

impl PrescriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Discontinued => "discontinued",
        }
    }
}

impl fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrescriptionStatus {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "discontinued" => Ok(Self::Discontinued),
            other => Err(IdentityError::Validation(format!(
                "unknown prescription status '{other}'"
            ))),
        }
    }
}

/// What the doctor writes on a prescription.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionDetails {
    pub date: NaiveDate,
    /// One line per medicine, e.g. `"Metformin 500mg BD"`.
    pub medications: Vec<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_visit: Option<NaiveDate>,
}

impl PrescriptionDetails {
    fn validate(&self) -> IdentityResult<()> {
        if self.medications.is_empty() {
            return Err(IdentityError::Validation(
                "a prescription needs at least one medication".into(),
            ));
        }
        check_next_visit(self.date, self.next_visit)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub prescription_id: EntryId,
    pub patient_ref: AccountRef,
    pub patient_identifier: PatientIdentifier,
    pub doctor_ref: AccountRef,
    pub doctor_name: NonEmptyText,
    #[serde(flatten)]
    pub details: PrescriptionDetails,
    #[serde(default)]
    pub status: PrescriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord for Prescription {
    fn record_id(&self) -> &EntryId {
        &self.prescription_id
    }

    fn owner(&self) -> &AccountRef {
        &self.patient_ref
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Ok(Self::Scheduled),
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(IdentityError::Validation(format!(
                "unknown appointment status '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentDetails {
    /// Local clinic time.
    pub scheduled_for: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: EntryId,
    pub patient_ref: AccountRef,
    pub patient_identifier: PatientIdentifier,
    pub doctor_ref: AccountRef,
    pub doctor_name: NonEmptyText,
    #[serde(flatten)]
    pub details: AppointmentDetails,
    #[serde(default)]
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord for Appointment {
    fn record_id(&self) -> &EntryId {
        &self.appointment_id
    }

    fn owner(&self) -> &AccountRef {
        &self.patient_ref
    }
}

impl DailyEntryService {
    /// Writes a new, active prescription for the patient behind `identifier`.
    ///
    /// # Errors
    ///
    /// As for [`DailyEntryService::add_entry`]; a prescription without medications is
    /// invalid input.
    pub fn add_prescription(
        &self,
        identifier: &PatientIdentifier,
        doctor_ref: &AccountRef,
        details: PrescriptionDetails,
    ) -> IdentityResult<Prescription> {
        details.validate()?;

        let doctor = self.signed_in_doctor(doctor_ref)?;
        let patient_ref = self.patient_ref(identifier)?;
        let patient_identifier = identifier.clone();
        let owner = patient_ref.clone();

        let prescription = self.prescriptions.append(
            &patient_ref,
            Box::new(move |prescription_id| {
                let created_at = prescription_id.timestamp();
                Prescription {
                    prescription_id,
                    patient_ref: owner,
                    patient_identifier,
                    doctor_ref: doctor.account_ref,
                    doctor_name: doctor.display_name,
                    details,
                    status: PrescriptionStatus::Active,
                    created_at,
                    updated_at: created_at,
                }
            }),
        )?;

        tracing::info!(
            prescription_id = %prescription.prescription_id,
            identifier = %identifier,
            "prescription added"
        );
        Ok(prescription)
    }

    /// Replaces the content and status of a prescription. Only its author may change it.
    pub fn update_prescription(
        &self,
        identifier: &PatientIdentifier,
        prescription_id: &EntryId,
        doctor_ref: &AccountRef,
        details: PrescriptionDetails,
        status: PrescriptionStatus,
    ) -> IdentityResult<Prescription> {
        details.validate()?;

        let doctor = self.signed_in_doctor(doctor_ref)?;
        let patient_ref = self.patient_ref(identifier)?;
        let mut prescription = self
            .prescriptions
            .get(&patient_ref, prescription_id)?
            .ok_or_else(|| IdentityError::RecordNotFound(prescription_id.to_string()))?;
        if prescription.doctor_ref != doctor.account_ref {
            return Err(IdentityError::Validation(
                "only the prescribing doctor can change a prescription".into(),
            ));
        }

        prescription.details = details;
        prescription.status = status;
        prescription.updated_at = Utc::now();
        self.prescriptions.update(&prescription)?;

        tracing::info!(
            prescription_id = %prescription.prescription_id,
            status = %status,
            "prescription updated"
        );
        Ok(prescription)
    }

    /// The patient's prescriptions, newest prescription date first.
    pub fn prescriptions_for(&self, identifier: &PatientIdentifier) -> IdentityResult<Vec<Prescription>> {
        let patient_ref = self.patient_ref(identifier)?;
        let mut prescriptions = self.prescriptions.list(&patient_ref)?;
        prescriptions.sort_by(|a, b| {
            b.details
                .date
                .cmp(&a.details.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(prescriptions)
    }

    /// Books an appointment with the signed-in doctor.
    pub fn add_appointment(
        &self,
        identifier: &PatientIdentifier,
        doctor_ref: &AccountRef,
        details: AppointmentDetails,
    ) -> IdentityResult<Appointment> {
        let doctor = self.signed_in_doctor(doctor_ref)?;
        let patient_ref = self.patient_ref(identifier)?;
        let patient_identifier = identifier.clone();
        let owner = patient_ref.clone();

        let appointment = self.appointments.append(
            &patient_ref,
            Box::new(move |appointment_id| {
                let created_at = appointment_id.timestamp();
                Appointment {
                    appointment_id,
                    patient_ref: owner,
                    patient_identifier,
                    doctor_ref: doctor.account_ref,
                    doctor_name: doctor.display_name,
                    details,
                    status: AppointmentStatus::Scheduled,
                    created_at,
                    updated_at: created_at,
                }
            }),
        )?;

        tracing::info!(
            appointment_id = %appointment.appointment_id,
            identifier = %identifier,
            "appointment scheduled"
        );
        Ok(appointment)
    }

    /// Moves a scheduled appointment to `status`.
    ///
    /// # Errors
    ///
    /// [`IdentityError::Validation`] if the appointment is already completed or cancelled and
    /// `status` differs, or if `status` is `scheduled`. Repeating the current final status is
    /// a no-op.
    pub fn update_appointment_status(
        &self,
        identifier: &PatientIdentifier,
        appointment_id: &EntryId,
        doctor_ref: &AccountRef,
        status: AppointmentStatus,
    ) -> IdentityResult<Appointment> {
        self.signed_in_doctor(doctor_ref)?;
        let patient_ref = self.patient_ref(identifier)?;
        let mut appointment = self
            .appointments
            .get(&patient_ref, appointment_id)?
            .ok_or_else(|| IdentityError::RecordNotFound(appointment_id.to_string()))?;

        match (appointment.status, status) {
            (current, requested) if current == requested && current != AppointmentStatus::Scheduled => {
                return Ok(appointment);
            }
            (AppointmentStatus::Scheduled, AppointmentStatus::Completed | AppointmentStatus::Cancelled) => {}
            (current, requested) => {
                return Err(IdentityError::Validation(format!(
                    "appointment cannot move from {current} to {requested}"
                )));
            }
        }

        appointment.status = status;
        appointment.updated_at = Utc::now();
        self.appointments.update(&appointment)?;

        tracing::info!(
            appointment_id = %appointment.appointment_id,
            status = %status,
            "appointment status updated"
        );
        Ok(appointment)
    }

    /// The patient's appointments, latest slot first.
    pub fn appointments_for(&self, identifier: &PatientIdentifier) -> IdentityResult<Vec<Appointment>> {
        let patient_ref = self.patient_ref(identifier)?;
        let mut appointments = self.appointments.list(&patient_ref)?;
        appointments.sort_by(|a, b| {
            b.details
                .scheduled_for
                .cmp(&a.details.scheduled_for)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(appointments)
    }
}
