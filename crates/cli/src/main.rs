use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use thejas_core::{
    data_dir_from_env_value, AccountRef, AppointmentDetails, AppointmentStatus, CoreConfig,
    DoctorRegistration, EmailAddress, EntryDetails, EntryId, IdentityError, IdentityResult,
    IdentityService, LoginRequest, NationalId, NonEmptyText, Password, PatientIdentifier,
    PatientProfileUpdate, PatientRegistration, PrescriptionDetails, RandomSuffix, Role,
    Secondary, Stores, Vitals,
};

#[derive(Parser)]
#[command(name = "thejas")]
#[command(about = "Thejas patient identity and daily records CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a patient and print their identifier
    RegisterPatient {
        /// Full name
        name: String,
        /// National ID (at least 6 digits)
        national_id: String,
        /// Login email
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        date_of_birth: Option<NaiveDate>,
        #[arg(long)]
        gender: Option<String>,
    },
    /// Register a doctor
    RegisterDoctor {
        name: String,
        national_id: String,
        email: String,
        /// Medical licence ID
        licence_id: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        date_of_birth: Option<NaiveDate>,
    },
    /// Check a login; prints the account summary
    Login {
        /// "patient" or "doctor"
        role: String,
        /// Email, patient identifier, or doctor phone / licence ID
        login_input: String,
        #[arg(long, conflicts_with = "national_id", required_unless_present = "national_id")]
        password: Option<String>,
        #[arg(long)]
        national_id: Option<String>,
    },
    /// Show a patient's record
    FindPatient {
        /// 10-digit patient identifier
        identifier: String,
    },
    /// Is this national ID already registered to a patient?
    CheckNationalId { national_id: String },
    /// Update your own patient profile (signs in with identifier and national ID)
    UpdateProfile {
        identifier: String,
        #[arg(long)]
        national_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        date_of_birth: Option<NaiveDate>,
        #[arg(long)]
        gender: Option<String>,
    },
    /// Search patients by name, identifier, phone or email
    SearchPatients {
        /// Doctor email, phone or licence ID
        doctor: String,
        term: String,
        #[arg(long)]
        password: String,
    },
    /// Record a daily entry for a patient
    AddEntry {
        identifier: String,
        /// Doctor email, phone or licence ID
        doctor: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        visit_date: NaiveDate,
        #[arg(long)]
        symptoms: String,
        #[arg(long)]
        diagnosis: String,
        #[arg(long)]
        prescription: Option<String>,
        #[arg(long)]
        tests_recommended: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        next_visit: Option<NaiveDate>,
        #[arg(long)]
        blood_pressure: Option<String>,
        #[arg(long)]
        temperature: Option<String>,
    },
    /// List a patient's daily entries, newest first
    ListEntries {
        identifier: String,
        /// Only the latest entry for this date
        #[arg(long)]
        visit_date: Option<NaiveDate>,
    },
    /// Write a prescription
    AddPrescription {
        identifier: String,
        /// Doctor email, phone or licence ID
        doctor: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        date: NaiveDate,
        /// One medicine per flag, e.g. --medication "Metformin 500mg BD"
        #[arg(long = "medication", required = true)]
        medications: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        next_visit: Option<NaiveDate>,
    },
    /// List a patient's prescriptions, newest first
    ListPrescriptions { identifier: String },
    /// Schedule an appointment
    AddAppointment {
        identifier: String,
        /// Doctor email, phone or licence ID
        doctor: String,
        #[arg(long)]
        password: String,
        /// Slot in clinic time (YYYY-MM-DDTHH:MM)
        #[arg(long, value_parser = parse_slot)]
        at: NaiveDateTime,
        #[arg(long)]
        clinic: Option<String>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Mark an appointment completed or cancelled
    SetAppointmentStatus {
        identifier: String,
        appointment_id: String,
        /// Doctor email, phone or licence ID
        doctor: String,
        #[arg(long)]
        password: String,
        /// "completed" or "cancelled"
        status: String,
    },
    /// List a patient's appointments, latest first
    ListAppointments { identifier: String },
}

fn parse_slot(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .map_err(|_| format!("'{value}' is not a YYYY-MM-DDTHH:MM time"))
}

fn optional_text(value: Option<String>) -> IdentityResult<Option<NonEmptyText>> {
    Ok(value.map(NonEmptyText::new).transpose()?)
}

/// Sessions live in this process only, so writes sign in, act and sign out in one command.
fn as_doctor<T>(
    service: &IdentityService,
    login_input: String,
    password: String,
    act: impl FnOnce(&AccountRef) -> IdentityResult<T>,
) -> IdentityResult<T> {
    let summary = service.login(LoginRequest {
        role: Role::Doctor,
        login_input,
        secondary: Secondary::Password(Password::new(password)?),
    })?;
    let result = act(&summary.account_ref);
    service.logout(&summary.account_ref)?;
    result
}

fn identity_service() -> IdentityResult<IdentityService> {
    let data_dir = data_dir_from_env_value(std::env::var("THEJAS_DATA_DIR").ok(), false)?;
    let cfg = Arc::new(CoreConfig::new(data_dir));
    let stores = Stores::file_backed(&cfg);
    Ok(IdentityService::new(cfg, stores, Arc::new(RandomSuffix)))
}

fn run(command: Commands) -> IdentityResult<()> {
    let service = identity_service()?;

    match command {
        Commands::RegisterPatient {
            name,
            national_id,
            email,
            password,
            phone,
            date_of_birth,
            gender,
        } => {
            let registered = service.register_patient(PatientRegistration {
                display_name: NonEmptyText::new(name)?,
                national_id: NationalId::parse(national_id)?,
                email: EmailAddress::parse(email)?,
                password: Password::new(password)?,
                phone: optional_text(phone)?,
                date_of_birth,
                gender: optional_text(gender)?,
            })?;
            println!(
                "Registered patient {} with identifier {}",
                registered.account_ref, registered.identifier
            );
        }
        Commands::RegisterDoctor {
            name,
            national_id,
            email,
            licence_id,
            password,
            phone,
            date_of_birth,
        } => {
            let registered = service.register_doctor(DoctorRegistration {
                display_name: NonEmptyText::new(name)?,
                national_id: NationalId::parse(national_id)?,
                email: EmailAddress::parse(email)?,
                password: Password::new(password)?,
                licence_id: NonEmptyText::new(licence_id)?,
                phone: optional_text(phone)?,
                date_of_birth,
            })?;
            println!("Registered doctor {}", registered.account_ref);
        }
        Commands::Login {
            role,
            login_input,
            password,
            national_id,
        } => {
            let secondary = match (password, national_id) {
                (Some(password), _) => Secondary::Password(Password::new(password)?),
                (None, Some(national_id)) => Secondary::NationalId(NationalId::parse(national_id)?),
                (None, None) => {
                    return Err(IdentityError::Validation(
                        "a password or national ID is required".into(),
                    ))
                }
            };
            let summary = service.login(LoginRequest {
                role: role.parse::<Role>()?,
                login_input,
                secondary,
            })?;
            println!(
                "Signed in {} ({}) as {}",
                summary.display_name, summary.email, summary.role
            );
            if let Some(identifier) = summary.identifier {
                println!("Identifier: {}", identifier);
            }
            service.logout(&summary.account_ref)?;
        }
        Commands::FindPatient { identifier } => {
            let record = service.find_patient(&PatientIdentifier::parse(identifier)?)?;
            println!("Identifier: {}", record.identifier);
            println!("Name: {}", record.display_name);
            println!("Email: {}", record.email);
            if let Some(phone) = record.phone {
                println!("Phone: {}", phone);
            }
            if let Some(dob) = record.date_of_birth {
                println!("Date of birth: {}", dob);
            }
            match record.last_visit {
                Some(date) => println!("Last visit: {}", date),
                None => println!("Last visit: never"),
            }
        }
        Commands::CheckNationalId { national_id } => {
            if service.national_id_registered(&NationalId::parse(national_id)?)? {
                println!("Registered");
            } else {
                println!("Not registered");
            }
        }
        Commands::UpdateProfile {
            identifier,
            national_id,
            name,
            phone,
            date_of_birth,
            gender,
        } => {
            let summary = service.login(LoginRequest {
                role: Role::Patient,
                login_input: identifier,
                secondary: Secondary::NationalId(NationalId::parse(national_id)?),
            })?;
            let updated = service.update_patient_profile(
                &summary.account_ref,
                PatientProfileUpdate {
                    display_name: optional_text(name)?,
                    phone: optional_text(phone)?,
                    date_of_birth,
                    gender: optional_text(gender)?,
                },
            );
            service.logout(&summary.account_ref)?;
            println!("Updated profile of {}", updated?.display_name);
        }
        Commands::SearchPatients {
            doctor,
            term,
            password,
        } => {
            let found = as_doctor(&service, doctor, password, |doctor_ref| {
                service.search_patients(doctor_ref, &term)
            })?;
            if found.is_empty() {
                println!("No patients found.");
            }
            for record in found {
                println!("{}  {}  {}", record.identifier, record.display_name, record.email);
            }
        }
        Commands::AddEntry {
            identifier,
            doctor,
            password,
            visit_date,
            symptoms,
            diagnosis,
            prescription,
            tests_recommended,
            notes,
            next_visit,
            blood_pressure,
            temperature,
        } => {
            let identifier = PatientIdentifier::parse(identifier)?;
            let details = EntryDetails {
                visit_date,
                symptoms: NonEmptyText::new(symptoms)?,
                diagnosis: NonEmptyText::new(diagnosis)?,
                prescription,
                tests_recommended,
                notes,
                next_visit,
                vitals: Vitals {
                    blood_pressure,
                    temperature,
                    ..Vitals::default()
                },
            };
            let entry = as_doctor(&service, doctor, password, |doctor_ref| {
                service.entries().add_entry(&identifier, doctor_ref, details)
            })?;
            println!("Recorded entry {}", entry.entry_id);
        }
        Commands::ListEntries {
            identifier,
            visit_date,
        } => {
            let identifier = PatientIdentifier::parse(identifier)?;
            let entries = match visit_date {
                Some(date) => service
                    .entries()
                    .entry_for_date(&identifier, date)?
                    .into_iter()
                    .collect(),
                None => service.entries().entries_for(&identifier)?,
            };
            if entries.is_empty() {
                println!("No entries found.");
            }
            for entry in entries {
                println!(
                    "{}  {}  {} (by {})",
                    entry.details.visit_date,
                    entry.details.diagnosis,
                    entry.details.symptoms,
                    entry.doctor_name
                );
            }
        }
        Commands::AddPrescription {
            identifier,
            doctor,
            password,
            date,
            medications,
            notes,
            next_visit,
        } => {
            let identifier = PatientIdentifier::parse(identifier)?;
            let details = PrescriptionDetails {
                date,
                medications: medications
                    .into_iter()
                    .map(NonEmptyText::new)
                    .collect::<Result<_, _>>()?,
                notes,
                next_visit,
            };
            let prescription = as_doctor(&service, doctor, password, |doctor_ref| {
                service
                    .entries()
                    .add_prescription(&identifier, doctor_ref, details)
            })?;
            println!("Recorded prescription {}", prescription.prescription_id);
        }
        Commands::ListPrescriptions { identifier } => {
            let prescriptions = service
                .entries()
                .prescriptions_for(&PatientIdentifier::parse(identifier)?)?;
            if prescriptions.is_empty() {
                println!("No prescriptions found.");
            }
            for prescription in prescriptions {
                let medications: Vec<&str> = prescription
                    .details
                    .medications
                    .iter()
                    .map(|m| m.as_str())
                    .collect();
                println!(
                    "{}  [{}]  {} (by {})",
                    prescription.details.date,
                    prescription.status,
                    medications.join("; "),
                    prescription.doctor_name
                );
            }
        }
        Commands::AddAppointment {
            identifier,
            doctor,
            password,
            at,
            clinic,
            reason,
        } => {
            let identifier = PatientIdentifier::parse(identifier)?;
            let details = AppointmentDetails {
                scheduled_for: at,
                clinic,
                reason,
            };
            let appointment = as_doctor(&service, doctor, password, |doctor_ref| {
                service
                    .entries()
                    .add_appointment(&identifier, doctor_ref, details)
            })?;
            println!("Scheduled appointment {}", appointment.appointment_id);
        }
        Commands::SetAppointmentStatus {
            identifier,
            appointment_id,
            doctor,
            password,
            status,
        } => {
            let identifier = PatientIdentifier::parse(identifier)?;
            let appointment_id: EntryId = appointment_id.parse()?;
            let status: AppointmentStatus = status.parse()?;
            let appointment = as_doctor(&service, doctor, password, |doctor_ref| {
                service.entries().update_appointment_status(
                    &identifier,
                    &appointment_id,
                    doctor_ref,
                    status,
                )
            })?;
            println!("Appointment {} is {}", appointment.appointment_id, appointment.status);
        }
        Commands::ListAppointments { identifier } => {
            let appointments = service
                .entries()
                .appointments_for(&PatientIdentifier::parse(identifier)?)?;
            if appointments.is_empty() {
                println!("No appointments found.");
            }
            for appointment in appointments {
                println!(
                    "{}  [{}]  {} (with {})",
                    appointment.details.scheduled_for.format("%Y-%m-%d %H:%M"),
                    appointment.status,
                    appointment.details.clinic.as_deref().unwrap_or("-"),
                    appointment.doctor_name
                );
            }
        }
    }

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(command) => {
            if let Err(e) = run(command) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Use 'thejas --help' for commands");
        }
    }

    Ok(())
}
