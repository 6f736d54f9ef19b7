// Re-export the proto module from the shared `api-shared` crate so callers
// can reference `api_grpc::pb`.
pub use api_shared::pb;

use api_shared::convert;
use api_shared::pb::{
    thejas_server::Thejas, AddAppointmentReq, AddDailyEntryReq, AddPrescriptionReq,
    FindPatientReq, HealthRes, ListAppointmentsReq, ListAppointmentsRes, ListDailyEntriesReq,
    ListDailyEntriesRes, ListPrescriptionsReq, ListPrescriptionsRes, LoginReq, LoginRes,
    LogoutReq, LogoutRes, RegisterDoctorReq, RegisterDoctorRes, RegisterPatientReq,
    RegisterPatientRes, SearchPatientsReq, SearchPatientsRes, UpdateAppointmentStatusReq,
    UpdateDailyEntryReq, UpdatePatientProfileReq, UpdatePrescriptionReq,
};
use api_shared::HealthService;
use std::sync::Arc;
use thejas_core::{
    AccountRef, EntryId, ErrorKind, IdentityError, IdentityResult, IdentityService,
    PatientIdentifier,
};
use tonic::{Request, Response, Status};

/// Maps a core error onto a gRPC status carrying only the user-facing message.
pub fn to_status(err: IdentityError) -> Status {
    let message = err.user_message();
    match err.kind() {
        ErrorKind::Unavailable => {
            tracing::error!("request failed: {:?}", err);
            Status::unavailable(message)
        }
        kind => {
            tracing::warn!(error = %err, "request rejected");
            match kind {
                ErrorKind::InvalidInput => Status::invalid_argument(message),
                ErrorKind::InvalidCredentials => Status::unauthenticated(message),
                ErrorKind::Conflict => Status::already_exists(message),
                ErrorKind::NotFound => Status::not_found(message),
                ErrorKind::RetryRegistration => Status::aborted(message),
                ErrorKind::Unavailable => Status::unavailable(message),
            }
        }
    }
}

fn respond<T, R>(result: IdentityResult<T>) -> Result<Response<R>, Status>
where
    R: From<T>,
{
    result.map(|v| Response::new(v.into())).map_err(to_status)
}

fn identifier(raw: &str) -> IdentityResult<PatientIdentifier> {
    Ok(PatientIdentifier::parse(raw)?)
}

fn account_ref(raw: &str) -> IdentityResult<AccountRef> {
    Ok(AccountRef::parse(raw)?)
}

fn record_id(raw: &str) -> IdentityResult<EntryId> {
    Ok(raw.trim().parse::<EntryId>()?)
}

fn missing(field: &str) -> IdentityError {
    IdentityError::Validation(format!("{field} is required"))
}

#[derive(Clone)]
pub struct ThejasService {
    identity: Arc<IdentityService>,
}

impl ThejasService {
    pub fn new(identity: Arc<IdentityService>) -> Self {
        Self { identity }
    }

    fn add_entry(&self, req: AddDailyEntryReq) -> IdentityResult<thejas_core::DailyEntry> {
        let patient = identifier(&req.identifier)?;
        let doctor = account_ref(&req.doctor_ref)?;
        let details = convert::entry_details(req)?;
        self.identity.entries().add_entry(&patient, &doctor, details)
    }

    fn update_entry(&self, req: UpdateDailyEntryReq) -> IdentityResult<thejas_core::DailyEntry> {
        let entry_id = record_id(&req.entry_id)?;
        let entry = req.entry.ok_or_else(|| missing("entry"))?;
        let patient = identifier(&entry.identifier)?;
        let doctor = account_ref(&entry.doctor_ref)?;
        let details = convert::entry_details(entry)?;
        self.identity
            .entries()
            .update_entry(&patient, &entry_id, &doctor, details)
    }

    fn update_profile(&self, req: UpdatePatientProfileReq) -> IdentityResult<thejas_core::PatientRecord> {
        let account = account_ref(&req.account_ref)?;
        let update = convert::profile_update(req)?;
        self.identity.update_patient_profile(&account, update)
    }

    fn search(&self, req: SearchPatientsReq) -> IdentityResult<SearchPatientsRes> {
        let doctor = account_ref(&req.doctor_ref)?;
        let patients = self.identity.search_patients(&doctor, &req.term)?;
        Ok(SearchPatientsRes {
            patients: patients.into_iter().map(Into::into).collect(),
        })
    }

    fn prescribe(&self, req: AddPrescriptionReq) -> IdentityResult<thejas_core::Prescription> {
        let patient = identifier(&req.identifier)?;
        let doctor = account_ref(&req.doctor_ref)?;
        let details = convert::prescription_details(req)?;
        self.identity
            .entries()
            .add_prescription(&patient, &doctor, details)
    }

    fn revise_prescription(&self, req: UpdatePrescriptionReq) -> IdentityResult<thejas_core::Prescription> {
        let prescription_id = record_id(&req.prescription_id)?;
        let status = convert::prescription_status(&req.status)?;
        let prescription = req.prescription.ok_or_else(|| missing("prescription"))?;
        let patient = identifier(&prescription.identifier)?;
        let doctor = account_ref(&prescription.doctor_ref)?;
        let details = convert::prescription_details(prescription)?;
        self.identity
            .entries()
            .update_prescription(&patient, &prescription_id, &doctor, details, status)
    }

    fn schedule(&self, req: AddAppointmentReq) -> IdentityResult<thejas_core::Appointment> {
        let patient = identifier(&req.identifier)?;
        let doctor = account_ref(&req.doctor_ref)?;
        let details = convert::appointment_details(req)?;
        self.identity
            .entries()
            .add_appointment(&patient, &doctor, details)
    }

    fn update_appointment(&self, req: UpdateAppointmentStatusReq) -> IdentityResult<thejas_core::Appointment> {
        let patient = identifier(&req.identifier)?;
        let appointment_id = record_id(&req.appointment_id)?;
        let doctor = account_ref(&req.doctor_ref)?;
        let status = convert::appointment_status(&req.status)?;
        self.identity
            .entries()
            .update_appointment_status(&patient, &appointment_id, &doctor, status)
    }

    fn list_entries(&self, req: ListDailyEntriesReq) -> IdentityResult<ListDailyEntriesRes> {
        let patient = identifier(&req.identifier)?;
        let entries = if req.visit_date.trim().is_empty() {
            self.identity.entries().entries_for(&patient)?
        } else {
            let date = convert::parse_date(&req.visit_date, "visit_date")?;
            self.identity
                .entries()
                .entry_for_date(&patient, date)?
                .into_iter()
                .collect()
        };

        Ok(ListDailyEntriesRes {
            entries: entries.into_iter().map(Into::into).collect(),
        })
    }
}

#[tonic::async_trait]
impl Thejas for ThejasService {
    async fn health(&self, _req: Request<()>) -> Result<Response<HealthRes>, Status> {
        Ok(Response::new(HealthService::check_health()))
    }

    async fn register_patient(
        &self,
        req: Request<RegisterPatientReq>,
    ) -> Result<Response<RegisterPatientRes>, Status> {
        respond(
            convert::patient_registration(req.into_inner())
                .and_then(|reg| self.identity.register_patient(reg)),
        )
    }

    async fn register_doctor(
        &self,
        req: Request<RegisterDoctorReq>,
    ) -> Result<Response<RegisterDoctorRes>, Status> {
        respond(
            convert::doctor_registration(req.into_inner())
                .and_then(|reg| self.identity.register_doctor(reg)),
        )
    }

    async fn login(&self, req: Request<LoginReq>) -> Result<Response<LoginRes>, Status> {
        respond(convert::login_request(req.into_inner()).and_then(|req| self.identity.login(req)))
    }

    async fn logout(&self, req: Request<LogoutReq>) -> Result<Response<LogoutRes>, Status> {
        account_ref(&req.into_inner().account_ref)
            .and_then(|account| self.identity.logout(&account))
            .map(|()| Response::new(LogoutRes { success: true }))
            .map_err(to_status)
    }

    async fn find_patient(
        &self,
        req: Request<FindPatientReq>,
    ) -> Result<Response<pb::PatientRecord>, Status> {
        respond(
            identifier(&req.into_inner().identifier)
                .and_then(|id| self.identity.find_patient(&id)),
        )
    }

    async fn update_patient_profile(
        &self,
        req: Request<UpdatePatientProfileReq>,
    ) -> Result<Response<pb::PatientRecord>, Status> {
        respond(self.update_profile(req.into_inner()))
    }

    async fn search_patients(
        &self,
        req: Request<SearchPatientsReq>,
    ) -> Result<Response<SearchPatientsRes>, Status> {
        self.search(req.into_inner())
            .map(Response::new)
            .map_err(to_status)
    }

    async fn add_daily_entry(
        &self,
        req: Request<AddDailyEntryReq>,
    ) -> Result<Response<pb::DailyEntry>, Status> {
        respond(self.add_entry(req.into_inner()))
    }

    async fn update_daily_entry(
        &self,
        req: Request<UpdateDailyEntryReq>,
    ) -> Result<Response<pb::DailyEntry>, Status> {
        respond(self.update_entry(req.into_inner()))
    }

    async fn list_daily_entries(
        &self,
        req: Request<ListDailyEntriesReq>,
    ) -> Result<Response<ListDailyEntriesRes>, Status> {
        self.list_entries(req.into_inner())
            .map(Response::new)
            .map_err(to_status)
    }

    async fn add_prescription(
        &self,
        req: Request<AddPrescriptionReq>,
    ) -> Result<Response<pb::Prescription>, Status> {
        respond(self.prescribe(req.into_inner()))
    }

    async fn update_prescription(
        &self,
        req: Request<UpdatePrescriptionReq>,
    ) -> Result<Response<pb::Prescription>, Status> {
        respond(self.revise_prescription(req.into_inner()))
    }

    async fn list_prescriptions(
        &self,
        req: Request<ListPrescriptionsReq>,
    ) -> Result<Response<ListPrescriptionsRes>, Status> {
        identifier(&req.into_inner().identifier)
            .and_then(|patient| self.identity.entries().prescriptions_for(&patient))
            .map(|found| {
                Response::new(ListPrescriptionsRes {
                    prescriptions: found.into_iter().map(Into::into).collect(),
                })
            })
            .map_err(to_status)
    }

    async fn add_appointment(
        &self,
        req: Request<AddAppointmentReq>,
    ) -> Result<Response<pb::Appointment>, Status> {
        respond(self.schedule(req.into_inner()))
    }

    async fn update_appointment_status(
        &self,
        req: Request<UpdateAppointmentStatusReq>,
    ) -> Result<Response<pb::Appointment>, Status> {
        respond(self.update_appointment(req.into_inner()))
    }

    async fn list_appointments(
        &self,
        req: Request<ListAppointmentsReq>,
    ) -> Result<Response<ListAppointmentsRes>, Status> {
        identifier(&req.into_inner().identifier)
            .and_then(|patient| self.identity.entries().appointments_for(&patient))
            .map(|found| {
                Response::new(ListAppointmentsRes {
                    appointments: found.into_iter().map(Into::into).collect(),
                })
            })
            .map_err(to_status)
    }
}
