//! The single owner of schedule screen state.
//!
//! Holds the view state, the last fetched doctors and appointments, and a
//! generation counter. A refresh result is applied only if no newer refresh
//! or mutation happened since its ticket was issued.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, info, warn};

use appointment_cell::models::{Appointment, AppointmentDraft, AppointmentRequest, AppointmentStatus};
use appointment_cell::services::AppointmentLifecycleService;
use doctor_cell::models::Doctor;
use shared_models::{error::AppError, RecordId};

use crate::draft::draft_for_slot;
use crate::models::ScheduleError;
use crate::occupancy::{compute_grid, SlotAssignment};
use crate::slot::OperatingWindow;
use crate::view_state::{ScheduleViewState, ViewMode};

/// Where the schedule reads and writes its records.
#[async_trait]
pub trait ScheduleSource: Send + Sync {
    async fn fetch_appointments(&self) -> Result<Vec<Appointment>, AppError>;
    async fn fetch_doctors(&self) -> Result<Vec<Doctor>, AppError>;
    async fn create_appointment(&self, request: &AppointmentRequest) -> Result<Appointment, AppError>;
    async fn update_appointment(
        &self,
        appointment_id: &RecordId,
        request: &AppointmentRequest,
    ) -> Result<Appointment, AppError>;
    async fn update_status(
        &self,
        appointment_id: &RecordId,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppError>;
    async fn delete_appointment(&self, appointment_id: &RecordId) -> Result<(), AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// A newer refresh or a mutation superseded this result; it was dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub struct ScheduleController {
    pub state: ScheduleViewState,
    window: OperatingWindow,
    doctors: Vec<Doctor>,
    appointments: Vec<Appointment>,
    generation: u64,
    lifecycle: AppointmentLifecycleService,
}

impl ScheduleController {
    pub fn new(window: OperatingWindow, state: ScheduleViewState) -> Self {
        Self {
            state,
            window,
            doctors: Vec::new(),
            appointments: Vec::new(),
            generation: 0,
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    pub fn window(&self) -> &OperatingWindow {
        &self.window
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    // ==========================================================================
    // REFRESH
    // ==========================================================================

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.generation += 1;
        RefreshTicket(self.generation)
    }

    pub fn apply_refresh(
        &mut self,
        ticket: RefreshTicket,
        doctors: Vec<Doctor>,
        appointments: Vec<Appointment>,
    ) -> RefreshOutcome {
        if ticket.0 != self.generation {
            debug!("Dropping stale refresh {} (current {})", ticket.0, self.generation);
            return RefreshOutcome::Stale;
        }

        self.doctors = doctors;
        self.appointments = appointments;
        self.reconcile_selection();
        RefreshOutcome::Applied
    }

    /// Fetches doctors and appointments concurrently. Does not touch any
    /// controller state, so it can run while the controller is in use.
    pub async fn fetch<S>(source: &S) -> Result<(Vec<Doctor>, Vec<Appointment>), AppError>
    where
        S: ScheduleSource + ?Sized,
    {
        futures::try_join!(source.fetch_doctors(), source.fetch_appointments())
    }

    pub async fn refresh<S>(&mut self, source: &S) -> Result<RefreshOutcome, ScheduleError>
    where
        S: ScheduleSource + ?Sized,
    {
        let ticket = self.begin_refresh();
        let (doctors, appointments) = Self::fetch(source).await?;
        Ok(self.apply_refresh(ticket, doctors, appointments))
    }

    /// Drops a selection that vanished from the roster; week view falls back
    /// to the first doctor.
    fn reconcile_selection(&mut self) {
        if let Some(selected) = &self.state.selected_doctor {
            if !self.doctors.iter().any(|d| &d.id == selected) {
                warn!("Selected doctor {} is no longer in the roster", selected);
                self.state.selected_doctor = None;
            }
        }
        if self.state.mode == ViewMode::Week && self.state.selected_doctor.is_none() {
            self.state.selected_doctor = self.doctors.first().map(|d| d.id.clone());
        }
    }

    // ==========================================================================
    // MUTATIONS
    // ==========================================================================

    fn check_overlap(&self, request: &AppointmentRequest, ignore: Option<&RecordId>) -> Result<(), ScheduleError> {
        let mut valid = request.validate().map_err(AppError::from)?;
        if request.status.is_none() {
            if let Some(current) = ignore.and_then(|id| self.appointments.iter().find(|a| &a.id == id)) {
                valid.status = current.status;
            }
        }
        match valid.first_overlap(&self.appointments, ignore) {
            Some(existing) => Err(ScheduleError::Overlap(existing.id.clone())),
            None => Ok(()),
        }
    }

    fn store(&mut self, appointment: Appointment) {
        match self.appointments.iter_mut().find(|a| a.id == appointment.id) {
            Some(slot) => *slot = appointment,
            None => self.appointments.push(appointment),
        }
        self.generation += 1;
        self.state.close_modal();
    }

    pub async fn create<S>(&mut self, source: &S, request: &AppointmentRequest) -> Result<Appointment, ScheduleError>
    where
        S: ScheduleSource + ?Sized,
    {
        self.check_overlap(request, None)?;

        let created = source.create_appointment(request).await?;
        info!("Appointment {} added to the schedule", created.id);
        self.store(created.clone());
        Ok(created)
    }

    pub async fn update<S>(
        &mut self,
        source: &S,
        appointment_id: &RecordId,
        request: &AppointmentRequest,
    ) -> Result<Appointment, ScheduleError>
    where
        S: ScheduleSource + ?Sized,
    {
        self.check_overlap(request, Some(appointment_id))?;

        let updated = source.update_appointment(appointment_id, request).await?;
        self.store(updated.clone());
        Ok(updated)
    }

    pub async fn update_status<S>(
        &mut self,
        source: &S,
        appointment_id: &RecordId,
        status: AppointmentStatus,
    ) -> Result<Appointment, ScheduleError>
    where
        S: ScheduleSource + ?Sized,
    {
        if let Some(current) = self.appointments.iter().find(|a| &a.id == appointment_id) {
            self.lifecycle
                .validate_status_transition(&current.status, &status)
                .map_err(AppError::from)?;
        }

        let updated = source.update_status(appointment_id, status).await?;
        self.store(updated.clone());
        Ok(updated)
    }

    pub async fn delete<S>(&mut self, source: &S, appointment_id: &RecordId) -> Result<(), ScheduleError>
    where
        S: ScheduleSource + ?Sized,
    {
        source.delete_appointment(appointment_id).await?;

        self.appointments.retain(|a| &a.id != appointment_id);
        self.generation += 1;
        self.state.close_modal();
        info!("Appointment {} removed from the schedule", appointment_id);
        Ok(())
    }

    // ==========================================================================
    // GRIDS
    // ==========================================================================

    pub fn grid(&self, doctor_id: &RecordId, day: NaiveDate) -> SlotAssignment {
        compute_grid(&self.appointments, doctor_id, day, &self.window)
    }

    fn doctor(&self, doctor_id: &RecordId) -> Result<&Doctor, ScheduleError> {
        self.doctors
            .iter()
            .find(|d| &d.id == doctor_id)
            .ok_or_else(|| ScheduleError::UnknownDoctor(doctor_id.clone()))
    }

    /// One column per visible doctor for the current date.
    pub fn day_grids(&self) -> Result<Vec<(Doctor, SlotAssignment)>, ScheduleError> {
        let doctors: Vec<&Doctor> = match &self.state.selected_doctor {
            Some(id) => vec![self.doctor(id)?],
            None => self.doctors.iter().collect(),
        };

        Ok(doctors
            .into_iter()
            .map(|d| (d.clone(), self.grid(&d.id, self.state.date)))
            .collect())
    }

    /// Seven columns, Monday to Sunday, for the selected doctor.
    pub fn week_grids(&self) -> Result<(Doctor, Vec<SlotAssignment>), ScheduleError> {
        let doctor_id = self
            .state
            .selected_doctor
            .as_ref()
            .ok_or(ScheduleError::NoDoctorSelected)?;
        let doctor = self.doctor(doctor_id)?.clone();

        let grids = crate::week::week_window(self.state.date)
            .into_iter()
            .map(|day| self.grid(&doctor.id, day))
            .collect();
        Ok((doctor, grids))
    }

    /// Click on a cell: opens the creation modal when the slot is free.
    pub fn open_slot(
        &mut self,
        doctor_id: &RecordId,
        day: NaiveDate,
        slot_index: usize,
    ) -> Result<AppointmentDraft, ScheduleError> {
        self.doctor(doctor_id)?;
        let grid = self.grid(doctor_id, day);
        let draft = draft_for_slot(doctor_id, day, slot_index, &grid)?;
        self.state.open_draft(draft.clone());
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{NaiveDateTime, NaiveTime};
    use std::sync::Mutex;

    use crate::view_state::ModalState;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 16).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn appt(id: i64, start: NaiveDateTime, slots: u32) -> Appointment {
        Appointment {
            id: RecordId::Numeric(id),
            doctor_id: RecordId::Numeric(1),
            patient_id: Some(RecordId::Numeric(7)),
            start,
            duration_slots: slots,
            status: AppointmentStatus::Pending,
            notes: None,
            patient_name: None,
            doctor_name: None,
            treatment: None,
        }
    }

    fn controller() -> ScheduleController {
        let window = OperatingWindow::new(
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
        )
        .unwrap();
        ScheduleController::new(window, ScheduleViewState::new(day()))
    }

    /// In-memory source; `fail` makes every write fail with a transport error.
    #[derive(Default)]
    struct FakeSource {
        doctors: Vec<Doctor>,
        appointments: Mutex<Vec<Appointment>>,
        fail: bool,
        next_id: Mutex<i64>,
    }

    impl FakeSource {
        fn with(appointments: Vec<Appointment>) -> Self {
            Self {
                doctors: vec![Doctor::new(1, "Dra. Ruiz"), Doctor::new(2, "Dr. Soto")],
                appointments: Mutex::new(appointments),
                next_id: Mutex::new(100),
                ..Default::default()
            }
        }

        fn failing(appointments: Vec<Appointment>) -> Self {
            Self {
                fail: true,
                ..Self::with(appointments)
            }
        }

        fn down(&self) -> Result<(), AppError> {
            if self.fail {
                Err(AppError::Transport("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ScheduleSource for FakeSource {
        async fn fetch_appointments(&self) -> Result<Vec<Appointment>, AppError> {
            Ok(self.appointments.lock().unwrap().clone())
        }

        async fn fetch_doctors(&self) -> Result<Vec<Doctor>, AppError> {
            Ok(self.doctors.clone())
        }

        async fn create_appointment(&self, request: &AppointmentRequest) -> Result<Appointment, AppError> {
            self.down()?;
            let valid = request.validate().map_err(AppError::from)?;
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let created = Appointment {
                id: RecordId::Numeric(*next_id),
                doctor_id: valid.doctor_id,
                patient_id: Some(valid.patient_id),
                start: valid.start,
                duration_slots: valid.duration_slots,
                status: valid.status,
                notes: valid.notes,
                patient_name: None,
                doctor_name: None,
                treatment: None,
            };
            self.appointments.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn update_appointment(
            &self,
            appointment_id: &RecordId,
            request: &AppointmentRequest,
        ) -> Result<Appointment, AppError> {
            self.down()?;
            let valid = request.validate().map_err(AppError::from)?;
            let mut list = self.appointments.lock().unwrap();
            let existing = list
                .iter_mut()
                .find(|a| &a.id == appointment_id)
                .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;
            existing.start = valid.start;
            existing.duration_slots = valid.duration_slots;
            if let Some(status) = request.status {
                existing.status = status;
            }
            Ok(existing.clone())
        }

        async fn update_status(
            &self,
            appointment_id: &RecordId,
            status: AppointmentStatus,
        ) -> Result<Appointment, AppError> {
            self.down()?;
            let mut list = self.appointments.lock().unwrap();
            let existing = list
                .iter_mut()
                .find(|a| &a.id == appointment_id)
                .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;
            existing.status = status;
            Ok(existing.clone())
        }

        async fn delete_appointment(&self, appointment_id: &RecordId) -> Result<(), AppError> {
            self.down()?;
            self.appointments.lock().unwrap().retain(|a| &a.id != appointment_id);
            Ok(())
        }
    }

    fn request_at(h: u32, m: u32) -> AppointmentRequest {
        AppointmentRequest {
            patient_id: Some(RecordId::Numeric(7)),
            doctor_id: Some(RecordId::Numeric(1)),
            start: Some(format!("2025-05-16T{:02}:{:02}:00", h, m)),
            duration_slots: Some(1),
            status: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn refresh_loads_doctors_and_appointments() {
        let source = FakeSource::with(vec![appt(1, at(9, 0), 2)]);
        let mut controller = controller();

        let outcome = controller.refresh(&source).await.unwrap();

        assert_eq!(outcome, RefreshOutcome::Applied);
        assert_eq!(controller.doctors().len(), 2);
        let columns = controller.day_grids().unwrap();
        assert_eq!(columns.len(), 2);
        assert!(!columns[0].1.is_free(2));
        assert!(columns[1].1.is_free(2));
    }

    #[test]
    fn stale_refresh_is_ignored() {
        let mut controller = controller();
        let old = controller.begin_refresh();
        let new = controller.begin_refresh();

        let applied = controller.apply_refresh(new, vec![Doctor::new(1, "Dra. Ruiz")], vec![appt(1, at(9, 0), 1)]);
        let stale = controller.apply_refresh(old, Vec::new(), Vec::new());

        assert_eq!(applied, RefreshOutcome::Applied);
        assert_eq!(stale, RefreshOutcome::Stale);
        assert_eq!(controller.appointments().len(), 1);
    }

    #[tokio::test]
    async fn mutation_supersedes_in_flight_refresh() {
        let source = FakeSource::with(Vec::new());
        let mut controller = controller();
        controller.refresh(&source).await.unwrap();

        let ticket = controller.begin_refresh();
        let (doctors, appointments) = ScheduleController::fetch(&source).await.unwrap();
        controller.create(&source, &request_at(10, 0)).await.unwrap();

        assert_eq!(controller.apply_refresh(ticket, doctors, appointments), RefreshOutcome::Stale);
        assert_eq!(controller.appointments().len(), 1);
    }

    #[tokio::test]
    async fn failed_create_leaves_state_intact() {
        let source = FakeSource::failing(vec![appt(1, at(9, 0), 2)]);
        let mut controller = controller();
        controller.refresh(&source).await.unwrap();
        controller.open_slot(&RecordId::Numeric(1), day(), 5).unwrap();
        let before = controller.appointments().to_vec();
        let state_before = controller.state.clone();

        let result = controller.create(&source, &request_at(10, 30)).await;

        assert_matches!(result, Err(ScheduleError::Source(AppError::Transport(_))));
        assert_eq!(controller.appointments(), before.as_slice());
        assert_eq!(controller.state, state_before);
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_appointment() {
        let source = FakeSource::failing(vec![appt(1, at(9, 0), 2)]);
        let mut controller = controller();
        controller.refresh(&source).await.unwrap();

        let result = controller.delete(&source, &RecordId::Numeric(1)).await;

        assert!(result.is_err());
        assert_eq!(controller.appointments().len(), 1);
    }

    #[tokio::test]
    async fn overlapping_create_is_refused_locally() {
        let source = FakeSource::with(vec![appt(1, at(9, 0), 2)]);
        let mut controller = controller();
        controller.refresh(&source).await.unwrap();

        let result = controller.create(&source, &request_at(9, 30)).await;

        assert_matches!(result, Err(ScheduleError::Overlap(RecordId::Numeric(1))));
        assert_eq!(source.appointments.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_then_slot_is_taken() {
        let source = FakeSource::with(Vec::new());
        let mut controller = controller();
        controller.refresh(&source).await.unwrap();

        let draft = controller.open_slot(&RecordId::Numeric(1), day(), 5).unwrap();
        assert_matches!(controller.state.modal, ModalState::NewAppointment(_));

        let request = draft.to_request(Some(RecordId::Numeric(7)));
        controller.create(&source, &request).await.unwrap();

        assert_eq!(controller.state.modal, ModalState::None);
        assert_matches!(
            controller.open_slot(&RecordId::Numeric(1), day(), 5),
            Err(ScheduleError::SlotOccupied { index: 5 })
        );
    }

    #[tokio::test]
    async fn status_policy_checked_before_source() {
        let mut done = appt(1, at(9, 0), 1);
        done.status = AppointmentStatus::Completed;
        let source = FakeSource::with(vec![done]);
        let mut controller = controller();
        controller.refresh(&source).await.unwrap();

        let result = controller
            .update_status(&source, &RecordId::Numeric(1), AppointmentStatus::Pending)
            .await;

        assert_matches!(result, Err(ScheduleError::Source(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn week_view_picks_first_doctor() {
        let source = FakeSource::with(vec![appt(1, at(9, 0), 1)]);
        let mut controller = controller();
        controller.state.set_mode(ViewMode::Week);
        controller.refresh(&source).await.unwrap();

        let (doctor, grids) = controller.week_grids().unwrap();

        assert_eq!(doctor.id, RecordId::Numeric(1));
        assert_eq!(grids.len(), 7);
        // 2025-05-16 is a Friday.
        assert!(!grids[4].is_free(2));
        assert!(grids[0].is_free(2));
    }

    #[test]
    fn unknown_doctor_in_day_view() {
        let mut controller = controller();
        controller.state.select_doctor(Some(RecordId::Numeric(5)));

        assert_matches!(controller.day_grids(), Err(ScheduleError::UnknownDoctor(_)));
    }
}
