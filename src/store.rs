use serde::Serialize;
use tracing::{info, warn};

use crate::areas;
use crate::model::{
    AgendaEntry, AttendanceMark, AttendanceRecord, Class, ClassInput, EvaluationPeriod, Notice,
    NoticeDraft, Role, ScheduleEntry, ScheduleInput, Student, StudentInput, StudentStatus, User,
    UserInput, valid_hhmm, valid_iso_date,
};
use crate::snapshot::SnapshotDocument;
use crate::storage::StorageBackend;

pub const USERS_SLOT: &str = "sapi_users";
pub const CLASSES_SLOT: &str = "sapi_classes";
pub const STUDENTS_SLOT: &str = "sapi_students";
pub const NOTICES_SLOT: &str = "sapi_notices";
pub const SCHEDULE_SLOT: &str = "sapi_schedule";
pub const ATTENDANCE_SLOT: &str = "sapi_attendance";

#[derive(Debug)]
pub enum StoreError {
    BadInput(String),
    NotFound(&'static str),
    DuplicatePeriod(String),
    Storage(anyhow::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::BadInput(msg) => write!(f, "{}", msg),
            StoreError::NotFound(what) => write!(f, "{} not found", what),
            StoreError::DuplicatePeriod(name) => {
                write!(f, "a period named \"{}\" already exists", name)
            }
            StoreError::Storage(e) => write!(f, "storage write failed: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Owns the six entity collections and the durable copy of each. Every
/// mutation validates first, writes the affected slot(s) durably, and only
/// then commits the new state in memory, so a failed write never leaves the
/// observable collections ahead of the stored ones.
pub struct Store<B: StorageBackend> {
    backend: B,
    users: Vec<User>,
    classes: Vec<Class>,
    students: Vec<Student>,
    notices: Vec<Notice>,
    schedule: Vec<ScheduleEntry>,
    attendance: Vec<AttendanceRecord>,
}

impl<B: StorageBackend> Store<B> {
    /// Loads every slot independently; a slot that is missing or fails to
    /// decode falls back to its default collection without affecting the
    /// others. Backend read failures abort the open.
    pub fn open(backend: B) -> anyhow::Result<Self> {
        let users = load_slot(&backend, USERS_SLOT, bootstrap_users)?;
        let classes = load_slot(&backend, CLASSES_SLOT, Vec::new)?;
        let students = load_slot(&backend, STUDENTS_SLOT, Vec::new)?;
        let notices = load_slot(&backend, NOTICES_SLOT, Vec::new)?;
        let schedule = load_slot(&backend, SCHEDULE_SLOT, Vec::new)?;
        let attendance = load_slot(&backend, ATTENDANCE_SLOT, Vec::new)?;
        Ok(Store {
            backend,
            users,
            classes,
            students,
            notices,
            schedule,
            attendance,
        })
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn schedule(&self) -> &[ScheduleEntry] {
        &self.schedule
    }

    pub fn attendance(&self) -> &[AttendanceRecord] {
        &self.attendance
    }

    // ---- users ----

    /// Upsert a staff account. A blank or absent password on an update keeps
    /// the stored one. Updating an unknown id is a silent no-op (`None`).
    pub fn save_user(&mut self, input: UserInput) -> Result<Option<User>, StoreError> {
        if input.role == Some(Role::Responsavel) {
            return Err(StoreError::BadInput(
                "role Responsável is reserved for parent sessions".to_string(),
            ));
        }
        let mut users = self.users.clone();
        let saved = if let Some(id) = input.effective_id() {
            let Some(pos) = users.iter().position(|u| u.id == id) else {
                return Ok(None);
            };
            let merged = input.apply_to(&users[pos]);
            users[pos] = merged.clone();
            merged
        } else {
            let name = require_trimmed(input.name.as_deref(), "name")?;
            let login = require_trimmed(input.login.as_deref(), "login")?;
            let Some(role) = input.role else {
                return Err(StoreError::BadInput("missing role".to_string()));
            };
            let created = User {
                id: next_id(&users, |u| u.id),
                name,
                login,
                email: input.email,
                role,
                password: input.password,
                class_id: input.class_id,
                student_id: input.student_id,
            };
            users.push(created.clone());
            created
        };
        self.persist(USERS_SLOT, &users)?;
        self.users = users;
        Ok(Some(saved))
    }

    pub fn delete_user(&mut self, user_id: i64) -> Result<bool, StoreError> {
        let mut users = self.users.clone();
        let before = users.len();
        users.retain(|u| u.id != user_id);
        if users.len() == before {
            return Ok(false);
        }
        self.persist(USERS_SLOT, &users)?;
        self.users = users;
        Ok(true)
    }

    // ---- classes ----

    pub fn save_class(&mut self, input: ClassInput) -> Result<Option<Class>, StoreError> {
        let mut classes = self.classes.clone();
        let saved = if let Some(id) = input.effective_id() {
            let Some(pos) = classes.iter().position(|c| c.id == id) else {
                return Ok(None);
            };
            let merged = input.apply_to(&classes[pos]);
            classes[pos] = merged.clone();
            merged
        } else {
            let name = require_trimmed(input.name.as_deref(), "name")?;
            let Some(teacher_id) = input.teacher_id else {
                return Err(StoreError::BadInput("missing teacherId".to_string()));
            };
            let created = Class {
                id: next_id(&classes, |c| c.id),
                name,
                teacher_id,
            };
            classes.push(created.clone());
            created
        };
        self.persist(CLASSES_SLOT, &classes)?;
        self.classes = classes;
        Ok(Some(saved))
    }

    /// Never cascades: students referencing the class stay in place and show
    /// up as unassigned. Refusing the delete while active students remain is
    /// the caller's policy, fed by [`Store::class_rows`].
    pub fn delete_class(&mut self, class_id: i64) -> Result<bool, StoreError> {
        let mut classes = self.classes.clone();
        let before = classes.len();
        classes.retain(|c| c.id != class_id);
        if classes.len() == before {
            return Ok(false);
        }
        self.persist(CLASSES_SLOT, &classes)?;
        self.classes = classes;
        Ok(true)
    }

    /// Classes with the number of active students still pointing at them.
    pub fn class_rows(&self) -> Vec<(Class, usize)> {
        self.classes
            .iter()
            .map(|class| {
                let active = self
                    .students
                    .iter()
                    .filter(|s| s.class_id == class.id && s.status == StudentStatus::Active)
                    .count();
                (class.clone(), active)
            })
            .collect()
    }

    // ---- students ----

    /// Three-way dispatch matching the enrollment form's three uses:
    /// an explicit id is a direct update (wholesale replace when the input
    /// carries its own evaluations, field merge otherwise); no id with a cpf
    /// that matches an existing student is a re-enrollment that keeps the
    /// record's id and history; anything else creates a student seeded with
    /// one default evaluation period.
    pub fn save_student(&mut self, input: StudentInput) -> Result<Option<Student>, StoreError> {
        let mut students = self.students.clone();
        let saved = if let Some(id) = input.effective_id() {
            let Some(pos) = students.iter().position(|s| s.id == id) else {
                return Ok(None);
            };
            let updated = if input.is_complete() {
                let evaluations = input.evaluations.clone().unwrap_or_default();
                input
                    .into_student(id, evaluations)
                    .map_err(StoreError::BadInput)?
            } else {
                input.apply_to(&students[pos]).map_err(StoreError::BadInput)?
            };
            students[pos] = updated.clone();
            updated
        } else {
            let digits = input.cpf_digits();
            let matched = if digits.is_empty() {
                None
            } else {
                students.iter().position(|s| s.cpf_digits() == digits)
            };
            if let Some(pos) = matched {
                let merged = input.apply_to(&students[pos]).map_err(StoreError::BadInput)?;
                students[pos] = merged.clone();
                merged
            } else {
                let id = next_id(&students, |s| s.id);
                let seed = vec![areas::default_period(areas::current_year())];
                let created = input.into_student(id, seed).map_err(StoreError::BadInput)?;
                students.push(created.clone());
                created
            }
        };
        self.persist(STUDENTS_SLOT, &students)?;
        self.students = students;
        Ok(Some(saved))
    }

    pub fn delete_student(&mut self, student_id: i64) -> Result<bool, StoreError> {
        let mut students = self.students.clone();
        let before = students.len();
        students.retain(|s| s.id != student_id);
        if students.len() == before {
            return Ok(false);
        }
        self.persist(STUDENTS_SLOT, &students)?;
        self.students = students;
        Ok(true)
    }

    pub fn students_filtered(
        &self,
        class_id: Option<i64>,
        status: Option<StudentStatus>,
    ) -> Vec<Student> {
        self.students
            .iter()
            .filter(|s| class_id.map_or(true, |c| s.class_id == c))
            .filter(|s| status.map_or(true, |st| s.status == st))
            .cloned()
            .collect()
    }

    // ---- evaluation periods ----

    /// Appends a period named `period`. The grid starts as a copy of the most
    /// recently added period's grid (teachers continue from the prior state);
    /// notes and the descriptive report start blank. A name already on file
    /// for the student is rejected.
    pub fn create_period(
        &mut self,
        student_id: i64,
        period: &str,
        start_date: Option<String>,
        end_date: Option<String>,
    ) -> Result<EvaluationPeriod, StoreError> {
        let name = period.trim();
        if name.is_empty() {
            return Err(StoreError::BadInput("period must not be empty".to_string()));
        }
        let mut students = self.students.clone();
        let Some(pos) = students.iter().position(|s| s.id == student_id) else {
            return Err(StoreError::NotFound("student"));
        };
        if students[pos].evaluations.iter().any(|p| p.period == name) {
            return Err(StoreError::DuplicatePeriod(name.to_string()));
        }
        let grid = students[pos]
            .evaluations
            .last()
            .map(|p| p.evaluations.clone())
            .unwrap_or_else(areas::default_grid);
        let created = EvaluationPeriod {
            period: name.to_string(),
            start_date,
            end_date,
            evaluations: grid,
            teacher_notes: Some(String::new()),
            psycho_notes: Some(String::new()),
            descriptive_report: Some(String::new()),
        };
        students[pos].evaluations.push(created.clone());
        self.persist(STUDENTS_SLOT, &students)?;
        self.students = students;
        Ok(created)
    }

    /// Renames/re-dates a period in place, keeping its position and grid.
    /// Renaming onto another period's name is rejected; an unknown original
    /// name is a silent no-op.
    pub fn update_period(
        &mut self,
        student_id: i64,
        original_period: &str,
        period: &str,
        start_date: Option<String>,
        end_date: Option<String>,
    ) -> Result<Option<EvaluationPeriod>, StoreError> {
        let name = period.trim();
        if name.is_empty() {
            return Err(StoreError::BadInput("period must not be empty".to_string()));
        }
        let mut students = self.students.clone();
        let Some(pos) = students.iter().position(|s| s.id == student_id) else {
            return Err(StoreError::NotFound("student"));
        };
        let Some(idx) = students[pos]
            .evaluations
            .iter()
            .position(|p| p.period == original_period)
        else {
            return Ok(None);
        };
        if name != original_period
            && students[pos].evaluations.iter().any(|p| p.period == name)
        {
            return Err(StoreError::DuplicatePeriod(name.to_string()));
        }
        let entry = &mut students[pos].evaluations[idx];
        entry.period = name.to_string();
        entry.start_date = start_date;
        entry.end_date = end_date;
        let updated = entry.clone();
        self.persist(STUDENTS_SLOT, &students)?;
        self.students = students;
        Ok(Some(updated))
    }

    /// Upserts a full evaluation sheet (grid, notes, report) by period name:
    /// replaces the matching period in place, appends when the name is new.
    pub fn save_sheet(
        &mut self,
        student_id: i64,
        sheet: EvaluationPeriod,
    ) -> Result<EvaluationPeriod, StoreError> {
        let mut students = self.students.clone();
        let Some(pos) = students.iter().position(|s| s.id == student_id) else {
            return Err(StoreError::NotFound("student"));
        };
        match students[pos]
            .evaluations
            .iter()
            .position(|p| p.period == sheet.period)
        {
            Some(idx) => students[pos].evaluations[idx] = sheet.clone(),
            None => students[pos].evaluations.push(sheet.clone()),
        }
        self.persist(STUDENTS_SLOT, &students)?;
        self.students = students;
        Ok(sheet)
    }

    pub fn next_period_name(&self, student_id: i64) -> Result<String, StoreError> {
        let Some(student) = self.students.iter().find(|s| s.id == student_id) else {
            return Err(StoreError::NotFound("student"));
        };
        let latest = student.evaluations.last().map(|p| p.period.as_str());
        Ok(areas::next_period_name(latest, areas::current_year()))
    }

    // ---- agenda ----

    /// Upsert by date; the agenda is kept sorted newest-first.
    pub fn save_agenda_entry(
        &mut self,
        student_id: i64,
        entry: AgendaEntry,
    ) -> Result<AgendaEntry, StoreError> {
        if !valid_iso_date(&entry.date) {
            return Err(StoreError::BadInput(format!(
                "invalid agenda date: {}",
                entry.date
            )));
        }
        let mut students = self.students.clone();
        let Some(pos) = students.iter().position(|s| s.id == student_id) else {
            return Err(StoreError::NotFound("student"));
        };
        let agenda = students[pos].agenda.get_or_insert_with(Vec::new);
        match agenda.iter().position(|e| e.date == entry.date) {
            Some(idx) => agenda[idx] = entry.clone(),
            None => agenda.push(entry.clone()),
        }
        agenda.sort_by(|a, b| b.date.cmp(&a.date));
        self.persist(STUDENTS_SLOT, &students)?;
        self.students = students;
        Ok(entry)
    }

    // ---- attendance ----

    /// Batch upsert of one day's sheet. Existing (student, date) records get
    /// status/notes overwritten in place; new records receive sequential
    /// fresh ids. One durable write covers the whole batch. The class id is
    /// the sheet's context only; records stay keyed per student.
    pub fn save_attendance_sheet(
        &mut self,
        date: &str,
        marks: &[AttendanceMark],
    ) -> Result<(usize, usize), StoreError> {
        if !valid_iso_date(date) {
            return Err(StoreError::BadInput(format!("invalid date: {}", date)));
        }
        let mut attendance = self.attendance.clone();
        let mut next = next_id(&attendance, |r| r.id);
        let mut created = 0usize;
        let mut updated = 0usize;
        for mark in marks {
            match attendance
                .iter()
                .position(|r| r.student_id == mark.student_id && r.date == date)
            {
                Some(idx) => {
                    attendance[idx].status = mark.status;
                    attendance[idx].notes = mark.notes.clone();
                    updated += 1;
                }
                None => {
                    attendance.push(AttendanceRecord {
                        id: next,
                        student_id: mark.student_id,
                        date: date.to_string(),
                        status: mark.status,
                        notes: mark.notes.clone(),
                    });
                    next += 1;
                    created += 1;
                }
            }
        }
        self.persist(ATTENDANCE_SLOT, &attendance)?;
        self.attendance = attendance;
        Ok((created, updated))
    }

    /// A class filter resolves the current roster: records of students whose
    /// record points at that class.
    pub fn attendance_filtered(
        &self,
        class_id: Option<i64>,
        student_id: Option<i64>,
        date: Option<&str>,
    ) -> Vec<AttendanceRecord> {
        let roster: Option<Vec<i64>> = class_id.map(|c| {
            self.students
                .iter()
                .filter(|s| s.class_id == c)
                .map(|s| s.id)
                .collect()
        });
        self.attendance
            .iter()
            .filter(|r| {
                roster
                    .as_ref()
                    .map_or(true, |ids| ids.contains(&r.student_id))
            })
            .filter(|r| student_id.map_or(true, |s| r.student_id == s))
            .filter(|r| date.map_or(true, |d| r.date == d))
            .cloned()
            .collect()
    }

    // ---- schedule ----

    pub fn save_schedule(
        &mut self,
        input: ScheduleInput,
    ) -> Result<Option<ScheduleEntry>, StoreError> {
        for time in [input.start_time.as_deref(), input.end_time.as_deref()]
            .into_iter()
            .flatten()
        {
            if !valid_hhmm(time) {
                return Err(StoreError::BadInput(format!(
                    "times must be HH:mm, got {}",
                    time
                )));
            }
        }
        if let Some(subject) = input.subject.as_deref() {
            if subject.trim().is_empty() {
                return Err(StoreError::BadInput("subject must not be empty".to_string()));
            }
        }
        let mut schedule = self.schedule.clone();
        let saved = if let Some(id) = input.effective_id() {
            let Some(pos) = schedule.iter().position(|e| e.id == id) else {
                return Ok(None);
            };
            let merged = input.apply_to(&schedule[pos]);
            schedule[pos] = merged.clone();
            merged
        } else {
            let Some(class_id) = input.class_id else {
                return Err(StoreError::BadInput("missing classId".to_string()));
            };
            let Some(day_of_week) = input.day_of_week else {
                return Err(StoreError::BadInput("missing dayOfWeek".to_string()));
            };
            let start_time = require_trimmed(input.start_time.as_deref(), "startTime")?;
            let end_time = require_trimmed(input.end_time.as_deref(), "endTime")?;
            let subject = require_trimmed(input.subject.as_deref(), "subject")?;
            let created = ScheduleEntry {
                id: next_id(&schedule, |e| e.id),
                day_of_week,
                start_time,
                end_time,
                subject,
                class_id,
            };
            schedule.push(created.clone());
            created
        };
        self.persist(SCHEDULE_SLOT, &schedule)?;
        self.schedule = schedule;
        Ok(Some(saved))
    }

    pub fn delete_schedule(&mut self, entry_id: i64) -> Result<bool, StoreError> {
        let mut schedule = self.schedule.clone();
        let before = schedule.len();
        schedule.retain(|e| e.id != entry_id);
        if schedule.len() == before {
            return Ok(false);
        }
        self.persist(SCHEDULE_SLOT, &schedule)?;
        self.schedule = schedule;
        Ok(true)
    }

    pub fn schedule_filtered(&self, class_id: Option<i64>) -> Vec<ScheduleEntry> {
        self.schedule
            .iter()
            .filter(|e| class_id.map_or(true, |c| e.class_id == c))
            .cloned()
            .collect()
    }

    // ---- notices ----

    /// Create-only: fresh id, server-side timestamp, empty read list.
    pub fn send_notice(&mut self, draft: NoticeDraft) -> Result<Notice, StoreError> {
        if draft.content.trim().is_empty() {
            return Err(StoreError::BadInput("content must not be empty".to_string()));
        }
        let mut notices = self.notices.clone();
        let created = Notice {
            id: next_id(&notices, |n| n.id),
            content: draft.content,
            sender_id: draft.sender_id,
            recipient_id: draft.recipient_id,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            read_by: Vec::new(),
        };
        notices.push(created.clone());
        self.persist(NOTICES_SLOT, &notices)?;
        self.notices = notices;
        Ok(created)
    }

    /// Read receipts grow monotonically: re-marking is a no-op and skips the
    /// durable write. Only real user ids may appear in the read list.
    pub fn mark_notice_read(
        &mut self,
        notice_id: i64,
        user_id: i64,
    ) -> Result<Option<Notice>, StoreError> {
        if !self.users.iter().any(|u| u.id == user_id) {
            return Err(StoreError::BadInput(format!("unknown userId: {}", user_id)));
        }
        let mut notices = self.notices.clone();
        let Some(pos) = notices.iter().position(|n| n.id == notice_id) else {
            return Ok(None);
        };
        if notices[pos].read_by.contains(&user_id) {
            return Ok(Some(notices[pos].clone()));
        }
        notices[pos].read_by.push(user_id);
        let marked = notices[pos].clone();
        self.persist(NOTICES_SLOT, &notices)?;
        self.notices = notices;
        Ok(Some(marked))
    }

    pub fn delete_notice(&mut self, notice_id: i64) -> Result<bool, StoreError> {
        let mut notices = self.notices.clone();
        let before = notices.len();
        notices.retain(|n| n.id != notice_id);
        if notices.len() == before {
            return Ok(false);
        }
        self.persist(NOTICES_SLOT, &notices)?;
        self.notices = notices;
        Ok(true)
    }

    // ---- snapshot ----

    pub fn snapshot(&self) -> SnapshotDocument {
        SnapshotDocument {
            users: self.users.clone(),
            classes: self.classes.clone(),
            students: self.students.clone(),
            notices: self.notices.clone(),
            schedule: self.schedule.clone(),
            attendance: self.attendance.clone(),
        }
    }

    /// Full-state transplant: all six slots are written in one transaction,
    /// then all six collections are replaced in memory. Any failure leaves
    /// both copies of the prior state intact.
    pub fn import_snapshot(&mut self, doc: SnapshotDocument) -> Result<(), StoreError> {
        let docs = [
            (USERS_SLOT, encode(&doc.users)?),
            (CLASSES_SLOT, encode(&doc.classes)?),
            (STUDENTS_SLOT, encode(&doc.students)?),
            (NOTICES_SLOT, encode(&doc.notices)?),
            (SCHEDULE_SLOT, encode(&doc.schedule)?),
            (ATTENDANCE_SLOT, encode(&doc.attendance)?),
        ];
        self.backend.save_many(&docs).map_err(StoreError::Storage)?;
        info!(
            users = doc.users.len(),
            classes = doc.classes.len(),
            students = doc.students.len(),
            notices = doc.notices.len(),
            schedule = doc.schedule.len(),
            attendance = doc.attendance.len(),
            "replacing all collections from imported snapshot"
        );
        self.users = doc.users;
        self.classes = doc.classes;
        self.students = doc.students;
        self.notices = doc.notices;
        self.schedule = doc.schedule;
        self.attendance = doc.attendance;
        Ok(())
    }

    fn persist<T: Serialize>(&mut self, slot: &str, rows: &[T]) -> Result<(), StoreError> {
        let doc = encode(rows)?;
        self.backend.save(slot, &doc).map_err(StoreError::Storage)
    }

    #[cfg(test)]
    fn into_backend(self) -> B {
        self.backend
    }
}

fn encode<T: Serialize>(rows: &[T]) -> Result<String, StoreError> {
    serde_json::to_string(rows).map_err(|e| StoreError::Storage(e.into()))
}

fn next_id<T>(rows: &[T], id: impl Fn(&T) -> i64) -> i64 {
    rows.iter().map(id).max().map_or(1, |max| max + 1)
}

fn require_trimmed(value: Option<&str>, field: &str) -> Result<String, StoreError> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(StoreError::BadInput(format!("missing {}", field)));
    }
    Ok(trimmed.to_string())
}

fn load_slot<B: StorageBackend, T: serde::de::DeserializeOwned>(
    backend: &B,
    slot: &str,
    default: fn() -> Vec<T>,
) -> anyhow::Result<Vec<T>> {
    let Some(doc) = backend.load(slot)? else {
        return Ok(default());
    };
    match serde_json::from_str(&doc) {
        Ok(rows) => Ok(rows),
        Err(e) => {
            warn!(slot, error = %e, "stored collection failed to decode, falling back to defaults");
            Ok(default())
        }
    }
}

// A fresh workspace would otherwise have no account to log into.
fn bootstrap_users() -> Vec<User> {
    vec![User {
        id: 1,
        name: "Administrador".to_string(),
        login: "admin".to_string(),
        email: None,
        role: Role::AdminMaster,
        password: Some("senha123".to_string()),
        class_id: None,
        student_id: None,
    }]
}
