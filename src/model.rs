use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// Wire format parity matters here: slot payloads and backup documents must
// round-trip with the predecessor app's JSON (camelCase keys, Portuguese
// enum strings), so field names and renames below are not negotiable.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Admin Master")]
    AdminMaster,
    Diretor,
    Coordenador,
    Professor,
    Psicopedagogo,
    #[serde(rename = "Responsável")]
    Responsavel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<i64>,
}

impl User {
    /// The user as shown to consumers: every persisted field except the
    /// password, which never leaves the store outside backup documents.
    pub fn profile(&self) -> serde_json::Value {
        let mut value = serde_json::json!({
            "id": self.id,
            "name": self.name,
            "login": self.login,
            "role": self.role,
        });
        if let Some(email) = &self.email {
            value["email"] = serde_json::json!(email);
        }
        if let Some(class_id) = self.class_id {
            value["classId"] = serde_json::json!(class_id);
        }
        if let Some(student_id) = self.student_id {
            value["studentId"] = serde_json::json!(student_id);
        }
        value
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub class_id: Option<i64>,
    #[serde(default)]
    pub student_id: Option<i64>,
}

impl UserInput {
    // 0 and negative ids count as "no id", like the predecessor's falsy check.
    pub fn effective_id(&self) -> Option<i64> {
        self.id.filter(|id| *id > 0)
    }

    pub fn apply_to(&self, existing: &User) -> User {
        User {
            id: existing.id,
            name: self.name.clone().unwrap_or_else(|| existing.name.clone()),
            login: self.login.clone().unwrap_or_else(|| existing.login.clone()),
            email: self.email.clone().or_else(|| existing.email.clone()),
            role: self.role.unwrap_or(existing.role),
            // A blank password on edit means "keep the current one".
            password: match self.password.as_deref() {
                Some(p) if !p.is_empty() => Some(p.to_string()),
                _ => existing.password.clone(),
            },
            class_id: self.class_id.or(existing.class_id),
            student_id: self.student_id.or(existing.student_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub teacher_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub teacher_id: Option<i64>,
}

impl ClassInput {
    pub fn effective_id(&self) -> Option<i64> {
        self.id.filter(|id| *id > 0)
    }

    pub fn apply_to(&self, existing: &Class) -> Class {
        Class {
            id: existing.id,
            name: self.name.clone().unwrap_or_else(|| existing.name.clone()),
            teacher_id: self.teacher_id.unwrap_or(existing.teacher_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Masculino,
    Feminino,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shift {
    #[serde(rename = "Manhã")]
    Manha,
    Tarde,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    Active,
    Inactive,
}

// Ordinal scale; variant order is the progression order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvaluationLevel {
    #[serde(rename = "Não observado")]
    NaoObservado,
    #[serde(rename = "Em desenvolvimento")]
    EmDesenvolvimento,
    Atingido,
    #[serde(rename = "Atingido com autonomia")]
    AtingidoComAutonomia,
}

pub type SkillMap = BTreeMap<String, EvaluationLevel>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DevelopmentGrid {
    #[serde(default)]
    pub motor: SkillMap,
    #[serde(default)]
    pub cognitive: SkillMap,
    #[serde(default)]
    pub language: SkillMap,
    #[serde(default)]
    pub social: SkillMap,
    #[serde(default)]
    pub autonomy: SkillMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationPeriod {
    pub period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub evaluations: DevelopmentGrid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psycho_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptive_report: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaEntry {
    pub date: String,
    #[serde(default)]
    pub meals: String,
    #[serde(default)]
    pub activities: String,
    #[serde(default)]
    pub observations: String,
    #[serde(default)]
    pub messages: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub important_notice: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentInfo {
    pub name: String,
    pub is_alive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voter_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voter_zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voter_section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthplace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guardian {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    pub dob: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_info: Option<ParentInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_info: Option<ParentInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,
    // May point at a class that no longer exists; such students count as
    // unassigned, not as errors.
    pub class_id: i64,
    pub shift: Shift,
    pub status: StudentStatus,
    #[serde(default)]
    pub guardians: Vec<Guardian>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_restrictions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_needs: Option<String>,
    #[serde(default)]
    pub evaluations: Vec<EvaluationPeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agenda: Option<Vec<AgendaEntry>>,
}

impl Student {
    pub fn cpf_digits(&self) -> String {
        self.cpf.as_deref().map(cpf_digits).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub mother_info: Option<ParentInfo>,
    #[serde(default)]
    pub father_info: Option<ParentInfo>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub class_id: Option<i64>,
    #[serde(default)]
    pub shift: Option<Shift>,
    #[serde(default)]
    pub status: Option<StudentStatus>,
    #[serde(default)]
    pub guardians: Option<Vec<Guardian>>,
    #[serde(default)]
    pub medical_notes: Option<String>,
    #[serde(default)]
    pub food_restrictions: Option<String>,
    #[serde(default)]
    pub school_history: Option<String>,
    #[serde(default)]
    pub special_needs: Option<String>,
    #[serde(default)]
    pub evaluations: Option<Vec<EvaluationPeriod>>,
    #[serde(default)]
    pub agenda: Option<Vec<AgendaEntry>>,
}

impl StudentInput {
    pub fn effective_id(&self) -> Option<i64> {
        self.id.filter(|id| *id > 0)
    }

    // An input that carries its own evaluations list is a complete record
    // and replaces wholesale; anything else is a form patch.
    pub fn is_complete(&self) -> bool {
        self.evaluations.is_some()
    }

    pub fn cpf_digits(&self) -> String {
        self.cpf.as_deref().map(cpf_digits).unwrap_or_default()
    }

    pub fn into_student(
        self,
        id: i64,
        evaluations: Vec<EvaluationPeriod>,
    ) -> Result<Student, String> {
        let name = require(self.name, "name")?;
        let dob = require(self.dob, "dob")?;
        let class_id = require(self.class_id, "classId")?;
        let shift = require(self.shift, "shift")?;
        let status = require(self.status, "status")?;
        let guardians = require(self.guardians, "guardians")?;
        if guardians.is_empty() {
            return Err("guardians must not be empty".to_string());
        }
        Ok(Student {
            id,
            name,
            cpf: self.cpf,
            dob,
            gender: self.gender,
            mother_info: self.mother_info,
            father_info: self.father_info,
            address: self.address,
            start_year: self.start_year,
            class_id,
            shift,
            status,
            guardians,
            medical_notes: self.medical_notes,
            food_restrictions: self.food_restrictions,
            school_history: self.school_history,
            special_needs: self.special_needs,
            evaluations,
            agenda: self.agenda,
        })
    }

    pub fn apply_to(&self, existing: &Student) -> Result<Student, String> {
        if let Some(guardians) = &self.guardians {
            if guardians.is_empty() {
                return Err("guardians must not be empty".to_string());
            }
        }
        Ok(Student {
            id: existing.id,
            name: self.name.clone().unwrap_or_else(|| existing.name.clone()),
            cpf: self.cpf.clone().or_else(|| existing.cpf.clone()),
            dob: self.dob.clone().unwrap_or_else(|| existing.dob.clone()),
            gender: self.gender.or(existing.gender),
            mother_info: self
                .mother_info
                .clone()
                .or_else(|| existing.mother_info.clone()),
            father_info: self
                .father_info
                .clone()
                .or_else(|| existing.father_info.clone()),
            address: self.address.clone().or_else(|| existing.address.clone()),
            start_year: self.start_year.or(existing.start_year),
            class_id: self.class_id.unwrap_or(existing.class_id),
            shift: self.shift.unwrap_or(existing.shift),
            status: self.status.unwrap_or(existing.status),
            guardians: self
                .guardians
                .clone()
                .unwrap_or_else(|| existing.guardians.clone()),
            medical_notes: self
                .medical_notes
                .clone()
                .or_else(|| existing.medical_notes.clone()),
            food_restrictions: self
                .food_restrictions
                .clone()
                .or_else(|| existing.food_restrictions.clone()),
            school_history: self
                .school_history
                .clone()
                .or_else(|| existing.school_history.clone()),
            special_needs: self
                .special_needs
                .clone()
                .or_else(|| existing.special_needs.clone()),
            // History survives a form patch unless explicitly overridden.
            evaluations: self
                .evaluations
                .clone()
                .unwrap_or_else(|| existing.evaluations.clone()),
            agenda: self.agenda.clone().or_else(|| existing.agenda.clone()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    All,
    User(i64),
}

impl Serialize for Recipient {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Recipient::All => serializer.serialize_str("all"),
            Recipient::User(id) => serializer.serialize_i64(*id),
        }
    }
}

impl<'de> Deserialize<'de> for Recipient {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match &value {
            serde_json::Value::String(s) if s == "all" => Ok(Recipient::All),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Recipient::User)
                .ok_or_else(|| D::Error::custom("recipientId must be an integer id or \"all\"")),
            _ => Err(D::Error::custom(
                "recipientId must be an integer id or \"all\"",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: i64,
    pub content: String,
    pub sender_id: i64,
    pub recipient_id: Recipient,
    pub timestamp: String,
    #[serde(default)]
    pub read_by: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeDraft {
    pub content: String,
    pub sender_id: i64,
    pub recipient_id: Recipient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayOfWeek {
    #[serde(rename = "Segunda-feira")]
    Segunda,
    #[serde(rename = "Terça-feira")]
    Terca,
    #[serde(rename = "Quarta-feira")]
    Quarta,
    #[serde(rename = "Quinta-feira")]
    Quinta,
    #[serde(rename = "Sexta-feira")]
    Sexta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: i64,
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
    pub subject: String,
    pub class_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleInput {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub day_of_week: Option<DayOfWeek>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub class_id: Option<i64>,
}

impl ScheduleInput {
    pub fn effective_id(&self) -> Option<i64> {
        self.id.filter(|id| *id > 0)
    }

    pub fn apply_to(&self, existing: &ScheduleEntry) -> ScheduleEntry {
        ScheduleEntry {
            id: existing.id,
            day_of_week: self.day_of_week.unwrap_or(existing.day_of_week),
            start_time: self
                .start_time
                .clone()
                .unwrap_or_else(|| existing.start_time.clone()),
            end_time: self
                .end_time
                .clone()
                .unwrap_or_else(|| existing.end_time.clone()),
            subject: self
                .subject
                .clone()
                .unwrap_or_else(|| existing.subject.clone()),
            class_id: self.class_id.unwrap_or(existing.class_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Presente,
    Ausente,
    #[serde(rename = "Falta Justificada")]
    FaltaJustificada,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub id: i64,
    pub student_id: i64,
    pub date: String,
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceMark {
    pub student_id: i64,
    pub status: AttendanceStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

pub fn cpf_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn valid_iso_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

pub fn valid_hhmm(s: &str) -> bool {
    let Some((h, m)) = s.split_once(':') else {
        return false;
    };
    if h.len() != 2 || m.len() != 2 {
        return false;
    }
    let (Ok(h), Ok(m)) = (h.parse::<u8>(), m.parse::<u8>()) else {
        return false;
    };
    h < 24 && m < 60
}

fn require<T>(value: Option<T>, field: &str) -> Result<T, String> {
    value.ok_or_else(|| format!("missing {}", field))
}
