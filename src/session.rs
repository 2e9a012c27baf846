use serde_json::json;

use crate::model::{cpf_digits, Role, Student, User};

/// The active identity. Parent sessions are a separate variant bound to the
/// student record instead of a synthesized user id, so they can never collide
/// with the real user id space.
#[derive(Debug, Clone)]
pub enum Session {
    Staff {
        user: User,
    },
    Parent {
        student_id: i64,
        student_name: String,
        cpf: String,
    },
}

impl Session {
    /// The shape handed to the UI. Staff payloads are the user profile
    /// without the password; parent payloads carry the bound student.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            Session::Staff { user } => json!({
                "kind": "staff",
                "user": user.profile(),
            }),
            Session::Parent {
                student_id,
                student_name,
                cpf,
            } => json!({
                "kind": "parent",
                "studentId": student_id,
                "name": format!("Responsável por {}", student_name),
                "login": cpf,
                "role": Role::Responsavel,
            }),
        }
    }
}

/// Resolves a login attempt: first an exact (login, password) match over the
/// staff accounts, then the parent path, where the login's digits must equal
/// a student's cpf digits and the password must be that cpf's first five
/// digits. `None` deliberately says nothing about which check failed.
pub fn resolve(
    users: &[User],
    students: &[Student],
    login: &str,
    password: &str,
) -> Option<Session> {
    if let Some(user) = users
        .iter()
        .find(|u| u.login == login && u.password.as_deref() == Some(password))
    {
        return Some(Session::Staff { user: user.clone() });
    }

    let login_digits = cpf_digits(login);
    if login_digits.is_empty() {
        return None;
    }
    let student = students.iter().find(|s| {
        let digits = s.cpf_digits();
        if digits.is_empty() || digits != login_digits {
            return false;
        }
        let prefix = &digits[..digits.len().min(5)];
        prefix == password
    })?;
    Some(Session::Parent {
        student_id: student.id,
        student_name: student.name.clone(),
        cpf: student.cpf.clone().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> Vec<User> {
        serde_json::from_value(json!([
            { "id": 1, "name": "Administrador", "login": "admin",
              "role": "Admin Master", "password": "senha123" },
            { "id": 3, "name": "Beatriz", "login": "bia",
              "role": "Professor", "classId": 1, "password": "aula2024" },
            { "id": 4, "name": "Sem Senha", "login": "mudo", "role": "Diretor" }
        ]))
        .expect("decode users")
    }

    fn students() -> Vec<Student> {
        serde_json::from_value(json!([
            { "id": 2, "name": "Lucas Pereira", "cpf": "111.222.333-44",
              "dob": "2021-03-15", "classId": 1, "shift": "Manhã",
              "status": "active",
              "guardians": [{ "name": "Mariana", "phone": "11 98765-4321" }] }
        ]))
        .expect("decode students")
    }

    #[test]
    fn staff_login_requires_exact_match() {
        let session = resolve(&users(), &students(), "bia", "aula2024").expect("session");
        match session {
            Session::Staff { user } => assert_eq!(user.id, 3),
            other => panic!("expected staff session, got {:?}", other),
        }
        assert!(resolve(&users(), &students(), "bia", "errada").is_none());
        assert!(resolve(&users(), &students(), "Bia", "aula2024").is_none());
    }

    #[test]
    fn user_without_password_cannot_log_in() {
        assert!(resolve(&users(), &students(), "mudo", "").is_none());
    }

    #[test]
    fn parent_login_matches_cpf_digits_in_any_formatting() {
        for login in ["111.222.333-44", "11122233344", "111222333-44"] {
            let session =
                resolve(&users(), &students(), login, "11122").expect("parent session");
            match session {
                Session::Parent {
                    student_id,
                    student_name,
                    cpf,
                } => {
                    assert_eq!(student_id, 2);
                    assert_eq!(student_name, "Lucas Pereira");
                    assert_eq!(cpf, "111.222.333-44");
                }
                other => panic!("expected parent session, got {:?}", other),
            }
        }
    }

    #[test]
    fn parent_login_rejects_wrong_prefix() {
        assert!(resolve(&users(), &students(), "111.222.333-44", "11123").is_none());
        assert!(resolve(&users(), &students(), "999.888.777-66", "99988").is_none());
    }

    #[test]
    fn staff_payload_never_carries_password() {
        let session = resolve(&users(), &students(), "admin", "senha123").expect("session");
        let payload = session.payload();
        assert_eq!(payload["kind"], "staff");
        assert_eq!(payload["user"]["login"], "admin");
        assert!(payload["user"].get("password").is_none());
    }

    #[test]
    fn parent_payload_describes_the_bound_student() {
        let session =
            resolve(&users(), &students(), "11122233344", "11122").expect("session");
        let payload = session.payload();
        assert_eq!(payload["kind"], "parent");
        assert_eq!(payload["studentId"], 2);
        assert_eq!(payload["name"], "Responsável por Lucas Pereira");
        assert_eq!(payload["role"], "Responsável");
    }
}
