use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use super::enums::Role;

/// A registered user. Role-specific attributes live in `kind`, so a doctor
/// profile exists exactly when the account is a doctor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(flatten)]
    pub kind: AccountKind,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum AccountKind {
    Patient,
    Doctor(DoctorProfile),
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoctorProfile {
    pub specialization: String,
    pub experience_years: u32,
    pub contact_phone: String,
    pub bio: String,
    pub registration_id: String,
}

impl AccountKind {
    pub fn role(&self) -> Role {
        match self {
            AccountKind::Patient => Role::Patient,
            AccountKind::Doctor(_) => Role::Doctor,
            AccountKind::Admin => Role::Admin,
        }
    }
}

impl Account {
    pub fn role(&self) -> Role {
        self.kind.role()
    }

    pub fn doctor_profile(&self) -> Option<&DoctorProfile> {
        match &self.kind {
            AccountKind::Doctor(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn is_doctor(&self) -> bool {
        matches!(self.kind, AccountKind::Doctor(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor() -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "Dr. Rao".into(),
            email: "rao@clinic.test".into(),
            kind: AccountKind::Doctor(DoctorProfile {
                specialization: "Cardiology".into(),
                experience_years: 12,
                contact_phone: "555-0100".into(),
                bio: "Heart specialist".into(),
                registration_id: "MD-4X7Q2Z".into(),
            }),
            created_at: chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn doctor_serializes_with_flattened_role_and_profile() {
        let json = serde_json::to_value(doctor()).unwrap();
        assert_eq!(json["role"], "doctor");
        assert_eq!(json["specialization"], "Cardiology");
        assert_eq!(json["registration_id"], "MD-4X7Q2Z");
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn patient_has_no_doctor_fields() {
        let mut account = doctor();
        account.kind = AccountKind::Patient;
        assert_eq!(account.role(), Role::Patient);
        assert!(account.doctor_profile().is_none());
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["role"], "patient");
        assert!(json.get("specialization").is_none());
    }
}
