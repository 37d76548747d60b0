//! Builds the input object for the re-registration document renderer.
//!
//! The renderer expects a fixed shape: every optional field is present and
//! serialized as `null` when unknown. Live documents come from a registration
//! record and the committee member who signs for its academic year; previews
//! use a constant placeholder registrant so signature layout can be checked
//! without touching real identity data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use crate::pagination::UpstreamCollection;

pub const PLACEHOLDER_NAME: &str = "[Committee member name]";
pub const PLACEHOLDER_POSITION: &str = "[Position]";
pub const PLACEHOLDER_NIP: &str = "[NIP]";
pub const PLACEHOLDER_PLACE: &str = "[Place]";
pub const PLACEHOLDER_DATE: &str = "[Date]";
pub const PLACEHOLDER_SIGNATURE: &str = "[Signature]";
pub const PLACEHOLDER_STAMP: &str = "[Stamp]";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssembleError {
    #[error("{0} not found")]
    RecordNotFound(&'static str),
    #[error("malformed upstream record: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitteeRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(alias = "academic_year_id")]
    pub academic_year_id: i64,
    pub name: String,
    pub position: String,
    #[serde(default)]
    pub nip: Option<String>,
    pub place: String,
    #[serde(alias = "default_date")]
    pub default_date: String,
    #[serde(default, alias = "signature_url")]
    pub signature_url: String,
    #[serde(default, alias = "stamp_url")]
    pub stamp_url: String,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial committee used only for previews. Unset or blank fields fall back
/// to the stored record, then to placeholder text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitteeOverride {
    #[serde(default, alias = "academic_year_id")]
    pub academic_year_id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub nip: Option<String>,
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default, alias = "default_date")]
    pub default_date: Option<String>,
    #[serde(default, alias = "signature_url")]
    pub signature_url: Option<String>,
    #[serde(default, alias = "stamp_url")]
    pub stamp_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LivingStatus {
    #[serde(alias = "hidup", alias = "living")]
    Alive,
    #[serde(alias = "meninggal", alias = "dead")]
    Deceased,
    #[default]
    #[serde(other)]
    Unknown,
}

fn status_or_unknown<'de, D>(deserializer: D) -> Result<LivingStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<LivingStatus>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDetail {
    pub full_name: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub nisn: Option<String>,
    #[serde(default)]
    pub nik: Option<String>,
    #[serde(default)]
    pub birth_place: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub religion: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub previous_school: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentDetail {
    #[serde(default)]
    pub father_name: Option<String>,
    #[serde(default)]
    pub father_nik: Option<String>,
    #[serde(default)]
    pub father_occupation: Option<String>,
    #[serde(default)]
    pub father_phone: Option<String>,
    #[serde(default, deserialize_with = "status_or_unknown")]
    pub father_status: LivingStatus,
    #[serde(default)]
    pub mother_name: Option<String>,
    #[serde(default)]
    pub mother_nik: Option<String>,
    #[serde(default)]
    pub mother_occupation: Option<String>,
    #[serde(default)]
    pub mother_phone: Option<String>,
    #[serde(default, deserialize_with = "status_or_unknown")]
    pub mother_status: LivingStatus,
    #[serde(default)]
    pub guardian_name: Option<String>,
    #[serde(default)]
    pub guardian_occupation: Option<String>,
    #[serde(default)]
    pub guardian_phone: Option<String>,
    #[serde(default)]
    pub guardian_relationship: Option<String>,
}

/// Registration as the upstream returns it. The upstream embeds the committee
/// member resolved for the registration's academic year as `committee`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    #[serde(alias = "registration_number")]
    pub registration_number: i64,
    #[serde(default, alias = "academic_year_id")]
    pub academic_year_id: Option<i64>,
    #[serde(default, alias = "major_choice_code")]
    pub major_choice_code: Option<String>,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default, alias = "updated_at")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(alias = "student_detail")]
    pub student_detail: StudentDetail,
    #[serde(alias = "parent_detail")]
    pub parent_detail: ParentDetail,
    #[serde(default, alias = "major_choice")]
    pub major_choice: Option<Value>,
    #[serde(default)]
    pub author: Option<Value>,
    #[serde(default)]
    pub committee: Option<CommitteeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInput {
    pub registration_number: i64,
    pub major_choice_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub student_detail: StudentDetail,
    pub parent_detail: ParentDetail,
    pub major_choice: Option<Value>,
    pub author: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatorySection {
    pub name: String,
    pub position: String,
    pub nip: Option<String>,
    pub place: String,
    pub date: String,
    pub signature_url: String,
    pub stamp_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReregistrationDocument {
    pub preview: bool,
    pub document: DocumentInput,
    pub committee: SignatorySection,
}

impl From<&CommitteeRecord> for SignatorySection {
    fn from(record: &CommitteeRecord) -> Self {
        Self {
            name: record.name.clone(),
            position: record.position.clone(),
            nip: record.nip.clone().filter(|nip| !nip.trim().is_empty()),
            place: record.place.clone(),
            date: record.default_date.clone(),
            signature_url: record.signature_url.clone(),
            stamp_url: record.stamp_url.clone(),
        }
    }
}

fn unwrap_data(payload: Value) -> Value {
    match payload {
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Decodes a single registration reply, accepting a `{ data: {...} }` wrapper.
pub fn parse_registration(payload: Value) -> Result<RegistrationRecord, AssembleError> {
    match unwrap_data(payload) {
        Value::Null => Err(AssembleError::RecordNotFound("registration")),
        record => serde_json::from_value(record)
            .map_err(|err| AssembleError::Malformed(format!("registration: {err}"))),
    }
}

/// Decodes a committee list reply. Entries that do not decode are skipped.
pub fn parse_committees(payload: Value) -> Vec<CommitteeRecord> {
    UpstreamCollection::classify(payload)
        .into_items()
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(error = %err, "skipping committee record that does not decode");
                None
            }
        })
        .collect()
}

/// Most recently stored committee record for the academic year.
pub fn latest_committee(
    records: &[CommitteeRecord],
    academic_year_id: i64,
) -> Option<&CommitteeRecord> {
    records
        .iter()
        .filter(|record| record.academic_year_id == academic_year_id)
        .max_by_key(|record| (record.updated_at, record.created_at, record.id))
}

fn major_code(registration: &RegistrationRecord) -> String {
    registration
        .major_choice_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .or_else(|| {
            registration
                .major_choice
                .as_ref()
                .and_then(|choice| crate::options::text_field(choice, "code"))
        })
        .unwrap_or_default()
}

pub fn assemble_live(
    registration: RegistrationRecord,
    committee: Option<&CommitteeRecord>,
) -> Result<ReregistrationDocument, AssembleError> {
    let committee = committee.ok_or(AssembleError::RecordNotFound("committee"))?;
    if let Some(year) = registration.academic_year_id {
        if year != committee.academic_year_id {
            return Err(AssembleError::RecordNotFound("committee"));
        }
    }

    let major_choice_code = major_code(&registration);
    let document = DocumentInput {
        registration_number: registration.registration_number,
        major_choice_code,
        created_at: registration.created_at,
        updated_at: registration.updated_at,
        student_detail: registration.student_detail,
        parent_detail: registration.parent_detail,
        major_choice: registration.major_choice,
        author: registration.author,
    };

    Ok(ReregistrationDocument {
        preview: false,
        document,
        committee: SignatorySection::from(committee),
    })
}

fn pick(
    override_value: Option<&String>,
    stored: Option<&str>,
    placeholder: &'static str,
) -> String {
    override_value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .or_else(|| stored.map(str::trim).filter(|v| !v.is_empty()))
        .unwrap_or(placeholder)
        .to_string()
}

fn preview_signatory(
    committee_override: &CommitteeOverride,
    stored: Option<&CommitteeRecord>,
) -> SignatorySection {
    let o = committee_override;
    SignatorySection {
        name: pick(o.name.as_ref(), stored.map(|s| s.name.as_str()), PLACEHOLDER_NAME),
        position: pick(
            o.position.as_ref(),
            stored.map(|s| s.position.as_str()),
            PLACEHOLDER_POSITION,
        ),
        nip: Some(pick(
            o.nip.as_ref(),
            stored.and_then(|s| s.nip.as_deref()),
            PLACEHOLDER_NIP,
        )),
        place: pick(o.place.as_ref(), stored.map(|s| s.place.as_str()), PLACEHOLDER_PLACE),
        date: pick(
            o.default_date.as_ref(),
            stored.map(|s| s.default_date.as_str()),
            PLACEHOLDER_DATE,
        ),
        signature_url: pick(
            o.signature_url.as_ref(),
            stored.map(|s| s.signature_url.as_str()),
            PLACEHOLDER_SIGNATURE,
        ),
        stamp_url: pick(
            o.stamp_url.as_ref(),
            stored.map(|s| s.stamp_url.as_str()),
            PLACEHOLDER_STAMP,
        ),
    }
}

/// Constant registrant used for previews.
pub fn preview_template(now: DateTime<Utc>) -> DocumentInput {
    DocumentInput {
        registration_number: 20250001,
        major_choice_code: "PREVIEW".to_string(),
        created_at: now,
        updated_at: None,
        student_detail: StudentDetail {
            full_name: "Sample Student".to_string(),
            nickname: Some("Sample".to_string()),
            nisn: Some("0000000000".to_string()),
            nik: Some("0000000000000000".to_string()),
            birth_place: Some("Sample City".to_string()),
            birth_date: Some("2010-01-01".to_string()),
            gender: Some("male".to_string()),
            religion: Some("-".to_string()),
            address: Some("Jl. Contoh No. 1".to_string()),
            phone: Some("080000000000".to_string()),
            email: Some("student@example.test".to_string()),
            previous_school: Some("Sample Junior High School".to_string()),
        },
        parent_detail: ParentDetail {
            father_name: Some("Sample Father".to_string()),
            father_nik: Some("0000000000000001".to_string()),
            father_occupation: Some("Employee".to_string()),
            father_phone: Some("080000000001".to_string()),
            father_status: LivingStatus::Alive,
            mother_name: Some("Sample Mother".to_string()),
            mother_nik: Some("0000000000000002".to_string()),
            mother_occupation: Some("Teacher".to_string()),
            mother_phone: Some("080000000002".to_string()),
            mother_status: LivingStatus::Alive,
            guardian_name: None,
            guardian_occupation: None,
            guardian_phone: None,
            guardian_relationship: None,
        },
        major_choice: Some(json!({ "code": "PREVIEW", "name": "Preview Major" })),
        author: None,
    }
}

pub fn assemble_preview(
    committee_override: &CommitteeOverride,
    stored: Option<&CommitteeRecord>,
    now: DateTime<Utc>,
) -> ReregistrationDocument {
    ReregistrationDocument {
        preview: true,
        document: preview_template(now),
        committee: preview_signatory(committee_override, stored),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn committee(id: i64, year: i64, name: &str, updated: Option<&str>) -> CommitteeRecord {
        CommitteeRecord {
            id: Some(id),
            academic_year_id: year,
            name: name.to_string(),
            position: "Head of Admissions".to_string(),
            nip: None,
            place: "Bandung".to_string(),
            default_date: "2025-07-01".to_string(),
            signature_url: format!("https://cdn.example.test/sig-{id}.png"),
            stamp_url: format!("https://cdn.example.test/stamp-{id}.png"),
            created_at: None,
            updated_at: updated.map(|u| u.parse().unwrap()),
        }
    }

    fn registration_payload() -> Value {
        json!({
            "data": {
                "registrationNumber": 1042,
                "academicYearId": 3,
                "createdAt": "2025-06-01T08:00:00Z",
                "updatedAt": null,
                "studentDetail": { "fullName": "Rina Kartika", "nisn": "0091234567" },
                "parentDetail": {
                    "fatherName": "Budi",
                    "fatherStatus": "deceased",
                    "motherStatus": "hidup",
                    "guardianName": null
                },
                "majorChoice": { "code": "RPL", "name": "Software Engineering" },
                "author": null,
                "committee": {
                    "id": 7,
                    "academicYearId": 3,
                    "name": "Dra. Sri Wahyuni",
                    "position": "Principal",
                    "nip": null,
                    "place": "Bandung",
                    "defaultDate": "2025-07-14",
                    "signatureUrl": "https://cdn.example.test/sig.png",
                    "stampUrl": "https://cdn.example.test/stamp.png"
                }
            }
        })
    }

    #[test]
    fn live_document_keeps_fixed_shape_with_nulls() {
        let mut registration = parse_registration(registration_payload()).unwrap();
        let committee = registration.committee.take();
        let document = assemble_live(registration, committee.as_ref()).unwrap();
        let value = serde_json::to_value(&document).unwrap();

        assert_eq!(value["preview"], false);
        assert_eq!(value["document"]["registrationNumber"], 1042);
        assert_eq!(value["document"]["majorChoiceCode"], "RPL");
        assert_eq!(value["document"]["updatedAt"], Value::Null);
        assert_eq!(value["document"]["author"], Value::Null);
        assert_eq!(value["document"]["parentDetail"]["guardianName"], Value::Null);
        assert_eq!(value["document"]["parentDetail"]["fatherStatus"], "deceased");
        assert_eq!(value["document"]["parentDetail"]["motherStatus"], "alive");
        assert_eq!(value["document"]["parentDetail"]["guardianPhone"], Value::Null);
        assert_eq!(value["document"]["studentDetail"]["email"], Value::Null);
        assert!(value["committee"].as_object().unwrap().contains_key("nip"));
        assert_eq!(value["committee"]["nip"], Value::Null);
        assert_eq!(value["committee"]["date"], "2025-07-14");
    }

    #[test]
    fn live_document_requires_committee() {
        let mut registration = parse_registration(registration_payload()).unwrap();
        registration.committee = None;
        assert_eq!(
            assemble_live(registration, None).unwrap_err(),
            AssembleError::RecordNotFound("committee")
        );
    }

    #[test]
    fn live_document_rejects_committee_from_another_year() {
        let registration = parse_registration(registration_payload()).unwrap();
        let other = committee(1, 99, "Other", None);
        assert_eq!(
            assemble_live(registration, Some(&other)).unwrap_err(),
            AssembleError::RecordNotFound("committee")
        );
    }

    #[test]
    fn missing_registration_is_not_found_and_garbage_is_malformed() {
        assert_eq!(
            parse_registration(Value::Null).unwrap_err(),
            AssembleError::RecordNotFound("registration")
        );
        assert!(matches!(
            parse_registration(json!({ "registrationNumber": "x" })),
            Err(AssembleError::Malformed(_))
        ));
    }

    #[test]
    fn preview_without_override_or_record_uses_placeholders() {
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap();
        let document = assemble_preview(&CommitteeOverride::default(), None, now);
        let value = serde_json::to_value(&document).unwrap();
        let committee = value["committee"].as_object().unwrap();

        for (field, expected) in [
            ("name", PLACEHOLDER_NAME),
            ("position", PLACEHOLDER_POSITION),
            ("nip", PLACEHOLDER_NIP),
            ("place", PLACEHOLDER_PLACE),
            ("date", PLACEHOLDER_DATE),
            ("signatureUrl", PLACEHOLDER_SIGNATURE),
            ("stampUrl", PLACEHOLDER_STAMP),
        ] {
            assert_eq!(committee[field], expected, "{field}");
        }
        assert_eq!(value["preview"], true);
        assert_eq!(value["document"]["studentDetail"]["fullName"], "Sample Student");
    }

    #[test]
    fn preview_override_beats_stored_record_which_beats_placeholder() {
        let stored = committee(4, 3, "Stored Name", None);
        let committee_override = CommitteeOverride {
            name: Some("Override Name".to_string()),
            place: Some("   ".to_string()),
            ..CommitteeOverride::default()
        };
        let document = assemble_preview(&committee_override, Some(&stored), Utc::now());

        assert_eq!(document.committee.name, "Override Name");
        assert_eq!(document.committee.place, "Bandung");
        assert_eq!(document.committee.position, "Head of Admissions");
        assert_eq!(document.committee.nip.as_deref(), Some(PLACEHOLDER_NIP));
    }

    #[test]
    fn null_or_unrecognised_living_status_is_unknown() {
        let parent: ParentDetail = serde_json::from_value(json!({
            "fatherStatus": null,
            "motherStatus": "divorced"
        }))
        .unwrap();
        assert_eq!(parent.father_status, LivingStatus::Unknown);
        assert_eq!(parent.mother_status, LivingStatus::Unknown);
    }

    #[test]
    fn latest_committee_prefers_most_recent_update_in_year() {
        let records = vec![
            committee(1, 3, "Old", Some("2024-01-01T00:00:00Z")),
            committee(2, 3, "New", Some("2025-02-01T00:00:00Z")),
            committee(3, 4, "Other year", Some("2026-01-01T00:00:00Z")),
            committee(4, 3, "Never updated", None),
        ];
        assert_eq!(latest_committee(&records, 3).map(|c| c.name.as_str()), Some("New"));
        assert!(latest_committee(&records, 5).is_none());
    }

    #[test]
    fn committee_list_skips_undecodable_entries() {
        let records = parse_committees(json!({
            "meta": { "total": 2 },
            "data": [
                {
                    "id": 1, "academicYearId": 3, "name": "A", "position": "P",
                    "place": "X", "defaultDate": "2025-07-01"
                },
                { "id": 2, "name": "missing fields" }
            ]
        }));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].signature_url, "");
    }
}
