//! Tourist profile types for tourwatch.
//!
//! This module defines the in-memory records an officer reviews after a
//! scan: the tourist record itself, its safety status, the last known
//! location, and the read-only access log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name shown when a structured payload carries an identity but no name.
pub const UNKNOWN_TOURIST_NAME: &str = "Unknown Tourist";

/// Safety status of a tourist.
///
/// Any status can be set from any other; there is no transition table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// No known issue.
    #[default]
    Safe,
    /// The tourist needs assistance (SOS).
    Danger,
    /// The tourist is inside a restricted zone.
    Warning,
}

impl Status {
    /// All statuses, in display order.
    pub const ALL: [Self; 3] = [Self::Safe, Self::Danger, Self::Warning];

    /// The wire name of this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Danger => "danger",
            Self::Warning => "warning",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last known position of a tourist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lng: f64,
    /// Free-text street address.
    pub address: String,
    /// When the position was reported, as supplied by the tracking feed.
    pub timestamp: String,
}

/// Person to call on the tourist's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    /// Contact name.
    pub name: String,
    /// Contact phone number.
    pub number: String,
}

/// The profile shown to an officer after a successful scan.
///
/// A record is built fresh for every scan and never updated in place except
/// for its `status`, which mirrors the dashboard's current status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouristRecord {
    /// Tourist identity.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: u32,
    /// Gender as registered.
    pub gender: String,
    /// Profile photo URL.
    pub photo: String,
    /// Kind of identification document (passport, national ID, ...).
    pub id_proof_type: String,
    /// Identification document number.
    pub id_proof_number: String,
    /// Tourist's own phone number.
    pub mobile_number: String,
    /// Emergency contact.
    pub emergency_contact: EmergencyContact,
    /// Planned itinerary, in order.
    pub itinerary: Vec<String>,
    /// Current safety status.
    pub status: Status,
    /// Last known location.
    pub last_location: Location,
    /// The scan code this record was built from.
    pub qr_code_id: String,
    /// When the scan was interpreted.
    pub scanned_at: DateTime<Utc>,
    /// BLAKE3 digest over the record's identifying fields.
    pub integrity_tag: String,
}

impl TouristRecord {
    /// The fixed demonstration profile every scan starts from.
    #[must_use]
    pub fn baseline(scanned_at: DateTime<Utc>) -> Self {
        let mut record = Self {
            id: "T001".to_string(),
            name: "Sarah Johnson".to_string(),
            age: 28,
            gender: "Female".to_string(),
            photo: "https://images.unsplash.com/photo-1494790108755-2616b612b786?w=400&h=400&fit=crop&crop=face".to_string(),
            id_proof_type: "Passport".to_string(),
            id_proof_number: "US123456789".to_string(),
            mobile_number: "+1-555-0123".to_string(),
            emergency_contact: EmergencyContact {
                name: "John Johnson".to_string(),
                number: "+1-555-0124".to_string(),
            },
            itinerary: vec![
                "Day 1: Arrival at Mumbai Airport".to_string(),
                "Day 2: Visit Gateway of India".to_string(),
                "Day 3: Elephanta Caves Tour".to_string(),
                "Day 4: Marine Drive & Colaba Market".to_string(),
                "Day 5: Departure".to_string(),
            ],
            status: Status::Safe,
            last_location: Location {
                lat: 18.9220,
                lng: 72.8347,
                address: "Gateway of India, Mumbai, Maharashtra 400001".to_string(),
                timestamp: "2024-01-15 14:30:22".to_string(),
            },
            qr_code_id: "QR_T001_2024".to_string(),
            scanned_at,
            integrity_tag: String::new(),
        };
        record.seal();
        record
    }

    /// Compute the integrity tag for the record's current contents.
    ///
    /// The digest covers every field except `status` (which the dashboard
    /// mutates after the scan) and the tag itself. Each field is length
    /// prefixed so adjacent fields cannot run together. There is no key, so
    /// anyone holding the record can recompute the tag: it detects
    /// accidental edits, not deliberate tampering.
    #[must_use]
    pub fn compute_integrity_tag(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        let mut field = |bytes: &[u8]| {
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        };

        field(self.id.as_bytes());
        field(self.name.as_bytes());
        field(&self.age.to_le_bytes());
        field(self.gender.as_bytes());
        field(self.photo.as_bytes());
        field(self.id_proof_type.as_bytes());
        field(self.id_proof_number.as_bytes());
        field(self.mobile_number.as_bytes());
        field(self.emergency_contact.name.as_bytes());
        field(self.emergency_contact.number.as_bytes());
        field(&(self.itinerary.len() as u64).to_le_bytes());
        for entry in &self.itinerary {
            field(entry.as_bytes());
        }
        field(&self.last_location.lat.to_le_bytes());
        field(&self.last_location.lng.to_le_bytes());
        field(self.last_location.address.as_bytes());
        field(self.last_location.timestamp.as_bytes());
        field(self.qr_code_id.as_bytes());
        field(self.scanned_at.to_rfc3339().as_bytes());

        hasher.finalize().to_hex().to_string()
    }

    /// Recompute and store the integrity tag.
    pub fn seal(&mut self) {
        self.integrity_tag = self.compute_integrity_tag();
    }

    /// Check that the stored integrity tag matches the record's contents.
    #[must_use]
    pub fn verify_integrity(&self) -> bool {
        self.integrity_tag == self.compute_integrity_tag()
    }
}

/// One entry of the officer access log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    /// Entry identifier.
    pub id: String,
    /// Badge number of the officer.
    pub officer_id: String,
    /// Officer display name.
    pub officer_name: String,
    /// When the access happened.
    pub timestamp: String,
    /// What the officer did.
    pub action: String,
    /// Where it happened.
    pub location: String,
}

impl AccessLogEntry {
    fn new(
        id: &str,
        officer_id: &str,
        officer_name: &str,
        timestamp: &str,
        action: &str,
        location: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            officer_id: officer_id.to_string(),
            officer_name: officer_name.to_string(),
            timestamp: timestamp.to_string(),
            action: action.to_string(),
            location: location.to_string(),
        }
    }
}

/// The demonstration access log, newest entry first.
#[must_use]
pub fn mock_access_logs() -> Vec<AccessLogEntry> {
    vec![
        AccessLogEntry::new(
            "1",
            "P001",
            "Officer Singh",
            "2024-01-15 14:25:10",
            "QR Code Scanned",
            "Gateway of India",
        ),
        AccessLogEntry::new(
            "2",
            "P002",
            "Officer Patel",
            "2024-01-15 12:15:30",
            "Status Check",
            "Colaba Police Station",
        ),
        AccessLogEntry::new(
            "3",
            "P001",
            "Officer Singh",
            "2024-01-15 10:45:15",
            "Initial Registration",
            "Mumbai Airport",
        ),
    ]
}
