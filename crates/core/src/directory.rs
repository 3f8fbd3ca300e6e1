use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_LOCATION: &str = "New York, NY";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub rating: f32,
    pub address: String,
    pub phone: String,
    pub distance: String,
    pub availability: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub address: String,
    pub phone: String,
    pub emergency: bool,
    pub distance: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryKind {
    Doctors,
    Hospitals,
    All,
    /// An unrecognised `type` value: neither list is returned.
    Other,
}

impl DirectoryKind {
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("all") => Self::All,
            Some("doctors") => Self::Doctors,
            Some("hospitals") => Self::Hospitals,
            Some(_) => Self::Other,
        }
    }

    fn includes_doctors(self) -> bool {
        matches!(self, Self::Doctors | Self::All)
    }

    fn includes_hospitals(self) -> bool {
        matches!(self, Self::Hospitals | Self::All)
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryQuery {
    pub location: String,
    pub kind: DirectoryKind,
    pub specialty: Option<String>,
    pub emergency_only: bool,
}

impl Default for DirectoryQuery {
    fn default() -> Self {
        Self {
            location: DEFAULT_LOCATION.to_string(),
            kind: DirectoryKind::All,
            specialty: None,
            emergency_only: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryResults {
    pub location: String,
    pub doctors: Vec<Doctor>,
    pub hospitals: Vec<Hospital>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentRequest {
    #[serde(default)]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub hospital_id: Option<String>,
    #[serde(default)]
    pub appointment_time: Option<String>,
    #[serde(default)]
    pub patient_info: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub doctor_id: Option<String>,
    pub hospital_id: Option<String>,
    pub appointment_time: Option<String>,
    pub patient_info: Option<Value>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

pub fn search_directory(query: &DirectoryQuery) -> DirectoryResults {
    let doctors = if query.kind.includes_doctors() {
        let specialty = query
            .specialty
            .as_deref()
            .filter(|value| !value.is_empty())
            .map(str::to_lowercase);
        directory_doctors()
            .into_iter()
            .filter(|doctor| match specialty.as_deref() {
                Some(needle) => doctor.specialty.to_lowercase().contains(needle),
                None => true,
            })
            .collect()
    } else {
        Vec::new()
    };

    let hospitals = if query.kind.includes_hospitals() {
        directory_hospitals()
            .into_iter()
            .filter(|hospital| !query.emergency_only || hospital.emergency)
            .collect()
    } else {
        Vec::new()
    };

    DirectoryResults {
        location: query.location.clone(),
        doctors,
        hospitals,
        timestamp: Utc::now(),
    }
}

/// Appointment requests are acknowledged only; nothing is booked.
pub fn request_appointment(request: AppointmentRequest) -> Appointment {
    Appointment {
        id: uuid::Uuid::new_v4().to_string(),
        doctor_id: request.doctor_id,
        hospital_id: request.hospital_id,
        appointment_time: request.appointment_time,
        patient_info: request.patient_info,
        status: "pending".to_string(),
        created_at: Utc::now(),
    }
}

pub fn directory_doctors() -> Vec<Doctor> {
    vec![
        doctor(
            "1",
            "Dr. Sarah Johnson",
            "General Practitioner",
            4.8,
            "123 Health Street, Medical District",
            "+1-555-0101",
            "0.5 km",
            "Available today",
            (40.7128, -74.0060),
        ),
        doctor(
            "2",
            "Dr. Michael Chen",
            "Internal Medicine",
            4.9,
            "456 Wellness Ave, Healthcare Plaza",
            "+1-555-0102",
            "1.2 km",
            "Next available: Tomorrow 2 PM",
            (40.7589, -73.9851),
        ),
        doctor(
            "3",
            "Dr. Emily Rodriguez",
            "Family Medicine",
            4.7,
            "789 Care Boulevard, Medical Center",
            "+1-555-0103",
            "2.1 km",
            "Available this week",
            (40.7505, -73.9934),
        ),
    ]
}

pub fn directory_hospitals() -> Vec<Hospital> {
    vec![
        hospital(
            "1",
            "City General Hospital",
            "General Hospital",
            "100 Hospital Drive, Downtown",
            "+1-555-0201",
            true,
            "1.8 km",
            (40.7282, -74.0776),
        ),
        hospital(
            "2",
            "Metropolitan Medical Center",
            "Specialty Hospital",
            "200 Medical Plaza, Uptown",
            "+1-555-0202",
            true,
            "3.2 km",
            (40.7831, -73.9712),
        ),
        hospital(
            "3",
            "Community Health Clinic",
            "Clinic",
            "300 Community Street, Suburbs",
            "+1-555-0203",
            false,
            "4.5 km",
            (40.6892, -74.0445),
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn doctor(
    id: &str,
    name: &str,
    specialty: &str,
    rating: f32,
    address: &str,
    phone: &str,
    distance: &str,
    availability: &str,
    (lat, lng): (f64, f64),
) -> Doctor {
    Doctor {
        id: id.to_string(),
        name: name.to_string(),
        specialty: specialty.to_string(),
        rating,
        address: address.to_string(),
        phone: phone.to_string(),
        distance: distance.to_string(),
        availability: availability.to_string(),
        coordinates: Coordinates { lat, lng },
    }
}

#[allow(clippy::too_many_arguments)]
fn hospital(
    id: &str,
    name: &str,
    kind: &str,
    address: &str,
    phone: &str,
    emergency: bool,
    distance: &str,
    (lat, lng): (f64, f64),
) -> Hospital {
    Hospital {
        id: id.to_string(),
        name: name.to_string(),
        kind: kind.to_string(),
        address: address.to_string(),
        phone: phone.to_string(),
        emergency,
        distance: distance.to_string(),
        coordinates: Coordinates { lat, lng },
    }
}
