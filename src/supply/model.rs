use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FacilityType {
    Manufacturing,
    Distribution,
    Showroom,
    Supplier,
    Buyer,
    Other(String),
}

impl FacilityType {
    pub const KNOWN: [FacilityType; 5] = [
        Self::Manufacturing,
        Self::Distribution,
        Self::Showroom,
        Self::Supplier,
        Self::Buyer,
    ];

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "manufacturing" => Self::Manufacturing,
            "distribution" => Self::Distribution,
            "showroom" => Self::Showroom,
            "supplier" => Self::Supplier,
            "buyer" => Self::Buyer,
            _ => Self::Other(raw.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Manufacturing => "manufacturing",
            Self::Distribution => "distribution",
            Self::Showroom => "showroom",
            Self::Supplier => "supplier",
            Self::Buyer => "buyer",
            Self::Other(raw) => raw.as_str(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Manufacturing => "Manufacturing",
            Self::Distribution => "Distribution",
            Self::Showroom => "Showroom",
            Self::Supplier => "Supplier",
            Self::Buyer => "Buyer",
            Self::Other(_) => "Unknown",
        }
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FacilityType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MovementStatus {
    InTransit,
    Completed,
    Scheduled,
}

impl MovementStatus {
    pub const ALL: [MovementStatus; 3] = [Self::InTransit, Self::Completed, Self::Scheduled];

    /// Values outside the three recognized statuses fall back to `Scheduled`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "in-transit" => Self::InTransit,
            "completed" => Self::Completed,
            "scheduled" => Self::Scheduled,
            other => {
                tracing::warn!(status = other, "unrecognized movement status, treating as scheduled");
                Self::Scheduled
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InTransit => "in-transit",
            Self::Completed => "completed",
            Self::Scheduled => "scheduled",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::InTransit => "In Transit",
            Self::Completed => "Completed",
            Self::Scheduled => "Scheduled",
        }
    }
}

impl<'de> Deserialize<'de> for MovementStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&raw))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct FacilityDetails {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub capacity: Option<u64>,
    #[serde(default)]
    pub inventory: Option<u64>,
    #[serde(default)]
    pub manager: Option<String>,
    #[serde(default)]
    pub established: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
}

impl FacilityDetails {
    /// Inventory over capacity, clamped to `[0, 1]`.
    pub fn utilization(&self) -> Option<f32> {
        match (self.inventory, self.capacity) {
            (Some(inventory), Some(capacity)) if capacity > 0 => {
                Some((inventory as f64 / capacity as f64).clamp(0.0, 1.0) as f32)
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Facility {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FacilityType,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub details: FacilityDetails,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleMovement {
    pub id: String,
    pub source_facility_id: String,
    pub destination_facility_id: String,
    #[serde(default)]
    pub vehicle_type: String,
    pub status: MovementStatus,
    #[serde(default)]
    pub departure_time: String,
    #[serde(default)]
    pub arrival_time: Option<String>,
    #[serde(default)]
    pub cargo: String,
}

#[derive(Clone, Debug)]
pub struct Dataset {
    pub facilities: Vec<Facility>,
    pub movements: Vec<VehicleMovement>,
    index_by_id: HashMap<String, usize>,
}

impl Dataset {
    pub fn new(facilities: Vec<Facility>, movements: Vec<VehicleMovement>) -> Self {
        let mut unique = Vec::with_capacity(facilities.len());
        let mut index_by_id = HashMap::with_capacity(facilities.len());
        for facility in facilities {
            if index_by_id.contains_key(&facility.id) {
                tracing::warn!(id = %facility.id, "duplicate facility id, keeping first occurrence");
                continue;
            }
            index_by_id.insert(facility.id.clone(), unique.len());
            unique.push(facility);
        }

        Self {
            facilities: unique,
            movements,
            index_by_id,
        }
    }

    pub fn facility(&self, id: &str) -> Option<&Facility> {
        self.index_by_id
            .get(id)
            .and_then(|&index| self.facilities.get(index))
    }

    pub fn facility_count(&self) -> usize {
        self.facilities.len()
    }

    pub fn movement_count(&self) -> usize {
        self.movements.len()
    }

    /// Movements touching `facility_id`, outbound first, each group ordered by departure.
    pub fn movements_for(&self, facility_id: &str) -> Vec<&VehicleMovement> {
        let mut outbound = self
            .movements
            .iter()
            .filter(|movement| movement.source_facility_id == facility_id)
            .collect::<Vec<_>>();
        let mut inbound = self
            .movements
            .iter()
            .filter(|movement| {
                movement.destination_facility_id == facility_id
                    && movement.source_facility_id != facility_id
            })
            .collect::<Vec<_>>();
        outbound.sort_by(|a, b| a.departure_time.cmp(&b.departure_time));
        inbound.sort_by(|a, b| a.departure_time.cmp(&b.departure_time));
        outbound.extend(inbound);
        outbound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facility(id: &str, kind: FacilityType) -> Facility {
        Facility {
            id: id.to_owned(),
            name: format!("Facility {id}"),
            kind,
            latitude: 13.0,
            longitude: 80.0,
            details: FacilityDetails::default(),
        }
    }

    #[test]
    fn unknown_status_is_coerced_to_scheduled() {
        let movement: VehicleMovement = serde_json::from_str(
            r#"{"id":"m1","sourceFacilityId":"a","destinationFacilityId":"b",
                "vehicleType":"Truck","status":"unknown-value",
                "departureTime":"2025-05-15T08:30:00Z","cargo":"Sedans"}"#,
        )
        .unwrap();
        assert_eq!(movement.status, MovementStatus::Scheduled);
    }

    #[test]
    fn unknown_facility_type_is_kept_verbatim() {
        let parsed: Facility = serde_json::from_str(
            r#"{"id":"x","name":"Port","type":"seaport","latitude":1.0,"longitude":2.0,
                "details":{},"extra":"ignored"}"#,
        )
        .unwrap();
        assert_eq!(parsed.kind, FacilityType::Other("seaport".to_owned()));
        assert_eq!(parsed.kind.as_str(), "seaport");
    }

    #[test]
    fn utilization_is_clamped() {
        let details = FacilityDetails {
            capacity: Some(100),
            inventory: Some(250),
            ..Default::default()
        };
        assert_eq!(details.utilization(), Some(1.0));

        let details = FacilityDetails {
            capacity: Some(0),
            inventory: Some(10),
            ..Default::default()
        };
        assert_eq!(details.utilization(), None);

        let details = FacilityDetails {
            capacity: Some(200),
            inventory: Some(50),
            ..Default::default()
        };
        assert_eq!(details.utilization(), Some(0.25));
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let mut second = facility("a", FacilityType::Buyer);
        second.name = "Second".to_owned();
        let dataset = Dataset::new(
            vec![facility("a", FacilityType::Supplier), second],
            Vec::new(),
        );
        assert_eq!(dataset.facility_count(), 1);
        assert_eq!(
            dataset.facility("a").map(|f| f.kind.clone()),
            Some(FacilityType::Supplier)
        );
    }
}
