//! Static reference data: bookable venues and event packages.
//!
//! The catalog is compiled in and never mutated at runtime. Ids are stable
//! and are what bookings store in `venue_id`.

use serde::Serialize;

use crate::booking::BookingCategory;
use crate::types::DbId;

/// Venue taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VenueType {
    /// Lecture theatre.
    #[serde(rename = "LT")]
    LectureTheatre,
    /// Classroom.
    #[serde(rename = "CR")]
    Classroom,
    /// Computer lab.
    #[serde(rename = "CL")]
    ComputerLab,
    /// Multi-purpose hall.
    #[serde(rename = "MPH")]
    MultiPurposeHall,
}

impl VenueType {
    pub fn category(self) -> BookingCategory {
        match self {
            VenueType::LectureTheatre | VenueType::Classroom => BookingCategory::Lecture,
            VenueType::ComputerLab | VenueType::MultiPurposeHall => BookingCategory::Event,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Venue {
    pub id: DbId,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub venue_type: VenueType,
    pub capacity: i32,
    pub facilities: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
pub struct EventPackage {
    pub id: DbId,
    pub name: &'static str,
    pub description: &'static str,
    pub capacity: i32,
    pub venue_ids: &'static [DbId],
    pub min_attendees: i32,
    pub max_attendees: i32,
}

static VENUES: [Venue; 5] = [
    Venue {
        id: 1,
        name: "LT1",
        venue_type: VenueType::LectureTheatre,
        capacity: 150,
        facilities: &["Projector", "Sound System", "AC", "Wi-Fi"],
    },
    Venue {
        id: 2,
        name: "LT2",
        venue_type: VenueType::LectureTheatre,
        capacity: 200,
        facilities: &["Projector", "Sound System", "AC", "Wi-Fi", "Recording System"],
    },
    Venue {
        id: 3,
        name: "CR101",
        venue_type: VenueType::Classroom,
        capacity: 60,
        facilities: &["Whiteboard", "Projector", "AC"],
    },
    Venue {
        id: 4,
        name: "CL1",
        venue_type: VenueType::ComputerLab,
        capacity: 40,
        facilities: &["Computers", "Projector", "AC", "Specialized Software"],
    },
    Venue {
        id: 5,
        name: "MPH",
        venue_type: VenueType::MultiPurposeHall,
        capacity: 500,
        facilities: &["Stage", "Sound System", "Lighting", "Seating Arrangements", "AC"],
    },
];

static PACKAGES: [EventPackage; 2] = [
    EventPackage {
        id: 1,
        name: "Club Event Package",
        description: "Perfect for club activities, meetings, and small-scale events",
        capacity: 150,
        venue_ids: &[1, 3, 4],
        min_attendees: 30,
        max_attendees: 150,
    },
    EventPackage {
        id: 2,
        name: "Department Conference Package",
        description: "Comprehensive package for department-level conferences and large events",
        capacity: 500,
        venue_ids: &[5, 2, 3, 4],
        min_attendees: 100,
        max_attendees: 500,
    },
];

pub fn venues() -> &'static [Venue] {
    &VENUES
}

pub fn packages() -> &'static [EventPackage] {
    &PACKAGES
}

pub fn find_venue(id: DbId) -> Option<&'static Venue> {
    VENUES.iter().find(|v| v.id == id)
}

pub fn find_package(id: DbId) -> Option<&'static EventPackage> {
    PACKAGES.iter().find(|p| p.id == id)
}

/// Resolve the venues bundled into a package, in package order.
pub fn package_venues(package: &EventPackage) -> Vec<&'static Venue> {
    package
        .venue_ids
        .iter()
        .filter_map(|id| find_venue(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_ids_are_unique() {
        let mut ids: Vec<_> = venues().iter().map(|v| v.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), venues().len());
    }

    #[test]
    fn every_package_venue_exists() {
        for package in packages() {
            assert_eq!(package_venues(package).len(), package.venue_ids.len());
        }
    }

    #[test]
    fn package_bounds_are_consistent() {
        for package in packages() {
            assert!(package.min_attendees <= package.max_attendees);
            assert!(package.max_attendees <= package.capacity);
        }
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(find_venue(1).unwrap().name, "LT1");
        assert_eq!(find_package(2).unwrap().name, "Department Conference Package");
        assert!(find_venue(99).is_none());
        assert!(find_package(99).is_none());
    }

    #[test]
    fn venue_serializes_type_abbreviation() {
        let json = serde_json::to_value(find_venue(5).unwrap()).unwrap();
        assert_eq!(json["type"], "MPH");
        assert_eq!(json["capacity"], 500);
    }
}
