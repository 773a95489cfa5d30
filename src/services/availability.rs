use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::models::Appointment;
use crate::database::stores::{AppointmentStore, StoreError};

// Fixed operating window: 08:00-17:00 tenant-local, hourly slots. Global
// constants rather than per-craftsman configuration; matches current
// product behavior.
pub const WORK_START_HOUR: u32 = 8;
pub const WORK_END_HOUR: u32 = 17;
pub const SLOT_MINUTES: i64 = 60;
pub const TOTAL_SLOTS: usize = (WORK_END_HOUR - WORK_START_HOUR) as usize;

/// An existing reservation reduced to its time interval.
#[derive(Debug, Clone)]
pub struct Booking {
    pub starts_at: NaiveDateTime,
    pub duration_minutes: i32,
}

impl From<&Appointment> for Booking {
    fn from(apt: &Appointment) -> Self {
        Self {
            starts_at: apt.starts_at,
            duration_minutes: apt.duration_minutes,
        }
    }
}

/// A candidate bookable window. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub display_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub available_slots: Vec<Slot>,
    pub booked_count: usize,
    pub total_slots: usize,
}

/// Compute the open slots for a day by subtracting bookings from the fixed
/// candidate grid. Overlap is strict: a booking that ends exactly at a slot's
/// start does not block it.
pub fn compute_slots(date: NaiveDate, bookings: &[Booking]) -> Vec<Slot> {
    let mut open = Vec::with_capacity(TOTAL_SLOTS);

    for hour in WORK_START_HOUR..WORK_END_HOUR {
        let Some(start) = date.and_hms_opt(hour, 0, 0) else {
            continue;
        };
        let end = start + Duration::minutes(SLOT_MINUTES);

        let blocked = bookings.iter().any(|b| {
            let b_end = b.starts_at + Duration::minutes(i64::from(b.duration_minutes));
            start < b_end && end > b.starts_at
        });

        if !blocked {
            open.push(Slot {
                start,
                end,
                display_time: format!("{:02}:{:02}", start.hour(), start.minute()),
            });
        }
    }

    open
}

/// Availability for one craftsman/day. All-or-nothing: a fetch failure
/// surfaces as an error, never a partial result.
pub async fn day_availability(
    store: &dyn AppointmentStore,
    craftsman_id: Uuid,
    date: NaiveDate,
) -> Result<DayAvailability, StoreError> {
    let from = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| StoreError::NotFound(format!("invalid date: {}", date)))?;
    let to = from + Duration::days(1);

    let appointments = store.appointments_between(craftsman_id, from, to).await?;
    let bookings: Vec<Booking> = appointments.iter().map(Booking::from).collect();

    let available_slots = compute_slots(date, &bookings);
    let booked_count = TOTAL_SLOTS - available_slots.len();

    Ok(DayAvailability {
        date,
        available_slots,
        booked_count,
        total_slots: TOTAL_SLOTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 1).unwrap()
    }

    fn booking(hour: u32, minute: u32, duration_minutes: i32) -> Booking {
        Booking {
            starts_at: day().and_hms_opt(hour, minute, 0).unwrap(),
            duration_minutes,
        }
    }

    #[test]
    fn empty_day_yields_all_slots_in_order() {
        let slots = compute_slots(day(), &[]);

        assert_eq!(slots.len(), TOTAL_SLOTS);
        assert_eq!(slots[0].display_time, "08:00");
        assert_eq!(slots.last().unwrap().display_time, "16:00");
        assert!(slots.windows(2).all(|w| w[0].start < w[1].start));
    }

    #[test]
    fn hour_long_booking_blocks_exactly_its_slot() {
        let slots = compute_slots(day(), &[booking(10, 0, 60)]);

        assert_eq!(slots.len(), TOTAL_SLOTS - 1);
        assert!(slots.iter().all(|s| s.display_time != "10:00"));
        assert!(slots.iter().any(|s| s.display_time == "09:00"));
        assert!(slots.iter().any(|s| s.display_time == "11:00"));
    }

    #[test]
    fn booking_ending_on_boundary_does_not_block_next_slot() {
        // 09:00-10:00 ends exactly at the 10:00 slot start
        let slots = compute_slots(day(), &[booking(9, 0, 60)]);

        assert!(slots.iter().any(|s| s.display_time == "10:00"));
        assert!(slots.iter().all(|s| s.display_time != "09:00"));
    }

    #[test]
    fn spanning_booking_blocks_every_touched_slot() {
        // 09:30-11:30 overlaps the 09:00, 10:00 and 11:00 slots
        let slots = compute_slots(day(), &[booking(9, 30, 120)]);

        assert_eq!(slots.len(), TOTAL_SLOTS - 3);
        for blocked in ["09:00", "10:00", "11:00"] {
            assert!(slots.iter().all(|s| s.display_time != blocked));
        }
    }

    #[test]
    fn booking_outside_hours_blocks_nothing() {
        let slots = compute_slots(day(), &[booking(6, 0, 60)]);
        assert_eq!(slots.len(), TOTAL_SLOTS);
    }

    #[test]
    fn slot_serializes_camel_case() {
        let slots = compute_slots(day(), &[]);
        let json = serde_json::to_value(&slots[0]).unwrap();
        assert!(json.get("displayTime").is_some());
        assert!(json.get("display_time").is_none());
    }

    mod day_availability {
        use super::*;
        use crate::database::models::Appointment;
        use async_trait::async_trait;
        use chrono::Utc;

        struct FixedStore {
            appointments: Vec<Appointment>,
        }

        #[async_trait]
        impl AppointmentStore for FixedStore {
            async fn appointments_between(
                &self,
                craftsman_id: Uuid,
                from: NaiveDateTime,
                to: NaiveDateTime,
            ) -> Result<Vec<Appointment>, StoreError> {
                Ok(self
                    .appointments
                    .iter()
                    .filter(|a| {
                        a.craftsman_id == craftsman_id && a.starts_at >= from && a.starts_at < to
                    })
                    .cloned()
                    .collect())
            }

            async fn find_by_id(
                &self,
                craftsman_id: Uuid,
                id: Uuid,
            ) -> Result<Option<Appointment>, StoreError> {
                Ok(self
                    .appointments
                    .iter()
                    .find(|a| a.id == id && a.craftsman_id == craftsman_id)
                    .cloned())
            }
        }

        fn appointment(
            craftsman_id: Uuid,
            starts_at: NaiveDateTime,
            duration_minutes: i32,
        ) -> Appointment {
            Appointment {
                id: Uuid::new_v4(),
                craftsman_id,
                customer_id: None,
                title: "Site visit".to_string(),
                starts_at,
                duration_minutes,
                status: "scheduled".to_string(),
                notes: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }
        }

        #[tokio::test]
        async fn counts_booked_and_total() {
            let craftsman = Uuid::new_v4();
            let store = FixedStore {
                appointments: vec![appointment(
                    craftsman,
                    day().and_hms_opt(10, 0, 0).unwrap(),
                    60,
                )],
            };

            let result = day_availability(&store, craftsman, day()).await.unwrap();

            assert_eq!(result.total_slots, 9);
            assert_eq!(result.booked_count, 1);
            assert_eq!(result.available_slots.len(), 8);
        }

        #[tokio::test]
        async fn day_boundary_is_half_open() {
            // Midnight of the next day belongs to the next day
            let craftsman = Uuid::new_v4();
            let next_midnight = (day() + Duration::days(1)).and_hms_opt(0, 0, 0).unwrap();
            let store = FixedStore {
                appointments: vec![appointment(craftsman, next_midnight, 60)],
            };

            let result = day_availability(&store, craftsman, day()).await.unwrap();
            assert_eq!(result.booked_count, 0);
        }

        #[tokio::test]
        async fn another_tenants_bookings_never_reduce_availability() {
            let craftsman_a = Uuid::new_v4();
            let craftsman_b = Uuid::new_v4();
            let store = FixedStore {
                appointments: vec![appointment(
                    craftsman_a,
                    day().and_hms_opt(10, 0, 0).unwrap(),
                    60,
                )],
            };

            let result = day_availability(&store, craftsman_b, day()).await.unwrap();
            assert_eq!(result.booked_count, 0);
            assert_eq!(result.available_slots.len(), TOTAL_SLOTS);
        }
    }
}
