use chrono::{NaiveDate, NaiveTime, Utc};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use solace_store::{Store, StoreError};
use solace_types::models::{Booking, SlotKey};
use solace_types::paths;

#[derive(Debug, Error)]
pub enum BookingError {
    /// The atomic reservation lost the race. Not retried here: the caller
    /// re-queries available slots and picks another time.
    #[error("slot already taken")]
    SlotTaken,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reserve a slot. The booking document's id IS the composite slot key,
/// so exclusivity is a create-if-absent on that key inside one
/// transaction — there is no gap between checking and claiming. Of two
/// concurrent callers exactly one commits; the other observes the winner
/// (via conflict retry or the create rejection) and gets `SlotTaken`.
pub fn book_slot(store: &Store, slot: SlotKey, user_id: Uuid) -> Result<Booking, BookingError> {
    let path = paths::booking(&slot.doc_id());
    let booking = Booking {
        resource: slot.resource.clone(),
        date: slot.date,
        time: slot.time,
        user_id,
        created_at: Utc::now(),
    };

    let result = store.run(|tx| {
        if tx.get::<Booking>(&path)?.is_some() {
            return Err(BookingError::SlotTaken);
        }
        tx.create(&path, &booking)?;
        Ok(())
    });

    match result {
        Ok(()) => {
            info!(slot = %slot.doc_id(), user = %user_id, "slot booked");
            Ok(booking)
        }
        Err(BookingError::Store(StoreError::AlreadyExists(_))) => Err(BookingError::SlotTaken),
        Err(e) => Err(e),
    }
}

/// Times already taken for one resource on one day, ascending. Clients
/// re-query this after `SlotTaken` to offer the remaining choices.
pub fn booked_times(
    store: &Store,
    resource: &str,
    date: NaiveDate,
) -> Result<Vec<NaiveTime>, BookingError> {
    let prefix = SlotKey::day_prefix(resource, date);
    let bookings = store.list_prefix::<Booking>(paths::BOOKINGS, &prefix)?;
    Ok(bookings.into_iter().map(|(_, booking)| booking.time).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;

    fn slot(resource: &str, time: &str) -> SlotKey {
        SlotKey::new(
            resource,
            NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
            NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
        )
    }

    #[test]
    fn free_slot_books_taken_slot_rejects() {
        let store = Store::open_in_memory().unwrap();
        let key = slot("massage", "10:00");

        book_slot(&store, key.clone(), Uuid::new_v4()).unwrap();
        assert!(matches!(
            book_slot(&store, key, Uuid::new_v4()),
            Err(BookingError::SlotTaken)
        ));
    }

    #[test]
    fn distinct_slots_do_not_contend() {
        let store = Store::open_in_memory().unwrap();
        book_slot(&store, slot("massage", "10:00"), Uuid::new_v4()).unwrap();
        book_slot(&store, slot("massage", "11:00"), Uuid::new_v4()).unwrap();
        book_slot(&store, slot("sauna", "10:00"), Uuid::new_v4()).unwrap();

        let times = booked_times(&store, "massage", NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()).unwrap();
        let rendered: Vec<String> = times.iter().map(|t| t.format("%H:%M").to_string()).collect();
        assert_eq!(rendered, vec!["10:00", "11:00"]);
    }

    #[test]
    fn concurrent_callers_get_exactly_one_slot() {
        let store = Store::open_in_memory().unwrap();
        let start = Barrier::new(2);

        let outcomes: Vec<Result<Booking, BookingError>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    s.spawn(|| {
                        start.wait();
                        book_slot(&store, slot("massage", "10:00"), Uuid::new_v4())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let wins = outcomes.iter().filter(|r| r.is_ok()).count();
        let losses = outcomes
            .iter()
            .filter(|r| matches!(r, Err(BookingError::SlotTaken)))
            .count();
        assert_eq!((wins, losses), (1, 1));

        let day: Vec<(String, Booking)> = store
            .list_prefix(paths::BOOKINGS, "massage/2026-08-06/")
            .unwrap();
        assert_eq!(day.len(), 1);
    }

    /// The flow this crate replaces: check availability with a plain read,
    /// then write unconditionally. Interleaved callers both see the slot
    /// free and both walk away with a confirmation — the double-booking
    /// hazard the keyed create closes.
    #[test]
    fn unchecked_read_then_write_confirms_both_callers() {
        let store = Store::open_in_memory().unwrap();
        let key = slot("massage", "10:00");
        let path = paths::booking(&key.doc_id());
        let checked = Barrier::new(2);

        let naive_reserve = |user_id: Uuid| {
            let free = store.get::<Booking>(&path).unwrap().is_none();
            checked.wait(); // both callers finish their check first
            if !free {
                return false;
            }
            store
                .run(|tx| {
                    tx.set(
                        &path,
                        &Booking {
                            resource: key.resource.clone(),
                            date: key.date,
                            time: key.time,
                            user_id,
                            created_at: Utc::now(),
                        },
                    )?;
                    Ok::<_, StoreError>(())
                })
                .unwrap();
            true
        };

        let confirmations: Vec<bool> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| s.spawn(|| naive_reserve(Uuid::new_v4())))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        // Both callers were told the slot is theirs.
        assert_eq!(confirmations, vec![true, true]);
    }
}
