mod common;

use chrono::Duration;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use common::{day, t0, vehicle_for, FailingNotifier, Harness, RecordingNotifier};
use vehicle_rental::models::booking::{BookingAction, BookingStatus, CreateBookingRequest, UpdateBookingNotesRequest};
use vehicle_rental::models::vehicle::UpdateVehicleRequest;
use vehicle_rental::services::{DomainEvent, MerchantDecision};
use vehicle_rental::utils::errors::AppError;

fn request(h: &Harness, start: i64, end: i64) -> CreateBookingRequest {
    CreateBookingRequest {
        vehicle_id: h.vehicle.id,
        start_date: day(start),
        end_date: day(end),
        renter_notes: None,
    }
}

#[tokio::test]
async fn test_request_booking_starts_pending_with_price() {
    let h = Harness::new().await;

    let booking = h.bookings.request_booking(&h.renter, request(&h, 1, 3), t0()).await.unwrap();

    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.total_price, Decimal::new(200, 0));
    assert_eq!(booking.renter_id, h.renter.id);
    assert_eq!(booking.merchant_id, h.merchant.id);
    assert_eq!(
        h.events().await,
        vec![DomainEvent::BookingRequested {
            booking_id: booking.id,
            merchant_id: h.merchant.id,
            renter_id: h.renter.id,
        }]
    );
}

#[tokio::test]
async fn test_unpriceable_booking_fails_without_panicking() {
    let h = Harness::new().await;
    let mut vehicle = vehicle_for(h.merchant.id, "ZZ-000-ZZ");
    vehicle.price_per_day = Decimal::MAX;
    h.store.insert_vehicle(vehicle.clone()).await;

    let req = CreateBookingRequest {
        vehicle_id: vehicle.id,
        start_date: day(1),
        end_date: day(3),
        renter_notes: None,
    };
    let result = h.bookings.request_booking(&h.renter, req, t0()).await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert!(h.bookings.list_my_bookings(&h.renter).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_overlapping_request_is_rejected() {
    let h = Harness::new().await;
    h.bookings.request_booking(&h.renter, request(&h, 1, 3), t0()).await.unwrap();

    let overlapping = h.bookings.request_booking(&h.other_renter, request(&h, 2, 4), t0()).await;
    assert!(matches!(overlapping, Err(AppError::VehicleUnavailable)));

    // [1,3) y [3,5) solo se tocan
    let adjacent = h.bookings.request_booking(&h.other_renter, request(&h, 3, 5), t0()).await;
    assert!(adjacent.is_ok());
}

#[tokio::test]
async fn test_rejected_booking_frees_the_range() {
    let h = Harness::new().await;
    let first = h.bookings.request_booking(&h.renter, request(&h, 1, 3), t0()).await.unwrap();

    h.bookings
        .respond_to_booking(&h.merchant, first.id, MerchantDecision::Reject, None, t0())
        .await
        .unwrap();

    let second = h.bookings.request_booking(&h.other_renter, request(&h, 1, 3), t0()).await;
    assert!(second.is_ok());
}

#[tokio::test]
async fn test_unlicensed_renter_cannot_book() {
    let h = Harness::new().await;

    let result = h.bookings.request_booking(&h.unlicensed, request(&h, 1, 3), t0()).await;
    assert!(matches!(result, Err(AppError::LicenseNotApproved)));

    let result = h.bookings.request_booking(&h.merchant, request(&h, 1, 3), t0()).await;
    assert!(matches!(result, Err(AppError::ForbiddenRole)));

    let result = h.bookings.request_booking(&h.admin, request(&h, 1, 3), t0()).await;
    assert!(matches!(result, Err(AppError::ForbiddenRole)));

    assert!(h.bookings.list_my_bookings(&h.unlicensed).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_request_date_checks() {
    let h = Harness::new().await;

    let mut past = request(&h, 1, 3);
    past.start_date = t0() - Duration::hours(1);
    assert!(matches!(
        h.bookings.request_booking(&h.renter, past, t0()).await,
        Err(AppError::StartInPast)
    ));

    assert!(matches!(
        h.bookings.request_booking(&h.renter, request(&h, 3, 3), t0()).await,
        Err(AppError::InvalidDateRange)
    ));
    assert!(matches!(
        h.bookings.request_booking(&h.renter, request(&h, 4, 2), t0()).await,
        Err(AppError::InvalidDateRange)
    ));
}

#[tokio::test]
async fn test_request_on_missing_or_unlisted_vehicle() {
    let h = Harness::new().await;

    let mut missing = request(&h, 1, 3);
    missing.vehicle_id = Uuid::new_v4();
    assert!(matches!(
        h.bookings.request_booking(&h.renter, missing, t0()).await,
        Err(AppError::NotFound(_))
    ));

    let unlist = UpdateVehicleRequest { is_available: Some(false), ..Default::default() };
    h.vehicles.update_vehicle(&h.merchant, h.vehicle.id, unlist, t0()).await.unwrap();
    assert!(matches!(
        h.bookings.request_booking(&h.renter, request(&h, 1, 3), t0()).await,
        Err(AppError::VehicleUnavailable)
    ));
}

#[tokio::test]
async fn test_only_owner_merchant_can_respond() {
    let h = Harness::new().await;
    let booking = h.bookings.request_booking(&h.renter, request(&h, 1, 3), t0()).await.unwrap();

    let result = h
        .bookings
        .respond_to_booking(&h.other_merchant, booking.id, MerchantDecision::Accept, None, t0())
        .await;
    assert!(matches!(result, Err(AppError::NotOwner)));

    let result = h
        .bookings
        .respond_to_booking(&h.renter, booking.id, MerchantDecision::Accept, None, t0())
        .await;
    assert!(matches!(result, Err(AppError::NotOwner)));

    let unchanged = h.bookings.get_booking(&h.renter, booking.id).await.unwrap();
    assert_eq!(unchanged.status, BookingStatus::Pending);

    let accepted = h
        .bookings
        .respond_to_booking(
            &h.merchant,
            booking.id,
            MerchantDecision::Accept,
            Some("  Recogida en la oficina  ".to_string()),
            t0(),
        )
        .await
        .unwrap();
    assert_eq!(accepted.status, BookingStatus::Approved);
    assert_eq!(accepted.merchant_notes.as_deref(), Some("Recogida en la oficina"));
}

#[tokio::test]
async fn test_admin_can_act_on_bookings() {
    let h = Harness::new().await;
    let booking = h.bookings.request_booking(&h.renter, request(&h, 1, 3), t0()).await.unwrap();

    let accepted = h
        .bookings
        .respond_to_booking(&h.admin, booking.id, MerchantDecision::Accept, None, t0())
        .await
        .unwrap();
    assert_eq!(accepted.status, BookingStatus::Approved);
}

#[tokio::test]
async fn test_complete_requires_end_reached() {
    let h = Harness::new().await;
    let booking = h.seed_booking(day(1), day(3), BookingStatus::Approved).await;

    let early = h.bookings.complete_booking(&h.merchant, booking.id, day(2)).await;
    assert!(matches!(early, Err(AppError::TooEarly)));

    let completed = h.bookings.complete_booking(&h.merchant, booking.id, day(3)).await.unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);
    assert!(h
        .events()
        .await
        .contains(&DomainEvent::BookingCompleted { booking_id: booking.id, renter_id: h.renter.id }));
}

#[tokio::test]
async fn test_pending_cannot_be_completed() {
    let h = Harness::new().await;
    let booking = h.seed_booking(day(1), day(3), BookingStatus::Pending).await;

    let result = h.bookings.complete_booking(&h.merchant, booking.id, day(10)).await;
    match result {
        Err(AppError::InvalidTransition { current, action }) => {
            assert_eq!(current, BookingStatus::Pending);
            assert_eq!(action, BookingAction::Complete);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_cancel_only_before_start() {
    let h = Harness::new().await;

    let upcoming = h.seed_booking(day(1), day(3), BookingStatus::Approved).await;
    let cancelled = h.bookings.cancel_booking(&h.renter, upcoming.id, t0()).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert!(h.events().await.contains(&DomainEvent::BookingCancelled {
        booking_id: upcoming.id,
        cancelled_by: h.renter.id,
        notify: h.merchant.id,
    }));

    let started = h.seed_booking(day(5), day(8), BookingStatus::Approved).await;
    let result = h
        .bookings
        .cancel_booking(&h.renter, started.id, day(5) + Duration::hours(1))
        .await;
    assert!(matches!(result, Err(AppError::AlreadyStarted)));

    // Exactamente en el inicio ya no se puede cancelar
    let result = h.bookings.cancel_booking(&h.merchant, started.id, day(5)).await;
    assert!(matches!(result, Err(AppError::AlreadyStarted)));
}

#[tokio::test]
async fn test_cancel_requires_party() {
    let h = Harness::new().await;
    let booking = h.seed_booking(day(1), day(3), BookingStatus::Pending).await;

    let result = h.bookings.cancel_booking(&h.other_renter, booking.id, t0()).await;
    assert!(matches!(result, Err(AppError::NotParty)));

    let cancelled = h.bookings.cancel_booking(&h.merchant, booking.id, t0()).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_terminal_states_accept_no_action() {
    let h = Harness::new().await;

    for status in [BookingStatus::Rejected, BookingStatus::Completed, BookingStatus::Cancelled] {
        let booking = h.seed_booking(day(1), day(3), status).await;

        let accept = h
            .bookings
            .respond_to_booking(&h.merchant, booking.id, MerchantDecision::Accept, None, t0())
            .await;
        assert!(matches!(accept, Err(AppError::InvalidTransition { current, .. }) if current == status));

        let cancel = h.bookings.cancel_booking(&h.renter, booking.id, t0()).await;
        assert!(matches!(cancel, Err(AppError::InvalidTransition { current, .. }) if current == status));

        let complete = h.bookings.complete_booking(&h.merchant, booking.id, day(10)).await;
        assert!(matches!(complete, Err(AppError::InvalidTransition { current, .. }) if current == status));
    }
}

#[tokio::test]
async fn test_missing_booking_is_not_found() {
    let h = Harness::new().await;

    let result = h.bookings.cancel_booking(&h.renter, Uuid::new_v4(), t0()).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let result = h.bookings.get_booking(&h.renter, Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_booking_visibility() {
    let h = Harness::new().await;
    let booking = h.bookings.request_booking(&h.renter, request(&h, 1, 3), t0()).await.unwrap();

    assert!(h.bookings.get_booking(&h.merchant, booking.id).await.is_ok());
    assert!(h.bookings.get_booking(&h.admin, booking.id).await.is_ok());
    assert!(matches!(
        h.bookings.get_booking(&h.other_merchant, booking.id).await,
        Err(AppError::NotParty)
    ));

    assert_eq!(h.bookings.list_my_bookings(&h.renter).await.unwrap().len(), 1);
    assert_eq!(h.bookings.list_my_bookings(&h.merchant).await.unwrap().len(), 1);
    assert!(h.bookings.list_my_bookings(&h.other_merchant).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_notes() {
    let h = Harness::new().await;
    let booking = h.bookings.request_booking(&h.renter, request(&h, 1, 3), t0()).await.unwrap();

    let updated = h
        .bookings
        .update_booking_notes(
            &h.renter,
            booking.id,
            UpdateBookingNotesRequest { notes: Some("Llego a las 10".to_string()) },
            t0(),
        )
        .await
        .unwrap();
    assert_eq!(updated.renter_notes.as_deref(), Some("Llego a las 10"));
    assert!(updated.merchant_notes.is_none());

    let updated = h
        .bookings
        .update_booking_notes(
            &h.merchant,
            booking.id,
            UpdateBookingNotesRequest { notes: Some("Depósito lleno".to_string()) },
            t0(),
        )
        .await
        .unwrap();
    assert_eq!(updated.merchant_notes.as_deref(), Some("Depósito lleno"));
    assert_eq!(updated.renter_notes.as_deref(), Some("Llego a las 10"));

    let admin = h
        .bookings
        .update_booking_notes(&h.admin, booking.id, UpdateBookingNotesRequest { notes: None }, t0())
        .await;
    assert!(matches!(admin, Err(AppError::ForbiddenRole)));

    h.bookings.cancel_booking(&h.renter, booking.id, t0()).await.unwrap();
    let closed = h
        .bookings
        .update_booking_notes(&h.renter, booking.id, UpdateBookingNotesRequest { notes: None }, t0())
        .await;
    assert!(matches!(closed, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_notification_failure_does_not_undo_transition() {
    let recorder = Arc::new(RecordingNotifier::default());
    let h = Harness::with_notifier(recorder, Arc::new(FailingNotifier)).await;

    let booking = h.bookings.request_booking(&h.renter, request(&h, 1, 3), t0()).await.unwrap();
    let accepted = h
        .bookings
        .respond_to_booking(&h.merchant, booking.id, MerchantDecision::Accept, None, t0())
        .await
        .unwrap();

    assert_eq!(accepted.status, BookingStatus::Approved);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overlapping_requests_admit_one() {
    let h = Harness::new().await;

    let mut handles = Vec::new();
    for principal in [h.renter, h.other_renter, h.renter, h.other_renter] {
        let service = h.bookings.clone();
        let req = request(&h, 1, 3);
        handles.push(tokio::spawn(async move { service.request_booking(&principal, req, t0()).await }));
    }

    let mut created = 0;
    let mut unavailable = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(AppError::VehicleUnavailable) => unavailable += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(unavailable, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_accept_and_cancel_apply_once() {
    let h = Harness::new().await;
    let booking_id = h.seed_booking(day(1), day(3), BookingStatus::Pending).await.id;

    let accept = {
        let service = h.bookings.clone();
        let merchant = h.merchant;
        tokio::spawn(async move {
            service
                .respond_to_booking(&merchant, booking_id, MerchantDecision::Accept, None, t0())
                .await
        })
    };
    let cancel = {
        let service = h.bookings.clone();
        let renter = h.renter;
        tokio::spawn(async move { service.cancel_booking(&renter, booking_id, t0()).await })
    };

    let results = [accept.await.unwrap(), cancel.await.unwrap()];
    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();

    // accept y luego cancel también es una secuencia válida
    let final_status = h.bookings.get_booking(&h.renter, booking_id).await.unwrap().status;
    if winners.len() == 1 {
        let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(matches!(loser, AppError::InvalidTransition { .. }));
        assert_eq!(final_status, winners[0].status);
    } else {
        assert_eq!(winners.len(), 2);
        assert_eq!(final_status, BookingStatus::Cancelled);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_accept_and_reject_apply_once() {
    let h = Harness::new().await;
    let booking_id = h.seed_booking(day(1), day(3), BookingStatus::Pending).await.id;

    let mut handles = Vec::new();
    for decision in [MerchantDecision::Accept, MerchantDecision::Reject] {
        let service = h.bookings.clone();
        let merchant = h.merchant;
        handles.push(tokio::spawn(async move {
            service.respond_to_booking(&merchant, booking_id, decision, None, t0()).await
        }));
    }

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    let winner_status = winners[0].status;
    assert!(matches!(winner_status, BookingStatus::Approved | BookingStatus::Rejected));

    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    match loser {
        AppError::InvalidTransition { current, .. } => assert_eq!(*current, winner_status),
        other => panic!("unexpected error: {:?}", other),
    }

    let stored = h.bookings.get_booking(&h.merchant, booking_id).await.unwrap();
    assert_eq!(stored.status, winner_status);
}
