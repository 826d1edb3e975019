//! Availability resolver for the selected vehicle
//!
//! Each fetch carries the generation current when it started. Only the
//! completion of the latest generation is applied, so a slow response for a
//! previously selected vehicle can never overwrite the current one.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::events::{EventBus, SessionEvent};
use crate::{api::RentalApi, error::AppResult, models::AvailabilityWindow};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AvailabilityState {
    #[default]
    NotSelected,
    Loading,
    Ready(AvailabilityWindow),
    /// The last fetch failed; bookings stay blocked until a refresh succeeds.
    Failed,
}

impl AvailabilityState {
    /// The window, only when confirmed by the server
    pub fn window(&self) -> Option<&AvailabilityWindow> {
        match self {
            AvailabilityState::Ready(window) => Some(window),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AvailabilityState::Loading)
    }
}

/// Handle of one in-flight fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub vehicle_id: i64,
}

#[derive(Default)]
struct Selection {
    vehicle_id: Option<i64>,
    generation: u64,
    state: AvailabilityState,
}

pub struct AvailabilityResolver {
    api: Arc<dyn RentalApi>,
    selection: Mutex<Selection>,
}

impl AvailabilityResolver {
    pub fn new(api: Arc<dyn RentalApi>) -> Self {
        Self {
            api,
            selection: Mutex::new(Selection::default()),
        }
    }

    pub fn selected_vehicle(&self) -> Option<i64> {
        self.selection.lock().vehicle_id
    }

    pub fn state(&self) -> AvailabilityState {
        self.selection.lock().state.clone()
    }

    /// Change the selected vehicle and fetch its window
    pub async fn select_vehicle(&self, vehicle_id: Option<i64>) -> AvailabilityState {
        match self.begin(vehicle_id) {
            Some(ticket) => self.fetch(ticket).await,
            None => AvailabilityState::NotSelected,
        }
    }

    /// Re-fetch the window of the current vehicle
    pub async fn refresh(&self) -> AvailabilityState {
        match self.begin_refresh() {
            Some(ticket) => self.fetch(ticket).await,
            None => AvailabilityState::NotSelected,
        }
    }

    /// Start a new generation for whichever vehicle is selected right now.
    /// The selection itself is left alone.
    pub fn begin_refresh(&self) -> Option<FetchTicket> {
        let mut selection = self.selection.lock();
        let vehicle_id = selection.vehicle_id?;
        selection.generation += 1;
        selection.state = AvailabilityState::Loading;
        Some(FetchTicket {
            generation: selection.generation,
            vehicle_id,
        })
    }

    /// Start a new generation for `vehicle_id`. Any fetch still in flight
    /// becomes stale.
    pub fn begin(&self, vehicle_id: Option<i64>) -> Option<FetchTicket> {
        let mut selection = self.selection.lock();
        selection.generation += 1;
        selection.vehicle_id = vehicle_id;
        selection.state = match vehicle_id {
            Some(_) => AvailabilityState::Loading,
            None => AvailabilityState::NotSelected,
        };
        vehicle_id.map(|vehicle_id| FetchTicket {
            generation: selection.generation,
            vehicle_id,
        })
    }

    /// Apply the outcome of a fetch. Returns false when the ticket is stale.
    pub fn complete(&self, ticket: FetchTicket, result: AppResult<AvailabilityWindow>) -> bool {
        let mut selection = self.selection.lock();
        if selection.generation != ticket.generation {
            tracing::debug!(
                "Discarding stale availability for vehicle {} (generation {}, current {})",
                ticket.vehicle_id,
                ticket.generation,
                selection.generation
            );
            return false;
        }

        selection.state = match result {
            Ok(window) => AvailabilityState::Ready(window),
            Err(e) => {
                tracing::warn!(
                    "Availability fetch failed for vehicle {}: {}",
                    ticket.vehicle_id,
                    e
                );
                AvailabilityState::Failed
            }
        };
        true
    }

    async fn fetch(&self, ticket: FetchTicket) -> AvailabilityState {
        let result = self
            .api
            .get_availability(ticket.vehicle_id)
            .await
            .and_then(AvailabilityWindow::try_from);
        self.complete(ticket, result);
        self.state()
    }

    /// React to a session event; returns true when a refresh was triggered.
    pub async fn handle_event(&self, event: SessionEvent) -> bool {
        match self.selected_vehicle() {
            Some(id) if event.affects_availability_of(id) => {
                tracing::debug!("Refreshing availability of vehicle {} after {:?}", id, event);
                self.refresh().await;
                true
            }
            _ => false,
        }
    }

    /// Keep the window fresh for as long as the bus lives
    pub fn spawn_listener(self: Arc<Self>, bus: &EventBus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        self.handle_event(event).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Availability listener skipped {} event(s)", skipped);
                        self.refresh().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::MockRentalApi, error::AppError, models::availability::AvailabilityResponse,
    };
    use chrono::NaiveDate;
    use reqwest::StatusCode;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn window(vehicle_id: i64) -> AvailabilityWindow {
        AvailabilityWindow::new(vehicle_id, [day(4)], [day(5)]).unwrap()
    }

    fn response(vehicle_id: i64) -> AvailabilityResponse {
        AvailabilityResponse {
            veicolo_id: vehicle_id,
            date_disponibili: vec![day(4)],
            date_occupate: vec![day(5)],
        }
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let resolver = AvailabilityResolver::new(Arc::new(MockRentalApi::new()));

        let for_a = resolver.begin(Some(1)).unwrap();
        let for_b = resolver.begin(Some(2)).unwrap();

        assert!(resolver.complete(for_b, Ok(window(2))));
        assert!(!resolver.complete(for_a, Ok(window(1))));

        assert_eq!(resolver.state(), AvailabilityState::Ready(window(2)));
        assert_eq!(resolver.selected_vehicle(), Some(2));
    }

    #[test]
    fn test_refresh_racing_a_new_selection() {
        let resolver = AvailabilityResolver::new(Arc::new(MockRentalApi::new()));
        let first = resolver.begin(Some(1)).unwrap();
        resolver.complete(first, Ok(window(1)));

        let refresh = resolver.begin_refresh().unwrap();
        assert_eq!(refresh.vehicle_id, 1);
        let switch = resolver.begin(Some(2)).unwrap();

        assert!(!resolver.complete(refresh, Ok(window(1))));
        assert!(resolver.complete(switch, Ok(window(2))));
        assert_eq!(resolver.selected_vehicle(), Some(2));
        assert_eq!(resolver.state(), AvailabilityState::Ready(window(2)));
    }

    #[test]
    fn test_refresh_without_selection() {
        let resolver = AvailabilityResolver::new(Arc::new(MockRentalApi::new()));
        assert!(resolver.begin_refresh().is_none());
        assert_eq!(resolver.state(), AvailabilityState::NotSelected);
    }

    #[test]
    fn test_deselect_invalidates_in_flight() {
        let resolver = AvailabilityResolver::new(Arc::new(MockRentalApi::new()));
        let ticket = resolver.begin(Some(1)).unwrap();
        assert!(resolver.state().is_loading());

        assert!(resolver.begin(None).is_none());
        assert!(!resolver.complete(ticket, Ok(window(1))));
        assert_eq!(resolver.state(), AvailabilityState::NotSelected);
    }

    #[tokio::test]
    async fn test_select_vehicle_fetches_window() {
        let mut api = MockRentalApi::new();
        api.expect_get_availability()
            .withf(|id| *id == 7)
            .times(1)
            .returning(|id| Ok(response(id)));

        let resolver = AvailabilityResolver::new(Arc::new(api));
        let state = resolver.select_vehicle(Some(7)).await;
        assert_eq!(state.window(), Some(&window(7)));
    }

    #[tokio::test]
    async fn test_fetch_failure_fails_closed() {
        let mut api = MockRentalApi::new();
        api.expect_get_availability().returning(|_| {
            Err(AppError::Api {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                payload: None,
            })
        });

        let resolver = AvailabilityResolver::new(Arc::new(api));
        let state = resolver.select_vehicle(Some(7)).await;
        assert_eq!(state, AvailabilityState::Failed);
        assert!(state.window().is_none());
    }

    #[tokio::test]
    async fn test_event_refreshes_only_matching_vehicle() {
        let mut api = MockRentalApi::new();
        api.expect_get_availability()
            .times(2)
            .returning(|id| Ok(response(id)));

        let resolver = AvailabilityResolver::new(Arc::new(api));
        resolver.select_vehicle(Some(7)).await;

        let other = SessionEvent::AvailabilityChanged { vehicle_id: Some(8) };
        assert!(!resolver.handle_event(other).await);

        let same = SessionEvent::AvailabilityChanged { vehicle_id: Some(7) };
        assert!(resolver.handle_event(same).await);
    }

    #[tokio::test]
    async fn test_listener_refreshes_once_per_booking() {
        let mut api = MockRentalApi::new();
        api.expect_get_availability()
            .times(1)
            .returning(|id| Ok(response(id)));

        let resolver = Arc::new(AvailabilityResolver::new(Arc::new(api)));
        let ticket = resolver.begin(Some(7)).unwrap();
        resolver.complete(ticket, Err(AppError::Internal("offline".into())));
        assert_eq!(resolver.state(), AvailabilityState::Failed);

        let bus = EventBus::new(4);
        let handle = resolver.clone().spawn_listener(&bus);
        // What a booking publishes: one refresh, not two
        bus.publish(SessionEvent::BookingsChanged);
        bus.publish(SessionEvent::AvailabilityChanged { vehicle_id: Some(7) });
        drop(bus);
        handle.await.unwrap();

        assert_eq!(resolver.state(), AvailabilityState::Ready(window(7)));
    }
}
