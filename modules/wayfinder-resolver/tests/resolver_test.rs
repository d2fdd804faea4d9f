//! Map-action resolution against mock providers. No network.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

use wayfinder_common::{DirectionErrorKind, MapAction, ResolverConfig, TravelMode};
use wayfinder_resolver::testing::{
    latlng, place, MockLocator, MockPlaces, MockRoutes, BOSTON, CAMBRIDGE, LOS_ANGELES, NYC,
};
use wayfinder_resolver::{
    ActionOutcome, Channel, MapActionResolver, MapEffect, Resolution, ResolveStatus, RouteLeg,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Harness {
    resolver: MapActionResolver,
    places: Arc<MockPlaces>,
    routes: Arc<MockRoutes>,
}

fn harness(places: MockPlaces, routes: MockRoutes) -> Harness {
    init_tracing();
    let places = Arc::new(places);
    let routes = Arc::new(routes);
    let resolver = MapActionResolver::new(places.clone(), routes.clone(), ResolverConfig::default())
        .with_viewport(latlng(CAMBRIDGE), 13.0);
    Harness {
        resolver,
        places,
        routes,
    }
}

fn boston_and_nyc() -> MockPlaces {
    MockPlaces::new()
        .on_place("Boston", place("Boston", BOSTON))
        .on_place("New York", place("New York", NYC))
        .on_place("Los Angeles", place("Los Angeles", LOS_ANGELES))
}

fn applied(status: ResolveStatus) -> Resolution {
    let debug = format!("{status:?}");
    status
        .into_resolution()
        .unwrap_or_else(|| panic!("expected Applied, got {debug}"))
}

fn direction_error(resolution: &Resolution) -> (DirectionErrorKind, String) {
    assert!(resolution.outcome.is_error(), "{:?}", resolution.outcome);
    match &resolution.outcome {
        ActionOutcome::ActionError(e) => (e.kind, e.message.clone()),
        other => panic!("expected ActionError, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_one_marks_and_recentres() {
    let h = harness(boston_and_nyc(), MockRoutes::new());
    let map = Channel::default();

    let r = applied(h.resolver.resolve(&map, MapAction::search_one("Boston")).await);

    match &r.outcome {
        ActionOutcome::PlacesFound(places) => assert_eq!(places[0].display_name, "Boston"),
        other => panic!("unexpected outcome {other:?}"),
    }
    let state = h.resolver.map_state().await;
    assert_eq!(state.viewport.center, latlng(BOSTON));
    assert_eq!(state.markers(&map).len(), 1);
}

#[tokio::test]
async fn search_one_without_hit_is_silent() {
    let h = harness(boston_and_nyc(), MockRoutes::new());
    let r = applied(
        h.resolver
            .resolve(&Channel::default(), MapAction::search_one("Atlantis"))
            .await,
    );
    assert_eq!(r.outcome, ActionOutcome::PlacesFound(Vec::new()));
    assert!(r.effects.is_empty());
}

#[tokio::test]
async fn search_one_provider_failure_is_unknown_error() {
    let h = harness(MockPlaces::new().failing("Boston"), MockRoutes::new());
    let r = applied(
        h.resolver
            .resolve(&Channel::default(), MapAction::search_one("Boston"))
            .await,
    );
    let (kind, _) = direction_error(&r);
    assert_eq!(kind, DirectionErrorKind::UnknownError);
}

#[tokio::test(start_paused = true)]
async fn search_many_is_sequential_and_keeps_input_order() {
    let h = harness(boston_and_nyc(), MockRoutes::new());
    let started = Instant::now();

    let r = applied(
        h.resolver
            .resolve(
                &Channel::default(),
                MapAction::search_many(["New York", "Atlantis", "Boston"]),
            )
            .await,
    );

    // Two gaps between three provider calls.
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert_eq!(h.places.calls(), vec!["New York", "Atlantis", "Boston"]);

    let names: Vec<_> = match &r.outcome {
        ActionOutcome::PlacesFound(places) => places.iter().map(|p| p.display_name.clone()).collect(),
        other => panic!("unexpected outcome {other:?}"),
    };
    assert_eq!(names, vec!["New York", "Boston"]);
    assert!(r
        .effects
        .iter()
        .any(|e| matches!(e, MapEffect::FitBounds { .. })));
}

#[tokio::test]
async fn search_many_skips_failed_queries() {
    let h = harness(boston_and_nyc().failing("Chicago"), MockRoutes::new());
    let mut config = ResolverConfig::default();
    config.search_delay = Duration::ZERO;
    let resolver = MapActionResolver::new(h.places.clone(), h.routes.clone(), config);

    let r = applied(
        resolver
            .resolve(&Channel::default(), MapAction::search_many(["Chicago", "Boston"]))
            .await,
    );
    match r.outcome {
        ActionOutcome::PlacesFound(places) => assert_eq!(places.len(), 1),
        other => panic!("unexpected outcome {other:?}"),
    }
    // A single hit recentres instead of fitting bounds.
    assert!(r
        .effects
        .iter()
        .any(|e| matches!(e, MapEffect::CenterOn { .. })));
}

#[tokio::test]
async fn repeated_searches_hit_the_cache_until_session_restarts() {
    let h = harness(boston_and_nyc(), MockRoutes::new());
    let map = Channel::default();

    h.resolver.resolve(&map, MapAction::search_one("Boston")).await;
    h.resolver.resolve(&map, MapAction::search_one("Boston")).await;
    assert_eq!(h.places.calls().len(), 1);

    h.resolver.start_session().await;
    assert!(h.resolver.map_state().await.markers(&map).is_empty());

    h.resolver.resolve(&map, MapAction::search_one("Boston")).await;
    assert_eq!(h.places.calls().len(), 2);
}

// ---------------------------------------------------------------------------
// Directions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn only_modes_within_their_caps_survive() {
    let routes = MockRoutes::new()
        .on_mode(TravelMode::Driving, 4_500.0, 2_700.0)
        .on_mode(TravelMode::Walking, 4_400.0, 55_000.0)
        .on_mode(TravelMode::Bicycling, 4_450.0, 16_000.0)
        .unsupported(TravelMode::Transit);
    let h = harness(boston_and_nyc(), routes);

    let r = applied(
        h.resolver
            .resolve(&Channel::default(), MapAction::directions("Boston", "Los Angeles"))
            .await,
    );

    let ActionOutcome::RouteFound(result) = &r.outcome else {
        panic!("expected RouteFound, got {:?}", r.outcome);
    };
    let modes: Vec<_> = result.routes.iter().map(|o| o.mode).collect();
    assert_eq!(modes, vec![TravelMode::Driving]);
    assert_eq!(result.origin_place.as_ref().unwrap().display_name, "Boston");
    assert_eq!(result.destination_place.as_ref().unwrap().display_name, "Los Angeles");
    assert!(!h.routes.calls().contains(&TravelMode::Transit));
}

#[tokio::test]
async fn every_mode_over_cap_names_the_shortest() {
    let routes = MockRoutes::new()
        .on_mode(TravelMode::Driving, 11_000.0, 7_000.0)
        .on_mode(TravelMode::Walking, 900.0, 11_000.0)
        .on_mode(TravelMode::Bicycling, 900.0, 3_000.0)
        .unsupported(TravelMode::Transit);
    let h = harness(boston_and_nyc(), routes);

    let r = applied(
        h.resolver
            .resolve(&Channel::default(), MapAction::directions("Boston", "New York"))
            .await,
    );

    let (kind, message) = direction_error(&r);
    assert_eq!(kind, DirectionErrorKind::RouteTooLong);
    assert!(message.contains("900 km"), "{message}");
    assert!(message.contains("Boston") && message.contains("New York"));
    assert_eq!(r.effects, vec![MapEffect::ClearRoute]);
}

#[tokio::test]
async fn routes_follow_mode_priority_and_drop_failures() {
    let routes = MockRoutes::new()
        .on_mode(TravelMode::Transit, 340.0, 260.0)
        .on_mode(TravelMode::Walking, 330.0, 4_000.0)
        .failing(TravelMode::Bicycling)
        .on_mode(TravelMode::Driving, 346.0, 225.0);
    let h = harness(boston_and_nyc(), routes);
    let map = Channel::default();

    let r = applied(
        h.resolver
            .resolve(&map, MapAction::directions("Boston", "New York"))
            .await,
    );

    let ActionOutcome::RouteFound(result) = &r.outcome else {
        panic!("expected RouteFound, got {:?}", r.outcome);
    };
    let modes: Vec<_> = result.routes.iter().map(|o| o.mode).collect();
    assert_eq!(
        modes,
        vec![TravelMode::Driving, TravelMode::Walking, TravelMode::Transit]
    );
    assert_eq!(result.primary().unwrap().duration, "3 hr 45 min");

    let state = h.resolver.map_state().await;
    assert_eq!(state.route(&map).unwrap().mode, TravelMode::Driving);
    assert_eq!(state.markers(&map).len(), 2);
}

#[tokio::test]
async fn no_usable_mode_is_no_route() {
    let routes = MockRoutes::new()
        .failing(TravelMode::Driving)
        .failing(TravelMode::Walking)
        .unsupported(TravelMode::Bicycling)
        .unsupported(TravelMode::Transit);
    let h = harness(boston_and_nyc(), routes);

    let r = applied(
        h.resolver
            .resolve(&Channel::default(), MapAction::directions("Boston", "New York"))
            .await,
    );
    assert_eq!(direction_error(&r).0, DirectionErrorKind::NoRoute);
}

#[tokio::test]
async fn legs_with_unusable_measurements_are_dropped() {
    let broken = |distance_meters, duration_seconds| RouteLeg {
        distance_meters,
        duration_seconds,
        geometry: Vec::new(),
    };
    let routes = MockRoutes::new()
        .on_mode(TravelMode::Driving, 346.0, 225.0)
        .on_leg(TravelMode::Walking, broken(f64::NAN, 14_400.0))
        .on_leg(TravelMode::Bicycling, broken(-1.0, 3_600.0))
        .on_leg(TravelMode::Transit, broken(340_000.0, f64::INFINITY));
    let h = harness(boston_and_nyc(), routes);

    let r = applied(
        h.resolver
            .resolve(&Channel::default(), MapAction::directions("Boston", "New York"))
            .await,
    );

    let ActionOutcome::RouteFound(result) = &r.outcome else {
        panic!("expected RouteFound, got {:?}", r.outcome);
    };
    let modes: Vec<_> = result.routes.iter().map(|o| o.mode).collect();
    assert_eq!(modes, vec![TravelMode::Driving]);
}

#[tokio::test]
async fn only_unusable_legs_is_no_route() {
    let routes = MockRoutes::new()
        .on_leg(
            TravelMode::Driving,
            RouteLeg {
                distance_meters: f64::NAN,
                duration_seconds: f64::NAN,
                geometry: Vec::new(),
            },
        )
        .unsupported(TravelMode::Walking)
        .unsupported(TravelMode::Bicycling)
        .unsupported(TravelMode::Transit);
    let h = harness(boston_and_nyc(), routes);

    let r = applied(
        h.resolver
            .resolve(&Channel::default(), MapAction::directions("Boston", "New York"))
            .await,
    );
    assert_eq!(direction_error(&r).0, DirectionErrorKind::NoRoute);
}

#[tokio::test(start_paused = true)]
async fn modes_are_routed_concurrently() {
    let routes = MockRoutes::new()
        .on_mode(TravelMode::Driving, 346.0, 225.0)
        .on_mode(TravelMode::Walking, 330.0, 4_000.0)
        .on_mode(TravelMode::Bicycling, 340.0, 1_300.0)
        .unsupported(TravelMode::Transit)
        .with_latency(Duration::from_secs(1));
    let h = harness(boston_and_nyc(), routes);

    let started = Instant::now();
    let r = applied(
        h.resolver
            .resolve(&Channel::default(), MapAction::directions("Boston", "New York"))
            .await,
    );
    let elapsed = started.elapsed();

    let ActionOutcome::RouteFound(result) = &r.outcome else {
        panic!("expected RouteFound, got {:?}", r.outcome);
    };
    assert_eq!(result.routes.len(), 3);
    assert_eq!(h.routes.calls().len(), 3);
    assert!(elapsed >= Duration::from_secs(1), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "{elapsed:?}");
}

#[tokio::test]
async fn unknown_destination_is_invalid_request() {
    let h = harness(boston_and_nyc(), MockRoutes::new().on_mode(TravelMode::Driving, 1.0, 1.0));

    let r = applied(
        h.resolver
            .resolve(&Channel::default(), MapAction::directions("Boston", "Atlantis"))
            .await,
    );

    let (kind, message) = direction_error(&r);
    assert_eq!(kind, DirectionErrorKind::InvalidRequest);
    assert!(message.contains("destination \"Atlantis\""), "{message}");
    assert!(h.routes.calls().is_empty());
}

#[tokio::test]
async fn geocoding_failure_is_unknown_error() {
    let h = harness(boston_and_nyc().failing("Springfield"), MockRoutes::new());
    let r = applied(
        h.resolver
            .resolve(&Channel::default(), MapAction::directions("Springfield", "Boston"))
            .await,
    );
    assert_eq!(direction_error(&r).0, DirectionErrorKind::UnknownError);
}

#[tokio::test]
async fn my_location_uses_the_device_position() {
    let h = harness(boston_and_nyc(), MockRoutes::new().on_mode(TravelMode::Driving, 346.0, 225.0));
    let resolver = MapActionResolver::new(h.places.clone(), h.routes.clone(), ResolverConfig::default())
        .with_locator(Arc::new(MockLocator::at(NYC)));
    let map = Channel::default();

    applied(resolver.resolve(&map, MapAction::directions("My Location", "Boston")).await);

    let state = resolver.map_state().await;
    assert_eq!(state.route(&map).unwrap().geometry[0], latlng(NYC));
    assert_eq!(h.places.calls(), vec!["Boston"]);
}

#[tokio::test]
async fn my_location_falls_back_to_viewport_when_locator_rejects() {
    let h = harness(boston_and_nyc(), MockRoutes::new().on_mode(TravelMode::Driving, 5.0, 15.0));
    let resolver = h.resolver.with_locator(Arc::new(MockLocator::Failing));
    let map = Channel::default();

    let r = applied(resolver.resolve(&map, MapAction::directions("my location", "Boston")).await);

    let ActionOutcome::RouteFound(result) = &r.outcome else {
        panic!("expected RouteFound, got {:?}", r.outcome);
    };
    assert!(result.origin_place.is_none());
    let state = resolver.map_state().await;
    assert_eq!(state.route(&map).unwrap().geometry[0], latlng(CAMBRIDGE));
}

#[tokio::test(start_paused = true)]
async fn my_location_times_out_to_viewport() {
    let h = harness(boston_and_nyc(), MockRoutes::new().on_mode(TravelMode::Walking, 5.0, 60.0));
    let resolver = h.resolver.with_locator(Arc::new(MockLocator::Hanging));
    let map = Channel::default();
    let started = Instant::now();

    applied(resolver.resolve(&map, MapAction::directions("my location", "Boston")).await);

    assert!(started.elapsed() >= Duration::from_secs(5));
    let state = resolver.map_state().await;
    assert_eq!(state.route(&map).unwrap().geometry[0], latlng(CAMBRIDGE));
}

// ---------------------------------------------------------------------------
// Last action wins
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn newer_search_supersedes_in_flight_directions() {
    let places = boston_and_nyc().with_latency(Duration::from_secs(2));
    let routes = MockRoutes::new().on_mode(TravelMode::Driving, 346.0, 225.0);
    let h = harness(places, routes);
    let map = Channel::default();

    let directions = MapAction::directions("Boston", "New York");
    let directions_id = directions.id;

    let (first, second) = tokio::join!(h.resolver.resolve(&map, directions), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.resolver.resolve(&map, MapAction::search_one("New York")).await
    });

    assert_eq!(
        first,
        ResolveStatus::Superseded {
            action_id: directions_id
        }
    );
    assert!(matches!(second, ResolveStatus::Applied(_)));
    assert!(h.routes.calls().is_empty());

    let state = h.resolver.map_state().await;
    assert!(state.route(&map).is_none());
    assert_eq!(state.viewport.center, latlng(NYC));
}

#[tokio::test(start_paused = true)]
async fn channels_do_not_supersede_each_other() {
    let places = boston_and_nyc().with_latency(Duration::from_secs(1));
    let routes = MockRoutes::new().on_mode(TravelMode::Driving, 346.0, 225.0);
    let h = harness(places, routes);
    let left = Channel::from("left");
    let right = Channel::from("right");

    let (first, second) = tokio::join!(
        h.resolver.resolve(&left, MapAction::directions("Boston", "New York")),
        h.resolver.resolve(&right, MapAction::search_one("Boston")),
    );

    assert!(matches!(first, ResolveStatus::Applied(_)));
    assert!(matches!(second, ResolveStatus::Applied(_)));
    let state = h.resolver.map_state().await;
    assert!(state.route(&left).is_some());
    assert_eq!(state.markers(&right).len(), 1);
}

#[tokio::test]
async fn resubmitted_action_is_duplicate() {
    let h = harness(boston_and_nyc(), MockRoutes::new());
    let action = MapAction::goto(48.8584, 2.2945, Some(16.0), Some("Eiffel Tower".into()));

    let first = h.resolver.resolve(&Channel::default(), action.clone()).await;
    let second = h.resolver.resolve(&Channel::default(), action.clone()).await;

    assert_eq!(first.outcome(), Some(&ActionOutcome::ViewUpdated));
    assert_eq!(second, ResolveStatus::Duplicate { action_id: action.id });
}

#[tokio::test]
async fn goto_and_marker_update_the_view() {
    let h = harness(boston_and_nyc(), MockRoutes::new());
    let map = Channel::default();

    h.resolver
        .resolve(&map, MapAction::goto(48.8584, 2.2945, None, None))
        .await;
    let state = h.resolver.map_state().await;
    assert_eq!(state.viewport.center.lat, 48.8584);
    assert_eq!(state.viewport.zoom, h.resolver.config().default_zoom);
    assert!(state.markers(&map).is_empty());

    h.resolver
        .resolve(&map, MapAction::marker(48.8606, 2.3376, Some("Louvre".into())))
        .await;
    let state = h.resolver.map_state().await;
    assert_eq!(state.markers(&map)[0].title.as_deref(), Some("Louvre"));
    assert_eq!(state.viewport.center.lat, 48.8584);
}
