use axum::{
    middleware::from_fn_with_state,
    routing::{post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{require_role, RoleGate};
use crate::models::Role;
use crate::state::AppState;

const MANAGERS: &[Role] = &[Role::Staff, Role::Admin];
const CUSTOMERS: &[Role] = &[Role::Customer];

pub fn router(state: AppState) -> Router {
    let catalog = Router::new()
        .route(
            "/add_property",
            post(handlers::add_property).fallback(handlers::method_not_allowed),
        )
        .route(
            "/add_room",
            post(handlers::add_room).fallback(handlers::method_not_allowed),
        )
        .route(
            "/update_room_status",
            put(handlers::update_room_status).fallback(handlers::method_not_allowed),
        )
        .route_layer(from_fn_with_state(
            RoleGate::new(state.clone(), MANAGERS),
            require_role,
        ));

    let guests = Router::new()
        .route(
            "/search_rooms",
            post(handlers::search_rooms).fallback(handlers::method_not_allowed),
        )
        .route(
            "/booking",
            post(handlers::create_booking).fallback(handlers::method_not_allowed),
        )
        .route_layer(from_fn_with_state(
            RoleGate::new(state.clone(), CUSTOMERS),
            require_role,
        ));

    Router::new()
        .route(
            "/register",
            post(handlers::register).fallback(handlers::method_not_allowed),
        )
        .route(
            "/login",
            post(handlers::login).fallback(handlers::method_not_allowed),
        )
        .merge(catalog)
        .merge(guests)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
