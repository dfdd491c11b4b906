use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::require_auth;
use crate::config::{cors_layer_for, create_security_headers_layer, HttpConfig};
use crate::handlers::{
    auth, health_check, organizers, participants, registrations, tickets,
};
use crate::state::AppState;

pub fn create_routes(state: AppState, http: &HttpConfig) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh));

    let protected = Router::new()
        .route("/auth/me", get(auth::current_user))
        .route(
            "/organizers/:id",
            put(organizers::update_organizer).delete(organizers::delete_organizer),
        )
        .route("/participants", post(participants::create_participant))
        .route("/participants/:id", get(participants::get_participant))
        .route(
            "/event_registrations",
            post(registrations::create_registration),
        )
        .route(
            "/event_registrations/:id",
            put(registrations::update_registration),
        )
        .route("/tickets", post(tickets::create_ticket))
        .route(
            "/tickets/:id",
            get(tickets::get_ticket).put(tickets::update_ticket),
        )
        .route("/tickets/qr/:token", get(tickets::get_ticket_by_token))
        .route("/tickets/qr/:token/use", post(tickets::redeem_ticket))
        .route_layer(middleware::from_fn_with_state(
            state.gatekeeper.clone(),
            require_auth,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", public.merge(protected))
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(http.production))
        .layer(cors_layer_for(&http.cors_allowed_origins))
        .with_state(state)
}
