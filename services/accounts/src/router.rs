use std::time::Duration;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, patch, post, put},
};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use tessera_core::health::{healthz, readyz};
use tessera_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::domain::repository::TransactionCoordinator;
use crate::handlers::{
    account::{create_account, get_accounts, lookup_account, set_primary_email_address, update_me},
    email_address::{
        get_email_address, get_email_addresses, get_email_addresses_for_account,
        register_email_address, unregister_email_address,
    },
    phone_number::{
        get_phone_number, get_phone_numbers, get_phone_numbers_for_account, register_phone_number,
        unregister_phone_number,
    },
};
use crate::state::AppState;

pub fn build_router<C: TransactionCoordinator + 'static>(
    state: AppState<C>,
    request_timeout: Duration,
) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Accounts
        .route("/accounts", post(create_account::<C>).get(get_accounts::<C>))
        .route("/accounts/lookup", get(lookup_account::<C>))
        .route("/accounts/@me", patch(update_me::<C>))
        .route(
            "/accounts/@me/primary-email-address",
            put(set_primary_email_address::<C>),
        )
        // Email addresses
        .route(
            "/accounts/@me/email-addresses",
            post(register_email_address::<C>),
        )
        .route(
            "/accounts/@me/email-addresses/{id}",
            get(get_email_address::<C>).delete(unregister_email_address::<C>),
        )
        .route(
            "/accounts/{id}/email-addresses",
            get(get_email_addresses_for_account::<C>),
        )
        .route("/email-addresses", get(get_email_addresses::<C>))
        // Phone numbers
        .route(
            "/accounts/@me/phone-numbers",
            post(register_phone_number::<C>),
        )
        .route(
            "/accounts/@me/phone-numbers/{id}",
            get(get_phone_number::<C>).delete(unregister_phone_number::<C>),
        )
        .route(
            "/accounts/{id}/phone-numbers",
            get(get_phone_numbers_for_account::<C>),
        )
        .route("/phone-numbers", get(get_phone_numbers::<C>))
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                )),
        )
        .with_state(state)
}
