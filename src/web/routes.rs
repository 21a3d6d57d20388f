use salvo::logging::Logger;
use salvo::prelude::*;

use super::handlers::contacts::{create_contact, delete_contact, list_contacts, update_contact};
use super::handlers::health::{get_status, health_check};
use super::handlers::opportunities::{
    create_opportunity, delete_opportunity, list_opportunities, update_opportunity,
};

pub fn create_router() -> Router {
    Router::new()
        .hoop(Logger::new())
        .push(Router::with_path("health").get(health_check))
        .push(Router::with_path("status").get(get_status))
        .push(
            Router::with_path("api")
                .push(
                    Router::with_path("opportunities")
                        .get(list_opportunities)
                        .post(create_opportunity)
                        .put(update_opportunity)
                        .delete(delete_opportunity),
                )
                .push(
                    Router::with_path("contacts")
                        .get(list_contacts)
                        .post(create_contact)
                        .put(update_contact)
                        .delete(delete_contact),
                ),
        )
}
