use salvo::prelude::*;
use serde_json::json;
use tracing::{error, warn};

use super::{parse_body, render_error, render_json};
use crate::db::{ContactPatch, DeleteRequest, NewContact};
use crate::utils::timestamp_now;
use crate::web::web_state;

#[handler]
pub async fn list_contacts(res: &mut Response) {
    match web_state().db_manager.contact_store().list_contacts().await {
        Ok(contacts) => render_json(res, StatusCode::OK, contacts),
        Err(err) => {
            error!("Error fetching contacts: {}", err);
            render_error(
                res,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch contacts",
            );
        }
    }
}

#[handler]
pub async fn create_contact(req: &mut Request, res: &mut Response) {
    let payload = match parse_body::<NewContact>(req).await {
        Ok(payload) => payload,
        Err(err) => {
            warn!("Rejected contact payload: {}", err);
            render_error(res, StatusCode::BAD_REQUEST, "Invalid contact payload");
            return;
        }
    };

    let contact = payload.into_contact(timestamp_now());
    match web_state()
        .db_manager
        .contact_store()
        .create_contact(&contact)
        .await
    {
        Ok(()) => render_json(res, StatusCode::CREATED, contact),
        Err(err) => {
            error!("Error creating contact {}: {}", contact.id, err);
            render_error(
                res,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create contact",
            );
        }
    }
}

#[handler]
pub async fn update_contact(req: &mut Request, res: &mut Response) {
    let patch = match parse_body::<ContactPatch>(req).await {
        Ok(patch) => patch,
        Err(err) => {
            warn!("Rejected contact update: {}", err);
            render_error(res, StatusCode::BAD_REQUEST, "Invalid contact payload");
            return;
        }
    };
    let Some(id) = patch.target_id() else {
        render_error(res, StatusCode::BAD_REQUEST, "ID is required");
        return;
    };

    let store = web_state().db_manager.contact_store();
    if let Err(err) = store.update_contact(id, &patch, timestamp_now()).await {
        error!("Error updating contact {}: {}", id, err);
        render_error(
            res,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to update contact",
        );
        return;
    }

    match store.get_contact(id).await {
        Ok(updated) => render_json(res, StatusCode::OK, updated),
        Err(err) => {
            error!("Error reading back contact {}: {}", id, err);
            render_error(
                res,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update contact",
            );
        }
    }
}

#[handler]
pub async fn delete_contact(req: &mut Request, res: &mut Response) {
    let request = match parse_body::<DeleteRequest>(req).await {
        Ok(request) => request,
        Err(err) => {
            warn!("Rejected contact delete: {}", err);
            render_error(res, StatusCode::BAD_REQUEST, "ID is required");
            return;
        }
    };
    let Some(id) = request.target_id() else {
        render_error(res, StatusCode::BAD_REQUEST, "ID is required");
        return;
    };

    match web_state()
        .db_manager
        .contact_store()
        .delete_contact(id)
        .await
    {
        Ok(()) => render_json(res, StatusCode::OK, json!({ "success": true })),
        Err(err) => {
            error!("Error deleting contact {}: {}", id, err);
            render_error(
                res,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete contact",
            );
        }
    }
}
