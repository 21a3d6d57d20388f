use salvo::prelude::*;
use serde_json::json;
use tracing::{error, warn};

use super::{parse_body, render_error, render_json};
use crate::db::{DeleteRequest, NewOpportunity, OpportunityPatch};
use crate::utils::timestamp_now;
use crate::web::web_state;

#[handler]
pub async fn list_opportunities(res: &mut Response) {
    match web_state()
        .db_manager
        .opportunity_store()
        .list_opportunities()
        .await
    {
        Ok(opportunities) => render_json(res, StatusCode::OK, opportunities),
        Err(err) => {
            error!("Error fetching opportunities: {}", err);
            render_error(
                res,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch opportunities",
            );
        }
    }
}

#[handler]
pub async fn create_opportunity(req: &mut Request, res: &mut Response) {
    let payload = match parse_body::<NewOpportunity>(req).await {
        Ok(payload) => payload,
        Err(err) => {
            warn!("Rejected opportunity payload: {}", err);
            render_error(res, StatusCode::BAD_REQUEST, "Invalid opportunity payload");
            return;
        }
    };

    let opportunity = payload.into_opportunity(timestamp_now());
    match web_state()
        .db_manager
        .opportunity_store()
        .create_opportunity(&opportunity)
        .await
    {
        Ok(()) => render_json(res, StatusCode::CREATED, opportunity),
        Err(err) => {
            error!("Error creating opportunity: {}", err);
            render_error(
                res,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create opportunity",
            );
        }
    }
}

#[handler]
pub async fn update_opportunity(req: &mut Request, res: &mut Response) {
    let patch = match parse_body::<OpportunityPatch>(req).await {
        Ok(patch) => patch,
        Err(err) => {
            warn!("Rejected opportunity update: {}", err);
            render_error(res, StatusCode::BAD_REQUEST, "Invalid opportunity payload");
            return;
        }
    };
    let Some(id) = patch.target_id() else {
        render_error(res, StatusCode::BAD_REQUEST, "ID is required");
        return;
    };

    let store = web_state().db_manager.opportunity_store();
    if let Err(err) = store.update_opportunity(id, &patch, timestamp_now()).await {
        error!("Error updating opportunity {}: {}", id, err);
        render_error(
            res,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to update opportunity",
        );
        return;
    }

    // A missing row renders as `null`.
    match store.get_opportunity(id).await {
        Ok(updated) => render_json(res, StatusCode::OK, updated),
        Err(err) => {
            error!("Error reading back opportunity {}: {}", id, err);
            render_error(
                res,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to update opportunity",
            );
        }
    }
}

#[handler]
pub async fn delete_opportunity(req: &mut Request, res: &mut Response) {
    let request = match parse_body::<DeleteRequest>(req).await {
        Ok(request) => request,
        Err(err) => {
            warn!("Rejected opportunity delete: {}", err);
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
        .opportunity_store()
        .delete_opportunity(id)
        .await
    {
        Ok(()) => render_json(res, StatusCode::OK, json!({ "success": true })),
        Err(err) => {
            error!("Error deleting opportunity {}: {}", id, err);
            render_error(
                res,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete opportunity",
            );
        }
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use std::time::Duration;

    use salvo::prelude::*;
    use salvo::Service;
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{json, Value};

    use crate::db::{Opportunity, Stage};
    use crate::web::test_support::{service, BASE_URL};

    fn url() -> String {
        format!("{}/api/opportunities", BASE_URL)
    }

    async fn create(service: &Service, title: &str) -> Opportunity {
        let mut res = TestClient::post(url())
            .json(&json!({
                "title": title,
                "company": "Acme",
                "value": 5000,
                "stage": "Discovery",
            }))
            .send(service)
            .await;
        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        res.take_json().await.unwrap()
    }

    #[tokio::test]
    async fn create_ignores_client_owned_fields() {
        let service = service().await;
        let mut res = TestClient::post(url())
            .json(&json!({
                "id": "client-chosen",
                "title": "Renewal",
                "company": "Globex",
                "value": 1200.5,
                "stage": "Proposal",
                "probability": 70,
                "daysInStage": 12,
                "createdAt": "2001-01-01T00:00:00.000Z",
            }))
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        let created: Opportunity = res.take_json().await.unwrap();
        assert_ne!(created.id, "client-chosen");
        assert_eq!(created.probability, 70);
        assert_eq!(created.days_in_stage, Some(0));
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(created.last_activity, Some(created.created_at));

        let mut res = TestClient::get(url()).send(&service).await;
        assert_eq!(res.status_code, Some(StatusCode::OK));
        let listed: Vec<Opportunity> = res.take_json().await.unwrap();
        assert!(listed.contains(&created));
    }

    #[tokio::test]
    async fn bodies_are_json_whatever_the_content_type() {
        let service = service().await;
        let body = json!({
            "title": "Plain text",
            "company": "Hooli",
            "value": 300,
            "stage": "Discovery",
        });
        let mut res = TestClient::post(url())
            .text(body.to_string())
            .send(&service)
            .await;
        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        let created: Opportunity = res.take_json().await.unwrap();
        assert_eq!(created.company, "Hooli");

        let mut res = TestClient::delete(url())
            .body(json!({ "id": created.id }).to_string())
            .send(&service)
            .await;
        assert_eq!(res.status_code, Some(StatusCode::OK));
        let deleted: Value = res.take_json().await.unwrap();
        assert_eq!(deleted["success"], true);

        let mut res = TestClient::get(url()).send(&service).await;
        let listed: Vec<Opportunity> = res.take_json().await.unwrap();
        assert!(listed.iter().all(|o| o.id != created.id));
    }

    #[tokio::test]
    async fn create_defaults_probability() {
        let service = service().await;
        let created = create(&service, "Defaults").await;
        assert_eq!(created.probability, 50);
    }

    #[tokio::test]
    async fn create_rejects_malformed_body() {
        let service = service().await;
        let res = TestClient::post(url())
            .json(&json!({ "title": "No company" }))
            .send(&service)
            .await;
        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn update_keeps_created_at_and_advances_updated_at() {
        let service = service().await;
        let created = create(&service, "Expansion").await;

        tokio::time::sleep(Duration::from_millis(5)).await;
        let mut res = TestClient::put(url())
            .json(&json!({
                "id": created.id,
                "stage": "Negotiation",
                "contactName": null,
                "createdAt": "2001-01-01T00:00:00.000Z",
            }))
            .send(&service)
            .await;
        assert_eq!(res.status_code, Some(StatusCode::OK));
        let first: Opportunity = res.take_json().await.unwrap();
        assert_eq!(first.stage, Stage::Negotiation);
        assert_eq!(first.title, "Expansion");
        assert_eq!(first.contact_name, None);
        assert_eq!(first.created_at, created.created_at);
        assert!(first.updated_at > created.updated_at);

        tokio::time::sleep(Duration::from_millis(5)).await;
        let mut res = TestClient::put(url())
            .json(&json!({ "id": created.id, "value": 9000 }))
            .send(&service)
            .await;
        let second: Opportunity = res.take_json().await.unwrap();
        assert_eq!(second.value, 9000.0);
        assert_eq!(second.created_at, created.created_at);
        assert!(second.updated_at > first.updated_at);
    }

    #[tokio::test]
    async fn update_of_unknown_id_renders_null() {
        let service = service().await;
        let mut res = TestClient::put(url())
            .json(&json!({ "id": "does-not-exist", "title": "Ghost" }))
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        let body: Value = res.take_json().await.unwrap();
        assert!(body.is_null());
    }

    #[tokio::test]
    async fn update_without_id_is_rejected_without_writing() {
        let service = service().await;
        let created = create(&service, "Untouched").await;

        for body in [json!({ "title": "Hijack" }), json!({ "id": "", "title": "Hijack" })] {
            let mut res = TestClient::put(url()).json(&body).send(&service).await;
            assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
            let error: Value = res.take_json().await.unwrap();
            assert_eq!(error["error"], "ID is required");
        }

        let mut res = TestClient::get(url()).send(&service).await;
        let listed: Vec<Opportunity> = res.take_json().await.unwrap();
        let stored = listed.iter().find(|o| o.id == created.id).unwrap();
        assert_eq!(stored.title, "Untouched");
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let service = service().await;
        let created = create(&service, "Short lived").await;

        let mut res = TestClient::delete(url())
            .json(&json!({ "id": created.id }))
            .send(&service)
            .await;
        assert_eq!(res.status_code, Some(StatusCode::OK));
        let body: Value = res.take_json().await.unwrap();
        assert_eq!(body, json!({ "success": true }));

        let mut res = TestClient::get(url()).send(&service).await;
        let listed: Vec<Opportunity> = res.take_json().await.unwrap();
        assert!(listed.iter().all(|o| o.id != created.id));
    }

    #[tokio::test]
    async fn delete_of_unknown_id_still_succeeds() {
        let service = service().await;
        let mut res = TestClient::delete(url())
            .json(&json!({ "id": "never-existed" }))
            .send(&service)
            .await;
        assert_eq!(res.status_code, Some(StatusCode::OK));
        let body: Value = res.take_json().await.unwrap();
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn delete_without_id_is_rejected() {
        let service = service().await;
        let res = TestClient::delete(url())
            .json(&json!({}))
            .send(&service)
            .await;
        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));
    }
}
