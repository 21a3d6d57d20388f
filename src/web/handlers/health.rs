use salvo::prelude::*;
use serde_json::json;

use crate::web::web_state;

#[handler]
pub async fn health_check(res: &mut Response) {
    res.status_code(StatusCode::OK);
    res.render(Json(json!({ "status": "ok" })));
}

#[handler]
pub async fn get_status(res: &mut Response) {
    let state = web_state();
    let uptime_seconds = state.started_at.elapsed().as_secs();

    let status_payload = json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": uptime_seconds,
        "database": state.db_manager.db_type().as_str(),
    });

    res.status_code(StatusCode::OK);
    res.render(Json(status_payload));
}
