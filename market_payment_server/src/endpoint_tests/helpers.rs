use actix_web::{
    body::to_bytes,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use log::debug;
use serde::Serialize;

use crate::{
    auth::{USER_ID_HEADER, USER_ROLE_HEADER},
    server::json_error_handler,
};

/// The caller a test request is made on behalf of. `None` sends no identity headers at all.
pub type Caller<'a> = Option<(i64, &'a str)>;

pub async fn get_request<F>(caller: Caller<'_>, path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    send(with_identity(TestRequest::get().uri(path), caller), configure).await
}

pub async fn post_request<T, F>(caller: Caller<'_>, path: &str, body: &T, configure: F) -> (StatusCode, String)
where
    T: Serialize,
    F: FnOnce(&mut ServiceConfig),
{
    send(with_identity(TestRequest::post().uri(path).set_json(body), caller), configure).await
}

pub async fn post_raw<F>(caller: Caller<'_>, path: &str, body: &'static str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let req = TestRequest::post().uri(path).insert_header(("content-type", "application/json")).set_payload(body);
    send(with_identity(req, caller), configure).await
}

fn with_identity(mut req: TestRequest, caller: Caller<'_>) -> TestRequest {
    if let Some((user_id, role)) = caller {
        req = req.insert_header((USER_ID_HEADER, user_id.to_string())).insert_header((USER_ROLE_HEADER, role));
    }
    req
}

// Middleware rejections surface as service errors rather than responses, so both are folded into (status, body)
async fn send<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app =
        App::new().app_data(web::JsonConfig::default().error_handler(json_error_handler)).configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = to_bytes(res.into_body()).await.unwrap();
            (status, String::from_utf8_lossy(&body).into_owned())
        },
    }
}
