use std::any::Any;

use axum::{
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use tower_http::catch_panic::CatchPanicLayer;

use greenlight_core::AppError;

use crate::background::panic_message;

/// Outermost layer: a panicking handler produces the generic 500 envelope
/// and `Connection: close`, and the panic is logged with its payload.
pub fn recover_panic_layer() -> CatchPanicLayer<fn(Box<dyn Any + Send + 'static>) -> Response> {
    CatchPanicLayer::custom(handle_panic as fn(Box<dyn Any + Send + 'static>) -> Response)
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(payload.as_ref());
    tracing::error!(panic = %message, "request handler panicked");

    let mut response =
        AppError::internal(anyhow::anyhow!("handler panicked: {message}")).into_response();
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}
