//! JSON HTTP surface over `AppContext`.
//!
//! A synchronous tiny_http server; every request is handled on its own
//! thread so a long training call does not stall detection requests.

pub mod form;
pub mod handlers;
pub mod multipart;
pub mod request;
pub mod response;
pub mod routes;

use std::sync::Arc;

use tiny_http::Server;
use tracing::info;

use crate::app::AppContext;
use crate::error::{Error, Result};

pub use request::ApiRequest;
pub use response::{ApiError, ApiResponse};
pub use routes::handle;

/// Binds the HTTP listener. `addr` is `host:port`; port 0 picks a free one.
pub fn bind(addr: &str) -> Result<Server> {
    Server::http(addr).map_err(|e| Error::Io(std::io::Error::other(e.to_string())))
}

/// Serves requests until the listener is closed.
pub fn serve(server: Server, ctx: Arc<AppContext>) {
    if let Some(addr) = server.server_addr().to_ip() {
        info!(%addr, "listening");
    }
    for request in server.incoming_requests() {
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, &ctx);
        });
    }
}
