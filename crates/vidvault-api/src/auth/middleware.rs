use crate::auth::models::SessionContext;
use crate::auth::session::SessionResolver;
use crate::utils::ip_extraction::extract_client_ip;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Clone)]
pub struct SessionState {
    pub resolver: Arc<dyn SessionResolver>,
    pub trusted_proxy_count: usize,
}

/// Resolve the session and client address for every request.
///
/// Never rejects: anonymous requests continue with `user: None` and the routes that
/// need an identity refuse them.
pub async fn session_middleware(
    State(session_state): State<Arc<SessionState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let socket_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_ip = extract_client_ip(
        request.headers(),
        socket_addr.as_ref(),
        session_state.trusted_proxy_count,
    );
    let user = session_state.resolver.current_user(request.headers());

    tracing::trace!(
        client_ip = %client_ip,
        user_id = ?user.map(|u| u.id()),
        "Session resolved"
    );

    request
        .extensions_mut()
        .insert(SessionContext { user, client_ip });
    next.run(request).await
}
