use rpc::RpcClient;

/// Shared state handed to every axum handler: a single RPC client (queue
/// routing happens per-call via the `service` argument to `RpcClient::call`)
/// plus the two auth secrets `auth.rs` checks requests against.
#[derive(Clone)]
pub struct AppState {
    pub rpc: RpcClient,
    pub jwt_secret: String,
    pub admin_key: String,
}
