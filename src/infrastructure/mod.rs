// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod http_telemetry_source;
pub mod memory_user_repository;
pub mod password;
pub mod tf_serving_model;
pub mod token;

#[cfg(test)]
pub(crate) mod testing {
    use axum::Router;

    /// Serve `router` on an ephemeral local port and return its base URL
    pub async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await });
        format!("http://{}", addr)
    }
}
