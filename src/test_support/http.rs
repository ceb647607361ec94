use httpmock::MockServer;

/// Start a fresh `httpmock::MockServer`, or `None` when the environment cannot bind one.
pub async fn start_mock_server() -> Option<MockServer> {
    let handle = tokio::task::spawn(MockServer::start_async());
    handle.await.ok()
}
