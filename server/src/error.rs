use relay_shared::ConnectionId;

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("{0} is already registered")]
    AlreadyRegistered(ConnectionId),
}
