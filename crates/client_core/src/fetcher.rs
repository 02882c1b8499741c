use async_trait::async_trait;
use shared::{domain::QueryKey, error::FetchError};

/// Network side of a [`QueryController`](crate::QueryController).
///
/// The controller aborts an in-flight attempt by dropping the future returned
/// from [`fetch`](Fetcher::fetch), so implementations must not rely on running
/// to completion. An implementation may still return
/// [`FetchError::Cancelled`] when its transport reports an abort on its own.
#[async_trait]
pub trait Fetcher: Send + Sync + 'static {
    type Payload: Clone + Send + Sync + 'static;

    async fn fetch(&self, key: &QueryKey) -> Result<Self::Payload, FetchError>;
}
