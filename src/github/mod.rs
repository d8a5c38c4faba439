pub mod client;
pub mod normalize;

pub use client::EndpointKind;
pub use client::GithubClient;
pub use client::PageProgress;
pub use client::RawPage;
pub use client::RetryPolicy;
