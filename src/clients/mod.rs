pub mod orizon_client;
pub mod soap_envelope;

pub use orizon_client::OrizonClient;
pub use soap_envelope::{build_envelope, normalize_password, EnvelopeFields, ProviderCredentials};
