// Service exports
pub mod cache;
pub mod classifier;
pub mod llm;
pub mod personalizer;
pub mod postgres;
pub mod store;
pub mod transport;

pub use cache::{CacheError, CacheKey, CacheManager, SessionStore};
pub use classifier::{ClassifierError, LeadClassifier, LlmClassifier};
pub use llm::{LlmClient, LlmError};
pub use personalizer::{LlmPersonalizer, Personalizer, PersonalizerError};
pub use postgres::PostgresClient;
pub use store::{LeadStore, StoreError};
pub use transport::{
    ChannelTransport, DeliveryReceipt, HttpEmailTransport, TransportError, TwilioSmsTransport,
};
