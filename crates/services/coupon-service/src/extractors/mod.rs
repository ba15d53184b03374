//! Custom request extractors.

mod encoded_id;
mod query_params;
mod validated_json;

pub use encoded_id::EncodedId;
pub use query_params::QueryParams;
pub use validated_json::ValidatedJson;
