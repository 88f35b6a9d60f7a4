pub mod classification;
pub mod gateway;
pub mod openrouter;
pub mod prompts;

pub use classification::{
    ClassificationError, ClassifiedIntent, INTENT_CLASSIFICATION_VERSION_V1,
    IntentClassificationContract, IntentClassificationOutput, classification_schema,
    validate_classification,
};
pub use gateway::{
    LlmCompletion, LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmRequest, LlmUsage, ModelRole,
};
pub use openrouter::{OpenRouterConfigError, OpenRouterGateway, OpenRouterGatewayConfig};
