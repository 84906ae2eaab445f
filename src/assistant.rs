use crate::client::Tool;

pub const DEFAULT_ASSISTANT_NAME: &str = "Ecommerce Recommendation Expert";
pub const DEFAULT_MODEL: &str = "gpt-4-1106-preview";
pub const DEFAULT_SUPPORT_EMAIL: &str = "help@redis.com";
pub const DEFAULT_PRODUCT_LINK_BASE: &str = "/?productId=";

/// Fixed configuration the assistant is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantProfile {
    pub name: String,
    pub model: String,
    pub tools: Vec<Tool>,
    pub instructions: String,
}

impl AssistantProfile {
    pub fn ecommerce(model: &str, support_email: &str, product_link_base: &str) -> Self {
        Self {
            name: DEFAULT_ASSISTANT_NAME.to_string(),
            model: model.to_string(),
            tools: vec![Tool::FileSearch],
            instructions: ecommerce_instructions(support_email, product_link_base),
        }
    }
}

impl Default for AssistantProfile {
    fn default() -> Self {
        Self::ecommerce(
            DEFAULT_MODEL,
            DEFAULT_SUPPORT_EMAIL,
            DEFAULT_PRODUCT_LINK_BASE,
        )
    }
}

pub fn ecommerce_instructions(support_email: &str, product_link_base: &str) -> String {
    format!(
        "Please assume the persona of a retail shopping assistant.
Use a friendly tone, and assume the target audience are normal people looking for a product in a ecommerce website.

Answer the question based on the file data provided which contains different products and it's details.

If you don't know the answer, please direct the questioner to email {support_email}. Don't try to suggest any product out of context as it may not be in the store.

Let the answer include product display name, price and optional other details based on question asked.

Let the product display name be a link like <a href=\"{product_link_base}\"> productDisplayName </a>
so that user can click on it and go to the product page with help of productId.
"
    )
}
