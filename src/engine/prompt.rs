//! Prompt construction for deal selection.
//!
//! The system prompt and the user-prompt prefix/suffix are fixed; only
//! the list of described deals in the middle varies between scans.

use crate::types::ScrapedDeal;

pub const SYSTEM_PROMPT: &str = r#"You identify and summarize the 5 most detailed deals from a list, by selecting deals that have the most detailed, high quality description and the most clear price.
Respond strictly in JSON with no explanation, using this format. You should provide the price as a number derived from the description. If the price of a deal isn't clear, do not include that deal in your response.
Most important is that you respond with the 5 deals that have the most detailed product description with price. It's not important to mention the terms of the deal; most important is a thorough description of the product.
Be careful with products that are described as "$XXX off" or "reduced by $XXX" - this isn't the actual price of the product. Only respond with products when you are highly confident about the price.

{"deals": [
    {
        "product_description": "Your clearly expressed summary of the product in 4-5 sentences. Details of the item are much more important than why it's a good deal. Avoid mentioning discounts and coupons; focus on the item itself. There should be a paragraph of text for each item you choose.",
        "price": 99.99,
        "url": "the url as provided"
    },
    ...
]}"#;

pub const USER_PROMPT_PREFIX: &str = r#"Respond with the most promising 5 deals from this list, selecting those which have the most detailed, high quality product description and a clear price that is greater than 0.
Respond strictly in JSON, and only JSON. You should rephrase the description to be a summary of the product itself, not the terms of the deal.
Remember to respond with a paragraph of text in the product_description field for each of the 5 items that you select.
Be careful with products that are described as "$XXX off" or "reduced by $XXX" - this isn't the actual price of the product. Only respond with products when you are highly confident about the price.

Deals:

"#;

pub const USER_PROMPT_SUFFIX: &str = "\n\nStrictly respond in JSON and include exactly 5 deals, no more.";

/// Build the user prompt: prefix, each deal's description separated by a
/// blank line, then the suffix.
pub fn build_user_prompt(deals: &[ScrapedDeal]) -> String {
    let described: Vec<String> = deals.iter().map(ScrapedDeal::describe).collect();
    let body = described.join("\n\n");

    let mut prompt =
        String::with_capacity(USER_PROMPT_PREFIX.len() + body.len() + USER_PROMPT_SUFFIX.len());
    prompt.push_str(USER_PROMPT_PREFIX);
    prompt.push_str(&body);
    prompt.push_str(USER_PROMPT_SUFFIX);
    prompt
}
