use crate::generator::GenerationRequest;

const INTRO: &str = "You write replies to customer reviews on behalf of a business owner.";
const RULES_HEADER: &str = "Rules:";
const RULES: &[&str] = &[
    "Output the reply text only. Plain text: no markdown, no headings, no bullet points, no surrounding quotes.",
    "Address the reviewer by name.",
    "Keep it under 120 words.",
    "If the rating is 2 stars or lower, apologize sincerely and invite the reviewer to get in touch.",
    "Never invent facts about the business, its staff, or the reviewer's visit.",
];

/// System prompt: who is speaking, in what voice and language.
pub fn build_reply_system_prompt(request: &GenerationRequest) -> String {
    let business = &request.business;

    let identity = match &business.business_type {
        Some(kind) if !kind.trim().is_empty() => {
            format!("The business is {}, a {}.", business.display_name, kind.trim())
        }
        _ => format!("The business is {}.", business.display_name),
    };

    let mut rules = RULES
        .iter()
        .map(|rule| format!("- {}", rule))
        .collect::<Vec<_>>();
    if let Some(signature) = business.signature.as_deref().filter(|s| !s.trim().is_empty()) {
        rules.push(format!("- End the reply with this signature on its own line: {signature}"));
    }

    format!(
        "{intro}\n{identity}\n\nTone: {tone}\nLanguage: write the entire reply in {language}.\n\n{rules_header}\n{rules}\n",
        intro = INTRO,
        identity = identity,
        tone = request.tone,
        language = request.language,
        rules_header = RULES_HEADER,
        rules = rules.join("\n"),
    )
}

/// User message: the review being answered.
pub fn build_review_message(request: &GenerationRequest) -> String {
    let content = request.content.trim();
    let content = if content.is_empty() {
        "(no written comment, rating only)"
    } else {
        content
    };
    let rating = if (1..=5).contains(&request.rating) {
        format!("{}/5 stars", request.rating)
    } else {
        "unknown".to_string()
    };

    format!(
        "Reviewer: {}\nRating: {}\nReview: {}",
        request.reviewer_name, rating, content
    )
}
