// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments only.

/// Appended to every system prompt: the reply is parsed as JSON, nothing else.
pub const JSON_ONLY_INSTRUCTION: &str = "\
You MUST respond with a single valid JSON object only. \
Do NOT include any text outside the JSON object. \
Do NOT use markdown code fences. \
Do NOT include explanations or apologies.";

/// Hard constraints shared by every stage that rewrites CV content.
pub const NON_FABRICATION_RULES: &str = "\
STRICT RULES:
1. NEVER add information that isn't in the source CV
2. NEVER add education unless explicitly stated in the CV
3. NEVER create certifications unless explicitly listed
4. NEVER add references
5. NEVER add percentages or specific metrics unless they appear in the source
6. NEVER embellish or enhance responsibilities with metrics
7. NEVER fabricate names, employers, institutions or dates";

/// Joins a stage-specific system prompt with the cross-cutting fragments.
pub fn system_prompt(body: &str, with_rules: bool) -> String {
    let mut prompt = body.trim().to_string();
    if with_rules {
        prompt.push_str("\n\n");
        prompt.push_str(NON_FABRICATION_RULES);
    }
    prompt.push_str("\n\n");
    prompt.push_str(JSON_ONLY_INSTRUCTION);
    prompt
}
