//! System prompt assembly
//!
//! The translation service receives one system prompt per run. It fixes the
//! contract the response parser depends on: the user message is a JSON
//! document, a space, and a language code, and the reply must be the
//! translated JSON alone.

/// Project flavor folded into the system prompt.
#[derive(Debug, Clone)]
pub struct PromptProfile {
    pub project_name: String,
    pub project_description: String,
    /// Language code to display name, in prompt order.
    pub language_names: Vec<(String, String)>,
}

pub const DEFAULT_LANGUAGE_NAMES: [(&str, &str); 13] = [
    ("en", "English"),
    ("zh-CN", "Chinese (Simplified)"),
    ("zh-TW", "Chinese (Traditional)"),
    ("ja-JP", "Japanese"),
    ("fr", "French"),
    ("de", "German"),
    ("it", "Italian"),
    ("es", "Spanish"),
    ("pt-PT", "Portuguese (Portugal)"),
    ("nl", "Dutch"),
    ("uk", "Ukrainian"),
    ("pl", "Polish"),
    ("ko-KR", "Korean"),
];

impl Default for PromptProfile {
    fn default() -> Self {
        Self {
            project_name: "the application".to_string(),
            project_description: String::new(),
            language_names: DEFAULT_LANGUAGE_NAMES
                .iter()
                .map(|(code, name)| (code.to_string(), name.to_string()))
                .collect(),
        }
    }
}

impl PromptProfile {
    pub fn display_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.language_names
            .iter()
            .find(|(known, _)| known == code)
            .map(|(_, name)| name.as_str())
            .unwrap_or(code)
    }
}

pub fn build_system_prompt(profile: &PromptProfile) -> String {
    let mut prompt = format!(
        "You are a professional localization translator working on {}.\n",
        profile.project_name
    );
    let description = profile.project_description.trim();
    if !description.is_empty() {
        prompt.push_str("Project background: ");
        prompt.push_str(description);
        prompt.push('\n');
    }
    prompt.push('\n');
    prompt.push_str(
        "The user message is a JSON document followed by a single space and a target \
         language code. Translate every string value into the language named by the code.\n\n\
         Rules:\n\
         1. Translate values only. Keys, placeholders, numbers, and identifiers stay unchanged.\n\
         2. Nested objects keep their structure; translate string values at every depth.\n\
         3. Keep product names and established terms consistent and unambiguous.\n\
         4. Reply with the translated JSON document alone, no commentary and no code fences.\n\n\
         Language codes:\n",
    );
    for (code, name) in &profile.language_names {
        prompt.push_str(&format!("{code} -> {name}\n"));
    }
    prompt.push_str("\nExamples:\n");
    prompt.push_str("Input: {\"login\":\"Login\"} zh-CN\nOutput: {\"login\":\"登录\"}\n");
    prompt.push_str(
        "Input: {\"order_id\":\"12345\",\"description\":\"A beautiful dress\"} zh-CN\n\
         Output: {\"order_id\":\"12345\",\"description\":\"一件漂亮的连衣裙\"}\n",
    );
    prompt.push_str(&format!(
        "Input: {{\"name\":\"{0}\"}} zh-CN\nOutput: {{\"name\":\"{0}\"}}\n",
        profile.project_name
    ));
    prompt
}

/// The wire form the few-shot examples teach: payload, one space, code.
pub fn build_user_content(selection_json: &str, language: &str) -> String {
    format!("{selection_json} {language}")
}
