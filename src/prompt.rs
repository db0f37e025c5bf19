use crate::languages;

const TEMPLATE: &str = "You are a professional {SOURCE_LANG} ({SOURCE_CODE}) to {TARGET_LANG} ({TARGET_CODE}) translator. \
Your goal is to accurately convey the meaning and nuances of the original {SOURCE_LANG} text while following {TARGET_LANG} grammar, vocabulary, and cultural conventions.
Produce only the {TARGET_LANG} translation, without any additional explanations, notes, or commentary. Do not repeat the original text. Do not say \"Here is the translation\".

Please translate the following {SOURCE_LANG} text into {TARGET_LANG}:


{TEXT}";

/// Build the generation prompt from display names as shown in the menu.
/// Unknown names fall back to auto-detect for the source and English for the target.
pub fn build_prompt(source_lang: &str, target_lang: &str, text: &str) -> String {
    let source = languages::by_name(source_lang).copied().unwrap_or(languages::AUTO_DETECT);
    let target = languages::by_name(target_lang).copied().unwrap_or(languages::ENGLISH);

    let (source_name, source_code) = if source.is_auto() {
        ("Source Language", "auto")
    } else {
        (source.display_name, source.code)
    };

    // TEXT last so placeholders inside the copied text are left alone
    TEMPLATE
        .replace("{SOURCE_LANG}", source_name)
        .replace("{SOURCE_CODE}", source_code)
        .replace("{TARGET_LANG}", target_lang)
        .replace("{TARGET_CODE}", target.code)
        .replace("{TEXT}", text)
}
