#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageEntry {
    pub display_name: &'static str,
    pub code: &'static str,
}

impl LanguageEntry {
    pub fn is_auto(&self) -> bool {
        self.code == AUTO_DETECT.code
    }
}

pub const AUTO_DETECT: LanguageEntry = LanguageEntry { display_name: "Auto Detect", code: "auto" };
pub const ENGLISH: LanguageEntry = LanguageEntry { display_name: "English", code: "en" };

/// Menu order. The first entry is only valid as a source language.
pub static LANGUAGES: &[LanguageEntry] = &[
    AUTO_DETECT,
    ENGLISH,
    LanguageEntry { display_name: "Chinese (Simplified)", code: "zh-Hans" },
    LanguageEntry { display_name: "Chinese (Traditional)", code: "zh-Hant" },
    LanguageEntry { display_name: "Japanese", code: "ja" },
    LanguageEntry { display_name: "Korean", code: "ko" },
    LanguageEntry { display_name: "French", code: "fr" },
    LanguageEntry { display_name: "German", code: "de" },
    LanguageEntry { display_name: "Spanish", code: "es" },
    LanguageEntry { display_name: "Russian", code: "ru" },
    LanguageEntry { display_name: "Italian", code: "it" },
    LanguageEntry { display_name: "Portuguese", code: "pt" },
];

/// Exact lookup by display name, as used by the tray menu and the prompt builder.
pub fn by_name(display_name: &str) -> Option<&'static LanguageEntry> {
    LANGUAGES.iter().find(|l| l.display_name == display_name)
}

/// Lenient lookup for user input: display name or code, ignoring case.
pub fn resolve(input: &str) -> Option<&'static LanguageEntry> {
    let input = input.trim();
    LANGUAGES
        .iter()
        .find(|l| l.display_name.eq_ignore_ascii_case(input) || l.code.eq_ignore_ascii_case(input))
}

pub fn sources() -> impl Iterator<Item = &'static LanguageEntry> {
    LANGUAGES.iter()
}

pub fn targets() -> impl Iterator<Item = &'static LanguageEntry> {
    LANGUAGES.iter().filter(|l| !l.is_auto())
}
