use crate::coordinator::preview;
use crate::events::AppEvent;

pub const APP_NAME: &str = "TransPaste";

pub fn toast(title: &str, body: &str) {
    log::info!("[{}] {}", title, body.replace('\n', " | "));
    #[cfg(windows)]
    {
        let _ = winrt_notification::Toast::new(winrt_notification::Toast::POWERSHELL_APP_ID)
            .title(title)
            .text1(body)
            .show();
    }
}

/// Title and body for events that deserve a popup.
pub fn describe(event: &AppEvent) -> Option<(String, String)> {
    match event {
        AppEvent::Started(status) => Some((
            format!("{} Started", APP_NAME),
            format!("Model: {}\nTarget: {}", status.model, status.target_lang),
        )),
        AppEvent::EnabledChanged(true) => Some((APP_NAME.to_string(), "Translation Enabled".to_string())),
        AppEvent::EnabledChanged(false) => Some((APP_NAME.to_string(), "Translation Disabled".to_string())),
        AppEvent::Translated(text) => Some((
            "Translated".to_string(),
            format!("Result copied to clipboard.\n{}", preview(text, 50)),
        )),
        AppEvent::Failed(msg) => Some(("Translation Failed".to_string(), format!("Error: {}", msg))),
        AppEvent::ModelsRefreshed(n) => Some(("Models Refreshed".to_string(), format!("Found {} models.", n))),
        AppEvent::StateChanged(_) => None,
    }
}

pub fn present(event: &AppEvent) {
    if let Some((title, body)) = describe(event) {
        toast(&title, &body);
    }
}

/// Headless sink used where there is no tray. Blocks until the coordinator is gone.
pub fn run_headless(events: crossbeam_channel::Receiver<AppEvent>) {
    for event in events.iter() {
        present(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Status;

    #[test]
    fn describes_user_facing_events() {
        let status = Status {
            enabled: true,
            source_lang: "Auto Detect",
            target_lang: "English",
            model: "gemma3:1b".into(),
            models: vec!["gemma3:1b".into()],
        };
        let (title, body) = describe(&AppEvent::Started(status.clone())).unwrap();
        assert_eq!(title, "TransPaste Started");
        assert_eq!(body, "Model: gemma3:1b\nTarget: English");
        assert!(describe(&AppEvent::StateChanged(status)).is_none());

        let long = "x".repeat(80);
        let (_, body) = describe(&AppEvent::Translated(long)).unwrap();
        assert!(body.ends_with(&format!("{}...", "x".repeat(50))));

        let (title, body) = describe(&AppEvent::Failed("Empty response from Ollama".into())).unwrap();
        assert_eq!(title, "Translation Failed");
        assert_eq!(body, "Error: Empty response from Ollama");
    }
}
