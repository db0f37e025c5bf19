/// User commands from the tray menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ToggleEnabled,
    SetSourceLang(String),
    SetTargetLang(String),
    SetModel(String),
    RefreshModels,
    Quit,
}

/// Everything the tray needs to draw its menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub enabled: bool,
    pub source_lang: &'static str,
    pub target_lang: &'static str,
    pub model: String,
    pub models: Vec<String>,
}

/// Notifications from the coordinator to the UI side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Started(Status),
    StateChanged(Status),
    EnabledChanged(bool),
    Translated(String),
    Failed(String),
    ModelsRefreshed(usize),
}
