use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use tray_icon::menu::{CheckMenuItem, Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem, Submenu};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

use crate::app::Message;
use crate::events::{AppEvent, Command, Status};
use crate::languages;
use crate::notify;

const ENABLED_RGB: [u8; 3] = [0x14, 0xB8, 0xA6];
const DISABLED_RGB: [u8; 3] = [0x80, 0x80, 0x80];

pub struct TrayHandle {
    tray: TrayIcon,
    menu_event_rx: Receiver<MenuEvent>,
    actions: HashMap<MenuId, Command>,
    inbox: Sender<Message>,
}

impl TrayHandle {
    pub fn new(inbox: Sender<Message>) -> anyhow::Result<Self> {
        let tray = TrayIconBuilder::new()
            .with_tooltip(notify::APP_NAME)
            .with_icon(dot_icon(ENABLED_RGB)?)
            .build()?;
        let menu_event_rx = MenuEvent::receiver().clone();
        Ok(Self { tray, menu_event_rx, actions: HashMap::new(), inbox })
    }

    /// Rebuilds the whole menu so the check marks follow the coordinator's state.
    pub fn render(&mut self, status: &Status) -> anyhow::Result<()> {
        let (menu, actions) = build_menu(status)?;
        self.tray.set_menu(Some(Box::new(menu)));
        self.actions = actions;
        self.tray
            .set_tooltip(Some(format!("{} (Model: {})", notify::APP_NAME, status.model)))?;
        let rgb = if status.enabled { ENABLED_RGB } else { DISABLED_RGB };
        self.tray.set_icon(Some(dot_icon(rgb)?))?;
        Ok(())
    }

    /// Non-blocking poll of menu clicks.
    pub fn pump(&self) {
        while let Ok(event) = self.menu_event_rx.try_recv() {
            if let Some(cmd) = self.actions.get(&event.id) {
                log::info!("Tray: {:?}", cmd);
                let _ = self.inbox.send(Message::Command(cmd.clone()));
            }
        }
    }
}

fn build_menu(status: &Status) -> anyhow::Result<(Menu, HashMap<MenuId, Command>)> {
    let mut actions = HashMap::new();

    let label = if status.enabled { "Status: Enabled" } else { "Status: Disabled" };
    let toggle = CheckMenuItem::new(label, true, status.enabled, None);
    actions.insert(toggle.id().clone(), Command::ToggleEnabled);

    let source_menu = Submenu::new("Source Language", true);
    for lang in languages::sources() {
        let item = CheckMenuItem::new(lang.display_name, true, lang.display_name == status.source_lang, None);
        actions.insert(item.id().clone(), Command::SetSourceLang(lang.display_name.to_string()));
        source_menu.append(&item)?;
    }

    let target_menu = Submenu::new("Target Language", true);
    for lang in languages::targets() {
        let item = CheckMenuItem::new(lang.display_name, true, lang.display_name == status.target_lang, None);
        actions.insert(item.id().clone(), Command::SetTargetLang(lang.display_name.to_string()));
        target_menu.append(&item)?;
    }

    let model_menu = Submenu::new("Model", true);
    for model in &status.models {
        let item = CheckMenuItem::new(model, true, *model == status.model, None);
        actions.insert(item.id().clone(), Command::SetModel(model.clone()));
        model_menu.append(&item)?;
    }
    let refresh = MenuItem::new("Refresh Models", true, None);
    actions.insert(refresh.id().clone(), Command::RefreshModels);
    model_menu.append_items(&[&PredefinedMenuItem::separator(), &refresh])?;

    let quit = MenuItem::new("Quit", true, None);
    actions.insert(quit.id().clone(), Command::Quit);

    let menu = Menu::new();
    menu.append_items(&[
        &toggle,
        &PredefinedMenuItem::separator(),
        &source_menu,
        &target_menu,
        &PredefinedMenuItem::separator(),
        &model_menu,
        &PredefinedMenuItem::separator(),
        &quit,
    ])?;
    Ok((menu, actions))
}

// tiny 16x16 dot icon
fn dot_icon([r, g, b]: [u8; 3]) -> anyhow::Result<Icon> {
    let (icon_w, icon_h) = (16, 16);
    let mut rgba = Vec::with_capacity(icon_w * icon_h * 4);
    for _ in 0..icon_w * icon_h {
        rgba.extend_from_slice(&[r, g, b, 0xFF]);
    }
    Ok(Icon::from_rgba(rgba, icon_w as u32, icon_h as u32)?)
}

/// Tray and its platform event pump on a dedicated thread (tray types are not Send).
pub fn spawn(inbox: Sender<Message>, events: Receiver<AppEvent>) {
    thread::spawn(move || {
        #[cfg(target_os = "linux")]
        {
            if let Err(e) = gtk::init() {
                log::warn!("GTK unavailable, running without a tray: {}", e);
                notify::run_headless(events);
                return;
            }
        }

        let mut tray = match TrayHandle::new(inbox) {
            Ok(tray) => {
                log::info!("Tray created");
                tray
            }
            Err(e) => {
                notify::toast(notify::APP_NAME, &format!("Tray failed: {}", e));
                // keep the notifications flowing without a tray
                notify::run_headless(events);
                return;
            }
        };

        loop {
            pump_platform_events();
            tray.pump();
            while let Ok(event) = events.try_recv() {
                if let AppEvent::Started(status) | AppEvent::StateChanged(status) = &event {
                    if let Err(e) = tray.render(status) {
                        log::error!("Tray render failed: {}", e);
                    }
                }
                notify::present(&event);
            }
            thread::sleep(Duration::from_millis(25));
        }
    });
}

#[cfg(windows)]
fn pump_platform_events() {
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::WindowsAndMessaging as wm;
    unsafe {
        let mut msg = wm::MSG::default();
        while wm::PeekMessageW(&mut msg, HWND(std::ptr::null_mut()), 0, 0, wm::PM_REMOVE).into() {
            let _ = wm::TranslateMessage(&msg);
            wm::DispatchMessageW(&msg);
        }
    }
}

// the appindicator tray lives on this thread's GTK main context
#[cfg(target_os = "linux")]
fn pump_platform_events() {
    while gtk::events_pending() {
        gtk::main_iteration_do(false);
    }
}
