use log::warn;
use ratatui::widgets::ListState;

use crate::config::AppConfig;
use crate::store::{StoreError, TimerStore};
use crate::timer::{Alert, Timer};

const EYE_CARE_NAME: &str = "Eye Care Timer";
const EYE_CARE_WORK: u64 = 20 * 60;
const EYE_CARE_BREAK: u64 = 20;
const POMODORO_NAME: &str = "Pomodoro Timer";
const POMODORO_WORK: u64 = 25 * 60;
const POMODORO_BREAK: u64 = 5 * 60;

/// Which prompt the status bar is currently collecting input for. Adding
/// a timer walks name, primary duration, then the optional alternate
/// duration; editing walks primary, then alternate if the timer has one.
#[derive(Debug, PartialEq)]
pub enum InputMode {
    Normal,
    AddingName,
    AddingPrimary,
    AskingAlternate,
    AddingAlternate,
    EditingPrimary,
    EditingAlternate,
    EditingName,
}

pub struct App {
    pub store: TimerStore,
    pub timers: Vec<Timer>,
    pub list_state: ListState,
    pub input: String,
    pub input_mode: InputMode,
    pub status: Option<String>,
    draft_name: Option<String>,
    draft_primary: Option<u64>,
    sound_default: bool,
    auto_repeat_default: bool,
}

impl App {
    /// Load every stored timer into an idle countdown at its primary
    /// duration.
    pub async fn new(store: TimerStore, config: &AppConfig) -> Result<Self, StoreError> {
        let defs = store.list().await?;
        let timers: Vec<Timer> = defs
            .into_iter()
            .map(|def| {
                let mut timer = Timer::new(def);
                timer.set_sound(config.sound_default);
                timer.set_auto_repeat(config.auto_repeat_default);
                timer
            })
            .collect();

        let mut app = App {
            store,
            timers,
            list_state: ListState::default(),
            input: String::new(),
            input_mode: InputMode::Normal,
            status: None,
            draft_name: None,
            draft_primary: None,
            sound_default: config.sound_default,
            auto_repeat_default: config.auto_repeat_default,
        };

        if !app.timers.is_empty() {
            app.list_state.select(Some(0));
        }

        Ok(app)
    }

    pub fn next(&mut self) {
        if self.timers.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1) % self.timers.len(),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.timers.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.timers.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    /// One shared pulse for every timer. Runs even while a prompt is
    /// open so background timers keep counting.
    pub fn tick_all(&mut self, alert: &mut dyn Alert) {
        for timer in &mut self.timers {
            if timer.tick(alert) {
                self.status = Some(format!("{}: Time's up!", timer.def.name));
            }
        }
    }

    /// Status messages live until the next keypress.
    pub fn clear_status(&mut self) {
        self.status = None;
    }

    pub fn toggle_selected(&mut self, alert: &mut dyn Alert) {
        if let Some(i) = self.list_state.selected() {
            if let Some(timer) = self.timers.get_mut(i) {
                if timer.toggle(alert) {
                    self.status = Some(format!("{}: Time's up!", timer.def.name));
                }
            }
        }
    }

    pub fn reset_selected(&mut self) {
        if let Some(i) = self.list_state.selected() {
            if let Some(timer) = self.timers.get_mut(i) {
                timer.reset();
            }
        }
    }

    pub fn toggle_sound_selected(&mut self) {
        if let Some(i) = self.list_state.selected() {
            if let Some(timer) = self.timers.get_mut(i) {
                timer.set_sound(!timer.sound_on);
            }
        }
    }

    pub fn toggle_repeat_selected(&mut self) {
        if let Some(i) = self.list_state.selected() {
            if let Some(timer) = self.timers.get_mut(i) {
                timer.set_auto_repeat(!timer.auto_repeat);
            }
        }
    }

    pub fn begin_add(&mut self) {
        self.input.clear();
        self.draft_name = None;
        self.draft_primary = None;
        self.input_mode = InputMode::AddingName;
    }

    pub fn begin_change(&mut self) {
        if let Some(i) = self.list_state.selected() {
            if let Some(timer) = self.timers.get(i) {
                self.input = timer.def.primary_duration.to_string();
                self.draft_primary = None;
                self.input_mode = InputMode::EditingPrimary;
            }
        }
    }

    pub fn begin_rename(&mut self) {
        if let Some(i) = self.list_state.selected() {
            if let Some(timer) = self.timers.get(i) {
                self.input = timer.def.name.clone();
                self.input_mode = InputMode::EditingName;
            }
        }
    }

    /// Duration prompts accept digits only; name prompts accept anything.
    pub fn push_input(&mut self, c: char) {
        let numeric: bool = matches!(
            self.input_mode,
            InputMode::AddingPrimary
                | InputMode::AddingAlternate
                | InputMode::EditingPrimary
                | InputMode::EditingAlternate
        );
        if !numeric || c.is_ascii_digit() {
            self.input.push(c);
        }
    }

    pub fn pop_input(&mut self) {
        self.input.pop();
    }

    pub async fn submit_input(&mut self) {
        match self.input_mode {
            InputMode::AddingName => {
                let name: String = self.input.trim().to_string();
                self.draft_name = Some(if name.is_empty() {
                    format!("Timer {}", self.timers.len() + 1)
                } else {
                    name
                });
                self.input.clear();
                self.input_mode = InputMode::AddingPrimary;
            }
            InputMode::AddingPrimary => match self.parse_duration() {
                Some(primary) => {
                    self.draft_primary = Some(primary);
                    self.input.clear();
                    self.input_mode = InputMode::AskingAlternate;
                }
                None => self.reject_duration(),
            },
            InputMode::AddingAlternate => match self.parse_duration() {
                Some(alternate) => {
                    self.input.clear();
                    self.finish_add(Some(alternate)).await;
                }
                None => self.reject_duration(),
            },
            InputMode::EditingPrimary => match self.parse_duration() {
                Some(primary) => {
                    let alternate: Option<u64> = self
                        .list_state
                        .selected()
                        .and_then(|i| self.timers.get(i))
                        .and_then(|timer| timer.def.alternate_duration);
                    match alternate {
                        Some(current) => {
                            self.draft_primary = Some(primary);
                            self.input = current.to_string();
                            self.input_mode = InputMode::EditingAlternate;
                        }
                        None => {
                            self.input.clear();
                            self.input_mode = InputMode::Normal;
                            self.apply_durations(primary, None).await;
                        }
                    }
                }
                None => self.reject_duration(),
            },
            InputMode::EditingAlternate => match self.parse_duration() {
                Some(alternate) => {
                    let primary: Option<u64> = self.draft_primary.take();
                    self.input.clear();
                    self.input_mode = InputMode::Normal;
                    if let Some(primary) = primary {
                        self.apply_durations(primary, Some(alternate)).await;
                    }
                }
                None => self.reject_duration(),
            },
            InputMode::EditingName => {
                let name: String = self.input.trim().to_string();
                self.input.clear();
                self.input_mode = InputMode::Normal;
                if !name.is_empty() {
                    self.apply_rename(&name).await;
                }
            }
            InputMode::Normal | InputMode::AskingAlternate => {}
        }
    }

    pub async fn answer_alternate(&mut self, wants_alternate: bool) {
        if self.input_mode != InputMode::AskingAlternate {
            return;
        }
        if wants_alternate {
            self.input.clear();
            self.input_mode = InputMode::AddingAlternate;
        } else {
            self.finish_add(None).await;
        }
    }

    /// Esc backs out of the current prompt. Cancelling the alternate
    /// value while editing still applies the new primary; every other
    /// prompt abandons its flow with nothing changed.
    pub async fn cancel_input(&mut self) {
        let was_editing_alternate: bool = self.input_mode == InputMode::EditingAlternate;
        self.input_mode = InputMode::Normal;
        self.input.clear();
        self.draft_name = None;
        let primary: Option<u64> = self.draft_primary.take();

        if was_editing_alternate {
            if let Some(primary) = primary {
                let alternate: Option<u64> = self
                    .list_state
                    .selected()
                    .and_then(|i| self.timers.get(i))
                    .and_then(|timer| timer.def.alternate_duration);
                self.apply_durations(primary, alternate).await;
            }
        }
    }

    pub async fn add_eye_care(&mut self) {
        self.create_timer(EYE_CARE_NAME, EYE_CARE_WORK, Some(EYE_CARE_BREAK))
            .await;
    }

    pub async fn add_pomodoro(&mut self) {
        self.create_timer(POMODORO_NAME, POMODORO_WORK, Some(POMODORO_BREAK))
            .await;
    }

    /// Remove the selected timer from the store and the registry. A
    /// failed delete leaves the running timer untouched.
    pub async fn delete_selected(&mut self) {
        if let Some(i) = self.list_state.selected() {
            let id: Option<i64> = self.timers.get(i).map(|timer| timer.def.id);
            if let Some(id) = id {
                match self.store.delete(id).await {
                    Ok(()) => {
                        self.timers.remove(i);
                        if self.timers.is_empty() {
                            self.list_state.select(None);
                        } else if i >= self.timers.len() {
                            self.list_state.select(Some(self.timers.len() - 1));
                        }
                    }
                    Err(err) => {
                        warn!("delete failed: {err}");
                        self.status = Some(format!("Could not delete: {err}"));
                    }
                }
            }
        }
    }

    async fn finish_add(&mut self, alternate: Option<u64>) {
        self.input_mode = InputMode::Normal;
        if let (Some(name), Some(primary)) = (self.draft_name.take(), self.draft_primary.take()) {
            self.create_timer(&name, primary, alternate).await;
        }
    }

    async fn create_timer(&mut self, name: &str, primary: u64, alternate: Option<u64>) {
        match self.store.create(name, primary, alternate).await {
            Ok(def) => {
                let mut timer = Timer::new(def);
                timer.set_sound(self.sound_default);
                timer.set_auto_repeat(self.auto_repeat_default);
                self.timers.push(timer);
                self.list_state.select(Some(self.timers.len() - 1));
            }
            Err(err) => {
                warn!("create failed: {err}");
                self.status = Some(format!("Could not save timer: {err}"));
            }
        }
    }

    /// Write the new durations to the store first; the in-memory timer
    /// only changes once the write succeeds.
    async fn apply_durations(&mut self, primary: u64, alternate: Option<u64>) {
        if let Some(i) = self.list_state.selected() {
            let id: Option<i64> = self.timers.get(i).map(|timer| timer.def.id);
            if let Some(id) = id {
                match self.store.update_durations(id, primary, alternate).await {
                    Ok(()) => {
                        if let Some(timer) = self.timers.get_mut(i) {
                            timer.change_duration(primary, alternate);
                        }
                    }
                    Err(err) => {
                        warn!("duration update failed: {err}");
                        self.status = Some(format!("Could not save changes: {err}"));
                    }
                }
            }
        }
    }

    async fn apply_rename(&mut self, name: &str) {
        if let Some(i) = self.list_state.selected() {
            let id: Option<i64> = self.timers.get(i).map(|timer| timer.def.id);
            if let Some(id) = id {
                match self.store.rename(id, name).await {
                    Ok(()) => {
                        if let Some(timer) = self.timers.get_mut(i) {
                            timer.def.name = name.to_string();
                        }
                    }
                    Err(err) => {
                        warn!("rename failed: {err}");
                        self.status = Some(format!("Could not rename: {err}"));
                    }
                }
            }
        }
    }

    // Positive whole seconds; anything else re-prompts.
    fn parse_duration(&self) -> Option<u64> {
        self.input
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|&secs| secs > 0)
            .map(|secs| secs as u64)
    }

    fn reject_duration(&mut self) {
        self.status = Some("Enter a positive number of seconds".to_string());
        self.input.clear();
    }
}

// Tests
#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingAlert {
        notifications: Vec<String>,
        sounds: usize,
    }

    impl Alert for RecordingAlert {
        fn notify(&mut self, body: &str, _title: &str) {
            self.notifications.push(body.to_string());
        }

        fn sound(&mut self) {
            self.sounds += 1;
        }
    }

    async fn test_app() -> App {
        let store = TimerStore::open_in_memory().await.unwrap();
        App::new(store, &AppConfig::default()).await.unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.push_input(c);
        }
    }

    #[tokio::test]
    async fn test_add_chain_creates_and_selects() {
        let mut app = test_app().await;

        app.begin_add();
        assert_eq!(app.input_mode, InputMode::AddingName);
        type_text(&mut app, "Tea");
        app.submit_input().await;
        assert_eq!(app.input_mode, InputMode::AddingPrimary);
        type_text(&mut app, "180");
        app.submit_input().await;
        assert_eq!(app.input_mode, InputMode::AskingAlternate);
        app.answer_alternate(false).await;

        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.timers.len(), 1);
        assert_eq!(app.timers[0].def.name, "Tea");
        assert_eq!(app.timers[0].def.primary_duration, 180);
        assert_eq!(app.timers[0].def.alternate_duration, None);
        assert!(!app.timers[0].is_running);
        assert_eq!(app.list_state.selected(), Some(0));

        let stored = app.store.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Tea");
    }

    #[tokio::test]
    async fn test_add_chain_with_alternate() {
        let mut app = test_app().await;

        app.begin_add();
        type_text(&mut app, "Split");
        app.submit_input().await;
        type_text(&mut app, "120");
        app.submit_input().await;
        app.answer_alternate(true).await;
        assert_eq!(app.input_mode, InputMode::AddingAlternate);
        type_text(&mut app, "30");
        app.submit_input().await;

        assert_eq!(app.timers[0].def.alternate_duration, Some(30));
        let stored = app.store.list().await.unwrap();
        assert_eq!(stored[0].alternate_duration, Some(30));
    }

    #[tokio::test]
    async fn test_blank_name_gets_a_default() {
        let mut app = test_app().await;

        app.begin_add();
        app.submit_input().await;
        type_text(&mut app, "60");
        app.submit_input().await;
        app.answer_alternate(false).await;

        assert_eq!(app.timers[0].def.name, "Timer 1");
    }

    #[tokio::test]
    async fn test_cancelling_the_alternate_prompt_aborts_creation() {
        let mut app = test_app().await;

        app.begin_add();
        type_text(&mut app, "Doomed");
        app.submit_input().await;
        type_text(&mut app, "300");
        app.submit_input().await;
        app.answer_alternate(true).await;
        app.cancel_input().await;

        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app.timers.is_empty());
        assert!(app.store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_zero_and_keeps_prompting() {
        let mut app = test_app().await;

        app.begin_add();
        app.submit_input().await;
        type_text(&mut app, "0");
        app.submit_input().await;

        assert_eq!(app.input_mode, InputMode::AddingPrimary);
        assert!(app.status.is_some());
        assert!(app.timers.is_empty());

        type_text(&mut app, "90");
        app.submit_input().await;
        assert_eq!(app.input_mode, InputMode::AskingAlternate);
    }

    #[tokio::test]
    async fn test_numeric_prompts_ignore_letters() {
        let mut app = test_app().await;

        app.begin_add();
        app.submit_input().await;
        type_text(&mut app, "a1x2");

        assert_eq!(app.input, "12");
    }

    #[tokio::test]
    async fn test_presets_use_their_standard_durations() {
        let mut app = test_app().await;

        app.add_pomodoro().await;
        app.add_eye_care().await;

        assert_eq!(app.timers[0].def.name, "Pomodoro Timer");
        assert_eq!(app.timers[0].def.primary_duration, 1500);
        assert_eq!(app.timers[0].def.alternate_duration, Some(300));
        assert_eq!(app.timers[1].def.name, "Eye Care Timer");
        assert_eq!(app.timers[1].def.primary_duration, 1200);
        assert_eq!(app.timers[1].def.alternate_duration, Some(20));
    }

    #[tokio::test]
    async fn test_change_duration_persists_then_applies() {
        let mut alert = RecordingAlert::default();
        let mut app = test_app().await;
        app.add_pomodoro().await;
        app.toggle_selected(&mut alert);
        app.tick_all(&mut alert);

        app.begin_change();
        assert_eq!(app.input, "1500");
        app.input.clear();
        type_text(&mut app, "2400");
        app.submit_input().await;
        assert_eq!(app.input_mode, InputMode::EditingAlternate);
        assert_eq!(app.input, "300");
        app.input.clear();
        type_text(&mut app, "600");
        app.submit_input().await;

        let timer = &app.timers[0];
        assert_eq!(timer.def.primary_duration, 2400);
        assert_eq!(timer.def.alternate_duration, Some(600));
        assert_eq!(timer.time_left, 2400);
        assert!(!timer.is_running);

        let stored = app.store.list().await.unwrap();
        assert_eq!(stored[0].primary_duration, 2400);
        assert_eq!(stored[0].alternate_duration, Some(600));
    }

    #[tokio::test]
    async fn test_cancelling_the_alternate_edit_keeps_the_old_break() {
        let mut app = test_app().await;
        app.add_pomodoro().await;

        app.begin_change();
        app.input.clear();
        type_text(&mut app, "2000");
        app.submit_input().await;
        app.cancel_input().await;

        assert_eq!(app.timers[0].def.primary_duration, 2000);
        assert_eq!(app.timers[0].def.alternate_duration, Some(300));

        let stored = app.store.list().await.unwrap();
        assert_eq!(stored[0].primary_duration, 2000);
        assert_eq!(stored[0].alternate_duration, Some(300));
    }

    #[tokio::test]
    async fn test_rename_updates_store_and_registry() {
        let mut app = test_app().await;
        app.add_eye_care().await;

        app.begin_rename();
        assert_eq!(app.input, "Eye Care Timer");
        app.input.clear();
        type_text(&mut app, "Screen Break");
        app.submit_input().await;

        assert_eq!(app.timers[0].def.name, "Screen Break");
        assert_eq!(app.store.list().await.unwrap()[0].name, "Screen Break");
    }

    #[tokio::test]
    async fn test_delete_selected_drops_row_and_timer() {
        let mut alert = RecordingAlert::default();
        let mut app = test_app().await;
        app.add_pomodoro().await;
        app.add_eye_care().await;

        app.list_state.select(Some(0));
        app.delete_selected().await;

        assert_eq!(app.timers.len(), 1);
        assert_eq!(app.timers[0].def.name, "Eye Care Timer");
        assert_eq!(app.list_state.selected(), Some(0));
        assert_eq!(app.store.list().await.unwrap().len(), 1);

        // The survivor still ticks normally.
        app.toggle_selected(&mut alert);
        app.tick_all(&mut alert);
        assert_eq!(app.timers[0].time_left, 1199);
    }

    #[tokio::test]
    async fn test_tick_all_advances_only_running_timers() {
        let mut alert = RecordingAlert::default();
        let mut app = test_app().await;
        app.add_pomodoro().await;
        app.add_eye_care().await;

        app.list_state.select(Some(1));
        app.toggle_selected(&mut alert);
        app.tick_all(&mut alert);
        app.tick_all(&mut alert);

        assert_eq!(app.timers[0].time_left, 1500);
        assert_eq!(app.timers[1].time_left, 1198);
    }

    #[tokio::test]
    async fn test_expiry_reports_in_the_status_line() {
        let mut alert = RecordingAlert::default();
        let mut app = test_app().await;

        app.begin_add();
        type_text(&mut app, "Quick");
        app.submit_input().await;
        type_text(&mut app, "1");
        app.submit_input().await;
        app.answer_alternate(false).await;

        app.toggle_selected(&mut alert);
        app.tick_all(&mut alert);
        app.tick_all(&mut alert);

        assert_eq!(app.status.as_deref(), Some("Quick: Time's up!"));
        assert_eq!(alert.notifications, vec!["Quick: Time's up!"]);
    }

    #[tokio::test]
    async fn test_restart_presents_stored_timers_idle() {
        let store = TimerStore::open_in_memory().await.unwrap();
        store.create("Kept", 90, Some(15)).await.unwrap();
        store.create("Also kept", 45, None).await.unwrap();

        let app = App::new(store, &AppConfig::default()).await.unwrap();

        assert_eq!(app.timers.len(), 2);
        assert_eq!(app.timers[0].time_left, 90);
        assert!(!app.timers[0].is_running);
        assert!(!app.timers[0].is_alternate);
        assert_eq!(app.list_state.selected(), Some(0));
    }

    #[tokio::test]
    async fn test_config_defaults_reach_new_timers() {
        let store = TimerStore::open_in_memory().await.unwrap();
        let config = AppConfig {
            database_path: None,
            sound_default: false,
            auto_repeat_default: true,
        };
        let mut app = App::new(store, &config).await.unwrap();

        app.add_pomodoro().await;

        assert!(!app.timers[0].sound_on);
        assert!(app.timers[0].auto_repeat);
    }

    #[tokio::test]
    async fn test_failed_duration_write_leaves_the_timer_untouched() {
        let mut alert = RecordingAlert::default();
        let mut app = test_app().await;
        app.add_pomodoro().await;
        app.toggle_selected(&mut alert);
        app.tick_all(&mut alert);

        app.store.close().await;
        app.begin_change();
        app.input.clear();
        type_text(&mut app, "2400");
        app.submit_input().await;
        app.input.clear();
        type_text(&mut app, "600");
        app.submit_input().await;

        let timer = &app.timers[0];
        assert_eq!(timer.def.primary_duration, 1500);
        assert_eq!(timer.def.alternate_duration, Some(300));
        assert_eq!(timer.time_left, 1499);
        assert!(timer.is_running);
        assert!(app.status.as_deref().unwrap().starts_with("Could not save changes"));
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_the_timer() {
        let mut alert = RecordingAlert::default();
        let mut app = test_app().await;
        app.add_pomodoro().await;
        app.toggle_selected(&mut alert);

        app.store.close().await;
        app.delete_selected().await;

        assert_eq!(app.timers.len(), 1);
        assert!(app.timers[0].is_running);
        assert_eq!(app.list_state.selected(), Some(0));
        assert!(app.status.as_deref().unwrap().starts_with("Could not delete"));
    }

    #[tokio::test]
    async fn test_failed_rename_keeps_the_old_name() {
        let mut app = test_app().await;
        app.add_eye_care().await;

        app.store.close().await;
        app.begin_rename();
        app.input.clear();
        type_text(&mut app, "Screen Break");
        app.submit_input().await;

        assert_eq!(app.timers[0].def.name, "Eye Care Timer");
        assert!(app.status.as_deref().unwrap().starts_with("Could not rename"));
    }

    #[tokio::test]
    async fn test_failed_create_adds_nothing() {
        let mut app = test_app().await;

        app.store.close().await;
        app.add_pomodoro().await;

        assert!(app.timers.is_empty());
        assert_eq!(app.list_state.selected(), None);
        assert!(app.status.as_deref().unwrap().starts_with("Could not save timer"));
    }
}
