use crate::store::TimerDefinition;

/// Expiry side effects a timer fires. The real implementation lives in
/// `notify`; tests swap in a recording double.
pub trait Alert {
    fn notify(&mut self, body: &str, title: &str);
    fn sound(&mut self);
}

/// A single countdown timer with its work/break switching logic.
///
/// The timer only advances when `tick` is called by the shared one-second
/// pulse. It checks its own `is_running` flag first, so the event loop can
/// broadcast ticks to every timer without tracking which ones are active.
#[derive(Debug)]
pub struct Timer {
    pub def: TimerDefinition,
    pub time_left: u64,
    pub is_running: bool,
    pub is_alternate: bool,
    pub sound_on: bool,
    pub auto_repeat: bool,
}

impl Timer {
    pub fn new(def: TimerDefinition) -> Self {
        let time_left: u64 = def.primary_duration;
        Self {
            def,
            time_left,
            is_running: false,
            is_alternate: false,
            sound_on: true,
            auto_repeat: false,
        }
    }

    /// Start counting down. A timer that is already sitting at zero runs
    /// one expiry immediately instead of displaying a stuck "00:00".
    /// Returns true if that immediate expiry fired.
    pub fn start(&mut self, alert: &mut dyn Alert) -> bool {
        if self.is_running {
            return false;
        }
        self.is_running = true;
        if self.time_left == 0 {
            self.expire(alert);
            return true;
        }
        false
    }

    /// Stop counting down without touching `time_left`.
    pub fn stop(&mut self) {
        self.is_running = false;
    }

    pub fn toggle(&mut self, alert: &mut dyn Alert) -> bool {
        if self.is_running {
            self.stop();
            false
        } else {
            self.start(alert)
        }
    }

    /// Advance by one second. A tick that observes zero runs the expiry
    /// path (notification, optional sound, duration switch) instead of
    /// decrementing; returns true in that case.
    pub fn tick(&mut self, alert: &mut dyn Alert) -> bool {
        if !self.is_running {
            return false;
        }
        if self.time_left == 0 {
            self.expire(alert);
            true
        } else {
            self.time_left -= 1;
            false
        }
    }

    fn expire(&mut self, alert: &mut dyn Alert) {
        alert.notify(
            &format!("{}: Time's up!", self.def.name),
            "Timer Notification",
        );
        if self.sound_on {
            alert.sound();
        }
        self.switch_duration();
    }

    /// Reload `time_left` for the next phase. With an alternate duration
    /// the timer flips between work and break; without one it always
    /// reloads the primary duration. Keeps running only on auto-repeat.
    fn switch_duration(&mut self) {
        match self.def.alternate_duration {
            Some(alternate) => {
                self.is_alternate = !self.is_alternate;
                self.time_left = if self.is_alternate {
                    alternate
                } else {
                    self.def.primary_duration
                };
            }
            None => self.time_left = self.def.primary_duration,
        }
        self.is_running = self.auto_repeat;
    }

    /// Back to the idle work phase with a full primary duration, from any
    /// state.
    pub fn reset(&mut self) {
        self.time_left = self.def.primary_duration;
        self.is_running = false;
        self.is_alternate = false;
    }

    /// Apply new durations to the held definition and reset. The caller
    /// persists the change through the store before calling this, so a
    /// failed write never reaches the in-memory timer.
    pub fn change_duration(&mut self, primary: u64, alternate: Option<u64>) {
        self.def.primary_duration = primary;
        self.def.alternate_duration = alternate;
        self.reset();
    }

    pub fn set_sound(&mut self, on: bool) {
        self.sound_on = on;
    }

    pub fn set_auto_repeat(&mut self, on: bool) {
        self.auto_repeat = on;
    }

    pub fn display(&self) -> String {
        format_time(self.time_left)
    }
}

/// Render seconds as `MM:SS`, or `HH:MM:SS` from one hour up.
pub fn format_time(seconds: u64) -> String {
    let mins: u64 = seconds / 60;
    let secs: u64 = seconds % 60;
    let hours: u64 = mins / 60;
    let mins: u64 = mins % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}
