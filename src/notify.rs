use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use log::warn;
use notify_rust::Notification;

use crate::timer::Alert;

const SOUND_FILES: [(&str, &str); 4] = [
    ("afplay", "/System/Library/Sounds/Glass.aiff"),
    ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
    ("aplay", "/usr/share/sounds/alsa/Front_Center.wav"),
    ("aplay", "/usr/share/sounds/generic.wav"),
];

/// Desktop notifications plus a short completion sound, falling back to
/// the terminal bell when neither is available.
pub struct DesktopAlert;

impl Alert for DesktopAlert {
    fn notify(&mut self, body: &str, title: &str) {
        if let Err(err) = Notification::new().summary(title).body(body).show() {
            warn!("desktop notification failed: {err}");
            bell();
        }
    }

    fn sound(&mut self) {
        for (player, file) in SOUND_FILES {
            if Path::new(file).exists() {
                let spawned = Command::new(player)
                    .arg(file)
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .spawn();
                if spawned.is_ok() {
                    return;
                }
            }
        }
        bell();
    }
}

fn bell() {
    print!("\x07");
    io::stdout().flush().ok();
}
