use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use tracing::{debug, info};

use crate::error::AudioError;

// Stock alert sounds shipped by common desktops, paired with the player that
// understands them. First pair whose asset exists wins.
const CANDIDATES: &[(&str, &str)] = &[
    ("paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"),
    ("paplay", "/usr/share/sounds/freedesktop/stereo/bell.oga"),
    ("aplay", "/usr/share/sounds/alsa/Front_Center.wav"),
    ("afplay", "/System/Library/Sounds/Glass.aiff"),
];

/// The one audio resource of a timer session. Resolved once when the session
/// screen opens, played at each phase end, released when the screen closes.
#[derive(Debug)]
pub struct Alarm {
    enabled: bool,
    player: Option<(String, PathBuf)>,
    children: Vec<Child>,
}

impl Alarm {
    pub fn load(enabled: bool) -> Self {
        let player = if enabled { resolve_player() } else { None };

        match &player {
            Some((player, asset)) => {
                info!(player, asset = %asset.display(), "alarm sound resolved");
            }
            None if enabled => {
                debug!("no system audio player found; falling back to terminal bell");
            }
            None => {}
        }

        Self {
            enabled,
            player,
            children: Vec::new(),
        }
    }

    /// Best-effort cue. The caller logs and swallows the error; a phase
    /// transition never depends on sound coming out.
    pub fn ring(&mut self) -> Result<(), AudioError> {
        if !self.enabled {
            return Ok(());
        }

        self.reap_finished();

        match &self.player {
            Some((player, asset)) => {
                let child = Command::new(player)
                    .arg(asset)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .spawn()
                    .map_err(|source| AudioError::Spawn {
                        player: player.clone(),
                        source,
                    })?;
                self.children.push(child);
                Ok(())
            }
            None => {
                let mut out = io::stdout();
                out.write_all(b"\x07")
                    .and_then(|()| out.flush())
                    .map_err(AudioError::Bell)
            }
        }
    }

    fn reap_finished(&mut self) {
        self.children
            .retain_mut(|child| !matches!(child.try_wait(), Ok(Some(_))));
    }
}

impl Drop for Alarm {
    fn drop(&mut self) {
        for child in &mut self.children {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn resolve_player() -> Option<(String, PathBuf)> {
    CANDIDATES
        .iter()
        .find(|(_, asset)| Path::new(asset).exists())
        .map(|(player, asset)| ((*player).to_string(), PathBuf::from(asset)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_alarm_never_rings() {
        let mut alarm = Alarm::load(false);
        assert!(alarm.player.is_none());
        assert!(alarm.ring().is_ok());
        assert!(alarm.children.is_empty());
    }
}
